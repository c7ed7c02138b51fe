/// Comment service - comments nested under a post
///
/// Every operation resolves the parent post first; a missing post is a 404
/// before any comment logic runs.
use std::sync::Arc;

use super::not_found;
use crate::db::{Store, StoreError};
use crate::error::Result;
use crate::identity::Caller;
use crate::metrics::record_write;
use crate::middleware::permissions::check_comment_ownership;
use crate::models::{Comment, NewComment, Post};
use crate::pagination::{Listing, Window};
use crate::serializers::comments::CommentPayload;

pub struct CommentService {
    store: Arc<dyn Store>,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn resolve_post(&self, post_id: i64) -> Result<Post> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| not_found("Post"))
    }

    async fn resolve_comment(&self, post_id: i64, id: i64) -> Result<Comment> {
        self.store
            .find_comment(post_id, id)
            .await?
            .ok_or_else(|| not_found("Comment"))
    }

    pub async fn list_comments(&self, post_id: i64, window: Window) -> Result<Listing<Comment>> {
        self.resolve_post(post_id).await?;
        Ok(self.store.list_comments(post_id, window).await?)
    }

    pub async fn get_comment(&self, post_id: i64, id: i64) -> Result<Comment> {
        self.resolve_post(post_id).await?;
        self.resolve_comment(post_id, id).await
    }

    pub async fn create_comment(
        &self,
        caller: &Caller,
        post_id: i64,
        payload: CommentPayload,
    ) -> Result<Comment> {
        let post = self.resolve_post(post_id).await?;
        let text = payload.require_text()?;

        let comment = self
            .store
            .insert_comment(NewComment {
                author_id: caller.id,
                post_id: post.id,
                text,
            })
            .await
            .map_err(|err| match err {
                // post deleted after it was resolved
                StoreError::MissingReference(_) => not_found("Post"),
                other => other.into(),
            })?;

        record_write("comment", "create");
        tracing::info!(post_id, comment_id = comment.id, caller = %caller.id, "comment created");
        Ok(comment)
    }

    /// PUT when `partial` is false, PATCH otherwise.
    pub async fn update_comment(
        &self,
        caller: &Caller,
        post_id: i64,
        id: i64,
        payload: CommentPayload,
        partial: bool,
    ) -> Result<Comment> {
        self.resolve_post(post_id).await?;
        let comment = self.resolve_comment(post_id, id).await?;
        check_comment_ownership(caller.id, &comment)?;

        let text = if partial {
            payload.optional_text()?
        } else {
            Some(payload.require_text()?)
        };
        let Some(text) = text else {
            return Ok(comment);
        };

        let comment = self
            .store
            .update_comment(post_id, id, text)
            .await?
            .ok_or_else(|| not_found("Comment"))?;

        record_write("comment", "update");
        tracing::info!(post_id, comment_id = id, caller = %caller.id, "comment updated");
        Ok(comment)
    }

    pub async fn delete_comment(&self, caller: &Caller, post_id: i64, id: i64) -> Result<()> {
        self.resolve_post(post_id).await?;
        let comment = self.resolve_comment(post_id, id).await?;
        check_comment_ownership(caller.id, &comment)?;

        if !self.store.delete_comment(post_id, id).await? {
            return Err(not_found("Comment"));
        }

        record_write("comment", "delete");
        tracing::info!(post_id, comment_id = id, caller = %caller.id, "comment deleted");
        Ok(())
    }
}
