/// Post service - listing, creation and author-only mutation of posts
use std::sync::Arc;

use super::not_found;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::filters::PostFilter;
use crate::identity::Caller;
use crate::metrics::record_write;
use crate::middleware::permissions::check_post_ownership;
use crate::models::Post;
use crate::pagination::{Listing, Window};
use crate::serializers::posts::PostPayload;

pub struct PostService {
    store: Arc<dyn Store>,
}

impl PostService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// List posts, optionally restricted to one group
    pub async fn list_posts(&self, filter: PostFilter, window: Window) -> Result<Listing<Post>> {
        if let Some(group_id) = filter.group_id {
            if self.store.find_group(group_id).await?.is_none() {
                return Err(AppError::ValidationError(
                    "group: Select a valid choice. That choice is not one of the available choices."
                        .to_string(),
                ));
            }
        }
        Ok(self.store.list_posts(filter, window).await?)
    }

    pub async fn get_post(&self, id: i64) -> Result<Post> {
        self.store
            .find_post(id)
            .await?
            .ok_or_else(|| not_found("Post"))
    }

    pub async fn create_post(&self, caller: &Caller, payload: PostPayload) -> Result<Post> {
        self.ensure_group(payload.referenced_group()).await?;
        let new = payload.into_new_post(caller.id)?;

        let post = self.store.insert_post(new).await?;

        record_write("post", "create");
        tracing::info!(post_id = post.id, caller = %caller.id, "post created");
        Ok(post)
    }

    /// PUT when `partial` is false, PATCH otherwise.
    pub async fn update_post(
        &self,
        caller: &Caller,
        id: i64,
        payload: PostPayload,
        partial: bool,
    ) -> Result<Post> {
        let post = self.get_post(id).await?;
        check_post_ownership(caller.id, &post)?;

        let group = payload.referenced_group();
        let changes = payload.into_changes(partial)?;
        self.ensure_group(group).await?;

        let post = self
            .store
            .update_post(id, changes)
            .await?
            .ok_or_else(|| not_found("Post"))?;

        record_write("post", "update");
        tracing::info!(post_id = post.id, caller = %caller.id, "post updated");
        Ok(post)
    }

    pub async fn delete_post(&self, caller: &Caller, id: i64) -> Result<()> {
        let post = self.get_post(id).await?;
        check_post_ownership(caller.id, &post)?;

        if !self.store.delete_post(id).await? {
            return Err(not_found("Post"));
        }

        record_write("post", "delete");
        tracing::info!(post_id = id, caller = %caller.id, "post deleted");
        Ok(())
    }

    async fn ensure_group(&self, group_id: Option<i64>) -> Result<()> {
        let Some(group_id) = group_id else {
            return Ok(());
        };
        match self.store.find_group(group_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::ValidationError(format!(
                "group: Invalid pk \"{}\" - object does not exist.",
                group_id
            ))),
        }
    }
}
