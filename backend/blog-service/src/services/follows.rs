/// Follow service - the caller's own follow edges
///
/// Every lookup is scoped to the caller, so another user's edge id behaves
/// exactly like a missing one.
use std::sync::Arc;

use super::not_found;
use crate::db::Store;
use crate::error::Result;
use crate::filters::SearchTerms;
use crate::identity::Caller;
use crate::metrics::record_write;
use crate::models::{Follow, NewFollow};
use crate::pagination::{Listing, Window};
use crate::serializers::follows::{validate_follow, FollowPayload};

pub struct FollowService {
    store: Arc<dyn Store>,
}

impl FollowService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list_follows(
        &self,
        caller: &Caller,
        search: &SearchTerms,
        window: Window,
    ) -> Result<Listing<Follow>> {
        Ok(self.store.list_follows(caller.id, search, window).await?)
    }

    pub async fn get_follow(&self, caller: &Caller, id: i64) -> Result<Follow> {
        self.store
            .find_follow(caller.id, id)
            .await?
            .ok_or_else(|| not_found("Follow"))
    }

    pub async fn create_follow(&self, caller: &Caller, payload: FollowPayload) -> Result<Follow> {
        let username = payload.require_following()?;

        let target = validate_follow(self.store.as_ref(), caller, &username, None).await?;

        // a concurrent insert of the same pair surfaces as DuplicateFollow here
        let follow = self
            .store
            .insert_follow(NewFollow {
                user_id: caller.id,
                following_id: target.id,
            })
            .await?;

        record_write("follow", "create");
        tracing::info!(follow_id = follow.id, caller = %caller.id, following = %target.id, "follow created");
        Ok(follow)
    }

    /// PUT when `partial` is false, PATCH otherwise.
    pub async fn update_follow(
        &self,
        caller: &Caller,
        id: i64,
        payload: FollowPayload,
        partial: bool,
    ) -> Result<Follow> {
        let existing = self.get_follow(caller, id).await?;
        if partial && payload.following.is_none() {
            return Ok(existing);
        }
        let username = payload.require_following()?;

        let target = validate_follow(self.store.as_ref(), caller, &username, Some(id)).await?;
        let follow = self
            .store
            .update_follow(caller.id, id, target.id)
            .await?
            .ok_or_else(|| not_found("Follow"))?;

        record_write("follow", "update");
        tracing::info!(follow_id = id, caller = %caller.id, following = %target.id, "follow updated");
        Ok(follow)
    }

    pub async fn delete_follow(&self, caller: &Caller, id: i64) -> Result<()> {
        if !self.store.delete_follow(caller.id, id).await? {
            return Err(not_found("Follow"));
        }

        record_write("follow", "delete");
        tracing::info!(follow_id = id, caller = %caller.id, "follow deleted");
        Ok(())
    }
}
