/// Group service - read-only access to groups
use std::sync::Arc;

use super::not_found;
use crate::db::Store;
use crate::error::Result;
use crate::models::Group;
use crate::pagination::{Listing, Window};

pub struct GroupService {
    store: Arc<dyn Store>,
}

impl GroupService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list_groups(&self, window: Window) -> Result<Listing<Group>> {
        Ok(self.store.list_groups(window).await?)
    }

    pub async fn get_group(&self, id: i64) -> Result<Group> {
        self.store
            .find_group(id)
            .await?
            .ok_or_else(|| not_found("Group"))
    }
}
