/// In-process store
///
/// Holds every table behind one `RwLock`, so each write (including the
/// follow uniqueness check) is atomic with respect to other requests.
/// Users and groups are seeded directly since no endpoint creates them.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{released_username, Store, StoreError, StoreResult};
use crate::filters::{PostFilter, SearchTerms};
use crate::models::{
    Comment, Follow, Group, NewComment, NewFollow, NewPost, Post, PostChanges, User,
};
use crate::pagination::{Listing, Window};

#[derive(Debug, Clone)]
struct PostRow {
    author_id: Uuid,
    text: String,
    pub_date: DateTime<Utc>,
    image: Option<String>,
    group_id: Option<i64>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    author_id: Uuid,
    post_id: i64,
    text: String,
    created: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct FollowRow {
    user_id: Uuid,
    following_id: Uuid,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<Uuid, String>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    follows: BTreeMap<i64, FollowRow>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn username(&self, id: &Uuid) -> StoreResult<String> {
        self.users
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::MissingReference("user".to_string()))
    }

    fn post(&self, id: i64, row: &PostRow) -> StoreResult<Post> {
        Ok(Post {
            id,
            author_id: row.author_id,
            author_username: self.username(&row.author_id)?,
            text: row.text.clone(),
            pub_date: row.pub_date,
            image: row.image.clone(),
            group_id: row.group_id,
        })
    }

    fn comment(&self, id: i64, row: &CommentRow) -> StoreResult<Comment> {
        Ok(Comment {
            id,
            author_id: row.author_id,
            author_username: self.username(&row.author_id)?,
            post_id: row.post_id,
            text: row.text.clone(),
            created: row.created,
        })
    }

    fn follow(&self, id: i64, row: &FollowRow) -> StoreResult<Follow> {
        Ok(Follow {
            id,
            user_id: row.user_id,
            user_username: self.username(&row.user_id)?,
            following_id: row.following_id,
            following_username: self.username(&row.following_id)?,
        })
    }

    fn check_follow(&self, new: FollowRow, exclude: Option<i64>) -> StoreResult<()> {
        if new.user_id == new.following_id {
            return Err(StoreError::SelfFollow);
        }
        if !self.users.contains_key(&new.following_id) {
            return Err(StoreError::MissingReference("user".to_string()));
        }
        let duplicate = self.follows.iter().any(|(id, row)| {
            Some(*id) != exclude
                && row.user_id == new.user_id
                && row.following_id == new.following_id
        });
        if duplicate {
            return Err(StoreError::DuplicateFollow);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity. Stands in for the identity provider's user table.
    pub async fn insert_user(&self, username: &str) -> User {
        let id = Uuid::new_v4();
        self.tables
            .write()
            .await
            .users
            .insert(id, username.to_string());
        User {
            id,
            username: username.to_string(),
        }
    }

    pub async fn insert_group(&self, title: &str, slug: &str, description: &str) -> Group {
        let mut tables = self.tables.write().await;
        let group = Group {
            id: tables.next_id(),
            title: title.to_string(),
            slug: slug.to_string(),
            description: description.to_string(),
        };
        tables.groups.insert(group.id, group.clone());
        group
    }

    /// Remove a group; posts in it lose their group, like `ON DELETE SET NULL`.
    pub async fn delete_group(&self, id: i64) -> bool {
        let mut tables = self.tables.write().await;
        let removed = tables.groups.remove(&id).is_some();
        for post in tables.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        removed
    }

    pub async fn post_count(&self) -> usize {
        self.tables.read().await.posts.len()
    }

    pub async fn comment_count(&self) -> usize {
        self.tables.read().await.comments.len()
    }

    pub async fn follow_count(&self) -> usize {
        self.tables.read().await.follows.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn sync_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let stale: Vec<Uuid> = tables
            .users
            .iter()
            .filter(|(id, name)| **id != user.id && name.as_str() == user.username)
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            tables.users.insert(id, released_username(id));
        }
        tables.users.insert(user.id, user.username.clone());
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|(_, name)| name.as_str() == username)
            .map(|(id, name)| User {
                id: *id,
                username: name.clone(),
            }))
    }

    async fn list_groups(&self, window: Window) -> StoreResult<Listing<Group>> {
        let tables = self.tables.read().await;
        let all: Vec<Group> = tables.groups.values().cloned().collect();
        let total = all.len() as i64;
        Ok(Listing {
            items: window.slice(all),
            total,
        })
    }

    async fn find_group(&self, id: i64) -> StoreResult<Option<Group>> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn list_posts(&self, filter: PostFilter, window: Window) -> StoreResult<Listing<Post>> {
        let tables = self.tables.read().await;
        let matching: Vec<(i64, &PostRow)> = tables
            .posts
            .iter()
            .filter(|(_, row)| filter.group_id.is_none() || row.group_id == filter.group_id)
            .map(|(id, row)| (*id, row))
            .collect();
        let total = matching.len() as i64;
        let items = window
            .slice(matching)
            .into_iter()
            .map(|(id, row)| tables.post(id, row))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Listing { items, total })
    }

    async fn find_post(&self, id: i64) -> StoreResult<Option<Post>> {
        let tables = self.tables.read().await;
        tables
            .posts
            .get(&id)
            .map(|row| tables.post(id, row))
            .transpose()
    }

    async fn insert_post(&self, new: NewPost) -> StoreResult<Post> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&new.author_id) {
            return Err(StoreError::MissingReference("user".to_string()));
        }
        if let Some(group_id) = new.group_id {
            if !tables.groups.contains_key(&group_id) {
                return Err(StoreError::MissingReference("group".to_string()));
            }
        }
        let id = tables.next_id();
        let row = PostRow {
            author_id: new.author_id,
            text: new.text,
            pub_date: Utc::now(),
            image: new.image,
            group_id: new.group_id,
        };
        let post = tables.post(id, &row)?;
        tables.posts.insert(id, row);
        Ok(post)
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> StoreResult<Option<Post>> {
        let mut tables = self.tables.write().await;
        if let Some(Some(group_id)) = changes.group_id {
            if !tables.groups.contains_key(&group_id) {
                return Err(StoreError::MissingReference("group".to_string()));
            }
        }
        let Some(row) = tables.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(text) = changes.text {
            row.text = text;
        }
        if let Some(image) = changes.image {
            row.image = image;
        }
        if let Some(group_id) = changes.group_id {
            row.group_id = group_id;
        }
        let row = row.clone();
        tables.post(id, &row).map(Some)
    }

    async fn delete_post(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&id).is_none() {
            return Ok(false);
        }
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(true)
    }

    async fn list_comments(&self, post_id: i64, window: Window) -> StoreResult<Listing<Comment>> {
        let tables = self.tables.read().await;
        let matching: Vec<(i64, &CommentRow)> = tables
            .comments
            .iter()
            .filter(|(_, row)| row.post_id == post_id)
            .map(|(id, row)| (*id, row))
            .collect();
        let total = matching.len() as i64;
        let items = window
            .slice(matching)
            .into_iter()
            .map(|(id, row)| tables.comment(id, row))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Listing { items, total })
    }

    async fn find_comment(&self, post_id: i64, id: i64) -> StoreResult<Option<Comment>> {
        let tables = self.tables.read().await;
        tables
            .comments
            .get(&id)
            .filter(|row| row.post_id == post_id)
            .map(|row| tables.comment(id, row))
            .transpose()
    }

    async fn insert_comment(&self, new: NewComment) -> StoreResult<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&new.post_id) {
            return Err(StoreError::MissingReference("post".to_string()));
        }
        let id = tables.next_id();
        let row = CommentRow {
            author_id: new.author_id,
            post_id: new.post_id,
            text: new.text,
            created: Utc::now(),
        };
        let comment = tables.comment(id, &row)?;
        tables.comments.insert(id, row);
        Ok(comment)
    }

    async fn update_comment(
        &self,
        post_id: i64,
        id: i64,
        text: String,
    ) -> StoreResult<Option<Comment>> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .comments
            .get_mut(&id)
            .filter(|row| row.post_id == post_id)
        else {
            return Ok(None);
        };
        row.text = text;
        let row = row.clone();
        tables.comment(id, &row).map(Some)
    }

    async fn delete_comment(&self, post_id: i64, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .comments
            .get(&id)
            .map(|row| row.post_id == post_id)
            .unwrap_or(false);
        if owned {
            tables.comments.remove(&id);
        }
        Ok(owned)
    }

    async fn list_follows(
        &self,
        user_id: Uuid,
        search: &SearchTerms,
        window: Window,
    ) -> StoreResult<Listing<Follow>> {
        let tables = self.tables.read().await;
        let mut matching = Vec::new();
        for (id, row) in tables.follows.iter().filter(|(_, row)| row.user_id == user_id) {
            let follow = tables.follow(*id, row)?;
            if search.matches(&[
                follow.user_username.as_str(),
                follow.following_username.as_str(),
            ]) {
                matching.push(follow);
            }
        }
        let total = matching.len() as i64;
        Ok(Listing {
            items: window.slice(matching),
            total,
        })
    }

    async fn find_follow(&self, user_id: Uuid, id: i64) -> StoreResult<Option<Follow>> {
        let tables = self.tables.read().await;
        tables
            .follows
            .get(&id)
            .filter(|row| row.user_id == user_id)
            .map(|row| tables.follow(id, row))
            .transpose()
    }

    async fn follow_exists(
        &self,
        user_id: Uuid,
        following_id: Uuid,
        exclude: Option<i64>,
    ) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.follows.iter().any(|(id, row)| {
            Some(*id) != exclude && row.user_id == user_id && row.following_id == following_id
        }))
    }

    async fn insert_follow(&self, new: NewFollow) -> StoreResult<Follow> {
        let mut tables = self.tables.write().await;
        let row = FollowRow {
            user_id: new.user_id,
            following_id: new.following_id,
        };
        tables.check_follow(row, None)?;
        let id = tables.next_id();
        let follow = tables.follow(id, &row)?;
        tables.follows.insert(id, row);
        Ok(follow)
    }

    async fn update_follow(
        &self,
        user_id: Uuid,
        id: i64,
        following_id: Uuid,
    ) -> StoreResult<Option<Follow>> {
        let mut tables = self.tables.write().await;
        match tables.follows.get(&id) {
            Some(row) if row.user_id == user_id => {}
            _ => return Ok(None),
        }
        let row = FollowRow {
            user_id,
            following_id,
        };
        tables.check_follow(row, Some(id))?;
        tables.follows.insert(id, row);
        tables.follow(id, &row).map(Some)
    }

    async fn delete_follow(&self, user_id: Uuid, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .follows
            .get(&id)
            .map(|row| row.user_id == user_id)
            .unwrap_or(false);
        if owned {
            tables.follows.remove(&id);
        }
        Ok(owned)
    }
}
