/// Record store for blog-service
///
/// Handlers and services only see the `Store` trait. `PgStore` is the
/// production implementation; `MemoryStore` keeps everything in process and
/// backs local development and the HTTP test-suite.
pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::filters::{PostFilter, SearchTerms};
use crate::models::{
    Comment, Follow, Group, NewComment, NewFollow, NewPost, Post, PostChanges, User,
};
use crate::pagination::{Listing, Window};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The (user, following) pair already exists.
    #[error("Follow edge already exists")]
    DuplicateFollow,

    #[error("Follow edge points at its own user")]
    SelfFollow,

    /// A foreign key target vanished between validation and write.
    #[error("Referenced {0} does not exist")]
    MissingReference(String),

    /// Another account claimed the username while it was being synced.
    #[error("Username is held by another account")]
    UsernameConflict,
}

/// Prefix for the placeholder name given to a user whose username the
/// identity provider has reassigned to another account.
pub const RELEASED_USERNAME_PREFIX: &str = "~";

pub fn released_username(id: Uuid) -> String {
    format!("{}{}", RELEASED_USERNAME_PREFIX, id)
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> StoreResult<()>;

    /// Mirror an authenticated identity into the local user table. The
    /// identity provider owns usernames, so a stale holder of `user.username`
    /// is renamed to `released_username(its id)` first.
    async fn sync_user(&self, user: &User) -> StoreResult<()>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn list_groups(&self, window: Window) -> StoreResult<Listing<Group>>;

    async fn find_group(&self, id: i64) -> StoreResult<Option<Group>>;

    async fn list_posts(&self, filter: PostFilter, window: Window) -> StoreResult<Listing<Post>>;

    async fn find_post(&self, id: i64) -> StoreResult<Option<Post>>;

    async fn insert_post(&self, new: NewPost) -> StoreResult<Post>;

    /// Returns `None` when the post no longer exists.
    async fn update_post(&self, id: i64, changes: PostChanges) -> StoreResult<Option<Post>>;

    async fn delete_post(&self, id: i64) -> StoreResult<bool>;

    async fn list_comments(&self, post_id: i64, window: Window) -> StoreResult<Listing<Comment>>;

    /// Looks the comment up within `post_id` only.
    async fn find_comment(&self, post_id: i64, id: i64) -> StoreResult<Option<Comment>>;

    async fn insert_comment(&self, new: NewComment) -> StoreResult<Comment>;

    async fn update_comment(
        &self,
        post_id: i64,
        id: i64,
        text: String,
    ) -> StoreResult<Option<Comment>>;

    async fn delete_comment(&self, post_id: i64, id: i64) -> StoreResult<bool>;

    /// Follow edges whose follower is `user_id`.
    async fn list_follows(
        &self,
        user_id: Uuid,
        search: &SearchTerms,
        window: Window,
    ) -> StoreResult<Listing<Follow>>;

    async fn find_follow(&self, user_id: Uuid, id: i64) -> StoreResult<Option<Follow>>;

    /// Whether `(user_id, following_id)` exists, ignoring the edge `exclude`.
    async fn follow_exists(
        &self,
        user_id: Uuid,
        following_id: Uuid,
        exclude: Option<i64>,
    ) -> StoreResult<bool>;

    /// Must fail with `DuplicateFollow` / `SelfFollow` rather than create an
    /// edge that breaks either invariant, even under concurrent inserts.
    async fn insert_follow(&self, new: NewFollow) -> StoreResult<Follow>;

    async fn update_follow(
        &self,
        user_id: Uuid,
        id: i64,
        following_id: Uuid,
    ) -> StoreResult<Option<Follow>>;

    async fn delete_follow(&self, user_id: Uuid, id: i64) -> StoreResult<bool>;
}
