/// Stored records for blog-service
///
/// Rows come back from the store already joined with the usernames the wire
/// format needs, so serializers never have to reach back into storage.
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identity record owned by the identity provider. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub author_id: Uuid,
    pub author_username: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub group_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub text: String,
    pub image: Option<String>,
    pub group_id: Option<i64>,
}

/// Partial update. `None` leaves a column untouched; `Some(None)` clears a
/// nullable one.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub text: Option<String>,
    pub image: Option<Option<String>>,
    pub group_id: Option<Option<i64>>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub author_id: Uuid,
    pub author_username: String,
    pub post_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub author_id: Uuid,
    pub post_id: i64,
    pub text: String,
}

/// Directed follow edge: `user` follows `following`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    pub user_id: Uuid,
    pub user_username: String,
    pub following_id: Uuid,
    pub following_username: String,
}

#[derive(Debug, Clone, Copy)]
pub struct NewFollow {
    pub user_id: Uuid,
    pub following_id: Uuid,
}
