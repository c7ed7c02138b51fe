/// PostgreSQL store
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, RELEASED_USERNAME_PREFIX};
use crate::filters::{PostFilter, SearchTerms};
use crate::models::{
    Comment, Follow, Group, NewComment, NewFollow, NewPost, Post, PostChanges, User,
};
use crate::pagination::{Listing, Window};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

const FOLLOW_UNIQUE_CONSTRAINT: &str = "follows_user_following_key";
const FOLLOW_SELF_CONSTRAINT: &str = "follows_no_self_follow";
const USERNAME_UNIQUE_CONSTRAINT: &str = "users_username_key";

const POST_COLUMNS: &str = r#"
    p.id, p.author_id, u.username AS author_username, p.text, p.pub_date, p.image, p.group_id
"#;

const COMMENT_COLUMNS: &str = r#"
    c.id, c.author_id, u.username AS author_username, c.post_id, c.text, c.created
"#;

const FOLLOW_SELECT: &str = r#"
    SELECT f.id, f.user_id, u.username AS user_username,
           f.following_id, t.username AS following_username
    FROM follows f
    JOIN users u ON u.id = f.user_id
    JOIN users t ON t.id = f.following_id
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn try_sync_user(&self, user: &User) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users
            SET username = $3 || id::TEXT
            WHERE username = $2 AND id <> $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(RELEASED_USERNAME_PREFIX)
        .execute(&mut *tx)
        .await
        .map_err(classify)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET username = EXCLUDED.username
            WHERE users.username <> EXCLUDED.username
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .execute(&mut *tx)
        .await
        .map_err(classify)?;

        tx.commit().await?;
        Ok(())
    }
}

/// Translate constraint violations into the store's domain errors.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let code = db_err.code();
        let constraint = db_err.constraint().unwrap_or_default();
        match code.as_deref() {
            Some(UNIQUE_VIOLATION) if constraint == FOLLOW_UNIQUE_CONSTRAINT => {
                return StoreError::DuplicateFollow
            }
            Some(CHECK_VIOLATION) if constraint == FOLLOW_SELF_CONSTRAINT => {
                return StoreError::SelfFollow
            }
            Some(UNIQUE_VIOLATION) if constraint == USERNAME_UNIQUE_CONSTRAINT => {
                return StoreError::UsernameConflict
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return StoreError::MissingReference(constraint.to_string())
            }
            _ => {}
        }
    }
    StoreError::Database(err)
}

fn push_follow_scope(qb: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, search: &SearchTerms) {
    qb.push(" WHERE f.user_id = ").push_bind(user_id);
    for pattern in search.like_patterns() {
        qb.push(" AND (u.username ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.username ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn sync_user(&self, user: &User) -> StoreResult<()> {
        // one retry covers a concurrent sync that claimed the name first
        match self.try_sync_user(user).await {
            Err(StoreError::UsernameConflict) => self.try_sync_user(user).await,
            other => other,
        }
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_groups(&self, window: Window) -> StoreResult<Listing<Group>> {
        let items = sqlx::query_as::<_, Group>(
            r#"
            SELECT id, title, slug, description
            FROM groups
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM groups")
            .fetch_one(&self.pool)
            .await?;

        Ok(Listing { items, total })
    }

    async fn find_group(&self, id: i64) -> StoreResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    async fn list_posts(&self, filter: PostFilter, window: Window) -> StoreResult<Listing<Post>> {
        let items = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE ($1::BIGINT IS NULL OR p.group_id = $1)
            ORDER BY p.id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(filter.group_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM posts p WHERE ($1::BIGINT IS NULL OR p.group_id = $1)",
        )
        .bind(filter.group_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Listing { items, total })
    }

    async fn find_post(&self, id: i64) -> StoreResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn insert_post(&self, new: NewPost) -> StoreResult<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            WITH p AS (
                INSERT INTO posts (author_id, text, image, group_id)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {POST_COLUMNS}
            FROM p
            JOIN users u ON u.id = p.author_id
            "#
        ))
        .bind(new.author_id)
        .bind(new.text)
        .bind(new.image)
        .bind(new.group_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        Ok(post)
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> StoreResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            WITH p AS (
                UPDATE posts
                SET text = COALESCE($2, text),
                    image = CASE WHEN $3::BOOLEAN THEN $4 ELSE image END,
                    group_id = CASE WHEN $5::BOOLEAN THEN $6 ELSE group_id END
                WHERE id = $1
                RETURNING *
            )
            SELECT {POST_COLUMNS}
            FROM p
            JOIN users u ON u.id = p.author_id
            "#
        ))
        .bind(id)
        .bind(changes.text)
        .bind(changes.image.is_some())
        .bind(changes.image.flatten())
        .bind(changes.group_id.is_some())
        .bind(changes.group_id.flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        Ok(post)
    }

    async fn delete_post(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, post_id: i64, window: Window) -> StoreResult<Listing<Comment>> {
        let items = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(post_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Listing { items, total })
    }

    async fn find_comment(&self, post_id: i64, id: i64) -> StoreResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1 AND c.id = $2
            "#
        ))
        .bind(post_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn insert_comment(&self, new: NewComment) -> StoreResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            WITH c AS (
                INSERT INTO comments (author_id, post_id, text)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            SELECT {COMMENT_COLUMNS}
            FROM c
            JOIN users u ON u.id = c.author_id
            "#
        ))
        .bind(new.author_id)
        .bind(new.post_id)
        .bind(new.text)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        Ok(comment)
    }

    async fn update_comment(
        &self,
        post_id: i64,
        id: i64,
        text: String,
    ) -> StoreResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            WITH c AS (
                UPDATE comments
                SET text = $3
                WHERE post_id = $1 AND id = $2
                RETURNING *
            )
            SELECT {COMMENT_COLUMNS}
            FROM c
            JOIN users u ON u.id = c.author_id
            "#
        ))
        .bind(post_id)
        .bind(id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn delete_comment(&self, post_id: i64, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE post_id = $1 AND id = $2")
            .bind(post_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_follows(
        &self,
        user_id: Uuid,
        search: &SearchTerms,
        window: Window,
    ) -> StoreResult<Listing<Follow>> {
        let mut qb = QueryBuilder::<Postgres>::new(FOLLOW_SELECT);
        push_follow_scope(&mut qb, user_id, search);
        qb.push(" ORDER BY f.id LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset);
        let items = qb.build_query_as::<Follow>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new(
            r#"
            SELECT COUNT(*)
            FROM follows f
            JOIN users u ON u.id = f.user_id
            JOIN users t ON t.id = f.following_id
            "#,
        );
        push_follow_scope(&mut count, user_id, search);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        Ok(Listing { items, total })
    }

    async fn find_follow(&self, user_id: Uuid, id: i64) -> StoreResult<Option<Follow>> {
        let follow = sqlx::query_as::<_, Follow>(&format!(
            "{FOLLOW_SELECT} WHERE f.user_id = $1 AND f.id = $2"
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(follow)
    }

    async fn follow_exists(
        &self,
        user_id: Uuid,
        following_id: Uuid,
        exclude: Option<i64>,
    ) -> StoreResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM follows
                WHERE user_id = $1 AND following_id = $2
                  AND ($3::BIGINT IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(user_id)
        .bind(following_id)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_follow(&self, new: NewFollow) -> StoreResult<Follow> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO follows (user_id, following_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(new.user_id)
        .bind(new.following_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        self.find_follow(new.user_id, id)
            .await?
            .ok_or_else(|| StoreError::MissingReference("follow".to_string()))
    }

    async fn update_follow(
        &self,
        user_id: Uuid,
        id: i64,
        following_id: Uuid,
    ) -> StoreResult<Option<Follow>> {
        let updated: Option<(i64,)> = sqlx::query_as(
            "UPDATE follows SET following_id = $3 WHERE user_id = $1 AND id = $2 RETURNING id",
        )
        .bind(user_id)
        .bind(id)
        .bind(following_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        match updated {
            Some(_) => self.find_follow(user_id, id).await,
            None => Ok(None),
        }
    }

    async fn delete_follow(&self, user_id: Uuid, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
