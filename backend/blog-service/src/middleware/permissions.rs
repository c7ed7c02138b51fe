/// Authorization module for blog-service
///
/// Ownership checks for posts and comments. Reads are open to everyone;
/// only the author may change or delete a record.
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::metrics::PERMISSION_DENIED_TOTAL;
use crate::models::{Comment, Post};

pub const NOT_OWNER_MESSAGE: &str = "You do not have permission to perform this action.";

fn deny(resource: &str, id: i64, user_id: Uuid) -> AppError {
    PERMISSION_DENIED_TOTAL.with_label_values(&[resource]).inc();
    tracing::info!(%user_id, resource, id, "ownership check failed");
    AppError::Forbidden(NOT_OWNER_MESSAGE.to_string())
}

/// Check if a user wrote a post
pub fn check_post_ownership(user_id: Uuid, post: &Post) -> Result<()> {
    if post.author_id == user_id {
        Ok(())
    } else {
        Err(deny("post", post.id, user_id))
    }
}

/// Check if a user wrote a comment
pub fn check_comment_ownership(user_id: Uuid, comment: &Comment) -> Result<()> {
    if comment.author_id == user_id {
        Ok(())
    } else {
        Err(deny("comment", comment.id, user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(author_id: Uuid) -> Post {
        Post {
            id: 1,
            author_id,
            author_username: "alice".into(),
            text: "hello".into(),
            pub_date: Utc::now(),
            image: None,
            group_id: None,
        }
    }

    #[test]
    fn author_may_modify_post() {
        let alice = Uuid::new_v4();
        assert!(check_post_ownership(alice, &post(alice)).is_ok());
    }

    #[test]
    fn stranger_is_forbidden() {
        let alice = Uuid::new_v4();
        let err = check_post_ownership(Uuid::new_v4(), &post(alice)).unwrap_err();
        assert_eq!(err, AppError::Forbidden(NOT_OWNER_MESSAGE.to_string()));
    }

    #[test]
    fn comment_ownership_uses_comment_author() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let comment = Comment {
            id: 9,
            author_id: bob,
            author_username: "bob".into(),
            post_id: 1,
            text: "nice".into(),
            created: Utc::now(),
        };
        assert!(check_comment_ownership(bob, &comment).is_ok());
        assert!(check_comment_ownership(alice, &comment).is_err());
    }
}
