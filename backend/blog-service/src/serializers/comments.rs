use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{required, trimmed};
use crate::error::Result;
use crate::models::Comment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub author: String,
    pub post: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            author: comment.author_username,
            post: comment.post_id,
            text: comment.text,
            created: comment.created,
        }
    }
}

/// Only `text` is writable; the post comes from the URL and the author from
/// the caller.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CommentPayload {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: Option<String>,
}

impl CommentPayload {
    /// Text for create and PUT, where it must be present.
    pub fn require_text(self) -> Result<String> {
        self.validate()?;
        required("text", self.text)
    }

    /// Text for PATCH, where it may be omitted.
    pub fn optional_text(self) -> Result<Option<String>> {
        self.validate()?;
        Ok(self.text)
    }
}
