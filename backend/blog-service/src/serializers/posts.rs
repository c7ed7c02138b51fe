use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{double_option, required, trimmed};
use crate::error::{AppError, Result};
use crate::models::{NewPost, Post, PostChanges};

const IMAGE_MAX_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub group: Option<i64>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            author: post.author_username,
            text: post.text,
            pub_date: post.pub_date,
            image: post.image,
            group: post.group_id,
        }
    }
}

/// Writable post fields. `author` and `pub_date` are never read from input.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PostPayload {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub group: Option<Option<i64>>,
}

impl PostPayload {
    /// Group the post should point at after this write, if the payload names one.
    pub fn referenced_group(&self) -> Option<i64> {
        self.group.flatten()
    }

    fn check(&self) -> Result<()> {
        self.validate()?;
        match &self.image {
            Some(Some(path)) if path.chars().count() > IMAGE_MAX_LEN => {
                Err(AppError::ValidationError(format!(
                    "image: Ensure this field has no more than {} characters.",
                    IMAGE_MAX_LEN
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn into_new_post(self, author_id: Uuid) -> Result<NewPost> {
        self.check()?;
        Ok(NewPost {
            author_id,
            text: required("text", self.text)?,
            image: self.image.flatten(),
            group_id: self.group.flatten(),
        })
    }

    /// `partial` is PATCH semantics: every field is optional.
    pub fn into_changes(self, partial: bool) -> Result<PostChanges> {
        self.check()?;
        let text = if partial {
            self.text
        } else {
            Some(required("text", self.text)?)
        };
        Ok(PostChanges {
            text,
            image: self.image,
            group_id: self.group,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> PostPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn read_only_fields_are_ignored() {
        let p = payload(r#"{"text": "hi", "author": "mallory", "id": 99, "pub_date": "2020-01-01"}"#);
        let author = Uuid::new_v4();
        let new = p.into_new_post(author).unwrap();
        assert_eq!(new.author_id, author);
        assert_eq!(new.text, "hi");
    }

    #[test]
    fn create_requires_text() {
        let err = payload(r#"{"group": 1}"#)
            .into_new_post(Uuid::new_v4())
            .unwrap_err();
        assert_eq!(
            err,
            AppError::ValidationError("text: This field is required.".into())
        );
    }

    #[test]
    fn blank_text_is_rejected() {
        let err = payload(r#"{"text": "   "}"#)
            .into_new_post(Uuid::new_v4())
            .unwrap_err();
        assert_eq!(
            err,
            AppError::ValidationError("text: This field may not be blank.".into())
        );
    }

    #[test]
    fn patch_leaves_absent_fields_alone() {
        let changes = payload(r#"{"image": null}"#).into_changes(true).unwrap();
        assert_eq!(changes.text, None);
        assert_eq!(changes.image, Some(None));
        assert_eq!(changes.group_id, None);
    }

    #[test]
    fn put_requires_text() {
        assert!(payload(r#"{"group": null}"#).into_changes(false).is_err());
        let changes = payload(r#"{"text": "x", "group": null}"#)
            .into_changes(false)
            .unwrap();
        assert_eq!(changes.text.as_deref(), Some("x"));
        assert_eq!(changes.group_id, Some(None));
    }

    #[test]
    fn overlong_image_is_rejected() {
        let json = format!(r#"{{"text": "x", "image": "{}"}}"#, "a".repeat(300));
        assert!(payload(&json).into_new_post(Uuid::new_v4()).is_err());
    }

    #[test]
    fn response_renders_author_username_and_group_id() {
        let post = Post {
            id: 3,
            author_id: Uuid::new_v4(),
            author_username: "alice".into(),
            text: "hello".into(),
            pub_date: Utc::now(),
            image: None,
            group_id: Some(2),
        };
        let json = serde_json::to_value(PostResponse::from(post)).unwrap();
        assert_eq!(json["author"], "alice");
        assert_eq!(json["group"], 2);
        assert!(json["image"].is_null());
        assert!(json.get("author_id").is_none());
    }
}
