//! Wire formats for blog-service.
//!
//! Each entity has an explicit response struct built from its stored record
//! and, where clients may write it, a payload struct listing exactly the
//! writable fields. Anything else a client sends (`id`, `author`, `post`,
//! `user`, timestamps) is dropped during deserialization.

pub mod comments;
pub mod follows;
pub mod groups;
pub mod posts;

use serde::{Deserialize, Deserializer};

use crate::error::{AppError, Result};

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const BLANK_MESSAGE: &str = "This field may not be blank.";

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Pair with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Optional string with surrounding whitespace removed.
pub fn trimmed<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(|s| s.trim().to_string()))
}

/// Unwrap a field that must be present for this operation.
pub(crate) fn required<T>(field: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| AppError::ValidationError(format!("{}: {}", field, REQUIRED_MESSAGE)))
}
