use serde::{Deserialize, Serialize};

use super::{required, trimmed, BLANK_MESSAGE};
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::identity::Caller;
use crate::metrics::FOLLOW_REJECTED_TOTAL;
use crate::models::{Follow, User};

pub const SELF_FOLLOW_MESSAGE: &str = "You cannot follow yourself!";
pub const DUPLICATE_FOLLOW_MESSAGE: &str = "You are already following this author!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowResponse {
    pub id: i64,
    pub user: String,
    pub following: String,
}

impl From<Follow> for FollowResponse {
    fn from(follow: Follow) -> Self {
        Self {
            id: follow.id,
            user: follow.user_username,
            following: follow.following_username,
        }
    }
}

/// `following` is a username. `user` is always the caller and is never read
/// from input.
#[derive(Debug, Default, Deserialize)]
pub struct FollowPayload {
    #[serde(default, deserialize_with = "trimmed")]
    pub following: Option<String>,
}

impl FollowPayload {
    pub fn require_following(self) -> Result<String> {
        let following = required("following", self.following)?;
        if following.is_empty() {
            return Err(AppError::ValidationError(format!(
                "following: {}",
                BLANK_MESSAGE
            )));
        }
        Ok(following)
    }
}

fn reject(reason: &str, message: String) -> AppError {
    FOLLOW_REJECTED_TOTAL.with_label_values(&[reason]).inc();
    AppError::ValidationError(message)
}

/// Resolve `username` and check that `caller` may follow it.
///
/// `exclude` is the edge being updated, which must not count as its own
/// duplicate.
pub async fn validate_follow(
    store: &dyn Store,
    caller: &Caller,
    username: &str,
    exclude: Option<i64>,
) -> Result<User> {
    let target = store
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| {
            reject(
                "unknown_user",
                format!("following: Object with username={} does not exist.", username),
            )
        })?;

    if target.id == caller.id {
        tracing::debug!(caller = %caller.id, reason = "self", "follow rejected");
        return Err(reject("self", SELF_FOLLOW_MESSAGE.to_string()));
    }

    if store.follow_exists(caller.id, target.id, exclude).await? {
        tracing::debug!(caller = %caller.id, following = %target.id, reason = "duplicate", "follow rejected");
        return Err(reject("duplicate", DUPLICATE_FOLLOW_MESSAGE.to_string()));
    }

    Ok(target)
}
