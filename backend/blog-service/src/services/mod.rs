/// Business logic layer for blog-service
///
/// Each service runs one request pipeline against the `Store`:
/// resolve the record (and its parent), check ownership, validate the
/// payload, then persist. Handlers only translate HTTP in and out.
pub mod comments;
pub mod follows;
pub mod groups;
pub mod posts;

pub use comments::CommentService;
pub use follows::FollowService;
pub use groups::GroupService;
pub use posts::PostService;

use crate::error::AppError;

pub(crate) fn not_found(entity: &str) -> AppError {
    AppError::NotFound(format!("No {} matches the given query.", entity))
}
