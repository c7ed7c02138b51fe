/// HTTP handlers for blog endpoints
///
/// This module contains handlers for:
/// - Posts: list (filterable by group), create, and author-only update/delete
/// - Comments: nested under `/posts/{post_id}/comments/`
/// - Groups: read-only
/// - Follows: the caller's own follow edges, searchable by username
/// - Health: store probe and liveness
pub mod comments;
pub mod follows;
pub mod groups;
pub mod health;
pub mod posts;

use actix_web::{error::JsonPayloadError, error::QueryPayloadError, web, HttpRequest};

use crate::error::AppError;

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "rejected JSON body");
    AppError::ValidationError(err.to_string()).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}

/// Register every blog route under `/api/v1`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(
            web::scope("/api/v1")
                .route("/health", web::get().to(health::health_summary))
                .route("/health/live", web::get().to(health::liveness_check))
                .service(
                    web::resource("/posts/")
                        .route(web::get().to(posts::list_posts))
                        .route(web::post().to(posts::create_post)),
                )
                .service(
                    web::resource("/posts/{post_id}/")
                        .route(web::get().to(posts::get_post))
                        .route(web::put().to(posts::replace_post))
                        .route(web::patch().to(posts::patch_post))
                        .route(web::delete().to(posts::delete_post)),
                )
                .service(
                    web::resource("/posts/{post_id}/comments/")
                        .route(web::get().to(comments::list_comments))
                        .route(web::post().to(comments::create_comment)),
                )
                .service(
                    web::resource("/posts/{post_id}/comments/{comment_id}/")
                        .route(web::get().to(comments::get_comment))
                        .route(web::put().to(comments::replace_comment))
                        .route(web::patch().to(comments::patch_comment))
                        .route(web::delete().to(comments::delete_comment)),
                )
                .service(web::resource("/groups/").route(web::get().to(groups::list_groups)))
                .service(
                    web::resource("/groups/{group_id}/").route(web::get().to(groups::get_group)),
                )
                .service(
                    web::resource("/follow/")
                        .route(web::get().to(follows::list_follows))
                        .route(web::post().to(follows::create_follow)),
                )
                .service(
                    web::resource("/follow/{follow_id}/")
                        .route(web::get().to(follows::get_follow))
                        .route(web::put().to(follows::replace_follow))
                        .route(web::patch().to(follows::patch_follow))
                        .route(web::delete().to(follows::delete_follow)),
                ),
        );
}
