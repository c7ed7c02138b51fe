/// Comment handlers - `/posts/{post_id}/comments/`
///
/// The caller is extracted before the body, so an anonymous write is a 401
/// even when the post does not exist or the payload is malformed.
use actix_web::{web, HttpRequest, HttpResponse};

use crate::db::Store;
use crate::error::Result;
use crate::identity::Caller;
use crate::pagination::{respond, PageParams, Window};
use crate::serializers::comments::{CommentPayload, CommentResponse};
use crate::services::CommentService;

pub async fn list_comments(
    req: HttpRequest,
    store: web::Data<dyn Store>,
    post_id: web::Path<i64>,
    page: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let window = Window::from_params(&page);
    let service = CommentService::new(store.into_inner());
    let comments = service.list_comments(*post_id, window).await?;
    Ok(respond(&req, window, comments.map(CommentResponse::from)))
}

pub async fn create_comment(
    caller: Caller,
    store: web::Data<dyn Store>,
    post_id: web::Path<i64>,
    payload: web::Json<CommentPayload>,
) -> Result<HttpResponse> {
    let service = CommentService::new(store.into_inner());
    let comment = service
        .create_comment(&caller, *post_id, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(CommentResponse::from(comment)))
}

pub async fn get_comment(
    store: web::Data<dyn Store>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let service = CommentService::new(store.into_inner());
    let comment = service.get_comment(post_id, comment_id).await?;
    Ok(HttpResponse::Ok().json(CommentResponse::from(comment)))
}

pub async fn replace_comment(
    caller: Caller,
    store: web::Data<dyn Store>,
    path: web::Path<(i64, i64)>,
    payload: web::Json<CommentPayload>,
) -> Result<HttpResponse> {
    update(caller, store, path.into_inner(), payload.into_inner(), false).await
}

pub async fn patch_comment(
    caller: Caller,
    store: web::Data<dyn Store>,
    path: web::Path<(i64, i64)>,
    payload: web::Json<CommentPayload>,
) -> Result<HttpResponse> {
    update(caller, store, path.into_inner(), payload.into_inner(), true).await
}

async fn update(
    caller: Caller,
    store: web::Data<dyn Store>,
    (post_id, comment_id): (i64, i64),
    payload: CommentPayload,
    partial: bool,
) -> Result<HttpResponse> {
    let service = CommentService::new(store.into_inner());
    let comment = service
        .update_comment(&caller, post_id, comment_id, payload, partial)
        .await?;
    Ok(HttpResponse::Ok().json(CommentResponse::from(comment)))
}

pub async fn delete_comment(
    caller: Caller,
    store: web::Data<dyn Store>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let service = CommentService::new(store.into_inner());
    service
        .delete_comment(&caller, post_id, comment_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
