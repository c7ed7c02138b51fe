/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpRequest, HttpResponse};

use crate::db::Store;
use crate::error::Result;
use crate::filters::{PostFilter, PostFilterParams};
use crate::identity::Caller;
use crate::pagination::{respond, PageParams, Window};
use crate::serializers::posts::{PostPayload, PostResponse};
use crate::services::PostService;

/// List posts, optionally `?group=<id>`
pub async fn list_posts(
    req: HttpRequest,
    store: web::Data<dyn Store>,
    page: web::Query<PageParams>,
    filter: web::Query<PostFilterParams>,
) -> Result<HttpResponse> {
    let filter = PostFilter::from_params(&filter)?;
    let window = Window::from_params(&page);

    let service = PostService::new(store.into_inner());
    let posts = service.list_posts(filter, window).await?;
    Ok(respond(&req, window, posts.map(PostResponse::from)))
}

/// Create a post authored by the caller
pub async fn create_post(
    caller: Caller,
    store: web::Data<dyn Store>,
    payload: web::Json<PostPayload>,
) -> Result<HttpResponse> {
    let service = PostService::new(store.into_inner());
    let post = service.create_post(&caller, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(PostResponse::from(post)))
}

pub async fn get_post(
    store: web::Data<dyn Store>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = PostService::new(store.into_inner());
    let post = service.get_post(*post_id).await?;
    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

/// Full update (PUT)
pub async fn replace_post(
    caller: Caller,
    store: web::Data<dyn Store>,
    post_id: web::Path<i64>,
    payload: web::Json<PostPayload>,
) -> Result<HttpResponse> {
    update(caller, store, *post_id, payload.into_inner(), false).await
}

/// Partial update (PATCH)
pub async fn patch_post(
    caller: Caller,
    store: web::Data<dyn Store>,
    post_id: web::Path<i64>,
    payload: web::Json<PostPayload>,
) -> Result<HttpResponse> {
    update(caller, store, *post_id, payload.into_inner(), true).await
}

async fn update(
    caller: Caller,
    store: web::Data<dyn Store>,
    post_id: i64,
    payload: PostPayload,
    partial: bool,
) -> Result<HttpResponse> {
    let service = PostService::new(store.into_inner());
    let post = service
        .update_post(&caller, post_id, payload, partial)
        .await?;
    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

pub async fn delete_post(
    caller: Caller,
    store: web::Data<dyn Store>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = PostService::new(store.into_inner());
    service.delete_post(&caller, *post_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
