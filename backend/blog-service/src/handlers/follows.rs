/// Follow handlers - every route requires an authenticated caller
use actix_web::{web, HttpRequest, HttpResponse};

use crate::db::Store;
use crate::error::Result;
use crate::filters::{SearchParams, SearchTerms};
use crate::identity::Caller;
use crate::pagination::{respond, PageParams, Window};
use crate::serializers::follows::{FollowPayload, FollowResponse};
use crate::services::FollowService;

/// The caller's follow edges, optionally `?search=<terms>`
pub async fn list_follows(
    req: HttpRequest,
    caller: Caller,
    store: web::Data<dyn Store>,
    page: web::Query<PageParams>,
    search: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let window = Window::from_params(&page);
    let terms = SearchTerms::parse(search.search.as_deref());

    let service = FollowService::new(store.into_inner());
    let follows = service.list_follows(&caller, &terms, window).await?;
    Ok(respond(&req, window, follows.map(FollowResponse::from)))
}

pub async fn create_follow(
    caller: Caller,
    store: web::Data<dyn Store>,
    payload: web::Json<FollowPayload>,
) -> Result<HttpResponse> {
    let service = FollowService::new(store.into_inner());
    let follow = service.create_follow(&caller, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(FollowResponse::from(follow)))
}

pub async fn get_follow(
    caller: Caller,
    store: web::Data<dyn Store>,
    follow_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = FollowService::new(store.into_inner());
    let follow = service.get_follow(&caller, *follow_id).await?;
    Ok(HttpResponse::Ok().json(FollowResponse::from(follow)))
}

pub async fn replace_follow(
    caller: Caller,
    store: web::Data<dyn Store>,
    follow_id: web::Path<i64>,
    payload: web::Json<FollowPayload>,
) -> Result<HttpResponse> {
    update(caller, store, *follow_id, payload.into_inner(), false).await
}

pub async fn patch_follow(
    caller: Caller,
    store: web::Data<dyn Store>,
    follow_id: web::Path<i64>,
    payload: web::Json<FollowPayload>,
) -> Result<HttpResponse> {
    update(caller, store, *follow_id, payload.into_inner(), true).await
}

async fn update(
    caller: Caller,
    store: web::Data<dyn Store>,
    follow_id: i64,
    payload: FollowPayload,
    partial: bool,
) -> Result<HttpResponse> {
    let service = FollowService::new(store.into_inner());
    let follow = service
        .update_follow(&caller, follow_id, payload, partial)
        .await?;
    Ok(HttpResponse::Ok().json(FollowResponse::from(follow)))
}

pub async fn delete_follow(
    caller: Caller,
    store: web::Data<dyn Store>,
    follow_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = FollowService::new(store.into_inner());
    service.delete_follow(&caller, *follow_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
