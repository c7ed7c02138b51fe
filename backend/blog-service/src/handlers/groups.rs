/// Group handlers - read-only
use actix_web::{web, HttpRequest, HttpResponse};

use crate::db::Store;
use crate::error::Result;
use crate::pagination::{respond, PageParams, Window};
use crate::serializers::groups::GroupResponse;
use crate::services::GroupService;

pub async fn list_groups(
    req: HttpRequest,
    store: web::Data<dyn Store>,
    page: web::Query<PageParams>,
) -> Result<HttpResponse> {
    let window = Window::from_params(&page);
    let groups = GroupService::new(store.into_inner())
        .list_groups(window)
        .await?;
    Ok(respond(&req, window, groups.map(GroupResponse::from)))
}

pub async fn get_group(
    store: web::Data<dyn Store>,
    group_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let group = GroupService::new(store.into_inner())
        .get_group(*group_id)
        .await?;
    Ok(HttpResponse::Ok().json(GroupResponse::from(group)))
}
