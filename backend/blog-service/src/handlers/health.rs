/// Health endpoints
use actix_web::{web, HttpResponse};

use crate::db::Store;

pub async fn health_summary(store: web::Data<dyn Store>) -> HttpResponse {
    match store.health_check().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => {
            tracing::warn!(error = %e, "store health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "error": format!("Store check failed: {}", e),
                "service": "blog-service"
            }))
        }
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
