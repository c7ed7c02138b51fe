//! Prometheus metrics for blog-service.
//!
//! Collectors are registered in the default registry and rendered by the
//! `/metrics` handler.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// HTTP request latency by method, matched route and status.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "blog_http_request_duration_seconds",
        "HTTP request duration segmented by method, route and status",
        &["method", "route", "status"]
    )
    .expect("failed to register blog_http_request_duration_seconds");

    /// Writes rejected because the caller does not own the record.
    pub static ref PERMISSION_DENIED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_permission_denied_total",
        "Mutations rejected by ownership checks segmented by resource",
        &["resource"]
    )
    .expect("failed to register blog_permission_denied_total");

    /// Follow attempts rejected by validation (self, duplicate, unknown).
    pub static ref FOLLOW_REJECTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_follow_rejected_total",
        "Follow writes rejected segmented by reason",
        &["reason"]
    )
    .expect("failed to register blog_follow_rejected_total");

    /// Records written, by resource and operation.
    pub static ref RECORD_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_record_writes_total",
        "Successful writes segmented by resource and operation",
        &["resource", "op"]
    )
    .expect("failed to register blog_record_writes_total");
}

pub fn record_write(resource: &str, op: &str) {
    RECORD_WRITES_TOTAL.with_label_values(&[resource, op]).inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
