/// HTTP middleware utilities for blog-service
///
/// `IdentityMiddleware` resolves the bearer token once per request and stores
/// the `Caller` in request extensions. A request without an `Authorization`
/// header passes through anonymously; a header that does not resolve is
/// answered with 401 before any handler runs. Resolved callers are mirrored
/// into the app's `Store` when one is registered.
pub mod permissions;

pub use permissions::*;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest, ResponseError};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use crate::db::Store;
use crate::error::AppError;
use crate::identity::{bearer_token, Caller, IdentityError, IdentityProvider};
use crate::metrics::HTTP_REQUEST_DURATION_SECONDS;

pub const NOT_AUTHENTICATED_MESSAGE: &str = "Authentication credentials were not provided.";

// =====================================================================
// Identity
// =====================================================================

#[derive(Clone)]
pub struct IdentityMiddleware {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityMiddleware {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            service: Rc::new(service),
            provider: self.provider.clone(),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: Rc<S>,
    provider: Arc<dyn IdentityProvider>,
}

impl<S> IdentityMiddlewareService<S> {
    fn identify(&self, req: &ServiceRequest) -> Result<Option<Caller>, IdentityError> {
        let Some(header) = req.headers().get(AUTHORIZATION) else {
            return Ok(None);
        };
        let header = header.to_str().map_err(|_| IdentityError::InvalidToken)?;
        let token = bearer_token(header)?;
        self.provider.resolve(token).map(Some)
    }
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let identity = self.identify(&req);
        let service = self.service.clone();

        Box::pin(async move {
            let caller = match identity {
                Ok(caller) => caller,
                Err(err) => {
                    tracing::debug!(path = %req.path(), error = %err, "authentication failed");
                    let response = AppError::Unauthorized(err.to_string()).error_response();
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            if let Some(caller) = caller {
                // mirror the caller so they can be followed before writing anything
                if let Some(store) = req.app_data::<web::Data<dyn Store>>().cloned() {
                    if let Err(err) = store.sync_user(&caller.as_user()).await {
                        tracing::error!(caller = %caller.id, error = %err, "failed to sync caller");
                        let response = AppError::from(err).error_response();
                        return Ok(req.into_response(response).map_into_right_body());
                    }
                }
                req.extensions_mut().insert(caller);
            }

            service.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}

/// Extracting `Caller` makes a handler require authentication. Use
/// `Option<Caller>` for endpoints that also serve anonymous callers.
impl FromRequest for Caller {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Caller>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized(NOT_AUTHENTICATED_MESSAGE.to_string())),
        )
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed();

            let (route, status) = match &res {
                Ok(resp) => (
                    resp.request()
                        .match_pattern()
                        .unwrap_or_else(|| "unmatched".to_string()),
                    resp.status().as_u16().to_string(),
                ),
                Err(err) => (
                    "unmatched".to_string(),
                    err.as_response_error().status_code().as_u16().to_string(),
                ),
            };

            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[&method, &route, &status])
                .observe(elapsed.as_secs_f64());
            tracing::debug!(%method, %route, %status, elapsed_ms = elapsed.as_millis() as u64, "request completed");
            res
        })
    }
}
