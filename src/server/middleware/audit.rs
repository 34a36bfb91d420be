//! Audit middleware
//!
//! Records one entry per request once the response status is known. The
//! entry is queued on the audit logger and written in the background.

use crate::server::middleware::request_id::{REQUEST_ID_HEADER, RequestId};
use crate::server::state::AppState;
use crate::utils::error::GatewayError;
use crate::utils::logging::AuditEntry;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::StatusCode;
use actix_web::{HttpMessage, web};
use futures::future::{Ready, ready};
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

/// Audit middleware for Actix-web
pub struct AuditMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuditMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = AuditMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuditMiddlewareService { service }))
    }
}

/// Service implementation for audit middleware
pub struct AuditMiddlewareService<S> {
    service: S,
}

/// Stable code and message for an error that ended a request
fn error_summary(error: &actix_web::Error) -> (String, String) {
    match error.as_error::<GatewayError>() {
        Some(e) => (e.code().to_string(), e.public_message()),
        None => (
            fallback_code(error.as_response_error().status_code()).to_string(),
            error.to_string(),
        ),
    }
}

fn fallback_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        s if s.is_client_error() => "BAD_REQUEST",
        _ => "INTERNAL_ERROR",
    }
}

impl<S, B> Service<ServiceRequest> for AuditMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(logger) = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.audit.clone())
        else {
            return Box::pin(self.service.call(req));
        };

        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .or_else(|| {
                req.headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|h| h.to_str().ok())
                    .map(str::to_string)
            });

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await;

            let (status, error) = match &res {
                Ok(res) => {
                    let error = res.response().error().map(error_summary).or_else(|| {
                        let status = res.status();
                        (status.is_client_error() || status.is_server_error()).then(|| {
                            (
                                fallback_code(status).to_string(),
                                status.canonical_reason().unwrap_or("Error").to_string(),
                            )
                        })
                    });
                    (res.status(), error)
                }
                Err(e) => (e.as_response_error().status_code(), Some(error_summary(e))),
            };

            let success = !(status.is_client_error() || status.is_server_error());
            let (error_code, error_message) = match error.filter(|_| !success) {
                Some((code, message)) => (Some(code), Some(message)),
                None => (None, None),
            };

            logger.record(AuditEntry {
                timestamp: chrono::Utc::now(),
                request_id,
                method,
                path,
                elapsed_ms: start_time.elapsed().as_millis() as u64,
                status: status.as_u16(),
                success,
                error_code,
                error_message,
            });

            res
        })
    }
}
