//! Rate limiting middleware

use crate::server::middleware::helpers::{client_identifier, is_bulk_write, is_public_route};
use crate::server::state::AppState;
use crate::utils::error::GatewayError;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::web;
use futures::future::{Ready, ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use tracing::{debug, warn};

/// Rate limit middleware for Actix-web
///
/// Rejects with 429 when a window is exhausted and delays requests past the
/// slow-down threshold before handing them on.
pub struct RateLimitMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

/// Service implementation for rate limit middleware
pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let limiter = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.limiter.clone());

        let Some(limiter) = limiter.filter(|l| l.enabled() && !is_public_route(req.path()))
        else {
            return Box::pin(async move {
                service
                    .call(req)
                    .await
                    .map(ServiceResponse::map_into_left_body)
            });
        };

        let client_id = client_identifier(&req);
        let bulk_write = is_bulk_write(req.method(), req.path());

        Box::pin(async move {
            match limiter.check_request(&client_id, bulk_write) {
                Ok(delay) => {
                    if !delay.is_zero() {
                        debug!(client = %client_id, delay_ms = delay.as_millis() as u64, "Slowing down client");
                        tokio::time::sleep(delay).await;
                    }
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(retry_after) => {
                    warn!(client = %client_id, bulk_write, retry_after, "Rate limit exceeded");
                    let message = if bulk_write {
                        "Too many bulk write requests"
                    } else {
                        "Too many requests"
                    };
                    let err = GatewayError::rate_limit(message, retry_after);
                    Ok(req.error_response(err).map_into_right_body())
                }
            }
        })
    }
}
