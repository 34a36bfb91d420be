//! Authentication middleware
//!
//! Requires `Authorization: Bearer <token>` on every non-public route. Failed
//! attempts count against the client's authentication window; once it is
//! exhausted the client gets 429 until the window resets.

use crate::server::middleware::helpers::{client_identifier, extract_bearer_token, is_public_route};
use crate::server::state::AppState;
use crate::utils::error::GatewayError;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::web;
use futures::future::{Ready, ready};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

/// Auth middleware for Actix-web
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

/// Service implementation for auth middleware
pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
            return forward(self.service.call(req));
        };

        if !state.config.auth().enabled || is_public_route(req.path()) {
            return forward(self.service.call(req));
        }

        let client_id = client_identifier(&req);

        if let Err(retry_after) = state.limiter.check_auth_allowed(&client_id) {
            warn!(client = %client_id, retry_after, "Client locked out after failed authentication");
            let err = GatewayError::rate_limit(
                format!(
                    "Too many failed authentication attempts. Try again in {} seconds",
                    retry_after
                ),
                retry_after,
            );
            return reject(req, err);
        }

        let rejection = match extract_bearer_token(req.headers()) {
            Some(token) if state.is_valid_token(token) => None,
            Some(_) => Some("Invalid API token"),
            None => Some("Missing bearer token"),
        };

        match rejection {
            None => {
                debug!("Bearer token accepted");
                forward(self.service.call(req))
            }
            Some(reason) => {
                state.limiter.record_auth_failure(&client_id);
                warn!(client = %client_id, path = %req.path(), reason, "Authentication failed");
                reject(req, GatewayError::unauthorized(reason))
            }
        }
    }
}

type AuthFuture<B> = Pin<Box<dyn Future<Output = Result<ServiceResponse<EitherBody<B>>, actix_web::Error>>>>;

fn forward<F, B>(fut: F) -> AuthFuture<B>
where
    F: Future<Output = Result<ServiceResponse<B>, actix_web::Error>> + 'static,
    B: MessageBody + 'static,
{
    Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
}

/// Answer without calling the inner service; rendered when polled so the
/// error body picks up the request id
fn reject<B>(req: ServiceRequest, err: GatewayError) -> AuthFuture<B>
where
    B: MessageBody + 'static,
{
    Box::pin(async move { Ok(req.error_response(err).map_into_right_body()) })
}
