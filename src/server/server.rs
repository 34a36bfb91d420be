//! HTTP server core implementation
//!
//! This module provides the HttpServer struct and the application factory
//! shared by the binary and the route tests.

use crate::config::{Config, ServerConfig};
use crate::server::middleware::{
    AuditMiddleware, AuthMiddleware, RateLimitMiddleware, RequestIdMiddleware,
};
use crate::server::routes;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{App, HttpRequest, HttpServer as ActixHttpServer, web};
use std::time::Duration;
use tracing::{debug, info};
use tracing_actix_web::TracingLogger;

/// How often idle rate-limit windows are dropped
const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the configured backend
    pub fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");
        let state = AppState::new(config.clone())?;
        Ok(Self::with_state(state))
    }

    /// Create a server around prepared state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config.server().clone(),
            state,
        }
    }

    /// Create the Actix-web application
    ///
    /// Middleware runs outermost first: tracing span, request id, audit,
    /// rate limit, then authentication.
    pub fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        debug!("Setting up routes and middleware");

        let json_config = web::JsonConfig::default()
            .limit(state.config.server().max_body_size)
            .error_handler(|err, _req| {
                GatewayError::validation(format!("Invalid request body: {}", err)).into()
            });

        App::new()
            .app_data(state)
            .app_data(json_config)
            .wrap(AuthMiddleware)
            .wrap(RateLimitMiddleware)
            .wrap(AuditMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .configure(routes::configure)
            .default_service(web::to(route_not_found))
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.address();

        info!("Starting HTTP server on {}", bind_addr);

        let limiter = self.state.limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(LIMITER_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                limiter.cleanup_old_entries();
            }
        });

        let state = web::Data::new(self.state);

        let mut server = ActixHttpServer::new(move || Self::create_app(state.clone()));
        if let Some(workers) = self.config.workers {
            server = server.workers(workers);
        }

        let server = server
            .bind(&bind_addr)
            .map_err(|e| GatewayError::config(format!("Failed to bind {}: {}", bind_addr, e)))?
            .run();

        info!("HTTP server listening on {}", bind_addr);

        server
            .await
            .map_err(|e| GatewayError::internal(format!("Server error: {}", e)))?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn route_not_found(req: HttpRequest) -> Result<actix_web::HttpResponse> {
    Err(GatewayError::not_found(format!(
        "No route for {} {}",
        req.method(),
        req.path()
    )))
}
