//! # Axum Helpers
//!
//! Shared HTTP plumbing for the gateway binaries.
//!
//! ## Modules
//!
//! - **[`server`]**: Router assembly, health aggregation, graceful shutdown
//! - **[`http`]**: Middleware (security headers, CORS, body size and deadline limits)
//! - **[`errors`]**: Structured error responses with stable error codes
//! - **[`extractors`]**: Validated JSON extractor
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{RouterOptions, create_production_app, create_router};
//! use core_config::server::ServerConfig;
//! use std::time::Duration;
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api_routes = Router::new(); // Add your routes
//!     let router = create_router::<ApiDoc>(api_routes, &RouterOptions::default())?;
//!     let server = ServerConfig::new("0.0.0.0", 8000);
//!     create_production_app(router, &server, Duration::from_secs(30), async {}).await?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use server::{
    HealthCheckFuture, RouterOptions, ShutdownCoordinator, create_production_app, create_router,
    run_health_checks, shutdown_signal, with_limits,
};

pub use http::{create_cors_layer, enforce_body_limit, enforce_deadline, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::ValidatedJson;
