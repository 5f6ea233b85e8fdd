//! Server infrastructure module.
//!
//! This module provides:
//! - Router assembly with OpenAPI documentation and admission limits
//! - Health aggregation for supervisor polling
//! - Graceful shutdown coordination

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{RouterOptions, create_production_app, create_router, with_limits};
pub use health::{HealthCheckFuture, run_health_checks};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
