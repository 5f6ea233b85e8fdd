use super::shutdown::{ShutdownCoordinator, coordinated_shutdown};
use crate::errors::handlers::{method_not_allowed, not_found};
use crate::http::{create_cors_layer, enforce_body_limit, enforce_deadline, security_headers};
use axum::{Json, Router, extract::DefaultBodyLimit, middleware, routing::get};
use core_config::server::ServerConfig;
use std::io;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;

/// Cross-cutting limits applied by [`create_router`].
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Allowed CORS origins; `"*"` allows any.
    pub cors_origins: Vec<String>,
    /// Largest accepted request body.
    pub body_limit_bytes: usize,
    /// Upper bound on the time to answer any request.
    pub request_timeout: Duration,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            cors_origins: vec!["*".to_string()],
            body_limit_bytes: 10 * 1024 * 1024,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Bound every route of `router` by `options.request_timeout` and cap request
/// bodies at `options.body_limit_bytes`.
///
/// `create_router` applies this already. Routers assembled without it call
/// it directly.
pub fn with_limits(router: Router, options: &RouterOptions) -> Router {
    router
        .layer(DefaultBodyLimit::max(options.body_limit_bytes))
        .layer(middleware::from_fn_with_state(
            options.body_limit_bytes,
            enforce_body_limit,
        ))
        .layer(middleware::from_fn_with_state(
            options.request_timeout,
            enforce_deadline,
        ))
}

/// Combines domain routes with documentation and the shared middleware stack.
///
/// Routes are mounted at the root, not under a prefix: hook clients call
/// `/vectors/search` directly. The stack, outermost first:
///
/// - compression
/// - CORS from `options.cors_origins`
/// - security headers
/// - request tracing
/// - end-to-end deadline (`options.request_timeout`)
/// - declared body size check, then a buffering cap of the same size
///
/// Documentation is served at `/docs` (Scalar) and `/api-docs/openapi.json`.
///
/// # Errors
/// Returns an error when the CORS origin list is empty or malformed.
pub fn create_router<T>(apis: Router, options: &RouterOptions) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    use utoipa_scalar::{Scalar, Servable as ScalarServable};

    let cors_layer = create_cors_layer(&options.cors_origins)?;

    let router = Router::new()
        .merge(Scalar::with_url("/docs", T::openapi()))
        .route("/api-docs/openapi.json", get(|| async { Json(T::openapi()) }))
        .merge(apis)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed);

    let router = with_limits(router, options)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer)
        .layer(CompressionLayer::new());

    Ok(router)
}

/// Server with coordinated shutdown and a bounded cleanup step.
///
/// # Arguments
/// * `router` - The configured Axum router
/// * `server_config` - Listen address
/// * `shutdown_timeout` - Upper bound for `cleanup` after the signal arrives
/// * `cleanup` - Work to run once shutdown starts (flush, close clients)
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (coordinator, mut shutdown_rx) = ShutdownCoordinator::new();
    let signal_handle = coordinator.clone();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let cleanup_handle = tokio::spawn(async move {
        let _ = shutdown_rx.recv().await;

        info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
        match tokio::time::timeout(shutdown_timeout, cleanup).await {
            Ok(_) => info!("Cleanup completed successfully"),
            Err(_) => {
                tracing::warn!(
                    "Cleanup exceeded timeout of {:?}, forcing shutdown",
                    shutdown_timeout
                );
            }
        }
    });

    let serve_result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(coordinated_shutdown(coordinator))
        .await
        .inspect_err(|e| {
            tracing::error!("Server encountered an error: {:?}", e);
        });

    // Unblocks cleanup when the server stopped without a signal.
    signal_handle.shutdown();
    cleanup_handle.await.ok();

    serve_result
}
