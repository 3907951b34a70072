//! REST API server module
//!
//! Exposes the two batch operations as multipart endpoints that answer with
//! ZIP attachments, plus health, configuration and OpenAPI documentation.

use crate::{Config, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Batch operations
/// - `POST /api/download-products` - Fetch product images listed in a CSV (`csv-file` field)
/// - `POST /api/compress` - Optimise uploaded images (`files` field, repeated)
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /config` - Active configuration
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let router = Router::new()
        // Batch operations
        .route("/api/download-products", post(routes::download_products))
        .route("/api/compress", post(routes::compress_images))
        // System
        .route("/health", get(routes::health_check))
        .route("/config", get(routes::get_config))
        .route("/openapi.json", get(routes::openapi_spec));

    // Merge Swagger UI routes before applying state
    let router = if config.server.swagger_ui {
        router.merge(
            SwaggerUi::new("/swagger-ui").url("/swagger-ui/openapi.json", ApiDoc::openapi()),
        )
    } else {
        router
    };

    let router = router
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(TraceLayer::new_for_http());

    if config.server.cors_enabled {
        router.layer(build_cors_layer(&config.server.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` or an empty list allows any origin; otherwise only the listed
/// origins are allowed. Methods and headers are unrestricted.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any)
    }
}

/// Serve the API on an already-bound listener until `shutdown` resolves
///
/// In-flight requests are allowed to finish after the shutdown signal.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

/// Start the API server on the configured bind address
///
/// Runs until SIGINT or SIGTERM, then drains in-flight requests.
///
/// # Example
///
/// ```no_run
/// use batch_media::{Config, api::AppState};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let state = AppState::new(config.clone())?;
///
/// // Blocks until a termination signal arrives
/// batch_media::api::start_api_server(state).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(state: AppState) -> Result<()> {
    let config: Arc<Config> = Arc::clone(&state.config);
    let bind_address = config.server.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().map_err(crate::error::Error::Io)?,
        "API server listening"
    );

    serve(listener, state, crate::shutdown_signal()).await
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
