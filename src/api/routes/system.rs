//! System handlers: health, configuration, OpenAPI.

use crate::api::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /config - Active configuration
#[utoipa::path(
    get,
    path = "/config",
    tag = "system",
    responses(
        (status = 200, description = "Current configuration", body = crate::config::Config)
    )
)]
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json((*state.config).clone())
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}
