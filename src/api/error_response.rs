//! HTTP error response handling for the API
//!
//! This module provides conversions from domain errors to HTTP responses
//! with appropriate status codes and JSON error bodies.

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let api_error: ApiError = self.into();

        (status_code, Json(api_error)).into_response()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> ApiError {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn missing_columns_is_bad_request_with_details() {
        let response = Error::MissingColumns {
            missing: vec!["sku".into(), "images".into()],
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let api_error = body_of(response).await;
        assert_eq!(api_error.error.code, "missing_columns");
        assert_eq!(
            api_error.error.details.unwrap()["missing"],
            serde_json::json!(["sku", "images"])
        );
    }

    #[tokio::test]
    async fn empty_upload_is_bad_request() {
        let response = Error::EmptyUpload.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await.error.code, "empty_upload");
    }

    #[tokio::test]
    async fn cancelled_is_service_unavailable() {
        let response = Error::Cancelled.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unexpected_failure_is_internal_error() {
        let response = Error::Other("zip writer closed".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await.error.code, "internal_error");
    }
}
