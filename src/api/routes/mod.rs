//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`products`] - Batch image fetch from a product table
//! - [`compress`] - Batch image optimisation
//! - [`system`] - Health, configuration, OpenAPI

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

mod compress;
mod products;
mod system;

pub use compress::*;
pub use products::*;
pub use system::*;

/// Build a ZIP attachment response
pub(crate) fn archive_response(
    archive: Vec<u8>,
    download_name: &str,
    extra_headers: &[(&'static str, String)],
) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/zip"));

    let disposition = format!(
        "attachment; filename=\"{}\"",
        download_name.replace(['"', '\\', '\r', '\n'], "_")
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    for (name, value) in extra_headers {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(HeaderName::from_static(*name), value);
        }
    }

    (StatusCode::OK, headers, Body::from(archive)).into_response()
}
