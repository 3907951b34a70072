//! Batch fetch handler

use super::archive_response;
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::table::parse_rows;
use axum::{
    extract::{Multipart, State},
    response::Response,
};
use tokio_util::sync::CancellationToken;

/// Multipart field carrying the product table
pub const CSV_FIELD: &str = "csv-file";

/// Response header with the number of images written to the archive
pub const FETCH_SUCCEEDED_HEADER: &str = "x-fetch-succeeded";
/// Response header with the number of URLs that failed and were skipped
pub const FETCH_FAILED_HEADER: &str = "x-fetch-failed";

/// POST /api/download-products - Fetch all product images into one archive
///
/// Individual URLs that fail are logged and left out of the archive; they
/// never fail the request.
#[utoipa::path(
    post,
    path = "/api/download-products",
    tag = "products",
    request_body(content = Vec<u8>, description = "CSV with `sku` and `images` columns in the `csv-file` field (multipart/form-data)", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "ZIP archive of fetched images", content_type = "application/zip", body = Vec<u8>),
        (status = 400, description = "Missing field, unreadable table or missing columns", body = crate::error::ApiError),
        (status = 503, description = "Request cancelled", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn download_products(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut table: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidMultipart(e.to_string()))?
    {
        if field.name() == Some(CSV_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::InvalidMultipart(e.to_string()))?;
            table = Some(bytes.to_vec());
        }
    }

    let table = table.ok_or_else(|| Error::MissingField(CSV_FIELD.to_string()))?;
    let rows = parse_rows(&table)?;

    // Dropping the handler future (client gone) cancels in-flight fetches
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let batch = state.batch_fetcher().run(rows, &cancel).await?;

    Ok(archive_response(
        batch.archive,
        &state.config.archive.products_archive_name,
        &[
            (FETCH_SUCCEEDED_HEADER, batch.summary.fetched.to_string()),
            (FETCH_FAILED_HEADER, batch.summary.failures.len().to_string()),
        ],
    ))
}
