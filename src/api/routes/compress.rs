//! Batch compression handler

use super::archive_response;
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::UploadedFile;
use axum::{
    extract::{Multipart, State},
    response::Response,
};
use tokio_util::sync::CancellationToken;

/// Multipart field carrying the uploaded images (repeated)
pub const FILES_FIELD: &str = "files";

/// POST /api/compress - Optimise uploaded images
///
/// The archive holds one entry per upload, under the uploaded filename,
/// followed by the optimisation report.
#[utoipa::path(
    post,
    path = "/api/compress",
    tag = "compress",
    request_body(content = Vec<u8>, description = "One or more images in repeated `files` fields (multipart/form-data)", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "ZIP archive of optimised images plus report", content_type = "application/zip", body = Vec<u8>),
        (status = 400, description = "No files uploaded or malformed body", body = crate::error::ApiError),
        (status = 503, description = "Request cancelled", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn compress_images(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidMultipart(e.to_string()))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidMultipart(e.to_string()))?;

        // Browsers send an empty unnamed part for an empty file input
        if filename.is_empty() && content.is_empty() {
            continue;
        }

        let filename = if filename.is_empty() {
            format!("file_{}", files.len() + 1)
        } else {
            filename
        };
        files.push(UploadedFile::new(filename, content.to_vec()));
    }

    if files.is_empty() {
        return Err(Error::EmptyUpload);
    }

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let batch = state.batch_compressor().run(files, &cancel).await?;

    Ok(archive_response(
        batch.archive,
        &state.config.archive.compressed_archive_name,
        &[],
    ))
}
