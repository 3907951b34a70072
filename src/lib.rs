//! # batch-media
//!
//! HTTP service for two batch media jobs, each answering with a single ZIP
//! archive:
//!
//! - **Batch fetch**: a CSV of product SKUs and `;`-separated image URLs in,
//!   every reachable image out, named `{sku}_{n}.{ext}`. Unreachable URLs are
//!   logged and skipped.
//! - **Batch compress**: uploaded images in, re-encoded copies out (JPEG at a
//!   fixed quality, PNG losslessly optimised), plus a per-file size report.
//!   A file is never replaced by something larger, and a file that cannot be
//!   processed is copied through unchanged.
//!
//! Both batches run items with bounded concurrency and write results in input
//! order, so identical input yields an identical archive layout.
//!
//! ## Quick Start
//!
//! ```no_run
//! use batch_media::{Config, api::AppState};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::default());
//!     let state = AppState::new(config)?;
//!
//!     // Serves until SIGINT/SIGTERM
//!     batch_media::api::start_api_server(state).await?;
//!     Ok(())
//! }
//! ```
//!
//! The batch units can also be driven without HTTP:
//!
//! ```no_run
//! use batch_media::{BatchCompressor, CompressionPolicy, RasterCodec, UploadedFile};
//! use batch_media::config::FileCollisionAction;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> batch_media::Result<()> {
//! let compressor = BatchCompressor::new(
//!     Arc::new(RasterCodec::new()),
//!     CompressionPolicy::default(),
//!     4,
//!     FileCollisionAction::Rename,
//!     "report.txt",
//! );
//! let files = vec![UploadedFile::new("photo.jpg", std::fs::read("photo.jpg")?)];
//! let batch = compressor.run(files, &CancellationToken::new()).await?;
//! println!("{}", batch.report);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// In-memory ZIP archive assembly
pub mod archive;
/// Image decode/encode capability
pub mod codec;
/// Image compression unit and batch
pub mod compress;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Remote image fetching and batch fetch
pub mod fetch;
/// Optimisation report rendering
pub mod report;
/// Product table parsing
pub mod table;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use archive::ArchiveWriter;
pub use codec::{DecodedImage, EncodeParams, ImageCodec, ImageKind, RasterCodec};
pub use compress::{BatchCompressor, CompressedBatch, CompressionPolicy, compress_file};
pub use config::{Config, FileCollisionAction};
pub use error::{ApiError, CodecError, Error, ErrorDetail, FetchError, Result, ToHttpStatus};
pub use fetch::{BatchFetcher, FetchedBatch, HttpFetcher, ImageFetcher};
pub use report::BatchReport;
pub use table::parse_rows;
pub use types::{
    BatchTotals, CompressionOutcome, CompressionStatus, FetchFailure, FetchSummary, FetchedImage,
    Row, UploadedFile,
};

/// Resolve when the process receives a termination signal
///
/// - **Unix:** SIGTERM or SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// Used as the graceful-shutdown trigger for [`api::start_api_server`].
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Resolve when the process receives Ctrl+C
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
