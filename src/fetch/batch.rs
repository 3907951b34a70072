//! Batch fetch: table rows in, ZIP archive of product images out

use super::ImageFetcher;
use crate::archive::ArchiveWriter;
use crate::config::FileCollisionAction;
use crate::error::{Error, FetchError, Result};
use crate::types::{FetchFailure, FetchSummary, FetchedImage, Row};
use crate::utils::image_filename;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of a batch fetch
#[derive(Debug, Clone)]
pub struct FetchedBatch {
    /// Serialized ZIP archive
    pub archive: Vec<u8>,
    /// What was fetched and what was skipped
    pub summary: FetchSummary,
}

/// One URL to fetch, with the name it will be stored under
#[derive(Debug, Clone)]
struct FetchJob {
    sku: String,
    url: String,
    filename: String,
}

/// Fetches every image listed in a product table
///
/// Up to `max_concurrent` requests are in flight at once. Results are
/// written to the archive in table order regardless of completion order,
/// so the same input always yields the same entry list.
pub struct BatchFetcher {
    fetcher: Arc<dyn ImageFetcher>,
    max_concurrent: usize,
    collision: FileCollisionAction,
}

impl BatchFetcher {
    /// Create a batch fetcher; a limit of 0 is treated as 1
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        max_concurrent: usize,
        collision: FileCollisionAction,
    ) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
            collision,
        }
    }

    /// Fetch all images for `rows` and package them
    ///
    /// Individual fetch failures are logged and skipped. The only error is
    /// [`Error::Cancelled`] when `cancel` fires before the batch completes,
    /// or an archive serialization failure.
    pub async fn run(&self, rows: Vec<Row>, cancel: &CancellationToken) -> Result<FetchedBatch> {
        let mut summary = FetchSummary {
            rows: rows.len(),
            ..FetchSummary::default()
        };

        let mut jobs = Vec::new();
        for row in rows {
            if row.is_blank() {
                debug!(sku = %row.sku, "row has no image URLs, skipping");
                summary.skipped_rows += 1;
                continue;
            }
            for (index, url) in row.image_urls.iter().enumerate() {
                jobs.push(FetchJob {
                    sku: row.sku.clone(),
                    filename: image_filename(&row.sku, index + 1, url),
                    url: url.clone(),
                });
            }
        }

        info!(
            rows = summary.rows,
            urls = jobs.len(),
            concurrency = self.max_concurrent,
            fetcher = self.fetcher.name(),
            "starting batch fetch"
        );

        let results: Vec<(FetchJob, std::result::Result<FetchedImage, FetchError>)> =
            stream::iter(jobs)
                .map(|job| {
                    let fetcher = Arc::clone(&self.fetcher);
                    let cancel = cancel.clone();
                    async move {
                        let result = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => Err(FetchError::Cancelled {
                                url: job.url.clone(),
                            }),
                            body = fetcher.get(&job.url) => body.map(|bytes| FetchedImage {
                                filename: job.filename.clone(),
                                bytes,
                            }),
                        };
                        (job, result)
                    }
                })
                .buffered(self.max_concurrent)
                .collect()
                .await;

        if cancel.is_cancelled() {
            info!("batch fetch cancelled, discarding partial results");
            return Err(Error::Cancelled);
        }

        let mut archive = ArchiveWriter::new(self.collision);
        for (job, result) in results {
            match result {
                Ok(image) => {
                    if archive.add(&image.filename, image.bytes).is_some() {
                        summary.fetched += 1;
                    } else {
                        summary.duplicates += 1;
                    }
                }
                Err(error) => {
                    warn!(
                        sku = %job.sku,
                        url = %job.url,
                        error = %error,
                        "failed to fetch image, skipping"
                    );
                    summary.failures.push(FetchFailure {
                        sku: job.sku,
                        error,
                    });
                }
            }
        }

        info!(
            fetched = summary.fetched,
            failed = summary.failures.len(),
            duplicates = summary.duplicates,
            skipped_rows = summary.skipped_rows,
            "batch fetch complete"
        );

        Ok(FetchedBatch {
            archive: archive.finish()?,
            summary,
        })
    }
}
