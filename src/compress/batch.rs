//! Batch compression: uploaded files in, optimised archive plus report out

use super::{CompressionPolicy, compress_file};
use crate::archive::ArchiveWriter;
use crate::codec::ImageCodec;
use crate::config::FileCollisionAction;
use crate::error::{Error, Result};
use crate::report::BatchReport;
use crate::types::{BatchTotals, CompressionOutcome, UploadedFile};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Result of a batch compression
#[derive(Debug, Clone)]
pub struct CompressedBatch {
    /// Serialized ZIP archive, report entry last
    pub archive: Vec<u8>,
    /// Per-file outcomes in input order, with final entry names
    pub outcomes: Vec<CompressionOutcome>,
    /// Aggregate sizes
    pub totals: BatchTotals,
    /// Rendered report text, as stored in the archive
    pub report: String,
}

/// Runs the compression unit over an upload
pub struct BatchCompressor {
    codec: Arc<dyn ImageCodec>,
    policy: CompressionPolicy,
    max_concurrent: usize,
    collision: FileCollisionAction,
    report_filename: String,
}

impl BatchCompressor {
    /// Create a batch compressor; a limit of 0 is treated as 1
    pub fn new(
        codec: Arc<dyn ImageCodec>,
        policy: CompressionPolicy,
        max_concurrent: usize,
        collision: FileCollisionAction,
        report_filename: impl Into<String>,
    ) -> Self {
        Self {
            codec,
            policy,
            max_concurrent: max_concurrent.max(1),
            collision,
            report_filename: report_filename.into(),
        }
    }

    /// Compress every file and package the results with a report
    ///
    /// Each file is processed on a blocking thread. Results are collected
    /// in upload order before anything is written.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyUpload`] if `files` is empty
    /// - [`Error::Cancelled`] if `cancel` fires first
    pub async fn run(
        &self,
        files: Vec<UploadedFile>,
        cancel: &CancellationToken,
    ) -> Result<CompressedBatch> {
        if files.is_empty() {
            return Err(Error::EmptyUpload);
        }

        info!(
            files = files.len(),
            concurrency = self.max_concurrent,
            codec = self.codec.name(),
            "starting batch compression"
        );

        let results: Vec<Result<(Vec<u8>, CompressionOutcome)>> = stream::iter(files)
            .map(|file| {
                let codec = Arc::clone(&self.codec);
                let policy = self.policy;
                let cancel = cancel.clone();
                async move {
                    if cancel.is_cancelled() {
                        return Err(Error::Cancelled);
                    }
                    let handle = tokio::task::spawn_blocking(move || {
                        compress_file(codec.as_ref(), &policy, file)
                    });
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(Error::Cancelled),
                        joined = handle => joined.map_err(|e| {
                            Error::Other(format!("compression task failed: {}", e))
                        }),
                    }
                }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        if cancel.is_cancelled() {
            info!("batch compression cancelled, discarding partial results");
            return Err(Error::Cancelled);
        }

        let mut archive = ArchiveWriter::new(self.collision);
        archive.reserve(&self.report_filename);

        // An overwritten entry replaces its report row too
        let mut rows: HashMap<String, usize> = HashMap::new();
        let mut outcomes = Vec::with_capacity(results.len());
        for result in results {
            let (bytes, mut outcome) = result?;
            match archive.add(&outcome.filename, bytes) {
                Some(stored) => {
                    outcome.filename = stored.clone();
                    match rows.get(&stored) {
                        Some(&row) => outcomes[row] = outcome,
                        None => {
                            rows.insert(stored, outcomes.len());
                            outcomes.push(outcome);
                        }
                    }
                }
                None => {
                    warn!(filename = %outcome.filename, "upload dropped from archive and report");
                }
            }
        }

        let report = BatchReport::new(outcomes);
        let rendered = report.render();
        let totals = report.totals();
        if !archive.add_reserved(&self.report_filename, rendered.clone().into_bytes()) {
            return Err(Error::Other(format!(
                "report entry name {} was not reserved",
                self.report_filename
            )));
        }

        info!(
            files = totals.files,
            original_bytes = totals.original_size,
            final_bytes = totals.final_size,
            reduction = %format!("{:.2}%", totals.reduction_percent()),
            "batch compression complete"
        );

        Ok(CompressedBatch {
            archive: archive.finish()?,
            outcomes: report.outcomes().to_vec(),
            totals,
            report: rendered,
        })
    }
}
