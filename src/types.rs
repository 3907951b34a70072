//! Core types shared by the fetch and compression pipelines

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// One product row from the tabular fetch input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Product identifier, used as the filename prefix
    pub sku: String,
    /// Image URLs in the order they appear in the `images` cell
    pub image_urls: Vec<String>,
}

impl Row {
    /// Build a row from the raw `sku` and `images` cells
    ///
    /// The images cell is split on `;`, each segment trimmed, and empty
    /// segments dropped. A missing or blank cell yields an empty list.
    pub fn from_cells(sku: &str, images: Option<&str>) -> Self {
        let image_urls = images
            .map(|cell| {
                cell.split(';')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            sku: sku.trim().to_string(),
            image_urls,
        }
    }

    /// Whether the row has no image URLs and should be skipped
    pub fn is_blank(&self) -> bool {
        self.image_urls.is_empty()
    }
}

/// A successfully fetched image ready for the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    /// Archive entry name, `{sku}_{ordinal}.{ext}`
    pub filename: String,
    /// Raw response body
    pub bytes: Vec<u8>,
}

/// A fetch that was skipped, kept for logging and summaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// Product the URL belongs to
    pub sku: String,
    /// Classified failure
    pub error: FetchError,
}

/// Accounting for one batch fetch request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Rows read from the table
    pub rows: usize,
    /// Rows skipped because their images cell was blank
    pub skipped_rows: usize,
    /// URLs fetched and written to the archive
    pub fetched: usize,
    /// URLs fetched but dropped because their entry name was taken (skip policy)
    pub duplicates: usize,
    /// URLs that failed and were skipped
    pub failures: Vec<FetchFailure>,
}

/// A file uploaded for compression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Caller-supplied filename, used verbatim as the archive entry name
    pub filename: String,
    /// Uploaded bytes
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Create an uploaded file
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// How a single uploaded file was handled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompressionStatus {
    /// Re-encoded as JPEG at the given quality
    OptimizedJpeg {
        /// Quality used for the re-encode
        quality: u8,
    },
    /// Re-encoded as PNG without pixel loss
    OptimizedPngLossless,
    /// Decodable but not a format we re-encode
    CopiedUnsupportedFormat {
        /// Detected format name, e.g. "GIF"
        format: String,
    },
    /// Not recognised as an image at all
    CopiedUndecodable,
    /// Processing failed; the original was copied through
    CopiedErrorFallback {
        /// Description of the failure
        message: String,
    },
}

impl fmt::Display for CompressionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionStatus::OptimizedJpeg { quality } => {
                write!(f, "Optimized (JPEG quality {quality})")
            }
            CompressionStatus::OptimizedPngLossless => write!(f, "Optimized (PNG lossless)"),
            CompressionStatus::CopiedUnsupportedFormat { format } => write!(f, "Copied ({format})"),
            CompressionStatus::CopiedUndecodable => write!(f, "Copied (not an optimizable format)"),
            CompressionStatus::CopiedErrorFallback { message } => {
                write!(f, "Processing error: {message}")
            }
        }
    }
}

/// Per-file result of the compression unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CompressionOutcome {
    /// Archive entry name (the uploaded filename)
    pub filename: String,
    /// Uploaded size in bytes
    pub original_size: u64,
    /// Size of the bytes written to the archive
    pub final_size: u64,
    /// What happened to the file
    pub status: CompressionStatus,
    /// The candidate was not smaller, so the original bytes were kept
    pub kept_original: bool,
}

impl CompressionOutcome {
    /// Bytes saved, never negative
    pub fn reduction_bytes(&self) -> u64 {
        self.original_size.saturating_sub(self.final_size)
    }

    /// Percentage saved, 0 for empty inputs
    pub fn reduction_percent(&self) -> f64 {
        reduction_percent(self.original_size, self.final_size)
    }

    /// Status text as shown in the report
    pub fn status_label(&self) -> String {
        if self.kept_original {
            format!("{} - kept original (no reduction)", self.status)
        } else {
            self.status.to_string()
        }
    }
}

/// Aggregate sizes over a sequence of outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchTotals {
    /// Number of files
    pub files: usize,
    /// Sum of uploaded sizes
    pub original_size: u64,
    /// Sum of archived sizes
    pub final_size: u64,
}

impl BatchTotals {
    /// Fold outcomes into totals
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a CompressionOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(BatchTotals::default(), |acc, outcome| BatchTotals {
                files: acc.files + 1,
                original_size: acc.original_size + outcome.original_size,
                final_size: acc.final_size + outcome.final_size,
            })
    }

    /// Bytes saved across the batch
    pub fn reduction_bytes(&self) -> u64 {
        self.original_size.saturating_sub(self.final_size)
    }

    /// Percentage saved across the batch, 0 for empty inputs
    pub fn reduction_percent(&self) -> f64 {
        reduction_percent(self.original_size, self.final_size)
    }
}

fn reduction_percent(original: u64, final_size: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - final_size as f64) / original as f64 * 100.0
}
