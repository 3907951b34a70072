//! Application state for the API server

use crate::codec::{ImageCodec, RasterCodec};
use crate::compress::{BatchCompressor, CompressionPolicy};
use crate::fetch::{BatchFetcher, HttpFetcher, ImageFetcher};
use crate::{Config, Result};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned per request (cheap Arc clones). Holds only immutable
/// configuration and stateless capabilities; every request builds its own
/// archive and outcome list.
#[derive(Clone)]
pub struct AppState {
    /// Active configuration
    pub config: Arc<Config>,

    /// Remote image source
    pub fetcher: Arc<dyn ImageFetcher>,

    /// Image decode/encode capability
    pub codec: Arc<dyn ImageCodec>,
}

impl AppState {
    /// Create state with the production HTTP fetcher and raster codec
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
        Ok(Self::with_components(
            config,
            fetcher,
            Arc::new(RasterCodec::new()),
        ))
    }

    /// Create state with explicit capabilities
    pub fn with_components(
        config: Arc<Config>,
        fetcher: Arc<dyn ImageFetcher>,
        codec: Arc<dyn ImageCodec>,
    ) -> Self {
        Self {
            config,
            fetcher,
            codec,
        }
    }

    /// Batch fetcher configured for one request
    pub fn batch_fetcher(&self) -> BatchFetcher {
        BatchFetcher::new(
            Arc::clone(&self.fetcher),
            self.config.fetch.max_concurrent,
            self.config.archive.collision,
        )
    }

    /// Batch compressor configured for one request
    pub fn batch_compressor(&self) -> BatchCompressor {
        BatchCompressor::new(
            Arc::clone(&self.codec),
            CompressionPolicy::from(&self.config.compression),
            self.config.compression.max_concurrent,
            self.config.archive.collision,
            self.config.archive.report_filename.clone(),
        )
    }
}
