//! Configuration types for batch-media

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, time::Duration};
use utoipa::ToSchema;

/// Remote image fetching settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FetchConfig {
    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,

    /// Maximum number of in-flight fetches per batch (default: 4, 1 = sequential)
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent: usize,

    /// User-Agent header sent with every fetch
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_fetch_timeout(),
            max_concurrent: default_max_concurrent_fetches(),
            user_agent: default_user_agent(),
        }
    }
}

/// Image re-encoding settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CompressionConfig {
    /// JPEG re-encode quality, 1-100 (default: 85)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// oxipng optimisation preset for the lossless PNG pass, 0-6 (default: 2)
    #[serde(default = "default_png_optimization_level")]
    pub png_optimization_level: u8,

    /// Files larger than this are copied through untouched (default: 50 MB)
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Maximum number of files re-encoded at once (default: CPU count, capped at 4)
    #[serde(default = "default_max_concurrent_compressions")]
    pub max_concurrent: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            png_optimization_level: default_png_optimization_level(),
            max_file_bytes: default_max_file_bytes(),
            max_concurrent: default_max_concurrent_compressions(),
        }
    }
}

/// What to do when two archive entries map to the same name
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileCollisionAction {
    /// Append a counter: `name (1).ext`, `name (2).ext`, ... (default)
    #[default]
    Rename,
    /// Later entries replace earlier ones
    Overwrite,
    /// Later entries are dropped
    Skip,
}

/// Output archive settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ArchiveConfig {
    /// Archive entry collision handling
    #[serde(default)]
    pub collision: FileCollisionAction,

    /// Name of the report entry in compression archives
    #[serde(default = "default_report_filename")]
    pub report_filename: String,

    /// Suggested download name for batch fetch archives
    #[serde(default = "default_products_archive_name")]
    pub products_archive_name: String,

    /// Suggested download name for batch compression archives
    #[serde(default = "default_compressed_archive_name")]
    pub compressed_archive_name: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            collision: FileCollisionAction::default(),
            report_filename: default_report_filename(),
            products_archive_name: default_products_archive_name(),
            compressed_archive_name: default_compressed_archive_name(),
        }
    }
}

/// REST API server configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:5000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Maximum accepted request body in bytes (default: 256 MB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Main configuration
///
/// Every section and field has a default, so `{}` is a valid configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Remote image fetching
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Image re-encoding
    #[serde(default)]
    pub compression: CompressionConfig,

    /// Output archives
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ApiConfig,
}

impl Config {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_json_str(&contents)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.fetch.timeout.is_zero() {
            return Err(Error::config("fetch.timeout", "timeout must be at least 1 second"));
        }
        if self.fetch.max_concurrent == 0 {
            return Err(Error::config(
                "fetch.max_concurrent",
                "at least one concurrent fetch is required",
            ));
        }
        if !(1..=100).contains(&self.compression.jpeg_quality) {
            return Err(Error::config(
                "compression.jpeg_quality",
                format!(
                    "JPEG quality must be between 1 and 100, got {}",
                    self.compression.jpeg_quality
                ),
            ));
        }
        if self.compression.png_optimization_level > 6 {
            return Err(Error::config(
                "compression.png_optimization_level",
                format!(
                    "PNG optimization level must be between 0 and 6, got {}",
                    self.compression.png_optimization_level
                ),
            ));
        }
        if self.compression.max_concurrent == 0 {
            return Err(Error::config(
                "compression.max_concurrent",
                "at least one concurrent compression is required",
            ));
        }
        for (key, value) in [
            ("archive.report_filename", &self.archive.report_filename),
            ("archive.products_archive_name", &self.archive.products_archive_name),
            (
                "archive.compressed_archive_name",
                &self.archive.compressed_archive_name,
            ),
        ] {
            if value.trim().is_empty() {
                return Err(Error::config(key, "name must not be empty"));
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_fetch_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_user_agent() -> String {
    format!("batch-media/{}", env!("CARGO_PKG_VERSION"))
}

fn default_jpeg_quality() -> u8 {
    85
}

fn default_png_optimization_level() -> u8 {
    2
}

fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024 // 50 MB
}

fn default_max_concurrent_compressions() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(4)
}

fn default_report_filename() -> String {
    "relatorio_otimizacao.txt".into()
}

fn default_products_archive_name() -> String {
    "fotos_produtos.zip".into()
}

fn default_compressed_archive_name() -> String {
    "imagens_otimizadas.zip".into()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_max_body_bytes() -> usize {
    256 * 1024 * 1024
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
