//! Traits and types for image decoding and re-encoding

use crate::error::CodecError;
use image::{DynamicImage, ImageFormat};
use std::fmt;

/// Detected container format of an uploaded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageKind {
    /// JPEG family (`jpeg`, `jpg`)
    Jpeg,
    /// PNG
    Png,
    /// Any other decodable format, by display name (e.g. "GIF", "WEBP")
    Other(String),
}

impl ImageKind {
    /// Map a format name to a kind, ignoring case
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => ImageKind::Jpeg,
            "png" => ImageKind::Png,
            _ => ImageKind::Other(name.to_ascii_uppercase()),
        }
    }

    /// Display name used in reports
    pub fn name(&self) -> &str {
        match self {
            ImageKind::Jpeg => "JPEG",
            ImageKind::Png => "PNG",
            ImageKind::Other(name) => name,
        }
    }
}

impl From<ImageFormat> for ImageKind {
    fn from(format: ImageFormat) -> Self {
        ImageKind::from_name(&format!("{:?}", format))
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded image together with the format it was stored in
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Detected source format
    pub kind: ImageKind,
    /// Decoded pixel buffer
    pub pixels: DynamicImage,
}

/// Target encoding for a re-encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeParams {
    /// Lossy JPEG at the given quality (1-100)
    Jpeg {
        /// Encoder quality
        quality: u8,
    },
    /// Lossless PNG with an optimiser pass at the given preset (0-6)
    PngLossless {
        /// Optimiser preset
        optimization_level: u8,
    },
}

/// Decode/encode capability used by the compression unit
///
/// Implementations are synchronous and CPU-bound; the batch runs them on
/// blocking threads.
pub trait ImageCodec: Send + Sync {
    /// Decode raw bytes, detecting the format
    ///
    /// # Errors
    ///
    /// - [`CodecError::Unrecognized`] if the bytes are not in a known image format
    /// - [`CodecError::Decode`] if the format is known but the data is corrupt
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError>;

    /// Encode a decoded image with the given parameters
    fn encode(&self, image: &DecodedImage, params: EncodeParams) -> Result<Vec<u8>, CodecError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
