//! Image codec capability
//!
//! The compression unit only sees the [`ImageCodec`] trait: decode bytes into a
//! pixel buffer plus detected format, and encode a pixel buffer with JPEG
//! quality or PNG lossless parameters. [`RasterCodec`] is the production
//! implementation; tests substitute fakes to drive the error paths.

mod raster;
mod traits;

pub use raster::RasterCodec;
pub use traits::{DecodedImage, EncodeParams, ImageCodec, ImageKind};
