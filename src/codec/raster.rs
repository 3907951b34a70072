//! Codec backed by the `image` crate, with an `oxipng` pass for PNG

use super::traits::{DecodedImage, EncodeParams, ImageCodec, ImageKind};
use crate::error::CodecError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, DynamicImage, ImageEncoder};
use oxipng::{Options, StripChunks, optimize_from_memory};
use std::io::Cursor;
use std::time::Duration;

/// Default upper bound on time spent in the PNG optimiser per image
const PNG_OPTIMIZE_TIMEOUT: Duration = Duration::from_secs(10);

/// Production codec
#[derive(Debug, Clone)]
pub struct RasterCodec {
    png_timeout: Duration,
}

impl RasterCodec {
    /// Create a codec with the default PNG optimiser timeout
    pub fn new() -> Self {
        Self {
            png_timeout: PNG_OPTIMIZE_TIMEOUT,
        }
    }

    fn encode_jpeg(&self, pixels: &DynamicImage, quality: u8) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        let encoder = JpegEncoder::new_with_quality(&mut cursor, quality);

        // Re-encoding from pixels drops EXIF and other metadata segments
        let result = match pixels.color() {
            ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => {
                let luma = pixels.to_luma8();
                encoder.write_image(luma.as_raw(), luma.width(), luma.height(), ColorType::L8)
            }
            _ => {
                let rgb = pixels.to_rgb8();
                encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            }
        };

        result.map_err(|e| CodecError::Encode {
            format: ImageKind::Jpeg.name().to_string(),
            reason: e.to_string(),
        })?;
        Ok(buffer)
    }

    fn encode_png(&self, pixels: &DynamicImage, level: u8) -> Result<Vec<u8>, CodecError> {
        let encode_error = |reason: String| CodecError::Encode {
            format: ImageKind::Png.name().to_string(),
            reason,
        };

        let mut buffer = Vec::new();
        PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive)
            .write_image(
                pixels.as_bytes(),
                pixels.width(),
                pixels.height(),
                pixels.color(),
            )
            .map_err(|e| encode_error(e.to_string()))?;

        let mut options = Options::from_preset(level);
        options.strip = StripChunks::Safe;
        options.timeout = Some(self.png_timeout);

        optimize_from_memory(&buffer, &options).map_err(|e| encode_error(e.to_string()))
    }
}

impl Default for RasterCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCodec for RasterCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        let format = image::guess_format(bytes).map_err(|_| CodecError::Unrecognized)?;

        // A matching signature is not enough, the format header has to parse
        image::io::Reader::with_format(Cursor::new(bytes), format)
            .into_dimensions()
            .map_err(|_| CodecError::Unrecognized)?;
        let kind = ImageKind::from(format);

        let pixels =
            image::load_from_memory_with_format(bytes, format).map_err(|e| CodecError::Decode {
                format: kind.name().to_string(),
                reason: e.to_string(),
            })?;

        Ok(DecodedImage { kind, pixels })
    }

    fn encode(&self, image: &DecodedImage, params: EncodeParams) -> Result<Vec<u8>, CodecError> {
        match params {
            EncodeParams::Jpeg { quality } => self.encode_jpeg(&image.pixels, quality),
            EncodeParams::PngLossless { optimization_level } => {
                self.encode_png(&image.pixels, optimization_level)
            }
        }
    }

    fn name(&self) -> &'static str {
        "raster"
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb, RgbImage};

    fn sample_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(32, 24, |x, y| {
            Rgb([(x * 8) as u8, (y * 10) as u8, ((x + y) * 4) as u8])
        }))
    }

    fn encoded(format: ImageOutputFormat) -> Vec<u8> {
        let mut buffer = Vec::new();
        sample_image()
            .write_to(&mut Cursor::new(&mut buffer), format)
            .unwrap();
        buffer
    }

    #[test]
    fn decodes_png_and_reports_kind() {
        let decoded = RasterCodec::new()
            .decode(&encoded(ImageOutputFormat::Png))
            .unwrap();
        assert_eq!(decoded.kind, ImageKind::Png);
        assert_eq!(decoded.pixels.width(), 32);
        assert_eq!(decoded.pixels.height(), 24);
    }

    #[test]
    fn decodes_gif_as_other_kind() {
        let decoded = RasterCodec::new()
            .decode(&encoded(ImageOutputFormat::Gif))
            .unwrap();
        assert_eq!(decoded.kind, ImageKind::Other("GIF".into()));
    }

    #[test]
    fn text_is_unrecognized() {
        let err = RasterCodec::new().decode(b"just some notes").unwrap_err();
        assert_eq!(err, CodecError::Unrecognized);
    }

    #[test]
    fn text_with_image_signature_is_unrecognized() {
        let codec = RasterCodec::new();
        for text in [
            &b"BMW parts list\nbrake pads: 4\nrotors: 2\n"[..],
            &b"P3 project notes\n"[..],
        ] {
            assert_eq!(codec.decode(text).unwrap_err(), CodecError::Unrecognized);
        }
    }

    #[test]
    fn truncated_png_is_decode_error() {
        let mut bytes = encoded(ImageOutputFormat::Png);
        let idat = bytes.windows(4).position(|w| w == b"IDAT").unwrap();
        let len = u32::from_be_bytes(bytes[idat - 4..idat].try_into().unwrap()) as usize;
        bytes.truncate(idat + 4 + len / 2);
        let err = RasterCodec::new().decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::Decode { ref format, .. } if format == "PNG"));
    }

    #[test]
    fn png_round_trip_is_pixel_exact() {
        let codec = RasterCodec::new();
        let decoded = codec.decode(&encoded(ImageOutputFormat::Png)).unwrap();
        let optimized = codec
            .encode(
                &decoded,
                EncodeParams::PngLossless {
                    optimization_level: 2,
                },
            )
            .unwrap();

        let again = codec.decode(&optimized).unwrap();
        assert_eq!(again.pixels.to_rgb8(), sample_image().to_rgb8());
    }

    #[test]
    fn jpeg_encode_produces_jpeg() {
        let codec = RasterCodec::new();
        let decoded = codec.decode(&encoded(ImageOutputFormat::Png)).unwrap();
        let jpeg = codec
            .encode(&decoded, EncodeParams::Jpeg { quality: 85 })
            .unwrap();

        assert_eq!(image::guess_format(&jpeg).unwrap(), image::ImageFormat::Jpeg);
    }
}
