//! Image compression pipeline
//!
//! [`compress_file`] handles one upload: decode, re-encode under the
//! format policy, keep whichever of the candidate and the original is
//! smaller. It never fails; every problem becomes a fallback status and the
//! original bytes pass through. [`BatchCompressor`] drives it over a whole
//! upload and packages the results with a report.

mod batch;

pub use batch::{BatchCompressor, CompressedBatch};

use crate::codec::{EncodeParams, ImageCodec, ImageKind};
use crate::config::CompressionConfig;
use crate::error::CodecError;
use crate::types::{CompressionOutcome, CompressionStatus, UploadedFile};
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, warn};

/// Format-specific re-encode settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionPolicy {
    /// JPEG re-encode quality
    pub jpeg_quality: u8,
    /// oxipng preset for PNG
    pub png_optimization_level: u8,
    /// Inputs above this size are not decoded
    pub max_file_bytes: u64,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self::from(&CompressionConfig::default())
    }
}

impl From<&CompressionConfig> for CompressionPolicy {
    fn from(config: &CompressionConfig) -> Self {
        Self {
            jpeg_quality: config.jpeg_quality,
            png_optimization_level: config.png_optimization_level,
            max_file_bytes: config.max_file_bytes,
        }
    }
}

/// Candidate produced by a successful decode
struct Candidate {
    status: CompressionStatus,
    /// `None` means the candidate is the original bytes
    bytes: Option<Vec<u8>>,
}

fn optimize(
    codec: &dyn ImageCodec,
    policy: &CompressionPolicy,
    content: &[u8],
) -> Result<Candidate, CodecError> {
    let size = content.len() as u64;
    if size > policy.max_file_bytes {
        return Err(CodecError::TooLarge {
            size,
            limit: policy.max_file_bytes,
        });
    }

    let decoded = codec.decode(content)?;

    match &decoded.kind {
        ImageKind::Jpeg => Ok(Candidate {
            bytes: Some(codec.encode(
                &decoded,
                EncodeParams::Jpeg {
                    quality: policy.jpeg_quality,
                },
            )?),
            status: CompressionStatus::OptimizedJpeg {
                quality: policy.jpeg_quality,
            },
        }),
        ImageKind::Png => Ok(Candidate {
            bytes: Some(codec.encode(
                &decoded,
                EncodeParams::PngLossless {
                    optimization_level: policy.png_optimization_level,
                },
            )?),
            status: CompressionStatus::OptimizedPngLossless,
        }),
        ImageKind::Other(format) => Ok(Candidate {
            bytes: None,
            status: CompressionStatus::CopiedUnsupportedFormat {
                format: format.clone(),
            },
        }),
    }
}

/// Compress one uploaded file
///
/// Returns the bytes to archive and the outcome record. The returned bytes
/// are never larger than the upload.
pub fn compress_file(
    codec: &dyn ImageCodec,
    policy: &CompressionPolicy,
    file: UploadedFile,
) -> (Vec<u8>, CompressionOutcome) {
    let UploadedFile { filename, content } = file;
    let original_size = content.len() as u64;

    let attempt = catch_unwind(AssertUnwindSafe(|| optimize(codec, policy, &content)))
        .unwrap_or_else(|_| {
            Err(CodecError::Encode {
                format: "unknown".into(),
                reason: format!("{} codec panicked", codec.name()),
            })
        });

    let (chosen, status, kept_original) = match attempt {
        Ok(Candidate {
            status,
            bytes: Some(encoded),
        }) if (encoded.len() as u64) < original_size => (encoded, status, false),
        Ok(Candidate { status, .. }) => (content, status, true),
        Err(CodecError::Unrecognized) => {
            debug!(filename = %filename, "not a recognised image, copying through");
            (content, CompressionStatus::CopiedUndecodable, false)
        }
        Err(e) => {
            warn!(filename = %filename, error = %e, "image processing failed, copying original");
            (
                content,
                CompressionStatus::CopiedErrorFallback {
                    message: e.to_string(),
                },
                false,
            )
        }
    };

    let outcome = CompressionOutcome {
        filename,
        original_size,
        final_size: chosen.len() as u64,
        status,
        kept_original,
    };

    debug!(
        filename = %outcome.filename,
        original_size = outcome.original_size,
        final_size = outcome.final_size,
        status = %outcome.status_label(),
        "compressed file"
    );

    (chosen, outcome)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::codec::{DecodedImage, RasterCodec};
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};
    use image::{DynamicImage, ImageEncoder, ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    /// Codec whose behavior is fixed per test
    pub(crate) struct FakeCodec {
        pub decode: Result<ImageKind, CodecError>,
        pub encoded_len: Result<usize, CodecError>,
        pub panic_on_encode: bool,
    }

    impl FakeCodec {
        pub(crate) fn decoding_as(kind: &str, encoded_len: usize) -> Self {
            Self {
                decode: Ok(ImageKind::from_name(kind)),
                encoded_len: Ok(encoded_len),
                panic_on_encode: false,
            }
        }
    }

    impl ImageCodec for FakeCodec {
        fn decode(&self, _bytes: &[u8]) -> Result<DecodedImage, CodecError> {
            let kind = self.decode.clone()?;
            Ok(DecodedImage {
                kind,
                pixels: DynamicImage::new_rgb8(1, 1),
            })
        }

        fn encode(
            &self,
            _image: &DecodedImage,
            _params: EncodeParams,
        ) -> Result<Vec<u8>, CodecError> {
            if self.panic_on_encode {
                panic!("encoder exploded");
            }
            let len = self.encoded_len.clone()?;
            Ok(vec![0xAB; len])
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    fn noisy_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            let v = (x * 31 + y * 17) ^ (x * y);
            Rgb([(v % 251) as u8, ((v / 3) % 241) as u8, ((x + 2 * y) % 256) as u8])
        }))
    }

    fn jpeg_at_quality(quality: u8) -> Vec<u8> {
        let mut buffer = Vec::new();
        noisy_image(96, 64)
            .write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Jpeg(quality))
            .unwrap();
        buffer
    }

    fn loosely_packed_png() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(128, 128, |x, y| {
            Rgb([(x * 2) as u8, (y * 2) as u8, 128])
        }));
        let mut buffer = Vec::new();
        PngEncoder::new_with_quality(&mut buffer, CompressionType::Fast, FilterType::NoFilter)
            .write_image(img.as_bytes(), img.width(), img.height(), img.color())
            .unwrap();
        buffer
    }

    fn upload(name: &str, content: Vec<u8>) -> UploadedFile {
        UploadedFile::new(name, content)
    }

    #[test]
    fn jpeg_is_reencoded_when_smaller() {
        let original = jpeg_at_quality(100);
        let original_len = original.len() as u64;

        let (bytes, outcome) = compress_file(
            &RasterCodec::new(),
            &CompressionPolicy::default(),
            upload("photo.jpg", original),
        );

        assert_eq!(outcome.status, CompressionStatus::OptimizedJpeg { quality: 85 });
        assert!(!outcome.kept_original);
        assert!(outcome.final_size < original_len);
        assert_eq!(outcome.final_size, bytes.len() as u64);
        assert!(outcome.reduction_percent() > 0.0);
    }

    #[test]
    fn png_is_losslessly_optimized() {
        let original = loosely_packed_png();
        let original_len = original.len() as u64;

        let (bytes, outcome) = compress_file(
            &RasterCodec::new(),
            &CompressionPolicy::default(),
            upload("logo.png", original.clone()),
        );

        assert_eq!(outcome.status, CompressionStatus::OptimizedPngLossless);
        assert!(outcome.final_size < original_len);

        let before = image::load_from_memory(&original).unwrap().to_rgb8();
        let after = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(before, after);
    }

    #[test]
    fn other_formats_are_copied_and_marked_kept() {
        let mut gif = Vec::new();
        noisy_image(8, 8)
            .write_to(&mut Cursor::new(&mut gif), ImageOutputFormat::Gif)
            .unwrap();

        let (bytes, outcome) = compress_file(
            &RasterCodec::new(),
            &CompressionPolicy::default(),
            upload("anim.gif", gif.clone()),
        );

        assert_eq!(bytes, gif);
        assert_eq!(
            outcome.status,
            CompressionStatus::CopiedUnsupportedFormat {
                format: "GIF".into()
            }
        );
        assert!(outcome.kept_original);
        assert_eq!(outcome.status_label(), "Copied (GIF) - kept original (no reduction)");
    }

    #[test]
    fn text_file_is_copied_undecodable() {
        let text = b"sku,images\nnot really an image\n".to_vec();

        let (bytes, outcome) = compress_file(
            &RasterCodec::new(),
            &CompressionPolicy::default(),
            upload("notes.jpg", text.clone()),
        );

        assert_eq!(bytes, text);
        assert_eq!(outcome.status, CompressionStatus::CopiedUndecodable);
        assert_eq!(outcome.final_size, outcome.original_size);
        assert_eq!(outcome.reduction_percent(), 0.0);
    }

    #[test]
    fn empty_file_has_zero_reduction() {
        let (bytes, outcome) = compress_file(
            &RasterCodec::new(),
            &CompressionPolicy::default(),
            upload("empty.png", Vec::new()),
        );

        assert!(bytes.is_empty());
        assert_eq!(outcome.status, CompressionStatus::CopiedUndecodable);
        assert_eq!(outcome.reduction_percent(), 0.0);
    }

    #[test]
    fn larger_candidate_keeps_original() {
        let codec = FakeCodec::decoding_as("jpeg", 500);
        let (bytes, outcome) = compress_file(
            &codec,
            &CompressionPolicy::default(),
            upload("tiny.jpg", vec![1; 100]),
        );

        assert_eq!(bytes, vec![1; 100]);
        assert!(outcome.kept_original);
        assert_eq!(outcome.final_size, 100);
        assert_eq!(
            outcome.status_label(),
            "Optimized (JPEG quality 85) - kept original (no reduction)"
        );
    }

    #[test]
    fn equal_size_candidate_keeps_original() {
        let codec = FakeCodec::decoding_as("PNG", 100);
        let (bytes, outcome) = compress_file(
            &codec,
            &CompressionPolicy::default(),
            upload("same.png", vec![7; 100]),
        );

        assert_eq!(bytes, vec![7; 100]);
        assert!(outcome.kept_original);
    }

    #[test]
    fn smaller_candidate_is_chosen() {
        let codec = FakeCodec::decoding_as("JPG", 300);
        let (bytes, outcome) = compress_file(
            &codec,
            &CompressionPolicy::default(),
            upload("big.jpg", vec![1; 500]),
        );

        assert_eq!(bytes.len(), 300);
        assert_eq!(outcome.final_size, 300);
        assert!((outcome.reduction_percent() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn encode_failure_falls_back_to_original() {
        let codec = FakeCodec {
            decode: Ok(ImageKind::Png),
            encoded_len: Err(CodecError::Encode {
                format: "PNG".into(),
                reason: "unsupported color type".into(),
            }),
            panic_on_encode: false,
        };

        let (bytes, outcome) = compress_file(
            &codec,
            &CompressionPolicy::default(),
            upload("odd.png", vec![3; 64]),
        );

        assert_eq!(bytes, vec![3; 64]);
        match outcome.status {
            CompressionStatus::CopiedErrorFallback { message } => {
                assert!(message.contains("unsupported color type"))
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn codec_panic_falls_back_to_original() {
        let codec = FakeCodec {
            panic_on_encode: true,
            ..FakeCodec::decoding_as("jpeg", 1)
        };

        let (bytes, outcome) = compress_file(
            &codec,
            &CompressionPolicy::default(),
            upload("boom.jpg", vec![5; 10]),
        );

        assert_eq!(bytes, vec![5; 10]);
        assert!(matches!(
            outcome.status,
            CompressionStatus::CopiedErrorFallback { .. }
        ));
    }

    #[test]
    fn oversized_file_is_not_decoded() {
        let policy = CompressionPolicy {
            max_file_bytes: 10,
            ..CompressionPolicy::default()
        };
        let codec = FakeCodec::decoding_as("jpeg", 1);

        let (bytes, outcome) = compress_file(&codec, &policy, upload("huge.jpg", vec![9; 11]));

        assert_eq!(bytes.len(), 11);
        match outcome.status {
            CompressionStatus::CopiedErrorFallback { message } => {
                assert!(message.contains("exceeds"), "{message}")
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn reoptimizing_output_never_grows() {
        let codec = RasterCodec::new();
        let policy = CompressionPolicy::default();

        for (name, original) in [
            ("a.jpg", jpeg_at_quality(100)),
            ("b.png", loosely_packed_png()),
        ] {
            let (first, _) = compress_file(&codec, &policy, upload(name, original));
            let first_len = first.len() as u64;
            let (second, outcome) = compress_file(&codec, &policy, upload(name, first));

            assert!(outcome.final_size <= outcome.original_size);
            assert!(second.len() as u64 <= first_len);
        }
    }
}
