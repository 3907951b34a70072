//! Image fixtures and archive helpers

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageEncoder, ImageOutputFormat, Rgb, RgbImage};
use std::io::{Cursor, Read};

/// Busy RGB image so JPEG quality has a visible effect on size
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let v = (x * 31 + y * 17) ^ (x * y);
        Rgb([(v % 251) as u8, ((v / 3) % 241) as u8, ((x + 2 * y) % 256) as u8])
    }))
}

/// JPEG saved at maximum quality, leaving room for re-encoding
pub fn high_quality_jpeg() -> Vec<u8> {
    let mut buffer = Vec::new();
    gradient_image(120, 90)
        .write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Jpeg(100))
        .unwrap();
    buffer
}

/// PNG written with fast compression and no filtering
pub fn loose_png() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(128, 128, |x, y| {
        Rgb([(x * 2) as u8, (y * 2) as u8, 64])
    }));
    let mut buffer = Vec::new();
    PngEncoder::new_with_quality(&mut buffer, CompressionType::Fast, FilterType::NoFilter)
        .write_image(img.as_bytes(), img.width(), img.height(), img.color())
        .unwrap();
    buffer
}

/// Small GIF, a decodable format that is never re-encoded
pub fn small_gif() -> Vec<u8> {
    let mut buffer = Vec::new();
    gradient_image(16, 16)
        .write_to(&mut Cursor::new(&mut buffer), ImageOutputFormat::Gif)
        .unwrap();
    buffer
}

/// Read every entry of a ZIP archive, in stored order
pub fn zip_entries(archive: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    (0..zip.len())
        .map(|i| {
            let mut file = zip.by_index(i).unwrap();
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).unwrap();
            (file.name().to_string(), bytes)
        })
        .collect()
}
