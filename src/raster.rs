//! Raster signature handling: decode, resize, and stream encoding.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::error::Result;

/// A decoded, resized signature image split into the streams an image
/// XObject embeds: zlib-compressed RGB samples plus a compressed alpha
/// channel for the soft mask.
#[derive(Debug, Clone)]
pub struct RasterStamp {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    pub alpha: Vec<u8>,
}

/// Decode an image file and resize it exactly to the stamp target size,
/// one pixel per point.
pub fn load_scaled(path: &Path, width: f32, height: f32) -> Result<RasterStamp> {
    let img = image::open(path)?;
    let w = width.round().max(1.0) as u32;
    let h = height.round().max(1.0) as u32;
    let resized = img.resize_exact(w, h, FilterType::Lanczos3).to_rgba8();

    let (w, h) = resized.dimensions();
    let mut rgb = Vec::with_capacity((w * h * 3) as usize);
    let mut alpha = Vec::with_capacity((w * h) as usize);
    for pixel in resized.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    Ok(RasterStamp {
        width: w,
        height: h,
        rgb: deflate(&rgb)?,
        alpha: deflate(&alpha)?,
    })
}

/// Resize a signature image to an exact pixel size and write it out,
/// re-encoding JPEG output at the given quality.
pub fn write_resized(
    input: &Path,
    output: &Path,
    width: u32,
    height: u32,
    jpeg_quality: u8,
) -> Result<()> {
    let img = image::open(input)?;
    let resized = img.resize_exact(width.max(1), height.max(1), FilterType::Lanczos3);

    let is_jpeg = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false);

    if is_jpeg {
        let file = fs::File::create(output)?;
        let encoder = JpegEncoder::new_with_quality(file, jpeg_quality);
        resized.to_rgb8().write_with_encoder(encoder)?;
    } else {
        resized.save(output)?;
    }
    Ok(())
}

fn deflate(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
