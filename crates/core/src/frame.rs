//! Frame buffer operations for the camera pipeline.
//!
//! Raw frames are RGB buffers cropped at ingest; processing works on
//! single-channel buffers. All operations are pure and in-memory.

use std::io::Cursor;

use image::{GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Absolute per-pixel differences below this value are zeroed before
/// keypoint detection. Found through experimentation with live feeds.
pub const DIFF_THRESHOLD: u8 = 50;

// ---------------------------------------------------------------------------
// CropRegion
// ---------------------------------------------------------------------------

/// A fixed rectangular sub-area of the source frame, half-open in both axes:
/// columns `x0..x1`, rows `y0..y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x0: u32,
    pub x1: u32,
    pub y0: u32,
    pub y1: u32,
}

impl CropRegion {
    pub fn new(x0: u32, x1: u32, y0: u32, y1: u32) -> Self {
        Self { x0, x1, y0, y1 }
    }

    /// Clamp to the frame bounds, returning `(x, y, width, height)`.
    ///
    /// Returns `None` when the clamped region is empty, in which case the
    /// caller keeps the full frame.
    fn clamped(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x0.min(width);
        let x1 = self.x1.min(width);
        let y0 = self.y0.min(height);
        let y1 = self.y1.min(height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0, y0, x1 - x0, y1 - y0))
    }
}

// ---------------------------------------------------------------------------
// Decode / crop
// ---------------------------------------------------------------------------

/// Decode fetched bytes (JPEG, PNG, WebP) into an RGB frame.
pub fn decode_frame(bytes: &[u8]) -> Result<RgbImage, CoreError> {
    let dynamic = image::load_from_memory(bytes).map_err(|e| CoreError::Decode(e.to_string()))?;
    Ok(dynamic.to_rgb8())
}

/// Apply a crop region to a frame.
///
/// A region that clamps to nothing (out of bounds or empty) yields the full
/// frame rather than an error; a misconfigured camera keeps working.
pub fn crop_frame(frame: &RgbImage, region: CropRegion) -> RgbImage {
    match region.clamped(frame.width(), frame.height()) {
        Some((x, y, w, h)) => image::imageops::crop_imm(frame, x, y, w, h).to_image(),
        None => frame.clone(),
    }
}

// ---------------------------------------------------------------------------
// Single-channel operations
// ---------------------------------------------------------------------------

pub fn grayscale(frame: &RgbImage) -> GrayImage {
    image::imageops::grayscale(frame)
}

/// Contrast-normalize via histogram equalization.
pub fn equalize(gray: &GrayImage) -> GrayImage {
    imageproc::contrast::equalize_histogram(gray)
}

/// Absolute per-pixel difference of two equal-shaped buffers.
///
/// Callers guarantee matching dimensions; the camera state machine never
/// pairs frames of different shapes.
pub fn absdiff(a: &GrayImage, b: &GrayImage) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        Luma([a.get_pixel(x, y)[0].abs_diff(b.get_pixel(x, y)[0])])
    })
}

/// Threshold-to-zero: values below `cut` become 0, values at or above `cut`
/// are retained unchanged. This is not binarization; surviving magnitudes
/// still matter to the keypoint detector.
pub fn threshold_to_zero(img: &GrayImage, cut: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let p = img.get_pixel(x, y)[0];
        Luma([if p < cut { 0 } else { p }])
    })
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a processed frame as in-memory PNG bytes.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, CoreError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| CoreError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
