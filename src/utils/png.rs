//! In-memory PNG encoding for rendered charts

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

use crate::utils::errors::RenderError;

/// A packed RGB8 pixel buffer
#[derive(Debug, Clone)]
pub struct RgbFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Crop to the smallest rectangle containing every non-background pixel,
/// grown by `pad` pixels on each side and clamped to the frame.
/// A frame that is entirely background is returned as-is.
pub fn crop_to_content(frame: RgbFrame, background: [u8; 3], pad: u32) -> RgbFrame {
    let width = frame.width as usize;
    let height = frame.height as usize;

    let mut min_x = usize::MAX;
    let mut min_y = usize::MAX;
    let mut max_x = 0usize;
    let mut max_y = 0usize;

    for (y, row) in frame.pixels.chunks_exact(width * 3).take(height).enumerate() {
        for (x, px) in row.chunks_exact(3).enumerate() {
            if px != background {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
    }

    if min_x == usize::MAX {
        return frame;
    }

    let pad = pad as usize;
    let left = min_x.saturating_sub(pad);
    let top = min_y.saturating_sub(pad);
    let right = (max_x + pad).min(width - 1);
    let bottom = (max_y + pad).min(height - 1);

    if left == 0 && top == 0 && right == width - 1 && bottom == height - 1 {
        return frame;
    }

    let crop_w = right - left + 1;
    let crop_h = bottom - top + 1;
    let mut pixels = Vec::with_capacity(crop_w * crop_h * 3);
    for y in top..=bottom {
        let start = (y * width + left) * 3;
        pixels.extend_from_slice(&frame.pixels[start..start + crop_w * 3]);
    }

    RgbFrame {
        pixels,
        width: crop_w as u32,
        height: crop_h as u32,
    }
}

/// Encode an RGB8 frame as PNG bytes
pub fn encode_png(frame: &RgbFrame) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(&frame.pixels, frame.width, frame.height, ColorType::Rgb8)
        .map_err(|e| RenderError::Encoding(format!("Failed to encode PNG: {}", e)))?;
    Ok(bytes)
}
