//! Frame preparation: decode, letterbox, normalise, NCHW layout.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::error::VisionError;

/// Grey used for letterbox padding, matching the YOLO training pipeline.
pub const PAD_VALUE: u8 = 114;

/// Placement of a resized frame inside the square model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub width: u32,
    pub height: u32,
    pub pad_x: u32,
    pub pad_y: u32,
}

/// Compute how a `src_w x src_h` frame fits into a `size x size` canvas
/// while keeping its aspect ratio.
pub fn letterbox_geometry(src_w: u32, src_h: u32, size: u32) -> Letterbox {
    let scale = (size as f32 / src_w as f32).min(size as f32 / src_h as f32);
    let width = ((src_w as f32 * scale).round() as u32).clamp(1, size);
    let height = ((src_h as f32 * scale).round() as u32).clamp(1, size);
    Letterbox {
        scale,
        width,
        height,
        pad_x: (size - width) / 2,
        pad_y: (size - height) / 2,
    }
}

/// Decode an uploaded frame (PNG or JPEG) into RGB.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, VisionError> {
    if bytes.is_empty() {
        return Err(VisionError::Decode("empty image".into()));
    }
    let image = image::load_from_memory(bytes)
        .map_err(|e| VisionError::Decode(e.to_string()))?
        .to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(VisionError::Decode("image has zero size".into()));
    }
    Ok(image)
}

/// Letterbox `image` into a `size x size` canvas and return it as a
/// `[1, 3, size, size]` f32 tensor scaled to `[0, 1]`.
pub fn to_input_tensor(image: &RgbImage, size: u32) -> Vec<f32> {
    let geom = letterbox_geometry(image.width(), image.height(), size);
    let resized = imageops::resize(image, geom.width, geom.height, FilterType::Triangle);

    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));
    imageops::replace(&mut canvas, &resized, geom.pad_x as i64, geom.pad_y as i64);

    let plane = (size * size) as usize;
    let mut data = vec![0f32; 3 * plane];
    for (x, y, pixel) in canvas.enumerate_pixels() {
        let idx = (y * size + x) as usize;
        for c in 0..3 {
            data[c * plane + idx] = pixel[c] as f32 / 255.0;
        }
    }
    data
}

/// Input tensor for a blank frame, used to warm the session up.
pub fn blank_tensor(size: u32) -> Vec<f32> {
    vec![PAD_VALUE as f32 / 255.0; 3 * (size * size) as usize]
}
