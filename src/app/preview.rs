// SPDX-License-Identifier: GPL-3.0-only

//! Preview sizing for the presenter

use crate::backends::camera::types::CameraFrame;
use image::RgbImage;
use image::imageops::{self, FilterType};

/// Largest size with the frame's aspect ratio that fits in `max_w` x `max_h`
///
/// Frames already inside the viewport keep their size; nothing is upscaled.
pub fn fitted_size(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 || (width <= max_w && height <= max_h) {
        return (width, height);
    }
    let scale = (max_w as f64 / width as f64).min(max_h as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

/// Convert a frame to RGB and scale it down into the viewport
pub fn fit_to_viewport(frame: &CameraFrame, max_w: u32, max_h: u32) -> RgbImage {
    let rgb = frame.to_rgb_image();
    let (w, h) = fitted_size(frame.width, frame.height, max_w, max_h);
    if (w, h) == (frame.width, frame.height) {
        return rgb;
    }
    imageops::resize(&rgb, w, h, FilterType::Triangle)
}
