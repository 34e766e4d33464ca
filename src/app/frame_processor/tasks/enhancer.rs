// SPDX-License-Identifier: GPL-3.0-only

//! Brightness/contrast frame enhancement
//!
//! Every channel value goes through the same curve, so the transform is
//! computed once into a 256-entry lookup table and then applied byte by byte.
//! Channel order does not matter and is carried through unchanged.

use crate::app::frame_processor::settings::EnhancementSettings;
use crate::backends::camera::types::CameraFrame;
use tracing::trace;

/// Apply brightness then contrast to every channel of `frame`
///
/// Returns a new frame with the same dimensions, format and capture time.
pub fn enhance(frame: &CameraFrame, settings: EnhancementSettings) -> CameraFrame {
    if settings.is_identity() {
        return frame.clone();
    }

    let lut = build_lut(settings);
    let data = frame.data.iter().map(|&v| lut[v as usize]).collect();

    trace!(
        width = frame.width,
        height = frame.height,
        brightness = settings.brightness,
        contrast = settings.contrast,
        "Enhanced frame"
    );

    frame.with_data(data)
}

/// Enhance an RGB image in place, for still-image decoding
pub fn enhance_image(image: &mut image::RgbImage, settings: EnhancementSettings) {
    if settings.is_identity() {
        return;
    }
    let lut = build_lut(settings);
    for v in image.iter_mut() {
        *v = lut[*v as usize];
    }
}

/// Lookup table mapping an input channel value to its enhanced value
pub fn build_lut(settings: EnhancementSettings) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (v, out) in lut.iter_mut().enumerate() {
        *out = enhance_value(v as u8, settings.brightness, settings.contrast);
    }
    lut
}

/// Single-value form of the enhancement curve
///
/// Evaluated in f64 so values landing on a .5 boundary round consistently.
pub fn enhance_value(v: u8, brightness: f32, contrast: f32) -> u8 {
    let mut n = v as f64 / 255.0;
    n *= brightness as f64;
    n = (n - 0.5) * contrast as f64 + 0.5;
    (n.clamp(0.0, 1.0) * 255.0).round() as u8
}
