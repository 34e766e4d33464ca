// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! This module implements QR code detection using the rqrr crate.
//! It converts camera frames to grayscale, downscales large frames and
//! searches for QR codes, returning their payloads and positions.

use crate::app::frame_processor::types::{
    DetectedSymbol, FrameRegion, SymbolDecoder, Symbology,
};
use crate::backends::camera::types::CameraFrame;
use image::GrayImage;
use image::imageops::{self, FilterType};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// QR code detector
///
/// Analyzes camera frames to detect and decode QR codes.
/// Optimized for real-time processing with frame downscaling.
#[derive(Debug, Clone)]
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new QR detector with default settings
    pub fn new() -> Self {
        Self {
            // QR codes held up to a webcam are large enough at 640px
            max_dimension: 640,
        }
    }

    /// Detect QR codes in an 8-bit grayscale buffer
    pub fn detect_luma(&self, luma: GrayImage) -> Vec<DetectedSymbol> {
        let max_dim = self.max_dimension;
        // rqrr can panic on degenerate grids; a bad frame must not take the loop down
        panic::catch_unwind(AssertUnwindSafe(|| detect_sync(luma, max_dim))).unwrap_or_else(
            |_| {
                warn!("QR detection panicked, treating frame as empty");
                Vec::new()
            },
        )
    }
}

impl SymbolDecoder for QrDetector {
    fn decode(&self, frame: &CameraFrame) -> Vec<DetectedSymbol> {
        if frame.width == 0 || frame.height == 0 {
            return Vec::new();
        }
        match GrayImage::from_raw(frame.width, frame.height, frame.to_luma()) {
            Some(luma) => self.detect_luma(luma),
            None => {
                debug!(
                    width = frame.width,
                    height = frame.height,
                    "Frame data does not match its geometry"
                );
                Vec::new()
            }
        }
    }
}

/// Synchronous QR detection
fn detect_sync(luma: GrayImage, max_dimension: u32) -> Vec<DetectedSymbol> {
    let start = Instant::now();
    let (width, height) = luma.dimensions();

    let (proc_image, scale) = if width > max_dimension || height > max_dimension {
        let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
        let new_width = ((width as f32 / scale) as u32).max(1);
        let new_height = ((height as f32 / scale) as u32).max(1);
        (
            imageops::resize(&luma, new_width, new_height, FilterType::Triangle),
            scale,
        )
    } else {
        (luma, 1.0)
    };

    let (proc_width, proc_height) = proc_image.dimensions();
    trace!(
        proc_width,
        proc_height,
        scale,
        conversion_ms = start.elapsed().as_millis(),
        "Prepared grayscale image for processing"
    );

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        proc_width as usize,
        proc_height as usize,
        |x, y| proc_image.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();

    trace!(
        count = grids.len(),
        detection_ms = start.elapsed().as_millis(),
        "QR grid detection complete"
    );

    let mut detections = Vec::with_capacity(grids.len());

    for grid in grids {
        let mut payload = Vec::new();
        let meta = match grid.decode_to(&mut payload) {
            Ok(meta) => meta,
            Err(e) => {
                debug!(error = ?e, "Failed to decode QR code");
                continue;
            }
        };

        let region = grid_region(&grid.bounds, scale, width, height);

        debug!(
            version = ?meta.version,
            bytes = payload.len(),
            x = region.x,
            y = region.y,
            width = region.width,
            height = region.height,
            "Detected QR code"
        );

        detections.push(DetectedSymbol::new(payload, Symbology::QrCode).with_bounds(region));
    }

    if !detections.is_empty() {
        debug!(
            count = detections.len(),
            total_ms = start.elapsed().as_millis(),
            "QR detection found codes"
        );
    }

    detections
}

/// Axis-aligned bounding box of the grid corners, scaled back to the
/// original frame and normalized
fn grid_region(bounds: &[rqrr::Point; 4], scale: f32, width: u32, height: u32) -> FrameRegion {
    let xs = bounds.iter().map(|p| p.x);
    let ys = bounds.iter().map(|p| p.y);
    let (min_x, max_x) = min_max(xs);
    let (min_y, max_y) = min_max(ys);

    let to_frame = |v: i32, limit: u32| ((v.max(0) as f32 * scale) as u32).min(limit);

    let x0 = to_frame(min_x, width);
    let y0 = to_frame(min_y, height);
    let x1 = to_frame(max_x, width);
    let y1 = to_frame(max_y, height);

    FrameRegion::from_pixels(x0, y0, x1 - x0, y1 - y0, width, height)
}

fn min_max(values: impl Iterator<Item = i32>) -> (i32, i32) {
    values.fold((i32::MAX, i32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}
