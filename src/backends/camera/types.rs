// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

pub use crate::errors::{BackendResult, CameraError};
use std::time::Instant;

/// Channel order of a packed 3-channel frame
///
/// The order is defined by the capture source. Stages that only care about
/// intensities (enhancement, overlay in pure green) are order-agnostic; the
/// preview publisher and the decoder's luma conversion are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// R G B, 3 bytes per pixel
    #[default]
    RGB24,
    /// B G R, 3 bytes per pixel (OpenCV-style sources)
    BGR24,
}

impl PixelFormat {
    /// Bytes per pixel for every supported format
    pub const CHANNELS: usize = 3;

    /// Byte offsets of the red, green and blue samples within a pixel
    pub fn rgb_offsets(&self) -> [usize; 3] {
        match self {
            PixelFormat::RGB24 => [0, 1, 2],
            PixelFormat::BGR24 => [2, 1, 0],
        }
    }
}

/// A single frame from the camera
///
/// Pixels are tightly packed (row stride = `width * 3`). A frame is owned by
/// whichever stage currently holds it; stages that need to keep the original
/// work on a clone.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Packed pixel data, `width * height * 3` bytes
    pub data: Vec<u8>,
    /// Channel order of the data
    pub format: PixelFormat,
    /// When the frame was read from the device
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Create a frame, validating that the buffer matches the geometry
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
        captured_at: Instant,
    ) -> BackendResult<Self> {
        let expected = width as usize * height as usize * PixelFormat::CHANNELS;
        if data.len() != expected {
            return Err(CameraError::InvalidFormat(format!(
                "{}x{} frame needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            format,
            captured_at,
        })
    }

    /// A frame where every channel of every pixel has the same value
    pub fn filled(width: u32, height: u32, format: PixelFormat, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize * PixelFormat::CHANNELS],
            format,
            captured_at: Instant::now(),
        }
    }

    /// Same geometry, format and timestamp with different pixel data
    pub fn with_data(&self, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), self.data.len());
        Self {
            width: self.width,
            height: self.height,
            data,
            format: self.format,
            captured_at: self.captured_at,
        }
    }

    /// Row stride in bytes
    pub fn stride(&self) -> usize {
        self.width as usize * PixelFormat::CHANNELS
    }

    /// Raw channel values of the pixel at (x, y), in the frame's own order
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.stride() + x as usize * PixelFormat::CHANNELS;
        match self.data.get(idx..idx + PixelFormat::CHANNELS)? {
            &[a, b, c] => Some([a, b, c]),
            _ => None,
        }
    }

    /// Pixel at (x, y) as (r, g, b) regardless of the frame's channel order
    pub fn rgb(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        let px = self.pixel(x, y)?;
        let [r, g, b] = self.format.rgb_offsets();
        Some((px[r], px[g], px[b]))
    }

    /// BT.601 luma for every pixel, row-major
    pub fn to_luma(&self) -> Vec<u8> {
        let [r, g, b] = self.format.rgb_offsets();
        self.data
            .chunks_exact(PixelFormat::CHANNELS)
            .map(|px| {
                let y = 0.299 * px[r] as f32 + 0.587 * px[g] as f32 + 0.114 * px[b] as f32;
                y.round().clamp(0.0, 255.0) as u8
            })
            .collect()
    }

    /// Convert to an RGB image for display or encoding
    pub fn to_rgb_image(&self) -> image::RgbImage {
        let data = match self.format {
            PixelFormat::RGB24 => self.data.clone(),
            PixelFormat::BGR24 => self
                .data
                .chunks_exact(PixelFormat::CHANNELS)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect(),
        };
        // Length is guaranteed by construction
        image::RgbImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| image::RgbImage::new(self.width, self.height))
    }

    /// Wrap an RGB image as a frame
    pub fn from_rgb_image(image: image::RgbImage, captured_at: Instant) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
            format: PixelFormat::RGB24,
            captured_at,
        }
    }
}

/// An open camera device producing frames
///
/// The handle is released when the value is dropped. Backends must do all
/// device teardown in `Drop` so release happens exactly once on every exit
/// path of the capture loop. Handles are opened on the capture thread and
/// never leave it, so no `Send` bound is required.
pub trait FrameSource {
    /// Block until the next frame is available
    fn read_frame(&mut self) -> BackendResult<CameraFrame>;
}

/// Exclusively-owned camera handle
pub type CameraHandle = Box<dyn FrameSource>;

/// Opens camera devices by index
pub trait CameraBackend: Send + Sync {
    /// Open the camera with the given index (e.g. 0 for `/dev/video0`)
    fn open(&self, index: u32) -> BackendResult<CameraHandle>;

    /// Human-readable backend name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let result = CameraFrame::new(2, 2, PixelFormat::RGB24, vec![0; 11], Instant::now());
        assert!(matches!(result, Err(CameraError::InvalidFormat(_))));
    }

    #[test]
    fn test_rgb_respects_channel_order() {
        let data = vec![10, 20, 30];
        let bgr = CameraFrame::new(1, 1, PixelFormat::BGR24, data.clone(), Instant::now()).unwrap();
        let rgb = CameraFrame::new(1, 1, PixelFormat::RGB24, data, Instant::now()).unwrap();

        assert_eq!(bgr.rgb(0, 0), Some((30, 20, 10)));
        assert_eq!(rgb.rgb(0, 0), Some((10, 20, 30)));
        assert_eq!(rgb.rgb(1, 0), None);
    }

    #[test]
    fn test_pixel_on_short_buffer_is_none() {
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: vec![1, 2, 3, 4, 5],
            format: PixelFormat::RGB24,
            captured_at: Instant::now(),
        };
        assert_eq!(frame.pixel(0, 0), Some([1, 2, 3]));
        assert_eq!(frame.pixel(1, 0), None);
        assert_eq!(frame.pixel(1, 1), None);
        assert_eq!(frame.rgb(0, 1), None);
    }

    #[test]
    fn test_to_rgb_image_swaps_bgr() {
        let frame =
            CameraFrame::new(1, 1, PixelFormat::BGR24, vec![1, 2, 3], Instant::now()).unwrap();
        let image = frame.to_rgb_image();
        assert_eq!(image.get_pixel(0, 0).0, [3, 2, 1]);
    }

    #[test]
    fn test_luma_of_gray_is_identity() {
        let frame = CameraFrame::filled(3, 2, PixelFormat::BGR24, 128);
        assert!(frame.to_luma().iter().all(|&v| v == 128));
        assert_eq!(frame.to_luma().len(), 6);
    }
}
