// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame analysis results
//!
//! These types carry decoder output from the capture thread to the
//! presenter and to result sinks.

use crate::backends::camera::types::CameraFrame;
use chrono::{DateTime, Local};

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl FrameRegion {
    /// Create a frame region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        if frame_width == 0 || frame_height == 0 {
            return Self {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
            };
        }
        Self {
            x: x as f32 / frame_width as f32,
            y: y as f32 / frame_height as f32,
            width: width as f32 / frame_width as f32,
            height: height as f32 / frame_height as f32,
        }
    }
}

/// Symbol families a decoder can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbology {
    QrCode,
}

impl Symbology {
    /// Type tag shown alongside decoded payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            Symbology::QrCode => "QR-Code",
        }
    }
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One symbol found by a [`SymbolDecoder`]
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedSymbol {
    /// Raw payload bytes, not necessarily valid UTF-8
    pub payload: Vec<u8>,
    pub symbology: Symbology,
    /// Where the symbol was found, when the decoder reports it
    pub bounds: Option<FrameRegion>,
}

impl DetectedSymbol {
    pub fn new(payload: impl Into<Vec<u8>>, symbology: Symbology) -> Self {
        Self {
            payload: payload.into(),
            symbology,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: FrameRegion) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// A detection that passed the debounce window and was reported
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub payload: Vec<u8>,
    /// Decoder type tag, e.g. `QR-Code`
    pub symbol_type: String,
    /// Wall-clock time of the report
    pub detected_at: DateTime<Local>,
}

impl ScanResult {
    pub fn from_symbol(symbol: &DetectedSymbol) -> Self {
        Self {
            payload: symbol.payload.clone(),
            symbol_type: symbol.symbology.as_str().to_string(),
            detected_at: Local::now(),
        }
    }

    /// Payload as text; invalid UTF-8 sequences are replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// First `max_chars` characters of the payload text
    pub fn preview(&self, max_chars: usize) -> String {
        self.text().chars().take(max_chars).collect()
    }
}

/// Opaque symbol decoder
///
/// Implementations have no side effects. Frames that cannot be decoded
/// (blank, noisy, malformed) yield an empty list, never an error.
pub trait SymbolDecoder: Send + Sync {
    /// Detected symbols in decoder order
    fn decode(&self, frame: &CameraFrame) -> Vec<DetectedSymbol>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_pixels() {
        let region = FrameRegion::from_pixels(160, 120, 320, 240, 640, 480);
        assert_eq!(region.x, 0.25);
        assert_eq!(region.y, 0.25);
        assert_eq!(region.width, 0.5);
        assert_eq!(region.height, 0.5);
    }

    #[test]
    fn test_region_from_empty_frame() {
        let region = FrameRegion::from_pixels(1, 1, 1, 1, 0, 0);
        assert_eq!(region.width, 0.0);
    }

    #[test]
    fn test_result_text_is_lossy() {
        let symbol = DetectedSymbol::new(vec![b'h', b'i', 0xff], Symbology::QrCode);
        let result = ScanResult::from_symbol(&symbol);
        assert_eq!(result.symbol_type, "QR-Code");
        assert_eq!(result.text(), "hi\u{fffd}");
    }

    #[test]
    fn test_result_preview_counts_chars() {
        let symbol = DetectedSymbol::new("ääääää".as_bytes(), Symbology::QrCode);
        let result = ScanResult::from_symbol(&symbol);
        assert_eq!(result.preview(3), "äää");
        assert_eq!(result.preview(50), "ääääää");
    }
}
