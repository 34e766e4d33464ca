// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Minimum elapsed time between two reported scans
pub const DEFAULT_SCAN_COOLDOWN: Duration = Duration::from_secs(1);

/// Sleep between capture cycles (caps the loop at roughly 30 fps)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(30);

/// Default capture resolution requested from the camera
pub const DEFAULT_CAPTURE_WIDTH: u32 = 640;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 480;

/// Bounded viewport for the live preview (frames are scaled down to fit)
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 640;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 480;

/// Preview frames buffered between the capture thread and the presenter.
/// When the presenter falls behind, newer frames are dropped.
pub const PREVIEW_CHANNEL_CAPACITY: usize = 2;

/// Brightness/contrast tuning range and slider step
pub mod enhancement {
    pub const MIN: f32 = 0.1;
    pub const MAX: f32 = 3.0;
    pub const DEFAULT: f32 = 1.0;
    pub const STEP: f32 = 0.1;
}

/// Targeting overlay geometry and styling
pub mod overlay {
    /// Reticle colour (pure green reads the same in RGB and BGR order)
    pub const COLOR: [u8; 3] = [0, 255, 0];

    /// Stroke width for the circle and crosshair
    pub const RETICLE_STROKE: u32 = 2;

    /// Stroke width for the corner brackets
    pub const BRACKET_STROKE: u32 = 3;

    /// Length of each corner bracket arm.
    /// Fixed in pixels, independent of the frame or reticle size.
    pub const BRACKET_ARM_PX: i64 = 20;

    /// Caption drawn in the top-left corner
    pub const CAPTION: &str = "Scan QR Code";

    /// Caption position: left edge and text baseline
    pub const CAPTION_ORIGIN: (i64, i64) = (10, 30);

    /// Integer scale applied to the 5x7 caption glyphs
    pub const CAPTION_SCALE: i64 = 2;
}

/// Number of payload characters shown in the status line
pub const STATUS_PREVIEW_CHARS: usize = 50;

/// Status messages shown by the presenter
pub mod status {
    pub const READY: &str = "Ready to scan";
    pub const STARTING: &str = "Starting camera...";
    pub const SCANNING: &str = "Scanning... Point camera at QR code";
    pub const STOPPING: &str = "Stopping camera...";
    pub const STOPPED: &str = "Scanning stopped";
    pub const OPEN_FAILED: &str = "Failed to open camera";
}
