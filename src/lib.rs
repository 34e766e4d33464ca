// SPDX-License-Identifier: GPL-3.0-only

//! QR Scanner - live camera QR code scanning
//!
//! Frames are captured from a camera on a background thread, enhanced with
//! adjustable brightness and contrast, scanned for QR codes and published
//! with a targeting overlay. Repeated detections are suppressed within a
//! cooldown window.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Scan session, frame processing and presenter boundaries
//! - [`backends`]: Camera backend abstraction and V4L2 capture
//! - [`config`]: User configuration handling
//! - [`terminal`]: Terminal preview UI
//!
//! # Example
//!
//! ```no_run
//! use qr_scanner::app::{QrDetector, ScanSession, SessionConfig, SessionOutputs, scan_channels};
//! use qr_scanner::backends::camera::V4l2Backend;
//! use std::sync::Arc;
//!
//! let (channels, mut receivers) = scan_channels(640, 480);
//! let session = ScanSession::new(
//!     SessionConfig::default(),
//!     Arc::new(V4l2Backend::default()),
//!     Arc::new(QrDetector::new()),
//!     SessionOutputs::shared(Arc::new(channels)),
//! );
//! session.start();
//! while let Some(event) = receivers.events.blocking_recv() {
//!     println!("{:?}", event);
//! }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod terminal;

// Re-export commonly used types
pub use app::{ScanEvent, ScanResult, ScanSession, SessionConfig, SessionState};
pub use config::Config;
pub use errors::{AppError, AppResult};
