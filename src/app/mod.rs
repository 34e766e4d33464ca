// SPDX-License-Identifier: GPL-3.0-only

//! Scanner application core
//!
//! # Architecture
//!
//! - `frame_processor`: enhancement settings, per-frame tasks (enhance,
//!   QR decode) and debounce
//! - `qr_overlay`: targeting reticle drawn onto preview frames
//! - `preview`: viewport fitting for the presenter
//! - `events`: result, frame and status sinks plus the channel implementation
//! - `session`: the capture loop and its start/stop lifecycle
//!
//! # Main Types
//!
//! - `ScanSession`: owns the capture thread for one camera
//! - `ScanEvent`: what the capture thread tells the presenter
//! - `SessionState`: idle/starting/running/stopping/failed

pub mod events;
pub mod frame_processor;
pub mod preview;
pub mod qr_overlay;
pub mod session;

pub use events::{
    FramePublisher, ResultSink, ScanChannels, ScanEvent, ScanReceivers, SessionOutputs,
    StatusLevel, StatusMessage, StatusSink, scan_channels,
};
pub use frame_processor::{
    DetectedSymbol, EnhancementSettings, QrDetector, ScanResult, ScanState, SharedEnhancement,
    SymbolDecoder, Symbology,
};
pub use session::{ScanSession, SessionConfig, SessionState};
