// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing for the scan loop
//!
//! Per-frame stages run on the capture thread: enhancement, symbol
//! decoding and debounce. The presenter only sees their results.

pub mod debounce;
pub mod settings;
pub mod tasks;
pub mod types;

pub use debounce::{ScanState, first_reportable, should_report};
pub use settings::{EnhancementSettings, SharedEnhancement};
pub use tasks::enhancer::enhance;
pub use tasks::qr_detector::{self, QrDetector};
pub use types::{DetectedSymbol, FrameRegion, ScanResult, SymbolDecoder, Symbology};
