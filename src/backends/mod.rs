// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            ScanSession (app layer)           │
//! └────────────────────┬────────────────────────┘
//!                      │ CameraBackend::open(index)
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────────────┐  ┌────────────────┐   │
//! │  │   V4L2 camera    │  │  frame loop    │   │
//! │  │  (/dev/videoN)   │  │  (thread ctl)  │   │
//! │  └──────────────────┘  └────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Camera traits, frame type, V4L2 implementation and the
//!   capture thread controller

pub mod camera;
