// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! A [`CameraBackend`] opens a device by index and hands back an owned
//! [`CameraHandle`]. The handle is a [`FrameSource`] that blocks for the next
//! frame and releases the device when dropped.
//!
//! ```text
//! ┌─────────────────────┐
//! │     ScanSession     │  ← owns the capture thread
//! └──────────┬──────────┘
//!            │ open(index)
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend trait │  ← V4l2Backend, or scripted sources in tests
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraHandle (drop) │  ← read_frame() until stopped or failed
//! └─────────────────────┘
//! ```

pub mod format_converters;
pub mod frame_loop;
pub mod types;
pub mod v4l2;

pub use frame_loop::{CaptureLoopController, LoopAction, StopSignal, run_until_stopped};
pub use types::*;
pub use v4l2::V4l2Backend;
