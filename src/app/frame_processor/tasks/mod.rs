// SPDX-License-Identifier: GPL-3.0-only

//! Per-frame processing tasks run by the capture loop

pub mod enhancer;
pub mod qr_detector;
