// SPDX-License-Identifier: GPL-3.0-only

//! Enhancement settings shared between the presenter and the capture thread

use crate::constants::enhancement;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Brightness and contrast multipliers applied to every frame
///
/// Both values are kept within [`enhancement::MIN`]..=[`enhancement::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnhancementSettings {
    pub brightness: f32,
    pub contrast: f32,
}

impl Default for EnhancementSettings {
    fn default() -> Self {
        Self {
            brightness: enhancement::DEFAULT,
            contrast: enhancement::DEFAULT,
        }
    }
}

impl EnhancementSettings {
    /// Create settings, clamping both values into the supported range
    pub fn new(brightness: f32, contrast: f32) -> Self {
        Self {
            brightness: clamp_factor(brightness),
            contrast: clamp_factor(contrast),
        }
    }

    /// Copy with both values clamped into the supported range
    pub fn clamped(self) -> Self {
        Self::new(self.brightness, self.contrast)
    }

    /// Copy with brightness moved by `delta`, clamped and snapped to the step grid
    pub fn adjust_brightness(self, delta: f32) -> Self {
        Self::new(snap_to_step(self.brightness + delta), self.contrast)
    }

    /// Copy with contrast moved by `delta`, clamped and snapped to the step grid
    pub fn adjust_contrast(self, delta: f32) -> Self {
        Self::new(self.brightness, snap_to_step(self.contrast + delta))
    }

    /// Whether applying these settings leaves a frame unchanged
    pub fn is_identity(&self) -> bool {
        self.brightness == 1.0 && self.contrast == 1.0
    }
}

fn clamp_factor(value: f32) -> f32 {
    if value.is_nan() {
        return enhancement::DEFAULT;
    }
    value.clamp(enhancement::MIN, enhancement::MAX)
}

/// Round to the 0.01 grid so repeated +/- steps stay on clean values
fn snap_to_step(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Lock-free "last value wins" holder for [`EnhancementSettings`]
///
/// Written by the presenter, read once per frame by the capture thread.
/// The two fields are stored independently; a reader may observe a new
/// brightness with the previous contrast for a single frame.
#[derive(Debug, Clone)]
pub struct SharedEnhancement {
    brightness: Arc<AtomicU32>,
    contrast: Arc<AtomicU32>,
}

impl Default for SharedEnhancement {
    fn default() -> Self {
        Self::new(EnhancementSettings::default())
    }
}

impl SharedEnhancement {
    pub fn new(settings: EnhancementSettings) -> Self {
        let settings = settings.clamped();
        Self {
            brightness: Arc::new(AtomicU32::new(settings.brightness.to_bits())),
            contrast: Arc::new(AtomicU32::new(settings.contrast.to_bits())),
        }
    }

    pub fn store(&self, settings: EnhancementSettings) {
        let settings = settings.clamped();
        self.brightness
            .store(settings.brightness.to_bits(), Ordering::Relaxed);
        self.contrast
            .store(settings.contrast.to_bits(), Ordering::Relaxed);
    }

    pub fn load(&self) -> EnhancementSettings {
        EnhancementSettings {
            brightness: f32::from_bits(self.brightness.load(Ordering::Relaxed)),
            contrast: f32::from_bits(self.contrast.load(Ordering::Relaxed)),
        }
    }
}
