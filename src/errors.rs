// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type for camera backend operations
pub type BackendResult<T> = Result<T, CameraError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Configuration errors
    Config(ConfigError),
    /// Image loading/decoding errors
    Image(String),
    /// Terminal or other I/O errors
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
///
/// `OpenFailed` and `ReadFailed` are both terminal for the current session.
/// Neither is retried automatically.
#[derive(Debug, Clone, PartialEq)]
pub enum CameraError {
    /// Device index invalid, device busy, or no usable capture format
    OpenFailed { index: u32, reason: String },
    /// Device disconnected or driver failure mid-stream
    ReadFailed(String),
    /// Frame data does not match the declared geometry
    InvalidFormat(String),
}

/// Configuration file errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Config file could not be read or written
    Io(String),
    /// Config file is not valid JSON for [`crate::config::Config`]
    Parse(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Image(msg) => write!(f, "Image error: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::OpenFailed { index, reason } => {
                write!(f, "open failed for camera {}: {}", index, reason)
            }
            CameraError::ReadFailed(msg) => write!(f, "read failed: {}", msg),
            CameraError::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "{}", msg),
            ConfigError::Parse(msg) => write!(f, "invalid config file: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for ConfigError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Image(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
