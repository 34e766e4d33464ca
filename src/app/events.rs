// SPDX-License-Identifier: GPL-3.0-only

//! Boundaries between the capture thread and the presenter
//!
//! The capture loop never touches presentation state. It hands results,
//! annotated frames and status updates to the sinks below; the default
//! [`ScanChannels`] implementation forwards them over tokio channels to
//! whatever task draws the UI.

use crate::app::frame_processor::types::ScanResult;
use crate::app::preview::fit_to_viewport;
use crate::app::session::SessionState;
use crate::backends::camera::types::CameraFrame;
use crate::constants::{self, PREVIEW_CHANNEL_CAPACITY, status};
use image::RgbImage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// How a status line should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Transitional (starting, stopping)
    Pending,
    /// Scanning or a successful detection
    Active,
    /// Stopped or failed
    Inactive,
}

/// Human-readable status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, level: StatusLevel) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }

    pub fn ready() -> Self {
        Self::new(status::READY, StatusLevel::Inactive)
    }

    pub fn starting() -> Self {
        Self::new(status::STARTING, StatusLevel::Pending)
    }

    pub fn scanning() -> Self {
        Self::new(status::SCANNING, StatusLevel::Active)
    }

    pub fn stopping() -> Self {
        Self::new(status::STOPPING, StatusLevel::Pending)
    }

    pub fn stopped() -> Self {
        Self::new(status::STOPPED, StatusLevel::Inactive)
    }

    pub fn open_failed() -> Self {
        Self::new(status::OPEN_FAILED, StatusLevel::Inactive)
    }

    pub fn error(reason: &str) -> Self {
        Self::new(format!("Error: {}", reason), StatusLevel::Inactive)
    }

    pub fn detected(result: &ScanResult) -> Self {
        Self::new(
            format!(
                "QR Code detected: {}...",
                result.preview(constants::STATUS_PREVIEW_CHARS)
            ),
            StatusLevel::Active,
        )
    }
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Everything the capture thread tells the presenter, except preview frames
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    State(SessionState),
    Status(StatusMessage),
    Result(ScanResult),
}

/// Receives debounced scan results
pub trait ResultSink: Send + Sync {
    fn publish_result(&self, result: ScanResult);
}

/// Receives annotated frames, roughly at capture rate
pub trait FramePublisher: Send + Sync {
    fn publish_frame(&self, frame: CameraFrame);
}

/// Receives session state transitions and status lines
pub trait StatusSink: Send + Sync {
    fn state_changed(&self, state: &SessionState);
    fn status(&self, message: StatusMessage);
}

/// The three outputs a session writes to
#[derive(Clone)]
pub struct SessionOutputs {
    pub results: Arc<dyn ResultSink>,
    pub frames: Arc<dyn FramePublisher>,
    pub status: Arc<dyn StatusSink>,
}

impl SessionOutputs {
    /// Use one value for all three outputs
    pub fn shared<T>(sink: Arc<T>) -> Self
    where
        T: ResultSink + FramePublisher + StatusSink + 'static,
    {
        Self {
            results: sink.clone(),
            frames: sink.clone(),
            status: sink,
        }
    }
}

/// Channel-backed sink for all session outputs
///
/// Events go over an unbounded channel so none are lost. Preview frames go
/// over a small bounded channel; when the presenter falls behind, new frames
/// are dropped rather than queued.
#[derive(Debug, Clone)]
pub struct ScanChannels {
    events: mpsc::UnboundedSender<ScanEvent>,
    frames: mpsc::Sender<RgbImage>,
    viewport: (u32, u32),
}

/// Presenter side of [`ScanChannels`]
#[derive(Debug)]
pub struct ScanReceivers {
    pub events: mpsc::UnboundedReceiver<ScanEvent>,
    pub frames: mpsc::Receiver<RgbImage>,
}

/// Create a connected sink/receiver pair; preview frames are fitted into
/// `viewport_width` x `viewport_height`
pub fn scan_channels(viewport_width: u32, viewport_height: u32) -> (ScanChannels, ScanReceivers) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (frame_tx, frame_rx) = mpsc::channel(PREVIEW_CHANNEL_CAPACITY);
    (
        ScanChannels {
            events: event_tx,
            frames: frame_tx,
            viewport: (viewport_width, viewport_height),
        },
        ScanReceivers {
            events: event_rx,
            frames: frame_rx,
        },
    )
}

impl ScanChannels {
    fn send(&self, event: ScanEvent) {
        if self.events.send(event).is_err() {
            trace!("Event receiver closed, dropping event");
        }
    }
}

impl ResultSink for ScanChannels {
    fn publish_result(&self, result: ScanResult) {
        self.send(ScanEvent::Result(result));
    }
}

impl FramePublisher for ScanChannels {
    fn publish_frame(&self, frame: CameraFrame) {
        // Skip the resize when nobody can take the frame
        if self.frames.capacity() == 0 || self.frames.is_closed() {
            trace!("Preview channel full, dropping frame");
            return;
        }
        let (w, h) = self.viewport;
        let image = fit_to_viewport(&frame, w, h);
        if self.frames.try_send(image).is_err() {
            trace!("Preview channel full, dropping frame");
        }
    }
}

impl StatusSink for ScanChannels {
    fn state_changed(&self, state: &SessionState) {
        self.send(ScanEvent::State(state.clone()));
    }

    fn status(&self, message: StatusMessage) {
        self.send(ScanEvent::Status(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::types::{DetectedSymbol, Symbology};
    use crate::backends::camera::types::PixelFormat;

    #[test]
    fn test_detected_message_truncates() {
        let long = "x".repeat(80);
        let result = ScanResult::from_symbol(&DetectedSymbol::new(long, Symbology::QrCode));
        let message = StatusMessage::detected(&result);
        assert_eq!(
            message.text,
            format!("QR Code detected: {}...", "x".repeat(50))
        );
        assert_eq!(message.level, StatusLevel::Active);
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            StatusMessage::error("read failed: gone").to_string(),
            "Error: read failed: gone"
        );
    }

    #[test]
    fn test_events_arrive_in_order() {
        let (channels, mut rx) = scan_channels(640, 480);
        channels.state_changed(&SessionState::Starting);
        channels.status(StatusMessage::starting());

        assert_eq!(
            rx.events.try_recv().ok(),
            Some(ScanEvent::State(SessionState::Starting))
        );
        assert_eq!(
            rx.events.try_recv().ok(),
            Some(ScanEvent::Status(StatusMessage::starting()))
        );
        assert!(rx.events.try_recv().is_err());
    }

    #[test]
    fn test_frames_are_fitted_and_dropped_when_full() {
        let (channels, mut rx) = scan_channels(320, 240);
        for _ in 0..(PREVIEW_CHANNEL_CAPACITY + 3) {
            channels.publish_frame(CameraFrame::filled(640, 480, PixelFormat::BGR24, 9));
        }

        let mut received = 0;
        while let Ok(image) = rx.frames.try_recv() {
            assert_eq!(image.dimensions(), (320, 240));
            received += 1;
        }
        assert_eq!(received, PREVIEW_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_closed_receivers_are_ignored() {
        let (channels, rx) = scan_channels(640, 480);
        drop(rx);
        channels.status(StatusMessage::stopped());
        channels.publish_frame(CameraFrame::filled(4, 4, PixelFormat::RGB24, 0));
    }
}
