// SPDX-License-Identifier: GPL-3.0-only

//! Scan session: the capture loop and its lifecycle
//!
//! A session owns at most one background capture thread. Each cycle reads a
//! frame, enhances it, decodes it, reports the first qualifying symbol, draws
//! the overlay and publishes the result:
//!
//! ```text
//! read ─► enhance ─► decode ─► debounce ─► ResultSink
//!                       │
//!                       └────► overlay ─► FramePublisher ─► sleep
//! ```
//!
//! State moves `Idle → Starting → Running → Stopping → Idle`. Open and read
//! failures pass through `Failed(reason)` and end in `Idle`. The camera
//! handle is opened on the capture thread and dropped in one place when the
//! loop exits, whichever way it exits.

use crate::app::events::{SessionOutputs, StatusMessage, StatusSink};
use crate::app::frame_processor::debounce::{ScanState, first_reportable};
use crate::app::frame_processor::settings::{EnhancementSettings, SharedEnhancement};
use crate::app::frame_processor::tasks::enhancer::enhance;
use crate::app::frame_processor::types::{ScanResult, SymbolDecoder};
use crate::app::qr_overlay;
use crate::backends::camera::frame_loop::{
    CaptureLoopController, LoopAction, StopSignal, run_until_stopped,
};
use crate::backends::camera::types::{CameraBackend, CameraError, FrameSource};
use crate::constants::{DEFAULT_FRAME_INTERVAL, DEFAULT_SCAN_COOLDOWN};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Lifecycle state of a [`ScanSession`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Running,
    Stopping,
    /// Open or read failure; the session returns to `Idle` right after
    Failed(String),
}

impl SessionState {
    /// Whether a capture thread exists for this state
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::Running | Self::Stopping)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Per-session capture parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Camera index, e.g. 0 for `/dev/video0`
    pub camera_index: u32,
    /// Minimum time between two reported scans
    pub cooldown: Duration,
    /// Sleep at the end of every capture cycle
    pub frame_interval: Duration,
    /// Initial enhancement settings
    pub enhancement: EnhancementSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            cooldown: DEFAULT_SCAN_COOLDOWN,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            enhancement: EnhancementSettings::default(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Session state plus the sink that hears about every change
///
/// Transitions are reported while the lock is held so observers see them in
/// the order they happened. `StatusSink::state_changed` must not call back
/// into the session.
struct StateCell {
    state: Mutex<SessionState>,
    sink: Arc<dyn StatusSink>,
}

impl StateCell {
    fn new(sink: Arc<dyn StatusSink>) -> Self {
        Self {
            state: Mutex::new(SessionState::Idle),
            sink,
        }
    }

    fn get(&self) -> SessionState {
        lock(&self.state).clone()
    }

    fn set(&self, next: SessionState) {
        let mut state = lock(&self.state);
        debug!(from = %*state, to = %next, "Session state change");
        *state = next;
        self.sink.state_changed(&state);
    }

    /// Move to `next` only if the current state is `from`
    fn transition(&self, from: &SessionState, next: SessionState) -> bool {
        let mut state = lock(&self.state);
        if *state != *from {
            return false;
        }
        debug!(from = %*state, to = %next, "Session state change");
        *state = next;
        self.sink.state_changed(&state);
        true
    }

    /// Move to `Stopping` if a loop is starting or running
    fn begin_stop(&self) -> bool {
        let mut state = lock(&self.state);
        if !matches!(*state, SessionState::Starting | SessionState::Running) {
            return false;
        }
        debug!(from = %*state, "Session state change to stopping");
        *state = SessionState::Stopping;
        self.sink.state_changed(&state);
        self.sink.status(StatusMessage::stopping());
        true
    }
}

/// Why the capture loop ended early
#[derive(Debug)]
enum LoopFailure {
    Open(CameraError),
    Read(CameraError),
    Panicked,
}

impl LoopFailure {
    fn reason(&self) -> String {
        match self {
            LoopFailure::Open(e @ CameraError::OpenFailed { .. }) => e.to_string(),
            LoopFailure::Open(e) => format!("open failed: {}", e),
            LoopFailure::Read(e @ CameraError::ReadFailed(_)) => e.to_string(),
            LoopFailure::Read(e) => format!("read failed: {}", e),
            LoopFailure::Panicked => "capture loop panicked".to_string(),
        }
    }
}

/// Everything the capture thread needs, moved onto it at start
struct LoopContext {
    camera_index: u32,
    cooldown: Duration,
    frame_interval: Duration,
    backend: Arc<dyn CameraBackend>,
    decoder: Arc<dyn SymbolDecoder>,
    outputs: SessionOutputs,
    settings: SharedEnhancement,
    state: Arc<StateCell>,
}

/// A start/stop-able scan loop over one camera
pub struct ScanSession {
    config: SessionConfig,
    backend: Arc<dyn CameraBackend>,
    decoder: Arc<dyn SymbolDecoder>,
    outputs: SessionOutputs,
    settings: SharedEnhancement,
    state: Arc<StateCell>,
    controller: Mutex<Option<CaptureLoopController>>,
}

impl ScanSession {
    pub fn new(
        config: SessionConfig,
        backend: Arc<dyn CameraBackend>,
        decoder: Arc<dyn SymbolDecoder>,
        outputs: SessionOutputs,
    ) -> Self {
        let settings = SharedEnhancement::new(config.enhancement);
        let state = Arc::new(StateCell::new(outputs.status.clone()));
        Self {
            config,
            backend,
            decoder,
            outputs,
            settings,
            state,
            controller: Mutex::new(None),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Settings the next frame will be enhanced with
    pub fn settings(&self) -> EnhancementSettings {
        self.settings.load()
    }

    /// Replace the enhancement settings; picked up by the next frame
    pub fn update_settings(&self, settings: EnhancementSettings) {
        debug!(
            brightness = settings.brightness,
            contrast = settings.contrast,
            "Updating enhancement settings"
        );
        self.settings.store(settings);
    }

    /// Start the capture loop
    ///
    /// Returns `false` without doing anything unless the session is idle.
    /// Open failures are reported asynchronously through the status sink.
    pub fn start(&self) -> bool {
        let mut controller = lock(&self.controller);

        if !self.state.transition(&SessionState::Idle, SessionState::Starting) {
            debug!(state = %self.state.get(), "Start ignored, session not idle");
            return false;
        }

        // Reap the previous loop thread; it has already released its camera
        if let Some(mut previous) = controller.take() {
            previous.join();
        }

        self.outputs.status.status(StatusMessage::starting());
        info!(
            index = self.config.camera_index,
            backend = self.backend.name(),
            "Starting scan session"
        );

        let ctx = LoopContext {
            camera_index: self.config.camera_index,
            cooldown: self.config.cooldown,
            frame_interval: self.config.frame_interval,
            backend: Arc::clone(&self.backend),
            decoder: Arc::clone(&self.decoder),
            outputs: self.outputs.clone(),
            settings: self.settings.clone(),
            state: Arc::clone(&self.state),
        };

        match CaptureLoopController::spawn("qr-capture", move |stop| run_capture(ctx, stop)) {
            Ok(spawned) => {
                *controller = Some(spawned);
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to spawn capture thread");
                let reason = format!("failed to spawn capture thread: {}", e);
                self.outputs.status.status(StatusMessage::error(&reason));
                self.state.set(SessionState::Failed(reason));
                self.state.set(SessionState::Idle);
                false
            }
        }
    }

    /// Stop the capture loop and wait for it to release the camera
    ///
    /// Safe to call from any thread and in any state. When called from the
    /// capture thread itself (for example from a result sink) the stop is
    /// requested and the loop exits after the current cycle.
    pub fn stop(&self) {
        if self.state.begin_stop() {
            info!("Stopping scan session");
        }
        let controller = lock(&self.controller).take();
        if let Some(mut controller) = controller {
            controller.stop();
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Body of the capture thread
fn run_capture(ctx: LoopContext, stop: StopSignal) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| drive(&ctx, &stop)))
        .unwrap_or_else(|_| Err(LoopFailure::Panicked));

    // The camera handle has been dropped by the time we get here
    match outcome {
        Ok(()) => {
            info!("Scan session stopped");
            ctx.outputs.status.status(StatusMessage::stopped());
        }
        Err(failure) => {
            let reason = failure.reason();
            warn!(reason = %reason, "Scan session failed");
            let message = match failure {
                LoopFailure::Open(_) => StatusMessage::open_failed(),
                _ => StatusMessage::error(&reason),
            };
            ctx.outputs.status.status(message);
            ctx.state.set(SessionState::Failed(reason));
        }
    }

    ctx.state.set(SessionState::Idle);
}

/// Open the camera and run cycles until stopped or a read fails
///
/// The camera is owned by this frame; returning (or unwinding) releases it.
fn drive(ctx: &LoopContext, stop: &StopSignal) -> Result<(), LoopFailure> {
    let mut camera = ctx
        .backend
        .open(ctx.camera_index)
        .map_err(LoopFailure::Open)?;

    // A stop that arrived while opening wins over Running
    if ctx
        .state
        .transition(&SessionState::Starting, SessionState::Running)
    {
        ctx.outputs.status.status(StatusMessage::scanning());
        info!(index = ctx.camera_index, "Camera opened, scanning");
    }

    let mut scan_state = ScanState::new(ctx.cooldown);
    let mut failure = None;

    run_until_stopped(stop, || match process_frame(ctx, camera.as_mut(), &mut scan_state) {
        Ok(()) => {
            thread::sleep(ctx.frame_interval);
            LoopAction::Continue
        }
        Err(e) => {
            failure = Some(e);
            LoopAction::Stop
        }
    });

    match failure {
        Some(e) => Err(LoopFailure::Read(e)),
        None => Ok(()),
    }
}

/// One capture cycle: read, enhance, decode, debounce, overlay, publish
fn process_frame(
    ctx: &LoopContext,
    camera: &mut dyn FrameSource,
    scan_state: &mut ScanState,
) -> Result<(), CameraError> {
    let frame = camera.read_frame()?;

    let enhanced = enhance(&frame, ctx.settings.load());
    drop(frame);

    let symbols = ctx.decoder.decode(&enhanced);
    if let Some(symbol) = first_reportable(scan_state, enhanced.captured_at, &symbols) {
        let result = ScanResult::from_symbol(symbol);
        info!(
            symbol_type = %result.symbol_type,
            bytes = result.payload.len(),
            "Scan reported"
        );
        ctx.outputs.status.status(StatusMessage::detected(&result));
        ctx.outputs.results.publish_result(result);
    } else if !symbols.is_empty() {
        debug!(count = symbols.len(), "Detection suppressed by cooldown");
    }

    ctx.outputs.frames.publish_frame(qr_overlay::render(&enhanced));
    Ok(())
}
