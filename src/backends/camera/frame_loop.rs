// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for the capture loop
//!
//! The loop body runs on its own named thread and polls a [`StopSignal`]
//! once per cycle. Stopping is cooperative: a stop request is observed at the
//! next cycle boundary, so latency is bounded by one frame read plus one
//! frame interval.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Cooperative cancellation token shared between a loop and its controller
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop at its next check
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Action returned by a loop iteration to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Run `step` until it returns [`LoopAction::Stop`] or `stop` is requested.
///
/// The stop signal is checked once, at the top of each iteration.
pub fn run_until_stopped<F>(stop: &StopSignal, mut step: F)
where
    F: FnMut() -> LoopAction,
{
    loop {
        if stop.is_requested() {
            debug!("Stop signal received");
            break;
        }
        if step() == LoopAction::Stop {
            debug!("Loop requested stop");
            break;
        }
    }
}

/// Controller for a capture loop running in a separate thread
pub struct CaptureLoopController {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<()>>,
    /// Signal to stop the loop
    stop_signal: StopSignal,
    /// Name for logging
    name: String,
}

impl CaptureLoopController {
    /// Spawn `body` on a new named thread.
    ///
    /// The body receives the controller's stop signal and is expected to
    /// return promptly once it is requested.
    pub fn spawn<F>(name: &str, body: F) -> std::io::Result<Self>
    where
        F: FnOnce(StopSignal) + Send + 'static,
    {
        let stop_signal = StopSignal::new();
        let thread_signal = stop_signal.clone();
        let thread_name = name.to_string();

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %thread_name, "Capture loop thread started");
                body(thread_signal);
                info!(name = %thread_name, "Capture loop thread exiting");
            })?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        })
    }

    /// Whether the caller is the loop thread itself
    fn on_loop_thread(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| h.thread().id() == thread::current().id())
            .unwrap_or(false)
    }

    /// Signal the loop to stop (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.request();
    }

    /// Stop the loop and wait for the thread to finish
    ///
    /// When called from the loop thread itself (e.g. from a sink callback)
    /// this only requests the stop, since joining would deadlock.
    pub fn stop(&mut self) {
        self.request_stop();
        if self.on_loop_thread() {
            return;
        }
        self.join();
    }

    /// Wait for the thread to finish without sending the stop signal
    pub fn join(&mut self) {
        if self.on_loop_thread() {
            return;
        }
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for capture loop thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Capture loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Capture loop thread finished");
            }
        }
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoopController dropped, stopping loop");
            self.stop();
        }
    }
}
