// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the scan session lifecycle
//!
//! Sessions run against a scripted in-memory camera and a marker-based
//! decoder so frame timestamps and detections are deterministic.

use qr_scanner::app::{
    DetectedSymbol, EnhancementSettings, FramePublisher, ResultSink, ScanResult, ScanSession,
    SessionConfig, SessionOutputs, SessionState, StatusMessage, StatusSink, SymbolDecoder,
    Symbology,
};
use qr_scanner::backends::camera::types::{
    BackendResult, CameraBackend, CameraError, CameraFrame, CameraHandle, FrameSource,
    PixelFormat,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const FRAME_SIZE: u32 = 16;

/// Value of the first byte in frames that carry a symbol
const MARKER: u8 = 255;

/// One scripted read
#[derive(Debug, Clone)]
enum Step {
    /// Frame captured `offset` after the camera opened
    Frame { offset: Duration, marked: bool },
    /// Read error
    Fail(&'static str),
}

fn marked_at(secs: f64) -> Step {
    Step::Frame {
        offset: Duration::from_secs_f64(secs),
        marked: true,
    }
}

fn blank_at(secs: f64) -> Step {
    Step::Frame {
        offset: Duration::from_secs_f64(secs),
        marked: false,
    }
}

/// Camera backend that replays a script on every open, then yields
/// unmarked frames of a fixed gray level
struct ScriptedBackend {
    script: Vec<Step>,
    fill: Arc<AtomicU8>,
    failing_opens: AtomicUsize,
    opens: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            fill: Arc::new(AtomicU8::new(0)),
            failing_opens: AtomicUsize::new(0),
            opens: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail the next `count` opens
    fn failing_first(self, count: usize) -> Self {
        self.failing_opens.store(count, Ordering::SeqCst);
        self
    }

    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl CameraBackend for ScriptedBackend {
    fn open(&self, index: u32) -> BackendResult<CameraHandle> {
        if self.failing_opens.load(Ordering::SeqCst) > 0 {
            self.failing_opens.fetch_sub(1, Ordering::SeqCst);
            return Err(CameraError::OpenFailed {
                index,
                reason: "device busy".to_string(),
            });
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSource {
            steps: self.script.iter().cloned().collect(),
            opened_at: Instant::now(),
            fill: Arc::clone(&self.fill),
            releases: Arc::clone(&self.releases),
        }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct ScriptedSource {
    steps: VecDeque<Step>,
    opened_at: Instant,
    fill: Arc<AtomicU8>,
    releases: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn frame(&self, marked: bool, captured_at: Instant) -> CameraFrame {
        let fill = self.fill.load(Ordering::SeqCst);
        let mut data = vec![fill; (FRAME_SIZE * FRAME_SIZE * 3) as usize];
        if marked {
            data[0] = MARKER;
        }
        CameraFrame::new(FRAME_SIZE, FRAME_SIZE, PixelFormat::BGR24, data, captured_at)
            .expect("scripted frame geometry")
    }
}

impl FrameSource for ScriptedSource {
    fn read_frame(&mut self) -> BackendResult<CameraFrame> {
        match self.steps.pop_front() {
            Some(Step::Frame { offset, marked }) => Ok(self.frame(marked, self.opened_at + offset)),
            Some(Step::Fail(reason)) => Err(CameraError::ReadFailed(reason.to_string())),
            None => {
                thread::sleep(Duration::from_millis(1));
                Ok(self.frame(false, Instant::now()))
            }
        }
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Reports `payloads` for frames whose first byte is the marker and
/// remembers the first byte of every frame it sees
struct MarkerDecoder {
    payloads: Vec<&'static str>,
    last_first_byte: AtomicU8,
}

impl MarkerDecoder {
    fn new(payloads: &[&'static str]) -> Self {
        Self {
            payloads: payloads.to_vec(),
            last_first_byte: AtomicU8::new(0),
        }
    }
}

impl SymbolDecoder for MarkerDecoder {
    fn decode(&self, frame: &CameraFrame) -> Vec<DetectedSymbol> {
        let first = frame.data.first().copied().unwrap_or(0);
        self.last_first_byte.store(first, Ordering::SeqCst);
        if first != MARKER {
            return Vec::new();
        }
        self.payloads
            .iter()
            .map(|p| DetectedSymbol::new(*p, Symbology::QrCode))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Recorded {
    State(SessionState),
    Status(String),
    Result(ScanResult),
}

/// Sink that records everything the session publishes
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Recorded>>,
    frames: AtomicUsize,
}

impl Recorder {
    fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    fn states(&self) -> Vec<SessionState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::State(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn results(&self) -> Vec<ScanResult> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Result(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

impl ResultSink for Recorder {
    fn publish_result(&self, result: ScanResult) {
        self.events.lock().unwrap().push(Recorded::Result(result));
    }
}

impl FramePublisher for Recorder {
    fn publish_frame(&self, frame: CameraFrame) {
        assert_eq!((frame.width, frame.height), (FRAME_SIZE, FRAME_SIZE));
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

impl StatusSink for Recorder {
    fn state_changed(&self, state: &SessionState) {
        self.events
            .lock()
            .unwrap()
            .push(Recorded::State(state.clone()));
    }

    fn status(&self, message: StatusMessage) {
        self.events
            .lock()
            .unwrap()
            .push(Recorded::Status(message.text));
    }
}

struct Harness {
    session: Arc<ScanSession>,
    backend: Arc<ScriptedBackend>,
    decoder: Arc<MarkerDecoder>,
    recorder: Arc<Recorder>,
}

fn harness(backend: ScriptedBackend, decoder: MarkerDecoder) -> Harness {
    let backend = Arc::new(backend);
    let decoder = Arc::new(decoder);
    let recorder = Arc::new(Recorder::default());
    let config = SessionConfig {
        camera_index: 0,
        cooldown: Duration::from_secs(1),
        frame_interval: Duration::from_millis(1),
        enhancement: EnhancementSettings::default(),
    };
    let session = Arc::new(ScanSession::new(
        config,
        backend.clone(),
        decoder.clone(),
        SessionOutputs::shared(recorder.clone()),
    ));
    Harness {
        session,
        backend,
        decoder,
        recorder,
    }
}

/// Poll `condition` until it holds or five seconds pass
fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[test]
fn test_end_to_end_cooldown() {
    let h = harness(
        ScriptedBackend::new(vec![marked_at(0.0), marked_at(0.4), marked_at(1.2)]),
        MarkerDecoder::new(&["HELLO"]),
    );

    assert!(h.session.start());
    assert!(wait_until(|| h.recorder.frames() >= 10));
    h.session.stop();

    let results = h.recorder.results();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.payload == b"HELLO"));
    assert!(results.iter().all(|r| r.symbol_type == "QR-Code"));

    let detected: Vec<_> = h
        .recorder
        .statuses()
        .into_iter()
        .filter(|s| s.starts_with("QR Code detected: HELLO"))
        .collect();
    assert_eq!(detected.len(), 2);

    assert_eq!(h.backend.opens(), 1);
    assert_eq!(h.backend.releases(), 1);
    assert_eq!(h.session.state(), SessionState::Idle);
    assert_eq!(
        h.recorder.states(),
        vec![
            SessionState::Starting,
            SessionState::Running,
            SessionState::Stopping,
            SessionState::Idle,
        ]
    );
}

#[test]
fn test_two_symbols_in_one_frame_reports_first() {
    let h = harness(
        ScriptedBackend::new(vec![marked_at(0.0)]),
        MarkerDecoder::new(&["FIRST", "SECOND"]),
    );

    assert!(h.session.start());
    assert!(wait_until(|| h.recorder.frames() >= 3));
    h.session.stop();

    let results = h.recorder.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text(), "FIRST");
}

#[test]
fn test_start_while_running_is_noop() {
    let h = harness(ScriptedBackend::new(vec![]), MarkerDecoder::new(&[]));

    assert!(h.session.start());
    assert!(wait_until(|| h.session.state() == SessionState::Running));

    assert!(!h.session.start());
    assert!(!h.session.start());
    assert!(wait_until(|| h.recorder.frames() >= 3));
    assert_eq!(h.backend.opens(), 1);

    h.session.stop();
    assert_eq!(h.backend.releases(), 1);
    assert_eq!(
        h.recorder
            .states()
            .iter()
            .filter(|s| **s == SessionState::Starting)
            .count(),
        1
    );
}

#[test]
fn test_read_failure_releases_once() {
    let h = harness(
        ScriptedBackend::new(vec![
            blank_at(0.0),
            blank_at(0.03),
            Step::Fail("device unplugged"),
        ]),
        MarkerDecoder::new(&[]),
    );

    assert!(h.session.start());
    assert!(wait_until(|| h.recorder.states().last() == Some(&SessionState::Idle)));

    assert_eq!(h.backend.opens(), 1);
    assert_eq!(h.backend.releases(), 1);
    assert_eq!(h.recorder.frames(), 2);

    let states = h.recorder.states();
    let reason = states
        .iter()
        .find_map(|s| match s {
            SessionState::Failed(reason) => Some(reason.clone()),
            _ => None,
        })
        .expect("failed state reported");
    assert!(!reason.is_empty());
    assert!(reason.contains("device unplugged"));
    assert_eq!(states[states.len() - 2], SessionState::Failed(reason.clone()));

    assert!(
        h.recorder
            .statuses()
            .contains(&format!("Error: {}", reason))
    );
    assert_eq!(h.session.state(), SessionState::Idle);

    // Stopping after the loop ended changes nothing
    h.session.stop();
    assert_eq!(h.backend.releases(), 1);
}

#[test]
fn test_open_failure_then_retry() {
    let h = harness(
        ScriptedBackend::new(vec![]).failing_first(1),
        MarkerDecoder::new(&[]),
    );

    assert!(h.session.start());
    assert!(wait_until(|| h.recorder.states().last() == Some(&SessionState::Idle)));

    let states = h.recorder.states();
    assert_eq!(states.len(), 3);
    assert_eq!(states[0], SessionState::Starting);
    assert!(matches!(&states[1], SessionState::Failed(reason) if reason.contains("device busy")));
    assert_eq!(states[2], SessionState::Idle);
    assert!(
        h.recorder
            .statuses()
            .contains(&"Failed to open camera".to_string())
    );
    assert_eq!(h.backend.opens(), 0);
    assert_eq!(h.backend.releases(), 0);

    // Explicit retry
    assert!(h.session.start());
    assert!(wait_until(|| h.session.state() == SessionState::Running));
    h.session.stop();

    assert_eq!(h.backend.opens(), 1);
    assert_eq!(h.backend.releases(), 1);
}

#[test]
fn test_stop_from_another_thread() {
    let h = harness(ScriptedBackend::new(vec![]), MarkerDecoder::new(&[]));

    assert!(h.session.start());
    assert!(wait_until(|| h.recorder.frames() >= 2));

    let session = Arc::clone(&h.session);
    thread::spawn(move || session.stop()).join().unwrap();

    assert_eq!(h.session.state(), SessionState::Idle);
    assert_eq!(h.backend.releases(), 1);
    assert!(
        h.recorder
            .statuses()
            .contains(&"Scanning stopped".to_string())
    );
}

#[test]
fn test_stop_when_idle_is_noop() {
    let h = harness(ScriptedBackend::new(vec![]), MarkerDecoder::new(&[]));
    h.session.stop();
    assert_eq!(h.session.state(), SessionState::Idle);
    assert!(h.recorder.events().is_empty());
    assert_eq!(h.backend.opens(), 0);
}

#[test]
fn test_update_settings_applies_to_next_frames() {
    let h = harness(ScriptedBackend::new(vec![]), MarkerDecoder::new(&[]));
    h.backend.fill.store(100, Ordering::SeqCst);

    assert!(h.session.start());
    assert!(wait_until(|| h.decoder.last_first_byte.load(Ordering::SeqCst) == 100));

    h.session.update_settings(EnhancementSettings::new(2.0, 1.0));
    assert_eq!(h.session.settings(), EnhancementSettings::new(2.0, 1.0));
    assert!(wait_until(|| h.decoder.last_first_byte.load(Ordering::SeqCst) == 200));

    h.session.stop();
}

#[test]
fn test_restart_after_stop() {
    let h = harness(
        ScriptedBackend::new(vec![marked_at(0.0)]),
        MarkerDecoder::new(&["AGAIN"]),
    );

    for round in 1..=2 {
        assert!(h.session.start());
        assert!(wait_until(|| h.recorder.results().len() == round));
        h.session.stop();
        assert_eq!(h.backend.releases(), round);
    }

    // Debounce state is per session run
    assert_eq!(h.recorder.results().len(), 2);
}
