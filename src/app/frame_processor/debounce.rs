// SPDX-License-Identifier: GPL-3.0-only

//! Duplicate-scan suppression
//!
//! A session keeps a single "last reported" timestamp. A detection qualifies
//! when nothing has been reported yet or strictly more than the cooldown has
//! elapsed since the last report. The timestamp is global, not per payload:
//! a different code shown right after a report is suppressed too.

use super::types::DetectedSymbol;
use crate::constants::DEFAULT_SCAN_COOLDOWN;
use std::time::{Duration, Instant};

/// Debounce state for one running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanState {
    pub last_reported_at: Option<Instant>,
    pub cooldown: Duration,
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_COOLDOWN)
    }
}

impl ScanState {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_reported_at: None,
            cooldown,
        }
    }

    /// Whether a detection at `now` may be reported
    pub fn should_report(&self, now: Instant) -> bool {
        match self.last_reported_at {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.cooldown,
        }
    }

    /// Remember that a report happened at `now`
    pub fn record(&mut self, now: Instant) {
        self.last_reported_at = Some(now);
    }
}

/// Free-function form of [`ScanState::should_report`]
pub fn should_report(now: Instant, state: &ScanState) -> bool {
    state.should_report(now)
}

/// Pick the symbol to report from one frame's detections, if any
///
/// Only the first symbol in decoder order is considered: the window is
/// shared, so once it qualifies no later symbol in the same frame can.
/// On success the report time is recorded.
pub fn first_reportable<'a>(
    state: &mut ScanState,
    now: Instant,
    symbols: &'a [DetectedSymbol],
) -> Option<&'a DetectedSymbol> {
    let first = symbols.first()?;
    if !state.should_report(now) {
        return None;
    }
    state.record(now);
    Some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::frame_processor::types::Symbology;

    fn at(base: Instant, secs: f64) -> Instant {
        base + Duration::from_secs_f64(secs)
    }

    #[test]
    fn test_cooldown_window() {
        let base = Instant::now();
        let mut state = ScanState::new(Duration::from_secs(1));

        assert!(should_report(at(base, 0.0), &state));
        state.record(at(base, 0.0));

        assert!(!should_report(at(base, 0.5), &state));
        assert!(should_report(at(base, 1.1), &state));
    }

    #[test]
    fn test_exact_cooldown_is_suppressed() {
        let base = Instant::now();
        let mut state = ScanState::new(Duration::from_secs(1));
        state.record(base);
        assert!(!state.should_report(at(base, 1.0)));
    }

    #[test]
    fn test_clock_going_backwards_is_suppressed() {
        let base = Instant::now() + Duration::from_secs(5);
        let mut state = ScanState::default();
        state.record(base);
        assert!(!state.should_report(base - Duration::from_secs(2)));
    }

    #[test]
    fn test_two_symbols_one_frame() {
        let base = Instant::now();
        let mut state = ScanState::default();
        let symbols = vec![
            DetectedSymbol::new("first", Symbology::QrCode),
            DetectedSymbol::new("second", Symbology::QrCode),
        ];

        let reported = first_reportable(&mut state, base, &symbols);
        assert_eq!(reported.map(|s| s.payload.as_slice()), Some(&b"first"[..]));
        assert_eq!(state.last_reported_at, Some(base));

        // Same frame, same instant: nothing else qualifies
        assert!(!state.should_report(base));
    }

    #[test]
    fn test_no_symbols_does_not_record() {
        let mut state = ScanState::default();
        assert!(first_reportable(&mut state, Instant::now(), &[]).is_none());
        assert_eq!(state.last_reported_at, None);
    }

    #[test]
    fn test_global_window_across_payloads() {
        let base = Instant::now();
        let mut state = ScanState::new(Duration::from_secs(1));
        let a = [DetectedSymbol::new("A", Symbology::QrCode)];
        let b = [DetectedSymbol::new("B", Symbology::QrCode)];

        assert!(first_reportable(&mut state, base, &a).is_some());
        assert!(first_reportable(&mut state, at(base, 0.3), &b).is_none());
        assert!(first_reportable(&mut state, at(base, 1.5), &b).is_some());
    }
}
