//! Tiered audio alerts.
//!
//! The dispatcher maps a status to a tone pattern and hands it to a
//! worker thread, so the evaluation pipeline never waits on audio.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Sender};
use thiserror::Error;

use crate::domain::SafetyStatus;

/// One tone in an alert pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u64,
    /// Pause before the next tone.
    pub gap_ms: u64,
}

/// Map a status to its audible pattern.
pub fn pattern_for(status: SafetyStatus) -> Vec<Tone> {
    match status {
        SafetyStatus::Danger => vec![
            Tone {
                frequency_hz: 880,
                duration_ms: 180,
                gap_ms: 220,
            };
            3
        ],
        SafetyStatus::Warning => vec![
            Tone {
                frequency_hz: 440,
                duration_ms: 450,
                gap_ms: 250,
            };
            2
        ],
        SafetyStatus::Safe => Vec::new(),
    }
}

#[derive(Debug, Error)]
#[error("audio output failed: {0}")]
pub struct AudioError(pub String);

/// Audio output seam.
///
/// `play` blocks for the tone duration; the blocking is confined to the
/// dispatcher's worker thread. The CLI drives a terminal bell, tests use
/// a capturing sink.
pub trait ToneSink: Send {
    fn play(&mut self, tone: Tone) -> Result<(), AudioError>;
}

/// Discards tones immediately. Headless default.
pub struct NullSink;

impl ToneSink for NullSink {
    fn play(&mut self, _tone: Tone) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Schedules alert patterns without blocking the evaluation pipeline.
///
/// The worker thread and its sink are created lazily on the first
/// audible dispatch and live for the rest of the process; sink failures
/// are swallowed with a warning, since alerting is a side channel to the
/// authoritative log record.
pub struct AlertDispatcher {
    sink: Option<Box<dyn ToneSink>>,
    tx: Option<Sender<Vec<Tone>>>,
}

impl AlertDispatcher {
    pub fn new(sink: Box<dyn ToneSink>) -> Self {
        Self {
            sink: Some(sink),
            tx: None,
        }
    }

    /// Fire-and-forget. A disabled alerts flag is a handled no-op, and a
    /// failed sink never reaches the caller.
    pub fn dispatch(&mut self, status: SafetyStatus, alerts_enabled: bool) {
        if !alerts_enabled {
            log::debug!("alerts disabled, skipping {:?} pattern", status);
            return;
        }
        let pattern = pattern_for(status);
        if pattern.is_empty() {
            return;
        }
        self.ensure_worker();
        if let Some(tx) = &self.tx {
            let _ = tx.send(pattern);
        }
    }

    fn ensure_worker(&mut self) {
        if self.tx.is_some() {
            return;
        }
        let Some(mut sink) = self.sink.take() else {
            return;
        };
        let (tx, rx) = unbounded::<Vec<Tone>>();
        let spawned = thread::Builder::new().name("alert".into()).spawn(move || {
            for pattern in rx {
                for tone in &pattern {
                    if let Err(err) = sink.play(*tone) {
                        log::warn!("alert tone dropped: {err}");
                    }
                    thread::sleep(Duration::from_millis(tone.gap_ms));
                }
            }
        });
        match spawned {
            Ok(_) => self.tx = Some(tx),
            Err(err) => log::warn!("alert worker unavailable: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::Receiver;
    use std::time::Duration;

    struct CaptureSink(Sender<Tone>);

    impl ToneSink for CaptureSink {
        fn play(&mut self, tone: Tone) -> Result<(), AudioError> {
            self.0.send(tone).map_err(|err| AudioError(err.to_string()))
        }
    }

    fn capture_dispatcher() -> (AlertDispatcher, Receiver<Tone>) {
        let (tx, rx) = unbounded();
        (AlertDispatcher::new(Box::new(CaptureSink(tx))), rx)
    }

    #[test]
    fn danger_pattern_is_three_high_tones() {
        let pattern = pattern_for(SafetyStatus::Danger);
        assert_eq!(pattern.len(), 3);
        for tone in &pattern {
            assert_eq!(tone.frequency_hz, 880);
            assert_eq!(tone.duration_ms, 180);
        }
    }

    #[test]
    fn warning_pattern_is_two_low_tones() {
        let pattern = pattern_for(SafetyStatus::Warning);
        assert_eq!(pattern.len(), 2);
        assert!(pattern.iter().all(|t| t.frequency_hz == 440));
    }

    #[test]
    fn safe_is_silent() {
        assert!(pattern_for(SafetyStatus::Safe).is_empty());
    }

    #[test]
    fn dispatch_schedules_the_full_pattern() {
        let (mut dispatcher, rx) = capture_dispatcher();
        dispatcher.dispatch(SafetyStatus::Danger, true);
        for _ in 0..3 {
            let tone = rx.recv_timeout(Duration::from_secs(2)).unwrap();
            assert_eq!(tone.frequency_hz, 880);
        }
    }

    #[test]
    fn disabled_alerts_are_a_handled_noop() {
        let (mut dispatcher, rx) = capture_dispatcher();
        dispatcher.dispatch(SafetyStatus::Danger, false);
        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
    }

    #[test]
    fn safe_status_plays_nothing() {
        let (mut dispatcher, rx) = capture_dispatcher();
        dispatcher.dispatch(SafetyStatus::Safe, true);
        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
    }
}
