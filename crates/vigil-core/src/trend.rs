//! Live trend window for visualization.
//!
//! A visualization aid, not a measurement: each appended point carries
//! small independent jitter per channel so flat readings still produce a
//! readable line. Never persisted; resets on restart.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Local;
use crossbeam_channel::{bounded, select, tick, Sender};
use rand::Rng;

use crate::domain::{SensorData, TrendPoint};

/// Points retained in the sliding window.
pub const TREND_CAPACITY: usize = 20;

/// Fixed-length sliding window of recent sensor values.
#[derive(Debug, Default)]
pub struct TrendBuffer {
    points: VecDeque<TrendPoint>,
}

impl TrendBuffer {
    pub fn new() -> Self {
        Self {
            points: VecDeque::new(),
        }
    }

    /// Jitter the snapshot and append it; evicts the oldest point past
    /// [`TREND_CAPACITY`]. Jitter bounds: temperature plus or minus
    /// 0.5 C, gas up to +5% relative, noise up to +10% relative,
    /// re-clamped to range.
    pub fn sample<R: Rng>(&mut self, sensors: &SensorData, rng: &mut R) {
        let point = TrendPoint {
            label: Local::now().format("%H:%M:%S").to_string(),
            temperature_c: sensors.temperature_c + rng.gen_range(-0.5..=0.5),
            gas_level: (sensors.gas_level * (1.0 + rng.gen_range(0.0..0.05))).clamp(0.0, 1.0),
            noise_level: (sensors.noise_level * (1.0 + rng.gen_range(0.0..0.10))).clamp(0.0, 1.0),
        };
        self.push(point);
    }

    pub fn push(&mut self, point: TrendPoint) {
        self.points.push_back(point);
        while self.points.len() > TREND_CAPACITY {
            self.points.pop_front();
        }
    }

    /// Oldest first, ready for charting.
    pub fn points(&self) -> Vec<TrendPoint> {
        self.points.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Periodic sampler feeding a shared [`TrendBuffer`] from the latest
/// sensor snapshot.
///
/// Independent of the evaluation pipeline: it keeps ticking whether or
/// not an evaluation is in flight. Dropping the handle stops the worker.
pub struct TrendTicker {
    stop: Sender<()>,
}

impl TrendTicker {
    pub fn spawn(
        buffer: Arc<Mutex<TrendBuffer>>,
        snapshot: Arc<Mutex<SensorData>>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        thread::Builder::new().name("trend".into()).spawn(move || {
            let ticker = tick(interval);
            let mut rng = rand::thread_rng();
            loop {
                select! {
                    recv(ticker) -> _ => {
                        let current = match snapshot.lock() {
                            Ok(s) => *s,
                            Err(_) => continue,
                        };
                        if let Ok(mut buf) = buffer.lock() {
                            buf.sample(&current, &mut rng);
                        }
                    }
                    recv(stop_rx) -> _ => return,
                }
            }
        })?;
        Ok(Self { stop: stop_tx })
    }
}

impl Drop for TrendTicker {
    fn drop(&mut self) {
        let _ = self.stop.try_send(());
    }
}
