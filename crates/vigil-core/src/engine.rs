//! The evaluation pipeline: assemble, gate, consult or skip the oracle,
//! alert, journal.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::alert::AlertDispatcher;
use crate::config::RuntimeConfig;
use crate::context::{self, ContextError, RoomProfile};
use crate::domain::{
    ClassifierState, LogEntry, RoomContext, SafetyReport, SensorData, Settings, TrendPoint,
};
use crate::gate;
use crate::journal::{Journal, LogPersistence, SettingsPersistence, StatePersistence};
use crate::oracle::{resolve_report, SafetyOracle};
use crate::trend::TrendBuffer;

/// Pipeline phase, traced per cycle at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Assembling,
    Gating,
    Skipped,
    Analyzing,
    ReportReady,
    Alerting,
    Logging,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Result of one completed evaluation cycle.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub context: RoomContext,
    pub report: SafetyReport,
    pub entry: LogEntry,
    /// False when the confidence gate kept the oracle out of the loop.
    pub escalated: bool,
}

/// Owns all mutable pipeline state: settings, journal, latest snapshot,
/// dispatcher, and the injected oracle and persistence handles.
///
/// Triggers are strictly serial (`&mut self`): a trigger arriving while
/// an evaluation runs queues behind it, so at most one oracle call is in
/// flight and log entries never interleave out of timestamp order. The
/// trend ticker is the one independent task; it shares only the latest
/// snapshot and the trend buffer, both behind their own locks.
pub struct Engine {
    profile: RoomProfile,
    settings: Settings,
    journal: Journal,
    oracle: Box<dyn SafetyOracle>,
    dispatcher: AlertDispatcher,
    store: Box<dyn StatePersistence>,
    trend: Arc<Mutex<TrendBuffer>>,
    latest_snapshot: Arc<Mutex<SensorData>>,
    latest_report: Option<SafetyReport>,
    phase: CyclePhase,
}

impl Engine {
    /// Rehydrate settings and journal from the store. Corrupt or missing
    /// records degrade to defaults rather than failing startup.
    pub fn new(
        config: &RuntimeConfig,
        oracle: Box<dyn SafetyOracle>,
        dispatcher: AlertDispatcher,
        store: Box<dyn StatePersistence>,
    ) -> Self {
        let settings = match store.load_settings() {
            Ok(Some(stored)) => stored.normalized(),
            Ok(None) => Settings::default(),
            Err(err) => {
                log::warn!("settings record unreadable, using defaults: {err}");
                Settings::default()
            }
        };
        let journal = match store.load_log() {
            Ok(entries) => Journal::from_entries(config.log_capacity, entries),
            Err(err) => {
                log::warn!("log record unreadable, starting empty: {err}");
                Journal::new(config.log_capacity)
            }
        };
        Self {
            profile: RoomProfile {
                room_id: config.room_id.clone(),
                expected_occupancy: config.expected_occupancy.clone(),
            },
            settings,
            journal,
            oracle,
            dispatcher,
            store,
            trend: Arc::new(Mutex::new(TrendBuffer::new())),
            latest_snapshot: Arc::new(Mutex::new(SensorData::default())),
            latest_report: None,
            phase: CyclePhase::Idle,
        }
    }

    /// Run one evaluation cycle.
    ///
    /// The oracle call is the only long operation; everything else is
    /// synchronous and fast. The alert is fire-and-forget, so it never
    /// delays the journal write.
    pub fn trigger_evaluation(
        &mut self,
        sensors: SensorData,
        state: ClassifierState,
        confidence: f32,
        notes: &str,
    ) -> Result<CycleOutcome, EngineError> {
        self.set_phase(CyclePhase::Assembling);
        let ctx = match context::assemble(&self.profile, sensors, state, confidence, notes) {
            Ok(ctx) => ctx,
            Err(err) => {
                self.set_phase(CyclePhase::Idle);
                return Err(err.into());
            }
        };
        if let Ok(mut snapshot) = self.latest_snapshot.lock() {
            *snapshot = ctx.sensors;
        }

        self.set_phase(CyclePhase::Gating);
        // Live threshold, read at decision time.
        let threshold = self.settings.confidence_threshold;
        let escalated = gate::should_escalate(&ctx, threshold);
        let report = if escalated {
            self.set_phase(CyclePhase::Analyzing);
            resolve_report(self.oracle.evaluate(&ctx))
        } else {
            self.set_phase(CyclePhase::Skipped);
            gate::gate_skip_report(&ctx, threshold)
        };
        self.set_phase(CyclePhase::ReportReady);
        log::info!(
            "{}: {:?} at {:.0}% -> {}",
            ctx.room_id,
            ctx.state,
            ctx.confidence * 100.0,
            report.status.label()
        );

        self.set_phase(CyclePhase::Alerting);
        self.dispatcher
            .dispatch(report.status, self.settings.alerts_enabled);

        self.set_phase(CyclePhase::Logging);
        let entry = LogEntry::from_outcome(&ctx, &report);
        self.journal.append(entry.clone());
        self.persist_log();

        self.latest_report = Some(report.clone());
        self.set_phase(CyclePhase::Idle);
        Ok(CycleOutcome {
            context: ctx,
            report,
            entry,
            escalated,
        })
    }

    /// Initial evaluation fired once at startup with a nominal snapshot.
    pub fn boot_context(&mut self) -> Result<CycleOutcome, EngineError> {
        self.trigger_evaluation(
            SensorData::default(),
            ClassifierState::Normal,
            0.95,
            "boot context",
        )
    }

    /// Takes effect on the next cycle; written through immediately.
    pub fn set_threshold(&mut self, value: f32) {
        self.settings.confidence_threshold = value.clamp(0.0, 1.0);
        self.persist_settings();
    }

    pub fn set_alerts_enabled(&mut self, enabled: bool) {
        self.settings.alerts_enabled = enabled;
        self.persist_settings();
    }

    /// Empties both the in-memory journal and its durable copy.
    pub fn clear_log(&mut self) {
        self.journal.clear();
        if let Err(err) = self.store.clear_log() {
            log::error!("failed to clear durable log: {err}");
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Newest first.
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.journal.snapshot()
    }

    pub fn latest_report(&self) -> Option<&SafetyReport> {
        self.latest_report.as_ref()
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn trend_points(&self) -> Vec<TrendPoint> {
        self.trend.lock().map(|buf| buf.points()).unwrap_or_default()
    }

    /// Shared handle for the trend ticker.
    pub fn trend_buffer(&self) -> Arc<Mutex<TrendBuffer>> {
        Arc::clone(&self.trend)
    }

    /// Shared handle for the trend ticker's sensor source.
    pub fn latest_snapshot(&self) -> Arc<Mutex<SensorData>> {
        Arc::clone(&self.latest_snapshot)
    }

    fn persist_settings(&self) {
        if let Err(err) = self.store.save_settings(&self.settings) {
            log::error!("settings not persisted: {err}");
        }
    }

    fn persist_log(&self) {
        if let Err(err) = self.store.save_log(&self.journal.snapshot()) {
            log::error!("journal not persisted: {err}");
        }
    }

    fn set_phase(&mut self, phase: CyclePhase) {
        log::debug!("pipeline {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}
