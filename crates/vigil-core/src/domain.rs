//! Core domain types: room snapshots, safety reports, and log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Warden action sentinel used when a report needs none.
pub const NO_WARDEN_ACTION: &str = "None needed.";

/// One snapshot of the room's edge sensors.
///
/// Produced by the (external) sensing layer and never mutated after
/// capture. Analog channels are normalized to their documented ranges by
/// the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorData {
    /// Motion events counted over the trailing 15-minute window.
    pub motion_events: u32,
    /// Average temperature in degrees Celsius.
    pub temperature_c: f32,
    /// Average relative humidity [0, 100].
    pub humidity_pct: f32,
    /// Normalized gas level [0, 1].
    pub gas_level: f32,
    /// Normalized smoke level [0, 1].
    pub smoke_level: f32,
    /// Normalized noise level [0, 1].
    pub noise_level: f32,
    /// Whether the room door is currently open.
    pub door_open: bool,
}

impl Default for SensorData {
    fn default() -> Self {
        // Nominal quiet-room readings.
        Self {
            motion_events: 4,
            temperature_c: 21.5,
            humidity_pct: 45.0,
            gas_level: 0.02,
            smoke_level: 0.01,
            noise_level: 0.10,
            door_open: false,
        }
    }
}

impl SensorData {
    /// Compact single-line form used in log entries and CSV export.
    pub fn summary(&self) -> String {
        format!(
            "motion {} | {:.1}C | hum {:.0}% | gas {:.2} | smoke {:.2} | noise {:.2} | door {}",
            self.motion_events,
            self.temperature_c,
            self.humidity_pct,
            self.gas_level,
            self.smoke_level,
            self.noise_level,
            if self.door_open { "open" } else { "closed" },
        )
    }
}

/// State reported by the local activity classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassifierState {
    Normal,
    NoMovement,
    FallLikely,
    GasSmokeAlert,
    OverheatRisk,
    LoudNoise,
}

impl ClassifierState {
    /// Human-readable label for log rows and CSV export.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::NoMovement => "No movement",
            Self::FallLikely => "Fall likely",
            Self::GasSmokeAlert => "Gas/smoke alert",
            Self::OverheatRisk => "Overheat risk",
            Self::LoudNoise => "Loud noise",
        }
    }
}

/// One timestamped room snapshot submitted for evaluation.
///
/// Value object: assembled once per cycle (see [`crate::context`]) and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomContext {
    pub room_id: String,
    pub timestamp: DateTime<Utc>,
    pub state: ClassifierState,
    /// Classifier confidence in [0, 1]; guaranteed by the assembler.
    pub confidence: f32,
    pub sensors: SensorData,
    /// Free-form occupancy label, e.g. "1 resident".
    pub expected_occupancy: String,
    pub notes: String,
}

/// Outcome tier of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SafetyStatus {
    Safe,
    Warning,
    Danger,
}

impl SafetyStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Warning => "Warning",
            Self::Danger => "Danger",
        }
    }
}

/// Structured assessment of one room context.
///
/// Produced by oracle sanitization, gate-skip synthesis, or the fixed
/// fallback; consumed by the dispatcher and the journal, then retained
/// only inside a [`LogEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub status: SafetyStatus,
    pub summary: String,
    pub actions_for_user: Vec<String>,
    pub actions_for_warden: Vec<String>,
}

/// One completed evaluation outcome as retained in the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub status: SafetyStatus,
    pub state: ClassifierState,
    /// Compact sensor snapshot, see [`SensorData::summary`].
    pub sensor_summary: String,
}

impl LogEntry {
    pub fn from_outcome(ctx: &RoomContext, report: &SafetyReport) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: ctx.timestamp,
            status: report.status,
            state: ctx.state,
            sensor_summary: ctx.sensors.summary(),
        }
    }
}

/// One sample of the live trend window. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Wall-clock label (HH:MM:SS) at sampling time.
    pub label: String,
    pub temperature_c: f32,
    pub gas_level: f32,
    pub noise_level: f32,
}

/// Process-wide user settings, durably stored and rewritten on change.
///
/// Wire field names (`alertsEnabled`, `confidenceThreshold`) are part of
/// the storage layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub alerts_enabled: bool,
    pub confidence_threshold: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alerts_enabled: true,
            confidence_threshold: 0.75,
        }
    }
}

impl Settings {
    /// Clamp the threshold into [0, 1]; stored records may predate
    /// validation.
    pub fn normalized(mut self) -> Self {
        self.confidence_threshold = self.confidence_threshold.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_state_wire_names() {
        let json = serde_json::to_string(&ClassifierState::NoMovement).unwrap();
        assert_eq!(json, "\"NO_MOVEMENT\"");
        let back: ClassifierState = serde_json::from_str("\"GAS_SMOKE_ALERT\"").unwrap();
        assert_eq!(back, ClassifierState::GasSmokeAlert);
    }

    #[test]
    fn status_wire_names_are_uppercase() {
        assert_eq!(serde_json::to_string(&SafetyStatus::Danger).unwrap(), "\"DANGER\"");
        // Case-sensitive: lowercase must not parse.
        assert!(serde_json::from_str::<SafetyStatus>("\"danger\"").is_err());
    }

    #[test]
    fn settings_storage_field_names() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains("\"alertsEnabled\":true"));
        assert!(json.contains("\"confidenceThreshold\":0.75"));
    }

    #[test]
    fn settings_normalized_clamps_threshold() {
        let s = Settings { alerts_enabled: true, confidence_threshold: 1.7 }.normalized();
        assert_eq!(s.confidence_threshold, 1.0);
    }

    #[test]
    fn sensor_summary_mentions_door_state() {
        let mut sensors = SensorData::default();
        assert!(sensors.summary().contains("door closed"));
        sensors.door_open = true;
        assert!(sensors.summary().contains("door open"));
    }
}
