//! Context assembly and input validation.

use chrono::Utc;
use thiserror::Error;

use crate::domain::{ClassifierState, RoomContext, SensorData};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    /// Confidence was NaN or infinite. Finite out-of-range values are
    /// clamped instead; non-finite ones indicate a broken classifier.
    #[error("classifier confidence is not a finite number")]
    InvalidConfidence,
}

/// Static room metadata carried into every assembled context.
#[derive(Debug, Clone)]
pub struct RoomProfile {
    pub room_id: String,
    pub expected_occupancy: String,
}

impl Default for RoomProfile {
    fn default() -> Self {
        Self {
            room_id: "room-1".to_string(),
            expected_occupancy: "1 resident".to_string(),
        }
    }
}

/// Build an immutable [`RoomContext`] from the current readings.
///
/// Pure construction, no I/O beyond the clock. Validation policy:
/// non-finite confidence is rejected, a finite value outside [0, 1] is
/// clamped, and analog sensor channels are clamped to their ranges.
pub fn assemble(
    profile: &RoomProfile,
    sensors: SensorData,
    state: ClassifierState,
    confidence: f32,
    notes: &str,
) -> Result<RoomContext, ContextError> {
    if !confidence.is_finite() {
        return Err(ContextError::InvalidConfidence);
    }
    Ok(RoomContext {
        room_id: profile.room_id.clone(),
        timestamp: Utc::now(),
        state,
        confidence: confidence.clamp(0.0, 1.0),
        sensors: clamp_sensors(sensors),
        expected_occupancy: profile.expected_occupancy.clone(),
        notes: notes.to_string(),
    })
}

fn clamp_sensors(mut s: SensorData) -> SensorData {
    s.humidity_pct = s.humidity_pct.clamp(0.0, 100.0);
    s.gas_level = s.gas_level.clamp(0.0, 1.0);
    s.smoke_level = s.smoke_level.clamp(0.0, 1.0);
    s.noise_level = s.noise_level.clamp(0.0, 1.0);
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_confidence() {
        let profile = RoomProfile::default();
        let err = assemble(&profile, SensorData::default(), ClassifierState::Normal, f32::NAN, "");
        assert_eq!(err.unwrap_err(), ContextError::InvalidConfidence);
        let err = assemble(&profile, SensorData::default(), ClassifierState::Normal, f32::INFINITY, "");
        assert_eq!(err.unwrap_err(), ContextError::InvalidConfidence);
    }

    #[test]
    fn clamps_out_of_range_confidence() {
        let profile = RoomProfile::default();
        let ctx = assemble(&profile, SensorData::default(), ClassifierState::Normal, 1.2, "").unwrap();
        assert_eq!(ctx.confidence, 1.0);
        let ctx = assemble(&profile, SensorData::default(), ClassifierState::Normal, -0.3, "").unwrap();
        assert_eq!(ctx.confidence, 0.0);
    }

    #[test]
    fn clamps_analog_channels() {
        let sensors = SensorData {
            humidity_pct: 140.0,
            gas_level: 1.5,
            noise_level: -0.2,
            ..SensorData::default()
        };
        let ctx = assemble(
            &RoomProfile::default(),
            sensors,
            ClassifierState::Normal,
            0.5,
            "",
        )
        .unwrap();
        assert_eq!(ctx.sensors.humidity_pct, 100.0);
        assert_eq!(ctx.sensors.gas_level, 1.0);
        assert_eq!(ctx.sensors.noise_level, 0.0);
    }

    #[test]
    fn carries_profile_metadata() {
        let profile = RoomProfile {
            room_id: "suite-12".into(),
            expected_occupancy: "2 residents".into(),
        };
        let ctx = assemble(&profile, SensorData::default(), ClassifierState::NoMovement, 0.8, "night round")
            .unwrap();
        assert_eq!(ctx.room_id, "suite-12");
        assert_eq!(ctx.expected_occupancy, "2 residents");
        assert_eq!(ctx.notes, "night round");
    }
}
