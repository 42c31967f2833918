//! Oracle boundary: wire format, response sanitization, and the
//! deterministic fallback used whenever the oracle path cannot be trusted.

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    ClassifierState, RoomContext, SafetyReport, SafetyStatus, NO_WARDEN_ACTION,
};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport failed: {0}")]
    Transport(String),
    #[error("oracle call timed out")]
    Timeout,
    #[error("malformed oracle response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Raw oracle response.
///
/// Every field is optional on the wire; absent fields are filled with
/// safe defaults by [`OracleResponse::sanitize`]. A body that does not
/// parse at all is a malformed response, not a partial one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OracleResponse {
    #[serde(default)]
    pub status: Option<SafetyStatus>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub actions_for_user: Vec<String>,
    #[serde(default)]
    pub actions_for_warden: Vec<String>,
}

impl OracleResponse {
    pub fn from_json(body: &str) -> Result<Self, OracleError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Fill absent fields with safe defaults. Partial success is success.
    pub fn sanitize(self) -> SafetyReport {
        let actions_for_warden = if self.actions_for_warden.is_empty() {
            vec![NO_WARDEN_ACTION.to_string()]
        } else {
            self.actions_for_warden
        };
        SafetyReport {
            status: self.status.unwrap_or(SafetyStatus::Safe),
            summary: self
                .summary
                .unwrap_or_else(|| "No summary provided.".to_string()),
            actions_for_user: self.actions_for_user,
            actions_for_warden,
        }
    }
}

/// External reasoning service consulted for escalated contexts.
///
/// Implementations may block for network-latency-scale time and may
/// fail; the pipeline absorbs every failure through [`resolve_report`].
/// A timeout is the implementation's concern and surfaces as
/// [`OracleError::Timeout`], which resolves like any other failure.
pub trait SafetyOracle: Send {
    fn evaluate(&self, ctx: &RoomContext) -> Result<OracleResponse, OracleError>;
}

/// The fixed report used whenever the oracle path fails.
pub fn fallback_report() -> SafetyReport {
    SafetyReport {
        status: SafetyStatus::Safe,
        summary: "Communication error - falling back to local heuristics.".to_string(),
        actions_for_user: vec!["Check sensors manually.".to_string()],
        actions_for_warden: vec![NO_WARDEN_ACTION.to_string()],
    }
}

/// Single boundary converting an oracle result into a usable report.
///
/// Errors never propagate past this point: the pipeline always completes
/// with some report.
pub fn resolve_report(result: Result<OracleResponse, OracleError>) -> SafetyReport {
    match result {
        Ok(response) => response.sanitize(),
        Err(err) => {
            log::warn!("oracle unavailable, using fallback report: {err}");
            fallback_report()
        }
    }
}

/// Deterministic rule-based oracle.
///
/// Real transports live with the UI collaborator; this implementation
/// keeps the pipeline runnable end to end (CLI, demos) without one.
#[derive(Debug, Default)]
pub struct RuleOracle;

impl SafetyOracle for RuleOracle {
    fn evaluate(&self, ctx: &RoomContext) -> Result<OracleResponse, OracleError> {
        let (status, summary, user, warden) = match ctx.state {
            ClassifierState::GasSmokeAlert => (
                SafetyStatus::Danger,
                format!(
                    "Gas or smoke detected in {} (gas {:.2}, smoke {:.2}).",
                    ctx.room_id, ctx.sensors.gas_level, ctx.sensors.smoke_level
                ),
                vec![
                    "Open windows and leave the room.".to_string(),
                    "Do not operate switches or open flames.".to_string(),
                ],
                vec![
                    "Call the fire department.".to_string(),
                    "Verify the resident has left the room.".to_string(),
                ],
            ),
            ClassifierState::FallLikely => (
                SafetyStatus::Danger,
                "Movement pattern consistent with a fall.".to_string(),
                vec!["Respond verbally if you are able.".to_string()],
                vec!["Check on the resident immediately.".to_string()],
            ),
            ClassifierState::OverheatRisk => (
                SafetyStatus::Warning,
                format!(
                    "Room temperature {:.1} C is above the comfort range.",
                    ctx.sensors.temperature_c
                ),
                vec!["Ventilate the room and drink water.".to_string()],
                vec!["Review the heating settings for this room.".to_string()],
            ),
            ClassifierState::LoudNoise => (
                SafetyStatus::Warning,
                "Sustained loud noise detected.".to_string(),
                vec!["Confirm the source of the noise.".to_string()],
                Vec::new(),
            ),
            ClassifierState::NoMovement => (
                SafetyStatus::Warning,
                format!(
                    "No movement recorded; expected occupancy is {}.",
                    ctx.expected_occupancy
                ),
                vec!["Respond to this notification to confirm you are fine.".to_string()],
                vec!["Schedule a check-in visit.".to_string()],
            ),
            ClassifierState::Normal => (
                SafetyStatus::Safe,
                "Room activity looks normal.".to_string(),
                Vec::new(),
                Vec::new(),
            ),
        };
        Ok(OracleResponse {
            status: Some(status),
            summary: Some(summary),
            actions_for_user: user,
            actions_for_warden: warden,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{assemble, RoomProfile};
    use crate::domain::SensorData;

    #[test]
    fn missing_warden_actions_default_to_sentinel() {
        let response = OracleResponse::from_json(
            r#"{"status": "WARNING", "summary": "Check the heater", "actions_for_user": ["Open a window"]}"#,
        )
        .unwrap();
        let report = response.sanitize();
        assert_eq!(report.status, SafetyStatus::Warning);
        assert_eq!(report.actions_for_warden, vec![NO_WARDEN_ACTION.to_string()]);
        assert_eq!(report.actions_for_user, vec!["Open a window".to_string()]);
    }

    #[test]
    fn missing_status_defaults_to_safe() {
        let report = OracleResponse::from_json("{}").unwrap().sanitize();
        assert_eq!(report.status, SafetyStatus::Safe);
        assert_eq!(report.actions_for_warden, vec![NO_WARDEN_ACTION.to_string()]);
    }

    #[test]
    fn explicit_sentinel_passes_through_unchanged() {
        let response = OracleResponse::from_json(
            r#"{"status": "SAFE", "actions_for_warden": ["None needed."]}"#,
        )
        .unwrap();
        assert_eq!(response.sanitize().actions_for_warden, vec![NO_WARDEN_ACTION.to_string()]);
    }

    #[test]
    fn garbage_body_is_malformed() {
        assert!(matches!(
            OracleResponse::from_json("not json at all"),
            Err(OracleError::Malformed(_))
        ));
        // An invalid status value makes the whole response malformed.
        assert!(matches!(
            OracleResponse::from_json(r#"{"status": "FINE"}"#),
            Err(OracleError::Malformed(_))
        ));
    }

    #[test]
    fn any_error_resolves_to_the_fixed_fallback() {
        let report = resolve_report(Err(OracleError::Transport("connection reset".into())));
        assert_eq!(report, fallback_report());
        let report = resolve_report(Err(OracleError::Timeout));
        assert_eq!(report, fallback_report());
    }

    #[test]
    fn rule_oracle_grades_gas_as_danger() {
        let ctx = assemble(
            &RoomProfile::default(),
            SensorData {
                gas_level: 0.8,
                smoke_level: 0.4,
                ..SensorData::default()
            },
            ClassifierState::GasSmokeAlert,
            0.9,
            "",
        )
        .unwrap();
        let report = resolve_report(RuleOracle.evaluate(&ctx));
        assert_eq!(report.status, SafetyStatus::Danger);
        assert!(!report.actions_for_warden.is_empty());
    }

    #[test]
    fn rule_oracle_normal_report_gets_sentinel_via_sanitize() {
        let ctx = assemble(
            &RoomProfile::default(),
            SensorData::default(),
            ClassifierState::Normal,
            0.9,
            "",
        )
        .unwrap();
        let report = resolve_report(RuleOracle.evaluate(&ctx));
        assert_eq!(report.status, SafetyStatus::Safe);
        assert_eq!(report.actions_for_warden, vec![NO_WARDEN_ACTION.to_string()]);
    }
}
