//! Confidence gate: decides whether a context is worth escalating to the
//! reasoning oracle.

use crate::domain::{RoomContext, SafetyReport, SafetyStatus, NO_WARDEN_ACTION};

/// True iff the context's confidence reaches the escalation threshold.
///
/// The threshold comes from the live [`crate::domain::Settings`]; callers
/// read it at decision time, never from a cached copy, so a settings
/// change applies on the next cycle.
pub fn should_escalate(ctx: &RoomContext, threshold: f32) -> bool {
    ctx.confidence >= threshold
}

/// Report synthesized when the gate keeps the oracle out of the loop.
///
/// Logged identically to an analyzed outcome; only the report content
/// differs.
pub fn gate_skip_report(ctx: &RoomContext, threshold: f32) -> SafetyReport {
    SafetyReport {
        status: SafetyStatus::Safe,
        summary: format!(
            "Classifier confidence {:.0}% is below the {:.0}% escalation threshold; analysis skipped.",
            ctx.confidence * 100.0,
            threshold * 100.0
        ),
        actions_for_user: vec!["Check the room manually if anything seems off.".to_string()],
        actions_for_warden: vec![NO_WARDEN_ACTION.to_string()],
    }
}
