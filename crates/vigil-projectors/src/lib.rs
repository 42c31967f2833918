//! Read-model projections for the UI collaborator: log rows, CSV export,
//! and chart-ready trend series.

use serde::Serialize;

use vigil_core::{LogEntry, SafetyStatus, TrendPoint};

/// Severity tag driving the UI's row coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Caution,
    Critical,
}

pub fn severity_for(status: SafetyStatus) -> Severity {
    match status {
        SafetyStatus::Safe => Severity::Ok,
        SafetyStatus::Warning => Severity::Caution,
        SafetyStatus::Danger => Severity::Critical,
    }
}

/// One presentation row of the event log.
#[derive(Debug, Clone, Serialize)]
pub struct LogRow {
    pub timestamp: String,
    pub state: String,
    pub assessment: String,
    pub severity: Severity,
    pub sensors: String,
}

/// Newest first, matching the journal order.
pub fn log_rows(entries: &[LogEntry]) -> Vec<LogRow> {
    entries
        .iter()
        .map(|entry| LogRow {
            timestamp: entry.timestamp.to_rfc3339(),
            state: entry.state.label().to_string(),
            assessment: entry.status.label().to_string(),
            severity: severity_for(entry.status),
            sensors: entry.sensor_summary.clone(),
        })
        .collect()
}

/// CSV export of the journal, newest first.
///
/// Every data field is double-quoted with internal quotes doubled, so
/// summaries may contain commas and quotes freely.
pub fn export_csv(entries: &[LogEntry]) -> String {
    let mut out = String::from("Timestamp,ML State,AI Assessment,Sensor Snapshot\n");
    for entry in entries {
        let fields = [
            entry.timestamp.to_rfc3339(),
            entry.state.label().to_string(),
            entry.status.label().to_string(),
            entry.sensor_summary.clone(),
        ];
        let quoted: Vec<String> = fields.iter().map(|f| quote_field(f)).collect();
        out.push_str(&quoted.join(","));
        out.push('\n');
    }
    out
}

fn quote_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Parallel series for charting the trend window, oldest first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrendSeries {
    pub labels: Vec<String>,
    pub temperature_c: Vec<f32>,
    pub gas_level: Vec<f32>,
    pub noise_level: Vec<f32>,
}

pub fn trend_series(points: &[TrendPoint]) -> TrendSeries {
    let mut series = TrendSeries::default();
    for point in points {
        series.labels.push(point.label.clone());
        series.temperature_c.push(point.temperature_c);
        series.gas_level.push(point.gas_level);
        series.noise_level.push(point.noise_level);
    }
    series
}
