//! Stand-in UI collaborator: drives the pipeline from the terminal.
//!
//! Scenario triggers mirror the monitoring UI's buttons; the other
//! subcommands cover the settings and log operations the UI exposes.

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use vigil_core::{
    AlertDispatcher, AudioError, ClassifierState, CycleOutcome, Engine, RuleOracle, RuntimeConfig,
    SafetyStatus, SensorData, Tone, ToneSink, TrendTicker,
};
use vigil_projectors as projectors;
use vigil_store::{load_or_create_secret, SafetyStore};

#[derive(Parser)]
#[command(name = "vigil", about = "Room safety monitor pipeline", version)]
struct Cli {
    /// Data directory (store, device secret, vigil.toml). Defaults to
    /// the per-user data dir.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Device secret as 64 hex chars; overrides the secret file.
    #[arg(long)]
    secret: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one evaluation cycle for a scenario.
    Trigger {
        #[arg(value_enum)]
        scenario: Scenario,
        /// Classifier confidence [0, 1].
        #[arg(long, default_value_t = 0.9)]
        confidence: f32,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Set the confidence threshold [0, 1].
    Threshold { value: f32 },
    /// Enable or disable audible alerts.
    Alerts {
        #[arg(value_enum)]
        mode: Toggle,
    },
    /// Inspect or manage the event log.
    Log {
        #[command(subcommand)]
        action: LogAction,
    },
    /// Print the current trend window.
    Trend,
    /// Boot context plus live trend ticker; Ctrl-C to stop.
    Watch {
        /// Seconds between status prints.
        #[arg(long, default_value_t = 10)]
        interval: u64,
    },
}

#[derive(Subcommand)]
enum LogAction {
    Show,
    Clear,
    Export,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

/// The monitoring UI's scenario buttons.
#[derive(Clone, Copy, ValueEnum)]
enum Scenario {
    Normal,
    NoMovement,
    Fall,
    Gas,
    Overheat,
    LoudNoise,
}

impl Scenario {
    fn classifier_state(self) -> ClassifierState {
        match self {
            Scenario::Normal => ClassifierState::Normal,
            Scenario::NoMovement => ClassifierState::NoMovement,
            Scenario::Fall => ClassifierState::FallLikely,
            Scenario::Gas => ClassifierState::GasSmokeAlert,
            Scenario::Overheat => ClassifierState::OverheatRisk,
            Scenario::LoudNoise => ClassifierState::LoudNoise,
        }
    }

    fn sensors(self) -> SensorData {
        match self {
            Scenario::Normal => SensorData::default(),
            Scenario::NoMovement => SensorData {
                motion_events: 0,
                noise_level: 0.05,
                ..SensorData::default()
            },
            Scenario::Fall => SensorData {
                motion_events: 1,
                noise_level: 0.60,
                ..SensorData::default()
            },
            Scenario::Gas => SensorData {
                gas_level: 0.78,
                smoke_level: 0.35,
                door_open: false,
                ..SensorData::default()
            },
            Scenario::Overheat => SensorData {
                temperature_c: 31.5,
                humidity_pct: 30.0,
                ..SensorData::default()
            },
            Scenario::LoudNoise => SensorData {
                noise_level: 0.92,
                ..SensorData::default()
            },
        }
    }
}

/// Terminal-bell tone sink. Frequency is out of the terminal's hands, so
/// the pattern's rhythm carries the tiering.
struct BellSink;

impl ToneSink for BellSink {
    fn play(&mut self, tone: Tone) -> Result<(), AudioError> {
        let mut out = std::io::stdout();
        out.write_all(b"\x07")
            .and_then(|_| out.flush())
            .map_err(|err| AudioError(err.to_string()))?;
        thread::sleep(Duration::from_millis(tone.duration_ms));
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vigil"),
    };
    std::fs::create_dir_all(&data_dir)?;
    log::info!("vigil starting, data dir {}", data_dir.display());

    let config_path = data_dir.join("vigil.toml");
    if !config_path.exists() {
        std::fs::write(&config_path, RuntimeConfig::default_toml())?;
    }
    let config = RuntimeConfig::load(&config_path)?;

    let secret = match &cli.secret {
        Some(text) => parse_secret(text)?,
        None => load_or_create_secret(&data_dir.join("device.secret"))?,
    };
    let store = SafetyStore::open(&data_dir.join("vigil.db"), secret)?;

    let mut engine = Engine::new(
        &config,
        Box::new(RuleOracle),
        AlertDispatcher::new(Box::new(BellSink)),
        Box::new(store),
    );

    match cli.command {
        Command::Trigger {
            scenario,
            confidence,
            notes,
        } => {
            let outcome = engine.trigger_evaluation(
                scenario.sensors(),
                scenario.classifier_state(),
                confidence,
                &notes,
            )?;
            print_outcome(&outcome);
            wait_for_alert(&outcome, engine.settings().alerts_enabled);
        }
        Command::Threshold { value } => {
            engine.set_threshold(value);
            println!(
                "confidence threshold set to {:.0}%",
                engine.settings().confidence_threshold * 100.0
            );
        }
        Command::Alerts { mode } => {
            let enabled = matches!(mode, Toggle::On);
            engine.set_alerts_enabled(enabled);
            println!("alerts {}", if enabled { "enabled" } else { "disabled" });
        }
        Command::Log { action } => match action {
            LogAction::Show => {
                let rows = projectors::log_rows(&engine.log_entries());
                if rows.is_empty() {
                    println!("log is empty");
                }
                for row in rows {
                    println!(
                        "{}  [{:^7}]  {:<16}  {}",
                        row.timestamp, row.assessment, row.state, row.sensors
                    );
                }
            }
            LogAction::Clear => {
                engine.clear_log();
                println!("log cleared");
            }
            LogAction::Export => {
                print!("{}", projectors::export_csv(&engine.log_entries()));
            }
        },
        Command::Trend => {
            print_trend(&engine);
        }
        Command::Watch { interval } => watch(&mut engine, &config, interval)?,
    }
    Ok(())
}

fn watch(engine: &mut Engine, config: &RuntimeConfig, interval: u64) -> Result<(), Box<dyn Error>> {
    let _ticker = TrendTicker::spawn(
        engine.trend_buffer(),
        engine.latest_snapshot(),
        Duration::from_millis(config.trend_interval_ms),
    )?;
    let outcome = engine.boot_context()?;
    print_outcome(&outcome);
    loop {
        thread::sleep(Duration::from_secs(interval.max(1)));
        print_trend(engine);
    }
}

fn print_outcome(outcome: &CycleOutcome) {
    let report = &outcome.report;
    println!("status: {}", report.status.label());
    println!("summary: {}", report.summary);
    for action in &report.actions_for_user {
        println!("  you:    {action}");
    }
    for action in &report.actions_for_warden {
        println!("  warden: {action}");
    }
    if !outcome.escalated {
        println!("(confidence gate kept the oracle out of the loop)");
    }
}

fn print_trend(engine: &Engine) {
    let series = projectors::trend_series(&engine.trend_points());
    if series.labels.is_empty() {
        println!("trend window is empty");
        return;
    }
    for i in 0..series.labels.len() {
        println!(
            "{}  {:.1}C  gas {:.2}  noise {:.2}",
            series.labels[i], series.temperature_c[i], series.gas_level[i], series.noise_level[i]
        );
    }
}

/// Give a scheduled pattern time to finish before the process exits;
/// the dispatcher is fire-and-forget and its worker dies with us.
fn wait_for_alert(outcome: &CycleOutcome, alerts_enabled: bool) {
    if alerts_enabled && outcome.report.status != SafetyStatus::Safe {
        thread::sleep(Duration::from_millis(1600));
    }
}

fn parse_secret(text: &str) -> Result<[u8; 32], String> {
    let bytes = hex::decode(text.trim()).map_err(|err| format!("secret is not hex: {err}"))?;
    bytes
        .try_into()
        .map_err(|_| "secret must be 32 bytes (64 hex chars)".to_string())
}
