//! wardend - The warden background service
//!
//! This is the main entry point for the wardend service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Timer engine
//! - The once-per-second evaluation loop
//! - Event broadcast to presentation collaborators

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use warden_api::{parse_record_key, record_key, Event, EventPayload, TimerRecord};
use warden_config::{load_config, TimerPolicy};
use warden_core::{CoreEvent, TickOutcome, TimerEngine};
use warden_store::{SqliteStore, Store};
use warden_util::{Clock, EpochMillis, SystemClock};

/// wardend - Multi-house countdown timer service
#[derive(Parser, Debug)]
#[command(name = "wardend")]
#[command(about = "Multi-house countdown timer service", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/wardend/config.toml")]
    config: PathBuf,

    /// Data directory override (or set WARDEN_DATA_DIR env var)
    #[arg(short, long, env = "WARDEN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the service (the default)
    Run,
    /// Write all timers as JSON and exit
    Export {
        /// Output file (default: wardend-export-<timestamp>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all timers from a JSON file and exit
    Import {
        /// Input file produced by a previous export
        input: PathBuf,
    },
}

/// Main service state
struct Service {
    engine: TimerEngine,
    clock: SystemClock,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let policy = load_policy(&args.config)?;

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| policy.daemon.data_dir.clone());

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let db_path = data_dir.join("wardend.db");
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        let clock = SystemClock;
        let now = clock.now_ms().context("System clock unavailable")?;

        let mut engine = TimerEngine::new(policy, store);
        let events = engine.restore_all(now);
        info!(
            houses = engine.policy().total_houses,
            restored_events = events.len(),
            "State restored"
        );

        Ok(Self { engine, clock })
    }

    async fn run(self) -> Result<()> {
        let tick_interval = self.engine.policy().daemon.tick_interval;
        let tick_ms = tick_interval.as_millis() as i64;

        let engine = Arc::new(Mutex::new(self.engine));
        let clock = self.clock;

        // Event stream for presentation collaborators. Send errors just
        // mean nobody is listening right now.
        let (events_tx, _events_rx) = broadcast::channel::<Event>(256);

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        let mut tick_timer = tokio::time::interval(tick_interval);
        tick_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Wall-clock time of the previous tick, for suspend detection.
        let mut last_tick_ms: Option<EpochMillis> = None;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                _ = tick_timer.tick() => {
                    let now = match clock.now_ms() {
                        Ok(now) => now,
                        Err(err) => {
                            warn!(%err, "Clock read failed, skipping tick");
                            continue;
                        }
                    };

                    let gap = last_tick_ms.map(|last| now - last);
                    last_tick_ms = Some(now);

                    let events = {
                        let mut engine = engine.lock().await;
                        match gap {
                            // Suspend or severe stall: timestamps make
                            // the catch-up exact, so re-evaluate every
                            // active house in one pass.
                            Some(gap) if gap > 3 * tick_ms => {
                                info!(gap_ms = gap, "Scheduling gap detected, resyncing");
                                engine.resync(now)
                            }
                            _ => {
                                let mut events = Vec::new();
                                for token in engine.active_tokens() {
                                    if let TickOutcome::Evaluated { events: mut house_events, .. } =
                                        engine.tick(token, now)
                                    {
                                        events.append(&mut house_events);
                                    }
                                }
                                events
                            }
                        }
                    };

                    for event in events {
                        publish(&events_tx, event, now);
                    }
                }
            }
        }

        // Graceful shutdown: one last evaluation persists current
        // displays, then collaborators are told to disconnect.
        info!("Shutting down wardend");
        let shutdown_at = {
            let mut engine = engine.lock().await;
            final_persist(&mut engine, &clock)
        };
        if let Some(now) = shutdown_at {
            let _ = events_tx.send(Event::new(EventPayload::Shutdown, now));
        }

        info!("Shutdown complete");
        Ok(())
    }
}

/// Pre-shutdown persist pass. When the clock cannot be read there is
/// no valid `now` to evaluate against; the pass is skipped so the
/// last good persisted state stands, rather than recomputing every
/// house against a bogus timestamp.
fn final_persist(engine: &mut TimerEngine, clock: &dyn Clock) -> Option<EpochMillis> {
    match clock.now_ms() {
        Ok(now) => {
            engine.resync(now);
            Some(now)
        }
        Err(err) => {
            warn!(%err, "Clock unavailable at shutdown, skipping final persist");
            None
        }
    }
}

fn publish(tx: &broadcast::Sender<Event>, event: CoreEvent, now: EpochMillis) {
    let payload = match event {
        CoreEvent::DisplayUpdated {
            house,
            remaining_seconds,
        } => {
            debug!(
                house = %house,
                display = %warden_util::format_signed_clock(remaining_seconds),
                "display updated"
            );
            EventPayload::DisplayUpdated {
                house,
                remaining_seconds,
            }
        }
        CoreEvent::PhaseChanged { house, phase } => {
            info!(house = %house, %phase, "phase changed");
            EventPayload::PhaseChanged { house, phase }
        }
        CoreEvent::Alert { house, kind } => {
            info!(house = %house, ?kind, "alert");
            EventPayload::Alert { house, kind }
        }
        CoreEvent::AllStopped { stopped } => {
            info!(stopped, "all stopped");
            EventPayload::AllStopped { stopped }
        }
    };
    let _ = tx.send(Event::new(payload, now));
}

/// Load a policy, falling back to defaults when no config file exists.
fn load_policy(path: &Path) -> Result<TimerPolicy> {
    if !path.exists() {
        info!(config_path = %path.display(), "No config file, using defaults");
        return Ok(TimerPolicy::default());
    }
    let policy = load_config(path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;
    info!(
        config_path = %path.display(),
        houses = policy.total_houses,
        "Configuration loaded"
    );
    Ok(policy)
}

/// Serialize records in the portable export shape: a flat JSON object
/// keyed `timer-<i>`, pretty-printed.
fn render_export(records: &BTreeMap<usize, TimerRecord>) -> Result<String> {
    let keyed: BTreeMap<String, &TimerRecord> = records
        .iter()
        .map(|(index, record)| (record_key(*index), record))
        .collect();
    serde_json::to_string_pretty(&keyed).context("Failed to serialize export")
}

/// Parse the export shape back into per-house records. Entries with
/// unrecognized keys or malformed bodies are skipped with a warning so
/// one bad entry never blocks the rest.
fn parse_import(content: &str) -> Result<BTreeMap<usize, TimerRecord>> {
    let raw: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(content).context("Import file is not a JSON object")?;

    let mut records = BTreeMap::new();
    for (key, value) in raw {
        let index = match parse_record_key(&key) {
            Some(index) => index,
            None => {
                warn!(key = %key, "unrecognized key in import, skipping");
                continue;
            }
        };
        match serde_json::from_value::<TimerRecord>(value) {
            Ok(record) => {
                records.insert(index, record);
            }
            Err(err) => warn!(key = %key, %err, "malformed record in import, skipping"),
        }
    }
    Ok(records)
}

fn cmd_export(args: &Args, output: Option<PathBuf>) -> Result<()> {
    let service = Service::new(args)?;
    let now = service.clock.now_ms().context("System clock unavailable")?;

    let json = render_export(&service.engine.export_all(now))?;
    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "wardend-export-{}.json",
            Local::now().format("%Y%m%d_%H%M%S")
        ))
    });
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write export to {:?}", path))?;

    info!(path = %path.display(), "Export written");
    println!("{}", path.display());
    Ok(())
}

fn cmd_import(args: &Args, input: &Path) -> Result<()> {
    let mut service = Service::new(args)?;
    let now = service.clock.now_ms().context("System clock unavailable")?;

    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read import file {:?}", input))?;
    let records = parse_import(&content)?;
    let applied = service.engine.import_all(&records, now)?;

    info!(applied, "Import applied");
    println!("{} timers imported", applied);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "wardend starting");

    match &args.command {
        None | Some(Command::Run) => {
            let service = Service::new(&args)?;
            service.run().await
        }
        Some(Command::Export { output }) => cmd_export(&args, output.clone()),
        Some(Command::Import { input }) => {
            let input = input.clone();
            cmd_import(&args, &input)
        }
    }
}
