//! Arcade vehicle driver
//!
//! Spawns one car on a flat rapier ground plane and drives it with a scripted
//! intent at a fixed tick rate.
//!
//! # Usage
//!
//! ```bash
//! # 10 s of full throttle with the default hatchback, as fast as possible
//! arcade-drive --ticks 600
//!
//! # real-time 60 Hz, gentle right turn, handbrake from tick 240, telemetry
//! arcade-drive --realtime --steer 0.3 --handbrake-at 240 --telemetry run.jsonl
//!
//! # custom tuning file
//! arcade-drive --config my_car.json --log-level debug
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use arcade_drive::drive_core::{DriverIntent, VehicleTuning};
use arcade_drive::physics::PhysicsWorld;

const VEHICLE_ID: &str = "car";

#[derive(Parser, Debug)]
#[command(name = "arcade-drive")]
#[command(author, version, about = "Fixed-step arcade vehicle simulation", long_about = None)]
struct Cli {
    /// Tuning JSON file (overrides --preset)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in tuning: hatchback or rally
    #[arg(short, long, default_value = "hatchback")]
    preset: String,

    /// Number of ticks to simulate
    #[arg(short, long, default_value = "600")]
    ticks: u64,

    /// Fixed tick rate (Hz), 1..=1000
    #[arg(long, default_value = "60", value_parser = parse_hz)]
    hz: f32,

    /// Throttle axis, -1..1
    #[arg(long, default_value = "1.0", allow_hyphen_values = true)]
    throttle: f32,

    /// Steering axis, -1..1 (positive = right)
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    steer: f32,

    /// Hold the handbrake from this tick on
    #[arg(long)]
    handbrake_at: Option<u64>,

    /// Pace ticks against the wall clock
    #[arg(long)]
    realtime: bool,

    /// Logging verbosity (RUST_LOG takes precedence)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write one JSON snapshot per tick to this file
    #[arg(long)]
    telemetry: Option<PathBuf>,
}

const MAX_HZ: f32 = 1000.0;

fn parse_hz(s: &str) -> Result<f32, String> {
    let hz: f32 = s.parse().map_err(|e| format!("`{s}` is not a number: {e}"))?;
    if !(1.0..=MAX_HZ).contains(&hz) {
        return Err(format!("tick rate must be within 1..={MAX_HZ} Hz, got {hz}"));
    }
    Ok(hz)
}

impl Cli {
    fn tuning(&self) -> anyhow::Result<VehicleTuning> {
        match &self.config {
            Some(path) => VehicleTuning::load(path)
                .with_context(|| format!("loading tuning from {}", path.display())),
            None => match VehicleTuning::preset(&self.preset) {
                Some(t) => Ok(t),
                None => bail!(
                    "unknown preset `{}` (available: {})",
                    self.preset,
                    VehicleTuning::PRESETS.join(", ")
                ),
            },
        }
    }

    fn intent_at(&self, tick: u64) -> DriverIntent {
        DriverIntent {
            throttle: self.throttle,
            steer: self.steer,
            handbrake: self.handbrake_at.is_some_and(|at| tick >= at),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log filter")?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let dt = 1.0 / cli.hz;

    info!("arcade-drive v{}", env!("CARGO_PKG_VERSION"));

    let tuning = cli.tuning()?;
    let mut world = PhysicsWorld::new();
    world.spawn_vehicle(VEHICLE_ID, &tuning, [0.0, 1.2, 0.0]);

    let mut telemetry = match &cli.telemetry {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    // only paced runs wait on the wall clock
    let mut ticker = cli.realtime.then(|| {
        let mut ticker = interval(Duration::from_secs_f32(dt));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    });

    for tick in 0..cli.ticks {
        if let Some(ticker) = ticker.as_mut() {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    warn!(tick, "interrupted");
                    break;
                }
            }
        }

        world.set_intent(VEHICLE_ID, cli.intent_at(tick));
        world.step(dt);

        if let Some(out) = telemetry.as_mut() {
            let line = world.snapshot().to_json_line()?;
            writeln!(out, "{line}")?;
        }

        if tick % cli.hz as u64 == 0 {
            if let Some(report) = world.vehicle(VEHICLE_ID).and_then(|v| v.last_report) {
                info!(
                    tick,
                    speed_kmh = report.speed_ms * 3.6,
                    steer = report.steer_angle_degrees,
                    grounded = report.grounded_wheels,
                    "driving"
                );
            }
        }
    }

    if let Some(mut out) = telemetry {
        out.flush()?;
    }

    if let Some(snapshot) = world.snapshot().vehicles.first() {
        info!(
            position = ?snapshot.position,
            velocity = ?snapshot.velocity,
            ticks = world.tick,
            "finished"
        );
    }

    Ok(())
}
