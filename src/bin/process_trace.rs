//! Offline process trace
//!
//! Runs the simulation without a clock or transport and prints each tick's
//! readings as JSON lines. Timestamps are synthetic (tick * period) so seeded
//! runs produce identical output.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use refinery_sim::core::config::SimulatorConfig;
use refinery_sim::core::error::Result;
use refinery_sim::simulation::{ProcessReadings, SimulationState};

/// Trace process dynamics tick by tick
#[derive(Parser, Debug)]
#[command(name = "process_trace")]
#[command(about = "Run the process models offline and print readings as JSON lines")]
struct Args {
    /// Number of ticks to simulate
    #[arg(long, default_value_t = 120)]
    ticks: u64,

    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Turn the temperature cooling switch on before the first tick
    #[arg(long)]
    cooling: bool,

    /// Valve position to set before the first tick
    #[arg(long)]
    valve: Option<f64>,

    /// Tick at which to trigger an emergency pressure release
    #[arg(long)]
    release_at: Option<u64>,
}

#[derive(Serialize)]
struct TraceLine {
    tick: u64,
    readings: ProcessReadings,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulatorConfig::load(path)?,
        None => SimulatorConfig::default(),
    };
    config.simulation.seed = Some(args.seed);
    let tick_ms = config.simulation.tick_ms as i64;

    let mut state = SimulationState::from_config(config);
    state.temperature.set_cooling(args.cooling);
    if let Some(valve) = args.valve {
        state.flow.adjust_valve(valve);
    }

    for tick in 0..=args.ticks {
        if tick > 0 {
            state.advance();
        }
        if args.release_at == Some(tick) {
            state.pressure.emergency_release();
        }

        let line = TraceLine {
            tick,
            readings: state.readings_at(tick as i64 * tick_ms),
        };
        println!("{}", serde_json::to_string(&line)?);
    }

    Ok(())
}
