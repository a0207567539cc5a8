//! Refinery Sim - Entry Point
//!
//! Loads configuration, starts the simulation clock and serves the event
//! socket until Ctrl-C.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use refinery_sim::core::config::SimulatorConfig;
use refinery_sim::core::error::{Result, SimError};
use refinery_sim::simulation::SimulationEngine;
use refinery_sim::transport::EventServer;

/// Live process simulator serving readings over a JSON event socket
#[derive(Parser, Debug)]
#[command(name = "refinery-sim")]
#[command(about = "Simulate temperature, pressure and flow and stream readings to observers")]
struct Args {
    /// TOML config file (defaults are used for anything it omits)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, overrides server.bind
    #[arg(long)]
    bind: Option<String>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Tick period in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<SimulatorConfig> {
        let mut config = match &self.config {
            Some(path) => SimulatorConfig::load(path)?,
            None => SimulatorConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = Some(seed);
        }
        if let Some(tick_ms) = self.tick_ms {
            config.simulation.tick_ms = tick_ms;
        }

        config.validate().map_err(SimError::InvalidConfig)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("refinery_sim=info")),
        )
        .init();

    let config = Args::parse().into_config()?;
    tracing::info!("Refinery Sim starting...");

    let period = config.simulation.tick_period();
    let server_settings = config.server.clone();
    let (handle, clock) = SimulationEngine::from_config(config).spawn(period);

    let server = EventServer::bind(&server_settings.bind, handle.clone())
        .await?
        .with_max_line_bytes(server_settings.max_line_bytes);
    let server_task = tokio::spawn(server.serve());

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            }
        }
        _ = handle.stopped() => {}
    }

    handle.stop();
    if let Err(e) = clock.await {
        tracing::warn!(error = %e, "Simulation task ended abnormally");
    }
    match server_task.await {
        Ok(result) => result?,
        Err(e) => tracing::warn!(error = %e, "Server task ended abnormally"),
    }

    tracing::info!("Refinery Sim stopped");
    Ok(())
}
