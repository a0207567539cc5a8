//! SimulationState - the single shared process aggregate
//!
//! One instance exists per running service. Every observer sees the same
//! three processes; there is no per-client state.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulatorConfig;
use crate::core::types::{now_millis, Timestamp};
use crate::process::{
    FlowProcess, FlowReading, PressureProcess, PressureReading, TemperatureProcess,
    TemperatureReading,
};
use crate::simulation::events::ServerMessage;

/// One reading per process, taken at the same instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessReadings {
    pub temperature: TemperatureReading,
    pub pressure: PressureReading,
    pub flow: FlowReading,
}

impl ProcessReadings {
    /// Outbound messages in publish order
    pub fn into_messages(self) -> [ServerMessage; 3] {
        [
            ServerMessage::Temperature(self.temperature),
            ServerMessage::Pressure(self.pressure),
            ServerMessage::Flow(self.flow),
        ]
    }
}

/// The three process models plus the random source that drives them
pub struct SimulationState<R = ChaCha8Rng> {
    pub temperature: TemperatureProcess,
    pub pressure: PressureProcess,
    pub flow: FlowProcess,
    config: SimulatorConfig,
    rng: R,
}

impl SimulationState<ChaCha8Rng> {
    /// Build from config, seeding from `simulation.seed` or OS entropy
    pub fn from_config(config: SimulatorConfig) -> Self {
        let rng = match config.simulation.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> SimulationState<R> {
    pub fn with_rng(config: SimulatorConfig, rng: R) -> Self {
        Self {
            temperature: TemperatureProcess::new(config.temperature),
            pressure: PressureProcess::new(config.pressure),
            flow: FlowProcess::new(config.flow),
            config,
            rng,
        }
    }

    /// Advance every process by one tick
    pub fn advance(&mut self) {
        self.temperature.update(&mut self.rng);
        self.pressure.update(&mut self.rng);
        self.flow.update(&mut self.rng);
    }

    /// Discard all process state and rebuild it from the configured defaults
    pub fn reset(&mut self) {
        self.temperature = TemperatureProcess::new(self.config.temperature);
        self.pressure = PressureProcess::new(self.config.pressure);
        self.flow = FlowProcess::new(self.config.flow);
    }

    pub fn temperature_reading(&self, timestamp: Timestamp) -> TemperatureReading {
        self.temperature.snapshot(timestamp)
    }

    pub fn pressure_reading(&self, timestamp: Timestamp) -> PressureReading {
        self.pressure.snapshot(timestamp)
    }

    /// Takes `&mut self` because efficiency is re-drawn on every read
    pub fn flow_reading(&mut self, timestamp: Timestamp) -> FlowReading {
        self.flow.snapshot(&mut self.rng, timestamp)
    }

    pub fn readings_at(&mut self, timestamp: Timestamp) -> ProcessReadings {
        ProcessReadings {
            temperature: self.temperature_reading(timestamp),
            pressure: self.pressure_reading(timestamp),
            flow: self.flow_reading(timestamp),
        }
    }

    pub fn readings(&mut self) -> ProcessReadings {
        self.readings_at(now_millis())
    }
}
