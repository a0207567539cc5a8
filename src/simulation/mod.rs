//! Simulation clock, control channel and shared process state

pub mod engine;
pub mod events;
pub mod state;

pub use engine::{RunState, SimulationEngine, SimulationHandle};
pub use events::{ControlEvent, InboundMessage, ServerMessage, StatusReport, TemperatureControl};
pub use state::{ProcessReadings, SimulationState};
