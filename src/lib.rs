//! Refinery Sim - live industrial process simulator
//!
//! Simulates temperature, pressure and flow as bounded random walks, advances
//! them on a fixed clock and streams their readings to every connected
//! observer. Observers can send control events that perturb the simulation.

pub mod core;
pub mod process;
pub mod simulation;
pub mod transport;
