//! Process models
//!
//! Three independent bounded random walks: temperature, pressure and flow.
//! Each model takes its random source as a parameter so tests can pin the
//! perturbation instead of waiting on real randomness.

pub mod flow;
pub mod pressure;
pub mod temperature;
pub mod threshold;

pub use flow::{FlowProcess, FlowReading};
pub use pressure::{PressureProcess, PressureReading};
pub use temperature::{TemperatureProcess, TemperatureReading};
pub use threshold::ThresholdStatus;

use rand::Rng;

/// Uniform draw in [-magnitude/2, +magnitude/2]
///
/// A unit draw of exactly 0.5 yields no perturbation.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, magnitude: f64) -> f64 {
    (rng.gen::<f64>() - 0.5) * magnitude
}
