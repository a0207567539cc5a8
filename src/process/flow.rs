//! Flow process
//!
//! The flow rate lags toward a target set by the valve position (first-order
//! response), with random perturbation on top. Efficiency is a display
//! metric derived from the valve position at read time, not simulation state.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::jitter;
use crate::core::config::FlowSettings;
use crate::core::types::{round_display, Timestamp};

pub const FLOW_MIN: f64 = 0.0;
pub const FLOW_MAX: f64 = 100.0;

/// Snapshot of the flow process
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowReading {
    pub timestamp: Timestamp,
    pub rate: f64,
    pub valve_position: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone)]
pub struct FlowProcess {
    rate: f64,
    valve_position: f64,
    settings: FlowSettings,
}

impl FlowProcess {
    pub fn new(settings: FlowSettings) -> Self {
        Self {
            rate: settings.initial_rate.clamp(FLOW_MIN, FLOW_MAX),
            valve_position: settings.initial_valve.clamp(FLOW_MIN, FLOW_MAX),
            settings,
        }
    }

    /// Store a new valve set-point; the rate follows on later ticks
    pub fn adjust_valve(&mut self, position: f64) {
        self.valve_position = position.clamp(FLOW_MIN, FLOW_MAX);
    }

    /// Rate the valve drives toward
    pub fn target_rate(&self) -> f64 {
        self.valve_position * self.settings.max_throughput
    }

    /// Advance one tick
    pub fn update<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let adjustment = (self.target_rate() - self.rate) * self.settings.response;
        self.rate += jitter(rng, self.settings.fluctuation) + adjustment;
        self.rate = self.rate.clamp(FLOW_MIN, FLOW_MAX);
    }

    /// Efficiency for the current valve position, re-drawn on every call
    pub fn efficiency<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let distance = (self.valve_position - self.settings.optimal_valve).abs();
        let base = FLOW_MAX - distance * self.settings.efficiency_falloff;
        (base + jitter(rng, self.settings.efficiency_jitter)).clamp(FLOW_MIN, FLOW_MAX)
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn valve_position(&self) -> f64 {
        self.valve_position
    }

    pub fn snapshot<R: Rng + ?Sized>(&self, rng: &mut R, timestamp: Timestamp) -> FlowReading {
        FlowReading {
            timestamp,
            rate: round_display(self.rate),
            valve_position: round_display(self.valve_position),
            efficiency: round_display(self.efficiency(rng)),
        }
    }
}

impl Default for FlowProcess {
    fn default() -> Self {
        Self::new(FlowSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::{highest, lowest, neutral};

    fn process_at(rate: f64, valve: f64) -> FlowProcess {
        FlowProcess::new(FlowSettings {
            initial_rate: rate,
            initial_valve: valve,
            ..FlowSettings::default()
        })
    }

    #[test]
    fn test_initial_snapshot() {
        let reading = FlowProcess::default().snapshot(&mut neutral(), 123_456_789);
        assert_eq!(reading.rate, 40.0);
        assert_eq!(reading.valve_position, 50.0);
        assert_eq!(reading.efficiency, 100.0);
        assert_eq!(reading.timestamp, 123_456_789);
    }

    #[test]
    fn test_adjust_valve_clamps() {
        let mut process = FlowProcess::default();
        process.adjust_valve(75.0);
        assert_eq!(process.valve_position(), 75.0);
        process.adjust_valve(150.0);
        assert_eq!(process.valve_position(), 100.0);
        process.adjust_valve(-10.0);
        assert_eq!(process.valve_position(), 0.0);
    }

    #[test]
    fn test_adjust_valve_leaves_rate() {
        let mut process = FlowProcess::default();
        process.adjust_valve(90.0);
        assert_eq!(process.rate(), 40.0);
    }

    #[test]
    fn test_rate_lags_toward_target() {
        let mut process = process_at(20.0, 80.0);
        let mut previous = process.rate();
        for _ in 0..30 {
            process.update(&mut neutral());
            assert!(process.rate() > previous);
            assert!(process.rate() <= 80.0 * 0.9);
            previous = process.rate();
        }
    }

    #[test]
    fn test_first_order_step() {
        let mut process = process_at(20.0, 80.0);
        process.update(&mut neutral());
        // 20% of the 52-point gap to 72
        assert!((process.rate() - 30.4).abs() < 1e-9);
    }

    #[test]
    fn test_efficiency_peaks_at_optimum() {
        let optimal = process_at(40.0, 50.0).efficiency(&mut neutral());
        let closed = process_at(40.0, 0.0).efficiency(&mut neutral());
        let quarter = process_at(40.0, 25.0).efficiency(&mut neutral());

        assert_eq!(optimal, 100.0);
        assert_eq!(closed, 75.0);
        assert!(optimal > quarter);
        assert!(quarter > closed);
    }

    #[test]
    fn test_efficiency_redrawn_each_read() {
        use rand::rngs::mock::StepRng;

        // Draws 0.0 then 0.25
        let mut rng = StepRng::new(0, 1 << 62);
        let process = FlowProcess::default();
        let first = process.snapshot(&mut rng, 1);
        let second = process.snapshot(&mut rng, 1);

        assert_eq!(first.efficiency, 97.5);
        assert_eq!(second.efficiency, 98.8);
        assert_eq!(first.rate, second.rate);
        assert_eq!(first.valve_position, second.valve_position);
    }

    #[test]
    fn test_efficiency_clamped() {
        assert!(process_at(40.0, 50.0).efficiency(&mut highest()) <= 100.0);
        let low = FlowProcess::new(FlowSettings {
            initial_valve: 0.0,
            efficiency_falloff: 3.0,
            ..FlowSettings::default()
        });
        assert_eq!(low.efficiency(&mut lowest()), 0.0);
    }

    #[test]
    fn test_rate_bounded_under_extremes() {
        let mut process = process_at(1.0, 0.0);
        for _ in 0..20 {
            process.update(&mut lowest());
            assert!(process.rate() >= 0.0);
        }

        let mut process = process_at(99.0, 100.0);
        for _ in 0..20 {
            process.update(&mut highest());
            assert!(process.rate() <= 100.0);
        }
    }

    #[test]
    fn test_reading_serializes_camel_case() {
        let json = serde_json::to_value(FlowProcess::default().snapshot(&mut neutral(), 1)).unwrap();
        assert_eq!(json["valvePosition"], 50.0);
        assert_eq!(json["rate"], 40.0);
    }
}
