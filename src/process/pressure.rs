//! Pressure process
//!
//! Random walk over [0, 100] with a self-limiting trend: pressure climbs by
//! default, and once it passes the relief trigger the trend reverses until it
//! falls under the recovery trigger. An operator can vent it with an
//! emergency release.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::jitter;
use super::threshold::ThresholdStatus;
use crate::core::config::PressureSettings;
use crate::core::types::{round_display, Timestamp};

pub const PRESSURE_MIN: f64 = 0.0;
pub const PRESSURE_MAX: f64 = 100.0;

/// Snapshot of the pressure process
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressureReading {
    pub timestamp: Timestamp,
    pub value: f64,
    pub status: ThresholdStatus,
}

#[derive(Debug, Clone)]
pub struct PressureProcess {
    pressure: f64,
    warning_threshold: f64,
    critical_threshold: f64,
    trend: f64,
    settings: PressureSettings,
}

impl PressureProcess {
    pub fn new(settings: PressureSettings) -> Self {
        Self {
            pressure: settings.initial.clamp(PRESSURE_MIN, PRESSURE_MAX),
            warning_threshold: settings.warning_threshold,
            critical_threshold: settings.critical_threshold,
            trend: settings.rising_trend,
            settings,
        }
    }

    /// Advance one tick
    pub fn update<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.pressure += jitter(rng, self.settings.fluctuation) + self.trend;
        self.pressure = self.pressure.clamp(PRESSURE_MIN, PRESSURE_MAX);

        if self.pressure > self.settings.relief_trigger {
            self.trend = self.settings.falling_trend;
        } else if self.pressure < self.settings.recovery_trigger {
            self.trend = self.settings.rising_trend;
        }
    }

    /// Vent the vessel: drop by a fixed amount and resume a slow climb
    pub fn emergency_release(&mut self) {
        self.pressure = (self.pressure - self.settings.release_drop).max(PRESSURE_MIN);
        self.trend = self.settings.release_trend;
    }

    pub fn value(&self) -> f64 {
        self.pressure
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    pub fn status(&self) -> ThresholdStatus {
        ThresholdStatus::evaluate(self.pressure, self.warning_threshold, self.critical_threshold)
    }

    pub fn snapshot(&self, timestamp: Timestamp) -> PressureReading {
        PressureReading {
            timestamp,
            value: round_display(self.pressure),
            status: self.status(),
        }
    }
}

impl Default for PressureProcess {
    fn default() -> Self {
        Self::new(PressureSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::{highest, neutral};

    fn process_at(initial: f64) -> PressureProcess {
        PressureProcess::new(PressureSettings {
            initial,
            ..PressureSettings::default()
        })
    }

    #[test]
    fn test_initial_snapshot() {
        let reading = PressureProcess::default().snapshot(123_456_789);
        assert_eq!(reading.value, 50.0);
        assert_eq!(reading.status, ThresholdStatus::Normal);
        assert_eq!(reading.timestamp, 123_456_789);
    }

    #[test]
    fn test_rises_by_default() {
        let mut process = PressureProcess::default();
        let before = process.value();
        for _ in 0..5 {
            process.update(&mut neutral());
        }
        assert!(process.value() > before);
    }

    #[test]
    fn test_status_levels() {
        assert_eq!(process_at(76.0).status(), ThresholdStatus::Warning);
        assert_eq!(process_at(91.0).status(), ThresholdStatus::Critical);
        assert_eq!(process_at(90.0).status(), ThresholdStatus::Critical);
    }

    #[test]
    fn test_emergency_release_drops_thirty() {
        let mut process = process_at(80.0);
        process.emergency_release();
        assert_eq!(process.value(), 50.0);
        assert_eq!(process.snapshot(0).value, 50.0);
        assert_eq!(process.trend(), 0.05);
    }

    #[test]
    fn test_emergency_release_floors_at_zero() {
        let mut process = process_at(5.0);
        process.emergency_release();
        assert_eq!(process.value(), 0.0);
    }

    #[test]
    fn test_never_exceeds_range() {
        let mut process = process_at(99.0);
        for _ in 0..10 {
            process.update(&mut highest());
            assert!(process.value() <= PRESSURE_MAX);
        }
    }

    #[test]
    fn test_self_limits_above_relief_trigger() {
        let mut process = process_at(96.0);
        let initial = process.value();

        let mut history = Vec::new();
        for _ in 0..20 {
            process.update(&mut neutral());
            history.push(process.value());
        }

        assert!(process.value() < initial);
        assert!(history.windows(2).skip(1).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_trend_recovers_below_trigger() {
        let mut process = process_at(21.0);
        process.emergency_release();
        process.update(&mut neutral());
        assert_eq!(process.trend(), 0.2);
    }
}
