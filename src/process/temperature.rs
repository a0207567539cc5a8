//! Temperature process
//!
//! A random walk with a warming/cooling trend and an operator cooling
//! switch. The temperature never drops below the ambient floor.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::jitter;
use super::threshold::ThresholdStatus;
use crate::core::config::TemperatureSettings;
use crate::core::types::{round_display, Timestamp};

/// Snapshot of the temperature process
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureReading {
    pub timestamp: Timestamp,
    pub value: f64,
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub status: ThresholdStatus,
}

#[derive(Debug, Clone)]
pub struct TemperatureProcess {
    temperature: f64,
    warning_threshold: f64,
    critical_threshold: f64,
    cooling_enabled: bool,
    trend: f64,
    settings: TemperatureSettings,
}

impl TemperatureProcess {
    pub fn new(settings: TemperatureSettings) -> Self {
        Self {
            temperature: settings.initial.max(settings.ambient_floor),
            warning_threshold: settings.warning_threshold,
            critical_threshold: settings.critical_threshold,
            cooling_enabled: false,
            trend: settings.warming_trend,
            settings,
        }
    }

    /// Advance one tick
    pub fn update<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let cooling = if self.cooling_enabled {
            self.settings.cooling_offset
        } else {
            0.0
        };

        self.temperature += jitter(rng, self.settings.fluctuation) + self.trend - cooling;
        self.temperature = self.temperature.max(self.settings.ambient_floor);

        if self.temperature > self.critical_threshold {
            self.trend = self.settings.cooling_trend;
        } else if self.temperature < self.warning_threshold {
            self.trend = self.settings.warming_trend;
        }
    }

    pub fn set_warning_threshold(&mut self, threshold: f64) {
        self.warning_threshold = threshold;
    }

    pub fn set_critical_threshold(&mut self, threshold: f64) {
        self.critical_threshold = threshold;
    }

    pub fn set_cooling(&mut self, enabled: bool) {
        self.cooling_enabled = enabled;
    }

    pub fn value(&self) -> f64 {
        self.temperature
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    pub fn cooling_enabled(&self) -> bool {
        self.cooling_enabled
    }

    pub fn status(&self) -> ThresholdStatus {
        ThresholdStatus::evaluate(self.temperature, self.warning_threshold, self.critical_threshold)
    }

    pub fn snapshot(&self, timestamp: Timestamp) -> TemperatureReading {
        TemperatureReading {
            timestamp,
            value: round_display(self.temperature),
            warning_threshold: round_display(self.warning_threshold),
            critical_threshold: round_display(self.critical_threshold),
            status: self.status(),
        }
    }
}

impl Default for TemperatureProcess {
    fn default() -> Self {
        Self::new(TemperatureSettings::default())
    }
}
