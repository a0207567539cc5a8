//! Simulator configuration with documented constants
//!
//! All tuning numbers are collected here with explanations of their purpose
//! and how they interact with each other. Every section defaults to the
//! documented process defaults, so an empty TOML file is a valid config.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::error::{Result, SimError};

/// Longest accepted tick period, one day
pub const MAX_TICK_MS: u64 = 86_400_000;

/// Largest per-observer buffer, in messages
pub const MAX_BROADCAST_CAPACITY: usize = 65_536;

/// Upper bound for `server.max_line_bytes`
pub const MAX_LINE_BYTES: usize = 1 << 20;

/// Top-level configuration, one section per concern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub simulation: ClockSettings,
    pub temperature: TemperatureSettings,
    pub pressure: PressureSettings,
    pub flow: FlowSettings,
    pub server: ServerSettings,
}

/// Settings for the tick loop and observer fan-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSettings {
    /// Period between ticks in milliseconds
    pub tick_ms: u64,

    /// Seed for the simulation RNG
    ///
    /// When absent the RNG is seeded from OS entropy, so two runs diverge.
    pub seed: Option<u64>,

    /// Messages buffered per observer before it starts lagging
    ///
    /// Each tick publishes three messages, so the default of 64 lets an
    /// observer fall about 20 ticks behind before it loses readings.
    pub broadcast_capacity: usize,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            seed: None,
            broadcast_capacity: 64,
        }
    }
}

impl ClockSettings {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Temperature process tuning (degrees Celsius)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureSettings {
    pub initial: f64,
    pub warning_threshold: f64,
    pub critical_threshold: f64,

    /// Width of the uniform perturbation drawn each tick
    ///
    /// The draw lies in [-fluctuation/2, +fluctuation/2].
    pub fluctuation: f64,

    /// Subtracted every tick while the operator cooling switch is on
    pub cooling_offset: f64,

    /// Trend restored once the temperature drops below the warning threshold
    pub warming_trend: f64,

    /// Trend applied once the temperature climbs past the critical threshold
    ///
    /// Between the two thresholds the trend is left alone, which gives the
    /// process a hysteresis band instead of chattering at one boundary.
    pub cooling_trend: f64,

    /// Ambient floor; the temperature never reads below this
    pub ambient_floor: f64,
}

impl Default for TemperatureSettings {
    fn default() -> Self {
        Self {
            initial: 25.0,
            warning_threshold: 35.0,
            critical_threshold: 45.0,
            fluctuation: 0.5,
            cooling_offset: 0.3,
            warming_trend: 0.1,
            cooling_trend: -0.2,
            ambient_floor: 20.0,
        }
    }
}

/// Pressure process tuning (percent of rated range, 0-100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureSettings {
    pub initial: f64,
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub fluctuation: f64,

    /// Default upward drift
    pub rising_trend: f64,

    /// Drift once pressure passes `relief_trigger`
    pub falling_trend: f64,

    /// Above this, the trend snaps to `falling_trend`
    pub relief_trigger: f64,

    /// Below this, the trend resets to `rising_trend`
    ///
    /// Together with `relief_trigger` this produces a slow oscillation that
    /// caps near the top of range without operator action.
    pub recovery_trigger: f64,

    /// Points vented by an emergency release
    pub release_drop: f64,

    /// Trend after a release, a slow resumed climb
    pub release_trend: f64,
}

impl Default for PressureSettings {
    fn default() -> Self {
        Self {
            initial: 50.0,
            warning_threshold: 75.0,
            critical_threshold: 90.0,
            fluctuation: 2.0,
            rising_trend: 0.2,
            falling_trend: -0.1,
            relief_trigger: 95.0,
            recovery_trigger: 20.0,
            release_drop: 30.0,
            release_trend: 0.05,
        }
    }
}

/// Flow process tuning (percent, 0-100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    pub initial_rate: f64,
    pub initial_valve: f64,
    pub fluctuation: f64,

    /// Fraction of the valve position reachable as flow rate
    pub max_throughput: f64,

    /// Fraction of the remaining distance to target covered per tick
    ///
    /// At 0.2 the rate closes ~89% of a step change in 10 ticks.
    pub response: f64,

    /// Valve position with peak efficiency
    pub optimal_valve: f64,

    /// Efficiency points lost per point of valve distance from optimum
    pub efficiency_falloff: f64,

    /// Width of the random jitter added to every efficiency read
    pub efficiency_jitter: f64,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            initial_rate: 40.0,
            initial_valve: 50.0,
            fluctuation: 1.0,
            max_throughput: 0.9,
            response: 0.2,
            optimal_valve: 50.0,
            efficiency_falloff: 0.5,
            efficiency_jitter: 5.0,
        }
    }
}

/// Event socket settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,

    /// Inbound lines longer than this are dropped unread
    ///
    /// Control events are well under 200 bytes; the cap only bounds what a
    /// misbehaving client can make the server buffer.
    pub max_line_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3001".into(),
            max_line_bytes: 8192,
        }
    }
}

impl SimulatorConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate().map_err(SimError::InvalidConfig)?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(1..=MAX_TICK_MS).contains(&self.simulation.tick_ms) {
            return Err(format!(
                "simulation.tick_ms ({}) must lie in [1, {}]",
                self.simulation.tick_ms, MAX_TICK_MS
            ));
        }

        if !(1..=MAX_BROADCAST_CAPACITY).contains(&self.simulation.broadcast_capacity) {
            return Err(format!(
                "simulation.broadcast_capacity ({}) must lie in [1, {}]",
                self.simulation.broadcast_capacity, MAX_BROADCAST_CAPACITY
            ));
        }

        if !(1..=MAX_LINE_BYTES).contains(&self.server.max_line_bytes) {
            return Err(format!(
                "server.max_line_bytes ({}) must lie in [1, {}]",
                self.server.max_line_bytes, MAX_LINE_BYTES
            ));
        }

        let fluctuations = [
            ("temperature.fluctuation", self.temperature.fluctuation),
            ("pressure.fluctuation", self.pressure.fluctuation),
            ("flow.fluctuation", self.flow.fluctuation),
            ("flow.efficiency_jitter", self.flow.efficiency_jitter),
        ];
        for (name, value) in fluctuations {
            if value < 0.0 {
                return Err(format!("{} ({}) must not be negative", name, value));
            }
        }

        // Thresholds should be ordered
        if self.temperature.warning_threshold > self.temperature.critical_threshold {
            return Err(format!(
                "temperature.warning_threshold ({}) should be <= critical_threshold ({})",
                self.temperature.warning_threshold, self.temperature.critical_threshold
            ));
        }
        if self.pressure.warning_threshold > self.pressure.critical_threshold {
            return Err(format!(
                "pressure.warning_threshold ({}) should be <= critical_threshold ({})",
                self.pressure.warning_threshold, self.pressure.critical_threshold
            ));
        }

        if self.temperature.initial < self.temperature.ambient_floor {
            return Err(format!(
                "temperature.initial ({}) is below ambient_floor ({})",
                self.temperature.initial, self.temperature.ambient_floor
            ));
        }

        if !(0.0..=1.0).contains(&self.flow.response) {
            return Err(format!("flow.response ({}) must lie in [0, 1]", self.flow.response));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = SimulatorConfig::default();
        assert_eq!(config.simulation.tick_ms, 1000);
        assert_eq!(config.temperature.initial, 25.0);
        assert_eq!(config.temperature.warning_threshold, 35.0);
        assert_eq!(config.temperature.critical_threshold, 45.0);
        assert_eq!(config.pressure.initial, 50.0);
        assert_eq!(config.pressure.warning_threshold, 75.0);
        assert_eq!(config.pressure.critical_threshold, 90.0);
        assert_eq!(config.flow.initial_rate, 40.0);
        assert_eq!(config.flow.initial_valve, 50.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = SimulatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimulatorConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let config = SimulatorConfig::from_toml_str(
            r#"
            [simulation]
            tick_ms = 250
            seed = 7

            [pressure]
            release_drop = 40.0
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.tick_ms, 250);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.pressure.release_drop, 40.0);
        assert_eq!(config.pressure.initial, 50.0);
        assert_eq!(config.temperature, TemperatureSettings::default());
    }

    #[test]
    fn test_rejects_zero_tick() {
        let err = SimulatorConfig::from_toml_str("[simulation]\ntick_ms = 0\n").unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_oversized_clock_settings() {
        let mut config = SimulatorConfig::default();
        config.simulation.tick_ms = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.simulation.tick_ms = MAX_TICK_MS;
        assert!(config.validate().is_ok());

        let mut config = SimulatorConfig::default();
        config.simulation.broadcast_capacity = usize::MAX;
        assert!(config.validate().is_err());

        let mut config = SimulatorConfig::default();
        config.server.max_line_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_default_thresholds() {
        let mut config = SimulatorConfig::default();
        config.pressure.warning_threshold = 95.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_fluctuation() {
        let mut config = SimulatorConfig::default();
        config.flow.fluctuation = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = SimulatorConfig::from_toml_str(include_str!("../../config/refinery.toml")).unwrap();
        assert_eq!(config, SimulatorConfig::default());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = SimulatorConfig::from_toml_str("[simulation\n").unwrap_err();
        assert!(matches!(err, SimError::ConfigParse(_)));
    }
}
