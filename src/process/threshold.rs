//! Three-level severity derived from a value and two thresholds

use serde::{Deserialize, Serialize};

/// Severity of a process value relative to its thresholds
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdStatus {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl ThresholdStatus {
    /// Classify `value` against a warning and a critical threshold.
    ///
    /// Equality favors the more severe state. The thresholds are compared
    /// as given; an inverted pair (warning above critical) is not corrected.
    pub fn evaluate(value: f64, warning: f64, critical: f64) -> Self {
        if value >= critical {
            Self::Critical
        } else if value >= warning {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}
