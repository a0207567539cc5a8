//! Event protocol between the simulation and its observers
//!
//! Every message on the wire is an envelope `{"event": <name>, "data": <payload>}`.
//! Outbound messages push process readings; inbound messages are control
//! events, fire-and-forget, plus a status query.
//!
//! Inbound decoding is lenient: a payload field that is missing or has the
//! wrong type is treated as absent, never as a fatal error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::error::{Result, SimError};
use crate::process::{FlowReading, PressureReading, TemperatureReading};

/// Wire names for every event
pub mod names {
    pub const TEMPERATURE_UPDATE: &str = "temperature.update";
    pub const PRESSURE_UPDATE: &str = "pressure.update";
    pub const FLOW_UPDATE: &str = "flow.update";
    pub const TEMPERATURE_CONTROL: &str = "temperature.control";
    pub const PRESSURE_RELEASE: &str = "pressure.release";
    pub const FLOW_VALVE_ADJUST: &str = "flow.valveAdjust";
    pub const SIMULATION_TOGGLE: &str = "simulation.toggle";
    pub const SIMULATION_RESET: &str = "simulation.reset";
    pub const SYSTEM_STATUS: &str = "system.status";
}

/// Liveness of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Online,
}

/// Answer to a status query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: ServiceStatus,
}

impl StatusReport {
    pub fn online() -> Self {
        Self {
            status: ServiceStatus::Online,
        }
    }
}

/// Server -> observer messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "temperature.update")]
    Temperature(TemperatureReading),
    #[serde(rename = "pressure.update")]
    Pressure(PressureReading),
    #[serde(rename = "flow.update")]
    Flow(FlowReading),
    #[serde(rename = "system.status")]
    Status(StatusReport),
}

impl ServerMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Temperature(_) => names::TEMPERATURE_UPDATE,
            Self::Pressure(_) => names::PRESSURE_UPDATE,
            Self::Flow(_) => names::FLOW_UPDATE,
            Self::Status(_) => names::SYSTEM_STATUS,
        }
    }

    /// Serialize as one line of the wire protocol (no trailing newline)
    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Partial temperature control; each present field applies independently
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureControl {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub warning_threshold: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub critical_threshold: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub cooling: Option<bool>,
}

/// Drop a field whose value does not fit the expected type
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Observer -> server control actions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    Temperature(TemperatureControl),
    PressureRelease,
    ValveAdjust(f64),
    /// `true` pauses the clock, `false` resumes it
    SetPaused(bool),
    Reset,
}

impl ControlEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Temperature(_) => names::TEMPERATURE_CONTROL,
            Self::PressureRelease => names::PRESSURE_RELEASE,
            Self::ValveAdjust(_) => names::FLOW_VALVE_ADJUST,
            Self::SetPaused(_) => names::SIMULATION_TOGGLE,
            Self::Reset => names::SIMULATION_RESET,
        }
    }

    /// Encode as a wire envelope, the inverse of [`InboundMessage::parse`]
    pub fn to_line(&self) -> Result<String> {
        let data = match self {
            Self::Temperature(control) => serde_json::to_value(control)?,
            Self::ValveAdjust(position) => Value::from(*position),
            Self::SetPaused(paused) => Value::Bool(*paused),
            Self::PressureRelease | Self::Reset => Value::Null,
        };
        Ok(serde_json::to_string(&Envelope {
            event: self.event_name().to_string(),
            data,
        })?)
    }
}

/// Anything an observer may send
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InboundMessage {
    Control(ControlEvent),
    StatusQuery,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

impl InboundMessage {
    /// Parse one line of the wire protocol.
    ///
    /// Returns `Ok(None)` when the event is known but its payload carries
    /// nothing to apply (e.g. a non-numeric valve position).
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let envelope: Envelope = serde_json::from_str(line)?;
        Self::decode(&envelope.event, envelope.data)
    }

    pub fn decode(event: &str, data: Value) -> Result<Option<Self>> {
        let control = match event {
            names::TEMPERATURE_CONTROL => {
                // Arrays would otherwise bind to fields by position
                let control: TemperatureControl = if data.is_object() {
                    serde_json::from_value(data).unwrap_or_default()
                } else {
                    TemperatureControl::default()
                };
                Some(ControlEvent::Temperature(control))
            }
            names::PRESSURE_RELEASE => Some(ControlEvent::PressureRelease),
            names::FLOW_VALVE_ADJUST => data.as_f64().map(ControlEvent::ValveAdjust),
            names::SIMULATION_TOGGLE => data.as_bool().map(ControlEvent::SetPaused),
            names::SIMULATION_RESET => Some(ControlEvent::Reset),
            names::SYSTEM_STATUS => return Ok(Some(Self::StatusQuery)),
            other => return Err(SimError::UnknownEvent(other.to_string())),
        };
        Ok(control.map(Self::Control))
    }
}
