//! Command router — parses inbound command topics/payloads into hub
//! device commands.
//!
//! Parsing is total: anything malformed yields a typed error that the
//! engine logs and drops. No command error ever crosses the router
//! boundary as a panic or a state mutation.

use hasslink_domain::command::DeviceCommand;
use hasslink_domain::device::HubDevice;

use crate::classifier::EntityKind;
use crate::payload::hub_mode;
use crate::topics::TopicScheme;

/// Why an inbound command was dropped.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The topic does not match `{prefix}/{kind}/{hub}/{id}/set[/sub]`.
    #[error("topic {topic:?} is not a command topic")]
    UnrecognizedTopic { topic: String },

    /// The device-id segment is not an integer.
    #[error("invalid device id {segment:?}")]
    InvalidDeviceId { segment: String },

    /// The payload is not valid UTF-8 or JSON where JSON is required.
    #[error("malformed payload for {kind} command")]
    MalformedPayload { kind: EntityKind },

    /// Commands do not apply to this entity kind.
    #[error("kind {kind} does not accept commands")]
    UnsupportedKind { kind: EntityKind },

    /// A thermostat mode change without a stored setpoint for that mode.
    #[error("no setpoint stored for mode {mode:?}")]
    NoSetpointForMode { mode: String },
}

/// A parsed command topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTopic {
    /// Target hub device.
    pub device_id: u32,
    /// Sub-command segment after `set` (`mode`, `setpoint`, `pos`).
    pub sub: Option<String>,
}

/// Parse a command topic against the configured scheme.
///
/// # Errors
///
/// Returns [`CommandError`] when the topic shape, prefix, hub segment, or
/// device-id segment does not match.
pub fn parse_topic(scheme: &TopicScheme, topic: &str) -> Result<CommandTopic, CommandError> {
    let unrecognized = || CommandError::UnrecognizedTopic {
        topic: topic.to_string(),
    };

    let segments: Vec<&str> = topic.split('/').collect();
    if segments.len() < 5 || segments.len() > 6 {
        return Err(unrecognized());
    }
    if segments[0] != scheme.discovery_prefix
        || segments[2] != scheme.hub_name
        || segments[4] != "set"
    {
        return Err(unrecognized());
    }

    let device_id = segments[3]
        .parse()
        .map_err(|_| CommandError::InvalidDeviceId {
            segment: segments[3].to_string(),
        })?;

    Ok(CommandTopic {
        device_id,
        sub: segments.get(5).map(|s| (*s).to_string()),
    })
}

fn decode_light(payload: &str) -> Result<DeviceCommand, CommandError> {
    let malformed = || CommandError::MalformedPayload {
        kind: EntityKind::Light,
    };
    let json: serde_json::Value = serde_json::from_str(payload).map_err(|_| malformed())?;

    if let Some(brightness) = json.get("brightness") {
        let level = brightness.as_u64().ok_or_else(malformed)?;
        return Ok(if level == 0 {
            // Brightness zero means off, not dim-to-zero.
            DeviceCommand::TurnOff
        } else {
            DeviceCommand::Dim {
                level: u8::try_from(level.min(255)).unwrap_or(255),
            }
        });
    }

    // No explicit brightness: plain on/off, the hub applies full level.
    match json.get("state").and_then(serde_json::Value::as_str) {
        Some("ON") => Ok(DeviceCommand::TurnOn),
        Some(_) => Ok(DeviceCommand::TurnOff),
        None => Err(malformed()),
    }
}

fn decode_switch(payload: &str) -> DeviceCommand {
    match payload {
        "ON" => DeviceCommand::TurnOn,
        "BELL" => DeviceCommand::Bell,
        _ => DeviceCommand::TurnOff,
    }
}

fn decode_cover(payload: &str, sub: Option<&str>) -> Result<DeviceCommand, CommandError> {
    if sub == Some("pos") {
        let level: u8 = payload
            .trim()
            .parse()
            .map_err(|_| CommandError::MalformedPayload {
                kind: EntityKind::Cover,
            })?;
        return Ok(DeviceCommand::Dim { level });
    }
    Ok(match payload {
        "OPEN" => DeviceCommand::Up,
        "CLOSE" => DeviceCommand::Down,
        _ => DeviceCommand::Stop,
    })
}

fn decode_climate(
    payload: &str,
    sub: Option<&str>,
    device: &HubDevice,
) -> Result<DeviceCommand, CommandError> {
    let malformed = || CommandError::MalformedPayload {
        kind: EntityKind::Climate,
    };
    let thermostat = device.thermostat.as_ref().ok_or_else(malformed)?;

    match sub {
        Some("mode") => {
            let mode = hub_mode(payload.trim()).to_string();
            // A mode switch carries the stored setpoint for that mode;
            // without one the hub has nothing to aim for.
            let temperature = thermostat
                .setpoint(&mode)
                .ok_or_else(|| CommandError::NoSetpointForMode { mode: mode.clone() })?;
            Ok(DeviceCommand::SetThermostat {
                mode,
                temperature,
                change_mode: true,
            })
        }
        Some("setpoint") => {
            let temperature: f64 = payload.trim().parse().map_err(|_| malformed())?;
            let mode = thermostat.current_mode().ok_or_else(malformed)?.to_string();
            Ok(DeviceCommand::SetThermostat {
                mode,
                temperature,
                change_mode: false,
            })
        }
        _ => Err(malformed()),
    }
}

/// Decode a command payload for a device of the given kind.
///
/// # Errors
///
/// Returns [`CommandError`] for malformed payloads, command-less kinds,
/// or mode changes without a stored setpoint.
pub fn decode(
    kind: EntityKind,
    sub: Option<&str>,
    payload: &[u8],
    device: &HubDevice,
) -> Result<DeviceCommand, CommandError> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| CommandError::MalformedPayload { kind })?
        .trim();

    match kind {
        EntityKind::Light => decode_light(text),
        EntityKind::Switch => Ok(decode_switch(text)),
        EntityKind::Cover => decode_cover(text, sub),
        EntityKind::Climate => decode_climate(text, sub, device),
        other => Err(CommandError::UnsupportedKind { kind: other }),
    }
}
