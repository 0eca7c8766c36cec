//! Push-channel message envelope
//!
//! Frames are decoded field by field rather than through a derived
//! `Deserialize` so that optional packet fields can be lenient: a header
//! block that is not an object, a payload that is not a string, or a score
//! that is not a number is treated as absent instead of failing the frame.

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ProtocolError;
use crate::models::{clamp_score, AggregateSnapshot, PacketId, PacketRecord, Session, SessionId};
use crate::time::parse_timestamp;

const PACKET: &str = "packet";
const SESSION: &str = "session";

/// A decoded server-to-client message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ServerMessage {
    /// A packet observation
    Packet(PacketRecord),
    /// A statistics snapshot
    Stats(AggregateSnapshot),
    /// A session snapshot
    Session(Session),
}

impl ServerMessage {
    /// Wire name of this message's kind
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Packet(_) => "packet",
            ServerMessage::Stats(_) => "stats",
            ServerMessage::Session(_) => "session",
        }
    }
}

/// Decode one push-channel frame
pub fn decode_message(text: &str) -> Result<ServerMessage, ProtocolError> {
    let mut envelope: Map<String, Value> = serde_json::from_str(text)?;

    let kind = match envelope.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        _ => return Err(ProtocolError::MissingKind),
    };
    let data = envelope.remove("data").unwrap_or(Value::Null);

    match kind.as_str() {
        "packet" => packet_from_value(data).map(ServerMessage::Packet),
        "stats" => Ok(ServerMessage::Stats(serde_json::from_value(data)?)),
        "session" => session_from_value(data).map(ServerMessage::Session),
        _ => Err(ProtocolError::UnknownKind(kind)),
    }
}

/// Decode a session body returned by the session-control API
pub fn decode_session(text: &str) -> Result<Session, ProtocolError> {
    session_from_value(serde_json::from_str(text)?)
}

/// Encode a message into its wire form
pub fn encode_message(message: &ServerMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

fn into_object(kind: &'static str, value: Value) -> Result<Map<String, Value>, ProtocolError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ProtocolError::NotAnObject { kind }),
    }
}

/// Identifiers are opaque: strings pass through, numbers are stringified
fn required_id(
    map: &Map<String, Value>,
    kind: &'static str,
    field: &'static str,
) -> Result<String, ProtocolError> {
    match map.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        None | Some(Value::Null) => Err(ProtocolError::MissingField { kind, field }),
        Some(other) => Err(ProtocolError::InvalidField {
            kind,
            field,
            reason: format!("expected string or number, got {}", other),
        }),
    }
}

fn required_str(
    map: &Map<String, Value>,
    kind: &'static str,
    field: &'static str,
) -> Result<String, ProtocolError> {
    match map.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        None | Some(Value::Null) => Err(ProtocolError::MissingField { kind, field }),
        Some(other) => Err(ProtocolError::InvalidField {
            kind,
            field,
            reason: format!("expected string, got {}", other),
        }),
    }
}

fn optional_str(map: &Map<String, Value>, field: &str) -> Option<String> {
    map.get(field).and_then(Value::as_str).map(str::to_string)
}

fn packet_from_value(value: Value) -> Result<PacketRecord, ProtocolError> {
    let map = into_object(PACKET, value)?;

    let id = required_id(&map, PACKET, "id")?;
    let source_ip = required_str(&map, PACKET, "sourceIp")?;
    let destination_ip = required_str(&map, PACKET, "destinationIp")?;
    let protocol = required_str(&map, PACKET, "protocol")?;

    let size = match map.get("size") {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .ok_or_else(|| ProtocolError::InvalidField {
                kind: PACKET,
                field: "size",
                reason: format!("{} is not a byte count", n),
            })?,
        None | Some(Value::Null) => {
            return Err(ProtocolError::MissingField {
                kind: PACKET,
                field: "size",
            })
        }
        Some(other) => {
            return Err(ProtocolError::InvalidField {
                kind: PACKET,
                field: "size",
                reason: format!("expected number, got {}", other),
            })
        }
    };

    let timestamp = match map.get("timestamp").and_then(parse_timestamp) {
        Some(ts) => ts,
        None => {
            debug!("Packet {} has no usable timestamp, using arrival time", id);
            Utc::now()
        }
    };

    let headers = match map.get("headers") {
        Some(Value::Object(fields)) => Some(
            fields
                .iter()
                .map(|(key, value)| {
                    let text = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key.clone(), text)
                })
                .collect(),
        ),
        _ => None,
    };

    let anomaly_score = map
        .get("anomalyScore")
        .and_then(Value::as_f64)
        .map(clamp_score)
        .unwrap_or(0.0);

    Ok(PacketRecord {
        id: PacketId::new(id),
        timestamp,
        source_ip,
        destination_ip,
        protocol,
        size,
        info: optional_str(&map, "info").filter(|s| !s.is_empty()),
        headers,
        payload: optional_str(&map, "payload").filter(|s| !s.is_empty()),
        anomaly_score,
    })
}

fn session_from_value(value: Value) -> Result<Session, ProtocolError> {
    let map = into_object(SESSION, value)?;

    Ok(Session {
        id: SessionId::new(required_id(&map, SESSION, "id")?),
        name: optional_str(&map, "name").unwrap_or_default(),
        start_time: map.get("startTime").and_then(parse_timestamp),
        end_time: map.get("endTime").and_then(parse_timestamp),
    })
}
