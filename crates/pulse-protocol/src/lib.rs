//! NetPulse wire protocol
//!
//! This crate defines the records a capture backend pushes to a NetPulse
//! dashboard and the JSON envelope they travel in:
//!
//! - **PacketRecord**: one observed packet with its precomputed anomaly score
//! - **AggregateSnapshot**: a point-in-time statistics bundle
//! - **Session**: one capture run, created and controlled over HTTP
//!
//! # Wire format
//!
//! Every push-channel frame is a JSON object with a `type` discriminator and a
//! `data` payload:
//!
//! - `{"type":"packet","data":{...}}`
//! - `{"type":"stats","data":{...}}`
//! - `{"type":"session","data":{...}}`
//!
//! Decoding is lenient about optional packet fields (headers, payload, info,
//! anomaly score): malformed values are treated as absent rather than
//! rejecting the frame.
//!
//! # Example
//!
//! ```rust
//! use pulse_protocol::{decode_message, ServerMessage, Severity};
//!
//! let frame = r#"{"type":"packet","data":{
//!     "id": 7, "timestamp": "2024-05-01T12:00:00.250Z",
//!     "sourceIp": "10.0.0.5", "destinationIp": "8.8.8.8",
//!     "protocol": "UDP", "size": 74
//! }}"#;
//!
//! match decode_message(frame).unwrap() {
//!     ServerMessage::Packet(packet) => {
//!         assert_eq!(packet.id.as_str(), "7");
//!         assert_eq!(packet.anomaly_score, 0.0);
//!         assert_eq!(packet.severity(), Severity::Low);
//!     }
//!     other => panic!("unexpected message: {:?}", other),
//! }
//! ```

pub mod display;
pub mod error;
pub mod message;
pub mod models;
pub mod time;

pub use error::ProtocolError;
pub use message::{decode_message, decode_session, encode_message, ServerMessage};
pub use models::{
    AggregateSnapshot, PacketId, PacketRecord, ProtocolCount, Session, SessionId, SessionStatus,
    Severity, SourceCount,
};
