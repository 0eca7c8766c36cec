//! Packet, session and statistics models
//!
//! These are the normalized forms of what the backend pushes. Wire decoding
//! lives in [`crate::message`]; the `Serialize` impls here produce the same
//! camelCase wire shape so simulators and tests can emit frames.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Scores strictly above this are medium severity
pub const MEDIUM_ANOMALY_THRESHOLD: f64 = 0.5;

/// Scores strictly above this are high severity
pub const HIGH_ANOMALY_THRESHOLD: f64 = 0.7;

/// Clamp an anomaly score into `[0.0, 1.0]`, mapping NaN to 0.0
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Opaque packet identifier assigned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PacketId(String);

impl PacketId {
    /// Wrap an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque session identifier assigned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Severity bucket derived from an anomaly score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Score at or below 0.5
    Low,
    /// Score above 0.5, at or below 0.7
    Medium,
    /// Score above 0.7
    High,
}

impl Severity {
    /// Classify a score
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_ANOMALY_THRESHOLD {
            Severity::High
        } else if score > MEDIUM_ANOMALY_THRESHOLD {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Whether this severity warrants an alert in the detail view
    pub fn is_anomalous(&self) -> bool {
        !matches!(self, Severity::Low)
    }

    /// One-line verdict shown next to the score
    pub fn detection(&self) -> &'static str {
        match self {
            Severity::High => "High threat probability",
            Severity::Medium => "Moderate anomaly detected",
            Severity::Low => "Normal traffic pattern",
        }
    }
}

/// One observed packet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketRecord {
    /// Backend identifier
    pub id: PacketId,
    /// Capture time
    pub timestamp: DateTime<Utc>,
    /// Source address
    pub source_ip: String,
    /// Destination address
    pub destination_ip: String,
    /// Protocol tag as sent by the backend (e.g. "TCP")
    pub protocol: String,
    /// Length in bytes
    pub size: u64,
    /// Short human-readable summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Header fields in wire order
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_headers"
    )]
    pub headers: Option<Vec<(String, String)>>,
    /// Opaque payload text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Precomputed anomaly score in `[0.0, 1.0]`
    pub anomaly_score: f64,
}

fn serialize_headers<S: Serializer>(
    headers: &Option<Vec<(String, String)>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match headers {
        Some(headers) => serializer.collect_map(headers.iter().map(|(k, v)| (k, v))),
        None => serializer.serialize_none(),
    }
}

impl PacketRecord {
    /// Create a record with no optional fields and a zero score
    pub fn new(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        source_ip: impl Into<String>,
        destination_ip: impl Into<String>,
        protocol: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            id: PacketId::new(id),
            timestamp,
            source_ip: source_ip.into(),
            destination_ip: destination_ip.into(),
            protocol: protocol.into(),
            size,
            info: None,
            headers: None,
            payload: None,
            anomaly_score: 0.0,
        }
    }

    /// Set the anomaly score (clamped into range)
    pub fn with_anomaly_score(mut self, score: f64) -> Self {
        self.anomaly_score = clamp_score(score);
        self
    }

    /// Set the info summary
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    /// Set the header fields
    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Set the payload
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Severity bucket of this packet's score
    pub fn severity(&self) -> Severity {
        Severity::from_score(self.anomaly_score)
    }

    /// Lower-case protocol tag for display styling
    pub fn protocol_class(&self) -> String {
        self.protocol.to_lowercase()
    }
}

/// Derived lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Not started, or stopped
    Idle,
    /// Started and not yet stopped
    Capturing,
}

/// One capture session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Backend identifier
    pub id: SessionId,
    /// Display name chosen at creation
    pub name: String,
    /// When capture started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// When capture stopped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a session that has not started
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(id),
            name: name.into(),
            start_time: None,
            end_time: None,
        }
    }

    /// Status derived from the lifecycle timestamps
    pub fn status(&self) -> SessionStatus {
        match (self.start_time, self.end_time) {
            (Some(_), None) => SessionStatus::Capturing,
            _ => SessionStatus::Idle,
        }
    }
}

/// Packet count for one protocol tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolCount {
    /// Protocol tag
    pub protocol: String,
    /// Packets seen
    pub count: u64,
}

/// Packet count for one source address
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SourceCount {
    /// Source address
    pub ip: String,
    /// Packets seen
    pub count: u64,
}

/// Point-in-time statistics pushed by the backend
///
/// Snapshots are never merged: each one replaces the previous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateSnapshot {
    /// Packets seen since the session started
    #[serde(deserialize_with = "deserialize_count")]
    pub total_packets: u64,
    /// Instantaneous rate estimate
    #[serde(deserialize_with = "deserialize_rate")]
    pub packets_per_second: f64,
    /// Packets above the high-anomaly threshold
    #[serde(deserialize_with = "deserialize_count")]
    pub anomalies: u64,
    /// Byte total, already formatted by the backend (e.g. "1.25 MB")
    #[serde(deserialize_with = "deserialize_volume")]
    pub data_volume: String,
    /// Distinct addresses seen
    #[serde(rename = "uniqueIPs", deserialize_with = "deserialize_count")]
    pub unique_ips: u64,
    /// Per-protocol packet counts in wire order
    #[serde(
        serialize_with = "serialize_counts",
        deserialize_with = "deserialize_counts"
    )]
    pub protocol_distribution: Vec<ProtocolCount>,
    /// Most frequent sources, ranked by the backend
    #[serde(deserialize_with = "deserialize_sources")]
    pub top_sources: Vec<SourceCount>,
}

impl Default for AggregateSnapshot {
    fn default() -> Self {
        Self {
            total_packets: 0,
            packets_per_second: 0.0,
            anomalies: 0,
            data_volume: "0 MB".to_string(),
            unique_ips: 0,
            protocol_distribution: Vec::new(),
            top_sources: Vec::new(),
        }
    }
}

fn serialize_counts<S: Serializer>(counts: &[ProtocolCount], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(counts.iter().map(|c| (&c.protocol, c.count)))
}

/// A wire count: a non-negative integer, or a float with no fractional part
fn count_from_value(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}

/// Counter that decodes to 0 when the wire value is unusable
fn deserialize_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(count_from_value(&Value::deserialize(deserializer)?).unwrap_or(0))
}

fn deserialize_rate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Value::deserialize(deserializer)?
        .as_f64()
        .filter(|f| f.is_finite() && *f >= 0.0)
        .unwrap_or(0.0))
}

fn deserialize_volume<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => AggregateSnapshot::default().data_volume,
    })
}

/// Read the ranked source list, skipping entries without a string `ip`
fn deserialize_sources<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<SourceCount>, D::Error> {
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let ip = entry.get("ip")?.as_str()?.to_string();
            let count = entry.get("count").and_then(count_from_value).unwrap_or(0);
            Some(SourceCount { ip, count })
        })
        .collect())
}

/// Read a `{tag: count}` object, keeping wire order and skipping unusable counts
fn deserialize_counts<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<ProtocolCount>, D::Error> {
    let Value::Object(map) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(map
        .into_iter()
        .filter_map(|(protocol, value)| {
            let count = count_from_value(&value)?;
            Some(ProtocolCount { protocol, count })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_thresholds_are_strict() {
        assert_eq!(Severity::from_score(0.0), Severity::Low);
        assert_eq!(Severity::from_score(0.5), Severity::Low);
        assert_eq!(Severity::from_score(0.51), Severity::Medium);
        assert_eq!(Severity::from_score(0.7), Severity::Medium);
        assert_eq!(Severity::from_score(0.71), Severity::High);
        assert!(!Severity::Low.is_anomalous());
        assert!(Severity::Medium.is_anomalous());
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(-0.2), 0.0);
        assert_eq!(clamp_score(1.4), 1.0);
        assert_eq!(clamp_score(0.42), 0.42);
    }

    #[test]
    fn test_session_status() {
        let mut session = Session::new("s1", "Morning capture");
        assert_eq!(session.status(), SessionStatus::Idle);

        session.start_time = Some(Utc::now());
        assert_eq!(session.status(), SessionStatus::Capturing);

        session.end_time = Some(Utc::now());
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_protocol_class_is_lowercase() {
        let packet = PacketRecord::new("1", Utc::now(), "a", "b", "ICMP", 64);
        assert_eq!(packet.protocol_class(), "icmp");
        assert_eq!(packet.protocol, "ICMP");
    }

    #[test]
    fn test_snapshot_defaults_for_missing_fields() {
        let snapshot: AggregateSnapshot =
            serde_json::from_str(r#"{"totalPackets": 12, "uniqueIPs": 3}"#).unwrap();
        assert_eq!(snapshot.total_packets, 12);
        assert_eq!(snapshot.unique_ips, 3);
        assert_eq!(snapshot.data_volume, "0 MB");
        assert!(snapshot.protocol_distribution.is_empty());
        assert!(snapshot.top_sources.is_empty());
    }

    #[test]
    fn test_snapshot_accepts_whole_float_counters() {
        let snapshot: AggregateSnapshot = serde_json::from_str(
            r#"{"totalPackets": 1200.0, "anomalies": 3.0, "uniqueIPs": 17.0,
                "packetsPerSecond": 12, "topSources": [{"ip": "10.0.0.5", "count": 4.0}]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.total_packets, 1200);
        assert_eq!(snapshot.anomalies, 3);
        assert_eq!(snapshot.unique_ips, 17);
        assert_eq!(snapshot.packets_per_second, 12.0);
        assert_eq!(
            snapshot.top_sources,
            vec![SourceCount {
                ip: "10.0.0.5".into(),
                count: 4
            }]
        );
    }

    #[test]
    fn test_snapshot_unusable_values_default() {
        let snapshot: AggregateSnapshot = serde_json::from_str(
            r#"{"totalPackets": -4, "anomalies": 2.5, "uniqueIPs": "many",
                "packetsPerSecond": null, "dataVolume": 12,
                "topSources": [{"ip": "10.0.0.9", "count": "x"}, {"count": 3}, "junk"],
                "protocolDistribution": ["TCP"]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.total_packets, 0);
        assert_eq!(snapshot.anomalies, 0);
        assert_eq!(snapshot.unique_ips, 0);
        assert_eq!(snapshot.packets_per_second, 0.0);
        assert_eq!(snapshot.data_volume, "0 MB");
        assert_eq!(snapshot.top_sources.len(), 1);
        assert_eq!(snapshot.top_sources[0].count, 0);
        assert!(snapshot.protocol_distribution.is_empty());
    }

    #[test]
    fn test_protocol_distribution_keeps_wire_order() {
        let snapshot: AggregateSnapshot = serde_json::from_str(
            r#"{"protocolDistribution": {"UDP": 4, "TCP": 9, "ARP": "n/a", "ICMP": 1.0}}"#,
        )
        .unwrap();
        let tags: Vec<_> = snapshot
            .protocol_distribution
            .iter()
            .map(|c| c.protocol.as_str())
            .collect();
        assert_eq!(tags, vec!["UDP", "TCP", "ICMP"]);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_clamped_score_in_unit_range(score in any::<f64>()) {
                let clamped = clamp_score(score);
                prop_assert!((0.0..=1.0).contains(&clamped));
            }

            #[test]
            fn prop_severity_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                prop_assert!(Severity::from_score(lo) <= Severity::from_score(hi));
            }
        }
    }
}

