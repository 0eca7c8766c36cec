//! Render-ready dashboard state
//!
//! The actor publishes a fresh [`DashboardView`] after each batch of inputs.
//! Everything a front end needs is already formatted, so drawing code never
//! touches the engine's components.

use chrono::Local;
use pulse_protocol::display::{
    format_clock_time, format_confidence, format_detailed_time, format_score, group_thousands,
};
use pulse_protocol::{PacketId, PacketRecord, SessionId, Severity, SourceCount};

use crate::aggregate::{Chart, ProtocolShare};
use crate::filter::PacketFilter;
use crate::history::TrafficBar;
use crate::session::CaptureState;

/// One row of the packet table
#[derive(Debug, Clone, PartialEq)]
pub struct PacketRow {
    /// 1-based position in the filtered view
    pub position: usize,
    /// Record id
    pub id: PacketId,
    /// Local time of day, `HH:MM:SS.mmm`
    pub time: String,
    /// Source address
    pub source: String,
    /// Destination address
    pub destination: String,
    /// Protocol tag as sent
    pub protocol: String,
    /// Lower-case protocol for styling
    pub protocol_class: String,
    /// Size with thousands separators
    pub size: String,
    /// Summary, or `-`
    pub info: String,
    /// Score with two decimals
    pub score: String,
    /// Row colouring
    pub severity: Severity,
    /// Whether this row is highlighted
    pub selected: bool,
}

impl PacketRow {
    /// Build the row for `record` at `position`
    pub fn new(position: usize, record: &PacketRecord, selected: bool) -> Self {
        Self {
            position,
            id: record.id.clone(),
            time: format_clock_time(&record.timestamp.with_timezone(&Local)),
            source: record.source_ip.clone(),
            destination: record.destination_ip.clone(),
            protocol: record.protocol.clone(),
            protocol_class: record.protocol_class(),
            size: group_thousands(record.size),
            info: record
                .info
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "-".to_string()),
            score: format_score(record.anomaly_score),
            severity: record.severity(),
            selected,
        }
    }
}

/// Warning banner for anomalous packets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyAlert {
    /// Medium or High
    pub severity: Severity,
    /// Banner heading
    pub title: &'static str,
    /// Banner text
    pub message: &'static str,
}

impl AnomalyAlert {
    /// Banner for a severity, `None` for normal traffic
    pub fn for_severity(severity: Severity) -> Option<Self> {
        match severity {
            Severity::High => Some(Self {
                severity,
                title: "High Anomaly Score",
                message: "Potential security threat detected.",
            }),
            Severity::Medium => Some(Self {
                severity,
                title: "Medium Anomaly Score",
                message: "Unusual traffic pattern detected.",
            }),
            Severity::Low => None,
        }
    }
}

/// Detail pane content for the selected packet
#[derive(Debug, Clone, PartialEq)]
pub struct PacketDetail {
    /// Record id
    pub id: PacketId,
    /// Local date and time with milliseconds
    pub timestamp: String,
    /// Source address
    pub source: String,
    /// Destination address
    pub destination: String,
    /// Protocol tag
    pub protocol: String,
    /// Length, e.g. `1,500 bytes`
    pub length: String,
    /// Summary, if any
    pub info: Option<String>,
    /// Header fields in wire order
    pub headers: Vec<(String, String)>,
    /// Payload text, if any
    pub payload: Option<String>,
    /// Banner for Medium/High scores
    pub alert: Option<AnomalyAlert>,
    /// Score with two decimals
    pub score: String,
    /// Verdict text
    pub detection: &'static str,
    /// Score as a percentage
    pub confidence: String,
}

impl PacketDetail {
    /// Build the detail pane for `record`
    pub fn new(record: &PacketRecord) -> Self {
        let severity = record.severity();
        Self {
            id: record.id.clone(),
            timestamp: format_detailed_time(&record.timestamp.with_timezone(&Local)),
            source: record.source_ip.clone(),
            destination: record.destination_ip.clone(),
            protocol: record.protocol.clone(),
            length: format!("{} bytes", group_thousands(record.size)),
            info: record.info.clone(),
            headers: record.headers.clone().unwrap_or_default(),
            payload: record.payload.clone(),
            alert: AnomalyAlert::for_severity(severity),
            score: format_score(record.anomaly_score),
            detection: severity.detection(),
            confidence: format_confidence(record.anomaly_score),
        }
    }
}

/// Current session identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Backend id
    pub id: SessionId,
    /// Display name
    pub name: String,
}

/// Headline counters, formatted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    /// Total packets, thousands-grouped
    pub total_packets: String,
    /// Backend rate estimate, one decimal
    pub packets_per_second: String,
    /// High-anomaly count
    pub anomalies: String,
    /// Backend-formatted volume
    pub data_volume: String,
    /// Distinct addresses
    pub unique_ips: String,
}

/// Everything a front end draws
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// Push channel is up
    pub connected: bool,
    /// Capture state
    pub capture_state: CaptureState,
    /// Current session, if any
    pub session: Option<SessionSummary>,
    /// Start control enabled
    pub can_start: bool,
    /// Stop control enabled
    pub can_stop: bool,
    /// Export control enabled
    pub can_export: bool,
    /// Capture duration `HH:MM:SS`
    pub elapsed: String,
    /// Headline counters
    pub headline: Headline,
    /// Active criteria
    pub filter: PacketFilter,
    /// Protocol tags offered by the protocol selector
    pub known_protocols: Vec<String>,
    /// Filtered rows, newest first
    pub rows: Vec<PacketRow>,
    /// Selected packet, while it is still buffered
    pub detail: Option<PacketDetail>,
    /// Protocol distribution chart
    pub protocol_chart: Chart<ProtocolShare>,
    /// Top sources chart
    pub top_sources: Chart<SourceCount>,
    /// Traffic chart bars, oldest first
    pub traffic: Vec<TrafficBar>,
    /// Records held in the buffer
    pub buffered: usize,
}
