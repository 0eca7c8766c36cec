//! Derived, filtered view over the packet buffer
//!
//! Filtering is a pure function of the buffer and the two criteria; it is
//! recomputed on every change instead of being maintained incrementally.

use pulse_protocol::{PacketId, PacketRecord};

use crate::buffer::PacketBuffer;

/// Protocol criterion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProtocolFilter {
    /// Every protocol passes
    #[default]
    All,
    /// Only this exact (case-sensitive) tag passes
    Exact(String),
}

impl ProtocolFilter {
    /// Parse the text of a protocol selector; `"all"` and empty mean no filter
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() || text == "all" {
            ProtocolFilter::All
        } else {
            ProtocolFilter::Exact(text.to_string())
        }
    }

    /// Whether a protocol tag passes
    pub fn matches(&self, protocol: &str) -> bool {
        match self {
            ProtocolFilter::All => true,
            ProtocolFilter::Exact(tag) => tag == protocol,
        }
    }

    /// Selector text for this filter
    pub fn as_str(&self) -> &str {
        match self {
            ProtocolFilter::All => "all",
            ProtocolFilter::Exact(tag) => tag,
        }
    }
}

/// Protocol plus address-substring criteria
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketFilter {
    /// Protocol criterion
    pub protocol: ProtocolFilter,
    /// Case-sensitive substring of either address; empty matches everything
    pub address: String,
}

impl PacketFilter {
    /// Whether no criterion is active
    pub fn is_identity(&self) -> bool {
        self.protocol == ProtocolFilter::All && self.address.is_empty()
    }

    /// Whether a record passes both criteria
    pub fn matches(&self, record: &PacketRecord) -> bool {
        self.protocol.matches(&record.protocol)
            && (self.address.is_empty()
                || record.source_ip.contains(&self.address)
                || record.destination_ip.contains(&self.address))
    }

    /// Matching records in buffer order
    pub fn apply<'a>(&self, buffer: &'a PacketBuffer) -> Vec<&'a PacketRecord> {
        buffer.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Filter a buffer by protocol selector text and address substring
pub fn apply<'a>(buffer: &'a PacketBuffer, protocol: &str, address: &str) -> Vec<&'a PacketRecord> {
    PacketFilter {
        protocol: ProtocolFilter::parse(protocol),
        address: address.to_string(),
    }
    .apply(buffer)
}

/// Current criteria plus the highlighted record
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    filter: PacketFilter,
    selected: Option<PacketId>,
}

impl FilterEngine {
    /// Create with no criteria and no selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Current criteria
    pub fn filter(&self) -> &PacketFilter {
        &self.filter
    }

    /// Replace the protocol criterion
    pub fn set_protocol(&mut self, protocol: ProtocolFilter) {
        self.filter.protocol = protocol;
    }

    /// Replace the address criterion
    pub fn set_address(&mut self, address: impl Into<String>) {
        self.filter.address = address.into();
    }

    /// Highlight a record, or clear the highlight with `None`
    pub fn select(&mut self, id: Option<PacketId>) {
        self.selected = id;
    }

    /// Highlighted record id
    pub fn selected(&self) -> Option<&PacketId> {
        self.selected.as_ref()
    }

    /// Drop the selection if its record was evicted
    pub fn forget_evicted(&mut self, evicted: &[PacketRecord]) {
        if let Some(id) = &self.selected {
            if evicted.iter().any(|r| &r.id == id) {
                self.selected = None;
            }
        }
    }

    /// Reset after the buffer was cleared
    ///
    /// Criteria are kept; only the selection goes.
    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Visible records for the current criteria
    pub fn visible<'a>(&self, buffer: &'a PacketBuffer) -> Vec<&'a PacketRecord> {
        self.filter.apply(buffer)
    }
}
