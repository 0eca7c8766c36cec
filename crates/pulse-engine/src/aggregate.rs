//! Aggregate statistics and traffic history
//!
//! Headline counters, the protocol distribution and top sources come only
//! from backend snapshots. The traffic history is the one client-derived
//! series: every packet arrival appends the measured arrival rate.

use std::time::Instant;

use pulse_protocol::{AggregateSnapshot, SourceCount};

use crate::history::{TrafficBar, TrafficHistory};
use crate::rate::ArrivalRateMeter;

/// Chart content, or the "no data" placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum Chart<T> {
    /// Nothing to draw
    NoData,
    /// Rows in display order
    Rows(Vec<T>),
}

impl<T> Chart<T> {
    /// Whether this is the placeholder
    pub fn is_empty(&self) -> bool {
        matches!(self, Chart::NoData)
    }

    /// Rows, empty for the placeholder
    pub fn rows(&self) -> &[T] {
        match self {
            Chart::NoData => &[],
            Chart::Rows(rows) => rows,
        }
    }
}

/// One row of the protocol distribution chart
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolShare {
    /// Protocol tag
    pub protocol: String,
    /// Packets seen
    pub count: u64,
    /// Exact share of the total, 0..=100
    pub percent: f64,
    /// Share rounded to a whole percent for labels
    pub rounded: u32,
}

/// Owner of the latest snapshot and the traffic history
#[derive(Debug, Clone, Default)]
pub struct AggregateTracker {
    snapshot: AggregateSnapshot,
    history: TrafficHistory,
    meter: ArrivalRateMeter,
}

impl AggregateTracker {
    /// Create with a default snapshot and a zeroed history
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot wholesale
    pub fn apply_snapshot(&mut self, snapshot: AggregateSnapshot) {
        self.snapshot = snapshot;
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> &AggregateSnapshot {
        &self.snapshot
    }

    /// Count one packet arrival and push the resulting rate into the history
    pub fn record_arrival(&mut self, now: Instant) -> f64 {
        let rate = self.meter.record(now);
        self.history.push(rate);
        rate
    }

    /// Traffic history
    pub fn history(&self) -> &TrafficHistory {
        &self.history
    }

    /// Scaled traffic chart bars
    pub fn traffic_bars(&self) -> Vec<TrafficBar> {
        self.history.bars()
    }

    /// Back to the empty state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Protocol shares, largest first
    ///
    /// Ties keep the snapshot's wire order.
    pub fn protocol_chart(&self) -> Chart<ProtocolShare> {
        let counts = &self.snapshot.protocol_distribution;
        let total: u64 = counts.iter().map(|c| c.count).sum();
        if total == 0 {
            return Chart::NoData;
        }

        let mut rows: Vec<ProtocolShare> = counts
            .iter()
            .map(|c| {
                let percent = c.count as f64 / total as f64 * 100.0;
                ProtocolShare {
                    protocol: c.protocol.clone(),
                    count: c.count,
                    percent,
                    rounded: percent.round() as u32,
                }
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        Chart::Rows(rows)
    }

    /// Top sources in backend order
    pub fn top_sources_chart(&self) -> Chart<SourceCount> {
        if self.snapshot.top_sources.is_empty() {
            Chart::NoData
        } else {
            Chart::Rows(self.snapshot.top_sources.clone())
        }
    }
}
