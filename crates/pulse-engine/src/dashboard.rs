//! Dashboard coordinator
//!
//! [`Dashboard`] owns the packet buffer, filter engine, aggregate tracker and
//! session controller, and is the only thing that mutates them. It is driven
//! one [`DashboardInput`] at a time by the dashboard actor.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use pulse_protocol::display::{format_rate, group_thousands};
use tracing::{debug, info, warn};

use crate::aggregate::AggregateTracker;
use crate::buffer::{PacketBuffer, DEFAULT_CAPACITY};
use crate::error::SessionError;
use crate::events::{DashboardEvent, DashboardInput, Notification, UserAction};
use crate::filter::FilterEngine;
use crate::session::{CallOutcome, CaptureState, SessionApi, SessionController};
use crate::view::{DashboardView, Headline, PacketDetail, PacketRow, SessionSummary};

/// Dashboard sizing and defaults
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Packet buffer capacity
    pub buffer_capacity: usize,
    /// Directory for exports without an explicit destination
    pub export_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_CAPACITY,
            export_dir: std::env::temp_dir(),
        }
    }
}

/// Single-owner dashboard state
pub struct Dashboard<A> {
    buffer: PacketBuffer,
    filter: FilterEngine,
    aggregates: AggregateTracker,
    sessions: SessionController<A>,
    connected: bool,
}

impl<A: SessionApi> Dashboard<A> {
    /// Create an empty, disconnected dashboard
    pub fn new(api: Arc<A>, config: DashboardConfig) -> Self {
        Self {
            buffer: PacketBuffer::new(config.buffer_capacity),
            filter: FilterEngine::new(),
            aggregates: AggregateTracker::new(),
            sessions: SessionController::new(api, config.export_dir),
            connected: false,
        }
    }

    /// Whether the push channel is up
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether the capture clock needs one-second ticks
    pub fn needs_ticks(&self) -> bool {
        self.sessions.clock().is_running()
    }

    /// Current capture state
    pub fn capture_state(&self) -> CaptureState {
        self.sessions.state()
    }

    /// Retained packets
    pub fn buffer(&self) -> &PacketBuffer {
        &self.buffer
    }

    /// Aggregate tracker
    pub fn aggregates(&self) -> &AggregateTracker {
        &self.aggregates
    }

    /// Filter engine
    pub fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    /// Session controller
    pub fn sessions(&self) -> &SessionController<A> {
        &self.sessions
    }

    /// Apply one input, returning the events it produced
    pub async fn handle(&mut self, input: DashboardInput, now: Instant) -> Vec<DashboardEvent> {
        let mut events = Vec::new();

        match input {
            DashboardInput::PacketArrived(packet) => {
                let evicted = self.buffer.insert(packet);
                if !evicted.is_empty() {
                    debug!("Evicted {} packet(s)", evicted.len());
                    self.filter.forget_evicted(&evicted);
                }
                self.aggregates.record_arrival(now);
            }

            DashboardInput::SnapshotArrived(snapshot) => {
                self.aggregates.apply_snapshot(snapshot);
            }

            DashboardInput::SessionUpdated(session) => {
                let from = self.sessions.state();
                self.sessions.apply_update(session);
                push_state_change(&mut events, from, self.sessions.state());
            }

            DashboardInput::ChannelUp => {
                if !self.connected {
                    self.connected = true;
                    events.push(DashboardEvent::ConnectionChanged { connected: true });
                }
            }

            DashboardInput::ChannelLost { attempt, retry_in } => {
                debug!("Channel lost (attempt {}, retry in {:?})", attempt, retry_in);
                if self.connected {
                    self.connected = false;
                    events.push(DashboardEvent::ConnectionChanged { connected: false });
                }
            }

            DashboardInput::TimerTick => self.sessions.tick(now),

            DashboardInput::User(action) => self.handle_user(action, now, &mut events).await,

            // Handled by the actor loop
            DashboardInput::Shutdown => {}
        }

        events
    }

    async fn handle_user(
        &mut self,
        action: UserAction,
        now: Instant,
        events: &mut Vec<DashboardEvent>,
    ) {
        let from = self.sessions.state();

        match action {
            UserAction::CreateSession { name } => match self.sessions.create_session(&name).await {
                Ok(_) => events.push(DashboardEvent::Notification(Notification::success(
                    "Session Created",
                    "New session created successfully",
                ))),
                Err(e) => report(events, "Session", &e),
            },

            UserAction::StartCapture => match self.sessions.start_capture(now).await {
                Ok(CallOutcome::Acknowledged) => {
                    events.push(DashboardEvent::Notification(Notification::success(
                        "Capture Started",
                        "Network packet capture has begun",
                    )))
                }
                Ok(CallOutcome::Skipped) => {}
                Err(e) => report(events, "Capture", &e),
            },

            UserAction::StopCapture => match self.sessions.stop_capture().await {
                Ok(CallOutcome::Acknowledged) => {
                    events.push(DashboardEvent::Notification(Notification::success(
                        "Capture Stopped",
                        "Network packet capture has been stopped",
                    )))
                }
                Ok(CallOutcome::Skipped) => {}
                Err(e) => report(events, "Capture", &e),
            },

            UserAction::ExportSession { destination } => {
                if let Some(path) = self.sessions.export_session(destination) {
                    info!("Export started to {:?}", path);
                    events.push(DashboardEvent::ExportStarted { path });
                    events.push(DashboardEvent::Notification(Notification::success(
                        "Export Started",
                        "Session data export has begun",
                    )));
                }
            }

            UserAction::ClearData => {
                self.buffer.clear();
                self.filter.clear();
                self.aggregates.reset();
                info!("Cleared packet data");
                events.push(DashboardEvent::Notification(Notification::success(
                    "Session Cleared",
                    "All packet data has been cleared",
                )));
            }

            UserAction::SetProtocolFilter(protocol) => self.filter.set_protocol(protocol),

            UserAction::SetAddressFilter(address) => self.filter.set_address(address),

            UserAction::SelectPacket(id) => self.filter.select(id),
        }

        push_state_change(events, from, self.sessions.state());
    }

    /// Build the render-ready view
    pub fn view(&self) -> DashboardView {
        let selected = self.filter.selected();
        let rows = self
            .filter
            .visible(&self.buffer)
            .into_iter()
            .enumerate()
            .map(|(i, record)| PacketRow::new(i + 1, record, Some(&record.id) == selected))
            .collect();
        let detail = selected
            .and_then(|id| self.buffer.find(id))
            .map(PacketDetail::new);

        let snapshot = self.aggregates.snapshot();
        let state = self.sessions.state();

        DashboardView {
            connected: self.connected,
            capture_state: state,
            session: self.sessions.session().map(|s| SessionSummary {
                id: s.id.clone(),
                name: s.name.clone(),
            }),
            can_start: state.can_start(),
            can_stop: state.can_stop(),
            can_export: state.has_session(),
            elapsed: self.sessions.clock().display().to_string(),
            headline: Headline {
                total_packets: group_thousands(snapshot.total_packets),
                packets_per_second: format_rate(snapshot.packets_per_second),
                anomalies: snapshot.anomalies.to_string(),
                data_volume: snapshot.data_volume.clone(),
                unique_ips: snapshot.unique_ips.to_string(),
            },
            filter: self.filter.filter().clone(),
            known_protocols: self.known_protocols(),
            rows,
            detail,
            protocol_chart: self.aggregates.protocol_chart(),
            top_sources: self.aggregates.top_sources_chart(),
            traffic: self.aggregates.traffic_bars(),
            buffered: self.buffer.len(),
        }
    }

    /// Protocol tags seen in the buffer or the latest distribution, sorted
    fn known_protocols(&self) -> Vec<String> {
        let mut tags: BTreeSet<&str> = self.buffer.iter().map(|r| r.protocol.as_str()).collect();
        tags.extend(
            self.aggregates
                .snapshot()
                .protocol_distribution
                .iter()
                .map(|c| c.protocol.as_str()),
        );
        tags.into_iter().map(str::to_string).collect()
    }
}

fn push_state_change(events: &mut Vec<DashboardEvent>, from: CaptureState, to: CaptureState) {
    if from != to {
        info!("Capture state {:?} -> {:?}", from, to);
        events.push(DashboardEvent::CaptureStateChanged { from, to });
    }
}

/// Log a failed session call and queue the user-facing error
fn report(events: &mut Vec<DashboardEvent>, source: &str, err: &SessionError) {
    warn!(source = source, "{}", err);
    events.push(DashboardEvent::Notification(Notification::error(
        err.user_message(),
    )));
}
