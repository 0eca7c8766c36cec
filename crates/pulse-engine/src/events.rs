//! Dashboard input queue and outgoing events
//!
//! Every state change enters through a single [`DashboardInput`] queue, so
//! channel traffic, timer ticks and user actions are applied in one FIFO
//! order by the dashboard actor.

use std::path::PathBuf;
use std::time::Duration;

use pulse_protocol::{AggregateSnapshot, PacketId, PacketRecord, Session};

use crate::filter::ProtocolFilter;
use crate::session::CaptureState;

/// Everything the dashboard actor consumes
#[derive(Debug, Clone)]
pub enum DashboardInput {
    // -------------------------------------------------------------------------
    // Push-channel traffic
    // -------------------------------------------------------------------------
    /// A packet frame was decoded
    PacketArrived(PacketRecord),

    /// A statistics frame was decoded
    SnapshotArrived(AggregateSnapshot),

    /// A session frame was decoded
    SessionUpdated(Session),

    /// The push channel connected
    ChannelUp,

    /// The push channel dropped; a reconnect is scheduled
    ChannelLost {
        /// Consecutive failed attempts, starting at 1
        attempt: u32,
        /// Delay before the next attempt
        retry_in: Duration,
    },

    // -------------------------------------------------------------------------
    // Local sources
    // -------------------------------------------------------------------------
    /// One second of capture time elapsed
    TimerTick,

    /// Something the user did
    User(UserAction),

    /// Stop the actor
    Shutdown,
}

/// User-initiated actions
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    /// Create a new session with this name
    CreateSession {
        /// Display name
        name: String,
    },
    /// Start capturing on the current session
    StartCapture,
    /// Stop capturing on the current session
    StopCapture,
    /// Download the current session's full record
    ExportSession {
        /// Target file; `None` uses the configured export directory
        destination: Option<PathBuf>,
    },
    /// Empty the buffer and aggregates
    ClearData,
    /// Change the protocol criterion
    SetProtocolFilter(ProtocolFilter),
    /// Change the address-substring criterion
    SetAddressFilter(String),
    /// Highlight a packet, or clear the highlight
    SelectPacket(Option<PacketId>),
}

/// Success or failure styling of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Something completed
    Success,
    /// Something failed
    Error,
}

/// A transient user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Styling
    pub kind: NotificationKind,
    /// Short heading
    pub title: String,
    /// One-line detail
    pub description: String,
}

impl Notification {
    /// Build a success notification
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Build an error notification titled "Error"
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Error".to_string(),
            description: description.into(),
        }
    }
}

/// Events emitted by the dashboard actor for observers
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// Show a notification
    Notification(Notification),

    /// The push channel went up or down
    ConnectionChanged {
        /// Whether the channel is now connected
        connected: bool,
    },

    /// The capture state machine moved
    CaptureStateChanged {
        /// Previous state
        from: CaptureState,
        /// New state
        to: CaptureState,
    },

    /// An export download was started
    ExportStarted {
        /// Where the file will be written
        path: PathBuf,
    },
}
