//! NetPulse dashboard engine
//!
//! This crate turns the stream of frames pushed by a capture backend into
//! render-ready dashboard state.
//!
//! # Architecture
//!
//! - **Connection manager** ([`run_connection_manager`]): owns the push
//!   channel, decodes frames and reconnects after loss
//! - **Dashboard** ([`Dashboard`]): single owner of the packet buffer, filter
//!   engine, aggregate tracker and session controller
//! - **Actor** ([`run_dashboard_actor`]): feeds queued [`DashboardInput`]s to
//!   the dashboard in FIFO order and publishes a [`DashboardView`]
//!
//! Backends plug in through two seams: [`Transport`] for the push channel
//! and [`SessionApi`] for session control.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use pulse_engine::{filter, PacketBuffer};
//! use pulse_protocol::PacketRecord;
//!
//! let mut buffer = PacketBuffer::new(2);
//! buffer.insert(PacketRecord::new("1", Utc::now(), "10.0.0.1", "8.8.8.8", "UDP", 74));
//! buffer.insert(PacketRecord::new("2", Utc::now(), "10.0.0.2", "1.1.1.1", "TCP", 60));
//! buffer.insert(PacketRecord::new("3", Utc::now(), "10.0.0.3", "8.8.4.4", "UDP", 74));
//!
//! // The oldest record was evicted
//! assert_eq!(buffer.len(), 2);
//!
//! let udp = filter::apply(&buffer, "UDP", "");
//! assert_eq!(udp.len(), 1);
//! assert_eq!(udp[0].id.as_str(), "3");
//! ```

pub mod actor;
pub mod aggregate;
pub mod backoff;
pub mod buffer;
pub mod connection;
pub mod dashboard;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod filter;
pub mod history;
pub mod rate;
pub mod session;
pub mod view;

#[cfg(test)]
mod test_support;

pub use actor::run_dashboard_actor;
pub use aggregate::{AggregateTracker, Chart, ProtocolShare};
pub use backoff::Backoff;
pub use buffer::{PacketBuffer, DEFAULT_CAPACITY};
pub use connection::{
    run_connection_manager, Connection, ConnectionConfig, ConnectionSummary, Transport,
};
pub use dashboard::{Dashboard, DashboardConfig};
pub use endpoint::Endpoint;
pub use error::{ApiError, EndpointError, SessionError, TransportError};
pub use events::{DashboardEvent, DashboardInput, Notification, NotificationKind, UserAction};
pub use filter::{FilterEngine, PacketFilter, ProtocolFilter};
pub use history::{TrafficBar, TrafficHistory, HISTORY_LEN};
pub use rate::ArrivalRateMeter;
pub use session::{CallOutcome, CaptureClock, CaptureState, SessionApi, SessionController};
pub use view::{AnomalyAlert, DashboardView, Headline, PacketDetail, PacketRow, SessionSummary};
