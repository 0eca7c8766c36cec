//! Push-channel connection manager
//!
//! Owns the lifecycle of the persistent channel: connect, decode and route
//! every frame into the dashboard queue, and on loss schedule exactly one
//! delayed reconnect. There is no retry limit; the loop ends only when the
//! dashboard queue is closed.

use std::future::Future;

use pulse_protocol::{decode_message, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::error::TransportError;
use crate::events::DashboardInput;

/// An open push channel
pub trait Connection: Send {
    /// Next text frame, an error, or `None` once the peer closed cleanly
    fn next_message(
        &mut self,
    ) -> impl Future<Output = Option<Result<String, TransportError>>> + Send;
}

/// Something that can open push channels
pub trait Transport: Send + Sync + 'static {
    /// Connection type produced by [`Transport::connect`]
    type Connection: Connection;

    /// Open a channel to `url`
    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// Connection manager settings
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Channel address
    pub url: String,
    /// Reconnect delay policy
    pub backoff: Backoff,
}

/// Counters reported when the manager exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionSummary {
    /// Successful connections
    pub connects: u64,
    /// Frames dropped because they failed to decode
    pub decode_failures: u64,
}

/// Route a decoded frame to its dashboard input
fn route(message: ServerMessage) -> DashboardInput {
    match message {
        ServerMessage::Packet(packet) => DashboardInput::PacketArrived(packet),
        ServerMessage::Stats(snapshot) => DashboardInput::SnapshotArrived(snapshot),
        ServerMessage::Session(session) => DashboardInput::SessionUpdated(session),
    }
}

/// Run the connection manager until `input_tx` is closed
///
/// Pushes `ChannelUp` on every successful connect and `ChannelLost` on
/// every loss, so the dashboard can track connectivity.
pub async fn run_connection_manager<T: Transport>(
    transport: T,
    config: ConnectionConfig,
    input_tx: mpsc::Sender<DashboardInput>,
) -> ConnectionSummary {
    let mut summary = ConnectionSummary::default();
    let mut attempt: u32 = 0;
    info!("Connection manager started for {}", config.url);

    loop {
        let connected = tokio::select! {
            _ = input_tx.closed() => break,
            result = transport.connect(&config.url) => result,
        };

        match connected {
            Ok(mut connection) => {
                attempt = 0;
                summary.connects += 1;
                info!("Channel connected to {}", config.url);
                if input_tx.send(DashboardInput::ChannelUp).await.is_err() {
                    break;
                }

                loop {
                    let next = tokio::select! {
                        _ = input_tx.closed() => return summary,
                        next = connection.next_message() => next,
                    };

                    match next {
                        Some(Ok(text)) => match decode_message(&text) {
                            Ok(message) => {
                                debug!("Received {} frame", message.kind());
                                if input_tx.send(route(message)).await.is_err() {
                                    return summary;
                                }
                            }
                            Err(e) => {
                                summary.decode_failures += 1;
                                warn!("Dropping undecodable frame: {}", e);
                            }
                        },
                        Some(Err(e)) => {
                            warn!("Channel error: {}", e);
                            break;
                        }
                        None => {
                            info!("Channel closed by peer");
                            break;
                        }
                    }
                }
            }
            Err(e) => warn!("Channel connect failed: {}", e),
        }

        attempt = attempt.saturating_add(1);
        let retry_in = config.backoff.next_delay(attempt);
        info!("Reconnecting in {:?} (attempt {})", retry_in, attempt);
        if input_tx
            .send(DashboardInput::ChannelLost { attempt, retry_in })
            .await
            .is_err()
        {
            break;
        }

        tokio::select! {
            _ = input_tx.closed() => break,
            _ = tokio::time::sleep(retry_in) => {}
        }
    }

    info!(
        "Connection manager stopped ({} connects, {} dropped frames)",
        summary.connects, summary.decode_failures
    );
    summary
}
