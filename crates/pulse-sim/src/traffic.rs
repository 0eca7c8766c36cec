//! Traffic generator task
//!
//! While a session is capturing, publishes packets at the configured rate
//! and a statistics snapshot every second. Totals restart whenever a
//! different session starts capturing.

use std::time::Duration;

use chrono::Utc;
use pulse_protocol::{ServerMessage, SessionId};
use tokio::sync::oneshot;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::backend::SimulatedBackend;
use crate::generator::{PacketGenerator, StatsAccumulator};

/// Slowest packet rate accepted, in packets per second
const MIN_RATE: f64 = 0.1;

/// Generator settings
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
    /// Packets per second while capturing
    pub rate: f64,
    /// Seed for the packet sequence
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self { rate: 20.0, seed: 1 }
    }
}

/// Run until `shutdown` fires or its sender is dropped
pub async fn run_traffic_generator(
    backend: SimulatedBackend,
    config: GeneratorConfig,
    mut shutdown: oneshot::Receiver<()>,
) {
    let rate = if config.rate.is_finite() {
        config.rate.max(MIN_RATE)
    } else {
        MIN_RATE
    };
    info!("Traffic generator started at {:.1} packets/s", rate);

    let mut generator = PacketGenerator::new(config.seed);
    let mut stats = StatsAccumulator::new();
    let mut current: Option<SessionId> = None;

    let mut packet_timer = interval(Duration::from_secs_f64(1.0 / rate));
    packet_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stats_timer = interval(Duration::from_secs(1));
    stats_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,

            _ = packet_timer.tick() => {
                let Some(id) = backend.capturing_session() else {
                    continue;
                };
                if current.as_ref() != Some(&id) {
                    debug!("Generator switched to session {}", id);
                    stats.reset();
                    current = Some(id);
                }

                let packet = generator.next_packet(Utc::now());
                stats.record(&packet, Instant::now().into_std());
                backend.publish(&ServerMessage::Packet(packet));
            }

            _ = stats_timer.tick() => {
                if backend.capturing_session().is_some() && current.is_some() {
                    let snapshot = stats.snapshot(Instant::now().into_std());
                    backend.publish(&ServerMessage::Stats(snapshot));
                }
            }
        }
    }

    info!("Traffic generator stopped");
}
