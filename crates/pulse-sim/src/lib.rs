//! NetPulse simulated backend
//!
//! This crate stands in for a live capture server so the dashboard can be
//! exercised without one. It includes:
//!
//! - **SimulatedBackend**: in-memory sessions implementing `SessionApi`,
//!   with injectable failures
//! - **SimTransport**: an in-process push channel that can drop or refuse
//!   connections on demand
//! - **PacketGenerator** / **StatsAccumulator**: deterministic synthetic
//!   traffic and the snapshots derived from it
//! - **run_traffic_generator**: the task that publishes traffic while a
//!   session is capturing
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use pulse_sim::PacketGenerator;
//!
//! let mut generator = PacketGenerator::new(42);
//! let packet = generator.next_packet(Utc::now());
//! assert_eq!(packet.id.as_str(), "1");
//! assert!((0.0..=1.0).contains(&packet.anomaly_score));
//! ```

pub mod backend;
pub mod generator;
pub mod traffic;
pub mod transport;

pub use backend::{Operation, SimulatedBackend, EXPORT_LIMIT};
pub use generator::{PacketGenerator, StatsAccumulator, TOP_SOURCES};
pub use traffic::{run_traffic_generator, GeneratorConfig};
pub use transport::{SimConnection, SimTransport};
