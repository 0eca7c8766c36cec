//! In-memory capture backend
//!
//! Holds sessions and the frames they produced, fans published frames out
//! to every open [`SimTransport`](crate::SimTransport) connection, and can be
//! told to fail upcoming session calls.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use pulse_engine::{ApiError, SessionApi};
use pulse_protocol::{encode_message, AggregateSnapshot, PacketRecord, ServerMessage, Session, SessionId};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Packets kept per session for export
pub const EXPORT_LIMIT: usize = 10_000;

/// Session call that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `create_session`
    Create,
    /// `start_capture`
    Start,
    /// `stop_capture`
    Stop,
}

#[derive(Debug)]
struct SimSession {
    session: Session,
    packets: Vec<PacketRecord>,
    last_stats: Option<AggregateSnapshot>,
}

#[derive(Debug, Default)]
struct BackendState {
    sessions: HashMap<SessionId, SimSession>,
    next_id: u64,
    capturing: Option<SessionId>,
    subscribers: Vec<mpsc::UnboundedSender<String>>,
    failures: HashMap<Operation, u32>,
}

impl BackendState {
    /// Consume one pending failure for `op`
    fn take_failure(&mut self, op: Operation) -> bool {
        match self.failures.get_mut(&op) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }

    fn broadcast(&mut self, text: String) {
        self.subscribers.retain(|tx| tx.send(text.clone()).is_ok());
    }
}

/// Shared handle to the simulated backend
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    state: Arc<Mutex<BackendState>>,
}

impl SimulatedBackend {
    /// Create a backend with no sessions
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new frame stream
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }

    /// Number of open frame streams
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.lock();
        state.subscribers.retain(|tx| !tx.is_closed());
        state.subscribers.len()
    }

    /// Close every open frame stream
    pub fn disconnect_all(&self) {
        let dropped = std::mem::take(&mut self.lock().subscribers);
        info!("Simulated backend dropped {} connection(s)", dropped.len());
    }

    /// Make the next `count` calls of `op` fail with HTTP 500
    pub fn fail_next(&self, op: Operation, count: u32) {
        *self.lock().failures.entry(op).or_insert(0) += count;
    }

    /// Session currently capturing
    pub fn capturing_session(&self) -> Option<SessionId> {
        self.lock().capturing.clone()
    }

    /// Snapshot of a session
    pub fn session(&self, id: &SessionId) -> Option<Session> {
        self.lock().sessions.get(id).map(|s| s.session.clone())
    }

    /// Send a frame to every open stream, recording packets and stats
    /// against the capturing session
    pub fn publish(&self, message: &ServerMessage) {
        let text = match encode_message(message) {
            Ok(text) => text,
            Err(e) => {
                warn!("Cannot encode {} frame: {}", message.kind(), e);
                return;
            }
        };

        let mut state = self.lock();
        if let Some(id) = state.capturing.clone() {
            if let Some(sim) = state.sessions.get_mut(&id) {
                match message {
                    ServerMessage::Packet(packet) if sim.packets.len() < EXPORT_LIMIT => {
                        sim.packets.push(packet.clone());
                    }
                    ServerMessage::Stats(stats) => sim.last_stats = Some(stats.clone()),
                    _ => {}
                }
            }
        }
        state.broadcast(text);
    }

    fn session_frame(session: &Session) -> Option<String> {
        encode_message(&ServerMessage::Session(session.clone())).ok()
    }
}

impl SessionApi for SimulatedBackend {
    async fn create_session(&self, name: &str) -> Result<Session, ApiError> {
        let mut state = self.lock();
        if state.take_failure(Operation::Create) {
            return Err(ApiError::Status(500));
        }

        state.next_id += 1;
        let session = Session::new(format!("sim-{}", state.next_id), name);
        state.sessions.insert(
            session.id.clone(),
            SimSession {
                session: session.clone(),
                packets: Vec::new(),
                last_stats: None,
            },
        );
        info!("Simulated session {} created", session.id);
        Ok(session)
    }

    async fn start_capture(&self, id: &SessionId) -> Result<(), ApiError> {
        let mut state = self.lock();
        if state.take_failure(Operation::Start) {
            return Err(ApiError::Status(500));
        }

        let sim = state.sessions.get_mut(id).ok_or(ApiError::Status(404))?;
        sim.session.start_time = Some(Utc::now());
        sim.session.end_time = None;
        let frame = Self::session_frame(&sim.session);

        state.capturing = Some(id.clone());
        if let Some(frame) = frame {
            state.broadcast(frame);
        }
        debug!("Simulated capture started on {}", id);
        Ok(())
    }

    async fn stop_capture(&self, id: &SessionId) -> Result<(), ApiError> {
        let mut state = self.lock();
        if state.take_failure(Operation::Stop) {
            return Err(ApiError::Status(500));
        }

        let sim = state.sessions.get_mut(id).ok_or(ApiError::Status(404))?;
        sim.session.end_time = Some(Utc::now());
        let frame = Self::session_frame(&sim.session);

        if state.capturing.as_ref() == Some(id) {
            state.capturing = None;
        }
        if let Some(frame) = frame {
            state.broadcast(frame);
        }
        debug!("Simulated capture stopped on {}", id);
        Ok(())
    }

    async fn export_session(&self, id: &SessionId, destination: &Path) -> Result<u64, ApiError> {
        let body = {
            let state = self.lock();
            let sim = state.sessions.get(id).ok_or(ApiError::Status(404))?;
            json!({
                "session": sim.session,
                "packets": sim.packets,
                "stats": sim.last_stats,
            })
        };

        let bytes = serde_json::to_vec_pretty(&body).map_err(|e| ApiError::Io(e.to_string()))?;
        tokio::fs::write(destination, &bytes).await?;
        Ok(bytes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let backend = SimulatedBackend::new();
        backend.fail_next(Operation::Create, 1);

        assert!(matches!(
            backend.create_session("a").await,
            Err(ApiError::Status(500))
        ));
        let session = backend.create_session("b").await.unwrap();
        assert_eq!(session.id.as_str(), "sim-1");
    }

    #[tokio::test]
    async fn test_start_and_stop_publish_session_frames() {
        let backend = SimulatedBackend::new();
        let session = backend.create_session("lab").await.unwrap();
        let mut rx = backend.subscribe();

        backend.start_capture(&session.id).await.unwrap();
        assert_eq!(backend.capturing_session(), Some(session.id.clone()));
        let frame = rx.recv().await.unwrap();
        assert!(frame.contains(r#""type":"session""#));

        backend.stop_capture(&session.id).await.unwrap();
        assert!(backend.capturing_session().is_none());
        assert!(backend.session(&session.id).unwrap().end_time.is_some());
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let backend = SimulatedBackend::new();
        let missing = SessionId::new("nope");
        assert!(matches!(
            backend.start_capture(&missing).await,
            Err(ApiError::Status(404))
        ));
    }

    #[tokio::test]
    async fn test_disconnect_closes_streams() {
        let backend = SimulatedBackend::new();
        let mut rx = backend.subscribe();
        assert_eq!(backend.subscriber_count(), 1);

        backend.disconnect_all();
        assert!(rx.recv().await.is_none());
        assert_eq!(backend.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_export_writes_session_record() {
        let backend = SimulatedBackend::new();
        let session = backend.create_session("export").await.unwrap();
        backend.start_capture(&session.id).await.unwrap();
        backend.publish(&ServerMessage::Packet(PacketRecord::new(
            "p1",
            Utc::now(),
            "10.0.0.1",
            "10.0.0.2",
            "TCP",
            60,
        )));

        let path = std::env::temp_dir().join(format!("netpulse-export-{}.json", std::process::id()));
        let written = backend.export_session(&session.id, &path).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(written as usize, text.len());
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["session"]["name"], "export");
        assert_eq!(value["packets"][0]["id"], "p1");
    }
}
