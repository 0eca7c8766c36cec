//! In-process push channel backed by [`SimulatedBackend`]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use pulse_engine::{Connection, Transport, TransportError};
use tokio::sync::mpsc;
use tracing::debug;

use crate::backend::SimulatedBackend;

/// Transport whose connections receive the backend's published frames
#[derive(Debug, Clone)]
pub struct SimTransport {
    backend: SimulatedBackend,
    refuse: Arc<AtomicU32>,
}

impl SimTransport {
    /// Connect to `backend`
    pub fn new(backend: SimulatedBackend) -> Self {
        Self {
            backend,
            refuse: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Refuse the next `count` connection attempts
    pub fn fail_next_connects(&self, count: u32) {
        self.refuse.fetch_add(count, Ordering::SeqCst);
    }

    /// Drop every open connection
    pub fn disconnect_all(&self) {
        self.backend.disconnect_all();
    }
}

/// One open simulated channel
#[derive(Debug)]
pub struct SimConnection {
    frames: mpsc::UnboundedReceiver<String>,
}

impl Connection for SimConnection {
    async fn next_message(&mut self) -> Option<Result<String, TransportError>> {
        self.frames.recv().await.map(Ok)
    }
}

impl Transport for SimTransport {
    type Connection = SimConnection;

    async fn connect(&self, url: &str) -> Result<SimConnection, TransportError> {
        let refused = self
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            debug!("Refusing simulated connection to {}", url);
            return Err(TransportError::Connect {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        Ok(SimConnection {
            frames: self.backend.subscribe(),
        })
    }
}
