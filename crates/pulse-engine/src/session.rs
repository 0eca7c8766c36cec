//! Session lifecycle and the capture clock
//!
//! The backend owns sessions; this side only tracks the current one and the
//! client-visible capture state. Requests go through [`SessionApi`] so the
//! HTTP client and the simulated backend are interchangeable.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pulse_protocol::display::format_elapsed;
use pulse_protocol::{Session, SessionId};
use tracing::{debug, info, warn};

use crate::error::{ApiError, SessionError};

/// Session-control operations offered by a capture backend
pub trait SessionApi: Send + Sync + 'static {
    /// Create a session and return the backend's record of it
    fn create_session(&self, name: &str)
        -> impl Future<Output = Result<Session, ApiError>> + Send;

    /// Begin capturing on a session
    fn start_capture(&self, id: &SessionId) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Stop capturing on a session
    fn stop_capture(&self, id: &SessionId) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Download the full session record to `destination`, returning bytes written
    fn export_session(
        &self,
        id: &SessionId,
        destination: &Path,
    ) -> impl Future<Output = Result<u64, ApiError>> + Send;
}

/// Client-visible capture state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    /// No session yet
    #[default]
    NoSession,
    /// A session exists but has never been started
    SessionCreated,
    /// Capture is running
    Capturing,
    /// Capture was stopped; it can be started again
    Stopped,
}

impl CaptureState {
    /// Whether a session exists
    pub fn has_session(&self) -> bool {
        !matches!(self, CaptureState::NoSession)
    }

    /// Whether the start control is enabled
    pub fn can_start(&self) -> bool {
        matches!(self, CaptureState::SessionCreated | CaptureState::Stopped)
    }

    /// Whether the stop control is enabled
    pub fn can_stop(&self) -> bool {
        matches!(self, CaptureState::Capturing)
    }

    /// Short label for status displays
    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::NoSession => "No session",
            CaptureState::SessionCreated => "Ready",
            CaptureState::Capturing => "Capturing",
            CaptureState::Stopped => "Stopped",
        }
    }
}

/// Whether a lifecycle call reached the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// The backend accepted the request
    Acknowledged,
    /// There was no session, so nothing was sent
    Skipped,
}

/// Elapsed capture time, measured locally
///
/// The display freezes at the last tick when capture stops.
#[derive(Debug, Clone)]
pub struct CaptureClock {
    started_at: Option<Instant>,
    running: bool,
    display: String,
}

impl Default for CaptureClock {
    fn default() -> Self {
        Self {
            started_at: None,
            running: false,
            display: format_elapsed(Duration::ZERO),
        }
    }
}

impl CaptureClock {
    /// Start measuring from `now`
    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.running = true;
        self.display = format_elapsed(Duration::ZERO);
    }

    /// Stop ticking, keeping the last display
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Refresh the display if running
    pub fn tick(&mut self, now: Instant) {
        if let (true, Some(started)) = (self.running, self.started_at) {
            self.display = format_elapsed(now.saturating_duration_since(started));
        }
    }

    /// Whether the clock is running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Elapsed time as `HH:MM:SS`
    pub fn display(&self) -> &str {
        &self.display
    }
}

/// Current session, capture state and clock
pub struct SessionController<A> {
    api: Arc<A>,
    session: Option<Session>,
    state: CaptureState,
    clock: CaptureClock,
    export_dir: PathBuf,
}

impl<A: SessionApi> SessionController<A> {
    /// Create with no session; exports default to `export_dir`
    pub fn new(api: Arc<A>, export_dir: PathBuf) -> Self {
        Self {
            api,
            session: None,
            state: CaptureState::NoSession,
            clock: CaptureClock::default(),
            export_dir,
        }
    }

    /// Current session
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Current capture state
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Capture clock
    pub fn clock(&self) -> &CaptureClock {
        &self.clock
    }

    /// Advance the capture clock
    pub fn tick(&mut self, now: Instant) {
        self.clock.tick(now);
    }

    /// Create a new session, replacing the current one on success
    ///
    /// A running clock is stopped because the new session has not started.
    pub async fn create_session(&mut self, name: &str) -> Result<&Session, SessionError> {
        let session = self
            .api
            .create_session(name)
            .await
            .map_err(SessionError::CreateFailed)?;

        info!("Created session {} ({})", session.id, session.name);
        self.clock.stop();
        self.state = CaptureState::SessionCreated;
        let session: &Session = self.session.insert(session);
        Ok(session)
    }

    /// Start capture on the current session
    pub async fn start_capture(&mut self, now: Instant) -> Result<CallOutcome, SessionError> {
        let Some(id) = self.session.as_ref().map(|s| s.id.clone()) else {
            debug!("Start requested with no session");
            return Ok(CallOutcome::Skipped);
        };

        self.api
            .start_capture(&id)
            .await
            .map_err(SessionError::StartFailed)?;

        info!("Capture started on session {}", id);
        self.state = CaptureState::Capturing;
        self.clock.start(now);
        Ok(CallOutcome::Acknowledged)
    }

    /// Stop capture on the current session
    pub async fn stop_capture(&mut self) -> Result<CallOutcome, SessionError> {
        let Some(id) = self.session.as_ref().map(|s| s.id.clone()) else {
            debug!("Stop requested with no session");
            return Ok(CallOutcome::Skipped);
        };

        self.api
            .stop_capture(&id)
            .await
            .map_err(SessionError::StopFailed)?;

        info!("Capture stopped on session {}", id);
        self.state = CaptureState::Stopped;
        self.clock.stop();
        Ok(CallOutcome::Acknowledged)
    }

    /// Start downloading the current session in the background
    ///
    /// Returns the target path, or `None` when there is no session. The
    /// download outcome is only logged.
    pub fn export_session(&self, destination: Option<PathBuf>) -> Option<PathBuf> {
        let id = self.session.as_ref()?.id.clone();
        let path = destination
            .unwrap_or_else(|| self.export_dir.join(format!("session-{}.json", id)));

        let api = Arc::clone(&self.api);
        let target = path.clone();
        tokio::spawn(async move {
            match api.export_session(&id, &target).await {
                Ok(bytes) => info!("Exported session {} to {:?} ({} bytes)", id, target, bytes),
                Err(e) => warn!("Export of session {} failed: {}", id, e),
            }
        });

        Some(path)
    }

    /// Replace the current session with a pushed snapshot
    pub fn apply_update(&mut self, session: Session) {
        debug!("Session update for {}", session.id);
        if self.state == CaptureState::NoSession {
            self.state = CaptureState::SessionCreated;
        }
        self.session = Some(session);
    }
}
