//! Event processing - dashboard events and notification toasts

use std::time::{Duration, Instant};

use pulse_engine::{DashboardEvent, Notification, NotificationKind};
use tokio::sync::mpsc::error::TryRecvError;

use super::NetPulseApp;

/// How long a notification stays on screen
pub(super) const TOAST_TTL: Duration = Duration::from_secs(5);

/// Most notifications shown at once; older ones are dropped first
const MAX_TOASTS: usize = 5;

/// A notification and when it appeared
pub(crate) struct Toast {
    pub notification: Notification,
    pub shown_at: Instant,
}

impl Toast {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= TOAST_TTL
    }
}

/// Append `notification`, keeping at most [`MAX_TOASTS`]
fn push_toast(toasts: &mut Vec<Toast>, notification: Notification, now: Instant) {
    toasts.push(Toast {
        notification,
        shown_at: now,
    });
    if toasts.len() > MAX_TOASTS {
        let excess = toasts.len() - MAX_TOASTS;
        toasts.drain(..excess);
    }
}

impl NetPulseApp {
    /// Drain dashboard events and expire old toasts
    pub(super) fn process_events(&mut self) {
        let now = Instant::now();
        self.toasts.retain(|toast| !toast.is_expired(now));

        loop {
            let Some(pipeline) = &mut self.pipeline else {
                return;
            };
            let event = match pipeline.event_rx.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.pipeline = None;
                    self.report_err("Dashboard", "Dashboard actor stopped");
                    return;
                }
            };
            self.handle_event(event, now);
        }
    }

    fn handle_event(&mut self, event: DashboardEvent, now: Instant) {
        match event {
            DashboardEvent::Notification(notification) => {
                match notification.kind {
                    NotificationKind::Success => tracing::info!(
                        source = "Notification",
                        "{}: {}",
                        notification.title,
                        notification.description
                    ),
                    NotificationKind::Error => tracing::error!(
                        source = "Notification",
                        "{}: {}",
                        notification.title,
                        notification.description
                    ),
                }
                push_toast(&mut self.toasts, notification, now);
            }
            DashboardEvent::ConnectionChanged { connected: true } => {
                self.report_info("Channel", "Connected");
            }
            DashboardEvent::ConnectionChanged { connected: false } => {
                self.report_warning("Channel", "Disconnected, reconnecting");
            }
            DashboardEvent::CaptureStateChanged { from, to } => {
                tracing::debug!("Capture state {} -> {}", from.label(), to.label());
            }
            DashboardEvent::ExportStarted { path } => {
                self.set_status(format!("Exporting to {}", path.display()));
            }
        }
    }
}
