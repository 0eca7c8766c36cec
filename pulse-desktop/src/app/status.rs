//! Status messaging and dashboard input helpers

use std::time::Instant;

use pulse_engine::{DashboardInput, UserAction};
use tokio::sync::mpsc::error::TrySendError;

use super::NetPulseApp;

impl NetPulseApp {
    /// Set a status message (also logs as Info via tracing)
    pub(super) fn set_status(&mut self, msg: String) {
        self.status_message = Some((msg.clone(), Instant::now()));
        tracing::info!(source = "Status", "{}", msg);
    }

    /// Report an info message via tracing
    pub(super) fn report_info(&mut self, source: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(source = source, "{}", message);
    }

    /// Report a warning via tracing (shows in console and status bar)
    pub(super) fn report_warning(&mut self, source: &str, message: impl Into<String>) {
        let message = message.into();
        self.status_message = Some((format!("{}: {}", source, message), Instant::now()));
        tracing::warn!(source = source, "{}", message);
    }

    /// Report an error via tracing (shows in console and status bar)
    pub(super) fn report_err(&mut self, source: &str, message: impl Into<String>) {
        let message = message.into();
        self.status_message = Some((format!("{}: {}", source, message), Instant::now()));
        tracing::error!(source = source, "{}", message);
    }

    /// Handle a settings save error
    pub(super) fn handle_save_error(&mut self, error: String) {
        self.report_err("Settings", error);
    }

    /// Queue a user action for the dashboard actor, logging if the queue is full
    pub(super) fn send_user_action(&mut self, action: UserAction, context: &str) {
        let Some(pipeline) = &self.pipeline else {
            self.report_warning("Dashboard", format!("{} ignored: dashboard not running", context));
            return;
        };

        match pipeline.input_tx.try_send(DashboardInput::User(action)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.report_warning(
                    "Dashboard",
                    format!("Failed to send {}: queue full", context),
                );
            }
            Err(TrySendError::Closed(_)) => {
                self.report_err(
                    "Dashboard",
                    format!("Failed to send {}: dashboard actor not running", context),
                );
            }
        }
    }
}
