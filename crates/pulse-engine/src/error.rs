//! Error types for the dashboard engine

use pulse_protocol::ProtocolError;
use thiserror::Error;

/// Failures of the push channel
///
/// Any of these ends the current connection; the connection manager then
/// schedules a reconnect.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be established
    #[error("connect to {url} failed: {reason}")]
    Connect {
        /// Channel address
        url: String,
        /// Underlying cause
        reason: String,
    },

    /// The connection broke while reading
    #[error("channel read failed: {0}")]
    Read(String),
}

/// Failures of a session-control request
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-success status
    #[error("backend returned HTTP {0}")]
    Status(u16),

    /// The request could not be sent or timed out
    #[error("request failed: {0}")]
    Request(String),

    /// The response body was not a usable session
    #[error("unusable response body: {0}")]
    Decode(#[from] ProtocolError),

    /// Writing a download to disk failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err.to_string())
    }
}

/// Failures of a session lifecycle operation
///
/// Each variant names the operation so notifications can say what failed.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Creating a session failed
    #[error("failed to create new session: {0}")]
    CreateFailed(#[source] ApiError),

    /// Starting capture failed
    #[error("failed to start packet capture: {0}")]
    StartFailed(#[source] ApiError),

    /// Stopping capture failed
    #[error("failed to stop packet capture: {0}")]
    StopFailed(#[source] ApiError),
}

impl SessionError {
    /// Description shown to the user when this error is reported
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionError::CreateFailed(_) => "Failed to create new session",
            SessionError::StartFailed(_) => "Failed to start packet capture",
            SessionError::StopFailed(_) => "Failed to stop packet capture",
        }
    }
}

/// An unusable backend origin
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// The origin has no `scheme://` prefix
    #[error("origin has no scheme: {0}")]
    MissingScheme(String),

    /// The scheme is neither http nor https
    #[error("unsupported scheme {0} (expected http or https)")]
    UnsupportedScheme(String),

    /// Nothing follows the scheme
    #[error("origin has no host")]
    EmptyHost,
}
