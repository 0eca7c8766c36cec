//! Errors raised while wiring the dashboard to a backend

use pulse_engine::{ApiError, EndpointError};
use thiserror::Error;

/// Why the dashboard pipeline could not be started
#[derive(Debug, Error)]
pub enum StartupError {
    /// The configured server origin is unusable
    #[error("invalid server origin: {0}")]
    Origin(#[from] EndpointError),

    /// The HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] ApiError),
}
