//! Shared fakes for unit tests

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use pulse_protocol::{Session, SessionId};

use crate::error::ApiError;
use crate::session::SessionApi;

/// Counts requests and fails on demand
#[derive(Default)]
pub struct FakeApi {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeApi {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn result(&self) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            Err(ApiError::Status(500))
        } else {
            Ok(())
        }
    }
}

impl SessionApi for FakeApi {
    async fn create_session(&self, name: &str) -> Result<Session, ApiError> {
        self.result()?;
        Ok(Session::new("s1", name))
    }

    async fn start_capture(&self, _id: &SessionId) -> Result<(), ApiError> {
        self.result()
    }

    async fn stop_capture(&self, _id: &SessionId) -> Result<(), ApiError> {
        self.result()
    }

    async fn export_session(&self, _id: &SessionId, _dest: &Path) -> Result<u64, ApiError> {
        self.result().map(|_| 0)
    }
}
