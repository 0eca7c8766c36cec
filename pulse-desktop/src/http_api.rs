//! Session control over the backend's REST endpoints

use std::path::Path;
use std::time::Duration;

use pulse_engine::{ApiError, Endpoint, SessionApi};
use pulse_protocol::{decode_session, Session, SessionId};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
struct CreateSessionBody<'a> {
    name: &'a str,
}

fn request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Request(format!("timed out: {}", err))
    } else {
        ApiError::Request(err.to_string())
    }
}

/// Reject anything outside the 2xx range
fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status(status.as_u16()))
    }
}

/// [`SessionApi`] backed by HTTP requests to a capture server
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    endpoint: Endpoint,
}

impl HttpApi {
    /// Build a client for `endpoint`; every request is bounded by `timeout`
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(request_error)?;
        Ok(Self { client, endpoint })
    }

    async fn post_empty(&self, url: String) -> Result<(), ApiError> {
        debug!("POST {}", url);
        let response = self.client.post(&url).send().await.map_err(request_error)?;
        check_status(response)?;
        Ok(())
    }
}

impl SessionApi for HttpApi {
    async fn create_session(&self, name: &str) -> Result<Session, ApiError> {
        let url = self.endpoint.sessions_url();
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(&CreateSessionBody { name })
            .send()
            .await
            .map_err(request_error)?;
        let body = check_status(response)?
            .text()
            .await
            .map_err(request_error)?;
        Ok(decode_session(&body)?)
    }

    async fn start_capture(&self, id: &SessionId) -> Result<(), ApiError> {
        self.post_empty(self.endpoint.start_url(id)).await
    }

    async fn stop_capture(&self, id: &SessionId) -> Result<(), ApiError> {
        self.post_empty(self.endpoint.stop_url(id)).await
    }

    async fn export_session(&self, id: &SessionId, destination: &Path) -> Result<u64, ApiError> {
        let url = self.endpoint.export_url(id);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await.map_err(request_error)?;
        let body = check_status(response)?
            .bytes()
            .await
            .map_err(request_error)?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &body).await?;
        Ok(body.len() as u64)
    }
}
