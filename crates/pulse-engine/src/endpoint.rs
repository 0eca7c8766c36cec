//! Backend addresses derived from the configured origin

use std::fmt;

use pulse_protocol::SessionId;

use crate::error::EndpointError;

/// Path of the push channel on the backend
pub const CHANNEL_PATH: &str = "/ws";

/// A validated backend origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    secure: bool,
    host: String,
}

impl Endpoint {
    /// Parse `http://host[:port]` or `https://host[:port]`
    ///
    /// Any path after the host is ignored.
    pub fn from_origin(origin: &str) -> Result<Self, EndpointError> {
        let origin = origin.trim();
        let (scheme, rest) = origin
            .split_once("://")
            .ok_or_else(|| EndpointError::MissingScheme(origin.to_string()))?;

        let secure = match scheme.to_ascii_lowercase().as_str() {
            "http" => false,
            "https" => true,
            other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
        };

        let host = rest.split('/').next().unwrap_or_default();
        if host.is_empty() {
            return Err(EndpointError::EmptyHost);
        }

        Ok(Self {
            secure,
            host: host.to_string(),
        })
    }

    /// Whether the origin uses TLS
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// HTTP origin, without trailing slash
    pub fn origin(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.host)
    }

    /// Push-channel address: `wss://` for https origins, `ws://` otherwise
    pub fn channel_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}{}", scheme, self.host, CHANNEL_PATH)
    }

    /// Session collection address
    pub fn sessions_url(&self) -> String {
        format!("{}/api/sessions", self.origin())
    }

    /// Start-capture address for a session
    pub fn start_url(&self, id: &SessionId) -> String {
        format!("{}/{}/start", self.sessions_url(), id)
    }

    /// Stop-capture address for a session
    pub fn stop_url(&self, id: &SessionId) -> String {
        format!("{}/{}/stop", self.sessions_url(), id)
    }

    /// Full-session export address
    pub fn export_url(&self, id: &SessionId) -> String {
        format!("{}/{}/export", self.sessions_url(), id)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.origin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_scheme_follows_origin() {
        let plain = Endpoint::from_origin("http://127.0.0.1:5000").unwrap();
        assert_eq!(plain.channel_url(), "ws://127.0.0.1:5000/ws");

        let secure = Endpoint::from_origin("https://capture.example.net/").unwrap();
        assert_eq!(secure.channel_url(), "wss://capture.example.net/ws");
        assert!(secure.is_secure());
    }

    #[test]
    fn test_api_urls() {
        let endpoint = Endpoint::from_origin("http://localhost:5000/dashboard").unwrap();
        let id = SessionId::new("42");
        assert_eq!(endpoint.sessions_url(), "http://localhost:5000/api/sessions");
        assert_eq!(
            endpoint.start_url(&id),
            "http://localhost:5000/api/sessions/42/start"
        );
        assert_eq!(
            endpoint.stop_url(&id),
            "http://localhost:5000/api/sessions/42/stop"
        );
        assert_eq!(
            endpoint.export_url(&id),
            "http://localhost:5000/api/sessions/42/export"
        );
    }

    #[test]
    fn test_invalid_origins() {
        assert_eq!(
            Endpoint::from_origin("localhost:5000"),
            Err(EndpointError::MissingScheme("localhost:5000".into()))
        );
        assert_eq!(
            Endpoint::from_origin("ftp://host"),
            Err(EndpointError::UnsupportedScheme("ftp".into()))
        );
        assert_eq!(Endpoint::from_origin("http://"), Err(EndpointError::EmptyHost));
    }
}
