//! WebSocket push channel

use futures_util::StreamExt;
use pulse_engine::{Connection, Transport, TransportError};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

/// Opens WebSocket channels with `tokio-tungstenite`
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

/// One open WebSocket
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Transport for WsTransport {
    type Connection = WsConnection;

    async fn connect(&self, url: &str) -> Result<WsConnection, TransportError> {
        let (stream, response) =
            connect_async(url)
                .await
                .map_err(|e| TransportError::Connect {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
        debug!("WebSocket handshake with {} returned {}", url, response.status());
        Ok(WsConnection { stream })
    }
}

/// What a received WebSocket message means to the push channel
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    /// A frame for the decoder
    Text(String),
    /// Nothing to decode; keep reading
    Skip,
    /// The peer closed the channel
    Closed,
}

fn classify(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text.to_string()),
        // Some servers send JSON in binary frames
        Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Frame::Text(text),
            Err(e) => {
                warn!("Dropping binary frame with invalid UTF-8: {}", e);
                Frame::Skip
            }
        },
        Message::Close(frame) => {
            debug!("WebSocket closed by peer: {:?}", frame);
            Frame::Closed
        }
        // Control frames are answered by tungstenite itself
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Frame::Skip,
    }
}

impl Connection for WsConnection {
    async fn next_message(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(TransportError::Read(e.to_string()))),
            };

            match classify(message) {
                Frame::Text(text) => return Some(Ok(text)),
                Frame::Skip => continue,
                Frame::Closed => return None,
            }
        }
    }
}
