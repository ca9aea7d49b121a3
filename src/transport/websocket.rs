//! WebSocket transport (tokio-tungstenite).
//!
//! Connects to a fixed endpoint, negotiates the configured subprotocol and
//! exchanges binary frames only. Each `connect()` performs a fresh handshake;
//! the resulting socket is split into a reader task feeding `Link::inbox`
//! and a writer task draining `Link::outbox`.

use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;

use crate::{
    // ---
    log_debug,
    log_warn,
    CloseReason,
    Link,
    LinkEvent,
    Result,
    RpcError,
    Transport,
    TransportConfig,
    TransportPtr,
};

/// Default endpoint of the music server.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:2794";

/// Default subprotocol the server insists on.
pub const DEFAULT_SUBPROTOCOL: &str = "rust-websocket";

struct WebSocketTransport {
    // ---
    uri: String,
    subprotocol: String,
}

#[async_trait::async_trait]
impl Transport for WebSocketTransport {
    // ---
    fn endpoint(&self) -> &str {
        &self.uri
    }

    async fn connect(&self) -> Result<Link> {
        // ---
        let mut request = self
            .uri
            .as_str()
            .into_client_request()
            .map_err(|e| RpcError::Transport(format!("invalid endpoint {}: {e}", self.uri)))?;

        let protocol = HeaderValue::from_str(&self.subprotocol)
            .map_err(|e| RpcError::Transport(format!("invalid subprotocol: {e}")))?;
        request
            .headers_mut()
            .insert("Sec-WebSocket-Protocol", protocol);

        let (ws, _response) = connect_async(request)
            .await
            .map_err(|e| RpcError::Transport(format!("connect {}: {e}", self.uri)))?;

        log_debug!("{}: websocket handshake complete", self.uri);

        let (mut sink, mut stream) = ws.split();

        let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<Bytes>();
        let (inbox_tx, inbox) = mpsc::unbounded_channel::<LinkEvent>();

        // Writer: drains the outbox in order. Pongs are queued by tungstenite
        // itself and go out with the next read or write.
        let uri = self.uri.clone();
        tokio::spawn(async move {
            while let Some(frame) = outbox_rx.recv().await {
                if let Err(_err) = sink.send(WsMessage::Binary(frame)).await {
                    log_warn!("{uri}: write failed: {_err}");
                    log_debug!("{uri}: writer stopped");
                    return;
                }
            }
            // Session dropped the link.
            let _ = sink.send(WsMessage::Close(None)).await;
            log_debug!("{uri}: writer stopped");
        });

        // Reader: forwards binary frames and the final close.
        let uri = self.uri.clone();
        tokio::spawn(async move {
            let reason = loop {
                match stream.next().await {
                    Some(Ok(WsMessage::Binary(data))) => {
                        if inbox_tx.send(LinkEvent::Frame(data)).is_err() {
                            // Nobody is listening anymore.
                            return;
                        }
                    }
                    Some(Ok(WsMessage::Ping(_)))
                    | Some(Ok(WsMessage::Pong(_)))
                    | Some(Ok(WsMessage::Frame(_))) => {}
                    Some(Ok(WsMessage::Text(_text))) => {
                        log_warn!("{uri}: ignoring text frame ({} bytes)", _text.len());
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        break match frame {
                            Some(frame) => CloseReason::new(
                                Some(u16::from(frame.code)),
                                frame.reason.as_str(),
                            ),
                            None => CloseReason::new(None, "closed by server"),
                        };
                    }
                    Some(Err(e)) => break CloseReason::new(None, e.to_string()),
                    None => break CloseReason::new(None, "stream ended"),
                }
            };

            let _ = inbox_tx.send(LinkEvent::Closed(reason));
        });

        Ok(Link { outbox, inbox })
    }
}

/// Create a WebSocket transport for `config.uri`.
///
/// No connection is made here; the session's connection manager calls
/// `connect()` and keeps retrying.
///
/// # Errors
///
/// Returns `RpcError::MissingConfig` if the URI or subprotocol is empty.
pub async fn create_websocket_transport(config: TransportConfig) -> Result<TransportPtr> {
    // ---
    if config.uri.is_empty() {
        return Err(RpcError::MissingConfig("uri".into()));
    }
    if config.subprotocol.is_empty() {
        return Err(RpcError::MissingConfig("subprotocol".into()));
    }

    log_debug!("{}: create websocket transport", config.uri);

    Ok(Arc::new(WebSocketTransport {
        uri: config.uri,
        subprotocol: config.subprotocol,
    }))
}
