// src/domain/transport.rs

//! Transport domain abstractions.
//!
//! This module defines the domain-level transport interface used by the
//! session layer to exchange binary frames with the server. It intentionally
//! avoids any reference to concrete protocols or client libraries.
//!
//! The transport layer is responsible only for establishing a connection and
//! moving opaque frames across it. Higher-level semantics such as correlation,
//! buffering while disconnected, and reconnection are handled by the session.
//!
//! Concrete implementations of this interface live under `src/transport/`.
use crate::Result;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

/// Configuration for creating a transport instance.
///
/// Passed to transport factory functions (`create_*_transport()`).
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Endpoint URI (e.g. `"ws://localhost:2794"`, `"memory://music"`).
    pub uri: String,
    /// Subprotocol negotiated during the handshake.
    pub subprotocol: String,
    /// Optional transport type override (`"websocket"`, `"memory"`).
    /// If `None`, the URI scheme decides.
    pub transport_type: Option<String>,
}

/// Why a connection ended.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CloseReason {
    /// Close code reported by the peer, if any.
    pub code: Option<u16>,
    /// Free-form diagnostic.
    pub reason: String,
}

impl CloseReason {
    pub fn new(code: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        match self.code {
            Some(code) => write!(f, "code {code}: {}", self.reason),
            None => write!(f, "no code: {}", self.reason),
        }
    }
}

/// An event delivered by a live connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    /// A binary frame from the server.
    Frame(Bytes),
    /// The connection closed or failed.
    Closed(CloseReason),
}

/// One live transport connection.
///
/// A `Link` is never reused: once its inbox reports [`LinkEvent::Closed`]
/// (or simply ends), the owner discards it and asks the transport for a new
/// one.
///
/// Dropping `outbox` asks the transport to close the connection.
pub struct Link {
    // ---
    /// Frames to transmit, in order.
    pub outbox: mpsc::UnboundedSender<Bytes>,

    /// Frames and the final close notification, in arrival order.
    pub inbox: mpsc::UnboundedReceiver<LinkEvent>,
}

/// Transport abstraction.
///
/// A `Transport` knows how to reach one fixed endpoint and hands out a fresh
/// [`Link`] for each successful connection attempt.
///
/// Implementations must ensure that:
/// - frames pushed into `Link::outbox` are written in order
/// - inbound frames are delivered to `Link::inbox` in arrival order
/// - a close or error is reported at most once per link
///
/// The in-memory transport serves as the reference implementation of these
/// semantics.
///
/// # Available Implementations
///
/// - `create_memory_transport` - In-memory transport (always available)
/// - `create_websocket_transport` - WebSocket client over tokio-tungstenite
///
/// # Notes
///
/// This trait uses `async_trait`; the expanded documentation may show explicit
/// lifetimes and a boxed `Future`. This is an implementation detail; consumers
/// should treat methods as normal `async fn`s.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    // ---
    /// Endpoint this transport connects to, for logging.
    fn endpoint(&self) -> &str;

    /// Open a new connection.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Transport` if the connection cannot be established.
    async fn connect(&self) -> Result<Link>;
}

/// Shared transport pointer.
///
/// This is an `Arc<dyn Transport>`, which means:
/// - `.clone()` is cheap (only increments a reference count)
/// - Used to erase concrete transport types behind a stable domain interface.
pub type TransportPtr = Arc<dyn Transport>;

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_close_reason_display() {
        // ---
        let reason = CloseReason::new(Some(1006), "abnormal closure");
        assert_eq!(reason.to_string(), "code 1006: abnormal closure");
        assert_eq!(CloseReason::new(None, "eof").to_string(), "no code: eof");
    }
}
