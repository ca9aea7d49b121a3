//! In-memory transport implementation.
//!
//! This module provides a pure in-process implementation of the domain-level
//! `Transport` trait. It is intended primarily for testing, local execution,
//! and as a reference for transport semantics.
//!
//! ## Reference Semantics
//!
//! The in-memory transport defines the **reference behavior** for the transport
//! layer. The WebSocket transport is expected to approximate this behavior as
//! closely as the network allows.
//!
//! In particular, the in-memory transport establishes the following expectations:
//!
//! - Every successful `connect()` yields a fresh link; old links are never revived.
//! - Frames are delivered in order, in both directions.
//! - A link ends either with an explicit `Closed` event or by its inbox ending.
//!
//! ## Non-Goals
//!
//! This transport does not attempt to emulate network latency, partial writes
//! or TCP-level failure modes. It exists to provide a clear, deterministic
//! baseline against which the session's reconnect and buffering behavior can
//! be validated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::{
    // ---
    log_debug,
    CloseReason,
    Link,
    LinkEvent,
    Result,
    RpcError,
    Transport,
    TransportConfig,
    TransportPtr,
};

fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Shared state between a [`MemoryServer`] and the transports dialing it.
///
/// Simulates a server endpoint within a single process.
///
/// # ⚠️  Testing Only - Subject to Change
///
/// **This type is exposed for integration tests and local experiments.**
/// Production code should use [`TransportBuilder`](crate::TransportBuilder)
/// with a `ws://` endpoint instead.
pub struct MemoryHub {
    // ---
    endpoint: String,
    state: Mutex<HubState>,
    accept_tx: mpsc::UnboundedSender<MemoryPeer>,
    accept_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<MemoryPeer>>,
}

struct HubState {
    accepting: bool,
    attempts: Vec<Instant>,
}

impl MemoryHub {
    /// Create a new, empty hub that accepts connections.
    pub fn new(endpoint: impl Into<String>) -> Arc<Self> {
        // ---
        let (accept_tx, accept_rx) = mpsc::unbounded_channel();

        Arc::new(Self {
            endpoint: endpoint.into(),
            state: Mutex::new(HubState {
                accepting: true,
                attempts: Vec::new(),
            }),
            accept_tx,
            accept_rx: tokio::sync::Mutex::new(accept_rx),
        })
    }

    fn connect(&self) -> Result<Link> {
        // ---
        {
            let mut state = lock_ignore_poison(&self.state);
            state.attempts.push(Instant::now());

            if !state.accepting {
                log_debug!("{}: connection refused", self.endpoint);
                return Err(RpcError::Transport(format!(
                    "connection to {} refused",
                    self.endpoint
                )));
            }
        }

        let (to_server, from_client) = mpsc::unbounded_channel();
        let (to_client, from_server) = mpsc::unbounded_channel();

        let peer = MemoryPeer {
            from_client,
            to_client,
        };

        self.accept_tx
            .send(peer)
            .map_err(|_| RpcError::Transport(format!("{} is gone", self.endpoint)))?;

        log_debug!("{}: connection accepted", self.endpoint);

        Ok(Link {
            outbox: to_server,
            inbox: from_server,
        })
    }
}

/// Server-side handle of one accepted in-memory connection.
pub struct MemoryPeer {
    // ---
    from_client: mpsc::UnboundedReceiver<Bytes>,
    to_client: mpsc::UnboundedSender<LinkEvent>,
}

impl MemoryPeer {
    /// Receive the next frame the client sent.
    ///
    /// Returns `None` once the client dropped its side of the link.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.from_client.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.from_client.try_recv().ok()
    }

    /// Push a frame to the client. Returns false if the client is gone.
    pub fn send(&self, frame: impl Into<Bytes>) -> bool {
        self.to_client.send(LinkEvent::Frame(frame.into())).is_ok()
    }

    /// Close the connection with a code and reason.
    pub fn close(self, code: u16, reason: impl Into<String>) {
        // ---
        let _ = self
            .to_client
            .send(LinkEvent::Closed(CloseReason::new(Some(code), reason)));
    }
}

/// Test-side control of an in-memory endpoint.
#[derive(Clone)]
pub struct MemoryServer {
    hub: Arc<MemoryHub>,
}

impl MemoryServer {
    /// Bind (or re-use) the process-global hub for `endpoint`.
    ///
    /// Transports created through [`create_memory_transport`] with the same
    /// URI connect here.
    pub fn bind(endpoint: &str) -> Self {
        Self {
            hub: global_hub(endpoint),
        }
    }

    /// Wait for the next accepted connection.
    pub async fn accept(&self) -> Option<MemoryPeer> {
        self.hub.accept_rx.lock().await.recv().await
    }

    /// Refuse (`false`) or accept (`true`) new connection attempts.
    pub fn set_accepting(&self, accepting: bool) {
        lock_ignore_poison(&self.hub.state).accepting = accepting;
    }

    /// Number of connection attempts made so far, refused ones included.
    pub fn attempts(&self) -> usize {
        lock_ignore_poison(&self.hub.state).attempts.len()
    }

    /// When each connection attempt happened.
    pub fn attempt_instants(&self) -> Vec<Instant> {
        lock_ignore_poison(&self.hub.state).attempts.clone()
    }
}

/// Process-global hubs used by [`create_memory_transport`], keyed by URI.
static GLOBAL_HUBS: OnceLock<Mutex<HashMap<String, Arc<MemoryHub>>>> = OnceLock::new();

fn global_hub(endpoint: &str) -> Arc<MemoryHub> {
    // ---
    let hubs = GLOBAL_HUBS.get_or_init(|| Mutex::new(HashMap::new()));
    lock_ignore_poison(hubs)
        .entry(endpoint.to_string())
        .or_insert_with(|| MemoryHub::new(endpoint))
        .clone()
}

/// In-memory transport.
///
/// Dials a [`MemoryHub`]; each connection shows up as a [`MemoryPeer`] on the
/// matching [`MemoryServer`].
struct MemoryTransport {
    // ---
    hub: Arc<MemoryHub>,
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    // ---
    fn endpoint(&self) -> &str {
        &self.hub.endpoint
    }

    async fn connect(&self) -> Result<Link> {
        self.hub.connect()
    }
}

/// Create a new in-memory transport using the process-global hub for
/// `config.uri`.
///
/// # Errors
///
/// Currently infallible; always returns `Ok`.
pub async fn create_memory_transport(config: TransportConfig) -> Result<TransportPtr> {
    // ---
    Ok(create_memory_transport_with_hub(global_hub(&config.uri)))
}

/// Create a new in-memory transport dialing the provided hub.
pub fn create_memory_transport_with_hub(hub: Arc<MemoryHub>) -> TransportPtr {
    // ---
    log_debug!("{}: create memory transport", hub.endpoint);
    Arc::new(MemoryTransport { hub })
}

/// Create an isolated transport/server pair.
///
/// Nothing else can dial this server, which keeps parallel tests apart.
pub fn memory_pair(endpoint: impl Into<String>) -> (TransportPtr, MemoryServer) {
    // ---
    let hub = MemoryHub::new(endpoint);
    (
        create_memory_transport_with_hub(hub.clone()),
        MemoryServer { hub },
    )
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        // ---
        let (transport, server) = memory_pair("memory://both-ways");

        let mut link = transport.connect().await.unwrap();
        let mut peer = server.accept().await.unwrap();

        link.outbox.send(Bytes::from_static(b"ping")).unwrap();
        assert_eq!(peer.recv().await.unwrap(), Bytes::from_static(b"ping"));

        assert!(peer.send(Bytes::from_static(b"pong")));
        assert_eq!(
            link.inbox.recv().await.unwrap(),
            LinkEvent::Frame(Bytes::from_static(b"pong"))
        );
    }

    #[tokio::test]
    async fn test_close_is_reported_once() {
        // ---
        let (transport, server) = memory_pair("memory://close");

        let mut link = transport.connect().await.unwrap();
        server.accept().await.unwrap().close(1001, "going away");

        assert_eq!(
            link.inbox.recv().await.unwrap(),
            LinkEvent::Closed(CloseReason::new(Some(1001), "going away"))
        );
        assert!(link.inbox.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_refused_attempts_are_counted() {
        // ---
        let (transport, server) = memory_pair("memory://refuse");
        server.set_accepting(false);

        assert!(transport.connect().await.is_err());
        assert!(transport.connect().await.is_err());
        assert_eq!(server.attempts(), 2);

        let accepted = timeout(Duration::from_millis(20), server.accept()).await;
        assert!(accepted.is_err(), "refused attempt produced a peer");
    }

    #[tokio::test]
    async fn test_global_hub_is_shared_by_uri() {
        // ---
        let server = MemoryServer::bind("memory://global-shared");
        let transport = create_memory_transport(TransportConfig {
            uri: "memory://global-shared".into(),
            subprotocol: "rust-websocket".into(),
            transport_type: None,
        })
        .await
        .unwrap();

        let _link = transport.connect().await.unwrap();
        assert!(server.accept().await.is_some());
        assert_eq!(transport.endpoint(), "memory://global-shared");
    }
}
