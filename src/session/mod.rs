//! The session: one connection manager, one request registry, one outbound
//! buffer and one broadcast dispatcher per server endpoint.
//!
//! A [`Session`] is a cheap handle (`Arc` inside). Every clone talks to the
//! same connection. The connection task only holds a weak reference, so
//! dropping the last handle stops it.
//!
//! Requests are tagged with a fresh [`CorrelationId`], registered, encoded
//! and then either written to the live link or buffered until the next one.
//! Answers are matched back by id exactly once; pushes under the broadcast
//! id go to every listener.

mod broadcast;
mod connection;
mod dispatch;
mod outbound;
mod registry;

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::protocol::{Action, CodecPtr, JsonCodec, Request, Transition};
use crate::{
    // ---
    log_debug,
    log_error,
    log_info,
    log_warn,
    CorrelationId,
    Result,
    RpcError,
    SessionConfig,
    TransportPtr,
};

pub use broadcast::{Listener, ListenerHandle};
pub use outbound::ConnectionState;

use broadcast::BroadcastDispatcher;
use outbound::{Delivery, Outbound};
use registry::{ReplyReceiver, RequestRegistry};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The eventual outcome of one request.
///
/// Resolves to the unwrapped answer payload (`Value::Null` for unit
/// answers) or an [`RpcError`]. The request is already issued when the
/// `Reply` is returned; awaiting it only waits for the answer.
pub type Reply = BoxFuture<'static, Result<Value>>;

/// Acquire mutex guard, ignoring poisoning
pub(crate) fn lock_ignore_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A registered request that has not been answered yet.
pub(crate) struct PendingTicket {
    pub(crate) id: CorrelationId,
    pub(crate) ticket: u64,
    rx: ReplyReceiver,
}

/// Client session with one server endpoint.
///
/// # Example
///
/// ```no_run
/// use hex_rpc::{Session, SessionConfig, TransportBuilder};
///
/// # async fn example() -> hex_rpc::Result<()> {
/// let transport = TransportBuilder::new()
///     .uri("ws://localhost:2794")
///     .build()
///     .await?;
///
/// let session = Session::open(transport, SessionConfig::new("player"));
/// let playlists = session.get_playlists().await?;
/// println!("{playlists}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    // ---
    label: String,
    config: SessionConfig,
    codec: CodecPtr,
    endpoint: String,

    registry: Mutex<RequestRegistry>,
    outbound: Mutex<Outbound>,
    broadcast: Arc<BroadcastDispatcher>,
    attempts: AtomicUsize,

    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn new(endpoint: &str, config: SessionConfig, codec: CodecPtr) -> Self {
        // ---
        Self {
            label: config.name.clone(),
            registry: Mutex::new(RequestRegistry::new(config.id_strategy)),
            outbound: Mutex::new(Outbound::new()),
            broadcast: BroadcastDispatcher::new(),
            attempts: AtomicUsize::new(0),
            shutdown: CancellationToken::new(),
            task: Mutex::new(None),
            endpoint: endpoint.to_string(),
            config,
            codec,
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl Session {
    /// Open a session with the JSON codec.
    ///
    /// Returns immediately; the connection is established in the
    /// background and re-established after every close. Requests issued
    /// before the first connection are buffered.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn open(transport: TransportPtr, config: SessionConfig) -> Self {
        Self::open_with_codec(transport, config, Arc::new(JsonCodec))
    }

    /// Open a session with a custom codec.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn open_with_codec(
        transport: TransportPtr,
        config: SessionConfig,
        codec: CodecPtr,
    ) -> Self {
        // ---
        let inner = Arc::new(Inner::new(transport.endpoint(), config, codec));

        log_info!(label: inner.label, "opening session to {}", inner.endpoint);

        let handle = tokio::spawn(connection::run(
            Arc::downgrade(&inner),
            transport,
            inner.shutdown.clone(),
        ));
        *lock_ignore_poison(&inner.task) = Some(handle);

        Self { inner }
    }

    /// Issue `request` under a fresh correlation id.
    ///
    /// The request is registered and either written or buffered before this
    /// returns. If the codec refuses it, nothing is sent and the reply
    /// resolves to [`RpcError::Serialization`].
    pub fn request(&self, request: Request) -> Reply {
        self.request_with_id(None, &request)
    }

    /// Issue `request` and deserialize the answer payload into `T`.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`request`](Self::request), resolves to
    /// [`RpcError::Decode`] if the payload does not fit `T`.
    pub fn request_as<T>(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<T>> + Send + 'static
    where
        T: DeserializeOwned + Send + 'static,
    {
        // ---
        let reply = self.request(request);
        async move {
            let value = reply.await?;
            serde_json::from_value(value).map_err(|e| RpcError::Decode(e.to_string()))
        }
    }

    /// Issue `request` under `id`, or under a fresh id when `None`.
    ///
    /// Re-using an id that is still pending replaces the older entry; the
    /// older caller is not answered.
    pub(crate) fn request_with_id(&self, id: Option<CorrelationId>, request: &Request) -> Reply {
        // ---
        let pending = match self.register(id, request.variant_name()) {
            Ok(pending) => pending,
            Err(err) => return Box::pin(std::future::ready(Err(err))),
        };

        self.transmit(pending.id, pending.ticket, request);
        self.reply(pending)
    }

    /// Draw a correlation id that is not currently outstanding.
    pub(crate) fn next_id(&self) -> CorrelationId {
        lock_ignore_poison(&self.inner.registry).next_id()
    }

    /// Register a pending entry expecting `expected` as its answer variant.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::SessionClosed`] once [`close`](Self::close) ran.
    pub(crate) fn register(
        &self,
        id: Option<CorrelationId>,
        expected: &'static str,
    ) -> Result<PendingTicket> {
        // ---
        let (id, ticket, rx, superseded) = {
            let mut registry = lock_ignore_poison(&self.inner.registry);

            // checked under the registry lock so close() cannot miss us
            if self.inner.shutdown.is_cancelled() {
                return Err(RpcError::SessionClosed);
            }

            let id = id.unwrap_or_else(|| registry.next_id());
            let (ticket, rx, superseded) = registry.register(id, expected);
            (id, ticket, rx, superseded)
        };

        if let Some(_previous) = superseded {
            log_debug!(
                label: self.inner.label,
                "request {id}: pending {_previous} superseded by {expected}"
            );
        }

        Ok(PendingTicket { id, ticket, rx })
    }

    /// Encode and send (or buffer) a registered request.
    ///
    /// An encode failure rejects the pending entry with
    /// [`RpcError::Serialization`] and sends nothing. Once the session is
    /// closed the request is rejected with [`RpcError::SessionClosed`]
    /// instead of being buffered.
    pub(crate) fn transmit(&self, id: CorrelationId, ticket: u64, request: &Request) {
        // ---
        let frame = match self.inner.codec.encode_request(id, request) {
            Ok(frame) => frame,
            Err(err) => {
                let err = match err {
                    RpcError::Serialization(msg) => RpcError::Serialization(msg),
                    other => RpcError::Serialization(other.to_string()),
                };
                log_error!(
                    label: self.inner.label,
                    "could not encode {} request {id}: {err}",
                    request.variant_name()
                );
                self.reject(id, ticket, err);
                return;
            }
        };

        let delivery = {
            let mut outbound = lock_ignore_poison(&self.inner.outbound);
            // checked under the outbound lock so nothing lands after shutdown()
            if self.inner.shutdown.is_cancelled() {
                None
            } else {
                Some(outbound.send(id, frame))
            }
        };

        let Some(delivery) = delivery else {
            log_debug!(
                label: self.inner.label,
                "dropping {} request {id}: session closed",
                request.variant_name()
            );
            self.reject(id, ticket, RpcError::SessionClosed);
            return;
        };

        if delivery == Delivery::Buffered {
            log_debug!(
                label: self.inner.label,
                "buffered {} request {id} until connected",
                request.variant_name()
            );
        }
    }

    /// Reject a pending entry if it is still the registration `ticket`.
    pub(crate) fn reject(&self, id: CorrelationId, ticket: u64, err: RpcError) {
        // ---
        let pending = lock_ignore_poison(&self.inner.registry).remove_if(&id, ticket);
        if let Some(pending) = pending {
            pending.reject(err);
        }
    }

    /// Turn a pending entry into the future its caller awaits.
    pub(crate) fn reply(&self, pending: PendingTicket) -> Reply {
        // ---
        let PendingTicket { id, ticket, mut rx } = pending;
        let shutdown = self.inner.shutdown.clone();
        let timeout = self.inner.config.request_timeout;
        let inner = Arc::downgrade(&self.inner);

        Box::pin(async move {
            let Some(limit) = timeout else {
                return wait_for_answer(rx, &shutdown).await;
            };

            tokio::select! {
                outcome = &mut rx => settle_received(outcome, &shutdown).await,
                _ = tokio::time::sleep(limit) => {
                    if expire(&inner, &id, ticket) {
                        Err(RpcError::Timeout)
                    } else {
                        // already taken by an answer or by close()
                        wait_for_answer(rx, &shutdown).await
                    }
                }
            }
        })
    }

    /// Register a listener for server pushes.
    ///
    /// Listeners run in registration order on the connection task and must
    /// not block.
    pub fn subscribe<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&Action) + Send + Sync + 'static,
    {
        self.inner.broadcast.subscribe(Arc::new(listener))
    }

    /// Register a listener that only sees [`Transition`] pushes.
    pub fn on_transition<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&Transition) + Send + Sync + 'static,
    {
        // ---
        self.subscribe(move |action: &Action| {
            if let Some(transition) = action.as_transition() {
                listener(transition);
            }
        })
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        lock_ignore_poison(&self.inner.outbound).state()
    }

    /// Whether a link is currently open.
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Connection attempts made so far, failed ones included.
    pub fn connection_attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Requests still waiting for an answer.
    pub fn pending_requests(&self) -> usize {
        lock_ignore_poison(&self.inner.registry).len()
    }

    /// Requests waiting for a link to be written to.
    pub fn buffered_requests(&self) -> usize {
        lock_ignore_poison(&self.inner.outbound).buffered_len()
    }

    /// Endpoint of the underlying transport.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Log label of this session.
    pub fn name(&self) -> &str {
        &self.inner.label
    }

    /// Close the session.
    ///
    /// Stops the connection manager, drops the live link and the outbound
    /// buffer, and rejects every pending request with
    /// [`RpcError::SessionClosed`]. Requests issued afterwards fail the same
    /// way. Closing twice is harmless.
    pub async fn close(&self) {
        // ---
        self.inner.shutdown.cancel();

        let task = lock_ignore_poison(&self.inner.task).take();
        if let Some(task) = task {
            if let Err(_err) = task.await {
                log_warn!(label: self.inner.label, "connection task ended abnormally: {_err}");
            }
        }

        let _dropped = lock_ignore_poison(&self.inner.outbound).shutdown();
        let pending = lock_ignore_poison(&self.inner.registry).drain();
        let _rejected = pending.len();

        for entry in pending {
            entry.reject(RpcError::SessionClosed);
        }

        log_info!(
            label: self.inner.label,
            "session closed ({} pending rejected, {} buffered dropped)",
            _rejected,
            _dropped.len()
        );
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // ---
        f.debug_struct("Session")
            .field("name", &self.inner.label)
            .field("endpoint", &self.inner.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

/// Remove a timed-out entry. Returns false if it was no longer registered.
fn expire(inner: &Weak<Inner>, id: &CorrelationId, ticket: u64) -> bool {
    // ---
    let Some(inner) = inner.upgrade() else {
        return false;
    };

    let expired = lock_ignore_poison(&inner.registry).remove_if(id, ticket).is_some();
    if expired {
        // a timed-out request must not reach the server on the next connect
        let _dropped = lock_ignore_poison(&inner.outbound).discard(id);
        log_warn!(
            label: inner.label,
            "request {id} timed out ({_dropped} buffered frame(s) dropped)"
        );
    }
    expired
}

async fn wait_for_answer(rx: ReplyReceiver, shutdown: &CancellationToken) -> Result<Value> {
    settle_received(rx.await, shutdown).await
}

/// A dropped sender means the entry was superseded or the session went
/// away; either way the caller is only released by shutdown.
async fn settle_received(
    received: std::result::Result<Result<Value>, tokio::sync::oneshot::error::RecvError>,
    shutdown: &CancellationToken,
) -> Result<Value> {
    // ---
    match received {
        Ok(outcome) => outcome,
        Err(_) => {
            shutdown.cancelled().await;
            Err(RpcError::SessionClosed)
        }
    }
}
