use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::correlation::IdGenerator;
use crate::protocol::Body;
use crate::{CorrelationId, IdStrategy, Result, RpcError};

pub(crate) type ReplySender = oneshot::Sender<Result<Value>>;
pub(crate) type ReplyReceiver = oneshot::Receiver<Result<Value>>;

/// One request waiting for its answer.
pub(crate) struct PendingRequest {
    // ---
    /// Variant name the request was sent as.
    expected: &'static str,
    /// Distinguishes successive registrations under the same id.
    ticket: u64,
    reply: ReplySender,
}

impl PendingRequest {
    /// Resolve or reject according to the answer body.
    ///
    /// A bare string that differs from the expected variant is the server's
    /// error message. A bare string equal to it is a unit answer. A tagged
    /// action resolves with its unwrapped payload.
    ///
    /// Returns false if the caller no longer waits for the reply.
    pub(crate) fn settle(self, body: Body) -> bool {
        // ---
        let outcome = match body {
            Body::Bare(message) if message != self.expected => Err(RpcError::Remote(message)),
            Body::Bare(_) => Ok(Value::Null),
            Body::Action(action) => Ok(action.into_payload()),
        };
        self.reply.send(outcome).is_ok()
    }

    pub(crate) fn reject(self, err: RpcError) -> bool {
        self.reply.send(Err(err)).is_ok()
    }

    pub(crate) fn expected(&self) -> &'static str {
        self.expected
    }
}

/// Tracks pending requests waiting for answers
///
/// Uses a HashMap to map correlation IDs to oneshot channels.
/// When an answer arrives, the entry is removed and the channel delivers the
/// outcome to the waiting future, so each request completes at most once.
pub(crate) struct RequestRegistry {
    // ---
    requests: HashMap<CorrelationId, PendingRequest>,
    ids: IdGenerator,
    next_ticket: u64,
}

impl RequestRegistry {
    // ---

    /// Create a new empty registry
    pub(crate) fn new(strategy: IdStrategy) -> Self {
        // ---
        Self {
            requests: HashMap::new(),
            ids: IdGenerator::new(strategy),
            next_ticket: 0,
        }
    }

    /// A fresh id that is not outstanding and is not the broadcast sentinel.
    pub(crate) fn next_id(&mut self) -> CorrelationId {
        // ---
        let requests = &self.requests;
        self.ids.next_id(|id| requests.contains_key(id))
    }

    /// Register a pending request under `id`.
    ///
    /// An existing entry for the same id is replaced; its caller is left
    /// waiting without an answer. Returns the ticket of the new entry and the
    /// receiver its answer is delivered on.
    pub(crate) fn register(
        &mut self,
        id: CorrelationId,
        expected: &'static str,
    ) -> (u64, ReplyReceiver, Option<&'static str>) {
        // ---
        debug_assert!(!id.is_broadcast(), "broadcast id registered as request");

        let (tx, rx) = oneshot::channel();
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let previous = self.requests.insert(
            id,
            PendingRequest {
                expected,
                ticket,
                reply: tx,
            },
        );

        (ticket, rx, previous.map(|p| p.expected))
    }

    /// Remove and return the entry for `id`.
    pub(crate) fn take(&mut self, id: &CorrelationId) -> Option<PendingRequest> {
        // ---
        self.requests.remove(id)
    }

    /// Remove the entry for `id` only if it is still the registration
    /// identified by `ticket`.
    pub(crate) fn remove_if(&mut self, id: &CorrelationId, ticket: u64) -> Option<PendingRequest> {
        // ---
        match self.requests.get(id) {
            Some(p) if p.ticket == ticket => self.requests.remove(id),
            _ => None,
        }
    }

    /// Remove every entry, leaving the registry empty.
    pub(crate) fn drain(&mut self) -> Vec<PendingRequest> {
        // ---
        self.requests.drain().map(|(_, pending)| pending).collect()
    }

    /// Get the number of pending requests
    pub(crate) fn len(&self) -> usize {
        self.requests.len()
    }
}
