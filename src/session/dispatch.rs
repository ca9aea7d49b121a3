//! Routing of inbound frames.

#![cfg_attr(not(feature = "logging"), allow(unused_variables))]

use crate::protocol::Body;
use crate::{log_debug, log_warn};

use super::{lock_ignore_poison, Inner};

/// What became of one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Dispatched {
    /// Matched a pending request, which is now settled.
    Settled,
    /// Carried the broadcast id and went to the listeners.
    Broadcast,
    /// No pending request for this id.
    Unmatched,
    /// The codec could not make sense of the frame.
    Undecodable,
}

impl Inner {
    /// Decode one frame and route it.
    ///
    /// Runs on the connection task, one frame at a time. Nothing here can
    /// fail the connection: bad frames and stray answers are logged and
    /// dropped.
    pub(super) fn dispatch(&self, frame: &[u8]) -> Dispatched {
        // ---
        let answer = match self.codec.decode_answer(frame) {
            Ok(answer) => answer,
            Err(err) => {
                log_warn!(
                    label: self.label,
                    "dropping undecodable frame ({} bytes): {err}",
                    frame.len()
                );
                return Dispatched::Undecodable;
            }
        };

        if answer.id.is_broadcast() {
            match answer.body {
                Body::Action(action) => self.broadcast.publish(&self.label, &action),
                Body::Bare(text) => {
                    log_warn!(label: self.label, "broadcast without payload: {text}");
                }
            }
            return Dispatched::Broadcast;
        }

        // removed under the lock, settled outside it
        let pending = lock_ignore_poison(&self.registry).take(&answer.id);

        match pending {
            Some(pending) => {
                let expected = pending.expected();
                if !pending.settle(answer.body) {
                    log_debug!(
                        label: self.label,
                        "{expected} answer {} arrived after its caller left",
                        answer.id
                    );
                }
                Dispatched::Settled
            }
            None => {
                log_warn!(label: self.label, "answer without request: {}", answer.id);
                Dispatched::Unmatched
            }
        }
    }
}
