//! Fan-out of server pushes to registered listeners.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::protocol::Action;
use crate::{log_debug, log_error};

use super::lock_ignore_poison;

/// Callback invoked with every server push.
pub type Listener = Arc<dyn Fn(&Action) + Send + Sync>;

/// Ordered listener list.
///
/// Listeners run in registration order, synchronously, on the connection
/// task. They see the whole [`Action`], transitions and anything else the
/// server pushes under the broadcast id.
pub(crate) struct BroadcastDispatcher {
    // ---
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

impl BroadcastDispatcher {
    pub(crate) fn new() -> Arc<Self> {
        // ---
        Arc::new(Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        })
    }

    pub(crate) fn subscribe(self: &Arc<Self>, listener: Listener) -> ListenerHandle {
        // ---
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock_ignore_poison(&self.listeners).push((id, listener));

        ListenerHandle {
            id,
            dispatcher: Arc::downgrade(self),
        }
    }

    fn unsubscribe(&self, id: u64) -> bool {
        // ---
        let mut listeners = lock_ignore_poison(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        lock_ignore_poison(&self.listeners).len()
    }

    /// Deliver `action` to every listener.
    ///
    /// The listener list is snapshotted first so a listener may subscribe or
    /// unsubscribe without deadlocking; such changes apply from the next
    /// push on. A panicking listener ends delivery of this push.
    pub(crate) fn publish(&self, label: &str, action: &Action) {
        // ---
        let snapshot: Vec<Listener> = lock_ignore_poison(&self.listeners)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        log_debug!(
            label: label,
            "broadcast {} to {} listener(s)",
            action.variant_name(),
            snapshot.len()
        );

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            for listener in &snapshot {
                listener(action);
            }
        }));

        if let Err(_payload) = outcome {
            log_error!(
                label: label,
                "broadcast listener panicked on {}: {}",
                action.variant_name(),
                panic_message(_payload.as_ref())
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    // ---
    if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else {
        "non-string panic payload"
    }
}

/// Registration of a broadcast listener.
///
/// Dropping the handle leaves the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    // ---
    id: u64,
    dispatcher: Weak<BroadcastDispatcher>,
}

impl ListenerHandle {
    /// Remove the listener. Returns false if it was already removed or the
    /// session is gone.
    pub fn unsubscribe(&self) -> bool {
        // ---
        match self.dispatcher.upgrade() {
            Some(dispatcher) => dispatcher.unsubscribe(self.id),
            None => false,
        }
    }
}
