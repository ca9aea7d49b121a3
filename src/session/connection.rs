//! The connection manager.
//!
//! One task per session. It connects, flushes the outbound buffer, feeds
//! inbound frames to the dispatcher one at a time and, when the link ends,
//! waits the reconnect delay and starts over. It never gives up on its own;
//! only shutdown (explicit close or the last session handle going away)
//! ends it.

#![cfg_attr(not(feature = "logging"), allow(unused_variables))]

use std::sync::atomic::Ordering;
use std::sync::Weak;

use tokio_util::sync::CancellationToken;

use crate::{
    // ---
    log_debug,
    log_info,
    log_warn,
    CloseReason,
    Link,
    LinkEvent,
    TransportPtr,
};

use super::{lock_ignore_poison, Inner};

pub(super) async fn run(inner: Weak<Inner>, transport: TransportPtr, shutdown: CancellationToken) {
    // ---
    loop {
        let Some((label, delay)) = begin_attempt(&inner) else {
            return;
        };

        let connected = tokio::select! {
            _ = shutdown.cancelled() => break,
            res = transport.connect() => res,
        };

        match connected {
            Ok(link) => {
                let reason = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    reason = serve(&inner, link) => reason,
                };

                let Some(reason) = reason else {
                    return;
                };
                mark_closed(&inner);
                log_warn!(label: label, "connection closed ({reason})");
            }
            Err(err) => {
                mark_closed(&inner);
                log_warn!(label: label, "connection failed: {err}");
            }
        }

        log_debug!(label: label, "reconnecting in {:?}", delay);

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    log_debug!("connection manager stopped");
}

/// Count the attempt and enter `Connecting`. `None` once the session is gone.
fn begin_attempt(inner: &Weak<Inner>) -> Option<(String, std::time::Duration)> {
    // ---
    let this = inner.upgrade()?;

    lock_ignore_poison(&this.outbound).connecting();
    let attempt = this.attempts.fetch_add(1, Ordering::SeqCst) + 1;

    log_debug!(
        label: this.label,
        "connecting to {} (attempt {attempt})",
        this.endpoint
    );

    Some((this.label.clone(), this.config.reconnect_delay))
}

fn mark_closed(inner: &Weak<Inner>) {
    // ---
    if let Some(this) = inner.upgrade() {
        lock_ignore_poison(&this.outbound).closed();
    }
}

/// Drive one live link until it ends. Returns why it ended, or `None` if
/// the session went away meanwhile.
async fn serve(inner: &Weak<Inner>, link: Link) -> Option<CloseReason> {
    // ---
    let Link { outbox, mut inbox } = link;

    {
        let this = inner.upgrade()?;
        let flushed = lock_ignore_poison(&this.outbound).open(outbox);
        log_info!(
            label: this.label,
            "connection open, flushed {flushed} buffered request(s)"
        );
    }

    loop {
        match inbox.recv().await {
            Some(LinkEvent::Frame(frame)) => {
                let this = inner.upgrade()?;
                this.dispatch(&frame);
            }
            Some(LinkEvent::Closed(reason)) => return Some(reason),
            None => return Some(CloseReason::new(None, "link dropped")),
        }
    }
}
