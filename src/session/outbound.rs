//! Connection state and the outbound buffer.
//!
//! Both live behind one lock so that the transition to `Open` and the flush
//! of buffered requests are a single step. A request issued concurrently
//! with that transition either lands in the buffer before the flush or goes
//! straight to the link after it, never in between.

use std::collections::VecDeque;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::CorrelationId;

/// Observable state of a session's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// A connection attempt is in progress.
    Connecting,
    /// A link is live and requests are written immediately.
    Open,
    /// No link; the session is waiting to reconnect (or has been closed).
    Closed,
}

/// An encoded request waiting for a live link.
#[derive(Debug, Clone)]
pub(crate) struct BufferedRequest {
    pub(crate) id: CorrelationId,
    pub(crate) frame: Bytes,
}

/// What happened to a frame handed to [`Outbound::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Sent,
    Buffered,
}

pub(crate) struct Outbound {
    // ---
    state: ConnectionState,
    link: Option<mpsc::UnboundedSender<Bytes>>,
    buffer: VecDeque<BufferedRequest>,
}

impl Outbound {
    pub(crate) fn new() -> Self {
        // ---
        Self {
            state: ConnectionState::Connecting,
            link: None,
            buffer: VecDeque::new(),
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Write `frame` if a link is open, buffer it otherwise.
    ///
    /// A failed write buffers the frame and drops the state to `Closed`.
    pub(crate) fn send(&mut self, id: CorrelationId, frame: Bytes) -> Delivery {
        // ---
        if self.state == ConnectionState::Open {
            if let Some(link) = &self.link {
                match link.send(frame) {
                    Ok(()) => return Delivery::Sent,
                    Err(mpsc::error::SendError(frame)) => {
                        self.link = None;
                        self.state = ConnectionState::Closed;
                        self.buffer.push_back(BufferedRequest { id, frame });
                        return Delivery::Buffered;
                    }
                }
            }
        }

        self.buffer.push_back(BufferedRequest { id, frame });
        Delivery::Buffered
    }

    /// Adopt a freshly connected link and flush the buffer into it, oldest
    /// first. Returns how many frames were flushed.
    ///
    /// If the link dies during the flush the unsent frames stay buffered in
    /// their original order and the state is `Closed`.
    pub(crate) fn open(&mut self, link: mpsc::UnboundedSender<Bytes>) -> usize {
        // ---
        let mut flushed = 0;

        while let Some(item) = self.buffer.pop_front() {
            if let Err(mpsc::error::SendError(frame)) = link.send(item.frame) {
                self.buffer.push_front(BufferedRequest { id: item.id, frame });
                self.link = None;
                self.state = ConnectionState::Closed;
                return flushed;
            }
            flushed += 1;
        }

        self.link = Some(link);
        self.state = ConnectionState::Open;
        flushed
    }

    pub(crate) fn connecting(&mut self) {
        // ---
        self.link = None;
        self.state = ConnectionState::Connecting;
    }

    /// Drop the live link. Buffered frames are kept for the next link.
    pub(crate) fn closed(&mut self) {
        // ---
        self.link = None;
        self.state = ConnectionState::Closed;
    }

    /// Drop every buffered frame for `id`. Returns how many were dropped.
    pub(crate) fn discard(&mut self, id: &CorrelationId) -> usize {
        // ---
        let before = self.buffer.len();
        self.buffer.retain(|item| item.id != *id);
        before - self.buffer.len()
    }

    /// Drop the link and everything buffered. Returns the dropped ids.
    pub(crate) fn shutdown(&mut self) -> Vec<CorrelationId> {
        // ---
        self.closed();
        self.buffer.drain(..).map(|item| item.id).collect()
    }
}
