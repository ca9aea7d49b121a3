//! Correlation identifiers.
//!
//! A [`CorrelationId`] is an opaque 128-bit value carried in-band with every
//! request and answer. The all-zero value is reserved as the broadcast
//! sentinel and marks server pushes; it is never handed out to a request.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique correlation identifier used to match requests and answers.
///
/// Represented as four unsigned 32-bit words, which is also its wire form
/// (a four element array).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId([u32; 4]);

impl CorrelationId {
    /// The reserved broadcast sentinel, all four words zero.
    pub const BROADCAST: CorrelationId = CorrelationId([0; 4]);

    /// Build an id from its four words.
    pub const fn from_words(words: [u32; 4]) -> Self {
        Self(words)
    }

    /// Generate a new random correlation ID.
    ///
    /// Draws 128 random bits. Never returns the broadcast sentinel.
    pub fn generate() -> Self {
        // ---
        loop {
            let id = Self::from(Uuid::new_v4().as_u128());
            if !id.is_broadcast() {
                return id;
            }
        }
    }

    /// The four words of this id.
    pub fn words(&self) -> [u32; 4] {
        self.0
    }

    /// Whether this is the broadcast sentinel.
    pub fn is_broadcast(&self) -> bool {
        self.0 == [0; 4]
    }
}

impl From<u128> for CorrelationId {
    fn from(value: u128) -> Self {
        // ---
        Self([
            (value >> 96) as u32,
            (value >> 64) as u32,
            (value >> 32) as u32,
            value as u32,
        ])
    }
}

impl From<CorrelationId> for u128 {
    fn from(id: CorrelationId) -> Self {
        // ---
        id.0.iter().fold(0u128, |acc, w| (acc << 32) | u128::from(*w))
    }
}

impl From<[u32; 4]> for CorrelationId {
    fn from(words: [u32; 4]) -> Self {
        Self(words)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        write!(
            f,
            "{:08x}{:08x}{:08x}{:08x}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// How a session assigns correlation ids to new requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    /// Random 128-bit ids, re-drawn while the drawn id is still outstanding.
    #[default]
    Random,

    /// Session-scoped counter starting at 1.
    Counter,
}

/// Session-local id source implementing an [`IdStrategy`].
#[derive(Debug)]
pub(crate) struct IdGenerator {
    strategy: IdStrategy,
    next: u128,
}

impl IdGenerator {
    pub(crate) fn new(strategy: IdStrategy) -> Self {
        Self { strategy, next: 1 }
    }

    /// Produce an id for which `in_use` returns false.
    pub(crate) fn next_id(&mut self, in_use: impl Fn(&CorrelationId) -> bool) -> CorrelationId {
        // ---
        loop {
            let id = match self.strategy {
                IdStrategy::Random => CorrelationId::generate(),
                IdStrategy::Counter => {
                    let id = CorrelationId::from(self.next);
                    // 0 is the sentinel; skip it on wrap-around
                    self.next = self.next.wrapping_add(1).max(1);
                    id
                }
            };

            if !in_use(&id) {
                return id;
            }
        }
    }
}
