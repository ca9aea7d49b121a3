//! Public session configuration.
//!
//! This type intentionally contains no transport-specific concepts
//! (endpoint URI, subprotocol). Those belong to
//! [`TransportBuilder`](crate::TransportBuilder).

use std::time::Duration;

use crate::IdStrategy;

/// Default pause between a connection closing and the next attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(500);

/// Session behavior settings.
///
/// # Example
///
/// ```
/// use hex_rpc::{IdStrategy, SessionConfig};
/// use std::time::Duration;
///
/// let config = SessionConfig::new("player")
///     .with_reconnect_delay(Duration::from_secs(1))
///     .with_id_strategy(IdStrategy::Counter);
/// assert_eq!(config.request_timeout, None);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    // ---
    /// Label attached to every log line of this session.
    pub name: String,

    /// Fixed delay between a close/error and the next connection attempt.
    ///
    /// There is no backoff and no attempt limit.
    ///
    /// Default: 500ms
    pub reconnect_delay: Duration,

    /// How long a request may stay unanswered.
    ///
    /// `None` waits forever: a request the server never answers stays
    /// pending until the session closes.
    ///
    /// Default: `None`
    pub request_timeout: Option<Duration>,

    /// How correlation ids are assigned to new requests.
    ///
    /// Default: [`IdStrategy::Random`]
    pub id_strategy: IdStrategy,
}

impl SessionConfig {
    /// Create a config with default settings and the given log label.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the reconnect delay.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set a per-request timeout.
    ///
    /// # Example
    ///
    /// ```
    /// use hex_rpc::SessionConfig;
    /// use std::time::Duration;
    ///
    /// let config = SessionConfig::default()
    ///     .with_request_timeout(Duration::from_secs(10));
    /// assert_eq!(config.request_timeout, Some(Duration::from_secs(10)));
    /// ```
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the correlation id strategy.
    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }
}

impl Default for SessionConfig {
    /// - `name`: `"hex-rpc"`
    /// - `reconnect_delay`: 500ms
    /// - `request_timeout`: none
    /// - `id_strategy`: random
    fn default() -> Self {
        Self {
            name: "hex-rpc".into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            request_timeout: None,
            id_strategy: IdStrategy::Random,
        }
    }
}
