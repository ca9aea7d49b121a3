//! Session builder.
//!
//! Provides a fluent builder API for configuring sessions with reconnect
//! and timeout settings.

use crate::{CodecPtr, IdStrategy, Result, RpcError, Session, SessionConfig, TransportPtr};
use std::time::Duration;

/// Builder for creating sessions.
///
/// Accepts a transport and allows configuration of the reconnect delay,
/// request timeout, id assignment and codec.
///
/// # Examples
///
/// ```no_run
/// use hex_rpc::{SessionBuilder, TransportBuilder};
/// use std::time::Duration;
///
/// # async fn example() -> hex_rpc::Result<()> {
/// let transport = TransportBuilder::new()
///     .uri("ws://localhost:2794")
///     .build()
///     .await?;
///
/// let session = SessionBuilder::new(transport)
///     .name("library")
///     .reconnect_delay(Duration::from_secs(1))
///     .request_timeout(Duration::from_secs(30))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    // ---
    transport: TransportPtr,
    name: Option<String>,
    reconnect_delay: Option<Duration>,

    // Request timeout (optional, default: wait forever)
    request_timeout: Option<Duration>,

    id_strategy: Option<IdStrategy>,
    codec: Option<CodecPtr>,
}

impl SessionBuilder {
    /// Create a new session builder for `transport`.
    pub fn new(transport: TransportPtr) -> Self {
        // ---
        Self {
            transport,
            name: None,
            reconnect_delay: None,
            request_timeout: None,
            id_strategy: None,
            codec: None,
        }
    }

    /// Set the label used in log lines.
    ///
    /// Default: `"hex-rpc"`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the pause between a close and the next connection attempt.
    ///
    /// Default: 500ms.
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = Some(delay);
        self
    }

    /// Give up on requests unanswered after `timeout`.
    ///
    /// Default: no timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Choose how correlation ids are assigned.
    ///
    /// Default: [`IdStrategy::Random`].
    pub fn id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = Some(strategy);
        self
    }

    /// Replace the JSON codec.
    pub fn codec(mut self, codec: CodecPtr) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Start from an existing config. Values set on the builder win.
    pub fn config(mut self, config: SessionConfig) -> Self {
        // ---
        self.name = self.name.or(Some(config.name));
        self.reconnect_delay = self.reconnect_delay.or(Some(config.reconnect_delay));
        self.request_timeout = self.request_timeout.or(config.request_timeout);
        self.id_strategy = self.id_strategy.or(Some(config.id_strategy));
        self
    }

    /// Open the session (consumes self).
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::ConfigConflict`] if the reconnect delay or the
    /// request timeout is zero.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn build(self) -> Result<Session> {
        // ---
        let mut config = SessionConfig::default();

        if let Some(name) = self.name {
            config.name = name;
        }
        if let Some(delay) = self.reconnect_delay {
            if delay.is_zero() {
                return Err(RpcError::ConfigConflict(
                    "reconnect_delay must be greater than zero".into(),
                ));
            }
            config.reconnect_delay = delay;
        }
        if let Some(timeout) = self.request_timeout {
            if timeout.is_zero() {
                return Err(RpcError::ConfigConflict(
                    "request_timeout must be greater than zero".into(),
                ));
            }
            config.request_timeout = Some(timeout);
        }
        if let Some(strategy) = self.id_strategy {
            config.id_strategy = strategy;
        }

        Ok(match self.codec {
            Some(codec) => Session::open_with_codec(self.transport, config, codec),
            None => Session::open(self.transport, config),
        })
    }
}
