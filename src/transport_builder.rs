//! Transport builder for creating transport instances.
//!
//! Provides a fluent builder API for constructing transports with clear separation
//! between required and optional configuration.

use crate::{Result, RpcError, TransportConfig, TransportPtr, DEFAULT_SUBPROTOCOL};

/// Builder for creating transport instances.
///
/// The URI scheme picks the transport unless
/// [`transport_type`](Self::transport_type) overrides it:
///
/// - `ws://`, `wss://` → WebSocket
/// - `memory://` → in-process memory transport
///
/// # Examples
///
/// ```no_run
/// use hex_rpc::TransportBuilder;
///
/// # async fn example() -> hex_rpc::Result<()> {
/// let transport = TransportBuilder::new()
///     .uri("ws://music.local:2794")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// ## In-memory endpoint for tests
/// ```
/// use hex_rpc::TransportBuilder;
///
/// # async fn example() -> hex_rpc::Result<()> {
/// let transport = TransportBuilder::new()
///     .uri("memory://library")
///     .build()
///     .await?;
/// assert_eq!(transport.endpoint(), "memory://library");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct TransportBuilder {
    uri: Option<String>,
    subprotocol: Option<String>,
    transport_type: Option<String>,
}

impl TransportBuilder {
    /// Create a new transport builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint URI (required).
    ///
    /// Examples:
    /// - `"ws://localhost:2794"`
    /// - `"memory://library"`
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the subprotocol requested during the handshake.
    ///
    /// Default: `"rust-websocket"`.
    pub fn subprotocol(mut self, protocol: impl Into<String>) -> Self {
        self.subprotocol = Some(protocol.into());
        self
    }

    /// Set explicit transport type.
    ///
    /// Valid values: `"websocket"`, `"memory"`
    ///
    /// If not specified, the URI scheme decides.
    pub fn transport_type(mut self, flag: impl Into<String>) -> Self {
        self.transport_type = Some(flag.into());
        self
    }

    /// Build the transport (consumes self).
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `uri` is missing or empty
    /// - the subprotocol is empty
    /// - the URI scheme is not recognized and no `transport_type` is set
    /// - `transport_type` names an unknown transport, or contradicts the scheme
    pub async fn build(self) -> Result<TransportPtr> {
        // Validate required fields
        let uri = self
            .uri
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| RpcError::MissingConfig("uri".into()))?;

        let subprotocol = self
            .subprotocol
            .unwrap_or_else(|| DEFAULT_SUBPROTOCOL.to_string());
        if subprotocol.is_empty() {
            return Err(RpcError::MissingConfig("subprotocol".into()));
        }

        let scheme = scheme_transport(&uri);

        let kind = match (self.transport_type.as_deref(), scheme) {
            (Some(explicit), Some(implied)) if explicit != implied => {
                return Err(RpcError::ConfigConflict(format!(
                    "transport_type {explicit} does not match uri {uri}"
                )));
            }
            (Some(explicit), _) => explicit.to_string(),
            (None, Some(implied)) => implied.to_string(),
            (None, None) => {
                return Err(RpcError::Transport(format!(
                    "cannot infer transport from uri {uri}, valid schemes: ws, wss, memory"
                )));
            }
        };

        let config = TransportConfig {
            uri,
            subprotocol,
            transport_type: self.transport_type,
        };

        match kind.as_str() {
            "websocket" => crate::create_websocket_transport(config).await,
            "memory" => crate::create_memory_transport(config).await,
            other => Err(RpcError::Transport(format!(
                "unrecognized transport_type: {other}, valid values: websocket, memory"
            ))),
        }
    }
}

fn scheme_transport(uri: &str) -> Option<&'static str> {
    // ---
    let (scheme, _) = uri.split_once("://")?;
    match scheme.to_ascii_lowercase().as_str() {
        "ws" | "wss" => Some("websocket"),
        "memory" => Some("memory"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[tokio::test]
    async fn test_missing_uri() {
        // ---
        let res = TransportBuilder::new().build().await;
        assert!(matches!(res, Err(RpcError::MissingConfig(f)) if f == "uri"));
    }

    #[tokio::test]
    async fn test_empty_subprotocol() {
        // ---
        let res = TransportBuilder::new()
            .uri("ws://localhost:2794")
            .subprotocol("")
            .build()
            .await;
        assert!(matches!(res, Err(RpcError::MissingConfig(f)) if f == "subprotocol"));
    }

    #[tokio::test]
    async fn test_scheme_selects_memory() {
        // ---
        let transport = TransportBuilder::new()
            .uri("memory://builder-scheme")
            .build()
            .await
            .unwrap();
        assert_eq!(transport.endpoint(), "memory://builder-scheme");
    }

    #[tokio::test]
    async fn test_websocket_does_not_connect_at_build() {
        // ---
        let transport = TransportBuilder::new()
            .uri("ws://127.0.0.1:1")
            .build()
            .await
            .unwrap();
        assert_eq!(transport.endpoint(), "ws://127.0.0.1:1");
    }

    #[tokio::test]
    async fn test_conflicting_transport_type() {
        // ---
        let res = TransportBuilder::new()
            .uri("ws://localhost:2794")
            .transport_type("memory")
            .build()
            .await;
        assert!(matches!(res, Err(RpcError::ConfigConflict(_))));
    }

    #[tokio::test]
    async fn test_unknown_scheme_needs_transport_type() {
        // ---
        let res = TransportBuilder::new().uri("tcp://host:1").build().await;
        assert!(matches!(res, Err(RpcError::Transport(_))));

        let res = TransportBuilder::new()
            .uri("tcp://host:1")
            .transport_type("carrier-pigeon")
            .build()
            .await;
        assert!(matches!(res, Err(RpcError::Transport(_))));

        let transport = TransportBuilder::new()
            .uri("local-library")
            .transport_type("memory")
            .build()
            .await
            .unwrap();
        assert_eq!(transport.endpoint(), "local-library");
    }

    #[test]
    fn test_scheme_transport() {
        // ---
        assert_eq!(scheme_transport("WSS://example"), Some("websocket"));
        assert_eq!(scheme_transport("memory://x"), Some("memory"));
        assert_eq!(scheme_transport("no-scheme"), None);
    }
}
