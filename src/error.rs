// src/error.rs

use thiserror::Error;

/// Errors that can occur during RPC operations
///
/// Transport-level failures never reach callers of [`Session`](crate::Session)
/// requests; they are recovered by the reconnect loop and only logged. The
/// variants a pending request can resolve to are `Serialization`, `Remote`,
/// `Timeout`, `SessionClosed` and (for uploads) `Io`.
#[derive(Error, Debug)]
pub enum RpcError {
    /// The codec refused to encode a request; nothing was transmitted.
    #[error("could not serialize: {0}")]
    Serialization(String),

    /// An inbound frame could not be decoded.
    #[error("could not decode answer: {0}")]
    Decode(String),

    /// The server answered with an error string instead of the expected variant.
    #[error("remote error: {0}")]
    Remote(String),

    /// Transport connection or IO failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// No answer arrived within the configured request timeout.
    #[error("request timed out")]
    Timeout,

    /// The session was closed while the request was outstanding.
    #[error("session closed")]
    SessionClosed,

    /// Reading upload data failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Required configuration is missing.
    #[error("missing required configuration: {0}")]
    MissingConfig(String),

    /// Configuration options conflict.
    #[error("configuration conflict: {0}")]
    ConfigConflict(String),
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        // ---
        RpcError::Serialization(err.to_string())
    }
}

/// Result type alias for RPC operations
pub type Result<T> = std::result::Result<T, RpcError>;

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_serialization_message_matches_wire_wording() {
        // ---
        let err = RpcError::Serialization("bad key".into());
        assert_eq!(err.to_string(), "could not serialize: bad key");
    }

    #[test]
    fn test_remote_error_keeps_server_string() {
        // ---
        let err = RpcError::Remote("NoSuchTrack".into());
        assert!(matches!(&err, RpcError::Remote(s) if s == "NoSuchTrack"));
    }
}
