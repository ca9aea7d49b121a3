//! Codec seam between in-memory requests/answers and wire bytes.
//!
//! The session only depends on the [`Codec`] trait. [`JsonCodec`] is the
//! codec shipped with the crate; it frames every message as
//! `{"id": [w0, w1, w2, w3], "body": ...}`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{Body, Request};
use crate::{CorrelationId, Result, RpcError};

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: CorrelationId,
    pub body: Body,
}

/// Stateless request encoder and answer decoder.
///
/// `encode_request` may refuse a request, in which case the caller rejects
/// the request with [`RpcError::Serialization`] and sends nothing.
pub trait Codec: Send + Sync {
    /// Encode a request tagged with its correlation id.
    fn encode_request(&self, id: CorrelationId, request: &Request) -> Result<Bytes>;

    /// Decode an inbound frame into its id and body.
    fn decode_answer(&self, frame: &[u8]) -> Result<Answer>;
}

/// Shared codec pointer.
pub type CodecPtr = Arc<dyn Codec>;

#[derive(Serialize)]
struct WireRequestRef<'a> {
    id: CorrelationId,
    body: &'a Request,
}

/// Request frame as seen by the peer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WireRequest {
    pub id: CorrelationId,
    pub body: Request,
}

/// JSON framing of requests and answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Decode a request frame (peer side).
    pub fn decode_request(&self, frame: &[u8]) -> Result<WireRequest> {
        // ---
        serde_json::from_slice(frame).map_err(|e| RpcError::Decode(e.to_string()))
    }

    /// Encode an answer frame (peer side).
    pub fn encode_answer(&self, answer: &Answer) -> Result<Bytes> {
        // ---
        Ok(Bytes::from(serde_json::to_vec(answer)?))
    }
}

impl Codec for JsonCodec {
    fn encode_request(&self, id: CorrelationId, request: &Request) -> Result<Bytes> {
        // ---
        let frame = WireRequestRef { id, body: request };
        Ok(Bytes::from(serde_json::to_vec(&frame)?))
    }

    fn decode_answer(&self, frame: &[u8]) -> Result<Answer> {
        // ---
        serde_json::from_slice(frame).map_err(|e| RpcError::Decode(e.to_string()))
    }
}
