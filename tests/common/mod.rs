// tests/common/mod.rs
//
// A scripted music server on top of the memory transport.

#![allow(dead_code)]

use std::time::Duration;
use tokio::time::timeout;

use hex_rpc::{
    // ---
    memory_pair,
    Action,
    Answer,
    Body,
    CorrelationId,
    JsonCodec,
    MemoryPeer,
    MemoryServer,
    Session,
    SessionConfig,
    WireRequest,
};

pub const WAIT: Duration = Duration::from_secs(5);

pub struct MusicServer {
    // ---
    pub server: MemoryServer,
}

impl MusicServer {
    // ---

    /// A session with default settings and its own isolated server.
    pub fn open(name: &str) -> (Session, Self) {
        // ---
        let (transport, server) = memory_pair(format!("memory://{name}"));
        let config = SessionConfig::new(name);
        (Session::open(transport, config), Self { server })
    }

    pub async fn accept(&self) -> MemoryPeer {
        timeout(WAIT, self.server.accept())
            .await
            .expect("timed out waiting for a connection")
            .expect("hub closed")
    }
}

pub async fn recv_request(peer: &mut MemoryPeer) -> WireRequest {
    // ---
    let frame = timeout(WAIT, peer.recv())
        .await
        .expect("timed out waiting for a request")
        .expect("link closed");

    JsonCodec
        .decode_request(&frame)
        .expect("client sent an undecodable request")
}

pub fn reply(peer: &MemoryPeer, id: CorrelationId, action: Action) {
    send_body(peer, id, Body::Action(action));
}

pub fn reply_bare(peer: &MemoryPeer, id: CorrelationId, text: &str) {
    send_body(peer, id, Body::Bare(text.to_string()));
}

pub fn push(peer: &MemoryPeer, action: Action) {
    send_body(peer, CorrelationId::BROADCAST, Body::Action(action));
}

fn send_body(peer: &MemoryPeer, id: CorrelationId, body: Body) {
    // ---
    let frame = JsonCodec
        .encode_answer(&Answer { id, body })
        .expect("answer must encode");
    assert!(peer.send(frame), "client went away");
}

/// Let spawned tasks run until they block.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[cfg(feature = "logging")]
mod imp {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;

    static INIT: Once = Once::new();

    pub fn init() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }
}

#[cfg(not(feature = "logging"))]
mod imp {
    #[inline]
    pub fn init() {}
}

pub fn init_logging() {
    imp::init();
}
