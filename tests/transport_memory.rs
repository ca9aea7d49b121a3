// tests/transport_memory.rs

use serde_json::json;
use tokio::time::{timeout, Duration};

use hex_rpc::{
    // ---
    Action,
    Answer,
    Body,
    JsonCodec,
    MemoryServer,
    Request,
    Session,
    SessionConfig,
    TransportBuilder,
};

#[tokio::test]
async fn memory_uri_session_round_trip() {
    // ---
    // Arrange
    // ---
    let server = MemoryServer::bind("memory://transport-memory-round-trip");

    let transport = TransportBuilder::new()
        .uri("memory://transport-memory-round-trip")
        .build()
        .await
        .expect("failed to create memory transport");

    let session = Session::open(transport, SessionConfig::new("round-trip"));

    let mut peer = timeout(Duration::from_secs(1), server.accept())
        .await
        .expect("timed out waiting for connection")
        .expect("hub closed");

    // ---
    // Act
    // ---
    let votes = session.vote_for_track(12);

    let frame = timeout(Duration::from_millis(500), peer.recv())
        .await
        .expect("timed out waiting for request")
        .expect("link closed unexpectedly");
    let request = JsonCodec.decode_request(&frame).expect("bad request");

    let answer = Answer {
        id: request.id,
        body: Body::Action(Action::VoteForTrack(json!(3))),
    };
    assert!(peer.send(JsonCodec.encode_answer(&answer).unwrap()));

    // ---
    // Assert
    // ---
    assert_eq!(request.body, Request::VoteForTrack { key: 12 });
    assert_eq!(votes.await.unwrap(), json!(3));
    assert_eq!(server.attempts(), 1);
}
