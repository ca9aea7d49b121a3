// tests/calls.rs

mod common;

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf};
use tokio::time::timeout;

use common::{init_logging, recv_request, reply, reply_bare, settle, MusicServer};
use hex_rpc::{Action, Request, RpcError};

#[tokio::test]
async fn test_search_session_reuses_its_id() {
    // ---
    init_logging();

    let (session, server) = MusicServer::open("search-session");
    let mut peer = server.accept().await;

    let search = session.start_search("abba");
    assert_eq!(search.query(), "abba");

    let mut first = search.search();
    let second = search.search();

    let a = recv_request(&mut peer).await;
    let b = recv_request(&mut peer).await;
    assert_eq!(a.id, search.id());
    assert_eq!(b.id, search.id());
    assert_eq!(
        b.body,
        Request::Search {
            query: "abba".into()
        }
    );
    assert_eq!(session.pending_requests(), 1);

    reply(&peer, search.id(), Action::Search(json!({"query": "abba", "tracks": []})));
    assert_eq!(
        second.await.unwrap(),
        json!({"query": "abba", "tracks": []})
    );

    // the superseded search is never answered
    assert!(timeout(Duration::from_millis(50), &mut first).await.is_err());

    session.close().await;
    assert!(matches!(first.await, Err(RpcError::SessionClosed)));
}

#[tokio::test]
async fn test_stream_session_sequence() {
    // ---
    init_logging();

    let (session, server) = MusicServer::open("stream-session");
    let mut peer = server.accept().await;

    let mut stream = session.start_stream(42);
    assert_eq!(stream.key(), 42);

    let chunk = stream.next();
    let request = recv_request(&mut peer).await;
    assert_eq!(request.id, stream.id());
    assert_eq!(request.body, Request::StreamNext { key: Some(42) });
    reply(&peer, request.id, Action::StreamNext(json!([1, 2, 3])));
    assert_eq!(chunk.await.unwrap(), json!([1, 2, 3]));

    let chunk = stream.next();
    let request = recv_request(&mut peer).await;
    assert_eq!(request.body, Request::StreamNext { key: None });
    reply(&peer, request.id, Action::StreamNext(json!([4])));
    assert_eq!(chunk.await.unwrap(), json!([4]));

    let seek = stream.seek(48_000);
    let request = recv_request(&mut peer).await;
    assert_eq!(request.body, Request::StreamSeek { sample: 48_000 });
    reply(&peer, request.id, Action::StreamSeek(json!(48_000)));
    assert_eq!(seek.await.unwrap(), json!(48_000));

    let end = stream.end();
    let request = recv_request(&mut peer).await;
    assert_eq!(request.id, stream.id());
    assert_eq!(request.body, Request::StreamEnd(()));
    reply_bare(&peer, request.id, "StreamEnd");
    assert_eq!(end.await.unwrap(), Value::Null);
}

#[tokio::test]
async fn test_upload_track_reads_then_sends() {
    // ---
    init_logging();

    let (session, server) = MusicServer::open("upload");
    let mut peer = server.accept().await;

    let upload = session.upload_track("song", "mp3", io::Cursor::new(vec![1u8, 2, 3]));

    let request = recv_request(&mut peer).await;
    assert_eq!(
        request.body,
        Request::UploadTrack {
            name: "song".into(),
            format: "mp3".into(),
            data: vec![1, 2, 3],
        }
    );

    reply_bare(&peer, request.id, "UploadTrack");
    assert_eq!(upload.await.unwrap(), Value::Null);
}

/// Fails on first read.
struct BrokenReader;

impl AsyncRead for BrokenReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "disk gone")))
    }
}

#[tokio::test]
async fn test_upload_read_failure_rejects() {
    // ---
    init_logging();

    let (session, server) = MusicServer::open("upload-failure");
    let mut peer = server.accept().await;

    let upload = session.upload_track("song", "flac", BrokenReader);

    match upload.await {
        Err(RpcError::Io(err)) => assert_eq!(err.to_string(), "disk gone"),
        other => panic!("expected io error, got {other:?}"),
    }

    settle().await;
    assert!(peer.try_recv().is_none(), "nothing may be sent");
    assert_eq!(session.pending_requests(), 0);
}

#[tokio::test]
async fn test_upload_finishing_after_close_is_dropped() {
    // ---
    init_logging();

    let (session, server) = MusicServer::open("upload-after-close");
    let mut peer = server.accept().await;

    let (mut writer, reader) = tokio::io::duplex(64);
    let upload = session.upload_track("song", "ogg", reader);
    settle().await;

    session.close().await;
    assert!(matches!(upload.await, Err(RpcError::SessionClosed)));

    // the read completes only now
    writer.write_all(&[9, 9, 9]).await.unwrap();
    drop(writer);
    settle().await;

    assert_eq!(session.buffered_requests(), 0);
    assert_eq!(session.pending_requests(), 0);
    assert!(peer.try_recv().is_none(), "nothing may be sent");
}

#[tokio::test]
async fn test_upload_tracks_joins_all() {
    // ---
    init_logging();

    let (session, server) = MusicServer::open("upload-many");
    let mut peer = server.accept().await;

    let uploads = session.upload_tracks(vec![
        ("a".to_string(), "mp3".to_string(), io::Cursor::new(vec![1u8])),
        ("b".to_string(), "mp3".to_string(), io::Cursor::new(vec![2u8])),
    ]);

    for _ in 0..2 {
        let request = recv_request(&mut peer).await;
        let Request::UploadTrack { name, .. } = request.body else {
            panic!("unexpected request");
        };
        reply(&peer, request.id, Action::UploadTrack(json!(name)));
    }

    assert_eq!(uploads.await.unwrap(), vec![json!("a"), json!("b")]);
}

#[tokio::test]
async fn test_get_suggestions_all_or_nothing() {
    // ---
    init_logging();

    let (session, server) = MusicServer::open("suggestions");
    let mut peer = server.accept().await;

    let all = session.get_suggestions([1, 2, 3]);
    for _ in 0..3 {
        let request = recv_request(&mut peer).await;
        let Request::GetSuggestion { key } = request.body else {
            panic!("unexpected request");
        };
        reply(&peer, request.id, Action::GetSuggestion(json!(key * 10)));
    }
    assert_eq!(
        all.await.unwrap(),
        vec![json!(10), json!(20), json!(30)]
    );

    let partial = session.get_suggestions([4, 5]);
    let first = recv_request(&mut peer).await;
    let second = recv_request(&mut peer).await;
    reply(&peer, first.id, Action::GetSuggestion(json!(40)));
    reply_bare(&peer, second.id, "no suggestions for 5");

    assert!(matches!(
        partial.await,
        Err(RpcError::Remote(m)) if m == "no suggestions for 5"
    ));
}

#[tokio::test]
async fn test_catalog_calls_encode_their_parameters() {
    // ---
    init_logging();

    let (session, server) = MusicServer::open("catalog");
    let mut peer = server.accept().await;

    let _ = session.search("abba");
    let _ = session.get_track(7);
    let _ = session.stream_next(Some(7));
    let _ = session.stream_next(None);
    let _ = session.stream_end();
    let _ = session.stream_seek(44_100);
    let _ = session.update_track(
        7,
        Some("Title".into()),
        None,
        None,
        None,
        Some("Bach".into()),
    );
    let _ = session.get_suggestion(7);
    let _ = session.add_playlist("road trip");
    let _ = session.delete_playlist(3);
    let _ = session.set_playlist_image(3);
    let _ = session.add_to_playlist(7, 3);
    let _ = session.delete_from_playlist(7, 3);
    let _ = session.update_playlist(3, None, Some("chill".into()));
    let _ = session.get_playlists();
    let _ = session.get_playlist(3);
    let _ = session.get_playlists_of_track(7);
    let _ = session.delete_track(7);
    let _ = session.upload_youtube("https://youtu.be/x");
    let _ = session.vote_for_track(7);
    let _ = session.ask_upload_progress();
    let _ = session.get_token(11);
    let _ = session.update_token(11, Some(7), None, Some(12.5));
    let _ = session.create_token();
    let _ = session.last_token();
    let _ = session.get_summary();
    let _ = session.get_transitions();
    let _ = session.download("zip", vec![1, 2]);
    let _ = session.ask_download_progress();

    let expected = vec![
        json!({"Search": {"query": "abba"}}),
        json!({"GetTrack": {"key": 7}}),
        json!({"StreamNext": {"key": 7}}),
        json!({"StreamNext": {"key": null}}),
        json!({"StreamEnd": null}),
        json!({"StreamSeek": {"sample": 44100}}),
        json!({"UpdateTrack": {
            "key": 7, "title": "Title", "album": null, "interpret": null,
            "people": null, "composer": "Bach"
        }}),
        json!({"GetSuggestion": {"key": 7}}),
        json!({"AddPlaylist": {"name": "road trip"}}),
        json!({"DeletePlaylist": {"key": 3}}),
        json!({"SetPlaylistImage": {"key": 3}}),
        json!({"AddToPlaylist": {"key": 7, "playlist": 3}}),
        json!({"DeleteFromPlaylist": {"key": 7, "playlist": 3}}),
        json!({"UpdatePlaylist": {"key": 3, "title": null, "desc": "chill"}}),
        json!({"GetPlaylists": null}),
        json!({"GetPlaylist": {"key": 3}}),
        json!({"GetPlaylistsOfTrack": {"key": 7}}),
        json!({"DeleteTrack": {"key": 7}}),
        json!({"UploadYoutube": {"path": "https://youtu.be/x"}}),
        json!({"VoteForTrack": {"key": 7}}),
        json!({"AskUploadProgress": null}),
        json!({"GetToken": {"token": 11}}),
        json!({"UpdateToken": {"token": 11, "key": 7, "played": null, "pos": 12.5}}),
        json!({"CreateToken": null}),
        json!({"LastToken": null}),
        json!({"GetSummary": null}),
        json!({"GetTransitions": null}),
        json!({"Download": {"format": "zip", "tracks": [1, 2]}}),
        json!({"AskDownloadProgress": null}),
    ];

    for body in expected {
        let request = recv_request(&mut peer).await;
        assert_eq!(serde_json::to_value(&request.body).unwrap(), body);
    }
    assert!(peer.try_recv().is_none());
}
