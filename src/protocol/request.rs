//! Outbound request payloads.

use serde::{Deserialize, Serialize};

use super::{PlaylistKey, TokenKey, TrackKey};

/// One request sent to the server.
///
/// Serialized externally tagged: `{"Variant": {"param": value, ...}}`.
/// Variants without parameters carry `()` so they encode as
/// `{"Variant": null}` rather than a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    Search {
        query: String,
    },
    GetTrack {
        key: TrackKey,
    },
    /// `key` is `None` to continue an already started stream.
    StreamNext {
        key: Option<TrackKey>,
    },
    StreamEnd(()),
    StreamSeek {
        sample: u32,
    },
    UpdateTrack {
        key: TrackKey,
        title: Option<String>,
        album: Option<String>,
        interpret: Option<String>,
        people: Option<String>,
        composer: Option<String>,
    },
    GetSuggestion {
        key: TrackKey,
    },
    AddPlaylist {
        name: String,
    },
    DeletePlaylist {
        key: PlaylistKey,
    },
    SetPlaylistImage {
        key: PlaylistKey,
    },
    AddToPlaylist {
        key: TrackKey,
        playlist: PlaylistKey,
    },
    DeleteFromPlaylist {
        key: TrackKey,
        playlist: PlaylistKey,
    },
    UpdatePlaylist {
        key: PlaylistKey,
        title: Option<String>,
        desc: Option<String>,
    },
    GetPlaylists(()),
    GetPlaylist {
        key: PlaylistKey,
    },
    GetPlaylistsOfTrack {
        key: TrackKey,
    },
    DeleteTrack {
        key: TrackKey,
    },
    UploadYoutube {
        path: String,
    },
    VoteForTrack {
        key: TrackKey,
    },
    AskUploadProgress(()),
    GetToken {
        token: TokenKey,
    },
    UpdateToken {
        token: TokenKey,
        key: Option<TrackKey>,
        played: Option<String>,
        pos: Option<f64>,
    },
    CreateToken(()),
    LastToken(()),
    GetSummary(()),
    GetTransitions(()),
    Download {
        format: String,
        tracks: Vec<TrackKey>,
    },
    AskDownloadProgress(()),
    UploadTrack {
        name: String,
        format: String,
        data: Vec<u8>,
    },
}

impl Request {
    /// The variant name, which is also the answer variant the server replies with.
    pub fn variant_name(&self) -> &'static str {
        // ---
        match self {
            Request::Search { .. } => "Search",
            Request::GetTrack { .. } => "GetTrack",
            Request::StreamNext { .. } => "StreamNext",
            Request::StreamEnd(()) => "StreamEnd",
            Request::StreamSeek { .. } => "StreamSeek",
            Request::UpdateTrack { .. } => "UpdateTrack",
            Request::GetSuggestion { .. } => "GetSuggestion",
            Request::AddPlaylist { .. } => "AddPlaylist",
            Request::DeletePlaylist { .. } => "DeletePlaylist",
            Request::SetPlaylistImage { .. } => "SetPlaylistImage",
            Request::AddToPlaylist { .. } => "AddToPlaylist",
            Request::DeleteFromPlaylist { .. } => "DeleteFromPlaylist",
            Request::UpdatePlaylist { .. } => "UpdatePlaylist",
            Request::GetPlaylists(()) => "GetPlaylists",
            Request::GetPlaylist { .. } => "GetPlaylist",
            Request::GetPlaylistsOfTrack { .. } => "GetPlaylistsOfTrack",
            Request::DeleteTrack { .. } => "DeleteTrack",
            Request::UploadYoutube { .. } => "UploadYoutube",
            Request::VoteForTrack { .. } => "VoteForTrack",
            Request::AskUploadProgress(()) => "AskUploadProgress",
            Request::GetToken { .. } => "GetToken",
            Request::UpdateToken { .. } => "UpdateToken",
            Request::CreateToken(()) => "CreateToken",
            Request::LastToken(()) => "LastToken",
            Request::GetSummary(()) => "GetSummary",
            Request::GetTransitions(()) => "GetTransitions",
            Request::Download { .. } => "Download",
            Request::AskDownloadProgress(()) => "AskDownloadProgress",
            Request::UploadTrack { .. } => "UploadTrack",
        }
    }
}
