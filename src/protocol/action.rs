//! Inbound payloads: answers to requests and server-initiated transitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{PlaylistKey, TrackKey};

/// A playlist record as pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub key: PlaylistKey,
    pub title: String,
    pub desc: Option<String>,
    pub tracks: Vec<TrackKey>,
    pub origin: Vec<u8>,
}

/// A state change pushed to every client on the broadcast id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transition {
    DeletePlaylist(PlaylistKey),
    UpsertPlaylist(Playlist),
}

/// Tagged inbound payload, `{"Variant": data}` on the wire.
///
/// Answers keep their data as a JSON value; the caller decides the shape
/// (see [`Session::request_as`](crate::Session::request_as)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Search(Value),
    GetTrack(Value),
    StreamNext(Value),
    StreamEnd(Value),
    StreamSeek(Value),
    UpdateTrack(Value),
    GetSuggestion(Value),
    AddPlaylist(Value),
    DeletePlaylist(Value),
    SetPlaylistImage(Value),
    AddToPlaylist(Value),
    DeleteFromPlaylist(Value),
    UpdatePlaylist(Value),
    GetPlaylists(Value),
    GetPlaylist(Value),
    GetPlaylistsOfTrack(Value),
    DeleteTrack(Value),
    UploadYoutube(Value),
    UploadTrack(Value),
    VoteForTrack(Value),
    AskUploadProgress(Value),
    GetToken(Value),
    UpdateToken(Value),
    CreateToken(Value),
    LastToken(Value),
    GetSummary(Value),
    GetTransitions(Value),
    Download(Value),
    AskDownloadProgress(Value),
    Transition(Transition),
}

impl Action {
    /// Name of the variant (the single key of the wire object).
    pub fn variant_name(&self) -> &'static str {
        // ---
        match self {
            Action::Search(_) => "Search",
            Action::GetTrack(_) => "GetTrack",
            Action::StreamNext(_) => "StreamNext",
            Action::StreamEnd(_) => "StreamEnd",
            Action::StreamSeek(_) => "StreamSeek",
            Action::UpdateTrack(_) => "UpdateTrack",
            Action::GetSuggestion(_) => "GetSuggestion",
            Action::AddPlaylist(_) => "AddPlaylist",
            Action::DeletePlaylist(_) => "DeletePlaylist",
            Action::SetPlaylistImage(_) => "SetPlaylistImage",
            Action::AddToPlaylist(_) => "AddToPlaylist",
            Action::DeleteFromPlaylist(_) => "DeleteFromPlaylist",
            Action::UpdatePlaylist(_) => "UpdatePlaylist",
            Action::GetPlaylists(_) => "GetPlaylists",
            Action::GetPlaylist(_) => "GetPlaylist",
            Action::GetPlaylistsOfTrack(_) => "GetPlaylistsOfTrack",
            Action::DeleteTrack(_) => "DeleteTrack",
            Action::UploadYoutube(_) => "UploadYoutube",
            Action::UploadTrack(_) => "UploadTrack",
            Action::VoteForTrack(_) => "VoteForTrack",
            Action::AskUploadProgress(_) => "AskUploadProgress",
            Action::GetToken(_) => "GetToken",
            Action::UpdateToken(_) => "UpdateToken",
            Action::CreateToken(_) => "CreateToken",
            Action::LastToken(_) => "LastToken",
            Action::GetSummary(_) => "GetSummary",
            Action::GetTransitions(_) => "GetTransitions",
            Action::Download(_) => "Download",
            Action::AskDownloadProgress(_) => "AskDownloadProgress",
            Action::Transition(_) => "Transition",
        }
    }

    /// Unwrap the variant and return its associated data.
    pub fn into_payload(self) -> Value {
        // ---
        match self {
            Action::Search(v)
            | Action::GetTrack(v)
            | Action::StreamNext(v)
            | Action::StreamEnd(v)
            | Action::StreamSeek(v)
            | Action::UpdateTrack(v)
            | Action::GetSuggestion(v)
            | Action::AddPlaylist(v)
            | Action::DeletePlaylist(v)
            | Action::SetPlaylistImage(v)
            | Action::AddToPlaylist(v)
            | Action::DeleteFromPlaylist(v)
            | Action::UpdatePlaylist(v)
            | Action::GetPlaylists(v)
            | Action::GetPlaylist(v)
            | Action::GetPlaylistsOfTrack(v)
            | Action::DeleteTrack(v)
            | Action::UploadYoutube(v)
            | Action::UploadTrack(v)
            | Action::VoteForTrack(v)
            | Action::AskUploadProgress(v)
            | Action::GetToken(v)
            | Action::UpdateToken(v)
            | Action::CreateToken(v)
            | Action::LastToken(v)
            | Action::GetSummary(v)
            | Action::GetTransitions(v)
            | Action::Download(v)
            | Action::AskDownloadProgress(v) => v,
            // Transition holds only plain data; serializing it cannot fail.
            Action::Transition(t) => serde_json::to_value(t).unwrap_or(Value::Null),
        }
    }

    /// The transition carried by this action, if any.
    pub fn as_transition(&self) -> Option<&Transition> {
        match self {
            Action::Transition(t) => Some(t),
            _ => None,
        }
    }
}

/// Body of an inbound frame.
///
/// The server answers either with a tagged [`Action`] or with a bare
/// string. A bare string equal to the requested variant is a unit answer;
/// any other bare string is an error message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    Bare(String),
    Action(Action),
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tagged_answer_unwraps_single_key() {
        // ---
        let body: Body = serde_json::from_value(json!({ "GetPlaylists": [1, 2] })).unwrap();
        match body {
            Body::Action(action) => {
                assert_eq!(action.variant_name(), "GetPlaylists");
                assert_eq!(action.into_payload(), json!([1, 2]));
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn test_bare_string_body() {
        // ---
        let body: Body = serde_json::from_value(json!("NotFound")).unwrap();
        assert_eq!(body, Body::Bare("NotFound".into()));
    }

    #[test]
    fn test_transition_delete_playlist() {
        // ---
        let body: Body =
            serde_json::from_value(json!({ "Transition": { "DeletePlaylist": 12 } })).unwrap();
        let Body::Action(action) = body else {
            panic!("expected action");
        };
        assert_eq!(action.as_transition(), Some(&Transition::DeletePlaylist(12)));
    }

    #[test]
    fn test_transition_upsert_playlist() {
        // ---
        let wire = json!({ "Transition": { "UpsertPlaylist": {
            "key": 4, "title": "Mix", "desc": null, "tracks": [9, 10], "origin": [0, 0]
        }}});
        let action: Action = serde_json::from_value(wire).unwrap();

        let Some(Transition::UpsertPlaylist(pl)) = action.as_transition() else {
            panic!("expected upsert");
        };
        assert_eq!(pl.key, 4);
        assert_eq!(pl.tracks, vec![9, 10]);
    }

    #[test]
    fn test_unknown_variant_is_rejected() {
        // ---
        let res: std::result::Result<Body, _> =
            serde_json::from_value(json!({ "Nonsense": 1 }));
        assert!(res.is_err());
    }
}
