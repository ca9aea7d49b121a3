//! One method per server operation.
//!
//! Every method issues its request immediately and returns the [`Reply`]
//! to await. Answer payloads are handed back as JSON values; use
//! [`Session::request_as`] for a typed answer.

mod sessions;

pub use sessions::{SearchSession, StreamSession};

use crate::protocol::{PlaylistKey, Request, TokenKey, TrackKey};
use crate::{Reply, Session};

impl Session {
    /// Full-text search over the library.
    ///
    /// For repeated searches sharing one slot see
    /// [`start_search`](Self::start_search).
    pub fn search(&self, query: impl Into<String>) -> Reply {
        self.request(Request::Search {
            query: query.into(),
        })
    }

    pub fn get_track(&self, key: TrackKey) -> Reply {
        self.request(Request::GetTrack { key })
    }

    /// Ask for the next chunk of a stream. `None` continues the stream
    /// started under the same id.
    pub fn stream_next(&self, key: Option<TrackKey>) -> Reply {
        self.request(Request::StreamNext { key })
    }

    pub fn stream_end(&self) -> Reply {
        self.request(Request::StreamEnd(()))
    }

    pub fn stream_seek(&self, sample: u32) -> Reply {
        self.request(Request::StreamSeek { sample })
    }

    /// Change track metadata. Fields left `None` are not touched.
    pub fn update_track(
        &self,
        key: TrackKey,
        title: Option<String>,
        album: Option<String>,
        interpret: Option<String>,
        people: Option<String>,
        composer: Option<String>,
    ) -> Reply {
        self.request(Request::UpdateTrack {
            key,
            title,
            album,
            interpret,
            people,
            composer,
        })
    }

    pub fn get_suggestion(&self, key: TrackKey) -> Reply {
        self.request(Request::GetSuggestion { key })
    }

    pub fn add_playlist(&self, name: impl Into<String>) -> Reply {
        self.request(Request::AddPlaylist { name: name.into() })
    }

    pub fn delete_playlist(&self, key: PlaylistKey) -> Reply {
        self.request(Request::DeletePlaylist { key })
    }

    pub fn set_playlist_image(&self, key: PlaylistKey) -> Reply {
        self.request(Request::SetPlaylistImage { key })
    }

    pub fn add_to_playlist(&self, key: TrackKey, playlist: PlaylistKey) -> Reply {
        self.request(Request::AddToPlaylist { key, playlist })
    }

    pub fn delete_from_playlist(&self, key: TrackKey, playlist: PlaylistKey) -> Reply {
        self.request(Request::DeleteFromPlaylist { key, playlist })
    }

    pub fn update_playlist(
        &self,
        key: PlaylistKey,
        title: Option<String>,
        desc: Option<String>,
    ) -> Reply {
        self.request(Request::UpdatePlaylist { key, title, desc })
    }

    /// All playlists known to the server.
    pub fn get_playlists(&self) -> Reply {
        self.request(Request::GetPlaylists(()))
    }

    pub fn get_playlist(&self, key: PlaylistKey) -> Reply {
        self.request(Request::GetPlaylist { key })
    }

    pub fn get_playlists_of_track(&self, key: TrackKey) -> Reply {
        self.request(Request::GetPlaylistsOfTrack { key })
    }

    pub fn delete_track(&self, key: TrackKey) -> Reply {
        self.request(Request::DeleteTrack { key })
    }

    /// Let the server fetch and import a YouTube video or playlist.
    pub fn upload_youtube(&self, path: impl Into<String>) -> Reply {
        self.request(Request::UploadYoutube { path: path.into() })
    }

    pub fn vote_for_track(&self, key: TrackKey) -> Reply {
        self.request(Request::VoteForTrack { key })
    }

    pub fn ask_upload_progress(&self) -> Reply {
        self.request(Request::AskUploadProgress(()))
    }

    pub fn get_token(&self, token: TokenKey) -> Reply {
        self.request(Request::GetToken { token })
    }

    /// Update the playback position stored under a token.
    pub fn update_token(
        &self,
        token: TokenKey,
        key: Option<TrackKey>,
        played: Option<String>,
        pos: Option<f64>,
    ) -> Reply {
        self.request(Request::UpdateToken {
            token,
            key,
            played,
            pos,
        })
    }

    pub fn create_token(&self) -> Reply {
        self.request(Request::CreateToken(()))
    }

    pub fn last_token(&self) -> Reply {
        self.request(Request::LastToken(()))
    }

    pub fn get_summary(&self) -> Reply {
        self.request(Request::GetSummary(()))
    }

    pub fn get_transitions(&self) -> Reply {
        self.request(Request::GetTransitions(()))
    }

    /// Request an archive of `tracks` encoded as `format`.
    pub fn download(&self, format: impl Into<String>, tracks: Vec<TrackKey>) -> Reply {
        self.request(Request::Download {
            format: format.into(),
            tracks,
        })
    }

    pub fn ask_download_progress(&self) -> Reply {
        self.request(Request::AskDownloadProgress(()))
    }
}
