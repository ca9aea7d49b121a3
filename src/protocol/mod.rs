/// Wire types and the codec seam.
///
/// This module defines the request catalog, the inbound action/transition
/// types and the [`Codec`] trait that turns them into frames.
mod action;
mod codec;
mod request;

pub use action::{Action, Body, Playlist, Transition};
pub use codec::{Answer, Codec, CodecPtr, JsonCodec, WireRequest};
pub use request::Request;

/// Key of a track in the server's library.
pub type TrackKey = i64;

/// Key of a playlist.
pub type PlaylistKey = i64;

/// Key of a playback token.
pub type TokenKey = i64;
