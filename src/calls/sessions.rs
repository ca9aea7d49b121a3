//! Multi-step calls: reusable search and stream slots, uploads, and
//! fan-out joins.

#![cfg_attr(not(feature = "logging"), allow(unused_variables))]

use futures::future::{try_join_all, TryJoinAll};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::protocol::{Request, TrackKey};
use crate::{log_debug, log_warn, CorrelationId, Reply, RpcError, Session};

/// A search slot bound to one correlation id.
///
/// Each [`search`](Self::search) re-sends the query under the same id. A
/// search still in flight is replaced by the newer one; its reply is not
/// answered and resolves only when the session closes.
#[derive(Debug, Clone)]
pub struct SearchSession {
    // ---
    session: Session,
    id: CorrelationId,
    query: String,
}

impl SearchSession {
    /// Send (or re-send) the query.
    pub fn search(&self) -> Reply {
        // ---
        let request = Request::Search {
            query: self.query.clone(),
        };
        self.session.request_with_id(Some(self.id), &request)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn id(&self) -> CorrelationId {
        self.id
    }
}

/// A playback stream bound to one correlation id.
///
/// The first [`next`](Self::next) names the track; later ones continue the
/// stream. Each call replaces whatever was pending under the stream's id.
#[derive(Debug)]
pub struct StreamSession {
    // ---
    session: Session,
    id: CorrelationId,
    key: TrackKey,
    started: bool,
}

impl StreamSession {
    /// Request the next chunk.
    pub fn next(&mut self) -> Reply {
        // ---
        let key = if self.started {
            None
        } else {
            self.started = true;
            Some(self.key)
        };

        self.session
            .request_with_id(Some(self.id), &Request::StreamNext { key })
    }

    /// Jump to `sample`.
    pub fn seek(&self, sample: u32) -> Reply {
        self.session
            .request_with_id(Some(self.id), &Request::StreamSeek { sample })
    }

    /// Tell the server the stream is finished.
    pub fn end(&self) -> Reply {
        self.session
            .request_with_id(Some(self.id), &Request::StreamEnd(()))
    }

    pub fn key(&self) -> TrackKey {
        self.key
    }

    pub fn id(&self) -> CorrelationId {
        self.id
    }
}

impl Session {
    /// Reserve an id for repeated searches for `query`. Nothing is sent
    /// until [`SearchSession::search`].
    pub fn start_search(&self, query: impl Into<String>) -> SearchSession {
        // ---
        SearchSession {
            session: self.clone(),
            id: self.next_id(),
            query: query.into(),
        }
    }

    /// Reserve an id for streaming track `key`. Nothing is sent until
    /// [`StreamSession::next`].
    pub fn start_stream(&self, key: TrackKey) -> StreamSession {
        // ---
        StreamSession {
            session: self.clone(),
            id: self.next_id(),
            key,
            started: false,
        }
    }

    /// Upload a track read from `data`.
    ///
    /// The request is registered right away; `data` is read to the end on a
    /// separate task and the upload is sent once the read completes. A read
    /// failure resolves the reply to [`RpcError::Io`].
    pub fn upload_track<R>(
        &self,
        name: impl Into<String>,
        format: impl Into<String>,
        data: R,
    ) -> Reply
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        // ---
        let pending = match self.register(None, "UploadTrack") {
            Ok(pending) => pending,
            Err(err) => return Box::pin(std::future::ready(Err(err))),
        };

        let (id, ticket) = (pending.id, pending.ticket);
        let (name, format) = (name.into(), format.into());
        let session = self.clone();

        tokio::spawn(async move {
            let mut data = data;
            let mut bytes = Vec::new();

            match data.read_to_end(&mut bytes).await {
                Ok(len) => {
                    log_debug!(label: session.name(), "upload {name}: read {len} bytes");
                    let request = Request::UploadTrack {
                        name,
                        format,
                        data: bytes,
                    };
                    session.transmit(id, ticket, &request);
                }
                Err(err) => {
                    log_warn!(label: session.name(), "upload {name}: read failed: {err}");
                    session.reject(id, ticket, RpcError::Io(err));
                }
            }
        });

        self.reply(pending)
    }

    /// Upload several tracks concurrently.
    ///
    /// Resolves to every answer in input order, or to the first failure.
    pub fn upload_tracks<I, R>(&self, tracks: I) -> TryJoinAll<Reply>
    where
        I: IntoIterator<Item = (String, String, R)>,
        R: AsyncRead + Send + Unpin + 'static,
    {
        // ---
        let replies: Vec<Reply> = tracks
            .into_iter()
            .map(|(name, format, data)| self.upload_track(name, format, data))
            .collect();

        try_join_all(replies)
    }

    /// Ask for suggestions for every key concurrently.
    ///
    /// Resolves to every answer in input order, or to the first failure.
    pub fn get_suggestions<I>(&self, keys: I) -> TryJoinAll<Reply>
    where
        I: IntoIterator<Item = TrackKey>,
    {
        // ---
        let replies: Vec<Reply> = keys
            .into_iter()
            .map(|key| self.get_suggestion(key))
            .collect();

        try_join_all(replies)
    }
}
