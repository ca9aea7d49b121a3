//! Client-side RPC over a persistent WebSocket connection to a music
//! library server.
//!
//! A [`Session`] multiplexes many concurrent requests over one connection,
//! matches answers to requests by a 128-bit correlation id, buffers
//! requests while disconnected, reconnects on its own and fans server
//! pushes out to listeners.
//!
//! ```no_run
//! use hex_rpc::{Session, SessionConfig, Transition, TransportBuilder};
//!
//! # async fn example() -> hex_rpc::Result<()> {
//! let transport = TransportBuilder::new()
//!     .uri("ws://localhost:2794")
//!     .build()
//!     .await?;
//!
//! let session = Session::open(transport, SessionConfig::new("player"));
//!
//! session.on_transition(|transition: &Transition| {
//!     println!("library changed: {transition:?}");
//! });
//!
//! let summary = session.get_summary().await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

// Import all sub modules once...
mod calls;
mod domain;
mod protocol;
mod session;
mod transport;

mod config;
mod session_builder;
mod transport_builder;

mod correlation;
mod error;
mod macros;

pub(crate) use macros::{log_debug, log_error, log_info, log_warn};

// Re-export main types
pub use session::{
    // ---
    ConnectionState,
    Listener,
    ListenerHandle,
    Reply,
    Session,
};

pub use calls::{SearchSession, StreamSession};

pub use config::{SessionConfig, DEFAULT_RECONNECT_DELAY};
pub use session_builder::SessionBuilder;
pub use transport_builder::TransportBuilder;

pub use correlation::{CorrelationId, IdStrategy};
pub use error::{Result, RpcError};

pub use protocol::{
    // ---
    Action,
    Answer,
    Body,
    Codec,
    CodecPtr,
    JsonCodec,
    Playlist,
    PlaylistKey,
    Request,
    TokenKey,
    TrackKey,
    Transition,
    WireRequest,
};

pub use transport::{
    // ---
    create_memory_transport,
    create_memory_transport_with_hub,
    create_websocket_transport,
    memory_pair,
    MemoryHub,
    MemoryPeer,
    MemoryServer,
    DEFAULT_ENDPOINT,
    DEFAULT_SUBPROTOCOL,
};

// --- public re-exports
pub use domain::{
    //
    CloseReason,
    Link,
    LinkEvent,
    Transport,
    TransportConfig,
    TransportPtr,
};
