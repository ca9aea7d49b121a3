//! Transport implementations.
//!
//! This module provides concrete implementations of the domain-level
//! `Transport` trait, exposed only through constructor functions.
//!
//! Domain code must not depend on transport-specific types.

mod memory;
mod websocket;

pub use memory::{
    //
    create_memory_transport,
    create_memory_transport_with_hub,
    memory_pair,
    MemoryHub,
    MemoryPeer,
    MemoryServer,
};

pub use websocket::{
    //
    create_websocket_transport,
    DEFAULT_ENDPOINT,
    DEFAULT_SUBPROTOCOL,
};
