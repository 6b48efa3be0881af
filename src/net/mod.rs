//! # Networking
//!
//! Two-player games over TCP: the line protocol, the shared [`Lobby`] and the tokio
//! server that feeds it.

pub mod lobby;
pub mod protocol;
pub mod server;

pub use lobby::*;
pub use protocol::*;
pub use server::*;
