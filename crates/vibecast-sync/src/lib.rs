//! # vibecast-sync - Show State Synchronization
//!
//! Keeps a surface's copy of the show state in step with the single
//! authoritative process.
//!
//! ## Public API
//!
//! ### Client
//! - [`SyncClient`] - Background inbound/outbound tasks over a transport
//! - [`CommandHandle`] - Clonable command sender
//! - [`SyncEvent`], [`ConnectionState`], [`SyncOptions`]
//!
//! ### Channel
//! - [`SyncChannel`] - Normalization, fingerprint dedup, latest snapshot
//! - [`normalize()`], [`fingerprint()`]
//!
//! ### Protocol
//! - [`Command`] - Typed commands, [`RemoteCommand`] - wire envelope
//! - [`ServerEvent`], [`Inbound`], [`parse_inbound()`], [`SseDecoder`]
//!
//! ### Transports
//! - [`SyncTransport`] - Transport seam
//! - [`HttpTransport`] - Server-sent events plus JSON POST
//! - [`LoopbackTransport`] - In-process [`ShowAuthority`]

pub mod authority;
pub mod channel;
pub mod client;
pub mod protocol;
pub mod transport;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use authority::{Applied, ShowAuthority};
pub use channel::{fingerprint, normalize, SyncChannel};
pub use client::{
    CommandHandle, ConnectionState, SyncClient, SyncEvent, SyncOptions, DEFAULT_RECONNECT_DELAY,
};
pub use protocol::{
    decode_event_stream, parse_inbound, Command, Inbound, RemoteCommand, ServerEvent, SseDecoder,
    COMMAND_EVENT, STATE_EVENT,
};
pub use transport::{EventStream, HttpTransport, LocalSyncTransport, LoopbackTransport, SyncTransport};
