//! Transport seam between the sync client and the authoritative process.
//!
//! The client only needs two operations: open the inbound event stream, and
//! post one command. [`HttpTransport`] talks to a running process over HTTP;
//! [`LoopbackTransport`] hosts a [`ShowAuthority`](crate::ShowAuthority)
//! in-process.

mod http;
mod loopback;

use std::pin::Pin;

use futures_util::Stream;

use vibecast_core::prelude::*;

use crate::protocol::{RemoteCommand, ServerEvent};

pub use http::HttpTransport;
pub use loopback::LoopbackTransport;

/// Inbound event stream. Ends (or yields an error) when the connection drops.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ServerEvent>> + Send>>;

/// Duplex channel to the authoritative process
#[trait_variant::make(SyncTransport: Send)]
pub trait LocalSyncTransport {
    /// Open a fresh inbound event stream
    async fn open_events(&self) -> Result<EventStream>;

    /// Post a single command; resolves once the transport accepted or
    /// rejected it
    async fn post_command(&self, command: &RemoteCommand) -> Result<()>;
}
