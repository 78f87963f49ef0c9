//! Test doubles for the sync transport.
//!
//! Only compiled for tests or with the `test-helpers` feature.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use futures_util::stream;

use vibecast_core::prelude::*;
use vibecast_core::Snapshot;

use crate::protocol::{RemoteCommand, ServerEvent};
use crate::transport::{EventStream, SyncTransport};

/// Transport replaying scripted connection sessions.
///
/// Each `open_events` call consumes the next session: `None` refuses the
/// connection, `Some(events)` yields those events and then ends the stream.
/// Once the script runs out, streams stay open without yielding anything.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    sessions: Mutex<VecDeque<Option<Vec<ServerEvent>>>>,
    commands: Mutex<Vec<RemoteCommand>>,
    opens: AtomicUsize,
    reject_commands: AtomicBool,
    stall_commands: AtomicBool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a session that yields `events` and then drops
    pub fn push_session(&self, events: Vec<ServerEvent>) -> &Self {
        self.lock_sessions().push_back(Some(events));
        self
    }

    /// Queue a refused connection attempt
    pub fn push_refusal(&self) -> &Self {
        self.lock_sessions().push_back(None);
        self
    }

    /// Build a `state` event for `snapshot`
    pub fn state_event(snapshot: &Snapshot) -> ServerEvent {
        ServerEvent::state(snapshot).unwrap_or_else(|e| panic!("unserializable snapshot: {e}"))
    }

    /// Commands posted so far, in order
    pub fn commands(&self) -> Vec<RemoteCommand> {
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of `open_events` calls so far
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Answer every post with HTTP 500
    pub fn reject_commands(&self, reject: bool) {
        self.reject_commands.store(reject, Ordering::SeqCst);
    }

    /// Never resolve posted commands
    pub fn stall_commands(&self, stall: bool) {
        self.stall_commands.store(stall, Ordering::SeqCst);
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, VecDeque<Option<Vec<ServerEvent>>>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SyncTransport for ScriptedTransport {
    async fn open_events(&self) -> Result<EventStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let session = self.lock_sessions().pop_front();
        match session {
            Some(Some(events)) => Ok(Box::pin(stream::iter(events.into_iter().map(Ok::<_, Error>)))),
            Some(None) => Err(Error::transport("connection refused")),
            None => Ok(Box::pin(stream::pending::<Result<ServerEvent>>())),
        }
    }

    async fn post_command(&self, command: &RemoteCommand) -> Result<()> {
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(command.clone());

        if self.stall_commands.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.reject_commands.load(Ordering::SeqCst) {
            return Err(Error::CommandRejected {
                command: command.command.clone(),
                status: 500,
            });
        }
        Ok(())
    }
}
