use std::sync::{Arc, Mutex};

use futures_util::stream::{self, StreamExt};
use tokio::sync::broadcast;

use vibecast_core::prelude::*;
use vibecast_core::Snapshot;

use super::{EventStream, SyncTransport};
use crate::authority::ShowAuthority;
use crate::protocol::{RemoteCommand, ServerEvent};

/// Capacity of the in-process event fan-out
const EVENT_FANOUT_CAPACITY: usize = 256;

/// In-process transport hosting a [`ShowAuthority`].
///
/// Every posted command is applied under one lock and its resulting `state`
/// and `command` events are broadcast before the lock is released, so all
/// subscribers observe the same order. Clones share the authority.
#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    authority: Arc<Mutex<ShowAuthority>>,
    events_tx: broadcast::Sender<ServerEvent>,
}

impl LoopbackTransport {
    pub fn new(authority: ShowAuthority) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_FANOUT_CAPACITY);
        Self {
            authority: Arc::new(Mutex::new(authority)),
            events_tx,
        }
    }

    /// Current authoritative snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.authority
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .snapshot()
    }

    /// Number of open event streams
    pub fn subscriber_count(&self) -> usize {
        self.events_tx.receiver_count()
    }
}

impl SyncTransport for LoopbackTransport {
    async fn open_events(&self) -> Result<EventStream> {
        // subscribe before reading state so no broadcast falls in between
        let rx = self.events_tx.subscribe();
        let initial = ServerEvent::state(&self.snapshot())?;

        let updates = stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((Ok::<_, Error>(event), rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Loopback: subscriber lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        Ok(Box::pin(stream::once(async move { Ok::<_, Error>(initial) }).chain(updates)))
    }

    async fn post_command(&self, command: &RemoteCommand) -> Result<()> {
        let mut authority = self.authority.lock().unwrap_or_else(|e| e.into_inner());
        authority.apply_remote(command);

        let state = ServerEvent::state(&authority.snapshot())?;
        let echo = ServerEvent::command(command)?;
        // no subscribers is fine; the state is kept for the next stream
        let _ = self.events_tx.send(state);
        let _ = self.events_tx.send(echo);
        Ok(())
    }
}
