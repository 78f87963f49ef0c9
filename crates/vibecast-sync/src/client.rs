//! Background sync client.
//!
//! [`SyncClient::spawn`] starts two tasks over a shared [`SyncTransport`]:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        SyncClient                           │
//! │                                                             │
//! │  CommandHandle::send() ──cmd──▶ outbound task               │
//! │                          chan    one spawned post per cmd   │
//! │                                                             │
//! │  event_receiver()  ◀──evt──── inbound task                  │
//! │  latest_snapshot() ◀─watch──  open → pump → fixed-delay     │
//! │                               retry, forever                │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! The inbound task stops once every event receiver is dropped; the outbound
//! task stops once every [`CommandHandle`] is dropped.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot, watch};

use vibecast_core::prelude::*;
use vibecast_core::Snapshot;

use crate::channel::SyncChannel;
use crate::protocol::{parse_inbound, Command, Inbound, RemoteCommand};
use crate::transport::{EventStream, SyncTransport};

// ---------------------------------------------------------------------------
// Tuning constants
// ---------------------------------------------------------------------------

/// Delay between inbound reconnection attempts
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Capacity of the command channel from handles to the outbound task.
const CMD_CHANNEL_CAPACITY: usize = 32;

/// Capacity of the inbound event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Inbound connection state
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// Not connected and not trying (client shut down)
    Disconnected,
    /// First connection attempt in progress
    Connecting,
    /// Event stream open
    Connected,
    /// Connection lost or refused; retrying after the reconnect delay
    Reconnecting { attempt: u32 },
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub reconnect_delay: Duration,
    /// Upper bound on a single command post; `None` waits indefinitely
    pub command_timeout: Option<Duration>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            command_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// What the inbound task reports to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Connected,
    Disconnected { reason: String },
    /// A normalized snapshot that differs from the previous one
    Snapshot(Arc<Snapshot>),
    /// Echo of a command the authority applied
    Command(RemoteCommand),
}

// ---------------------------------------------------------------------------
// Internal command type
// ---------------------------------------------------------------------------

enum ClientCommand {
    Send {
        command: RemoteCommand,
        response_tx: oneshot::Sender<Result<()>>,
    },
}

// ---------------------------------------------------------------------------
// CommandHandle
// ---------------------------------------------------------------------------

/// Clonable handle for sending commands upstream.
///
/// Dropping the future returned by [`send`](Self::send) cancels the post;
/// a cancelled or failed command is never retried.
#[derive(Clone)]
pub struct CommandHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
    state: Arc<std::sync::RwLock<ConnectionState>>,
}

impl std::fmt::Debug for CommandHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandle")
            .field("connection_state", &self.connection_state())
            .finish()
    }
}

impl CommandHandle {
    /// Encode and post one command, resolving with the transport outcome.
    ///
    /// # Errors
    ///
    /// - [`Error::ChannelClosed`] if the outbound task has exited.
    /// - [`Error::CommandRejected`] / [`Error::Transport`] from the transport.
    /// - [`Error::CommandTimeout`] if the configured timeout elapsed.
    pub async fn send(&self, command: &Command) -> Result<()> {
        self.send_remote(command.to_remote()?).await
    }

    pub async fn send_remote(&self, command: RemoteCommand) -> Result<()> {
        let (response_tx, response_rx) = oneshot::channel();
        self.cmd_tx
            .send(ClientCommand::Send {
                command,
                response_tx,
            })
            .await
            .map_err(|_| Error::ChannelClosed)?;

        response_rx.await.map_err(|_| Error::ChannelClosed)?
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_connected(&self) -> bool {
        *self.state.read().unwrap_or_else(|e| e.into_inner()) == ConnectionState::Connected
    }
}

// ---------------------------------------------------------------------------
// SyncClient
// ---------------------------------------------------------------------------

/// Owner of the inbound event receiver and the latest-snapshot watch
pub struct SyncClient {
    handle: CommandHandle,
    event_rx: mpsc::Receiver<SyncEvent>,
    snapshot_rx: watch::Receiver<Option<Arc<Snapshot>>>,
}

impl SyncClient {
    /// Start the inbound and outbound tasks. Must be called inside a Tokio
    /// runtime. Connection happens in the background; watch
    /// [`SyncEvent::Connected`] to know when the stream is up.
    pub fn spawn<T>(transport: Arc<T>, options: SyncOptions) -> Self
    where
        T: SyncTransport + Sync + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<ClientCommand>(CMD_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel::<SyncEvent>(EVENT_CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let state = Arc::new(std::sync::RwLock::new(ConnectionState::Connecting));

        tokio::spawn(run_inbound_task(
            Arc::clone(&transport),
            options.reconnect_delay,
            event_tx,
            snapshot_tx,
            Arc::clone(&state),
        ));
        tokio::spawn(run_outbound_task(transport, cmd_rx, options.command_timeout));

        Self {
            handle: CommandHandle { cmd_tx, state },
            event_rx,
            snapshot_rx,
        }
    }

    pub fn command_handle(&self) -> CommandHandle {
        self.handle.clone()
    }

    pub fn event_receiver(&mut self) -> &mut mpsc::Receiver<SyncEvent> {
        &mut self.event_rx
    }

    /// Latest accepted snapshot, if any arrived yet
    pub fn latest_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot_rx.borrow().clone()
    }

    /// Watch that changes whenever a new snapshot is accepted
    pub fn snapshot_watch(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshot_rx.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.handle.connection_state()
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_connected()
    }

    pub fn into_parts(self) -> (CommandHandle, mpsc::Receiver<SyncEvent>) {
        (self.handle, self.event_rx)
    }
}

// ---------------------------------------------------------------------------
// Inbound task
// ---------------------------------------------------------------------------

enum StreamExit {
    /// Nobody listens any more
    Closed,
    /// Connection dropped; reconnect
    Lost(String),
}

fn set_state(state: &std::sync::RwLock<ConnectionState>, next: ConnectionState) {
    let mut guard = state.write().unwrap_or_else(|e| e.into_inner());
    *guard = next;
}

async fn run_inbound_task<T>(
    transport: Arc<T>,
    reconnect_delay: Duration,
    event_tx: mpsc::Sender<SyncEvent>,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    state: Arc<std::sync::RwLock<ConnectionState>>,
) where
    T: SyncTransport + Sync + 'static,
{
    let mut channel = SyncChannel::new();
    let mut attempt: u32 = 0;

    loop {
        let opened = tokio::select! {
            _ = event_tx.closed() => break,
            opened = transport.open_events() => opened,
        };

        match opened {
            Ok(events) => {
                info!("Sync: connected");
                attempt = 0;
                set_state(&state, ConnectionState::Connected);
                channel.set_connected(true);
                if event_tx.send(SyncEvent::Connected).await.is_err() {
                    break;
                }

                let reason = match pump_events(events, &mut channel, &event_tx, &snapshot_tx).await
                {
                    StreamExit::Closed => break,
                    StreamExit::Lost(reason) => reason,
                };

                channel.set_connected(false);
                warn!("Sync: connection lost: {}", reason);
                if event_tx
                    .send(SyncEvent::Disconnected { reason })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Err(err) => {
                warn!("Sync: connection attempt failed: {}", err);
            }
        }

        attempt += 1;
        set_state(&state, ConnectionState::Reconnecting { attempt });
        debug!(
            "Sync: retrying in {:?} (attempt {})",
            reconnect_delay, attempt
        );
        tokio::select! {
            _ = event_tx.closed() => break,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }

    set_state(&state, ConnectionState::Disconnected);
    debug!("Sync: inbound task exiting");
}

/// Drive one open stream until it ends or the receiver goes away.
///
/// Malformed events are logged and discarded; they never end the stream.
async fn pump_events(
    mut events: EventStream,
    channel: &mut SyncChannel,
    event_tx: &mpsc::Sender<SyncEvent>,
    snapshot_tx: &watch::Sender<Option<Arc<Snapshot>>>,
) -> StreamExit {
    loop {
        let next = tokio::select! {
            _ = event_tx.closed() => return StreamExit::Closed,
            next = events.next() => next,
        };

        let event = match next {
            Some(Ok(event)) => event,
            Some(Err(err)) => return StreamExit::Lost(err.to_string()),
            None => return StreamExit::Lost("event stream ended".to_string()),
        };

        let forwarded = match parse_inbound(&event) {
            Ok(Some(Inbound::State(snapshot))) => channel.ingest(snapshot).map(|accepted| {
                snapshot_tx.send_replace(Some(Arc::clone(&accepted)));
                SyncEvent::Snapshot(accepted)
            }),
            Ok(Some(Inbound::Command(command))) => Some(SyncEvent::Command(command)),
            Ok(None) => {
                trace!("Sync: ignoring '{}' event", event.event);
                None
            }
            Err(err) => {
                warn!("Sync: discarding malformed '{}' event: {}", event.event, err);
                None
            }
        };

        if let Some(forwarded) = forwarded {
            if event_tx.send(forwarded).await.is_err() {
                return StreamExit::Closed;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound task
// ---------------------------------------------------------------------------

async fn run_outbound_task<T>(
    transport: Arc<T>,
    mut cmd_rx: mpsc::Receiver<ClientCommand>,
    command_timeout: Option<Duration>,
) where
    T: SyncTransport + Sync + 'static,
{
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            ClientCommand::Send {
                command,
                response_tx,
            } => {
                // posts run concurrently; the caller may fire more before one resolves
                tokio::spawn(dispatch(
                    Arc::clone(&transport),
                    command,
                    response_tx,
                    command_timeout,
                ));
            }
        }
    }
    debug!("Sync: command channel closed, outbound task exiting");
}

async fn dispatch<T>(
    transport: Arc<T>,
    command: RemoteCommand,
    mut response_tx: oneshot::Sender<Result<()>>,
    command_timeout: Option<Duration>,
) where
    T: SyncTransport + Sync + 'static,
{
    tokio::select! {
        _ = response_tx.closed() => {
            debug!("Sync: '{}' cancelled by caller", command.command);
        }
        result = post(transport.as_ref(), &command, command_timeout) => {
            match &result {
                Ok(()) => trace!("Sync: '{}' accepted", command.command),
                Err(err) => warn!("Sync: '{}' failed: {}", command.command, err),
            }
            let _ = response_tx.send(result);
        }
    }
}

async fn post<T: SyncTransport>(
    transport: &T,
    command: &RemoteCommand,
    command_timeout: Option<Duration>,
) -> Result<()> {
    match command_timeout {
        Some(limit) => tokio::time::timeout(limit, transport.post_command(command))
            .await
            .map_err(|_| Error::CommandTimeout {
                command: command.command.clone(),
            })?,
        None => transport.post_command(command).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ServerEvent;
    use crate::test_utils::ScriptedTransport;
    use vibecast_core::MessageConfig;

    fn snapshot_with(visualization: &str) -> Snapshot {
        Snapshot {
            active_visualization: visualization.to_string(),
            messages: vec![MessageConfig::new("a", "A")],
            ..Snapshot::default()
        }
    }

    fn options() -> SyncOptions {
        SyncOptions {
            reconnect_delay: Duration::from_millis(100),
            command_timeout: Some(Duration::from_secs(1)),
        }
    }

    async fn next_event(client: &mut SyncClient) -> SyncEvent {
        client.event_receiver().recv().await.unwrap()
    }

    #[test]
    fn test_default_options() {
        let options = SyncOptions::default();
        assert_eq!(options.reconnect_delay, Duration::from_secs(3));
        assert_eq!(options.command_timeout, Some(Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_snapshots_forwarded_once() {
        let transport = Arc::new(ScriptedTransport::new());
        let a = ScriptedTransport::state_event(&snapshot_with("fireplace"));
        let b = ScriptedTransport::state_event(&snapshot_with("techno"));
        transport.push_session(vec![a.clone(), a, b]);

        let mut client = SyncClient::spawn(Arc::clone(&transport), options());
        assert_eq!(next_event(&mut client).await, SyncEvent::Connected);

        match next_event(&mut client).await {
            SyncEvent::Snapshot(s) => {
                assert_eq!(s.active_visualization, "fireplace");
                // normalized on the way in
                assert_eq!(s.tree().len(), 1);
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
        match next_event(&mut client).await {
            SyncEvent::Snapshot(s) => assert_eq!(s.active_visualization, "techno"),
            other => panic!("expected snapshot, got {:?}", other),
        }
        assert!(matches!(
            next_event(&mut client).await,
            SyncEvent::Disconnected { .. }
        ));
        assert_eq!(
            client.latest_snapshot().unwrap().active_visualization,
            "techno"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_refusal_and_drop() {
        let transport = Arc::new(ScriptedTransport::new());
        let state = ScriptedTransport::state_event(&snapshot_with("fireplace"));
        transport
            .push_refusal()
            .push_session(vec![state.clone()])
            .push_session(vec![state]);

        let mut client = SyncClient::spawn(Arc::clone(&transport), options());
        assert_eq!(next_event(&mut client).await, SyncEvent::Connected);
        assert_eq!(transport.open_count(), 2);
        assert!(matches!(next_event(&mut client).await, SyncEvent::Snapshot(_)));
        assert!(matches!(
            next_event(&mut client).await,
            SyncEvent::Disconnected { .. }
        ));

        // same state after reconnect is a duplicate and is not forwarded
        assert_eq!(next_event(&mut client).await, SyncEvent::Connected);
        assert!(matches!(
            next_event(&mut client).await,
            SyncEvent::Disconnected { .. }
        ));
        assert_eq!(transport.open_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_events_are_discarded() {
        let transport = Arc::new(ScriptedTransport::new());
        let echo = RemoteCommand::new("play-folder", serde_json::json!({"folderId": "f"}));
        transport.push_session(vec![
            ServerEvent::new("state", "{not json"),
            ServerEvent::new("ping", "{}"),
            ServerEvent::command(&echo).unwrap(),
            ScriptedTransport::state_event(&snapshot_with("particles")),
        ]);

        let mut client = SyncClient::spawn(Arc::clone(&transport), options());
        assert_eq!(next_event(&mut client).await, SyncEvent::Connected);
        assert_eq!(next_event(&mut client).await, SyncEvent::Command(echo));
        match next_event(&mut client).await {
            SyncEvent::Snapshot(s) => assert_eq!(s.active_visualization, "particles"),
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_posts_command() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut client = SyncClient::spawn(Arc::clone(&transport), options());
        assert_eq!(next_event(&mut client).await, SyncEvent::Connected);
        assert!(client.is_connected());
        let handle = client.command_handle();

        handle.send(&Command::ResetMessageStats).await.unwrap();
        let posted = transport.commands();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].command, "reset-message-stats");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_command_surfaces_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reject_commands(true);
        let client = SyncClient::spawn(Arc::clone(&transport), options());

        let err = client
            .command_handle()
            .send(&Command::CancelFolderPlayback)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommandRejected { status: 500, .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_command_times_out() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.stall_commands(true);
        let client = SyncClient::spawn(Arc::clone(&transport), options());

        let err = client
            .command_handle()
            .send(&Command::ResetMessageStats)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommandTimeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inbound_task_stops_when_receiver_dropped() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = SyncClient::spawn(Arc::clone(&transport), options());
        let (handle, event_rx) = client.into_parts();
        drop(event_rx);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(handle.connection_state(), ConnectionState::Disconnected);
    }
}
