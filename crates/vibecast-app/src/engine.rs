//! Engine - single-owner orchestration state for all front ends
//!
//! The Engine owns the TEA state, the message channel, the sync client's
//! command handle, the shutdown signal and the event broadcaster. Every
//! mutation flows through [`Engine::process_message`]; observers subscribe to
//! [`EngineEvent`]s.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vibecast_core::{flatten, ConfigDocument, DropTarget, MessageTree, Snapshot};
use vibecast_sync::{CommandHandle, SyncClient, SyncEvent, SyncTransport};

use crate::config::{self, Settings};
use crate::engine_event::EngineEvent;
use crate::message::Message;
use crate::process;
use crate::state::AppState;

/// Capacity of the unified message channel
const MSG_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the engine event broadcast
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Lightweight snapshot of state for change detection.
///
/// Captured before message processing, compared after to detect
/// what changed and emit appropriate EngineEvents.
#[derive(Debug, Clone)]
struct StateSnapshot {
    connected: bool,
    tree: MessageTree,
    pending: bool,
    confirmed: Option<Arc<Snapshot>>,
    active: BTreeSet<String>,
    drop_target: Option<DropTarget>,
}

impl StateSnapshot {
    fn capture(state: &AppState) -> Self {
        Self {
            connected: state.connected,
            tree: state.displayed_tree().to_vec(),
            pending: state.reconciler.has_pending_proposal(),
            confirmed: state.confirmed().cloned(),
            active: state.active_messages.clone(),
            drop_target: state.drag.target().cloned(),
        }
    }
}

/// Orchestration engine for VibeCast.
///
/// Encapsulates:
/// - TEA state management
/// - Message channel
/// - Sync client (command handle plus an event bridge task)
/// - Shutdown signaling
/// - Settings
/// - Event broadcasting for external consumers
pub struct Engine {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Sender half of the unified message channel.
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the unified message channel.
    pub msg_rx: mpsc::Receiver<Message>,

    /// Send `true` to initiate shutdown.
    pub shutdown_tx: watch::Sender<bool>,

    pub shutdown_rx: watch::Receiver<bool>,

    /// Loaded settings
    pub settings: Settings,

    pub project_path: PathBuf,

    commands: CommandHandle,

    /// Forwards sync client events into the message channel
    bridge: Option<JoinHandle<()>>,

    event_tx: broadcast::Sender<EngineEvent>,
}

impl Engine {
    /// Create an Engine for `project_path`, loading `.vibecast/config.toml`.
    /// Must be called inside a Tokio runtime.
    pub fn new<T>(project_path: PathBuf, transport: Arc<T>) -> Self
    where
        T: SyncTransport + Sync + 'static,
    {
        let settings = config::load_settings(&project_path);
        Self::with_settings(project_path, settings, transport)
    }

    pub fn with_settings<T>(project_path: PathBuf, settings: Settings, transport: Arc<T>) -> Self
    where
        T: SyncTransport + Sync + 'static,
    {
        let state = AppState::with_settings(settings.clone());
        let (msg_tx, msg_rx) = mpsc::channel::<Message>(MSG_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let client = SyncClient::spawn(transport, settings.connection.sync_options());
        let (commands, sync_rx) = client.into_parts();
        let bridge = tokio::spawn(bridge_sync_events(
            sync_rx,
            msg_tx.clone(),
            shutdown_rx.clone(),
        ));

        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            state,
            msg_tx,
            msg_rx,
            shutdown_tx,
            shutdown_rx,
            settings,
            project_path,
            commands,
            bridge: Some(bridge),
            event_tx,
        }
    }

    /// Subscribe to engine events.
    ///
    /// Slow subscribers lose the oldest events (`RecvError::Lagged`).
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Process a single message through the TEA update cycle and emit
    /// events for whatever changed.
    pub fn process_message(&mut self, msg: Message) {
        let pre = StateSnapshot::capture(&self.state);
        let outcome = match &msg {
            Message::CommandSent { command } => Some(EngineEvent::CommandSent {
                command: command.clone(),
            }),
            Message::CommandFailed { command, error } => Some(EngineEvent::CommandFailed {
                command: command.clone(),
                error: error.clone(),
            }),
            _ => None,
        };

        process::process_message(
            &mut self.state,
            msg,
            &self.msg_tx,
            &self.commands,
            &self.shutdown_rx,
        );

        let post = StateSnapshot::capture(&self.state);
        self.emit_events(&pre, &post);
        if let Some(event) = outcome {
            self.emit(event);
        }
    }

    /// Drain and process all pending messages. Returns how many ran.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
            count += 1;
        }
        count
    }

    /// Wait for the next message and process it. Returns false once the
    /// channel is closed.
    pub async fn process_next(&mut self) -> bool {
        match self.msg_rx.recv().await {
            Some(msg) => {
                self.process_message(msg);
                true
            }
            None => false,
        }
    }

    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    pub fn command_handle(&self) -> CommandHandle {
        self.commands.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    /// Current canonical state as a persistable document
    pub fn configuration_document(&self) -> Option<ConfigDocument> {
        self.state
            .confirmed()
            .map(|snapshot| ConfigDocument::from_snapshot(snapshot))
    }

    /// Stop the sync bridge and cancel in-flight commands.
    pub async fn shutdown(&mut self) {
        self.emit(EngineEvent::Shutdown);
        let _ = self.shutdown_tx.send(true);

        if let Some(bridge) = self.bridge.take() {
            match tokio::time::timeout(Duration::from_secs(2), bridge).await {
                Ok(Ok(())) => debug!("Sync bridge stopped"),
                Ok(Err(e)) => warn!("Sync bridge panicked: {}", e),
                Err(_) => warn!("Sync bridge shutdown timed out"),
            }
        }
        info!("Engine shut down");
    }

    fn emit_events(&self, pre: &StateSnapshot, post: &StateSnapshot) {
        if pre.connected != post.connected {
            self.emit(if post.connected {
                EngineEvent::Connected
            } else {
                EngineEvent::Disconnected
            });
        }

        let snapshot_changed = match (&pre.confirmed, &post.confirmed) {
            (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
            (None, None) => false,
            _ => true,
        };
        if snapshot_changed {
            if let Some(snapshot) = &post.confirmed {
                self.emit(EngineEvent::SnapshotApplied {
                    active_visualization: snapshot.active_visualization.clone(),
                    message_count: flatten(snapshot.tree()).len(),
                });
            }
        }

        if pre.tree != post.tree || pre.pending != post.pending {
            self.emit(EngineEvent::TreeChanged {
                tree: post.tree.clone(),
                pending: post.pending,
            });
        }

        if pre.active != post.active {
            self.emit(EngineEvent::ActiveMessagesChanged {
                active: post.active.iter().cloned().collect(),
            });
        }

        if pre.drop_target != post.drop_target {
            self.emit(EngineEvent::DropTargetChanged {
                target: post.drop_target.clone(),
            });
        }
    }

    /// send() only fails with no subscribers, which is fine.
    fn emit(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Map sync client events onto TEA messages until shutdown or either
/// channel closes. Dropping the sync receiver stops the inbound task.
async fn bridge_sync_events(
    mut sync_rx: mpsc::Receiver<SyncEvent>,
    msg_tx: mpsc::Sender<Message>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        let event = tokio::select! {
            event = sync_rx.recv() => event,
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
        };

        let Some(event) = event else { break };
        let message = match event {
            SyncEvent::Connected => Message::SyncConnected,
            SyncEvent::Disconnected { reason } => Message::SyncDisconnected { reason },
            SyncEvent::Snapshot(snapshot) => Message::SnapshotReceived(snapshot),
            SyncEvent::Command(command) => Message::CommandEchoed(command),
        };
        if msg_tx.send(message).await.is_err() {
            break;
        }
    }
    debug!("Sync bridge exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vibecast_core::{MessageConfig, TreeNode};
    use vibecast_sync::test_utils::ScriptedTransport;

    fn show() -> Snapshot {
        Snapshot {
            active_visualization: "fireplace".into(),
            message_tree: Some(vec![
                TreeNode::message(MessageConfig::new("a", "A")),
                TreeNode::message(MessageConfig::new("b", "B")),
            ]),
            ..Snapshot::default()
        }
    }

    fn engine(transport: &Arc<ScriptedTransport>) -> (TempDir, Engine) {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::with_settings(
            dir.path().to_path_buf(),
            Settings::default(),
            Arc::clone(transport),
        );
        (dir, engine)
    }

    async fn wait_until(engine: &mut Engine, done: impl Fn(&AppState) -> bool) {
        tokio::time::timeout(Duration::from_secs(30), async {
            while !done(&engine.state) {
                assert!(engine.process_next().await);
            }
        })
        .await
        .expect("timed out waiting for engine state");
    }

    fn drain(events: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_emits_events() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_session(vec![ScriptedTransport::state_event(&show())]);
        let (_dir, mut engine) = engine(&transport);
        let mut events = engine.subscribe();

        wait_until(&mut engine, |s| s.confirmed().is_some()).await;

        let emitted = drain(&mut events);
        assert_eq!(emitted[0], EngineEvent::Connected);
        assert!(emitted.contains(&EngineEvent::SnapshotApplied {
            active_visualization: "fireplace".into(),
            message_count: 2,
        }));
        assert!(emitted
            .iter()
            .any(|e| matches!(e, EngineEvent::TreeChanged { tree, pending: false } if tree.len() == 2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_command_keeps_optimistic_tree() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_session(vec![ScriptedTransport::state_event(&show())]);
        transport.reject_commands(true);
        let (_dir, mut engine) = engine(&transport);
        wait_until(&mut engine, |s| s.confirmed().is_some()).await;
        let mut events = engine.subscribe();

        engine.process_message(Message::DeleteNode { id: "a".into() });
        assert_eq!(engine.state.commands_in_flight, 1);
        wait_until(&mut engine, |s| s.commands_in_flight == 0).await;

        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, EngineEvent::CommandFailed { command, .. } if command == "set-message-tree")));
        assert!(engine.state.last_command_error.is_some());
        assert_eq!(engine.state.displayed_tree().len(), 1);
        assert_eq!(transport.commands()[0].command, "set-message-tree");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_in_flight_commands() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_session(vec![ScriptedTransport::state_event(&show())]);
        transport.stall_commands(true);
        let (_dir, mut engine) = engine(&transport);
        wait_until(&mut engine, |s| s.confirmed().is_some()).await;

        engine.process_message(Message::TriggerMessage { id: "b".into() });
        tokio::time::sleep(Duration::from_millis(10)).await;
        engine.shutdown().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        // a cancelled command reports nothing
        let processed: Vec<bool> = std::iter::from_fn(|| engine.msg_rx.try_recv().ok())
            .map(|msg| matches!(msg, Message::CommandSent { .. } | Message::CommandFailed { .. }))
            .collect();
        assert!(!processed.contains(&true));
        assert!(engine.state.last_command_error.is_none());
        assert!(engine.state.is_active("b"));
    }
}
