//! Domain events emitted by the Engine for external consumers
//!
//! Broadcast after each message processing cycle via `Engine::subscribe()`,
//! so subscribers see a consistent view of what changed.

use vibecast_core::{DropTarget, MessageTree};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    // ─────────────────────────────────────────────────────────
    // Connectivity
    // ─────────────────────────────────────────────────────────
    Connected,

    /// Connection lost; the reconnecting indicator should show
    Disconnected,

    // ─────────────────────────────────────────────────────────
    // Show State
    // ─────────────────────────────────────────────────────────
    /// The displayed tree was replaced (optimistic edit or snapshot)
    TreeChanged {
        tree: MessageTree,
        /// True while a local proposal is awaiting confirmation
        pending: bool,
    },

    /// A new authoritative snapshot was applied
    SnapshotApplied {
        active_visualization: String,
        message_count: usize,
    },

    /// The set of messages shown as playing changed
    ActiveMessagesChanged { active: Vec<String> },

    /// The drag insertion marker moved, appeared or disappeared
    DropTargetChanged { target: Option<DropTarget> },

    // ─────────────────────────────────────────────────────────
    // Outbound Commands
    // ─────────────────────────────────────────────────────────
    CommandSent { command: String },

    CommandFailed { command: String, error: String },

    // ─────────────────────────────────────────────────────────
    // Engine Lifecycle
    // ─────────────────────────────────────────────────────────
    Shutdown,
}

impl EngineEvent {
    /// Returns a short string label for this event type (for logging/debugging).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::TreeChanged { .. } => "tree_changed",
            Self::SnapshotApplied { .. } => "snapshot_applied",
            Self::ActiveMessagesChanged { .. } => "active_messages_changed",
            Self::DropTargetChanged { .. } => "drop_target_changed",
            Self::CommandSent { .. } => "command_sent",
            Self::CommandFailed { .. } => "command_failed",
            Self::Shutdown => "shutdown",
        }
    }
}
