//! Message types for the application (TEA pattern)

use std::sync::Arc;

use vibecast_core::{
    CommonSettings, ConfigDocument, MessageConfig, Point, RowBounds, Snapshot, TextStylePreset,
    VisualizationPreset,
};
use vibecast_sync::RemoteCommand;

/// All possible messages/actions in the application
#[derive(Debug, Clone)]
pub enum Message {
    // ─────────────────────────────────────────────────────────
    // Sync
    // ─────────────────────────────────────────────────────────
    /// Inbound event stream opened
    SyncConnected,

    /// Inbound event stream lost; the client keeps retrying
    SyncDisconnected { reason: String },

    /// New (deduplicated, normalized) authoritative snapshot
    SnapshotReceived(Arc<Snapshot>),

    /// The authority echoed a command it applied
    CommandEchoed(RemoteCommand),

    // ─────────────────────────────────────────────────────────
    // Tree Edits
    // ─────────────────────────────────────────────────────────
    /// Append a new empty folder to the root, or to folder `parent_id`
    AddFolder {
        parent_id: Option<String>,
        name: String,
    },

    /// Append a message; an empty or taken id is replaced with a fresh one
    AddMessage {
        parent_id: Option<String>,
        message: MessageConfig,
    },

    /// Delete the folder or message with `id`, with its subtree
    DeleteNode { id: String },

    /// Replace the message with the same id
    UpdateMessage(MessageConfig),

    RenameFolder { id: String, name: String },

    ToggleCollapse { id: String },

    // ─────────────────────────────────────────────────────────
    // Drag and Drop
    // ─────────────────────────────────────────────────────────
    /// Pointer down on the grip of node `id`
    DragStart { id: String, pointer: Point },

    /// Pointer moved; `bounds` are the rendered rows, parallel to the
    /// visible rows of the displayed tree
    DragMove {
        pointer: Point,
        bounds: Vec<RowBounds>,
    },

    /// Pointer released: commit the last resolved target
    DragEnd,

    /// Pointer cancelled
    DragCancel,

    // ─────────────────────────────────────────────────────────
    // Show Control
    // ─────────────────────────────────────────────────────────
    TriggerMessage { id: String },
    ClearActiveMessage { id: String },
    MessageComplete { id: String },
    PlayFolder { id: String },
    CancelFolderPlayback,
    ResetStats,
    SetActiveVisualization(Option<String>),
    SetActiveVisualizationPreset(Option<String>),
    SetEnabledVisualizations(Vec<String>),
    SetCommonSettings(CommonSettings),
    SetVisualizationSettings(serde_json::Value),
    SetVisualizationPresets(Vec<VisualizationPreset>),
    SetDefaultTextStyle(String),
    SetTextStyleSettings(serde_json::Value),
    SetTextStylePresets(Vec<TextStylePreset>),
    LoadConfiguration(Box<ConfigDocument>),

    // ─────────────────────────────────────────────────────────
    // Outbound Results
    // ─────────────────────────────────────────────────────────
    /// The transport accepted a command
    CommandSent { command: String },

    /// A command failed or timed out; optimistic state is left as is
    CommandFailed { command: String, error: String },
}
