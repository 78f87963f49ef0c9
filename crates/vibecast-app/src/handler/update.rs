//! Main update function - handles state transitions (TEA pattern)

use vibecast_sync::Command;

use super::{drag, show, sync, tree, UpdateResult};
use crate::message::Message;
use crate::state::AppState;

/// Process a message and update state
/// Returns an optional follow-up action or message
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    match message {
        // ─────────────────────────────────────────────────────────
        // Sync
        // ─────────────────────────────────────────────────────────
        Message::SyncConnected => sync::handle_connected(state),
        Message::SyncDisconnected { reason } => sync::handle_disconnected(state, &reason),
        Message::SnapshotReceived(snapshot) => sync::handle_snapshot(state, snapshot),
        Message::CommandEchoed(command) => sync::handle_echo(state, &command),

        // ─────────────────────────────────────────────────────────
        // Tree Edits
        // ─────────────────────────────────────────────────────────
        Message::AddFolder { parent_id, name } => {
            tree::handle_add_folder(state, parent_id.as_deref(), &name)
        }
        Message::AddMessage { parent_id, message } => {
            tree::handle_add_message(state, parent_id.as_deref(), message)
        }
        Message::DeleteNode { id } => tree::handle_delete(state, &id),
        Message::UpdateMessage(message) => tree::handle_update_message(state, message),
        Message::RenameFolder { id, name } => tree::handle_rename_folder(state, &id, &name),
        Message::ToggleCollapse { id } => tree::handle_toggle_collapse(state, &id),

        // ─────────────────────────────────────────────────────────
        // Drag and Drop
        // ─────────────────────────────────────────────────────────
        Message::DragStart { id, pointer } => drag::handle_drag_start(state, &id, pointer),
        Message::DragMove { pointer, bounds } => drag::handle_drag_move(state, pointer, &bounds),
        Message::DragEnd => drag::handle_drag_end(state),
        Message::DragCancel => drag::handle_drag_cancel(state),

        // ─────────────────────────────────────────────────────────
        // Show Control
        // ─────────────────────────────────────────────────────────
        Message::TriggerMessage { id } => show::handle_trigger(state, &id),
        Message::ClearActiveMessage { id } => show::handle_clear_active(state, &id),
        Message::MessageComplete { id } => show::handle_message_complete(state, &id),
        Message::PlayFolder { id } => show::handle_play_folder(state, &id),
        Message::LoadConfiguration(document) => show::handle_load_configuration(state, document),
        Message::CancelFolderPlayback => UpdateResult::send(Command::CancelFolderPlayback),
        Message::ResetStats => UpdateResult::send(Command::ResetMessageStats),
        Message::SetActiveVisualization(id) => {
            UpdateResult::send(Command::SetActiveVisualization(id))
        }
        Message::SetActiveVisualizationPreset(id) => {
            UpdateResult::send(Command::SetActiveVisualizationPreset(id))
        }
        Message::SetEnabledVisualizations(ids) => {
            UpdateResult::send(Command::SetEnabledVisualizations(ids))
        }
        Message::SetCommonSettings(settings) => {
            UpdateResult::send(Command::SetCommonSettings(settings))
        }
        Message::SetVisualizationSettings(value) => {
            UpdateResult::send(Command::SetVisualizationSettings(value))
        }
        Message::SetVisualizationPresets(presets) => {
            UpdateResult::send(Command::SetVisualizationPresets(presets))
        }
        Message::SetDefaultTextStyle(style) => {
            UpdateResult::send(Command::SetDefaultTextStyle(style))
        }
        Message::SetTextStyleSettings(value) => {
            UpdateResult::send(Command::SetTextStyleSettings(value))
        }
        Message::SetTextStylePresets(presets) => {
            UpdateResult::send(Command::SetTextStylePresets(presets))
        }

        // ─────────────────────────────────────────────────────────
        // Outbound Results
        // ─────────────────────────────────────────────────────────
        Message::CommandSent { command } => sync::handle_command_sent(state, &command),
        Message::CommandFailed { command, error } => {
            sync::handle_command_failed(state, &command, &error)
        }
    }
}
