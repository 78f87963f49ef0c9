//! Playback and configuration handlers

use vibecast_core::prelude::*;
use vibecast_core::{find_folder, now_millis, ConfigDocument};
use vibecast_sync::Command;

use super::UpdateResult;
use crate::state::AppState;

/// Mark the message active right away and ask the authority to play it
pub fn handle_trigger(state: &mut AppState, id: &str) -> UpdateResult {
    let Some(message) = state.find_message(id) else {
        warn!("Trigger: no message {}", id);
        return UpdateResult::none();
    };
    info!("Triggering message {}", id);
    state.active_messages.insert(message.id.clone());
    UpdateResult::send(Command::TriggerMessage(message))
}

pub fn handle_clear_active(state: &mut AppState, id: &str) -> UpdateResult {
    state.active_messages.remove(id);
    UpdateResult::send(Command::ClearActiveMessage {
        message_id: id.to_string(),
        timestamp: now_millis(),
    })
}

pub fn handle_message_complete(state: &mut AppState, id: &str) -> UpdateResult {
    state.active_messages.remove(id);
    UpdateResult::send(Command::MessageComplete {
        message_id: id.to_string(),
    })
}

pub fn handle_play_folder(state: &mut AppState, id: &str) -> UpdateResult {
    if find_folder(state.displayed_tree(), id).is_none() {
        warn!("Play folder: no folder {}", id);
        return UpdateResult::none();
    }
    info!("Playing folder {}", id);
    UpdateResult::send(Command::PlayFolder {
        folder_id: id.to_string(),
    })
}

/// Send the whole document; its tree is shown optimistically
pub fn handle_load_configuration(
    state: &mut AppState,
    document: Box<ConfigDocument>,
) -> UpdateResult {
    if let Some(tree) = document.resolved_tree() {
        state.reconciler.propose(tree);
    }
    info!("Loading configuration document (version {})", document.version);
    UpdateResult::send(Command::LoadConfiguration(document))
}
