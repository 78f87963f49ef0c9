//! Connectivity, inbound snapshot and outbound result handlers

use std::sync::Arc;

use vibecast_core::prelude::*;
use vibecast_core::Snapshot;
use vibecast_sync::{Command, RemoteCommand};

use super::UpdateResult;
use crate::state::AppState;

pub fn handle_connected(state: &mut AppState) -> UpdateResult {
    state.connected = true;
    UpdateResult::none()
}

pub fn handle_disconnected(state: &mut AppState, reason: &str) -> UpdateResult {
    if state.connected {
        warn!("Lost connection to show: {}", reason);
    }
    state.connected = false;
    UpdateResult::none()
}

/// Last snapshot wins for the tree. The active set only grows here; a
/// snapshot without a triggered message says nothing about what is playing.
pub fn handle_snapshot(state: &mut AppState, snapshot: Arc<Snapshot>) -> UpdateResult {
    if let Some(triggered) = &snapshot.triggered_message {
        state.active_messages.insert(triggered.id.clone());
    }
    state.reconciler.confirm(snapshot);
    UpdateResult::none()
}

pub fn handle_echo(state: &mut AppState, remote: &RemoteCommand) -> UpdateResult {
    let command = match Command::from_remote(remote) {
        Ok(command) => command,
        Err(err) => {
            debug!("Ignoring echoed '{}': {}", remote.command, err);
            return UpdateResult::none();
        }
    };

    match command {
        Command::TriggerMessage(message) => {
            state.active_messages.insert(message.id);
        }
        Command::ClearActiveMessage { message_id, .. } | Command::MessageComplete { message_id } => {
            state.active_messages.remove(&message_id);
        }
        _ => {}
    }
    UpdateResult::none()
}

pub fn handle_command_sent(state: &mut AppState, command: &str) -> UpdateResult {
    state.commands_in_flight = state.commands_in_flight.saturating_sub(1);
    trace!("Command '{}' delivered", command);
    UpdateResult::none()
}

pub fn handle_command_failed(state: &mut AppState, command: &str, error: &str) -> UpdateResult {
    state.commands_in_flight = state.commands_in_flight.saturating_sub(1);
    error!("Command '{}' failed: {}", command, error);
    state.last_command_error = Some(format!("{}: {}", command, error));
    UpdateResult::none()
}
