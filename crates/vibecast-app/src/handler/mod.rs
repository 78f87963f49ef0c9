//! Handler module - TEA update function and message handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `tree`: Structural tree edits
//! - `drag`: Drag session handling
//! - `sync`: Connectivity, snapshots and echoed commands
//! - `show`: Playback and visualization commands

pub(crate) mod drag;
pub(crate) mod show;
pub(crate) mod sync;
pub(crate) mod tree;
pub(crate) mod update;

#[cfg(test)]
mod tests;

use crate::message::Message;
use vibecast_sync::Command;

// Re-export main entry point
pub use update::update;

/// Actions that the event loop should perform after update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// Post a command upstream in the background
    SendCommand(Command),
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }

    pub fn send(command: Command) -> Self {
        Self::action(UpdateAction::SendCommand(command))
    }
}
