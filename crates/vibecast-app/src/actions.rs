//! Action handlers: UpdateAction dispatch and background task spawning

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::message::Message;
use crate::UpdateAction;
use vibecast_sync::{Command, CommandHandle};

/// Execute an action by spawning a background task
pub fn handle_action(
    action: UpdateAction,
    msg_tx: mpsc::Sender<Message>,
    commands: CommandHandle,
    shutdown_rx: watch::Receiver<bool>,
) {
    match action {
        UpdateAction::SendCommand(command) => {
            tokio::spawn(async move {
                send_command(command, msg_tx, commands, shutdown_rx).await;
            });
        }
    }
}

/// Post one command and report the outcome back to the TEA loop.
///
/// Shutdown drops the in-flight send, which cancels the post; no result
/// message is sent for a cancelled command.
async fn send_command(
    command: Command,
    msg_tx: mpsc::Sender<Message>,
    commands: CommandHandle,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let name = command.name().to_string();
    if command.is_structural() {
        info!("Sending {}", name);
    } else {
        debug!("Sending {}", name);
    }

    let result = tokio::select! {
        result = commands.send(&command) => result,
        _ = wait_for_shutdown(&mut shutdown_rx) => {
            debug!("Shutdown: cancelled in-flight '{}'", name);
            return;
        }
    };

    let message = match result {
        Ok(()) => Message::CommandSent { command: name },
        Err(err) => Message::CommandFailed {
            command: name,
            error: err.to_string(),
        },
    };
    let _ = msg_tx.send(message).await;
}

async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            return;
        }
    }
}
