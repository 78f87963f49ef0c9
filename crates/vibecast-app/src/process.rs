//! Message processing through the TEA update loop

use tokio::sync::{mpsc, watch};

use crate::actions::handle_action;
use crate::handler;
use crate::message::Message;
use crate::state::AppState;
use crate::UpdateAction;
use vibecast_sync::CommandHandle;

/// Process a message through the TEA update function, dispatching any
/// resulting actions and following up chained messages.
pub fn process_message(
    state: &mut AppState,
    message: Message,
    msg_tx: &mpsc::Sender<Message>,
    commands: &CommandHandle,
    shutdown_rx: &watch::Receiver<bool>,
) {
    let mut msg = Some(message);
    while let Some(m) = msg {
        let result = handler::update(state, m);

        if let Some(action) = result.action {
            match &action {
                UpdateAction::SendCommand(_) => state.commands_in_flight += 1,
            }
            handle_action(action, msg_tx.clone(), commands.clone(), shutdown_rx.clone());
        }

        msg = result.message;
    }
}
