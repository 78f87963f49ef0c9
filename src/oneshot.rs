//! One-shot commands: wait for the show, do one thing, exit
//!
//! Each command waits for the first authoritative snapshot so it acts on the
//! real tree, then drives the engine until its outbound commands resolve.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing::info;

use vibecast_app::{load_document, save_document, AppState, Engine, Message};
use vibecast_core::{Snapshot, TreeNode};

/// How long a one-shot command waits for the show or for its result
pub const ONE_SHOT_TIMEOUT: Duration = Duration::from_secs(10);

/// Process messages until the first snapshot is confirmed
pub async fn wait_for_snapshot(engine: &mut Engine) -> Result<Arc<Snapshot>> {
    let waited = tokio::time::timeout(ONE_SHOT_TIMEOUT, async {
        loop {
            if let Some(snapshot) = engine.state.confirmed() {
                return Ok(Arc::clone(snapshot));
            }
            if !engine.process_next().await {
                return Err(eyre!("engine stopped before the show state arrived"));
            }
        }
    })
    .await;

    match waited {
        Ok(result) => result,
        Err(_) => Err(eyre!(
            "no show state within {}s",
            ONE_SHOT_TIMEOUT.as_secs()
        )),
    }
}

/// Send one message and wait until every command it produced has resolved
pub async fn run_message(engine: &mut Engine, message: Message) -> Result<()> {
    wait_for_snapshot(engine).await?;
    engine.state.last_command_error = None;
    engine.process_message(message);

    if engine.state.commands_in_flight == 0 {
        return Err(eyre!("nothing to send (unknown id?)"));
    }

    let settled = tokio::time::timeout(ONE_SHOT_TIMEOUT, async {
        while engine.state.commands_in_flight > 0 {
            if !engine.process_next().await {
                break;
            }
        }
    })
    .await;

    if settled.is_err() {
        return Err(eyre!("command did not complete in time"));
    }
    match engine.state.last_command_error.take() {
        Some(error) => Err(eyre!(error)),
        None => Ok(()),
    }
}

/// Print the displayed tree as an indented outline
pub async fn print_tree(engine: &mut Engine) -> Result<()> {
    wait_for_snapshot(engine).await?;
    print!("{}", render_outline(&engine.state));
    Ok(())
}

/// Write the current canonical state as a configuration document
pub async fn save_configuration(engine: &mut Engine, path: &Path) -> Result<()> {
    wait_for_snapshot(engine).await?;
    let document = engine
        .configuration_document()
        .ok_or_else(|| eyre!("no show state to save"))?;
    save_document(path, &document)?;
    info!("Saved configuration to {}", path.display());
    println!("Saved configuration to {}", path.display());
    Ok(())
}

/// Read a configuration document and send it as `load-configuration`
pub async fn load_configuration(engine: &mut Engine, path: &Path) -> Result<()> {
    let document = load_document(path)?;
    run_message(engine, Message::LoadConfiguration(Box::new(document))).await?;
    println!("Loaded configuration from {}", path.display());
    Ok(())
}

/// Outline of the visible rows: folders with their triggered/total counts,
/// messages with their id; `*` marks active messages
pub fn render_outline(state: &AppState) -> String {
    let mut out = String::new();
    for row in state.visible_rows() {
        let indent = "  ".repeat(row.depth);
        let line = match row.node {
            TreeNode::Folder {
                id,
                name,
                collapsed,
                ..
            } => {
                let marker = if *collapsed { '+' } else { '-' };
                let count = state.folder_count(id).unwrap_or_default();
                format!("{}{} {} ({}/{})", indent, marker, name, count.triggered, count.total)
            }
            TreeNode::Message { id, message } => {
                let active = if state.is_active(id) { "*" } else { " " };
                format!("{}{} {} [{}]", indent, active, message.text, id)
            }
        };
        let _ = writeln!(out, "{}", line);
    }
    out
}
