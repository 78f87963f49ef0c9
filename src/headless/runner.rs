//! Headless mode runner - engine event loop without a UI
//!
//! Processes sync and stdin messages through the engine and mirrors every
//! engine event to stdout as NDJSON until Ctrl-C, `quit` on stdin, or the
//! message channel closes.

use color_eyre::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use vibecast_app::{Engine, EngineEvent, Message};

use super::HeadlessEvent;

/// What one line of stdin asks for
#[derive(Debug, Clone)]
pub enum StdinCommand {
    Send(Message),
    Quit,
}

/// Parse one stdin line. Returns `None` for blank or unknown input.
///
/// Accepted forms: `trigger ID`, `clear ID`, `complete ID`, `play ID`,
/// `cancel`, `reset`, `viz ID`, `collapse ID`, `delete ID`, `q`/`quit`.
pub fn parse_stdin_line(line: &str) -> Option<StdinCommand> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?;
    let arg = parts.next().map(str::to_string);

    let message = match (verb, arg) {
        ("q" | "quit", _) => return Some(StdinCommand::Quit),
        ("trigger", Some(id)) => Message::TriggerMessage { id },
        ("clear", Some(id)) => Message::ClearActiveMessage { id },
        ("complete", Some(id)) => Message::MessageComplete { id },
        ("play", Some(id)) => Message::PlayFolder { id },
        ("collapse", Some(id)) => Message::ToggleCollapse { id },
        ("delete", Some(id)) => Message::DeleteNode { id },
        ("viz", id) => Message::SetActiveVisualization(id),
        ("cancel", None) => Message::CancelFolderPlayback,
        ("reset", None) => Message::ResetStats,
        _ => return None,
    };
    Some(StdinCommand::Send(message))
}

/// Run in headless mode until interrupted, then shut the engine down
pub async fn run_headless(engine: &mut Engine) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("VibeCast starting in HEADLESS mode");
    info!("Project: {}", engine.project_path.display());
    info!("═══════════════════════════════════════════════════════");

    let mut events = engine.subscribe();
    let (quit_tx, quit_rx) = mpsc::channel::<()>(1);

    let stdin_tx = engine.msg_sender();
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(stdin_tx, quit_tx);
    });

    let result = headless_event_loop(engine, &mut events, quit_rx).await;

    engine.shutdown().await;
    flush_events(&mut events, engine.settings.headless.include_tree);

    info!("VibeCast headless mode exiting");
    result
}

async fn headless_event_loop(
    engine: &mut Engine,
    events: &mut broadcast::Receiver<EngineEvent>,
    mut quit_rx: mpsc::Receiver<()>,
) -> Result<()> {
    let include_tree = engine.settings.headless.include_tree;

    loop {
        tokio::select! {
            msg = engine.msg_rx.recv() => match msg {
                Some(msg) => engine.process_message(msg),
                None => {
                    info!("Message channel closed");
                    break;
                }
            },
            _ = quit_rx.recv() => {
                info!("Quit requested");
                break;
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    HeadlessEvent::error(format!("signal handler failed: {}", e), true).emit();
                    return Err(e.into());
                }
                info!("Interrupted");
                break;
            }
        }

        flush_events(events, include_tree);
    }

    Ok(())
}

/// Write every engine event queued since the last flush
fn flush_events(events: &mut broadcast::Receiver<EngineEvent>, include_tree: bool) {
    loop {
        match events.try_recv() {
            Ok(event) => HeadlessEvent::from_engine_event(&event, include_tree).emit(),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!("Headless output lagged, {} events dropped", skipped);
            }
            Err(_) => break,
        }
    }
}

/// Forward stdin commands to the message channel (blocking thread)
fn spawn_stdin_reader_blocking(msg_tx: mpsc::Sender<Message>, quit_tx: mpsc::Sender<()>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        match line {
            Ok(line) => match parse_stdin_line(&line) {
                Some(StdinCommand::Send(message)) => {
                    if msg_tx.blocking_send(message).is_err() {
                        break;
                    }
                }
                Some(StdinCommand::Quit) => {
                    info!("Stdin: quit requested");
                    let _ = quit_tx.blocking_send(());
                    break;
                }
                None if line.trim().is_empty() => {}
                None => warn!("Unknown stdin command: {}", line.trim()),
            },
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    info!("Stdin reader exiting");
}
