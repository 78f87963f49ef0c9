//! VibeCast - show-control sync engine for the message tree
//!
//! This is the binary entry point. All logic lives in the library crates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing::info;

use vibecast::oneshot;
use vibecast_app::{load_settings, Engine, Message, Settings};
use vibecast_sync::{HttpTransport, LoopbackTransport, ShowAuthority};

/// VibeCast - keep control surfaces in sync with the show
#[derive(Parser, Debug)]
#[command(name = "vibecast")]
#[command(about = "Show-control sync engine for the VibeCast message tree", long_about = None)]
struct Args {
    /// Base URL of the show server (defaults to `[connection] server_url`)
    #[arg(long, value_name = "URL", conflicts_with = "local")]
    server: Option<String>,

    /// Run against an in-process show, seeded from a configuration document
    /// (or the built-in demo show when given without a file)
    #[arg(long, value_name = "CONFIG.json", num_args = 0..=1, default_missing_value = "")]
    local: Option<PathBuf>,

    /// Project directory holding `.vibecast/config.toml`
    #[arg(long, value_name = "DIR")]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Task>,
}

#[derive(Subcommand, Debug)]
enum Task {
    /// Mirror engine events to stdout as NDJSON (default)
    Watch,
    /// Print the message tree as an outline
    Tree,
    /// Save the current show as a configuration document
    Save { file: PathBuf },
    /// Send a configuration document to the show
    Load { file: PathBuf },
    /// Trigger a message by id
    Trigger { id: String },
    /// Play every message in a folder, in order
    PlayFolder { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    vibecast_core::logging::init()?;

    let args = Args::parse();

    let project_path = args
        .project
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let mut settings = load_settings(&project_path);
    if let Some(server) = args.server {
        settings.connection.server_url = server;
    }

    let mut engine = match args.local {
        Some(config) => local_engine(project_path, settings, &config)?,
        None => {
            info!("Connecting to {}", settings.connection.server_url);
            let transport = HttpTransport::new(&settings.connection.server_url)?;
            Engine::with_settings(project_path, settings, Arc::new(transport))
        }
    };

    let result = match args.command.unwrap_or(Task::Watch) {
        Task::Watch => return vibecast::run_headless(&mut engine).await,
        Task::Tree => oneshot::print_tree(&mut engine).await,
        Task::Save { file } => oneshot::save_configuration(&mut engine, &file).await,
        Task::Load { file } => oneshot::load_configuration(&mut engine, &file).await,
        Task::Trigger { id } => {
            oneshot::run_message(&mut engine, Message::TriggerMessage { id }).await
        }
        Task::PlayFolder { id } => {
            oneshot::run_message(&mut engine, Message::PlayFolder { id }).await
        }
    };

    engine.shutdown().await;
    result
}

/// Engine backed by an in-process authority
fn local_engine(project_path: PathBuf, settings: Settings, config: &Path) -> Result<Engine> {
    let authority = if config.as_os_str().is_empty() {
        info!("Running against the built-in demo show");
        ShowAuthority::with_default_show()
    } else {
        info!("Running against local show {}", config.display());
        ShowAuthority::from_file(config)?
    };
    let transport = LoopbackTransport::new(authority);
    Ok(Engine::with_settings(project_path, settings, Arc::new(transport)))
}
