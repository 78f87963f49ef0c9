//! vibecast-app - Control surface state and orchestration for VibeCast
//!
//! This crate holds the TEA (The Elm Architecture) side of a control surface:
//! the optimistic tree reconciler, drag-and-drop sessions, message handlers,
//! and the [`Engine`] that ties them to a sync client. It has no rendering
//! dependencies; front ends (the headless runner, a GUI) drive it through
//! [`Message`]s and observe it through [`EngineEvent`]s.
//!
//! ## Public API
//!
//! - [`Engine`] - owns the state, the message channel and the sync client
//! - [`EngineEvent`] - broadcast after each processed message
//! - [`Message`] - everything a surface can ask for
//! - [`AppState`] - the model, readable by front ends
//! - [`config`] - `.vibecast/config.toml` settings and JSON show documents

pub mod actions;
pub mod config;
pub mod drag;
pub mod engine;
pub mod engine_event;
pub mod handler;
pub mod message;
pub mod process;
pub mod reconcile;
pub mod state;

pub use config::{load_document, load_settings, save_document, save_settings, Settings};
pub use drag::{plan_drop, DragSession, DragState};
pub use engine::Engine;
pub use engine_event::EngineEvent;
pub use handler::{update, UpdateAction, UpdateResult};
pub use message::Message;
pub use reconcile::{merge, Reconciler};
pub use state::AppState;
