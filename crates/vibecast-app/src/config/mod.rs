//! Configuration for VibeCast
//!
//! Supports:
//! - `.vibecast/config.toml` - Per-project settings
//! - Show configuration documents (JSON) for save/load

pub mod document;
pub mod settings;
pub mod types;

pub use document::{load_document, save_document};
pub use settings::{load_settings, save_settings};
pub use types::*;
