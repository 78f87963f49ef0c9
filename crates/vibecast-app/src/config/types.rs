//! Configuration types for VibeCast
//!
//! Defines:
//! - `Settings` - Per-project settings from `.vibecast/config.toml`
//! - Related sub-sections

use std::time::Duration;

use serde::{Deserialize, Serialize};

use vibecast_core::DEFAULT_INSERT_MARGIN;
use vibecast_sync::SyncOptions;

/// Per-project settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub connection: ConnectionSettings,
    pub drag: DragSettings,
    pub headless: HeadlessSettings,
}

/// How to reach the authoritative process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Base URL; events at `/api/events`, commands at `/api/command`
    pub server_url: String,

    /// Fixed delay between reconnection attempts
    pub reconnect_delay_ms: u64,

    /// Per-command timeout, 0 disables
    pub command_timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
            reconnect_delay_ms: 3000,
            command_timeout_ms: 10_000,
        }
    }
}

impl ConnectionSettings {
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            command_timeout: (self.command_timeout_ms > 0)
                .then(|| Duration::from_millis(self.command_timeout_ms)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragSettings {
    /// Width at a folder row's right edge that resolves to sibling insertion
    pub insert_margin: f64,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            insert_margin: DEFAULT_INSERT_MARGIN,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessSettings {
    /// Include the full displayed tree in tree-change events
    pub include_tree: bool,
}
