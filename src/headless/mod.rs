//! Headless mode - NDJSON engine events on stdout
//!
//! Every [`EngineEvent`] becomes one line of JSON with an `"event"` tag and a
//! millisecond timestamp, so scripts and other surfaces can follow the show
//! without a UI.
//!
//! # Example Output
//!
//! ```json
//! {"event":"connected","timestamp":1704700001000}
//! {"event":"snapshot_applied","active_visualization":"fireplace","message_count":3,"timestamp":1704700001002}
//! {"event":"tree_changed","pending":false,"rows":4,"timestamp":1704700001002}
//! {"event":"command_sent","command":"trigger-message","timestamp":1704700003000}
//! ```

pub mod runner;

pub use runner::run_headless;

use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

use vibecast_app::EngineEvent;
use vibecast_core::{visible_rows, DropTarget, MessageTree};

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    Connected {
        timestamp: i64,
    },

    /// Event stream lost; the client is retrying
    Disconnected {
        timestamp: i64,
    },

    SnapshotApplied {
        active_visualization: String,
        message_count: usize,
        timestamp: i64,
    },

    /// Displayed tree replaced. `tree` is only included when
    /// `[headless] include_tree` is set.
    TreeChanged {
        pending: bool,
        rows: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        tree: Option<MessageTree>,
        timestamp: i64,
    },

    ActiveMessages {
        active: Vec<String>,
        timestamp: i64,
    },

    DropTarget {
        target: Option<DropTarget>,
        timestamp: i64,
    },

    CommandSent {
        command: String,
        timestamp: i64,
    },

    CommandFailed {
        command: String,
        error: String,
        timestamp: i64,
    },

    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },

    Shutdown {
        timestamp: i64,
    },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Translate an engine event; `include_tree` controls whether tree
    /// changes carry the full tree
    pub fn from_engine_event(event: &EngineEvent, include_tree: bool) -> Self {
        let timestamp = Self::now();
        match event {
            EngineEvent::Connected => Self::Connected { timestamp },
            EngineEvent::Disconnected => Self::Disconnected { timestamp },
            EngineEvent::SnapshotApplied {
                active_visualization,
                message_count,
            } => Self::SnapshotApplied {
                active_visualization: active_visualization.clone(),
                message_count: *message_count,
                timestamp,
            },
            EngineEvent::TreeChanged { tree, pending } => Self::TreeChanged {
                pending: *pending,
                rows: visible_rows(tree).len(),
                tree: include_tree.then(|| tree.clone()),
                timestamp,
            },
            EngineEvent::ActiveMessagesChanged { active } => Self::ActiveMessages {
                active: active.clone(),
                timestamp,
            },
            EngineEvent::DropTargetChanged { target } => Self::DropTarget {
                target: target.clone(),
                timestamp,
            },
            EngineEvent::CommandSent { command } => Self::CommandSent {
                command: command.clone(),
                timestamp,
            },
            EngineEvent::CommandFailed { command, error } => Self::CommandFailed {
                command: command.clone(),
                error: error.clone(),
                timestamp,
            },
            EngineEvent::Shutdown => Self::Shutdown { timestamp },
        }
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibecast_core::{MessageConfig, TreeNode, TreePath};

    fn to_value(event: &HeadlessEvent) -> serde_json::Value {
        let json = serde_json::to_string(event).expect("serialization failed");
        serde_json::from_str(&json).expect("invalid JSON")
    }

    fn tree() -> MessageTree {
        vec![TreeNode::folder(
            "intro",
            "Intro",
            vec![TreeNode::message(MessageConfig::new("a", "Hello"))],
        )]
    }

    #[test]
    fn test_connected_serialization() {
        let value = to_value(&HeadlessEvent::from_engine_event(&EngineEvent::Connected, false));
        assert_eq!(value["event"], "connected");
        assert!(value["timestamp"].is_number());
    }

    #[test]
    fn test_tree_changed_omits_tree_by_default() {
        let event = EngineEvent::TreeChanged {
            tree: tree(),
            pending: true,
        };

        let value = to_value(&HeadlessEvent::from_engine_event(&event, false));
        assert_eq!(value["event"], "tree_changed");
        assert_eq!(value["pending"], true);
        assert_eq!(value["rows"], 2);
        assert!(value.get("tree").is_none());

        let value = to_value(&HeadlessEvent::from_engine_event(&event, true));
        assert_eq!(value["tree"][0]["id"], "intro");
    }

    #[test]
    fn test_drop_target_serialization() {
        let event = EngineEvent::DropTargetChanged {
            target: Some(DropTarget::Insert {
                parent_path: TreePath::root(),
                index: 1,
            }),
        };
        let value = to_value(&HeadlessEvent::from_engine_event(&event, false));
        assert_eq!(value["event"], "drop_target");
        assert_eq!(value["target"]["mode"], "insert");
        assert_eq!(value["target"]["index"], 1);
    }

    #[test]
    fn test_command_failed_serialization() {
        let event = EngineEvent::CommandFailed {
            command: "set-message-tree".into(),
            error: "rejected".into(),
        };
        let value = to_value(&HeadlessEvent::from_engine_event(&event, false));
        assert_eq!(value["event"], "command_failed");
        assert_eq!(value["command"], "set-message-tree");
        assert_eq!(value["error"], "rejected");
    }

    #[test]
    fn test_error_serialization() {
        let value = to_value(&HeadlessEvent::error("Connection failed".to_string(), true));
        assert_eq!(value["event"], "error");
        assert_eq!(value["message"], "Connection failed");
        assert_eq!(value["fatal"], true);
    }
}
