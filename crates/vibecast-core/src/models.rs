//! Show configuration types shared by every surface
//!
//! Field names follow the camelCase wire format of the authoritative process.

use serde::{Deserialize, Serialize};

/// Text style used when a message arrives without one
pub const DEFAULT_TEXT_STYLE: &str = "scrolling-capitals";

/// Maximum trigger timestamps kept per message
pub const STATS_HISTORY_LIMIT: usize = 50;

// ============================================================================
// Messages
// ============================================================================

/// A single overlay message.
///
/// `id` is immutable for the lifetime of the message and is the join key for
/// statistics and the "currently playing" set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageConfig {
    pub id: String,
    pub text: String,

    /// External file the text is read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_file: Option<String>,

    /// Text style id
    #[serde(rename = "textStyle", default = "default_text_style")]
    pub text_style_id: String,

    /// Text style preset id
    #[serde(
        rename = "textStylePreset",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub text_style_preset_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_overrides: Option<serde_json::Map<String, serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_separator: Option<String>,
}

fn default_text_style() -> String {
    DEFAULT_TEXT_STYLE.to_string()
}

impl MessageConfig {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            text_file: None,
            text_style_id: default_text_style(),
            text_style_preset_id: None,
            style_overrides: None,
            repeat_count: None,
            speed: None,
            split_enabled: None,
            split_separator: None,
        }
    }

    pub fn with_style(mut self, text_style_id: impl Into<String>) -> Self {
        self.text_style_id = text_style_id.into();
        self
    }

    pub fn with_preset(mut self, preset_id: impl Into<String>) -> Self {
        self.text_style_preset_id = Some(preset_id.into());
        self
    }
}

// ============================================================================
// Presets
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationPreset {
    pub id: String,
    pub name: String,
    pub visualization_id: String,
    #[serde(default)]
    pub settings: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStylePreset {
    pub id: String,
    pub name: String,
    pub text_style_id: String,
    #[serde(default)]
    pub settings: serde_json::Value,
}

// ============================================================================
// Settings & Statistics
// ============================================================================

/// Settings applied on top of every visualization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommonSettings {
    pub intensity: f64,
    pub dim: f64,
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            dim: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerHistory {
    pub timestamp: u64,
}

/// Per-message trigger statistics, keyed by message id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStats {
    pub message_id: String,
    #[serde(default)]
    pub trigger_count: u32,
    #[serde(default)]
    pub last_triggered: u64,
    #[serde(default)]
    pub history: Vec<TriggerHistory>,
}

impl MessageStats {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            trigger_count: 0,
            last_triggered: 0,
            history: Vec::new(),
        }
    }

    /// Record one trigger at `timestamp` (epoch millis), keeping only the
    /// most recent [`STATS_HISTORY_LIMIT`] history entries.
    pub fn record(&mut self, timestamp: u64) {
        self.trigger_count = self.trigger_count.saturating_add(1);
        self.last_triggered = timestamp;
        self.history.push(TriggerHistory { timestamp });
        if self.history.len() > STATS_HISTORY_LIMIT {
            let excess = self.history.len() - STATS_HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }

    pub fn was_triggered(&self) -> bool {
        self.trigger_count > 0
    }
}

/// Sequential playback of every message under one folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPlaybackQueue {
    pub folder_id: String,
    pub message_ids: Vec<String>,
    #[serde(default)]
    pub current_index: usize,
}

impl FolderPlaybackQueue {
    pub fn current_message_id(&self) -> Option<&str> {
        self.message_ids.get(self.current_index).map(String::as_str)
    }
}

/// Current time as epoch milliseconds
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
