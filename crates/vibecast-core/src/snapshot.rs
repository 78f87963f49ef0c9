//! Authoritative show state and the persisted configuration document

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{
    CommonSettings, FolderPlaybackQueue, MessageConfig, MessageStats, TextStylePreset,
    VisualizationPreset, DEFAULT_TEXT_STYLE,
};
use crate::tree::{self, MessageTree, TreeNode};

/// Current persisted document version
pub const CONFIG_DOCUMENT_VERSION: u32 = 1;

/// Full show configuration broadcast by the authoritative process.
///
/// Every field tolerates absence. `message_tree` is `None` only on snapshots
/// from legacy producers that send a flat `messages` list; the sync channel
/// fills it in before anything downstream sees the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub active_visualization: String,
    pub enabled_visualizations: Vec<String>,
    pub common_settings: CommonSettings,
    pub visualization_settings: serde_json::Value,
    pub visualization_presets: Vec<VisualizationPreset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_visualization_preset: Option<String>,
    pub messages: Vec<MessageConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_tree: Option<MessageTree>,
    pub default_text_style: String,
    pub text_style_settings: serde_json::Value,
    pub text_style_presets: Vec<TextStylePreset>,
    pub message_stats: BTreeMap<String, MessageStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggered_message: Option<MessageConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_playback_queue: Option<FolderPlaybackQueue>,
    /// Legacy mirror of `active_visualization`
    pub mode: String,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            active_visualization: String::new(),
            enabled_visualizations: Vec::new(),
            common_settings: CommonSettings::default(),
            visualization_settings: serde_json::Value::Object(Default::default()),
            visualization_presets: Vec::new(),
            active_visualization_preset: None,
            messages: Vec::new(),
            message_tree: None,
            default_text_style: DEFAULT_TEXT_STYLE.to_string(),
            text_style_settings: serde_json::Value::Object(Default::default()),
            text_style_presets: Vec::new(),
            message_stats: BTreeMap::new(),
            triggered_message: None,
            folder_playback_queue: None,
            mode: String::new(),
        }
    }
}

impl Snapshot {
    /// The message tree, or an empty slice when none was carried
    pub fn tree(&self) -> &[TreeNode] {
        self.message_tree.as_deref().unwrap_or_default()
    }

    pub fn find_message(&self, message_id: &str) -> Option<&MessageConfig> {
        self.messages.iter().find(|m| m.id == message_id)
    }
}

/// Save/load document exchanged with the file-dialog collaborator.
///
/// `message_tree` wins over `messages` when both are present; `messages` is
/// kept for older readers and is derivable via [`tree::flatten`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_visualization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_visualization_preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_visualizations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_settings: Option<CommonSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization_settings: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization_presets: Option<Vec<VisualizationPreset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<MessageConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_tree: Option<MessageTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_text_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_style_settings: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_style_presets: Option<Vec<TextStylePreset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_stats: Option<BTreeMap<String, MessageStats>>,
}

fn default_version() -> u32 {
    CONFIG_DOCUMENT_VERSION
}

impl ConfigDocument {
    /// Capture the canonical state of `snapshot`
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let message_tree = snapshot
            .message_tree
            .clone()
            .unwrap_or_else(|| tree::build_flat_tree(&snapshot.messages));
        Self {
            version: CONFIG_DOCUMENT_VERSION,
            active_visualization: Some(snapshot.active_visualization.clone()),
            active_visualization_preset: snapshot.active_visualization_preset.clone(),
            enabled_visualizations: Some(snapshot.enabled_visualizations.clone()),
            common_settings: Some(snapshot.common_settings),
            visualization_settings: Some(snapshot.visualization_settings.clone()),
            visualization_presets: Some(snapshot.visualization_presets.clone()),
            messages: Some(tree::flatten(&message_tree)),
            message_tree: Some(message_tree),
            default_text_style: Some(snapshot.default_text_style.clone()),
            text_style_settings: Some(snapshot.text_style_settings.clone()),
            text_style_presets: Some(snapshot.text_style_presets.clone()),
            message_stats: Some(snapshot.message_stats.clone()),
        }
    }

    /// The tree this document describes: `messageTree` if present, otherwise
    /// a flat tree over `messages`
    pub fn resolved_tree(&self) -> Option<MessageTree> {
        match (&self.message_tree, &self.messages) {
            (Some(tree), _) => Some(tree.clone()),
            (None, Some(messages)) => Some(tree::build_flat_tree(messages)),
            (None, None) => None,
        }
    }
}
