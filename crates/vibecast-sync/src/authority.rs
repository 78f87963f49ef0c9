//! Single source of truth for show state.
//!
//! [`ShowAuthority`] applies commands strictly in the order it receives them
//! and produces the snapshot every surface converges on. The loopback
//! transport hosts one in-process; a remote process follows the same rules.

use std::path::Path;

use serde_json::json;

use vibecast_core::prelude::*;
use vibecast_core::{
    build_flat_tree, collect_message_ids, find_folder, flatten, now_millis, ConfigDocument,
    FolderPlaybackQueue, MessageConfig, MessageStats, Snapshot, TextStylePreset, TreeNode,
    VisualizationPreset,
};

use crate::protocol::{Command, RemoteCommand};

/// What applying one command produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Applied {
    /// Message that started playing because of this command
    pub triggered: Option<MessageConfig>,
    /// Surfaces should stop the currently playing message
    pub cleared: bool,
}

/// Authoritative show state
#[derive(Debug, Clone)]
pub struct ShowAuthority {
    state: Snapshot,
}

impl Default for ShowAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl ShowAuthority {
    /// Empty show with an empty tree
    pub fn new() -> Self {
        Self {
            state: Snapshot {
                message_tree: Some(Vec::new()),
                ..Snapshot::default()
            },
        }
    }

    /// Starter show: a "Party Countdown" folder and a few visualization presets
    pub fn with_default_show() -> Self {
        let countdown = vec![
            MessageConfig::new("msg-1", "Countdown initiated...").with_style("typewriter"),
            MessageConfig {
                speed: Some(1.0),
                split_enabled: Some(true),
                split_separator: Some(",".to_string()),
                ..MessageConfig::new("msg-2", "3, 2, 1").with_style("bounce")
            },
            MessageConfig::new("msg-3", "It's time to party 🥳")
                .with_preset("scrolling-capitals-centered"),
        ];
        let tree = vec![TreeNode::folder(
            "party-countdown",
            "Party Countdown",
            countdown.iter().cloned().map(TreeNode::message).collect(),
        )];

        let preset = |id: &str, name: &str, visualization: &str, settings| VisualizationPreset {
            id: id.to_string(),
            name: name.to_string(),
            visualization_id: visualization.to_string(),
            settings,
            enabled: Some(true),
            order: None,
            icon: None,
        };

        let mut authority = Self::new();
        authority.state = Snapshot {
            active_visualization: "fireplace".to_string(),
            enabled_visualizations: vec!["fireplace".to_string(), "techno".to_string()],
            visualization_presets: vec![
                preset(
                    "fireplace-default",
                    "Fireplace",
                    "fireplace",
                    json!({"emberCount": 15, "flameCount": 12, "flameHeight": 1.0, "glowColor": "#ea580c", "showLogs": true}),
                ),
                preset(
                    "fireplace-blue-glow",
                    "Blue Glow",
                    "fireplace",
                    json!({"emberCount": 0, "flameCount": 0, "flameHeight": 0, "glowColor": "#1e3a8a", "showLogs": false}),
                ),
                preset(
                    "particles-default",
                    "Particles",
                    "particles",
                    json!({"particleCount": 80, "particleSize": 5, "speed": 0.5, "particleColor": "#f59e0b", "colorful": true, "spread": 1.5}),
                ),
                preset(
                    "techno-default",
                    "Techno",
                    "techno",
                    json!({"barCount": 48, "sphereScale": 1.0, "sphereDistort": 0.5, "colorScheme": "rainbow", "showSphere": false, "showBars": true}),
                ),
            ],
            active_visualization_preset: Some("fireplace-blue-glow".to_string()),
            messages: countdown,
            message_tree: Some(tree),
            text_style_presets: vec![TextStylePreset {
                id: "scrolling-capitals-centered".to_string(),
                name: "Scrolling Capitals Centered".to_string(),
                text_style_id: "scrolling-capitals".to_string(),
                settings: json!({"position": "center", "fontSize": 12, "glowIntensity": 0.5, "color": "#ffffff"}),
            }],
            ..authority.state
        };
        authority
    }

    pub fn from_document(document: ConfigDocument) -> Self {
        let mut authority = Self::new();
        authority.load(&document);
        authority
    }

    /// Load a persisted configuration document from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let document: ConfigDocument = serde_json::from_str(&content)?;
        info!("Loaded show configuration from {}", path.display());
        Ok(Self::from_document(document))
    }

    /// Current snapshot, as broadcast to every surface
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = self.state.clone();
        snapshot.mode = snapshot.active_visualization.clone();
        snapshot
    }

    /// Decode and apply a wire command. Undecodable commands change nothing
    /// except clearing the transient triggered message.
    pub fn apply_remote(&mut self, remote: &RemoteCommand) -> Applied {
        match Command::from_remote(remote) {
            Ok(command) => self.apply(&command),
            Err(err) => {
                debug!("Authority: ignoring '{}': {}", remote.command, err);
                self.state.triggered_message = None;
                Applied::default()
            }
        }
    }

    pub fn apply(&mut self, command: &Command) -> Applied {
        let mut applied = Applied::default();

        match command {
            Command::SetMessageTree(tree) => {
                self.state.messages = flatten(tree);
                self.state.message_tree = Some(tree.clone());
            }
            Command::SetMessages(messages) => {
                self.state.message_tree = Some(build_flat_tree(messages));
                self.state.messages = messages.clone();
            }
            Command::TriggerMessage(message) => {
                self.record_trigger(&message.id);
                applied.triggered = Some(message.clone());
            }
            Command::ClearActiveMessage { message_id, .. } => {
                applied.triggered = self.advance_queue(message_id);
                applied.cleared = true;
            }
            Command::MessageComplete { message_id } => {
                applied.triggered = self.advance_queue(message_id);
            }
            Command::PlayFolder { folder_id } => {
                applied.triggered = self.start_folder(folder_id);
            }
            Command::CancelFolderPlayback => {
                self.state.folder_playback_queue = None;
                applied.cleared = true;
            }
            Command::ResetMessageStats => self.state.message_stats.clear(),
            Command::SetActiveVisualization(id) => {
                if let Some(id) = id {
                    self.state.active_visualization = id.clone();
                }
            }
            Command::SetActiveVisualizationPreset(preset_id) => {
                self.select_preset(preset_id.as_deref())
            }
            Command::SetEnabledVisualizations(ids) => {
                self.state.enabled_visualizations = ids.clone()
            }
            Command::SetCommonSettings(settings) => self.state.common_settings = *settings,
            Command::SetVisualizationSettings(value) => {
                self.state.visualization_settings = value.clone()
            }
            Command::SetVisualizationPresets(presets) => {
                self.state.visualization_presets = presets.clone()
            }
            Command::SetDefaultTextStyle(style) => self.state.default_text_style = style.clone(),
            Command::SetTextStyleSettings(value) => self.state.text_style_settings = value.clone(),
            Command::SetTextStylePresets(presets) => {
                self.state.text_style_presets = presets.clone()
            }
            Command::LoadConfiguration(document) => self.load(document),
        }

        // only the triggering command's snapshot carries the message
        self.state.triggered_message = applied.triggered.clone();
        applied
    }

    fn record_trigger(&mut self, message_id: &str) {
        self.state
            .message_stats
            .entry(message_id.to_string())
            .or_insert_with(|| MessageStats::new(message_id))
            .record(now_millis());
    }

    fn trigger_by_id(&mut self, message_id: &str) -> Option<MessageConfig> {
        let message = self.state.find_message(message_id).cloned()?;
        self.record_trigger(&message.id);
        Some(message)
    }

    fn start_folder(&mut self, folder_id: &str) -> Option<MessageConfig> {
        let message_ids = find_folder(self.state.tree(), folder_id)
            .and_then(TreeNode::children)
            .map(collect_message_ids)
            .unwrap_or_default();

        let first = message_ids.first().cloned()?;
        self.state.folder_playback_queue = Some(FolderPlaybackQueue {
            folder_id: folder_id.to_string(),
            message_ids,
            current_index: 0,
        });
        info!("Authority: playing folder {}", folder_id);
        self.trigger_by_id(&first)
    }

    /// Advance the folder queue if `finished_id` is its current message
    fn advance_queue(&mut self, finished_id: &str) -> Option<MessageConfig> {
        let queue = self.state.folder_playback_queue.as_mut()?;
        if queue.current_message_id() != Some(finished_id) {
            return None;
        }
        queue.current_index += 1;
        match queue.current_message_id().map(str::to_string) {
            Some(next_id) => self.trigger_by_id(&next_id),
            None => {
                debug!("Authority: folder queue {} complete", queue.folder_id);
                self.state.folder_playback_queue = None;
                None
            }
        }
    }

    fn select_preset(&mut self, preset_id: Option<&str>) {
        let Some(preset_id) = preset_id else {
            self.state.active_visualization_preset = None;
            return;
        };
        self.state.active_visualization_preset = Some(preset_id.to_string());
        if let Some(preset) = self
            .state
            .visualization_presets
            .iter()
            .find(|p| p.id == preset_id)
        {
            self.state.active_visualization = preset.visualization_id.clone();
        }
    }

    fn load(&mut self, document: &ConfigDocument) {
        let state = &mut self.state;
        if let Some(viz) = &document.active_visualization {
            state.active_visualization = viz.clone();
        }
        if let Some(ids) = &document.enabled_visualizations {
            state.enabled_visualizations = ids.clone();
        }
        if let Some(settings) = document.common_settings {
            state.common_settings = settings;
        }
        if let Some(settings) = &document.visualization_settings {
            state.visualization_settings = settings.clone();
        }
        if let Some(messages) = &document.messages {
            state.messages = messages.clone();
        }
        match &document.message_tree {
            Some(tree) => {
                state.messages = flatten(tree);
                state.message_tree = Some(tree.clone());
            }
            None => state.message_tree = Some(build_flat_tree(&state.messages)),
        }
        if let Some(style) = &document.default_text_style {
            state.default_text_style = style.clone();
        }
        if let Some(settings) = &document.text_style_settings {
            state.text_style_settings = settings.clone();
        }
        if let Some(presets) = &document.visualization_presets {
            state.visualization_presets = presets.clone();
        }
        if let Some(preset_id) = &document.active_visualization_preset {
            state.active_visualization_preset = Some(preset_id.clone());
        }
        if let Some(presets) = &document.text_style_presets {
            state.text_style_presets = presets.clone();
        }
        if let Some(stats) = &document.message_stats {
            state.message_stats = stats.clone();
        }
    }
}
