//! Wire protocol shared with the authoritative process.
//!
//! Outbound: a single endpoint accepting `{command, payload}` ([`RemoteCommand`]).
//! Inbound: a server-sent event stream carrying `state` events (full
//! [`Snapshot`]) and `command` events (an echo of an applied [`RemoteCommand`]).

use std::collections::VecDeque;

use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use vibecast_core::prelude::*;
use vibecast_core::{
    CommonSettings, ConfigDocument, MessageConfig, MessageTree, Snapshot, TextStylePreset,
    VisualizationPreset,
};

/// SSE event name carrying a full snapshot
pub const STATE_EVENT: &str = "state";

/// SSE event name carrying an applied command echo
pub const COMMAND_EVENT: &str = "command";

// ============================================================================
// Outbound Commands
// ============================================================================

/// Untyped command envelope as it travels over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCommand {
    pub command: String,
    #[serde(default)]
    pub payload: Option<Value>,
}

impl RemoteCommand {
    pub fn new(command: impl Into<String>, payload: Value) -> Self {
        Self {
            command: command.into(),
            payload: Some(payload),
        }
    }

    fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self.payload.clone().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| {
            Error::protocol(format!("invalid payload for '{}': {}", self.command, e))
        })
    }

    fn payload_str_field(&self, field: &str) -> Result<String> {
        self.payload
            .as_ref()
            .and_then(|p| p.get(field))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::protocol(format!("'{}' payload missing '{}'", self.command, field))
            })
    }
}

/// Typed outbound command.
///
/// Each command carries either a whole replacement value or a single
/// addressed update, so applying the same command twice is harmless.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ─────────────────────────────────────────────────────────
    // Message tree
    // ─────────────────────────────────────────────────────────
    SetMessageTree(MessageTree),
    /// Flat list; the authority rebuilds a one-level tree
    SetMessages(Vec<MessageConfig>),

    // ─────────────────────────────────────────────────────────
    // Playback
    // ─────────────────────────────────────────────────────────
    TriggerMessage(MessageConfig),
    ClearActiveMessage { message_id: String, timestamp: u64 },
    MessageComplete { message_id: String },
    PlayFolder { folder_id: String },
    CancelFolderPlayback,
    ResetMessageStats,

    // ─────────────────────────────────────────────────────────
    // Visualization
    // ─────────────────────────────────────────────────────────
    SetActiveVisualization(Option<String>),
    SetActiveVisualizationPreset(Option<String>),
    SetEnabledVisualizations(Vec<String>),
    SetCommonSettings(CommonSettings),
    SetVisualizationSettings(Value),
    SetVisualizationPresets(Vec<VisualizationPreset>),

    // ─────────────────────────────────────────────────────────
    // Text styles
    // ─────────────────────────────────────────────────────────
    SetDefaultTextStyle(String),
    SetTextStyleSettings(Value),
    SetTextStylePresets(Vec<TextStylePreset>),

    // ─────────────────────────────────────────────────────────
    // Whole configuration
    // ─────────────────────────────────────────────────────────
    LoadConfiguration(Box<ConfigDocument>),
}

impl Command {
    /// Wire name of this command
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetMessageTree(_) => "set-message-tree",
            Command::SetMessages(_) => "set-messages",
            Command::TriggerMessage(_) => "trigger-message",
            Command::ClearActiveMessage { .. } => "clear-active-message",
            Command::MessageComplete { .. } => "message-complete",
            Command::PlayFolder { .. } => "play-folder",
            Command::CancelFolderPlayback => "cancel-folder-playback",
            Command::ResetMessageStats => "reset-message-stats",
            Command::SetActiveVisualization(_) => "set-active-visualization",
            Command::SetActiveVisualizationPreset(_) => "set-active-visualization-preset",
            Command::SetEnabledVisualizations(_) => "set-enabled-visualizations",
            Command::SetCommonSettings(_) => "set-common-settings",
            Command::SetVisualizationSettings(_) => "set-visualization-settings",
            Command::SetVisualizationPresets(_) => "set-visualization-presets",
            Command::SetDefaultTextStyle(_) => "set-default-text-style",
            Command::SetTextStyleSettings(_) => "set-text-style-settings",
            Command::SetTextStylePresets(_) => "set-text-style-presets",
            Command::LoadConfiguration(_) => "load-configuration",
        }
    }

    /// True for commands that replace the message tree
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Command::SetMessageTree(_) | Command::SetMessages(_) | Command::LoadConfiguration(_)
        )
    }

    pub fn to_remote(&self) -> Result<RemoteCommand> {
        let payload = match self {
            Command::SetMessageTree(tree) => serde_json::to_value(tree)?,
            Command::SetMessages(messages) => serde_json::to_value(messages)?,
            Command::TriggerMessage(message) => serde_json::to_value(message)?,
            Command::ClearActiveMessage {
                message_id,
                timestamp,
            } => json!({ "messageId": message_id, "timestamp": timestamp }),
            Command::MessageComplete { message_id } => json!({ "messageId": message_id }),
            Command::PlayFolder { folder_id } => json!({ "folderId": folder_id }),
            Command::CancelFolderPlayback | Command::ResetMessageStats => Value::Null,
            Command::SetActiveVisualization(id) | Command::SetActiveVisualizationPreset(id) => {
                serde_json::to_value(id)?
            }
            Command::SetEnabledVisualizations(ids) => serde_json::to_value(ids)?,
            Command::SetCommonSettings(settings) => serde_json::to_value(settings)?,
            Command::SetVisualizationSettings(value) | Command::SetTextStyleSettings(value) => {
                value.clone()
            }
            Command::SetVisualizationPresets(presets) => serde_json::to_value(presets)?,
            Command::SetDefaultTextStyle(style) => Value::String(style.clone()),
            Command::SetTextStylePresets(presets) => serde_json::to_value(presets)?,
            Command::LoadConfiguration(document) => serde_json::to_value(document)?,
        };
        Ok(RemoteCommand::new(self.name(), payload))
    }

    /// Decode a wire command. Legacy payload shapes (plain-text
    /// `trigger-message`, string-array `set-messages`, `set-mode`) are
    /// accepted.
    pub fn from_remote(remote: &RemoteCommand) -> Result<Command> {
        let command = match remote.command.as_str() {
            "set-message-tree" => Command::SetMessageTree(remote.payload_as()?),
            "set-messages" => Command::SetMessages(decode_messages(remote)?),
            "trigger-message" => Command::TriggerMessage(decode_trigger(remote)?),
            "clear-active-message" => Command::ClearActiveMessage {
                message_id: remote.payload_str_field("messageId")?,
                timestamp: remote
                    .payload
                    .as_ref()
                    .and_then(|p| p.get("timestamp"))
                    .and_then(Value::as_u64)
                    .unwrap_or_default(),
            },
            "message-complete" => Command::MessageComplete {
                message_id: remote.payload_str_field("messageId")?,
            },
            "play-folder" => Command::PlayFolder {
                folder_id: remote.payload_str_field("folderId")?,
            },
            "cancel-folder-playback" => Command::CancelFolderPlayback,
            "reset-message-stats" => Command::ResetMessageStats,
            "set-active-visualization" | "set-mode" => {
                Command::SetActiveVisualization(remote.payload_as()?)
            }
            "set-active-visualization-preset" => {
                Command::SetActiveVisualizationPreset(remote.payload_as()?)
            }
            "set-enabled-visualizations" => Command::SetEnabledVisualizations(remote.payload_as()?),
            "set-common-settings" => Command::SetCommonSettings(remote.payload_as()?),
            "set-visualization-settings" => {
                Command::SetVisualizationSettings(remote.payload.clone().unwrap_or(Value::Null))
            }
            "set-visualization-presets" => Command::SetVisualizationPresets(remote.payload_as()?),
            "set-default-text-style" => Command::SetDefaultTextStyle(remote.payload_as()?),
            "set-text-style-settings" => {
                Command::SetTextStyleSettings(remote.payload.clone().unwrap_or(Value::Null))
            }
            "set-text-style-presets" => Command::SetTextStylePresets(remote.payload_as()?),
            "load-configuration" => Command::LoadConfiguration(Box::new(remote.payload_as()?)),
            other => return Err(Error::protocol(format!("unknown command '{}'", other))),
        };
        Ok(command)
    }
}

fn decode_trigger(remote: &RemoteCommand) -> Result<MessageConfig> {
    match remote.payload.as_ref() {
        Some(Value::String(text)) => Ok(MessageConfig::new("triggered", text.clone())),
        _ => remote.payload_as(),
    }
}

fn decode_messages(remote: &RemoteCommand) -> Result<Vec<MessageConfig>> {
    if let Some(Value::Array(items)) = remote.payload.as_ref() {
        if !items.is_empty() && items.iter().all(Value::is_string) {
            return Ok(items
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.as_str().map(|text| MessageConfig::new(i.to_string(), text)))
                .collect());
        }
    }
    remote.payload_as()
}

// ============================================================================
// Inbound Event Stream
// ============================================================================

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEvent {
    pub event: String,
    pub data: String,
}

impl ServerEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    pub fn state(snapshot: &Snapshot) -> Result<Self> {
        Ok(Self::new(STATE_EVENT, serde_json::to_string(snapshot)?))
    }

    pub fn command(command: &RemoteCommand) -> Result<Self> {
        Ok(Self::new(COMMAND_EVENT, serde_json::to_string(command)?))
    }
}

/// Parsed inbound item
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    State(Snapshot),
    Command(RemoteCommand),
}

/// Parse a server event. Unknown event names yield `Ok(None)`.
pub fn parse_inbound(event: &ServerEvent) -> Result<Option<Inbound>> {
    match event.event.as_str() {
        STATE_EVENT => serde_json::from_str::<Snapshot>(&event.data)
            .map(|snapshot| Some(Inbound::State(snapshot)))
            .map_err(|e| Error::malformed_snapshot(e.to_string())),
        COMMAND_EVENT => serde_json::from_str::<RemoteCommand>(&event.data)
            .map(|command| Some(Inbound::Command(command)))
            .map_err(|e| Error::protocol(format!("malformed command event: {}", e))),
        _ => Ok(None),
    }
}

/// Incremental `text/event-stream` decoder.
///
/// Accepts arbitrary byte chunks (a line or a UTF-8 sequence may straddle two
/// chunks) and yields complete events as blank lines dispatch them.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<ServerEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<ServerEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id/retry are not used by this protocol
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<ServerEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(ServerEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

/// Decode a byte-chunk stream into server events. A chunk error ends the
/// stream after yielding a transport error.
pub fn decode_event_stream<S, B, E>(chunks: S) -> impl Stream<Item = Result<ServerEvent>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    let state = (Box::pin(chunks), SseDecoder::new(), VecDeque::new(), false);
    futures_util::stream::unfold(
        state,
        |(mut chunks, mut decoder, mut pending, failed)| async move {
            if failed {
                return None;
            }
            loop {
                if let Some(event) = pending.pop_front() {
                    return Some((Ok(event), (chunks, decoder, pending, false)));
                }
                match chunks.next().await {
                    Some(Ok(chunk)) => pending.extend(decoder.push(chunk.as_ref())),
                    Some(Err(err)) => {
                        let err = Error::transport(format!("event stream read failed: {}", err));
                        return Some((Err(err), (chunks, decoder, pending, true)));
                    }
                    None => return None,
                }
            }
        },
    )
}
