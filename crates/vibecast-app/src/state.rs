//! Application state (Model in TEA pattern)

use std::collections::BTreeSet;
use std::sync::Arc;

use vibecast_core::{
    count_folder, find_folder, flatten, DropResolver, FolderCount, MessageConfig, Snapshot,
    TreeNode, VisibleRow,
};

use crate::config::Settings;
use crate::drag::DragState;
use crate::reconcile::Reconciler;

/// Complete application state (the Model in TEA)
#[derive(Debug)]
pub struct AppState {
    pub settings: Settings,

    /// Proposed and confirmed trees
    pub reconciler: Reconciler,

    /// Inbound event stream is up
    pub connected: bool,

    pub drag: DragState,

    /// Message ids this surface shows as playing
    pub active_messages: BTreeSet<String>,

    /// Most recent outbound failure, for display
    pub last_command_error: Option<String>,

    /// Outbound commands dispatched but not yet resolved
    pub commands_in_flight: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_settings(Settings::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            reconciler: Reconciler::new(),
            connected: false,
            drag: DragState::default(),
            active_messages: BTreeSet::new(),
            last_command_error: None,
            commands_in_flight: 0,
        }
    }

    /// Tree currently shown (proposal if pending, else confirmed)
    pub fn displayed_tree(&self) -> &[TreeNode] {
        self.reconciler.displayed_tree()
    }

    /// Last authoritative snapshot
    pub fn confirmed(&self) -> Option<&Arc<Snapshot>> {
        self.reconciler.confirmed()
    }

    pub fn visible_rows(&self) -> Vec<VisibleRow<'_>> {
        vibecast_core::visible_rows(self.displayed_tree())
    }

    pub fn drop_resolver(&self) -> DropResolver {
        DropResolver::new(self.settings.drag.insert_margin)
    }

    /// Message with `id` anywhere in the displayed tree
    pub fn find_message(&self, id: &str) -> Option<MessageConfig> {
        flatten(self.displayed_tree()).into_iter().find(|m| m.id == id)
    }

    pub fn is_active(&self, message_id: &str) -> bool {
        self.active_messages.contains(message_id)
    }

    /// Triggered/total leaf counts for folder `folder_id`, against the
    /// confirmed statistics
    pub fn folder_count(&self, folder_id: &str) -> Option<FolderCount> {
        let folder = find_folder(self.displayed_tree(), folder_id)?;
        let count = match self.confirmed() {
            Some(snapshot) => count_folder(folder, &snapshot.message_stats),
            None => count_folder(folder, &Default::default()),
        };
        Some(count)
    }
}
