//! Optimistic tree edits reconciled against authoritative snapshots.
//!
//! Two slots: the tree this client last proposed, and the snapshot the
//! authority last confirmed. The displayed tree is a pure function of both
//! ([`merge`]). A confirmed snapshot always supersedes the proposal; concurrent
//! edits are not merged.

use std::sync::Arc;

use vibecast_core::{MessageTree, Snapshot, TreeNode};

/// Tree to display given the two slots.
///
/// A pending proposal wins until a snapshot replaces it; without either,
/// the tree is empty.
pub fn merge<'a>(proposed: Option<&'a MessageTree>, confirmed: Option<&'a Snapshot>) -> &'a [TreeNode] {
    match (proposed, confirmed) {
        (Some(tree), _) => tree.as_slice(),
        (None, Some(snapshot)) => snapshot.tree(),
        (None, None) => &[],
    }
}

#[derive(Debug, Default)]
pub struct Reconciler {
    proposed: Option<MessageTree>,
    confirmed: Option<Arc<Snapshot>>,
    /// Bumped whenever the displayed tree may have changed
    revision: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display `tree` immediately, ahead of confirmation
    pub fn propose(&mut self, tree: MessageTree) {
        self.proposed = Some(tree);
        self.revision += 1;
    }

    /// Accept an authoritative snapshot; its tree replaces whatever was shown
    pub fn confirm(&mut self, snapshot: Arc<Snapshot>) {
        if self.proposed.take().is_some() {
            tracing::debug!("Reconciler: snapshot supersedes pending proposal");
        }
        self.confirmed = Some(snapshot);
        self.revision += 1;
    }

    pub fn displayed_tree(&self) -> &[TreeNode] {
        merge(self.proposed.as_ref(), self.confirmed.as_deref())
    }

    pub fn confirmed(&self) -> Option<&Arc<Snapshot>> {
        self.confirmed.as_ref()
    }

    pub fn has_pending_proposal(&self) -> bool {
        self.proposed.is_some()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
