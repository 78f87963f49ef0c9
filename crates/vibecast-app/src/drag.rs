//! Drag-and-drop session state machine
//!
//! `Idle -> Dragging -> Committing -> Idle`, or `Dragging -> Idle` on cancel.
//! Pointer moves only update the drop marker; the tree changes once, when the
//! session commits.

use vibecast_core::{
    is_descendant, move_before_index, move_into, node_at, DropTarget, MessageTree, Point,
    TreeNode, TreePath,
};

/// One in-progress drag
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// Path of the dragged node when the drag started
    pub source_path: TreePath,
    /// Id of the dragged node, used to detect a stale `source_path`
    pub source_id: String,
    pub pointer: Point,
    /// Last resolved drop target, shown as the insertion marker
    pub target: Option<DropTarget>,
}

impl DragSession {
    pub fn new(source_path: TreePath, source_id: impl Into<String>, pointer: Point) -> Self {
        Self {
            source_path,
            source_id: source_id.into(),
            pointer,
            target: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
    Committing(DragSession),
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DragState::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match self {
            DragState::Idle => None,
            DragState::Dragging(session) | DragState::Committing(session) => Some(session),
        }
    }

    /// Current insertion marker, if any
    pub fn target(&self) -> Option<&DropTarget> {
        self.session().and_then(|s| s.target.as_ref())
    }

    /// Start dragging. Ignored unless idle.
    pub fn begin(&mut self, session: DragSession) -> bool {
        if !self.is_idle() {
            return false;
        }
        *self = DragState::Dragging(session);
        true
    }

    /// Record a pointer move and its resolved target. Ignored unless dragging.
    pub fn update(&mut self, pointer: Point, target: DropTarget) -> bool {
        match self {
            DragState::Dragging(session) => {
                session.pointer = pointer;
                session.target = Some(target);
                true
            }
            _ => false,
        }
    }

    /// Pointer released: enter `Committing` and hand back the session
    pub fn commit(&mut self) -> Option<DragSession> {
        match std::mem::take(self) {
            DragState::Dragging(session) => {
                *self = DragState::Committing(session.clone());
                Some(session)
            }
            other => {
                *self = other;
                None
            }
        }
    }

    /// Commit applied (or abandoned); back to idle
    pub fn finish(&mut self) {
        *self = DragState::Idle;
    }

    /// Pointer cancelled; discard without editing
    pub fn cancel(&mut self) -> bool {
        let was_active = !self.is_idle();
        *self = DragState::Idle;
        was_active
    }
}

/// Tree produced by dropping `session` onto `tree`, or `None` if the drop
/// would change nothing.
///
/// A session whose source path no longer holds the dragged node (the tree was
/// replaced mid-drag) is abandoned.
pub fn plan_drop(tree: &[TreeNode], session: &DragSession) -> Option<MessageTree> {
    let target = session.target.as_ref()?;

    match node_at(tree, &session.source_path) {
        Some(node) if node.id() == session.source_id => {}
        _ => {
            tracing::debug!(
                "Drag: {} no longer at {}, dropping stale session",
                session.source_id,
                session.source_path
            );
            return None;
        }
    }

    let next = match target {
        DropTarget::Into { folder_path } => move_into(tree, &session.source_path, folder_path),
        DropTarget::Insert { parent_path, index } => {
            // inserting among its own children would detach the subtree
            if is_descendant(&session.source_path, parent_path) {
                return None;
            }
            move_before_index(tree, &session.source_path, parent_path, *index)
        }
    };

    (next.as_slice() != tree).then_some(next)
}
