//! Structural tree edit handlers
//!
//! Every accepted edit proposes a whole new tree and sends exactly one
//! `set-message-tree`. Edits that leave the tree unchanged send nothing.

use vibecast_core::prelude::*;
use vibecast_core::{
    children_at, contains_id, insert, path_of, remove_by_id, rename_folder, toggle_collapsed,
    update_message, MessageConfig, MessageTree, TreeNode, TreePath,
};
use vibecast_sync::Command;

use super::UpdateResult;
use crate::state::AppState;

/// Fresh node id: millisecond timestamp plus random suffix
pub(crate) fn new_node_id(prefix: &str) -> String {
    format!(
        "{}-{}-{:08x}",
        prefix,
        vibecast_core::now_millis(),
        rand::random::<u32>()
    )
}

/// Show `tree` optimistically and send it upstream
pub(crate) fn propose_tree(state: &mut AppState, tree: MessageTree) -> UpdateResult {
    if tree.as_slice() == state.displayed_tree() {
        debug!("Tree edit changed nothing, not sending");
        return UpdateResult::none();
    }
    state.reconciler.propose(tree.clone());
    UpdateResult::send(Command::SetMessageTree(tree))
}

/// Path of folder `parent_id`, or the root for `None`
fn container_path(state: &AppState, parent_id: Option<&str>) -> Option<TreePath> {
    let Some(parent_id) = parent_id else {
        return Some(TreePath::root());
    };
    let tree = state.displayed_tree();
    let path = path_of(tree, parent_id)?;
    match vibecast_core::node_at(tree, &path) {
        Some(node) if node.is_folder() => Some(path),
        _ => None,
    }
}

fn append(state: &mut AppState, parent_id: Option<&str>, node: TreeNode) -> UpdateResult {
    let Some(parent) = container_path(state, parent_id) else {
        warn!("No folder {:?} to add {} to", parent_id, node.id());
        return UpdateResult::none();
    };
    let tree = state.displayed_tree();
    let index = children_at(tree, &parent).map_or(0, <[TreeNode]>::len);
    let next = insert(tree, &parent, index, node);
    propose_tree(state, next)
}

pub fn handle_add_folder(state: &mut AppState, parent_id: Option<&str>, name: &str) -> UpdateResult {
    let folder = TreeNode::folder(new_node_id("folder"), name, Vec::new());
    append(state, parent_id, folder)
}

pub fn handle_add_message(
    state: &mut AppState,
    parent_id: Option<&str>,
    mut message: MessageConfig,
) -> UpdateResult {
    if message.id.is_empty() || contains_id(state.displayed_tree(), &message.id) {
        message.id = new_node_id("msg");
    }
    append(state, parent_id, TreeNode::message(message))
}

pub fn handle_delete(state: &mut AppState, id: &str) -> UpdateResult {
    let (next, removed) = remove_by_id(state.displayed_tree(), id);
    if removed.is_none() {
        debug!("Delete: {} not in tree", id);
        return UpdateResult::none();
    }
    propose_tree(state, next)
}

pub fn handle_update_message(state: &mut AppState, message: MessageConfig) -> UpdateResult {
    let next = update_message(state.displayed_tree(), &message.id, |existing| {
        *existing = message.clone();
    });
    propose_tree(state, next)
}

pub fn handle_rename_folder(state: &mut AppState, id: &str, name: &str) -> UpdateResult {
    let Some(path) = path_of(state.displayed_tree(), id) else {
        debug!("Rename: {} not in tree", id);
        return UpdateResult::none();
    };
    let next = rename_folder(state.displayed_tree(), &path, name);
    propose_tree(state, next)
}

pub fn handle_toggle_collapse(state: &mut AppState, id: &str) -> UpdateResult {
    let Some(path) = path_of(state.displayed_tree(), id) else {
        debug!("Toggle collapse: {} not in tree", id);
        return UpdateResult::none();
    };
    let next = toggle_collapsed(state.displayed_tree(), &path);
    propose_tree(state, next)
}
