//! Message tree model and its structural operations.
//!
//! The tree is a plain `Vec<TreeNode>` value. Every operation here takes the
//! old tree by reference and returns a new one, so readers holding the
//! previous value always see a complete tree.
//!
//! Edge policy: indices are clamped, and an operation addressed at a path or id
//! that does not exist returns the tree unchanged. Callers re-derive state from
//! the returned value instead of assuming the edit happened.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{MessageConfig, MessageStats};
use crate::path::{adjust_path_for_removal, is_descendant, TreePath};

/// The top-level child sequence of the message tree
pub type MessageTree = Vec<TreeNode>;

// ============================================================================
// Nodes
// ============================================================================

/// A folder or a leaf message.
///
/// Folders and messages share one id space; ids are unique across the whole
/// tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TreeNode {
    Folder {
        id: String,
        name: String,
        #[serde(default)]
        collapsed: bool,
        #[serde(default)]
        children: Vec<TreeNode>,
    },
    Message {
        id: String,
        message: MessageConfig,
    },
}

impl TreeNode {
    pub fn folder(id: impl Into<String>, name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        TreeNode::Folder {
            id: id.into(),
            name: name.into(),
            collapsed: false,
            children,
        }
    }

    /// Leaf node whose id mirrors the message id
    pub fn message(message: MessageConfig) -> Self {
        TreeNode::Message {
            id: message.id.clone(),
            message,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            TreeNode::Folder { id, .. } | TreeNode::Message { id, .. } => id,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, TreeNode::Folder { .. })
    }

    /// Folder name or message text
    pub fn label(&self) -> &str {
        match self {
            TreeNode::Folder { name, .. } => name,
            TreeNode::Message { message, .. } => &message.text,
        }
    }

    pub fn children(&self) -> Option<&[TreeNode]> {
        match self {
            TreeNode::Folder { children, .. } => Some(children),
            TreeNode::Message { .. } => None,
        }
    }

    pub fn as_message(&self) -> Option<&MessageConfig> {
        match self {
            TreeNode::Message { message, .. } => Some(message),
            TreeNode::Folder { .. } => None,
        }
    }
}

/// Aggregate over a folder's leaf descendants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FolderCount {
    pub triggered: usize,
    pub total: usize,
}

// ============================================================================
// Lookup
// ============================================================================

/// Child sequence addressed by `parent`; the root path yields the top level.
pub fn children_at<'a>(tree: &'a [TreeNode], parent: &TreePath) -> Option<&'a [TreeNode]> {
    let mut current = tree;
    for &index in parent.indices() {
        match current.get(index)? {
            TreeNode::Folder { children, .. } => current = children,
            TreeNode::Message { .. } => return None,
        }
    }
    Some(current)
}

pub fn node_at<'a>(tree: &'a [TreeNode], path: &TreePath) -> Option<&'a TreeNode> {
    let parent = path.parent()?;
    let index = path.last_index()?;
    children_at(tree, &parent)?.get(index)
}

/// Current path of the node with `id`, depth-first
pub fn path_of(tree: &[TreeNode], id: &str) -> Option<TreePath> {
    fn walk(nodes: &[TreeNode], id: &str, prefix: &TreePath) -> Option<TreePath> {
        for (index, node) in nodes.iter().enumerate() {
            let path = prefix.child(index);
            if node.id() == id {
                return Some(path);
            }
            if let TreeNode::Folder { children, .. } = node {
                if let Some(found) = walk(children, id, &path) {
                    return Some(found);
                }
            }
        }
        None
    }
    walk(tree, id, &TreePath::root())
}

pub fn find_folder<'a>(tree: &'a [TreeNode], folder_id: &str) -> Option<&'a TreeNode> {
    tree.iter().find_map(|node| match node {
        TreeNode::Folder { id, children, .. } => {
            if id == folder_id {
                Some(node)
            } else {
                find_folder(children, folder_id)
            }
        }
        TreeNode::Message { .. } => None,
    })
}

pub fn contains_id(tree: &[TreeNode], id: &str) -> bool {
    path_of(tree, id).is_some()
}

fn children_mut<'a>(tree: &'a mut Vec<TreeNode>, parent: &TreePath) -> Option<&'a mut Vec<TreeNode>> {
    let mut current = tree;
    for &index in parent.indices() {
        match current.get_mut(index)? {
            TreeNode::Folder { children, .. } => current = children,
            TreeNode::Message { .. } => return None,
        }
    }
    Some(current)
}

fn node_mut<'a>(tree: &'a mut Vec<TreeNode>, path: &TreePath) -> Option<&'a mut TreeNode> {
    let parent = path.parent()?;
    let index = path.last_index()?;
    children_mut(tree, &parent)?.get_mut(index)
}

fn message_mut<'a>(nodes: &'a mut [TreeNode], message_id: &str) -> Option<&'a mut MessageConfig> {
    for node in nodes.iter_mut() {
        match node {
            TreeNode::Message { message, .. } if message.id == message_id => return Some(message),
            TreeNode::Message { .. } => {}
            TreeNode::Folder { children, .. } => {
                if let Some(found) = message_mut(children, message_id) {
                    return Some(found);
                }
            }
        }
    }
    None
}

// ============================================================================
// Structural Edits
// ============================================================================

/// Insert `node` into the children of `parent` at `index`, clamped to
/// `[0, len]`. The root path inserts at the top level.
pub fn insert(tree: &[TreeNode], parent: &TreePath, index: usize, node: TreeNode) -> MessageTree {
    let mut next = tree.to_vec();
    match children_mut(&mut next, parent) {
        Some(children) => {
            let index = index.min(children.len());
            children.insert(index, node);
        }
        None => tracing::debug!("insert: no folder at {:?}, tree unchanged", parent.to_string()),
    }
    next
}

/// Splice the node at `path` out of its parent, returning the removed subtree.
pub fn remove(tree: &[TreeNode], path: &TreePath) -> (MessageTree, Option<TreeNode>) {
    let mut next = tree.to_vec();
    let removed = match (path.parent(), path.last_index()) {
        (Some(parent), Some(index)) => children_mut(&mut next, &parent)
            .filter(|children| index < children.len())
            .map(|children| children.remove(index)),
        _ => None,
    };
    if removed.is_none() {
        tracing::debug!("remove: nothing at {:?}, tree unchanged", path.to_string());
    }
    (next, removed)
}

/// Move the node at `source` to the end of the folder at `folder`, expanding
/// the folder so the moved node is visible.
///
/// Rejected (tree unchanged) when `folder` is `source` or inside it, when
/// `folder` is not a folder, or when either path is missing.
pub fn move_into(tree: &[TreeNode], source: &TreePath, folder: &TreePath) -> MessageTree {
    if source.is_root() || is_descendant(source, folder) {
        tracing::debug!(
            "move_into: {:?} cannot contain {:?}",
            folder.to_string(),
            source.to_string()
        );
        return tree.to_vec();
    }
    if !matches!(node_at(tree, folder), Some(TreeNode::Folder { .. })) {
        return tree.to_vec();
    }

    let (mut next, removed) = remove(tree, source);
    let Some(node) = removed else {
        return tree.to_vec();
    };

    let folder = adjust_path_for_removal(folder, source);
    if let Some(TreeNode::Folder {
        collapsed, children, ..
    }) = node_mut(&mut next, &folder)
    {
        children.push(node);
        *collapsed = false;
        return next;
    }
    tree.to_vec()
}

/// Move the node at `source` so it lands at `target_index` among the children
/// of `target_parent`, where `target_index` is expressed against the tree
/// before the move.
pub fn move_before_index(
    tree: &[TreeNode],
    source: &TreePath,
    target_parent: &TreePath,
    target_index: usize,
) -> MessageTree {
    if source.is_root() || is_descendant(source, target_parent) {
        return tree.to_vec();
    }
    if children_at(tree, target_parent).is_none() {
        return tree.to_vec();
    }

    let (next, removed) = remove(tree, source);
    let Some(node) = removed else {
        return tree.to_vec();
    };

    let mut index = target_index;
    if let (Some(source_parent), Some(source_index)) = (source.parent(), source.last_index()) {
        if &source_parent == target_parent && source_index < target_index {
            index -= 1;
        }
    }

    let parent = adjust_path_for_removal(target_parent, source);
    insert(&next, &parent, index, node)
}

/// Replace the message with `message_id` by `updater`'s edit of a copy.
pub fn update_message<F>(tree: &[TreeNode], message_id: &str, updater: F) -> MessageTree
where
    F: FnOnce(&mut MessageConfig),
{
    let mut next = tree.to_vec();
    match message_mut(&mut next, message_id) {
        Some(message) => {
            updater(message);
            // the id is the stats join key and never changes
            message.id = message_id.to_string();
        }
        None => tracing::debug!("update_message: {} not found", message_id),
    }
    next
}

/// Remove the node (folder or message) with `id`.
pub fn remove_by_id(tree: &[TreeNode], id: &str) -> (MessageTree, Option<TreeNode>) {
    match path_of(tree, id) {
        Some(path) => remove(tree, &path),
        None => (tree.to_vec(), None),
    }
}

/// Remove the leaf message with `message_id`; folders are never matched.
pub fn remove_message(tree: &[TreeNode], message_id: &str) -> MessageTree {
    fn strip(nodes: &[TreeNode], message_id: &str, done: &mut bool) -> Vec<TreeNode> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                TreeNode::Message { message, .. } if !*done && message.id == message_id => {
                    *done = true;
                }
                TreeNode::Folder {
                    id,
                    name,
                    collapsed,
                    children,
                } if !*done => out.push(TreeNode::Folder {
                    id: id.clone(),
                    name: name.clone(),
                    collapsed: *collapsed,
                    children: strip(children, message_id, done),
                }),
                other => out.push(other.clone()),
            }
        }
        out
    }
    let mut done = false;
    strip(tree, message_id, &mut done)
}

pub fn rename_folder(tree: &[TreeNode], path: &TreePath, new_name: &str) -> MessageTree {
    let mut next = tree.to_vec();
    if let Some(TreeNode::Folder { name, .. }) = node_mut(&mut next, path) {
        *name = new_name.to_string();
    }
    next
}

pub fn toggle_collapsed(tree: &[TreeNode], path: &TreePath) -> MessageTree {
    let mut next = tree.to_vec();
    if let Some(TreeNode::Folder { collapsed, .. }) = node_mut(&mut next, path) {
        *collapsed = !*collapsed;
    }
    next
}

// ============================================================================
// Projections
// ============================================================================

/// Depth-first list of every leaf message
pub fn flatten(tree: &[TreeNode]) -> Vec<MessageConfig> {
    fn walk(nodes: &[TreeNode], out: &mut Vec<MessageConfig>) {
        for node in nodes {
            match node {
                TreeNode::Message { message, .. } => out.push(message.clone()),
                TreeNode::Folder { children, .. } => walk(children, out),
            }
        }
    }
    let mut out = Vec::new();
    walk(tree, &mut out);
    out
}

/// One-level tree with a leaf per message, in order
pub fn build_flat_tree(messages: &[MessageConfig]) -> MessageTree {
    messages.iter().cloned().map(TreeNode::message).collect()
}

/// Ids of every leaf message under `nodes`, depth-first
pub fn collect_message_ids(nodes: &[TreeNode]) -> Vec<String> {
    flatten(nodes).into_iter().map(|message| message.id).collect()
}

/// Triggered/total counts over the leaf descendants of `folder`. A message
/// node on its own counts nothing.
pub fn count_folder(folder: &TreeNode, stats: &BTreeMap<String, MessageStats>) -> FolderCount {
    let Some(children) = folder.children() else {
        return FolderCount::default();
    };
    flatten(children)
        .iter()
        .fold(FolderCount::default(), |mut count, message| {
            count.total += 1;
            if stats.get(&message.id).is_some_and(MessageStats::was_triggered) {
                count.triggered += 1;
            }
            count
        })
}

/// Row of the rendered outline
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRow<'a> {
    pub path: TreePath,
    pub parent_path: TreePath,
    pub index_in_parent: usize,
    pub depth: usize,
    pub node: &'a TreeNode,
}

/// Depth-first rows, skipping the children of collapsed folders
pub fn visible_rows(tree: &[TreeNode]) -> Vec<VisibleRow<'_>> {
    fn walk<'a>(nodes: &'a [TreeNode], parent: &TreePath, depth: usize, out: &mut Vec<VisibleRow<'a>>) {
        for (index, node) in nodes.iter().enumerate() {
            let path = parent.child(index);
            out.push(VisibleRow {
                path: path.clone(),
                parent_path: parent.clone(),
                index_in_parent: index,
                depth,
                node,
            });
            if let TreeNode::Folder {
                collapsed: false,
                children,
                ..
            } = node
            {
                walk(children, &path, depth + 1, out);
            }
        }
    }
    let mut out = Vec::new();
    walk(tree, &TreePath::root(), 0, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: &str) -> TreeNode {
        TreeNode::message(MessageConfig::new(id, id.to_uppercase()))
    }

    fn p(text: &str) -> TreePath {
        TreePath::parse(text).unwrap()
    }

    fn ids(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(TreeNode::id).collect()
    }

    /// `[Intro[a, b], c]`
    fn intro_tree() -> MessageTree {
        vec![TreeNode::folder("intro", "Intro", vec![msg("a"), msg("b")]), msg("c")]
    }

    /// `[f1[a, f2[b, c]], d, f3[]]`
    fn nested_tree() -> MessageTree {
        vec![
            TreeNode::folder(
                "f1",
                "One",
                vec![msg("a"), TreeNode::folder("f2", "Two", vec![msg("b"), msg("c")])],
            ),
            msg("d"),
            TreeNode::folder("f3", "Three", vec![]),
        ]
    }

    fn all_paths(tree: &[TreeNode]) -> Vec<(TreePath, String)> {
        fn walk(nodes: &[TreeNode], prefix: &TreePath, out: &mut Vec<(TreePath, String)>) {
            for (i, node) in nodes.iter().enumerate() {
                let path = prefix.child(i);
                out.push((path.clone(), node.id().to_string()));
                if let Some(children) = node.children() {
                    walk(children, &path, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(tree, &TreePath::root(), &mut out);
        out
    }

    #[test]
    fn test_serde_tagged_union() {
        let json = r#"[
            {"type":"folder","id":"f","name":"F","children":[
                {"type":"message","id":"a","message":{"id":"a","text":"One","textStyle":"scrolling-capitals"}}
            ]}
        ]"#;
        let tree: MessageTree = serde_json::from_str(json).unwrap();
        assert!(tree[0].is_folder());
        assert_eq!(tree[0].children().unwrap()[0].id(), "a");

        let back = serde_json::to_value(&tree).unwrap();
        assert_eq!(back[0]["type"], "folder");
        assert_eq!(back[0]["collapsed"], false);
        assert_eq!(back[0]["children"][0]["type"], "message");
    }

    #[test]
    fn test_node_at_and_path_of() {
        let tree = nested_tree();
        assert_eq!(node_at(&tree, &p("0.1.1")).unwrap().id(), "c");
        assert_eq!(path_of(&tree, "c"), Some(p("0.1.1")));
        assert_eq!(path_of(&tree, "f3"), Some(p("2")));
        assert!(node_at(&tree, &p("1.0")).is_none());
        assert!(node_at(&tree, &TreePath::root()).is_none());
        assert!(path_of(&tree, "zzz").is_none());
    }

    #[test]
    fn test_insert_clamps_index() {
        let tree = vec![msg("a"), msg("b")];
        let next = insert(&tree, &TreePath::root(), 99, msg("c"));
        assert_eq!(ids(&next), ["a", "b", "c"]);

        let next = insert(&tree, &TreePath::root(), 0, msg("c"));
        assert_eq!(ids(&next), ["c", "a", "b"]);
    }

    #[test]
    fn test_insert_into_missing_parent_is_noop() {
        let tree = intro_tree();
        assert_eq!(insert(&tree, &p("5"), 0, msg("x")), tree);
        assert_eq!(insert(&tree, &p("1"), 0, msg("x")), tree);
    }

    #[test]
    fn test_remove_returns_subtree() {
        let tree = nested_tree();
        let (next, removed) = remove(&tree, &p("0.1"));
        let removed = removed.unwrap();
        assert_eq!(removed.id(), "f2");
        assert_eq!(collect_message_ids(removed.children().unwrap()), ["b", "c"]);
        assert_eq!(ids(next[0].children().unwrap()), ["a"]);
        // input untouched
        assert_eq!(tree, nested_tree());
    }

    #[test]
    fn test_remove_missing_path_is_noop() {
        let tree = nested_tree();
        let (next, removed) = remove(&tree, &p("7"));
        assert!(removed.is_none());
        assert_eq!(next, tree);

        let (next, removed) = remove(&tree, &TreePath::root());
        assert!(removed.is_none());
        assert_eq!(next, tree);
    }

    #[test]
    fn test_remove_then_reinsert_round_trips() {
        let tree = nested_tree();
        for (path, _) in all_paths(&tree) {
            let (without, removed) = remove(&tree, &path);
            let parent = path.parent().unwrap();
            let index = path.last_index().unwrap();
            let restored = insert(&without, &parent, index, removed.unwrap());
            assert_eq!(restored, tree, "round trip through {}", path);
        }
    }

    #[test]
    fn test_adjust_matches_post_removal_positions() {
        let tree = nested_tree();
        let before = all_paths(&tree);
        for (removed_path, removed_id) in &before {
            let (after_tree, removed) = remove(&tree, removed_path);
            let removed = removed.unwrap();
            let removed_ids = collect_ids(&removed);
            for (target, id) in &before {
                if id == removed_id || removed_ids.contains(id) {
                    continue;
                }
                let adjusted = adjust_path_for_removal(target, removed_path);
                assert_eq!(
                    path_of(&after_tree, id).as_ref(),
                    Some(&adjusted),
                    "{} after removing {}",
                    id,
                    removed_path
                );
            }
        }
    }

    fn collect_ids(node: &TreeNode) -> Vec<String> {
        let mut out = vec![node.id().to_string()];
        if let Some(children) = node.children() {
            for child in children {
                out.extend(collect_ids(child));
            }
        }
        out
    }

    #[test]
    fn test_move_into_appends_and_expands() {
        let tree = intro_tree();
        let next = move_into(&tree, &p("1"), &p("0"));
        assert_eq!(next.len(), 1);
        assert_eq!(ids(next[0].children().unwrap()), ["a", "b", "c"]);
    }

    #[test]
    fn test_move_into_adjusts_folder_path() {
        // d (index 1) moves into f3 (index 2), which shifts to index 1
        let tree = nested_tree();
        let next = move_into(&tree, &p("1"), &p("2"));
        assert_eq!(ids(&next), ["f1", "f3"]);
        assert_eq!(ids(next[1].children().unwrap()), ["d"]);
    }

    #[test]
    fn test_move_into_forces_expanded() {
        let mut tree = intro_tree();
        if let TreeNode::Folder { collapsed, .. } = &mut tree[0] {
            *collapsed = true;
        }
        let next = move_into(&tree, &p("1"), &p("0"));
        assert!(matches!(next[0], TreeNode::Folder { collapsed: false, .. }));
    }

    #[test]
    fn test_move_into_self_or_descendant_is_noop() {
        let tree = nested_tree();
        for (folder_path, _) in all_paths(&tree) {
            if !node_at(&tree, &folder_path).unwrap().is_folder() {
                continue;
            }
            for (target, _) in all_paths(&tree) {
                if is_descendant(&folder_path, &target) {
                    assert_eq!(move_into(&tree, &folder_path, &target), tree);
                }
            }
        }
    }

    #[test]
    fn test_move_into_message_target_is_noop() {
        let tree = nested_tree();
        assert_eq!(move_into(&tree, &p("2"), &p("1")), tree);
    }

    #[test]
    fn test_move_before_index_same_parent_forward() {
        let tree = vec![msg("a"), msg("b"), msg("c"), msg("d")];
        // drop a before d: original index 3, shifts to 2 after removing a
        let next = move_before_index(&tree, &p("0"), &TreePath::root(), 3);
        assert_eq!(ids(&next), ["b", "c", "a", "d"]);
    }

    #[test]
    fn test_move_before_index_same_parent_backward() {
        let tree = vec![msg("a"), msg("b"), msg("c"), msg("d")];
        let next = move_before_index(&tree, &p("3"), &TreePath::root(), 1);
        assert_eq!(ids(&next), ["a", "d", "b", "c"]);
    }

    #[test]
    fn test_move_before_index_to_end() {
        let tree = vec![msg("a"), msg("b"), msg("c")];
        let next = move_before_index(&tree, &p("0"), &TreePath::root(), 3);
        assert_eq!(ids(&next), ["b", "c", "a"]);
    }

    #[test]
    fn test_move_before_index_out_of_folder() {
        let tree = intro_tree();
        let next = move_before_index(&tree, &p("0.1"), &TreePath::root(), 0);
        assert_eq!(ids(&next), ["b", "intro", "c"]);
        assert_eq!(ids(next[1].children().unwrap()), ["a"]);
    }

    #[test]
    fn test_move_before_index_into_shifted_parent() {
        // d (1) moves into f3 (2) at index 0; f3 becomes index 1
        let tree = nested_tree();
        let next = move_before_index(&tree, &p("1"), &p("2"), 0);
        assert_eq!(ids(&next), ["f1", "f3"]);
        assert_eq!(ids(next[1].children().unwrap()), ["d"]);
    }

    #[test]
    fn test_move_before_index_into_own_subtree_is_noop() {
        let tree = nested_tree();
        assert_eq!(move_before_index(&tree, &p("0"), &p("0.1"), 0), tree);
        assert_eq!(move_before_index(&tree, &p("0"), &p("0"), 0), tree);
    }

    #[test]
    fn test_move_from_stale_path_is_noop() {
        let tree = intro_tree();
        assert_eq!(move_before_index(&tree, &p("4"), &TreePath::root(), 0), tree);
        assert_eq!(move_into(&tree, &p("4"), &p("0")), tree);
    }

    #[test]
    fn test_update_message_by_id() {
        let tree = nested_tree();
        let next = update_message(&tree, "c", |m| {
            m.text = "changed".to_string();
            m.id = "hijack".to_string();
        });
        let updated = node_at(&next, &p("0.1.1")).unwrap().as_message().unwrap();
        assert_eq!(updated.text, "changed");
        assert_eq!(updated.id, "c");
        assert_eq!(update_message(&tree, "nope", |m| m.text.clear()), tree);
    }

    #[test]
    fn test_remove_message_only_matches_leaves() {
        let tree = nested_tree();
        let next = remove_message(&tree, "b");
        assert_eq!(collect_message_ids(&next), ["a", "c", "d"]);
        assert_eq!(remove_message(&tree, "f2"), tree);
    }

    #[test]
    fn test_remove_by_id_removes_folders() {
        let tree = nested_tree();
        let (next, removed) = remove_by_id(&tree, "f2");
        assert_eq!(removed.unwrap().id(), "f2");
        assert_eq!(collect_message_ids(&next), ["a", "d"]);
    }

    #[test]
    fn test_rename_and_toggle() {
        let tree = nested_tree();
        let renamed = rename_folder(&tree, &p("0.1"), "Renamed");
        assert_eq!(node_at(&renamed, &p("0.1")).unwrap().label(), "Renamed");
        assert_eq!(rename_folder(&tree, &p("1"), "x"), tree);

        let toggled = toggle_collapsed(&tree, &p("0"));
        assert!(matches!(toggled[0], TreeNode::Folder { collapsed: true, .. }));
        assert_eq!(toggle_collapsed(&toggled, &p("0")), tree);
    }

    #[test]
    fn test_flatten_depth_first() {
        assert_eq!(collect_message_ids(&nested_tree()), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_flatten_rebuild_idempotent() {
        let tree = vec![msg("x"), msg("y"), msg("z")];
        let once = flatten(&tree);
        let twice = flatten(&build_flat_tree(&once));
        assert_eq!(once, twice);
        assert_eq!(build_flat_tree(&once), tree);
    }

    #[test]
    fn test_count_folder() {
        let tree = nested_tree();
        let mut stats = BTreeMap::new();
        let mut triggered = MessageStats::new("b");
        triggered.record(1);
        stats.insert("b".to_string(), triggered);
        stats.insert("c".to_string(), MessageStats::new("c"));
        stats.insert("d".to_string(), {
            let mut s = MessageStats::new("d");
            s.record(2);
            s
        });

        let count = count_folder(&tree[0], &stats);
        assert_eq!(count, FolderCount { triggered: 1, total: 3 });
        assert_eq!(count_folder(&tree[2], &stats), FolderCount::default());
        assert_eq!(count_folder(&tree[1], &stats), FolderCount::default());
    }

    #[test]
    fn test_visible_rows_skip_collapsed() {
        let tree = toggle_collapsed(&nested_tree(), &p("0.1"));
        let rows = visible_rows(&tree);
        let paths: Vec<String> = rows.iter().map(|r| r.path.to_string()).collect();
        assert_eq!(paths, ["0", "0.0", "0.1", "1", "2"]);

        let f2 = &rows[2];
        assert_eq!(f2.parent_path, p("0"));
        assert_eq!(f2.index_in_parent, 1);
        assert_eq!(f2.depth, 1);
        assert_eq!(f2.node.id(), "f2");
    }
}
