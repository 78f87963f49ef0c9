use std::sync::Arc;

use serde_json::json;
use vibecast_core::{
    ConfigDocument, DropTarget, MessageConfig, Point, RowBounds, Snapshot, TreeNode, TreePath,
};
use vibecast_sync::{Command, RemoteCommand};

use super::*;
use crate::state::AppState;

const ROW_HEIGHT: f64 = 20.0;
const ROW_WIDTH: f64 = 300.0;

fn msg(id: &str) -> TreeNode {
    TreeNode::message(MessageConfig::new(id, id.to_uppercase()))
}

/// `[Intro[a, b], c]`
fn show_tree() -> Vec<TreeNode> {
    vec![
        TreeNode::folder("intro", "Intro", vec![msg("a"), msg("b")]),
        msg("c"),
    ]
}

fn confirmed_state(tree: Vec<TreeNode>) -> AppState {
    let mut state = AppState::new();
    state.reconciler.confirm(Arc::new(Snapshot {
        message_tree: Some(tree),
        ..Snapshot::default()
    }));
    state
}

/// Stacked rows for whatever the state currently displays
fn layout(state: &AppState) -> Vec<RowBounds> {
    state
        .visible_rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let indent = row.depth as f64 * 16.0;
            RowBounds::new(indent, i as f64 * ROW_HEIGHT, ROW_WIDTH - indent, ROW_HEIGHT)
        })
        .collect()
}

fn sent_command(result: &UpdateResult) -> Option<&Command> {
    match &result.action {
        Some(UpdateAction::SendCommand(command)) => Some(command),
        None => None,
    }
}

fn sent_tree(result: &UpdateResult) -> Vec<TreeNode> {
    match sent_command(result) {
        Some(Command::SetMessageTree(tree)) => tree.clone(),
        other => panic!("expected set-message-tree, got {:?}", other),
    }
}

fn drag(state: &mut AppState, id: &str, pointer: Point) -> UpdateResult {
    let bounds = layout(state);
    let start = update(
        state,
        Message::DragStart {
            id: id.to_string(),
            pointer: Point::new(0.0, 0.0),
        },
    );
    assert!(start.action.is_none());
    let moved = update(state, Message::DragMove { pointer, bounds });
    assert!(moved.action.is_none());
    update(state, Message::DragEnd)
}

// ─────────────────────────────────────────────────────────
// Drag and Drop
// ─────────────────────────────────────────────────────────

#[test]
fn test_drag_message_into_folder_sends_one_tree() {
    let mut state = confirmed_state(show_tree());

    // c is the fourth row; drop on the Intro folder body
    let result = drag(&mut state, "c", Point::new(50.0, 10.0));

    let expected = vec![TreeNode::folder("intro", "Intro", vec![msg("a"), msg("b"), msg("c")])];
    assert_eq!(sent_tree(&result), expected);
    assert!(result.message.is_none());
    assert_eq!(state.displayed_tree(), expected.as_slice());
    assert!(state.reconciler.has_pending_proposal());
    assert!(state.drag.is_idle());
}

#[test]
fn test_drag_to_same_position_sends_nothing() {
    let mut state = confirmed_state(show_tree());

    // upper half of c's own row: insert before c, which is where it already is
    let result = drag(&mut state, "c", Point::new(50.0, 62.0));

    assert!(result.action.is_none());
    assert!(!state.reconciler.has_pending_proposal());
    assert!(state.drag.is_idle());
}

#[test]
fn test_drag_folder_into_itself_is_rejected() {
    let mut state = confirmed_state(show_tree());

    // drop Intro onto its own body
    let result = drag(&mut state, "intro", Point::new(50.0, 10.0));

    assert!(result.action.is_none());
    assert_eq!(state.displayed_tree(), show_tree().as_slice());
}

#[test]
fn test_drag_move_updates_target_without_editing() {
    let mut state = confirmed_state(show_tree());
    let bounds = layout(&state);

    update(
        &mut state,
        Message::DragStart {
            id: "a".into(),
            pointer: Point::new(0.0, 30.0),
        },
    );
    update(
        &mut state,
        Message::DragMove {
            pointer: Point::new(50.0, 90.0),
            bounds,
        },
    );

    assert_eq!(
        state.drag.target(),
        Some(&DropTarget::Insert {
            parent_path: TreePath::root(),
            index: 2
        })
    );
    assert_eq!(state.displayed_tree(), show_tree().as_slice());
}

#[test]
fn test_drag_cancel_discards_session() {
    let mut state = confirmed_state(show_tree());
    let bounds = layout(&state);

    update(
        &mut state,
        Message::DragStart {
            id: "c".into(),
            pointer: Point::new(0.0, 70.0),
        },
    );
    update(
        &mut state,
        Message::DragMove {
            pointer: Point::new(50.0, 10.0),
            bounds,
        },
    );
    update(&mut state, Message::DragCancel);

    assert!(state.drag.is_idle());
    let result = update(&mut state, Message::DragEnd);
    assert!(result.action.is_none());
}

#[test]
fn test_drag_end_without_target_sends_nothing() {
    let mut state = confirmed_state(show_tree());

    update(
        &mut state,
        Message::DragStart {
            id: "a".into(),
            pointer: Point::new(0.0, 30.0),
        },
    );
    let result = update(&mut state, Message::DragEnd);

    assert!(result.action.is_none());
    assert!(state.drag.is_idle());
}

#[test]
fn test_drag_start_unknown_id_is_ignored() {
    let mut state = confirmed_state(show_tree());
    update(
        &mut state,
        Message::DragStart {
            id: "missing".into(),
            pointer: Point::new(0.0, 0.0),
        },
    );
    assert!(state.drag.is_idle());
}

// ─────────────────────────────────────────────────────────
// Tree Edits
// ─────────────────────────────────────────────────────────

#[test]
fn test_add_folder_appends_to_root() {
    let mut state = confirmed_state(show_tree());

    let result = update(
        &mut state,
        Message::AddFolder {
            parent_id: None,
            name: "Finale".into(),
        },
    );

    let tree = sent_tree(&result);
    assert_eq!(tree.len(), 3);
    match &tree[2] {
        TreeNode::Folder { id, name, children, .. } => {
            assert!(id.starts_with("folder-"));
            assert_eq!(name, "Finale");
            assert!(children.is_empty());
        }
        other => panic!("expected folder, got {:?}", other),
    }
}

#[test]
fn test_add_message_into_folder() {
    let mut state = confirmed_state(show_tree());

    let result = update(
        &mut state,
        Message::AddMessage {
            parent_id: Some("intro".into()),
            message: MessageConfig::new("d", "D"),
        },
    );

    let tree = sent_tree(&result);
    assert_eq!(
        tree[0],
        TreeNode::folder("intro", "Intro", vec![msg("a"), msg("b"), TreeNode::message(MessageConfig::new("d", "D"))])
    );
}

#[test]
fn test_add_message_with_taken_id_gets_fresh_id() {
    let mut state = confirmed_state(show_tree());

    let result = update(
        &mut state,
        Message::AddMessage {
            parent_id: None,
            message: MessageConfig::new("a", "Duplicate"),
        },
    );

    let tree = sent_tree(&result);
    let added = tree[2].id();
    assert_ne!(added, "a");
    assert!(added.starts_with("msg-"));
}

#[test]
fn test_add_to_message_parent_is_ignored() {
    let mut state = confirmed_state(show_tree());

    let result = update(
        &mut state,
        Message::AddFolder {
            parent_id: Some("c".into()),
            name: "Nested".into(),
        },
    );

    assert!(result.action.is_none());
    assert!(!state.reconciler.has_pending_proposal());
}

#[test]
fn test_delete_folder_removes_subtree() {
    let mut state = confirmed_state(show_tree());

    let result = update(&mut state, Message::DeleteNode { id: "intro".into() });

    assert_eq!(sent_tree(&result), vec![msg("c")]);
}

#[test]
fn test_delete_unknown_sends_nothing() {
    let mut state = confirmed_state(show_tree());
    let result = update(&mut state, Message::DeleteNode { id: "nope".into() });
    assert!(result.action.is_none());
}

#[test]
fn test_update_message_replaces_content() {
    let mut state = confirmed_state(show_tree());

    let result = update(
        &mut state,
        Message::UpdateMessage(MessageConfig::new("b", "Welcome")),
    );

    let tree = sent_tree(&result);
    assert_eq!(
        tree[0],
        TreeNode::folder(
            "intro",
            "Intro",
            vec![msg("a"), TreeNode::message(MessageConfig::new("b", "Welcome"))]
        )
    );
}

#[test]
fn test_identical_update_sends_nothing() {
    let mut state = confirmed_state(show_tree());
    let result = update(
        &mut state,
        Message::UpdateMessage(MessageConfig::new("b", "B")),
    );
    assert!(result.action.is_none());
}

#[test]
fn test_rename_and_toggle_collapse() {
    let mut state = confirmed_state(show_tree());

    let renamed = update(
        &mut state,
        Message::RenameFolder {
            id: "intro".into(),
            name: "Opening".into(),
        },
    );
    match &sent_tree(&renamed)[0] {
        TreeNode::Folder { name, .. } => assert_eq!(name, "Opening"),
        other => panic!("expected folder, got {:?}", other),
    }

    let toggled = update(&mut state, Message::ToggleCollapse { id: "intro".into() });
    match &sent_tree(&toggled)[0] {
        TreeNode::Folder { collapsed, .. } => assert!(*collapsed),
        other => panic!("expected folder, got {:?}", other),
    }
    // collapsed children are hidden from the row list
    assert_eq!(state.visible_rows().len(), 2);
}

#[test]
fn test_edits_chain_on_pending_proposal() {
    let mut state = confirmed_state(show_tree());

    update(&mut state, Message::DeleteNode { id: "a".into() });
    let result = update(&mut state, Message::DeleteNode { id: "b".into() });

    assert_eq!(
        sent_tree(&result),
        vec![TreeNode::folder("intro", "Intro", vec![]), msg("c")]
    );
}

// ─────────────────────────────────────────────────────────
// Sync
// ─────────────────────────────────────────────────────────

#[test]
fn test_snapshot_supersedes_pending_proposal() {
    let mut state = confirmed_state(show_tree());
    update(&mut state, Message::DeleteNode { id: "c".into() });
    assert!(state.reconciler.has_pending_proposal());

    let remote = vec![msg("x")];
    update(
        &mut state,
        Message::SnapshotReceived(Arc::new(Snapshot {
            message_tree: Some(remote.clone()),
            ..Snapshot::default()
        })),
    );

    assert!(!state.reconciler.has_pending_proposal());
    assert_eq!(state.displayed_tree(), remote.as_slice());
}

#[test]
fn test_unrelated_snapshot_keeps_triggered_message_active() {
    let mut state = confirmed_state(vec![msg("m1")]);

    let result = update(&mut state, Message::TriggerMessage { id: "m1".into() });
    assert!(matches!(
        sent_command(&result),
        Some(Command::TriggerMessage(message)) if message.id == "m1"
    ));
    assert!(state.is_active("m1"));

    // a settings change arrives with no triggered message
    update(
        &mut state,
        Message::SnapshotReceived(Arc::new(Snapshot {
            message_tree: Some(vec![msg("m1")]),
            active_visualization: "techno".into(),
            triggered_message: None,
            ..Snapshot::default()
        })),
    );

    assert!(state.is_active("m1"));
}

#[test]
fn test_snapshot_triggered_message_marks_active() {
    let mut state = AppState::new();
    update(
        &mut state,
        Message::SnapshotReceived(Arc::new(Snapshot {
            message_tree: Some(vec![msg("m2")]),
            triggered_message: Some(MessageConfig::new("m2", "M2")),
            ..Snapshot::default()
        })),
    );
    assert!(state.is_active("m2"));
}

#[test]
fn test_echoed_commands_update_active_set() {
    let mut state = confirmed_state(vec![msg("m1")]);

    update(
        &mut state,
        Message::CommandEchoed(RemoteCommand::new(
            "trigger-message",
            json!({ "id": "m1", "text": "M1" }),
        )),
    );
    assert!(state.is_active("m1"));

    update(
        &mut state,
        Message::CommandEchoed(RemoteCommand::new(
            "message-complete",
            json!({ "messageId": "m1" }),
        )),
    );
    assert!(!state.is_active("m1"));
}

#[test]
fn test_unknown_echo_is_ignored() {
    let mut state = AppState::new();
    let result = update(
        &mut state,
        Message::CommandEchoed(RemoteCommand::new("mystery", json!({}))),
    );
    assert!(result.action.is_none());
    assert!(state.active_messages.is_empty());
}

#[test]
fn test_connection_flags() {
    let mut state = AppState::new();
    update(&mut state, Message::SyncConnected);
    assert!(state.connected);
    update(
        &mut state,
        Message::SyncDisconnected {
            reason: "stream closed".into(),
        },
    );
    assert!(!state.connected);
}

#[test]
fn test_command_failure_is_recorded() {
    let mut state = AppState::new();
    state.commands_in_flight = 2;

    update(
        &mut state,
        Message::CommandFailed {
            command: "set-message-tree".into(),
            error: "server said no".into(),
        },
    );
    update(
        &mut state,
        Message::CommandSent {
            command: "trigger-message".into(),
        },
    );

    assert_eq!(state.commands_in_flight, 0);
    assert_eq!(
        state.last_command_error.as_deref(),
        Some("set-message-tree: server said no")
    );
}

// ─────────────────────────────────────────────────────────
// Show Control
// ─────────────────────────────────────────────────────────

#[test]
fn test_trigger_unknown_message_sends_nothing() {
    let mut state = confirmed_state(show_tree());
    let result = update(&mut state, Message::TriggerMessage { id: "zzz".into() });
    assert!(result.action.is_none());
    assert!(state.active_messages.is_empty());
}

#[test]
fn test_clear_active_removes_and_sends() {
    let mut state = confirmed_state(show_tree());
    update(&mut state, Message::TriggerMessage { id: "a".into() });

    let result = update(&mut state, Message::ClearActiveMessage { id: "a".into() });

    assert!(!state.is_active("a"));
    assert!(matches!(
        sent_command(&result),
        Some(Command::ClearActiveMessage { message_id, .. }) if message_id == "a"
    ));
}

#[test]
fn test_play_folder_requires_folder() {
    let mut state = confirmed_state(show_tree());

    let result = update(&mut state, Message::PlayFolder { id: "intro".into() });
    assert_eq!(
        sent_command(&result),
        Some(&Command::PlayFolder {
            folder_id: "intro".into()
        })
    );

    let result = update(&mut state, Message::PlayFolder { id: "c".into() });
    assert!(result.action.is_none());
}

#[test]
fn test_simple_show_commands_pass_through() {
    let mut state = AppState::new();

    let result = update(&mut state, Message::SetActiveVisualization(Some("techno".into())));
    assert_eq!(
        sent_command(&result),
        Some(&Command::SetActiveVisualization(Some("techno".into())))
    );

    let result = update(&mut state, Message::ResetStats);
    assert_eq!(sent_command(&result), Some(&Command::ResetMessageStats));

    let result = update(&mut state, Message::CancelFolderPlayback);
    assert_eq!(sent_command(&result), Some(&Command::CancelFolderPlayback));
}

#[test]
fn test_load_configuration_shows_tree_optimistically() {
    let mut state = confirmed_state(show_tree());
    let document = ConfigDocument {
        message_tree: Some(vec![msg("loaded")]),
        messages: None,
        ..ConfigDocument::from_snapshot(&Snapshot::default())
    };

    let result = update(&mut state, Message::LoadConfiguration(Box::new(document.clone())));

    assert_eq!(
        sent_command(&result),
        Some(&Command::LoadConfiguration(Box::new(document)))
    );
    assert_eq!(state.displayed_tree(), [msg("loaded")].as_slice());
    assert!(state.reconciler.has_pending_proposal());
}
