//! Drag session handlers

use vibecast_core::prelude::*;
use vibecast_core::{path_of, Point, RowBounds};

use super::tree::propose_tree;
use super::UpdateResult;
use crate::drag::{plan_drop, DragSession};
use crate::state::AppState;

pub fn handle_drag_start(state: &mut AppState, id: &str, pointer: Point) -> UpdateResult {
    let Some(path) = path_of(state.displayed_tree(), id) else {
        debug!("Drag start: {} not in tree", id);
        return UpdateResult::none();
    };
    if !state.drag.begin(DragSession::new(path, id, pointer)) {
        debug!("Drag start ignored, a drag is already in progress");
    }
    UpdateResult::none()
}

/// Recompute the drop marker; never touches the tree
pub fn handle_drag_move(state: &mut AppState, pointer: Point, bounds: &[RowBounds]) -> UpdateResult {
    if !state.drag.is_dragging() {
        return UpdateResult::none();
    }
    let resolver = state.drop_resolver();
    let tree = state.displayed_tree();
    let rows = vibecast_core::visible_rows(tree);
    let target = resolver.resolve(pointer, &rows, bounds, tree.len());
    trace!("Drag target: {:?}", target);
    state.drag.update(pointer, target);
    UpdateResult::none()
}

pub fn handle_drag_end(state: &mut AppState) -> UpdateResult {
    let Some(session) = state.drag.commit() else {
        return UpdateResult::none();
    };
    let planned = plan_drop(state.displayed_tree(), &session);
    state.drag.finish();

    match planned {
        Some(tree) => {
            debug!("Drop: moving {}", session.source_id);
            propose_tree(state, tree)
        }
        None => UpdateResult::none(),
    }
}

pub fn handle_drag_cancel(state: &mut AppState) -> UpdateResult {
    if state.drag.cancel() {
        debug!("Drag cancelled");
    }
    UpdateResult::none()
}
