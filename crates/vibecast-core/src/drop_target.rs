//! Drop target resolution for drag-and-drop over the rendered tree.
//!
//! Pure function of the pointer position and the geometry the presentation
//! layer reports for each visible row; no rendering state lives here.

use serde::{Deserialize, Serialize};

use crate::path::TreePath;
use crate::tree::VisibleRow;

/// Width reserved at a row's right edge for the sibling-insertion marker
pub const DEFAULT_INSERT_MARGIN: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rendered bounding box of one row, in the same space as the pointer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl RowBounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn mid_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.top && y <= self.bottom()
    }
}

/// The structural edit a drop would perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum DropTarget {
    /// Append as the last child of the folder
    #[serde(rename_all = "camelCase")]
    Into { folder_path: TreePath },
    /// Insert at `index` among the children of `parent_path`
    #[serde(rename_all = "camelCase")]
    Insert { parent_path: TreePath, index: usize },
}

/// Maps pointer coordinates over rendered rows to a [`DropTarget`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropResolver {
    insert_margin: f64,
}

impl Default for DropResolver {
    fn default() -> Self {
        Self::new(DEFAULT_INSERT_MARGIN)
    }
}

impl DropResolver {
    pub fn new(insert_margin: f64) -> Self {
        Self {
            insert_margin: insert_margin.max(0.0),
        }
    }

    pub fn insert_margin(&self) -> f64 {
        self.insert_margin
    }

    /// Resolve the drop target.
    ///
    /// `rows` and `bounds` are parallel, in display order; extra entries on
    /// either side are ignored. `root_len` is the number of top-level nodes.
    ///
    /// The folder-body test runs before the midpoint test: hovering a folder
    /// row offers "drop inside" unless the pointer sits in the trailing
    /// margin, which is left for sibling insertion.
    pub fn resolve(
        &self,
        pointer: Point,
        rows: &[VisibleRow<'_>],
        bounds: &[RowBounds],
        root_len: usize,
    ) -> DropTarget {
        let rendered = || rows.iter().zip(bounds.iter());

        if let Some((row, bounds)) = rendered().find(|(_, b)| b.contains_y(pointer.y)) {
            if row.node.is_folder() && pointer.x < bounds.right() - self.insert_margin {
                return DropTarget::Into {
                    folder_path: row.path.clone(),
                };
            }
        }

        if let Some((row, _)) = rendered().find(|(_, b)| b.mid_y() > pointer.y) {
            return DropTarget::Insert {
                parent_path: row.parent_path.clone(),
                index: row.index_in_parent,
            };
        }

        DropTarget::Insert {
            parent_path: TreePath::root(),
            index: root_len,
        }
    }
}
