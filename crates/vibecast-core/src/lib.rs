//! # vibecast-core - Core Domain Types
//!
//! Foundation crate for VibeCast. Provides the show data model, the message
//! tree and its structural operations, positional path arithmetic, drop
//! target resolution, error handling and logging setup.
//!
//! This crate has **zero internal dependencies** and no async code.
//!
//! ## Public API
//!
//! ### Paths (`path`)
//! - [`TreePath`] - Dotted index path (`"1.0.3"`) into the tree
//! - [`is_descendant()`], [`adjust_path_for_removal()`] - Path arithmetic
//!
//! ### Tree (`tree`)
//! - [`TreeNode`] - Folder or leaf message
//! - [`insert()`], [`remove()`], [`move_into()`], [`move_before_index()`] - Pure structural edits
//! - [`flatten()`], [`build_flat_tree()`], [`count_folder()`], [`visible_rows()`] - Projections
//!
//! ### Drag and Drop (`drop_target`)
//! - [`DropResolver`] - Pointer + row geometry to [`DropTarget`]
//!
//! ### Show State (`models`, `snapshot`)
//! - [`MessageConfig`], [`MessageStats`], [`CommonSettings`], presets
//! - [`Snapshot`] - Authoritative show configuration
//! - [`ConfigDocument`] - Persisted save/load document
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use vibecast_core::prelude::*;
//! ```

pub mod drop_target;
pub mod error;
pub mod logging;
pub mod models;
pub mod path;
pub mod prelude;
pub mod snapshot;
pub mod tree;

// Re-export commonly used types at crate root for convenience
pub use drop_target::{DropResolver, DropTarget, Point, RowBounds, DEFAULT_INSERT_MARGIN};
pub use error::{Error, Result, ResultExt};
pub use models::{
    now_millis, CommonSettings, FolderPlaybackQueue, MessageConfig, MessageStats,
    TextStylePreset, TriggerHistory, VisualizationPreset, DEFAULT_TEXT_STYLE, STATS_HISTORY_LIMIT,
};
pub use path::{adjust_path_for_removal, is_descendant, TreePath};
pub use snapshot::{ConfigDocument, Snapshot, CONFIG_DOCUMENT_VERSION};
pub use tree::{
    build_flat_tree, children_at, collect_message_ids, contains_id, count_folder, find_folder,
    flatten, insert, move_before_index, move_into, node_at, path_of, remove, remove_by_id,
    remove_message, rename_folder, toggle_collapsed, update_message, visible_rows, FolderCount,
    MessageTree, TreeNode, VisibleRow,
};
