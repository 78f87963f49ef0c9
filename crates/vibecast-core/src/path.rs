//! Positional addressing into the message tree.
//!
//! A [`TreePath`] names a node by descending child indices from the root and
//! is written as dot-joined text (`"1.0.3"`). The root itself is the empty
//! path (`""`). Paths are positional, not identities: any insertion or
//! removal at an equal-or-shallower position invalidates them, so a path held
//! across an edit must be passed through [`adjust_path_for_removal`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Dotted index path into the tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TreePath(Vec<usize>);

impl TreePath {
    /// The root path (`""`), parent of all top-level nodes
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_indices(indices: impl Into<Vec<usize>>) -> Self {
        Self(indices.into())
    }

    /// Parse dotted text. The empty string is the root.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::root());
        }
        text.split('.')
            .map(|segment| {
                segment
                    .parse::<usize>()
                    .map_err(|_| Error::invalid_path(text))
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn to_indices(&self) -> Vec<usize> {
        self.0.clone()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Nesting depth; top-level nodes have depth 1
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of the containing child sequence, `None` for the root
    pub fn parent(&self) -> Option<TreePath> {
        self.0
            .split_last()
            .map(|(_, parent)| TreePath(parent.to_vec()))
    }

    /// Index within the parent's children, `None` for the root
    pub fn last_index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn child(&self, index: usize) -> TreePath {
        let mut indices = self.0.clone();
        indices.push(index);
        TreePath(indices)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}

impl FromStr for TreePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TreePath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<TreePath> for String {
    fn from(path: TreePath) -> Self {
        path.to_string()
    }
}

/// True iff `other` is `ancestor` or begins with `ancestor + "."`.
///
/// Follows the textual rule exactly, so the root is only a "descendant" of
/// itself: no node path begins with `"."`.
pub fn is_descendant(ancestor: &TreePath, other: &TreePath) -> bool {
    if ancestor.is_root() {
        return other.is_root();
    }
    other.0.len() >= ancestor.0.len() && other.0[..ancestor.0.len()] == ancestor.0[..]
}

/// New path of the node formerly at `target` after the node at `removed` was
/// spliced out.
///
/// Only later siblings under the same parent (and their subtrees) shift, by
/// one at the removed depth. Everything else comes back unchanged, which makes
/// repeated application to an unaffected path a no-op. The removed node's own
/// subtree has no meaningful answer; it is returned unchanged.
pub fn adjust_path_for_removal(target: &TreePath, removed: &TreePath) -> TreePath {
    let Some((&removed_index, removed_parent)) = removed.0.split_last() else {
        return target.clone();
    };
    let depth = removed_parent.len();

    let shares_parent = target.0.len() > depth && target.0[..depth] == removed_parent[..];
    if shares_parent && target.0[depth] > removed_index {
        let mut indices = target.0.clone();
        indices[depth] -= 1;
        return TreePath(indices);
    }
    target.clone()
}
