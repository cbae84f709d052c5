//! Structural mutations
//!
//! Validates and executes create/delete/rename/move/exclude against the
//! filesystem and the in-memory graph. Validation is complete before the
//! single filesystem call; a failed operation leaves both views exactly as
//! they were.
//!
//! Rename and exclude patch the graph immediately. Create, delete and move
//! rely on the next rebuild to reflect their result, so their callers must
//! request a refresh on success.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use crate::tree::error::{Result, TreeError};
use crate::tree::node::{NodeId, NodeKind, Tree};

/// Result of a move request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The entry was moved on disk; the tree catches up on the next refresh
    Moved(PathBuf),
    /// The entry already lives under the requested parent
    AlreadyInPlace,
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains(['/', '\\']) {
        return Err(TreeError::access(
            name,
            io::Error::new(io::ErrorKind::InvalidInput, "invalid entry name"),
        ));
    }
    Ok(())
}

/// Create a file or folder under `parent`.
///
/// A non-folder (or absent) parent falls back to the tree root. The target
/// must not exist yet; the collision is reported without touching the
/// filesystem. Returns the created path.
pub fn create(
    tree: &Tree,
    parent: Option<NodeId>,
    name: &str,
    kind: NodeKind,
) -> Result<PathBuf> {
    validate_name(name)?;

    let parent = parent
        .filter(|&id| tree.node(id).is_folder())
        .or_else(|| tree.root().filter(|&id| tree.node(id).is_folder()))
        .ok_or_else(|| TreeError::NotAFolder {
            path: parent
                .map(|id| tree.node(id).full_path.clone())
                .unwrap_or_default(),
        })?;

    let target = tree.node(parent).full_path.join(name);
    if target.exists() {
        return Err(TreeError::NameCollision { path: target });
    }

    match kind {
        NodeKind::File => fs::write(&target, "").map_err(|e| TreeError::access(&target, e))?,
        NodeKind::Folder => {
            fs::create_dir(&target).map_err(|e| TreeError::access(&target, e))?
        }
    }
    debug!(path = %target.display(), ?kind, "created entry");
    Ok(target)
}

/// Delete an entry from disk (folders recursively). The node itself stays in
/// the graph until the next refresh removes it.
pub fn delete(tree: &Tree, id: NodeId) -> Result<PathBuf> {
    let node = tree.node(id);
    let path = node.full_path.clone();
    match node.kind {
        NodeKind::Folder => fs::remove_dir_all(&path).map_err(|e| TreeError::access(&path, e))?,
        NodeKind::File => fs::remove_file(&path).map_err(|e| TreeError::access(&path, e))?,
    }
    debug!(path = %path.display(), "deleted entry");
    Ok(path)
}

/// Rename an entry in place.
///
/// On success the node's `name` and `full_path` are patched immediately, and
/// every descendant's `full_path` is recomputed from its parent — no
/// rebuild, no extra filesystem enumeration. Renaming to the current name is
/// a no-op success.
pub fn rename(tree: &mut Tree, id: NodeId, new_name: &str) -> Result<PathBuf> {
    validate_name(new_name)?;

    let node = tree.node(id);
    if node.name == new_name {
        return Ok(node.full_path.clone());
    }
    // the root has no parent node; renaming it would pull the watched
    // directory out from under the watcher
    let Some(parent_dir) = node.parent.and(node.full_path.parent()) else {
        return Err(TreeError::access(
            &node.full_path,
            io::Error::new(io::ErrorKind::InvalidInput, "cannot rename the project root"),
        ));
    };

    let old_path = node.full_path.clone();
    let new_path = parent_dir.join(new_name);
    if new_path.exists() {
        return Err(TreeError::NameCollision { path: new_path });
    }

    fs::rename(&old_path, &new_path).map_err(|e| TreeError::access(&old_path, e))?;
    tree.apply_rename(id, new_name, new_path.clone());
    debug!(from = %old_path.display(), to = %new_path.display(), "renamed entry");
    Ok(new_path)
}

/// Move an entry under a new parent folder.
///
/// Self-moves and moves into one's own descendants are rejected from the
/// in-memory graph alone, before any filesystem access. The graph is not
/// patched on success; the next watcher-triggered refresh restores
/// consistency.
pub fn move_node(tree: &Tree, id: NodeId, new_parent: NodeId) -> Result<MoveOutcome> {
    if !tree.node(new_parent).is_folder() {
        return Err(TreeError::NotAFolder {
            path: tree.node(new_parent).full_path.clone(),
        });
    }
    if tree.node(id).parent == Some(new_parent) {
        return Ok(MoveOutcome::AlreadyInPlace);
    }

    let source = tree.node(id).full_path.clone();
    let dest = tree.node(new_parent).full_path.join(&tree.node(id).name);

    if new_parent == id {
        return Err(TreeError::InvalidMove {
            source_path: source,
            dest_path: dest,
            reason: "cannot move an entry into itself",
        });
    }
    if tree.is_descendant_of(new_parent, id) {
        return Err(TreeError::InvalidMove {
            source_path: source,
            dest_path: dest,
            reason: "cannot move an entry into its own descendant",
        });
    }
    if source == dest {
        return Err(TreeError::InvalidMove {
            source_path: source,
            dest_path: dest,
            reason: "source and destination are the same path",
        });
    }
    if dest.exists() {
        return Err(TreeError::NameCollision { path: dest });
    }

    fs::rename(&source, &dest).map_err(|e| TreeError::access(&source, e))?;
    debug!(from = %source.display(), to = %dest.display(), "moved entry");
    Ok(MoveOutcome::Moved(dest))
}

/// Detach a node (and its subtree) from the graph without touching the
/// filesystem, hiding it from consideration until the next full rebuild.
pub fn exclude(tree: &mut Tree, id: NodeId) {
    debug!(path = %tree.node(id).full_path.display(), "excluded entry");
    tree.detach(id);
}
