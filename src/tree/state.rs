//! Expansion/selection state across rebuilds
//!
//! Rebuilds discard every node, so presentation state is captured as path
//! sets before a rebuild and replayed onto the fresh graph afterwards.
//! Matching is purely by path string: an entry that moved or was renamed
//! between snapshot and restore simply loses its state.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::tree::node::Tree;

/// Path-keyed snapshot of the expanded and selected flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeState {
    pub expanded: HashSet<PathBuf>,
    pub selected: HashSet<PathBuf>,
}

impl TreeState {
    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty() && self.selected.is_empty()
    }
}

/// Capture every node whose `expanded`/`selected` flag is set
pub fn snapshot(tree: &Tree) -> TreeState {
    let mut state = TreeState::default();
    for id in tree.ids() {
        let node = tree.node(id);
        if node.expanded {
            state.expanded.insert(node.full_path.clone());
        }
        if node.selected {
            state.selected.insert(node.full_path.clone());
        }
    }
    state
}

/// Set each node's flags to true iff its path appears in the corresponding
/// set; every other node gets false. Flags are written directly, without the
/// selection cascade — the snapshot already recorded the cascade's outcome.
pub fn restore(tree: &mut Tree, state: &TreeState) {
    for id in tree.ids() {
        let node = tree.node_mut(id);
        node.expanded = state.expanded.contains(&node.full_path);
        node.selected = state.selected.contains(&node.full_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::{NodeKind, Tree};
    use std::path::Path;

    fn sample_tree() -> Tree {
        let mut tree = Tree::new();
        let root = tree.insert(NodeKind::Folder, "p", "/p", None);
        let src = tree.insert(NodeKind::Folder, "src", "/p/src", Some(root));
        tree.insert(NodeKind::File, "a.txt", "/p/src/a.txt", Some(src));
        tree.insert(NodeKind::File, "b.txt", "/p/src/b.txt", Some(src));
        tree
    }

    #[test]
    fn test_snapshot_captures_set_flags() {
        let mut tree = sample_tree();
        let src = tree.lookup(Path::new("/p/src")).unwrap();
        let a = tree.lookup(Path::new("/p/src/a.txt")).unwrap();
        tree.node_mut(src).expanded = true;
        tree.node_mut(a).selected = true;

        let state = snapshot(&tree);
        assert!(state.expanded.contains(Path::new("/p/src")));
        assert!(state.selected.contains(Path::new("/p/src/a.txt")));
        assert_eq!(state.expanded.len(), 1);
        assert_eq!(state.selected.len(), 1);
    }

    #[test]
    fn test_snapshot_restore_roundtrip_is_idempotent() {
        let mut tree = sample_tree();
        let src = tree.lookup(Path::new("/p/src")).unwrap();
        let b = tree.lookup(Path::new("/p/src/b.txt")).unwrap();
        tree.node_mut(src).expanded = true;
        tree.node_mut(b).selected = true;

        let before = snapshot(&tree);
        restore(&mut tree, &before);
        let after = snapshot(&tree);

        assert_eq!(before.expanded, after.expanded);
        assert_eq!(before.selected, after.selected);
    }

    #[test]
    fn test_restore_clears_flags_not_in_snapshot() {
        let mut tree = sample_tree();
        let a = tree.lookup(Path::new("/p/src/a.txt")).unwrap();
        tree.node_mut(a).selected = true;

        restore(&mut tree, &TreeState::default());
        assert!(!tree.node(a).selected);
    }

    #[test]
    fn test_restore_onto_fresh_graph_matches_by_path() {
        let mut old = sample_tree();
        let a = old.lookup(Path::new("/p/src/a.txt")).unwrap();
        old.node_mut(a).selected = true;
        let state = snapshot(&old);

        // new graph, new identities, same paths plus one extra file
        let mut fresh = Tree::new();
        let root = fresh.insert(NodeKind::Folder, "p", "/p", None);
        let src = fresh.insert(NodeKind::Folder, "src", "/p/src", Some(root));
        let a2 = fresh.insert(NodeKind::File, "a.txt", "/p/src/a.txt", Some(src));
        let c = fresh.insert(NodeKind::File, "c.txt", "/p/src/c.txt", Some(src));

        restore(&mut fresh, &state);
        assert!(fresh.node(a2).selected);
        assert!(!fresh.node(c).selected);
    }

    #[test]
    fn test_renamed_path_loses_state() {
        let mut tree = sample_tree();
        let a = tree.lookup(Path::new("/p/src/a.txt")).unwrap();
        tree.node_mut(a).selected = true;
        let state = snapshot(&tree);

        tree.apply_rename(a, "renamed.txt", "/p/src/renamed.txt".into());
        restore(&mut tree, &state);
        assert!(!tree.node(a).selected);
    }
}
