//! In-memory tree model
//!
//! One [`Node`] per filesystem entry, stored in an arena owned by [`Tree`].
//! Parent links are arena indices and never participate in ownership, so the
//! child -> parent back-reference cannot form a cycle. A flat registry maps
//! absolute paths to nodes for O(1) lookup during state restoration and
//! search.
//!
//! The whole graph is mutated from a single owning context; `Tree` is a plain
//! value with `&mut` methods and relies on that discipline rather than locks.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The kind of a filesystem entry, fixed at node creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

/// Handle to a node in the arena.
///
/// Valid only for the tree that produced it and only until the next rebuild;
/// node identity does not survive a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// One filesystem entry represented in the tree
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    /// Base name, updated on rename
    pub name: String,
    /// Absolute path; always equals the parent's path joined with `name`
    pub full_path: PathBuf,
    /// Non-owning back-reference, `None` for the root
    pub parent: Option<NodeId>,
    /// Owned children in filesystem enumeration order (directories first)
    pub children: Vec<NodeId>,
    /// The containing folder is unfolded in the presentation layer
    pub expanded: bool,
    /// Chosen for content aggregation
    pub selected: bool,
    /// Shown in the editor
    pub focused: bool,
    /// Matches the active search filter
    pub enabled: bool,
}

impl Node {
    fn new(kind: NodeKind, name: String, full_path: PathBuf, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            name,
            full_path,
            parent,
            children: Vec::new(),
            expanded: false,
            selected: false,
            focused: false,
            enabled: true,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

/// Arena-backed node graph with a path registry
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    registry: HashMap<PathBuf, NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// The single root node, if a project is loaded
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// O(1) path -> node lookup through the flat registry
    pub fn lookup(&self, path: &Path) -> Option<NodeId> {
        self.registry.get(path).copied()
    }

    /// Number of nodes reachable from the root
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// All reachable node ids in unspecified order
    pub fn ids(&self) -> Vec<NodeId> {
        self.registry.values().copied().collect()
    }

    /// Depth-first traversal from the root, parents before children,
    /// children in enumeration order
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.registry.len());
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            // reversed so the first child is visited first
            stack.extend(self.node(id).children.iter().rev());
        }
        order
    }

    /// Depth of a node below the root
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    /// Create a node, link it under its parent and register its path.
    /// A `None` parent designates the root; a loaded tree has exactly one.
    pub(crate) fn insert(
        &mut self,
        kind: NodeKind,
        name: impl Into<String>,
        full_path: impl Into<PathBuf>,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let full_path = full_path.into();
        self.nodes
            .push(Node::new(kind, name.into(), full_path.clone(), parent));
        match parent {
            Some(parent_id) => self.nodes[parent_id.0].children.push(id),
            None => {
                debug_assert!(self.root.is_none(), "a tree has exactly one root");
                self.root = Some(id);
            }
        }
        self.registry.insert(full_path, id);
        id
    }

    /// Detach a node from its parent and drop its whole subtree from the
    /// registry. Purely in-memory; the filesystem is untouched. The arena
    /// slots become unreachable and are reclaimed by the next rebuild.
    pub(crate) fn detach(&mut self, id: NodeId) {
        match self.node(id).parent {
            Some(parent_id) => {
                self.nodes[parent_id.0].children.retain(|&child| child != id);
            }
            None => self.root = None,
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let path = self.node(current).full_path.clone();
            self.registry.remove(&path);
            stack.extend(self.node(current).children.iter().copied());
        }
    }

    /// True if `ancestor` appears in `id`'s parent chain
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.node(parent).parent;
        }
        false
    }

    /// Set the selection flag, cascading the same value to every currently
    /// enabled descendant. Disabled (filtered-out) descendants keep their
    /// state.
    pub fn set_selected(&mut self, id: NodeId, selected: bool) {
        self.nodes[id.0].selected = selected;
        let children = self.node(id).children.clone();
        for child in children {
            if self.node(child).enabled {
                self.set_selected(child, selected);
            }
        }
    }

    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) {
        self.nodes[id.0].expanded = expanded;
    }

    pub fn set_focused(&mut self, id: NodeId, focused: bool) {
        self.nodes[id.0].focused = focused;
    }

    /// Selected files (not folders), in traversal order — the list handed to
    /// the content-aggregation collaborator
    pub fn selected_files(&self) -> Vec<PathBuf> {
        self.walk()
            .into_iter()
            .map(|id| self.node(id))
            .filter(|node| node.selected && node.kind == NodeKind::File)
            .map(|node| node.full_path.clone())
            .collect()
    }

    /// Rename a node in place: patch its name and path, re-register it, and
    /// recompute `full_path` for every descendant from its parent's new path.
    /// No filesystem enumeration is involved.
    pub(crate) fn apply_rename(&mut self, id: NodeId, new_name: &str, new_path: PathBuf) {
        let old_path = self.node(id).full_path.clone();
        self.registry.remove(&old_path);
        {
            let node = self.node_mut(id);
            node.name = new_name.to_string();
            node.full_path = new_path.clone();
        }
        self.registry.insert(new_path, id);

        let mut stack = self.node(id).children.clone();
        while let Some(child) = stack.pop() {
            let parent_path = self
                .node(self.node(child).parent.expect("non-root has a parent"))
                .full_path
                .clone();
            let updated = parent_path.join(&self.node(child).name);
            let stale = self.node(child).full_path.clone();
            self.registry.remove(&stale);
            self.node_mut(child).full_path = updated.clone();
            self.registry.insert(updated, child);
            stack.extend(self.node(child).children.iter().copied());
        }
    }
}
