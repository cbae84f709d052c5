//! Workspace facade
//!
//! Ties the pieces together for a presentation layer: the node graph, the
//! refresh coordinator, the persisted-across-rebuild state, the active
//! search query and the structural mutation surface.
//!
//! A `Workspace` must live on a single owning context; every graph mutation
//! and flag update happens through `&mut self` on that context. Watcher
//! callbacks run elsewhere and only ever talk to it through the
//! coordinator's channel, which the owning context drains via
//! [`pump`](Workspace::pump) or [`refresh`](Workspace::refresh).

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::file_reader::{self, FileReadConfig};
use crate::core::paths;
use crate::tree::error::Result;
use crate::tree::{
    filter, mutate, state, MoveOutcome, Node, NodeId, NodeKind, ScanPolicy, Tree, TreeBuilder,
    TreeState, WarnAndIgnore,
};
use crate::watch::{RefreshCoordinator, DEFAULT_DEBOUNCE};

/// Caller-owned configuration; there is no process-wide singleton.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Project root the tree mirrors
    pub root: PathBuf,
    /// Limits for content extraction during search
    pub read: FileReadConfig,
    /// Window for coalescing watcher notification bursts
    pub debounce: Duration,
}

impl WorkspaceConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            read: FileReadConfig::default(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Change notifications for subscribed presentation layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    /// A rebuild published a brand-new node graph
    TreeReplaced,
    /// Selection/expansion/enablement flags changed on the current graph
    FlagsChanged,
    /// A node was patched in place (rename) or detached (exclude)
    NodePatched,
}

/// The live project tree and its operation surface
pub struct Workspace {
    config: WorkspaceConfig,
    tree: Tree,
    coordinator: RefreshCoordinator,
    last_query: String,
    policy: Box<dyn ScanPolicy>,
    content_gate: Box<dyn Fn(&Path) -> bool>,
    subscribers: Vec<Sender<TreeEvent>>,
}

impl Workspace {
    pub fn new(config: WorkspaceConfig) -> Self {
        let coordinator = RefreshCoordinator::new(config.debounce);
        Self {
            config,
            tree: Tree::new(),
            coordinator,
            last_query: String::new(),
            policy: Box::new(WarnAndIgnore),
            content_gate: Box::new(file_reader::is_text_candidate),
            subscribers: Vec::new(),
        }
    }

    /// Replace the enumeration-failure policy consulted during builds
    pub fn with_policy(mut self, policy: impl ScanPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Replace the predicate deciding which files expose content to search
    pub fn with_content_gate(mut self, gate: impl Fn(&Path) -> bool + 'static) -> Self {
        self.content_gate = Box::new(gate);
        self
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// Shorthand for a registry lookup by absolute path
    pub fn node_at(&self, path: &Path) -> Option<NodeId> {
        self.tree.lookup(path)
    }

    /// (Re)bind the workspace to `root`, start watching it and publish the
    /// initial tree. A root that is not an existing directory leaves the
    /// prior tree untouched.
    pub fn load(&mut self, root: &Path) -> Result<()> {
        if !root.is_dir() {
            warn!(root = %root.display(), "not a directory, keeping current tree");
            return Ok(());
        }
        self.config.root = root.to_path_buf();
        self.coordinator.watch(root)?;
        info!(root = %root.display(), "loading project");
        self.refresh()
    }

    /// Rebuild the tree from disk, restore expansion/selection state and
    /// re-apply the active filter. Requests arriving while a rebuild is in
    /// flight collapse into at most one trailing pass.
    pub fn refresh(&mut self) -> Result<()> {
        if !self.coordinator.begin_refresh() {
            return Ok(());
        }
        loop {
            let result = self.rebuild_once();
            let again = self.coordinator.end_refresh();
            result?;
            if !again || !self.coordinator.begin_refresh() {
                return Ok(());
            }
            debug!("running trailing refresh");
        }
    }

    fn rebuild_once(&mut self) -> Result<()> {
        let saved = state::snapshot(&self.tree);
        let service_dir = paths::service_dir(&self.config.root);

        let built = TreeBuilder::new(service_dir, self.policy.as_mut()).build(&self.config.root)?;
        let Some(tree) = built else {
            debug!(root = %self.config.root.display(), "root vanished, keeping current tree");
            return Ok(());
        };

        self.tree = tree;
        state::restore(&mut self.tree, &saved);
        self.reapply_filter();
        debug!(nodes = self.tree.len(), "tree rebuilt");
        self.emit(TreeEvent::TreeReplaced);
        Ok(())
    }

    /// Service any queued watcher notifications.
    ///
    /// Blocks the owning context for up to `timeout` waiting for the first
    /// notification, coalesces the burst behind it, then refreshes. Returns
    /// whether a refresh ran.
    pub fn pump(&mut self, timeout: Duration) -> Result<bool> {
        if self.coordinator.wait_for_change(timeout) {
            self.refresh()?;
            return Ok(true);
        }
        Ok(false)
    }

    // --- search -----------------------------------------------------------

    /// Re-evaluate enablement tree-wide against `query`. The query sticks:
    /// it is re-applied after every rebuild until replaced.
    pub fn apply_filter(&mut self, query: &str) {
        self.last_query = query.to_string();
        self.reapply_filter();
        self.emit(TreeEvent::FlagsChanged);
    }

    pub fn last_query(&self) -> &str {
        &self.last_query
    }

    fn reapply_filter(&mut self) {
        let gate = &self.content_gate;
        let read = &self.config.read;
        let check = |node: &Node| content_text(node, gate, read);
        let display = |node: &Node| node.full_path.display().to_string();
        filter::apply(&mut self.tree, &self.last_query, &check, &display);
    }

    /// A node's searchable content: empty for folders and for files the
    /// content gate excludes
    pub fn content_text(&self, id: NodeId) -> String {
        content_text(self.tree.node(id), &self.content_gate, &self.config.read)
    }

    // --- state ------------------------------------------------------------

    /// Capture expansion/selection, e.g. around an operation that
    /// deliberately avoids a rebuild
    pub fn snapshot_state(&self) -> TreeState {
        state::snapshot(&self.tree)
    }

    pub fn restore_state(&mut self, saved: &TreeState) {
        state::restore(&mut self.tree, saved);
        self.emit(TreeEvent::FlagsChanged);
    }

    /// Set the selection flag, cascading to enabled descendants
    pub fn select(&mut self, id: NodeId, selected: bool) {
        self.tree.set_selected(id, selected);
        self.emit(TreeEvent::FlagsChanged);
    }

    /// Selected file paths for the content-aggregation collaborator
    pub fn selected_files(&self) -> Vec<PathBuf> {
        self.tree.selected_files()
    }

    // --- mutations --------------------------------------------------------

    /// Create a file or folder under `parent` (the root when `parent` is
    /// not a folder), then refresh to pick it up
    pub fn create(&mut self, parent: Option<NodeId>, name: &str, kind: NodeKind) -> Result<PathBuf> {
        let path = mutate::create(&self.tree, parent, name, kind)?;
        self.coordinator.request_refresh();
        self.service_pending()?;
        Ok(path)
    }

    /// Delete an entry from disk, then refresh to drop its node
    pub fn delete(&mut self, id: NodeId) -> Result<PathBuf> {
        let path = mutate::delete(&self.tree, id)?;
        self.coordinator.request_refresh();
        self.service_pending()?;
        Ok(path)
    }

    /// Rename an entry; the graph is patched immediately, no rebuild runs
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<PathBuf> {
        let path = mutate::rename(&mut self.tree, id, new_name)?;
        self.emit(TreeEvent::NodePatched);
        Ok(path)
    }

    /// Move an entry under a new parent folder; the graph catches up on the
    /// next refresh
    pub fn move_node(&mut self, id: NodeId, new_parent: NodeId) -> Result<MoveOutcome> {
        let outcome = mutate::move_node(&self.tree, id, new_parent)?;
        if matches!(outcome, MoveOutcome::Moved(_)) {
            self.coordinator.request_refresh();
            self.service_pending()?;
        }
        Ok(outcome)
    }

    /// Detach an entry from the tree without touching the filesystem
    pub fn exclude(&mut self, id: NodeId) {
        mutate::exclude(&mut self.tree, id);
        self.emit(TreeEvent::NodePatched);
    }

    // --- events -----------------------------------------------------------

    /// Subscribe to change notifications; the receiver side is dropped
    /// silently when it goes away
    pub fn subscribe(&mut self) -> Receiver<TreeEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: TreeEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    fn service_pending(&mut self) -> Result<()> {
        if self.coordinator.take_pending() {
            self.refresh()?;
        }
        Ok(())
    }
}

fn content_text(
    node: &Node,
    gate: &(impl Fn(&Path) -> bool + ?Sized),
    read: &FileReadConfig,
) -> String {
    if node.kind != NodeKind::File || !gate(&node.full_path) {
        return String::new();
    }
    file_reader::read_file_text(&node.full_path, read).unwrap_or_default()
}
