//! canopy - a live, filesystem-backed project tree
//!
//! canopy keeps an in-memory tree of a project directory in sync with the
//! disk and exposes the operations a presentation layer needs on top of it:
//! search-driven filtering, selection with cascading, structural mutations
//! (create/delete/rename/move/exclude) and watcher-driven refresh with
//! single-flight coalescing.
//!
//! The [`workspace::Workspace`] facade is the main entry point; the `canopy`
//! binary wraps it in a CLI.

pub mod core;
pub mod tree;
pub mod watch;
pub mod workspace;

pub use tree::{
    MoveOutcome, Node, NodeId, NodeKind, Result, ScanDecision, ScanPolicy, Tree, TreeBuilder,
    TreeError, TreeState, WarnAndIgnore,
};
pub use watch::RefreshCoordinator;
pub use workspace::{TreeEvent, Workspace, WorkspaceConfig};
