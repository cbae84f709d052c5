//! Tree module - The live, filesystem-backed node graph
//!
//! Provides:
//! - node: arena-backed Node graph with a flat path registry
//! - builder: recursive filesystem scan with an error policy
//! - state: expansion/selection snapshots across rebuilds
//! - filter: search-driven enablement with ancestor cascading
//! - mutate: validated structural mutations (create/delete/rename/move/exclude)
//! - error: the shared error taxonomy

pub mod builder;
pub mod error;
pub mod filter;
pub mod mutate;
pub mod node;
pub mod state;

pub use builder::{ScanDecision, ScanPolicy, TreeBuilder, WarnAndIgnore};
pub use error::{Result, TreeError};
pub use mutate::MoveOutcome;
pub use node::{Node, NodeId, NodeKind, Tree};
pub use state::TreeState;
