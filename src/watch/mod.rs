//! Refresh coordination
//!
//! Owns the recursive filesystem watcher and keeps the node graph consistent
//! with the disk without redundant or overlapping rebuilds. Notifications
//! arrive on the watcher's own threads and are handed off through a channel;
//! only the owning context ever drains it and runs rebuilds, so no locking
//! is involved.
//!
//! Rebuild scheduling is single-flight with a trailing retrigger: a request
//! arriving while a rebuild runs schedules exactly one follow-up pass once
//! the coordinator returns to idle. Rapid filesystem churn therefore costs
//! at most one extra rebuild instead of an unbounded queue, and no change is
//! permanently lost.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::tree::error::{Result, TreeError};

/// Default window for coalescing notification bursts before a rebuild
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// A coalesced change notification from the watcher
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub paths: Vec<PathBuf>,
}

/// Coordinator phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// Watcher ownership plus the single-flight rebuild guard.
///
/// The coordinator itself never rebuilds; the owning context brackets each
/// rebuild with [`begin_refresh`](Self::begin_refresh) /
/// [`end_refresh`](Self::end_refresh) and loops while the latter reports
/// more work.
pub struct RefreshCoordinator {
    watcher: Option<RecommendedWatcher>,
    watched_root: Option<PathBuf>,
    tx: Sender<ChangeEvent>,
    rx: Receiver<ChangeEvent>,
    state: RefreshState,
    retrigger: bool,
    pending: bool,
    debounce: Duration,
}

impl RefreshCoordinator {
    pub fn new(debounce: Duration) -> Self {
        let (tx, rx) = channel();
        Self {
            watcher: None,
            watched_root: None,
            tx,
            rx,
            state: RefreshState::Idle,
            retrigger: false,
            pending: false,
            debounce,
        }
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn watched_root(&self) -> Option<&Path> {
        self.watched_root.as_deref()
    }

    /// Bind the watcher to `root`.
    ///
    /// Watching the currently-watched root is a no-op. Changing roots tears
    /// down the previous watcher before establishing the new one; at most
    /// one watcher exists at a time.
    pub fn watch(&mut self, root: &Path) -> Result<()> {
        if self.watched_root.as_deref() == Some(root) {
            return Ok(());
        }
        self.unwatch();

        let tx = self.tx.clone();
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) if is_structural(&event.kind) => {
                    let _ = tx.send(ChangeEvent { paths: event.paths });
                }
                Ok(_) => {}
                Err(error) => warn!(%error, "filesystem watcher error"),
            },
            notify::Config::default(),
        )
        .map_err(|e| watch_error(root, e))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| watch_error(root, e))?;

        debug!(root = %root.display(), "watching");
        self.watcher = Some(watcher);
        self.watched_root = Some(root.to_path_buf());
        Ok(())
    }

    /// Drop the active watcher, if any
    pub fn unwatch(&mut self) {
        if let Some(root) = self.watched_root.take() {
            debug!(root = %root.display(), "unwatching");
        }
        self.watcher = None;
    }

    /// Note that a rebuild is warranted (mutation side-effects, explicit
    /// refresh requests, drained notifications)
    pub fn request_refresh(&mut self) {
        match self.state {
            RefreshState::Idle => self.pending = true,
            RefreshState::Refreshing => self.retrigger = true,
        }
    }

    /// True when a requested rebuild has not run yet
    pub fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Enter the refreshing state. Returns false when a rebuild is already
    /// in flight, in which case one trailing re-check is scheduled instead.
    pub fn begin_refresh(&mut self) -> bool {
        match self.state {
            RefreshState::Refreshing => {
                self.retrigger = true;
                false
            }
            RefreshState::Idle => {
                self.pending = false;
                self.state = RefreshState::Refreshing;
                true
            }
        }
    }

    /// Return to idle. Drains notifications that arrived mid-rebuild and
    /// reports whether the caller should run one more pass.
    pub fn end_refresh(&mut self) -> bool {
        self.state = RefreshState::Idle;
        self.drain();
        let again = self.retrigger || self.pending;
        self.retrigger = false;
        self.pending = false;
        if again {
            // the trailing pass re-enters through begin_refresh
            self.pending = true;
        }
        again
    }

    /// Pull every queued notification without blocking; returns how many
    /// were coalesced
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.rx.try_recv() {
            debug!(paths = ?event.paths, "change notification");
            count += 1;
        }
        if count > 0 {
            self.request_refresh();
        }
        count
    }

    /// Block on the owning context until a change arrives or `timeout`
    /// elapses. A burst is coalesced by sleeping out the debounce window and
    /// draining whatever queued up behind the first notification.
    pub fn wait_for_change(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                debug!(paths = ?event.paths, "change notification");
                std::thread::sleep(self.debounce);
                self.drain();
                self.request_refresh();
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            // cannot happen while we hold our own sender; treat as quiet
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    #[cfg(test)]
    fn sender(&self) -> Sender<ChangeEvent> {
        self.tx.clone()
    }
}

/// Creation, deletion and renames change the tree's shape; plain data writes
/// do not and are ignored.
fn is_structural(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}

fn watch_error(root: &Path, error: notify::Error) -> TreeError {
    TreeError::access(root, std::io::Error::other(error))
}
