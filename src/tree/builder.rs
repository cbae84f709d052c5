//! Tree construction from the filesystem
//!
//! Recursively scans a directory and produces a fresh node graph plus its
//! path registry. Enumeration failures do not abort the scan by default:
//! they are routed through a caller-supplied [`ScanPolicy`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::core::paths;
use crate::tree::error::{Result, TreeError};
use crate::tree::node::{NodeId, NodeKind, Tree};

/// What to do about a directory whose contents could not be enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDecision {
    /// Abort the entire build with an error
    Abort,
    /// Retry enumerating the same directory
    Retry,
    /// Skip this directory and silently skip every later failure in this
    /// build (sticky; reset on the next build)
    IgnoreAll,
}

/// Caller-supplied policy consulted on enumeration failures
pub trait ScanPolicy {
    fn on_error(&mut self, dir: &Path, error: &io::Error) -> ScanDecision;
}

impl<F> ScanPolicy for F
where
    F: FnMut(&Path, &io::Error) -> ScanDecision,
{
    fn on_error(&mut self, dir: &Path, error: &io::Error) -> ScanDecision {
        self(dir, error)
    }
}

/// Default policy: log the failure once and skip everything it hides
pub struct WarnAndIgnore;

impl ScanPolicy for WarnAndIgnore {
    fn on_error(&mut self, dir: &Path, error: &io::Error) -> ScanDecision {
        warn!(dir = %dir.display(), %error, "directory enumeration failed, skipping");
        ScanDecision::IgnoreAll
    }
}

/// Recursive directory scanner producing a [`Tree`]
pub struct TreeBuilder<'a> {
    service_dir: PathBuf,
    policy: &'a mut dyn ScanPolicy,
    ignore_all: bool,
}

impl<'a> TreeBuilder<'a> {
    /// `service_dir` is skipped by exact path match wherever it appears.
    pub fn new(service_dir: PathBuf, policy: &'a mut dyn ScanPolicy) -> Self {
        Self {
            service_dir,
            policy,
            ignore_all: false,
        }
    }

    /// Build a fresh tree rooted at `root_path`.
    ///
    /// Returns `Ok(None)` when `root_path` is not an existing directory, in
    /// which case the caller keeps its prior tree untouched.
    pub fn build(&mut self, root_path: &Path) -> Result<Option<Tree>> {
        if !root_path.is_dir() {
            return Ok(None);
        }
        self.ignore_all = false;

        let name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root_path.to_string_lossy().into_owned());

        let mut tree = Tree::new();
        let root_id = tree.insert(NodeKind::Folder, name, root_path.to_path_buf(), None);
        self.scan_dir(&mut tree, root_id, root_path)?;
        Ok(Some(tree))
    }

    fn scan_dir(&mut self, tree: &mut Tree, parent: NodeId, dir: &Path) -> Result<()> {
        let (dirs, files) = loop {
            match self.enumerate(dir) {
                Ok(entries) => break entries,
                Err(error) => {
                    if self.ignore_all {
                        return Ok(());
                    }
                    match self.policy.on_error(dir, &error) {
                        ScanDecision::Abort => {
                            return Err(TreeError::access(dir, error));
                        }
                        ScanDecision::Retry => continue,
                        ScanDecision::IgnoreAll => {
                            self.ignore_all = true;
                            return Ok(());
                        }
                    }
                }
            }
        };

        for (path, name) in dirs {
            let id = tree.insert(NodeKind::Folder, name, path.clone(), Some(parent));
            self.scan_dir(tree, id, &path)?;
        }
        for (path, name) in files {
            tree.insert(NodeKind::File, name, path, Some(parent));
        }
        Ok(())
    }

    /// Enumerate one directory: admitted subdirectories first, then files,
    /// each in OS enumeration order. Hidden entries and the service
    /// directory are dropped here so they never become nodes.
    #[allow(clippy::type_complexity)]
    fn enumerate(
        &self,
        dir: &Path,
    ) -> io::Result<(Vec<(PathBuf, String)>, Vec<(PathBuf, String)>)> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path == self.service_dir || paths::is_hidden(&path) {
                continue;
            }
            // follows symlinks; a single unstat-able entry (broken symlink)
            // must not discard its siblings
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping unreadable entry");
                    continue;
                }
            };
            if paths::has_hidden_attribute(&metadata) {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if metadata.is_dir() {
                dirs.push((path, name));
            } else {
                files.push((path, name));
            }
        }

        Ok((dirs, files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn build(root: &Path) -> Option<Tree> {
        let mut policy = WarnAndIgnore;
        TreeBuilder::new(paths::service_dir(root), &mut policy)
            .build(root)
            .unwrap()
    }

    #[test]
    fn test_build_matches_filesystem_shape() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir(&src).unwrap();
        File::create(src.join("a.txt")).unwrap();
        File::create(src.join("b.txt")).unwrap();

        let tree = build(temp.path()).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).children.len(), 1);

        let src_id = tree.lookup(&src).unwrap();
        assert!(tree.node(src_id).is_folder());
        assert_eq!(tree.node(src_id).children.len(), 2);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_directories_come_before_files() {
        let temp = tempdir().unwrap();
        File::create(temp.path().join("a.txt")).unwrap();
        fs::create_dir(temp.path().join("zdir")).unwrap();

        let tree = build(temp.path()).unwrap();
        let root = tree.root().unwrap();
        let kinds: Vec<NodeKind> = tree.node(root).children.iter().map(|&c| tree.node(c).kind).collect();
        assert_eq!(kinds, vec![NodeKind::Folder, NodeKind::File]);
    }

    #[test]
    fn test_hidden_and_service_entries_are_absent() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir(&src).unwrap();
        File::create(src.join("a.txt")).unwrap();
        File::create(src.join("b.txt")).unwrap();
        fs::create_dir(temp.path().join(".hidden")).unwrap();
        fs::create_dir(temp.path().join(".canopy")).unwrap();
        File::create(temp.path().join(".canopy").join("config.json")).unwrap();

        let tree = build(temp.path()).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.node(root).children.len(), 1);
        assert!(tree.lookup(&temp.path().join(".hidden")).is_none());
        assert!(tree.lookup(&temp.path().join(".canopy")).is_none());
        assert_eq!(tree.len(), 4);
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_does_not_discard_siblings() {
        let temp = tempdir().unwrap();
        File::create(temp.path().join("a.txt")).unwrap();
        File::create(temp.path().join("b.txt")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone"), temp.path().join("dangling")).unwrap();

        let tree = build(temp.path()).unwrap();
        assert!(tree.lookup(&temp.path().join("a.txt")).is_some());
        assert!(tree.lookup(&temp.path().join("b.txt")).is_some());
        assert!(tree.lookup(&temp.path().join("dangling")).is_none());
    }

    #[test]
    fn test_missing_root_is_a_noop() {
        let temp = tempdir().unwrap();
        let gone = temp.path().join("nope");
        assert!(build(&gone).is_none());
    }

    #[test]
    fn test_file_root_is_a_noop() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("plain.txt");
        File::create(&file).unwrap();
        assert!(build(&file).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_dir_consults_policy() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        File::create(temp.path().join("ok.txt")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let mut calls = 0;
        let mut policy = |_: &Path, _: &io::Error| {
            calls += 1;
            ScanDecision::IgnoreAll
        };
        let tree = TreeBuilder::new(paths::service_dir(temp.path()), &mut policy)
            .build(temp.path())
            .unwrap()
            .unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(calls, 1);
        // the locked folder itself is still a node; its contents are not
        assert!(tree.lookup(&locked).is_some());
        assert!(tree.lookup(&temp.path().join("ok.txt")).is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_abort_policy_fails_the_build() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let mut policy = |_: &Path, _: &io::Error| ScanDecision::Abort;
        let result = TreeBuilder::new(paths::service_dir(temp.path()), &mut policy)
            .build(temp.path());

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(TreeError::Access { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_retry_then_ignore() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let mut calls = 0;
        let mut policy = |_: &Path, _: &io::Error| {
            calls += 1;
            if calls == 1 {
                ScanDecision::Retry
            } else {
                ScanDecision::IgnoreAll
            }
        };
        let tree = TreeBuilder::new(paths::service_dir(temp.path()), &mut policy)
            .build(temp.path())
            .unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(tree.is_some());
        assert_eq!(calls, 2);
    }
}
