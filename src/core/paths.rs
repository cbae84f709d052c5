//! Path normalization utilities
//!
//! Ensures all paths are normalized to use '/' as separator and are relative to root.

use std::path::{Path, PathBuf};

/// Name of the reserved service directory holding canopy's local configuration.
/// It is never represented in the tree and never mutated through it.
pub const SERVICE_DIR_NAME: &str = ".canopy";

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make a path relative to the root directory
pub fn make_relative(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(normalize_path)
}

/// Check if a path is hidden (starts with '.')
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Check if a directory entry carries the OS hidden attribute.
///
/// On Unix the filesystem has no hidden bit; the dot-name convention handled
/// by [`is_hidden`] is the whole story. On Windows the attribute is separate
/// from the name and must be checked on the metadata.
#[cfg(windows)]
pub fn has_hidden_attribute(metadata: &std::fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0
}

#[cfg(not(windows))]
pub fn has_hidden_attribute(_metadata: &std::fs::Metadata) -> bool {
    false
}

/// Get the .canopy service directory for a given root
pub fn service_dir(root: &Path) -> PathBuf {
    root.join(SERVICE_DIR_NAME)
}

/// Validate that a path is within the root directory (prevent path traversal)
pub fn is_within_root(path: &Path, root: &Path) -> bool {
    path.canonicalize()
        .ok()
        .and_then(|p| root.canonicalize().ok().map(|r| p.starts_with(r)))
        .unwrap_or(false)
}
