//! Unified Result Model
//!
//! Every CLI command maps the tree it operated on to this model before
//! rendering output, so the emitted shape is stable across commands.

use serde::{Deserialize, Serialize};

/// The kind of result item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Folder,
    File,
    Error,
}

/// Metadata for a result item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    /// File size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Depth of the entry below the root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
}

/// Error information for a result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanopyError {
    pub code: String,
    pub message: String,
}

impl CanopyError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// The unified result item that all commands must produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    /// The kind of this result
    pub kind: Kind,

    /// Path relative to root, using '/' as separator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Whether the entry is selected for content aggregation
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,

    /// Whether the entry matches the active search filter
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metadata
    pub meta: Meta,

    /// Errors (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<CanopyError>,
}

fn default_true() -> bool {
    true
}

impl ResultItem {
    /// Create a new folder result
    pub fn folder(path: impl Into<String>) -> Self {
        Self {
            kind: Kind::Folder,
            path: Some(path.into()),
            selected: false,
            enabled: true,
            meta: Meta::default(),
            errors: Vec::new(),
        }
    }

    /// Create a new file result
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            kind: Kind::File,
            path: Some(path.into()),
            selected: false,
            enabled: true,
            meta: Meta::default(),
            errors: Vec::new(),
        }
    }

    /// Create a new error result
    pub fn error(error: CanopyError) -> Self {
        Self {
            kind: Kind::Error,
            path: None,
            selected: false,
            enabled: true,
            meta: Meta::default(),
            errors: vec![error],
        }
    }

    /// Set metadata
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Set the selection flag
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    /// Set the enablement flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Result set containing multiple result items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub items: Vec<ResultItem>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: ResultItem) {
        self.items.push(item);
    }

    /// Sort items by path for stable output
    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| a.path.cmp(&b.path));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultItem;
    type IntoIter = std::vec::IntoIter<ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_item_serializes_lowercase_kind() {
        let item = ResultItem::file("src/main.rs");
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains(r#""kind":"file""#));
        assert!(json.contains(r#""path":"src/main.rs""#));
    }

    #[test]
    fn test_default_flags_are_skipped() {
        let item = ResultItem::folder("src");
        let json = serde_json::to_string(&item).unwrap();
        // selected=false is the default and omitted from the output
        assert!(!json.contains("selected"));
    }

    #[test]
    fn test_sort_is_stable_by_path() {
        let mut set = ResultSet::new();
        set.push(ResultItem::file("b.txt"));
        set.push(ResultItem::file("a.txt"));
        set.sort();
        assert_eq!(set.items[0].path.as_deref(), Some("a.txt"));
    }
}
