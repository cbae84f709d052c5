//! Unified file reading strategies
//!
//! Provides the content gate used by search and selection:
//! - Binary files are never surfaced as searchable text
//! - Oversized files are truncated at a UTF-8 boundary
//! - Non-UTF-8 content is converted lossily

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Default maximum file size to read in bytes (8 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 8 * 1024 * 1024;

/// Default truncation size in bytes (256 KB)
pub const DEFAULT_TRUNCATE_SIZE: usize = 256 * 1024;

/// Extensions that are always treated as text regardless of content sniffing
static TEXT_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "rs", "py", "ts", "tsx", "js", "jsx", "go", "java", "c", "h", "cpp", "hpp", "cs", "rb",
        "php", "sh", "sql", "md", "markdown", "txt", "json", "jsonl", "yaml", "yml", "toml",
        "ini", "cfg", "conf", "xml", "html", "css", "csv", "lock",
    ]
    .into_iter()
    .collect()
});

/// Configuration for file reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReadConfig {
    /// Maximum file size to process (bytes); larger files are skipped entirely
    pub max_file_size: u64,

    /// Size at which to truncate content (bytes)
    pub truncate_size: usize,
}

impl Default for FileReadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            truncate_size: DEFAULT_TRUNCATE_SIZE,
        }
    }
}

/// Check whether a file should be offered to content-based search at all.
///
/// Known text extensions pass immediately; anything else is sniffed for null
/// bytes in the first 8 KB. Unreadable files are excluded.
pub fn is_text_candidate(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if TEXT_EXTENSIONS.contains(ext.to_lowercase().as_str()) {
            return true;
        }
    }

    let mut file = match fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };
    let mut buf = [0u8; 8192];
    match file.read(&mut buf) {
        Ok(n) => !buf[..n].contains(&0),
        Err(_) => false,
    }
}

/// Read a file as text under the given limits.
///
/// Returns `None` when the file cannot be read, exceeds the size limit, or
/// looks binary (null bytes in the first 8 KB). Content longer than the
/// truncation size is cut at a character boundary.
pub fn read_file_text(path: &Path, config: &FileReadConfig) -> Option<String> {
    let metadata = fs::metadata(path).ok()?;
    if metadata.len() > config.max_file_size {
        return None;
    }

    let file = fs::File::open(path).ok()?;
    let mut bytes = Vec::with_capacity(metadata.len().min(config.truncate_size as u64 + 1) as usize);
    // Read at most one byte past the truncation point; the rest can never
    // appear in the result anyway.
    file.take(config.truncate_size as u64 + 1)
        .read_to_end(&mut bytes)
        .ok()?;

    let check_len = bytes.len().min(8192);
    if bytes[..check_len].contains(&0) {
        return None;
    }

    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };

    if content.len() > config.truncate_size {
        Some(truncate_at_char_boundary(&content, config.truncate_size))
    } else {
        Some(content)
    }
}

/// Truncate a string at a valid UTF-8 character boundary
fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
