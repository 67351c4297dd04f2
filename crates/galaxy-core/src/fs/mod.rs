//! File-system and HTTP capabilities
//!
//! Ingestion never touches the disk or network directly. It goes through
//! the [`FileSystem`] and [`HttpFetcher`] traits so that tests and embedders
//! can inject in-memory fakes.

mod http;
mod local;
mod memory;

use std::any::Any;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::Result;

pub use http::{HttpFetcher, ReqwestFetcher};
pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl FileEntry {
    /// Hidden entries start with a dot
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// Kinds of change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Add,
    Change,
    Unlink,
    AddDir,
    UnlinkDir,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Change => "change",
            Self::Unlink => "unlink",
            Self::AddDir => "add_dir",
            Self::UnlinkDir => "unlink_dir",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single change under a watched directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl FileChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Subscription to change notifications under one directory
///
/// Dropping it releases the underlying watcher.
pub struct FileWatch {
    rx: mpsc::UnboundedReceiver<FileChangeEvent>,
    _guard: Option<Box<dyn Any + Send>>,
}

impl FileWatch {
    pub(crate) fn new(
        rx: mpsc::UnboundedReceiver<FileChangeEvent>,
        guard: Option<Box<dyn Any + Send>>,
    ) -> Self {
        Self { rx, _guard: guard }
    }

    /// Wait for the next change; `None` once the source is gone
    pub async fn recv(&mut self) -> Option<FileChangeEvent> {
        self.rx.recv().await
    }

    /// Non-blocking poll
    pub fn try_recv(&mut self) -> Option<FileChangeEvent> {
        self.rx.try_recv().ok()
    }
}

impl std::fmt::Debug for FileWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatch").finish_non_exhaustive()
    }
}

/// File-system capability consumed by ingestion and the store
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// List one directory level, entries sorted by name
    async fn read_dir(&self, path: &Path) -> Result<Vec<FileEntry>>;

    /// Read a whole file as UTF-8
    async fn read_to_string(&self, path: &Path) -> Result<String>;

    async fn exists(&self, path: &Path) -> bool;

    /// Subscribe to recursive changes under `path`, hidden paths filtered
    async fn watch(&self, path: &Path) -> Result<FileWatch>;
}

/// Whether any component of `path` below `root` starts with a dot
pub(crate) fn is_hidden_below(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_detection_is_relative_to_root() {
        let root = Path::new("/home/me/.claude");
        assert!(!is_hidden_below(root, Path::new("/home/me/.claude/skills/a.md")));
        assert!(is_hidden_below(root, Path::new("/home/me/.claude/.git/HEAD")));
        assert!(is_hidden_below(root, Path::new("/home/me/.claude/docs/.draft.md")));
    }

    #[test]
    fn test_file_entry_hidden() {
        let entry = FileEntry {
            name: ".obsidian".to_string(),
            path: PathBuf::from("/notes/.obsidian"),
            is_dir: true,
            size: 0,
            modified: None,
        };
        assert!(entry.is_hidden());
    }
}
