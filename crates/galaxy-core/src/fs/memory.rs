//! In-memory file system for tests and embedding

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::{is_hidden_below, ChangeKind, FileChangeEvent, FileEntry, FileSystem, FileWatch};
use crate::error::Result;

#[derive(Debug, Clone)]
enum MemEntry {
    File {
        content: String,
        modified: DateTime<Utc>,
    },
    Dir,
}

#[derive(Default)]
struct MemState {
    entries: BTreeMap<PathBuf, MemEntry>,
    watchers: Vec<(PathBuf, mpsc::UnboundedSender<FileChangeEvent>)>,
}

/// A file tree held entirely in memory
///
/// Writes do not notify watchers on their own; call [`MemoryFileSystem::emit_change`].
#[derive(Default)]
pub struct MemoryFileSystem {
    state: Mutex<MemState>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or overwrite a file, creating its parent directories
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref();
        let mut state = self.state();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            state.entries.insert(ancestor.to_path_buf(), MemEntry::Dir);
        }
        state.entries.insert(
            path.to_path_buf(),
            MemEntry::File {
                content: content.into(),
                modified: Utc::now(),
            },
        );
    }

    /// Create a directory (and its parents)
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            state.entries.insert(ancestor.to_path_buf(), MemEntry::Dir);
        }
    }

    /// Remove a file or a directory subtree
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.state().entries.retain(|p, _| !p.starts_with(path));
    }

    /// Deliver a change event to every live watcher covering `path`
    pub fn emit_change(&self, kind: ChangeKind, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.state();
        state.watchers.retain(|(root, tx)| {
            if !path.starts_with(root) || is_hidden_below(root, path) {
                return !tx.is_closed();
            }
            tx.send(FileChangeEvent::new(kind, path)).is_ok()
        });
    }
}

fn not_found(path: &Path) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{}: no such file or directory", path.display()),
    )
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn read_dir(&self, path: &Path) -> Result<Vec<FileEntry>> {
        let state = self.state();
        match state.entries.get(path) {
            Some(MemEntry::Dir) => {}
            Some(MemEntry::File { .. }) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("{}: not a directory", path.display()),
                )
                .into());
            }
            None => return Err(not_found(path).into()),
        }

        let mut entries: Vec<FileEntry> = state
            .entries
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .map(|(p, entry)| {
                let name = p
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match entry {
                    MemEntry::File { content, modified } => FileEntry {
                        name,
                        path: p.clone(),
                        is_dir: false,
                        size: content.len() as u64,
                        modified: Some(*modified),
                    },
                    MemEntry::Dir => FileEntry {
                        name,
                        path: p.clone(),
                        is_dir: true,
                        size: 0,
                        modified: None,
                    },
                }
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.state().entries.get(path) {
            Some(MemEntry::File { content, .. }) => Ok(content.clone()),
            _ => Err(not_found(path).into()),
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        self.state().entries.contains_key(path)
    }

    async fn watch(&self, path: &Path) -> Result<FileWatch> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state().watchers.push((path.to_path_buf(), tx));
        Ok(FileWatch::new(rx, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_file_creates_parents() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/root/docs/guide.md", "# Guide");

        assert!(fs.exists(Path::new("/root/docs")).await);
        let entries = fs.read_dir(Path::new("/root")).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_dir);
        assert_eq!(entries[0].name, "docs");

        let files = fs.read_dir(Path::new("/root/docs")).await.unwrap();
        assert_eq!(files[0].size, 7);
        assert_eq!(
            fs.read_to_string(Path::new("/root/docs/guide.md")).await.unwrap(),
            "# Guide"
        );
    }

    #[tokio::test]
    async fn test_read_dir_missing_is_error() {
        let fs = MemoryFileSystem::new();
        assert!(fs.read_dir(Path::new("/nope")).await.is_err());
    }

    #[tokio::test]
    async fn test_remove_subtree() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/r/a/x.md", "x");
        fs.add_file("/r/b.md", "b");
        fs.remove("/r/a");
        let names: Vec<_> = fs
            .read_dir(Path::new("/r"))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["b.md"]);
    }

    #[tokio::test]
    async fn test_emit_change_reaches_watcher() {
        let fs = MemoryFileSystem::new();
        fs.add_dir("/r");
        let mut watch = fs.watch(Path::new("/r")).await.unwrap();

        fs.emit_change(ChangeKind::Add, "/r/new.md");
        fs.emit_change(ChangeKind::Change, "/r/.hidden.md");
        fs.emit_change(ChangeKind::Change, "/elsewhere/a.md");

        let event = watch.try_recv().unwrap();
        assert_eq!(event.kind, ChangeKind::Add);
        assert_eq!(event.path, PathBuf::from("/r/new.md"));
        assert!(watch.try_recv().is_none());
    }
}
