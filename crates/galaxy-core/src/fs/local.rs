//! Local disk implementation backed by `tokio::fs` and `notify`

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{is_hidden_below, ChangeKind, FileChangeEvent, FileEntry, FileSystem, FileWatch};
use crate::error::{Error, Result};

/// File system rooted at the real disk
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn read_dir(&self, path: &Path) -> Result<Vec<FileEntry>> {
        let mut dir = tokio::fs::read_dir(path).await?;
        let mut entries = Vec::new();

        while let Some(entry) = dir.next_entry().await? {
            let entry_path = entry.path();
            // A symlinked directory is not a directory here, so walks never follow it
            let is_dir = entry.file_type().await?.is_dir();
            let metadata = match tokio::fs::metadata(&entry_path).await {
                Ok(m) => m,
                Err(_) => entry.metadata().await?,
            };
            entries.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry_path,
                is_dir,
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(tokio::fs::read_to_string(path).await?)
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn watch(&self, path: &Path) -> Result<FileWatch> {
        let root = path.to_path_buf();
        let (tx, rx) = mpsc::unbounded_channel();
        let callback_root = root.clone();

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    for change in translate_event(&callback_root, &event) {
                        // Receiver gone means the subscription was dropped
                        let _ = tx.send(change);
                    }
                }
                Err(e) => warn!(error = %e, "File watcher error"),
            },
        )
        .map_err(|e| Error::WatchError(e.to_string()))?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| Error::WatchError(format!("{}: {}", root.display(), e)))?;

        debug!(path = %root.display(), "Watching directory");
        Ok(FileWatch::new(rx, Some(Box::new(watcher))))
    }
}

/// Map a raw notify event onto zero or more change events
fn translate_event(root: &Path, event: &notify::Event) -> Vec<FileChangeEvent> {
    event
        .paths
        .iter()
        .filter(|p| !is_hidden_below(root, p))
        .filter_map(|p| classify(&event.kind, p).map(|kind| FileChangeEvent::new(kind, p.clone())))
        .collect()
}

fn classify(kind: &EventKind, path: &Path) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(CreateKind::Folder) => Some(ChangeKind::AddDir),
        EventKind::Create(CreateKind::File) => Some(ChangeKind::Add),
        EventKind::Create(_) => Some(if path.is_dir() {
            ChangeKind::AddDir
        } else {
            ChangeKind::Add
        }),
        EventKind::Remove(RemoveKind::Folder) => Some(ChangeKind::UnlinkDir),
        EventKind::Remove(_) => Some(ChangeKind::Unlink),
        // Renames surface as a removal of the old path and an addition of the new one
        EventKind::Modify(ModifyKind::Name(_)) => Some(if !path.exists() {
            ChangeKind::Unlink
        } else if path.is_dir() {
            ChangeKind::AddDir
        } else {
            ChangeKind::Add
        }),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Change),
        _ => None,
    }
}
