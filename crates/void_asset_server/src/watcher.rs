//! Content root watcher
//!
//! Watches the content roots and rebuilds the path index when files of a
//! registered content type change, or when a directory under a root is
//! created, removed or renamed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "file-watcher")]
use notify::{event::ModifyKind, Event, EventKind, RecursiveMode, Watcher};

use void_asset::{ContentTypeRegistry, PathIndexer, ScanReport};

use crate::error::{ModuleError, ModuleResult};

/// A file change event
#[derive(Debug, Clone)]
pub struct FileChange {
    /// Path to the changed file
    pub path: PathBuf,
    /// Type of change
    pub kind: FileChangeKind,
}

/// Type of file change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileChangeKind {
    /// File or directory was created
    Created,
    /// File was modified
    Modified,
    /// File or directory was deleted
    Deleted,
    /// File or directory was renamed (reported for both names)
    Renamed,
}

/// Watches content roots for changes
pub struct ContentWatcher {
    #[cfg(feature = "file-watcher")]
    watcher: notify::RecommendedWatcher,
    #[cfg(feature = "file-watcher")]
    rx: crossbeam_channel::Receiver<notify::Result<Event>>,

    registry: Arc<ContentTypeRegistry>,
    /// Changes reported by the host
    pending: Vec<FileChange>,
    /// Debounce tracking per path and kind
    debounce: HashMap<(PathBuf, FileChangeKind), Instant>,
    debounce_duration: Duration,
    watch_dirs: Vec<PathBuf>,
}

impl ContentWatcher {
    /// Create a watcher that reports files of the registry's content types
    #[cfg(feature = "file-watcher")]
    pub fn new(registry: Arc<ContentTypeRegistry>) -> ModuleResult<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();

        let watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .map_err(|e| ModuleError::Watch {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;

        Ok(Self {
            watcher,
            rx,
            registry,
            pending: Vec::new(),
            debounce: HashMap::new(),
            debounce_duration: Duration::from_millis(100),
            watch_dirs: Vec::new(),
        })
    }

    /// Create a watcher (changes only arrive through `mark_changed`)
    #[cfg(not(feature = "file-watcher"))]
    pub fn new(registry: Arc<ContentTypeRegistry>) -> ModuleResult<Self> {
        Ok(Self {
            registry,
            pending: Vec::new(),
            debounce: HashMap::new(),
            debounce_duration: Duration::from_millis(100),
            watch_dirs: Vec::new(),
        })
    }

    /// Watch a content root recursively
    pub fn watch(&mut self, dir: impl AsRef<Path>) -> ModuleResult<()> {
        let path = dir.as_ref().to_path_buf();
        if !path.is_dir() {
            return Err(ModuleError::Watch {
                path,
                message: "not a directory".to_string(),
            });
        }

        #[cfg(feature = "file-watcher")]
        self.watcher
            .watch(&path, RecursiveMode::Recursive)
            .map_err(|e| ModuleError::Watch {
                path: path.clone(),
                message: e.to_string(),
            })?;

        log::info!("Watching content root: {:?}", path);
        self.watch_dirs.push(path);
        Ok(())
    }

    /// Report a change the host learned about by other means
    pub fn mark_changed(&mut self, path: impl Into<PathBuf>, kind: FileChangeKind) {
        self.pending.push(FileChange {
            path: path.into(),
            kind,
        });
    }

    /// Drain changes to content files since the last poll
    pub fn poll(&mut self) -> Vec<FileChange> {
        let now = Instant::now();
        #[cfg_attr(not(feature = "file-watcher"), allow(unused_mut))]
        let mut raw = std::mem::take(&mut self.pending);

        #[cfg(feature = "file-watcher")]
        while let Ok(result) = self.rx.try_recv() {
            let event = match result {
                Ok(event) => event,
                Err(e) => {
                    log::warn!("File watcher error: {}", e);
                    continue;
                }
            };
            let kind = match event.kind {
                EventKind::Create(_) => FileChangeKind::Created,
                EventKind::Modify(ModifyKind::Name(_)) => FileChangeKind::Renamed,
                EventKind::Modify(_) => FileChangeKind::Modified,
                EventKind::Remove(_) => FileChangeKind::Deleted,
                _ => continue,
            };
            raw.extend(event.paths.into_iter().map(|path| FileChange { path, kind }));
        }

        let mut changes = Vec::new();
        for change in raw {
            if !self.is_relevant(&change) {
                continue;
            }

            let key = (change.path.clone(), change.kind);
            if let Some(last) = self.debounce.get(&key) {
                if now.duration_since(*last) < self.debounce_duration {
                    continue;
                }
            }

            self.debounce.insert(key, now);
            changes.push(change);
        }

        self.debounce
            .retain(|_, time| now.duration_since(*time) < Duration::from_secs(5));

        changes
    }

    /// Rebuild the index once if any content file changed
    pub fn poll_and_reindex(&mut self, indexer: &PathIndexer) -> Option<ScanReport> {
        let changes = self.poll();
        if changes.is_empty() {
            return None;
        }

        log::info!("{} content file(s) changed, reindexing", changes.len());
        Some(indexer.index_files())
    }

    /// True if the change can alter the index.
    ///
    /// Content files always count. A directory (or a path that no longer
    /// exists and has no extension) under a watched root counts when it is
    /// created, deleted or renamed, since every file below it moves with it.
    fn is_relevant(&self, change: &FileChange) -> bool {
        let path = &change.path;
        if !path.is_dir() && self.is_content_file(path) {
            return true;
        }
        if change.kind == FileChangeKind::Modified {
            return false;
        }

        let dir_like = path.is_dir() || (!path.exists() && path.extension().is_none());
        dir_like && self.watch_dirs.iter().any(|root| path.starts_with(root) && path != root)
    }

    /// True if some content type accepts the file's extension
    pub fn is_content_file(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str());
        self.registry
            .entries()
            .iter()
            .any(|entry| entry.extension_priority(ext).is_some())
    }

    /// Watched content roots
    pub fn watch_dirs(&self) -> &[PathBuf] {
        &self.watch_dirs
    }

    /// Set debounce duration
    pub fn set_debounce(&mut self, duration: Duration) {
        self.debounce_duration = duration;
    }
}
