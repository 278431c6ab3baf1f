//! Path Indexer - scans content roots and answers virtual path lookups
//!
//! A scan walks `<root>/<content type dir>` for every configured root and
//! every registered content type, derives a virtual path for each accepted
//! file, and collects the results into a fresh [`Index`]. The finished
//! index is published with a single pointer swap, so readers always see
//! one complete generation.
//!
//! Collisions are settled by the key `(root index, extension priority,
//! real path)`, smallest wins, which does not depend on directory
//! iteration order.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use walkdir::WalkDir;

use crate::content_type::{ContentTypeEntry, ContentTypeRegistry};
use crate::error::ResolveError;
use crate::virtual_path::{self, VirtualPath};

/// Generation of an index that was never built
pub const UNBUILT_GENERATION: u64 = 0;

/// Resolved mapping for one virtual path
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexRecord {
    /// `<content type>://<identifier>`
    pub virtual_path: String,
    /// File on disk at scan time
    pub real_path: PathBuf,
    /// Registered content type the file was found under
    pub content_type: String,
}

/// One immutable index generation
#[derive(Debug)]
pub struct Index {
    generation: u64,
    records: HashMap<String, Arc<IndexRecord>>,
}

impl Index {
    fn unbuilt() -> Self {
        Self {
            generation: UNBUILT_GENERATION,
            records: HashMap::new(),
        }
    }

    /// Generation number of this snapshot
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record for a virtual path
    pub fn get(&self, virtual_path: &str) -> Option<&Arc<IndexRecord>> {
        self.records.get(virtual_path)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing was indexed
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records sorted by virtual path
    pub fn records(&self) -> Vec<&IndexRecord> {
        let mut records: Vec<_> = self.records.values().map(|r| r.as_ref()).collect();
        records.sort_by(|a, b| a.virtual_path.cmp(&b.virtual_path));
        records
    }

    /// Records of one content type, sorted by virtual path
    pub fn records_of(&self, content_type: &str) -> Vec<&IndexRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.content_type == content_type)
            .collect()
    }

    /// True if both generations hold exactly the same records
    pub fn same_contents(&self, other: &Index) -> bool {
        self.records.len() == other.records.len()
            && self
                .records
                .iter()
                .all(|(k, v)| other.records.get(k).is_some_and(|o| o == v))
    }
}

/// A directory that could not be read during a scan
#[derive(Clone, Debug)]
pub struct ScanFailure {
    /// Directory or entry that was skipped
    pub path: PathBuf,
    /// Error text
    pub message: String,
}

/// Two files that mapped to the same virtual path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collision {
    /// Contested virtual path
    pub virtual_path: String,
    /// File that won the tie-break
    pub kept: PathBuf,
    /// File that lost
    pub discarded: PathBuf,
}

/// Outcome of one `index_files` pass
#[derive(Clone, Debug, Default)]
pub struct ScanReport {
    /// Generation published by this scan
    pub generation: u64,
    /// Number of records in the new generation
    pub records: usize,
    /// Collisions settled by tie-break
    pub collisions: Vec<Collision>,
    /// Subtrees skipped because they could not be read
    pub skipped: Vec<ScanFailure>,
    /// Wall time of the scan
    pub elapsed: Duration,
}

impl ScanReport {
    /// True when nothing was skipped
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Read-only view of the indexer's generation counter
#[derive(Clone, Debug)]
pub struct GenerationWatch(Arc<AtomicU64>);

impl GenerationWatch {
    /// Latest published generation
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

type TieBreakKey = (usize, usize, String);

struct Candidate {
    key: TieBreakKey,
    record: IndexRecord,
}

/// Builds and serves the virtual path index
pub struct PathIndexer {
    registry: Arc<ContentTypeRegistry>,
    roots: Vec<PathBuf>,
    current: ArcSwap<Index>,
    generation: Arc<AtomicU64>,
    /// Serializes scans; holds the completion time of the last one
    scan_lock: Mutex<Option<Instant>>,
}

impl PathIndexer {
    /// Create an unbuilt indexer over the given content roots
    pub fn new(registry: Arc<ContentTypeRegistry>, roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            registry,
            roots: roots.into_iter().collect(),
            current: ArcSwap::from_pointee(Index::unbuilt()),
            generation: Arc::new(AtomicU64::new(UNBUILT_GENERATION)),
            scan_lock: Mutex::new(None),
        }
    }

    /// Content-type registry driving the scan
    pub fn registry(&self) -> &Arc<ContentTypeRegistry> {
        &self.registry
    }

    /// Content roots in precedence order
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Latest published generation (0 until the first scan)
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Shareable view of the generation counter
    pub fn watch(&self) -> GenerationWatch {
        GenerationWatch(self.generation.clone())
    }

    /// Current index snapshot
    pub fn snapshot(&self) -> Arc<Index> {
        self.current.load_full()
    }

    /// Rebuild the index and publish it as the next generation.
    ///
    /// Concurrent callers are serialized; each one runs its own scan.
    /// Unreadable directories are skipped and listed in the report.
    pub fn index_files(&self) -> ScanReport {
        let mut last_scan = self.scan_lock.lock();
        let report = self.scan();
        *last_scan = Some(Instant::now());
        report
    }

    /// Like [`index_files`](Self::index_files) but returns `None` instead of
    /// waiting when another scan is running.
    pub fn try_index_files(&self) -> Option<ScanReport> {
        let mut last_scan = self.scan_lock.try_lock()?;
        let report = self.scan();
        *last_scan = Some(Instant::now());
        Some(report)
    }

    /// Rescan only if the last scan finished more than `cooldown` ago.
    /// A scan that was running when this was called counts as fresh.
    pub fn index_if_stale(&self, cooldown: Duration) -> Option<ScanReport> {
        let mut last_scan = self.scan_lock.lock();
        if last_scan.is_some_and(|at| at.elapsed() < cooldown) {
            return None;
        }
        let report = self.scan();
        *last_scan = Some(Instant::now());
        Some(report)
    }

    /// Resolve a virtual path against the current generation
    pub fn get_resource_path(&self, path: &str) -> Result<Arc<IndexRecord>, ResolveError> {
        self.resolve_in(&self.snapshot(), path)
    }

    /// Resolve a virtual path against a specific snapshot
    pub fn resolve_in(&self, index: &Index, path: &str) -> Result<Arc<IndexRecord>, ResolveError> {
        if self.registry.match_path(path).is_none() {
            return Err(ResolveError::UnrecognizedPrefix(path.to_string()));
        }

        VirtualPath::parse(path).map_err(|reason| ResolveError::Malformed {
            path: path.to_string(),
            reason,
        })?;

        index
            .get(path)
            .cloned()
            .ok_or_else(|| ResolveError::NotIndexed(path.to_string()))
    }

    /// Must be called with `scan_lock` held
    fn scan(&self) -> ScanReport {
        let started = Instant::now();
        let generation = self.generation() + 1;
        log::info!(
            "Indexing {} content types across {} roots (generation {})",
            self.registry.len(),
            self.roots.len(),
            generation
        );

        let mut candidates: HashMap<String, Candidate> = HashMap::new();
        let mut report = ScanReport {
            generation,
            ..Default::default()
        };

        for (root_index, root) in self.roots.iter().enumerate() {
            for content_type in self.registry.entries() {
                self.scan_dir(root_index, root, content_type, &mut candidates, &mut report);
            }
        }

        let records: HashMap<_, _> = candidates
            .into_iter()
            .map(|(vpath, c)| (vpath, Arc::new(c.record)))
            .collect();
        report.records = records.len();

        self.current.store(Arc::new(Index { generation, records }));
        self.generation.store(generation, Ordering::Release);

        report.elapsed = started.elapsed();
        log::info!(
            "Indexed {} assets in {:?} (generation {}, {} collisions, {} skipped)",
            report.records,
            report.elapsed,
            generation,
            report.collisions.len(),
            report.skipped.len()
        );
        report
    }

    fn scan_dir(
        &self,
        root_index: usize,
        root: &Path,
        content_type: &ContentTypeEntry,
        candidates: &mut HashMap<String, Candidate>,
        report: &mut ScanReport,
    ) {
        let dir = root.join(content_type.dir());
        if !dir.is_dir() {
            log::debug!("No '{}' directory under {:?}", content_type.name(), root);
            return;
        }

        for item in WalkDir::new(&dir).follow_links(true) {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
                    log::warn!("Skipping unreadable path {:?}: {}", path, e);
                    report.skipped.push(ScanFailure {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if !item.file_type().is_file() {
                continue;
            }

            let path = item.path();
            let ext = path.extension().and_then(|e| e.to_str());
            let Some(priority) = content_type.extension_priority(ext) else {
                continue;
            };

            let Ok(relative) = path.strip_prefix(&dir) else {
                continue;
            };
            let Some(vpath) = virtual_path::derive(content_type.name(), relative) else {
                log::warn!("Skipping {:?}: name is not valid UTF-8", path);
                continue;
            };

            let candidate = Candidate {
                key: (root_index, priority, path.to_string_lossy().into_owned()),
                record: IndexRecord {
                    virtual_path: vpath.clone(),
                    real_path: path.to_path_buf(),
                    content_type: content_type.name().to_string(),
                },
            };

            match candidates.entry(vpath) {
                Entry::Vacant(slot) => {
                    slot.insert(candidate);
                }
                Entry::Occupied(mut slot) => {
                    let (kept, discarded) = if candidate.key < slot.get().key {
                        let old = slot.insert(candidate);
                        (slot.get().record.real_path.clone(), old.record.real_path)
                    } else {
                        (slot.get().record.real_path.clone(), candidate.record.real_path)
                    };
                    log::debug!("{} -> keeping {:?} over {:?}", slot.key(), kept, discarded);
                    report.collisions.push(Collision {
                        virtual_path: slot.key().clone(),
                        kept,
                        discarded,
                    });
                }
            }
        }
    }
}

impl std::fmt::Debug for PathIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathIndexer")
            .field("roots", &self.roots)
            .field("prefixes", &self.registry.list_prefixes())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn registry() -> Arc<ContentTypeRegistry> {
        Arc::new(
            ContentTypeRegistry::new([
                ContentTypeEntry::new("textures", ["png", "jpg"]),
                ContentTypeEntry::new("fonts", ["ttf", "otf"]),
                ContentTypeEntry::new("data", ["json"]),
            ])
            .unwrap(),
        )
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_unbuilt_indexer() {
        let indexer = PathIndexer::new(registry(), Vec::new());
        assert_eq!(indexer.generation(), UNBUILT_GENERATION);
        assert!(indexer.snapshot().is_empty());
        assert_eq!(
            indexer.get_resource_path("textures://hero"),
            Err(ResolveError::NotIndexed("textures://hero".into()))
        );
    }

    #[test]
    fn test_index_and_resolve() {
        let root = tempdir().unwrap();
        touch(&root.path().join("textures/hero.png"));
        touch(&root.path().join("textures/ui/button.jpg"));
        touch(&root.path().join("fonts/title.ttf"));
        touch(&root.path().join("textures/notes.txt"));

        let indexer = PathIndexer::new(registry(), [root.path().to_path_buf()]);
        let report = indexer.index_files();

        assert_eq!(report.generation, 1);
        assert_eq!(report.records, 3);
        assert!(report.is_complete());

        let hero = indexer.get_resource_path("textures://hero").unwrap();
        assert_eq!(hero.real_path, root.path().join("textures/hero.png"));
        assert_eq!(hero.content_type, "textures");

        let button = indexer.get_resource_path("textures://ui/button").unwrap();
        assert_eq!(button.real_path, root.path().join("textures/ui/button.jpg"));

        let font = indexer.get_resource_path("fonts://title").unwrap();
        assert_eq!(font.content_type, "fonts");

        assert!(matches!(
            indexer.get_resource_path("textures://notes"),
            Err(ResolveError::NotIndexed(_))
        ));
    }

    #[test]
    fn test_unrecognized_vs_not_indexed() {
        let root = tempdir().unwrap();
        let indexer = PathIndexer::new(registry(), [root.path().to_path_buf()]);
        indexer.index_files();

        assert!(matches!(
            indexer.get_resource_path("sounds://boom"),
            Err(ResolveError::UnrecognizedPrefix(_))
        ));
        assert!(matches!(
            indexer.get_resource_path("textures://missing"),
            Err(ResolveError::NotIndexed(_))
        ));
        assert!(matches!(
            indexer.get_resource_path("textures://"),
            Err(ResolveError::Malformed { .. })
        ));
    }

    #[test]
    fn test_collision_uses_extension_priority() {
        let root = tempdir().unwrap();
        touch(&root.path().join("textures/skin.jpg"));
        touch(&root.path().join("textures/skin.png"));

        let indexer = PathIndexer::new(registry(), [root.path().to_path_buf()]);
        for _ in 0..3 {
            let report = indexer.index_files();
            assert_eq!(report.collisions.len(), 1);
            assert_eq!(report.collisions[0].kept, root.path().join("textures/skin.png"));

            let skin = indexer.get_resource_path("textures://skin").unwrap();
            assert_eq!(skin.real_path, root.path().join("textures/skin.png"));
        }
    }

    #[test]
    fn test_earlier_root_wins() {
        let base = tempdir().unwrap();
        let overlay = tempdir().unwrap();
        touch(&base.path().join("textures/hero.jpg"));
        touch(&overlay.path().join("textures/hero.png"));
        touch(&overlay.path().join("textures/villain.png"));

        let indexer = PathIndexer::new(
            registry(),
            [base.path().to_path_buf(), overlay.path().to_path_buf()],
        );
        indexer.index_files();

        let hero = indexer.get_resource_path("textures://hero").unwrap();
        assert_eq!(hero.real_path, base.path().join("textures/hero.jpg"));
        assert!(indexer.get_resource_path("textures://villain").is_ok());
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let root = tempdir().unwrap();
        touch(&root.path().join("textures/a.png"));
        touch(&root.path().join("data/items/sword.json"));

        let indexer = PathIndexer::new(registry(), [root.path().to_path_buf()]);
        indexer.index_files();
        let first = indexer.snapshot();
        indexer.index_files();
        let second = indexer.snapshot();

        assert_eq!(first.generation(), 1);
        assert_eq!(second.generation(), 2);
        assert!(first.same_contents(&second));
    }

    #[test]
    fn test_reindex_changes_only_affected_entries() {
        let root = tempdir().unwrap();
        touch(&root.path().join("textures/keep.png"));
        touch(&root.path().join("textures/gone.png"));

        let indexer = PathIndexer::new(registry(), [root.path().to_path_buf()]);
        indexer.index_files();
        let keep_before = indexer.get_resource_path("textures://keep").unwrap();

        fs::remove_file(root.path().join("textures/gone.png")).unwrap();
        touch(&root.path().join("textures/new.png"));
        indexer.index_files();

        assert_eq!(*indexer.get_resource_path("textures://keep").unwrap(), *keep_before);
        assert!(indexer.get_resource_path("textures://gone").is_err());
        assert!(indexer.get_resource_path("textures://new").is_ok());
    }

    #[test]
    fn test_records_of() {
        let root = tempdir().unwrap();
        touch(&root.path().join("textures/b.png"));
        touch(&root.path().join("textures/a.png"));
        touch(&root.path().join("fonts/f.otf"));

        let indexer = PathIndexer::new(registry(), [root.path().to_path_buf()]);
        indexer.index_files();
        let index = indexer.snapshot();

        let textures: Vec<_> = index
            .records_of("textures")
            .iter()
            .map(|r| r.virtual_path.as_str())
            .collect();
        assert_eq!(textures, vec!["textures://a", "textures://b"]);
        assert_eq!(index.records_of("fonts").len(), 1);
    }

    #[test]
    fn test_index_if_stale_respects_cooldown() {
        let root = tempdir().unwrap();
        let indexer = PathIndexer::new(registry(), [root.path().to_path_buf()]);

        assert!(indexer.index_if_stale(Duration::from_secs(3600)).is_some());
        assert!(indexer.index_if_stale(Duration::from_secs(3600)).is_none());
        assert!(indexer.index_if_stale(Duration::ZERO).is_some());
        assert_eq!(indexer.generation(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempdir().unwrap();
        touch(&root.path().join("textures/ok.png"));
        let locked = root.path().join("textures/locked");
        touch(&locked.join("hidden.png"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let indexer = PathIndexer::new(registry(), [root.path().to_path_buf()]);
        let report = indexer.index_files();
        let readable = fs::read_dir(&locked).is_ok();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(indexer.get_resource_path("textures://ok").is_ok());
        if !readable {
            assert_eq!(report.skipped.len(), 1);
            assert!(indexer.get_resource_path("textures://locked/hidden").is_err());
        }
    }

    #[test]
    fn test_readers_never_see_partial_generation() {
        let root = tempdir().unwrap();
        for i in 0..50 {
            touch(&root.path().join(format!("textures/t{i}.png")));
        }

        let indexer = Arc::new(PathIndexer::new(registry(), [root.path().to_path_buf()]));
        indexer.index_files();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let indexer = indexer.clone();
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let snapshot = indexer.snapshot();
                        assert_eq!(snapshot.len(), 50);
                    }
                })
            })
            .collect();

        for _ in 0..5 {
            indexer.index_files();
        }
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(indexer.generation(), 6);
    }
}
