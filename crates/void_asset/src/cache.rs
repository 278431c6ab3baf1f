//! Resource Cache - memoized resolutions and decoded artifacts
//!
//! Entries are tagged with the index generation they were produced from.
//! A lookup only serves an entry whose tag equals the indexer's current
//! generation, so publishing a new generation invalidates everything
//! without a sweep.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::artifact::Artifact;
use crate::index::{GenerationWatch, IndexRecord};

/// A cached resolution, optionally with its decoded artifact
#[derive(Clone, Debug)]
pub struct CacheEntry {
    /// Resolved record
    pub record: Arc<IndexRecord>,
    /// Decoded artifact, if artifact caching stored one
    pub artifact: Option<Artifact>,
    /// Index generation the entry was produced from
    pub generation: u64,
}

/// Cache hit/miss counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups with no entry
    pub misses: u64,
    /// Lookups that found an entry from an older generation
    pub stale: u64,
    /// Entries currently held (stale ones linger until looked up or purged)
    pub entries: usize,
}

/// Generation-tagged cache keyed by virtual path
pub struct ResourceCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    generation: GenerationWatch,
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
}

impl ResourceCache {
    /// Create a cache that follows the given indexer generation
    pub fn new(generation: GenerationWatch) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            generation,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale: AtomicU64::new(0),
        }
    }

    /// Generation entries must carry to be served
    pub fn current_generation(&self) -> u64 {
        self.generation.current()
    }

    /// Entry for `virtual_path` if it belongs to the current generation.
    ///
    /// An entry from an older generation is evicted.
    pub fn lookup(&self, virtual_path: &str) -> Option<CacheEntry> {
        let current = self.current_generation();
        let older = {
            let entries = self.entries.read();
            match entries.get(virtual_path) {
                Some(entry) if entry.generation == current => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.clone());
                }
                Some(entry) => entry.generation < current,
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        };

        self.stale.fetch_add(1, Ordering::Relaxed);
        if older {
            // Re-check under the write lock; a store may have raced us
            let mut entries = self.entries.write();
            if entries
                .get(virtual_path)
                .is_some_and(|e| e.generation < current)
            {
                entries.remove(virtual_path);
            }
        }
        None
    }

    /// Store a resolution tagged with the current generation
    pub fn store(&self, virtual_path: &str, record: Arc<IndexRecord>) {
        self.store_tagged(virtual_path, record, self.current_generation());
    }

    /// Store a resolution produced from a specific generation.
    ///
    /// An existing artifact is kept when the record and generation are
    /// unchanged.
    pub fn store_tagged(&self, virtual_path: &str, record: Arc<IndexRecord>, generation: u64) {
        let mut entries = self.entries.write();
        let artifact = entries
            .get(virtual_path)
            .filter(|e| e.generation == generation && e.record == record)
            .and_then(|e| e.artifact.clone());

        entries.insert(
            virtual_path.to_string(),
            CacheEntry {
                record,
                artifact,
                generation,
            },
        );
    }

    /// Attach a decoded artifact to a resolution from `generation`.
    ///
    /// Replaces any entry from another generation.
    pub fn store_artifact(
        &self,
        virtual_path: &str,
        record: Arc<IndexRecord>,
        artifact: Artifact,
        generation: u64,
    ) {
        self.entries.write().insert(
            virtual_path.to_string(),
            CacheEntry {
                record,
                artifact: Some(artifact),
                generation,
            },
        );
    }

    /// Drop a single entry
    pub fn invalidate(&self, virtual_path: &str) -> bool {
        self.entries.write().remove(virtual_path).is_some()
    }

    /// Drop every entry
    pub fn invalidate_all(&self) {
        self.entries.write().clear();
    }

    /// Remove entries from older generations, returning how many went
    pub fn purge_stale(&self) -> usize {
        let current = self.current_generation();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| e.generation == current);
        before - entries.len()
    }

    /// Counters since creation
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            entries: self.entries.read().len(),
        }
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("generation", &self.current_generation())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_type::{ContentTypeEntry, ContentTypeRegistry};
    use crate::index::PathIndexer;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn record(vpath: &str) -> Arc<IndexRecord> {
        Arc::new(IndexRecord {
            virtual_path: vpath.to_string(),
            real_path: PathBuf::from("/assets/textures/hero.png"),
            content_type: "textures".to_string(),
        })
    }

    fn indexer() -> (tempfile::TempDir, PathIndexer) {
        let root = tempdir().unwrap();
        let registry = ContentTypeRegistry::new([ContentTypeEntry::new("textures", ["png"])]).unwrap();
        let indexer = PathIndexer::new(Arc::new(registry), [root.path().to_path_buf()]);
        indexer.index_files();
        (root, indexer)
    }

    #[test]
    fn test_lookup_after_store() {
        let (_root, indexer) = indexer();
        let cache = ResourceCache::new(indexer.watch());

        assert!(cache.lookup("textures://hero").is_none());
        cache.store("textures://hero", record("textures://hero"));

        let entry = cache.lookup("textures://hero").unwrap();
        assert_eq!(entry.record.virtual_path, "textures://hero");
        assert_eq!(entry.generation, indexer.generation());
        assert!(entry.artifact.is_none());
    }

    #[test]
    fn test_generation_bump_invalidates() {
        let (_root, indexer) = indexer();
        let cache = ResourceCache::new(indexer.watch());

        cache.store("textures://hero", record("textures://hero"));
        assert!(cache.lookup("textures://hero").is_some());

        indexer.index_files();
        assert!(cache.lookup("textures://hero").is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.stale, 1);
        assert_eq!(stats.entries, 0);
    }

    #[test]
    fn test_stale_entries_evicted() {
        let (_root, indexer) = indexer();
        let cache = ResourceCache::new(indexer.watch());

        for i in 0..3 {
            let vpath = format!("textures://level{}", i);
            cache.store(&vpath, record(&vpath));
        }
        indexer.index_files();
        assert_eq!(cache.stats().entries, 3);

        // Looking up one stale entry drops it, the rest go on purge
        assert!(cache.lookup("textures://level0").is_none());
        assert_eq!(cache.stats().entries, 2);
        assert_eq!(cache.purge_stale(), 2);
        assert_eq!(cache.stats().entries, 0);

        // A repeated lookup is now a plain miss
        assert!(cache.lookup("textures://level0").is_none());
        let stats = cache.stats();
        assert_eq!((stats.stale, stats.misses), (1, 1));
    }

    #[test]
    fn test_newer_tag_not_evicted() {
        let (_root, indexer) = indexer();
        let cache = ResourceCache::new(indexer.watch());

        let ahead = indexer.generation() + 1;
        cache.store_tagged("textures://hero", record("textures://hero"), ahead);
        assert!(cache.lookup("textures://hero").is_none());
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn test_older_tag_never_served() {
        let (_root, indexer) = indexer();
        let cache = ResourceCache::new(indexer.watch());

        let old = indexer.generation() - 1;
        cache.store_tagged("textures://hero", record("textures://hero"), old);
        assert!(cache.lookup("textures://hero").is_none());
    }

    #[test]
    fn test_artifact_survives_restore_of_same_record() {
        let (_root, indexer) = indexer();
        let cache = ResourceCache::new(indexer.watch());
        let generation = indexer.generation();
        let rec = record("textures://hero");

        cache.store_artifact("textures://hero", rec.clone(), Artifact::new(7u32, "test"), generation);
        cache.store_tagged("textures://hero", rec, generation);

        let entry = cache.lookup("textures://hero").unwrap();
        let artifact = entry.artifact.unwrap();
        assert_eq!(artifact.downcast_ref::<u32>(), Some(&7));
    }

    #[test]
    fn test_invalidate() {
        let (_root, indexer) = indexer();
        let cache = ResourceCache::new(indexer.watch());

        cache.store("textures://a", record("textures://a"));
        cache.store("textures://b", record("textures://b"));

        assert!(cache.invalidate("textures://a"));
        assert!(!cache.invalidate("textures://a"));
        assert!(cache.lookup("textures://b").is_some());

        cache.invalidate_all();
        assert!(cache.lookup("textures://b").is_none());
    }
}
