//! Host contracts
//!
//! The pipeline plugs into a host that already owns a path-based resource
//! loader. [`HostResourceLoader`] is what the pipeline consumes from the
//! host; [`FormatLoader`] is what it offers back to the host's loader chain.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::artifact::Artifact;
use crate::error::LoadResult;

/// Host's native resource loader
pub trait HostResourceLoader: Send + Sync {
    /// True if the host can load `real_path` itself
    fn exists(&self, real_path: &Path) -> bool;

    /// Load through the host. `None` is a failed load.
    fn load(&self, real_path: &Path) -> Option<Artifact>;
}

/// Host with no native resources; always defers to the decoders
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHostLoader;

impl HostResourceLoader for NoHostLoader {
    fn exists(&self, _real_path: &Path) -> bool {
        false
    }

    fn load(&self, _real_path: &Path) -> Option<Artifact> {
        None
    }
}

/// In-memory host loader, for embedding hosts that pre-register baked
/// resources by path
#[derive(Default)]
pub struct MemoryHostLoader {
    resources: RwLock<HashMap<PathBuf, Option<Artifact>>>,
}

impl MemoryHostLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource for a path
    pub fn insert(&self, real_path: impl Into<PathBuf>, artifact: Artifact) {
        self.resources.write().insert(real_path.into(), Some(artifact));
    }

    /// Register a path that exists but fails to load
    pub fn insert_broken(&self, real_path: impl Into<PathBuf>) {
        self.resources.write().insert(real_path.into(), None);
    }

    /// Forget a path
    pub fn remove(&self, real_path: &Path) -> bool {
        self.resources.write().remove(real_path).is_some()
    }
}

impl HostResourceLoader for MemoryHostLoader {
    fn exists(&self, real_path: &Path) -> bool {
        self.resources.read().contains_key(real_path)
    }

    fn load(&self, real_path: &Path) -> Option<Artifact> {
        self.resources.read().get(real_path).cloned().flatten()
    }
}

/// How a load interacts with cached artifacts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CacheMode {
    /// Neither read nor write cached artifacts
    Ignore,
    /// Serve a cached artifact when present, otherwise decode and cache
    #[default]
    Reuse,
    /// Always decode, then overwrite the cached artifact
    Replace,
}

/// Arguments of a load call from the host
#[derive(Clone, Debug)]
pub struct LoadRequest<'a> {
    /// Path to load
    pub path: &'a str,
    /// Path the host was originally asked for (may differ after remapping)
    pub original_path: &'a str,
    /// The host may call from several worker threads
    pub use_sub_threads: bool,
    /// Artifact cache policy
    pub cache_mode: CacheMode,
}

impl<'a> LoadRequest<'a> {
    /// Request with `original_path == path` and default options
    pub fn new(path: &'a str) -> Self {
        Self {
            path,
            original_path: path,
            use_sub_threads: false,
            cache_mode: CacheMode::default(),
        }
    }

    /// Override the cache mode
    pub fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    /// Mark the request as coming from a worker thread
    pub fn with_sub_threads(mut self, use_sub_threads: bool) -> Self {
        self.use_sub_threads = use_sub_threads;
        self
    }
}

/// A format handler in the host's loader chain
pub trait FormatLoader: Send + Sync {
    /// Identifier used to remove the loader from a chain
    fn name(&self) -> &str;

    /// True if this loader handles `path`. Must not do I/O.
    fn recognize(&self, path: &str) -> bool;

    /// Load `request.path`
    fn load(&self, request: &LoadRequest) -> LoadResult<Artifact>;

    /// Rewrite dependency paths inside the resource at `path`
    fn rename_dependencies(&self, path: &str, renames: &HashMap<String, String>) -> LoadResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_host_loader() {
        let host = MemoryHostLoader::new();
        let path = Path::new("/baked/hero.tex");

        assert!(!host.exists(path));
        host.insert(path, Artifact::from_host(1u32));
        assert!(host.exists(path));
        assert_eq!(host.load(path).unwrap().downcast_ref::<u32>(), Some(&1));

        host.insert_broken("/baked/bad.tex");
        assert!(host.exists(Path::new("/baked/bad.tex")));
        assert!(host.load(Path::new("/baked/bad.tex")).is_none());

        assert!(host.remove(path));
        assert!(!host.exists(path));
    }

    #[test]
    fn test_load_request_defaults() {
        let req = LoadRequest::new("textures://hero");
        assert_eq!(req.original_path, "textures://hero");
        assert_eq!(req.cache_mode, CacheMode::Reuse);
        assert!(!req.use_sub_threads);
    }
}
