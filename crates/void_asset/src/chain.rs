//! Loader Chain - ordered format loaders
//!
//! For hosts that do not bring their own loader chain. The first loader
//! that recognizes a path handles it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::artifact::Artifact;
use crate::error::{LoadError, LoadResult};
use crate::host::{FormatLoader, LoadRequest};

/// Ordered list of format loaders
#[derive(Default)]
pub struct LoaderChain {
    loaders: RwLock<Vec<Arc<dyn FormatLoader>>>,
}

impl LoaderChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a loader, ahead of all others when `at_front` is set
    pub fn add(&self, loader: Arc<dyn FormatLoader>, at_front: bool) {
        let mut loaders = self.loaders.write();
        log::debug!("Adding format loader '{}' (front: {})", loader.name(), at_front);
        if at_front {
            loaders.insert(0, loader);
        } else {
            loaders.push(loader);
        }
    }

    /// Remove every loader with this name
    pub fn remove(&self, name: &str) -> bool {
        let mut loaders = self.loaders.write();
        let before = loaders.len();
        loaders.retain(|l| l.name() != name);
        before != loaders.len()
    }

    /// Names in lookup order
    pub fn names(&self) -> Vec<String> {
        self.loaders.read().iter().map(|l| l.name().to_string()).collect()
    }

    /// First loader recognizing `path`
    pub fn find(&self, path: &str) -> Option<Arc<dyn FormatLoader>> {
        self.loaders.read().iter().find(|l| l.recognize(path)).cloned()
    }

    /// True if some loader recognizes `path`
    pub fn recognize(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// Load through the first recognizing loader
    pub fn load(&self, request: &LoadRequest) -> LoadResult<Artifact> {
        let loader = self
            .find(request.path)
            .ok_or_else(|| LoadError::NoLoader(request.path.to_string()))?;
        loader.load(request)
    }

    /// Forward a rename to the first recognizing loader
    pub fn rename_dependencies(&self, path: &str, renames: &HashMap<String, String>) -> LoadResult<()> {
        let loader = self
            .find(path)
            .ok_or_else(|| LoadError::NoLoader(path.to_string()))?;
        loader.rename_dependencies(path, renames)
    }

    /// Number of loaders
    pub fn len(&self) -> usize {
        self.loaders.read().len()
    }

    /// True when no loader is registered
    pub fn is_empty(&self) -> bool {
        self.loaders.read().is_empty()
    }
}
