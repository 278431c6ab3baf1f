//! Dispatching Loader - the format loader offered to the host
//!
//! Recognizes `<prefix>://` paths, resolves them through the cache and the
//! path indexer, lets the host's native loader take precedence for the
//! resolved file, and otherwise routes the file to a decoder chosen by
//! content type (or extension as a fallback).
//!
//! The loader holds no per-call state and is safe to call from many
//! threads at once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::artifact::Artifact;
use crate::cache::ResourceCache;
use crate::content_type::ContentTypeRegistry;
use crate::decoder::{DecodeContext, DecoderTable};
use crate::error::{DecodeError, LoadError, LoadResult, ResolveError};
use crate::host::{CacheMode, FormatLoader, HostResourceLoader, LoadRequest};
use crate::index::{IndexRecord, PathIndexer};

/// Loader behaviour switches
#[derive(Clone, Debug)]
pub struct LoaderOptions {
    /// Keep decoded artifacts in the resource cache
    pub cache_artifacts: bool,
    /// Rescan once when a recognized path is not indexed
    pub rescan_on_miss: bool,
    /// Minimum age of the last scan before a miss may trigger another
    pub rescan_cooldown: Duration,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            cache_artifacts: false,
            rescan_on_miss: false,
            rescan_cooldown: Duration::from_secs(1),
        }
    }
}

/// Format loader for virtual asset paths
pub struct DispatchingLoader {
    registry: Arc<ContentTypeRegistry>,
    indexer: Arc<PathIndexer>,
    cache: Arc<ResourceCache>,
    decoders: Arc<DecoderTable>,
    host: Arc<dyn HostResourceLoader>,
    options: LoaderOptions,
}

impl DispatchingLoader {
    /// Name under which the loader registers in a chain
    pub const NAME: &'static str = "virtual_asset_paths";

    /// Wire a loader from its collaborators
    pub fn new(
        indexer: Arc<PathIndexer>,
        cache: Arc<ResourceCache>,
        decoders: Arc<DecoderTable>,
        host: Arc<dyn HostResourceLoader>,
        options: LoaderOptions,
    ) -> Self {
        Self {
            registry: indexer.registry().clone(),
            indexer,
            cache,
            decoders,
            host,
            options,
        }
    }

    /// Options in effect
    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Resolve a virtual path, consulting the cache first.
    ///
    /// Returns the record and the index generation it came from.
    pub fn resolve(&self, path: &str) -> Result<(Arc<IndexRecord>, u64), ResolveError> {
        if let Some(entry) = self.cache.lookup(path) {
            return Ok((entry.record, entry.generation));
        }

        match self.resolve_uncached(path) {
            Err(ResolveError::NotIndexed(_)) if self.options.rescan_on_miss => {
                if self.indexer.index_if_stale(self.options.rescan_cooldown).is_some() {
                    log::debug!("Rescanned after miss on '{}'", path);
                }
                self.resolve_uncached(path)
            }
            result => result,
        }
    }

    fn resolve_uncached(&self, path: &str) -> Result<(Arc<IndexRecord>, u64), ResolveError> {
        let index = self.indexer.snapshot();
        let record = self.indexer.resolve_in(&index, path)?;
        self.cache.store_tagged(path, record.clone(), index.generation());
        Ok((record, index.generation()))
    }

    fn decode(&self, record: &IndexRecord) -> LoadResult<Artifact> {
        let decoder = self
            .decoders
            .select(&record.content_type, &record.real_path)
            .ok_or_else(|| LoadError::NoDecoderForType {
                content_type: record.content_type.clone(),
                real_path: record.real_path.clone(),
            })?;

        let decode_failure = |source: DecodeError| LoadError::Decode {
            virtual_path: record.virtual_path.clone(),
            source,
        };

        let data = std::fs::read(&record.real_path).map_err(|e| decode_failure(e.into()))?;
        let ctx = DecodeContext {
            virtual_path: &record.virtual_path,
            real_path: &record.real_path,
            content_type: &record.content_type,
            data: &data,
        };

        log::info!(
            "loading '{}' as: {} ({})",
            record.virtual_path,
            record.real_path.display(),
            decoder.name()
        );
        decoder.decode_erased(&ctx).map_err(decode_failure)
    }

    fn load_inner(&self, request: &LoadRequest) -> LoadResult<Artifact> {
        let (record, generation) = self.resolve(request.path)?;

        if self.host.exists(&record.real_path) {
            log::info!("loading '{}' from the host loader", record.real_path.display());
            return self.host.load(&record.real_path).ok_or_else(|| LoadError::Host {
                real_path: record.real_path.clone(),
            });
        }

        let use_cache = self.options.cache_artifacts && request.cache_mode != CacheMode::Ignore;

        if use_cache && request.cache_mode == CacheMode::Reuse {
            if let Some(artifact) = self.cache.lookup(request.path).and_then(|e| e.artifact) {
                log::debug!("'{}' served from cache", request.path);
                return Ok(artifact);
            }
        }

        let artifact = self.decode(&record)?;

        if use_cache {
            self.cache
                .store_artifact(request.path, record, artifact.clone(), generation);
        }
        Ok(artifact)
    }
}

impl FormatLoader for DispatchingLoader {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn recognize(&self, path: &str) -> bool {
        self.registry.recognize(path)
    }

    fn load(&self, request: &LoadRequest) -> LoadResult<Artifact> {
        self.load_inner(request).map_err(|e| {
            log::warn!("Failed to load '{}' ({:?}): {}", request.path, e.kind(), e);
            e
        })
    }

    fn rename_dependencies(&self, _path: &str, _renames: &HashMap<String, String>) -> LoadResult<()> {
        Ok(())
    }
}

impl std::fmt::Debug for DispatchingLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchingLoader")
            .field("prefixes", &self.registry.list_prefixes())
            .field("decoders", &self.decoders.names())
            .field("options", &self.options)
            .finish()
    }
}
