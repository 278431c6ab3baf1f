//! Asset Module - wires the pipeline together
//!
//! Owns the content-type registry, path indexer, resource cache, decoder
//! table and dispatching loader. `init` publishes the indexer and cache as
//! named singletons, builds the first index generation and puts the loader
//! at the front of the host's loader chain; `shutdown` undoes all of it.

use std::sync::Arc;

use void_asset::{
    Artifact, AssetConfig, ContentTypeRegistry, Decoder, DecoderTable, DispatchingLoader,
    HostResourceLoader, LoadRequest, LoadResult, LoaderChain, NoHostLoader, PathIndexer,
    ResourceCache, ScanReport,
};

use crate::error::{ModuleError, ModuleResult};
use crate::loaders::default_decoders;
use crate::singletons::SingletonRegistry;
use crate::watcher::ContentWatcher;

/// Singleton name of the path indexer
pub const INDEXER_SINGLETON: &str = "AssetIndexer";
/// Singleton name of the resource cache
pub const CACHE_SINGLETON: &str = "DataCache";

/// Builder for [`AssetModule`]
pub struct AssetModuleBuilder {
    config: AssetConfig,
    host: Arc<dyn HostResourceLoader>,
    chain: Option<Arc<LoaderChain>>,
    singletons: Option<Arc<SingletonRegistry>>,
    decoders: DecoderTable,
}

impl AssetModuleBuilder {
    /// Host loader consulted before any decoder
    pub fn host(mut self, host: Arc<dyn HostResourceLoader>) -> Self {
        self.host = host;
        self
    }

    /// Host loader chain to join
    pub fn chain(mut self, chain: Arc<LoaderChain>) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Singleton registry to publish into
    pub fn singletons(mut self, singletons: Arc<SingletonRegistry>) -> Self {
        self.singletons = Some(singletons);
        self
    }

    /// Register an extra decoder (replaces a built-in one of the same name)
    pub fn decoder<D: Decoder + 'static>(mut self, decoder: D) -> Self {
        self.decoders.register(decoder);
        self
    }

    /// Wire everything and build the first index
    pub fn init(self) -> ModuleResult<AssetModule> {
        let Self {
            config,
            host,
            chain,
            singletons,
            mut decoders,
        } = self;

        let registry = Arc::new(config.registry()?);
        for entry in registry.entries() {
            if let Some(decoder) = entry.decoder() {
                if !decoders.bind(entry.name(), decoder) {
                    return Err(ModuleError::UnknownDecoder {
                        content_type: entry.name().to_string(),
                        decoder: decoder.to_string(),
                    });
                }
            }
        }

        let indexer = Arc::new(PathIndexer::new(registry, config.content_roots.clone()));
        let cache = Arc::new(ResourceCache::new(indexer.watch()));
        let decoders = Arc::new(decoders);
        let loader = Arc::new(DispatchingLoader::new(
            indexer.clone(),
            cache.clone(),
            decoders.clone(),
            host,
            config.loader_options(),
        ));

        let chain = chain.unwrap_or_default();
        let singletons = singletons.unwrap_or_default();

        singletons.register(INDEXER_SINGLETON, indexer.clone())?;
        if let Err(e) = singletons.register(CACHE_SINGLETON, cache.clone()) {
            singletons.unregister(INDEXER_SINGLETON);
            return Err(e);
        }

        let report = indexer.index_files();
        if !report.is_complete() {
            log::warn!("Initial index skipped {} directories", report.skipped.len());
        }

        chain.add(loader.clone(), true);
        log::info!(
            "Asset module ready: prefixes {:?}, {} assets indexed",
            indexer.registry().list_prefixes(),
            report.records
        );

        Ok(AssetModule {
            config,
            indexer,
            cache,
            decoders,
            loader,
            chain,
            singletons,
            active: true,
        })
    }
}

/// The asset pipeline as one unit with explicit init and shutdown
pub struct AssetModule {
    config: AssetConfig,
    indexer: Arc<PathIndexer>,
    cache: Arc<ResourceCache>,
    decoders: Arc<DecoderTable>,
    loader: Arc<DispatchingLoader>,
    chain: Arc<LoaderChain>,
    singletons: Arc<SingletonRegistry>,
    active: bool,
}

impl AssetModule {
    /// Start building a module with the default decoders and no host loader
    pub fn builder(config: AssetConfig) -> AssetModuleBuilder {
        AssetModuleBuilder {
            config,
            host: Arc::new(NoHostLoader),
            chain: None,
            singletons: None,
            decoders: default_decoders(),
        }
    }

    /// Initialize with a host loader, a fresh chain and fresh singletons
    pub fn init(config: AssetConfig, host: Arc<dyn HostResourceLoader>) -> ModuleResult<Self> {
        Self::builder(config).host(host).init()
    }

    /// Configuration the module was built from
    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Content-type registry
    pub fn registry(&self) -> &Arc<ContentTypeRegistry> {
        self.indexer.registry()
    }

    /// Path indexer
    pub fn indexer(&self) -> &Arc<PathIndexer> {
        &self.indexer
    }

    /// Resource cache
    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// Decoder table
    pub fn decoders(&self) -> &Arc<DecoderTable> {
        &self.decoders
    }

    /// Dispatching loader
    pub fn loader(&self) -> &Arc<DispatchingLoader> {
        &self.loader
    }

    /// Loader chain the module joined
    pub fn chain(&self) -> &Arc<LoaderChain> {
        &self.chain
    }

    /// Singleton registry the module published into
    pub fn singletons(&self) -> &Arc<SingletonRegistry> {
        &self.singletons
    }

    /// False after shutdown
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Load a virtual path through the loader chain
    pub fn load(&self, path: &str) -> LoadResult<Artifact> {
        self.chain.load(&LoadRequest::new(path))
    }

    /// Rebuild the index and drop cache entries it made stale
    pub fn reindex(&self) -> ScanReport {
        let report = self.indexer.index_files();
        let purged = self.cache.purge_stale();
        if purged > 0 {
            log::debug!("Purged {} stale cache entries", purged);
        }
        report
    }

    /// Reindex if the watcher saw content changes since the last poll
    pub fn poll_content(&self, watcher: &mut ContentWatcher) -> Option<ScanReport> {
        let changes = watcher.poll();
        if changes.is_empty() {
            return None;
        }

        log::info!("{} content change(s), reindexing", changes.len());
        Some(self.reindex())
    }

    /// Watcher over every existing content root
    pub fn content_watcher(&self) -> ModuleResult<ContentWatcher> {
        let mut watcher = ContentWatcher::new(self.indexer.registry().clone())?;
        for root in self.indexer.roots() {
            if let Err(e) = watcher.watch(root) {
                log::warn!("{}", e);
            }
        }
        Ok(watcher)
    }

    /// Leave the chain, drop the singletons and clear the cache
    pub fn shutdown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        self.chain.remove(DispatchingLoader::NAME);
        self.singletons.unregister(CACHE_SINGLETON);
        self.singletons.unregister(INDEXER_SINGLETON);
        self.cache.invalidate_all();
        log::info!("Asset module shut down");
    }
}

impl Drop for AssetModule {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for AssetModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetModule")
            .field("indexer", &self.indexer)
            .field("loader", &self.loader)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::FileChangeKind;
    use void_asset::ContentTypeConfig;

    fn config_with_root(root: &std::path::Path) -> AssetConfig {
        AssetConfig {
            content_roots: vec![root.to_path_buf()],
            ..Default::default()
        }
    }

    #[test]
    fn test_unknown_decoder_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_with_root(dir.path());
        config.content_types.push(ContentTypeConfig {
            name: "meshes".to_string(),
            dir: None,
            extensions: vec!["obj".to_string()],
            decoder: Some("mesh".to_string()),
        });

        let err = AssetModule::init(config, Arc::new(NoHostLoader)).unwrap_err();
        assert!(matches!(err, ModuleError::UnknownDecoder { .. }));
    }

    #[test]
    fn test_singleton_conflict_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let singletons = Arc::new(SingletonRegistry::new());
        singletons.register(CACHE_SINGLETON, Arc::new(0u8)).unwrap();

        let err = AssetModule::builder(config_with_root(dir.path()))
            .singletons(singletons.clone())
            .init()
            .unwrap_err();
        assert!(matches!(err, ModuleError::SingletonExists(_)));
        assert!(!singletons.contains(INDEXER_SINGLETON));
    }

    #[test]
    fn test_shutdown_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut module = AssetModule::init(config_with_root(dir.path()), Arc::new(NoHostLoader)).unwrap();
        assert_eq!(module.indexer().generation(), 1);

        module.shutdown();
        module.shutdown();
        assert!(!module.is_active());
        assert!(module.chain().is_empty());
        assert!(module.singletons().names().is_empty());
    }

    #[test]
    fn test_deleted_asset_leaves_cache_on_poll() {
        let dir = tempfile::tempdir().unwrap();
        let hero = dir.path().join("data/hero.json");
        std::fs::create_dir_all(hero.parent().unwrap()).unwrap();
        std::fs::write(&hero, b"{}").unwrap();

        let mut config = config_with_root(dir.path());
        config.cache_artifacts = true;
        let module = AssetModule::init(config, Arc::new(NoHostLoader)).unwrap();
        let mut watcher = module.content_watcher().unwrap();

        assert!(module.load("data://hero").is_ok());
        assert_eq!(module.cache().stats().entries, 1);

        std::fs::remove_file(&hero).unwrap();
        watcher.mark_changed(&hero, FileChangeKind::Deleted);
        let report = module.poll_content(&mut watcher).unwrap();
        assert_eq!(report.records, 0);
        assert_eq!(module.cache().stats().entries, 0);
        assert!(module.poll_content(&mut watcher).is_none());
    }
}
