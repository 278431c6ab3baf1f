//! # void_asset - Virtual Asset Paths
//!
//! Resolves scheme-prefixed virtual paths (`textures://ui/hero`) to files
//! under one or more content roots, and loads them through the host or a
//! registered decoder:
//! - Content-type registry (prefix, directory, extension priority)
//! - Path index, rebuilt on demand and published atomically
//! - Resolution cache that never serves entries from an older index
//! - Dispatching format loader for the host's loader chain
//!
//! ## Example
//!
//! ```ignore
//! use void_asset::prelude::*;
//!
//! let config = AssetConfig::load("assets.toml")?;
//! let registry = Arc::new(config.registry()?);
//! let indexer = Arc::new(PathIndexer::new(registry, config.content_roots.clone()));
//! indexer.index_files();
//!
//! let cache = Arc::new(ResourceCache::new(indexer.watch()));
//! let loader = DispatchingLoader::new(
//!     indexer,
//!     cache,
//!     Arc::new(decoders),
//!     Arc::new(NoHostLoader),
//!     config.loader_options(),
//! );
//!
//! let hero = loader.load(&LoadRequest::new("textures://hero"))?;
//! ```

pub mod artifact;
pub mod cache;
pub mod chain;
pub mod config;
pub mod content_type;
pub mod decoder;
pub mod error;
pub mod host;
pub mod index;
pub mod loader;
pub mod virtual_path;

pub use artifact::{Artifact, ArtifactSource};
pub use cache::{CacheEntry, CacheStats, ResourceCache};
pub use chain::LoaderChain;
pub use config::{AssetConfig, ContentTypeConfig};
pub use content_type::{ContentTypeEntry, ContentTypeRegistry};
pub use decoder::{DecodeContext, Decoder, DecoderTable, ErasedDecoder};
pub use error::{
    ConfigError, DecodeError, DecodeResult, LoadError, LoadErrorKind, LoadResult, RegistryError,
    ResolveError,
};
pub use host::{
    CacheMode, FormatLoader, HostResourceLoader, LoadRequest, MemoryHostLoader, NoHostLoader,
};
pub use index::{
    Collision, GenerationWatch, Index, IndexRecord, PathIndexer, ScanFailure, ScanReport,
    UNBUILT_GENERATION,
};
pub use loader::{DispatchingLoader, LoaderOptions};
pub use virtual_path::{VirtualPath, SCHEME_SEPARATOR};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::artifact::Artifact;
    pub use crate::cache::ResourceCache;
    pub use crate::config::AssetConfig;
    pub use crate::content_type::{ContentTypeEntry, ContentTypeRegistry};
    pub use crate::decoder::{DecodeContext, Decoder, DecoderTable};
    pub use crate::error::{DecodeResult, LoadError, LoadErrorKind, LoadResult};
    pub use crate::host::{CacheMode, FormatLoader, HostResourceLoader, LoadRequest, NoHostLoader};
    pub use crate::index::PathIndexer;
    pub use crate::loader::{DispatchingLoader, LoaderOptions};
    pub use std::sync::Arc;
}
