//! # Void Asset Server
//!
//! Runs the virtual asset path pipeline inside a host.
//!
//! ## Features
//!
//! - **Decoders**: PNG/JPG/BMP/WebP/TGA textures, TrueType/OpenType/WOFF fonts, JSON documents
//! - **Module Lifecycle**: explicit init/shutdown, named singletons for the indexer and cache
//! - **Content Watching**: rebuilds the path index when content roots change
//!
//! ## Example
//!
//! ```ignore
//! use void_asset_server::{AssetModule, TextureAsset};
//! use void_asset::{AssetConfig, NoHostLoader};
//!
//! let mut module = AssetModule::init(AssetConfig::load("assets.toml")?, Arc::new(NoHostLoader))?;
//! let mut watcher = module.content_watcher()?;
//!
//! let hero = module.load("textures://hero")?;
//! let texture = hero.downcast_ref::<TextureAsset>().unwrap();
//!
//! // In your game loop:
//! module.poll_content(&mut watcher);
//!
//! module.shutdown();
//! ```

pub mod error;
pub mod loaders;
pub mod module;
pub mod singletons;
pub mod watcher;

pub use error::{ModuleError, ModuleResult};
pub use loaders::{
    default_decoders, FontAsset, FontDecoder, FontFormat, JsonDecoder, JsonDocument, TextureAsset,
    TextureDecoder,
};
pub use module::{AssetModule, AssetModuleBuilder, CACHE_SINGLETON, INDEXER_SINGLETON};
pub use singletons::SingletonRegistry;
pub use watcher::{ContentWatcher, FileChange, FileChangeKind};
