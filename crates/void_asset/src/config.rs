//! Asset pipeline configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! content_roots = ["assets", "mods/extra"]
//! cache_artifacts = false
//! rescan_on_miss = true
//! rescan_cooldown_ms = 1000
//!
//! [[content_types]]
//! name = "textures"
//! extensions = ["png", "jpg"]   # highest priority first
//! decoder = "texture"
//!
//! [[content_types]]
//! name = "items"
//! dir = "data/items"            # defaults to the name
//! extensions = ["json"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::content_type::{ContentTypeEntry, ContentTypeRegistry};
use crate::error::ConfigError;
use crate::loader::LoaderOptions;

/// One content type as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeConfig {
    /// Scheme prefix
    pub name: String,
    /// Directory under each content root (defaults to `name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Accepted extensions, highest priority first; empty accepts all files
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Decoder bound to the type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoder: Option<String>,
}

impl ContentTypeConfig {
    fn new(name: &str, extensions: &[&str], decoder: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            dir: None,
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            decoder: decoder.map(str::to_string),
        }
    }

    /// Registry entry for this type
    pub fn to_entry(&self) -> ContentTypeEntry {
        let mut entry = ContentTypeEntry::new(self.name.clone(), &self.extensions);
        if let Some(dir) = &self.dir {
            entry = entry.with_dir(dir.clone());
        }
        if let Some(decoder) = &self.decoder {
            entry = entry.with_decoder(decoder.clone());
        }
        entry
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Content roots, earlier roots take precedence
    pub content_roots: Vec<PathBuf>,
    /// Registered content types
    pub content_types: Vec<ContentTypeConfig>,
    /// Memoize decoded artifacts
    pub cache_artifacts: bool,
    /// Rescan when a recognized path is missing from the index
    pub rescan_on_miss: bool,
    /// Minimum time between miss-triggered rescans
    pub rescan_cooldown_ms: u64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            content_roots: vec![PathBuf::from("assets")],
            content_types: vec![
                ContentTypeConfig::new(
                    "textures",
                    &["png", "jpg", "jpeg", "webp", "bmp", "tga"],
                    Some("texture"),
                ),
                ContentTypeConfig::new("fonts", &["ttf", "otf", "ttc", "woff", "woff2"], Some("font")),
                ContentTypeConfig::new("data", &["json"], None),
            ],
            cache_artifacts: false,
            rescan_on_miss: false,
            rescan_cooldown_ms: 1000,
        }
    }
}

impl AssetConfig {
    /// Read a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded asset config from {:?}", path);
        Ok(config)
    }

    /// Parse TOML text. Missing keys take their default values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.registry()?;
        Ok(config)
    }

    /// Validated content-type registry
    pub fn registry(&self) -> Result<ContentTypeRegistry, ConfigError> {
        Ok(ContentTypeRegistry::new(
            self.content_types.iter().map(ContentTypeConfig::to_entry),
        )?)
    }

    /// Loader switches derived from this config
    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            cache_artifacts: self.cache_artifacts,
            rescan_on_miss: self.rescan_on_miss,
            rescan_cooldown: Duration::from_millis(self.rescan_cooldown_ms),
        }
    }

    /// Resolve relative content roots against `base`
    pub fn rooted_at(mut self, base: &Path) -> Self {
        for root in &mut self.content_roots {
            if root.is_relative() {
                *root = base.join(&*root);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let config = AssetConfig::default();
        let registry = config.registry().unwrap();
        assert_eq!(registry.list_prefixes(), vec!["textures", "fonts", "data"]);
        assert_eq!(registry.get("textures").unwrap().decoder(), Some("texture"));
        assert_eq!(registry.get("data").unwrap().decoder(), None);
    }

    #[test]
    fn test_parse_toml() {
        let config = AssetConfig::from_toml_str(
            r#"
            content_roots = ["base", "mods/extra"]
            cache_artifacts = true

            [[content_types]]
            name = "textures"
            extensions = ["png"]
            decoder = "texture"

            [[content_types]]
            name = "items"
            dir = "data/items"
            extensions = ["json"]
            "#,
        )
        .unwrap();

        assert_eq!(config.content_roots, vec![PathBuf::from("base"), PathBuf::from("mods/extra")]);
        assert!(config.cache_artifacts);
        assert!(!config.rescan_on_miss);
        assert_eq!(config.rescan_cooldown_ms, 1000);

        let registry = config.registry().unwrap();
        assert_eq!(registry.get("items").unwrap().dir(), "data/items");
        assert_eq!(registry.get("textures").unwrap().dir(), "textures");
    }

    #[test]
    fn test_invalid_content_types_rejected() {
        let err = AssetConfig::from_toml_str(
            r#"
            [[content_types]]
            name = "textures"

            [[content_types]]
            name = "textures"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Registry(_)));

        let err = AssetConfig::from_toml_str("content_roots = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rooted_at() {
        let config = AssetConfig {
            content_roots: vec![PathBuf::from("assets"), PathBuf::from("/abs")],
            ..Default::default()
        }
        .rooted_at(Path::new("/game"));
        assert_eq!(config.content_roots, vec![PathBuf::from("/game/assets"), PathBuf::from("/abs")]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AssetConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
