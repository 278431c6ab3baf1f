//! Content-Type Registry - the set of recognized virtual path schemes
//!
//! Each entry names a scheme prefix (`textures`, `fonts`, ...) together
//! with the directory scanned for it and the file extensions it accepts.
//! The registry is built once and never mutated afterwards; share it
//! behind an `Arc`.

use std::collections::HashSet;

use crate::error::RegistryError;
use crate::virtual_path::SCHEME_SEPARATOR;

/// A registered content type
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentTypeEntry {
    /// Scheme prefix, e.g. `"textures"`
    name: String,
    /// Directory under each content root holding files of this type
    dir: String,
    /// Accepted extensions, lowercase, highest priority first.
    /// Empty accepts every file.
    extensions: Vec<String>,
    /// Decoder bound to this content type, if any
    decoder: Option<String>,
}

impl ContentTypeEntry {
    /// Create an entry whose directory has the same name as the prefix
    pub fn new<I, S>(name: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        Self {
            dir: name.clone(),
            name,
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            decoder: None,
        }
    }

    /// Scan a different directory than the prefix name
    pub fn with_dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Bind a decoder by name
    pub fn with_decoder(mut self, decoder: impl Into<String>) -> Self {
        self.decoder = Some(decoder.into());
        self
    }

    /// Scheme prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory scanned under each content root
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Accepted extensions in priority order
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Decoder bound to this type
    pub fn decoder(&self) -> Option<&str> {
        self.decoder.as_deref()
    }

    /// Priority of an extension, lower wins. `None` means the file is not
    /// part of this content type.
    pub fn extension_priority(&self, ext: Option<&str>) -> Option<usize> {
        if self.extensions.is_empty() {
            return Some(0);
        }
        let ext = ext?.to_ascii_lowercase();
        self.extensions.iter().position(|e| *e == ext)
    }

    /// `"<name>://"`
    pub fn scheme(&self) -> String {
        format!("{}{}", self.name, SCHEME_SEPARATOR)
    }
}

/// Immutable, ordered set of content types
#[derive(Clone, Debug, Default)]
pub struct ContentTypeRegistry {
    entries: Vec<ContentTypeEntry>,
}

impl ContentTypeRegistry {
    /// Build a registry, rejecting empty, duplicate, or separator-bearing prefixes
    pub fn new(entries: impl IntoIterator<Item = ContentTypeEntry>) -> Result<Self, RegistryError> {
        let entries: Vec<_> = entries.into_iter().collect();
        let mut seen = HashSet::new();

        for entry in &entries {
            if entry.name.is_empty() {
                return Err(RegistryError::EmptyPrefix);
            }
            if entry.name.contains(SCHEME_SEPARATOR) {
                return Err(RegistryError::SeparatorInPrefix(entry.name.clone()));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(RegistryError::DuplicatePrefix(entry.name.clone()));
            }
        }

        Ok(Self { entries })
    }

    /// Registry that recognizes nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// All prefixes in registration order
    pub fn list_prefixes(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// All entries in registration order
    pub fn entries(&self) -> &[ContentTypeEntry] {
        &self.entries
    }

    /// Look up an entry by prefix (case-sensitive)
    pub fn get(&self, name: &str) -> Option<&ContentTypeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Entry whose scheme begins `path`, without any I/O
    pub fn match_path(&self, path: &str) -> Option<&ContentTypeEntry> {
        let (prefix, _) = path.split_once(SCHEME_SEPARATOR)?;
        self.get(prefix)
    }

    /// True iff `path` begins with a registered `<prefix>://`
    pub fn recognize(&self, path: &str) -> bool {
        self.match_path(path).is_some()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
