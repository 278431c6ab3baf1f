//! Decoders - turn raw file bytes into artifacts
//!
//! Decoders are registered in a [`DecoderTable`] under a name. A content
//! type binds to a decoder by that name; decoders also claim file
//! extensions, which serve as the fallback for content types with no
//! binding. Adding a content type is a table entry, not a new branch.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::artifact::Artifact;
use crate::error::{DecodeError, DecodeResult};

/// Input handed to a decoder
pub struct DecodeContext<'a> {
    /// Virtual path being loaded
    pub virtual_path: &'a str,
    /// Resolved file on disk
    pub real_path: &'a Path,
    /// Content type of the resolved record
    pub content_type: &'a str,
    /// Raw file contents
    pub data: &'a [u8],
}

impl<'a> DecodeContext<'a> {
    /// Lowercase file extension of the real path
    pub fn extension(&self) -> Option<String> {
        self.real_path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Contents as UTF-8 text
    pub fn read_string(&self) -> DecodeResult<&'a str> {
        std::str::from_utf8(self.data)
            .map_err(|e| DecodeError::Malformed(format!("Invalid UTF-8: {}", e)))
    }

    /// Contents, rejecting zero-length files
    pub fn non_empty(&self) -> DecodeResult<&'a [u8]> {
        if self.data.is_empty() {
            Err(DecodeError::Empty)
        } else {
            Ok(self.data)
        }
    }
}

/// A decoder for one kind of content
pub trait Decoder: Send + Sync {
    /// Value this decoder produces
    type Asset: Send + Sync + 'static;

    /// Name used to bind content types to this decoder
    fn name(&self) -> &'static str;

    /// File extensions this decoder accepts as a fallback
    fn extensions(&self) -> &[&str] {
        &[]
    }

    /// Decode raw data
    fn decode(&self, ctx: &DecodeContext) -> DecodeResult<Self::Asset>;
}

/// Type-erased decoder
pub trait ErasedDecoder: Send + Sync {
    /// Name used for binding
    fn name(&self) -> &'static str;

    /// Fallback extensions
    fn extensions(&self) -> &[&str];

    /// Decode into an artifact
    fn decode_erased(&self, ctx: &DecodeContext) -> DecodeResult<Artifact>;
}

impl<D: Decoder> ErasedDecoder for D {
    fn name(&self) -> &'static str {
        Decoder::name(self)
    }

    fn extensions(&self) -> &[&str] {
        Decoder::extensions(self)
    }

    fn decode_erased(&self, ctx: &DecodeContext) -> DecodeResult<Artifact> {
        let name = Decoder::name(self);
        self.decode(ctx).map(|asset| Artifact::new(asset, name))
    }
}

/// Registered decoders, addressable by name and by extension
#[derive(Default)]
pub struct DecoderTable {
    by_name: HashMap<&'static str, usize>,
    /// Extension -> decoder; first registration of an extension wins
    by_extension: BTreeMap<String, usize>,
    /// Content type -> decoder name
    bindings: HashMap<String, &'static str>,
    decoders: Vec<Arc<dyn ErasedDecoder>>,
}

impl DecoderTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoder. A decoder with the same name replaces the old one.
    pub fn register<D: Decoder + 'static>(&mut self, decoder: D) -> &mut Self {
        self.register_erased(Arc::new(decoder))
    }

    /// Register an already type-erased decoder
    pub fn register_erased(&mut self, decoder: Arc<dyn ErasedDecoder>) -> &mut Self {
        let name = decoder.name();
        match self.by_name.get(name) {
            Some(&idx) => {
                // Claims follow registration order, not replacement order
                self.decoders[idx] = decoder;
                self.by_extension.clear();
                for idx in 0..self.decoders.len() {
                    self.claim_extensions(idx);
                }
            }
            None => {
                self.decoders.push(decoder);
                self.by_name.insert(name, self.decoders.len() - 1);
                self.claim_extensions(self.decoders.len() - 1);
            }
        }
        self
    }

    fn claim_extensions(&mut self, idx: usize) {
        for ext in self.decoders[idx].extensions() {
            self.by_extension
                .entry(ext.to_ascii_lowercase())
                .or_insert(idx);
        }
    }

    /// Bind a content type to a registered decoder name
    pub fn bind(&mut self, content_type: impl Into<String>, decoder: &str) -> bool {
        match self.by_name.get_key_value(decoder) {
            Some((&name, _)) => {
                self.bindings.insert(content_type.into(), name);
                true
            }
            None => false,
        }
    }

    /// Decoder by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ErasedDecoder>> {
        self.by_name.get(name).map(|&idx| &self.decoders[idx])
    }

    /// Decoder bound to a content type
    pub fn for_content_type(&self, content_type: &str) -> Option<&Arc<dyn ErasedDecoder>> {
        self.bindings.get(content_type).and_then(|name| self.get(name))
    }

    /// Decoder claiming a file extension
    pub fn for_extension(&self, ext: &str) -> Option<&Arc<dyn ErasedDecoder>> {
        self.by_extension
            .get(&ext.to_ascii_lowercase())
            .map(|&idx| &self.decoders[idx])
    }

    /// Pick a decoder: content-type binding first, extension second
    pub fn select(&self, content_type: &str, real_path: &Path) -> Option<&Arc<dyn ErasedDecoder>> {
        self.for_content_type(content_type).or_else(|| {
            real_path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(|ext| self.for_extension(ext))
        })
    }

    /// Registered decoder names
    pub fn names(&self) -> Vec<&'static str> {
        self.decoders.iter().map(|d| d.name()).collect()
    }

    /// Extensions with a fallback decoder
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.by_extension.keys().map(|s| s.as_str())
    }
}

impl std::fmt::Debug for DecoderTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderTable")
            .field("decoders", &self.names())
            .field("bindings", &self.bindings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TextAsset(String);

    struct TextDecoder;

    impl Decoder for TextDecoder {
        type Asset = TextAsset;

        fn name(&self) -> &'static str {
            "text"
        }

        fn extensions(&self) -> &[&str] {
            &["txt", "text"]
        }

        fn decode(&self, ctx: &DecodeContext) -> DecodeResult<Self::Asset> {
            Ok(TextAsset(ctx.read_string()?.to_string()))
        }
    }

    struct BytesDecoder;

    impl Decoder for BytesDecoder {
        type Asset = Vec<u8>;

        fn name(&self) -> &'static str {
            "bytes"
        }

        fn extensions(&self) -> &[&str] {
            &["bin", "txt"]
        }

        fn decode(&self, ctx: &DecodeContext) -> DecodeResult<Self::Asset> {
            Ok(ctx.non_empty()?.to_vec())
        }
    }

    fn ctx<'a>(path: &'a Path, data: &'a [u8]) -> DecodeContext<'a> {
        DecodeContext {
            virtual_path: "notes://readme",
            real_path: path,
            content_type: "notes",
            data,
        }
    }

    #[test]
    fn test_select_by_binding_then_extension() {
        let mut table = DecoderTable::new();
        table.register(TextDecoder).register(BytesDecoder);
        assert!(table.bind("blobs", "bytes"));
        assert!(!table.bind("blobs", "missing"));

        let txt = Path::new("/a/readme.TXT");
        assert_eq!(table.select("blobs", txt).unwrap().name(), "bytes");
        assert_eq!(table.select("notes", txt).unwrap().name(), "text");
        assert!(table.select("notes", Path::new("/a/readme.md")).is_none());
        assert!(table.select("notes", Path::new("/a/readme")).is_none());
    }

    struct PlainTextDecoder;

    impl Decoder for PlainTextDecoder {
        type Asset = String;

        fn name(&self) -> &'static str {
            "text"
        }

        fn extensions(&self) -> &[&str] {
            &["md"]
        }

        fn decode(&self, ctx: &DecodeContext) -> DecodeResult<Self::Asset> {
            Ok(ctx.read_string()?.to_string())
        }
    }

    #[test]
    fn test_replacement_drops_old_extension_claims() {
        let mut table = DecoderTable::new();
        table.register(TextDecoder).register(BytesDecoder);
        assert_eq!(table.for_extension("txt").unwrap().name(), "text");

        table.register(PlainTextDecoder);
        assert_eq!(table.names(), vec!["text", "bytes"]);
        assert!(table.for_extension("text").is_none());
        assert_eq!(table.for_extension("md").unwrap().name(), "text");
        // The next decoder listing `txt` takes it over
        assert_eq!(table.for_extension("txt").unwrap().name(), "bytes");
        assert_eq!(table.extensions().collect::<Vec<_>>(), vec!["bin", "md", "txt"]);
    }

    #[test]
    fn test_decode_erased() {
        let mut table = DecoderTable::new();
        table.register(TextDecoder);

        let path = Path::new("/a/readme.txt");
        let decoder = table.select("notes", path).unwrap();
        let artifact = decoder.decode_erased(&ctx(path, b"Hello, World!")).unwrap();
        assert_eq!(artifact.downcast_ref::<TextAsset>().unwrap().0, "Hello, World!");

        let err = decoder.decode_erased(&ctx(path, &[0xff, 0xfe])).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_empty_rejected() {
        let path = Path::new("/a/blob.bin");
        assert!(matches!(BytesDecoder.decode(&ctx(path, b"")), Err(DecodeError::Empty)));
    }
}
