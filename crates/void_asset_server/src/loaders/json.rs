//! JSON document decoder

use serde::de::DeserializeOwned;
use serde_json::Value;

use void_asset::{DecodeContext, DecodeError, DecodeResult, Decoder};

/// A parsed JSON file
#[derive(Clone, Debug, PartialEq)]
pub struct JsonDocument {
    /// Document root
    pub value: Value,
}

impl JsonDocument {
    /// Value at a JSON pointer (`/items/0/name`)
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.value.pointer(pointer)
    }

    /// Deserialize the document into a typed value
    pub fn to_typed<T: DeserializeOwned>(&self) -> DecodeResult<T> {
        T::deserialize(&self.value).map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}

/// Decoder for `.json` files
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    type Asset = JsonDocument;

    fn name(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn decode(&self, ctx: &DecodeContext) -> DecodeResult<Self::Asset> {
        let text = ctx.read_string()?;
        let value = serde_json::from_str(text)
            .map_err(|e| DecodeError::Malformed(format!("Invalid JSON in {}: {}", ctx.virtual_path, e)))?;
        Ok(JsonDocument { value })
    }
}
