//! Decoders for the built-in content types

mod font;
mod json;
mod texture;

pub use font::{FontAsset, FontDecoder, FontFormat};
pub use json::{JsonDecoder, JsonDocument};
pub use texture::{TextureAsset, TextureDecoder};

use void_asset::DecoderTable;

/// Table with the texture, font and JSON decoders
pub fn default_decoders() -> DecoderTable {
    let mut table = DecoderTable::new();
    table
        .register(TextureDecoder::default())
        .register(FontDecoder)
        .register(JsonDecoder);
    table
}
