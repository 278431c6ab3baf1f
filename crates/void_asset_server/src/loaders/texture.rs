//! Texture decoder for PNG, JPG, BMP, WebP, TGA and HDR images

use void_asset::{DecodeContext, DecodeError, DecodeResult, Decoder};

/// Texture data ready for GPU upload
#[derive(Clone, Debug)]
pub struct TextureAsset {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per row (width * 4 for RGBA)
    pub bytes_per_row: u32,
    /// Whether texture uses sRGB color space
    pub srgb: bool,
}

impl TextureAsset {
    /// Create a 1x1 solid color texture
    pub fn solid_color(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            data: vec![r, g, b, a],
            width: 1,
            height: 1,
            bytes_per_row: 4,
            srgb: true,
        }
    }

    /// RGBA value of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y * self.bytes_per_row + x * 4) as usize;
        let px = self.data.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Decoder for raster textures
pub struct TextureDecoder {
    /// Interpret as sRGB
    pub srgb: bool,
}

impl Default for TextureDecoder {
    fn default() -> Self {
        Self { srgb: true }
    }
}

impl TextureDecoder {
    /// Create a new texture decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a texture from image bytes
    pub fn decode_bytes(&self, data: &[u8]) -> DecodeResult<TextureAsset> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }

        let img = image::load_from_memory(data)
            .map_err(|e| DecodeError::Malformed(format!("Failed to decode image: {}", e)))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(TextureAsset {
            data: rgba.into_raw(),
            width,
            height,
            bytes_per_row: width * 4,
            srgb: self.srgb,
        })
    }
}

impl Decoder for TextureDecoder {
    type Asset = TextureAsset;

    fn name(&self) -> &'static str {
        "texture"
    }

    fn extensions(&self) -> &[&str] {
        &["png", "jpg", "jpeg", "bmp", "webp", "tga", "hdr"]
    }

    fn decode(&self, ctx: &DecodeContext) -> DecodeResult<Self::Asset> {
        self.decode_bytes(ctx.data)
    }
}
