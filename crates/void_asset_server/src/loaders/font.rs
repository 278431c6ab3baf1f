//! Font container decoder
//!
//! Validates TrueType, OpenType, collection and WOFF fonts. Every table
//! record must lie inside the file; sfnt faces are additionally parsed
//! with `ttf-parser` so a face missing its required tables is rejected.
//! The bytes are kept as-is for the text renderer.

use void_asset::{DecodeContext, DecodeError, DecodeResult, Decoder};

/// Size of the sfnt offset table
const SFNT_HEADER: usize = 12;
/// Size of one sfnt table record
const SFNT_TABLE_RECORD: usize = 16;
/// Size of the WOFF 1.0 header
const WOFF_HEADER: usize = 44;
/// Size of one WOFF 1.0 table directory entry
const WOFF_TABLE_RECORD: usize = 20;
/// Size of the WOFF 2.0 header
const WOFF2_HEADER: usize = 48;

/// Font container format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontFormat {
    /// TrueType outlines (`00 01 00 00` or `true`)
    TrueType,
    /// CFF outlines (`OTTO`)
    OpenType,
    /// TrueType/OpenType collection (`ttcf`)
    Collection,
    /// WOFF 1.0
    Woff,
    /// WOFF 2.0
    Woff2,
}

/// A validated font file
#[derive(Clone, Debug)]
pub struct FontAsset {
    /// Raw file contents
    pub data: Vec<u8>,
    /// Container format
    pub format: FontFormat,
    /// Number of faces (1 unless a collection)
    pub face_count: u32,
    /// Number of tables in the first face
    pub table_count: u16,
    /// Units per em of the first face (sfnt containers only)
    pub units_per_em: Option<u16>,
    /// Glyph count of the first face (sfnt containers only)
    pub glyph_count: Option<u16>,
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_tag(data: &[u8], offset: usize) -> Option<[u8; 4]> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn malformed(msg: impl Into<String>) -> DecodeError {
    DecodeError::Malformed(msg.into())
}

/// Check that `offset + length` lies inside the file
fn check_span(data: &[u8], tag: [u8; 4], offset: u32, length: u32) -> DecodeResult<()> {
    match (offset as usize).checked_add(length as usize) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(malformed(format!(
            "Table '{}' at {}+{} lies outside the {} byte file",
            String::from_utf8_lossy(&tag),
            offset,
            length,
            data.len()
        ))),
    }
}

/// Validate the sfnt face whose offset table starts at `offset`.
///
/// Returns the table count.
fn sfnt_tables(data: &[u8], offset: usize) -> DecodeResult<u16> {
    let tag = read_tag(data, offset).ok_or_else(|| malformed("Truncated font header"))?;
    if !matches!(&tag, b"\x00\x01\x00\x00" | b"true" | b"OTTO") {
        return Err(malformed(format!("Unknown sfnt version {:02x?}", tag)));
    }

    let num_tables = read_u16(data, offset + 4).ok_or_else(|| malformed("Truncated font header"))?;
    let dir_end = offset + SFNT_HEADER + num_tables as usize * SFNT_TABLE_RECORD;
    if num_tables == 0 || dir_end > data.len() {
        return Err(malformed(format!(
            "Table directory of {} tables does not fit in {} bytes",
            num_tables,
            data.len()
        )));
    }

    for i in 0..num_tables as usize {
        let record = offset + SFNT_HEADER + i * SFNT_TABLE_RECORD;
        let truncated = || malformed("Truncated table record");
        let table = read_tag(data, record).ok_or_else(truncated)?;
        let table_offset = read_u32(data, record + 8).ok_or_else(truncated)?;
        let length = read_u32(data, record + 12).ok_or_else(truncated)?;
        check_span(data, table, table_offset, length)?;
    }
    Ok(num_tables)
}

/// Parse one face of an sfnt file or collection
fn parse_face(data: &[u8], index: u32) -> DecodeResult<ttf_parser::Face<'_>> {
    ttf_parser::Face::parse(data, index)
        .map_err(|e| malformed(format!("Unusable font face {}: {}", index, e)))
}

/// Decoder for font containers
#[derive(Clone, Copy, Debug, Default)]
pub struct FontDecoder;

impl FontDecoder {
    /// Validate font bytes
    pub fn decode_bytes(&self, data: &[u8]) -> DecodeResult<FontAsset> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }
        let tag = read_tag(data, 0).ok_or_else(|| malformed("Truncated font header"))?;

        let (format, face_count, table_count) = match &tag {
            b"\x00\x01\x00\x00" | b"true" => (FontFormat::TrueType, 1, sfnt_tables(data, 0)?),
            b"OTTO" => (FontFormat::OpenType, 1, sfnt_tables(data, 0)?),
            b"ttcf" => {
                let num_fonts = read_u32(data, 8).ok_or_else(|| malformed("Truncated collection header"))?;
                if num_fonts == 0 || 12 + num_fonts as usize * 4 > data.len() {
                    return Err(malformed(format!("Collection of {} fonts is truncated", num_fonts)));
                }
                let mut first = 0;
                for i in 0..num_fonts as usize {
                    let offset = read_u32(data, 12 + i * 4)
                        .ok_or_else(|| malformed("Truncated collection header"))?;
                    let tables = sfnt_tables(data, offset as usize)?;
                    if i == 0 {
                        first = tables;
                    }
                }
                (FontFormat::Collection, num_fonts, first)
            }
            b"wOFF" | b"wOF2" => {
                let (format, num_tables) = woff_tables(data, &tag)?;
                return Ok(FontAsset {
                    data: data.to_vec(),
                    format,
                    face_count: 1,
                    table_count: num_tables,
                    units_per_em: None,
                    glyph_count: None,
                });
            }
            _ => return Err(malformed(format!("Unknown font signature {:02x?}", tag))),
        };

        let mut first_face = None;
        for index in 0..face_count {
            let face = parse_face(data, index)?;
            if index == 0 {
                first_face = Some((face.units_per_em(), face.number_of_glyphs()));
            }
        }

        Ok(FontAsset {
            data: data.to_vec(),
            format,
            face_count,
            table_count,
            units_per_em: first_face.map(|(upem, _)| upem),
            glyph_count: first_face.map(|(_, glyphs)| glyphs),
        })
    }
}

/// Validate a WOFF or WOFF2 header, returning the format and table count
fn woff_tables(data: &[u8], tag: &[u8; 4]) -> DecodeResult<(FontFormat, u16)> {
    let (format, header) = if tag == b"wOFF" {
        (FontFormat::Woff, WOFF_HEADER)
    } else {
        (FontFormat::Woff2, WOFF2_HEADER)
    };
    if data.len() < header {
        return Err(malformed("Truncated WOFF header"));
    }

    let length = read_u32(data, 8).ok_or_else(|| malformed("Truncated WOFF header"))?;
    if length as usize != data.len() {
        return Err(malformed(format!(
            "WOFF length field {} does not match file size {}",
            length,
            data.len()
        )));
    }

    let num_tables = read_u16(data, 12).ok_or_else(|| malformed("Truncated WOFF header"))?;
    if num_tables == 0 {
        return Err(malformed("WOFF font has no tables"));
    }

    // WOFF2 directory entries are variable-length
    if format == FontFormat::Woff {
        if header + num_tables as usize * WOFF_TABLE_RECORD > data.len() {
            return Err(malformed("WOFF table directory is truncated"));
        }
        for i in 0..num_tables as usize {
            let record = header + i * WOFF_TABLE_RECORD;
            let truncated = || malformed("Truncated WOFF table record");
            let table = read_tag(data, record).ok_or_else(truncated)?;
            let offset = read_u32(data, record + 4).ok_or_else(truncated)?;
            let comp_length = read_u32(data, record + 8).ok_or_else(truncated)?;
            check_span(data, table, offset, comp_length)?;
        }
    }
    Ok((format, num_tables))
}

impl Decoder for FontDecoder {
    type Asset = FontAsset;

    fn name(&self) -> &'static str {
        "font"
    }

    fn extensions(&self) -> &[&str] {
        &["ttf", "otf", "ttc", "woff", "woff2"]
    }

    fn decode(&self, ctx: &DecodeContext) -> DecodeResult<Self::Asset> {
        self.decode_bytes(ctx.data)
    }
}
