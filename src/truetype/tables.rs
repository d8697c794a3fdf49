//! ABOUTME: sfnt table directory and the fixed-layout tables (head/hhea/maxp/OS2/post/name)
//! ABOUTME: Each `read_*` takes the table's start offset and returns a typed record

use crate::error::ParseError;
use crate::reader::ByteReader;
use std::collections::BTreeMap;

/// One entry of the sfnt table directory.
#[derive(Debug, Clone, Copy)]
pub struct TableRecord {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// The parsed table directory plus a borrow of the whole font buffer, so any
/// table's bytes can be sliced out by tag without re-reading the directory.
pub struct TtfDirectory<'a> {
    pub buf: &'a [u8],
    pub records: BTreeMap<[u8; 4], TableRecord>,
}

impl<'a> TtfDirectory<'a> {
    /// Phases 1-2: sfnt header + table directory. Rejects anything but
    /// TrueType's `0x00010000` version (OTTO/CFF fonts are a non-goal).
    pub fn parse(buf: &'a [u8]) -> Result<Self, ParseError> {
        let r = ByteReader::new(buf);
        let sfnt_version = r.u32(0)?;
        if sfnt_version != 0x0001_0000 {
            return Err(ParseError::BadMagic("sfntVersion != 0x00010000"));
        }
        let num_tables = r.u16(4)?;
        let mut records = BTreeMap::new();
        let dir_start = 12;
        for i in 0..num_tables as usize {
            let rec_off = dir_start + i * 16;
            let tag = r.tag(rec_off)?;
            let checksum = r.u32(rec_off + 4)?;
            let offset = r.u32(rec_off + 8)?;
            let length = r.u32(rec_off + 12)?;
            records.insert(
                tag,
                TableRecord {
                    tag,
                    checksum,
                    offset,
                    length,
                },
            );
        }
        Ok(TtfDirectory { buf, records })
    }

    pub fn get(&self, tag: &[u8; 4]) -> Option<&TableRecord> {
        self.records.get(tag)
    }

    pub fn require(&self, tag: &'static [u8; 4], name: &'static str) -> Result<&TableRecord, ParseError> {
        self.get(tag).ok_or(ParseError::MissingTable(name))
    }

    pub fn reader(&self) -> ByteReader<'a> {
        ByteReader::new(self.buf)
    }

    pub fn table_bytes(&self, rec: &TableRecord) -> Result<&'a [u8], ParseError> {
        self.reader().slice(rec.offset as usize, rec.length as usize)
    }
}

/// Phase 3 subset: fields of `head` the parser needs downstream.
#[derive(Debug, Clone, Copy)]
pub struct HeadTable {
    pub units_per_em: u16,
    pub bbox: [i32; 4],
    pub mac_style: u16,
    pub index_to_loc_format: i16,
}

pub fn read_head(r: ByteReader, offset: usize) -> Result<HeadTable, ParseError> {
    let magic = r.u32(offset + 12)?;
    if magic != 0x5F0F_3CF5 {
        return Err(ParseError::BadMagic("head.magicNumber != 0x5F0F3CF5"));
    }
    let units_per_em = r.u16(offset + 18)?;
    let urk = 1000.0 / units_per_em as f64;
    let bbox = [
        (r.fword(offset + 36)? as f64 * urk).round() as i32,
        (r.fword(offset + 38)? as f64 * urk).round() as i32,
        (r.fword(offset + 40)? as f64 * urk).round() as i32,
        (r.fword(offset + 42)? as f64 * urk).round() as i32,
    ];
    let mac_style = r.u16(offset + 44)?;
    let index_to_loc_format = r.i16(offset + 50)?;
    Ok(HeadTable {
        units_per_em,
        bbox,
        mac_style,
        index_to_loc_format,
    })
}

/// Phase 9: `hhea`.
#[derive(Debug, Clone, Copy)]
pub struct HheaTable {
    pub ascent: i32,
    pub descent: i32,
    pub leading: i32,
    pub max_width: i32,
    pub num_h_metrics: u16,
}

pub fn read_hhea(r: ByteReader, offset: usize, urk: f64) -> Result<HheaTable, ParseError> {
    let ascent = (r.fword(offset + 4)? as f64 * urk).round() as i32;
    let descent = (r.fword(offset + 6)? as f64 * urk).round() as i32;
    let leading = (r.fword(offset + 8)? as f64 * urk).round() as i32;
    let max_width = (r.ufword(offset + 10)? as f64 * urk).round() as i32;
    let num_h_metrics = r.u16(offset + 32)?;
    Ok(HheaTable {
        ascent,
        descent,
        leading,
        max_width,
        num_h_metrics,
    })
}

/// Phase 10: `maxp.numGlyphs`.
pub fn read_num_glyphs(r: ByteReader, offset: usize) -> Result<u16, ParseError> {
    r.u16(offset + 4)
}

/// Phase 6: the subset of `OS/2` the engine consumes.
#[derive(Debug, Clone, Copy)]
pub struct Os2Table {
    pub avg_width: i32,
    pub stem_v: i32,
    pub stem_h: i32,
    pub fs_type: u16,
}

pub fn read_os2(r: ByteReader, offset: usize, urk: f64) -> Result<Os2Table, ParseError> {
    let x_avg_char_width = r.i16(offset + 2)?;
    let weight_class = r.u16(offset + 4)? as f64;
    let fs_type = r.u16(offset + 8)?;
    Ok(Os2Table {
        avg_width: (x_avg_char_width as f64 * urk).round() as i32,
        stem_v: (70.0 * weight_class / 400.0).round() as i32,
        stem_h: (30.0 * weight_class / 400.0).round() as i32,
        fs_type,
    })
}

/// Phase 8: `post`.
#[derive(Debug, Clone, Copy)]
pub struct PostTable {
    pub italic_angle: i32,
    pub underline_position: i32,
    pub underline_thickness: i32,
    pub is_fixed_pitch: bool,
}

pub fn read_post(r: ByteReader, offset: usize, urk: f64) -> Result<PostTable, ParseError> {
    let italic_angle = r.fixed(offset + 4)?.round() as i32;
    let underline_position = (r.fword(offset + 8)? as f64 * urk).round() as i32;
    let underline_thickness = (r.fword(offset + 10)? as f64 * urk).round() as i32;
    let is_fixed_pitch = r.u32(offset + 12)? != 0;
    Ok(PostTable {
        italic_angle,
        underline_position,
        underline_thickness,
        is_fixed_pitch,
    })
}

/// Platform/encoding pairs the `name` and `cmap` tables key records by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PlatformEncoding {
    pub platform_id: u16,
    pub encoding_id: u16,
}

/// Phase 7: walk `name` records looking for `nameID == 6` (PostScript name),
/// decode per the platform/encoding table, and sanitize to `[A-Za-z0-9_-]`.
pub fn read_postscript_name(r: ByteReader, offset: usize) -> Result<String, ParseError> {
    let count = r.u16(offset + 2)?;
    let string_offset = r.u16(offset + 4)? as usize;
    for i in 0..count as usize {
        let rec_off = offset + 6 + i * 12;
        let platform_id = r.u16(rec_off)?;
        let encoding_id = r.u16(rec_off + 2)?;
        let name_id = r.u16(rec_off + 6)?;
        if name_id != 6 {
            continue;
        }
        let length = r.u16(rec_off + 8)? as usize;
        let rec_string_offset = r.u16(rec_off + 10)? as usize;
        let bytes = r.slice(offset + string_offset + rec_string_offset, length)?;
        let decoded = decode_name_bytes(platform_id, encoding_id, bytes)?;
        let sanitized = sanitize_name(&decoded);
        if !sanitized.is_empty() {
            return Ok(sanitized);
        }
    }
    Err(ParseError::EncodingDecode("no usable nameID 6 record".into()))
}

fn decode_name_bytes(platform_id: u16, encoding_id: u16, bytes: &[u8]) -> Result<String, ParseError> {
    match (platform_id, encoding_id) {
        (0, _) => decode_utf16_be(bytes),
        (1, _) => Ok(decode_mac_roman(bytes)),
        (3, 3) => Ok(decode_cp936_approx(bytes)),
        (3, 4) => Ok(decode_cp950_approx(bytes)),
        (3, 5) => Ok(decode_cp949_approx(bytes)),
        (3, _) => decode_utf16_be(bytes),
        _ => decode_utf16_be(bytes),
    }
}

fn decode_utf16_be(bytes: &[u8]) -> Result<String, ParseError> {
    if bytes.len() % 2 != 0 {
        return Err(ParseError::EncodingDecode("odd-length UTF-16BE name record".into()));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16(&units).map_err(|e| ParseError::EncodingDecode(e.to_string()))
}

/// MacRoman's ASCII range (0x00-0x7F) coincides with Windows-1252 and UTF-8;
/// PostScript names are ASCII in practice, so bytes above 0x7F just round-trip
/// as their Windows-1252 code point rather than a full MacRoman table.
fn decode_mac_roman(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn decode_cp936_approx(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn decode_cp950_approx(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn decode_cp949_approx(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn sanitize_name(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_disallowed_chars() {
        assert_eq!(sanitize_name("Calibri Bold!"), "CalibriBold");
    }

    #[test]
    fn head_rejects_bad_magic() {
        let mut buf = vec![0u8; 54];
        buf[12..16].copy_from_slice(&0u32.to_be_bytes());
        let r = ByteReader::new(&buf);
        assert!(matches!(read_head(r, 0), Err(ParseError::BadMagic(_))));
    }

    #[test]
    fn head_scales_bbox_by_urk() {
        let mut buf = vec![0u8; 54];
        buf[12..16].copy_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
        buf[18..20].copy_from_slice(&2048u16.to_be_bytes()); // unitsPerEm
        buf[36..38].copy_from_slice(&(-100i16).to_be_bytes()); // xMin
        let r = ByteReader::new(&buf);
        let head = read_head(r, 0).unwrap();
        assert_eq!(head.units_per_em, 2048);
        // -100 * 1000/2048 = -48.828 -> rounds to -49
        assert_eq!(head.bbox[0], -49);
    }
}
