//! ABOUTME: Decoders for the eight cmap subtable formats this engine understands
//! ABOUTME: Format 8's net-nullifying overwrite and formats 13/14's no-op are preserved on purpose

use crate::error::ParseError;
use crate::reader::ByteReader;
use std::collections::BTreeMap;

/// Decode the subtable at `offset` (the offset of its own `format` field, not
/// the cmap table header). Dispatches on the u16 format tag.
pub fn decode_subtable(r: ByteReader, offset: usize) -> Result<BTreeMap<u32, u32>, ParseError> {
    let format = r.u16(offset)?;
    match format {
        0 => decode_format0(r, offset),
        2 => decode_format2(r, offset),
        4 => decode_format4(r, offset),
        6 => decode_format6(r, offset),
        8 => decode_format8(r, offset),
        10 => decode_format10(r, offset),
        12 => decode_format12(r, offset),
        13 | 14 => Ok(BTreeMap::new()),
        other => Err(ParseError::UnsupportedCmapFormat(other)),
    }
}

fn decode_format0(r: ByteReader, offset: usize) -> Result<BTreeMap<u32, u32>, ParseError> {
    let mut map = BTreeMap::new();
    for code in 0..256u32 {
        let gid = r.u8(offset + 6 + code as usize)? as u32;
        map.insert(code, gid);
    }
    Ok(map)
}

struct SubHeader {
    first_code: u16,
    entry_count: u16,
    id_delta: i16,
    id_range_offset_norm: i64,
}

fn decode_format2(r: ByteReader, offset: usize) -> Result<BTreeMap<u32, u32>, ParseError> {
    let keys_off = offset + 6;
    let mut keys = [0u16; 256];
    let mut max_key = 0u16;
    for (hi, key) in keys.iter_mut().enumerate() {
        let k = r.u16(keys_off + hi * 2)? / 8;
        *key = k;
        max_key = max_key.max(k);
    }

    let num_sub_headers = max_key as usize + 1;
    let subheaders_off = keys_off + 512;
    let mut subs = Vec::with_capacity(num_sub_headers);
    for ish in 0..num_sub_headers {
        let so = subheaders_off + ish * 8;
        let first_code = r.u16(so)?;
        let entry_count = r.u16(so + 2)?;
        let id_delta = r.i16(so + 4)?;
        let id_range_offset_raw = r.u16(so + 6)? as i64;
        let norm = (id_range_offset_raw - (2 + (num_sub_headers as i64 - ish as i64 - 1) * 8)) / 2;
        subs.push(SubHeader {
            first_code,
            entry_count,
            id_delta,
            id_range_offset_norm: norm,
        });
    }

    let glyph_index_array_off = subheaders_off + num_sub_headers * 8;
    let mut map = BTreeMap::new();
    for (hi, &key) in keys.iter().enumerate() {
        if key == 0 {
            let gid = r.u16(glyph_index_array_off)? as u32;
            map.insert(hi as u32, gid);
            continue;
        }
        let sub = &subs[key as usize];
        let last = sub.first_code as u32 + sub.entry_count as u32;
        for low in sub.first_code as u32..last {
            let idx = sub.id_range_offset_norm + (low as i64 - sub.first_code as i64);
            if idx < 0 {
                continue;
            }
            let gi = r.u16(glyph_index_array_off + (idx as usize) * 2)?;
            let glyph = (gi as i64 + sub.id_delta as i64).rem_euclid(65536).max(0) as u32;
            let code = ((hi as u32) << 8) | low;
            map.insert(code, glyph);
        }
    }
    Ok(map)
}

fn decode_format4(r: ByteReader, offset: usize) -> Result<BTreeMap<u32, u32>, ParseError> {
    let seg_count = (r.u16(offset + 6)? / 2) as usize;
    let end_count_off = offset + 14;
    let start_count_off = end_count_off + seg_count * 2 + 2; // + reservedPad
    let id_delta_off = start_count_off + seg_count * 2;
    let id_range_offset_off = id_delta_off + seg_count * 2;
    let glyph_id_array_off = id_range_offset_off + seg_count * 2;

    let mut map = BTreeMap::new();
    for seg in 0..seg_count {
        let end_count = r.u16(end_count_off + seg * 2)?;
        let start_count = r.u16(start_count_off + seg * 2)?;
        let id_delta = r.i16(id_delta_off + seg * 2)?;
        let id_range_offset = r.u16(id_range_offset_off + seg * 2)?;

        for chr in start_count as u32..=end_count as u32 {
            let glyph = if id_range_offset == 0 {
                (chr as i64 + id_delta as i64).rem_euclid(65536) as u32
            } else {
                let idx = (id_range_offset as i64 / 2) + (chr as i64 - start_count as i64)
                    - (seg_count as i64 - seg as i64);
                if idx < 0 {
                    continue;
                }
                let raw = r.u16(glyph_id_array_off + (idx as usize) * 2)?;
                (raw as i64 + id_delta as i64).rem_euclid(65536) as u32
            };
            map.insert(chr, glyph);
        }
    }
    Ok(map)
}

fn decode_format6(r: ByteReader, offset: usize) -> Result<BTreeMap<u32, u32>, ParseError> {
    let first_code = r.u16(offset + 6)? as u32;
    let entry_count = r.u16(offset + 8)?;
    let mut map = BTreeMap::new();
    for i in 0..entry_count as u32 {
        let gid = r.u16(offset + 10 + (i as usize) * 2)? as u32;
        map.insert(first_code + i, gid);
    }
    Ok(map)
}

/// Preserves a quirk from the library this engine's behavior was modeled on:
/// every Format 8 mapping is inserted, then immediately overwritten with 0.
/// The net effect is that Format 8 fonts end up with every mapped code
/// pointing at glyph 0. Confirmed intentional to keep byte-for-byte parity
/// with the reference behavior; do not "fix" without checking with callers
/// first (this is the one quirk explicitly flagged for that in the design).
fn decode_format8(r: ByteReader, offset: usize) -> Result<BTreeMap<u32, u32>, ParseError> {
    let is32_off = offset + 12;
    let n_groups_off = is32_off + 8192;
    let n_groups = r.u32(n_groups_off)?;
    let groups_off = n_groups_off + 4;

    let mut map = BTreeMap::new();
    for gi in 0..n_groups as usize {
        let go = groups_off + gi * 12;
        let start = r.u32(go)?;
        let end = r.u32(go + 4)?;
        let start_glyph = r.u32(go + 8)?;
        for c in start..=end {
            let byte_idx = (c / 8) as usize;
            let bit_idx = (c % 8) as u8;
            let bit_set = byte_idx < 8192 && (r.u8(is32_off + byte_idx)? >> (7 - bit_idx)) & 1 == 1;

            let chr = if bit_set {
                let high = 0xD800 + ((c - 0x1_0000) >> 10);
                let low = 0xDC00 + ((c - 0x1_0000) & 0x3FF);
                (high << 16) | low
            } else {
                c
            };

            let glyph = start_glyph + (c - start);
            map.insert(chr, glyph);
            map.insert(chr, 0);
        }
    }
    Ok(map)
}

fn decode_format10(r: ByteReader, offset: usize) -> Result<BTreeMap<u32, u32>, ParseError> {
    let first_code = r.u32(offset + 12)?;
    let entry_count = r.u32(offset + 16)?;
    let array_off = offset + 20;
    let mut map = BTreeMap::new();
    for i in 0..entry_count {
        let gid = r.u16(array_off + (i as usize) * 2)? as u32;
        map.insert(first_code + i, gid);
    }
    Ok(map)
}

fn decode_format12(r: ByteReader, offset: usize) -> Result<BTreeMap<u32, u32>, ParseError> {
    let n_groups = r.u32(offset + 12)?;
    let groups_off = offset + 16;
    let mut map = BTreeMap::new();
    for gi in 0..n_groups as usize {
        let go = groups_off + gi * 12;
        let start = r.u32(go)?;
        let end = r.u32(go + 4)?;
        let start_glyph = r.u32(go + 8)?;
        for c in start..=end {
            map.insert(c, start_glyph + (c - start));
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_u16(buf: &mut Vec<u8>, v: u16) {
        buf.extend_from_slice(&v.to_be_bytes());
    }
    fn push_u32(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_be_bytes());
    }

    #[test]
    fn format0_maps_256_bytes() {
        let mut buf = vec![0u8; 6];
        push_u16(&mut buf, 0);
        for i in 0..256u8 {
            buf.push(i.wrapping_add(1));
        }
        let r = ByteReader::new(&buf);
        let map = decode_subtable(r, 0).unwrap();
        assert_eq!(map[&65], 66);
        assert_eq!(map.len(), 256);
    }

    #[test]
    fn format6_trimmed_table() {
        let mut buf = vec![0u8; 10];
        buf[0..2].copy_from_slice(&6u16.to_be_bytes());
        buf[6..8].copy_from_slice(&65u16.to_be_bytes()); // firstCode
        buf[8..10].copy_from_slice(&3u16.to_be_bytes()); // entryCount
        buf.extend_from_slice(&10u16.to_be_bytes());
        buf.extend_from_slice(&11u16.to_be_bytes());
        buf.extend_from_slice(&12u16.to_be_bytes());
        let r = ByteReader::new(&buf);
        let map = decode_subtable(r, 0).unwrap();
        assert_eq!(map[&65], 10);
        assert_eq!(map[&67], 12);
    }

    #[test]
    fn format12_sequential_ranges() {
        let mut buf = vec![0u8; 16];
        buf[0..2].copy_from_slice(&12u16.to_be_bytes());
        buf[12..16].copy_from_slice(&1u32.to_be_bytes()); // nGroups
        push_u32(&mut buf, 65); // start
        push_u32(&mut buf, 67); // end
        push_u32(&mut buf, 100); // startGlyph
        let r = ByteReader::new(&buf);
        let map = decode_subtable(r, 0).unwrap();
        assert_eq!(map[&65], 100);
        assert_eq!(map[&66], 101);
        assert_eq!(map[&67], 102);
    }

    #[test]
    fn format8_nullifies_every_mapping() {
        let mut buf = vec![0u8; 12 + 8192];
        buf[0..2].copy_from_slice(&8u16.to_be_bytes());
        push_u32(&mut buf, 1); // nGroups
        push_u32(&mut buf, 65); // start
        push_u32(&mut buf, 66); // end
        push_u32(&mut buf, 5); // startGlyph
        let r = ByteReader::new(&buf);
        let map = decode_subtable(r, 0).unwrap();
        assert_eq!(map[&65], 0);
        assert_eq!(map[&66], 0);
    }

    #[test]
    fn formats_13_and_14_are_noops() {
        let mut buf13 = vec![0u8; 2];
        buf13[0..2].copy_from_slice(&13u16.to_be_bytes());
        let r = ByteReader::new(&buf13);
        assert!(decode_subtable(r, 0).unwrap().is_empty());

        let mut buf14 = vec![0u8; 2];
        buf14[0..2].copy_from_slice(&14u16.to_be_bytes());
        let r = ByteReader::new(&buf14);
        assert!(decode_subtable(r, 0).unwrap().is_empty());
    }

    #[test]
    fn unsupported_format_is_an_error() {
        let mut buf = vec![0u8; 2];
        buf[0..2].copy_from_slice(&99u16.to_be_bytes());
        let r = ByteReader::new(&buf);
        assert!(matches!(
            decode_subtable(r, 0),
            Err(ParseError::UnsupportedCmapFormat(99))
        ));
    }
}
