//! ABOUTME: Produces a standalone sfnt containing only the glyphs a character subset reaches
//! ABOUTME: Checksum/table-rewrite machinery is adapted from this engine's own hinting-table stripper

use crate::error::SubsetError;
use crate::reader::ByteReader;
use crate::truetype::tables::TtfDirectory;
use crate::truetype::{glyf, TrueTypeFont};
use std::collections::{BTreeSet, VecDeque};

/// Tables a subset font keeps. `cmap` is dropped: subset fonts are referenced
/// through an external CIDToGIDMap rather than their own character map.
const KEEP_TABLES: &[[u8; 4]] = &[
    *b"head", *b"hhea", *b"hmtx", *b"maxp", *b"cvt ", *b"fpgm", *b"prep", *b"glyf", *b"loca",
];

/// `sum of big-endian u32 words, wrapped` — the checksum algorithm every
/// sfnt table (and the whole file) uses. `data` must already be padded to a
/// multiple of 4.
fn calc_checksum(data: &[u8]) -> u32 {
    data.chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_be_bytes(word)
        })
        .fold(0u32, |acc, w| acc.wrapping_add(w))
}

/// `searchRange`/`entrySelector`/`rangeShift` for the sfnt header, derived
/// from the number of tables.
fn calc_search_params(num_tables: u16) -> (u16, u16, u16) {
    let mut entry_selector = 0u16;
    while (1u16 << (entry_selector + 1)) <= num_tables {
        entry_selector += 1;
    }
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = num_tables * 16 - search_range;
    (search_range, entry_selector, range_shift)
}

fn pad_to_4(mut data: Vec<u8>) -> Vec<u8> {
    while data.len() % 4 != 0 {
        data.push(0);
    }
    data
}

/// Step 1-2: seed the subset glyph set from the characters actually used,
/// then close it over composite-glyph references with an explicit worklist
/// (rather than the source's re-scanning outer loop).
fn glyph_closure(
    r: ByteReader,
    font: &TrueTypeFont,
    used_codes: &BTreeSet<u32>,
) -> Result<BTreeSet<u32>, SubsetError> {
    let mut subglyphs: BTreeSet<u32> = BTreeSet::new();
    subglyphs.insert(0);
    let mut worklist: VecDeque<u32> = VecDeque::new();
    worklist.push_back(0);

    for &code in used_codes {
        if let Some(&gid) = font.ctgdata.get(&code) {
            if subglyphs.insert(gid) {
                worklist.push_back(gid);
            }
        }
    }

    while let Some(g) = worklist.pop_front() {
        let Some(&(start, _end)) = font.loca_ranges.get(&g) else {
            continue;
        };
        let glyph_offset = font.glyf_offset as usize + start as usize;
        let header = glyf::read_glyph_header(r, glyph_offset)?;
        if !header.is_composite() {
            continue;
        }
        for child in glyf::composite_component_glyphs(r, glyph_offset)? {
            if subglyphs.insert(child) {
                worklist.push_back(child);
            }
        }
    }

    Ok(subglyphs)
}

/// Step 4: rewrite `glyf`/`loca` keeping only glyphs in `subglyphs`, each
/// other glyph emitted as a zero-length entry.
fn rewrite_glyf_and_loca(r: ByteReader, font: &TrueTypeFont, subglyphs: &BTreeSet<u32>) -> (Vec<u8>, Vec<u8>) {
    let short_loca = font.index_to_loc_format == 0;
    let num_real_glyphs = font.tot_num_glyphs.saturating_sub(1);

    let mut new_glyf = Vec::new();
    let mut offsets = Vec::with_capacity(font.tot_num_glyphs);
    offsets.push(0u32);

    for g in 0..num_real_glyphs as u32 {
        if subglyphs.contains(&g) {
            if let Some(&(start, end)) = font.loca_ranges.get(&g) {
                let slice = r
                    .slice(font.glyf_offset as usize + start as usize, (end - start) as usize)
                    .expect("loca range was already validated during parsing");
                new_glyf.extend_from_slice(slice);
                if short_loca && new_glyf.len() % 2 != 0 {
                    new_glyf.push(0);
                }
            }
        }
        offsets.push(new_glyf.len() as u32);
    }

    let mut new_loca = Vec::with_capacity(offsets.len() * if short_loca { 2 } else { 4 });
    for off in &offsets {
        if short_loca {
            new_loca.extend_from_slice(&((off / 2) as u16).to_be_bytes());
        } else {
            new_loca.extend_from_slice(&off.to_be_bytes());
        }
    }

    (new_glyf, new_loca)
}

/// Runs the full subset pipeline and returns a standalone sfnt blob.
pub fn subset(buf: &[u8], font: &TrueTypeFont, used_codes: &BTreeSet<u32>) -> Result<Vec<u8>, SubsetError> {
    let dir = TtfDirectory::parse(buf)?;
    let r = dir.reader();

    let subglyphs = glyph_closure(r, font, used_codes)?;
    let (new_glyf, new_loca) = rewrite_glyf_and_loca(r, font, &subglyphs);

    let mut kept: Vec<([u8; 4], Vec<u8>)> = Vec::new();
    for tag in KEEP_TABLES {
        let data = match *tag {
            t if t == *b"glyf" => new_glyf.clone(),
            t if t == *b"loca" => new_loca.clone(),
            other => match dir.get(&other) {
                Some(rec) => dir.table_bytes(rec)?.to_vec(),
                None => continue,
            },
        };
        kept.push((*tag, pad_to_4(data)));
    }

    // Step 6: zero checkSumAdjustment before any checksum (per-table or
    // whole-file) is computed over `head`.
    if let Some((_, head_data)) = kept.iter_mut().find(|(tag, _)| *tag == *b"head") {
        head_data[8..12].copy_from_slice(&[0, 0, 0, 0]);
    }

    let num_tables = kept.len() as u16;
    let (search_range, entry_selector, range_shift) = calc_search_params(num_tables);
    let dir_size = 12 + kept.len() * 16;

    let mut body = Vec::new();
    let mut directory = Vec::with_capacity(kept.len() * 16);
    let mut offset = dir_size as u32;
    for (tag, data) in &kept {
        let checksum = calc_checksum(data);
        directory.extend_from_slice(tag);
        directory.extend_from_slice(&checksum.to_be_bytes());
        directory.extend_from_slice(&offset.to_be_bytes());
        directory.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += data.len() as u32;
        body.extend_from_slice(data);
    }

    let mut out = Vec::with_capacity(dir_size + body.len());
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&num_tables.to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&range_shift.to_be_bytes());
    out.extend_from_slice(&directory);
    out.extend_from_slice(&body);

    let whole_checksum = calc_checksum(&out);
    let adjustment = 0xB1B0_AFBAu32.wrapping_sub(whole_checksum);
    let head_offset = dir_size
        + kept
            .iter()
            .take_while(|(tag, _)| *tag != *b"head")
            .map(|(_, d)| d.len())
            .sum::<usize>();
    out[head_offset + 8..head_offset + 12].copy_from_slice(&adjustment.to_be_bytes());

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FontType;
    use crate::truetype;

    fn build_two_glyph_font() -> Vec<u8> {
        let mut tables: Vec<([u8; 4], Vec<u8>)> = Vec::new();

        let mut head = vec![0u8; 54];
        head[12..16].copy_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
        head[18..20].copy_from_slice(&1000u16.to_be_bytes());
        head[50..52].copy_from_slice(&1i16.to_be_bytes());
        tables.push((*b"head", head));

        let mut hhea = vec![0u8; 34];
        hhea[32..34].copy_from_slice(&2u16.to_be_bytes());
        tables.push((*b"hhea", hhea));

        let mut maxp = vec![0u8; 6];
        maxp[4..6].copy_from_slice(&2u16.to_be_bytes());
        tables.push((*b"maxp", maxp));

        let hmtx = vec![0u8; 8];
        tables.push((*b"hmtx", hmtx));

        let mut loca = vec![0u8; 12];
        loca[4..8].copy_from_slice(&10u32.to_be_bytes());
        loca[8..12].copy_from_slice(&20u32.to_be_bytes());
        tables.push((*b"loca", loca));

        let glyf = vec![0u8; 20];
        tables.push((*b"glyf", glyf));

        let mut format0 = vec![0u8; 6 + 256];
        format0[6 + b'A' as usize] = 1;
        let mut cmap_table = vec![0u8; 12];
        cmap_table[2..4].copy_from_slice(&1u16.to_be_bytes());
        cmap_table[4..6].copy_from_slice(&3u16.to_be_bytes());
        cmap_table[6..8].copy_from_slice(&1u16.to_be_bytes());
        cmap_table[8..12].copy_from_slice(&12u32.to_be_bytes());
        cmap_table.extend_from_slice(&format0);
        tables.push((*b"cmap", cmap_table));

        let mut name = vec![0u8; 6];
        name[2..4].copy_from_slice(&1u16.to_be_bytes());
        name[4..6].copy_from_slice(&18u16.to_be_bytes());
        let mut record = vec![0u8; 12];
        record[6..8].copy_from_slice(&6u16.to_be_bytes());
        record[8..10].copy_from_slice(&8u16.to_be_bytes());
        name.extend_from_slice(&record);
        for c in "Test".encode_utf16() {
            name.extend_from_slice(&c.to_be_bytes());
        }
        tables.push((*b"name", name));

        assemble(tables)
    }

    fn assemble(tables: Vec<([u8; 4], Vec<u8>)>) -> Vec<u8> {
        let num_tables = tables.len();
        let mut header = vec![0u8; 12];
        header[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
        header[4..6].copy_from_slice(&(num_tables as u16).to_be_bytes());
        let dir_size = num_tables * 16;
        let mut data_offset = 12 + dir_size;
        let mut directory = Vec::with_capacity(dir_size);
        let mut data = Vec::new();
        for (tag, bytes) in &tables {
            directory.extend_from_slice(tag);
            directory.extend_from_slice(&0u32.to_be_bytes());
            directory.extend_from_slice(&(data_offset as u32).to_be_bytes());
            directory.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            data_offset += bytes.len();
            data.extend_from_slice(bytes);
        }
        let mut buf = header;
        buf.extend_from_slice(&directory);
        buf.extend_from_slice(&data);
        buf
    }

    #[test]
    fn subset_produces_valid_sfnt_header_and_checksum() {
        let buf = build_two_glyph_font();
        let font = truetype::parse(&buf, FontType::TrueType, 3, 1).unwrap();
        let used: BTreeSet<u32> = [b'A' as u32].into_iter().collect();
        let out = subset(&buf, &font, &used).unwrap();

        assert_eq!(u32::from_be_bytes([out[0], out[1], out[2], out[3]]), 0x0001_0000);
        // build_two_glyph_font only supplies head/hhea/maxp/hmtx/loca/glyf/cmap/name;
        // of those, KEEP_TABLES keeps head/hhea/maxp/hmtx/loca/glyf (cmap and name
        // aren't embedded-program tables), so 6 survive, not KEEP_TABLES.len().
        let num_tables = u16::from_be_bytes([out[4], out[5]]);
        assert_eq!(num_tables, 6);

        let whole_checksum = calc_checksum(&out);
        assert_eq!(whole_checksum, 0xB1B0_AFBA);
    }

    #[test]
    fn dropped_cmap_is_absent_from_output() {
        let buf = build_two_glyph_font();
        let font = truetype::parse(&buf, FontType::TrueType, 3, 1).unwrap();
        let used: BTreeSet<u32> = [b'A' as u32].into_iter().collect();
        let out = subset(&buf, &font, &used).unwrap();
        let dir = TtfDirectory::parse(&out).unwrap();
        assert!(dir.get(b"cmap").is_none());
        assert!(dir.get(b"glyf").is_some());
    }

    #[test]
    fn search_params_match_known_values() {
        // mirrors the reference calc_search_params(11) == (128, 3, 48) case
        assert_eq!(calc_search_params(11), (128, 3, 48));
    }
}
