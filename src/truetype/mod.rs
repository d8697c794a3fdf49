//! ABOUTME: Sequences the 13 decode phases of a TrueType (`sfnt`) font into one normalized record
//! ABOUTME: Table layout helpers live in `tables`, cmap formats in `cmap`, glyph headers in `glyf`

pub mod cmap;
pub mod glyf;
pub mod tables;

use crate::error::ParseError;
use crate::model::FontType;
use crate::reader::ByteReader;
use std::collections::BTreeMap;
use tables::{read_head, read_hhea, read_num_glyphs, read_os2, read_post, read_postscript_name, TtfDirectory};

/// The fully decoded, unit-normalized view of an sfnt font. Every FWord/
/// UFWord field has already been scaled by `urk` and rounded, so nothing
/// downstream needs `units_per_em` again.
#[derive(Debug, Clone)]
pub struct TrueTypeFont {
    /// Possibly downgraded from the caller's request: see the type-downgrade
    /// invariant in phase 11.
    pub font_type: FontType,
    pub units_per_em: u16,
    pub bbox: [i32; 4],
    pub flags: u32,
    pub index_to_loc_format: i16,
    pub postscript_name: String,
    pub italic_angle: i32,
    pub underline_position: i32,
    pub underline_thickness: i32,
    pub ascent: i32,
    pub descent: i32,
    pub leading: i32,
    pub hhea_max_width: i32,
    pub avg_width: i32,
    pub stem_v: i32,
    pub stem_h: i32,
    pub num_glyphs: u16,
    pub x_height: i32,
    pub cap_height: i32,
    pub missing_width: u32,
    /// char code -> glyph id, as resolved by the configured cmap subtable.
    pub ctgdata: BTreeMap<u32, u32>,
    /// char code -> advance width (1000-unit space).
    pub cw: BTreeMap<u32, u32>,
    /// char code -> glyph bounding box (1000-unit space).
    pub cbbox: BTreeMap<u32, [i32; 4]>,
    /// glyph id -> (start, end) byte range within `glyf`, absent for glyphs
    /// with no outline (the "drop the predecessor" loca rule).
    pub loca_ranges: BTreeMap<u32, (u32, u32)>,
    /// Number of loca entries read, i.e. `numGlyphs + 1`.
    pub tot_num_glyphs: usize,
    pub glyf_offset: u32,
}

const MAC_STYLE_ITALIC: u16 = 0x0002;

/// Runs all 13 decode phases over `buf`, honoring the configured
/// cmap `(platform_id, encoding_id)` pair. `requested_type` distinguishes a
/// simple TrueType embedding from a CID (`TrueTypeUnicode`) one; the latter
/// downgrades to the former if the resolved cmap yields exactly 256 codes.
pub fn parse(
    buf: &[u8],
    requested_type: FontType,
    platform_id: u16,
    encoding_id: u16,
) -> Result<TrueTypeFont, ParseError> {
    let dir = TtfDirectory::parse(buf)?;
    let r = dir.reader();

    // Phase 3: head.
    let head_rec = dir.require(b"head", "head")?;
    let head = read_head(r, head_rec.offset as usize)?;
    let urk = 1000.0 / head.units_per_em as f64;

    let mut flags: u32 = 0;
    if head.mac_style & MAC_STYLE_ITALIC != 0 {
        flags |= 64;
    }

    // Phase 4: loca + the predecessor-drop rule.
    let loca_rec = dir.require(b"loca", "loca")?;
    let glyf_rec = dir.require(b"glyf", "glyf")?;
    let short_loca = head.index_to_loc_format == 0;
    let entry_size = if short_loca { 2 } else { 4 };
    let entries_read = loca_rec.length as usize / entry_size;
    let mut offsets = Vec::with_capacity(entries_read);
    for i in 0..entries_read {
        let raw = if short_loca {
            r.u16(loca_rec.offset as usize + i * 2)? as u32 * 2
        } else {
            r.u32(loca_rec.offset as usize + i * 4)?
        };
        offsets.push(raw);
    }
    let mut loca_ranges = BTreeMap::new();
    for g in 0..offsets.len().saturating_sub(1) {
        let (start, end) = (offsets[g], offsets[g + 1]);
        if end > start {
            loca_ranges.insert(g as u32, (start, end));
        }
    }
    let tot_num_glyphs = entries_read;

    // Phase 5 + 11: cmap directory, then decode the one matching subtable.
    let cmap_rec = dir.require(b"cmap", "cmap")?;
    let cmap_base = cmap_rec.offset as usize;
    let num_subtables = r.u16(cmap_base + 2)?;
    let mut subtable_offset = None;
    for i in 0..num_subtables as usize {
        let rec_off = cmap_base + 4 + i * 8;
        let p = r.u16(rec_off)?;
        let e = r.u16(rec_off + 2)?;
        let off = r.u32(rec_off + 4)?;
        if p == platform_id && e == encoding_id {
            subtable_offset = Some(cmap_base + off as usize);
        }
    }
    let mut ctgdata = match subtable_offset {
        Some(off) => cmap::decode_subtable(r, off)?,
        None => BTreeMap::new(),
    };
    ctgdata.entry(0).or_insert(0);

    let mut font_type = requested_type;
    if font_type == FontType::TrueTypeUnicode && ctgdata.len() == 256 {
        font_type = FontType::TrueType;
    }

    // Phase 6: OS/2 (optional table in some subset fonts; absence just
    // leaves the OS/2-derived fields at their zero defaults).
    let os2 = dir
        .get(b"OS/2")
        .map(|rec| read_os2(r, rec.offset as usize, urk))
        .transpose()?;
    if let Some(os2) = &os2 {
        if os2.fs_type == 2 {
            return Err(ParseError::LicenseRestricted);
        }
    }
    let (avg_width, stem_v, stem_h) = os2.map_or((0, 0, 0), |o| (o.avg_width, o.stem_v, o.stem_h));

    // Phase 7: name.
    let name_rec = dir.require(b"name", "name")?;
    let postscript_name = read_postscript_name(r, name_rec.offset as usize)?;

    // Phase 8: post.
    let post = dir
        .get(b"post")
        .map(|rec| read_post(r, rec.offset as usize, urk))
        .transpose()?;
    if let Some(post) = &post {
        if post.is_fixed_pitch {
            flags |= 1;
        }
    }
    let (italic_angle, underline_position, underline_thickness) =
        post.map_or((0, 0, 0), |p| (p.italic_angle, p.underline_position, p.underline_thickness));

    // Phase 9: hhea.
    let hhea_rec = dir.require(b"hhea", "hhea")?;
    let hhea = read_hhea(r, hhea_rec.offset as usize, urk)?;

    // Phase 10: maxp.
    let maxp_rec = dir.require(b"maxp", "maxp")?;
    let num_glyphs = read_num_glyphs(r, maxp_rec.offset as usize)?;

    // Phase 12: heights, overridden by 'x'/'H' glyph bboxes when present.
    let mut x_height = hhea.ascent + hhea.descent;
    let mut cap_height = hhea.ascent;
    if let Some(h) = glyph_height(r, &ctgdata, &loca_ranges, glyf_rec.offset, 'x' as u32, urk)? {
        x_height = h;
    }
    if let Some(h) = glyph_height(r, &ctgdata, &loca_ranges, glyf_rec.offset, 'H' as u32, urk)? {
        cap_height = h;
    }

    // Phase 13: widths.
    let hmtx_rec = dir.require(b"hmtx", "hmtx")?;
    let mut widths = Vec::with_capacity(num_glyphs as usize);
    for i in 0..hhea.num_h_metrics as usize {
        let aw = r.u16(hmtx_rec.offset as usize + i * 4)?;
        widths.push((aw as f64 * urk).round() as u32);
    }
    let last_width = *widths.last().unwrap_or(&0);
    while widths.len() < num_glyphs as usize {
        widths.push(last_width);
    }
    let missing_width = widths.first().copied().unwrap_or(0);

    let mut cw = BTreeMap::new();
    let mut cbbox = BTreeMap::new();
    for (&code, &gid) in ctgdata.iter() {
        if code > 0xFFFF {
            continue;
        }
        if let Some(&w) = widths.get(gid as usize) {
            cw.insert(code, w);
        }
        if let Some(&(start, _end)) = loca_ranges.get(&gid) {
            let header = glyf::read_glyph_header(r, glyf_rec.offset as usize + start as usize)?;
            cbbox.insert(
                code,
                [
                    (header.x_min as f64 * urk).round() as i32,
                    (header.y_min as f64 * urk).round() as i32,
                    (header.x_max as f64 * urk).round() as i32,
                    (header.y_max as f64 * urk).round() as i32,
                ],
            );
        }
    }

    Ok(TrueTypeFont {
        font_type,
        units_per_em: head.units_per_em,
        bbox: head.bbox,
        flags,
        index_to_loc_format: head.index_to_loc_format,
        postscript_name,
        italic_angle,
        underline_position,
        underline_thickness,
        ascent: hhea.ascent,
        descent: hhea.descent,
        leading: hhea.leading,
        hhea_max_width: hhea.max_width,
        avg_width,
        stem_v,
        stem_h,
        num_glyphs,
        x_height,
        cap_height,
        missing_width,
        ctgdata,
        cw,
        cbbox,
        loca_ranges,
        tot_num_glyphs,
        glyf_offset: glyf_rec.offset,
    })
}

fn glyph_height(
    r: ByteReader,
    ctgdata: &BTreeMap<u32, u32>,
    loca_ranges: &BTreeMap<u32, (u32, u32)>,
    glyf_offset: u32,
    code: u32,
    urk: f64,
) -> Result<Option<i32>, ParseError> {
    let Some(&gid) = ctgdata.get(&code) else {
        return Ok(None);
    };
    let Some(&(start, _end)) = loca_ranges.get(&gid) else {
        return Ok(None);
    };
    let header = glyf::read_glyph_header(r, glyf_offset as usize + start as usize)?;
    Ok(Some(((header.y_max - header.y_min) as f64 * urk).round() as i32))
}
