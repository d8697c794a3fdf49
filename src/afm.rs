//! ABOUTME: Line-oriented parser for the 14 standard Core font AFM metric files
//! ABOUTME: Keyword dispatch over whitespace-split tokens, same shape as the TTF table dispatch in truetype::mod

use std::collections::BTreeMap;

/// Everything this engine pulls out of an AFM file, before default-width and
/// style-synthesis rules (those belong to `definition`, since they apply to
/// Type1/Core fonts uniformly regardless of metrics source).
#[derive(Debug, Clone, Default)]
pub struct AfmMetrics {
    pub font_name: String,
    pub full_name: String,
    pub family_name: String,
    pub weight: String,
    pub character_set: String,
    pub version: String,
    pub encoding_scheme: String,
    pub is_fixed_pitch: bool,
    pub italic_angle: i32,
    pub underline_position: i32,
    pub underline_thickness: i32,
    pub cap_height: i32,
    pub x_height: i32,
    pub ascender: i32,
    pub descender: i32,
    pub std_hw: i32,
    pub std_vw: i32,
    pub font_bbox: [i32; 4],

    /// `C` lines, keyed by character code.
    pub cwidths: BTreeMap<i32, i32>,
    pub cbbox: BTreeMap<i32, [i32; 4]>,

    pub flags: u32,

    /// Post-`setCharWidths` outputs.
    pub cw: BTreeMap<i32, i32>,
    pub missing_width: i32,
    pub max_width: i32,
    pub avg_width: i32,
}

/// Parses AFM text: split on newline, then whitespace, dispatch on the first
/// token. Unknown keywords (there are many in a real AFM — kerning pairs,
/// composite character data, comments) are silently skipped; this engine
/// only needs the metrics header and the `C` lines.
pub fn parse(text: &str) -> AfmMetrics {
    let mut m = AfmMetrics::default();

    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&keyword) = tokens.first() else {
            continue;
        };

        match keyword {
            "FontName" => m.font_name = join_rest(&tokens),
            "FullName" => m.full_name = join_rest(&tokens),
            "FamilyName" => m.family_name = join_rest(&tokens),
            "Weight" => m.weight = join_rest(&tokens),
            "CharacterSet" => m.character_set = join_rest(&tokens),
            "Version" => m.version = join_rest(&tokens),
            "EncodingScheme" => m.encoding_scheme = join_rest(&tokens),
            "IsFixedPitch" => m.is_fixed_pitch = tokens.get(1) == Some(&"true"),
            "ItalicAngle" => m.italic_angle = parse_int(tokens.get(1)),
            "UnderlinePosition" => m.underline_position = parse_int(tokens.get(1)),
            "UnderlineThickness" => m.underline_thickness = parse_int(tokens.get(1)),
            "CapHeight" => m.cap_height = parse_int(tokens.get(1)),
            "XHeight" => m.x_height = parse_int(tokens.get(1)),
            "Ascender" => m.ascender = parse_int(tokens.get(1)),
            "Descender" => m.descender = parse_int(tokens.get(1)),
            "StdHW" => m.std_hw = parse_int(tokens.get(1)),
            "StdVW" => m.std_vw = parse_int(tokens.get(1)),
            "FontBBox" => {
                m.font_bbox = [
                    parse_int(tokens.get(1)),
                    parse_int(tokens.get(2)),
                    parse_int(tokens.get(3)),
                    parse_int(tokens.get(4)),
                ]
            }
            "C" => parse_c_line(&tokens, &mut m),
            _ => {}
        }
    }

    set_char_widths(&mut m);
    compute_flags(&mut m);
    apply_fallbacks(&mut m);

    m
}

fn join_rest(tokens: &[&str]) -> String {
    tokens[1..].join(" ")
}

fn parse_int(tok: Option<&&str>) -> i32 {
    tok.and_then(|t| t.trim_end_matches(';').parse().ok()).unwrap_or(0)
}

/// `C cid ; WX w ; N name ; B x0 y0 x1 y1 ;` — tokens arrive as
/// `["C", "cid", ";", "WX", "w", ";", "N", "name", ";", "B", "x0", "y0", "x1", "y1", ";"]`.
/// The presence check for a bbox is literally "does a 14th token exist",
/// mirroring the source rather than scanning for a `"B"` keyword.
fn parse_c_line(tokens: &[&str], m: &mut AfmMetrics) {
    let cid: i32 = match tokens.get(1).and_then(|t| t.parse().ok()) {
        Some(v) => v,
        None => return,
    };

    let mut wx = None;
    let mut i = 2;
    while i < tokens.len() {
        if tokens[i] == "WX" {
            wx = tokens.get(i + 1).and_then(|t| t.parse().ok());
        }
        i += 1;
    }
    if let Some(w) = wx {
        m.cwidths.insert(cid, w);
    }

    if tokens.len() >= 14 {
        if let Some(b_idx) = tokens.iter().position(|&t| t == "B") {
            let bbox = [
                parse_int(tokens.get(b_idx + 1)),
                parse_int(tokens.get(b_idx + 2)),
                parse_int(tokens.get(b_idx + 3)),
                parse_int(tokens.get(b_idx + 4)),
            ];
            m.cbbox.insert(cid, bbox);
        }
    }
}

/// `MissingWidth = cwidths[32]` if present else `600`; fill `cw[0..=255]`
/// from `cwidths` or `MissingWidth`; `MaxWidth`/`AvgWidth` over all `cwidths`.
fn set_char_widths(m: &mut AfmMetrics) {
    m.missing_width = m.cwidths.get(&32).copied().unwrap_or(600);

    for cid in 0..=255i32 {
        let w = m.cwidths.get(&cid).copied().unwrap_or(m.missing_width);
        m.cw.insert(cid, w);
    }

    m.max_width = m.cwidths.values().copied().fold(m.missing_width, i32::max);
    m.avg_width = if m.cwidths.is_empty() {
        0
    } else {
        (m.cwidths.values().sum::<i32>() as f64 / m.cwidths.len() as f64).round() as i32
    };
}

fn compute_flags(m: &mut AfmMetrics) {
    let mut flags = 0u32;
    flags |= if matches!(m.font_name.as_str(), "Symbol" | "ZapfDingbats") {
        4
    } else {
        32
    };
    if m.is_fixed_pitch {
        flags |= 1;
    }
    if m.italic_angle != 0 {
        flags |= 64;
    }
    m.flags = flags;
}

/// Preserved quirk: this unconditionally overwrites `Descender`/`Ascender`
/// from `FontBBox` even when the AFM file supplied explicit values, and
/// `CapHeight` falls back to the (possibly just-overwritten) `Ascender`.
fn apply_fallbacks(m: &mut AfmMetrics) {
    m.descender = m.font_bbox[1];
    m.ascender = m.font_bbox[3];
    if m.cap_height == 0 {
        m.cap_height = m.ascender;
    }
}

/// Strip everything outside `[A-Za-z0-9_-]`; an empty result is the caller's
/// problem to treat as fatal (AFM files with no usable FullName are
/// malformed, not recoverable).
pub fn sanitize_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-').collect()
}
