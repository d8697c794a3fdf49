//! ABOUTME: Loads a JSON font definition (widths + descriptor) into a FontEntry
//! ABOUTME: Applies the default-width rule, canonical Core naming, and artificial bold/italic synthesis

use crate::error::DefError;
use crate::model::{CidInfo, FontDescriptor, FontEntry, FontStyle, FontType};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize, Default)]
struct DescJson {
    #[serde(rename = "Ascent")]
    ascent: Option<i32>,
    #[serde(rename = "Descent")]
    descent: Option<i32>,
    #[serde(rename = "Leading")]
    leading: Option<i32>,
    #[serde(rename = "CapHeight")]
    cap_height: Option<i32>,
    #[serde(rename = "XHeight")]
    x_height: Option<i32>,
    #[serde(rename = "ItalicAngle")]
    italic_angle: Option<i32>,
    #[serde(rename = "StemV")]
    stem_v: Option<i32>,
    #[serde(rename = "StemH")]
    stem_h: Option<i32>,
    #[serde(rename = "AvgWidth")]
    avg_width: Option<i32>,
    #[serde(rename = "MaxWidth")]
    max_width: Option<i32>,
    #[serde(rename = "MissingWidth")]
    missing_width: Option<u32>,
    #[serde(rename = "Flags")]
    flags: Option<u32>,
    #[serde(rename = "FontBBox")]
    font_bbox: Option<[i32; 4]>,
}

#[derive(Debug, Deserialize, Default)]
struct CidInfoJson {
    #[serde(default = "default_registry")]
    #[serde(rename = "Registry")]
    registry: String,
    #[serde(default = "default_ordering")]
    #[serde(rename = "Ordering")]
    ordering: String,
    #[serde(default, rename = "Supplement")]
    supplement: i32,
    #[serde(default)]
    uni2cid: BTreeMap<String, u32>,
}

fn default_registry() -> String {
    "Adobe".to_string()
}
fn default_ordering() -> String {
    "Identity".to_string()
}

#[derive(Debug, Deserialize)]
struct FontDefinitionJson {
    #[serde(rename = "type")]
    type_: Option<String>,
    cw: Option<BTreeMap<String, u32>>,
    desc: Option<DescJson>,
    cidinfo: Option<CidInfoJson>,
    enc: Option<String>,
    file: Option<String>,
    dw: Option<u32>,
}

fn parse_font_type(s: &str) -> Result<FontType, DefError> {
    match s {
        "Core" => Ok(FontType::Core),
        "TrueType" => Ok(FontType::TrueType),
        "TrueTypeUnicode" => Ok(FontType::TrueTypeUnicode),
        "Type1" => Ok(FontType::Type1),
        "cidfont0" => Ok(FontType::CidFont0),
        other => Err(DefError::UnknownType(other.to_string())),
    }
}

/// The built-in 14-entry Core PostScript name table.
fn core_postscript_name(family: &str, style: FontStyle) -> Option<&'static str> {
    match family.to_lowercase().as_str() {
        "helvetica" | "arial" => Some(match (style.bold, style.italic) {
            (false, false) => "Helvetica",
            (true, false) => "Helvetica-Bold",
            (false, true) => "Helvetica-Oblique",
            (true, true) => "Helvetica-BoldOblique",
        }),
        "courier" | "courier new" => Some(match (style.bold, style.italic) {
            (false, false) => "Courier",
            (true, false) => "Courier-Bold",
            (false, true) => "Courier-Oblique",
            (true, true) => "Courier-BoldOblique",
        }),
        "times" | "times new roman" => Some(match (style.bold, style.italic) {
            (false, false) => "Times-Roman",
            (true, false) => "Times-Bold",
            (false, true) => "Times-Italic",
            (true, true) => "Times-BoldItalic",
        }),
        "symbol" => Some("Symbol"),
        "zapfdingbats" => Some("ZapfDingbats"),
        _ => None,
    }
}

/// Load a font definition given the family/style the caller already
/// resolved (file discovery and the style-variant-missing check that sets
/// `fakestyle` are the caller's concern, per the engine's external-collaborator
/// boundary).
pub fn load(
    json: &str,
    family: &str,
    style: FontStyle,
    pdfa: bool,
    fakestyle: bool,
) -> Result<FontEntry, DefError> {
    let raw: FontDefinitionJson =
        serde_json::from_str(json).map_err(|_| DefError::BadFormat("type"))?;

    let type_str = raw.type_.as_deref().ok_or(DefError::BadFormat("type"))?;
    let cw_raw = raw.cw.as_ref().ok_or(DefError::BadFormat("cw"))?;
    let font_type = parse_font_type(type_str)?;

    if font_type == FontType::CidFont0 && pdfa {
        return Err(DefError::CidOnPdfa);
    }

    let widths: BTreeMap<u32, u32> = cw_raw
        .iter()
        .filter_map(|(k, &v)| k.parse::<u32>().ok().map(|code| (code, v)))
        .collect();

    let desc_json = raw.desc.unwrap_or_default();
    let mut desc = FontDescriptor {
        flags: desc_json.flags.unwrap_or(0),
        ascent: desc_json.ascent.unwrap_or(0),
        descent: desc_json.descent.unwrap_or(0),
        leading: desc_json.leading.unwrap_or(0),
        cap_height: desc_json.cap_height.unwrap_or(0),
        x_height: desc_json.x_height.unwrap_or(0),
        italic_angle: desc_json.italic_angle.unwrap_or(0),
        stem_v: desc_json.stem_v.unwrap_or(0),
        stem_h: desc_json.stem_h.unwrap_or(0),
        avg_width: desc_json.avg_width.unwrap_or(0),
        max_width: desc_json.max_width.unwrap_or(0),
        missing_width: desc_json.missing_width.unwrap_or(0),
        bbox: desc_json.font_bbox.unwrap_or([0, 0, 0, 0]),
    };

    // Step 5: default-width rule.
    let default_width = if let Some(dw) = raw.dw {
        dw
    } else if desc.missing_width > 0 {
        desc.missing_width
    } else if let Some(&space) = widths.get(&32) {
        if space > 0 {
            space
        } else {
            600
        }
    } else {
        600
    };

    let key_suffix = style.key_suffix();
    let key = format!("{}{}", family.to_lowercase(), key_suffix);

    // Step 6: setName.
    let mut enc = raw.enc.clone();
    if font_type == FontType::TrueTypeUnicode {
        enc = Some("Identity-H".to_string());
    }
    let mut base_font = core_postscript_name(family, style)
        .map(str::to_string)
        .unwrap_or_else(|| family.to_string());
    if pdfa && font_type == FontType::Core {
        base_font = format!("pdfa{base_font}");
    }

    // Step 7: setArtificialStyles, only when no style-specific file/definition
    // was found on disk and the caller is synthesizing bold/italic.
    if fakestyle {
        if style.bold {
            base_font = format!("{base_font}Bold");
            desc.stem_v = if desc.stem_v == 0 {
                123
            } else {
                (desc.stem_v as f64 * 1.75).round() as i32
            };
        }
        if style.italic {
            base_font = format!("{base_font}Italic");
            desc.italic_angle = if desc.italic_angle == 0 { -11 } else { desc.italic_angle - 11 };
            desc.flags |= 64;
        }
    }

    let cid = raw.cidinfo.map(|c| CidInfo {
        registry: c.registry,
        ordering: c.ordering,
        supplement: c.supplement,
        cid_to_gid: BTreeMap::new(),
        uni_to_cid: c
            .uni2cid
            .iter()
            .filter_map(|(k, &v)| k.parse::<u32>().ok().map(|u| (u, v)))
            .collect(),
    });

    Ok(FontEntry {
        key,
        family: family.to_string(),
        style,
        font_type,
        desc,
        widths,
        default_width,
        cbbox: BTreeMap::new(),
        underline_position: 0,
        underline_thickness: 0,
        decoration: crate::model::Decoration::default(),
        unicode: font_type == FontType::TrueTypeUnicode || font_type == FontType::CidFont0,
        pdfa,
        subset: false,
        compress: true,
        fakestyle,
        file_path: raw.file,
        dir: None,
        font_file: None,
        type1_program: None,
        length1: None,
        length2: None,
        originalsize: None,
        cid,
        base_font,
        enc,
        diffs: None,
        diff_n: None,
        file_n: None,
        n: None,
        subsetchars: Default::default(),
        i: None,
    })
}
