//! ABOUTME: PDF object emission: encoding diffs, font files, font dictionaries
//! ABOUTME: Three ordered phases; cross-references use object numbers recorded on FontEntry

mod cid_fonts;
mod core_fonts;
mod truetype_fonts;
pub mod widths;

use crate::config::EngineConfig;
use crate::encrypt::Encrypt;
use crate::error::EmitError;
use crate::model::FontType;
use crate::registry::FontRegistry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// Reads the bytes of an embedded font program by path. The caller owns
/// actual filesystem/network access; this engine only asks for bytes given
/// the path recorded in a font definition.
pub trait FontFileSource {
    fn read(&self, path: &str) -> std::io::Result<Vec<u8>>;
}

pub fn obj_open(n: u32) -> String {
    format!("{n} 0 obj\n")
}

pub fn obj_close() -> &'static str {
    "\nendobj\n"
}

/// Wraps `body` as a complete, non-stream indirect object.
pub fn wrap_object(n: u32, body: &str) -> String {
    format!("{}{}{}", obj_open(n), body, obj_close())
}

/// Wraps `stream` as a complete indirect object carrying a binary stream,
/// with `extra_dict` inserted into the dictionary alongside `/Length`.
pub fn wrap_stream_object(n: u32, extra_dict: &str, stream: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(obj_open(n).as_bytes());
    out.extend_from_slice(format!("<< {extra_dict} /Length {} >>\nstream\n", stream.len()).as_bytes());
    out.extend_from_slice(stream);
    out.extend_from_slice(b"\nendstream\nendobj\n");
    out
}

fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// ToUnicode CMap content for an Identity-H font: CID equals the Unicode
/// code point, so the bfchar table is effectively identity.
pub(crate) fn to_unicode_cmap_content(cids: &BTreeSet<u32>) -> String {
    let estimated = 200 + cids.len() * 20 + 70;
    let mut out = String::with_capacity(estimated);
    out.push_str(TO_UNICODE_HEADER);
    let nonzero: Vec<u32> = cids.iter().copied().filter(|&c| c > 0).collect();
    if !nonzero.is_empty() {
        let _ = writeln!(out, "{} beginbfchar", nonzero.len());
        for cid in nonzero {
            let _ = writeln!(out, "<{cid:04X}> <{cid:04X}>");
        }
        out.push_str("endbfchar\n");
    }
    out.push_str(TO_UNICODE_FOOTER);
    out
}

const TO_UNICODE_HEADER: &str = "/CIDInit /ProcSet findresource begin\n\
12 dict begin\n\
begincmap\n\
/CIDSystemInfo\n\
<< /Registry (Adobe)\n\
   /Ordering (UCS)\n\
   /Supplement 0\n\
>> def\n\
/CMapName /Adobe-Identity-UCS def\n\
/CMapType 2 def\n\
1 begincodespacerange\n\
<0000> <FFFF>\n\
endcodespacerange\n";

const TO_UNICODE_FOOTER: &str = "endcmap\n\
CMapName currentdict /CMap defineresource pop\n\
end\n\
end";

/// `/CIDToGIDMap` stream: 2 bytes per CID (big-endian GID), CID 0..=max.
pub(crate) fn cid_to_gid_map_bytes(cid_to_gid: &BTreeMap<u32, u32>) -> Vec<u8> {
    let max_cid = cid_to_gid.keys().max().copied().unwrap_or(0);
    let mut out = vec![0u8; (max_cid as usize + 1) * 2];
    for (&cid, &gid) in cid_to_gid {
        let idx = cid as usize * 2;
        out[idx] = (gid >> 8) as u8;
        out[idx + 1] = (gid & 0xff) as u8;
    }
    out
}

/// Builds a `/FontDescriptor` dictionary body. `file_ref` is
/// `(key, object_number)` for the embedded file entry — `"FontFile"` for
/// Type1, `"FontFile2"` for TrueType/CID, `"FontFile3"` for Type1C/CFF —
/// omitted entirely for Core fonts, which carry no program.
pub(crate) fn descriptor_dict(
    desc: &crate::model::FontDescriptor,
    base_font: &str,
    file_ref: Option<(&str, u32)>,
) -> String {
    let mut out = format!(
        "<< /Type /FontDescriptor /FontName /{base_font} /Flags {} \
/FontBBox [{} {} {} {}] /ItalicAngle {} /Ascent {} /Descent {} /Leading {} \
/CapHeight {} /XHeight {} /StemV {} /StemH {} /AvgWidth {} /MaxWidth {} /MissingWidth {}",
        desc.flags,
        desc.bbox[0],
        desc.bbox[1],
        desc.bbox[2],
        desc.bbox[3],
        desc.italic_angle,
        desc.ascent,
        desc.descent,
        desc.leading,
        desc.cap_height,
        desc.x_height,
        desc.stem_v,
        desc.stem_h,
        desc.avg_width,
        desc.max_width,
        desc.missing_width,
    );
    if let Some((tag, n)) = file_ref {
        let _ = write!(out, " /{tag} {n} 0 R");
    }
    out.push_str(" >>");
    out
}

/// Emits every font-related indirect object currently held in `registry`,
/// in three ordered phases, and advances the registry's object
/// counter by the number of objects written.
pub fn emit_fonts(
    registry: &mut FontRegistry,
    cfg: &EngineConfig,
    encrypt: &dyn Encrypt,
    source: &dyn FontFileSource,
) -> Result<Vec<u8>, EmitError> {
    let mut out = Vec::new();

    // Phase 1: encoding-diff objects. Pooling first (so repeats share one
    // index), then one object per distinct diff, in pool order.
    let keys: Vec<String> = registry.iter_keys_in_order().map(str::to_string).collect();
    for key in &keys {
        let diff_string = registry.get(key).and_then(|e| e.diffs.as_ref()).map(format_differences);
        if let Some(diff_string) = diff_string {
            let pool_index = registry.pool_diff(&diff_string);
            if let Some(entry) = registry.get_mut(key) {
                entry.diff_n = Some(pool_index);
            }
        }
    }
    let diff_strings: Vec<String> = registry.diff_pool().to_vec();
    let mut diff_object_numbers = Vec::with_capacity(diff_strings.len());
    for diff in &diff_strings {
        let n = registry.alloc_object_number();
        diff_object_numbers.push(n);
        let body =
            format!("<< /Type /Encoding /BaseEncoding /WinAnsiEncoding /Differences [{diff}] >>");
        out.extend_from_slice(wrap_object(n, &body).as_bytes());
    }
    // `diff_n` on each entry was the 1-based pool index; rewrite it to the
    // actual object number now that objects have been allocated.
    for key in &keys {
        if let Some(entry) = registry.get_mut(key) {
            if let Some(pool_index) = entry.diff_n {
                entry.diff_n = diff_object_numbers.get(pool_index as usize - 1).copied();
            }
        }
    }

    // Phase 2: font-file objects, grouped by (deduplicated) file path.
    let mut file_groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for key in &keys {
        if let Some(entry) = registry.get(key) {
            if let Some(path) = &entry.file_path {
                file_groups.entry(path.clone()).or_default().push(key.clone());
            }
        }
    }
    for (path, aliases) in &file_groups {
        let subset_all = cfg.subset
            && aliases.iter().all(|k| registry.get(k).map(|e| e.subset).unwrap_or(false));
        let font_type = aliases
            .first()
            .and_then(|k| registry.get(k))
            .map(|e| e.font_type);
        let is_type1 = font_type == Some(FontType::Type1);

        let raw = source.read(path).map_err(EmitError::Compress)?;
        let (payload, length1, length2) = if is_type1 {
            let program = crate::type1::parse(&raw).map_err(|_| {
                EmitError::Compress(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "malformed PFB font program",
                ))
            })?;
            let mut combined = program.header.clone();
            combined.extend_from_slice(&program.encrypted);
            combined.extend_from_slice(&program.trailer);
            (combined, program.header.len(), Some(program.encrypted.len()))
        } else {
            let original = if subset_all {
                let union: BTreeSet<u32> = aliases
                    .iter()
                    .filter_map(|k| registry.get(k))
                    .flat_map(|e| e.subsetchars.iter().copied())
                    .collect();
                let requested = font_type.unwrap_or(FontType::TrueType);
                crate::truetype::parse(&raw, requested, cfg.platform_id, cfg.encoding_id)
                    .ok()
                    .and_then(|parsed| crate::subsetter::subset(&raw, &parsed, &union).ok())
                    .unwrap_or(raw)
            } else {
                raw
            };
            let length1 = original.len();
            (original, length1, None)
        };
        let compressed = compress(&payload).map_err(EmitError::Compress)?;
        let n = registry.alloc_object_number();
        let encrypted = encrypt.encrypt_stream(&compressed, n);

        let mut extra = String::from("/Filter /FlateDecode");
        let _ = write!(extra, " /Length1 {length1}");
        if let Some(l2) = length2 {
            let _ = write!(extra, " /Length2 {l2} /Length3 0");
        }
        out.extend_from_slice(&wrap_stream_object(n, &extra, &encrypted));

        for key in aliases {
            if let Some(entry) = registry.get_mut(key) {
                entry.file_n = Some(n);
                entry.length1 = Some(length1);
                entry.length2 = length2;
            }
        }
    }

    // Phase 3: font definitions, dispatched per type.
    for key in &keys {
        let font_type = registry.get(key).map(|e| e.font_type);
        match font_type {
            Some(FontType::Core) | Some(FontType::Type1) | Some(FontType::TrueType) => {
                core_fonts::emit(registry, key, &mut out)?;
            }
            Some(FontType::TrueTypeUnicode) => {
                truetype_fonts::emit(registry, key, &mut out)?;
            }
            Some(FontType::CidFont0) => {
                cid_fonts::emit(registry, key, &mut out)?;
            }
            None => {}
        }
    }

    Ok(out)
}

/// Formats a `diffs` list as a PDF `Differences` array body (without the
/// enclosing `[` `]`): consecutive codes share one leading code number,
/// a gap starts a fresh one.
fn format_differences(diffs: &[(u32, String)]) -> String {
    let mut out = String::new();
    let mut prev_code: Option<u32> = None;
    for (code, name) in diffs {
        if prev_code != Some(code.wrapping_sub(1)) {
            if prev_code.is_some() {
                out.push(' ');
            }
            let _ = write!(out, "{code}");
        }
        let _ = write!(out, " /{name}");
        prev_code = Some(*code);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differences_group_contiguous_codes() {
        let diffs = vec![(128, "A".to_string()), (129, "B".to_string()), (200, "C".to_string())];
        assert_eq!(format_differences(&diffs), "128 /A /B 200 /C");
    }

    #[test]
    fn to_unicode_cmap_skips_cid_zero() {
        let mut cids = BTreeSet::new();
        cids.insert(0);
        cids.insert(65);
        let content = to_unicode_cmap_content(&cids);
        assert!(content.contains("<0041> <0041>"));
        assert!(!content.contains("<0000> <0000>"));
    }

    #[test]
    fn cid_to_gid_map_is_big_endian_pairs() {
        let mut map = BTreeMap::new();
        map.insert(1, 0x0102);
        let bytes = cid_to_gid_map_bytes(&map);
        assert_eq!(&bytes[2..4], &[0x01, 0x02]);
    }
}
