//! ABOUTME: Font object emission for CidFont0 (CIDFontType0, Identity-H) fonts
//! ABOUTME: Like truetype_fonts but no CIDToGIDMap: CFF glyph selection is implicit in the charset

use super::{descriptor_dict, to_unicode_cmap_content, widths, wrap_object, wrap_stream_object};
use crate::error::EmitError;
use crate::model::FontType;
use crate::registry::FontRegistry;
use std::collections::BTreeSet;

pub(super) fn emit(registry: &mut FontRegistry, key: &str, out: &mut Vec<u8>) -> Result<(), EmitError> {
    let entry = registry.get(key).expect("dispatched only for registered keys").clone();
    let font_n = entry.n.expect("registered fonts always carry an object number");
    let cid = entry.cid.as_ref().ok_or(EmitError::UnsupportedType(FontType::CidFont0))?;

    let desc_n = registry.alloc_object_number();
    let file_ref = entry.file_n.map(|n| ("FontFile2", n));
    out.extend_from_slice(wrap_object(desc_n, &descriptor_dict(&entry.desc, &entry.base_font, file_ref)).as_bytes());

    let subset = if entry.subset { Some(&entry.subsetchars) } else { None };
    let w_clause = widths::compact_cid_widths(&entry.widths, entry.default_width, subset);

    let used_cids: BTreeSet<u32> = match subset {
        Some(s) => s.clone(),
        None => entry.widths.keys().copied().collect(),
    };
    let tounicode_n = registry.alloc_object_number();
    out.extend_from_slice(&wrap_stream_object(
        tounicode_n,
        "",
        to_unicode_cmap_content(&used_cids).as_bytes(),
    ));

    let descendant_n = registry.alloc_object_number();
    let descendant_body = format!(
        "<< /Type /Font /Subtype /CIDFontType0 /BaseFont /{} \
/CIDSystemInfo << /Registry ({}) /Ordering ({}) /Supplement {} >> \
/FontDescriptor {desc_n} 0 R /DW {} {w_clause} >>",
        entry.base_font, cid.registry, cid.ordering, cid.supplement, entry.default_width,
    );
    out.extend_from_slice(wrap_object(descendant_n, &descendant_body).as_bytes());

    let font_body = format!(
        "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H \
/DescendantFonts [{descendant_n} 0 R] /ToUnicode {tounicode_n} 0 R >>",
        entry.base_font,
    );
    out.extend_from_slice(wrap_object(font_n, &font_body).as_bytes());
    Ok(())
}
