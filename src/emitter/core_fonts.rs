//! ABOUTME: Font object emission for Core, Type1, and simple TrueType (8-bit encoding) fonts
//! ABOUTME: Shares one shape: /Widths + FirstChar/LastChar, a FontDescriptor, optional embedded file

use super::{descriptor_dict, widths, wrap_object};
use crate::error::EmitError;
use crate::model::FontType;
use crate::registry::FontRegistry;

pub(super) fn emit(registry: &mut FontRegistry, key: &str, out: &mut Vec<u8>) -> Result<(), EmitError> {
    let entry = registry.get(key).expect("dispatched only for registered keys").clone();
    let font_n = entry.n.expect("registered fonts always carry an object number");

    let file_tag = match entry.font_type {
        FontType::Type1 => "FontFile",
        FontType::TrueType => "FontFile2",
        FontType::Core => "FontFile",
        _ => return Err(EmitError::UnsupportedType(entry.font_type)),
    };
    let file_ref = entry.file_n.map(|n| (file_tag, n));

    let desc_n = registry.alloc_object_number();
    let desc_body = descriptor_dict(&entry.desc, &entry.base_font, file_ref);
    out.extend_from_slice(wrap_object(desc_n, &desc_body).as_bytes());

    let subset = if entry.subset { Some(&entry.subsetchars) } else { None };
    let widths_clause =
        match widths::simple_widths_array(&entry.widths, entry.default_width, subset) {
            Some((first, last, arr)) => format!(" /FirstChar {first} /LastChar {last} /Widths {arr}"),
            None => String::new(),
        };

    let subtype = match entry.font_type {
        FontType::Core | FontType::Type1 => "Type1",
        FontType::TrueType => "TrueType",
        _ => unreachable!(),
    };
    let encoding = match entry.diff_n {
        Some(n) => format!("{n} 0 R"),
        None => entry
            .enc
            .as_deref()
            .map(|e| format!("/{e}"))
            .unwrap_or_else(|| "/WinAnsiEncoding".to_string()),
    };

    let body = format!(
        "<< /Type /Font /Subtype /{subtype} /BaseFont /{}{} /Encoding {encoding} /FontDescriptor {desc_n} 0 R >>",
        entry.base_font, widths_clause,
    );
    out.extend_from_slice(wrap_object(font_n, &body).as_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FontStyle;

    #[test]
    fn core_font_emits_descriptor_and_font_objects() {
        let mut reg = FontRegistry::new(0);
        let json = r#"{"type":"Core","cw":{"65":667,"66":700}}"#;
        reg.register("Helvetica", FontStyle::default(), json, false, false).unwrap();
        let mut out = Vec::new();
        emit(&mut reg, "helvetica", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("/Type /FontDescriptor"));
        assert!(text.contains("/BaseFont /Helvetica"));
        assert!(text.contains("/FirstChar 65 /LastChar 66"));
    }

    #[test]
    fn diff_n_overrides_plain_encoding_name() {
        let mut reg = FontRegistry::new(0);
        let json = r#"{"type":"Core","cw":{"65":667}}"#;
        reg.register("Helvetica", FontStyle::default(), json, false, false).unwrap();
        reg.get_mut("helvetica").unwrap().diffs = Some(vec![(128, "Euro".to_string())]);
        reg.get_mut("helvetica").unwrap().diff_n = Some(9);
        let mut out = Vec::new();
        emit(&mut reg, "helvetica", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("/Encoding 9 0 R"));
    }
}
