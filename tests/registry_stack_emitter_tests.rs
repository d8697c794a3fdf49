//! End-to-end coverage of the registry -> stack -> emitter pipeline, using
//! only synthetic in-memory font definitions and file bytes (no real font
//! files are shipped with this crate).

use font_toolkit::config::EngineConfig;
use font_toolkit::emitter::{emit_fonts, FontFileSource};
use font_toolkit::encrypt::NoEncrypt;
use font_toolkit::registry::FontRegistry;
use font_toolkit::stack::{FontStack, PushSpec};
use font_toolkit::FontStyle;
use std::collections::HashMap;

struct FakeSource(HashMap<&'static str, Vec<u8>>);

impl FontFileSource for FakeSource {
    fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        self.0
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
    }
}

const CORE_JSON: &str = r#"{"type":"Core","cw":{"32":278,"65":667,"97":500},"desc":{"Ascent":718,"Descent":-207}}"#;

#[test]
fn object_numbers_advance_by_exactly_the_emitted_count() {
    let mut reg = FontRegistry::new(0);
    reg.register("Helvetica", FontStyle::default(), CORE_JSON, false, false).unwrap();
    let start = reg.object_number();
    let cfg = EngineConfig::default();
    let source = FakeSource(HashMap::new());
    let bytes = emit_fonts(&mut reg, &cfg, &NoEncrypt, &source).unwrap();
    let emitted_objects = count_obj_markers(&bytes);
    assert_eq!(reg.object_number(), start + emitted_objects as u32);
}

#[test]
fn core_font_round_trip_produces_font_and_descriptor_objects() {
    let mut reg = FontRegistry::new(0);
    reg.register("Helvetica", FontStyle::default(), CORE_JSON, false, false).unwrap();
    let cfg = EngineConfig::default();
    let source = FakeSource(HashMap::new());
    let bytes = emit_fonts(&mut reg, &cfg, &NoEncrypt, &source).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("/Type /Font"));
    assert!(text.contains("/Type /FontDescriptor"));
    assert!(text.contains("/BaseFont /Helvetica"));
}

#[test]
fn two_fonts_sharing_a_file_path_get_the_same_file_object_number() {
    let mut reg = FontRegistry::new(0);
    let json_a = r#"{"type":"TrueType","cw":{"65":667},"file":"shared.ttf"}"#;
    let json_b = r#"{"type":"TrueType","cw":{"65":700},"file":"shared.ttf"}"#;
    reg.register("FontA", FontStyle::default(), json_a, false, false).unwrap();
    reg.register("FontB", FontStyle::default(), json_b, false, false).unwrap();

    let cfg = EngineConfig::default();
    let mut files = HashMap::new();
    files.insert("shared.ttf", vec![0u8; 64]);
    let source = FakeSource(files);
    emit_fonts(&mut reg, &cfg, &NoEncrypt, &source).unwrap();

    let n_a = reg.get("fonta").unwrap().file_n;
    let n_b = reg.get("fontb").unwrap().file_n;
    assert!(n_a.is_some());
    assert_eq!(n_a, n_b);
}

#[test]
fn identical_diff_strings_pool_to_the_same_object() {
    let mut reg = FontRegistry::new(0);
    reg.register("FontA", FontStyle::default(), CORE_JSON, false, false).unwrap();
    reg.register("FontAB", FontStyle { bold: true, italic: false }, CORE_JSON, false, false).unwrap();
    let diffs = vec![(128u32, "Euro".to_string())];
    reg.get_mut("fonta").unwrap().diffs = Some(diffs.clone());
    reg.get_mut("fontaB").unwrap().diffs = Some(diffs);

    let cfg = EngineConfig::default();
    let source = FakeSource(HashMap::new());
    emit_fonts(&mut reg, &cfg, &NoEncrypt, &source).unwrap();

    let diff_a = reg.get("fonta").unwrap().diff_n;
    let diff_b = reg.get("fontaB").unwrap().diff_n;
    assert!(diff_a.is_some());
    assert_eq!(diff_a, diff_b);
}

#[test]
fn unicode_font_without_an_embedded_file_still_emits_a_full_type0_chain() {
    let mut reg = FontRegistry::new(0);
    let json = r#"{"type":"TrueTypeUnicode","cw":{"65":667,"97":500},"cidinfo":{}}"#;
    reg.register("SomeSans", FontStyle::default(), json, false, false).unwrap();
    let cfg = EngineConfig::default();
    let source = FakeSource(HashMap::new());
    let bytes = emit_fonts(&mut reg, &cfg, &NoEncrypt, &source).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("/Subtype /Type0"));
    assert!(text.contains("/Subtype /CIDFontType2"));
}

#[test]
fn stack_push_registry_and_emitter_compose_end_to_end() {
    let mut reg = FontRegistry::new(0);
    reg.register("Helvetica", FontStyle::default(), CORE_JSON, false, false).unwrap();
    {
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec { key: "helvetica".into(), size: Some(12.0), spacing: None, stretching: None })
            .unwrap();
        let width = stack.char_width(65);
        assert!(width > 0.0);
    }
    let cfg = EngineConfig::default();
    let source = FakeSource(HashMap::new());
    let bytes = emit_fonts(&mut reg, &cfg, &NoEncrypt, &source).unwrap();
    assert!(!bytes.is_empty());
}

fn count_obj_markers(bytes: &[u8]) -> usize {
    let text = String::from_utf8_lossy(bytes);
    text.matches(" 0 obj\n").count()
}
