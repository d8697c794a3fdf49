//! Benchmarks for the two CPU-bound hot paths in the engine: decoding a
//! realistically large cmap format 4 subtable, and compacting a CID width
//! table into its `/W` range form. Both use synthetic data built in-process
//! (no external font fixtures) since a subtable/width-table's byte shape is
//! fully specified and doesn't need a real font to be representative.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use font_toolkit::emitter::widths::compact_cid_widths;
use font_toolkit::reader::ByteReader;
use font_toolkit::registry::FontRegistry;
use font_toolkit::truetype::cmap::decode_subtable;
use font_toolkit::FontStyle;
use std::collections::BTreeMap;

/// A format 4 cmap subtable covering `segments` contiguous delta-mapped
/// ranges of 64 code points each (no glyphIdArray indirection), which is the
/// common case for a font covering a large contiguous Unicode block.
fn build_format4_subtable(segments: u16) -> Vec<u8> {
    let seg_count = segments as usize + 1; // +1 for the trailing 0xFFFF sentinel
    let mut end_count = Vec::new();
    let mut start_count = Vec::new();
    let mut id_delta = Vec::new();
    let mut id_range_offset = Vec::new();

    let mut code = 0x20u32;
    for _ in 0..segments {
        let start = code;
        let end = code + 63;
        start_count.extend_from_slice(&(start as u16).to_be_bytes());
        end_count.extend_from_slice(&(end as u16).to_be_bytes());
        id_delta.extend_from_slice(&1i16.to_be_bytes());
        id_range_offset.extend_from_slice(&0u16.to_be_bytes());
        code = end + 1;
    }
    // Trailing sentinel segment, required by the format.
    start_count.extend_from_slice(&0xFFFFu16.to_be_bytes());
    end_count.extend_from_slice(&0xFFFFu16.to_be_bytes());
    id_delta.extend_from_slice(&1i16.to_be_bytes());
    id_range_offset.extend_from_slice(&0u16.to_be_bytes());

    let mut out = Vec::new();
    out.extend_from_slice(&4u16.to_be_bytes()); // format
    out.extend_from_slice(&0u16.to_be_bytes()); // length (unused by the decoder)
    out.extend_from_slice(&0u16.to_be_bytes()); // language
    out.extend_from_slice(&((seg_count * 2) as u16).to_be_bytes()); // segCountX2
    out.extend_from_slice(&0u16.to_be_bytes()); // searchRange
    out.extend_from_slice(&0u16.to_be_bytes()); // entrySelector
    out.extend_from_slice(&0u16.to_be_bytes()); // rangeShift
    out.extend_from_slice(&end_count);
    out.extend_from_slice(&0u16.to_be_bytes()); // reservedPad
    out.extend_from_slice(&start_count);
    out.extend_from_slice(&id_delta);
    out.extend_from_slice(&id_range_offset);
    out
}

fn bench_cmap_format4_decode(c: &mut Criterion) {
    let subtable = build_format4_subtable(500); // ~32,000 mapped code points
    c.bench_function("cmap_format4_decode_32k_codepoints", |b| {
        b.iter(|| {
            let reader = ByteReader::new(black_box(&subtable));
            decode_subtable(reader, 0).unwrap()
        })
    });
}

/// Alternates long uniform runs (interval segments) with short mixed-width
/// runs (range segments), the case that exercises the compaction merge pass
/// the hardest.
fn build_cid_width_table(count: u32) -> BTreeMap<u32, u32> {
    let mut cw = BTreeMap::new();
    let mut cid = 0u32;
    while cid < count {
        for _ in 0..40 {
            cw.insert(cid, 500);
            cid += 1;
        }
        for i in 0..3 {
            cw.insert(cid, 500 + i * 37);
            cid += 1;
        }
    }
    cw
}

fn bench_width_compaction(c: &mut Criterion) {
    let cw = build_cid_width_table(20_000);
    c.bench_function("compact_cid_widths_20k_entries", |b| {
        b.iter(|| compact_cid_widths(black_box(&cw), 600, None))
    });
}

fn bench_registry_registration(c: &mut Criterion) {
    let json = r#"{"type":"Core","cw":{"32":278,"65":667,"97":500}}"#;
    c.bench_function("registry_register_200_distinct_families", |b| {
        b.iter(|| {
            let mut reg = FontRegistry::new(0);
            for i in 0..200 {
                let family = format!("Family{i}");
                reg.register(&family, FontStyle::default(), json, false, false).unwrap();
            }
            black_box(reg.object_number())
        })
    });
}

criterion_group!(
    benches,
    bench_cmap_format4_decode,
    bench_width_compaction,
    bench_registry_registration
);
criterion_main!(benches);
