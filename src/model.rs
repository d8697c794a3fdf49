//! ABOUTME: Shared record types threaded between the loader, registry, stack and emitter
//! ABOUTME: FontEntry is the cyclic type from the original design flattened into one struct

use std::collections::BTreeMap;

/// Which of the five embedding strategies a font uses. Replaces a stringly
/// `type` field dispatch with an exhaustive match at every call site that
/// branches on it (the emitter, the registry key derivation, and the
/// definition loader all match on this instead of comparing strings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontType {
    /// One of the 14 PDF standard fonts; no embedded program.
    Core,
    /// Type1 (`afm` metrics + optional `pfb` program), simple encoding.
    Type1,
    /// TrueType, simple (8-bit) encoding.
    TrueType,
    /// TrueType, Identity-H CID encoding (`cidfont2`).
    TrueTypeUnicode,
    /// CID Type 0 (TrueType/CFF repackaged as a CIDFont), Identity-H.
    CidFont0,
}

/// Bold/italic/regular/bold-italic, derived from a style suffix on the family
/// key (`Helvetica-BoldOblique` -> bold=true, italic=true).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
}

impl FontStyle {
    /// The suffix the registry appends to a lowercased family name to form
    /// its key: `""`, `"B"`, `"I"`, or `"BI"` (uppercase, canonical
    /// bold-then-italic order — `helvetica` + bold + italic -> `"helveticaBI"`).
    pub fn key_suffix(self) -> &'static str {
        match (self.bold, self.italic) {
            (false, false) => "",
            (true, false) => "B",
            (false, true) => "I",
            (true, true) => "BI",
        }
    }
}

/// The FontDescriptor fields a PDF font dictionary needs, independent of
/// embedding strategy.
#[derive(Debug, Clone, Default)]
pub struct FontDescriptor {
    pub flags: u32,
    pub ascent: i32,
    pub descent: i32,
    pub leading: i32,
    pub cap_height: i32,
    pub x_height: i32,
    pub italic_angle: i32,
    pub stem_v: i32,
    pub stem_h: i32,
    pub avg_width: i32,
    pub max_width: i32,
    pub missing_width: u32,
    pub bbox: [i32; 4],
}

/// CID-keyed fonts (TrueTypeUnicode, CidFont0) carry a CID-to-GID map and a
/// Unicode-to-CID map in addition to the base glyph metrics.
#[derive(Debug, Clone)]
pub struct CidInfo {
    pub registry: String,
    pub ordering: String,
    pub supplement: i32,
    /// `cid -> gid`; identity for most subsets but not guaranteed (a
    /// subsetted font renumbers glyphs, so cid 1 may not be gid 1 anymore).
    pub cid_to_gid: BTreeMap<u32, u32>,
    /// Unicode code point -> CID, used to build the ToUnicode CMap and the
    /// /W array.
    pub uni_to_cid: BTreeMap<u32, u32>,
}

impl Default for CidInfo {
    fn default() -> Self {
        CidInfo {
            registry: "Adobe".to_string(),
            ordering: "Identity".to_string(),
            supplement: 0,
            cid_to_gid: BTreeMap::new(),
            uni_to_cid: BTreeMap::new(),
        }
    }
}

/// The four text-decoration bits a rendered run can carry, independent of
/// the bold/italic that's baked into the registry key (U and O are never
/// part of the key: two runs in the same font but different underline
/// state still share one `FontEntry`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decoration {
    pub underline: bool,
    pub linethrough: bool,
    pub overline: bool,
}

/// One resolved, embeddable font: the flattened replacement for the
/// original's mutually-referential font/file/descriptor triple. Holds
/// everything the emitter needs to write the font's PDF objects, and
/// everything the stack needs to measure text against it.
#[derive(Debug, Clone)]
pub struct FontEntry {
    /// Registry key: lowercased family name plus style suffix, e.g. `"helveticab"`.
    pub key: String,
    pub family: String,
    pub style: FontStyle,
    pub font_type: FontType,
    pub desc: FontDescriptor,

    /// `char code -> width in 1000-unit glyph space`, indexed by the byte
    /// value for simple fonts and by CID for CID-keyed fonts.
    pub widths: BTreeMap<u32, u32>,
    /// Default width used for codes absent from `widths`.
    pub default_width: u32,
    /// `char code -> glyph bounding box`, 1000-unit space. Sparse; absent
    /// codes have no per-glyph box (the descriptor's `FontBBox` still holds
    /// the font-wide box).
    pub cbbox: BTreeMap<u32, [i32; 4]>,

    /// Underline position/thickness in 1000-unit space, from AFM/`post`.
    pub underline_position: i32,
    pub underline_thickness: i32,
    pub decoration: Decoration,

    pub unicode: bool,
    pub pdfa: bool,
    pub subset: bool,
    pub compress: bool,
    /// Set when no style-specific definition file existed on disk and bold/
    /// italic were synthesized rather than loaded.
    pub fakestyle: bool,

    /// Path to the embedded font program on disk, as recorded in the
    /// definition JSON. File bytes aren't read until emission, so this
    /// is a reference, not the resolved content.
    pub file_path: Option<String>,
    /// Directory the definition file itself was loaded from, for resolving
    /// `file_path` when it's relative.
    pub dir: Option<String>,
    /// Non-empty only for `TrueType`/`TrueTypeUnicode`/`CidFont0`: the raw
    /// (possibly already-subsetted) sfnt program bytes.
    pub font_file: Option<Vec<u8>>,
    /// Non-empty only for `Type1`: the raw PFB program bytes, pre-split into
    /// (cleartext length, encrypted length) by `type1::parse`.
    pub type1_program: Option<(Vec<u8>, usize, usize)>,
    /// `/Length1` (and, for Type1, `/Length2`) of the embedded stream once
    /// resolved; `None` until emission reads the file.
    pub length1: Option<usize>,
    pub length2: Option<usize>,
    pub originalsize: Option<usize>,

    pub cid: Option<CidInfo>,

    /// `PostScript` base font name, e.g. `"ABCDEF+Calibri-Bold"` once a
    /// subset prefix is assigned.
    pub base_font: String,
    /// Encoding name, e.g. `"WinAnsiEncoding"` or `"Identity-H"`.
    pub enc: Option<String>,
    /// Differences array for a simple font with a non-Unicode encoding; `None`
    /// means "use the font's built-in encoding or WinAnsiEncoding".
    pub diffs: Option<Vec<(u32, String)>>,
    /// Pooled object number of the `diffs` encoding object, assigned during
    /// emission (late-bound, see the FontEntry lifecycle note).
    pub diff_n: Option<u32>,
    /// Pooled object number of the embedded font-file object, late-bound.
    pub file_n: Option<u32>,
    /// Allocated PDF object number of this font's Font resource, late-bound.
    pub n: Option<u32>,
    /// Union of character codes used across all references to this font;
    /// grows during emission, consumed by the subsetter.
    pub subsetchars: std::collections::BTreeSet<u32>,
    /// Stack-local index (`/F<i>` operand in the `Tf` operator), assigned
    /// when a frame referencing this font is pushed.
    pub i: Option<usize>,
}

impl FontEntry {
    pub fn width_of(&self, code: u32) -> u32 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }
}
