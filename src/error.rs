//! ABOUTME: Typed error enums for every fallible component of the engine
//! ABOUTME: One enum per component, matching the table in the engine's design doc

use std::fmt;

/// Errors raised while decoding bytes — the byte reader and the TrueType
/// table parser, which is the biggest consumer of out-of-range reads.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A typed read (`u8`/`u16`/`i16`/`u32`/`i32`/`Fixed`/`FWord`/`UFWord`) landed
    /// outside the buffer.
    #[error("read of {size} bytes at offset {offset} is out of bounds (buffer is {len} bytes)")]
    Bounds {
        offset: usize,
        size: usize,
        len: usize,
    },

    /// `sfntVersion != 0x00010000`, or `head`'s magic number isn't `0x5F0F3CF5`.
    #[error("bad magic number: {0}")]
    BadMagic(&'static str),

    /// A `cmap` subtable declared a format outside {0,2,4,6,8,10,12,13,14}.
    #[error("unsupported cmap format {0}")]
    UnsupportedCmapFormat(u16),

    /// `OS/2.fsType == 2` (restricted license, embedding forbidden).
    #[error("font license forbids embedding (OS/2.fsType == 2)")]
    LicenseRestricted,

    /// A `name` table record could not be decoded to non-empty UTF-8.
    #[error("could not decode name record to UTF-8: {0}")]
    EncodingDecode(String),

    /// A required table was absent from the sfnt directory.
    #[error("required table `{0}` missing from font")]
    MissingTable(&'static str),
}

/// Errors raised loading a persisted font definition.
#[derive(Debug, thiserror::Error)]
pub enum DefError {
    /// JSON definition lacked a `type` or `cw` field.
    #[error("font definition missing required field `{0}`")]
    BadFormat(&'static str),

    /// `type` was not one of `Core | TrueType | TrueTypeUnicode | Type1 | cidfont0`.
    #[error("unknown font type `{0}`")]
    UnknownType(String),

    /// `type == cidfont0` under `pdfa = true`.
    #[error("CID Type 0 fonts are not permitted under PDF/A")]
    CidOnPdfa,

    /// Reading the definition JSON or the referenced font file failed.
    #[error("could not read `{path}`: {source}")]
    NotReadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the font registry and stack.
#[derive(Debug, thiserror::Error)]
pub enum RegError {
    /// Lookup of a key absent from the registry.
    #[error("no font registered under key `{0}`")]
    MissingFont(String),

    /// `register()` called with an empty family name.
    #[error("font family must not be empty")]
    EmptyFamily,
}

/// Errors raised while emitting PDF objects.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// The `FontType` tag had no emitter match arm. The internal dispatch in
    /// `emitter` is an exhaustive match over `FontType` and can't actually hit
    /// this path; the variant exists because callers that hand the engine a
    /// definition loaded from untyped JSON (`DefError::UnknownType` already
    /// rejects bad `type` strings before a `FontEntry` exists) still need a
    /// typed failure mode to report upstream.
    #[error("no emitter for font type {0:?}")]
    UnsupportedType(crate::model::FontType),

    /// Compressing or decompressing an embedded stream failed.
    #[error("stream compression failed: {0}")]
    Compress(#[from] std::io::Error),
}

/// Errors raised by the subsetter.
#[derive(Debug, thiserror::Error)]
pub enum SubsetError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// gzip/gunzip of the embedded stream failed during subsetting.
    #[error("subset (de)compression failed: {0}")]
    Compress(#[from] std::io::Error),

    /// A glyph reachable from the subset closure had no valid `loca` entry.
    #[error("glyph {0} has no valid loca range")]
    InvalidGlyphRange(u32),
}

impl fmt::Display for crate::model::FontType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
