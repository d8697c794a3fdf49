//! Font embedding engine for PDF generation.
//!
//! Parses AFM/PFB/TrueType font sources into a normalized [`model::FontEntry`],
//! pools and keys them in a [`registry::FontRegistry`], measures text against
//! them through a [`stack::FontStack`], and emits the resulting PDF indirect
//! objects — font dictionaries, descriptors, encoding differences, embedded
//! font files (optionally subset via [`subsetter`] down to the glyphs
//! actually used), CIDToGIDMap and ToUnicode streams — through [`emitter`].
//!
//! # Architecture
//!
//! ## `reader`
//! Bounds-checked big-endian byte cursor shared by the AFM and TrueType
//! parsers.
//!
//! ## `afm` / `type1`
//! Decode Adobe Font Metrics text and PFB binaries respectively.
//!
//! ## `truetype`
//! Decodes an sfnt font's tables (`head`, `hhea`, `hmtx`, `maxp`, `post`,
//! `OS/2`, `name`, `loca`, `glyf`, `cmap`) into one normalized record.
//!
//! ## `subsetter`
//! Reduces an embedded TrueType program to the glyphs reachable from a set of
//! used character codes, rewriting `glyf`/`loca` and recomputing checksums.
//!
//! ## `definition`
//! Loads a persisted JSON font definition into a [`model::FontEntry`].
//!
//! ## `registry`
//! Keys and pools `FontEntry` values; owns the PDF object-number counter and
//! the encoding-differences pool.
//!
//! ## `stack`
//! LIFO font/size/spacing/stretching stack with a derived-metrics cache, used
//! to measure text against the currently selected font.
//!
//! ## `emitter`
//! Serializes every registered font's PDF objects in three ordered phases:
//! encoding diffs, then font files, then font dictionaries.
//!
//! ## `encrypt`
//! The boundary trait through which an embedded stream is handed off to the
//! document's own encryption, if any.
//!
//! ## `config`
//! `EngineConfig`, the plain struct threading subset/unicode/pdfa/compress and
//! the cmap platform/encoding selector through the engine.

pub mod afm;
pub mod config;
pub mod definition;
pub mod emitter;
pub mod encrypt;
pub mod error;
pub mod model;
pub mod reader;
pub mod registry;
pub mod stack;
pub mod subsetter;
pub mod truetype;
pub mod type1;

pub use config::EngineConfig;
pub use emitter::{emit_fonts, FontFileSource};
pub use encrypt::{Encrypt, NoEncrypt};
pub use model::{CidInfo, Decoration, FontDescriptor, FontEntry, FontStyle, FontType};
pub use registry::FontRegistry;
pub use stack::{FontStack, PushSpec};
