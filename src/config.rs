//! ABOUTME: The engine's enumerated configuration, one plain struct
//! ABOUTME: No config-file crate: font-toolkit's own modules favor Default-impl structs over env/file loaders

use std::path::PathBuf;

/// Configuration shared by the registry, stack, and emitter. Built once per
/// document and threaded through every call that needs a mode flag, rather
/// than each component reading ambient global state.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Subset embedded TrueType/CidFont0 programs to the characters actually
    /// used. Default `false`: most callers embed the full program once and
    /// reuse it across documents.
    pub subset: bool,
    /// Prefer Unicode (Identity-H, CID-keyed) embeddings over simple 8-bit
    /// ones when a font offers both.
    pub unicode: bool,
    /// PDF/A mode: rejects `CidFont0` (external CID references aren't
    /// PDF/A-embeddable) and forces Core-font prefixing.
    pub pdfa: bool,
    /// FlateDecode the embedded font program and CMap/CIDToGIDMap streams.
    pub compress: bool,
    /// `cmap` subtable selector; Windows Unicode BMP is `(3, 1)`.
    pub platform_id: u16,
    pub encoding_id: u16,
    /// Symlink the original font file instead of embedding it. Only sound
    /// for local testing/preview workflows; incompatible with PDF/A and with
    /// any document that must travel without its font directory alongside it.
    pub linked: bool,
    /// Directories searched, in order, for a font-definition JSON or a
    /// font-file referenced by one. Searching itself is the caller's
    /// concern; this field exists so configuration is carried
    /// as one value instead of a separate parameter at every call site.
    pub search_dirs: Vec<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            subset: false,
            unicode: true,
            pdfa: false,
            compress: true,
            platform_id: 3,
            encoding_id: 1,
            linked: false,
            search_dirs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EngineConfig::default();
        assert!(!cfg.subset);
        assert!(cfg.unicode);
        assert!(!cfg.pdfa);
        assert!(cfg.compress);
        assert_eq!(cfg.platform_id, 3);
        assert_eq!(cfg.encoding_id, 1);
        assert!(!cfg.linked);
        assert!(cfg.search_dirs.is_empty());
    }
}
