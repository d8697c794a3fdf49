//! ABOUTME: Keyed FontEntry pool: key derivation, dedup-on-insert, object number allocation
//! ABOUTME: The encoding-difference pool also lives here; file-path pooling is resolved at emission

use crate::definition;
use crate::error::{DefError, RegError};
use crate::model::{FontEntry, FontStyle};
use std::collections::BTreeMap;

/// Keyed pool of `FontEntry`, plus the encoding-differences pool and
/// the monotonic PDF object-number counter every registration draws from.
#[derive(Debug, Default)]
pub struct FontRegistry {
    by_key: BTreeMap<String, FontEntry>,
    /// Insertion order of keys, since `by_key` (a `BTreeMap`) iterates
    /// lexically; emission order should match registration order so object
    /// numbers come out the way callers expect.
    order: Vec<String>,
    /// Distinct non-empty `diff` strings, in first-seen order. `diff_n` is
    /// the 1-based index into this pool.
    diff_pool: Vec<String>,
    object_number: u32,
}

impl FontRegistry {
    pub fn new(starting_object_number: u32) -> Self {
        FontRegistry {
            by_key: BTreeMap::new(),
            order: Vec::new(),
            diff_pool: Vec::new(),
            object_number: starting_object_number,
        }
    }

    pub fn object_number(&self) -> u32 {
        self.object_number
    }

    /// Draws the next PDF object number from the shared counter. Used both
    /// internally by `register()` and externally by the emitter, so object
    /// numbers stay strictly increasing and contiguous across registration
    /// and emission.
    pub fn alloc_object_number(&mut self) -> u32 {
        self.object_number += 1;
        self.object_number
    }

    /// key derivation: strip a trailing `B`/`I` off `family` into
    /// `style` (repeatedly — `HelveticaBI` strips `I` then `B`), then
    /// special-case `symbol`/`zapfdingbats` to force an empty style
    /// regardless of what the caller passed in.
    fn normalize(family: &str, mut style: FontStyle) -> (String, FontStyle) {
        let mut stripped = family.to_string();
        loop {
            if let Some(rest) = stripped.strip_suffix('I') {
                style.italic = true;
                stripped = rest.to_string();
            } else if let Some(rest) = stripped.strip_suffix('B') {
                style.bold = true;
                stripped = rest.to_string();
            } else {
                break;
            }
        }
        let lower = stripped.to_lowercase();
        if lower == "symbol" || lower == "zapfdingbats" {
            style = FontStyle::default();
        }
        (stripped, style)
    }

    /// Registers a font from its already-loaded definition JSON. `key`
    /// existing already returns that entry unchanged (dedup-on-insert); a
    /// fresh entry draws the next object number immediately.
    pub fn register(
        &mut self,
        family: &str,
        style: FontStyle,
        json: &str,
        pdfa: bool,
        fakestyle: bool,
    ) -> Result<&FontEntry, RegError> {
        if family.trim().is_empty() {
            return Err(RegError::EmptyFamily);
        }
        let (norm_family, norm_style) = Self::normalize(family, style);
        let key_suffix = norm_style.key_suffix();
        let key = format!("{}{}", norm_family.to_lowercase(), key_suffix);

        if !self.by_key.contains_key(&key) {
            let mut entry = definition::load(json, &norm_family, norm_style, pdfa, fakestyle)
                .map_err(RegError::from_def)?;
            entry.n = Some(self.alloc_object_number());
            self.order.push(key.clone());
            self.by_key.insert(key.clone(), entry);
        }
        Ok(self.by_key.get(&key).expect("just inserted or already present"))
    }

    pub fn get(&self, key: &str) -> Option<&FontEntry> {
        self.by_key.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FontEntry> {
        self.by_key.get_mut(key)
    }

    pub fn require(&self, key: &str) -> Result<&FontEntry, RegError> {
        self.get(key).ok_or_else(|| RegError::MissingFont(key.to_string()))
    }

    /// Iterates registered fonts in registration order, the order emission
    /// walks them in.
    pub fn iter_in_order(&self) -> impl Iterator<Item = &FontEntry> {
        self.order.iter().filter_map(move |k| self.by_key.get(k))
    }

    pub fn iter_keys_in_order(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// EncDiffPool: return the 1-based pool index for `diff`, inserting
    /// it if this is the first time it's been seen. Equal `diff` strings
    /// always resolve to the same index.
    pub fn pool_diff(&mut self, diff: &str) -> u32 {
        if let Some(pos) = self.diff_pool.iter().position(|d| d == diff) {
            return (pos + 1) as u32;
        }
        self.diff_pool.push(diff.to_string());
        self.diff_pool.len() as u32
    }

    pub fn diff_pool(&self) -> &[String] {
        &self.diff_pool
    }
}

impl RegError {
    fn from_def(e: DefError) -> RegError {
        match e {
            // A registry caller only ever surfaces registry-shaped errors;
            // definition-loader errors that aren't about the key itself
            // (bad JSON, unknown type, PDF/A) propagate as MissingFont with
            // the underlying message so they aren't silently swallowed.
            other => RegError::MissingFont(other.to_string()),
        }
    }
}
