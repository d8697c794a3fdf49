//! ABOUTME: LIFO font/size/spacing/stretching stack, with a derived-metrics cache
//! ABOUTME: Owns text measurement: width lookup, soft-hyphen zeroing, and the missing-glyph substitution rule

use crate::model::FontEntry;
use std::collections::HashMap;

/// A pushed frame. `None` on `size`/`spacing`/`stretching` means "inherit the
/// value currently on top of the stack" (or the documented default if the
/// stack is empty: 10pt, 0 extra spacing, 100% stretching).
#[derive(Debug, Clone)]
pub struct PushSpec {
    /// One registry key, or several separated by commas — the first that's
    /// already registered wins. Lets a caller express a preference order
    /// ("CustomSans,Helvetica") without having to probe the registry itself.
    pub key: String,
    pub size: Option<f64>,
    pub spacing: Option<f64>,
    pub stretching: Option<f64>,
}

/// A resolved frame: every field inherited and filled in at push time.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frame {
    size: u32,
    spacing: u32,
    stretching: u32,
}

/// Metrics derived once per distinct `(key, size, spacing, stretching)`
/// combination and reused for every subsequent width query against the same
/// frame, since the scaling arithmetic is identical every time.
#[derive(Debug, Clone)]
struct DerivedMetrics {
    /// `size / 1000`, the factor that turns a 1000-unit glyph-space width
    /// into a text-space one.
    cratio: f64,
    /// `cratio * stretching`, folding horizontal scaling into one factor.
    wratio: f64,
    /// The literal `BT /F<i> <size> Tf ET\r` command for this frame, cached
    /// alongside the scaling factors since both are keyed by the same
    /// `(key, size, spacing, stretching)` tuple.
    tf_command: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    key_hash: u64,
    size: u32,
    spacing: u32,
    stretching: u32,
}

const DEFAULT_SIZE_MILLIPT: u32 = 10_000;
/// Same fixed-point scale as size/spacing (`to_fixed(v, 1000.0)`): `1000`
/// decodes back to a stretching ratio of `1.0`, i.e. no stretching.
const DEFAULT_STRETCHING_MILLI: u32 = 1000;

fn to_fixed(v: f64, scale: f64) -> u32 {
    (v * scale).round() as u32
}

/// Code point 0xAD (soft hyphen), which measures as zero width regardless of
/// the font's own metrics — it's invisible unless it falls at a line break.
const SOFT_HYPHEN: u32 = 0xAD;

#[derive(Debug)]
pub struct FontStack<'a> {
    registry: &'a crate::registry::FontRegistry,
    frames: Vec<(String, Frame)>,
    cache: HashMap<CacheKey, DerivedMetrics>,
    next_i: usize,
    assigned_i: HashMap<String, usize>,
}

impl<'a> FontStack<'a> {
    pub fn new(registry: &'a crate::registry::FontRegistry) -> Self {
        FontStack {
            registry,
            frames: Vec::new(),
            cache: HashMap::new(),
            next_i: 1,
            assigned_i: HashMap::new(),
        }
    }

    fn top(&self) -> Frame {
        self.frames.last().map(|(_, f)| *f).unwrap_or(Frame {
            size: DEFAULT_SIZE_MILLIPT,
            spacing: 0,
            stretching: DEFAULT_STRETCHING_MILLI,
        })
    }

    /// Pushes a new frame, resolving any inherited fields from the current
    /// top of stack (or the documented defaults on an empty stack), and
    /// assigns the font its stack-local `/F<i>` index the first time it's
    /// referenced. `spec.key` may list several candidate keys separated by
    /// commas; the first one already present in the registry is used, so a
    /// caller can push a fallback chain without checking registration itself.
    pub fn push(&mut self, spec: PushSpec) -> Result<(), crate::error::RegError> {
        let key = spec
            .key
            .split(',')
            .map(str::trim)
            .find(|candidate| self.registry.get(candidate).is_some())
            .ok_or_else(|| crate::error::RegError::MissingFont(spec.key.clone()))?
            .to_string();
        let base = self.top();
        let frame = Frame {
            size: spec.size.map(|v| to_fixed(v, 1000.0)).unwrap_or(base.size),
            spacing: spec.spacing.map(|v| to_fixed(v, 1000.0)).unwrap_or(base.spacing),
            stretching: spec
                .stretching
                .map(|v| to_fixed(v, 1000.0))
                .unwrap_or(base.stretching),
        };
        self.assigned_i.entry(key.clone()).or_insert_with(|| {
            let i = self.next_i;
            self.next_i += 1;
            i
        });
        self.frames.push((key, frame));
        Ok(())
    }

    pub fn pop(&mut self) -> Option<()> {
        self.frames.pop().map(|_| ())
    }

    pub fn current_key(&self) -> Option<&str> {
        self.frames.last().map(|(k, _)| k.as_str())
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_key().and_then(|k| self.assigned_i.get(k).copied())
    }

    pub fn current_font(&self) -> Option<&FontEntry> {
        self.current_key().and_then(|k| self.registry.get(k))
    }

    fn derived(&mut self) -> DerivedMetrics {
        let frame = self.top();
        let key_hash = self.current_key().map(hash_str).unwrap_or(0);
        let index = self.current_index();
        let cache_key = CacheKey {
            key_hash,
            size: frame.size,
            spacing: frame.spacing,
            stretching: frame.stretching,
        };
        self.cache
            .entry(cache_key)
            .or_insert_with(|| {
                let size = frame.size as f64 / 1000.0;
                let stretching = frame.stretching as f64 / 1000.0;
                let cratio = size / 1000.0;
                let tf_command = match index {
                    Some(i) => format!("BT /F{i} {size} Tf ET\r"),
                    None => String::new(),
                };
                DerivedMetrics {
                    cratio,
                    wratio: cratio * stretching,
                    tf_command,
                }
            })
            .clone()
    }

    /// The literal `BT /F<i> <size> Tf ET\r` operator sequence for the
    /// current frame, cached alongside the scaling factors. `None` on an
    /// empty stack.
    pub fn current_tf_command(&mut self) -> Option<String> {
        if self.frames.is_empty() {
            return None;
        }
        let cmd = self.derived().tf_command;
        if cmd.is_empty() {
            None
        } else {
            Some(cmd)
        }
    }

    /// Width in text-space units of one character code in the current frame,
    /// honoring the soft-hyphen-is-zero-width rule. Panics (via `expect`) if
    /// called with an empty stack — callers push a frame before measuring.
    pub fn char_width(&mut self, code: u32) -> f64 {
        if code == SOFT_HYPHEN {
            return 0.0;
        }
        let glyph_width = self
            .current_font()
            .map(|f| f.width_of(code))
            .unwrap_or(0) as f64;
        let metrics = self.derived();
        glyph_width * metrics.wratio
    }

    /// Total width of a run of text: sum of per-character widths, plus
    /// inter-character spacing (scaled by the frame's stretching ratio)
    /// distributed across `n_chars - 1` gaps.
    pub fn string_width(&mut self, codes: &[u32]) -> f64 {
        let glyphs: f64 = codes.iter().map(|&c| self.char_width(c)).sum();
        let char_gaps = codes.len().saturating_sub(1) as f64;
        glyphs + self.spacing_term(char_gaps)
    }

    /// Width contributed by word spacing alone, distributed across
    /// `n_spaces - 1` gaps — the separate "space-only width" measurement
    /// used to adjust word spacing without re-walking the whole string.
    pub fn space_only_width(&self, n_spaces: usize) -> f64 {
        let gaps = n_spaces.saturating_sub(1) as f64;
        self.spacing_term(gaps)
    }

    fn spacing_term(&self, gaps: f64) -> f64 {
        let frame = self.top();
        let spacing = frame.spacing as f64 / 1000.0;
        let stretching = frame.stretching as f64 / 1000.0;
        spacing * stretching * gaps
    }

    /// missing-character substitution: if `code` has no entry in the
    /// current font's width table, fall back to the `replacement` code
    /// (typically `'?'`) so a later text-rendering pass always has a glyph to
    /// place, instead of silently losing the grapheme.
    pub fn resolve_renderable(&self, code: u32, replacement: u32) -> u32 {
        match self.current_font() {
            Some(f) if f.widths.contains_key(&code) => code,
            Some(_) => replacement,
            None => code,
        }
    }
}

fn hash_str(s: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut h = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut h);
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FontStyle;
    use crate::registry::FontRegistry;

    fn sample_registry() -> FontRegistry {
        let mut reg = FontRegistry::new(0);
        let json = r#"{"type":"Type1","cw":{"32":278,"65":667,"173":900}}"#;
        reg.register("Helvetica", FontStyle::default(), json, false, false).unwrap();
        reg
    }

    #[test]
    fn defaults_to_10pt_when_nothing_pushed_yet() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec { key: "helvetica".into(), size: None, spacing: None, stretching: None })
            .unwrap();
        // 'A' (667/1000 units) at 10pt with no stretching = 6.67
        let w = stack.char_width(65);
        assert!((w - 6.67).abs() < 1e-6);
    }

    #[test]
    fn nested_push_inherits_size_when_not_specified() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec { key: "helvetica".into(), size: Some(20.0), spacing: None, stretching: None })
            .unwrap();
        stack
            .push(PushSpec { key: "helvetica".into(), size: None, spacing: None, stretching: None })
            .unwrap();
        let w = stack.char_width(65);
        assert!((w - 13.34).abs() < 1e-6);
    }

    #[test]
    fn pop_restores_previous_frame() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec { key: "helvetica".into(), size: Some(20.0), spacing: None, stretching: None })
            .unwrap();
        stack
            .push(PushSpec { key: "helvetica".into(), size: Some(5.0), spacing: None, stretching: None })
            .unwrap();
        stack.pop();
        let w = stack.char_width(65);
        assert!((w - 13.34).abs() < 1e-6);
    }

    #[test]
    fn soft_hyphen_has_zero_width_regardless_of_metrics() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec { key: "helvetica".into(), size: Some(10.0), spacing: None, stretching: None })
            .unwrap();
        assert_eq!(stack.char_width(0xAD), 0.0);
    }

    #[test]
    fn missing_glyph_resolves_to_replacement() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec { key: "helvetica".into(), size: None, spacing: None, stretching: None })
            .unwrap();
        assert_eq!(stack.resolve_renderable(200, b'?' as u32), b'?' as u32);
        assert_eq!(stack.resolve_renderable(65, b'?' as u32), 65);
    }

    #[test]
    fn push_assigns_stable_stack_local_index() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec { key: "helvetica".into(), size: None, spacing: None, stretching: None })
            .unwrap();
        let first = stack.current_index();
        stack.pop();
        stack
            .push(PushSpec { key: "helvetica".into(), size: None, spacing: None, stretching: None })
            .unwrap();
        assert_eq!(first, stack.current_index());
    }

    #[test]
    fn push_falls_back_through_comma_separated_keys() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec {
                key: "missingfont, helvetica".into(),
                size: None,
                spacing: None,
                stretching: None,
            })
            .unwrap();
        assert_eq!(stack.current_key(), Some("helvetica"));
    }

    #[test]
    fn tf_command_reflects_current_index_and_size() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec { key: "helvetica".into(), size: Some(12.0), spacing: None, stretching: None })
            .unwrap();
        assert_eq!(stack.current_tf_command().as_deref(), Some("BT /F1 12 Tf ET\r"));
    }

    #[test]
    fn push_rejects_unregistered_key() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        let err = stack
            .push(PushSpec { key: "nope".into(), size: None, spacing: None, stretching: None })
            .unwrap_err();
        assert!(matches!(err, crate::error::RegError::MissingFont(_)));
    }

    #[test]
    fn string_width_distributes_spacing_over_char_gaps() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec { key: "helvetica".into(), size: Some(10.0), spacing: Some(1.0), stretching: None })
            .unwrap();
        // two 'A's: glyph widths 6.67 + 6.67, one char gap.
        let w = stack.string_width(&[65, 65]);
        assert!((w - (6.67 + 6.67 + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn string_width_scales_spacing_by_stretching() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec {
                key: "helvetica".into(),
                size: Some(10.0),
                spacing: Some(1.0),
                stretching: Some(2.0),
            })
            .unwrap();
        // stretching doubles both the glyph widths (13.34 each) and the
        // char-gap spacing term (1.0 * 2.0 = 2.0).
        let w = stack.string_width(&[65, 65]);
        assert!((w - (13.34 + 13.34 + 2.0)).abs() < 1e-6);
    }

    #[test]
    fn space_only_width_uses_n_spaces_minus_one_gaps() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec { key: "helvetica".into(), size: Some(10.0), spacing: Some(1.0), stretching: None })
            .unwrap();
        assert_eq!(stack.space_only_width(0), 0.0);
        assert_eq!(stack.space_only_width(1), 0.0);
        assert_eq!(stack.space_only_width(3), 2.0);
    }

    #[test]
    fn default_stretching_yields_unscaled_char_width() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec { key: "helvetica".into(), size: None, spacing: None, stretching: None })
            .unwrap();
        // 'A' (667/1000 units) at the default 10pt with default (1.0) stretching.
        let w = stack.char_width(65);
        assert!((w - 6.67).abs() < 1e-6);
    }

    #[test]
    fn explicit_stretching_scales_char_width() {
        let reg = sample_registry();
        let mut stack = FontStack::new(&reg);
        stack
            .push(PushSpec { key: "helvetica".into(), size: Some(10.0), spacing: None, stretching: Some(2.0) })
            .unwrap();
        let w = stack.char_width(65);
        assert!((w - 13.34).abs() < 1e-6);
    }
}
