//! ABOUTME: Width-array emission: flat /Widths for simple fonts, compacted /W ranges for CID fonts
//! ABOUTME: The compaction algorithm groups contiguous CIDs, then merges adjacent range segments

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// Flat `/Widths [w w w ...]` array for a simple (8-bit) font: every code
/// from `first_char` to `last_char` inclusive, falling back to `dw` for any
/// code absent from `cw`.
pub fn simple_widths_array(
    cw: &BTreeMap<u32, u32>,
    dw: u32,
    subsetchars: Option<&BTreeSet<u32>>,
) -> Option<(u32, u32, String)> {
    let codes: Vec<u32> = cw
        .keys()
        .copied()
        .filter(|c| subsetchars.map(|s| s.contains(c)).unwrap_or(true))
        .collect();
    let first = *codes.iter().min()?;
    let last = *codes.iter().max()?;
    let mut out = String::from("[");
    for code in first..=last {
        if code > first {
            out.push(' ');
        }
        let w = cw.get(&code).copied().unwrap_or(dw);
        let _ = write!(out, "{w}");
    }
    out.push(']');
    Some((first, last, out))
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Interval { first: u32, last: u32, width: u32 },
    Range { first: u32, widths: Vec<u32> },
}

impl Segment {
    fn first(&self) -> u32 {
        match self {
            Segment::Interval { first, .. } => *first,
            Segment::Range { first, .. } => *first,
        }
    }
    fn last(&self) -> u32 {
        match self {
            Segment::Interval { last, .. } => *last,
            Segment::Range { first, widths } => first + widths.len() as u32 - 1,
        }
    }
}

/// width-range compaction: group sorted `(cid, width)` pairs into
/// maximal contiguous-CID runs, each becoming an `Interval` segment (all
/// widths equal) or a `Range` segment (mixed widths), then run the adjacency
/// merge pass before formatting as a `/W [...]` array.
pub fn compact_cid_widths(
    cw: &BTreeMap<u32, u32>,
    dw: u32,
    subsetchars: Option<&BTreeSet<u32>>,
) -> String {
    let entries: Vec<(u32, u32)> = cw
        .iter()
        .filter(|(cid, &w)| {
            w != dw && subsetchars.map(|s| s.contains(cid)).unwrap_or(true)
        })
        .map(|(&cid, &w)| (cid, w))
        .collect();

    let mut runs: Vec<Vec<(u32, u32)>> = Vec::new();
    for (cid, width) in entries {
        match runs.last_mut() {
            Some(run) if run.last().unwrap().0 + 1 == cid => run.push((cid, width)),
            _ => runs.push(vec![(cid, width)]),
        }
    }

    let mut segments: Vec<Segment> = runs
        .into_iter()
        .map(|run| {
            let first = run[0].0;
            let uniform = run.iter().all(|&(_, w)| w == run[0].1);
            if uniform {
                Segment::Interval {
                    first,
                    last: run.last().unwrap().0,
                    width: run[0].1,
                }
            } else {
                Segment::Range {
                    first,
                    widths: run.into_iter().map(|(_, w)| w).collect(),
                }
            }
        })
        .collect();

    merge_adjacent(&mut segments);
    format_segments(&segments)
}

/// Post-pass: fold a segment into its predecessor when they're CID-adjacent,
/// the predecessor is a `Range` (never an `Interval` — those stay compact on
/// purpose), and the successor is either itself a `Range` or a short
/// (< 4-wide) `Interval` not worth keeping separate.
fn merge_adjacent(segments: &mut Vec<Segment>) {
    let mut i = 1;
    while i < segments.len() {
        let prev_is_range = matches!(segments[i - 1], Segment::Range { .. });
        let adjacent = segments[i].first() == segments[i - 1].last() + 1;
        let current_short_interval = match &segments[i] {
            Segment::Interval { first, last, .. } => last - first + 1 < 4,
            Segment::Range { .. } => true,
        };
        if adjacent && prev_is_range && current_short_interval {
            let expanded: Vec<u32> = match &segments[i] {
                Segment::Interval { first, last, width } => {
                    (0..=(last - first)).map(|_| *width).collect()
                }
                Segment::Range { widths, .. } => widths.clone(),
            };
            if let Segment::Range { widths, .. } = &mut segments[i - 1] {
                widths.extend(expanded);
            }
            segments.remove(i);
        } else {
            i += 1;
        }
    }
}

fn format_segments(segments: &[Segment]) -> String {
    let mut out = String::from("/W [");
    for (idx, seg) in segments.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        match seg {
            Segment::Interval { first, last, width } => {
                let _ = write!(out, "{first} {last} {width}");
            }
            Segment::Range { first, widths } => {
                let _ = write!(out, "{first} [");
                for (j, w) in widths.iter().enumerate() {
                    if j > 0 {
                        out.push(' ');
                    }
                    let _ = write!(out, "{w}");
                }
                out.push(']');
            }
        }
    }
    out.push(']');
    out
}
