//! Mutation algorithm - deriving new ids without renumbering
//!
//! Fresh nodes take even, original labels (2, 4, 6, ...). Everything between
//! two existing siblings is claimed with the inserted flag:
//!
//! - an inserted terminal (odd label) when one fits in the gap, or
//! - a synthetic level (even label, inserted flag) followed by
//!   `SEED_LABEL`, which opens an unbounded sub-range inside the gap.
//!
//! A gap is only ever split so that both halves keep a synthetic key or a
//! synthetic neighbour. That keeps every future insertion possible; the
//! only hard failure is running out of 32-bit labels.

use std::cmp::Ordering;

use super::error::{NodeIdError, Result};
use super::level::{
    key_is_synthetic, Level, LevelKind, FIRST_LABEL, LABEL_STEP, MAX_KEY, MAX_LABEL, SEED_LABEL,
};
use super::node_id::NodeId;

const SYNTHETIC: u64 = 1;
const TERMINAL: u64 = 3;

/// Extra distance charged to a synthetic candidate when compactness matters
const SYNTHETIC_PENALTY: u64 = 4;

/// Where in a gap to place the new key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bias {
    /// Middle of the gap, terminals preferred
    Middle,
    /// Just above the lower bound, terminals preferred
    Low,
    /// Directly below the upper bound, whatever kind is nearest
    High,
}

/// One side of a gap at a single level position
#[derive(Debug, Clone, Copy)]
struct Bound {
    key: u64,
    synthetic: bool,
}

impl From<&Level> for Bound {
    fn from(level: &Level) -> Self {
        Bound {
            key: level.key(),
            synthetic: level.is_synthetic(),
        }
    }
}

/// Smallest key `>= from` with the given residue mod 4
#[inline]
fn residue_at_or_above(from: u64, residue: u64) -> u64 {
    from + (residue + 4 - from % 4) % 4
}

/// Largest key `<= from` with the given residue mod 4
#[inline]
fn residue_at_or_below(from: u64, residue: u64) -> Option<u64> {
    from.checked_sub((from % 4 + 4 - residue) % 4)
}

/// Is there a synthetic key strictly between `lo` and `hi`?
#[inline]
fn synthetic_between(lo: Option<u64>, hi: u64) -> bool {
    let from = lo.map_or(0, |k| k + 1);
    residue_at_or_above(from, SYNTHETIC) < hi
}

/// Can a terminal at `key` be placed without sealing either side?
///
/// Two terminals with no synthetic key between them leave that half of the
/// gap closed for good: nothing can be inserted there later. Between the
/// originals 2 and 4 this rules out 3, so that gap gets a synthetic level
/// and the seed terminal instead.
fn terminal_is_safe(key: u64, lo: Option<Bound>, hi: Option<Bound>) -> bool {
    let left = match lo {
        Some(b) => b.synthetic || synthetic_between(Some(b.key), key),
        None => synthetic_between(None, key),
    };
    let right = match hi {
        Some(b) => b.synthetic || synthetic_between(Some(key), b.key),
        None => synthetic_between(Some(key), MAX_KEY + 1),
    };
    left && right
}

/// Pick an inserted key strictly between `lo` and `hi`
fn pick(lo: Option<Bound>, hi: Option<Bound>, bias: Bias) -> Option<u64> {
    let start = lo.map_or(0, |b| b.key + 1);
    let end = hi.map_or(MAX_KEY + 1, |b| b.key);
    if start >= end {
        return None;
    }
    let target = match bias {
        Bias::Middle => start + (end - 1 - start) / 2,
        Bias::Low => start,
        Bias::High => end - 1,
    };

    let mut best: Option<(u64, u64)> = None;
    for residue in [TERMINAL, SYNTHETIC] {
        let up = residue_at_or_above(target, residue);
        let down = residue_at_or_below(target, residue);
        let candidates = [
            Some(up),
            up.checked_add(4),
            down,
            down.and_then(|k| k.checked_sub(4)),
        ];
        for key in candidates.into_iter().flatten() {
            if key < start || key >= end {
                continue;
            }
            let synthetic = key_is_synthetic(key);
            if !synthetic && !terminal_is_safe(key, lo, hi) {
                continue;
            }
            let penalty = if synthetic && bias != Bias::High {
                SYNTHETIC_PENALTY
            } else {
                0
            };
            let score = key.abs_diff(target) + penalty;
            // terminals are tried first, so ties keep the shorter id
            if best.is_none_or(|(s, _)| score < s) {
                best = Some((score, key));
            }
        }
    }
    best.map(|(_, key)| key)
}

/// Append the level for `key`, plus the seed terminal after a synthetic one
#[inline]
fn push_inserted(levels: &mut Vec<Level>, key: u64) {
    let level = Level::inserted((key >> 1) as u32);
    levels.push(level);
    if level.is_synthetic() {
        levels.push(Level::inserted(SEED_LABEL));
    }
}

/// Build a step strictly between two steps of the same parent.
///
/// A missing side is unbounded. `tree_level` is only used for error
/// reporting.
fn between(
    lo: Option<&[Level]>,
    hi: Option<&[Level]>,
    bias: Bias,
    tree_level: usize,
) -> Result<Vec<Level>> {
    let at = match (lo, hi) {
        (Some(a), Some(b)) => a.iter().zip(b).take_while(|(x, y)| x == y).count(),
        _ => 0,
    };
    let lo_level = lo.map(|a| a.get(at).ok_or(NodeIdError::NotSiblings)).transpose()?;
    let hi_level = hi.map(|b| b.get(at).ok_or(NodeIdError::NotSiblings)).transpose()?;
    if let (Some(l), Some(h)) = (lo_level, hi_level) {
        if l >= h {
            return Err(NodeIdError::NotSiblings);
        }
    }

    let prefix = lo.or(hi).map_or(&[][..], |s| &s[..at]);
    let mut levels = prefix.to_vec();

    if let Some(key) = pick(lo_level.map(Bound::from), hi_level.map(Bound::from), bias) {
        push_inserted(&mut levels, key);
        return Ok(levels);
    }

    // No room at this position: continue inside a synthetic neighbour
    match (lo, lo_level, hi, hi_level) {
        (Some(a), Some(l), _, _) if l.is_synthetic() => {
            levels.push(*l);
            levels.extend(between(Some(&a[at + 1..]), None, Bias::Low, tree_level)?);
            Ok(levels)
        }
        (_, _, Some(b), Some(h)) if h.is_synthetic() => {
            levels.push(*h);
            levels.extend(between(None, Some(&b[at + 1..]), Bias::Middle, tree_level)?);
            Ok(levels)
        }
        _ => Err(NodeIdError::overflow(tree_level)),
    }
}

impl NodeId {
    /// Split off the final level, refusing both sentinels
    fn split_for_sibling(&self) -> Result<(&Level, &[Level])> {
        if self.is_end_of_document() {
            return Err(NodeIdError::EndOfDocument);
        }
        self.levels().split_last().ok_or(NodeIdError::DocumentNode)
    }

    /// Id for the first child of this node
    pub fn new_child(&self) -> Result<NodeId> {
        if self.is_end_of_document() {
            return Err(NodeIdError::EndOfDocument);
        }
        let mut levels = Vec::with_capacity(self.levels().len() + 1);
        levels.extend_from_slice(self.levels());
        levels.push(Level::original(FIRST_LABEL));
        Ok(NodeId::from_levels_unchecked(levels))
    }

    /// Id for the sibling directly after this node.
    ///
    /// Originals, and inserted nodes below a synthetic level, add
    /// `LABEL_STEP` to the final label. An inserted terminal heading its
    /// step may sit right below an original, so it gets a synthetic level
    /// one key up plus the seed terminal. Assumes nothing has been inserted
    /// after this node yet.
    pub fn next_sibling(&self) -> Result<NodeId> {
        let (last, head) = self.split_for_sibling()?;
        let overflow = || NodeIdError::overflow(self.tree_level());
        let mut levels = head.to_vec();
        if last.inserted && self.last_step().len() == 1 {
            let label = last
                .label
                .checked_add(1)
                .filter(|&label| label <= MAX_LABEL)
                .ok_or_else(overflow)?;
            push_inserted(&mut levels, Level::inserted(label).key());
        } else {
            let label = last
                .label
                .checked_add(LABEL_STEP)
                .filter(|&label| Level { label, ..*last }.key() <= MAX_KEY)
                .ok_or_else(overflow)?;
            levels.push(Level { label, ..*last });
        }
        Ok(NodeId::from_levels_unchecked(levels))
    }

    /// Id directly before this node.
    ///
    /// Below a synthetic level only inserted keys exist, so an inserted node
    /// there steps down by `LABEL_STEP`, mirroring `next_sibling`. Anywhere
    /// else it takes the nearest free key below the final level. Either way
    /// the sibling slot below this node must be unclaimed; use `insert_node`
    /// when both neighbours are known.
    pub fn insert_before(&self) -> Result<NodeId> {
        let (last, head) = self.split_for_sibling()?;
        let mut levels = head.to_vec();
        let step_down = match last.kind() {
            Some(LevelKind::Inserted) if self.last_step().len() > 1 => {
                last.label.checked_sub(LABEL_STEP).filter(|&label| label > 0)
            }
            _ => None,
        };
        match step_down {
            Some(label) => levels.push(Level::inserted(label)),
            None => {
                let key = pick(None, Some(Bound::from(last)), Bias::High)
                    .ok_or_else(|| NodeIdError::overflow(self.tree_level()))?;
                push_inserted(&mut levels, key);
            }
        }
        Ok(NodeId::from_levels_unchecked(levels))
    }

    /// Id strictly between this node and `right`, its following sibling.
    ///
    /// Nothing may currently sit between the two.
    pub fn insert_node(&self, right: &NodeId) -> Result<NodeId> {
        if self.is_document_node() || right.is_document_node() {
            return Err(NodeIdError::DocumentNode);
        }
        if self.is_end_of_document() || right.is_end_of_document() {
            return Err(NodeIdError::EndOfDocument);
        }
        if self.is_sibling_of(right) != Some(Ordering::Less) {
            return Err(NodeIdError::NotSiblings);
        }
        let parent_len = self.parent_len();
        let step = between(
            Some(self.last_step()),
            Some(right.last_step()),
            Bias::Middle,
            self.tree_level(),
        )?;
        let mut levels = Vec::with_capacity(parent_len + step.len());
        levels.extend_from_slice(&self.levels()[..parent_len]);
        levels.extend(step);
        Ok(NodeId::from_levels_unchecked(levels))
    }
}
