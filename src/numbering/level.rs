//! Level - one segment of a node id
//!
//! A level is a label plus an origin flag. Levels are compared by label
//! first, then by flag (original before inserted), which is exactly the
//! derived ordering of the struct fields.
//!
//! The pair packs into a single integer *key*: `label << 1 | inserted`.
//! Keys sort the same way levels do, and the low two bits classify a level:
//!
//! ```text
//! key % 4 == 0   original    even label, fresh node         terminal
//! key % 4 == 3   inserted    odd label, placed in a gap     terminal
//! key % 4 == 1   synthetic   even label, inserted flag      continues the step
//! key % 4 == 2   invalid     odd label without the flag
//! ```

/// Label of the first child under any parent.
pub const FIRST_LABEL: u32 = 2;

/// Distance between consecutive original siblings. Odd labels in between
/// stay free for insertions.
pub const LABEL_STEP: u32 = 2;

/// Terminal label placed under a freshly opened synthetic level.
///
/// Sits in the middle of the one-byte key range so insertions on either
/// side stay cheap.
pub const SEED_LABEL: u32 = 31;

/// Largest label the mutation algorithm will ever issue.
///
/// `u32::MAX` is reserved for the end-of-document sentinel.
pub const MAX_LABEL: u32 = u32::MAX - 1;

/// Largest key a real node may carry.
pub(crate) const MAX_KEY: u64 = ((MAX_LABEL as u64) << 1) | 1;

/// Largest key the codec accepts (the end-of-document sentinel).
pub(crate) const SENTINEL_KEY: u64 = ((u32::MAX as u64) << 1) | 1;

/// Classification of a level by its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    /// Assigned at node creation (`new_child` / `next_sibling`)
    Original,
    /// Assigned by an insertion into a gap between siblings
    Inserted,
    /// Extra level opened when a gap had no free label; belongs to the
    /// same tree step as the level that follows it
    Synthetic,
}

/// One segment of a node id.
///
/// Size: 8 bytes (label: 4 bytes, flag: 1 byte, padding)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level {
    /// Position among the siblings of one parent
    pub label: u32,
    /// Origin flag: `false` for original, `true` for inserted/synthetic
    pub inserted: bool,
}

impl Level {
    /// Create an original level
    #[inline]
    pub const fn original(label: u32) -> Self {
        Self { label, inserted: false }
    }

    /// Create a level carrying the inserted flag.
    ///
    /// Odd labels give an inserted terminal, even labels a synthetic level.
    #[inline]
    pub const fn inserted(label: u32) -> Self {
        Self { label, inserted: true }
    }

    /// Packed key: label shifted left, flag in the low bit
    #[inline]
    pub const fn key(&self) -> u64 {
        ((self.label as u64) << 1) | self.inserted as u64
    }

    /// Rebuild a level from its key.
    ///
    /// Returns `None` when the label would not fit in `u32`.
    #[inline]
    pub const fn from_key(key: u64) -> Option<Self> {
        if key > SENTINEL_KEY {
            return None;
        }
        Some(Self {
            label: (key >> 1) as u32,
            inserted: key & 1 == 1,
        })
    }

    /// Classify this level. `None` for the invalid odd-original form.
    #[inline]
    pub const fn kind(&self) -> Option<LevelKind> {
        match (self.inserted, self.label & 1 == 1) {
            (false, false) => Some(LevelKind::Original),
            (true, true) => Some(LevelKind::Inserted),
            (true, false) => Some(LevelKind::Synthetic),
            (false, true) => None,
        }
    }

    /// Check if this level closes a tree step
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        self.label & 1 == 1 || !self.inserted
    }

    /// Check if this level is a synthetic continuation
    #[inline]
    pub const fn is_synthetic(&self) -> bool {
        self.inserted && self.label & 1 == 0
    }

    /// Check if the label/flag combination can occur in a node id
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.kind().is_some()
    }

    /// The end-of-document level; only valid as the sole level of an id
    #[inline]
    pub const fn is_end_of_document(&self) -> bool {
        self.inserted && self.label == u32::MAX
    }
}

/// Classify a bare key (see the module docs)
#[inline]
pub(crate) const fn key_is_synthetic(key: u64) -> bool {
    key & 3 == 1
}
