//! Identity codec
//!
//! Each level is written as an order-preserving prefix varint of its key,
//! and the id ends with a zero byte:
//!
//! ```text
//! first byte     bytes  keys
//! 0x00           1      end of id
//! 0x01..=0x7F    1      0 .. 127
//! 0x80..=0xBF    2      next 2^14
//! 0xC0..=0xDF    3      next 2^21
//! 0xE0..=0xEF    4      next 2^28
//! 0xF0..=0xF7    5      next 2^35
//! ```
//!
//! Classes cover increasing key ranges and payloads are big-endian, so
//! comparing two encodings byte by byte gives document order without
//! decoding. A shorter id's terminator sorts before any level byte, which
//! puts ancestors first.

use std::cmp::Ordering;
use std::io::{self, Read, Write};
use std::num::NonZeroUsize;

use lru::LruCache;

use super::error::{NodeIdError, Result};
use super::level::Level;
use super::node_id::NodeId;

const TERMINATOR: u8 = 0x00;

const BASE_2: u64 = 0x7F;
const BASE_3: u64 = BASE_2 + (1 << 14);
const BASE_4: u64 = BASE_3 + (1 << 21);
const BASE_5: u64 = BASE_4 + (1 << 28);

/// Encoded width of one level key
#[inline]
pub(crate) const fn key_width(key: u64) -> usize {
    if key < BASE_2 {
        1
    } else if key < BASE_3 {
        2
    } else if key < BASE_4 {
        3
    } else if key < BASE_5 {
        4
    } else {
        5
    }
}

/// Encode one key into `out`, returning the number of bytes used.
/// `out` must hold at least five bytes.
#[inline]
fn encode_key(key: u64, out: &mut [u8; 5]) -> usize {
    if key < BASE_2 {
        out[0] = key as u8 + 1;
        1
    } else if key < BASE_3 {
        let p = key - BASE_2;
        out[0] = 0x80 | (p >> 8) as u8;
        out[1] = p as u8;
        2
    } else if key < BASE_4 {
        let p = key - BASE_3;
        out[0] = 0xC0 | (p >> 16) as u8;
        out[1] = (p >> 8) as u8;
        out[2] = p as u8;
        3
    } else if key < BASE_5 {
        let p = key - BASE_4;
        out[0] = 0xE0 | (p >> 24) as u8;
        out[1] = (p >> 16) as u8;
        out[2] = (p >> 8) as u8;
        out[3] = p as u8;
        4
    } else {
        let p = key - BASE_5;
        out[0] = 0xF0 | (p >> 32) as u8;
        out[1] = (p >> 24) as u8;
        out[2] = (p >> 16) as u8;
        out[3] = (p >> 8) as u8;
        out[4] = p as u8;
        5
    }
}

/// Width and payload bits carried by a first byte.
/// `None` for the terminator and for invalid tags.
#[inline]
const fn tag_class(first: u8) -> Option<(usize, u64, u64)> {
    match first {
        0x01..=0x7F => Some((1, (first - 1) as u64, 0)),
        0x80..=0xBF => Some((2, (first & 0x3F) as u64, BASE_2)),
        0xC0..=0xDF => Some((3, (first & 0x1F) as u64, BASE_3)),
        0xE0..=0xEF => Some((4, (first & 0x0F) as u64, BASE_4)),
        0xF0..=0xF7 => Some((5, (first & 0x07) as u64, BASE_5)),
        _ => None,
    }
}

/// Incremental level decoder shared by the slice and stream readers
struct LevelReader {
    levels: Vec<Level>,
    offset: usize,
}

impl LevelReader {
    fn new() -> Self {
        LevelReader {
            levels: Vec::new(),
            offset: 0,
        }
    }

    /// Feed one complete level (first byte plus continuation bytes)
    fn push(&mut self, first: u8, rest: &[u8]) -> Result<()> {
        let (width, high, base) = tag_class(first)
            .ok_or_else(|| NodeIdError::corrupt(self.offset, "invalid level tag"))?;
        debug_assert_eq!(rest.len(), width - 1);
        let payload = rest.iter().fold(high, |acc, &b| (acc << 8) | b as u64);
        let level = Level::from_key(payload + base)
            .ok_or_else(|| NodeIdError::corrupt(self.offset, "label wider than 32 bits"))?;
        if !level.is_valid() {
            return Err(NodeIdError::corrupt(self.offset, "odd label without inserted flag"));
        }
        let after_end = self.levels.first().is_some_and(Level::is_end_of_document);
        if after_end || (level.is_end_of_document() && !self.levels.is_empty()) {
            return Err(NodeIdError::corrupt(self.offset, "end-of-document level inside an id"));
        }
        self.levels.push(level);
        self.offset += width;
        Ok(())
    }

    /// Terminator reached
    fn finish(self) -> Result<(NodeId, usize)> {
        if self.levels.last().is_some_and(Level::is_synthetic) {
            return Err(NodeIdError::corrupt(self.offset, "id ends in a synthetic level"));
        }
        Ok((NodeId::from_levels_unchecked(self.levels), self.offset + 1))
    }
}

impl NodeId {
    /// Exact number of bytes `serialize` and `write_to` produce
    pub fn size(&self) -> usize {
        self.levels()
            .iter()
            .map(|l| key_width(l.key()))
            .sum::<usize>()
            + 1
    }

    /// Number of addressing units: one per level, synthetic levels included
    #[inline]
    pub fn units(&self) -> usize {
        self.levels().len()
    }

    /// Write the id into `data` starting at `offset`.
    ///
    /// Touches exactly `size()` bytes and returns that count.
    pub fn serialize(&self, data: &mut [u8], offset: usize) -> Result<usize> {
        let needed = self.size();
        let available = data.len().saturating_sub(offset);
        if needed > available {
            return Err(NodeIdError::BufferTooSmall { needed, available });
        }
        let mut pos = offset;
        let mut buf = [0u8; 5];
        for level in self.levels() {
            let n = encode_key(level.key(), &mut buf);
            data[pos..pos + n].copy_from_slice(&buf[..n]);
            pos += n;
        }
        data[pos] = TERMINATOR;
        Ok(needed)
    }

    /// Append the id to a byte sink; same bytes as `serialize`
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        let mut buf = [0u8; 5];
        for level in self.levels() {
            let n = encode_key(level.key(), &mut buf);
            out.write_all(&buf[..n])?;
        }
        out.write_all(&[TERMINATOR])
    }

    /// Encode into a fresh buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        let mut buf = [0u8; 5];
        for level in self.levels() {
            let n = encode_key(level.key(), &mut buf);
            out.extend_from_slice(&buf[..n]);
        }
        out.push(TERMINATOR);
        out
    }

    /// Decode one id from the start of `data`.
    ///
    /// Returns the id and the number of bytes it occupied; trailing bytes
    /// are left alone so packed streams can be walked.
    pub fn decode(data: &[u8]) -> Result<(NodeId, usize)> {
        let mut reader = LevelReader::new();
        loop {
            let pos = reader.offset;
            let first = *data
                .get(pos)
                .ok_or_else(|| NodeIdError::corrupt(pos, "missing terminator"))?;
            if first == TERMINATOR {
                return reader.finish();
            }
            let width = tag_class(first).map_or(1, |(w, _, _)| w);
            let rest = data
                .get(pos + 1..pos + width)
                .ok_or_else(|| NodeIdError::corrupt(pos, "truncated level"))?;
            reader.push(first, rest)?;
        }
    }

    /// Decode an id that must occupy all of `data`
    pub fn from_bytes(data: &[u8]) -> Result<NodeId> {
        let (id, used) = Self::decode(data)?;
        if used != data.len() {
            return Err(NodeIdError::corrupt(used, "trailing bytes after id"));
        }
        Ok(id)
    }

    /// Decode an id at `offset` inside a larger buffer
    pub fn deserialize(data: &[u8], offset: usize) -> Result<(NodeId, usize)> {
        let tail = data
            .get(offset..)
            .ok_or_else(|| NodeIdError::corrupt(0, "offset past end of buffer"))?;
        Self::decode(tail)
    }

    /// Read one id from a byte stream
    pub fn read_from<R: Read + ?Sized>(input: &mut R) -> Result<NodeId> {
        let mut reader = LevelReader::new();
        let mut first = [0u8; 1];
        let mut rest = [0u8; 4];
        loop {
            let pos = reader.offset;
            read_exact_or_corrupt(input, &mut first, pos)?;
            if first[0] == TERMINATOR {
                return reader.finish().map(|(id, _)| id);
            }
            let width = tag_class(first[0]).map_or(1, |(w, _, _)| w);
            read_exact_or_corrupt(input, &mut rest[..width - 1], pos)?;
            reader.push(first[0], &rest[..width - 1])?;
        }
    }
}

fn read_exact_or_corrupt<R: Read + ?Sized>(input: &mut R, buf: &mut [u8], pos: usize) -> Result<()> {
    input.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => NodeIdError::corrupt(pos, "truncated level"),
        _ => NodeIdError::Io(e),
    })
}

/// Length in bytes of the id at the start of `data`, without building it.
///
/// Only the level tags are checked; use `NodeId::decode` for full
/// validation.
pub fn encoded_len(data: &[u8]) -> Result<usize> {
    let mut pos = 0;
    loop {
        let first = *data
            .get(pos)
            .ok_or_else(|| NodeIdError::corrupt(pos, "missing terminator"))?;
        if first == TERMINATOR {
            return Ok(pos + 1);
        }
        let (width, _, _) =
            tag_class(first).ok_or_else(|| NodeIdError::corrupt(pos, "invalid level tag"))?;
        if pos + width > data.len() {
            return Err(NodeIdError::corrupt(pos, "truncated level"));
        }
        pos += width;
    }
}

/// Compare two encoded ids in document order without decoding
#[inline]
pub fn compare_encoded(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Iterator over ids packed back to back in one buffer
#[derive(Debug, Clone)]
pub struct PackedIds<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> PackedIds<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        PackedIds {
            data,
            pos: 0,
            failed: false,
        }
    }

    /// Byte offset of the next id
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for PackedIds<'_> {
    type Item = Result<NodeId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }
        match NodeId::decode(&self.data[self.pos..]) {
            Ok((id, used)) => {
                self.pos += used;
                Some(Ok(id))
            }
            Err(NodeIdError::CorruptIdentity { offset, reason }) => {
                self.failed = true;
                Some(Err(NodeIdError::CorruptIdentity {
                    offset: self.pos + offset,
                    reason,
                }))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// LRU cache of decoded ids keyed by their encoding
pub struct DecodeCache {
    cache: LruCache<Box<[u8]>, NodeId>,
    hits: u64,
    misses: u64,
}

impl DecodeCache {
    /// Default number of cached ids
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Create a cache holding up to `capacity` ids (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        DecodeCache {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Decode `data` (one complete id), reusing a cached result when present
    pub fn decode(&mut self, data: &[u8]) -> Result<NodeId> {
        if let Some(id) = self.cache.get(data) {
            self.hits += 1;
            return Ok(id.clone());
        }
        self.misses += 1;
        let id = NodeId::from_bytes(data)?;
        self.cache.put(data.into(), id.clone());
        Ok(id)
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for DecodeCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
