//! Numbering Module - hierarchical node identity
//!
//! Every stored node carries a `NodeId`: the path of levels from the
//! document node down to it. From two ids alone we can tell
//!
//! - which comes first in document order,
//! - whether one is an ancestor, parent or sibling of the other,
//! - and derive a new id between two siblings without renumbering either.
//!
//! ## Layout
//!
//! ```text
//! level.rs     Level (label + origin flag), key arithmetic
//! node_id.rs   NodeId, sentinels, order and relationship queries
//! insert.rs    new_child / next_sibling / insert_before / insert_node
//! codec.rs     byte encoding, packed streams, decode cache
//! text.rs      dotted text form ("2.2/31.4")
//! cursor.rs    per-parent child allocation
//! ```
//!
//! All operations are pure: ids are immutable values, safe to share across
//! threads. Serializing label allocation under one parent is the caller's
//! job.

pub mod codec;
pub mod cursor;
pub mod error;
pub mod insert;
pub mod level;
pub mod node_id;
pub mod text;

pub use codec::{compare_encoded, encoded_len, DecodeCache, PackedIds};
pub use cursor::ChildCursor;
pub use error::{NodeIdError, Result};
pub use level::{Level, LevelKind, FIRST_LABEL, LABEL_STEP, MAX_LABEL, SEED_LABEL};
pub use node_id::{relation_code, Ancestors, NodeId, Relation, NO_RELATION};
