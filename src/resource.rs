//! ResourceArc Wrappers
//!
//! Node sets and decode caches that live across NIF calls.

use std::sync::Mutex;

use rustler::ResourceArc;

use crate::join::NodeSet;
use crate::numbering::DecodeCache;

/// Sorted node set held on the Rust side, so axis queries do not
/// re-decode and re-sort the ids on every call
pub struct NodeSetResource {
    pub set: NodeSet,
}

impl NodeSetResource {
    pub fn new(set: NodeSet) -> Self {
        NodeSetResource { set }
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }
}

#[rustler::resource_impl]
impl rustler::Resource for NodeSetResource {}

/// Type alias for node set ResourceArc
pub type NodeSetRef = ResourceArc<NodeSetResource>;

/// Wrapper for DecodeCache that can be stored in a ResourceArc
pub struct DecoderResource {
    pub inner: Mutex<DecodeCache>,
}

impl DecoderResource {
    pub fn new(capacity: usize) -> Self {
        DecoderResource {
            inner: Mutex::new(DecodeCache::new(capacity)),
        }
    }

    /// Run `f` with the cache locked.
    ///
    /// # Errors
    ///
    /// Returns `"mutex_poisoned"` if a previous caller panicked while
    /// holding the cache.
    pub fn with_cache<F, R>(&self, f: F) -> Result<R, &'static str>
    where
        F: FnOnce(&mut DecodeCache) -> R,
    {
        let mut guard = self.inner.lock().map_err(|_| "mutex_poisoned")?;
        Ok(f(&mut guard))
    }
}

#[rustler::resource_impl]
impl rustler::Resource for DecoderResource {}

impl Default for DecoderResource {
    fn default() -> Self {
        Self::new(DecodeCache::DEFAULT_CAPACITY)
    }
}

/// Type alias for decoder ResourceArc
pub type DecoderRef = ResourceArc<DecoderResource>;
