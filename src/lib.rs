//! Numbering - hierarchical node ids for a native XML store
//!
//! Layers:
//! numbering: NodeId, byte codec, order/relationship engine, insertion
//! join:      node sets, XPath axes and structural joins over ids
//! NIFs:      the `Elixir.Numbering.Native` boundary below
//!
//! Ids cross the NIF boundary as encoded binaries. Their byte order is
//! document order, so the BEAM side may compare them directly.

use rustler::{Binary, Encoder, Env, NifResult, ResourceArc, Term};

pub mod join;
pub mod numbering;
mod resource;
mod term;

use join::{Axis, NodeSet};
use numbering::{compare_encoded, encoded_len, NodeId};
use resource::{DecoderRef, DecoderResource, NodeSetRef, NodeSetResource};
use term::{
    bytes_to_binary, error_to_term, id_result_to_term, id_to_term, ids_to_term, levels_to_term,
    ordering_to_term, relation_to_term, sibling_order_to_term,
};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    /// Counts live bytes on top of the underlying allocator
    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                PEAK_ALLOCATED.fetch_max(current, Ordering::Relaxed);
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Memory Tracking NIFs
// ============================================================================

/// (current, peak) bytes allocated by this library
#[cfg(feature = "memory_tracking")]
fn memory_stats() -> (usize, usize) {
    use std::sync::atomic::Ordering;
    (
        tracking::ALLOCATED.load(Ordering::SeqCst),
        tracking::PEAK_ALLOCATED.load(Ordering::SeqCst),
    )
}

#[cfg(not(feature = "memory_tracking"))]
fn memory_stats() -> (usize, usize) {
    (0, 0)
}

#[rustler::nif]
fn get_rust_memory() -> usize {
    memory_stats().0
}

#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    memory_stats().1
}

/// Reset the peak to the current figure; returns the stats before reset
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    #[cfg(feature = "memory_tracking")]
    {
        use std::sync::atomic::Ordering;
        let current = tracking::ALLOCATED.load(Ordering::SeqCst);
        let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
        (current, peak)
    }
    #[cfg(not(feature = "memory_tracking"))]
    {
        (0, 0)
    }
}

// ============================================================================
// Argument Decoding
// ============================================================================

/// Decode an id argument; corrupt bytes raise `ArgumentError`
fn decode_arg(bytes: &Binary) -> NifResult<NodeId> {
    NodeId::from_bytes(bytes.as_slice()).map_err(|err| {
        tracing::debug!(%err, len = bytes.len(), "bad node id argument");
        rustler::Error::BadArg
    })
}

// ============================================================================
// Sentinels
// ============================================================================

#[rustler::nif]
fn document_node<'a>(env: Env<'a>) -> Term<'a> {
    id_to_term(env, &NodeId::DOCUMENT_NODE)
}

#[rustler::nif]
fn end_of_document<'a>(env: Env<'a>) -> Term<'a> {
    id_to_term(env, &NodeId::end_of_document())
}

// ============================================================================
// Mutation (returns {:ok, id} or {:error, reason})
// ============================================================================

#[rustler::nif]
fn new_child<'a>(env: Env<'a>, id: Binary<'a>) -> Term<'a> {
    let result = NodeId::from_bytes(id.as_slice()).and_then(|parent| parent.new_child());
    id_result_to_term(env, result)
}

#[rustler::nif]
fn next_sibling<'a>(env: Env<'a>, id: Binary<'a>) -> Term<'a> {
    let result = NodeId::from_bytes(id.as_slice()).and_then(|id| id.next_sibling());
    id_result_to_term(env, result)
}

#[rustler::nif]
fn insert_before<'a>(env: Env<'a>, id: Binary<'a>) -> Term<'a> {
    let result = NodeId::from_bytes(id.as_slice()).and_then(|id| id.insert_before());
    id_result_to_term(env, result)
}

/// Id strictly between two adjacent siblings
#[rustler::nif]
fn insert_node<'a>(env: Env<'a>, left: Binary<'a>, right: Binary<'a>) -> Term<'a> {
    let result = NodeId::from_bytes(left.as_slice()).and_then(|left| {
        let right = NodeId::from_bytes(right.as_slice())?;
        left.insert_node(&right)
    });
    id_result_to_term(env, result)
}

// ============================================================================
// Order and Relationships
// ============================================================================

/// Parent id, `nil` for the document node
#[rustler::nif]
fn parent<'a>(env: Env<'a>, id: Binary<'a>) -> NifResult<Term<'a>> {
    let id = decode_arg(&id)?;
    Ok(match id.parent_id() {
        Some(parent) => id_to_term(env, &parent),
        None => rustler::types::atom::nil().encode(env),
    })
}

#[rustler::nif]
fn tree_level<'a>(id: Binary<'a>) -> NifResult<usize> {
    Ok(decode_arg(&id)?.tree_level())
}

/// Document order of two ids (`:lt`, `:eq`, `:gt`)
#[rustler::nif]
fn compare<'a>(env: Env<'a>, a: Binary<'a>, b: Binary<'a>) -> NifResult<Term<'a>> {
    encoded_len(a.as_slice()).map_err(|_| rustler::Error::BadArg)?;
    encoded_len(b.as_slice()).map_err(|_| rustler::Error::BadArg)?;
    Ok(ordering_to_term(env, compare_encoded(a.as_slice(), b.as_slice())))
}

/// How `node` relates to `ancestor`: `:child`, `:descendant`, `:self` or `nil`
#[rustler::nif]
fn relation<'a>(env: Env<'a>, node: Binary<'a>, ancestor: Binary<'a>) -> NifResult<Term<'a>> {
    let node = decode_arg(&node)?;
    let ancestor = decode_arg(&ancestor)?;
    Ok(relation_to_term(env, node.compute_relation(&ancestor)))
}

/// `:before` / `:after` when both ids share a parent, else `nil`
#[rustler::nif]
fn sibling_order<'a>(env: Env<'a>, a: Binary<'a>, b: Binary<'a>) -> NifResult<Term<'a>> {
    let a = decode_arg(&a)?;
    let b = decode_arg(&b)?;
    Ok(sibling_order_to_term(env, a.is_sibling_of(&b)))
}

// ============================================================================
// Text Form
// ============================================================================

#[rustler::nif(name = "to_string")]
fn id_to_string<'a>(id: Binary<'a>) -> NifResult<String> {
    Ok(decode_arg(&id)?.to_string())
}

#[rustler::nif(name = "from_string")]
fn id_from_string<'a>(env: Env<'a>, text: &str) -> Term<'a> {
    id_result_to_term(env, text.parse::<NodeId>())
}

/// Levels as `[{label, inserted}]`
#[rustler::nif]
fn levels<'a>(env: Env<'a>, id: Binary<'a>) -> NifResult<Term<'a>> {
    let id = decode_arg(&id)?;
    Ok(levels_to_term(env, &id))
}

// ============================================================================
// Bulk Operations
// ============================================================================

/// Sort encoded ids into document order
/// Runs on a dirty scheduler; sorting uses Rayon
#[rustler::nif(schedule = "DirtyCpu")]
fn sort<'a>(env: Env<'a>, ids: Vec<Binary<'a>>) -> NifResult<Term<'a>> {
    let mut owned = Vec::with_capacity(ids.len());
    for id in &ids {
        let bytes = id.as_slice();
        match encoded_len(bytes) {
            Ok(len) if len == bytes.len() => owned.push(bytes.to_vec()),
            _ => {
                tracing::debug!(len = bytes.len(), "bad node id in sort input");
                return Err(rustler::Error::BadArg);
            }
        }
    }
    join::par_sort_encoded(&mut owned);

    let mut list = Term::list_new_empty(env);
    for bytes in owned.iter().rev() {
        list = list.list_prepend(bytes_to_binary(env, bytes));
    }
    Ok(list)
}

/// Build a node set resource from encoded ids in any order
#[rustler::nif(schedule = "DirtyCpu")]
fn node_set_new<'a>(env: Env<'a>, ids: Vec<Binary<'a>>) -> Term<'a> {
    let slices: Vec<&[u8]> = ids.iter().map(|b| b.as_slice()).collect();
    match join::par_decode(&slices) {
        Ok(decoded) => {
            let set = NodeSet::from_unsorted(decoded);
            tracing::trace!(len = set.len(), "node set built");
            let arc = ResourceArc::new(NodeSetResource::new(set));
            (term::ok(), arc).encode(env)
        }
        Err(err) => error_to_term(env, &err),
    }
}

#[rustler::nif]
fn node_set_size(set: NodeSetRef) -> usize {
    set.len()
}

/// Members of the set on `axis` from `context`, in document order
#[rustler::nif]
fn node_set_axis<'a>(
    env: Env<'a>,
    set: NodeSetRef,
    context: Binary<'a>,
    axis: &str,
) -> NifResult<Term<'a>> {
    let context = decode_arg(&context)?;
    let axis = Axis::from_name(axis).ok_or(rustler::Error::BadArg)?;
    let selected = join::select(&set.set, &context, axis);
    Ok(ids_to_term(env, &selected))
}

// ============================================================================
// Decode Cache
// ============================================================================

#[rustler::nif]
fn decoder_new(capacity: usize) -> DecoderRef {
    ResourceArc::new(DecoderResource::new(capacity))
}

/// Tree level of an id, decoded through the cache
#[rustler::nif]
fn decoder_tree_level<'a>(
    env: Env<'a>,
    decoder: DecoderRef,
    id: Binary<'a>,
) -> NifResult<Term<'a>> {
    let decoded = decoder
        .with_cache(|cache| cache.decode(id.as_slice()))
        .map_err(rustler::Error::RaiseAtom)?;
    Ok(match decoded {
        Ok(id) => (term::ok(), id.tree_level()).encode(env),
        Err(err) => error_to_term(env, &err),
    })
}

/// Cache (hits, misses)
#[rustler::nif]
fn decoder_stats(decoder: DecoderRef) -> NifResult<(u64, u64)> {
    decoder
        .with_cache(|cache| cache.stats())
        .map_err(rustler::Error::RaiseAtom)
}

// ============================================================================
// NIF Initialization
// ============================================================================

// Resources register themselves through `#[rustler::resource_impl]`
rustler::init!("Elixir.Numbering.Native");
