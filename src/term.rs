//! Elixir Term Conversion Utilities
//!
//! Node ids cross the boundary as their encoded binaries, which Elixir can
//! compare and store as-is. Everything else becomes atoms, integers or
//! tuples.

use std::cmp::Ordering;

use rustler::types::atom::Atom;
use rustler::{Encoder, Env, NewBinary, Term};

use crate::numbering::{NodeId, NodeIdError, Relation, Result};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    lt,
    eq,
    gt,
    child,
    descendant,
    self_node = "self",
    before,
    after,
}

/// Create a binary from bytes
pub fn bytes_to_binary<'a>(env: Env<'a>, bytes: &[u8]) -> Term<'a> {
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

/// Encoded id as a binary term
#[inline]
pub fn id_to_term<'a>(env: Env<'a>, id: &NodeId) -> Term<'a> {
    bytes_to_binary(env, &id.to_bytes())
}

/// List of encoded ids, order preserved
pub fn ids_to_term<'a>(env: Env<'a>, ids: &[NodeId]) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for id in ids.iter().rev() {
        list = list.list_prepend(id_to_term(env, id));
    }
    list
}

/// `{:error, reason}` with the error's reason atom
pub fn error_to_term<'a>(env: Env<'a>, err: &NodeIdError) -> Term<'a> {
    let reason = Atom::from_str(env, err.reason()).unwrap_or_else(|_| error());
    (error(), reason).encode(env)
}

/// `{:ok, id}` or `{:error, reason}`
pub fn id_result_to_term<'a>(env: Env<'a>, result: Result<NodeId>) -> Term<'a> {
    match result {
        Ok(id) => (ok(), id_to_term(env, &id)).encode(env),
        Err(err) => error_to_term(env, &err),
    }
}

/// `:lt`, `:eq` or `:gt`
pub fn ordering_to_term<'a>(env: Env<'a>, ordering: Ordering) -> Term<'a> {
    match ordering {
        Ordering::Less => lt(),
        Ordering::Equal => eq(),
        Ordering::Greater => gt(),
    }
    .encode(env)
}

/// `:before` / `:after` for siblings, `nil` otherwise
pub fn sibling_order_to_term<'a>(env: Env<'a>, order: Option<Ordering>) -> Term<'a> {
    match order {
        Some(Ordering::Less) => before().encode(env),
        Some(Ordering::Greater) => after().encode(env),
        _ => rustler::types::atom::nil().encode(env),
    }
}

/// `:child`, `:descendant`, `:self` or `nil`
pub fn relation_to_term<'a>(env: Env<'a>, relation: Option<Relation>) -> Term<'a> {
    match relation {
        Some(Relation::Child) => child().encode(env),
        Some(Relation::Descendant) => descendant().encode(env),
        Some(Relation::SelfNode) => self_node().encode(env),
        None => rustler::types::atom::nil().encode(env),
    }
}

/// Levels as a list of `{label, inserted}` tuples
pub fn levels_to_term<'a>(env: Env<'a>, id: &NodeId) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for level in id.levels().iter().rev() {
        list = list.list_prepend((level.label, level.inserted).encode(env));
    }
    list
}
