//! Node identity and the order/relationship engine
//!
//! A `NodeId` is the path of levels from the document node down to a node.
//! Document order is the lexicographic order of those paths, so every
//! relationship question is answered from two ids alone:
//!
//! ```text
//! (document)                 []
//! ├── 2                      [2]
//! │   ├── 2.2                [2, 2]
//! │   └── 2.4                [2, 4]
//! ├── 2/31   (inserted)      [2+, 31+]   synthetic 2+ opens a gap after 2
//! └── 4                      [4]
//! ```

use std::cmp::Ordering;

use super::error::{NodeIdError, Result};
use super::level::Level;

/// Relationship of a node to a potential ancestor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Direct child
    Child = 1,
    /// Descendant deeper than one step
    Descendant = 2,
    /// Same node
    SelfNode = 3,
}

/// Numeric code for "no ancestor-descendant relation"
pub const NO_RELATION: i32 = -1;

impl Relation {
    /// Numeric code (1 = child, 2 = descendant, 3 = self)
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Numeric form of an optional relation, `NO_RELATION` for `None`
#[inline]
pub fn relation_code(relation: Option<Relation>) -> i32 {
    relation.map_or(NO_RELATION, Relation::code)
}

/// Identity of a stored node, stable for the node's lifetime.
///
/// Immutable: every mutation in `insert` returns a new id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodeId {
    levels: Vec<Level>,
}

impl NodeId {
    /// The document node: no levels, sorts before every other node
    pub const DOCUMENT_NODE: NodeId = NodeId { levels: Vec::new() };

    /// Sentinel that sorts after every node the mutation algorithm can issue
    pub fn end_of_document() -> NodeId {
        NodeId {
            levels: vec![Level::inserted(u32::MAX)],
        }
    }

    /// Build an id from raw levels, checking that they form whole steps
    pub fn from_levels(levels: Vec<Level>) -> Result<Self> {
        let mut offset = 0;
        for level in &levels {
            if !level.is_valid() {
                return Err(NodeIdError::corrupt(offset, "odd label without inserted flag"));
            }
            if level.is_end_of_document() && levels.len() > 1 {
                return Err(NodeIdError::corrupt(offset, "end-of-document level inside an id"));
            }
            offset += super::codec::key_width(level.key());
        }
        if levels.last().is_some_and(Level::is_synthetic) {
            return Err(NodeIdError::corrupt(offset, "id ends in a synthetic level"));
        }
        Ok(NodeId { levels })
    }

    #[inline]
    pub(crate) fn from_levels_unchecked(levels: Vec<Level>) -> Self {
        debug_assert!(levels.last().is_none_or(Level::is_terminal));
        NodeId { levels }
    }

    /// All levels, synthetic ones included
    #[inline]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Check if this is the document node
    #[inline]
    pub fn is_document_node(&self) -> bool {
        self.levels.is_empty()
    }

    /// Check if this is the end-of-document sentinel
    #[inline]
    pub fn is_end_of_document(&self) -> bool {
        matches!(self.levels.as_slice(), [only] if only.is_end_of_document())
    }

    /// Depth below the document node (document node = 0)
    pub fn tree_level(&self) -> usize {
        self.levels.iter().filter(|l| l.is_terminal()).count()
    }

    /// Number of levels of the parent's id
    pub(crate) fn parent_len(&self) -> usize {
        match self.levels.split_last() {
            None => 0,
            Some((_, head)) => head
                .iter()
                .rposition(Level::is_terminal)
                .map_or(0, |i| i + 1),
        }
    }

    /// Levels of the final step: synthetic levels plus the terminal one
    #[inline]
    pub(crate) fn last_step(&self) -> &[Level] {
        &self.levels[self.parent_len()..]
    }

    /// Parent id; `DOCUMENT_NODE` for top-level nodes, `None` for the
    /// document node itself
    pub fn parent_id(&self) -> Option<NodeId> {
        if self.is_document_node() {
            return None;
        }
        Some(NodeId {
            levels: self.levels[..self.parent_len()].to_vec(),
        })
    }

    /// Iterate over ancestors, nearest first, ending with the document node
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: self.parent_id(),
        }
    }

    /// Returns true if `ancestor`'s levels are a strict prefix of ours
    #[inline]
    pub fn is_descendant_of(&self, ancestor: &NodeId) -> bool {
        self.levels.len() > ancestor.levels.len() && self.levels.starts_with(&ancestor.levels)
    }

    /// Returns true for descendants and for the node itself
    #[inline]
    pub fn is_descendant_or_self_of(&self, ancestor: &NodeId) -> bool {
        self.levels.starts_with(&ancestor.levels)
    }

    #[inline]
    pub fn is_ancestor_of(&self, descendant: &NodeId) -> bool {
        descendant.is_descendant_of(self)
    }

    /// Returns true if we are exactly one step below `parent`
    #[inline]
    pub fn is_child_of(&self, parent: &NodeId) -> bool {
        self.is_descendant_of(parent) && self.parent_len() == parent.levels.len()
    }

    /// Relationship of this node to a potential ancestor.
    ///
    /// Equality is checked first, so a node is never reported as its own
    /// descendant.
    pub fn compute_relation(&self, ancestor: &NodeId) -> Option<Relation> {
        if self.levels == ancestor.levels {
            Some(Relation::SelfNode)
        } else if self.is_child_of(ancestor) {
            Some(Relation::Child)
        } else if self.is_descendant_of(ancestor) {
            Some(Relation::Descendant)
        } else {
            None
        }
    }

    /// Order against a node that shares our parent.
    ///
    /// `Some(Greater)` means we follow `sibling`. `None` when the nodes have
    /// different parents, are equal, or one of them is the document node.
    pub fn is_sibling_of(&self, sibling: &NodeId) -> Option<Ordering> {
        if self.is_document_node() || sibling.is_document_node() {
            return None;
        }
        let parent_len = self.parent_len();
        if sibling.parent_len() != parent_len
            || self.levels[..parent_len] != sibling.levels[..parent_len]
        {
            return None;
        }
        match self.last_step().cmp(sibling.last_step()) {
            Ordering::Equal => None,
            ord => Some(ord),
        }
    }

    /// Returns true if we come after `other` in document order.
    ///
    /// With `is_following` set this evaluates `following::`, which excludes
    /// descendants of `other`.
    #[inline]
    pub fn after(&self, other: &NodeId, is_following: bool) -> bool {
        if is_following && self.is_descendant_of(other) {
            return false;
        }
        self > other
    }

    /// Returns true if we come before `other` in document order.
    ///
    /// With `is_preceding` set this evaluates `preceding::`, which excludes
    /// ancestors of `other`.
    #[inline]
    pub fn before(&self, other: &NodeId, is_preceding: bool) -> bool {
        if is_preceding && other.is_descendant_of(self) {
            return false;
        }
        self < other
    }
}

/// Iterator over the ancestors of a node id
#[derive(Debug, Clone)]
pub struct Ancestors {
    next: Option<NodeId>,
}

impl Iterator for Ancestors {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next.take()?;
        self.next = current.parent_id();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(levels: &[Level]) -> NodeId {
        NodeId::from_levels(levels.to_vec()).unwrap()
    }

    fn o(label: u32) -> Level {
        Level::original(label)
    }

    fn i(label: u32) -> Level {
        Level::inserted(label)
    }

    #[test]
    fn test_document_node() {
        let doc = NodeId::DOCUMENT_NODE;
        assert!(doc.is_document_node());
        assert_eq!(doc.tree_level(), 0);
        assert_eq!(doc.parent_id(), None);
        assert!(doc < id(&[o(2)]));
    }

    #[test]
    fn test_sentinels_are_distinct() {
        let end = NodeId::end_of_document();
        assert_ne!(end, NodeId::DOCUMENT_NODE);
        assert!(end.is_end_of_document());
        assert!(NodeId::DOCUMENT_NODE < end);
        assert!(id(&[i(u32::MAX - 2), o(2)]) < end);
        assert!(id(&[o(u32::MAX - 1)]) < end);
    }

    #[test]
    fn test_from_levels_rejects_malformed() {
        assert!(NodeId::from_levels(vec![o(3)]).is_err());
        assert!(NodeId::from_levels(vec![o(2), i(2)]).is_err());
        assert!(NodeId::from_levels(vec![i(2), i(31)]).is_ok());
    }

    #[test]
    fn test_from_levels_rejects_embedded_end_of_document() {
        assert!(NodeId::from_levels(vec![i(u32::MAX)]).unwrap().is_end_of_document());
        assert!(matches!(
            NodeId::from_levels(vec![i(u32::MAX), o(2)]),
            Err(NodeIdError::CorruptIdentity { offset: 0, .. })
        ));
        assert!(NodeId::from_levels(vec![o(2), i(u32::MAX)]).is_err());
    }

    #[test]
    fn test_tree_level_skips_synthetic() {
        assert_eq!(id(&[o(2)]).tree_level(), 1);
        assert_eq!(id(&[o(2), i(4), i(31)]).tree_level(), 2);
        assert_eq!(id(&[i(2), i(0), i(31), o(2)]).tree_level(), 2);
    }

    #[test]
    fn test_parent_id() {
        let top = id(&[o(2)]);
        assert_eq!(top.parent_id(), Some(NodeId::DOCUMENT_NODE));

        let inserted = id(&[o(2), i(4), i(31)]);
        assert_eq!(inserted.parent_id(), Some(top.clone()));

        let below = id(&[i(2), i(31), o(2)]);
        assert_eq!(below.parent_id(), Some(id(&[i(2), i(31)])));
    }

    #[test]
    fn test_ancestors() {
        let node = id(&[o(2), i(3), o(4)]);
        let ancestors: Vec<_> = node.ancestors().collect();
        assert_eq!(
            ancestors,
            vec![id(&[o(2), i(3)]), id(&[o(2)]), NodeId::DOCUMENT_NODE]
        );
    }

    #[test]
    fn test_relations() {
        let root = id(&[o(2)]);
        let child = id(&[o(2), o(4)]);
        let grandchild = id(&[o(2), o(4), o(2)]);
        let synthetic_child = id(&[o(2), i(4), i(31)]);
        let other = id(&[o(4)]);

        assert_eq!(child.compute_relation(&root), Some(Relation::Child));
        assert_eq!(synthetic_child.compute_relation(&root), Some(Relation::Child));
        assert_eq!(grandchild.compute_relation(&root), Some(Relation::Descendant));
        assert_eq!(root.compute_relation(&root), Some(Relation::SelfNode));
        assert_eq!(other.compute_relation(&root), None);
        assert_eq!(relation_code(other.compute_relation(&root)), NO_RELATION);
        assert_eq!(relation_code(child.compute_relation(&root)), 1);

        assert!(grandchild.is_descendant_of(&root));
        assert!(!root.is_descendant_of(&root));
        assert!(root.is_descendant_or_self_of(&root));
        assert!(root.is_ancestor_of(&grandchild));
        assert!(!grandchild.is_child_of(&root));
        assert!(root.is_child_of(&NodeId::DOCUMENT_NODE));
    }

    #[test]
    fn test_siblings() {
        let a = id(&[o(2), o(2)]);
        let b = id(&[o(2), i(2), i(31)]);
        let c = id(&[o(2), o(4)]);
        let cousin = id(&[o(4), o(2)]);

        assert_eq!(b.is_sibling_of(&a), Some(Ordering::Greater));
        assert_eq!(b.is_sibling_of(&c), Some(Ordering::Less));
        assert_eq!(a.is_sibling_of(&a), None);
        assert_eq!(a.is_sibling_of(&cousin), None);
        assert_eq!(a.is_sibling_of(&NodeId::DOCUMENT_NODE), None);
    }

    #[test]
    fn test_document_order_with_inserted_levels() {
        let ordered = [
            NodeId::DOCUMENT_NODE,
            id(&[o(2)]),
            id(&[o(2), o(2)]),
            id(&[i(2), i(0), i(31)]),
            id(&[i(2), i(31)]),
            id(&[i(2), i(31), o(2)]),
            id(&[i(3)]),
            id(&[o(4)]),
            NodeId::end_of_document(),
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].before(&pair[1], false), "{:?} < {:?}", pair[0], pair[1]);
            assert!(pair[1].after(&pair[0], false));
        }
    }

    #[test]
    fn test_axis_flags() {
        let parent = id(&[o(2)]);
        let child = id(&[o(2), o(2)]);
        let next = id(&[o(4)]);

        assert!(child.after(&parent, false));
        assert!(!child.after(&parent, true));
        assert!(next.after(&parent, true));

        assert!(parent.before(&child, false));
        assert!(!parent.before(&child, true));
        assert!(child.before(&next, true));
    }

    fn arb_step() -> impl Strategy<Value = Vec<Level>> {
        (
            prop::collection::vec((0u32..6).prop_map(|n| i(n * 2)), 0..2),
            prop_oneof![(1u32..6).prop_map(|n| o(n * 2)), (0u32..6).prop_map(|n| i(n * 2 + 1))],
        )
            .prop_map(|(mut step, terminal)| {
                step.push(terminal);
                step
            })
    }

    fn arb_node_id() -> impl Strategy<Value = NodeId> {
        prop::collection::vec(arb_step(), 0..5).prop_map(|steps| id(&steps.concat()))
    }

    proptest! {
        #[test]
        fn prop_order_is_total_and_transitive(
            a in arb_node_id(),
            b in arb_node_id(),
            c in arb_node_id(),
        ) {
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            prop_assert_eq!(a == b, a.cmp(&b) == Ordering::Equal);
            if a <= b && b <= c {
                prop_assert!(a <= c);
            }
            prop_assert!(a.before(&b, false) || a.after(&b, false) || a == b);
        }

        #[test]
        fn prop_ancestors_are_prefixes_and_come_first(node in arb_node_id(), other in arb_node_id()) {
            for ancestor in node.ancestors() {
                prop_assert!(node.is_descendant_of(&ancestor));
                prop_assert!(ancestor < node);
                prop_assert!(node.levels().starts_with(ancestor.levels()));
            }
            prop_assert_eq!(node.ancestors().count(), node.tree_level());

            // a non-ancestor that sorts before us also sorts before our subtree
            if other < node && !other.is_ancestor_of(&node) {
                let child = NodeId::from_levels([node.levels(), &[o(2)][..]].concat()).unwrap();
                prop_assert!(other < child);
                prop_assert!(!child.is_descendant_of(&other));
            }

            match node.compute_relation(&other) {
                Some(Relation::SelfNode) => prop_assert_eq!(&node, &other),
                Some(Relation::Child) => prop_assert_eq!(node.parent_id(), Some(other.clone())),
                Some(Relation::Descendant) => {
                    prop_assert!(other.is_ancestor_of(&node));
                    prop_assert!(node.tree_level() > other.tree_level() + 1);
                }
                None => prop_assert!(!node.is_descendant_or_self_of(&other)),
            }
        }
    }
}
