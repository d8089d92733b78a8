//! NodeSet - node ids in document order
//!
//! Because ids sort in document order, a node's descendants form one
//! contiguous run right after it. Most axis lookups are binary searches.

use std::ops::Range;

use rayon::prelude::*;

use crate::numbering::NodeId;

/// Sorted, duplicate-free list of node ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    ids: Vec<NodeId>,
}

impl NodeSet {
    /// Build from ids in any order (sorted in parallel)
    pub fn from_unsorted(mut ids: Vec<NodeId>) -> Self {
        ids.par_sort_unstable();
        ids.dedup();
        NodeSet { ids }
    }

    /// Build from ids already in document order; duplicates are dropped
    pub fn from_sorted(mut ids: Vec<NodeId>) -> Self {
        debug_assert!(ids.windows(2).all(|w| w[0] <= w[1]));
        ids.dedup();
        NodeSet { ids }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeId> {
        self.ids.iter()
    }

    pub fn into_vec(self) -> Vec<NodeId> {
        self.ids
    }

    /// Index of `id`, or where it would be inserted
    #[inline]
    pub fn position(&self, id: &NodeId) -> Result<usize, usize> {
        self.ids.binary_search(id)
    }

    #[inline]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.position(id).is_ok()
    }

    /// Index range of the members that descend from `context`
    pub fn subtree_range(&self, context: &NodeId) -> Range<usize> {
        let start = self.ids.partition_point(|id| id <= context);
        let len = self.ids[start..].partition_point(|id| id.is_descendant_of(context));
        start..start + len
    }

    /// Members that descend from `context`, in document order
    #[inline]
    pub fn subtree(&self, context: &NodeId) -> &[NodeId] {
        &self.ids[self.subtree_range(context)]
    }
}

impl FromIterator<NodeId> for NodeSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        NodeSet::from_unsorted(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = &'a NodeId;
    type IntoIter = std::slice::Iter<'a, NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(ids: &[&str]) -> Vec<NodeId> {
        ids.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_from_unsorted() {
        let set = NodeSet::from_unsorted(parse(&["4", "2.2", "2", "2/31", "2.2"]));
        assert_eq!(set.as_slice(), parse(&["2", "2.2", "2/31", "4"]).as_slice());
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_subtree() {
        let set: NodeSet = parse(&["2", "2.2", "2.2.2", "2.3", "2/31", "2/31.2", "4"])
            .into_iter()
            .collect();
        let two: NodeId = "2".parse().unwrap();
        assert_eq!(set.subtree(&two), parse(&["2.2", "2.2.2", "2.3"]).as_slice());

        let inserted: NodeId = "2/31".parse().unwrap();
        assert_eq!(set.subtree(&inserted), parse(&["2/31.2"]).as_slice());

        // context does not need to be a member
        let absent: NodeId = "2.4".parse().unwrap();
        assert!(set.subtree(&absent).is_empty());
        assert_eq!(set.subtree(&NodeId::DOCUMENT_NODE).len(), set.len());
    }
}
