//! Parallel bulk operations
//!
//! Uses Rayon for sorting encoded ids, decoding batches, and structural
//! joins between two node sets.

use rayon::prelude::*;

use super::set::NodeSet;
use crate::numbering::{compare_encoded, NodeId, Relation, Result};

/// Sort encoded ids into document order without decoding them
pub fn par_sort_encoded(ids: &mut [Vec<u8>]) {
    ids.par_sort_unstable_by(|a, b| compare_encoded(a, b));
}

/// Decode a batch of encoded ids; fails on the first corrupt entry
pub fn par_decode(encoded: &[&[u8]]) -> Result<Vec<NodeId>> {
    encoded.par_iter().map(|bytes| NodeId::from_bytes(bytes)).collect()
}

/// Structural join: every `(ancestor, descendant)` index pair whose nodes
/// stand in `relation`.
///
/// `Relation::Child` keeps direct children only, `Relation::Descendant`
/// keeps all proper descendants, and `Relation::SelfNode` matches ids
/// present in both sets. Pairs come out grouped by ancestor, each group in
/// document order.
pub fn structural_join(
    ancestors: &NodeSet,
    descendants: &NodeSet,
    relation: Relation,
) -> Vec<(usize, usize)> {
    ancestors
        .as_slice()
        .par_iter()
        .enumerate()
        .flat_map_iter(|(a, ancestor)| {
            let range = match relation {
                Relation::SelfNode => match descendants.position(ancestor) {
                    Ok(d) => d..d + 1,
                    Err(_) => 0..0,
                },
                Relation::Child | Relation::Descendant => descendants.subtree_range(ancestor),
            };
            let candidates = &descendants.as_slice()[range.clone()];
            range
                .zip(candidates)
                .filter(move |(_, id)| {
                    relation != Relation::Child || id.is_child_of(ancestor)
                })
                .map(move |(d, _)| (a, d))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(texts: &[&str]) -> NodeSet {
        texts.iter().map(|s| s.parse::<NodeId>().unwrap()).collect()
    }

    #[test]
    fn test_par_sort_encoded() {
        let mut encoded: Vec<Vec<u8>> = ["4", "2.2/31", "2.4", "2", "2.2"]
            .iter()
            .map(|s| s.parse::<NodeId>().unwrap().to_bytes())
            .collect();
        par_sort_encoded(&mut encoded);

        let texts: Vec<String> = encoded
            .iter()
            .map(|b| NodeId::from_bytes(b).unwrap().to_string())
            .collect();
        assert_eq!(texts, ["2", "2.2", "2.2/31", "2.4", "4"]);
    }

    #[test]
    fn test_par_decode() {
        let a = "2.3".parse::<NodeId>().unwrap().to_bytes();
        let b = NodeId::end_of_document().to_bytes();
        let decoded = par_decode(&[&a, &b]).unwrap();
        assert_eq!(decoded[0].to_string(), "2.3");
        assert!(decoded[1].is_end_of_document());

        let corrupt = [0xF8u8, 0x00];
        assert!(par_decode(&[&a, &corrupt]).is_err());
    }

    #[test]
    fn test_structural_join() {
        let ancestors = set(&["2", "2.2", "4"]);
        let descendants = set(&["2.2", "2.2.2", "2.3", "4.2.2"]);

        assert_eq!(
            structural_join(&ancestors, &descendants, Relation::Descendant),
            vec![(0, 0), (0, 1), (0, 2), (1, 1), (2, 3)]
        );
        assert_eq!(
            structural_join(&ancestors, &descendants, Relation::Child),
            vec![(0, 0), (0, 2), (1, 1)]
        );
        assert_eq!(
            structural_join(&ancestors, &descendants, Relation::SelfNode),
            vec![(1, 0)]
        );
    }
}
