//! XPath axes over node sets
//!
//! All 11 node axes (attribute and namespace nodes carry no id of their
//! own):
//! - child, parent, self
//! - descendant, descendant-or-self
//! - ancestor, ancestor-or-self
//! - following, following-sibling
//! - preceding, preceding-sibling
//!
//! Each axis selects the members of a `NodeSet` related to a context id.
//! Nothing but the ids themselves is consulted, and results come back in
//! document order.

use std::cmp::Ordering;

use super::set::NodeSet;
use crate::numbering::NodeId;

/// XPath axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Self_,
}

impl Axis {
    /// Parse an axis name as written in XPath (`"following-sibling"`)
    pub fn from_name(name: &str) -> Option<Self> {
        let axis = match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "following" => Axis::Following,
            "preceding" => Axis::Preceding,
            "self" => Axis::Self_,
            _ => return None,
        };
        Some(axis)
    }
}

/// Select the members of `set` on `axis` from `context`
pub fn select(set: &NodeSet, context: &NodeId, axis: Axis) -> Vec<NodeId> {
    match axis {
        Axis::Child => child_axis(set, context),
        Axis::Descendant => set.subtree(context).to_vec(),
        Axis::DescendantOrSelf => descendant_or_self_axis(set, context),
        Axis::Parent => parent_axis(set, context),
        Axis::Ancestor => ancestor_axis(set, context),
        Axis::AncestorOrSelf => ancestor_or_self_axis(set, context),
        Axis::FollowingSibling => sibling_axis(set, context, Ordering::Greater),
        Axis::PrecedingSibling => sibling_axis(set, context, Ordering::Less),
        Axis::Following => following_axis(set, context),
        Axis::Preceding => preceding_axis(set, context),
        Axis::Self_ => self_axis(set, context),
    }
}

/// child:: axis - members exactly one step below
fn child_axis(set: &NodeSet, context: &NodeId) -> Vec<NodeId> {
    set.subtree(context)
        .iter()
        .filter(|id| id.is_child_of(context))
        .cloned()
        .collect()
}

/// descendant-or-self:: axis - context (if a member) plus its subtree
fn descendant_or_self_axis(set: &NodeSet, context: &NodeId) -> Vec<NodeId> {
    let descendants = set.subtree(context);
    let mut result = Vec::with_capacity(1 + descendants.len());
    result.extend(self_axis(set, context));
    result.extend_from_slice(descendants);
    result
}

/// parent:: axis - at most one member
fn parent_axis(set: &NodeSet, context: &NodeId) -> Vec<NodeId> {
    match context.parent_id() {
        Some(parent) if set.contains(&parent) => vec![parent],
        _ => Vec::new(),
    }
}

/// ancestor:: axis - computed from the id, then looked up
fn ancestor_axis(set: &NodeSet, context: &NodeId) -> Vec<NodeId> {
    let mut result: Vec<NodeId> = context.ancestors().filter(|a| set.contains(a)).collect();
    result.reverse();
    result
}

/// ancestor-or-self:: axis
fn ancestor_or_self_axis(set: &NodeSet, context: &NodeId) -> Vec<NodeId> {
    let mut result = ancestor_axis(set, context);
    result.extend(self_axis(set, context));
    result
}

/// following-sibling:: / preceding-sibling:: axes
fn sibling_axis(set: &NodeSet, context: &NodeId, side: Ordering) -> Vec<NodeId> {
    let Some(parent) = context.parent_id() else {
        return Vec::new();
    };
    set.subtree(&parent)
        .iter()
        .filter(|id| id.is_sibling_of(context) == Some(side))
        .cloned()
        .collect()
}

/// following:: axis - after the context in document order, not descendants
fn following_axis(set: &NodeSet, context: &NodeId) -> Vec<NodeId> {
    let start = set.subtree_range(context).end;
    set.as_slice()[start..]
        .iter()
        .filter(|id| id.after(context, true))
        .cloned()
        .collect()
}

/// preceding:: axis - before the context in document order, not ancestors
fn preceding_axis(set: &NodeSet, context: &NodeId) -> Vec<NodeId> {
    let end = set.position(context).unwrap_or_else(|at| at);
    set.as_slice()[..end]
        .iter()
        .filter(|id| id.before(context, true))
        .cloned()
        .collect()
}

/// self:: axis - just the context node, when it is a member
fn self_axis(set: &NodeSet, context: &NodeId) -> Vec<NodeId> {
    if set.contains(context) {
        vec![context.clone()]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // <root>             2
    //   <a>              2.2
    //     <b/>           2.2.2
    //   </a>
    //   <ins/>           2.2/31   (inserted after a)
    //   <c>              2.4
    //     <d/>           2.4.2
    //   </c>
    // </root>
    // <trailer/>         4
    fn doc() -> NodeSet {
        ["2", "2.2", "2.2.2", "2.2/31", "2.4", "2.4.2", "4"]
            .iter()
            .map(|s| s.parse::<NodeId>().unwrap())
            .collect()
    }

    fn ids(texts: &[&str]) -> Vec<NodeId> {
        texts.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn node(text: &str) -> NodeId {
        text.parse().unwrap()
    }

    #[test]
    fn test_axis_names() {
        assert_eq!(Axis::from_name("descendant-or-self"), Some(Axis::DescendantOrSelf));
        assert_eq!(Axis::from_name("self"), Some(Axis::Self_));
        assert_eq!(Axis::from_name("attribute"), None);
    }

    #[test]
    fn test_child_axis() {
        let set = doc();
        assert_eq!(
            select(&set, &node("2"), Axis::Child),
            ids(&["2.2", "2.2/31", "2.4"])
        );
        assert_eq!(select(&set, &NodeId::DOCUMENT_NODE, Axis::Child), ids(&["2", "4"]));
    }

    #[test]
    fn test_descendant_axes() {
        let set = doc();
        assert_eq!(select(&set, &node("2.2"), Axis::Descendant), ids(&["2.2.2"]));
        assert_eq!(
            select(&set, &node("2.4"), Axis::DescendantOrSelf),
            ids(&["2.4", "2.4.2"])
        );
    }

    #[test]
    fn test_ancestor_axes() {
        let set = doc();
        assert_eq!(select(&set, &node("2.4.2"), Axis::Ancestor), ids(&["2", "2.4"]));
        assert_eq!(
            select(&set, &node("2.2.2"), Axis::AncestorOrSelf),
            ids(&["2", "2.2", "2.2.2"])
        );
        assert_eq!(select(&set, &node("2.4.2"), Axis::Parent), ids(&["2.4"]));
        assert!(select(&set, &node("2"), Axis::Parent).is_empty());
    }

    #[test]
    fn test_sibling_axes() {
        let set = doc();
        assert_eq!(
            select(&set, &node("2.2/31"), Axis::FollowingSibling),
            ids(&["2.4"])
        );
        assert_eq!(
            select(&set, &node("2.2/31"), Axis::PrecedingSibling),
            ids(&["2.2"])
        );
        assert!(select(&set, &NodeId::DOCUMENT_NODE, Axis::FollowingSibling).is_empty());
    }

    #[test]
    fn test_following_and_preceding() {
        let set = doc();
        assert_eq!(
            select(&set, &node("2.2"), Axis::Following),
            ids(&["2.2/31", "2.4", "2.4.2", "4"])
        );
        assert_eq!(
            select(&set, &node("2.4.2"), Axis::Preceding),
            ids(&["2.2", "2.2.2", "2.2/31"])
        );
    }

    #[test]
    fn test_self_axis() {
        let set = doc();
        assert_eq!(select(&set, &node("4"), Axis::Self_), ids(&["4"]));
        assert!(select(&set, &node("6"), Axis::Self_).is_empty());
    }
}
