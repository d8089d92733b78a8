//! Child allocation cursor
//!
//! The "last issued child" of a parent lives with whoever is building the
//! subtree (usually one storage transaction), never in shared state.

use super::error::{NodeIdError, Result};
use super::node_id::NodeId;

/// Issues ids for children appended to one parent, in order
#[derive(Debug, Clone)]
pub struct ChildCursor {
    parent: NodeId,
    last: Option<NodeId>,
}

impl ChildCursor {
    /// Cursor for a parent that has no children yet
    pub fn new(parent: NodeId) -> Self {
        ChildCursor { parent, last: None }
    }

    /// Cursor continuing after an existing last child
    pub fn resume(parent: NodeId, last_child: Option<NodeId>) -> Result<Self> {
        if let Some(last) = &last_child {
            if !last.is_child_of(&parent) {
                return Err(NodeIdError::NotAChild);
            }
        }
        Ok(ChildCursor {
            parent,
            last: last_child,
        })
    }

    /// Id for the next appended child
    pub fn next_child(&mut self) -> Result<NodeId> {
        let next = match &self.last {
            None => self.parent.new_child()?,
            Some(last) => last.next_sibling()?,
        };
        self.last = Some(next.clone());
        Ok(next)
    }

    pub fn parent(&self) -> &NodeId {
        &self.parent
    }

    pub fn last_child(&self) -> Option<&NodeId> {
        self.last.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbering::level::Level;

    #[test]
    fn test_cursor_issues_ordered_children() {
        let parent = NodeId::DOCUMENT_NODE.new_child().unwrap();
        let mut cursor = ChildCursor::new(parent.clone());
        let children: Vec<_> = (0..5).map(|_| cursor.next_child().unwrap()).collect();

        for (n, child) in children.iter().enumerate() {
            assert!(child.is_child_of(&parent));
            assert_eq!(child.levels().last(), Some(&Level::original(2 + 2 * n as u32)));
        }
        for pair in children.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(cursor.last_child(), children.last());
    }

    #[test]
    fn test_resume() {
        let parent = NodeId::DOCUMENT_NODE.new_child().unwrap();
        let last = parent.new_child().unwrap().next_sibling().unwrap();
        let mut cursor = ChildCursor::resume(parent.clone(), Some(last.clone())).unwrap();
        let next = cursor.next_child().unwrap();
        assert!(next > last);
        assert_eq!(cursor.parent(), &parent);

        let stranger = parent.next_sibling().unwrap().new_child().unwrap();
        assert!(matches!(
            ChildCursor::resume(parent, Some(stranger)),
            Err(NodeIdError::NotAChild)
        ));
    }

    #[test]
    fn test_end_of_document_cursor_issues_nothing() {
        let mut cursor = ChildCursor::new(NodeId::end_of_document());
        assert!(matches!(cursor.next_child(), Err(NodeIdError::EndOfDocument)));
        assert_eq!(cursor.last_child(), None);
    }
}
