//! Node id errors

use thiserror::Error;

/// Errors raised by node id decoding and mutation.
///
/// Comparisons and relationship queries never fail; only decoding of
/// stored bytes and derivation of new ids can.
#[derive(Debug, Error)]
pub enum NodeIdError {
    /// Stored bytes do not form a valid node id
    #[error("corrupt node id at byte {offset}: {reason}")]
    CorruptIdentity {
        /// Byte offset (relative to the start of the id) where decoding failed
        offset: usize,
        /// What was wrong
        reason: &'static str,
    },

    /// No label is left at the given tree level; the subtree must be
    /// renumbered before the insert can proceed
    #[error("label space exhausted at tree level {level}")]
    LevelOverflow {
        /// Tree level (1 = children of the document node)
        level: usize,
    },

    /// Sibling derivation was requested for the document node
    #[error("the document node has no siblings")]
    DocumentNode,

    /// A child or sibling was requested for the end-of-document sentinel
    #[error("the end-of-document sentinel has no children or siblings")]
    EndOfDocument,

    /// `insert_node` neighbours do not share a parent or are out of order
    #[error("insert neighbours must be ordered siblings")]
    NotSiblings,

    /// A node handed in as the last child of a parent is not its child
    #[error("node id is not a child of the given parent")]
    NotAChild,

    /// Dotted text form could not be parsed
    #[error("invalid node id text at {position}: {reason}")]
    InvalidText {
        /// Byte position in the input string
        position: usize,
        /// What was wrong
        reason: &'static str,
    },

    /// Output buffer cannot hold the encoded id
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required from the write offset
        needed: usize,
        /// Bytes available from the write offset
        available: usize,
    },

    /// Underlying stream failed while reading an id
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NodeIdError {
    #[inline]
    pub(crate) fn corrupt(offset: usize, reason: &'static str) -> Self {
        tracing::debug!(offset, reason, "rejecting corrupt node id");
        NodeIdError::CorruptIdentity { offset, reason }
    }

    #[inline]
    pub(crate) fn overflow(level: usize) -> Self {
        tracing::debug!(level, "node id label space exhausted");
        NodeIdError::LevelOverflow { level }
    }

    /// Short machine-readable name, used as the error atom on the BEAM side
    pub fn reason(&self) -> &'static str {
        match self {
            NodeIdError::CorruptIdentity { .. } => "corrupt_identity",
            NodeIdError::LevelOverflow { .. } => "level_overflow",
            NodeIdError::DocumentNode => "document_node",
            NodeIdError::EndOfDocument => "end_of_document",
            NodeIdError::NotSiblings => "not_siblings",
            NodeIdError::NotAChild => "not_a_child",
            NodeIdError::InvalidText { .. } => "invalid_text",
            NodeIdError::BufferTooSmall { .. } => "buffer_too_small",
            NodeIdError::Io(_) => "io",
        }
    }
}

/// Result alias for node id operations
pub type Result<T> = std::result::Result<T, NodeIdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = NodeIdError::corrupt(3, "truncated level");
        assert_eq!(err.to_string(), "corrupt node id at byte 3: truncated level");
        assert_eq!(err.reason(), "corrupt_identity");

        let err = NodeIdError::overflow(2);
        assert_eq!(err.to_string(), "label space exhausted at tree level 2");

        assert_eq!(NodeIdError::EndOfDocument.reason(), "end_of_document");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: NodeIdError = io.into();
        assert_eq!(err.reason(), "io");
    }
}
