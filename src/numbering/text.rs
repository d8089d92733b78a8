//! Dotted text form
//!
//! Steps are separated by `.`; a synthetic level is written before the
//! level it continues, followed by `/`. Label parity carries the origin
//! flag, so no extra marker is needed:
//!
//! ```text
//! [2]                 "2"
//! [2, 3+]             "2.3"
//! [2, 2+, 31+]        "2.2/31"
//! []                  ""          (document node)
//! ```

use std::fmt;
use std::str::FromStr;

use super::error::NodeIdError;
use super::level::Level;
use super::node_id::NodeId;

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut step_start = true;
        for (i, level) in self.levels().iter().enumerate() {
            if i > 0 && step_start {
                f.write_str(".")?;
            }
            write!(f, "{}", level.label)?;
            step_start = level.is_terminal();
            if !step_start {
                f.write_str("/")?;
            }
        }
        Ok(())
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(NodeId::DOCUMENT_NODE);
        }
        let mut levels = Vec::new();
        let mut position = 0;
        for step in s.split('.') {
            let mut parts = step.split('/').peekable();
            while let Some(part) = parts.next() {
                let label: u32 = part.parse().map_err(|_| NodeIdError::InvalidText {
                    position,
                    reason: "expected an unsigned label",
                })?;
                let level = if parts.peek().is_some() {
                    if label % 2 == 1 {
                        return Err(NodeIdError::InvalidText {
                            position,
                            reason: "synthetic level needs an even label",
                        });
                    }
                    Level::inserted(label)
                } else if label % 2 == 0 {
                    Level::original(label)
                } else {
                    Level::inserted(label)
                };
                if level.is_end_of_document() && part.len() != s.len() {
                    return Err(NodeIdError::InvalidText {
                        position,
                        reason: "end-of-document label inside an id",
                    });
                }
                levels.push(level);
                position += part.len() + 1;
            }
        }
        Ok(NodeId::from_levels_unchecked(levels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let id = NodeId::from_levels(vec![
            Level::original(2),
            Level::inserted(2),
            Level::inserted(31),
            Level::original(4),
        ])
        .unwrap();
        assert_eq!(id.to_string(), "2.2/31.4");
        assert_eq!(NodeId::DOCUMENT_NODE.to_string(), "");
        assert_eq!(NodeId::end_of_document().to_string(), "4294967295");
    }

    #[test]
    fn test_parse_round_trip() {
        for text in ["2", "2.3", "2.2/31", "2/0/31.4.5", "4294967295"] {
            let id: NodeId = text.parse().unwrap();
            assert_eq!(id.to_string(), text);
        }
        let doc: NodeId = "".parse().unwrap();
        assert!(doc.is_document_node());
    }

    #[test]
    fn test_parse_flags() {
        let id: NodeId = "2.2/31".parse().unwrap();
        assert_eq!(
            id.levels(),
            &[Level::original(2), Level::inserted(2), Level::inserted(31)]
        );
        assert_eq!(id.tree_level(), 2);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "2..4".parse::<NodeId>(),
            Err(NodeIdError::InvalidText { position: 2, .. })
        ));
        assert!("3/5".parse::<NodeId>().is_err());
        assert!("2.x".parse::<NodeId>().is_err());
        assert!("2/".parse::<NodeId>().is_err());
        assert!("-2".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_parse_end_of_document() {
        let end: NodeId = "4294967295".parse().unwrap();
        assert!(end.is_end_of_document());
        assert!(matches!(
            "4294967295.2".parse::<NodeId>(),
            Err(NodeIdError::InvalidText { position: 0, .. })
        ));
        assert!(matches!(
            "2.4294967295".parse::<NodeId>(),
            Err(NodeIdError::InvalidText { position: 2, .. })
        ));
    }
}
