//! Stable ID newtypes for program entities and graph nodes.
//!
//! All IDs are distinct newtype wrappers over `u32`, so an `InstId` cannot be
//! used where a `BlockId` is expected. These are entity identities, not
//! positions: program-order and graph-order numbering is assigned later by the
//! exporter and never stored here.

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Stable instruction identifier within one function snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstId(pub u32);

/// Stable basic block identifier within one function snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u32);

/// PDG node identifier. Maps to a petgraph `NodeIndex<u32>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PdgNodeId(pub u32);

/// CDG node identifier. Maps to a petgraph `NodeIndex<u32>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CdgNodeId(pub u32);

// Display implementations -- just print the inner value.

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PdgNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CdgNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Bridge between graph node ids and petgraph's NodeIndex<u32>.

impl From<NodeIndex<u32>> for PdgNodeId {
    fn from(idx: NodeIndex<u32>) -> Self {
        PdgNodeId(idx.index() as u32)
    }
}

impl From<PdgNodeId> for NodeIndex<u32> {
    fn from(id: PdgNodeId) -> Self {
        NodeIndex::new(id.0 as usize)
    }
}

impl From<NodeIndex<u32>> for CdgNodeId {
    fn from(idx: NodeIndex<u32>) -> Self {
        CdgNodeId(idx.index() as u32)
    }
}

impl From<CdgNodeId> for NodeIndex<u32> {
    fn from(id: CdgNodeId) -> Self {
        NodeIndex::new(id.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdg_node_id_to_node_index_roundtrip() {
        let idx = NodeIndex::<u32>::new(42);
        let node_id = PdgNodeId::from(idx);
        assert_eq!(node_id.0, 42);

        let back: NodeIndex<u32> = node_id.into();
        assert_eq!(back.index(), 42);
    }

    #[test]
    fn cdg_node_id_to_node_index_roundtrip() {
        let idx = NodeIndex::<u32>::new(3);
        let back: NodeIndex<u32> = CdgNodeId::from(idx).into();
        assert_eq!(back, idx);
    }

    #[test]
    fn display_prints_inner_value() {
        assert_eq!(format!("{}", InstId(7)), "7");
        assert_eq!(format!("{}", BlockId(99)), "99");
        assert_eq!(format!("{}", PdgNodeId(3)), "3");
        assert_eq!(format!("{}", CdgNodeId(0)), "0");
    }

    #[test]
    fn serde_is_transparent() {
        assert_eq!(serde_json::to_string(&InstId(42)).unwrap(), "42");
        let back: BlockId = serde_json::from_str("5").unwrap();
        assert_eq!(back, BlockId(5));
    }
}
