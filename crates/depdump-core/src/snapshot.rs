//! Snapshot documents: one function plus its PDG and CDG in a single JSON file.
//!
//! This is the on-disk input format of the `depdump` binary. Graph nodes are
//! listed positionally; edges name nodes by their position in those lists.
//!
//! ```json
//! {
//!   "function": { "name": "f", "blocks": [ ... ] },
//!   "pdg": { "nodes": [0, null, 1], "edges": [{ "from": 2, "to": 0, "kind": "data" }] },
//!   "cdg": { "nodes": [0, 1], "edges": [{ "from": 0, "to": 1 }] }
//! }
//! ```

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::cdg::Cdg;
use crate::error::CoreError;
use crate::function::Function;
use crate::id::{BlockId, CdgNodeId, InstId, PdgNodeId};
use crate::pdg::{DepKind, Pdg};

/// A PDG edge by node position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdgEdgeDef {
    pub from: u32,
    pub to: u32,
    #[serde(default)]
    pub kind: DepKind,
}

/// A CDG edge by node position (`from` controls `to`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdgEdgeDef {
    pub from: u32,
    pub to: u32,
}

/// Positional PDG description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdgDef {
    pub nodes: Vec<Option<InstId>>,
    #[serde(default)]
    pub edges: Vec<PdgEdgeDef>,
}

/// Positional CDG description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdgDef {
    pub nodes: Vec<Option<BlockId>>,
    #[serde(default)]
    pub edges: Vec<CdgEdgeDef>,
}

/// A complete exporter input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub function: Function,
    #[serde(default)]
    pub pdg: PdgDef,
    #[serde(default)]
    pub cdg: CdgDef,
}

impl Snapshot {
    /// Parses a snapshot from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Parses a snapshot from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CoreError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Builds the graphs described by this snapshot.
    ///
    /// Fails if two instructions or two blocks share an id, or if an edge
    /// names a node position outside the node list.
    pub fn into_parts(self) -> Result<(Function, Pdg, Cdg), CoreError> {
        self.function.check_unique_ids()?;

        let mut pdg = Pdg::new();
        let pdg_ids: Vec<PdgNodeId> = self.pdg.nodes.iter().map(|inst| pdg.add_node(*inst)).collect();
        for edge in &self.pdg.edges {
            let from = lookup(&pdg_ids, edge.from, "pdg")?;
            let to = lookup(&pdg_ids, edge.to, "pdg")?;
            pdg.add_dep(from, to, edge.kind)?;
        }

        let mut cdg = Cdg::new();
        let cdg_ids: Vec<CdgNodeId> = self.cdg.nodes.iter().map(|bb| cdg.add_node(*bb)).collect();
        for edge in &self.cdg.edges {
            let from = lookup(&cdg_ids, edge.from, "cdg")?;
            let to = lookup(&cdg_ids, edge.to, "cdg")?;
            cdg.add_control_dep(from, to)?;
        }

        Ok((self.function, pdg, cdg))
    }
}

fn lookup<T: Copy>(ids: &[T], pos: u32, graph: &'static str) -> Result<T, CoreError> {
    ids.get(pos as usize)
        .copied()
        .ok_or(CoreError::NodeNotFound { graph, id: pos })
}
