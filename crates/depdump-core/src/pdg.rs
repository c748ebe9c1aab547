//! Program Dependence Graph container.
//!
//! [`Pdg`] wraps a petgraph `StableGraph` whose nodes optionally reference an
//! instruction and whose edges are typed dependencies. An edge `a -> b` means
//! node `a` depends on node `b`. Iteration order over nodes is the graph's
//! index order and is the traversal order the exporter numbers.

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{InstId, PdgNodeId};

/// Dependency kind carried by a PDG edge.
///
/// The exported document emits edges as bare ids by default; the kind is only
/// written when the exporter is configured to do so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepKind {
    /// True (read-after-write) data dependency.
    #[default]
    Data,
    /// Control dependency folded into the PDG.
    Control,
    /// Write-after-read dependency.
    Anti,
    /// Write-after-write dependency.
    Output,
}

impl DepKind {
    /// Lowercase name as written to the exported document.
    pub fn as_str(&self) -> &'static str {
        match self {
            DepKind::Data => "data",
            DepKind::Control => "control",
            DepKind::Anti => "anti",
            DepKind::Output => "output",
        }
    }
}

/// A PDG node. Nodes without an instruction (entry/exit sentinels, merged
/// nodes) are kept in the graph but contribute nothing to the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdgNode {
    pub inst: Option<InstId>,
}

/// Program Dependence Graph for one function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pdg {
    graph: StableGraph<PdgNode, DepKind, Directed, u32>,
}

impl Pdg {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Pdg {
            graph: StableGraph::new(),
        }
    }

    /// Adds a node, optionally bound to an instruction.
    pub fn add_node(&mut self, inst: Option<InstId>) -> PdgNodeId {
        self.graph.add_node(PdgNode { inst }).into()
    }

    /// Records that `from` depends on `to`.
    pub fn add_dep(&mut self, from: PdgNodeId, to: PdgNodeId, kind: DepKind) -> Result<(), CoreError> {
        self.require(from)?;
        self.require(to)?;
        self.graph.add_edge(from.into(), to.into(), kind);
        Ok(())
    }

    /// Removes a node and all its edges. Remaining node ids are unchanged.
    pub fn remove_node(&mut self, id: PdgNodeId) -> Option<PdgNode> {
        self.graph.remove_node(id.into())
    }

    /// Returns the node, if present.
    pub fn node(&self, id: PdgNodeId) -> Option<&PdgNode> {
        self.graph.node_weight(id.into())
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterates live nodes in traversal (index) order.
    pub fn nodes(&self) -> impl Iterator<Item = (PdgNodeId, &PdgNode)> + '_ {
        self.graph
            .node_indices()
            .map(move |idx| (PdgNodeId::from(idx), &self.graph[idx]))
    }

    /// Returns the ordered adjacency list of `id`: the nodes it depends on, in
    /// the order the dependencies were added.
    pub fn deps(&self, id: PdgNodeId) -> Vec<(PdgNodeId, DepKind)> {
        let idx: NodeIndex<u32> = id.into();
        if !self.graph.contains_node(idx) {
            return Vec::new();
        }
        // petgraph walks outgoing edges newest first.
        let mut deps: Vec<(PdgNodeId, DepKind)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (PdgNodeId::from(e.target()), *e.weight()))
            .collect();
        deps.reverse();
        deps
    }

    fn require(&self, id: PdgNodeId) -> Result<(), CoreError> {
        if self.graph.contains_node(id.into()) {
            Ok(())
        } else {
            Err(CoreError::NodeNotFound { graph: "pdg", id: id.0 })
        }
    }
}
