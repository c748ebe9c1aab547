//! Control Dependence Graph container.
//!
//! Nodes optionally reference a basic block. An edge `a -> b` means block `b`
//! is control dependent on the predicate ending block `a`. The exporter only
//! walks the nodes; control edges are kept for callers that need them.

use petgraph::stable_graph::StableGraph;
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{BlockId, CdgNodeId};

/// A CDG node; `block` is `None` for synthetic entry/exit nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdgNode {
    pub block: Option<BlockId>,
}

/// Control Dependence Graph for one function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cdg {
    graph: StableGraph<CdgNode, (), Directed, u32>,
}

impl Cdg {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Cdg {
            graph: StableGraph::new(),
        }
    }

    /// Adds a node, optionally bound to a basic block.
    pub fn add_node(&mut self, block: Option<BlockId>) -> CdgNodeId {
        self.graph.add_node(CdgNode { block }).into()
    }

    /// Records that `dependent` is control dependent on `controller`.
    pub fn add_control_dep(&mut self, controller: CdgNodeId, dependent: CdgNodeId) -> Result<(), CoreError> {
        for id in [controller, dependent] {
            if !self.graph.contains_node(id.into()) {
                return Err(CoreError::NodeNotFound { graph: "cdg", id: id.0 });
            }
        }
        self.graph.add_edge(controller.into(), dependent.into(), ());
        Ok(())
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Iterates live nodes in traversal (index) order.
    pub fn nodes(&self) -> impl Iterator<Item = (CdgNodeId, &CdgNode)> + '_ {
        self.graph
            .node_indices()
            .map(move |idx| (CdgNodeId::from(idx), &self.graph[idx]))
    }

    /// Nodes that `id` is control dependent on.
    pub fn controllers(&self, id: CdgNodeId) -> Vec<CdgNodeId> {
        if !self.graph.contains_node(id.into()) {
            return Vec::new();
        }
        let mut out: Vec<CdgNodeId> = self
            .graph
            .neighbors_directed(id.into(), Direction::Incoming)
            .map(CdgNodeId::from)
            .collect();
        out.reverse();
        out
    }
}
