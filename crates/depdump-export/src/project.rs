//! Projection of the PDG and CDG into emission-ready records.
//!
//! Both projections are lazy iterators: each `next()` walks the graph until it
//! finds a node that yields a record, so the exporter never holds more than
//! one record at a time.
//!
//! Traversal counters advance on every graph node, including nodes that are
//! skipped for lacking an instruction or block. A dependency id is therefore
//! the neighbour's raw traversal position, which need not match the index of
//! any emitted record once a node has been skipped.

use std::collections::HashMap;

use depdump_core::cdg::Cdg;
use depdump_core::id::{BlockId, CdgNodeId, PdgNodeId};
use depdump_core::pdg::{DepKind, Pdg};

use crate::index::{to_order, IdIndex};

/// One dependency reference of a PDG record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepRef {
    /// Graph-order id of the node depended upon.
    pub id: u32,
    pub kind: DepKind,
}

/// One entry of the `pdg` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdgRecord {
    /// Textual rendering of the instruction.
    pub inst: String,
    /// Program-order id of the parent block (emitted as `bbId`).
    pub bb_id: u32,
    /// Program-order id of the instruction (emitted as `realId`).
    pub real_id: u32,
    /// Ordered adjacency list, one entry per dependency edge.
    pub deps: Vec<DepRef>,
}

/// One entry of the `cdg` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdgRecord {
    /// Block name, empty for anonymous blocks.
    pub name: String,
    /// Program-order id of the block's terminator, when it is indexed.
    pub term_inst: Option<u32>,
}

// ---------------------------------------------------------------------------
// PDG
// ---------------------------------------------------------------------------

/// Record stream over the PDG.
///
/// Records each visited instruction's graph order in the [`IdIndex`].
pub struct PdgProjection<'a, 'f> {
    pdg: &'a Pdg,
    index: &'a mut IdIndex<'f>,
    order: Vec<PdgNodeId>,
    positions: HashMap<PdgNodeId, u32>,
    cursor: usize,
    skipped: usize,
}

impl<'a, 'f> PdgProjection<'a, 'f> {
    pub fn new(pdg: &'a Pdg, index: &'a mut IdIndex<'f>) -> Self {
        let order: Vec<PdgNodeId> = pdg.nodes().map(|(id, _)| id).collect();
        let positions = order
            .iter()
            .enumerate()
            .map(|(seq, id)| (*id, to_order(seq, "PDG traversal position")))
            .collect();
        PdgProjection {
            pdg,
            index,
            order,
            positions,
            cursor: 0,
            skipped: 0,
        }
    }

    /// Nodes passed over so far because they carry no instruction.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn position_of(&self, node: PdgNodeId) -> u32 {
        match self.positions.get(&node) {
            Some(seq) => *seq,
            None => panic!("contract violation: PDG edge targets unknown node {node}"),
        }
    }
}

impl Iterator for PdgProjection<'_, '_> {
    type Item = PdgRecord;

    fn next(&mut self) -> Option<PdgRecord> {
        while let Some(&node_id) = self.order.get(self.cursor) {
            let seq = to_order(self.cursor, "PDG traversal position");
            self.cursor += 1;

            let Some(inst_id) = self.pdg.node(node_id).and_then(|n| n.inst) else {
                self.skipped += 1;
                tracing::trace!(node = %node_id, seq, "skipping PDG node without instruction");
                continue;
            };

            let entry = self.index.expect_inst(inst_id);
            let bb_id = self.index.expect_parent_block_order(inst_id);
            let real_id = self
                .index
                .inst_program_order(inst_id)
                .unwrap_or_else(|| unreachable!("expect_inst accepted {inst_id}"));
            self.index.record_inst_order(inst_id, seq);

            let deps = self
                .pdg
                .deps(node_id)
                .into_iter()
                .map(|(target, kind)| DepRef {
                    id: self.position_of(target),
                    kind,
                })
                .collect();

            return Some(PdgRecord {
                inst: entry.inst.text.clone(),
                bb_id,
                real_id,
                deps,
            });
        }
        None
    }
}

// ---------------------------------------------------------------------------
// CDG
// ---------------------------------------------------------------------------

/// Record stream over the CDG.
///
/// Uses its own counter, independent of the PDG walk, and overwrites each
/// visited block's graph order.
pub struct CdgProjection<'a, 'f> {
    index: &'a mut IdIndex<'f>,
    order: Vec<(CdgNodeId, Option<BlockId>)>,
    cursor: usize,
    skipped: usize,
}

impl<'a, 'f> CdgProjection<'a, 'f> {
    pub fn new(cdg: &'a Cdg, index: &'a mut IdIndex<'f>) -> Self {
        CdgProjection {
            index,
            order: cdg.nodes().map(|(id, node)| (id, node.block)).collect(),
            cursor: 0,
            skipped: 0,
        }
    }

    /// Nodes passed over so far because they carry no block.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for CdgProjection<'_, '_> {
    type Item = CdgRecord;

    fn next(&mut self) -> Option<CdgRecord> {
        while let Some(&(node_id, block)) = self.order.get(self.cursor) {
            let seq = to_order(self.cursor, "CDG traversal position");
            self.cursor += 1;

            let Some(block_id) = block else {
                self.skipped += 1;
                tracing::trace!(node = %node_id, seq, "skipping CDG node without block");
                continue;
            };

            let bb = self.index.expect_block(block_id);
            self.index.record_block_order(block_id, seq);
            let term_inst = bb
                .terminator()
                .and_then(|term| self.index.inst_program_order(term.id));

            return Some(CdgRecord {
                name: bb.name_or_empty().to_string(),
                term_inst,
            });
        }
        None
    }
}
