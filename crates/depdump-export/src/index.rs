//! Dual identifier tables for instructions and basic blocks.
//!
//! Every instruction and block gets two numbers:
//!
//! - **program order**: its position in the function's natural enumeration.
//!   Instructions are numbered continuously across blocks; blocks are numbered
//!   separately. Assigned once in [`IdIndex::build`] and never changed.
//! - **graph order**: its position in the PDG (instructions) or CDG (blocks)
//!   traversal. Recorded while walking the graphs; last write wins. Entities
//!   never visited report `0`.
//!
//! Program order is the insertion index of the `IndexMap`s below, so it is
//! dense and zero-based by construction. The two graph-order assignments live
//! in their own maps so that a PDG walk can never clobber a block number and
//! vice versa.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use depdump_core::cdg::Cdg;
use depdump_core::function::{BasicBlock, Function, Instruction};
use depdump_core::id::{BlockId, InstId};

/// `(programOrderId, graphOrderId)` for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdPair {
    pub program_order: u32,
    pub graph_order: u32,
}

/// An indexed instruction with its parent block.
#[derive(Debug, Clone, Copy)]
pub struct InstEntry<'f> {
    pub inst: &'f Instruction,
    pub parent: BlockId,
}

/// Identifier tables for one function snapshot.
#[derive(Debug)]
pub struct IdIndex<'f> {
    insts: IndexMap<InstId, InstEntry<'f>>,
    blocks: IndexMap<BlockId, &'f BasicBlock>,
    inst_graph_order: HashMap<InstId, u32>,
    block_graph_order: HashMap<BlockId, u32>,
}

impl<'f> IdIndex<'f> {
    /// Indexes every block and instruction of `function` in program order.
    ///
    /// # Panics
    ///
    /// If two instructions or two blocks share an id. Snapshots loaded from
    /// disk are checked beforehand by `Snapshot::into_parts`.
    pub fn build(function: &'f Function) -> Self {
        let mut insts = IndexMap::with_capacity(function.inst_count());
        let mut blocks = IndexMap::with_capacity(function.block_count());
        for bb in function.blocks() {
            for inst in &bb.insts {
                if insts.insert(inst.id, InstEntry { inst, parent: bb.id }).is_some() {
                    panic!(
                        "contract violation: instruction id {} appears twice in function '{}'",
                        inst.id, function.name
                    );
                }
            }
            if blocks.insert(bb.id, bb).is_some() {
                panic!(
                    "contract violation: block id {} appears twice in function '{}'",
                    bb.id, function.name
                );
            }
        }
        tracing::debug!(
            function = %function.name,
            insts = insts.len(),
            blocks = blocks.len(),
            "indexed function"
        );
        IdIndex {
            insts,
            blocks,
            inst_graph_order: HashMap::new(),
            block_graph_order: HashMap::new(),
        }
    }

    /// Number of indexed instructions.
    pub fn inst_count(&self) -> usize {
        self.insts.len()
    }

    /// Number of indexed blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The indexed instruction, if it belongs to the function.
    pub fn inst(&self, id: InstId) -> Option<InstEntry<'f>> {
        self.insts.get(&id).copied()
    }

    /// The indexed block, if it belongs to the function.
    pub fn block(&self, id: BlockId) -> Option<&'f BasicBlock> {
        self.blocks.get(&id).copied()
    }

    pub fn inst_program_order(&self, id: InstId) -> Option<u32> {
        self.insts.get_index_of(&id).map(|i| to_order(i, "instruction program order"))
    }

    pub fn block_program_order(&self, id: BlockId) -> Option<u32> {
        self.blocks.get_index_of(&id).map(|i| to_order(i, "block program order"))
    }

    /// Both identifiers of an instruction.
    pub fn inst_pair(&self, id: InstId) -> Option<IdPair> {
        let program_order = self.inst_program_order(id)?;
        Some(IdPair {
            program_order,
            graph_order: self.inst_graph_order.get(&id).copied().unwrap_or(0),
        })
    }

    /// Both identifiers of a block.
    pub fn block_pair(&self, id: BlockId) -> Option<IdPair> {
        let program_order = self.block_program_order(id)?;
        Some(IdPair {
            program_order,
            graph_order: self.block_graph_order.get(&id).copied().unwrap_or(0),
        })
    }

    /// Sets the PDG traversal position of an instruction.
    pub fn record_inst_order(&mut self, id: InstId, seq: u32) {
        self.inst_graph_order.insert(id, seq);
    }

    /// Sets the CDG traversal position of a block.
    pub fn record_block_order(&mut self, id: BlockId, seq: u32) {
        self.block_graph_order.insert(id, seq);
    }

    /// Pre-pass over the CDG assigning every block its traversal position
    /// before any PDG record is emitted. The counter advances on every node,
    /// including nodes without a block.
    pub fn seed_block_order(&mut self, cdg: &Cdg) {
        for (seq, (_, node)) in cdg.nodes().enumerate() {
            if let Some(block) = node.block {
                self.record_block_order(block, to_order(seq, "CDG traversal position"));
            }
        }
    }

    /// Program-order id of the block containing `inst`.
    ///
    /// # Panics
    ///
    /// If `inst` is not part of the indexed function. A graph naming such an
    /// instruction violates the exporter's input contract.
    pub fn expect_parent_block_order(&self, inst: InstId) -> u32 {
        let entry = self.expect_inst(inst);
        match self.block_program_order(entry.parent) {
            Some(order) => order,
            None => panic!(
                "contract violation: parent block {} of instruction {} is not indexed",
                entry.parent, inst
            ),
        }
    }

    /// The indexed instruction.
    ///
    /// # Panics
    ///
    /// If `inst` is not part of the indexed function.
    pub fn expect_inst(&self, inst: InstId) -> InstEntry<'f> {
        match self.inst(inst) {
            Some(entry) => entry,
            None => panic!("contract violation: instruction {inst} is not part of the indexed function"),
        }
    }

    /// The indexed block.
    ///
    /// # Panics
    ///
    /// If `block` is not part of the indexed function.
    pub fn expect_block(&self, block: BlockId) -> &'f BasicBlock {
        match self.block(block) {
            Some(bb) => bb,
            None => panic!("contract violation: block {block} is not part of the indexed function"),
        }
    }
}

/// Narrows a position to the `u32` id space of the exported document.
///
/// # Panics
///
/// If `pos` does not fit in a `u32`.
pub(crate) fn to_order(pos: usize, what: &str) -> u32 {
    match u32::try_from(pos) {
        Ok(order) => order,
        Err(_) => panic!("contract violation: {what} {pos} exceeds the u32 id range"),
    }
}
