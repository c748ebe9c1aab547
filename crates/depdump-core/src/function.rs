//! Read-only function snapshot: basic blocks and their instructions.
//!
//! [`Function`] is the program representation the exporter walks. Blocks are
//! stored in program order and each block stores its instructions in program
//! order, so both enumerations are deterministic by construction.
//!
//! Snapshots are normally assembled with [`FunctionBuilder`], which hands out
//! dense [`InstId`]/[`BlockId`] values.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{BlockId, InstId};

/// One operation in the function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Stable identity of this instruction.
    pub id: InstId,
    /// Human-readable rendering, emitted verbatim as the record's `inst`.
    pub text: String,
    /// `true` if this instruction transfers control out of its block.
    #[serde(default)]
    pub is_terminator: bool,
}

/// An ordered sequence of instructions ending in at most one terminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    /// Stable identity of this block.
    pub id: BlockId,
    /// Optional symbolic name (`None` for anonymous blocks).
    #[serde(default)]
    pub name: Option<String>,
    /// Instructions in program order.
    #[serde(default)]
    pub insts: Vec<Instruction>,
}

impl BasicBlock {
    /// Returns the terminator, i.e. the last instruction if it is flagged as
    /// one. Blocks still under construction may have none.
    pub fn terminator(&self) -> Option<&Instruction> {
        self.insts.last().filter(|inst| inst.is_terminator)
    }

    /// Returns the block name, or `""` for anonymous blocks.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// A function: basic blocks in program order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    /// Function name.
    pub name: String,
    /// Basic blocks in program order.
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    /// Creates a function with no blocks.
    pub fn new(name: impl Into<String>) -> Self {
        Function {
            name: name.into(),
            blocks: Vec::new(),
        }
    }

    /// Iterates basic blocks in program order.
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.iter()
    }

    /// Iterates every instruction paired with its parent block, blocks in
    /// program order and instructions in block order.
    pub fn instructions(&self) -> impl Iterator<Item = (&BasicBlock, &Instruction)> {
        self.blocks
            .iter()
            .flat_map(|bb| bb.insts.iter().map(move |inst| (bb, inst)))
    }

    /// Looks up a block by identity.
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|bb| bb.id == id)
    }

    /// Total number of instructions across all blocks.
    pub fn inst_count(&self) -> usize {
        self.blocks.iter().map(|bb| bb.insts.len()).sum()
    }

    /// Number of basic blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Checks that no two blocks and no two instructions share an id.
    ///
    /// Program-order numbering is keyed by these ids, so a repeated id would
    /// merge two entities into one.
    pub fn check_unique_ids(&self) -> Result<(), CoreError> {
        let mut blocks = HashSet::with_capacity(self.block_count());
        let mut insts = HashSet::with_capacity(self.inst_count());
        for bb in &self.blocks {
            if !blocks.insert(bb.id) {
                return Err(self.duplicate("block", bb.id.0));
            }
            for inst in &bb.insts {
                if !insts.insert(inst.id) {
                    return Err(self.duplicate("instruction", inst.id.0));
                }
            }
        }
        Ok(())
    }

    fn duplicate(&self, kind: &'static str, id: u32) -> CoreError {
        CoreError::DuplicateId {
            kind,
            id,
            function: self.name.clone(),
        }
    }
}

/// Incremental builder for [`Function`] snapshots.
///
/// Instructions are appended to the most recently opened block. Ids are
/// allocated densely from zero in call order.
#[derive(Debug)]
pub struct FunctionBuilder {
    function: Function,
    next_inst: u32,
    next_block: u32,
}

impl FunctionBuilder {
    /// Starts a function with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        FunctionBuilder {
            function: Function::new(name),
            next_inst: 0,
            next_block: 0,
        }
    }

    /// Opens a new named block and returns its id.
    pub fn block(&mut self, name: impl Into<String>) -> BlockId {
        self.push_block(Some(name.into()))
    }

    /// Opens a new anonymous block and returns its id.
    pub fn anonymous_block(&mut self) -> BlockId {
        self.push_block(None)
    }

    /// Appends a non-terminator instruction to the current block.
    ///
    /// Opens an anonymous block first if none exists yet.
    pub fn inst(&mut self, text: impl Into<String>) -> InstId {
        self.push_inst(text.into(), false)
    }

    /// Appends a terminator instruction to the current block.
    pub fn terminator(&mut self, text: impl Into<String>) -> InstId {
        self.push_inst(text.into(), true)
    }

    /// Finishes construction.
    pub fn build(self) -> Function {
        self.function
    }

    fn push_block(&mut self, name: Option<String>) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        self.function.blocks.push(BasicBlock {
            id,
            name,
            insts: Vec::new(),
        });
        id
    }

    fn push_inst(&mut self, text: String, is_terminator: bool) -> InstId {
        if self.function.blocks.is_empty() {
            self.push_block(None);
        }
        let id = InstId(self.next_inst);
        self.next_inst += 1;
        if let Some(bb) = self.function.blocks.last_mut() {
            bb.insts.push(Instruction {
                id,
                text,
                is_terminator,
            });
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_block_function() -> Function {
        let mut b = FunctionBuilder::new("f");
        b.block("entry");
        b.inst("%x = add i32 1, 2");
        b.terminator("br label %exit");
        b.block("exit");
        b.terminator("ret void");
        b.build()
    }

    #[test]
    fn builder_assigns_dense_ids() {
        let f = two_block_function();
        let ids: Vec<u32> = f.instructions().map(|(_, inst)| inst.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        let blocks: Vec<u32> = f.blocks().map(|bb| bb.id.0).collect();
        assert_eq!(blocks, vec![0, 1]);
        assert_eq!(f.inst_count(), 3);
        assert_eq!(f.block_count(), 2);
    }

    #[test]
    fn instructions_carry_parent_block() {
        let f = two_block_function();
        let parents: Vec<BlockId> = f.instructions().map(|(bb, _)| bb.id).collect();
        assert_eq!(parents, vec![BlockId(0), BlockId(0), BlockId(1)]);
    }

    #[test]
    fn terminator_requires_flag() {
        let mut b = FunctionBuilder::new("g");
        b.block("open");
        b.inst("%y = load i32, ptr %p");
        let f = b.build();
        assert!(f.blocks[0].terminator().is_none());

        let f = two_block_function();
        assert_eq!(f.blocks[0].terminator().map(|t| t.id), Some(InstId(1)));
        assert_eq!(f.blocks[1].terminator().map(|t| t.id), Some(InstId(2)));
    }

    #[test]
    fn anonymous_block_name_is_empty() {
        let mut b = FunctionBuilder::new("h");
        b.terminator("ret void");
        let f = b.build();
        assert_eq!(f.block_count(), 1);
        assert_eq!(f.blocks[0].name_or_empty(), "");
    }

    #[test]
    fn block_lookup_by_id() {
        let f = two_block_function();
        assert_eq!(f.block(BlockId(1)).map(|bb| bb.name_or_empty()), Some("exit"));
        assert!(f.block(BlockId(9)).is_none());
    }

    #[test]
    fn builder_output_has_unique_ids() {
        assert!(two_block_function().check_unique_ids().is_ok());
    }

    #[test]
    fn repeated_inst_id_across_blocks_is_rejected() {
        let mut f = two_block_function();
        f.blocks[1].insts[0].id = InstId(0);
        let err = f.check_unique_ids().unwrap_err();
        assert!(matches!(
            err,
            CoreError::DuplicateId { kind: "instruction", id: 0, .. }
        ));
        assert_eq!(err.to_string(), "duplicate instruction id 0 in function 'f'");
    }

    #[test]
    fn repeated_block_id_is_rejected() {
        let mut f = two_block_function();
        f.blocks[1].id = BlockId(0);
        assert!(matches!(
            f.check_unique_ids(),
            Err(CoreError::DuplicateId { kind: "block", id: 0, .. })
        ));
    }

    #[test]
    fn serde_roundtrip_function() {
        let f = two_block_function();
        let json = serde_json::to_string(&f).unwrap();
        let back: Function = serde_json::from_str(&json).unwrap();
        assert_eq!(f, back);
    }
}
