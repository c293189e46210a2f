// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! Function bodies as control-flow graphs. Blocks and instructions live in
//! index-addressed arenas and edges are explicit successor-index lists, so
//! splicing new blocks in is an index-array operation with no dangling
//! references. Every body has exactly one entry block and one (dummy) exit
//! block; return instructions sit in ordinary blocks whose successor is the
//! exit block.

use crate::model::{ClassId, FieldId, FuncId};
use crate::symbol::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstrId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Str(Symbol),
}

/// An instruction input: either the result of a prior instruction or an
/// immediate constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Instr(InstrId),
    Value(Constant),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// The implicit receiver is parameter 0 of instance methods; declared
    /// parameters follow.
    Parameter(usize),
    /// Object construction; inputs are the constructor arguments.
    NewObject(ClassId),
    /// Array construction; inputs are the elements, in order.
    NewArray,
    /// Virtual call; input 0 is the receiver, the rest are arguments.
    CallVirtual(FuncId),
    CallStatic(FuncId),
    /// Input 0 is the object whose field is read.
    LoadField(FieldId),
    /// Input 0 is the object, input 1 the stored value.
    StoreField(FieldId),
    IsInstance(ClassId),
    Eq,
    /// Input 0 is the condition; successors are `[on_true, on_false]`.
    Branch,
    Jump,
    Return,
    ReturnVoid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub op: Op,
    pub inputs: Vec<Operand>,
}

#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    pub instrs: Vec<InstrId>,
    pub succs: Vec<BlockId>,
}

#[derive(Debug, Clone)]
pub struct FunctionBody {
    blocks: Vec<BasicBlock>,
    instrs: Vec<Instruction>,
    entry: BlockId,
    exit: BlockId,
}

impl FunctionBody {
    /// Creates a body with an entry block wired straight to the exit block.
    pub fn new() -> Self {
        let mut body = FunctionBody {
            blocks: vec![BasicBlock::default(), BasicBlock::default()],
            instrs: Vec::new(),
            entry: BlockId(0),
            exit: BlockId(1),
        };
        body.blocks[0].succs = vec![body.exit];
        body
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn exit(&self) -> BlockId {
        self.exit
    }

    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId)
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0]
    }

    pub fn instr(&self, id: InstrId) -> &Instruction {
        &self.instrs[id.0]
    }

    pub fn add_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(BasicBlock::default());
        id
    }

    /// Appends an instruction to the given block.
    pub fn emit(&mut self, block: BlockId, op: Op, inputs: Vec<Operand>) -> InstrId {
        let id = InstrId(self.instrs.len());
        self.instrs.push(Instruction { op, inputs });
        self.blocks[block.0].instrs.push(id);
        id
    }

    /// Inserts an instruction at `index` within the given block's sequence.
    pub fn insert(&mut self, block: BlockId, index: usize, op: Op, inputs: Vec<Operand>) -> InstrId {
        let id = InstrId(self.instrs.len());
        self.instrs.push(Instruction { op, inputs });
        self.blocks[block.0].instrs.insert(index, id);
        id
    }

    pub fn set_successors(&mut self, block: BlockId, succs: Vec<BlockId>) {
        self.blocks[block.0].succs = succs;
    }

    /// The instruction producing parameter `index`, if the entry block has
    /// one.
    pub fn find_parameter(&self, index: usize) -> Option<InstrId> {
        self.blocks[self.entry.0]
            .instrs
            .iter()
            .copied()
            .find(|id| matches!(self.instrs[id.0].op, Op::Parameter(i) if i == index))
    }

    /// Finds or creates the instruction producing parameter `index`. New
    /// parameter instructions are inserted after the existing ones at the
    /// head of the entry block.
    pub fn ensure_parameter(&mut self, index: usize) -> InstrId {
        if let Some(id) = self.find_parameter(index) {
            return id;
        }
        let at = self.blocks[self.entry.0]
            .instrs
            .iter()
            .take_while(|id| matches!(self.instrs[id.0].op, Op::Parameter(_)))
            .count();
        self.insert(self.entry, at, Op::Parameter(index), vec![])
    }

    /// All `Return`/`ReturnVoid` sites as `(block, index_in_block)` pairs, in
    /// block order.
    pub fn return_points(&self) -> Vec<(BlockId, usize)> {
        let mut points = Vec::new();
        for (b, block) in self.blocks.iter().enumerate() {
            for (i, id) in block.instrs.iter().enumerate() {
                if matches!(self.instrs[id.0].op, Op::Return | Op::ReturnVoid) {
                    points.push((BlockId(b), i));
                }
            }
        }
        points
    }

    /// Structural invariants required of every well-formed body: successor
    /// indices in range, entry has out-edges, the exit block is empty and
    /// terminal.
    pub fn verify(&self) -> Result<(), String> {
        for (b, block) in self.blocks.iter().enumerate() {
            for succ in &block.succs {
                if succ.0 >= self.blocks.len() {
                    return Err(format!("block {} has out-of-range successor {}", b, succ.0));
                }
            }
            for id in &block.instrs {
                if id.0 >= self.instrs.len() {
                    return Err(format!("block {} refers to unknown instruction {}", b, id.0));
                }
            }
        }
        if self.blocks[self.entry.0].succs.is_empty() {
            return Err("entry block has no successor".to_string());
        }
        if !self.blocks[self.exit.0].instrs.is_empty() || !self.blocks[self.exit.0].succs.is_empty()
        {
            return Err("exit block must be empty and terminal".to_string());
        }
        Ok(())
    }
}

impl Default for FunctionBody {
    fn default() -> Self {
        Self::new()
    }
}
