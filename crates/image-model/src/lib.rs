// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-memory model of a compiled program image for a class-based bytecode VM:
//! nominal symbols (modules, classes, functions, fields), type descriptors,
//! and function bodies as control-flow graphs of basic blocks. The model is
//! mutable in place; instrumentation passes query it through borrowed `*Env`
//! wrappers and mutate it through the `ProgramImage` API.

pub mod body;
pub mod cfg;
pub mod model;
pub mod symbol;
pub mod ty;

pub use body::{BasicBlock, BlockId, Constant, FunctionBody, InstrId, Instruction, Op, Operand};
pub use cfg::ControlFlowGraph;
pub use model::{
    ClassEnv, ClassId, FieldEnv, FieldId, FuncId, FunctionEnv, FunctionKind, ModuleEnv, ModuleId,
    ProgramImage, Visibility,
};
pub use symbol::Symbol;
pub use ty::{PrimitiveType, Type};
