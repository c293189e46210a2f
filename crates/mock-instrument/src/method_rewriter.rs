// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! The CFG surgery turning a mocked function's body into a
//! check/dispatch/fallback state machine:
//!
//! ```text
//! entry -> CheckInstalled -+-(holder null)------> original body -> exit
//!                          `-(holder set)-> Dispatch -+-(sentinel)-> original body
//!                                                     `-(value)---> ReturnMocked -> exit
//! ```
//!
//! The rewrite either succeeds completely or leaves the body untouched;
//! there is no partially rewritten state.

use std::fmt;

use image_model::{
    BlockId, ClassId, Constant, FieldId, FuncId, InstrId, Op, Operand, ProgramImage, Symbol, Type,
};
use log::debug;

use crate::type_adapter::ResolvedLibraryTypes;
use crate::well_known::HOLDER_FIELD;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// The target is not an instance method, so there is no receiver to load
    /// the holder field from.
    NotAnInstanceMethod { func: String },
    /// The owning class carries no holder field; augmentation must have
    /// failed or never run.
    MissingHolderField { class: String },
    /// The function has no body to rewrite.
    MissingBody { func: String },
    /// The body has no receiver (parameter 0) instruction in its entry
    /// block.
    MissingReceiver { func: String },
    /// The entry block does not have the single successor every well-formed
    /// body starts with.
    MalformedEntry { func: String },
    /// The entry block carries instructions other than parameters, so code
    /// would run before the installed-double check.
    EntryHasEffects { func: String },
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteError::NotAnInstanceMethod { func } => {
                write!(f, "`{}` is not an instance method", func)
            }
            RewriteError::MissingHolderField { class } => {
                write!(f, "class `{}` has no `{}` field", class, HOLDER_FIELD)
            }
            RewriteError::MissingBody { func } => write!(f, "`{}` has no body", func),
            RewriteError::MissingReceiver { func } => {
                write!(f, "`{}` has no receiver instruction", func)
            }
            RewriteError::MalformedEntry { func } => {
                write!(f, "`{}` has a malformed entry block", func)
            }
            RewriteError::EntryHasEffects { func } => {
                write!(f, "`{}` has non-parameter instructions in its entry block", func)
            }
        }
    }
}

/// Rewrites the target function in place and widens its declared return type
/// to `Object | Null`, so both the original return value and an arbitrary
/// dispatch result are legal.
pub fn rewrite_function(
    image: &mut ProgramImage,
    func: FuncId,
    types: &ResolvedLibraryTypes,
) -> Result<(), RewriteError> {
    // Gather everything that needs read access to the image before taking
    // the mutable borrow of the function data.
    let (func_name, class_name, class_id, param_types) = {
        let env = image.get_function(func);
        let func_name = env.get_full_name_str();
        let owner = env
            .owner_class()
            .ok_or_else(|| RewriteError::NotAnInstanceMethod {
                func: func_name.clone(),
            })?;
        (
            func_name,
            owner.get_full_name_str(),
            owner.id,
            env.get_parameter_types().to_vec(),
        )
    };
    let holder_field: FieldId = image
        .get_class(class_id)
        .find_field(HOLDER_FIELD)
        .map(|f| f.id)
        .ok_or_else(|| RewriteError::MissingHolderField {
            class: class_name.clone(),
        })?;
    let boxing: Vec<Option<ClassId>> = param_types
        .iter()
        .map(|t| t.as_primitive().map(|p| types.boxing_ctor(p).class))
        .collect();
    let widened: Type = types.widened_return.clone();

    let data = image.function_mut(func);
    let body = data.body.as_mut().ok_or_else(|| RewriteError::MissingBody {
        func: func_name.clone(),
    })?;

    // Preconditions; checked before any mutation.
    let receiver: InstrId = body
        .find_parameter(0)
        .ok_or_else(|| RewriteError::MissingReceiver {
            func: func_name.clone(),
        })?;
    let entry = body.entry();
    let old_first: BlockId = match body.block(entry).succs.as_slice() {
        [first] => *first,
        _ => {
            return Err(RewriteError::MalformedEntry {
                func: func_name.clone(),
            })
        }
    };
    // The spliced check block must run before any original code. A body that
    // keeps real instructions (or its return) in the entry block would
    // execute them ahead of the check, so such a shape is rejected whole.
    let effectful = body
        .block(entry)
        .instrs
        .iter()
        .any(|id| !matches!(body.instr(*id).op, Op::Parameter(_)));
    if effectful {
        return Err(RewriteError::EntryHasEffects {
            func: func_name.clone(),
        });
    }

    // Declared parameters feed the dispatch array; materialize any that the
    // original body never referenced.
    let params: Vec<InstrId> = (0..param_types.len())
        .map(|i| body.ensure_parameter(i + 1))
        .collect();

    let check = body.add_block();
    let dispatch = body.add_block();
    let return_mocked = body.add_block();

    // CheckInstalled: load the holder field and compare it to null.
    let holder = body.emit(check, Op::LoadField(holder_field), vec![Operand::Instr(receiver)]);
    let is_null = body.emit(
        check,
        Op::Eq,
        vec![Operand::Instr(holder), Operand::Value(Constant::Null)],
    );
    body.emit(check, Op::Branch, vec![Operand::Instr(is_null)]);
    body.set_successors(check, vec![old_first, dispatch]);

    // Dispatch: box primitive parameters, build the argument array in
    // original parameter order, call the dispatch routine, and test the
    // result against the no-result sentinel.
    let mut boxed = Vec::with_capacity(params.len());
    for (param, wrapper) in params.iter().zip(&boxing) {
        let value = match wrapper {
            Some(class) => body.emit(dispatch, Op::NewObject(*class), vec![Operand::Instr(*param)]),
            None => *param,
        };
        boxed.push(Operand::Instr(value));
    }
    let array = body.emit(dispatch, Op::NewArray, boxed);
    let result = body.emit(
        dispatch,
        Op::CallVirtual(types.dispatch_fn),
        vec![
            Operand::Instr(holder),
            Operand::Value(Constant::Str(Symbol::new(class_name))),
            Operand::Value(Constant::Str(Symbol::new(func_name.clone()))),
            Operand::Instr(array),
        ],
    );
    let is_sentinel = body.emit(
        dispatch,
        Op::IsInstance(types.sentinel_class),
        vec![Operand::Instr(result)],
    );
    body.emit(dispatch, Op::Branch, vec![Operand::Instr(is_sentinel)]);
    body.set_successors(dispatch, vec![old_first, return_mocked]);

    // ReturnMocked: hand the dispatch result straight back.
    body.emit(return_mocked, Op::Return, vec![Operand::Instr(result)]);
    let exit = body.exit();
    body.set_successors(return_mocked, vec![exit]);

    // Splice the state machine in front of the original body.
    body.set_successors(entry, vec![check]);

    data.return_type = widened;
    debug!("rewrote `{}` into check/dispatch/fallback form", func_name);
    Ok(())
}
