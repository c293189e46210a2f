// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scanning test modules for mock-registration call sites.

use image_model::{ControlFlowGraph, FuncId, InstrId, Op, ProgramImage};
use itertools::Itertools;
use log::{debug, trace};

use crate::options::InstrumentOptions;
use crate::well_known::{MOCKKIT_MODULE, REGISTER_CALL_ARITY, REGISTER_CLASS, REGISTER_METHOD};

/// One candidate registration: a virtual call to the registration entry
/// point inside a test-module function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationSite {
    pub caller: FuncId,
    pub call: InstrId,
}

/// The registration entry point, if the image links the mock runtime at all.
pub fn find_register_entry(image: &ProgramImage) -> Option<FuncId> {
    image
        .find_module(MOCKKIT_MODULE)?
        .find_class(REGISTER_CLASS)?
        .find_method(REGISTER_METHOD)
        .map(|f| f.id)
}

/// Walks every function of every test module and collects virtual calls to
/// the registration entry point with exactly the expected operand arity
/// (receiver plus the two class-construction operands). Blocks are visited
/// in reverse postorder, instructions in block order, so the result is
/// deterministic.
pub fn collect_registration_sites(
    image: &ProgramImage,
    options: &InstrumentOptions,
) -> Vec<RegistrationSite> {
    let Some(register_fn) = find_register_entry(image) else {
        debug!("mock runtime not present in image; nothing to scan");
        return Vec::new();
    };

    let test_modules = image
        .modules()
        .filter(|m| {
            m.get_name()
                .as_str()
                .ends_with(&options.test_module_suffix)
        })
        .collect_vec();
    debug!(
        "scanning {} test module(s) for registration sites",
        test_modules.len()
    );

    let mut sites = Vec::new();
    for module in test_modules {
        for func in module.functions() {
            // External, abstract and native functions carry no body.
            if func.is_bodyless_kind() {
                continue;
            }
            let Some(body) = func.get_body() else {
                continue;
            };
            let cfg = ControlFlowGraph::new(body);
            for block in cfg.reverse_postorder() {
                for &instr in &body.block(block).instrs {
                    let ins = body.instr(instr);
                    let Op::CallVirtual(callee) = ins.op else {
                        continue;
                    };
                    if callee != register_fn {
                        continue;
                    }
                    if ins.inputs.len() != REGISTER_CALL_ARITY {
                        trace!(
                            "registration call in `{}` has {} operand(s), expected {}; skipped",
                            func.get_full_name_str(),
                            ins.inputs.len(),
                            REGISTER_CALL_ARITY
                        );
                        continue;
                    }
                    sites.push(RegistrationSite {
                        caller: func.id,
                        call: instr,
                    });
                }
            }
        }
    }
    debug!("found {} registration site(s)", sites.len());
    sites
}
