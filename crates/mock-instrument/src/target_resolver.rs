// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! Recovering the mocked function and the double class from a registration
//! call's operand instructions. All failure modes are non-fatal: the caller
//! logs the reason and drops the candidate.

use std::fmt;

use image_model::{ClassId, ControlFlowGraph, FuncId, FunctionBody, Op, Operand, ProgramImage};

use crate::call_site_scanner::RegistrationSite;
use crate::well_known::DOUBLE_INVOKE_METHOD;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveFailure {
    /// The registration call no longer exists or its caller has no body.
    MalformedSite,
    /// Operand `index` of the registration call is not an object
    /// construction.
    NotConstruction { index: usize },
    /// The double class declares no dispatch method under the fixed name.
    NoDispatchMethod { double: String },
    /// The double's dispatch method has no scannable body.
    MissingBody { double: String },
    /// The double's dispatch method makes no virtual call at all.
    NoForwardingCall { double: String },
    /// The double's dispatch method makes more than one virtual call, so the
    /// forwarded target is ambiguous.
    AmbiguousForwardingCall { double: String, count: usize },
    /// The forwarding call's target belongs to a class other than the one
    /// the registration claims to mock.
    ClassMismatch { claimed: String, found: String },
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveFailure::MalformedSite => write!(f, "registration site is malformed"),
            ResolveFailure::NotConstruction { index } => {
                write!(f, "operand {} is not an object construction", index)
            }
            ResolveFailure::NoDispatchMethod { double } => {
                write!(f, "double `{}` has no `{}` method", double, DOUBLE_INVOKE_METHOD)
            }
            ResolveFailure::MissingBody { double } => {
                write!(f, "dispatch method of double `{}` has no body", double)
            }
            ResolveFailure::NoForwardingCall { double } => {
                write!(f, "double `{}` forwards to no method", double)
            }
            ResolveFailure::AmbiguousForwardingCall { double, count } => write!(
                f,
                "double `{}` makes {} calls; the forwarded method is ambiguous",
                double, count
            ),
            ResolveFailure::ClassMismatch { claimed, found } => write!(
                f,
                "double forwards to `{}` but the registration mocks `{}`",
                found, claimed
            ),
        }
    }
}

/// A successfully resolved registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRegistration {
    pub target: FuncId,
    pub double_class: ClassId,
}

/// Resolves one candidate site: operand 1 is the claimed mocked class's
/// construction, operand 2 the double class's construction. The double's
/// dispatch method must forward to exactly one method, and that method's
/// statically-declared class must be the claimed mocked class.
pub fn resolve_registration(
    image: &ProgramImage,
    site: &RegistrationSite,
) -> Result<ResolvedRegistration, ResolveFailure> {
    let caller = image.get_function(site.caller);
    let body = caller.get_body().ok_or(ResolveFailure::MalformedSite)?;
    let call = body.instr(site.call);

    let claimed = constructed_class(body, &call.inputs, 1)?;
    let double_class = constructed_class(body, &call.inputs, 2)?;
    let double_env = image.get_class(double_class);
    let double_name = double_env.get_full_name_str();

    let invoke = double_env
        .find_method(DOUBLE_INVOKE_METHOD)
        .ok_or_else(|| ResolveFailure::NoDispatchMethod {
            double: double_name.clone(),
        })?;
    let invoke_body = invoke.get_body().ok_or_else(|| ResolveFailure::MissingBody {
        double: double_name.clone(),
    })?;

    let calls = forwarding_calls(invoke_body);
    let target = match calls.as_slice() {
        [] => {
            return Err(ResolveFailure::NoForwardingCall {
                double: double_name,
            })
        }
        [single] => *single,
        many => {
            return Err(ResolveFailure::AmbiguousForwardingCall {
                double: double_name,
                count: many.len(),
            })
        }
    };

    let target_env = image.get_function(target);
    let claimed_name = image.get_class(claimed).get_full_name_str();
    let found_name = match target_env.owner_class() {
        Some(owner) => owner.get_full_name_str(),
        None => target_env.module_env().get_full_name_str(),
    };
    if found_name != claimed_name {
        return Err(ResolveFailure::ClassMismatch {
            claimed: claimed_name,
            found: found_name,
        });
    }

    Ok(ResolvedRegistration {
        target,
        double_class,
    })
}

/// The class constructed by the instruction behind operand `index`.
fn constructed_class(
    body: &FunctionBody,
    inputs: &[Operand],
    index: usize,
) -> Result<ClassId, ResolveFailure> {
    let instr = match inputs.get(index) {
        Some(Operand::Instr(id)) => *id,
        _ => return Err(ResolveFailure::NotConstruction { index }),
    };
    match body.instr(instr).op {
        Op::NewObject(class) => Ok(class),
        _ => Err(ResolveFailure::NotConstruction { index }),
    }
}

/// All virtual-call targets in the body, in reverse-postorder scan order.
fn forwarding_calls(body: &FunctionBody) -> Vec<FuncId> {
    let cfg = ControlFlowGraph::new(body);
    let mut calls = Vec::new();
    for block in cfg.reverse_postorder() {
        for &instr in &body.block(block).instrs {
            if let Op::CallVirtual(callee) = body.instr(instr).op {
                calls.push(callee);
            }
        }
    }
    calls
}
