// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! The fixed naming conventions the pass recognizes: where the mock runtime
//! library lives, how registrations are spelled, and what gets added to
//! augmented classes.

use image_model::PrimitiveType;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Modules whose qualified name ends with this suffix are scanned for
/// registration sites (overridable through `InstrumentOptions`).
pub const TEST_MODULE_SUFFIX: &str = ".test";

/// The module holding the mock runtime library.
pub const MOCKKIT_MODULE: &str = "mockkit";

/// Registration entry point: `mockkit.MockKit.mockFunc(mocked, double)`.
/// A registration call has exactly three operands: the receiver and the two
/// class-construction instructions.
pub const REGISTER_CLASS: &str = "MockKit";
pub const REGISTER_METHOD: &str = "mockFunc";
pub const REGISTER_CALL_ARITY: usize = 3;

/// The class whose instances hold an installed double, and its generic
/// dispatch routine invoked by rewritten functions.
pub const DOUBLE_HOLDER_CLASS: &str = "MockDouble";
pub const DISPATCH_METHOD: &str = "dispatch";

/// Instances of this class signal "no double result; run the original body".
pub const NO_RESULT_CLASS: &str = "NoResult";

/// The single dispatch method every double class declares by convention.
pub const DOUBLE_INVOKE_METHOD: &str = "invoke";

/// Constructor naming convention.
pub const CTOR_NAME: &str = "constructor";

/// What the class augmenter adds: the hidden nullable holder field and the
/// public installer overwriting it.
pub const HOLDER_FIELD: &str = "__installed_double";
pub const INSTALL_METHOD: &str = "installDouble";

/// Standard-library module with `Object` and the primitive wrapper classes.
pub const STD_CORE_MODULE: &str = "std.core";
pub const OBJECT_CLASS: &str = "Object";

static BOXED_CLASS: Lazy<BTreeMap<PrimitiveType, &'static str>> = Lazy::new(|| {
    [
        (PrimitiveType::Bool, "Boolean"),
        (PrimitiveType::I16, "Short"),
        (PrimitiveType::I32, "Int"),
        (PrimitiveType::I64, "Long"),
        (PrimitiveType::U16, "Char"),
        (PrimitiveType::F32, "Float"),
        (PrimitiveType::F64, "Double"),
    ]
    .into_iter()
    .collect()
});

/// The wrapper class boxing the given primitive kind.
pub fn boxed_class_name(kind: PrimitiveType) -> &'static str {
    BOXED_CLASS[&kind]
}
