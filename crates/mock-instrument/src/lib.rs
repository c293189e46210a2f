// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! Static mock-injection instrumentation pass.
//!
//! Given a compiled program image, the pass locates mock registrations made
//! in test modules, resolves which real function each registration targets
//! and by which double class, then rewrites every targeted function into a
//! check/dispatch/fallback state machine: if a double has been installed on
//! the instance at run time, the call is redirected to the generic dispatch
//! routine; otherwise the original body runs unchanged.
//!
//! The pass is fail-soft throughout: malformed registrations are dropped,
//! classes that cannot be augmented are skipped, and a function whose rewrite
//! preconditions do not hold is left untouched. The single entry point
//! [`transform`] reports whether any step recorded an error.

pub mod call_site_scanner;
pub mod class_augmenter;
pub mod driver;
pub mod method_rewriter;
pub mod mock_registry;
pub mod options;
pub mod target_resolver;
pub mod type_adapter;
pub mod well_known;

pub use driver::{transform, MockInjectionPass};
pub use options::InstrumentOptions;
