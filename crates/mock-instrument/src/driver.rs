// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! Orchestration of the whole pass over one program image. Errors are
//! logged and aggregated into the boolean result, never propagated as
//! aborts: the pass always attempts every remaining registration.

use std::collections::BTreeSet;

use codespan_reporting::diagnostic::Severity;
use image_model::{FuncId, ProgramImage};
use log::{debug, info, warn};

use crate::call_site_scanner::collect_registration_sites;
use crate::class_augmenter::ClassAugmenter;
use crate::method_rewriter::rewrite_function;
use crate::mock_registry::MockRegistry;
use crate::options::InstrumentOptions;
use crate::target_resolver::resolve_registration;
use crate::type_adapter::ResolvedLibraryTypes;

/// The mock-injection pass. Invoked once per compiled program image.
#[derive(Debug, Default)]
pub struct MockInjectionPass {
    options: InstrumentOptions,
}

impl MockInjectionPass {
    pub fn new(options: InstrumentOptions) -> Self {
        MockInjectionPass { options }
    }

    /// Runs the pass to completion. Returns false if any step recorded an
    /// error; processing continues best-effort through the remaining
    /// registrations regardless.
    pub fn run(&self, image: &mut ProgramImage) -> bool {
        info!("mock-injection pass started");

        let sites = collect_registration_sites(image, &self.options);
        let mut registry = MockRegistry::new();
        for site in &sites {
            match resolve_registration(image, site) {
                Ok(resolved) => {
                    registry.add(resolved.target, resolved.double_class);
                }
                Err(reason) => {
                    // Heuristic mismatches are expected; drop the candidate.
                    debug!(
                        "dropping registration in `{}`: {}",
                        image.get_function(site.caller).get_full_name_str(),
                        reason
                    );
                }
            }
        }

        if registry.is_empty() {
            info!("no resolvable mock registrations; image left unchanged");
            return !image.has_errors();
        }
        if self.options.dump_registry {
            debug!("mock registry:\n{}", registry.dump(image));
        }

        let types = match ResolvedLibraryTypes::resolve(image) {
            Ok(types) => types,
            Err(err) => {
                image.diag(
                    Severity::Error,
                    format!("cannot resolve mock runtime library: {}", err),
                );
                return false;
            }
        };

        let mut all_ok = true;
        let mut processed: BTreeSet<FuncId> = BTreeSet::new();
        let mut augmenter = ClassAugmenter::new(&types);
        for (target, doubles) in registry.iter() {
            // At most one transformation per target function per run.
            if !processed.insert(target) {
                continue;
            }

            let (owner, name) = {
                let env = image.get_function(target);
                (env.owner_class().map(|c| c.id), env.get_full_name_str())
            };
            let Some(owner) = owner else {
                warn!("mocked function `{}` has no owning class; skipped", name);
                all_ok = false;
                continue;
            };
            debug!("instrumenting `{}` ({} double(s))", name, doubles.len());

            if let Err(err) = augmenter.ensure_augmented(image, owner) {
                image.diag(
                    Severity::Error,
                    format!("cannot augment class for `{}`: {}", name, err),
                );
                all_ok = false;
                continue;
            }
            if let Err(err) = rewrite_function(image, target, &types) {
                image.diag(
                    Severity::Error,
                    format!("cannot rewrite `{}`: {}", name, err),
                );
                all_ok = false;
                continue;
            }
        }

        info!(
            "mock-injection pass finished: {} target function(s), errors: {}",
            registry.len(),
            !all_ok || image.has_errors()
        );
        all_ok && !image.has_errors()
    }
}

/// The single externally observable entry point of the pass.
pub fn transform(image: &mut ProgramImage) -> bool {
    MockInjectionPass::default().run(image)
}
