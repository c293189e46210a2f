// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! Aggregation of resolved registrations into a per-target-function map.
//! Keys are interned function ids, not rendered display names; display names
//! appear only in diagnostic output.

use std::collections::BTreeMap;

use image_model::{ClassId, FuncId, ProgramImage};
use itertools::Itertools;

/// Mapping from target function to the ordered, deduplicated list of double
/// classes registered against it.
#[derive(Debug, Default)]
pub struct MockRegistry {
    map: BTreeMap<FuncId, Vec<ClassId>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a double class for a target function. Returns false if this
    /// exact pairing was already present.
    pub fn add(&mut self, target: FuncId, double_class: ClassId) -> bool {
        let doubles = self.map.entry(target).or_default();
        if doubles.contains(&double_class) {
            return false;
        }
        doubles.push(double_class);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn doubles_for(&self, target: FuncId) -> &[ClassId] {
        self.map.get(&target).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (FuncId, &[ClassId])> {
        self.map.iter().map(|(f, ds)| (*f, ds.as_slice()))
    }

    /// Human-readable dump for debug logging.
    pub fn dump(&self, image: &ProgramImage) -> String {
        self.map
            .iter()
            .map(|(target, doubles)| {
                format!(
                    "{} <- [{}]",
                    image.get_function(*target).get_full_name_str(),
                    doubles
                        .iter()
                        .map(|d| image.get_class(*d).get_full_name_str())
                        .join(", ")
                )
            })
            .join("\n")
    }
}
