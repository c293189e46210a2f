// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::well_known::TEST_MODULE_SUFFIX;

/// Options for the mock-injection pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentOptions {
    /// Only modules whose qualified name ends with this suffix are scanned
    /// for registration sites.
    pub test_module_suffix: String,
    /// Dump the resolved registry at debug level.
    pub dump_registry: bool,
}

impl Default for InstrumentOptions {
    fn default() -> Self {
        Self {
            test_module_suffix: TEST_MODULE_SUFFIX.to_string(),
            dump_registry: false,
        }
    }
}
