// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! Interned identifier strings. Comparing two symbols is a pointer
//! comparison, so symbol equality is a stable identity check rather than a
//! string comparison.

use internment::ArcIntern;
use std::fmt;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(ArcIntern<String>);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Symbol(ArcIntern::new(name.into()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.as_str())
    }
}
