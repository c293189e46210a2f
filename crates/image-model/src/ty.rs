// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! Type descriptors: primitives, nominal references, null, and unions.
//! Union members are ordered and deduplicated at construction time.

use crate::model::ClassId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrimitiveType {
    Bool,
    I16,
    I32,
    I64,
    U16,
    F32,
    F64,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 7] = [
        PrimitiveType::Bool,
        PrimitiveType::I16,
        PrimitiveType::I32,
        PrimitiveType::I64,
        PrimitiveType::U16,
        PrimitiveType::F32,
        PrimitiveType::F64,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    Primitive(PrimitiveType),
    Reference(ClassId),
    Null,
    /// Ordered, deduplicated set of at least two member types. Construct via
    /// `Type::union` to maintain the invariant.
    Union(Vec<Type>),
    Void,
}

impl Type {
    /// Builds a union type from the given members, flattening nested unions,
    /// ordering and deduplicating. Returns `None` if fewer than two distinct
    /// members remain.
    pub fn union(members: impl IntoIterator<Item = Type>) -> Option<Type> {
        let mut flat = Vec::new();
        for m in members {
            match m {
                Type::Union(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        flat.sort();
        flat.dedup();
        if flat.len() < 2 {
            return None;
        }
        Some(Type::Union(flat))
    }

    /// The nullable form of `ty`, i.e. `ty | Null`. Already-nullable input
    /// (including `Null` itself) comes back unchanged.
    pub fn nullable(ty: Type) -> Type {
        match Type::union([ty.clone(), Type::Null]) {
            Some(union) => union,
            None => ty,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self {
            Type::Primitive(p) => Some(*p),
            _ => None,
        }
    }
}
