// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resolution of the well-known library classes, functions and types the
//! augmenter and rewriter need. Resolved once per pass into an id-only
//! struct that is passed by reference; nothing here borrows the image, so
//! the pass stays free to mutate it.

use std::collections::BTreeMap;
use std::fmt;

use image_model::{ClassEnv, ClassId, FuncId, ModuleEnv, PrimitiveType, ProgramImage, Type};
use log::debug;

use crate::well_known::{
    boxed_class_name, CTOR_NAME, DISPATCH_METHOD, DOUBLE_HOLDER_CLASS, MOCKKIT_MODULE,
    NO_RESULT_CLASS, OBJECT_CLASS, STD_CORE_MODULE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    MissingModule(String),
    MissingClass(String),
    MissingFunction(String),
    UnionConstruction(String),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::MissingModule(name) => write!(f, "module `{}` not found", name),
            AdapterError::MissingClass(name) => write!(f, "class `{}` not found", name),
            AdapterError::MissingFunction(name) => write!(f, "function `{}` not found", name),
            AdapterError::UnionConstruction(what) => {
                write!(f, "cannot construct union type {}", what)
            }
        }
    }
}

/// The boxing constructor for one primitive kind: the wrapper class and its
/// single-parameter constructor.
#[derive(Debug, Clone, Copy)]
pub struct BoxingCtor {
    pub class: ClassId,
    pub ctor: FuncId,
}

/// All well-known ids and types the augmenter/rewriter depend on.
#[derive(Debug, Clone)]
pub struct ResolvedLibraryTypes {
    pub object_class: ClassId,
    pub holder_class: ClassId,
    pub sentinel_class: ClassId,
    /// The generic dispatch routine on the holder class.
    pub dispatch_fn: FuncId,
    /// `MockDouble | Null`, the holder field type.
    pub nullable_holder: Type,
    /// `Object | Null`, the widened return type of rewritten functions.
    pub widened_return: Type,
    boxing: BTreeMap<PrimitiveType, BoxingCtor>,
}

impl ResolvedLibraryTypes {
    pub fn resolve(image: &ProgramImage) -> Result<Self, AdapterError> {
        let core = image
            .find_module(STD_CORE_MODULE)
            .ok_or_else(|| AdapterError::MissingModule(STD_CORE_MODULE.to_string()))?;
        let object_class = find_class(&core, OBJECT_CLASS)?;

        let mockkit = image
            .find_module(MOCKKIT_MODULE)
            .ok_or_else(|| AdapterError::MissingModule(MOCKKIT_MODULE.to_string()))?;
        let holder = mockkit
            .find_class(DOUBLE_HOLDER_CLASS)
            .ok_or_else(|| AdapterError::MissingClass(DOUBLE_HOLDER_CLASS.to_string()))?;
        let sentinel_class = find_class(&mockkit, NO_RESULT_CLASS)?;
        let dispatch_fn = holder
            .find_method(DISPATCH_METHOD)
            .map(|f| f.id)
            .ok_or_else(|| {
                AdapterError::MissingFunction(format!(
                    "{}.{}",
                    holder.get_full_name_str(),
                    DISPATCH_METHOD
                ))
            })?;

        let mut boxing = BTreeMap::new();
        for kind in PrimitiveType::ALL {
            let wrapper = core.find_class(boxed_class_name(kind)).ok_or_else(|| {
                AdapterError::MissingClass(format!("{}.{}", STD_CORE_MODULE, boxed_class_name(kind)))
            })?;
            let ctor = boxing_ctor(&wrapper, kind)?;
            boxing.insert(
                kind,
                BoxingCtor {
                    class: wrapper.id,
                    ctor,
                },
            );
        }

        let nullable_holder = Type::nullable(Type::Reference(holder.id));
        let widened_return = Type::union([Type::Reference(object_class), Type::Null])
            .ok_or_else(|| AdapterError::UnionConstruction("Object | Null".to_string()))?;

        debug!(
            "resolved mock runtime library: holder `{}`, sentinel `{}`",
            holder.get_full_name_str(),
            image.get_class(sentinel_class).get_full_name_str()
        );

        Ok(ResolvedLibraryTypes {
            object_class,
            holder_class: holder.id,
            sentinel_class,
            dispatch_fn,
            nullable_holder,
            widened_return,
            boxing,
        })
    }

    /// The boxing constructor for the given primitive kind. Resolution covers
    /// all kinds, so this lookup is total.
    pub fn boxing_ctor(&self, kind: PrimitiveType) -> BoxingCtor {
        self.boxing[&kind]
    }
}

fn find_class(module: &ModuleEnv<'_>, name: &str) -> Result<ClassId, AdapterError> {
    module
        .find_class(name)
        .map(|c| c.id)
        .ok_or_else(|| AdapterError::MissingClass(format!("{}.{}", module.get_name(), name)))
}

/// The constructor taking exactly one parameter of the given primitive kind.
fn boxing_ctor(wrapper: &ClassEnv<'_>, kind: PrimitiveType) -> Result<FuncId, AdapterError> {
    wrapper
        .find_methods(CTOR_NAME)
        .into_iter()
        .find(|ctor| ctor.get_parameter_types() == [Type::Primitive(kind)])
        .map(|ctor| ctor.id)
        .ok_or_else(|| {
            AdapterError::MissingFunction(format!(
                "{}.{}({:?})",
                wrapper.get_full_name_str(),
                CTOR_NAME,
                kind
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_model::{FunctionKind, Visibility};

    fn image_with_library() -> ProgramImage {
        let mut image = ProgramImage::new();
        let core = image.add_module(STD_CORE_MODULE);
        image.add_class(core, OBJECT_CLASS);
        for kind in PrimitiveType::ALL {
            let wrapper = image.add_class(core, boxed_class_name(kind));
            image.add_method(
                wrapper,
                CTOR_NAME,
                vec![Type::Primitive(kind)],
                Type::Void,
                Visibility::Public,
                false,
                FunctionKind::Native,
            );
        }
        let mockkit = image.add_module(MOCKKIT_MODULE);
        let holder = image.add_class(mockkit, DOUBLE_HOLDER_CLASS);
        image.add_class(mockkit, NO_RESULT_CLASS);
        image.add_method(
            holder,
            DISPATCH_METHOD,
            vec![],
            Type::Void,
            Visibility::Public,
            false,
            FunctionKind::Native,
        );
        image
    }

    #[test]
    fn resolves_all_well_known_symbols() {
        let image = image_with_library();
        let types = ResolvedLibraryTypes::resolve(&image).unwrap();
        for kind in PrimitiveType::ALL {
            let ctor = types.boxing_ctor(kind);
            let env = image.get_function(ctor.ctor);
            assert_eq!(env.get_parameter_types(), [Type::Primitive(kind)]);
            assert_eq!(env.owner_class().unwrap().id, ctor.class);
        }
        assert_eq!(
            types.widened_return,
            Type::union([Type::Reference(types.object_class), Type::Null]).unwrap()
        );
    }

    #[test]
    fn missing_stdlib_is_reported() {
        let image = ProgramImage::new();
        match ResolvedLibraryTypes::resolve(&image) {
            Err(AdapterError::MissingModule(name)) => assert_eq!(name, STD_CORE_MODULE),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_wrapper_ctor_is_reported() {
        let mut image = ProgramImage::new();
        let core = image.add_module(STD_CORE_MODULE);
        image.add_class(core, OBJECT_CLASS);
        // Wrapper classes exist but carry no constructors.
        for kind in PrimitiveType::ALL {
            image.add_class(core, boxed_class_name(kind));
        }
        let mockkit = image.add_module(MOCKKIT_MODULE);
        let holder = image.add_class(mockkit, DOUBLE_HOLDER_CLASS);
        image.add_class(mockkit, NO_RESULT_CLASS);
        image.add_method(
            holder,
            DISPATCH_METHOD,
            vec![],
            Type::Void,
            Visibility::Public,
            false,
            FunctionKind::Native,
        );
        assert!(matches!(
            ResolvedLibraryTypes::resolve(&image),
            Err(AdapterError::MissingFunction(_))
        ));
    }
}
