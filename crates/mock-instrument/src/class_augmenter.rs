// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! Augmenting a mocked class with the storage and accessor needed to hold an
//! installed double at run time: a public nullable holder field, a null
//! store before every constructor return point, and a public installer
//! method. Each class is augmented at most once per run; later mocked
//! methods of the same class reuse the memoized field.

use std::collections::BTreeMap;
use std::fmt;

use image_model::{
    ClassId, Constant, FieldId, FuncId, FunctionBody, FunctionKind, Op, Operand, ProgramImage,
    Type, Visibility,
};
use log::debug;

use crate::type_adapter::ResolvedLibraryTypes;
use crate::well_known::{CTOR_NAME, HOLDER_FIELD, INSTALL_METHOD};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AugmentError {
    /// The class declares no constructor under the fixed name, so there is
    /// no place to clear the holder field.
    NoConstructor { class: String },
    /// A constructor has no body or no return point to splice before.
    NoReturnPoint { ctor: String },
}

impl fmt::Display for AugmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AugmentError::NoConstructor { class } => {
                write!(f, "class `{}` has no `{}`", class, CTOR_NAME)
            }
            AugmentError::NoReturnPoint { ctor } => {
                write!(f, "constructor `{}` has no return point", ctor)
            }
        }
    }
}

pub struct ClassAugmenter<'a> {
    types: &'a ResolvedLibraryTypes,
    augmented: BTreeMap<ClassId, FieldId>,
}

impl<'a> ClassAugmenter<'a> {
    pub fn new(types: &'a ResolvedLibraryTypes) -> Self {
        ClassAugmenter {
            types,
            augmented: BTreeMap::new(),
        }
    }

    /// The holder field of an already-augmented class, if any.
    pub fn holder_field(&self, class: ClassId) -> Option<FieldId> {
        self.augmented.get(&class).copied()
    }

    /// Ensures the class carries the holder field and installer, augmenting
    /// it on first call and returning the memoized field afterwards. On
    /// failure nothing is mutated and the class's mocked functions stay
    /// un-instrumented.
    pub fn ensure_augmented(
        &mut self,
        image: &mut ProgramImage,
        class: ClassId,
    ) -> Result<FieldId, AugmentError> {
        if let Some(field) = self.augmented.get(&class) {
            return Ok(*field);
        }

        // Validate before mutating: the class must have at least one
        // constructor, and every constructor must expose a return point.
        let class_name = image.get_class(class).get_full_name_str();
        let ctors: Vec<FuncId> = image
            .get_class(class)
            .find_methods(CTOR_NAME)
            .iter()
            .map(|f| f.id)
            .collect();
        if ctors.is_empty() {
            return Err(AugmentError::NoConstructor { class: class_name });
        }
        for &ctor in &ctors {
            let env = image.get_function(ctor);
            let has_return = env
                .get_body()
                .map(|body| !body.return_points().is_empty())
                .unwrap_or(false);
            if !has_return {
                return Err(AugmentError::NoReturnPoint {
                    ctor: env.get_full_name_str(),
                });
            }
        }

        // An image instrumented by an earlier pass invocation already carries
        // the field; reuse it instead of stacking a duplicate.
        if let Some(existing) = image.get_class(class).find_field(HOLDER_FIELD) {
            debug!(
                "class `{}` already carries `{}`; reusing",
                class_name, HOLDER_FIELD
            );
            let field = existing.id;
            self.augmented.insert(class, field);
            return Ok(field);
        }

        let field = image.add_field(
            class,
            HOLDER_FIELD,
            self.types.nullable_holder.clone(),
            Visibility::Public,
            false,
        );

        // Clear the field right before every constructor return point, so it
        // starts null for every new instance.
        for ctor in ctors {
            let data = image.function_mut(ctor);
            let body = data.body.as_mut().expect("validated above");
            let receiver = body.ensure_parameter(0);
            // Splice back to front so earlier indices stay valid.
            for (block, index) in body.return_points().into_iter().rev() {
                body.insert(
                    block,
                    index,
                    Op::StoreField(field),
                    vec![Operand::Instr(receiver), Operand::Value(Constant::Null)],
                );
            }
        }

        self.add_install_method(image, class, field);
        debug!("augmented class `{}` with `{}`", class_name, HOLDER_FIELD);
        self.augmented.insert(class, field);
        Ok(field)
    }

    /// Adds `installDouble(double)`: stores the argument into the holder
    /// field and returns, overwriting whatever construction stored there.
    fn add_install_method(&self, image: &mut ProgramImage, class: ClassId, field: FieldId) {
        let method = image.add_method(
            class,
            INSTALL_METHOD,
            vec![Type::Reference(self.types.holder_class)],
            Type::Void,
            Visibility::Public,
            false,
            FunctionKind::Regular,
        );
        let mut body = FunctionBody::new();
        let store_block = body.add_block();
        body.set_successors(body.entry(), vec![store_block]);
        body.set_successors(store_block, vec![body.exit()]);
        let receiver = body.ensure_parameter(0);
        let argument = body.ensure_parameter(1);
        body.emit(
            store_block,
            Op::StoreField(field),
            vec![Operand::Instr(receiver), Operand::Instr(argument)],
        );
        body.emit(store_block, Op::ReturnVoid, vec![]);
        image.set_body(method, body);
    }
}
