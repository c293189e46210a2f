// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! The program image: arenas of modules, classes, functions and fields,
//! plus the query/mutation capability instrumentation passes are written
//! against. Read access goes through the borrowed `*Env` wrappers; identity
//! is the arena index, never a rendered display name.

use codespan_reporting::diagnostic::Severity;
use std::cell::RefCell;

use crate::body::FunctionBody;
use crate::symbol::Symbol;
use crate::ty::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Where a function's body comes from. Only `Regular` functions carry a
/// scannable body; the other kinds are declarations resolved elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Regular,
    External,
    Abstract,
    Native,
}

#[derive(Debug)]
struct ModuleData {
    name: Symbol,
    classes: Vec<ClassId>,
    /// All functions declared in this module, methods included.
    functions: Vec<FuncId>,
}

#[derive(Debug)]
struct ClassData {
    module: ModuleId,
    name: Symbol,
    fields: Vec<FieldId>,
    methods: Vec<FuncId>,
}

#[derive(Debug)]
struct FieldData {
    owner: ClassId,
    name: Symbol,
    ty: Type,
    visibility: Visibility,
    is_static: bool,
}

#[derive(Debug)]
pub struct FunctionData {
    module: ModuleId,
    owner: Option<ClassId>,
    name: Symbol,
    visibility: Visibility,
    is_static: bool,
    kind: FunctionKind,
    /// Declared parameter types, receiver excluded. For instance methods the
    /// receiver is the implicit parameter 0 of the body; declared parameter
    /// `i` is parameter `i + 1` there.
    pub params: Vec<Type>,
    pub return_type: Type,
    pub body: Option<FunctionBody>,
}

/// The mutable compiled unit. Lives for the duration of a pass; mutated in
/// place; persisted by an external caller after the pass returns.
#[derive(Debug, Default)]
pub struct ProgramImage {
    modules: Vec<ModuleData>,
    classes: Vec<ClassData>,
    functions: Vec<FunctionData>,
    fields: Vec<FieldData>,
    diags: RefCell<Vec<(Severity, String)>>,
}

impl ProgramImage {
    pub fn new() -> Self {
        Self::default()
    }

    // -------- construction / mutation --------

    pub fn add_module(&mut self, name: impl Into<Symbol>) -> ModuleId {
        let id = ModuleId(self.modules.len());
        self.modules.push(ModuleData {
            name: name.into(),
            classes: Vec::new(),
            functions: Vec::new(),
        });
        id
    }

    pub fn add_class(&mut self, module: ModuleId, name: impl Into<Symbol>) -> ClassId {
        let id = ClassId(self.classes.len());
        self.classes.push(ClassData {
            module,
            name: name.into(),
            fields: Vec::new(),
            methods: Vec::new(),
        });
        self.modules[module.0].classes.push(id);
        id
    }

    pub fn add_field(
        &mut self,
        owner: ClassId,
        name: impl Into<Symbol>,
        ty: Type,
        visibility: Visibility,
        is_static: bool,
    ) -> FieldId {
        let id = FieldId(self.fields.len());
        self.fields.push(FieldData {
            owner,
            name: name.into(),
            ty,
            visibility,
            is_static,
        });
        self.classes[owner.0].fields.push(id);
        id
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_method(
        &mut self,
        owner: ClassId,
        name: impl Into<Symbol>,
        params: Vec<Type>,
        return_type: Type,
        visibility: Visibility,
        is_static: bool,
        kind: FunctionKind,
    ) -> FuncId {
        let module = self.classes[owner.0].module;
        let id = FuncId(self.functions.len());
        self.functions.push(FunctionData {
            module,
            owner: Some(owner),
            name: name.into(),
            visibility,
            is_static,
            kind,
            params,
            return_type,
            body: None,
        });
        self.classes[owner.0].methods.push(id);
        self.modules[module.0].functions.push(id);
        id
    }

    pub fn add_function(
        &mut self,
        module: ModuleId,
        name: impl Into<Symbol>,
        params: Vec<Type>,
        return_type: Type,
        kind: FunctionKind,
    ) -> FuncId {
        let id = FuncId(self.functions.len());
        self.functions.push(FunctionData {
            module,
            owner: None,
            name: name.into(),
            visibility: Visibility::Public,
            is_static: true,
            kind,
            params,
            return_type,
            body: None,
        });
        self.modules[module.0].functions.push(id);
        id
    }

    pub fn set_body(&mut self, func: FuncId, body: FunctionBody) {
        self.functions[func.0].body = Some(body);
    }

    pub fn set_return_type(&mut self, func: FuncId, ty: Type) {
        self.functions[func.0].return_type = ty;
    }

    /// Mutable access to a function's data, for passes which patch the body
    /// and the signature together.
    pub fn function_mut(&mut self, func: FuncId) -> &mut FunctionData {
        &mut self.functions[func.0]
    }

    // -------- lookup / enumeration --------

    pub fn modules(&self) -> impl Iterator<Item = ModuleEnv<'_>> {
        (0..self.modules.len()).map(move |i| ModuleEnv {
            image: self,
            id: ModuleId(i),
        })
    }

    pub fn get_module(&self, id: ModuleId) -> ModuleEnv<'_> {
        ModuleEnv { image: self, id }
    }

    pub fn get_class(&self, id: ClassId) -> ClassEnv<'_> {
        ClassEnv { image: self, id }
    }

    pub fn get_function(&self, id: FuncId) -> FunctionEnv<'_> {
        FunctionEnv { image: self, id }
    }

    pub fn get_field(&self, id: FieldId) -> FieldEnv<'_> {
        FieldEnv { image: self, id }
    }

    pub fn find_module(&self, name: &str) -> Option<ModuleEnv<'_>> {
        self.modules().find(|m| m.get_name().as_str() == name)
    }

    // -------- diagnostics --------

    /// Records a user-facing diagnostic. Error-severity diagnostics flip the
    /// overall result of a pass but never abort it.
    pub fn diag(&self, severity: Severity, msg: impl Into<String>) {
        self.diags.borrow_mut().push((severity, msg.into()));
    }

    pub fn has_errors(&self) -> bool {
        self.diags
            .borrow()
            .iter()
            .any(|(sev, _)| *sev >= Severity::Error)
    }

    pub fn diagnostics(&self) -> Vec<(Severity, String)> {
        self.diags.borrow().clone()
    }
}

// -------- borrowed environment wrappers --------

#[derive(Clone, Copy)]
pub struct ModuleEnv<'env> {
    pub image: &'env ProgramImage,
    pub id: ModuleId,
}

impl<'env> ModuleEnv<'env> {
    fn data(&self) -> &'env ModuleData {
        &self.image.modules[self.id.0]
    }

    pub fn get_name(&self) -> Symbol {
        self.data().name.clone()
    }

    pub fn get_full_name_str(&self) -> String {
        self.data().name.to_string()
    }

    pub fn classes(&self) -> impl Iterator<Item = ClassEnv<'env>> + 'env {
        let image = self.image;
        self.data().classes.iter().map(move |id| ClassEnv { image, id: *id })
    }

    /// All functions declared in the module, methods included.
    pub fn functions(&self) -> impl Iterator<Item = FunctionEnv<'env>> + 'env {
        let image = self.image;
        self.data()
            .functions
            .iter()
            .map(move |id| FunctionEnv { image, id: *id })
    }

    pub fn find_class(&self, simple_name: &str) -> Option<ClassEnv<'env>> {
        self.classes().find(|c| c.get_name().as_str() == simple_name)
    }
}

#[derive(Clone, Copy)]
pub struct ClassEnv<'env> {
    pub image: &'env ProgramImage,
    pub id: ClassId,
}

impl<'env> ClassEnv<'env> {
    fn data(&self) -> &'env ClassData {
        &self.image.classes[self.id.0]
    }

    pub fn get_name(&self) -> Symbol {
        self.data().name.clone()
    }

    pub fn module_env(&self) -> ModuleEnv<'env> {
        ModuleEnv {
            image: self.image,
            id: self.data().module,
        }
    }

    pub fn get_full_name_str(&self) -> String {
        format!("{}.{}", self.module_env().get_name(), self.get_name())
    }

    pub fn methods(&self) -> impl Iterator<Item = FunctionEnv<'env>> + 'env {
        let image = self.image;
        self.data()
            .methods
            .iter()
            .map(move |id| FunctionEnv { image, id: *id })
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldEnv<'env>> + 'env {
        let image = self.image;
        self.data().fields.iter().map(move |id| FieldEnv { image, id: *id })
    }

    pub fn find_method(&self, simple_name: &str) -> Option<FunctionEnv<'env>> {
        self.methods().find(|f| f.get_name().as_str() == simple_name)
    }

    /// All methods with the given name (a class may declare several explicit
    /// constructors under the fixed constructor name).
    pub fn find_methods(&self, simple_name: &str) -> Vec<FunctionEnv<'env>> {
        self.methods()
            .filter(|f| f.get_name().as_str() == simple_name)
            .collect()
    }

    pub fn find_field(&self, simple_name: &str) -> Option<FieldEnv<'env>> {
        self.fields().find(|f| f.get_name().as_str() == simple_name)
    }
}

#[derive(Clone, Copy)]
pub struct FunctionEnv<'env> {
    pub image: &'env ProgramImage,
    pub id: FuncId,
}

impl<'env> FunctionEnv<'env> {
    fn data(&self) -> &'env FunctionData {
        &self.image.functions[self.id.0]
    }

    pub fn get_name(&self) -> Symbol {
        self.data().name.clone()
    }

    pub fn module_env(&self) -> ModuleEnv<'env> {
        ModuleEnv {
            image: self.image,
            id: self.data().module,
        }
    }

    pub fn owner_class(&self) -> Option<ClassEnv<'env>> {
        self.data().owner.map(|id| ClassEnv {
            image: self.image,
            id,
        })
    }

    pub fn get_full_name_str(&self) -> String {
        match self.owner_class() {
            Some(class) => format!("{}.{}", class.get_full_name_str(), self.get_name()),
            None => format!("{}.{}", self.module_env().get_name(), self.get_name()),
        }
    }

    pub fn kind(&self) -> FunctionKind {
        self.data().kind
    }

    pub fn visibility(&self) -> Visibility {
        self.data().visibility
    }

    pub fn is_instance(&self) -> bool {
        self.data().owner.is_some() && !self.data().is_static
    }

    /// True for external, abstract and native functions, which carry no body
    /// to scan or rewrite.
    pub fn is_bodyless_kind(&self) -> bool {
        !matches!(self.data().kind, FunctionKind::Regular)
    }

    pub fn get_parameter_types(&self) -> &'env [Type] {
        &self.data().params
    }

    pub fn get_return_type(&self) -> &'env Type {
        &self.data().return_type
    }

    pub fn get_body(&self) -> Option<&'env FunctionBody> {
        self.data().body.as_ref()
    }
}

#[derive(Clone, Copy)]
pub struct FieldEnv<'env> {
    pub image: &'env ProgramImage,
    pub id: FieldId,
}

impl<'env> FieldEnv<'env> {
    fn data(&self) -> &'env FieldData {
        &self.image.fields[self.id.0]
    }

    pub fn get_name(&self) -> Symbol {
        self.data().name.clone()
    }

    pub fn owner_class(&self) -> ClassEnv<'env> {
        ClassEnv {
            image: self.image,
            id: self.data().owner,
        }
    }

    pub fn get_full_name_str(&self) -> String {
        format!("{}.{}", self.owner_class().get_full_name_str(), self.get_name())
    }

    pub fn get_type(&self) -> &'env Type {
        &self.data().ty
    }

    pub fn visibility(&self) -> Visibility {
        self.data().visibility
    }

    pub fn is_static(&self) -> bool {
        self.data().is_static
    }
}
