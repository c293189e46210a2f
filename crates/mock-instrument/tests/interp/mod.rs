// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! A deliberately small interpreter for the instruction set, just enough to
//! execute instrumented bodies in tests. Calls to the dispatch routine are
//! intercepted by a test-provided hook instead of being evaluated.

use std::collections::BTreeMap;

use image_model::{
    BlockId, ClassId, Constant, FieldId, FuncId, FunctionBody, FunctionKind, InstrId, Op, Operand,
    ProgramImage,
};

use mock_instrument::well_known::CTOR_NAME;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Str(String),
    /// Heap index of an allocated object.
    Obj(usize),
    Arr(Vec<Value>),
}

#[derive(Debug, Clone)]
pub struct ObjData {
    pub class: ClassId,
    pub fields: BTreeMap<FieldId, Value>,
    /// The arguments the object was constructed with, recorded so tests can
    /// check what a boxing construction wrapped.
    pub ctor_args: Vec<Value>,
}

pub struct Machine<'a> {
    image: &'a ProgramImage,
    dispatch_fn: FuncId,
    heap: Vec<ObjData>,
    /// Receives `[receiver, class name, function name, argument array]` for
    /// every call to the dispatch routine and produces its result.
    pub dispatch_hook: Option<Box<dyn FnMut(&[Value]) -> Value + 'a>>,
    pub dispatch_calls: usize,
}

impl<'a> Machine<'a> {
    pub fn new(image: &'a ProgramImage, dispatch_fn: FuncId) -> Self {
        Machine {
            image,
            dispatch_fn,
            heap: Vec::new(),
            dispatch_hook: None,
            dispatch_calls: 0,
        }
    }

    /// Allocates an object without running any constructor.
    pub fn alloc(&mut self, class: ClassId, ctor_args: Vec<Value>) -> Value {
        self.heap.push(ObjData {
            class,
            fields: BTreeMap::new(),
            ctor_args,
        });
        Value::Obj(self.heap.len() - 1)
    }

    /// Allocates an object and runs its zero-argument constructor, if the
    /// class declares a runnable one.
    pub fn construct(&mut self, class: ClassId) -> Value {
        self.alloc_and_init(class, vec![])
    }

    pub fn field(&self, obj: &Value, field: FieldId) -> Value {
        let Value::Obj(index) = obj else {
            panic!("field read on non-object {:?}", obj);
        };
        self.heap[*index]
            .fields
            .get(&field)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn object_parts(&self, obj: &Value) -> (ClassId, Vec<Value>) {
        let Value::Obj(index) = obj else {
            panic!("not an object: {:?}", obj);
        };
        let data = &self.heap[*index];
        (data.class, data.ctor_args.clone())
    }

    /// Calls a function with an explicit receiver and argument list. Calls
    /// to the dispatch routine are routed to the hook.
    pub fn call(&mut self, func: FuncId, this: Value, args: Vec<Value>) -> Value {
        if func == self.dispatch_fn {
            self.dispatch_calls += 1;
            let mut all = vec![this];
            all.extend(args);
            let hook = self
                .dispatch_hook
                .as_mut()
                .expect("dispatch reached without a hook installed");
            return hook(&all);
        }
        let image = self.image;
        let env = image.get_function(func);
        let body = env
            .get_body()
            .unwrap_or_else(|| panic!("`{}` has no body to run", env.get_full_name_str()));
        self.eval(body, this, args)
    }

    fn alloc_and_init(&mut self, class: ClassId, args: Vec<Value>) -> Value {
        let obj = self.alloc(class, args.clone());
        let image = self.image;
        let ctor = image
            .get_class(class)
            .find_methods(CTOR_NAME)
            .into_iter()
            .find(|c| c.kind() == FunctionKind::Regular && c.get_body().is_some());
        if let Some(ctor) = ctor {
            self.call(ctor.id, obj.clone(), args);
        }
        obj
    }

    fn eval(&mut self, body: &'a FunctionBody, this: Value, args: Vec<Value>) -> Value {
        let mut values: BTreeMap<InstrId, Value> = BTreeMap::new();
        let mut block = body.entry();
        loop {
            if block == body.exit() {
                return Value::Null;
            }
            let mut next: Option<BlockId> = None;
            for &id in &body.block(block).instrs {
                let ins = body.instr(id);
                let inputs: Vec<Value> = ins
                    .inputs
                    .iter()
                    .map(|operand| resolve(operand, &values))
                    .collect();
                let result = match &ins.op {
                    Op::Parameter(0) => this.clone(),
                    Op::Parameter(i) => args[*i - 1].clone(),
                    Op::NewObject(class) => self.alloc_and_init(*class, inputs),
                    Op::NewArray => Value::Arr(inputs),
                    Op::CallVirtual(callee) => {
                        let mut inputs = inputs;
                        let receiver = inputs.remove(0);
                        self.call(*callee, receiver, inputs)
                    }
                    Op::CallStatic(callee) => self.call(*callee, Value::Null, inputs),
                    Op::LoadField(field) => self.field(&inputs[0], *field),
                    Op::StoreField(field) => {
                        let Value::Obj(index) = inputs[0] else {
                            panic!("field store on non-object {:?}", inputs[0]);
                        };
                        self.heap[index].fields.insert(*field, inputs[1].clone());
                        Value::Null
                    }
                    Op::IsInstance(class) => {
                        let matches = match inputs[0] {
                            Value::Obj(index) => self.heap[index].class == *class,
                            _ => false,
                        };
                        Value::Bool(matches)
                    }
                    Op::Eq => Value::Bool(inputs[0] == inputs[1]),
                    Op::Branch => {
                        let Value::Bool(cond) = inputs[0] else {
                            panic!("branch on non-boolean {:?}", inputs[0]);
                        };
                        let succs = &body.block(block).succs;
                        next = Some(if cond { succs[0] } else { succs[1] });
                        Value::Null
                    }
                    Op::Jump => {
                        next = Some(body.block(block).succs[0]);
                        Value::Null
                    }
                    Op::Return => return inputs.into_iter().next().unwrap_or(Value::Null),
                    Op::ReturnVoid => return Value::Null,
                };
                values.insert(id, result);
            }
            block = next.unwrap_or_else(|| body.block(block).succs[0]);
        }
    }
}

fn resolve(operand: &Operand, values: &BTreeMap<InstrId, Value>) -> Value {
    match operand {
        Operand::Instr(id) => values
            .get(id)
            .cloned()
            .unwrap_or_else(|| panic!("instruction {:?} evaluated before its input", id)),
        Operand::Value(constant) => match constant {
            Constant::Null => Value::Null,
            Constant::Bool(b) => Value::Bool(*b),
            Constant::I32(v) => Value::I32(*v),
            Constant::I64(v) => Value::I64(*v),
            Constant::F64(v) => Value::F64(*v),
            Constant::Str(s) => Value::Str(s.to_string()),
        },
    }
}
