//! Function objects, `[[Call]]` and `[[Construct]]`

use super::{Context, Interpreter, Scope, ScopeKind, ScopeRef};
use crate::ast::FunctionRef;
use crate::error::{messages, Error, Result};
use crate::runtime::{
    FunctionKind, JsString, NativeFn, Object, ObjectKind, ObjectRef, Property, PropertyFlags,
    Value,
};
use super::CompletionKind;
use tracing::trace;

/// What a call dispatches to, copied out of the callee so no borrow is held
enum Callee {
    Script(FunctionRef, ScopeRef),
    Native(NativeFn),
    Bound(ObjectRef, Value, Vec<Value>),
}

impl Interpreter {
    /// Create a closure over `node` in `scope`
    pub fn create_function(&mut self, node: &FunctionRef, scope: &ScopeRef) -> ObjectRef {
        let func = self.alloc(Object::new(
            ObjectKind::Function(FunctionKind::Script {
                node: node.clone(),
                scope: scope.clone(),
            }),
            Some(self.realm.function_prototype.clone()),
        ));
        let proto = self.new_object();
        proto.borrow_mut().insert_property(
            "constructor",
            Property::data(Value::Object(func.clone()), PropertyFlags::HIDDEN),
        );
        {
            let mut f = func.borrow_mut();
            f.insert_property(
                "length",
                Property::data(Value::from(node.params.len() as u32), PropertyFlags::empty()),
            );
            f.insert_property(
                "name",
                Property::data(Value::string(node.name()), PropertyFlags::empty()),
            );
            f.insert_property(
                "prototype",
                Property::data(Value::Object(proto), PropertyFlags::WRITABLE),
            );
        }
        func
    }

    /// Closure for a function expression; a named one sees its own name
    pub(crate) fn create_function_expression(&mut self, node: &FunctionRef, ctx: &Context) -> ObjectRef {
        let Some(id) = &node.id else {
            return self.create_function(node, &ctx.scope);
        };
        let record = self.alloc(Object::new(ObjectKind::Ordinary, None));
        let scope = Scope::child(&ctx.scope, record.clone(), ScopeKind::FunctionName);
        let func = self.create_function(node, &scope);
        record.borrow_mut().insert_property(
            id.key.clone(),
            Property::data(Value::Object(func.clone()), PropertyFlags::empty()),
        );
        func
    }

    /// Create a built-in function object
    pub fn create_native_function(
        &mut self,
        name: &str,
        arity: u32,
        call: NativeFn,
        construct: Option<NativeFn>,
    ) -> ObjectRef {
        let func = self.alloc(Object::new(
            ObjectKind::Function(FunctionKind::Native {
                name: JsString::from(name),
                call,
                construct,
            }),
            Some(self.realm.function_prototype.clone()),
        ));
        {
            let mut f = func.borrow_mut();
            f.insert_property(
                "length",
                Property::data(Value::from(arity), PropertyFlags::empty()),
            );
            f.insert_property(
                "name",
                Property::data(Value::string(name), PropertyFlags::empty()),
            );
        }
        func
    }

    fn enter_call(&mut self) -> Result<()> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(Error::range_error(messages::MAXIMUM_CALL_STACK));
        }
        self.call_depth += 1;
        Ok(())
    }

    fn callee_of(func: &ObjectRef) -> Option<Callee> {
        match &func.borrow().kind {
            ObjectKind::Function(FunctionKind::Script { node, scope }) => {
                Some(Callee::Script(node.clone(), scope.clone()))
            }
            ObjectKind::Function(FunctionKind::Native { call, .. }) => {
                Some(Callee::Native(call.clone()))
            }
            ObjectKind::Function(FunctionKind::Bound { target, this, args }) => {
                Some(Callee::Bound(target.clone(), this.clone(), args.clone()))
            }
            _ => None,
        }
    }

    /// `[[Call]]`
    pub fn call(&mut self, callee: &Value, this: Value, args: &[Value]) -> Result<Value> {
        let Some(func) = callee.as_object() else {
            return Err(Error::type_error(messages::not_a_function(&callee.describe())));
        };
        let Some(target) = Self::callee_of(func) else {
            return Err(Error::type_error(messages::not_a_function(&callee.describe())));
        };
        self.enter_call()?;
        let result = crate::stack::guard(|| match target {
            Callee::Script(node, scope) => self.call_script(func, &node, &scope, this, args),
            Callee::Native(call) => call(self, &this, args),
            Callee::Bound(target, bound_this, bound_args) => {
                let mut all = bound_args;
                all.extend_from_slice(args);
                self.call(&Value::Object(target), bound_this, &all)
            }
        });
        self.call_depth -= 1;
        result
    }

    /// `[[Construct]]`
    pub fn construct(&mut self, callee: &Value, args: &[Value]) -> Result<Value> {
        let func = match callee.as_object() {
            Some(f) if f.borrow().is_constructor() => f.clone(),
            _ => {
                return Err(Error::type_error(messages::not_a_constructor(
                    &callee.describe(),
                )))
            }
        };
        let construct = match &func.borrow().kind {
            ObjectKind::Function(FunctionKind::Native { construct, .. }) => construct.clone(),
            _ => None,
        };
        self.enter_call()?;
        let result = crate::stack::guard(|| match (Self::callee_of(&func), construct) {
            (Some(Callee::Native(_)), Some(construct)) => construct(self, &Value::Undefined, args),
            (Some(Callee::Bound(target, _, bound_args)), _) => {
                let mut all = bound_args;
                all.extend_from_slice(args);
                self.construct(&Value::Object(target), &all)
            }
            (Some(Callee::Script(node, scope)), _) => self.construct_script(&func, &node, &scope, args),
            _ => Err(Error::type_error(messages::not_a_constructor(&callee.describe()))),
        });
        self.call_depth -= 1;
        result
    }

    /// Allocate `this` from `func.prototype` and run the body as a constructor
    fn construct_script(
        &mut self,
        func: &ObjectRef,
        node: &FunctionRef,
        scope: &ScopeRef,
        args: &[Value],
    ) -> Result<Value> {
        let proto = match self.get(func, &"prototype".into())? {
            Value::Object(p) => p,
            _ => self.realm.object_prototype.clone(),
        };
        let obj = self.alloc(Object::new(ObjectKind::Ordinary, Some(proto)));
        let this = Value::Object(obj);
        match self.call_script(func, node, scope, this.clone(), args)? {
            result @ Value::Object(_) => Ok(result),
            _ => Ok(this),
        }
    }

    fn call_script(
        &mut self,
        func: &ObjectRef,
        node: &FunctionRef,
        scope: &ScopeRef,
        this: Value,
        args: &[Value],
    ) -> Result<Value> {
        trace!(name = node.name(), args = args.len(), depth = self.call_depth, "call");
        let strict = node.strict;
        let this = if strict {
            this
        } else {
            match this {
                Value::Undefined | Value::Null => Value::Object(self.realm.global.clone()),
                Value::Object(_) => this,
                primitive => Value::Object(self.to_object(&primitive)?),
            }
        };

        let activation = self.alloc(Object::new(ObjectKind::Ordinary, None));
        let binding = PropertyFlags::WRITABLE | PropertyFlags::ENUMERABLE;
        {
            let mut record = activation.borrow_mut();
            for (i, param) in node.params.iter().enumerate() {
                let arg = args.get(i).cloned().unwrap_or_default();
                record.insert_property(param.key.clone(), Property::data(arg, binding));
            }
        }
        if !node.params.iter().any(|p| p.name == "arguments") {
            let arguments = self.create_arguments(func, args, strict);
            activation
                .borrow_mut()
                .insert_property("arguments", Property::data(Value::Object(arguments), binding));
        }

        let ctx = Context {
            scope: Scope::child(scope, activation, ScopeKind::Function),
            this,
            strict,
        };
        self.instantiate_declarations(&ctx, node.hoisting(), false)?;
        let completion = self.exec_statements(&node.body, &ctx)?;
        Ok(match completion.kind {
            CompletionKind::Return => completion.value.unwrap_or_default(),
            _ => Value::Undefined,
        })
    }

    fn create_arguments(&mut self, callee: &ObjectRef, args: &[Value], strict: bool) -> ObjectRef {
        let obj = self.alloc(Object::new(
            ObjectKind::Arguments,
            Some(self.realm.object_prototype.clone()),
        ));
        let mut o = obj.borrow_mut();
        for (i, arg) in args.iter().enumerate() {
            o.insert_property(i as u32, Property::data(arg.clone(), PropertyFlags::DEFAULT));
        }
        o.insert_property(
            "length",
            Property::data(Value::from(args.len() as u32), PropertyFlags::HIDDEN),
        );
        if !strict {
            o.insert_property(
                "callee",
                Property::data(Value::Object(callee.clone()), PropertyFlags::HIDDEN),
            );
        }
        drop(o);
        obj
    }
}
