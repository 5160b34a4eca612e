//! Tree-walking evaluator
//!
//! The interpreter walks the syntax tree directly. Expressions evaluate to
//! values, statements to [`Completion`]s; a thrown exception is the `Err`
//! side of the result and unwinds through `?` until a `try` statement
//! converts it back into a script value.
//!
//! The interpreter also owns the realm: the global object, the built-in
//! prototypes every new object is linked to, and the heap registry that
//! tears the object graph down when the runtime goes away.

mod completion;
mod expressions;
mod function;
mod operations;
mod scope;
mod statements;

pub use completion::{Completion, CompletionKind};
pub use operations::Hint;
pub(crate) use operations::index_key;
pub use scope::{Scope, ScopeKind, ScopeRef};

use crate::ast::{Hoisting, Program};
use crate::error::{Error, ErrorKind, Result};
use crate::gc::Heap;
use crate::runtime::builtins;
use crate::runtime::{
    ArrayStorage, FunctionKind, JsString, Object, ObjectKind, ObjectRef, Property,
    PropertyDescriptor, PropertyFlags, PropertyKey, RuntimeConfig, Value,
};
use rustc_hash::FxHashMap as HashMap;
use std::rc::Rc;
use tracing::debug;

/// Evaluation context of the code currently running
#[derive(Clone)]
pub struct Context {
    /// Innermost scope
    pub scope: ScopeRef,
    /// `this` binding
    pub this: Value,
    /// Whether the code is strict
    pub strict: bool,
}

/// Built-in objects shared by everything a runtime allocates
pub struct Realm {
    pub global: ObjectRef,
    pub object_prototype: ObjectRef,
    pub function_prototype: ObjectRef,
    pub array_prototype: ObjectRef,
    pub string_prototype: ObjectRef,
    pub number_prototype: ObjectRef,
    pub boolean_prototype: ObjectRef,
    pub error_prototypes: HashMap<ErrorKind, ObjectRef>,
}

impl Realm {
    /// Prototype for errors of `kind`
    pub fn error_prototype(&self, kind: ErrorKind) -> ObjectRef {
        self.error_prototypes
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| self.object_prototype.clone())
    }
}

/// The evaluator and its realm
pub struct Interpreter {
    pub(crate) realm: Realm,
    global_scope: ScopeRef,
    pub(crate) heap: Heap,
    config: RuntimeConfig,
    call_depth: usize,
    steps: u64,
}

impl Interpreter {
    /// Create an interpreter with a freshly populated global object
    pub fn new(config: RuntimeConfig) -> Self {
        let mut heap = Heap::new();
        let mut alloc = |kind: ObjectKind, proto: Option<&ObjectRef>| {
            let obj = Rc::new(std::cell::RefCell::new(Object::new(kind, proto.cloned())));
            heap.register(&obj);
            obj
        };

        let object_prototype = alloc(ObjectKind::Ordinary, None);
        let function_prototype = alloc(
            ObjectKind::Function(FunctionKind::Native {
                name: JsString::empty(),
                call: Rc::new(|_: &mut Interpreter, _: &Value, _: &[Value]| Ok(Value::Undefined)),
                construct: None,
            }),
            Some(&object_prototype),
        );
        let array_prototype = alloc(
            ObjectKind::Array(ArrayStorage::with_length(0)),
            Some(&object_prototype),
        );
        let string_prototype = alloc(
            ObjectKind::StringWrapper(JsString::empty()),
            Some(&object_prototype),
        );
        let number_prototype = alloc(ObjectKind::NumberWrapper(0.0), Some(&object_prototype));
        let boolean_prototype =
            alloc(ObjectKind::BooleanWrapper(false), Some(&object_prototype));

        let mut error_prototypes = HashMap::default();
        let base_error = alloc(ObjectKind::Error, Some(&object_prototype));
        error_prototypes.insert(ErrorKind::GenericError, base_error.clone());
        for kind in ErrorKind::ALL {
            if kind != ErrorKind::GenericError {
                error_prototypes.insert(kind, alloc(ObjectKind::Error, Some(&base_error)));
            }
        }

        let global = alloc(ObjectKind::Global, Some(&object_prototype));
        let global_scope = Scope::global(global.clone());

        let mut interp = Interpreter {
            realm: Realm {
                global,
                object_prototype,
                function_prototype,
                array_prototype,
                string_prototype,
                number_prototype,
                boolean_prototype,
                error_prototypes,
            },
            global_scope,
            heap,
            config,
            call_depth: 0,
            steps: 0,
        };
        builtins::install(&mut interp);
        debug!(objects = interp.heap.stats().total_allocations, "interpreter initialized");
        interp
    }

    /// The global object
    pub fn global(&self) -> &ObjectRef {
        &self.realm.global
    }

    /// The built-in prototypes
    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// Active configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Statements executed since the last reset
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Restart the step budget and call depth at a top-level entry
    ///
    /// Hosts cannot re-enter the runtime from inside a call, so no script
    /// frame is live when this runs.
    pub fn begin_evaluation(&mut self) {
        self.steps = 0;
        self.call_depth = 0;
    }

    /// Current script call depth
    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    /// Heap registry
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Clear every allocated object; the interpreter is unusable afterwards
    pub(crate) fn teardown(&mut self) {
        self.heap.teardown();
    }

    /// Per-statement step accounting and host interrupt check
    pub(crate) fn tick(&mut self) -> Result<()> {
        self.steps += 1;
        if let Some(limit) = self.config.operation_limit {
            if self.steps > limit {
                return Err(Error::operation_limit_exceeded(self.steps, limit));
            }
        }
        if let Some(hook) = &self.config.interrupt {
            if hook(self.steps) {
                return Err(Error::interrupted(self.steps));
            }
        }
        Ok(())
    }

    /// Write a line to the configured output sink
    pub fn print(&self, text: &str) {
        match &self.config.output {
            Some(sink) => sink(text),
            None => println!("{}", text),
        }
    }

    /// Context for global code
    pub fn global_context(&self, strict: bool) -> Context {
        Context {
            scope: self.global_scope.clone(),
            this: Value::Object(self.realm.global.clone()),
            strict: strict || self.config.strict,
        }
    }

    /// Run a parsed program as global code
    pub fn eval_program(&mut self, program: &Program) -> Result<Value> {
        self.run_global_code(program, false)
    }

    /// Run global code; `configurable` makes its `var`s deletable (eval code)
    pub(crate) fn run_global_code(&mut self, program: &Program, configurable: bool) -> Result<Value> {
        let ctx = self.global_context(program.strict);
        self.instantiate_declarations(&ctx, program.hoisting(), configurable)?;
        let completion = self.exec_statements(&program.body, &ctx)?;
        Ok(completion.value.unwrap_or_default())
    }

    /// Bind hoisted function declarations and `var` names in the innermost
    /// record of `ctx`
    pub(crate) fn instantiate_declarations(
        &mut self,
        ctx: &Context,
        hoisting: &Hoisting,
        configurable: bool,
    ) -> Result<()> {
        let record = ctx.scope.record.clone();
        let mut flags = PropertyFlags::WRITABLE | PropertyFlags::ENUMERABLE;
        if configurable {
            flags |= PropertyFlags::CONFIGURABLE;
        }

        for func in &hoisting.functions {
            let Some(id) = &func.id else { continue };
            let closure = self.create_function(func, &ctx.scope);
            let key = PropertyKey::from(id.key.clone());
            let existing = record.borrow().get_own_property(&key);
            match existing {
                Some(prop) if !prop.configurable() => {
                    self.put(&record, key, Value::Object(closure), ctx.strict)?;
                }
                _ => {
                    let desc = PropertyDescriptor::data(Value::Object(closure), flags);
                    record.borrow_mut().define_own_property(key, &desc);
                }
            }
        }

        for name in &hoisting.var_names {
            let key = PropertyKey::from(name.clone());
            if !self.has_property(&record, &key) {
                record
                    .borrow_mut()
                    .insert_property(key, Property::data(Value::Undefined, flags));
            }
        }
        Ok(())
    }

    /// Build an error object of `kind`
    pub fn create_error(&mut self, kind: ErrorKind, message: &str) -> Value {
        let proto = self.realm.error_prototype(kind);
        let obj = self.alloc(Object::new(ObjectKind::Error, Some(proto)));
        if !message.is_empty() {
            obj.borrow_mut().insert_property(
                "message",
                Property::data(Value::string(message), PropertyFlags::HIDDEN),
            );
        }
        Value::Object(obj)
    }

    /// Turn a catchable error into the script value `catch` receives
    ///
    /// Non-catchable errors are handed back unchanged.
    pub fn error_to_value(&mut self, err: Error) -> Result<Value> {
        match err {
            Error::Exception { value } => Ok(value),
            Error::RuntimeError { kind, message } => Ok(self.create_error(kind, &message)),
            Error::ParseError { message, .. } => {
                Ok(self.create_error(ErrorKind::SyntaxError, &message))
            }
            other => Err(other),
        }
    }
}
