//! Runtime environment for ecmawalk
//!
//! This module provides the execution environment: the value and object
//! model, the tree-walking interpreter, the built-in library, and the
//! [`Runtime`] facade hosts embed.

mod array;
mod builtins;
mod convert;
mod host;
pub mod interpreter;
pub mod number;
mod object;
mod string;
mod value;

pub use array::ArrayStorage;
pub use host::HostObject;
pub use interpreter::Interpreter;
pub use object::{
    FunctionKind, NativeFn, Object, ObjectKind, ObjectRef, Property, PropertyDescriptor, PropertyFlags,
    PropertyKey, Slot,
};
pub use string::JsString;
pub use value::Value;

use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

/// Runtime configuration, fixed at construction
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Nested calls allowed before a `RangeError`
    pub max_call_depth: usize,
    /// Statements one top-level evaluation may execute
    pub operation_limit: Option<u64>,
    /// Consulted between statements with the step count; `true` aborts
    pub interrupt: Option<Rc<dyn Fn(u64) -> bool>>,
    /// Sink for the `print` global; stdout when absent
    pub output: Option<Rc<dyn Fn(&str)>>,
    /// Evaluate top-level code as strict mode code
    pub strict: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 400,
            operation_limit: None,
            interrupt: None,
            output: None,
            strict: false,
        }
    }
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("max_call_depth", &self.max_call_depth)
            .field("operation_limit", &self.operation_limit)
            .field("interrupt", &self.interrupt.is_some())
            .field("output", &self.output.is_some())
            .field("strict", &self.strict)
            .finish()
    }
}

/// The ecmawalk runtime
///
/// Objects are reference counted. Garbage caught in a cycle, such as every
/// script function and its `prototype` or a closure stored in its own
/// scope, stays allocated while the runtime lives and is reclaimed when the
/// runtime is dropped. Hosts running many unrelated scripts should give
/// each one a fresh runtime instead of growing one long-lived instance.
pub struct Runtime {
    interp: Interpreter,
}

impl Runtime {
    /// Create a runtime with the default configuration
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime with a custom configuration
    pub fn with_config(config: RuntimeConfig) -> Self {
        debug!(?config, "creating runtime");
        Self {
            interp: Interpreter::new(config),
        }
    }

    /// Evaluate a script; the result is the completion value of its last
    /// value-producing statement
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        self.interp.begin_evaluation();
        let program = crate::parser::parse_with_options(source, self.interp.config().strict)
            .inspect_err(|err| debug!(error = %err, "parse failed"))?;
        debug!(statements = program.body.len(), "evaluating program");
        let result = self.interp.eval_program(&program);
        match &result {
            Ok(_) => debug!(steps = self.interp.steps(), "evaluation finished"),
            Err(err) => debug!(error = %err, steps = self.interp.steps(), "uncaught error"),
        }
        result
    }

    /// Read and evaluate a script file
    pub fn eval_file(&mut self, path: &Path) -> Result<Value> {
        let source = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "evaluating file");
        self.eval(&source)
    }

    /// Compile `body` as a function with the named parameters in the
    /// global scope, then call it with `args`
    pub fn eval_function_body(&mut self, params: &[&str], body: &str, args: &[Value]) -> Result<Value> {
        self.interp.begin_evaluation();
        let node = crate::parser::parse_function_body(&params.join(","), body, self.interp.config().strict)?;
        let scope = self.interp.global_context(false).scope;
        let func = self.interp.create_function(&node, &scope);
        self.interp.call(&Value::Object(func), Value::Undefined, args)
    }

    /// The global object
    pub fn global_object(&self) -> ObjectRef {
        self.interp.global().clone()
    }

    /// Read a global; `None` when it does not exist
    ///
    /// A throwing accessor on the global object surfaces as the error.
    pub fn get_global(&mut self, name: &str) -> Result<Option<Value>> {
        let global = self.interp.global().clone();
        let key = PropertyKey::from(name);
        if !self.interp.has_property(&global, &key) {
            return Ok(None);
        }
        self.interp.begin_evaluation();
        self.interp.get(&global, &key).map(Some)
    }

    /// Create or overwrite a global
    pub fn set_global(&mut self, name: &str, value: Value) {
        let global = self.interp.global().clone();
        let key = PropertyKey::from(name);
        if !self.interp.has_own_property(&global, &key) {
            global.borrow_mut().create_data_property(key, value);
        } else if let Err(err) = self.interp.put(&global, key, value, false) {
            debug!(name, error = %err, "set_global failed");
        }
    }

    /// Register a native function as a global
    pub fn register_function<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        let call = move |_: &mut Interpreter, _: &Value, args: &[Value]| func(args);
        let native = self.interp.create_native_function(name, 0, Rc::new(call), None);
        self.set_global(name, Value::Object(native));
    }

    /// Create an empty ordinary object
    pub fn create_object(&mut self) -> ObjectRef {
        self.interp.new_object()
    }

    /// Create an array holding `values`
    pub fn create_array(&mut self, values: Vec<Value>) -> ObjectRef {
        self.interp.new_array(values)
    }

    /// Call a script or native function
    pub fn call_function(&mut self, func: &Value, this: Value, args: &[Value]) -> Result<Value> {
        self.interp.begin_evaluation();
        self.interp.call(func, this, args)
    }

    /// Expose a host object to script
    pub fn wrap_host_object(&mut self, host: Rc<dyn HostObject>) -> Value {
        let proto = self.interp.realm().object_prototype.clone();
        Value::Object(self.interp.alloc(Object::new(ObjectKind::Host(host), Some(proto))))
    }

    /// Elements `0..length` of an array-like
    pub fn array_to_vec(&mut self, value: &Value) -> Result<Vec<Value>> {
        let Value::Object(obj) = value else {
            return Err(Error::type_error(format!("{} is not an array", value.describe())));
        };
        self.interp.list_from_array_like(obj)
    }

    /// Convert a script value to JSON data
    pub fn to_json_value(&mut self, value: &Value) -> Result<serde_json::Value> {
        convert::to_json_value(&mut self.interp, value)
    }

    /// Build a script value from JSON data
    pub fn from_json_value(&mut self, json: &serde_json::Value) -> Value {
        convert::from_json_value(&mut self.interp, json)
    }

    /// Turn a caught error into the script value it denotes
    pub fn error_value(&mut self, err: Error) -> Result<Value> {
        self.interp.error_to_value(err)
    }

    /// The underlying interpreter
    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interp
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.interp.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_eval() {
        let mut runtime = Runtime::new();
        let result = runtime.eval("1 + 2").unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn test_runtime_variables() {
        let mut runtime = Runtime::new();
        let result = runtime.eval("var x = 10; x * 2").unwrap();
        assert_eq!(result, Value::Number(20.0));
        assert_eq!(runtime.eval("x").unwrap(), Value::Number(10.0));
    }

    #[test]
    fn test_runtime_functions() {
        let mut runtime = Runtime::new();
        let result = runtime
            .eval("function add(a, b) { return a + b; } add(3, 4)")
            .unwrap();
        assert_eq!(result, Value::Number(7.0));
    }

    #[test]
    fn test_globals_round_trip() {
        let mut runtime = Runtime::new();
        runtime.set_global("answer", Value::Number(42.0));
        assert_eq!(runtime.eval("answer + 1").unwrap(), Value::Number(43.0));
        runtime.eval("var fromScript = 'hi'").unwrap();
        assert_eq!(runtime.get_global("fromScript").unwrap(), Some(Value::string("hi")));
        assert_eq!(runtime.get_global("nope").unwrap(), None);
    }

    #[test]
    fn test_get_global_reports_throwing_getter() {
        let mut runtime = Runtime::new();
        runtime
            .eval("Object.defineProperty(this, 'broken', { get: function () { throw new TypeError('no'); } })")
            .unwrap();
        let err = runtime.get_global("broken").unwrap_err();
        assert!(matches!(err, Error::Exception { .. }));
    }

    #[test]
    fn test_register_function() {
        let mut runtime = Runtime::new();
        runtime.register_function("double", |args| {
            Ok(Value::Number(args.first().and_then(Value::as_number).unwrap_or(0.0) * 2.0))
        });
        assert_eq!(runtime.eval("double(21)").unwrap(), Value::Number(42.0));
    }

    #[test]
    fn test_eval_function_body() {
        let mut runtime = Runtime::new();
        let result = runtime
            .eval_function_body(&["a", "b"], "return a * b;", &[Value::Number(6.0), Value::Number(7.0)])
            .unwrap();
        assert_eq!(result, Value::Number(42.0));
    }

    #[test]
    fn test_runtime_survives_errors() {
        let mut runtime = Runtime::new();
        assert!(runtime.eval("undefinedThing()").is_err());
        assert!(runtime.eval("var").is_err());
        assert_eq!(runtime.eval("2 * 3").unwrap(), Value::Number(6.0));
    }

    #[test]
    fn test_strict_config() {
        let mut runtime = Runtime::with_config(RuntimeConfig {
            strict: true,
            ..Default::default()
        });
        let err = runtime.eval("undeclared = 1").unwrap_err();
        assert_eq!(err.kind(), Some(crate::error::ErrorKind::ReferenceError));
    }

    #[test]
    fn test_function_cycles_freed_on_drop() {
        let mut runtime = Runtime::new();
        runtime.eval("function f() {}").unwrap();
        let weak = match runtime.get_global("f").unwrap() {
            Some(Value::Object(f)) => std::rc::Rc::downgrade(&f),
            other => panic!("expected a function, got {:?}", other),
        };
        runtime.eval("f = null").unwrap();
        assert!(weak.upgrade().is_some());
        drop(runtime);
        assert!(weak.upgrade().is_none());
    }
}
