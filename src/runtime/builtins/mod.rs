//! Built-in functions and objects
//!
//! Every constructor follows the same wiring: `C.prototype` is a fixed
//! property of `C`, `C.prototype.constructor` points back at `C`, and
//! methods are writable, configurable and not enumerable.

mod array;
mod boolean;
mod error;
mod function;
mod global;
mod json;
mod math;
mod number;
mod object;
mod string;

use super::interpreter::Interpreter;
use super::{ObjectRef, Property, PropertyFlags, Value};
use crate::error::{messages, Error, Result};
use std::rc::Rc;

/// Populate the global object of a fresh interpreter
pub(crate) fn install(interp: &mut Interpreter) {
    object::register_object(interp);
    function::register_function(interp);
    array::register_array(interp);
    string::register_string(interp);
    number::register_number(interp);
    boolean::register_boolean(interp);
    math::register_math(interp);
    error::register_error(interp);
    global::register_global_functions(interp);
    json::register_json(interp);
}

/// Argument `i`, or undefined when absent
pub(crate) fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

/// Define a built-in method on `target`
pub(crate) fn method<F>(interp: &mut Interpreter, target: &ObjectRef, name: &str, arity: u32, f: F)
where
    F: Fn(&mut Interpreter, &Value, &[Value]) -> Result<Value> + 'static,
{
    let func = interp.create_native_function(name, arity, Rc::new(f), None);
    target
        .borrow_mut()
        .insert_property(name, Property::data(Value::Object(func), PropertyFlags::HIDDEN));
}

/// Define a read-only, non-enumerable, non-configurable value
pub(crate) fn constant(target: &ObjectRef, name: &str, value: Value) {
    target
        .borrow_mut()
        .insert_property(name, Property::data(value, PropertyFlags::empty()));
}

/// Bind `name` on the global object the way built-ins are bound
pub(crate) fn global_binding(interp: &mut Interpreter, name: &str, value: Value) {
    interp
        .global()
        .borrow_mut()
        .insert_property(name, Property::data(value, PropertyFlags::HIDDEN));
}

/// Create constructor `name` over `proto` and bind it globally
pub(crate) fn constructor<C, K>(
    interp: &mut Interpreter,
    name: &str,
    arity: u32,
    proto: &ObjectRef,
    call: C,
    construct: K,
) -> ObjectRef
where
    C: Fn(&mut Interpreter, &Value, &[Value]) -> Result<Value> + 'static,
    K: Fn(&mut Interpreter, &Value, &[Value]) -> Result<Value> + 'static,
{
    let ctor = interp.create_native_function(name, arity, Rc::new(call), Some(Rc::new(construct)));
    constant(&ctor, "prototype", Value::Object(proto.clone()));
    proto.borrow_mut().insert_property(
        "constructor",
        Property::data(Value::Object(ctor.clone()), PropertyFlags::HIDDEN),
    );
    global_binding(interp, name, Value::Object(ctor.clone()));
    ctor
}

/// Require a callable argument for a higher-order method
pub(crate) fn callable_arg(value: &Value, method: &str) -> Result<Value> {
    if value.is_callable() {
        Ok(value.clone())
    } else {
        Err(Error::type_error(format!(
            "{}: {}",
            method,
            messages::not_a_function(&value.describe())
        )))
    }
}

/// Relative index argument (`slice`, `splice`, ...) clamped to `0..=len`
pub(crate) fn relative_index(interp: &mut Interpreter, value: &Value, len: f64, default: f64) -> Result<f64> {
    let n = if value.is_undefined() {
        default
    } else {
        interp.to_integer(value)?
    };
    Ok(if n < 0.0 { (len + n).max(0.0) } else { n.min(len) })
}
