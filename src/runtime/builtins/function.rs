//! `Function` constructor and `Function.prototype`

use super::{arg, constructor, method};
use crate::error::{messages, Error, Result};
use crate::parser::parse_function_body;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::{FunctionKind, Object, ObjectKind, Property, PropertyFlags, Value};
use tracing::debug;

/// `new Function(p1, ..., pn, body)`
fn function_from_source(interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let (params, body) = match args.split_last() {
        Some((body, params)) => {
            let mut names = Vec::with_capacity(params.len());
            for p in params {
                names.push(interp.to_rust_string(p)?);
            }
            (names.join(","), interp.to_rust_string(body)?)
        }
        None => (String::new(), String::new()),
    };
    let node = parse_function_body(&params, &body, false).inspect_err(|err| {
        debug!(error = %err, "Function constructor failed to parse body");
    })?;
    let scope = interp.global_context(false).scope;
    Ok(Value::Object(interp.create_function(&node, &scope)))
}

fn source_of(this: &Value) -> Result<String> {
    let Some(func) = this.as_object() else {
        return Err(Error::type_error(
            "Function.prototype.toString requires that 'this' be a Function",
        ));
    };
    match &func.borrow().kind {
        ObjectKind::Function(FunctionKind::Script { node, .. }) => Ok(node.source_text.clone()),
        ObjectKind::Function(f) => Ok(format!("function {}() {{ [native code] }}", f.name())),
        _ => Err(Error::type_error(
            "Function.prototype.toString requires that 'this' be a Function",
        )),
    }
}

fn require_callable(this: &Value, method: &str) -> Result<()> {
    if this.is_callable() {
        Ok(())
    } else {
        Err(Error::type_error(format!(
            "Function.prototype.{} called on {}",
            method,
            messages::not_a_function(&this.describe())
        )))
    }
}

pub(super) fn register_function(interp: &mut Interpreter) {
    let proto = interp.realm().function_prototype.clone();
    constructor(
        interp,
        "Function",
        1,
        &proto,
        |interp, _this, args| function_from_source(interp, args),
        |interp, _this, args| function_from_source(interp, args),
    );

    method(interp, &proto, "call", 1, |interp, this, args| {
        require_callable(this, "call")?;
        let rest = args.get(1..).unwrap_or_default();
        interp.call(this, arg(args, 0), rest)
    });

    method(interp, &proto, "apply", 2, |interp, this, args| {
        require_callable(this, "apply")?;
        let list = match arg(args, 1) {
            Value::Undefined | Value::Null => Vec::new(),
            Value::Object(obj) => interp.list_from_array_like(&obj)?,
            _ => {
                return Err(Error::type_error(
                    "CreateListFromArrayLike called on non-object",
                ))
            }
        };
        interp.call(this, arg(args, 0), &list)
    });

    method(interp, &proto, "bind", 1, |interp, this, args| {
        require_callable(this, "bind")?;
        let Value::Object(target) = this else {
            return Err(Error::type_error(messages::not_a_function(&this.describe())));
        };
        let bound_args = args.get(1..).unwrap_or_default().to_vec();
        let target_len = match target.borrow().own_data_value("length") {
            Some(Value::Number(n)) => n,
            _ => 0.0,
        };
        let length = (target_len - bound_args.len() as f64).max(0.0);
        let kind = FunctionKind::Bound {
            target: target.clone(),
            this: arg(args, 0),
            args: bound_args,
        };
        let name = kind.name();
        let proto = interp.realm().function_prototype.clone();
        let bound = interp.alloc(Object::new(ObjectKind::Function(kind), Some(proto)));
        {
            let mut b = bound.borrow_mut();
            b.insert_property("length", Property::data(Value::Number(length), PropertyFlags::empty()));
            b.insert_property("name", Property::data(Value::string(name), PropertyFlags::empty()));
        }
        Ok(Value::Object(bound))
    });

    method(interp, &proto, "toString", 0, |_interp, this, _args| {
        Ok(Value::string(source_of(this)?))
    });
}

#[cfg(test)]
mod tests {
    use crate::runtime::{Runtime, Value};

    #[test]
    fn test_function_constructor_uses_global_scope() {
        let mut rt = Runtime::new();
        let v = rt
            .eval("var k = 10; (function () { var k = 1; return new Function('a', 'b', 'return a + b + k'); })()(1, 2)")
            .unwrap();
        assert_eq!(v, Value::Number(13.0));
    }

    #[test]
    fn test_bind_prepends_arguments() {
        let mut rt = Runtime::new();
        let v = rt
            .eval("function f(a, b, c) { return this.x + a + b + c; } var g = f.bind({x: 1}, 2); [g(3, 4), g.length].join()")
            .unwrap();
        assert_eq!(v, Value::string("10,2"));
    }

    #[test]
    fn test_apply_with_array_like() {
        let mut rt = Runtime::new();
        let v = rt
            .eval("function sum() { var s = 0; for (var i = 0; i < arguments.length; i++) s += arguments[i]; return s; } sum.apply(null, {length: 3, 0: 1, 1: 2, 2: 3})")
            .unwrap();
        assert_eq!(v, Value::Number(6.0));
    }

    #[test]
    fn test_bad_body_is_syntax_error() {
        let mut rt = Runtime::new();
        let v = rt
            .eval("try { Function('return ('); } catch (e) { e instanceof SyntaxError }")
            .unwrap();
        assert_eq!(v, Value::Boolean(true));
    }

    #[test]
    fn test_apply_rejects_huge_array_likes() {
        let mut rt = Runtime::new();
        let v = rt
            .eval("function f() { return arguments.length; } try { f.apply(null, {length: 4294967295}) } catch (e) { e.name }")
            .unwrap();
        assert_eq!(v, Value::string("RangeError"));
        assert_eq!(rt.eval("f.apply(null, {length: 2, 0: 'a'})").unwrap(), Value::Number(2.0));
    }
}
