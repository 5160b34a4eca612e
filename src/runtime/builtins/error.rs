//! `Error` and its native subtypes

use super::{constructor, method};
use crate::error::{Error, ErrorKind, Result};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::{JsString, Property, PropertyFlags, PropertyKey, Value};

fn create(interp: &mut Interpreter, kind: ErrorKind, args: &[Value]) -> Result<Value> {
    let message = match args.first() {
        Some(v) if !v.is_undefined() => interp.to_rust_string(v)?,
        _ => String::new(),
    };
    Ok(interp.create_error(kind, &message))
}

pub(super) fn register_error(interp: &mut Interpreter) {
    for kind in ErrorKind::ALL {
        let proto = interp.realm().error_prototype(kind);
        {
            let mut p = proto.borrow_mut();
            p.insert_property("name", Property::data(Value::string(kind.name()), PropertyFlags::HIDDEN));
            p.insert_property("message", Property::data(Value::string(""), PropertyFlags::HIDDEN));
        }
        constructor(
            interp,
            kind.name(),
            1,
            &proto,
            move |interp, _this, args| create(interp, kind, args),
            move |interp, _this, args| create(interp, kind, args),
        );
    }

    let base = interp.realm().error_prototype(ErrorKind::GenericError);
    method(interp, &base, "toString", 0, |interp, this, _args| {
        let Value::Object(obj) = this else {
            return Err(Error::type_error(
                "Error.prototype.toString requires that 'this' be an Object",
            ));
        };
        let name = match interp.get(obj, &PropertyKey::from("name"))? {
            Value::Undefined => JsString::from("Error"),
            v => interp.to_string(&v)?,
        };
        let message = match interp.get(obj, &PropertyKey::from("message"))? {
            Value::Undefined => JsString::empty(),
            v => interp.to_string(&v)?,
        };
        Ok(Value::String(if name.is_empty() {
            message
        } else if message.is_empty() {
            name
        } else {
            name.concat(&JsString::from(": ")).concat(&message)
        }))
    });
}

#[cfg(test)]
mod tests {
    use crate::runtime::{Runtime, Value};

    #[test]
    fn test_error_hierarchy() {
        let mut rt = Runtime::new();
        let v = rt
            .eval("var e = new RangeError('boom'); [e instanceof RangeError, e instanceof Error, e.name, e.message, String(e)].join()")
            .unwrap();
        assert_eq!(v, Value::string("true,true,RangeError,boom,RangeError: boom"));
    }

    #[test]
    fn test_engine_errors_are_catchable_instances() {
        let mut rt = Runtime::new();
        let v = rt
            .eval("try { null.x } catch (e) { (e instanceof TypeError) + ':' + e.name }")
            .unwrap();
        assert_eq!(v, Value::string("true:TypeError"));
        let v = rt
            .eval("try { missing } catch (e) { e.constructor === ReferenceError }")
            .unwrap();
        assert_eq!(v, Value::Boolean(true));
    }

    #[test]
    fn test_called_without_new() {
        let mut rt = Runtime::new();
        let v = rt.eval("Error('plain').message").unwrap();
        assert_eq!(v, Value::string("plain"));
    }
}
