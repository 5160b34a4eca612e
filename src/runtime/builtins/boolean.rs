//! `Boolean` constructor and `Boolean.prototype`

use super::{constructor, method};
use crate::error::{Error, Result};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::{Object, ObjectKind, Value};

fn this_boolean(this: &Value, method: &str) -> Result<bool> {
    match this {
        Value::Boolean(b) => return Ok(*b),
        Value::Object(obj) => {
            if let ObjectKind::BooleanWrapper(b) = obj.borrow().kind {
                return Ok(b);
            }
        }
        _ => {}
    }
    Err(Error::type_error(format!(
        "Boolean.prototype.{} requires that 'this' be a Boolean",
        method
    )))
}

pub(super) fn register_boolean(interp: &mut Interpreter) {
    let proto = interp.realm().boolean_prototype.clone();
    constructor(
        interp,
        "Boolean",
        1,
        &proto,
        |_interp, _this, args| Ok(Value::Boolean(args.first().is_some_and(|v| v.to_boolean()))),
        |interp, _this, args| {
            let b = args.first().is_some_and(|v| v.to_boolean());
            let proto = interp.realm().boolean_prototype.clone();
            Ok(Value::Object(interp.alloc(Object::new(ObjectKind::BooleanWrapper(b), Some(proto)))))
        },
    );

    method(interp, &proto, "toString", 0, |_interp, this, _args| {
        Ok(Value::string(this_boolean(this, "toString")?.to_string()))
    });

    method(interp, &proto, "valueOf", 0, |_interp, this, _args| {
        Ok(Value::Boolean(this_boolean(this, "valueOf")?))
    });
}
