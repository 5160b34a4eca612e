//! `Number` constructor and `Number.prototype`

use super::{arg, constant, constructor, method};
use crate::error::{Error, Result};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::number::{number_to_fixed, number_to_radix_string};
use crate::runtime::{Object, ObjectKind, Value};

fn this_number(this: &Value, method: &str) -> Result<f64> {
    match this {
        Value::Number(n) => return Ok(*n),
        Value::Object(obj) => {
            if let ObjectKind::NumberWrapper(n) = obj.borrow().kind {
                return Ok(n);
            }
        }
        _ => {}
    }
    Err(Error::type_error(format!(
        "Number.prototype.{} requires that 'this' be a Number",
        method
    )))
}

pub(super) fn register_number(interp: &mut Interpreter) {
    let proto = interp.realm().number_prototype.clone();
    let ctor = constructor(
        interp,
        "Number",
        1,
        &proto,
        |interp, _this, args| match args.first() {
            Some(v) => Ok(Value::Number(interp.to_number(v)?)),
            None => Ok(Value::Number(0.0)),
        },
        |interp, _this, args| {
            let n = match args.first() {
                Some(v) => interp.to_number(v)?,
                None => 0.0,
            };
            let proto = interp.realm().number_prototype.clone();
            Ok(Value::Object(interp.alloc(Object::new(ObjectKind::NumberWrapper(n), Some(proto)))))
        },
    );

    constant(&ctor, "MAX_VALUE", Value::Number(f64::MAX));
    constant(&ctor, "MIN_VALUE", Value::Number(5e-324));
    constant(&ctor, "NaN", Value::Number(f64::NAN));
    constant(&ctor, "POSITIVE_INFINITY", Value::Number(f64::INFINITY));
    constant(&ctor, "NEGATIVE_INFINITY", Value::Number(f64::NEG_INFINITY));

    method(interp, &proto, "toString", 1, |interp, this, args| {
        let n = this_number(this, "toString")?;
        let radix = match arg(args, 0) {
            Value::Undefined => 10.0,
            r => interp.to_integer(&r)?,
        };
        if !(2.0..=36.0).contains(&radix) {
            return Err(Error::range_error("toString() radix must be between 2 and 36"));
        }
        Ok(Value::string(number_to_radix_string(n, radix as u32)))
    });

    method(interp, &proto, "toLocaleString", 0, |_interp, this, _args| {
        let n = this_number(this, "toLocaleString")?;
        Ok(Value::string(number_to_radix_string(n, 10)))
    });

    method(interp, &proto, "valueOf", 0, |_interp, this, _args| {
        Ok(Value::Number(this_number(this, "valueOf")?))
    });

    method(interp, &proto, "toFixed", 1, |interp, this, args| {
        let n = this_number(this, "toFixed")?;
        let digits = interp.to_integer(&arg(args, 0))?;
        if !(0.0..=20.0).contains(&digits) {
            return Err(Error::range_error("toFixed() digits argument must be between 0 and 20"));
        }
        Ok(Value::string(number_to_fixed(n, digits as usize)))
    });
}

#[cfg(test)]
mod tests {
    use crate::runtime::Runtime;

    fn eval_str(source: &str) -> String {
        let mut rt = Runtime::new();
        rt.eval(source).unwrap().describe()
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(eval_str("(255).toString(16)"), "ff");
        assert_eq!(eval_str("(1.005).toFixed(1)"), "1.0");
        assert_eq!(eval_str("(2.5).toFixed(0)"), "3");
        assert_eq!(eval_str("String(1e21)"), "1e+21");
        assert_eq!(eval_str("String(0.000001)"), "0.000001");
    }

    #[test]
    fn test_constants_are_read_only() {
        assert_eq!(eval_str("Number.MAX_VALUE = 1; Number.MAX_VALUE > 1"), "true");
        assert_eq!(eval_str("Number.POSITIVE_INFINITY"), "Infinity");
    }

    #[test]
    fn test_radix_out_of_range() {
        assert_eq!(
            eval_str("try { (1).toString(1) } catch (e) { e.name }"),
            "RangeError"
        );
    }
}
