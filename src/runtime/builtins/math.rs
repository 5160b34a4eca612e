//! The `Math` object

use super::{arg, constant, global_binding, method};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::{Object, ObjectKind, Value};
use rand::Rng;

fn unary(interp: &mut Interpreter, math: &crate::runtime::ObjectRef, name: &str, f: fn(f64) -> f64) {
    method(interp, math, name, 1, move |interp, _this, args| {
        Ok(Value::Number(f(interp.to_number(&arg(args, 0))?)))
    });
}

/// `Math.round`: halves round toward +Infinity, -0 is preserved
fn round(n: f64) -> f64 {
    if !n.is_finite() || n.fract() == 0.0 {
        return n;
    }
    if n < 0.0 && n >= -0.5 {
        return -0.0;
    }
    (n + 0.5).floor()
}

pub(super) fn register_math(interp: &mut Interpreter) {
    let proto = interp.realm().object_prototype.clone();
    let math = interp.alloc(Object::new(ObjectKind::Math, Some(proto)));

    constant(&math, "PI", Value::Number(std::f64::consts::PI));
    constant(&math, "E", Value::Number(std::f64::consts::E));
    constant(&math, "LN2", Value::Number(std::f64::consts::LN_2));
    constant(&math, "LN10", Value::Number(std::f64::consts::LN_10));
    constant(&math, "LOG2E", Value::Number(std::f64::consts::LOG2_E));
    constant(&math, "LOG10E", Value::Number(std::f64::consts::LOG10_E));
    constant(&math, "SQRT2", Value::Number(std::f64::consts::SQRT_2));
    constant(&math, "SQRT1_2", Value::Number(std::f64::consts::FRAC_1_SQRT_2));

    unary(interp, &math, "abs", f64::abs);
    unary(interp, &math, "acos", f64::acos);
    unary(interp, &math, "asin", f64::asin);
    unary(interp, &math, "atan", f64::atan);
    unary(interp, &math, "ceil", f64::ceil);
    unary(interp, &math, "cos", f64::cos);
    unary(interp, &math, "exp", f64::exp);
    unary(interp, &math, "floor", f64::floor);
    unary(interp, &math, "log", f64::ln);
    unary(interp, &math, "round", round);
    unary(interp, &math, "sin", f64::sin);
    unary(interp, &math, "sqrt", f64::sqrt);
    unary(interp, &math, "tan", f64::tan);

    method(interp, &math, "atan2", 2, |interp, _this, args| {
        let y = interp.to_number(&arg(args, 0))?;
        let x = interp.to_number(&arg(args, 1))?;
        Ok(Value::Number(y.atan2(x)))
    });

    method(interp, &math, "pow", 2, |interp, _this, args| {
        let base = interp.to_number(&arg(args, 0))?;
        let exp = interp.to_number(&arg(args, 1))?;
        // powf(1, NaN) and powf(-1, inf) are 1; both must be NaN
        if exp.is_nan() || (base.abs() == 1.0 && exp.is_infinite()) {
            return Ok(Value::Number(f64::NAN));
        }
        Ok(Value::Number(base.powf(exp)))
    });

    method(interp, &math, "max", 2, |interp, _this, args| {
        let mut max = f64::NEG_INFINITY;
        for a in args {
            let n = interp.to_number(a)?;
            if n.is_nan() {
                max = f64::NAN;
            } else if n > max || (n == 0.0 && max == 0.0 && max.is_sign_negative()) {
                max = n;
            }
        }
        Ok(Value::Number(max))
    });

    method(interp, &math, "min", 2, |interp, _this, args| {
        let mut min = f64::INFINITY;
        for a in args {
            let n = interp.to_number(a)?;
            if n.is_nan() {
                min = f64::NAN;
            } else if n < min || (n == 0.0 && min == 0.0 && n.is_sign_negative()) {
                min = n;
            }
        }
        Ok(Value::Number(min))
    });

    method(interp, &math, "random", 0, |_interp, _this, _args| {
        Ok(Value::Number(rand::thread_rng().gen::<f64>()))
    });

    global_binding(interp, "Math", Value::Object(math));
}
