//! `String` constructor and `String.prototype`

use super::{arg, constructor, method, relative_index};
use crate::error::{Error, Result};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::number::{to_uint16, to_uint32, trim_units};
use crate::runtime::{JsString, Object, ObjectKind, Value};

/// `this` coerced to a string; undefined and null are rejected
fn this_string(interp: &mut Interpreter, this: &Value, method: &str) -> Result<JsString> {
    if this.is_nullish() {
        return Err(Error::type_error(format!(
            "String.prototype.{} called on null or undefined",
            method
        )));
    }
    interp.to_string(this)
}

/// The primitive behind a string or String wrapper
fn this_string_value(this: &Value, method: &str) -> Result<Value> {
    match this {
        Value::String(_) => return Ok(this.clone()),
        Value::Object(obj) => {
            if let ObjectKind::StringWrapper(s) = &obj.borrow().kind {
                return Ok(Value::String(s.clone()));
            }
        }
        _ => {}
    }
    Err(Error::type_error(format!(
        "String.prototype.{} requires that 'this' be a String",
        method
    )))
}

fn map_case(s: &JsString, upper: bool) -> JsString {
    let mut out: Vec<u16> = Vec::with_capacity(s.len());
    let mut buf = [0u16; 2];
    for decoded in char::decode_utf16(s.as_units().iter().copied()) {
        match decoded {
            Ok(c) => {
                let mapped: Vec<char> = if upper {
                    c.to_uppercase().collect()
                } else {
                    c.to_lowercase().collect()
                };
                for m in mapped {
                    out.extend_from_slice(m.encode_utf16(&mut buf));
                }
            }
            Err(e) => out.push(e.unpaired_surrogate()),
        }
    }
    JsString::from(out)
}

/// Expand `$$`, `$&`, `` $` `` and `$'` in a replacement string
fn expand_replacement(replacement: &JsString, subject: &JsString, at: usize, matched: &JsString) -> Vec<u16> {
    let units = replacement.as_units();
    let dollar = u16::from(b'$');
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        if units[i] == dollar && i + 1 < units.len() {
            let next = units[i + 1];
            if next == dollar {
                out.push(dollar);
                i += 2;
                continue;
            } else if next == u16::from(b'&') {
                out.extend_from_slice(matched.as_units());
                i += 2;
                continue;
            } else if next == u16::from(b'`') {
                out.extend_from_slice(&subject.as_units()[..at]);
                i += 2;
                continue;
            } else if next == u16::from(b'\'') {
                out.extend_from_slice(&subject.as_units()[at + matched.len()..]);
                i += 2;
                continue;
            }
        }
        out.push(units[i]);
        i += 1;
    }
    out
}

fn position_arg(interp: &mut Interpreter, value: &Value) -> Result<f64> {
    if value.is_undefined() {
        Ok(0.0)
    } else {
        interp.to_integer(value)
    }
}

pub(super) fn register_string(interp: &mut Interpreter) {
    let proto = interp.realm().string_prototype.clone();
    let ctor = constructor(
        interp,
        "String",
        1,
        &proto,
        |interp, _this, args| match args.first() {
            Some(v) => Ok(Value::String(interp.to_string(v)?)),
            None => Ok(Value::string("")),
        },
        |interp, _this, args| {
            let s = match args.first() {
                Some(v) => interp.to_string(v)?,
                None => JsString::empty(),
            };
            let proto = interp.realm().string_prototype.clone();
            Ok(Value::Object(interp.alloc(Object::new(ObjectKind::StringWrapper(s), Some(proto)))))
        },
    );

    method(interp, &ctor, "fromCharCode", 1, |interp, _this, args| {
        let mut units = Vec::with_capacity(args.len());
        for a in args {
            units.push(to_uint16(interp.to_number(a)?));
        }
        Ok(Value::String(JsString::from(units)))
    });

    method(interp, &proto, "toString", 0, |_interp, this, _args| {
        this_string_value(this, "toString")
    });
    method(interp, &proto, "valueOf", 0, |_interp, this, _args| {
        this_string_value(this, "valueOf")
    });

    method(interp, &proto, "charAt", 1, |interp, this, args| {
        let s = this_string(interp, this, "charAt")?;
        let pos = position_arg(interp, &arg(args, 0))?;
        if pos < 0.0 || pos >= s.len() as f64 {
            return Ok(Value::string(""));
        }
        Ok(Value::String(s.substring(pos as usize, pos as usize + 1)))
    });

    method(interp, &proto, "charCodeAt", 1, |interp, this, args| {
        let s = this_string(interp, this, "charCodeAt")?;
        let pos = position_arg(interp, &arg(args, 0))?;
        if pos < 0.0 || pos >= s.len() as f64 {
            return Ok(Value::Number(f64::NAN));
        }
        Ok(s.unit_at(pos as usize).map_or(Value::Number(f64::NAN), |u| Value::Number(f64::from(u))))
    });

    method(interp, &proto, "indexOf", 1, |interp, this, args| {
        let s = this_string(interp, this, "indexOf")?;
        let needle = interp.to_string(&arg(args, 0))?;
        let from = position_arg(interp, &arg(args, 1))?.clamp(0.0, s.len() as f64) as usize;
        Ok(Value::Number(s.index_of(&needle, from).map_or(-1.0, |i| i as f64)))
    });

    method(interp, &proto, "lastIndexOf", 1, |interp, this, args| {
        let s = this_string(interp, this, "lastIndexOf")?;
        let needle = interp.to_string(&arg(args, 0))?;
        let n = interp.to_number(&arg(args, 1))?;
        let from = if n.is_nan() {
            s.len()
        } else {
            n.trunc().clamp(0.0, s.len() as f64) as usize
        };
        Ok(Value::Number(s.last_index_of(&needle, from).map_or(-1.0, |i| i as f64)))
    });

    method(interp, &proto, "substring", 2, |interp, this, args| {
        let s = this_string(interp, this, "substring")?;
        let len = s.len() as f64;
        let start = position_arg(interp, &arg(args, 0))?.clamp(0.0, len);
        let end = match arg(args, 1) {
            Value::Undefined => len,
            v => interp.to_integer(&v)?.clamp(0.0, len),
        };
        let (from, to) = if start <= end { (start, end) } else { (end, start) };
        Ok(Value::String(s.substring(from as usize, to as usize)))
    });

    method(interp, &proto, "substr", 2, |interp, this, args| {
        let s = this_string(interp, this, "substr")?;
        let len = s.len() as f64;
        let start = relative_index(interp, &arg(args, 0), len, 0.0)?;
        let count = match arg(args, 1) {
            Value::Undefined => len,
            v => interp.to_integer(&v)?,
        };
        let count = count.clamp(0.0, len - start);
        if count <= 0.0 {
            return Ok(Value::string(""));
        }
        Ok(Value::String(s.substring(start as usize, (start + count) as usize)))
    });

    method(interp, &proto, "slice", 2, |interp, this, args| {
        let s = this_string(interp, this, "slice")?;
        let len = s.len() as f64;
        let start = relative_index(interp, &arg(args, 0), len, 0.0)?;
        let end = relative_index(interp, &arg(args, 1), len, len)?;
        if start >= end {
            return Ok(Value::string(""));
        }
        Ok(Value::String(s.substring(start as usize, end as usize)))
    });

    method(interp, &proto, "toUpperCase", 0, |interp, this, _args| {
        let s = this_string(interp, this, "toUpperCase")?;
        Ok(Value::String(map_case(&s, true)))
    });

    method(interp, &proto, "toLowerCase", 0, |interp, this, _args| {
        let s = this_string(interp, this, "toLowerCase")?;
        Ok(Value::String(map_case(&s, false)))
    });

    method(interp, &proto, "trim", 0, |interp, this, _args| {
        let s = this_string(interp, this, "trim")?;
        Ok(Value::String(JsString::from(trim_units(s.as_units()))))
    });

    method(interp, &proto, "concat", 1, |interp, this, args| {
        let mut s = this_string(interp, this, "concat")?;
        for a in args {
            let next = interp.to_string(a)?;
            s = s.concat(&next);
        }
        Ok(Value::String(s))
    });

    method(interp, &proto, "split", 2, |interp, this, args| {
        let s = this_string(interp, this, "split")?;
        let limit = match arg(args, 1) {
            Value::Undefined => u32::MAX,
            v => to_uint32(interp.to_number(&v)?),
        } as usize;
        let separator = arg(args, 0);
        let mut parts = Vec::new();
        if limit == 0 {
            return Ok(Value::Object(interp.new_array(parts)));
        }
        if separator.is_undefined() {
            parts.push(Value::String(s));
            return Ok(Value::Object(interp.new_array(parts)));
        }
        let sep = interp.to_string(&separator)?;
        if sep.is_empty() {
            for i in 0..s.len().min(limit) {
                parts.push(Value::String(s.substring(i, i + 1)));
            }
            return Ok(Value::Object(interp.new_array(parts)));
        }
        let mut start = 0;
        while let Some(at) = s.index_of(&sep, start) {
            parts.push(Value::String(s.substring(start, at)));
            if parts.len() == limit {
                return Ok(Value::Object(interp.new_array(parts)));
            }
            start = at + sep.len();
        }
        parts.push(Value::String(s.substring(start, s.len())));
        Ok(Value::Object(interp.new_array(parts)))
    });

    method(interp, &proto, "replace", 2, |interp, this, args| {
        let s = this_string(interp, this, "replace")?;
        let pattern = interp.to_string(&arg(args, 0))?;
        let Some(at) = s.index_of(&pattern, 0) else {
            return Ok(Value::String(s));
        };
        let replacement = arg(args, 1);
        let inserted = if replacement.is_callable() {
            let r = interp.call(
                &replacement,
                Value::Undefined,
                &[Value::String(pattern.clone()), Value::Number(at as f64), Value::String(s.clone())],
            )?;
            interp.to_string(&r)?.as_units().to_vec()
        } else {
            let template = interp.to_string(&replacement)?;
            expand_replacement(&template, &s, at, &pattern)
        };
        let mut out = s.as_units()[..at].to_vec();
        out.extend_from_slice(&inserted);
        out.extend_from_slice(&s.as_units()[at + pattern.len()..]);
        Ok(Value::String(JsString::from(out)))
    });

    method(interp, &proto, "localeCompare", 1, |interp, this, args| {
        let s = this_string(interp, this, "localeCompare")?;
        let other = interp.to_string(&arg(args, 0))?;
        Ok(Value::Number(match s.as_units().cmp(other.as_units()) {
            std::cmp::Ordering::Less => -1.0,
            std::cmp::Ordering::Equal => 0.0,
            std::cmp::Ordering::Greater => 1.0,
        }))
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
    fn test_primitive_methods() {
        assert_eq!(eval_str("'hello'.charAt(1)"), "e");
        assert_eq!(eval_str("'hello'.charCodeAt(9)"), "NaN");
        assert_eq!(eval_str("'hello'.indexOf('l')"), "2");
        assert_eq!(eval_str("'hello'.lastIndexOf('l')"), "3");
        assert_eq!(eval_str("'hello'.substring(4, 1)"), "ell");
        assert_eq!(eval_str("'hello'.substr(-3, 2)"), "ll");
        assert_eq!(eval_str("'hello'.slice(1, -1)"), "ell");
        assert_eq!(eval_str("'  pad \\n'.trim()"), "pad");
        assert_eq!(eval_str("'MiXeD'.toLowerCase() + 'x'.toUpperCase()"), "mixedX");
    }

    #[test]
    fn test_split() {
        assert_eq!(eval_str("'a,b,,c'.split(',').length"), "4");
        assert_eq!(eval_str("'abc'.split('').join('|')"), "a|b|c");
        assert_eq!(eval_str("'a,b,c'.split(',', 2).join()"), "a,b");
        assert_eq!(eval_str("'abc'.split().length"), "1");
    }

    #[test]
    fn test_replace_first_occurrence() {
        assert_eq!(eval_str("'a-b-c'.replace('-', '+')"), "a+b-c");
        assert_eq!(eval_str("'abc'.replace('b', '[$&]')"), "a[b]c");
        assert_eq!(
            eval_str("'abc'.replace('b', function (m, at) { return m.toUpperCase() + at; })"),
            "aB1c"
        );
    }

    #[test]
    fn test_wrapper_and_from_char_code() {
        assert_eq!(eval_str("typeof new String('x')"), "object");
        assert_eq!(eval_str("new String('xy').length"), "2");
        assert_eq!(eval_str("String.fromCharCode(104, 105)"), "hi");
        assert_eq!(eval_str("String(null)"), "null");
    }
}
