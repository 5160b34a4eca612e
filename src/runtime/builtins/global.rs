//! Global value properties and functions

use super::{arg, global_binding};
use crate::error::{Error, Result};
use crate::parser::parse;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::number::{scan_decimal_prefix, trim_units};
use crate::runtime::{JsString, Property, PropertyFlags, Value};
use std::rc::Rc;
use tracing::debug;

const URI_RESERVED: &str = ";/?:@&=+$,";
const URI_MARK: &str = "-_.!~*'()";

fn is_unreserved(u: u16) -> bool {
    u8::try_from(u).is_ok_and(|b| b.is_ascii_alphanumeric() || URI_MARK.as_bytes().contains(&b))
}

fn in_set(u: u16, set: &str) -> bool {
    u8::try_from(u).is_ok_and(|b| set.as_bytes().contains(&b))
}

fn malformed() -> Error {
    Error::uri_error("URI malformed")
}

/// Percent-encode every unit not accepted by `keep`
fn encode(s: &JsString, keep: impl Fn(u16) -> bool) -> Result<JsString> {
    let units = s.as_units();
    let mut out: Vec<u16> = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        let u = units[i];
        if keep(u) {
            out.push(u);
            i += 1;
            continue;
        }
        let code_point = match u {
            0xDC00..=0xDFFF => return Err(malformed()),
            0xD800..=0xDBFF => {
                let low = units.get(i + 1).copied().ok_or_else(malformed)?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(malformed());
                }
                i += 1;
                0x10000 + ((u32::from(u) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
            }
            _ => u32::from(u),
        };
        let c = char::from_u32(code_point).ok_or_else(malformed)?;
        let mut buf = [0u8; 4];
        for byte in c.encode_utf8(&mut buf).bytes() {
            out.extend(format!("%{:02X}", byte).encode_utf16());
        }
        i += 1;
    }
    Ok(JsString::from(out))
}

fn hex_byte(units: &[u16], at: usize) -> Result<u8> {
    if units.get(at) != Some(&u16::from(b'%')) {
        return Err(malformed());
    }
    let digit = |i: usize| {
        units
            .get(i)
            .and_then(|u| char::from_u32(u32::from(*u)))
            .and_then(|c| c.to_digit(16))
            .ok_or_else(malformed)
    };
    Ok((digit(at + 1)? * 16 + digit(at + 2)?) as u8)
}

/// Decode escapes, leaving escapes of characters in `reserved` untouched
fn decode(s: &JsString, reserved: &str) -> Result<JsString> {
    let units = s.as_units();
    let mut out: Vec<u16> = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        if units[i] != u16::from(b'%') {
            out.push(units[i]);
            i += 1;
            continue;
        }
        let first = hex_byte(units, i)?;
        if first < 0x80 {
            if reserved.as_bytes().contains(&first) {
                out.extend_from_slice(&units[i..i + 3]);
            } else {
                out.push(u16::from(first));
            }
            i += 3;
            continue;
        }
        let len = match first.leading_ones() {
            2 => 2,
            3 => 3,
            4 => 4,
            _ => return Err(malformed()),
        };
        let mut bytes = vec![first];
        for k in 1..len {
            let b = hex_byte(units, i + 3 * k)?;
            if b & 0xC0 != 0x80 {
                return Err(malformed());
            }
            bytes.push(b);
        }
        let text = std::str::from_utf8(&bytes).map_err(|_| malformed())?;
        out.extend(text.encode_utf16());
        i += 3 * len;
    }
    Ok(JsString::from(out))
}

fn parse_int(interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let input = interp.to_string(&arg(args, 0))?;
    let mut radix = interp.to_int32(&arg(args, 1))?;
    let s = trim_units(input.as_units());

    let (negative, mut s) = match s.first() {
        Some(&u) if u == u16::from(b'-') => (true, &s[1..]),
        Some(&u) if u == u16::from(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let has_hex_prefix = s.len() >= 2
        && s[0] == u16::from(b'0')
        && (s[1] == u16::from(b'x') || s[1] == u16::from(b'X'));
    if radix == 0 || radix == 16 {
        if has_hex_prefix {
            s = &s[2..];
            radix = 16;
        } else if radix == 0 {
            radix = 10;
        }
    }
    if !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }

    let mut value = 0.0f64;
    let mut digits = 0;
    for &u in s {
        match char::from_u32(u32::from(u)).and_then(|c| c.to_digit(radix as u32)) {
            Some(d) => {
                value = value * radix as f64 + d as f64;
                digits += 1;
            }
            None => break,
        }
    }
    if digits == 0 {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(if negative { -value } else { value }))
}

fn global_eval(interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let Some(Value::String(source)) = args.first() else {
        return Ok(arg(args, 0));
    };
    let program = parse(&source.to_rust_string()).inspect_err(|err| {
        debug!(error = %err, "eval source failed to parse");
    })?;
    interp.run_global_code(&program, true)
}

fn function(interp: &mut Interpreter, name: &str, arity: u32, f: fn(&mut Interpreter, &[Value]) -> Result<Value>) {
    let call = move |interp: &mut Interpreter, _this: &Value, args: &[Value]| f(interp, args);
    let func = interp.create_native_function(name, arity, Rc::new(call), None);
    global_binding(interp, name, Value::Object(func));
}

pub(super) fn register_global_functions(interp: &mut Interpreter) {
    {
        let global = interp.global().clone();
        let mut g = global.borrow_mut();
        g.insert_property("NaN", Property::data(Value::Number(f64::NAN), PropertyFlags::empty()));
        g.insert_property(
            "Infinity",
            Property::data(Value::Number(f64::INFINITY), PropertyFlags::empty()),
        );
        g.insert_property("undefined", Property::data(Value::Undefined, PropertyFlags::empty()));
    }

    function(interp, "isNaN", 1, |interp, args| {
        Ok(Value::Boolean(interp.to_number(&arg(args, 0))?.is_nan()))
    });

    function(interp, "isFinite", 1, |interp, args| {
        Ok(Value::Boolean(interp.to_number(&arg(args, 0))?.is_finite()))
    });

    function(interp, "parseInt", 2, parse_int);

    function(interp, "parseFloat", 1, |interp, args| {
        let input = interp.to_string(&arg(args, 0))?;
        let s = trim_units(input.as_units());
        Ok(Value::Number(scan_decimal_prefix(s).map_or(f64::NAN, |(v, _)| v)))
    });

    function(interp, "encodeURI", 1, |interp, args| {
        let s = interp.to_string(&arg(args, 0))?;
        let keep = |u: u16| is_unreserved(u) || in_set(u, URI_RESERVED) || u == u16::from(b'#');
        Ok(Value::String(encode(&s, keep)?))
    });

    function(interp, "encodeURIComponent", 1, |interp, args| {
        let s = interp.to_string(&arg(args, 0))?;
        Ok(Value::String(encode(&s, is_unreserved)?))
    });

    function(interp, "decodeURI", 1, |interp, args| {
        let s = interp.to_string(&arg(args, 0))?;
        Ok(Value::String(decode(&s, ";/?:@&=+$,#")?))
    });

    function(interp, "decodeURIComponent", 1, |interp, args| {
        let s = interp.to_string(&arg(args, 0))?;
        Ok(Value::String(decode(&s, "")?))
    });

    function(interp, "eval", 1, global_eval);

    function(interp, "print", 1, |interp, args| {
        let mut parts = Vec::with_capacity(args.len());
        for a in args {
            parts.push(interp.to_rust_string(a)?);
        }
        interp.print(&parts.join(" "));
        Ok(Value::Undefined)
    });
}

#[cfg(test)]
mod tests {
    use crate::runtime::{Runtime, RuntimeConfig, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn eval_str(source: &str) -> String {
        let mut rt = Runtime::new();
        rt.eval(source).unwrap().describe()
    }

    #[test]
    fn test_parse_int_and_float() {
        assert_eq!(eval_str("parseInt('  42px')"), "42");
        assert_eq!(eval_str("parseInt('0x1f')"), "31");
        assert_eq!(eval_str("parseInt('-101', 2)"), "-5");
        assert_eq!(eval_str("parseInt('z', 37)"), "NaN");
        assert_eq!(eval_str("parseFloat('3.25e2abc')"), "325");
        assert_eq!(eval_str("parseFloat('-Infinityx')"), "-Infinity");
        assert_eq!(eval_str("parseFloat('.')"), "NaN");
    }

    #[test]
    fn test_uri_round_trip() {
        assert_eq!(eval_str("encodeURIComponent('a b&c/é')"), "a%20b%26c%2F%C3%A9");
        assert_eq!(eval_str("encodeURI('http://x.y/a b?q=1#f')"), "http://x.y/a%20b?q=1#f");
        assert_eq!(eval_str("decodeURIComponent('a%20b%26c%2F%C3%A9')"), "a b&c/é");
        assert_eq!(eval_str("decodeURI('%3B%20')"), "%3B ");
    }

    #[test]
    fn test_malformed_uri_is_uri_error() {
        assert_eq!(eval_str("try { decodeURIComponent('%E0%A4%A') } catch (e) { e.name }"), "URIError");
        assert_eq!(eval_str("try { encodeURIComponent('\\uDC00') } catch (e) { e.name }"), "URIError");
    }

    #[test]
    fn test_global_eval_declares_deletable_vars() {
        assert_eq!(eval_str("eval('var q = 5; q * 2')"), "10");
        assert_eq!(eval_str("eval('var q = 5'); delete q"), "true");
        assert_eq!(eval_str("eval(7)"), "7");
        assert_eq!(eval_str("try { eval('1 +') } catch (e) { e.name }"), "SyntaxError");
    }

    #[test]
    fn test_print_uses_output_sink() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let sink = lines.clone();
        let config = RuntimeConfig {
            output: Some(Rc::new(move |s: &str| sink.borrow_mut().push(s.to_string()))),
            ..Default::default()
        };
        let mut rt = Runtime::with_config(config);
        assert_eq!(rt.eval("print('a', 1, true)").unwrap(), Value::Undefined);
        assert_eq!(lines.borrow().as_slice(), ["a 1 true".to_string()]);
    }

    #[test]
    fn test_global_constants_are_read_only() {
        assert_eq!(eval_str("NaN = 1; isNaN(NaN)"), "true");
        assert_eq!(eval_str("undefined = 2; typeof undefined"), "undefined");
    }
}
