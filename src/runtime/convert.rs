//! Conversion between script values and `serde_json` data

use super::interpreter::{index_key, Interpreter};
use super::{JsString, ObjectKind, ObjectRef, PropertyKey, Value};
use crate::error::{messages, Error, Result};
use crate::stack::MAX_JSON_DEPTH;
use serde_json::{Map, Number};
use std::rc::Rc;

/// Convert `value` to JSON data. Undefined, functions and non-finite
/// numbers become `null`; cycles are a TypeError.
pub(super) fn to_json_value(interp: &mut Interpreter, value: &Value) -> Result<serde_json::Value> {
    let mut stack = Vec::new();
    convert(interp, value, &mut stack)
}

fn convert(interp: &mut Interpreter, value: &Value, stack: &mut Vec<ObjectRef>) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Undefined | Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => number(*n),
        Value::String(s) => serde_json::Value::String(s.to_rust_string()),
        Value::Object(obj) => {
            if obj.borrow().is_callable() {
                return Ok(serde_json::Value::Null);
            }
            if stack.iter().any(|o| Rc::ptr_eq(o, obj)) {
                return Err(Error::type_error(messages::CYCLICAL_STRUCTURE));
            }
            if stack.len() >= MAX_JSON_DEPTH {
                return Err(Error::range_error(messages::NESTING_TOO_DEEP));
            }
            stack.push(obj.clone());
            let wrapped = match &obj.borrow().kind {
                ObjectKind::BooleanWrapper(b) => Some(serde_json::Value::Bool(*b)),
                ObjectKind::NumberWrapper(n) => Some(number(*n)),
                ObjectKind::StringWrapper(s) => Some(serde_json::Value::String(s.to_rust_string())),
                _ => None,
            };
            let is_array = matches!(obj.borrow().kind, ObjectKind::Array(_));
            let converted = match wrapped {
                Some(v) => v,
                None if is_array => {
                    let len = u64::from(interp.length_of(obj)?);
                    // same bound as the text form, where each element costs two units
                    if len.saturating_mul(2) > JsString::MAX_LENGTH as u64 {
                        return Err(Error::range_error(messages::INVALID_ARRAY_LENGTH));
                    }
                    let mut items = Vec::new();
                    let mut cursor = interp.next_present_index(obj, 0, len);
                    while let Some(i) = cursor {
                        items.resize(i as usize, serde_json::Value::Null);
                        let element = interp.get(obj, &index_key(i))?;
                        items.push(crate::stack::guard(|| convert(interp, &element, stack))?);
                        cursor = interp.next_present_index(obj, i + 1, len);
                    }
                    items.resize(len as usize, serde_json::Value::Null);
                    serde_json::Value::Array(items)
                }
                None => {
                    let mut map = Map::new();
                    for key in interp.own_enumerable_keys(obj) {
                        let member = interp.get(obj, &key)?;
                        let member = crate::stack::guard(|| convert(interp, &member, stack))?;
                        map.insert(key.to_string(), member);
                    }
                    serde_json::Value::Object(map)
                }
            };
            stack.pop();
            converted
        }
    })
}

fn number(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 && !(n == 0.0 && n.is_sign_negative()) {
        return serde_json::Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

/// Build script values from JSON data
pub(super) fn from_json_value(interp: &mut Interpreter, json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::string(s.as_str()),
        serde_json::Value::Array(items) => {
            let values = items
                .iter()
                .map(|item| crate::stack::guard(|| from_json_value(interp, item)))
                .collect();
            Value::Object(interp.new_array(values))
        }
        serde_json::Value::Object(map) => {
            let obj = interp.new_object();
            for (key, member) in map {
                let value = crate::stack::guard(|| from_json_value(interp, member));
                obj.borrow_mut()
                    .create_data_property(PropertyKey::from(key.as_str()), value);
            }
            Value::Object(obj)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{Runtime, Value};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_to_json_value() {
        let mut rt = Runtime::new();
        let v = rt
            .eval("({name: 'x', list: [1, 2.5, null, undefined], nested: {ok: true}, f: function () {}})")
            .unwrap();
        assert_eq!(
            rt.to_json_value(&v).unwrap(),
            json!({"name": "x", "list": [1, 2.5, null, null], "nested": {"ok": true}, "f": null})
        );
    }

    #[test]
    fn test_from_json_value() {
        let mut rt = Runtime::new();
        let v = rt.from_json_value(&json!({"a": [1, "two", {"b": false}]}));
        rt.set_global("data", v);
        assert_eq!(rt.eval("data.a[1] + data.a.length + data.a[2].b").unwrap(), Value::string("two3false"));
    }

    #[test]
    fn test_cycle_is_type_error() {
        let mut rt = Runtime::new();
        let v = rt.eval("var o = {}; o.o = o; o").unwrap();
        assert_eq!(rt.to_json_value(&v).unwrap_err().kind(), Some(crate::error::ErrorKind::TypeError));
    }

    #[test]
    fn test_sparse_array_holes_become_null() {
        let mut rt = Runtime::new();
        let v = rt.eval("var a = [1]; a[3] = 'x'; a.length = 5; a").unwrap();
        assert_eq!(rt.to_json_value(&v).unwrap(), json!([1, null, null, "x", null]));
        let huge = rt.eval("var b = []; b.length = 4294967295; b").unwrap();
        assert_eq!(rt.to_json_value(&huge).unwrap_err().kind(), Some(crate::error::ErrorKind::RangeError));
    }
}
