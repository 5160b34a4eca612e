//! JavaScript value types
//!
//! This module defines the runtime representation of JavaScript values.
//! Conversions that can run script code (ToPrimitive on objects and the
//! ones built on it) live on the interpreter; the ones here never call out.

use super::number::{number_to_string, string_to_number};
use super::object::{Object, ObjectKind, ObjectRef};
use super::string::JsString;
use std::fmt;
use std::rc::Rc;

/// A JavaScript value
#[derive(Clone, Default)]
pub enum Value {
    /// undefined
    #[default]
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String of UTF-16 code units
    String(JsString),
    /// Object (includes arrays, functions, etc.)
    Object(ObjectRef),
}

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<JsString>) -> Self {
        Value::String(s.into())
    }

    /// Check if value is undefined
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is null or undefined
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Check if value is an object
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// The object handle, if this is an object
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// The number, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string, if this is a string
    pub fn as_string(&self) -> Option<&JsString> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value is a callable object
    pub fn is_callable(&self) -> bool {
        match self {
            Value::Object(obj) => obj.borrow().is_callable(),
            _ => false,
        }
    }

    /// Whether the value is an Array object
    pub fn is_array(&self) -> bool {
        match self {
            Value::Object(obj) => matches!(obj.borrow().kind, ObjectKind::Array(_)),
            _ => false,
        }
    }

    /// Convert to boolean (truthiness)
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// ToNumber for primitives; objects must go through ToPrimitive first
    pub fn primitive_to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s.as_units()),
            Value::Object(_) => f64::NAN,
        }
    }

    /// ToString for primitives; objects must go through ToPrimitive first
    pub fn primitive_to_string(&self) -> JsString {
        match self {
            Value::String(s) => s.clone(),
            other => JsString::from(other.describe()),
        }
    }

    /// Get the typeof string
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object", // Historical quirk
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(obj) => {
                if obj.borrow().is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // NaN compares unequal; +0 and -0 compare equal
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// SameValue, used by property redefinition checks
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b && a.is_sign_negative() == b.is_sign_negative()
                }
            }
            _ => self.strict_equals(other),
        }
    }

    /// Human-readable rendering without running script code
    ///
    /// Primitives render as their string conversion; error objects as
    /// `Name: message`; other objects by class.
    pub fn describe(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.to_rust_string(),
            Value::Object(obj) => describe_object(&obj.borrow()),
        }
    }
}

fn describe_object(obj: &Object) -> String {
    let text_of = |key: &str| match obj.own_data_value(key) {
        Some(Value::String(s)) => Some(s.to_rust_string()),
        _ => None,
    };
    match &obj.kind {
        ObjectKind::Error => {
            let name = text_of("name")
                .or_else(|| obj.prototype.as_ref().and_then(|p| proto_name(&p.borrow())))
                .unwrap_or_else(|| "Error".to_string());
            match text_of("message") {
                Some(msg) if !msg.is_empty() => format!("{}: {}", name, msg),
                _ => name,
            }
        }
        ObjectKind::Function(func) => format!("[Function: {}]", func.name()),
        ObjectKind::StringWrapper(s) => s.to_rust_string(),
        ObjectKind::NumberWrapper(n) => number_to_string(*n),
        ObjectKind::BooleanWrapper(b) => b.to_string(),
        ObjectKind::Array(arr) => format!("[Array({})]", arr.length()),
        _ => format!("[object {}]", obj.class_name()),
    }
}

fn proto_name(proto: &Object) -> Option<String> {
    match proto.own_data_value("name") {
        Some(Value::String(s)) => Some(s.to_rust_string()),
        _ => None,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Object(obj) => match obj.try_borrow() {
                Ok(obj) => write!(f, "{}", describe_object(&obj)),
                Err(_) => write!(f, "[object <borrowed>]"),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(JsString::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(JsString::from(s))
    }
}

impl From<JsString> for Value {
    fn from(s: JsString) -> Self {
        Value::String(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality() {
        assert!(Value::Undefined.strict_equals(&Value::Undefined));
        assert!(Value::Null.strict_equals(&Value::Null));
        assert!(Value::Boolean(true).strict_equals(&Value::Boolean(true)));
        assert!(Value::Number(42.0).strict_equals(&Value::Number(42.0)));
        assert!(Value::string("hello").strict_equals(&Value::string("hello")));
        assert!(!Value::Null.strict_equals(&Value::Undefined));

        // NaN is not equal to itself
        assert!(!Value::Number(f64::NAN).strict_equals(&Value::Number(f64::NAN)));
        assert!(!Value::Number(1.0).strict_equals(&Value::Number(f64::NAN)));
        assert!(Value::Number(0.0).strict_equals(&Value::Number(-0.0)));
    }

    #[test]
    fn test_same_value() {
        assert!(Value::Number(f64::NAN).same_value(&Value::Number(f64::NAN)));
        assert!(!Value::Number(0.0).same_value(&Value::Number(-0.0)));
    }

    #[test]
    fn test_value_conversion() {
        assert!(Value::Boolean(true).to_boolean());
        assert!(!Value::Number(0.0).to_boolean());
        assert!(!Value::Number(f64::NAN).to_boolean());
        assert!(!Value::string("").to_boolean());
        assert!(Value::string("0").to_boolean());

        assert_eq!(Value::string(" 42 ").primitive_to_number(), 42.0);
        assert!(Value::Undefined.primitive_to_number().is_nan());
        assert_eq!(Value::Null.primitive_to_number(), 0.0);
        assert_eq!(Value::Number(1.5).primitive_to_string().to_string(), "1.5");
    }

    #[test]
    fn test_type_of() {
        assert_eq!(Value::Undefined.type_of(), "undefined");
        assert_eq!(Value::Null.type_of(), "object");
        assert_eq!(Value::Boolean(true).type_of(), "boolean");
        assert_eq!(Value::Number(42.0).type_of(), "number");
        assert_eq!(Value::string("hello").type_of(), "string");
    }
}
