//! `JSON.stringify`
//!
//! Output goes into one buffer whose length is checked as it grows, so an
//! array with a huge `length` fails with a RangeError instead of
//! allocating for every index up front.

use super::quote_into;
use crate::error::{messages, Error, Result};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::number::number_to_string;
use crate::runtime::interpreter::index_key;
use crate::runtime::{JsString, ObjectKind, ObjectRef, PropertyKey, Value};
use crate::stack::MAX_JSON_DEPTH;
use std::rc::Rc;
use tracing::trace;

/// Widest indent accepted from the `space` argument
const MAX_GAP: usize = 10;

struct Serializer<'a> {
    interp: &'a mut Interpreter,
    replacer: Option<Value>,
    allow_list: Option<Vec<PropertyKey>>,
    gap: Vec<u16>,
    indent: Vec<u16>,
    stack: Vec<ObjectRef>,
    out: Vec<u16>,
}

/// Serialize `value`; `None` when the root is not serializable
/// (undefined, a function, or filtered away by the replacer)
pub fn stringify(
    interp: &mut Interpreter,
    value: &Value,
    replacer: &Value,
    space: &Value,
) -> Result<Option<JsString>> {
    trace!("JSON.stringify");
    let (replacer_fn, allow_list) = read_replacer(interp, replacer)?;
    let gap = read_gap(interp, space)?;

    let wrapper = interp.new_object();
    wrapper
        .borrow_mut()
        .create_data_property(PropertyKey::from(""), value.clone());

    let mut serializer = Serializer {
        interp,
        replacer: replacer_fn,
        allow_list,
        gap,
        indent: Vec::new(),
        stack: Vec::new(),
        out: Vec::new(),
    };
    if !serializer.serialize_property(&wrapper, PropertyKey::from(""))? {
        return Ok(None);
    }
    Ok(Some(JsString::from(serializer.out)))
}

fn read_replacer(interp: &mut Interpreter, replacer: &Value) -> Result<(Option<Value>, Option<Vec<PropertyKey>>)> {
    if replacer.is_callable() {
        return Ok((Some(replacer.clone()), None));
    }
    let Value::Object(list) = replacer else {
        return Ok((None, None));
    };
    if !replacer.is_array() {
        return Ok((None, None));
    }
    let mut keys: Vec<PropertyKey> = Vec::new();
    let len = u64::from(interp.length_of(list)?);
    let mut cursor = interp.next_present_index(list, 0, len);
    while let Some(i) = cursor {
        let item = interp.get(list, &index_key(i))?;
        let name = match &item {
            Value::String(s) => Some(s.clone()),
            Value::Number(_) => Some(interp.to_string(&item)?),
            Value::Object(o) => {
                let wrapped = matches!(
                    o.borrow().kind,
                    ObjectKind::StringWrapper(_) | ObjectKind::NumberWrapper(_)
                );
                if wrapped {
                    Some(interp.to_string(&item)?)
                } else {
                    None
                }
            }
            _ => None,
        };
        if let Some(name) = name {
            let key = PropertyKey::from(name);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        cursor = interp.next_present_index(list, i + 1, len);
    }
    Ok((None, Some(keys)))
}

fn read_gap(interp: &mut Interpreter, space: &Value) -> Result<Vec<u16>> {
    let space = match space {
        Value::Object(o) => {
            let kind = match o.borrow().kind {
                ObjectKind::NumberWrapper(_) => 1,
                ObjectKind::StringWrapper(_) => 2,
                _ => 0,
            };
            match kind {
                1 => Value::Number(interp.to_number(space)?),
                2 => Value::String(interp.to_string(space)?),
                _ => space.clone(),
            }
        }
        other => other.clone(),
    };
    Ok(match space {
        Value::Number(n) => {
            let width = crate::runtime::number::to_integer(n).clamp(0.0, MAX_GAP as f64) as usize;
            vec![u16::from(b' '); width]
        }
        Value::String(s) => s.as_units()[..s.len().min(MAX_GAP)].to_vec(),
        _ => Vec::new(),
    })
}

impl Serializer<'_> {
    /// Fail once the output could no longer be a string
    fn reserve(&self, additional: usize) -> Result<()> {
        if self.out.len().saturating_add(additional) > JsString::MAX_LENGTH {
            return Err(Error::range_error(messages::STRING_TOO_LONG));
        }
        Ok(())
    }

    fn push_str(&mut self, text: &str) -> Result<()> {
        self.reserve(text.len())?;
        self.out.extend(text.encode_utf16());
        Ok(())
    }

    fn push_quoted(&mut self, units: &[u16]) -> Result<()> {
        self.reserve(units.len() + 2)?;
        quote_into(&mut self.out, units);
        self.reserve(0)
    }

    /// Comma and line break before a member or element
    fn separator(&mut self, first: bool) -> Result<()> {
        self.reserve(2 + self.indent.len())?;
        if !first {
            self.out.push(u16::from(b','));
        }
        if !self.gap.is_empty() {
            self.out.push(u16::from(b'\n'));
            self.out.extend_from_slice(&self.indent);
        }
        Ok(())
    }

    fn close(&mut self, close: u8, empty: bool, stepback: &[u16]) -> Result<()> {
        self.reserve(2 + stepback.len())?;
        if !empty && !self.gap.is_empty() {
            self.out.push(u16::from(b'\n'));
            self.out.extend_from_slice(stepback);
        }
        self.out.push(u16::from(close));
        Ok(())
    }

    /// SerializeJSONProperty; false when the value is omitted and nothing
    /// was written
    fn serialize_property(&mut self, holder: &ObjectRef, key: PropertyKey) -> Result<bool> {
        let mut value = self.interp.get(holder, &key)?;

        if let Value::Object(obj) = &value {
            let to_json = self.interp.get(obj, &PropertyKey::from("toJSON"))?;
            if to_json.is_callable() {
                value = self
                    .interp
                    .call(&to_json, value.clone(), &[Value::String(key.to_js_string())])?;
            }
        }
        if let Some(replacer) = self.replacer.clone() {
            value = self.interp.call(
                &replacer,
                Value::Object(holder.clone()),
                &[Value::String(key.to_js_string()), value],
            )?;
        }
        if let Value::Object(obj) = &value {
            let unwrapped = match obj.borrow().kind {
                ObjectKind::NumberWrapper(_) => Some(0),
                ObjectKind::StringWrapper(_) => Some(1),
                ObjectKind::BooleanWrapper(b) => Some(if b { 2 } else { 3 }),
                _ => None,
            };
            value = match unwrapped {
                Some(0) => Value::Number(self.interp.to_number(&value)?),
                Some(1) => Value::String(self.interp.to_string(&value)?),
                Some(2) => Value::Boolean(true),
                Some(3) => Value::Boolean(false),
                _ => value,
            };
        }

        match value {
            Value::Null => self.push_str("null")?,
            Value::Boolean(b) => self.push_str(if b { "true" } else { "false" })?,
            Value::String(s) => self.push_quoted(s.as_units())?,
            Value::Number(n) if n.is_finite() => self.push_str(&number_to_string(n))?,
            Value::Number(_) => self.push_str("null")?,
            Value::Object(obj) if !obj.borrow().is_callable() => {
                let is_array = matches!(obj.borrow().kind, ObjectKind::Array(_));
                if is_array {
                    crate::stack::guard(|| self.serialize_array(&obj))?;
                } else {
                    crate::stack::guard(|| self.serialize_object(&obj))?;
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn enter(&mut self, obj: &ObjectRef) -> Result<Vec<u16>> {
        if self.stack.iter().any(|o| Rc::ptr_eq(o, obj)) {
            return Err(Error::type_error(messages::CYCLICAL_STRUCTURE));
        }
        if self.stack.len() >= MAX_JSON_DEPTH {
            return Err(Error::range_error(messages::NESTING_TOO_DEEP));
        }
        self.stack.push(obj.clone());
        let stepback = self.indent.clone();
        self.indent.extend_from_slice(&self.gap);
        Ok(stepback)
    }

    fn leave(&mut self, stepback: Vec<u16>) {
        self.stack.pop();
        self.indent = stepback;
    }

    fn serialize_object(&mut self, obj: &ObjectRef) -> Result<()> {
        let stepback = self.enter(obj)?;
        let keys = match &self.allow_list {
            Some(list) => list.clone(),
            None => self.interp.own_enumerable_keys(obj),
        };
        self.push_str("{")?;
        let mut empty = true;
        for key in keys {
            let mark = self.out.len();
            self.separator(empty)?;
            self.push_quoted(key.to_js_string().as_units())?;
            self.push_str(if self.gap.is_empty() { ":" } else { ": " })?;
            if self.serialize_property(obj, key)? {
                empty = false;
            } else {
                self.out.truncate(mark);
            }
        }
        self.close(b'}', empty, &stepback)?;
        self.leave(stepback);
        Ok(())
    }

    fn serialize_array(&mut self, obj: &ObjectRef) -> Result<()> {
        let stepback = self.enter(obj)?;
        let len = u64::from(self.interp.length_of(obj)?);
        // every element takes at least one unit plus a separator
        self.reserve(usize::try_from(len.saturating_mul(2)).unwrap_or(usize::MAX))?;
        self.push_str("[")?;
        // Holes can only reach the replacer if one is installed
        let skip_holes = self.replacer.is_none();
        let mut i = 0;
        while i < len {
            let next = if skip_holes {
                self.interp.next_present_index(obj, i, len).unwrap_or(len)
            } else {
                i
            };
            let per_hole = 5 + if self.gap.is_empty() { 0 } else { 1 + self.indent.len() };
            let holes = (next - i).saturating_mul(per_hole as u64);
            self.reserve(usize::try_from(holes).unwrap_or(usize::MAX))?;
            while i < next {
                self.separator(i == 0)?;
                self.push_str("null")?;
                i += 1;
            }
            if i == len {
                break;
            }
            self.separator(i == 0)?;
            if !self.serialize_property(obj, index_key(i))? {
                self.push_str("null")?;
            }
            i += 1;
        }
        self.close(b']', len == 0, &stepback)?;
        self.leave(stepback);
        Ok(())
    }
}
