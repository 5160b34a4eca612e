//! `JSON.parse`

use crate::error::{messages, Error, Result};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::{JsString, ObjectKind, ObjectRef, PropertyDescriptor, PropertyFlags, PropertyKey, Value};
use crate::stack::MAX_JSON_DEPTH;
use tracing::trace;

struct JsonParser<'a> {
    units: &'a [u16],
    pos: usize,
    depth: usize,
}

/// Parse `text`, then run `reviver` over the result bottom-up when it is
/// callable
pub fn parse(interp: &mut Interpreter, text: &JsString, reviver: &Value) -> Result<Value> {
    trace!(len = text.len(), "JSON.parse");
    let mut parser = JsonParser {
        units: text.as_units(),
        pos: 0,
        depth: 0,
    };
    parser.skip_whitespace();
    let value = parser.parse_value(interp)?;
    parser.skip_whitespace();
    if parser.pos < parser.units.len() {
        return Err(parser.unexpected());
    }

    if !reviver.is_callable() {
        return Ok(value);
    }
    let root = interp.new_object();
    root.borrow_mut().create_data_property(PropertyKey::from(""), value);
    walk(interp, reviver, &root, PropertyKey::from(""), 0)
}

/// Internalize a parsed value: children first, then the holder's entry
///
/// Every array index below the length is visited, holes included, since
/// the reviver sees them as `undefined`.
fn walk(interp: &mut Interpreter, reviver: &Value, holder: &ObjectRef, key: PropertyKey, depth: usize) -> Result<Value> {
    let value = interp.get(holder, &key)?;
    if let Value::Object(obj) = &value {
        if depth >= MAX_JSON_DEPTH {
            return Err(Error::range_error(messages::NESTING_TOO_DEEP));
        }
        if matches!(obj.borrow().kind, ObjectKind::Array(_)) {
            let len = interp.length_of(obj)?;
            for i in 0..len {
                revive_member(interp, reviver, obj, PropertyKey::from(i), depth)?;
            }
        } else {
            for child in interp.own_enumerable_keys(obj) {
                revive_member(interp, reviver, obj, child, depth)?;
            }
        }
    }
    interp.call(
        reviver,
        Value::Object(holder.clone()),
        &[Value::String(key.to_js_string()), value],
    )
}

/// Walk one member of `obj`, then store or delete what the reviver returned
fn revive_member(interp: &mut Interpreter, reviver: &Value, obj: &ObjectRef, child: PropertyKey, depth: usize) -> Result<()> {
    let revived = crate::stack::guard(|| walk(interp, reviver, obj, child.clone(), depth + 1))?;
    if revived.is_undefined() {
        interp.delete_property(obj, &child, false)?;
    } else {
        interp.define_property(obj, child, PropertyDescriptor::data(revived, PropertyFlags::DEFAULT), false)?;
    }
    Ok(())
}

impl JsonParser<'_> {
    fn peek(&self) -> Option<u16> {
        self.units.get(self.pos).copied()
    }

    fn unexpected(&self) -> Error {
        match self.peek() {
            None => Error::syntax_error("Unexpected end of JSON input"),
            Some(u) => Error::syntax_error(format!(
                "Unexpected token {} in JSON at position {}",
                String::from_utf16_lossy(&[u]),
                self.pos
            )),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(0x09 | 0x0A | 0x0D | 0x20)) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, c: u8) -> Result<()> {
        if self.peek() != Some(u16::from(c)) {
            return Err(self.unexpected());
        }
        self.pos += 1;
        Ok(())
    }

    fn parse_value(&mut self, interp: &mut Interpreter) -> Result<Value> {
        let Some(u) = self.peek() else {
            return Err(self.unexpected());
        };
        match u8::try_from(u).unwrap_or(0) {
            b'{' => self.nested(interp, Self::parse_object),
            b'[' => self.nested(interp, Self::parse_array),
            b'"' => Ok(Value::String(self.parse_string()?)),
            b'-' | b'0'..=b'9' => self.parse_number(),
            b't' => self.literal("true", Value::Boolean(true)),
            b'f' => self.literal("false", Value::Boolean(false)),
            b'n' => self.literal("null", Value::Null),
            _ => Err(self.unexpected()),
        }
    }

    /// Parse a container, bounding how deeply containers nest
    fn nested(
        &mut self,
        interp: &mut Interpreter,
        parse: impl FnOnce(&mut Self, &mut Interpreter) -> Result<Value>,
    ) -> Result<Value> {
        crate::stack::enter(&mut self.depth, MAX_JSON_DEPTH)?;
        let result = crate::stack::guard(|| parse(self, interp));
        self.depth -= 1;
        result
    }

    fn literal(&mut self, word: &str, value: Value) -> Result<Value> {
        for b in word.bytes() {
            self.expect(b)?;
        }
        Ok(value)
    }

    fn parse_object(&mut self, interp: &mut Interpreter) -> Result<Value> {
        self.expect(b'{')?;
        let obj = interp.new_object();
        self.skip_whitespace();
        if self.peek() == Some(u16::from(b'}')) {
            self.pos += 1;
            return Ok(Value::Object(obj));
        }
        loop {
            self.skip_whitespace();
            if self.peek() != Some(u16::from(b'"')) {
                return Err(self.unexpected());
            }
            let key = self.parse_string()?;
            self.skip_whitespace();
            self.expect(b':')?;
            self.skip_whitespace();
            let value = self.parse_value(interp)?;
            obj.borrow_mut().create_data_property(PropertyKey::from(key), value);
            self.skip_whitespace();
            match self.peek() {
                Some(0x2C) => self.pos += 1,
                Some(0x7D) => {
                    self.pos += 1;
                    return Ok(Value::Object(obj));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_array(&mut self, interp: &mut Interpreter) -> Result<Value> {
        self.expect(b'[')?;
        let mut values = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(u16::from(b']')) {
            self.pos += 1;
            return Ok(Value::Object(interp.new_array(values)));
        }
        loop {
            self.skip_whitespace();
            values.push(self.parse_value(interp)?);
            self.skip_whitespace();
            match self.peek() {
                Some(0x2C) => self.pos += 1,
                Some(0x5D) => {
                    self.pos += 1;
                    return Ok(Value::Object(interp.new_array(values)));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_string(&mut self) -> Result<JsString> {
        self.expect(b'"')?;
        let mut out = Vec::new();
        loop {
            let Some(u) = self.peek() else {
                return Err(self.unexpected());
            };
            match u {
                0x22 => {
                    self.pos += 1;
                    return Ok(JsString::from(out));
                }
                0x5C => {
                    self.pos += 1;
                    let Some(escape) = self.peek() else {
                        return Err(self.unexpected());
                    };
                    let decoded = match u8::try_from(escape).unwrap_or(0) {
                        b'"' => 0x22,
                        b'\\' => 0x5C,
                        b'/' => 0x2F,
                        b'b' => 0x08,
                        b'f' => 0x0C,
                        b'n' => 0x0A,
                        b'r' => 0x0D,
                        b't' => 0x09,
                        b'u' => {
                            self.pos += 1;
                            out.push(self.hex4()?);
                            continue;
                        }
                        _ => return Err(self.unexpected()),
                    };
                    out.push(decoded);
                    self.pos += 1;
                }
                0x00..=0x1F => return Err(self.unexpected()),
                _ => {
                    out.push(u);
                    self.pos += 1;
                }
            }
        }
    }

    fn hex4(&mut self) -> Result<u16> {
        let mut code = 0u16;
        for _ in 0..4 {
            let digit = self
                .peek()
                .and_then(|u| char::from_u32(u32::from(u)))
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.unexpected())?;
            code = code * 16 + digit as u16;
            self.pos += 1;
        }
        Ok(code)
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(0x30..=0x39)) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn parse_number(&mut self) -> Result<Value> {
        let start = self.pos;
        if self.peek() == Some(u16::from(b'-')) {
            self.pos += 1;
        }
        match self.peek() {
            Some(0x30) => self.pos += 1,
            Some(0x31..=0x39) => {
                self.digits();
            }
            _ => return Err(self.unexpected()),
        }
        if self.peek() == Some(u16::from(b'.')) {
            self.pos += 1;
            if self.digits() == 0 {
                return Err(self.unexpected());
            }
        }
        if matches!(self.peek(), Some(0x45 | 0x65)) {
            self.pos += 1;
            if matches!(self.peek(), Some(0x2B | 0x2D)) {
                self.pos += 1;
            }
            if self.digits() == 0 {
                return Err(self.unexpected());
            }
        }
        let text: Vec<u8> = self.units[start..self.pos].iter().map(|&u| u as u8).collect();
        lexical_core::parse::<f64>(&text)
            .map(Value::Number)
            .map_err(|_| Error::syntax_error(format!("Invalid number in JSON at position {}", start)))
    }
}
