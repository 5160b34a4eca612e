//! Object protocol and type conversions
//!
//! `[[Get]]`, `[[Put]]`, `[[DefineOwnProperty]]`, `[[Delete]]` over the
//! object model, plus every conversion and comparison that may call back
//! into script (ToPrimitive and everything built on it). No `RefCell`
//! borrow is ever held across a call into script code.

use super::Interpreter;
use crate::error::{messages, Error, Result};
use crate::runtime::number::{to_int32, to_integer, to_uint32};
use crate::runtime::{
    ArrayStorage, HostObject, JsString, Object, ObjectKind, ObjectRef, Property,
    PropertyDescriptor, PropertyKey, Slot, Value,
};
use rustc_hash::FxHashSet as HashSet;
use std::rc::Rc;

/// Preferred type for ToPrimitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Default,
    Number,
    String,
}

fn host_of(obj: &ObjectRef) -> Option<Rc<dyn HostObject>> {
    match &obj.borrow().kind {
        ObjectKind::Host(host) => Some(host.clone()),
        _ => None,
    }
}

/// Longest argument list built from an array-like
const MAX_LIST_LENGTH: usize = 1 << 20;

/// Property key for a generic array index, which may exceed `u32`
pub(crate) fn index_key(index: u64) -> PropertyKey {
    match u32::try_from(index) {
        Ok(i) => PropertyKey::from(i),
        Err(_) => PropertyKey::from(JsString::from(index.to_string())),
    }
}

fn reject(strict: bool, message: String) -> Result<()> {
    if strict {
        Err(Error::type_error(message))
    } else {
        Ok(())
    }
}

impl Interpreter {
    // ---------------------------------------------------------------------
    // Allocation
    // ---------------------------------------------------------------------

    /// Allocate an object and register it with the heap
    pub fn alloc(&mut self, object: Object) -> ObjectRef {
        let obj = Rc::new(std::cell::RefCell::new(object));
        self.heap.register(&obj);
        obj
    }

    /// New `{}` linked to `Object.prototype`
    pub fn new_object(&mut self) -> ObjectRef {
        let proto = self.realm.object_prototype.clone();
        self.alloc(Object::new(ObjectKind::Ordinary, Some(proto)))
    }

    /// New array holding `values`
    pub fn new_array(&mut self, values: Vec<Value>) -> ObjectRef {
        self.new_array_with(ArrayStorage::from_values(values))
    }

    /// New array over prepared storage
    pub fn new_array_with(&mut self, storage: ArrayStorage) -> ObjectRef {
        let proto = self.realm.array_prototype.clone();
        self.alloc(Object::new(ObjectKind::Array(storage), Some(proto)))
    }

    // ---------------------------------------------------------------------
    // Property lookup
    // ---------------------------------------------------------------------

    /// Own property, consulting the host first for host objects
    pub fn get_own_property(&self, obj: &ObjectRef, key: &PropertyKey) -> Option<Property> {
        if let Some(host) = host_of(obj) {
            if let Some(v) = host.get(&key.to_string()) {
                return Some(Property::data(v, crate::runtime::PropertyFlags::DEFAULT));
            }
        }
        obj.borrow().get_own_property(key)
    }

    /// Property found along the prototype chain
    pub fn get_property(&self, obj: &ObjectRef, key: &PropertyKey) -> Option<Property> {
        let mut current = Some(obj.clone());
        while let Some(o) = current {
            if let Some(prop) = self.get_own_property(&o, key) {
                return Some(prop);
            }
            current = o.borrow().prototype.clone();
        }
        None
    }

    /// `[[HasProperty]]`
    pub fn has_property(&self, obj: &ObjectRef, key: &PropertyKey) -> bool {
        let mut current = Some(obj.clone());
        while let Some(o) = current {
            if self.has_own_property(&o, key) {
                return true;
            }
            current = o.borrow().prototype.clone();
        }
        false
    }

    /// Own property test without cloning the property
    pub fn has_own_property(&self, obj: &ObjectRef, key: &PropertyKey) -> bool {
        let o = obj.borrow();
        match &o.kind {
            ObjectKind::Host(host) => {
                if host.get(&key.to_string()).is_some() {
                    return true;
                }
            }
            ObjectKind::Array(_) | ObjectKind::StringWrapper(_) => {
                return o.get_own_property(key).is_some();
            }
            _ => {}
        }
        o.properties.contains_key(key)
    }

    /// `[[Get]]` with `this` = the object itself
    pub fn get(&mut self, obj: &ObjectRef, key: &PropertyKey) -> Result<Value> {
        self.get_with_receiver(obj, key, &Value::Object(obj.clone()))
    }

    fn get_with_receiver(&mut self, obj: &ObjectRef, key: &PropertyKey, receiver: &Value) -> Result<Value> {
        match self.get_property(obj, key) {
            None => Ok(Value::Undefined),
            Some(Property {
                slot: Slot::Data(v),
                ..
            }) => Ok(v),
            Some(Property {
                slot: Slot::Accessor { get, .. },
                ..
            }) => {
                if get.is_undefined() {
                    Ok(Value::Undefined)
                } else {
                    self.call(&get, receiver.clone(), &[])
                }
            }
        }
    }

    /// Property read on any value; primitives read through their wrapper
    /// prototype with `this` bound to the primitive
    pub fn get_value(&mut self, base: &Value, key: &PropertyKey) -> Result<Value> {
        match base {
            Value::Object(obj) => self.get(obj, key),
            Value::Undefined | Value::Null => Err(Error::type_error(
                messages::cannot_read_property(&key.to_string(), &base.describe()),
            )),
            Value::String(s) => {
                if let Some(i) = key.as_index() {
                    if let Some(unit) = s.unit_at(i as usize) {
                        return Ok(Value::String(JsString::from(vec![unit])));
                    }
                } else if key.is("length") {
                    return Ok(Value::from(s.len() as u32));
                }
                let proto = self.realm.string_prototype.clone();
                self.get_with_receiver(&proto, key, base)
            }
            Value::Number(_) => {
                let proto = self.realm.number_prototype.clone();
                self.get_with_receiver(&proto, key, base)
            }
            Value::Boolean(_) => {
                let proto = self.realm.boolean_prototype.clone();
                self.get_with_receiver(&proto, key, base)
            }
        }
    }

    /// Look up a method by name and require it to be callable
    pub fn get_method(&mut self, base: &Value, name: &str) -> Result<Value> {
        let f = self.get_value(base, &PropertyKey::from(name))?;
        if f.is_callable() {
            Ok(f)
        } else {
            Err(Error::type_error(messages::not_a_function(name)))
        }
    }

    // ---------------------------------------------------------------------
    // Property update
    // ---------------------------------------------------------------------

    /// `[[Put]]`
    pub fn put(&mut self, obj: &ObjectRef, key: PropertyKey, value: Value, strict: bool) -> Result<()> {
        if let Some(host) = host_of(obj) {
            if host.set(&key.to_string(), value.clone())? {
                return Ok(());
            }
        }
        if key.is("length") && matches!(obj.borrow().kind, ObjectKind::Array(_)) {
            return self.set_array_length(obj, &value, strict);
        }

        let own = obj.borrow().get_own_property(&key);
        match own {
            Some(prop) => match prop.slot {
                Slot::Data(_) => {
                    if !prop.writable() {
                        return reject(strict, messages::read_only(&key.to_string()));
                    }
                    obj.borrow_mut().set_own_value(&key, value);
                    Ok(())
                }
                Slot::Accessor { set, .. } => {
                    self.call_setter(set, Value::Object(obj.clone()), value, &key, strict)
                }
            },
            None => {
                let proto = obj.borrow().prototype.clone();
                if let Some(inherited) = proto.and_then(|p| self.get_property(&p, &key)) {
                    match inherited.slot {
                        Slot::Accessor { set, .. } => {
                            return self.call_setter(set, Value::Object(obj.clone()), value, &key, strict);
                        }
                        Slot::Data(_) if !inherited.writable() => {
                            return reject(strict, messages::read_only(&key.to_string()));
                        }
                        Slot::Data(_) => {}
                    }
                }
                if obj.borrow_mut().create_data_property(key.clone(), value) {
                    Ok(())
                } else {
                    reject(
                        strict,
                        format!("Cannot add property {}, object is not extensible", key),
                    )
                }
            }
        }
    }

    fn call_setter(&mut self, setter: Value, this: Value, value: Value, key: &PropertyKey, strict: bool) -> Result<()> {
        if setter.is_undefined() {
            return reject(
                strict,
                format!("Cannot set property {} which has only a getter", key),
            );
        }
        self.call(&setter, this, &[value])?;
        Ok(())
    }

    /// Property write on any value; writes to primitives only reach
    /// inherited setters
    pub fn put_value(&mut self, base: &Value, key: PropertyKey, value: Value, strict: bool) -> Result<()> {
        let proto = match base {
            Value::Object(obj) => return self.put(obj, key, value, strict),
            Value::Undefined | Value::Null => {
                return Err(Error::type_error(messages::cannot_set_property(
                    &key.to_string(),
                    &base.describe(),
                )))
            }
            Value::String(s) => {
                let virtual_prop = key.is("length")
                    || key.as_index().is_some_and(|i| (i as usize) < s.len());
                if virtual_prop {
                    return reject(strict, messages::read_only(&key.to_string()));
                }
                self.realm.string_prototype.clone()
            }
            Value::Number(_) => self.realm.number_prototype.clone(),
            Value::Boolean(_) => self.realm.boolean_prototype.clone(),
        };
        match self.get_property(&proto, &key) {
            Some(Property {
                slot: Slot::Accessor { set, .. },
                ..
            }) => self.call_setter(set, base.clone(), value, &key, strict),
            _ => reject(
                strict,
                messages::cannot_set_property(&key.to_string(), &base.describe()),
            ),
        }
    }

    /// Assign to an array's `length`, validating the new value
    fn set_array_length(&mut self, obj: &ObjectRef, value: &Value, strict: bool) -> Result<()> {
        let len = self.to_array_length(value)?;
        let ok = match &mut obj.borrow_mut().kind {
            ObjectKind::Array(arr) => arr.length_writable() && arr.set_length(len),
            _ => true,
        };
        if ok {
            Ok(())
        } else {
            reject(strict, messages::read_only("length"))
        }
    }

    /// ToUint32 that must agree with ToNumber, else RangeError
    pub fn to_array_length(&mut self, value: &Value) -> Result<u32> {
        let n = self.to_number(value)?;
        let len = to_uint32(n);
        if len as f64 != n {
            return Err(Error::range_error(messages::INVALID_ARRAY_LENGTH));
        }
        Ok(len)
    }

    /// `[[DefineOwnProperty]]`; a rejection is a TypeError when `throw`
    pub fn define_property(
        &mut self,
        obj: &ObjectRef,
        key: PropertyKey,
        mut desc: PropertyDescriptor,
        throw: bool,
    ) -> Result<bool> {
        if key.is("length") && matches!(obj.borrow().kind, ObjectKind::Array(_)) {
            if let Some(v) = &desc.value {
                let len = self.to_array_length(v)?;
                desc.value = Some(Value::from(len));
            }
        }
        let ok = obj.borrow_mut().define_own_property(key.clone(), &desc);
        if !ok && throw {
            return Err(Error::type_error(format!("Cannot redefine property: {}", key)));
        }
        Ok(ok)
    }

    /// `[[Delete]]`
    pub fn delete_property(&mut self, obj: &ObjectRef, key: &PropertyKey, strict: bool) -> Result<bool> {
        let ok = obj.borrow_mut().delete_own(key);
        if !ok && strict {
            return Err(Error::type_error(format!(
                "Cannot delete property '{}' of {}",
                key,
                Value::Object(obj.clone()).describe()
            )));
        }
        Ok(ok)
    }

    // ---------------------------------------------------------------------
    // Enumeration
    // ---------------------------------------------------------------------

    /// Own keys, host-provided names first
    pub fn own_keys(&self, obj: &ObjectRef) -> Vec<PropertyKey> {
        let mut keys: Vec<PropertyKey> = match host_of(obj) {
            Some(host) => host.keys().iter().map(|k| PropertyKey::from(k.as_str())).collect(),
            None => Vec::new(),
        };
        for key in obj.borrow().own_keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Own enumerable keys in property order (`Object.keys`)
    pub fn own_enumerable_keys(&self, obj: &ObjectRef) -> Vec<PropertyKey> {
        self.own_keys(obj)
            .into_iter()
            .filter(|k| self.get_own_property(obj, k).is_some_and(|p| p.enumerable()))
            .collect()
    }

    /// Enumerable keys along the prototype chain, shadowed names once
    pub fn for_in_keys(&self, obj: &ObjectRef) -> Vec<PropertyKey> {
        let mut seen = HashSet::default();
        let mut keys = Vec::new();
        let mut current = Some(obj.clone());
        while let Some(o) = current {
            for key in self.own_keys(&o) {
                if !seen.insert(key.clone()) {
                    continue;
                }
                if self.get_own_property(&o, &key).is_some_and(|p| p.enumerable()) {
                    keys.push(key);
                }
            }
            current = o.borrow().prototype.clone();
        }
        keys
    }

    /// Whether every indexed property reachable from `obj` is an own
    /// array element, so holes cannot be filled from a prototype
    fn elements_are_own(&self, obj: &ObjectRef) -> bool {
        let o = obj.borrow();
        if !matches!(o.kind, ObjectKind::Array(_)) {
            return false;
        }
        let mut current = o.prototype.clone();
        while let Some(p) = current {
            if p.borrow().has_indexed_properties() {
                return false;
            }
            current = p.borrow().prototype.clone();
        }
        true
    }

    /// Lowest index in `from..to` at which `[[HasProperty]]` holds
    ///
    /// Arrays backed only by their own storage are answered from the
    /// storage's occupancy, skipping holes; anything else is scanned.
    pub fn next_present_index(&self, obj: &ObjectRef, from: u64, to: u64) -> Option<u64> {
        if from >= to {
            return None;
        }
        if self.elements_are_own(obj) {
            let start = u32::try_from(from).ok()?;
            if let ObjectKind::Array(arr) = &obj.borrow().kind {
                return arr.next_index(start).map(u64::from).filter(|&i| i < to);
            }
        }
        (from..to).find(|&i| self.has_property(obj, &index_key(i)))
    }

    /// Highest index in `lower..=at` at which `[[HasProperty]]` holds
    pub fn prev_present_index(&self, obj: &ObjectRef, lower: u64, at: u64) -> Option<u64> {
        if lower > at {
            return None;
        }
        if self.elements_are_own(obj) {
            let at = u32::try_from(at).unwrap_or(u32::MAX);
            if let ObjectKind::Array(arr) = &obj.borrow().kind {
                return arr.prev_index(at).map(u64::from).filter(|&i| i >= lower);
            }
        }
        (lower..=at).rev().find(|&i| self.has_property(obj, &index_key(i)))
    }

    /// CreateListFromArrayLike, refusing lists too long to pass as arguments
    pub fn list_from_array_like(&mut self, obj: &ObjectRef) -> Result<Vec<Value>> {
        let len = self.length_of(obj)?;
        if len as usize > MAX_LIST_LENGTH {
            return Err(Error::range_error(messages::TOO_MANY_ARGUMENTS));
        }
        let mut values = Vec::with_capacity(len as usize);
        for i in 0..len {
            values.push(self.get(obj, &PropertyKey::from(i))?);
        }
        Ok(values)
    }

    /// `length` of an array-like, as ToUint32
    pub fn length_of(&mut self, obj: &ObjectRef) -> Result<u32> {
        if let ObjectKind::Array(arr) = &obj.borrow().kind {
            return Ok(arr.length());
        }
        let len = self.get(obj, &PropertyKey::from("length"))?;
        Ok(to_uint32(self.to_number(&len)?))
    }

    // ---------------------------------------------------------------------
    // Conversions
    // ---------------------------------------------------------------------

    /// ToPrimitive via `valueOf`/`toString` in hint order
    pub fn to_primitive(&mut self, value: &Value, hint: Hint) -> Result<Value> {
        let Value::Object(obj) = value else {
            return Ok(value.clone());
        };
        let order = match hint {
            Hint::String => ["toString", "valueOf"],
            Hint::Number | Hint::Default => ["valueOf", "toString"],
        };
        for name in order {
            let method = self.get(obj, &PropertyKey::from(name))?;
            if method.is_callable() {
                let result = self.call(&method, value.clone(), &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(Error::type_error("Cannot convert object to primitive value"))
    }

    /// ToNumber
    pub fn to_number(&mut self, value: &Value) -> Result<f64> {
        match value {
            Value::Object(_) => {
                let prim = self.to_primitive(value, Hint::Number)?;
                Ok(prim.primitive_to_number())
            }
            other => Ok(other.primitive_to_number()),
        }
    }

    /// ToInteger
    pub fn to_integer(&mut self, value: &Value) -> Result<f64> {
        Ok(to_integer(self.to_number(value)?))
    }

    /// ToInt32
    pub fn to_int32(&mut self, value: &Value) -> Result<i32> {
        Ok(to_int32(self.to_number(value)?))
    }

    /// ToUint32
    pub fn to_uint32(&mut self, value: &Value) -> Result<u32> {
        Ok(to_uint32(self.to_number(value)?))
    }

    /// ToString
    pub fn to_string(&mut self, value: &Value) -> Result<JsString> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Object(_) => {
                let prim = self.to_primitive(value, Hint::String)?;
                Ok(prim.primitive_to_string())
            }
            other => Ok(other.primitive_to_string()),
        }
    }

    /// ToString, as a Rust string
    pub fn to_rust_string(&mut self, value: &Value) -> Result<String> {
        Ok(self.to_string(value)?.to_rust_string())
    }

    /// ToPropertyKey (ToString, then index canonicalization)
    pub fn to_property_key(&mut self, value: &Value) -> Result<PropertyKey> {
        match value {
            Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n < u32::MAX as f64 => {
                Ok(PropertyKey::Index(*n as u32))
            }
            other => Ok(PropertyKey::from(self.to_string(other)?)),
        }
    }

    /// ToObject; primitives are wrapped, undefined and null rejected
    pub fn to_object(&mut self, value: &Value) -> Result<ObjectRef> {
        let (kind, proto) = match value {
            Value::Object(obj) => return Ok(obj.clone()),
            Value::Undefined | Value::Null => {
                return Err(Error::type_error(format!(
                    "Cannot convert {} to object",
                    value.describe()
                )))
            }
            Value::Boolean(b) => (
                ObjectKind::BooleanWrapper(*b),
                self.realm.boolean_prototype.clone(),
            ),
            Value::Number(n) => (
                ObjectKind::NumberWrapper(*n),
                self.realm.number_prototype.clone(),
            ),
            Value::String(s) => (
                ObjectKind::StringWrapper(s.clone()),
                self.realm.string_prototype.clone(),
            ),
        };
        Ok(self.alloc(Object::new(kind, Some(proto))))
    }

    // ---------------------------------------------------------------------
    // Operators
    // ---------------------------------------------------------------------

    /// `==`
    pub fn loose_equals(&mut self, a: &Value, b: &Value) -> Result<bool> {
        if std::mem::discriminant(a) == std::mem::discriminant(b) {
            return Ok(a.strict_equals(b));
        }
        match (a, b) {
            (Value::Null, Value::Undefined) | (Value::Undefined, Value::Null) => Ok(true),
            (Value::Number(x), Value::String(_)) => Ok(*x == b.primitive_to_number()),
            (Value::String(_), Value::Number(y)) => Ok(a.primitive_to_number() == *y),
            (Value::Boolean(_), _) => {
                let x = Value::Number(a.primitive_to_number());
                self.loose_equals(&x, b)
            }
            (_, Value::Boolean(_)) => {
                let y = Value::Number(b.primitive_to_number());
                self.loose_equals(a, &y)
            }
            (Value::Number(_) | Value::String(_), Value::Object(_)) => {
                let y = self.to_primitive(b, Hint::Default)?;
                self.loose_equals(a, &y)
            }
            (Value::Object(_), Value::Number(_) | Value::String(_)) => {
                let x = self.to_primitive(a, Hint::Default)?;
                self.loose_equals(&x, b)
            }
            _ => Ok(false),
        }
    }

    /// Abstract relational comparison `x < y`; `None` when either side is NaN
    pub fn less_than(&mut self, x: &Value, y: &Value, left_first: bool) -> Result<Option<bool>> {
        let (px, py) = if left_first {
            let px = self.to_primitive(x, Hint::Number)?;
            let py = self.to_primitive(y, Hint::Number)?;
            (px, py)
        } else {
            let py = self.to_primitive(y, Hint::Number)?;
            let px = self.to_primitive(x, Hint::Number)?;
            (px, py)
        };
        if let (Value::String(a), Value::String(b)) = (&px, &py) {
            return Ok(Some(a.as_units() < b.as_units()));
        }
        let (nx, ny) = (px.primitive_to_number(), py.primitive_to_number());
        if nx.is_nan() || ny.is_nan() {
            return Ok(None);
        }
        Ok(Some(nx < ny))
    }

    /// `+`: string concatenation when either primitive is a string
    pub fn add(&mut self, a: &Value, b: &Value) -> Result<Value> {
        if let (Value::Number(x), Value::Number(y)) = (a, b) {
            return Ok(Value::Number(x + y));
        }
        let pa = self.to_primitive(a, Hint::Default)?;
        let pb = self.to_primitive(b, Hint::Default)?;
        if matches!(pa, Value::String(_)) || matches!(pb, Value::String(_)) {
            let sa = pa.primitive_to_string();
            let sb = pb.primitive_to_string();
            return Ok(Value::String(sa.concat(&sb)));
        }
        Ok(Value::Number(pa.primitive_to_number() + pb.primitive_to_number()))
    }

    /// `instanceof`
    pub fn instance_of(&mut self, value: &Value, target: &Value) -> Result<bool> {
        let Some(func) = target.as_object().filter(|_| target.is_callable()) else {
            return Err(Error::type_error(
                "Right-hand side of 'instanceof' is not callable",
            ));
        };
        let bound_target = match &func.borrow().kind {
            ObjectKind::Function(crate::runtime::FunctionKind::Bound { target, .. }) => {
                Some(target.clone())
            }
            _ => None,
        };
        if let Some(inner) = bound_target {
            return self.instance_of(value, &Value::Object(inner));
        }
        let Value::Object(obj) = value else {
            return Ok(false);
        };
        let proto = match self.get(func, &PropertyKey::from("prototype"))? {
            Value::Object(p) => p,
            _ => {
                return Err(Error::type_error(
                    "Function has non-object prototype in instanceof check",
                ))
            }
        };
        let mut current = obj.borrow().prototype.clone();
        while let Some(p) = current {
            if Rc::ptr_eq(&p, &proto) {
                return Ok(true);
            }
            current = p.borrow().prototype.clone();
        }
        Ok(false)
    }
}
