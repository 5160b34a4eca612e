//! Object model
//!
//! Objects are prototype-linked property containers shared through
//! `Rc<RefCell<Object>>`. Properties keep insertion order and carry the
//! writable/enumerable/configurable attribute bits. Arrays and string
//! wrappers expose some properties virtually: their indexed elements and
//! `length` never live in the ordinary property map.

use super::array::ArrayStorage;
use super::host::HostObject;
use super::interpreter::{Interpreter, ScopeRef};
use super::string::JsString;
use super::value::Value;
use crate::ast::FunctionRef;
use crate::error::Result;
use bitflags::bitflags;
use rustc_hash::FxHashMap as HashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared handle to an object
pub type ObjectRef = Rc<RefCell<Object>>;

/// Native function implementation: `(interpreter, this, arguments)`
pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &Value, &[Value]) -> Result<Value>>;

bitflags! {
    /// Property attribute bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u8 {
        const WRITABLE = 0b001;
        const ENUMERABLE = 0b010;
        const CONFIGURABLE = 0b100;
    }
}

impl PropertyFlags {
    /// Attributes of a property created by plain assignment
    pub const DEFAULT: PropertyFlags = PropertyFlags::all();
    /// Attributes of built-in methods and `constructor` links
    pub const HIDDEN: PropertyFlags =
        PropertyFlags::WRITABLE.union(PropertyFlags::CONFIGURABLE);
}

/// A property key: an array index or any other string
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Named key
    String(JsString),
    /// Canonical array index (below 2^32 - 1)
    Index(u32),
}

impl PropertyKey {
    /// The key as a string
    pub fn to_js_string(&self) -> JsString {
        match self {
            PropertyKey::String(s) => s.clone(),
            PropertyKey::Index(i) => JsString::from(i.to_string()),
        }
    }

    /// The array index, if this key is one
    pub fn as_index(&self) -> Option<u32> {
        match self {
            PropertyKey::Index(i) => Some(*i),
            PropertyKey::String(_) => None,
        }
    }

    /// Whether this is the named key `name`
    pub fn is(&self, name: &str) -> bool {
        match self {
            PropertyKey::String(s) => s.eq_str(name),
            PropertyKey::Index(_) => false,
        }
    }
}

impl From<JsString> for PropertyKey {
    fn from(s: JsString) -> Self {
        match s.to_array_index() {
            Some(i) => PropertyKey::Index(i),
            None => PropertyKey::String(s),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::from(JsString::from(s))
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        if i == u32::MAX {
            PropertyKey::String(JsString::from(i.to_string()))
        } else {
            PropertyKey::Index(i)
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Index(i) => write!(f, "{}", i),
        }
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// What a property holds
#[derive(Clone, Debug)]
pub enum Slot {
    /// Plain value
    Data(Value),
    /// Getter/setter pair; each is a function or undefined
    Accessor { get: Value, set: Value },
}

/// A property: slot plus attributes
#[derive(Clone, Debug)]
pub struct Property {
    pub slot: Slot,
    pub flags: PropertyFlags,
}

impl Property {
    /// Data property with the given attributes
    pub fn data(value: Value, flags: PropertyFlags) -> Self {
        Self {
            slot: Slot::Data(value),
            flags,
        }
    }

    /// Accessor property with the given attributes (WRITABLE is ignored)
    pub fn accessor(get: Value, set: Value, flags: PropertyFlags) -> Self {
        Self {
            slot: Slot::Accessor { get, set },
            flags: flags - PropertyFlags::WRITABLE,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self.slot, Slot::Accessor { .. })
    }

    pub fn writable(&self) -> bool {
        self.flags.contains(PropertyFlags::WRITABLE)
    }

    pub fn enumerable(&self) -> bool {
        self.flags.contains(PropertyFlags::ENUMERABLE)
    }

    pub fn configurable(&self) -> bool {
        self.flags.contains(PropertyFlags::CONFIGURABLE)
    }

    /// The data value, or undefined for accessors
    pub fn value(&self) -> Value {
        match &self.slot {
            Slot::Data(v) => v.clone(),
            Slot::Accessor { .. } => Value::Undefined,
        }
    }
}

/// A property descriptor as seen by `Object.defineProperty`
///
/// Absent fields leave the corresponding attribute untouched.
#[derive(Clone, Debug, Default)]
pub struct PropertyDescriptor {
    pub value: Option<Value>,
    pub writable: Option<bool>,
    pub get: Option<Value>,
    pub set: Option<Value>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// Fully populated data descriptor
    pub fn data(value: Value, flags: PropertyFlags) -> Self {
        Self {
            value: Some(value),
            writable: Some(flags.contains(PropertyFlags::WRITABLE)),
            get: None,
            set: None,
            enumerable: Some(flags.contains(PropertyFlags::ENUMERABLE)),
            configurable: Some(flags.contains(PropertyFlags::CONFIGURABLE)),
        }
    }

    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_data(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    pub fn is_generic(&self) -> bool {
        !self.is_accessor() && !self.is_data()
    }

    /// Property created when no property exists yet; absent fields default
    /// to false/undefined
    fn to_new_property(&self) -> Property {
        let mut flags = PropertyFlags::empty();
        flags.set(PropertyFlags::ENUMERABLE, self.enumerable == Some(true));
        flags.set(PropertyFlags::CONFIGURABLE, self.configurable == Some(true));
        if self.is_accessor() {
            Property::accessor(
                self.get.clone().unwrap_or_default(),
                self.set.clone().unwrap_or_default(),
                flags,
            )
        } else {
            flags.set(PropertyFlags::WRITABLE, self.writable == Some(true));
            Property::data(self.value.clone().unwrap_or_default(), flags)
        }
    }

    /// Validate this descriptor against `current` and produce the resulting
    /// property, or `None` when the redefinition is rejected
    fn apply_to(&self, current: Option<&Property>, extensible: bool) -> Option<Property> {
        let Some(cur) = current else {
            return extensible.then(|| self.to_new_property());
        };

        if !cur.configurable() {
            if self.configurable == Some(true) {
                return None;
            }
            if self.enumerable.is_some_and(|e| e != cur.enumerable()) {
                return None;
            }
        }

        let mut next = cur.clone();
        if self.is_generic() {
            // attributes only
        } else if self.is_data() == cur.is_accessor() {
            if !cur.configurable() {
                return None;
            }
            let kept = cur.flags & (PropertyFlags::ENUMERABLE | PropertyFlags::CONFIGURABLE);
            next = if self.is_data() {
                Property::data(Value::Undefined, kept)
            } else {
                Property::accessor(Value::Undefined, Value::Undefined, kept)
            };
        } else if let Slot::Data(cur_value) = &cur.slot {
            if !cur.configurable() && !cur.writable() {
                if self.writable == Some(true) {
                    return None;
                }
                if self.value.as_ref().is_some_and(|v| !v.same_value(cur_value)) {
                    return None;
                }
            }
        } else if let Slot::Accessor { get, set } = &cur.slot {
            if !cur.configurable() {
                if self.get.as_ref().is_some_and(|g| !g.same_value(get)) {
                    return None;
                }
                if self.set.as_ref().is_some_and(|s| !s.same_value(set)) {
                    return None;
                }
            }
        }

        match &mut next.slot {
            Slot::Data(v) => {
                if let Some(value) = &self.value {
                    *v = value.clone();
                }
                if let Some(w) = self.writable {
                    next.flags.set(PropertyFlags::WRITABLE, w);
                }
            }
            Slot::Accessor { get, set } => {
                if let Some(g) = &self.get {
                    *get = g.clone();
                }
                if let Some(s) = &self.set {
                    *set = s.clone();
                }
            }
        }
        if let Some(e) = self.enumerable {
            next.flags.set(PropertyFlags::ENUMERABLE, e);
        }
        if let Some(c) = self.configurable {
            next.flags.set(PropertyFlags::CONFIGURABLE, c);
        }
        Some(next)
    }
}

/// Insertion-ordered property storage
///
/// Removal leaves a tombstone that is compacted away once tombstones
/// outnumber live entries.
#[derive(Default)]
pub struct PropertyMap {
    index: HashMap<PropertyKey, usize>,
    entries: Vec<Option<(PropertyKey, Property)>>,
    /// Live entries keyed by an array index
    indexed: usize,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&Property> {
        let slot = *self.index.get(key)?;
        self.entries[slot].as_ref().map(|(_, p)| p)
    }

    pub fn get_mut(&mut self, key: &PropertyKey) -> Option<&mut Property> {
        let slot = *self.index.get(key)?;
        self.entries[slot].as_mut().map(|(_, p)| p)
    }

    pub fn contains_key(&self, key: &PropertyKey) -> bool {
        self.index.contains_key(key)
    }

    /// Whether any entry is keyed by an array index
    pub fn has_index_keys(&self) -> bool {
        self.indexed > 0
    }

    /// Insert or replace; a replaced property keeps its position
    pub fn insert(&mut self, key: PropertyKey, prop: Property) {
        if let Some(&slot) = self.index.get(&key) {
            self.entries[slot] = Some((key, prop));
            return;
        }
        if key.as_index().is_some() {
            self.indexed += 1;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(Some((key, prop)));
    }

    pub fn remove(&mut self, key: &PropertyKey) -> Option<Property> {
        let slot = self.index.remove(key)?;
        if key.as_index().is_some() {
            self.indexed -= 1;
        }
        let removed = self.entries[slot].take().map(|(_, p)| p);
        if self.entries.len() > 8 && self.index.len() * 2 < self.entries.len() {
            self.compact();
        }
        removed
    }

    fn compact(&mut self) {
        self.entries.retain(Option::is_some);
        self.index.clear();
        for (slot, entry) in self.entries.iter().enumerate() {
            if let Some((key, _)) = entry {
                self.index.insert(key.clone(), slot);
            }
        }
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &Property)> {
        self.entries.iter().flatten().map(|(k, p)| (k, p))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&PropertyKey, &mut Property)> {
        self.entries.iter_mut().flatten().map(|(k, p)| (&*k, p))
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.iter().map(|(k, _)| k)
    }

    pub fn clear(&mut self) {
        self.indexed = 0;
        self.index.clear();
        self.entries.clear();
    }
}

/// Callable behaviour of a function object
pub enum FunctionKind {
    /// Closure over a parsed function body
    Script { node: FunctionRef, scope: ScopeRef },
    /// Built-in implemented in Rust; `construct` is absent for plain methods
    Native {
        name: JsString,
        call: NativeFn,
        construct: Option<NativeFn>,
    },
    /// Result of `Function.prototype.bind`
    Bound {
        target: ObjectRef,
        this: Value,
        args: Vec<Value>,
    },
}

impl FunctionKind {
    pub fn name(&self) -> String {
        match self {
            FunctionKind::Script { node, .. } => node.name().to_string(),
            FunctionKind::Native { name, .. } => name.to_rust_string(),
            FunctionKind::Bound { target, .. } => match &target.borrow().kind {
                ObjectKind::Function(f) => format!("bound {}", f.name()),
                _ => "bound".to_string(),
            },
        }
    }
}

/// Internal kind of an object, selecting its class name and built-in slots
pub enum ObjectKind {
    Ordinary,
    Array(ArrayStorage),
    Function(FunctionKind),
    StringWrapper(JsString),
    NumberWrapper(f64),
    BooleanWrapper(bool),
    Error,
    Arguments,
    Math,
    Json,
    Global,
    Host(Rc<dyn HostObject>),
}

/// JavaScript object
pub struct Object {
    /// Object kind
    pub kind: ObjectKind,
    /// Own properties (except virtual array/string ones)
    pub properties: PropertyMap,
    /// Prototype
    pub prototype: Option<ObjectRef>,
    /// Whether new properties may be added
    pub extensible: bool,
}

impl Object {
    /// Create an object of the given kind
    pub fn new(kind: ObjectKind, prototype: Option<ObjectRef>) -> Self {
        Self {
            kind,
            properties: PropertyMap::new(),
            prototype,
            extensible: true,
        }
    }

    /// The `[[Class]]` tag
    pub fn class_name(&self) -> String {
        match &self.kind {
            ObjectKind::Ordinary => "Object",
            ObjectKind::Array(_) => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::StringWrapper(_) => "String",
            ObjectKind::NumberWrapper(_) => "Number",
            ObjectKind::BooleanWrapper(_) => "Boolean",
            ObjectKind::Error => "Error",
            ObjectKind::Arguments => "Arguments",
            ObjectKind::Math => "Math",
            ObjectKind::Json => "JSON",
            ObjectKind::Global => "global",
            ObjectKind::Host(host) => return host.class_name().to_string(),
        }
        .to_string()
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    /// Whether `new` may be applied
    pub fn is_constructor(&self) -> bool {
        match &self.kind {
            ObjectKind::Function(FunctionKind::Script { .. }) => true,
            ObjectKind::Function(FunctionKind::Native { construct, .. }) => construct.is_some(),
            ObjectKind::Function(FunctionKind::Bound { target, .. }) => {
                target.borrow().is_constructor()
            }
            _ => false,
        }
    }

    /// Own data value of an ordinary property, without running accessors
    pub fn own_data_value(&self, name: &str) -> Option<Value> {
        match &self.properties.get(&PropertyKey::from(name))?.slot {
            Slot::Data(v) => Some(v.clone()),
            Slot::Accessor { .. } => None,
        }
    }

    /// Own property lookup, including virtual array and string slots
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<Property> {
        match &self.kind {
            ObjectKind::Array(arr) => {
                if let PropertyKey::Index(i) = key {
                    return arr.get(*i);
                }
                if key.is("length") {
                    let flags = if arr.length_writable() {
                        PropertyFlags::WRITABLE
                    } else {
                        PropertyFlags::empty()
                    };
                    return Some(Property::data(Value::from(arr.length()), flags));
                }
            }
            ObjectKind::StringWrapper(s) => {
                if let Some(prop) = string_own_property(s, key) {
                    return Some(prop);
                }
            }
            _ => {}
        }
        self.properties.get(key).cloned()
    }

    /// Whether an own property, real or virtual, has an array index key
    pub fn has_indexed_properties(&self) -> bool {
        let own_slots = match &self.kind {
            ObjectKind::Array(arr) => arr.next_index(0).is_some(),
            ObjectKind::StringWrapper(s) => !s.is_empty(),
            ObjectKind::Host(_) => true,
            _ => false,
        };
        own_slots || self.properties.has_index_keys()
    }

    /// Own keys: indices ascending, virtual `length`, then insertion order
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        let mut keys = Vec::new();
        match &self.kind {
            ObjectKind::Array(arr) => {
                keys.extend(arr.indices().into_iter().map(PropertyKey::Index));
                keys.push(PropertyKey::from("length"));
            }
            ObjectKind::StringWrapper(s) => {
                keys.extend((0..s.len() as u32).map(PropertyKey::Index));
                keys.push(PropertyKey::from("length"));
            }
            _ => {}
        }
        keys.extend(self.properties.keys().cloned());
        keys
    }

    /// Overwrite the value of an existing own writable data property
    pub fn set_own_value(&mut self, key: &PropertyKey, value: Value) {
        if let (ObjectKind::Array(arr), PropertyKey::Index(i)) = (&mut self.kind, key) {
            arr.set_value(*i, value);
            return;
        }
        if let Some(Property {
            slot: Slot::Data(v),
            ..
        }) = self.properties.get_mut(key)
        {
            *v = value;
        }
    }

    /// Add a new default-attribute data property; false when rejected
    pub fn create_data_property(&mut self, key: PropertyKey, value: Value) -> bool {
        if !self.extensible {
            return false;
        }
        if let (ObjectKind::Array(arr), PropertyKey::Index(i)) = (&mut self.kind, &key) {
            return arr.define(*i, Property::data(value, PropertyFlags::DEFAULT));
        }
        self.properties
            .insert(key, Property::data(value, PropertyFlags::DEFAULT));
        true
    }

    /// Insert a property unconditionally (built-in wiring)
    pub fn insert_property(&mut self, key: impl Into<PropertyKey>, prop: Property) {
        let key = key.into();
        if let (ObjectKind::Array(arr), PropertyKey::Index(i)) = (&mut self.kind, &key) {
            arr.define(*i, prop);
            return;
        }
        self.properties.insert(key, prop);
    }

    /// `[[DefineOwnProperty]]`; false when the definition is rejected
    ///
    /// For array `length` the caller has already validated that the new
    /// value is a valid length.
    pub fn define_own_property(&mut self, key: PropertyKey, desc: &PropertyDescriptor) -> bool {
        if matches!(self.kind, ObjectKind::Array(_)) && key.is("length") {
            return self.define_array_length(desc);
        }
        let current = self.get_own_property(&key);
        let Some(next) = desc.apply_to(current.as_ref(), self.extensible) else {
            return false;
        };
        match (&mut self.kind, &key) {
            (ObjectKind::Array(arr), PropertyKey::Index(i)) => arr.define(*i, next),
            (ObjectKind::StringWrapper(s), _) if string_own_property(s, &key).is_some() => true,
            _ => {
                self.properties.insert(key, next);
                true
            }
        }
    }

    fn define_array_length(&mut self, desc: &PropertyDescriptor) -> bool {
        let ObjectKind::Array(arr) = &mut self.kind else {
            return false;
        };
        let flags = if arr.length_writable() {
            PropertyFlags::WRITABLE
        } else {
            PropertyFlags::empty()
        };
        let current = Property::data(Value::from(arr.length()), flags);
        let new_len = match &desc.value {
            Some(Value::Number(n)) => *n as u32,
            Some(_) => return false,
            None => {
                let Some(next) = desc.apply_to(Some(&current), true) else {
                    return false;
                };
                if !next.writable() {
                    arr.freeze_length();
                }
                return true;
            }
        };
        let candidate = PropertyDescriptor {
            value: Some(Value::from(new_len)),
            ..desc.clone()
        };
        let Some(next) = candidate.apply_to(Some(&current), true) else {
            return false;
        };
        let ok = new_len == arr.length() || arr.set_length(new_len);
        if !next.writable() {
            arr.freeze_length();
        }
        ok
    }

    /// `[[Delete]]` of an own property; false when non-configurable
    pub fn delete_own(&mut self, key: &PropertyKey) -> bool {
        match (&mut self.kind, key) {
            (ObjectKind::Array(arr), PropertyKey::Index(i)) => return arr.delete(*i),
            (ObjectKind::Array(_), _) if key.is("length") => return false,
            (ObjectKind::StringWrapper(s), _) if string_own_property(s, key).is_some() => {
                return false
            }
            _ => {}
        }
        match self.properties.get(key) {
            Some(prop) if !prop.configurable() => false,
            Some(_) => {
                self.properties.remove(key);
                true
            }
            None => true,
        }
    }

    /// A property-less ordinary object with no prototype
    pub fn empty() -> Self {
        Self::new(ObjectKind::Ordinary, None)
    }
}

fn string_own_property(s: &JsString, key: &PropertyKey) -> Option<Property> {
    match key {
        PropertyKey::Index(i) => s
            .unit_at(*i as usize)
            .map(|u| Property::data(Value::String(JsString::from(vec![u])), PropertyFlags::ENUMERABLE)),
        _ if key.is("length") => Some(Property::data(
            Value::from(s.len() as u32),
            PropertyFlags::empty(),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordinary() -> Object {
        Object::new(ObjectKind::Ordinary, None)
    }

    #[test]
    fn test_property_map_keeps_insertion_order() {
        let mut obj = ordinary();
        for name in ["b", "a", "c"] {
            obj.create_data_property(name.into(), Value::Number(1.0));
        }
        obj.delete_own(&"a".into());
        obj.create_data_property("a".into(), Value::Number(2.0));
        let keys: Vec<String> = obj.own_keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_non_configurable_redefinition_rejected() {
        let mut obj = ordinary();
        let frozen = PropertyDescriptor::data(Value::Number(1.0), PropertyFlags::ENUMERABLE);
        assert!(obj.define_own_property("x".into(), &frozen));

        let change = PropertyDescriptor {
            value: Some(Value::Number(2.0)),
            ..Default::default()
        };
        assert!(!obj.define_own_property("x".into(), &change));
        let same = PropertyDescriptor {
            value: Some(Value::Number(1.0)),
            ..Default::default()
        };
        assert!(obj.define_own_property("x".into(), &same));
        assert!(!obj.delete_own(&"x".into()));
    }

    #[test]
    fn test_new_property_defaults_to_false_attributes() {
        let mut obj = ordinary();
        let desc = PropertyDescriptor {
            value: Some(Value::Number(3.0)),
            ..Default::default()
        };
        obj.define_own_property("k".into(), &desc);
        let prop = obj.get_own_property(&"k".into()).unwrap();
        assert!(!prop.writable() && !prop.enumerable() && !prop.configurable());
    }

    #[test]
    fn test_non_extensible_rejects_new_properties() {
        let mut obj = ordinary();
        obj.extensible = false;
        assert!(!obj.create_data_property("x".into(), Value::Null));
        assert!(obj.get_own_property(&"x".into()).is_none());
    }

    #[test]
    fn test_string_wrapper_virtual_properties() {
        let obj = Object::new(ObjectKind::StringWrapper(JsString::from("hi")), None);
        let first = obj.get_own_property(&PropertyKey::Index(0)).unwrap();
        assert_eq!(first.value(), Value::string("h"));
        assert!(!first.writable());
        let len = obj.get_own_property(&"length".into()).unwrap();
        assert_eq!(len.value(), Value::Number(2.0));
    }

    #[test]
    fn test_index_keys_canonicalize() {
        assert_eq!(PropertyKey::from("7"), PropertyKey::Index(7));
        assert!(matches!(PropertyKey::from("07"), PropertyKey::String(_)));
        assert!(matches!(PropertyKey::from(u32::MAX), PropertyKey::String(_)));
    }
}
