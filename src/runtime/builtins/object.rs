//! `Object` constructor and `Object.prototype`

use super::{arg, constructor, method};
use crate::error::{Error, Result};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::{
    Object, ObjectKind, ObjectRef, Property, PropertyDescriptor, PropertyKey, Slot, Value,
};
use std::rc::Rc;

fn require_object(value: &Value, method: &str) -> Result<ObjectRef> {
    match value {
        Value::Object(obj) => Ok(obj.clone()),
        other => Err(Error::type_error(format!(
            "{} called on non-object {}",
            method,
            other.describe()
        ))),
    }
}

/// ToPropertyDescriptor
pub(crate) fn to_property_descriptor(interp: &mut Interpreter, value: &Value) -> Result<PropertyDescriptor> {
    let obj = require_object(value, "Property description")?;
    let mut desc = PropertyDescriptor::default();
    let field = |interp: &mut Interpreter, name: &str| -> Result<Option<Value>> {
        let key = PropertyKey::from(name);
        if interp.has_property(&obj, &key) {
            Ok(Some(interp.get(&obj, &key)?))
        } else {
            Ok(None)
        }
    };
    desc.enumerable = field(interp, "enumerable")?.map(|v| v.to_boolean());
    desc.configurable = field(interp, "configurable")?.map(|v| v.to_boolean());
    desc.value = field(interp, "value")?;
    desc.writable = field(interp, "writable")?.map(|v| v.to_boolean());
    desc.get = field(interp, "get")?;
    desc.set = field(interp, "set")?;

    for accessor in [&desc.get, &desc.set].into_iter().flatten() {
        if !accessor.is_undefined() && !accessor.is_callable() {
            return Err(Error::type_error(format!(
                "Getter or setter must be a function: {}",
                accessor.describe()
            )));
        }
    }
    if desc.is_accessor() && desc.is_data() {
        return Err(Error::type_error(
            "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute",
        ));
    }
    Ok(desc)
}

/// FromPropertyDescriptor
fn from_property(interp: &mut Interpreter, prop: &Property) -> Value {
    let obj = interp.new_object();
    {
        let mut o = obj.borrow_mut();
        match &prop.slot {
            Slot::Data(v) => {
                o.create_data_property("value".into(), v.clone());
                o.create_data_property("writable".into(), Value::Boolean(prop.writable()));
            }
            Slot::Accessor { get, set } => {
                o.create_data_property("get".into(), get.clone());
                o.create_data_property("set".into(), set.clone());
            }
        }
        o.create_data_property("enumerable".into(), Value::Boolean(prop.enumerable()));
        o.create_data_property("configurable".into(), Value::Boolean(prop.configurable()));
    }
    Value::Object(obj)
}

fn define_properties(interp: &mut Interpreter, target: &ObjectRef, props: &Value) -> Result<()> {
    let props = interp.to_object(props)?;
    let mut descriptors = Vec::new();
    for key in interp.own_enumerable_keys(&props) {
        let raw = interp.get(&props, &key)?;
        descriptors.push((key, to_property_descriptor(interp, &raw)?));
    }
    for (key, desc) in descriptors {
        interp.define_property(target, key, desc, true)?;
    }
    Ok(())
}

/// Restrict every own property, then make `obj` non-extensible
fn restrict(interp: &mut Interpreter, obj: &ObjectRef, freeze: bool) -> Result<()> {
    let keys = obj.borrow().own_keys();
    for key in keys {
        let Some(prop) = obj.borrow().get_own_property(&key) else {
            continue;
        };
        let mut desc = PropertyDescriptor {
            configurable: Some(false),
            ..Default::default()
        };
        if freeze && !prop.is_accessor() {
            desc.writable = Some(false);
        }
        interp.define_property(obj, key, desc, true)?;
    }
    obj.borrow_mut().extensible = false;
    Ok(())
}

fn test_restricted(obj: &ObjectRef, frozen: bool) -> bool {
    let o = obj.borrow();
    if o.extensible {
        return false;
    }
    o.own_keys().iter().all(|key| match o.get_own_property(key) {
        Some(prop) => !prop.configurable() && !(frozen && !prop.is_accessor() && prop.writable()),
        None => true,
    })
}

/// `[object Class]` tag used by `Object.prototype.toString`
pub(crate) fn class_tag(value: &Value) -> String {
    match value {
        Value::Undefined => "[object Undefined]".to_string(),
        Value::Null => "[object Null]".to_string(),
        Value::Boolean(_) => "[object Boolean]".to_string(),
        Value::Number(_) => "[object Number]".to_string(),
        Value::String(_) => "[object String]".to_string(),
        Value::Object(obj) => format!("[object {}]", obj.borrow().class_name()),
    }
}

pub(super) fn register_object(interp: &mut Interpreter) {
    let proto = interp.realm().object_prototype.clone();

    let ctor = constructor(
        interp,
        "Object",
        1,
        &proto,
        |interp, _this, args| object_from(interp, &arg(args, 0)),
        |interp, _this, args| object_from(interp, &arg(args, 0)),
    );

    // Object.keys
    method(interp, &ctor, "keys", 1, |interp, _this, args| {
        let obj = require_object(&arg(args, 0), "Object.keys")?;
        let keys = interp
            .own_enumerable_keys(&obj)
            .into_iter()
            .map(|k| Value::String(k.to_js_string()))
            .collect();
        Ok(Value::Object(interp.new_array(keys)))
    });

    // Object.create
    method(interp, &ctor, "create", 2, |interp, _this, args| {
        let proto = match arg(args, 0) {
            Value::Object(p) => Some(p),
            Value::Null => None,
            other => {
                return Err(Error::type_error(format!(
                    "Object prototype may only be an Object or null: {}",
                    other.describe()
                )))
            }
        };
        let obj = interp.alloc(Object::new(ObjectKind::Ordinary, proto));
        let props = arg(args, 1);
        if !props.is_undefined() {
            define_properties(interp, &obj, &props)?;
        }
        Ok(Value::Object(obj))
    });

    // Object.getPrototypeOf
    method(interp, &ctor, "getPrototypeOf", 1, |_interp, _this, args| {
        let obj = require_object(&arg(args, 0), "Object.getPrototypeOf")?;
        let proto = obj.borrow().prototype.clone();
        Ok(proto.map(Value::Object).unwrap_or(Value::Null))
    });

    // Object.defineProperty
    method(interp, &ctor, "defineProperty", 3, |interp, _this, args| {
        let target = arg(args, 0);
        let obj = require_object(&target, "Object.defineProperty")?;
        let key = interp.to_property_key(&arg(args, 1))?;
        let desc = to_property_descriptor(interp, &arg(args, 2))?;
        interp.define_property(&obj, key, desc, true)?;
        Ok(target)
    });

    // Object.defineProperties
    method(interp, &ctor, "defineProperties", 2, |interp, _this, args| {
        let target = arg(args, 0);
        let obj = require_object(&target, "Object.defineProperties")?;
        define_properties(interp, &obj, &arg(args, 1))?;
        Ok(target)
    });

    // Object.getOwnPropertyNames
    method(interp, &ctor, "getOwnPropertyNames", 1, |interp, _this, args| {
        let obj = require_object(&arg(args, 0), "Object.getOwnPropertyNames")?;
        let names = interp
            .own_keys(&obj)
            .into_iter()
            .map(|k| Value::String(k.to_js_string()))
            .collect();
        Ok(Value::Object(interp.new_array(names)))
    });

    // Object.getOwnPropertyDescriptor
    method(interp, &ctor, "getOwnPropertyDescriptor", 2, |interp, _this, args| {
        let obj = require_object(&arg(args, 0), "Object.getOwnPropertyDescriptor")?;
        let key = interp.to_property_key(&arg(args, 1))?;
        match interp.get_own_property(&obj, &key) {
            Some(prop) => Ok(from_property(interp, &prop)),
            None => Ok(Value::Undefined),
        }
    });

    method(interp, &ctor, "preventExtensions", 1, |_interp, _this, args| {
        let target = arg(args, 0);
        let obj = require_object(&target, "Object.preventExtensions")?;
        obj.borrow_mut().extensible = false;
        Ok(target)
    });

    method(interp, &ctor, "isExtensible", 1, |_interp, _this, args| {
        let obj = require_object(&arg(args, 0), "Object.isExtensible")?;
        let extensible = obj.borrow().extensible;
        Ok(Value::Boolean(extensible))
    });

    method(interp, &ctor, "freeze", 1, |interp, _this, args| {
        let target = arg(args, 0);
        let obj = require_object(&target, "Object.freeze")?;
        restrict(interp, &obj, true)?;
        Ok(target)
    });

    method(interp, &ctor, "isFrozen", 1, |_interp, _this, args| {
        let obj = require_object(&arg(args, 0), "Object.isFrozen")?;
        Ok(Value::Boolean(test_restricted(&obj, true)))
    });

    method(interp, &ctor, "seal", 1, |interp, _this, args| {
        let target = arg(args, 0);
        let obj = require_object(&target, "Object.seal")?;
        restrict(interp, &obj, false)?;
        Ok(target)
    });

    method(interp, &ctor, "isSealed", 1, |_interp, _this, args| {
        let obj = require_object(&arg(args, 0), "Object.isSealed")?;
        Ok(Value::Boolean(test_restricted(&obj, false)))
    });

    // Object.prototype
    method(interp, &proto, "toString", 0, |_interp, this, _args| {
        Ok(Value::string(class_tag(this)))
    });

    method(interp, &proto, "toLocaleString", 0, |interp, this, _args| {
        let f = interp.get_method(this, "toString")?;
        interp.call(&f, this.clone(), &[])
    });

    method(interp, &proto, "valueOf", 0, |interp, this, _args| {
        Ok(Value::Object(interp.to_object(this)?))
    });

    method(interp, &proto, "hasOwnProperty", 1, |interp, this, args| {
        let key = interp.to_property_key(&arg(args, 0))?;
        let obj = interp.to_object(this)?;
        Ok(Value::Boolean(interp.has_own_property(&obj, &key)))
    });

    method(interp, &proto, "isPrototypeOf", 1, |interp, this, args| {
        let Value::Object(v) = arg(args, 0) else {
            return Ok(Value::Boolean(false));
        };
        let obj = interp.to_object(this)?;
        let mut current = v.borrow().prototype.clone();
        while let Some(p) = current {
            if Rc::ptr_eq(&p, &obj) {
                return Ok(Value::Boolean(true));
            }
            current = p.borrow().prototype.clone();
        }
        Ok(Value::Boolean(false))
    });

    method(interp, &proto, "propertyIsEnumerable", 1, |interp, this, args| {
        let key = interp.to_property_key(&arg(args, 0))?;
        let obj = interp.to_object(this)?;
        let enumerable = interp
            .get_own_property(&obj, &key)
            .is_some_and(|p| p.enumerable());
        Ok(Value::Boolean(enumerable))
    });
}

fn object_from(interp: &mut Interpreter, value: &Value) -> Result<Value> {
    if value.is_nullish() {
        return Ok(Value::Object(interp.new_object()));
    }
    Ok(Value::Object(interp.to_object(value)?))
}
