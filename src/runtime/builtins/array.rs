//! `Array` constructor and `Array.prototype`
//!
//! The prototype methods are generic: they work on any object with a
//! `length`, reading and writing through `[[Get]]`/`[[Put]]`. Walks go
//! through the interpreter's present-index cursors, so an array with a
//! huge `length` and few elements costs only its elements.

use super::{arg, callable_arg, constructor, method, relative_index};
use crate::error::{messages, Error, Result};
use crate::runtime::interpreter::{index_key as key, Interpreter};
use crate::runtime::number::to_uint32;
use crate::runtime::{ArrayStorage, JsString, ObjectRef, PropertyKey, Value};
use std::cmp::Ordering;

fn get_at(interp: &mut Interpreter, obj: &ObjectRef, index: u64) -> Result<Value> {
    interp.get(obj, &key(index))
}

fn put_at(interp: &mut Interpreter, obj: &ObjectRef, index: u64, value: Value) -> Result<()> {
    interp.put(obj, key(index), value, true)
}

fn has_at(interp: &Interpreter, obj: &ObjectRef, index: u64) -> bool {
    interp.has_property(obj, &key(index))
}

fn delete_at(interp: &mut Interpreter, obj: &ObjectRef, index: u64) -> Result<()> {
    interp.delete_property(obj, &key(index), true)?;
    Ok(())
}

fn set_length(interp: &mut Interpreter, obj: &ObjectRef, len: u64) -> Result<()> {
    interp.put(obj, PropertyKey::from("length"), Value::Number(len as f64), true)
}

/// Move element `from` to `to`, deleting `to` when `from` is a hole
fn move_element(interp: &mut Interpreter, obj: &ObjectRef, from: u64, to: u64) -> Result<()> {
    if has_at(interp, obj, from) {
        let v = get_at(interp, obj, from)?;
        put_at(interp, obj, to, v)
    } else {
        delete_at(interp, obj, to)
    }
}

/// Move the elements of `from..to` so the first lands at `target`
///
/// Only positions where the source or the destination holds an element
/// are visited, in the order that reads each source before overwriting it.
fn move_range(interp: &mut Interpreter, obj: &ObjectRef, from: u64, to: u64, target: u64) -> Result<()> {
    if from >= to || from == target {
        return Ok(());
    }
    let dest = |k: u64| k - from + target;
    let source = |d: u64| d - target + from;
    let end = dest(to);

    if target < from {
        let mut src = interp.next_present_index(obj, from, to);
        let mut dst = interp.next_present_index(obj, target, end).map(source);
        while let Some(k) = src.into_iter().chain(dst).min() {
            move_element(interp, obj, k, dest(k))?;
            if src == Some(k) {
                src = interp.next_present_index(obj, k + 1, to);
            }
            if dst == Some(k) {
                dst = interp.next_present_index(obj, dest(k) + 1, end).map(source);
            }
        }
    } else {
        let mut src = interp.prev_present_index(obj, from, to - 1);
        let mut dst = interp.prev_present_index(obj, target, end - 1).map(source);
        while let Some(k) = src.into_iter().chain(dst).max() {
            move_element(interp, obj, k, dest(k))?;
            if src == Some(k) {
                src = k.checked_sub(1).and_then(|at| interp.prev_present_index(obj, from, at));
            }
            if dst == Some(k) {
                dst = dest(k)
                    .checked_sub(1)
                    .and_then(|at| interp.prev_present_index(obj, target, at))
                    .map(source);
            }
        }
    }
    Ok(())
}

/// Delete every element in `from..to`, highest first
fn delete_range(interp: &mut Interpreter, obj: &ObjectRef, from: u64, to: u64) -> Result<()> {
    let mut cursor = to.checked_sub(1).and_then(|at| interp.prev_present_index(obj, from, at));
    while let Some(k) = cursor {
        delete_at(interp, obj, k)?;
        cursor = k.checked_sub(1).and_then(|at| interp.prev_present_index(obj, from, at));
    }
    Ok(())
}

/// Copy the elements of `obj` in `from..to` into `out` starting at `at`
fn copy_elements(
    interp: &mut Interpreter,
    obj: &ObjectRef,
    from: u64,
    to: u64,
    out: &ObjectRef,
    at: u64,
) -> Result<()> {
    let mut cursor = interp.next_present_index(obj, from, to);
    while let Some(k) = cursor {
        let v = get_at(interp, obj, k)?;
        out.borrow_mut().create_data_property(key(at + k - from), v);
        cursor = interp.next_present_index(obj, k + 1, to);
    }
    Ok(())
}

/// New array of `len` holes; `len` must already be a valid length
fn new_holes(interp: &mut Interpreter, len: u64) -> Result<ObjectRef> {
    let len = u32::try_from(len).map_err(|_| Error::range_error(messages::INVALID_ARRAY_LENGTH))?;
    Ok(interp.new_array_with(ArrayStorage::with_length(len)))
}

/// `this` as an object plus its length
fn this_array(interp: &mut Interpreter, this: &Value) -> Result<(ObjectRef, u64)> {
    let obj = interp.to_object(this)?;
    let len = interp.length_of(&obj)? as u64;
    Ok((obj, len))
}

fn array_from_args(interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    if let [Value::Number(n)] = args {
        let len = to_uint32(*n);
        if len as f64 != *n {
            return Err(Error::range_error(messages::INVALID_ARRAY_LENGTH));
        }
        return Ok(Value::Object(interp.new_array_with(ArrayStorage::with_length(len))));
    }
    Ok(Value::Object(interp.new_array(args.to_vec())))
}

fn sort_compare(interp: &mut Interpreter, a: &Value, b: &Value, comparefn: &Value) -> Result<Ordering> {
    match (a.is_undefined(), b.is_undefined()) {
        (true, true) => return Ok(Ordering::Equal),
        (true, false) => return Ok(Ordering::Greater),
        (false, true) => return Ok(Ordering::Less),
        _ => {}
    }
    if comparefn.is_undefined() {
        let sa = interp.to_string(a)?;
        let sb = interp.to_string(b)?;
        return Ok(sa.as_units().cmp(sb.as_units()));
    }
    let v = interp.call(comparefn, Value::Undefined, &[a.clone(), b.clone()])?;
    let n = interp.to_number(&v)?;
    Ok(if n < 0.0 {
        Ordering::Less
    } else if n > 0.0 {
        Ordering::Greater
    } else {
        Ordering::Equal
    })
}

/// Stable merge sort whose comparator may throw
fn merge_sort(interp: &mut Interpreter, mut values: Vec<Value>, comparefn: &Value) -> Result<Vec<Value>> {
    if values.len() < 2 {
        return Ok(values);
    }
    let right = values.split_off(values.len() / 2);
    let left = merge_sort(interp, values, comparefn)?;
    let right = merge_sort(interp, right, comparefn)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if sort_compare(interp, &right[j], &left[i], comparefn)? == Ordering::Less {
            merged.push(right[j].clone());
            j += 1;
        } else {
            merged.push(left[i].clone());
            i += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    Ok(merged)
}

/// Shared driver of the callback iteration methods
enum Iteration {
    ForEach,
    Map,
    Filter,
    Any,
    All,
}

fn iterate(interp: &mut Interpreter, this: &Value, args: &[Value], kind: Iteration, name: &str) -> Result<Value> {
    let (obj, len) = this_array(interp, this)?;
    let callback = callable_arg(&arg(args, 0), name)?;
    let this_arg = arg(args, 1);
    let mapped = match kind {
        Iteration::Map => Some(new_holes(interp, len)?),
        _ => None,
    };
    let mut kept = Vec::new();

    let mut cursor = interp.next_present_index(&obj, 0, len);
    while let Some(k) = cursor {
        let value = get_at(interp, &obj, k)?;
        let call_args = [value.clone(), Value::Number(k as f64), Value::Object(obj.clone())];
        let result = interp.call(&callback, this_arg.clone(), &call_args)?;
        match kind {
            Iteration::ForEach => {}
            Iteration::Map => {
                if let Some(out) = &mapped {
                    out.borrow_mut().create_data_property(key(k), result);
                }
            }
            Iteration::Filter => {
                if result.to_boolean() {
                    kept.push(value);
                }
            }
            Iteration::Any => {
                if result.to_boolean() {
                    return Ok(Value::Boolean(true));
                }
            }
            Iteration::All => {
                if !result.to_boolean() {
                    return Ok(Value::Boolean(false));
                }
            }
        }
        cursor = interp.next_present_index(&obj, k + 1, len);
    }

    Ok(match kind {
        Iteration::ForEach => Value::Undefined,
        Iteration::Map => mapped.map(Value::Object).unwrap_or_default(),
        Iteration::Filter => Value::Object(interp.new_array(kept)),
        Iteration::Any => Value::Boolean(false),
        Iteration::All => Value::Boolean(true),
    })
}

/// Next element index for `reduce`/`reduceRight`, after `visited` or from
/// the starting end when nothing has been visited yet
fn reduce_step(
    interp: &Interpreter,
    obj: &ObjectRef,
    visited: Option<u64>,
    len: u64,
    from_right: bool,
) -> Option<u64> {
    if from_right {
        let at = match visited {
            Some(k) => k.checked_sub(1)?,
            None => len.checked_sub(1)?,
        };
        interp.prev_present_index(obj, 0, at)
    } else {
        interp.next_present_index(obj, visited.map_or(0, |k| k + 1), len)
    }
}

fn reduce(interp: &mut Interpreter, this: &Value, args: &[Value], from_right: bool) -> Result<Value> {
    let name = if from_right { "reduceRight" } else { "reduce" };
    let (obj, len) = this_array(interp, this)?;
    let callback = callable_arg(&arg(args, 0), name)?;
    let mut cursor = reduce_step(interp, &obj, None, len, from_right);

    let mut acc = if args.len() >= 2 {
        args[1].clone()
    } else {
        let Some(k) = cursor else {
            return Err(Error::type_error("Reduce of empty array with no initial value"));
        };
        cursor = reduce_step(interp, &obj, Some(k), len, from_right);
        get_at(interp, &obj, k)?
    };
    while let Some(k) = cursor {
        let value = get_at(interp, &obj, k)?;
        acc = interp.call(
            &callback,
            Value::Undefined,
            &[acc, value, Value::Number(k as f64), Value::Object(obj.clone())],
        )?;
        cursor = reduce_step(interp, &obj, Some(k), len, from_right);
    }
    Ok(acc)
}

/// Append `count` copies of `sep`
fn push_separators(units: &mut Vec<u16>, sep: &[u16], count: u64) {
    if sep.is_empty() {
        return;
    }
    for _ in 0..count {
        units.extend_from_slice(sep);
    }
}

fn join(interp: &mut Interpreter, obj: &ObjectRef, len: u64, sep: &JsString) -> Result<JsString> {
    let too_long = || Error::range_error(messages::STRING_TOO_LONG);
    let sep = sep.as_units();
    if len > 1 && (len - 1).saturating_mul(sep.len() as u64) > JsString::MAX_LENGTH as u64 {
        return Err(too_long());
    }
    let mut units: Vec<u16> = Vec::new();
    let mut separators = 0;
    let mut cursor = interp.next_present_index(obj, 0, len);
    while let Some(k) = cursor {
        push_separators(&mut units, sep, k - separators);
        separators = k;
        let element = get_at(interp, obj, k)?;
        if !element.is_nullish() {
            units.extend_from_slice(interp.to_string(&element)?.as_units());
            if units.len() > JsString::MAX_LENGTH {
                return Err(too_long());
            }
        }
        cursor = interp.next_present_index(obj, k + 1, len);
    }
    push_separators(&mut units, sep, len.saturating_sub(1).saturating_sub(separators));
    Ok(JsString::from(units))
}

/// Partner of `lower` in a reversal: the highest element in the upper
/// half at or below the mirror of `from`, mapped back to its lower index
fn reverse_mirror(interp: &Interpreter, obj: &ObjectRef, from: u64, len: u64) -> Option<u64> {
    let middle = len / 2;
    if from >= middle {
        return None;
    }
    interp
        .prev_present_index(obj, len - middle, len - 1 - from)
        .map(|upper| len - 1 - upper)
}

pub(super) fn register_array(interp: &mut Interpreter) {
    let proto = interp.realm().array_prototype.clone();
    let ctor = constructor(
        interp,
        "Array",
        1,
        &proto,
        |interp, _this, args| array_from_args(interp, args),
        |interp, _this, args| array_from_args(interp, args),
    );

    method(interp, &ctor, "isArray", 1, |_interp, _this, args| {
        Ok(Value::Boolean(arg(args, 0).is_array()))
    });

    method(interp, &proto, "push", 1, |interp, this, args| {
        let (obj, len) = this_array(interp, this)?;
        for (i, v) in args.iter().enumerate() {
            put_at(interp, &obj, len + i as u64, v.clone())?;
        }
        let new_len = len + args.len() as u64;
        set_length(interp, &obj, new_len)?;
        Ok(Value::Number(new_len as f64))
    });

    method(interp, &proto, "pop", 0, |interp, this, _args| {
        let (obj, len) = this_array(interp, this)?;
        if len == 0 {
            set_length(interp, &obj, 0)?;
            return Ok(Value::Undefined);
        }
        let last = get_at(interp, &obj, len - 1)?;
        delete_at(interp, &obj, len - 1)?;
        set_length(interp, &obj, len - 1)?;
        Ok(last)
    });

    method(interp, &proto, "shift", 0, |interp, this, _args| {
        let (obj, len) = this_array(interp, this)?;
        if len == 0 {
            set_length(interp, &obj, 0)?;
            return Ok(Value::Undefined);
        }
        let first = get_at(interp, &obj, 0)?;
        move_range(interp, &obj, 1, len, 0)?;
        delete_at(interp, &obj, len - 1)?;
        set_length(interp, &obj, len - 1)?;
        Ok(first)
    });

    method(interp, &proto, "unshift", 1, |interp, this, args| {
        let (obj, len) = this_array(interp, this)?;
        let count = args.len() as u64;
        move_range(interp, &obj, 0, len, count)?;
        for (i, v) in args.iter().enumerate() {
            put_at(interp, &obj, i as u64, v.clone())?;
        }
        set_length(interp, &obj, len + count)?;
        Ok(Value::Number((len + count) as f64))
    });

    method(interp, &proto, "join", 1, |interp, this, args| {
        let (obj, len) = this_array(interp, this)?;
        let sep = match arg(args, 0) {
            Value::Undefined => JsString::from(","),
            other => interp.to_string(&other)?,
        };
        Ok(Value::String(join(interp, &obj, len, &sep)?))
    });

    method(interp, &proto, "toString", 0, |interp, this, _args| {
        let obj = interp.to_object(this)?;
        let join = interp.get(&obj, &PropertyKey::from("join"))?;
        if join.is_callable() {
            interp.call(&join, Value::Object(obj), &[])
        } else {
            Ok(Value::string(super::object::class_tag(&Value::Object(obj))))
        }
    });

    method(interp, &proto, "slice", 2, |interp, this, args| {
        let (obj, len) = this_array(interp, this)?;
        let lenf = len as f64;
        let start = relative_index(interp, &arg(args, 0), lenf, 0.0)? as u64;
        let end = relative_index(interp, &arg(args, 1), lenf, lenf)? as u64;
        let out = new_holes(interp, end.saturating_sub(start))?;
        copy_elements(interp, &obj, start, end, &out, 0)?;
        Ok(Value::Object(out))
    });

    method(interp, &proto, "splice", 2, |interp, this, args| {
        let (obj, len) = this_array(interp, this)?;
        let lenf = len as f64;
        let start = relative_index(interp, &arg(args, 0), lenf, 0.0)? as u64;
        let delete_count = match args.len() {
            0 => 0,
            1 => len - start,
            _ => {
                let n = interp.to_integer(&args[1])?;
                n.max(0.0).min((len - start) as f64) as u64
            }
        };
        let items = args.get(2..).unwrap_or_default();
        let item_count = items.len() as u64;

        let removed = new_holes(interp, delete_count)?;
        copy_elements(interp, &obj, start, start + delete_count, &removed, 0)?;

        move_range(interp, &obj, start + delete_count, len, start + item_count)?;
        if item_count < delete_count {
            delete_range(interp, &obj, len - delete_count + item_count, len)?;
        }
        for (i, v) in items.iter().enumerate() {
            put_at(interp, &obj, start + i as u64, v.clone())?;
        }
        set_length(interp, &obj, len - delete_count + item_count)?;
        Ok(Value::Object(removed))
    });

    method(interp, &proto, "concat", 1, |interp, this, args| {
        let first = Value::Object(interp.to_object(this)?);
        let items: Vec<&Value> = std::iter::once(&first).chain(args.iter()).collect();
        let mut total = 0u64;
        for item in &items {
            total += match item {
                Value::Object(obj) if item.is_array() => interp.length_of(obj)? as u64,
                _ => 1,
            };
        }
        let out = new_holes(interp, total)?;
        let mut n = 0u64;
        for item in items {
            match item {
                Value::Object(obj) if item.is_array() => {
                    let len = interp.length_of(obj)? as u64;
                    copy_elements(interp, obj, 0, len, &out, n)?;
                    n += len;
                }
                other => {
                    out.borrow_mut().create_data_property(key(n), other.clone());
                    n += 1;
                }
            }
        }
        Ok(Value::Object(out))
    });

    method(interp, &proto, "reverse", 0, |interp, this, _args| {
        let (obj, len) = this_array(interp, this)?;
        let middle = len / 2;
        let mut lower_next = interp.next_present_index(&obj, 0, middle);
        let mut upper_next = reverse_mirror(interp, &obj, 0, len);
        while let Some(lower) = lower_next.into_iter().chain(upper_next).min() {
            let upper = len - lower - 1;
            let lower_value = has_at(interp, &obj, lower)
                .then(|| get_at(interp, &obj, lower))
                .transpose()?;
            let upper_value = has_at(interp, &obj, upper)
                .then(|| get_at(interp, &obj, upper))
                .transpose()?;
            match upper_value {
                Some(v) => put_at(interp, &obj, lower, v)?,
                None => delete_at(interp, &obj, lower)?,
            }
            match lower_value {
                Some(v) => put_at(interp, &obj, upper, v)?,
                None => delete_at(interp, &obj, upper)?,
            }
            if lower_next == Some(lower) {
                lower_next = interp.next_present_index(&obj, lower + 1, middle);
            }
            if upper_next == Some(lower) {
                upper_next = reverse_mirror(interp, &obj, lower + 1, len);
            }
        }
        Ok(Value::Object(obj))
    });

    method(interp, &proto, "sort", 1, |interp, this, args| {
        let (obj, len) = this_array(interp, this)?;
        let comparefn = arg(args, 0);
        if !comparefn.is_undefined() && !comparefn.is_callable() {
            return Err(Error::type_error(
                "The comparison function must be either a function or undefined",
            ));
        }
        let mut values = Vec::new();
        let mut cursor = interp.next_present_index(&obj, 0, len);
        while let Some(k) = cursor {
            values.push(get_at(interp, &obj, k)?);
            cursor = interp.next_present_index(&obj, k + 1, len);
        }
        let present = values.len() as u64;
        let sorted = merge_sort(interp, values, &comparefn)?;
        for (i, v) in sorted.into_iter().enumerate() {
            put_at(interp, &obj, i as u64, v)?;
        }
        delete_range(interp, &obj, present, len)?;
        Ok(Value::Object(obj))
    });

    method(interp, &proto, "indexOf", 1, |interp, this, args| {
        let (obj, len) = this_array(interp, this)?;
        let target = arg(args, 0);
        let from = relative_index(interp, &arg(args, 1), len as f64, 0.0)? as u64;
        let mut cursor = interp.next_present_index(&obj, from, len);
        while let Some(k) = cursor {
            if get_at(interp, &obj, k)?.strict_equals(&target) {
                return Ok(Value::Number(k as f64));
            }
            cursor = interp.next_present_index(&obj, k + 1, len);
        }
        Ok(Value::Number(-1.0))
    });

    method(interp, &proto, "lastIndexOf", 1, |interp, this, args| {
        let (obj, len) = this_array(interp, this)?;
        if len == 0 {
            return Ok(Value::Number(-1.0));
        }
        let target = arg(args, 0);
        let from = if args.len() > 1 {
            let n = interp.to_integer(&args[1])?;
            if n < 0.0 {
                len as f64 + n
            } else {
                n.min(len as f64 - 1.0)
            }
        } else {
            len as f64 - 1.0
        };
        if from < 0.0 {
            return Ok(Value::Number(-1.0));
        }
        let mut cursor = interp.prev_present_index(&obj, 0, from as u64);
        while let Some(k) = cursor {
            if get_at(interp, &obj, k)?.strict_equals(&target) {
                return Ok(Value::Number(k as f64));
            }
            cursor = k.checked_sub(1).and_then(|at| interp.prev_present_index(&obj, 0, at));
        }
        Ok(Value::Number(-1.0))
    });

    method(interp, &proto, "forEach", 1, |interp, this, args| {
        iterate(interp, this, args, Iteration::ForEach, "Array.prototype.forEach")
    });
    method(interp, &proto, "map", 1, |interp, this, args| {
        iterate(interp, this, args, Iteration::Map, "Array.prototype.map")
    });
    method(interp, &proto, "filter", 1, |interp, this, args| {
        iterate(interp, this, args, Iteration::Filter, "Array.prototype.filter")
    });
    method(interp, &proto, "some", 1, |interp, this, args| {
        iterate(interp, this, args, Iteration::Any, "Array.prototype.some")
    });
    method(interp, &proto, "every", 1, |interp, this, args| {
        iterate(interp, this, args, Iteration::All, "Array.prototype.every")
    });
    method(interp, &proto, "reduce", 1, |interp, this, args| {
        reduce(interp, this, args, false)
    });
    method(interp, &proto, "reduceRight", 1, |interp, this, args| {
        reduce(interp, this, args, true)
    });
}
