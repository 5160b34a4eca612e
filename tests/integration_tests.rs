//! Integration tests for embedding the runtime in a host

use ecmawalk::runtime::PropertyKey;
use ecmawalk::{HostObject, Result, Runtime, RuntimeConfig, Value};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Write;
use std::rc::Rc;

/// A host-side settings bag exposed to script
#[derive(Default)]
struct Settings {
    values: RefCell<BTreeMap<String, Value>>,
}

impl HostObject for Settings {
    fn class_name(&self) -> &str {
        "Settings"
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.values.borrow().get(name).cloned()
    }

    fn set(&self, name: &str, value: Value) -> Result<bool> {
        if name == "locked" {
            return Err(ecmawalk::Error::type_error("locked is read-only"));
        }
        self.values.borrow_mut().insert(name.to_string(), value);
        Ok(true)
    }

    fn keys(&self) -> Vec<String> {
        self.values.borrow().keys().cloned().collect()
    }
}

#[test]
fn test_eval_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "function greet(name) {{ return 'hello, ' + name; }}").unwrap();
    writeln!(file, "greet('file')").unwrap();

    let mut runtime = Runtime::new();
    let result = runtime.eval_file(file.path()).unwrap();
    assert_eq!(result, Value::string("hello, file"));
    assert!(runtime.get_global("greet").unwrap().is_some_and(|f| f.is_callable()));
}

#[test]
fn test_eval_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = Runtime::new();
    let err = runtime.eval_file(&dir.path().join("absent.js")).unwrap_err();
    assert!(matches!(err, ecmawalk::Error::IoError { .. }));
}

#[test]
fn test_host_object_round_trip() {
    let settings = Rc::new(Settings::default());
    settings.values.borrow_mut().insert("mode".to_string(), Value::string("fast"));

    let mut runtime = Runtime::new();
    let wrapped = runtime.wrap_host_object(settings.clone());
    runtime.set_global("settings", wrapped);

    let result = runtime
        .eval("settings.level = 3; settings.mode + ':' + Object.keys(settings).join() + ':' + Object.prototype.toString.call(settings)")
        .unwrap();
    assert_eq!(result, Value::string("fast:level,mode:[object Settings]"));
    assert_eq!(settings.values.borrow().get("level"), Some(&Value::Number(3.0)));

    let err = runtime.eval("try { settings.locked = 1; } catch (e) { e.name + ': ' + e.message }").unwrap();
    assert_eq!(err, Value::string("TypeError: locked is read-only"));
}

#[test]
fn test_create_objects_and_call_back() {
    let mut runtime = Runtime::new();
    let point = runtime.create_object();
    point.borrow_mut().create_data_property(PropertyKey::from("x"), Value::Number(4.0));
    runtime.set_global("point", Value::Object(point));
    let list = runtime.create_array(vec![Value::Number(1.0), Value::Number(2.0)]);
    runtime.set_global("list", Value::Object(list));

    runtime.eval("function scale(k) { return list.map(function (v) { return v * k * point.x; }); }").unwrap();
    let scale = runtime.get_global("scale").unwrap().unwrap();
    let scaled = runtime.call_function(&scale, Value::Undefined, &[Value::Number(10.0)]).unwrap();
    assert_eq!(
        runtime.array_to_vec(&scaled).unwrap(),
        vec![Value::Number(40.0), Value::Number(80.0)]
    );
}

#[test]
fn test_json_value_conversion() {
    let mut runtime = Runtime::new();
    let input = json!({"items": [{"id": 1, "tags": ["a", "b"]}, {"id": 2, "tags": []}]});
    let value = runtime.from_json_value(&input);
    runtime.set_global("input", value);
    let output = runtime
        .eval("({ count: input.items.length, ids: input.items.map(function (i) { return i.id; }), skipped: undefined })")
        .unwrap();
    assert_eq!(
        runtime.to_json_value(&output).unwrap(),
        json!({"count": 2, "ids": [1, 2], "skipped": null})
    );
}

#[test]
fn test_print_goes_to_configured_sink() {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink = lines.clone();
    let mut runtime = Runtime::with_config(RuntimeConfig {
        output: Some(Rc::new(move |s: &str| sink.borrow_mut().push(s.to_string()))),
        ..Default::default()
    });
    runtime.eval("for (var i = 0; i < 3; i++) print('line', i);").unwrap();
    assert_eq!(*lines.borrow(), vec!["line 0", "line 1", "line 2"]);
}

#[test]
fn test_independent_runtimes() {
    let mut a = Runtime::new();
    let mut b = Runtime::new();
    a.eval("var shared = 'a'; Object.prototype.polluted = true;").unwrap();
    assert_eq!(b.eval("typeof shared + ':' + ({}).polluted").unwrap(), Value::string("undefined:undefined"));
}

#[test]
fn test_drop_tears_down_cycles() {
    let mut runtime = Runtime::new();
    let kept = runtime.eval("var o = {}; o.self = o; o").unwrap();
    drop(runtime);
    let Value::Object(obj) = kept else {
        panic!("expected an object");
    };
    assert!(obj.borrow().own_keys().is_empty());
}
