//! Integration tests for the JSON engine

mod common;
use common::{run_js, run_js_string};
use ecmawalk::{ErrorKind, Value};
use pretty_assertions::assert_eq;

#[test]
fn test_stringify_indent_exact() {
    assert_eq!(run_js_string("JSON.stringify({p: 1}, null, 2)"), "{\n  \"p\": 1\n}");
}

#[test]
fn test_round_trip_acyclic_data() {
    let result = run_js(r#"
        var data = { name: "ecma\"walk", list: [1, -2.5, true, null, "x\ny"], nested: { empty: {}, none: [] } };
        var text = JSON.stringify(data);
        JSON.stringify(JSON.parse(text)) === text
    "#).unwrap();
    assert_eq!(result, Value::Boolean(true));
}

#[test]
fn test_stringify_compact_form() {
    assert_eq!(
        run_js_string("JSON.stringify({a: [1, 'two', null], b: true})"),
        r#"{"a":[1,"two",null],"b":true}"#
    );
}

#[test]
fn test_stringify_escapes() {
    assert_eq!(
        run_js_string(r#"JSON.stringify('q"b\\s/\b\f\n\r\t\u0001')"#),
        r#""q\"b\\s\/\b\f\n\r\t\u0001""#
    );
}

#[test]
fn test_cycle_is_type_error() {
    let err = run_js("var a = []; a.push(a); JSON.stringify(a)").unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::TypeError));
    assert_eq!(
        run_js_string("var o = {}; o.o = o; try { JSON.stringify(o) } catch (e) { e.message }"),
        "JSON.stringify: cyclical structure"
    );
}

#[test]
fn test_non_finite_numbers_become_null() {
    assert_eq!(run_js_string("JSON.stringify([NaN, Infinity, -Infinity])"), "[null,null,null]");
}

#[test]
fn test_replacer_called_on_root_first() {
    let result = run_js("
        var keys = [];
        JSON.stringify({ a: 1 }, function (k, v) { keys.push(k === '' ? '<root>' : k); return v; });
        keys.join()
    ").unwrap();
    assert_eq!(result, Value::string("<root>,a"));
}

#[test]
fn test_replacer_can_drop_root() {
    assert_eq!(run_js("JSON.stringify(1, function () { return undefined; })").unwrap(), Value::Undefined);
}

#[test]
fn test_to_json_receives_key() {
    assert_eq!(
        run_js_string("JSON.stringify({ when: { toJSON: function (k) { return 'at ' + k; } } })"),
        r#"{"when":"at when"}"#
    );
}

#[test]
fn test_string_gap_is_truncated() {
    assert_eq!(
        run_js_string("JSON.stringify([1], null, '123456789ABCDEF')"),
        "[\n123456789A1\n]"
    );
}

#[test]
fn test_parse_structures() {
    assert_eq!(
        run_js_string(r#"var o = JSON.parse(' { "a" : [1, 2, {"b": "c"}], "d": -0.5e1 } '); o.a[2].b + o.a.length + o.d"#),
        "c3-5"
    );
}

#[test]
fn test_parse_rejects_with_syntax_error() {
    for bad in ["{\"a\":1,}", "[1 2]", "'single'", "undefined", "NaN", "{\"a\":1}}"] {
        let script = format!("try {{ JSON.parse({:?}); 'accepted' }} catch (e) {{ e.name }}", bad);
        assert_eq!(run_js_string(&script), "SyntaxError", "input {}", bad);
    }
}

#[test]
fn test_reviver_transforms_and_deletes() {
    let result = run_js(r#"
        var o = JSON.parse('{"keep": 1, "drop": 2, "list": [1, 2]}', function (k, v) {
            if (k === 'drop') return undefined;
            return typeof v === 'number' ? v * 100 : v;
        });
        [o.keep, 'drop' in o, o.list.join()].join('|')
    "#).unwrap();
    assert_eq!(result, Value::string("100|false|100,200"));
}

#[test]
fn test_reviver_sees_root_holder() {
    assert_eq!(
        run_js_string("var seen; JSON.parse('5', function (k, v) { seen = typeof this + ':' + (k === ''); return v; }); seen"),
        "object:true"
    );
}

/// Run `f` on a thread with the usual 2 MiB stack
fn on_default_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap()
}

#[test]
fn test_stringify_sparse_array() {
    assert_eq!(run_js_string("var a = [1]; a[3] = 4; JSON.stringify(a)"), "[1,null,null,4]");
    assert_eq!(
        run_js_string("var a = []; a[2] = {x: 1}; JSON.stringify({a: a}, null, 1)"),
        "{\n \"a\": [\n  null,\n  null,\n  {\n   \"x\": 1\n  }\n ]\n}"
    );
    assert_eq!(
        run_js_string("JSON.stringify([, 1], function (k, v) { return v === undefined ? 'hole' : v; })"),
        r#"["hole",1]"#
    );
}

#[test]
fn test_stringify_huge_length_is_range_error() {
    assert_eq!(
        run_js_string("var a = []; a.length = 4294967295; try { JSON.stringify(a) } catch (e) { e.name }"),
        "RangeError"
    );
    assert_eq!(
        run_js_string("var a = []; a[4000000000] = 1; try { JSON.stringify([a]) } catch (e) { e.name }"),
        "RangeError"
    );
}

#[test]
fn test_deep_nesting_is_range_error() {
    let results = on_default_stack(|| {
        [
            run_js_string("
                var a = [];
                for (var i = 0; i < 100000; i++) a = [a];
                try { JSON.stringify(a); 'no' } catch (e) { e.name }
            "),
            run_js_string("
                var t = Array(100001).join('[');
                try { JSON.parse(t); 'no' } catch (e) { e.name }
            "),
            run_js_string("
                var t = Array(1001).join('[') + Array(1001).join(']');
                JSON.stringify(JSON.parse(t, function (k, v) { return v; })).length
            "),
        ]
    });
    assert_eq!(results, ["RangeError", "RangeError", "2000"]);
}

