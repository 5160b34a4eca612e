//! The `JSON` object

use super::{arg, global_binding, method};
use crate::json;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::{Object, ObjectKind, Value};

pub(super) fn register_json(interp: &mut Interpreter) {
    let proto = interp.realm().object_prototype.clone();
    let json_object = interp.alloc(Object::new(ObjectKind::Json, Some(proto)));

    method(interp, &json_object, "parse", 2, |interp, _this, args| {
        let text = interp.to_string(&arg(args, 0))?;
        json::parse(interp, &text, &arg(args, 1))
    });

    method(interp, &json_object, "stringify", 3, |interp, _this, args| {
        let out = json::stringify(interp, &arg(args, 0), &arg(args, 1), &arg(args, 2))?;
        Ok(out.map_or(Value::Undefined, Value::String))
    });

    global_binding(interp, "JSON", Value::Object(json_object));
}

#[cfg(test)]
mod tests {
    use crate::runtime::{Runtime, Value};
    use pretty_assertions::assert_eq;

    fn eval_str(source: &str) -> String {
        let mut rt = Runtime::new();
        rt.eval(source).unwrap().describe()
    }

    #[test]
    fn test_indentation() {
        assert_eq!(
            eval_str("JSON.stringify({a: [1, {}], b: {c: 'x'}}, null, 2)"),
            "{\n  \"a\": [\n    1,\n    {}\n  ],\n  \"b\": {\n    \"c\": \"x\"\n  }\n}"
        );
        assert_eq!(eval_str("JSON.stringify([1,2], null, '--')"), "[\n--1,\n--2\n]");
        assert_eq!(eval_str("JSON.stringify({a: 1}, null, 20).split('\\n')[1].length"), "16");
    }

    #[test]
    fn test_replacer_forms() {
        assert_eq!(eval_str("JSON.stringify({a: 1, b: 2, c: 3}, ['c', 'a'])"), r#"{"c":3,"a":1}"#);
        assert_eq!(
            eval_str("JSON.stringify({a: 1, b: 'x'}, function (k, v) { return typeof v === 'number' ? v * 10 : v; })"),
            r#"{"a":10,"b":"x"}"#
        );
    }

    #[test]
    fn test_reviver_runs_bottom_up() {
        assert_eq!(
            eval_str("var order = []; JSON.parse('{\"a\":{\"b\":1},\"c\":[2]}', function (k, v) { order.push(k); return v; }); order.join()"),
            "b,a,0,c,"
        );
        assert_eq!(
            eval_str("var o = JSON.parse('{\"a\":1,\"b\":2}', function (k, v) { return k === 'a' ? undefined : v; }); 'a' in o"),
            "false"
        );
    }

    #[test]
    fn test_parse_errors_are_syntax_errors() {
        assert_eq!(eval_str("try { JSON.parse('{bad') } catch (e) { e.name }"), "SyntaxError");
    }

    #[test]
    fn test_stringify_undefined_root() {
        let mut rt = Runtime::new();
        assert_eq!(rt.eval("JSON.stringify(undefined)").unwrap(), Value::Undefined);
        assert_eq!(rt.eval("JSON.stringify(function () {})").unwrap(), Value::Undefined);
    }
}
