//! Integration tests for statements, functions and scoping

mod common;
use common::{run_body, run_js, run_js_string};
use ecmawalk::Value;

mod functions {
    use super::*;

    #[test]
    fn test_function_declaration() {
        let result = run_js("
            function add(a, b) {
                return a + b;
            }
            add(3, 4)
        ").unwrap();
        assert_eq!(result, Value::Number(7.0));
    }

    #[test]
    fn test_recursive_function() {
        let result = run_js("
            function factorial(n) {
                if (n <= 1) return 1;
                return n * factorial(n - 1);
            }
            factorial(10)
        ").unwrap();
        assert_eq!(result, Value::Number(3628800.0));
    }

    #[test]
    fn test_closure_counter() {
        let result = run_js("
            function counter() {
                var n = 0;
                return function () { return ++n; };
            }
            var c = counter();
            c(); c();
            c()
        ").unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn test_missing_arguments_are_undefined() {
        assert_eq!(run_js_string("(function (a, b) { return typeof b; })(1)"), "undefined");
    }

    #[test]
    fn test_arguments_object() {
        let result = run_js("
            function count() { return arguments.length + ':' + arguments[1]; }
            count('a', 'b', 'c')
        ").unwrap();
        assert_eq!(result, Value::string("3:b"));
    }

    #[test]
    fn test_named_function_expression_binds_its_name() {
        let result = run_js("
            var f = function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); };
            f(5) + ':' + typeof fact
        ").unwrap();
        assert_eq!(result, Value::string("120:undefined"));
    }

    #[test]
    fn test_function_body_returns() {
        assert_eq!(run_body("var x = 2; return x * 21;").unwrap(), Value::Number(42.0));
        assert_eq!(run_body("var x = 2;").unwrap(), Value::Undefined);
    }
}

mod this_binding {
    use super::*;

    #[test]
    fn test_member_call_binds_base() {
        let result = run_js("var o = { v: 5, get: function () { return this.v; } }; o.get()").unwrap();
        assert_eq!(result, Value::Number(5.0));
    }

    #[test]
    fn test_plain_call_binds_global() {
        let result = run_js("var v = 'global'; function f() { return this.v; } f()").unwrap();
        assert_eq!(result, Value::string("global"));
    }

    #[test]
    fn test_strict_plain_call_has_undefined_this() {
        let result = run_js("function f() { 'use strict'; return typeof this; } f()").unwrap();
        assert_eq!(result, Value::string("undefined"));
    }

    #[test]
    fn test_primitive_member_access_boxes_virtually() {
        assert_eq!(run_js_string("'abc'.length + (5).toString().length"), "4");
        let result = run_js("
            String.prototype.self = function () { 'use strict'; return typeof this; };
            'x'.self()
        ").unwrap();
        assert_eq!(result, Value::string("string"));
    }

    #[test]
    fn test_constructor_call() {
        let result = run_js("
            function Point(x, y) { this.x = x; this.y = y; }
            Point.prototype.sum = function () { return this.x + this.y; };
            var p = new Point(2, 3);
            p.sum() + ':' + (p instanceof Point) + ':' + (p.constructor === Point)
        ").unwrap();
        assert_eq!(result, Value::string("5:true:true"));
    }

    #[test]
    fn test_constructor_returning_object_wins() {
        assert_eq!(run_js_string("function F() { this.a = 1; return { a: 2 }; } new F().a"), "2");
        assert_eq!(run_js_string("function G() { this.a = 1; return 3; } new G().a"), "1");
    }
}

mod hoisting {
    use super::*;

    #[test]
    fn test_var_hoisted_as_undefined() {
        assert_eq!(run_js_string("var r = typeof x; var x = 1; r"), "undefined");
    }

    #[test]
    fn test_function_declarations_hoisted() {
        assert_eq!(run_js_string("var r = early(); function early() { return 'ok'; } r"), "ok");
    }

    #[test]
    fn test_nested_block_function_hoisted() {
        let result = run_js("
            function outer() {
                return inner();
                if (true) { function inner() { return 7; } }
            }
            outer()
        ").unwrap();
        assert_eq!(result, Value::Number(7.0));
    }

    #[test]
    fn test_undeclared_read_is_reference_error() {
        assert_eq!(run_js_string("try { nothing } catch (e) { e.name }"), "ReferenceError");
    }

    #[test]
    fn test_sloppy_assignment_creates_global() {
        assert_eq!(run_js_string("(function () { implicitGlobal = 3; })(); implicitGlobal"), "3");
    }
}

mod control_flow {
    use super::*;

    #[test]
    fn test_switch_fallthrough_to_default() {
        let result = run_body("
            switch ('y') {
                case 'x': return 678;
                case 'y': var x = 0;
                default: return 123;
            }
        ").unwrap();
        assert_eq!(result, Value::Number(123.0));
    }

    #[test]
    fn test_switch_default_in_middle() {
        let result = run_js("
            var log = [];
            switch (9) {
                case 1: log.push('one');
                default: log.push('default');
                case 2: log.push('two'); break;
                case 3: log.push('three');
            }
            log.join()
        ").unwrap();
        assert_eq!(result, Value::string("default,two"));
    }

    #[test]
    fn test_switch_uses_strict_equality() {
        assert_eq!(run_js_string("var r = 'none'; switch (1) { case '1': r = 'string'; break; case 1: r = 'number'; } r"), "number");
    }

    #[test]
    fn test_labelled_break_and_continue() {
        let result = run_js("
            var hits = 0;
            outer: for (var i = 0; i < 5; i++) {
                for (var j = 0; j < 5; j++) {
                    if (j == 2) continue outer;
                    if (i == 3) break outer;
                    hits++;
                }
            }
            hits
        ").unwrap();
        assert_eq!(result, Value::Number(6.0));
    }

    #[test]
    fn test_labelled_block_break() {
        assert_eq!(run_js_string("var r = 1; block: { r = 2; break block; r = 3; } r"), "2");
    }

    #[test]
    fn test_loops() {
        assert_eq!(run_js_string("var i = 0; do { i += 2; } while (i < 7); i"), "8");
        assert_eq!(run_js_string("var s = 0; var i = 10; while (i--) s += i; s"), "45");
        assert_eq!(run_js_string("for (var i = 0, s = ''; i < 3; i++) s += i; s"), "012");
    }

    #[test]
    fn test_for_in_order_and_prototype_chain() {
        let result = run_js("
            function P() { this.own = 1; }
            P.prototype.inherited = 2;
            var o = new P();
            o.later = 3;
            var keys = [];
            for (var k in o) keys.push(k);
            keys.join()
        ").unwrap();
        assert_eq!(result, Value::string("own,later,inherited"));
    }

    #[test]
    fn test_for_in_over_null_is_skipped() {
        assert_eq!(run_js_string("var n = 0; for (var k in null) n++; n"), "0");
    }

    #[test]
    fn test_with_statement() {
        assert_eq!(run_js_string("var o = { a: 1 }; var a = 'outer'; with (o) { a = 5; } o.a + ':' + a"), "5:outer");
    }

    #[test]
    fn test_conditional_and_logical() {
        assert_eq!(run_js_string("(0 || '' || 'x') + (1 && 2) + (null ? 'a' : 'b')"), "x2b");
    }
}

mod operators {
    use super::*;

    #[test]
    fn test_strict_equality_edge_cases() {
        assert_eq!(run_js_string("NaN === NaN"), "false");
        assert_eq!(run_js_string("1 === NaN"), "false");
        assert_eq!(run_js_string("NaN === 1"), "false");
        assert_eq!(run_js_string("+0 === -0"), "true");
        assert_eq!(run_js_string("'1' === 1"), "false");
    }

    #[test]
    fn test_loose_equality() {
        assert_eq!(run_js_string("null == undefined"), "true");
        assert_eq!(run_js_string("'1' == 1"), "true");
        assert_eq!(run_js_string("true == 1"), "true");
        assert_eq!(run_js_string("null == 0"), "false");
        assert_eq!(run_js_string("({ valueOf: function () { return 4; } }) == 4"), "true");
    }

    #[test]
    fn test_in_requires_object() {
        assert_eq!(run_js_string("try { 'x' in 'str' } catch (e) { e.name }"), "TypeError");
        assert_eq!(run_js_string("'length' in []"), "true");
    }

    #[test]
    fn test_typeof() {
        assert_eq!(
            run_js_string("[typeof 1, typeof 'a', typeof null, typeof undefined, typeof {}, typeof function () {}, typeof undeclared].join()"),
            "number,string,object,undefined,object,function,undefined"
        );
    }

    #[test]
    fn test_bitwise_and_shifts() {
        assert_eq!(run_js_string("(5 & 3) + ',' + (5 | 3) + ',' + (5 ^ 3) + ',' + ~5"), "1,7,6,-6");
        assert_eq!(run_js_string("(-16 >> 2) + ',' + (-16 >>> 28) + ',' + (1 << 33)"), "-4,15,2");
    }

    #[test]
    fn test_arithmetic_coercions() {
        assert_eq!(run_js_string("'3' * '4'"), "12");
        assert_eq!(run_js_string("1 + '2'"), "12");
        assert_eq!(run_js_string("'5' - 2"), "3");
        assert_eq!(run_js_string("1 / 0"), "Infinity");
        assert_eq!(run_js_string("-7 % 3"), "-1");
        assert_eq!(run_js_string("[] + {}"), "[object Object]");
    }

    #[test]
    fn test_relational_with_strings() {
        assert_eq!(run_js_string("'a' < 'b'"), "true");
        assert_eq!(run_js_string("'10' < '9'"), "true");
        assert_eq!(run_js_string("'10' < 9"), "false");
        assert_eq!(run_js_string("NaN <= NaN"), "false");
    }

    #[test]
    fn test_update_and_compound_assignment() {
        assert_eq!(run_js_string("var a = 5; var b = a++; b + ',' + a"), "5,6");
        assert_eq!(run_js_string("var o = { n: 1 }; o.n += 4; o.n *= 2; o.n"), "10");
        assert_eq!(run_js_string("var s = 'a'; s += 1; s"), "a1");
    }

    #[test]
    fn test_delete() {
        assert_eq!(run_js_string("var o = { a: 1 }; delete o.a; 'a' in o"), "false");
        assert_eq!(run_js_string("var v = 1; delete v"), "false");
        assert_eq!(run_js_string("delete Math.PI"), "false");
    }

    #[test]
    fn test_void_and_comma() {
        assert_eq!(run_js_string("void 0"), "undefined");
        assert_eq!(run_js_string("(1, 2, 3)"), "3");
    }
}

mod parsing {
    use super::*;

    #[test]
    fn test_automatic_semicolon_insertion() {
        assert_eq!(run_js_string("var a = 1\nvar b = 2\na + b"), "3");
        assert_eq!(run_body("return\n42").unwrap(), Value::Undefined);
    }

    #[test]
    fn test_syntax_error_before_execution() {
        let err = run_js("var x = 1; x = ;").unwrap_err();
        assert!(matches!(err, ecmawalk::Error::ParseError { .. }));
        assert!(!err.is_incomplete());
    }

    #[test]
    fn test_incomplete_input_is_flagged() {
        assert!(run_js("function f() {").unwrap_err().is_incomplete());
        assert!(run_js("var s = 'open").unwrap_err().is_incomplete());
        assert!(run_js("1 +").unwrap_err().is_incomplete());
    }

    #[test]
    fn test_number_literals() {
        assert_eq!(run_js_string("0xff + 1e3 + .5"), "1255.5");
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(run_js_string("'a\\tb'.length + '\\u0041\\x42'"), "3AB");
    }
}
