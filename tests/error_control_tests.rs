//! Integration tests for exceptions, completions and resource limits

mod common;
use common::{run_body, run_js, run_js_string};
use ecmawalk::{Error, ErrorKind, Runtime, RuntimeConfig, Value};
use std::cell::Cell;
use std::rc::Rc;

mod try_catch {
    use super::*;

    #[test]
    fn test_try_catch_basic() {
        let result = run_js("
            var result = 0;
            try {
                throw 'error';
            } catch (e) {
                result = 1;
            }
            result
        ").unwrap();
        assert_eq!(result, Value::Number(1.0));
    }

    #[test]
    fn test_thrown_value_is_preserved() {
        assert_eq!(run_js_string("try { throw { code: 42 }; } catch (e) { e.code }"), "42");
    }

    #[test]
    fn test_finally_return_overrides() {
        let result = run_body("try { 2; } catch (e) { return true; } finally { return 4; }").unwrap();
        assert_eq!(result, Value::Number(4.0));
    }

    #[test]
    fn test_finally_overrides_throw() {
        let result = run_body("try { throw 1; } finally { return 'finally'; }").unwrap();
        assert_eq!(result, Value::string("finally"));
    }

    #[test]
    fn test_normal_finally_keeps_return() {
        let result = run_js("
            var log = [];
            function f() {
                try { return 'try'; } finally { log.push('cleanup'); }
            }
            f() + ':' + log.join()
        ").unwrap();
        assert_eq!(result, Value::string("try:cleanup"));
    }

    #[test]
    fn test_break_in_finally_discards_exception() {
        let result = run_js("
            var n = 0;
            while (true) {
                try { throw 'x'; } finally { n++; break; }
            }
            n
        ").unwrap();
        assert_eq!(result, Value::Number(1.0));
    }

    #[test]
    fn test_catch_scope_is_fresh() {
        assert_eq!(run_js_string("var e = 'outer'; try { throw 'inner'; } catch (e) { } e"), "outer");
    }

    #[test]
    fn test_rethrow_from_catch_runs_finally() {
        let result = run_js("
            var log = [];
            try {
                try { throw 'a'; } catch (e) { log.push('catch'); throw 'b'; } finally { log.push('finally'); }
            } catch (e) { log.push(e); }
            log.join()
        ").unwrap();
        assert_eq!(result, Value::string("catch,finally,b"));
    }
}

mod error_objects {
    use super::*;

    #[test]
    fn test_engine_fault_kinds() {
        let cases = [
            ("null.x", "TypeError"),
            ("undefinedName", "ReferenceError"),
            ("new Array(-1)", "RangeError"),
            ("eval('a b')", "SyntaxError"),
            ("decodeURIComponent('%')", "URIError"),
            ("(1)()", "TypeError"),
            ("new Math.max()", "TypeError"),
        ];
        for (code, name) in cases {
            let script = format!("try {{ {} }} catch (e) {{ e.name + ':' + (e instanceof Error) }}", code);
            assert_eq!(run_js_string(&script), format!("{}:true", name), "for {}", code);
        }
    }

    #[test]
    fn test_uncaught_fault_reaches_host() {
        let err = run_js("null.prop").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::TypeError));
        assert!(err.to_string().starts_with("TypeError:"));
    }

    #[test]
    fn test_uncaught_throw_carries_value() {
        let err = run_js("throw new RangeError('too big')").unwrap_err();
        match err {
            Error::Exception { value } => assert_eq!(value.describe(), "RangeError: too big"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_message_names_callee() {
        let message = run_js_string("try { var o = {}; o.missing(); } catch (e) { e.message }");
        assert!(message.contains("missing"), "{}", message);
    }

    #[test]
    fn test_runtime_usable_after_uncaught_error() {
        let mut runtime = Runtime::new();
        runtime.eval("var kept = 1;").unwrap();
        assert!(runtime.eval("throw 'boom'").is_err());
        assert!(runtime.eval("null.x").is_err());
        assert_eq!(runtime.eval("kept + 1").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_strict_mode_faults() {
        assert_eq!(run_js_string("'use strict'; try { undeclared = 1; } catch (e) { e.name }"), "ReferenceError");
        assert_eq!(
            run_js_string("'use strict'; var o = Object.freeze({a: 1}); try { o.a = 2; } catch (e) { e.name }"),
            "TypeError"
        );
    }
}

mod limits {
    use super::*;

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
    fn test_call_depth_is_range_error() {
        let result = on_default_stack(|| {
            run_js_string("
                function down(n) { return down(n + 1); }
                try { down(0); } catch (e) { e.name + ':' + e.message }
            ")
        });
        assert_eq!(result, "RangeError:Maximum call stack size exceeded");
    }

    #[test]
    fn test_configured_call_depth() {
        let mut runtime = Runtime::with_config(RuntimeConfig {
            max_call_depth: 10,
            ..Default::default()
        });
        let script = "function f(n) { return n == 0 ? 0 : 1 + f(n - 1); } f(";
        assert_eq!(runtime.eval(&format!("{}5)", script)).unwrap(), Value::Number(5.0));
        let err = runtime.eval("f(50)").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::RangeError));
        assert_eq!(runtime.eval("f(9)").unwrap(), Value::Number(9.0));
    }

    #[test]
    fn test_deep_recursion_on_default_stack() {
        let result = on_default_stack(|| {
            let mut runtime = Runtime::with_config(RuntimeConfig {
                max_call_depth: 5000,
                ..Default::default()
            });
            runtime
                .eval("function sum(n) { return n == 0 ? 0 : n + sum(n - 1); } sum(4000)")
                .map(|v| v.describe())
                .map_err(|e| e.to_string())
        });
        assert_eq!(result, Ok("8002000".to_string()));
    }

    #[test]
    fn test_unbounded_recursion_with_large_limit_is_range_error() {
        let result = on_default_stack(|| {
            let mut runtime = Runtime::with_config(RuntimeConfig {
                max_call_depth: 10_000,
                ..Default::default()
            });
            runtime
                .eval("function down(n) { return [down(n + 1)]; } try { down(0); } catch (e) { e.name }")
                .map(|v| v.describe())
                .map_err(|e| e.to_string())
        });
        assert_eq!(result, Ok("RangeError".to_string()));
    }

    #[test]
    fn test_throwing_constructors_release_call_depth() {
        let mut runtime = Runtime::new();
        let caught = runtime
            .eval("
                function Bad() { throw new Error('no'); }
                var caught = 0;
                for (var i = 0; i < 1000; i++) { try { new Bad(); } catch (e) { caught++; } }
                caught
            ")
            .unwrap();
        assert_eq!(caught, Value::Number(1000.0));
        assert_eq!(
            runtime.eval("function deep(n) { return n == 0 ? 'ok' : deep(n - 1); } deep(300)").unwrap(),
            Value::string("ok")
        );
    }

    #[test]
    fn test_uncaught_constructor_throws_leave_runtime_usable() {
        let mut runtime = Runtime::with_config(RuntimeConfig {
            max_call_depth: 10,
            ..Default::default()
        });
        runtime.eval("function Bad() { throw 'no'; }").unwrap();
        for _ in 0..50 {
            assert!(runtime.eval("new Bad()").is_err());
        }
        assert_eq!(
            runtime.eval("function f(n) { return n == 0 ? 0 : 1 + f(n - 1); } f(9)").unwrap(),
            Value::Number(9.0)
        );
    }

    #[test]
    fn test_deeply_nested_source_is_range_error() {
        let err = on_default_stack(|| {
            let source = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
            Runtime::new().eval(&source).map(|_| ()).map_err(|e| e.kind())
        })
        .unwrap_err();
        assert_eq!(err, Some(ErrorKind::RangeError));
    }

    #[test]
    fn test_nested_source_below_limit_runs_on_default_stack() {
        let result = on_default_stack(|| {
            let mut runtime = Runtime::new();
            let literal = format!("{}{}", "[".repeat(1_000), "]".repeat(1_000));
            let parens = format!("{}1{}", "(".repeat(1_000), ")".repeat(1_000));
            let script = format!("var deep = {}; var n = {}; n + deep.length", literal, parens);
            runtime.eval(&script).map(|v| v.describe()).map_err(|e| e.to_string())
        });
        assert_eq!(result, Ok("2".to_string()));
    }

    #[test]
    fn test_operation_limit_is_not_catchable() {
        let mut runtime = Runtime::with_config(RuntimeConfig {
            operation_limit: Some(1000),
            ..Default::default()
        });
        let err = runtime
            .eval("var finallyRan = false; try { while (true) {} } catch (e) {} finally { finallyRan = true; }")
            .unwrap_err();
        assert!(matches!(err, Error::ResourceLimitError { .. }));
        assert!(!err.is_catchable());
        assert_eq!(runtime.eval("finallyRan").unwrap(), Value::Boolean(false));
        assert_eq!(runtime.eval("1 + 1").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_interrupt_hook() {
        let calls = Rc::new(Cell::new(0u64));
        let seen = calls.clone();
        let mut runtime = Runtime::with_config(RuntimeConfig {
            interrupt: Some(Rc::new(move |steps| {
                seen.set(steps);
                steps >= 25
            })),
            ..Default::default()
        });
        let err = runtime.eval("for (;;) {}").unwrap_err();
        assert!(matches!(err, Error::ResourceLimitError { .. }));
        assert_eq!(calls.get(), 25);
    }
}
