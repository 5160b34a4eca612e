//! Shared test helpers for integration tests

use ecmawalk::{Runtime, Value};

/// Run a script and return its completion value
pub fn run_js(code: &str) -> ecmawalk::Result<Value> {
    let mut runtime = Runtime::new();
    runtime.eval(code)
}

/// Run a script and get the string representation of the result
#[allow(dead_code)]
pub fn run_js_string(code: &str) -> String {
    run_js(code)
        .map(|v| v.to_string())
        .unwrap_or_else(|e| format!("Error: {}", e))
}

/// Run the body of a function and return what it returns
#[allow(dead_code)]
pub fn run_body(body: &str) -> ecmawalk::Result<Value> {
    let mut runtime = Runtime::new();
    runtime.eval_function_body(&[], body, &[])
}
