//! Host object boundary
//!
//! A host object is a script object whose named properties are served by
//! Rust code. Lookups the host does not answer fall back to the object's
//! ordinary properties and prototype chain.

use super::value::Value;
use crate::error::Result;

/// Property access delegated to the embedding application
pub trait HostObject {
    /// Class name reported by `Object.prototype.toString`
    fn class_name(&self) -> &str {
        "Object"
    }

    /// Value of `name`, or `None` when the host does not provide it
    fn get(&self, name: &str) -> Option<Value>;

    /// Store `value` under `name`; `Ok(false)` lets the runtime store it as
    /// an ordinary property instead. An `Err` surfaces in script as a
    /// thrown exception.
    fn set(&self, name: &str, value: Value) -> Result<bool> {
        let _ = (name, value);
        Ok(false)
    }

    /// Names enumerated by `for-in` and `Object.keys`
    fn keys(&self) -> Vec<String> {
        Vec::new()
    }
}
