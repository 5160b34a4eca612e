//! Prelude module for convenient imports
//!
//! ```no_run
//! use ecmawalk::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut runtime = Runtime::new();
//!     let result = runtime.eval("1 + 2")?;
//!     println!("{}", result);
//!     Ok(())
//! }
//! ```

// Core runtime types
pub use crate::runtime::{
    HostObject, JsString, ObjectKind, ObjectRef, PropertyFlags, PropertyKey, Runtime, RuntimeConfig, Value,
};

// Error handling
pub use crate::error::{Error, ErrorKind, Result, SourceLocation};

// Data structures
pub use crate::bitset::UInt32BitSet;
