//! ecmawalk: a tree-walking ECMAScript 5 runtime written in Rust
//!
//! ecmawalk evaluates ES5 source directly over its syntax tree. It is meant
//! for embedding: a host creates a [`Runtime`], hands it scripts or function
//! bodies, and exchanges plain values with them.
//!
//! # Quick Start
//!
//! ```no_run
//! use ecmawalk::{Runtime, Value};
//!
//! fn main() -> ecmawalk::Result<()> {
//!     let mut runtime = Runtime::new();
//!     let result = runtime.eval("[1, 2, 3].map(function (x) { return x * 2; }).join()")?;
//!     assert_eq!(result, Value::string("2,4,6"));
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! The pipeline flows: Source → [`lexer`] → [`parser`] → [`ast`] → [`runtime`] → Result
//!
//! | Category | Modules |
//! |----------|---------|
//! | **Core** | [`lexer`], [`parser`], [`ast`], [`runtime`], [`error`](Error) |
//! | **Library** | [`json`], [`bitset`] |
//! | **Memory** | [`gc`] |
//! | **Tooling** | [`repl`] |
#![allow(clippy::type_complexity)]
#![allow(clippy::new_without_default)]

pub mod ast;
pub mod bitset;
pub mod gc;
pub mod json;
pub mod lexer;
pub mod parser;
pub mod prelude;
pub mod repl;
pub mod runtime;

mod error;
mod stack;

pub use bitset::UInt32BitSet;
pub use error::{messages, Error, ErrorKind, Result, SourceLocation};
pub use runtime::{HostObject, ObjectKind, Runtime, RuntimeConfig, Value};

/// ecmawalk version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
