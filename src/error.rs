//! Error types for the ecmawalk runtime

use crate::runtime::Value;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Source location in JavaScript code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: u32,
    /// Column number (1-indexed)
    pub column: u32,
    /// Byte offset in source
    pub offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Format a source context with caret pointer for errors
pub fn format_error_context(source: &str, location: &SourceLocation) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let line_idx = (location.line.saturating_sub(1)) as usize;

    if line_idx >= lines.len() {
        return String::new();
    }

    let mut result = String::new();
    let line_num_width = format!("{}", location.line + 1).len().max(3);

    // Show 1 line before if available
    if line_idx > 0 {
        result.push_str(&format!(
            "{:>width$} | {}\n",
            location.line - 1,
            lines[line_idx - 1],
            width = line_num_width
        ));
    }

    result.push_str(&format!(
        "{:>width$} | {}\n",
        location.line,
        lines[line_idx],
        width = line_num_width
    ));

    let pointer_offset = (location.column.saturating_sub(1)) as usize;
    result.push_str(&format!(
        "{:>width$} | {}^\n",
        "",
        " ".repeat(pointer_offset),
        width = line_num_width
    ));

    result
}

/// Main error type for ecmawalk
///
/// Script-level exceptions travel through this type as the `Err` side of
/// every evaluation result; `break`, `continue` and `return` never do.
#[derive(Error, Debug)]
pub enum Error {
    /// Lexer or parser error
    #[error("SyntaxError: {message} at {location}{}", if source_context.is_empty() { String::new() } else { format!("\n{}", source_context) })]
    ParseError {
        message: String,
        location: SourceLocation,
        /// True when the input ended before the construct was closed
        incomplete: bool,
        source_context: String,
    },

    /// Engine-raised fault (TypeError, ReferenceError, ...)
    #[error("{kind}: {message}")]
    RuntimeError { kind: ErrorKind, message: String },

    /// A value thrown by script code
    #[error("Uncaught {}", value.describe())]
    Exception { value: Value },

    /// Host-imposed resource limit exceeded; never catchable by script
    #[error("ResourceLimitError: {kind}: {message}")]
    ResourceLimitError {
        kind: ResourceLimitKind,
        message: String,
    },

    /// Broken engine invariant
    #[error("InternalError: {0}")]
    InternalError(String),

    /// IO error
    #[error("IOError: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

/// Resource limit kinds enforced between statements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLimitKind {
    /// Statement step budget exhausted
    OperationLimit,
    /// Host interrupt hook requested termination
    Interrupted,
}

impl fmt::Display for ResourceLimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceLimitKind::OperationLimit => write!(f, "OperationLimit"),
            ResourceLimitKind::Interrupted => write!(f, "Interrupted"),
        }
    }
}

/// JavaScript error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::enum_variant_names)]
pub enum ErrorKind {
    /// TypeError - wrong type for operation
    TypeError,
    /// ReferenceError - unresolvable identifier
    ReferenceError,
    /// RangeError - value out of range
    RangeError,
    /// SyntaxError - grammar violation (eval, Function, JSON.parse)
    SyntaxError,
    /// EvalError - reserved by the language, never raised by the engine
    EvalError,
    /// URIError - malformed URI
    UriError,
    /// Generic Error
    GenericError,
}

impl ErrorKind {
    /// Script-visible constructor name
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::UriError => "URIError",
            ErrorKind::GenericError => "Error",
        }
    }

    /// All kinds, in the order their constructors are installed
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::GenericError,
        ErrorKind::TypeError,
        ErrorKind::ReferenceError,
        ErrorKind::RangeError,
        ErrorKind::SyntaxError,
        ErrorKind::EvalError,
        ErrorKind::UriError,
    ];
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Error {
    /// Create a new parse error
    pub fn parse_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Error::ParseError {
            message: message.into(),
            location,
            incomplete: false,
            source_context: String::new(),
        }
    }

    /// Create a parse error with source context
    pub fn parse_error_with_context(
        message: impl Into<String>,
        location: SourceLocation,
        source: &str,
        incomplete: bool,
    ) -> Self {
        Error::ParseError {
            message: message.into(),
            source_context: format_error_context(source, &location),
            location,
            incomplete,
        }
    }

    /// Create a TypeError
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::runtime(ErrorKind::TypeError, message)
    }

    /// Create a ReferenceError
    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::runtime(ErrorKind::ReferenceError, message)
    }

    /// Create a RangeError
    pub fn range_error(message: impl Into<String>) -> Self {
        Self::runtime(ErrorKind::RangeError, message)
    }

    /// Create a SyntaxError raised at runtime (JSON.parse, eval)
    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::runtime(ErrorKind::SyntaxError, message)
    }

    /// Create a URIError
    pub fn uri_error(message: impl Into<String>) -> Self {
        Self::runtime(ErrorKind::UriError, message)
    }

    /// Create a runtime error of any kind
    pub fn runtime(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error::RuntimeError {
            kind,
            message: message.into(),
        }
    }

    /// Wrap a script value as a thrown exception
    pub fn exception(value: Value) -> Self {
        Error::Exception { value }
    }

    /// Whether the parser ran out of input rather than hitting a bad token
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Error::ParseError { incomplete: true, .. })
    }

    /// Whether script code may observe this error through `catch`
    pub fn is_catchable(&self) -> bool {
        matches!(
            self,
            Error::ParseError { .. } | Error::RuntimeError { .. } | Error::Exception { .. }
        )
    }

    /// The script-visible error kind, if this error has one
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::ParseError { .. } => Some(ErrorKind::SyntaxError),
            Error::RuntimeError { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Create an operation limit exceeded error
    pub fn operation_limit_exceeded(ops: u64, limit: u64) -> Self {
        Error::ResourceLimitError {
            kind: ResourceLimitKind::OperationLimit,
            message: format!(
                "Operation limit exceeded: {} operations executed, limit was {}",
                ops, limit
            ),
        }
    }

    /// Create an interrupted-by-host error
    pub fn interrupted(steps: u64) -> Self {
        Error::ResourceLimitError {
            kind: ResourceLimitKind::Interrupted,
            message: format!("Execution interrupted by host after {} steps", steps),
        }
    }
}

/// Result type alias for ecmawalk
pub type Result<T> = std::result::Result<T, Error>;

/// Standardized error message templates
pub mod messages {
    pub const NOT_A_FUNCTION: &str = "is not a function";
    pub const NOT_AN_OBJECT: &str = "is not an object";
    pub const NOT_A_CONSTRUCTOR: &str = "is not a constructor";
    pub const IS_NOT_DEFINED: &str = "is not defined";
    pub const INVALID_ARRAY_LENGTH: &str = "Invalid array length";
    pub const MAXIMUM_CALL_STACK: &str = "Maximum call stack size exceeded";
    pub const CYCLICAL_STRUCTURE: &str = "JSON.stringify: cyclical structure";
    pub const NESTING_TOO_DEEP: &str = "Maximum nesting depth exceeded";
    pub const STRING_TOO_LONG: &str = "Invalid string length";
    pub const TOO_MANY_ARGUMENTS: &str = "Too many arguments in function call";
    pub const UNEXPECTED_END: &str = "Unexpected end of input";

    /// Format a "X is not a function" error message
    pub fn not_a_function(name: &str) -> String {
        format!("{} {}", name, NOT_A_FUNCTION)
    }

    /// Format a "X is not an object" error message
    pub fn not_an_object(name: &str) -> String {
        format!("{} {}", name, NOT_AN_OBJECT)
    }

    /// Format a "X is not a constructor" error message
    pub fn not_a_constructor(name: &str) -> String {
        format!("{} {}", name, NOT_A_CONSTRUCTOR)
    }

    /// Format a "X is not defined" error message
    pub fn not_defined(name: &str) -> String {
        format!("{} {}", name, IS_NOT_DEFINED)
    }

    /// Format a "Cannot read property 'X' of Y" error message
    pub fn cannot_read_property(prop: &str, of: &str) -> String {
        format!("Cannot read property '{}' of {}", prop, of)
    }

    /// Format a "Cannot set property 'X' of Y" error message
    pub fn cannot_set_property(prop: &str, of: &str) -> String {
        format!("Cannot set property '{}' of {}", prop, of)
    }

    /// Format a "Cannot assign to read only property" message
    pub fn read_only(prop: &str) -> String {
        format!("Cannot assign to read only property '{}'", prop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_kind() {
        let err = Error::type_error("x is not a function");
        assert_eq!(err.to_string(), "TypeError: x is not a function");
        assert_eq!(err.kind(), Some(ErrorKind::TypeError));
    }

    #[test]
    fn test_incomplete_flag() {
        let loc = SourceLocation { line: 1, column: 5, offset: 4 };
        let err = Error::parse_error_with_context("Unexpected end of input", loc, "a = {", true);
        assert!(err.is_incomplete());
        assert!(!Error::parse_error("bad", loc).is_incomplete());
    }

    #[test]
    fn test_resource_limit_not_catchable() {
        assert!(!Error::operation_limit_exceeded(10, 5).is_catchable());
        assert!(Error::range_error("x").is_catchable());
    }

    #[test]
    fn test_format_error_context_points_at_column() {
        let loc = SourceLocation { line: 2, column: 3, offset: 0 };
        let ctx = format_error_context("var a;\nb +;\n", &loc);
        assert!(ctx.contains("b +;"));
        assert!(ctx.contains("  ^"));
    }
}
