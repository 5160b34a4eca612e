//! Abstract Syntax Tree (AST) types for JavaScript
//!
//! This module defines the AST node types produced by the parser and walked
//! directly by the interpreter. The tree is read-only once built; the only
//! mutable state is the lazily computed hoisting summary cached on programs
//! and function nodes.

mod expr;
mod hoist;
mod stmt;

pub use expr::*;
pub use hoist::Hoisting;
pub use stmt::*;

use crate::error::SourceLocation;
use crate::runtime::JsString;
use std::cell::OnceCell;
use std::rc::Rc;

/// A span in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start location
    pub start: SourceLocation,
    /// End location
    pub end: SourceLocation,
}

impl Span {
    /// Create a new span
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Merge two spans into one covering both
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: if self.start.offset < other.start.offset {
                self.start
            } else {
                other.start
            },
            end: if self.end.offset > other.end.offset {
                self.end
            } else {
                other.end
            },
        }
    }
}

/// A complete JavaScript program
#[derive(Debug)]
pub struct Program {
    /// The statements in the program
    pub body: Vec<Statement>,
    /// Whether this program starts with a "use strict" directive
    pub strict: bool,
    /// Span in source
    pub span: Span,
    hoisting: OnceCell<Hoisting>,
}

impl Program {
    /// Create a program node
    pub fn new(body: Vec<Statement>, strict: bool, span: Span) -> Self {
        Self {
            body,
            strict,
            span,
            hoisting: OnceCell::new(),
        }
    }

    /// Declarations hoisted to the top of the program, computed once
    pub fn hoisting(&self) -> &Hoisting {
        self.hoisting.get_or_init(|| Hoisting::collect(&self.body))
    }
}

/// A JavaScript identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// The name of the identifier
    pub name: String,
    /// The name as a property key, used for scope record lookups
    pub key: JsString,
    /// Span in source
    pub span: Span,
}

impl Identifier {
    /// Create a new identifier
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        let name = name.into();
        Self {
            key: JsString::from(name.as_str()),
            name,
            span,
        }
    }
}

/// A single variable declarator (id = init)
#[derive(Debug, Clone)]
pub struct VariableDeclarator {
    /// The bound name
    pub id: Identifier,
    /// Optional initializer expression
    pub init: Option<Box<Expression>>,
    /// Span in source
    pub span: Span,
}

/// A `var` declaration (var x = 1, y = 2)
#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    /// The declarators
    pub declarations: Vec<VariableDeclarator>,
    /// Span in source
    pub span: Span,
}

/// A function declaration or expression
///
/// Shared by reference between the tree and every closure created from it.
#[derive(Debug)]
pub struct FunctionNode {
    /// Optional function name
    pub id: Option<Identifier>,
    /// Formal parameter names
    pub params: Vec<Identifier>,
    /// Function body
    pub body: Vec<Statement>,
    /// Whether the body (or an enclosing scope) is strict
    pub strict: bool,
    /// Original source text, returned by `Function.prototype.toString`
    pub source_text: String,
    /// Span in source
    pub span: Span,
    hoisting: OnceCell<Hoisting>,
}

impl FunctionNode {
    /// Create a function node
    pub fn new(
        id: Option<Identifier>,
        params: Vec<Identifier>,
        body: Vec<Statement>,
        strict: bool,
        source_text: String,
        span: Span,
    ) -> Self {
        Self {
            id,
            params,
            body,
            strict,
            source_text,
            span,
            hoisting: OnceCell::new(),
        }
    }

    /// Declarations hoisted to the top of the function body, computed once
    pub fn hoisting(&self) -> &Hoisting {
        self.hoisting.get_or_init(|| Hoisting::collect(&self.body))
    }

    /// The function's name, or the empty string
    pub fn name(&self) -> &str {
        self.id.as_ref().map(|id| id.name.as_str()).unwrap_or("")
    }
}

/// Property name in object literals
#[derive(Debug, Clone)]
pub enum PropertyName {
    /// Identifier key {a: 1}
    Identifier(Identifier),
    /// String literal key {"a": 1}
    String(JsString),
    /// Number literal key {1: 1}
    Number(f64),
}

/// Switch case
#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// Test expression (None for default)
    pub test: Option<Expression>,
    /// Consequent statements
    pub consequent: Vec<Statement>,
    /// Span in source
    pub span: Span,
}

/// Catch clause
#[derive(Debug, Clone)]
pub struct CatchClause {
    /// Catch parameter
    pub param: Identifier,
    /// Catch body
    pub body: BlockStatement,
    /// Span in source
    pub span: Span,
}

/// Shared handle to a function node
pub type FunctionRef = Rc<FunctionNode>;
