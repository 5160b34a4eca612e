//! Declaration hoisting summary
//!
//! `var` names and function declarations are bound when their enclosing
//! program or function is entered, before any statement runs. The summary
//! is collected once per node and cached on it.

use super::*;

/// Declarations bound on entry to a program or function body
#[derive(Debug, Default)]
pub struct Hoisting {
    /// `var` names in first-declaration order, without duplicates
    pub var_names: Vec<JsString>,
    /// Function declarations in source order
    pub functions: Vec<FunctionRef>,
}

impl Hoisting {
    /// Walk a statement list without descending into nested functions
    pub fn collect(body: &[Statement]) -> Self {
        let mut hoisting = Hoisting::default();
        for stmt in body {
            hoisting.visit(stmt);
        }
        hoisting
    }

    fn add_var(&mut self, id: &Identifier) {
        if !self.var_names.contains(&id.key) {
            self.var_names.push(id.key.clone());
        }
    }

    fn visit(&mut self, stmt: &Statement) {
        match stmt {
            Statement::VariableDeclaration(decl) => {
                for d in &decl.declarations {
                    self.add_var(&d.id);
                }
            }
            Statement::FunctionDeclaration(func) => self.functions.push(func.clone()),
            Statement::Block(block) => block.body.iter().for_each(|s| self.visit(s)),
            Statement::If(stmt) => {
                self.visit(&stmt.consequent);
                if let Some(alt) = &stmt.alternate {
                    self.visit(alt);
                }
            }
            Statement::While(stmt) => self.visit(&stmt.body),
            Statement::DoWhile(stmt) => self.visit(&stmt.body),
            Statement::For(stmt) => {
                if let Some(ForInit::Declaration(decl)) = &stmt.init {
                    for d in &decl.declarations {
                        self.add_var(&d.id);
                    }
                }
                self.visit(&stmt.body);
            }
            Statement::ForIn(stmt) => {
                if let ForInLeft::Declaration(d) = &stmt.left {
                    self.add_var(&d.id);
                }
                self.visit(&stmt.body);
            }
            Statement::Switch(stmt) => {
                for case in &stmt.cases {
                    case.consequent.iter().for_each(|s| self.visit(s));
                }
            }
            Statement::Try(stmt) => {
                stmt.block.body.iter().for_each(|s| self.visit(s));
                if let Some(handler) = &stmt.handler {
                    handler.body.body.iter().for_each(|s| self.visit(s));
                }
                if let Some(finalizer) = &stmt.finalizer {
                    finalizer.body.iter().for_each(|s| self.visit(s));
                }
            }
            Statement::Labeled(stmt) => self.visit(&stmt.body),
            Statement::With(stmt) => self.visit(&stmt.body),
            Statement::Empty(_)
            | Statement::Expression(_)
            | Statement::Break(_)
            | Statement::Continue(_)
            | Statement::Return(_)
            | Statement::Throw(_)
            | Statement::Debugger(_) => {}
        }
    }
}
