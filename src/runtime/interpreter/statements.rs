//! Statement execution

use super::{Completion, CompletionKind, Context, Interpreter, Scope, ScopeKind};
use crate::ast::*;
use crate::error::{Error, Result};
use crate::runtime::{Object, ObjectKind, Property, PropertyFlags, Value};

impl Interpreter {
    /// Execute a statement list; the first abrupt completion ends it
    pub(crate) fn exec_statements(&mut self, stmts: &[Statement], ctx: &Context) -> Result<Completion> {
        let mut last: Option<Value> = None;
        for stmt in stmts {
            let completion = self.exec_statement(stmt, ctx)?;
            if !completion.is_normal() {
                return Ok(completion.or_value(&last));
            }
            if completion.value.is_some() {
                last = completion.value;
            }
        }
        Ok(Completion {
            kind: CompletionKind::Normal,
            value: last,
        })
    }

    /// Execute one statement
    pub(crate) fn exec_statement(&mut self, stmt: &Statement, ctx: &Context) -> Result<Completion> {
        self.tick()?;
        crate::stack::guard(|| self.exec_labelled(stmt, ctx, &[]))
    }

    /// Execute a statement carrying the labels of enclosing label statements
    fn exec_labelled(&mut self, stmt: &Statement, ctx: &Context, labels: &[String]) -> Result<Completion> {
        match stmt {
            Statement::Block(block) => self.exec_statements(&block.body, ctx),
            Statement::Empty(_) | Statement::Debugger(_) | Statement::FunctionDeclaration(_) => {
                Ok(Completion::empty())
            }
            Statement::Expression(stmt) => {
                Ok(Completion::normal(self.eval_expression(&stmt.expression, ctx)?))
            }
            Statement::VariableDeclaration(decl) => {
                self.exec_var_declaration(decl, ctx)?;
                Ok(Completion::empty())
            }
            Statement::If(stmt) => self.exec_if(stmt, ctx),
            Statement::While(stmt) => self.exec_while(stmt, ctx, labels),
            Statement::DoWhile(stmt) => self.exec_do_while(stmt, ctx, labels),
            Statement::For(stmt) => self.exec_for(stmt, ctx, labels),
            Statement::ForIn(stmt) => self.exec_for_in(stmt, ctx, labels),
            Statement::Switch(stmt) => self.exec_switch(stmt, ctx, labels),
            Statement::Break(stmt) => Ok(Completion {
                kind: CompletionKind::Break(stmt.label.as_ref().map(|l| l.name.clone())),
                value: None,
            }),
            Statement::Continue(stmt) => Ok(Completion {
                kind: CompletionKind::Continue(stmt.label.as_ref().map(|l| l.name.clone())),
                value: None,
            }),
            Statement::Return(stmt) => {
                let value = match &stmt.argument {
                    Some(arg) => self.eval_expression(arg, ctx)?,
                    None => Value::Undefined,
                };
                Ok(Completion::returned(value))
            }
            Statement::Throw(stmt) => {
                let value = self.eval_expression(&stmt.argument, ctx)?;
                Err(Error::exception(value))
            }
            Statement::Try(stmt) => self.exec_try(stmt, ctx),
            Statement::Labeled(stmt) => {
                let mut set = labels.to_vec();
                set.push(stmt.label.name.clone());
                let completion = self.exec_labelled(&stmt.body, ctx, &set)?;
                match &completion.kind {
                    CompletionKind::Break(Some(l)) if *l == stmt.label.name => Ok(Completion {
                        kind: CompletionKind::Normal,
                        value: completion.value,
                    }),
                    _ => Ok(completion),
                }
            }
            Statement::With(stmt) => {
                let value = self.eval_expression(&stmt.object, ctx)?;
                let obj = self.to_object(&value)?;
                let with_ctx = Context {
                    scope: Scope::child(&ctx.scope, obj, ScopeKind::With),
                    ..ctx.clone()
                };
                self.exec_statement(&stmt.body, &with_ctx)
            }
        }
    }

    fn exec_var_declaration(&mut self, decl: &VariableDeclaration, ctx: &Context) -> Result<()> {
        for d in &decl.declarations {
            if let Some(init) = &d.init {
                let value = self.eval_expression(init, ctx)?;
                self.assign_identifier(&d.id, value, ctx)?;
            }
        }
        Ok(())
    }

    fn exec_if(&mut self, stmt: &IfStatement, ctx: &Context) -> Result<Completion> {
        let test = self.eval_expression(&stmt.test, ctx)?;
        if test.to_boolean() {
            self.exec_statement(&stmt.consequent, ctx)
        } else if let Some(alt) = &stmt.alternate {
            self.exec_statement(alt, ctx)
        } else {
            Ok(Completion::empty())
        }
    }

    /// Shared loop-body bookkeeping: `Some` ends the loop with that completion
    fn loop_body(completion: Completion, value: &mut Option<Value>, labels: &[String]) -> Option<Completion> {
        if completion.value.is_some() {
            *value = completion.value.clone();
        }
        if completion.continues(labels) || completion.is_normal() {
            return None;
        }
        if completion.breaks(labels) {
            return Some(Completion {
                kind: CompletionKind::Normal,
                value: value.clone(),
            });
        }
        Some(completion.or_value(value))
    }

    fn exec_while(&mut self, stmt: &WhileStatement, ctx: &Context, labels: &[String]) -> Result<Completion> {
        let mut value = None;
        loop {
            if !self.eval_expression(&stmt.test, ctx)?.to_boolean() {
                break;
            }
            let completion = self.exec_statement(&stmt.body, ctx)?;
            if let Some(done) = Self::loop_body(completion, &mut value, labels) {
                return Ok(done);
            }
        }
        Ok(Completion {
            kind: CompletionKind::Normal,
            value,
        })
    }

    fn exec_do_while(&mut self, stmt: &DoWhileStatement, ctx: &Context, labels: &[String]) -> Result<Completion> {
        let mut value = None;
        loop {
            let completion = self.exec_statement(&stmt.body, ctx)?;
            if let Some(done) = Self::loop_body(completion, &mut value, labels) {
                return Ok(done);
            }
            if !self.eval_expression(&stmt.test, ctx)?.to_boolean() {
                break;
            }
        }
        Ok(Completion {
            kind: CompletionKind::Normal,
            value,
        })
    }

    fn exec_for(&mut self, stmt: &ForStatement, ctx: &Context, labels: &[String]) -> Result<Completion> {
        match &stmt.init {
            Some(ForInit::Declaration(decl)) => self.exec_var_declaration(decl, ctx)?,
            Some(ForInit::Expression(expr)) => {
                self.eval_expression(expr, ctx)?;
            }
            None => {}
        }
        let mut value = None;
        loop {
            if let Some(test) = &stmt.test {
                if !self.eval_expression(test, ctx)?.to_boolean() {
                    break;
                }
            }
            let completion = self.exec_statement(&stmt.body, ctx)?;
            if let Some(done) = Self::loop_body(completion, &mut value, labels) {
                return Ok(done);
            }
            if let Some(update) = &stmt.update {
                self.eval_expression(update, ctx)?;
            }
        }
        Ok(Completion {
            kind: CompletionKind::Normal,
            value,
        })
    }

    fn exec_for_in(&mut self, stmt: &ForInStatement, ctx: &Context, labels: &[String]) -> Result<Completion> {
        if let ForInLeft::Declaration(d) = &stmt.left {
            if let Some(init) = &d.init {
                let v = self.eval_expression(init, ctx)?;
                self.assign_identifier(&d.id, v, ctx)?;
            }
        }
        let subject = self.eval_expression(&stmt.right, ctx)?;
        if subject.is_nullish() {
            return Ok(Completion::empty());
        }
        let obj = self.to_object(&subject)?;
        let mut value = None;
        for key in self.for_in_keys(&obj) {
            // Keys deleted before being reached are skipped
            if !self.has_property(&obj, &key) {
                continue;
            }
            let name = Value::String(key.to_js_string());
            match &stmt.left {
                ForInLeft::Declaration(d) => self.assign_identifier(&d.id, name, ctx)?,
                ForInLeft::Expression(target) => self.assign_to(target, name, ctx)?,
            }
            let completion = self.exec_statement(&stmt.body, ctx)?;
            if let Some(done) = Self::loop_body(completion, &mut value, labels) {
                return Ok(done);
            }
        }
        Ok(Completion {
            kind: CompletionKind::Normal,
            value,
        })
    }

    fn exec_switch(&mut self, stmt: &SwitchStatement, ctx: &Context, labels: &[String]) -> Result<Completion> {
        let discriminant = self.eval_expression(&stmt.discriminant, ctx)?;

        let mut start = None;
        for (i, case) in stmt.cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let candidate = self.eval_expression(test, ctx)?;
                if candidate.strict_equals(&discriminant) {
                    start = Some(i);
                    break;
                }
            }
        }
        let start = start.or_else(|| stmt.cases.iter().position(|c| c.test.is_none()));
        let Some(start) = start else {
            return Ok(Completion::empty());
        };

        let mut value = None;
        for case in &stmt.cases[start..] {
            let completion = self.exec_statements(&case.consequent, ctx)?;
            if completion.value.is_some() {
                value = completion.value.clone();
            }
            if completion.breaks(labels) {
                return Ok(Completion {
                    kind: CompletionKind::Normal,
                    value,
                });
            }
            if !completion.is_normal() {
                return Ok(completion.or_value(&value));
            }
        }
        Ok(Completion {
            kind: CompletionKind::Normal,
            value,
        })
    }

    fn exec_try(&mut self, stmt: &TryStatement, ctx: &Context) -> Result<Completion> {
        let mut result = self.exec_statements(&stmt.block.body, ctx);

        if let Some(handler) = &stmt.handler {
            if let Err(err) = result {
                result = if err.is_catchable() {
                    let thrown = self.error_to_value(err)?;
                    let record = self.alloc(Object::new(ObjectKind::Ordinary, None));
                    record.borrow_mut().insert_property(
                        handler.param.key.clone(),
                        Property::data(thrown, PropertyFlags::WRITABLE | PropertyFlags::ENUMERABLE),
                    );
                    let catch_ctx = Context {
                        scope: Scope::child(&ctx.scope, record, ScopeKind::Catch),
                        ..ctx.clone()
                    };
                    self.exec_statements(&handler.body.body, &catch_ctx)
                } else {
                    Err(err)
                };
            }
        }

        if let Some(finalizer) = &stmt.finalizer {
            if matches!(&result, Err(e) if !e.is_catchable()) {
                return result;
            }
            let completion = self.exec_statements(&finalizer.body, ctx)?;
            if !completion.is_normal() {
                return Ok(completion);
            }
        }
        result
    }
}
