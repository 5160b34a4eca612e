//! JavaScript parser
//!
//! A recursive descent parser for the ECMAScript 5 grammar. It produces the
//! read-only syntax tree the interpreter walks. Every error raised while the
//! current token is end-of-input is flagged as *incomplete*, which lets the
//! REPL ask for a continuation line instead of reporting a syntax error.

use crate::ast::*;
use crate::error::{messages, Error, Result, SourceLocation};
use crate::lexer::{is_line_terminator, Keyword, Lexer, Token, TokenKind};
use crate::runtime::JsString;
use crate::stack::MAX_PARSE_DEPTH;
use std::rc::Rc;

/// Parser state flags
#[derive(Debug, Clone, Copy, Default)]
struct ParserFlags {
    /// Inside a function (or a body where `return` is allowed)
    in_function: bool,
    /// Inside a loop (for, while, etc.)
    in_loop: bool,
    /// Inside a switch statement
    in_switch: bool,
    /// Parsing strict mode code
    strict: bool,
}

/// A label in scope, and whether it names an iteration statement
#[derive(Debug, Clone)]
struct Label {
    name: String,
    is_loop: bool,
}

/// A recursive descent parser for JavaScript
pub struct Parser<'src> {
    /// Source code (kept for error messages and function source text)
    source: &'src str,
    /// Tokens to parse
    tokens: Vec<Token<'src>>,
    /// Current position in tokens
    pos: usize,
    /// Parser state flags
    flags: ParserFlags,
    /// Labels enclosing the current statement, innermost last
    labels: Vec<Label>,
    /// Nested productions currently being parsed
    depth: usize,
}

impl<'src> Parser<'src> {
    /// Create a new parser from source code
    pub fn new(source: &'src str) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
            flags: ParserFlags::default(),
            labels: Vec::new(),
            depth: 0,
        })
    }

    /// Treat the whole input as strict mode code
    pub fn set_strict(&mut self, strict: bool) {
        self.flags.strict = strict;
    }

    /// Allow `return` at the top level, as in a function body
    pub fn set_in_function(&mut self, in_function: bool) {
        self.flags.in_function = in_function;
    }

    /// Parse the source as a complete program
    pub fn parse_program(&mut self) -> Result<Program> {
        let start = self.location();
        let mut body = self.parse_directive_prologue()?;

        while !self.is_eof() {
            body.push(self.parse_statement()?);
        }

        let end = self.location();
        Ok(Program::new(body, self.flags.strict, Span::new(start, end)))
    }

    /// Parse a single expression
    pub fn parse_expression(&mut self) -> Result<Expression> {
        let expr = self.parse_sequence_expression_impl(true)?;
        Ok(expr)
    }

    /// Parse leading directives, switching to strict mode on "use strict"
    fn parse_directive_prologue(&mut self) -> Result<Vec<Statement>> {
        let mut body = Vec::new();
        while self.peek() == TokenKind::StringLiteral {
            let is_use_strict = self.check_use_strict_directive();
            let stmt = self.parse_statement()?;
            let is_directive = matches!(
                &stmt,
                Statement::Expression(ExpressionStatement {
                    expression: Expression::Literal(_),
                    ..
                })
            );
            body.push(stmt);
            if !is_directive {
                break;
            }
            if is_use_strict {
                self.flags.strict = true;
            }
        }
        Ok(body)
    }

    /// Check if the current position has a "use strict" directive
    fn check_use_strict_directive(&self) -> bool {
        let token = self.current();
        if token.kind == TokenKind::StringLiteral {
            // token.text includes the quotes, so check for both single and double quoted versions
            let text = token.text;
            text == "\"use strict\"" || text == "'use strict'"
        } else {
            false
        }
    }

    // ========== Token Access ==========

    fn current(&self) -> &Token<'src> {
        &self.tokens[self.pos]
    }

    fn peek(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    fn peek_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn is_eof(&self) -> bool {
        self.peek() == TokenKind::Eof
    }

    fn location(&self) -> SourceLocation {
        self.current().location
    }

    /// End offset of the most recently consumed token
    fn previous_end(&self) -> usize {
        if self.pos == 0 {
            return 0;
        }
        let prev = &self.tokens[self.pos - 1];
        prev.location.offset + prev.text.len()
    }

    /// Create a parse error with source context
    ///
    /// Errors raised at end of input are marked incomplete.
    fn error(&self, message: impl Into<String>, location: SourceLocation) -> Error {
        Error::parse_error_with_context(message, location, self.source, self.is_eof())
    }

    fn unexpected(&self) -> Error {
        let loc = self.location();
        if self.is_eof() {
            self.error(messages::UNEXPECTED_END, loc)
        } else {
            self.error(format!("Unexpected token {}", self.current().text), loc)
        }
    }

    fn advance(&mut self) -> &Token<'src> {
        let token = &self.tokens[self.pos];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token<'src>> {
        if self.peek() == kind {
            Ok(self.advance())
        } else {
            let loc = self.location();
            Err(self.error(
                format!("Expected {}, found {}", kind.describe(), self.peek().describe()),
                loc,
            ))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<&Token<'src>> {
        self.expect(TokenKind::Keyword(keyword))
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Whether a statement may end here through automatic semicolon insertion
    fn can_insert_semicolon(&self) -> bool {
        matches!(self.peek(), TokenKind::RightBrace | TokenKind::Eof) || self.current().newline_before
    }

    fn consume_semicolon(&mut self) -> Result<()> {
        if self.consume(TokenKind::Semicolon) || self.can_insert_semicolon() {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    // ========== Statements ==========

    /// Parse one nested production, bounding recursion depth
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        crate::stack::enter(&mut self.depth, MAX_PARSE_DEPTH)?;
        let result = crate::stack::guard(|| parse(self));
        self.depth -= 1;
        result
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        self.nested(Self::parse_statement_unguarded)
    }

    fn parse_statement_unguarded(&mut self) -> Result<Statement> {
        match self.peek() {
            TokenKind::LeftBrace => self.parse_block_statement().map(Statement::Block),
            TokenKind::Semicolon => {
                let loc = self.location();
                self.advance();
                Ok(Statement::Empty(Span::new(loc, self.location())))
            }
            TokenKind::Keyword(Keyword::Var) => {
                let decl = self.parse_variable_declaration(true)?;
                self.consume_semicolon()?;
                Ok(Statement::VariableDeclaration(decl))
            }
            TokenKind::Keyword(Keyword::Function) => self.parse_function_declaration(),
            TokenKind::Keyword(Keyword::If) => self.parse_if_statement(),
            TokenKind::Keyword(Keyword::While) => self.parse_while_statement(),
            TokenKind::Keyword(Keyword::Do) => self.parse_do_while_statement(),
            TokenKind::Keyword(Keyword::For) => self.parse_for_statement(),
            TokenKind::Keyword(Keyword::Switch) => self.parse_switch_statement(),
            TokenKind::Keyword(Keyword::Break) => self.parse_break_statement(),
            TokenKind::Keyword(Keyword::Continue) => self.parse_continue_statement(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return_statement(),
            TokenKind::Keyword(Keyword::Throw) => self.parse_throw_statement(),
            TokenKind::Keyword(Keyword::Try) => self.parse_try_statement(),
            TokenKind::Keyword(Keyword::With) => self.parse_with_statement(),
            TokenKind::Keyword(Keyword::Debugger) => {
                let start = self.location();
                self.advance();
                self.consume_semicolon()?;
                Ok(Statement::Debugger(Span::new(start, self.location())))
            }
            TokenKind::Identifier | TokenKind::Keyword(Keyword::Get | Keyword::Set)
                if self.peek_at(1) == TokenKind::Colon =>
            {
                self.parse_labeled_statement()
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_block_statement(&mut self) -> Result<BlockStatement> {
        let start = self.location();
        self.expect(TokenKind::LeftBrace)?;

        let mut body = Vec::new();
        while !self.consume(TokenKind::RightBrace) {
            if self.is_eof() {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement()?);
        }

        Ok(BlockStatement {
            body,
            span: Span::new(start, self.location()),
        })
    }

    /// Parse `var a = 1, b`; `allow_in` is false inside a for-loop head
    fn parse_variable_declaration(&mut self, allow_in: bool) -> Result<VariableDeclaration> {
        let start = self.location();
        self.expect_keyword(Keyword::Var)?;

        let mut declarations = Vec::new();
        loop {
            declarations.push(self.parse_variable_declarator(allow_in)?);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }

        Ok(VariableDeclaration {
            declarations,
            span: Span::new(start, self.location()),
        })
    }

    fn parse_variable_declarator(&mut self, allow_in: bool) -> Result<VariableDeclarator> {
        let start = self.location();
        let id = self.parse_binding_identifier()?;

        let init = if self.consume(TokenKind::Equals) {
            Some(Box::new(self.parse_assignment_expression_impl(allow_in)?))
        } else {
            None
        };

        Ok(VariableDeclarator {
            id,
            init,
            span: Span::new(start, self.location()),
        })
    }

    fn parse_function_declaration(&mut self) -> Result<Statement> {
        let func = self.parse_function(true)?;
        Ok(Statement::FunctionDeclaration(func))
    }

    /// Parse `function name(params) { body }`
    fn parse_function(&mut self, require_name: bool) -> Result<FunctionRef> {
        let start = self.location();
        self.expect_keyword(Keyword::Function)?;

        let id = if self.is_identifier_token() {
            Some(self.parse_binding_identifier()?)
        } else if require_name {
            let loc = self.location();
            return Err(self.error("Function statement requires a name", loc));
        } else {
            None
        };

        self.parse_function_rest(id, start)
    }

    /// Parse the parameter list and body of a function whose head was consumed
    fn parse_function_rest(
        &mut self,
        id: Option<Identifier>,
        start: SourceLocation,
    ) -> Result<FunctionRef> {
        self.expect(TokenKind::LeftParen)?;
        let params = self.parse_function_params()?;
        self.expect(TokenKind::RightParen)?;

        let old_flags = self.flags;
        let old_labels = std::mem::take(&mut self.labels);
        self.flags.in_function = true;
        self.flags.in_loop = false;
        self.flags.in_switch = false;

        self.expect(TokenKind::LeftBrace)?;
        let mut body = self.parse_directive_prologue()?;
        while !self.consume(TokenKind::RightBrace) {
            if self.is_eof() {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement()?);
        }

        let strict = self.flags.strict;
        self.flags = old_flags;
        self.labels = old_labels;

        if strict {
            self.check_duplicate_params(&params, start)?;
        }

        let end = self.previous_end();
        let source_text = self.source[start.offset..end].to_string();
        Ok(Rc::new(FunctionNode::new(
            id,
            params,
            body,
            strict,
            source_text,
            Span::new(start, self.location()),
        )))
    }

    fn parse_function_params(&mut self) -> Result<Vec<Identifier>> {
        let mut params = Vec::new();

        while self.peek() != TokenKind::RightParen {
            params.push(self.parse_binding_identifier()?);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    /// Check for duplicate parameter names in strict mode
    fn check_duplicate_params(&self, params: &[Identifier], start_loc: SourceLocation) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for param in params {
            if !seen.insert(param.name.as_str()) {
                return Err(self.error(
                    format!(
                        "Duplicate parameter name '{}' not allowed in strict mode",
                        param.name
                    ),
                    start_loc,
                ));
            }
        }
        Ok(())
    }

    fn parse_if_statement(&mut self) -> Result<Statement> {
        let start = self.location();
        self.expect_keyword(Keyword::If)?;
        self.expect(TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;

        let consequent = self.parse_statement()?;

        let alternate = if self.consume(TokenKind::Keyword(Keyword::Else)) {
            Some(self.parse_statement()?)
        } else {
            None
        };

        Ok(Statement::If(Box::new(IfStatement {
            test,
            consequent,
            alternate,
            span: Span::new(start, self.location()),
        })))
    }

    /// Parse a loop body with break/continue enabled
    fn parse_loop_body(&mut self) -> Result<Statement> {
        let old_in_loop = self.flags.in_loop;
        self.flags.in_loop = true;
        let body = self.parse_statement();
        self.flags.in_loop = old_in_loop;
        body
    }

    fn parse_while_statement(&mut self) -> Result<Statement> {
        let start = self.location();
        self.expect_keyword(Keyword::While)?;
        self.expect(TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;

        let body = self.parse_loop_body()?;

        Ok(Statement::While(Box::new(WhileStatement {
            test,
            body,
            span: Span::new(start, self.location()),
        })))
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement> {
        let start = self.location();
        self.expect_keyword(Keyword::Do)?;

        let body = self.parse_loop_body()?;

        self.expect_keyword(Keyword::While)?;
        self.expect(TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        // A semicolon is always insertable after do-while
        self.consume(TokenKind::Semicolon);

        Ok(Statement::DoWhile(Box::new(DoWhileStatement {
            body,
            test,
            span: Span::new(start, self.location()),
        })))
    }

    fn parse_for_statement(&mut self) -> Result<Statement> {
        let start = self.location();
        self.expect_keyword(Keyword::For)?;
        self.expect(TokenKind::LeftParen)?;

        let init = match self.peek() {
            TokenKind::Semicolon => None,
            TokenKind::Keyword(Keyword::Var) => {
                Some(ForInit::Declaration(self.parse_variable_declaration(false)?))
            }
            _ => Some(ForInit::Expression(self.parse_sequence_expression_impl(false)?)),
        };

        if self.consume(TokenKind::Keyword(Keyword::In)) {
            let left = match init {
                Some(ForInit::Declaration(mut decl)) if decl.declarations.len() == 1 => {
                    ForInLeft::Declaration(decl.declarations.remove(0))
                }
                Some(ForInit::Expression(expr)) if expr.is_valid_assignment_target() => {
                    ForInLeft::Expression(expr)
                }
                _ => {
                    return Err(self.error("Invalid left-hand side in for-in", start));
                }
            };

            let right = self.parse_expression()?;
            self.expect(TokenKind::RightParen)?;
            let body = self.parse_loop_body()?;

            return Ok(Statement::ForIn(Box::new(ForInStatement {
                left,
                right,
                body,
                span: Span::new(start, self.location()),
            })));
        }

        self.expect(TokenKind::Semicolon)?;

        let test = if self.peek() != TokenKind::Semicolon {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;

        let update = if self.peek() != TokenKind::RightParen {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenKind::RightParen)?;

        let body = self.parse_loop_body()?;

        Ok(Statement::For(Box::new(ForStatement {
            init,
            test,
            update,
            body,
            span: Span::new(start, self.location()),
        })))
    }

    fn parse_switch_statement(&mut self) -> Result<Statement> {
        let start = self.location();
        self.expect_keyword(Keyword::Switch)?;
        self.expect(TokenKind::LeftParen)?;
        let discriminant = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;

        self.expect(TokenKind::LeftBrace)?;

        let old_in_switch = self.flags.in_switch;
        self.flags.in_switch = true;

        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.consume(TokenKind::RightBrace) {
            let case = self.parse_switch_case()?;
            if case.test.is_none() {
                if seen_default {
                    return Err(self.error("More than one default clause in switch statement", case.span.start));
                }
                seen_default = true;
            }
            cases.push(case);
        }

        self.flags.in_switch = old_in_switch;

        Ok(Statement::Switch(Box::new(SwitchStatement {
            discriminant,
            cases,
            span: Span::new(start, self.location()),
        })))
    }

    fn parse_switch_case(&mut self) -> Result<SwitchCase> {
        let start = self.location();

        let test = if self.consume(TokenKind::Keyword(Keyword::Case)) {
            Some(self.parse_expression()?)
        } else {
            self.expect_keyword(Keyword::Default)?;
            None
        };

        self.expect(TokenKind::Colon)?;

        let mut consequent = Vec::new();
        while !matches!(
            self.peek(),
            TokenKind::Keyword(Keyword::Case)
                | TokenKind::Keyword(Keyword::Default)
                | TokenKind::RightBrace
        ) {
            if self.is_eof() {
                return Err(self.unexpected());
            }
            consequent.push(self.parse_statement()?);
        }

        Ok(SwitchCase {
            test,
            consequent,
            span: Span::new(start, self.location()),
        })
    }

    /// Parse the optional label of `break`/`continue` (no line break allowed before it)
    fn parse_jump_label(&mut self) -> Result<Option<Identifier>> {
        if self.is_identifier_token() && !self.current().newline_before {
            Ok(Some(self.parse_identifier()?))
        } else {
            Ok(None)
        }
    }

    fn parse_break_statement(&mut self) -> Result<Statement> {
        let start = self.location();
        self.expect_keyword(Keyword::Break)?;

        let label = self.parse_jump_label()?;
        self.consume_semicolon()?;

        match &label {
            Some(id) => {
                if !self.labels.iter().any(|l| l.name == id.name) {
                    return Err(self.error(format!("Undefined label '{}'", id.name), start));
                }
            }
            None => {
                if !self.flags.in_loop && !self.flags.in_switch {
                    return Err(self.error("Illegal break statement", start));
                }
            }
        }

        Ok(Statement::Break(BreakStatement {
            label,
            span: Span::new(start, self.location()),
        }))
    }

    fn parse_continue_statement(&mut self) -> Result<Statement> {
        let start = self.location();
        self.expect_keyword(Keyword::Continue)?;

        let label = self.parse_jump_label()?;
        self.consume_semicolon()?;

        if !self.flags.in_loop {
            return Err(self.error("Illegal continue statement", start));
        }
        if let Some(id) = &label {
            if !self.labels.iter().any(|l| l.name == id.name && l.is_loop) {
                return Err(self.error(format!("Undefined label '{}'", id.name), start));
            }
        }

        Ok(Statement::Continue(ContinueStatement {
            label,
            span: Span::new(start, self.location()),
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement> {
        let start = self.location();
        self.expect_keyword(Keyword::Return)?;

        if !self.flags.in_function {
            return Err(self.error("Illegal return statement", start));
        }

        // Restricted production: a line break ends the statement
        let argument = if self.peek() == TokenKind::Semicolon || self.can_insert_semicolon() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;

        Ok(Statement::Return(ReturnStatement {
            argument,
            span: Span::new(start, self.location()),
        }))
    }

    fn parse_throw_statement(&mut self) -> Result<Statement> {
        let start = self.location();
        self.expect_keyword(Keyword::Throw)?;

        if self.current().newline_before {
            return Err(self.error("Illegal newline after throw", start));
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;

        Ok(Statement::Throw(Box::new(ThrowStatement {
            argument,
            span: Span::new(start, self.location()),
        })))
    }

    fn parse_try_statement(&mut self) -> Result<Statement> {
        let start = self.location();
        self.expect_keyword(Keyword::Try)?;

        let block = self.parse_block_statement()?;

        let handler = if self.consume(TokenKind::Keyword(Keyword::Catch)) {
            let catch_start = self.location();
            self.expect(TokenKind::LeftParen)?;
            let param = self.parse_binding_identifier()?;
            self.expect(TokenKind::RightParen)?;
            let body = self.parse_block_statement()?;

            Some(CatchClause {
                param,
                body,
                span: Span::new(catch_start, self.location()),
            })
        } else {
            None
        };

        let finalizer = if self.consume(TokenKind::Keyword(Keyword::Finally)) {
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try", start));
        }

        Ok(Statement::Try(Box::new(TryStatement {
            block,
            handler,
            finalizer,
            span: Span::new(start, self.location()),
        })))
    }

    fn parse_with_statement(&mut self) -> Result<Statement> {
        let start = self.location();
        self.expect_keyword(Keyword::With)?;

        if self.flags.strict {
            return Err(self.error("Strict mode code may not include a with statement", start));
        }

        self.expect(TokenKind::LeftParen)?;
        let object = self.parse_expression()?;
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_statement()?;

        Ok(Statement::With(Box::new(WithStatement {
            object,
            body,
            span: Span::new(start, self.location()),
        })))
    }

    fn parse_labeled_statement(&mut self) -> Result<Statement> {
        let start = self.location();
        let label = self.parse_identifier()?;
        self.expect(TokenKind::Colon)?;

        if self.labels.iter().any(|l| l.name == label.name) {
            return Err(self.error(
                format!("Label '{}' has already been declared", label.name),
                start,
            ));
        }

        let is_loop = matches!(
            self.peek(),
            TokenKind::Keyword(Keyword::For | Keyword::While | Keyword::Do)
        );
        // Chained labels (a: b: while ...) all name the same loop
        let is_loop = is_loop || {
            let mut offset = 0;
            while matches!(self.peek_at(offset), TokenKind::Identifier)
                && self.peek_at(offset + 1) == TokenKind::Colon
            {
                offset += 2;
            }
            offset > 0
                && matches!(
                    self.peek_at(offset),
                    TokenKind::Keyword(Keyword::For | Keyword::While | Keyword::Do)
                )
        };

        self.labels.push(Label {
            name: label.name.clone(),
            is_loop,
        });
        let body = self.parse_statement();
        self.labels.pop();
        let body = body?;

        Ok(Statement::Labeled(Box::new(LabeledStatement {
            label,
            body,
            span: Span::new(start, self.location()),
        })))
    }

    fn parse_expression_statement(&mut self) -> Result<Statement> {
        let start = self.location();
        if let TokenKind::Keyword(kw) = self.peek() {
            if matches!(
                kw,
                Keyword::Class
                    | Keyword::Const
                    | Keyword::Enum
                    | Keyword::Export
                    | Keyword::Extends
                    | Keyword::Import
                    | Keyword::Super
            ) {
                return Err(self.error(format!("Unexpected reserved word '{}'", kw), start));
            }
        }

        let expression = self.parse_expression()?;
        self.consume_semicolon()?;

        Ok(Statement::Expression(ExpressionStatement {
            expression,
            span: Span::new(start, self.location()),
        }))
    }

    // ========== Expressions ==========

    fn parse_assignment_expression(&mut self) -> Result<Expression> {
        self.parse_assignment_expression_impl(true)
    }

    fn parse_assignment_expression_impl(&mut self, allow_in: bool) -> Result<Expression> {
        self.nested(|p| p.parse_assignment_expression_impl_unguarded(allow_in))
    }

    fn parse_assignment_expression_impl_unguarded(&mut self, allow_in: bool) -> Result<Expression> {
        let start = self.location();
        let left = self.parse_conditional_expression_impl(allow_in)?;

        if self.peek().is_assignment_operator() {
            if !left.is_valid_assignment_target() {
                return Err(self.error("Invalid left-hand side in assignment", start));
            }
            let op = self.parse_assignment_operator()?;
            let right = self.parse_assignment_expression_impl(allow_in)?;

            return Ok(Expression::Assignment(Box::new(AssignmentExpression {
                operator: op,
                left,
                right,
                span: Span::new(start, self.location()),
            })));
        }

        Ok(left)
    }

    fn parse_assignment_operator(&mut self) -> Result<AssignmentOperator> {
        let op = match self.peek() {
            TokenKind::Equals => AssignmentOperator::Assign,
            TokenKind::PlusEquals => AssignmentOperator::AddAssign,
            TokenKind::MinusEquals => AssignmentOperator::SubAssign,
            TokenKind::StarEquals => AssignmentOperator::MulAssign,
            TokenKind::SlashEquals => AssignmentOperator::DivAssign,
            TokenKind::PercentEquals => AssignmentOperator::ModAssign,
            TokenKind::LessLessEquals => AssignmentOperator::ShlAssign,
            TokenKind::GreaterGreaterEquals => AssignmentOperator::ShrAssign,
            TokenKind::GreaterGreaterGreaterEquals => AssignmentOperator::UShrAssign,
            TokenKind::AmpersandEquals => AssignmentOperator::BitwiseAndAssign,
            TokenKind::PipeEquals => AssignmentOperator::BitwiseOrAssign,
            TokenKind::CaretEquals => AssignmentOperator::BitwiseXorAssign,
            _ => {
                let loc = self.location();
                return Err(self.error("Expected assignment operator", loc));
            }
        };
        self.advance();
        Ok(op)
    }

    fn parse_conditional_expression_impl(&mut self, allow_in: bool) -> Result<Expression> {
        let start = self.location();
        let test = self.parse_binary_expression_impl(allow_in, 0)?;

        if self.consume(TokenKind::Question) {
            let consequent = self.parse_assignment_expression()?;
            self.expect(TokenKind::Colon)?;
            let alternate = self.parse_assignment_expression_impl(allow_in)?;

            return Ok(Expression::Conditional(Box::new(ConditionalExpression {
                test,
                consequent,
                alternate,
                span: Span::new(start, self.location()),
            })));
        }

        Ok(test)
    }

    fn parse_sequence_expression_impl(&mut self, allow_in: bool) -> Result<Expression> {
        let start = self.location();
        let mut expr = self.parse_assignment_expression_impl(allow_in)?;

        if self.peek() == TokenKind::Comma {
            let mut expressions = vec![expr];
            while self.consume(TokenKind::Comma) {
                expressions.push(self.parse_assignment_expression_impl(allow_in)?);
            }
            expr = Expression::Sequence(Box::new(SequenceExpression {
                expressions,
                span: Span::new(start, self.location()),
            }));
        }

        Ok(expr)
    }

    fn parse_binary_expression_impl(&mut self, allow_in: bool, min_prec: u8) -> Result<Expression> {
        let start = self.location();
        let mut left = self.parse_unary_expression()?;

        loop {
            let prec = self.binary_precedence(allow_in);
            if prec == 0 || prec < min_prec {
                break;
            }

            let is_logical = matches!(
                self.peek(),
                TokenKind::AmpersandAmpersand | TokenKind::PipePipe
            );

            if is_logical {
                let op = if self.peek() == TokenKind::AmpersandAmpersand {
                    LogicalOperator::And
                } else {
                    LogicalOperator::Or
                };
                self.advance();
                let right = self.parse_binary_expression_impl(allow_in, prec + 1)?;
                left = Expression::Logical(Box::new(LogicalExpression {
                    operator: op,
                    left,
                    right,
                    span: Span::new(start, self.location()),
                }));
            } else {
                let op = self.parse_binary_operator()?;
                let right = self.parse_binary_expression_impl(allow_in, prec + 1)?;
                left = Expression::Binary(Box::new(BinaryExpression {
                    operator: op,
                    left,
                    right,
                    span: Span::new(start, self.location()),
                }));
            }
        }

        Ok(left)
    }

    fn binary_precedence(&self, allow_in: bool) -> u8 {
        match self.peek() {
            TokenKind::PipePipe => 4,
            TokenKind::AmpersandAmpersand => 5,
            TokenKind::Pipe => 6,
            TokenKind::Caret => 7,
            TokenKind::Ampersand => 8,
            TokenKind::EqualsEquals
            | TokenKind::BangEquals
            | TokenKind::EqualsEqualsEquals
            | TokenKind::BangEqualsEquals => 9,
            TokenKind::Less
            | TokenKind::Greater
            | TokenKind::LessEquals
            | TokenKind::GreaterEquals
            | TokenKind::Keyword(Keyword::Instanceof) => 10,
            TokenKind::Keyword(Keyword::In) if allow_in => 10,
            TokenKind::LessLess | TokenKind::GreaterGreater | TokenKind::GreaterGreaterGreater => {
                11
            }
            TokenKind::Plus | TokenKind::Minus => 12,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 13,
            _ => 0,
        }
    }

    fn parse_binary_operator(&mut self) -> Result<BinaryOperator> {
        let op = match self.peek() {
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Minus => BinaryOperator::Sub,
            TokenKind::Star => BinaryOperator::Mul,
            TokenKind::Slash => BinaryOperator::Div,
            TokenKind::Percent => BinaryOperator::Mod,
            TokenKind::EqualsEquals => BinaryOperator::Eq,
            TokenKind::BangEquals => BinaryOperator::Ne,
            TokenKind::EqualsEqualsEquals => BinaryOperator::StrictEq,
            TokenKind::BangEqualsEquals => BinaryOperator::StrictNe,
            TokenKind::Less => BinaryOperator::Lt,
            TokenKind::LessEquals => BinaryOperator::Le,
            TokenKind::Greater => BinaryOperator::Gt,
            TokenKind::GreaterEquals => BinaryOperator::Ge,
            TokenKind::LessLess => BinaryOperator::Shl,
            TokenKind::GreaterGreater => BinaryOperator::Shr,
            TokenKind::GreaterGreaterGreater => BinaryOperator::UShr,
            TokenKind::Ampersand => BinaryOperator::BitwiseAnd,
            TokenKind::Pipe => BinaryOperator::BitwiseOr,
            TokenKind::Caret => BinaryOperator::BitwiseXor,
            TokenKind::Keyword(Keyword::In) => BinaryOperator::In,
            TokenKind::Keyword(Keyword::Instanceof) => BinaryOperator::Instanceof,
            _ => {
                let loc = self.location();
                return Err(self.error("Expected binary operator", loc));
            }
        };
        self.advance();
        Ok(op)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression> {
        self.nested(Self::parse_unary_expression_unguarded)
    }

    fn parse_unary_expression_unguarded(&mut self) -> Result<Expression> {
        let start = self.location();

        // Prefix increment/decrement
        if matches!(self.peek(), TokenKind::PlusPlus | TokenKind::MinusMinus) {
            let op = if self.peek() == TokenKind::PlusPlus {
                UpdateOperator::Increment
            } else {
                UpdateOperator::Decrement
            };
            self.advance();
            let argument = self.parse_unary_expression()?;
            if !argument.is_valid_assignment_target() {
                return Err(self.error("Invalid left-hand side expression in prefix operation", start));
            }

            return Ok(Expression::Update(Box::new(UpdateExpression {
                operator: op,
                argument,
                prefix: true,
                span: Span::new(start, self.location()),
            })));
        }

        let unary_op = match self.peek() {
            TokenKind::Plus => Some(UnaryOperator::Plus),
            TokenKind::Minus => Some(UnaryOperator::Minus),
            TokenKind::Bang => Some(UnaryOperator::Not),
            TokenKind::Tilde => Some(UnaryOperator::BitwiseNot),
            TokenKind::Keyword(Keyword::Typeof) => Some(UnaryOperator::Typeof),
            TokenKind::Keyword(Keyword::Void) => Some(UnaryOperator::Void),
            TokenKind::Keyword(Keyword::Delete) => Some(UnaryOperator::Delete),
            _ => None,
        };

        if let Some(op) = unary_op {
            self.advance();
            let argument = self.parse_unary_expression()?;

            if op == UnaryOperator::Delete
                && self.flags.strict
                && matches!(argument.unparenthesized(), Expression::Identifier(_))
            {
                return Err(self.error("Delete of an unqualified identifier in strict mode", start));
            }

            return Ok(Expression::Unary(Box::new(UnaryExpression {
                operator: op,
                argument,
                span: Span::new(start, self.location()),
            })));
        }

        self.parse_update_expression()
    }

    fn parse_update_expression(&mut self) -> Result<Expression> {
        let start = self.location();
        let argument = self.parse_left_hand_side_expression()?;

        // Restricted production: no line break before postfix ++/--
        if matches!(self.peek(), TokenKind::PlusPlus | TokenKind::MinusMinus)
            && !self.current().newline_before
        {
            if !argument.is_valid_assignment_target() {
                return Err(self.error("Invalid left-hand side expression in postfix operation", start));
            }
            let op = if self.peek() == TokenKind::PlusPlus {
                UpdateOperator::Increment
            } else {
                UpdateOperator::Decrement
            };
            self.advance();

            return Ok(Expression::Update(Box::new(UpdateExpression {
                operator: op,
                argument,
                prefix: false,
                span: Span::new(start, self.location()),
            })));
        }

        Ok(argument)
    }

    fn parse_left_hand_side_expression(&mut self) -> Result<Expression> {
        let start = self.location();
        let mut expr = self.parse_member_expression()?;

        // Call expressions and member accesses
        loop {
            match self.peek() {
                TokenKind::LeftParen => {
                    self.advance();
                    let arguments = self.parse_arguments()?;
                    expr = Expression::Call(Box::new(CallExpression {
                        callee: expr,
                        arguments,
                        span: Span::new(start, self.location()),
                    }));
                }
                TokenKind::Dot | TokenKind::LeftBracket => {
                    expr = self.parse_member_suffix(expr, start)?;
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse one `.name` or `[expr]` suffix
    fn parse_member_suffix(&mut self, object: Expression, start: SourceLocation) -> Result<Expression> {
        let property = if self.consume(TokenKind::Dot) {
            MemberProperty::Identifier(self.parse_identifier_name()?)
        } else {
            self.expect(TokenKind::LeftBracket)?;
            let property = self.parse_expression()?;
            self.expect(TokenKind::RightBracket)?;
            MemberProperty::Expression(Box::new(property))
        };
        Ok(Expression::Member(Box::new(MemberExpression {
            object,
            property,
            span: Span::new(start, self.location()),
        })))
    }

    /// MemberExpression, including `new` with an argument list
    fn parse_member_expression(&mut self) -> Result<Expression> {
        self.nested(Self::parse_member_expression_unguarded)
    }

    /// MemberExpression, including `new` with an argument list
    fn parse_member_expression_unguarded(&mut self) -> Result<Expression> {
        let start = self.location();

        let mut expr = if self.consume(TokenKind::Keyword(Keyword::New)) {
            let callee = self.parse_member_expression()?;
            let arguments = if self.consume(TokenKind::LeftParen) {
                self.parse_arguments()?
            } else {
                Vec::new()
            };
            Expression::New(Box::new(NewExpression {
                callee,
                arguments,
                span: Span::new(start, self.location()),
            }))
        } else {
            self.parse_primary_expression()?
        };

        while matches!(self.peek(), TokenKind::Dot | TokenKind::LeftBracket) {
            expr = self.parse_member_suffix(expr, start)?;
        }

        Ok(expr)
    }

    fn parse_primary_expression(&mut self) -> Result<Expression> {
        let start = self.location();

        match self.peek() {
            TokenKind::Identifier | TokenKind::Keyword(Keyword::Get | Keyword::Set) => {
                let id = self.parse_identifier()?;
                Ok(Expression::Identifier(id))
            }
            TokenKind::NumberLiteral => {
                let raw = self.advance().text;
                let value = self.parse_number_value(raw, start)?;
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::Number(value),
                    span: Span::new(start, self.location()),
                }))
            }
            TokenKind::StringLiteral => {
                let raw = self.advance().text;
                let value = self.parse_string_value(raw, start)?;
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::String(value),
                    span: Span::new(start, self.location()),
                }))
            }
            TokenKind::Keyword(Keyword::True) | TokenKind::Keyword(Keyword::False) => {
                let value = self.peek() == TokenKind::Keyword(Keyword::True);
                self.advance();
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::Boolean(value),
                    span: Span::new(start, self.location()),
                }))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::Null,
                    span: Span::new(start, self.location()),
                }))
            }
            TokenKind::Keyword(Keyword::This) => {
                self.advance();
                Ok(Expression::This(Span::new(start, self.location())))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RightParen)?;
                Ok(Expression::Parenthesized(Box::new(expr)))
            }
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_object_literal(),
            TokenKind::Keyword(Keyword::Function) => {
                let func = self.parse_function(false)?;
                Ok(Expression::Function(func))
            }
            TokenKind::Slash | TokenKind::SlashEquals => {
                Err(self.error("Regular expression literals are not supported", start))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expression> {
        let start = self.location();
        self.expect(TokenKind::LeftBracket)?;

        let mut elements = Vec::new();

        while !self.consume(TokenKind::RightBracket) {
            if self.consume(TokenKind::Comma) {
                elements.push(None);
                continue;
            }

            elements.push(Some(self.parse_assignment_expression()?));

            if !self.consume(TokenKind::Comma) {
                self.expect(TokenKind::RightBracket)?;
                break;
            }
        }

        Ok(Expression::Array(ArrayExpression {
            elements,
            span: Span::new(start, self.location()),
        }))
    }

    fn parse_object_literal(&mut self) -> Result<Expression> {
        let start = self.location();
        self.expect(TokenKind::LeftBrace)?;

        let mut properties = Vec::new();

        while !self.consume(TokenKind::RightBrace) {
            let prop = self.parse_object_property()?;
            properties.push(prop);

            if !self.consume(TokenKind::Comma) {
                self.expect(TokenKind::RightBrace)?;
                break;
            }
        }

        Ok(Expression::Object(ObjectExpression {
            properties,
            span: Span::new(start, self.location()),
        }))
    }

    fn parse_object_property(&mut self) -> Result<ObjectProperty> {
        let start = self.location();

        // Accessor: get/set followed by a property name
        if matches!(self.peek(), TokenKind::Keyword(Keyword::Get | Keyword::Set))
            && matches!(
                self.peek_at(1),
                TokenKind::Identifier
                    | TokenKind::Keyword(_)
                    | TokenKind::StringLiteral
                    | TokenKind::NumberLiteral
            )
        {
            let is_getter = self.peek() == TokenKind::Keyword(Keyword::Get);
            self.advance();
            let key = self.parse_property_name()?;
            let func = self.parse_function_rest(None, start)?;

            let expected = if is_getter { 0 } else { 1 };
            if func.params.len() != expected {
                let message = if is_getter {
                    "Getter must not have any formal parameters"
                } else {
                    "Setter must have exactly one formal parameter"
                };
                return Err(self.error(message, start));
            }

            let kind = if is_getter {
                ObjectPropertyKind::Get(func)
            } else {
                ObjectPropertyKind::Set(func)
            };
            return Ok(ObjectProperty {
                key,
                kind,
                span: Span::new(start, self.location()),
            });
        }

        let key = self.parse_property_name()?;
        self.expect(TokenKind::Colon)?;
        let value = self.parse_assignment_expression()?;

        Ok(ObjectProperty {
            key,
            kind: ObjectPropertyKind::Init(value),
            span: Span::new(start, self.location()),
        })
    }

    fn parse_property_name(&mut self) -> Result<PropertyName> {
        let start = self.location();
        match self.peek() {
            TokenKind::Identifier | TokenKind::Keyword(_) => {
                let id = self.parse_identifier_name()?;
                Ok(PropertyName::Identifier(id))
            }
            TokenKind::StringLiteral => {
                let text = self.advance().text;
                Ok(PropertyName::String(self.parse_string_value(text, start)?))
            }
            TokenKind::NumberLiteral => {
                let text = self.advance().text;
                Ok(PropertyName::Number(self.parse_number_value(text, start)?))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        let mut args = Vec::new();

        while !self.consume(TokenKind::RightParen) {
            args.push(self.parse_assignment_expression()?);

            if !self.consume(TokenKind::Comma) {
                self.expect(TokenKind::RightParen)?;
                break;
            }
        }

        Ok(args)
    }

    // ========== Helpers ==========

    /// Whether the current token can be used as an identifier reference
    fn is_identifier_token(&self) -> bool {
        match self.peek() {
            TokenKind::Identifier => true,
            TokenKind::Keyword(kw) => !kw.is_reserved(),
            _ => false,
        }
    }

    fn parse_identifier(&mut self) -> Result<Identifier> {
        if !self.is_identifier_token() {
            let loc = self.location();
            return Err(self.error(
                format!("Expected identifier, found {}", self.peek().describe()),
                loc,
            ));
        }

        let token = self.advance();
        let (name, location) = (token.text, token.location);
        Ok(Identifier::new(name, Span::new(location, self.location())))
    }

    /// Parse an identifier that introduces a binding
    fn parse_binding_identifier(&mut self) -> Result<Identifier> {
        let id = self.parse_identifier()?;
        if self.flags.strict && (id.name == "eval" || id.name == "arguments") {
            return Err(self.error(
                format!("Unexpected eval or arguments in strict mode: '{}'", id.name),
                id.span.start,
            ));
        }
        Ok(id)
    }

    fn parse_identifier_name(&mut self) -> Result<Identifier> {
        // Allow keywords as property names
        match self.peek() {
            TokenKind::Identifier | TokenKind::Keyword(_) => {
                let token = self.advance();
                let (name, location) = (token.text, token.location);
                Ok(Identifier::new(name, Span::new(location, self.location())))
            }
            _ => {
                let loc = self.location();
                Err(self.error("Expected identifier", loc))
            }
        }
    }

    /// Decode a quoted string literal into UTF-16 code units
    fn parse_string_value(&self, text: &str, loc: SourceLocation) -> Result<JsString> {
        let inner = &text[1..text.len() - 1];
        let mut units: Vec<u16> = Vec::with_capacity(inner.len());
        let mut chars = inner.chars().peekable();

        let hex_digits = |chars: &mut std::iter::Peekable<std::str::Chars<'_>>, n: usize| {
            let mut value = 0u32;
            for _ in 0..n {
                let digit = chars.next().and_then(|c| c.to_digit(16))?;
                value = value * 16 + digit;
            }
            Some(value)
        };

        while let Some(c) = chars.next() {
            if c != '\\' {
                let mut buf = [0u16; 2];
                units.extend_from_slice(c.encode_utf16(&mut buf));
                continue;
            }
            match chars.next() {
                Some('n') => units.push(0x0A),
                Some('r') => units.push(0x0D),
                Some('t') => units.push(0x09),
                Some('b') => units.push(0x08),
                Some('f') => units.push(0x0C),
                Some('v') => units.push(0x0B),
                Some('x') => match hex_digits(&mut chars, 2) {
                    Some(code) => units.push(code as u16),
                    None => return Err(self.error("Invalid hexadecimal escape sequence", loc)),
                },
                Some('u') => match hex_digits(&mut chars, 4) {
                    Some(code) => units.push(code as u16),
                    None => return Err(self.error("Invalid Unicode escape sequence", loc)),
                },
                Some(d @ '0'..='7') => {
                    // \0 not followed by a digit is NUL; anything else is a legacy octal escape
                    let is_nul = d == '0' && !chars.peek().is_some_and(|c| c.is_ascii_digit());
                    if !is_nul && self.flags.strict {
                        return Err(self.error("Octal escape sequences are not allowed in strict mode", loc));
                    }
                    let mut value = d.to_digit(8).unwrap_or(0);
                    let max_len = if d <= '3' { 3 } else { 2 };
                    for _ in 1..max_len {
                        match chars.peek().and_then(|c| c.to_digit(8)) {
                            Some(digit) => {
                                value = value * 8 + digit;
                                chars.next();
                            }
                            None => break,
                        }
                    }
                    units.push(value as u16);
                }
                Some('\r') => {
                    // Line continuation
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                }
                Some(c) if is_line_terminator(c) => {}
                Some(other) => {
                    let mut buf = [0u16; 2];
                    units.extend_from_slice(other.encode_utf16(&mut buf));
                }
                None => {}
            }
        }

        Ok(JsString::from(units))
    }

    fn parse_number_value(&self, text: &str, loc: SourceLocation) -> Result<f64> {
        let bytes = text.as_bytes();
        if bytes.len() > 2 && bytes[0] == b'0' && matches!(bytes[1], b'x' | b'X') {
            return Ok(text[2..]
                .chars()
                .filter_map(|c| c.to_digit(16))
                .fold(0.0, |acc, d| acc * 16.0 + d as f64));
        }
        if bytes.len() > 1 && bytes[0] == b'0' && bytes.iter().all(|b| b.is_ascii_digit()) {
            if bytes.iter().all(|b| (b'0'..=b'7').contains(b)) {
                if self.flags.strict {
                    return Err(self.error("Octal literals are not allowed in strict mode", loc));
                }
                return Ok(text[1..]
                    .chars()
                    .filter_map(|c| c.to_digit(8))
                    .fold(0.0, |acc, d| acc * 8.0 + d as f64));
            }
        }
        lexical_core::parse::<f64>(bytes)
            .map_err(|_| self.error(format!("Invalid number: {}", text), loc))
    }
}

/// Parse JavaScript source code into an AST
pub fn parse(source: &str) -> Result<Program> {
    parse_with_options(source, false)
}

/// Parse a program, optionally forcing strict mode for the whole input
pub fn parse_with_options(source: &str, strict: bool) -> Result<Program> {
    let mut parser = Parser::new(source)?;
    parser.set_strict(strict);
    parser.parse_program()
}

/// Parse a single JavaScript expression
pub fn parse_expression(source: &str) -> Result<Expression> {
    let mut parser = Parser::new(source)?;
    let expr = parser.parse_expression()?;
    if !parser.is_eof() {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

/// Build a function from a parameter list and body text
///
/// Used by the `Function` constructor and host body evaluation; `return` is
/// legal at the body's top level.
pub fn parse_function_body(params: &str, body: &str, strict: bool) -> Result<FunctionRef> {
    let source = format!("function anonymous({}\n) {{\n{}\n}}", params, body);
    let mut parser = Parser::new(&source)?;
    parser.set_strict(strict);
    let func = parser.parse_function(false)?;
    if !parser.is_eof() {
        return Err(parser.unexpected());
    }
    Ok(func)
}

/// Whether `source` fails to parse only because it ends too early
pub fn is_incomplete(source: &str) -> bool {
    match parse(source) {
        Ok(_) => false,
        Err(e) => e.is_incomplete(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literals() {
        let program = parse("42;").unwrap();
        assert_eq!(program.body.len(), 1);

        let program = parse("'hello';").unwrap();
        assert_eq!(program.body.len(), 1);

        let program = parse("true; false; null;").unwrap();
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn test_parse_binary_expression() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        match expr {
            Expression::Binary(b) => {
                assert_eq!(b.operator, BinaryOperator::Add);
            }
            _ => panic!("Expected binary expression"),
        }
    }

    #[test]
    fn test_parse_variable_declaration() {
        let program = parse("var x = 1, y;").unwrap();
        match &program.body[0] {
            Statement::VariableDeclaration(decl) => {
                assert_eq!(decl.declarations.len(), 2);
                assert!(decl.declarations[1].init.is_none());
            }
            _ => panic!("Expected variable declaration"),
        }
    }

    #[test]
    fn test_parse_function() {
        let program = parse("function foo(a, b) { return a + b; }").unwrap();
        match &program.body[0] {
            Statement::FunctionDeclaration(func) => {
                assert_eq!(func.name(), "foo");
                assert_eq!(func.params.len(), 2);
                assert_eq!(func.source_text, "function foo(a, b) { return a + b; }");
            }
            _ => panic!("Expected function declaration"),
        }
    }

    #[test]
    fn test_parse_if_statement() {
        let program = parse("if (x) { y; } else { z; }").unwrap();
        match &program.body[0] {
            Statement::If(stmt) => {
                assert!(stmt.alternate.is_some());
            }
            _ => panic!("Expected if statement"),
        }
    }

    #[test]
    fn test_parse_for_in_with_var() {
        let program = parse("for (var k in o) {}").unwrap();
        assert!(matches!(&program.body[0], Statement::ForIn(_)));
        assert_eq!(program.hoisting().var_names.len(), 1);
    }

    #[test]
    fn test_asi_restricted_return() {
        let program = parse("function f() { return\n1 }").unwrap();
        let Statement::FunctionDeclaration(func) = &program.body[0] else {
            panic!("Expected function declaration");
        };
        match &func.body[0] {
            Statement::Return(ret) => assert!(ret.argument.is_none()),
            _ => panic!("Expected return"),
        }
        assert_eq!(func.body.len(), 2);
    }

    #[test]
    fn test_asi_rejects_same_line() {
        assert!(parse("a b").is_err());
        assert!(parse("a\nb").is_ok());
    }

    #[test]
    fn test_labels_and_continue() {
        assert!(parse("outer: for (;;) { for (;;) { continue outer; } }").is_ok());
        assert!(parse("outer: { continue outer; }").is_err());
        assert!(parse("break missing;").is_err());
    }

    #[test]
    fn test_getter_setter_literal() {
        let expr = parse_expression("({ get a() { return 1; }, set a(v) {}, get: 2 })").unwrap();
        let Expression::Parenthesized(inner) = expr else {
            panic!("Expected parenthesized expression");
        };
        let Expression::Object(obj) = *inner else {
            panic!("Expected object literal");
        };
        assert!(matches!(obj.properties[0].kind, ObjectPropertyKind::Get(_)));
        assert!(matches!(obj.properties[1].kind, ObjectPropertyKind::Set(_)));
        assert!(matches!(obj.properties[2].kind, ObjectPropertyKind::Init(_)));
    }

    #[test]
    fn test_use_strict_directive() {
        assert!(parse("'use strict'; var a;").unwrap().strict);
        assert!(!parse("var a; 'use strict';").unwrap().strict);
        assert!(parse("'use strict'; with (o) {}").is_err());
    }

    #[test]
    fn test_incomplete_input() {
        assert!(is_incomplete("function f() {"));
        assert!(is_incomplete("var a = {"));
        assert!(is_incomplete("1 +"));
        assert!(!is_incomplete("1 + ;"));
        assert!(!is_incomplete("var a = 1;"));
    }

    #[test]
    fn test_string_escapes_keep_lone_surrogates() {
        let expr = parse_expression(r#""\uD800\x41\101""#).unwrap();
        match expr {
            Expression::Literal(Literal {
                value: LiteralValue::String(s),
                ..
            }) => assert_eq!(s.as_units(), &[0xD800, 0x41, 0x41]),
            _ => panic!("Expected string literal"),
        }
    }

    #[test]
    fn test_function_body_allows_return() {
        let func = parse_function_body("a, b", "return a + b;", false).unwrap();
        assert_eq!(func.params.len(), 2);
        assert!(parse_function_body("", "}); (function(){", false).is_err());
    }

    #[test]
    fn test_number_literals() {
        let value = |src: &str| match parse_expression(src).unwrap() {
            Expression::Literal(Literal {
                value: LiteralValue::Number(n),
                ..
            }) => n,
            _ => panic!("Expected number literal"),
        };
        assert_eq!(value("0xFF"), 255.0);
        assert_eq!(value("017"), 15.0);
        assert_eq!(value("019"), 19.0);
        assert_eq!(value("1.5e3"), 1500.0);
    }

    #[test]
    fn test_nesting_limit() {
        let source = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        let err = parse(&source).unwrap_err();
        assert_eq!(err.kind(), Some(crate::error::ErrorKind::RangeError));

        let blocks = format!("{}{}", "{".repeat(100_000), "}".repeat(100_000));
        let err = parse(&blocks).unwrap_err();
        assert_eq!(err.kind(), Some(crate::error::ErrorKind::RangeError));

        let source = format!("{}1{}", "(".repeat(1_000), ")".repeat(1_000));
        assert!(parse(&source).is_ok());
    }
}
