//! JavaScript lexer/tokenizer
//!
//! Produces ES5 tokens from source text. Every token records whether a line
//! terminator preceded it, which the parser needs for automatic semicolon
//! insertion and the restricted productions (`return`, `break`, `continue`,
//! `throw`, postfix `++`/`--`). A `/` is always a division punctuator since
//! regular expression literals are not part of the supported language.

mod token;

pub use token::{Keyword, Token, TokenKind};

use crate::error::{Error, Result, SourceLocation};

/// A lexer for JavaScript source code
pub struct Lexer<'src> {
    /// Source code being lexed
    source: &'src str,
    /// Source as bytes for faster access
    bytes: &'src [u8],
    /// Current position in bytes
    pos: usize,
    /// Current line number (1-indexed)
    line: u32,
    /// Current column number (1-indexed)
    column: u32,
}

/// Whether `c` terminates a line
pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Whether `c` is ECMAScript white space (line terminators excluded)
pub fn is_js_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\u{000B}' | '\u{000C}' | ' ' | '\u{00A0}' | '\u{FEFF}')
        || (!is_line_terminator(c) && c.is_whitespace())
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Get current source location
    fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            offset: self.pos,
        }
    }

    /// Create a lexer error with source context
    fn error(&self, message: impl Into<String>, location: SourceLocation) -> Error {
        Error::parse_error_with_context(message, location, self.source, false)
    }

    /// Check if we've reached the end of input
    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        if self.is_eof() {
            None
        } else {
            self.source[self.pos..].chars().next()
        }
    }

    /// Peek at next character (one ahead)
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advance and return current character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' || c == '\u{2028}' || c == '\u{2029}' || (c == '\r' && self.peek() != Some('\n')) {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Skip whitespace and comments, reporting whether a line break was crossed
    fn skip_whitespace_and_comments(&mut self) -> Result<bool> {
        let mut newline = false;
        loop {
            while let Some(c) = self.peek() {
                if is_line_terminator(c) {
                    newline = true;
                    self.advance();
                } else if is_js_whitespace(c) {
                    self.advance();
                } else {
                    break;
                }
            }

            if self.peek() == Some('/') {
                if self.peek_next() == Some('/') {
                    self.advance();
                    self.advance();
                    while let Some(c) = self.peek() {
                        if is_line_terminator(c) {
                            break;
                        }
                        self.advance();
                    }
                    continue;
                } else if self.peek_next() == Some('*') {
                    let start_loc = self.location();
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek() {
                            None => {
                                return Err(Error::parse_error_with_context(
                                    "Unterminated comment",
                                    start_loc,
                                    self.source,
                                    true,
                                ));
                            }
                            Some('*') if self.peek_next() == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(c) => {
                                if is_line_terminator(c) {
                                    newline = true;
                                }
                                self.advance();
                            }
                        }
                    }
                    continue;
                }
            }

            break;
        }
        Ok(newline)
    }

    /// Check if character can start an identifier
    fn is_id_start(c: char) -> bool {
        c == '_' || c == '$' || unicode_xid::UnicodeXID::is_xid_start(c)
    }

    /// Check if character can continue an identifier
    fn is_id_continue(c: char) -> bool {
        c == '_' || c == '$' || unicode_xid::UnicodeXID::is_xid_continue(c)
    }

    /// Scan an identifier or keyword
    fn scan_identifier(&mut self) -> (TokenKind, usize) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if Self::is_id_continue(c) {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.pos];
        let kind = match Keyword::from_str(text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier,
        };
        (kind, start)
    }

    fn eat_digits(&mut self, radix: u32) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek() {
            if c.is_digit(radix) {
                self.advance();
                count += 1;
            } else {
                break;
            }
        }
        count
    }

    /// Scan a numeric literal
    fn scan_number(&mut self) -> Result<TokenKind> {
        let start_loc = self.location();

        if self.peek() == Some('0') {
            match self.peek_next() {
                Some('x') | Some('X') => {
                    self.advance();
                    self.advance();
                    if self.eat_digits(16) == 0 {
                        return Err(self.error("Invalid hexadecimal literal", start_loc));
                    }
                    return self.finish_number(start_loc);
                }
                Some(c) if c.is_ascii_digit() => {
                    // Legacy octal (017); falls back to decimal when an 8 or 9 appears
                    self.advance();
                    self.eat_digits(10);
                    return self.finish_number(start_loc);
                }
                _ => {}
            }
        }

        self.eat_digits(10);

        if self.peek() == Some('.') {
            self.advance();
            self.eat_digits(10);
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if self.eat_digits(10) == 0 {
                return Err(self.error("Invalid exponent in numeric literal", start_loc));
            }
        }

        self.finish_number(start_loc)
    }

    fn finish_number(&self, start_loc: SourceLocation) -> Result<TokenKind> {
        // An identifier may not immediately follow a numeric literal (3in, 0x1g)
        if let Some(c) = self.peek() {
            if Self::is_id_start(c) || c.is_ascii_digit() {
                return Err(self.error("Invalid or unexpected token after number", start_loc));
            }
        }
        Ok(TokenKind::NumberLiteral)
    }

    /// Scan a string literal
    fn scan_string(&mut self, quote: char) -> Result<TokenKind> {
        let start_loc = self.location();
        self.advance();

        loop {
            match self.peek() {
                None => {
                    return Err(Error::parse_error_with_context(
                        "Unterminated string literal",
                        start_loc,
                        self.source,
                        true,
                    ));
                }
                Some(c) if is_line_terminator(c) => {
                    return Err(self.error("Unterminated string literal", start_loc));
                }
                Some('\\') => {
                    self.advance();
                    // Line continuation: \ followed by CR LF counts as one
                    if self.peek() == Some('\r') {
                        self.advance();
                        if self.peek() == Some('\n') {
                            self.advance();
                        }
                    } else {
                        self.advance();
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }

        Ok(TokenKind::StringLiteral)
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token<'src>> {
        let newline_before = self.skip_whitespace_and_comments()?;
        let start = self.pos;
        let start_loc = self.location();

        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                text: "",
                location: start_loc,
                newline_before,
            });
        };

        let kind = if Self::is_id_start(c) {
            self.scan_identifier().0
        } else if c.is_ascii_digit()
            || (c == '.' && self.peek_next().is_some_and(|n| n.is_ascii_digit()))
        {
            self.scan_number()?
        } else if c == '"' || c == '\'' {
            self.scan_string(c)?
        } else {
            self.scan_punctuator(c, start_loc)?
        };

        Ok(Token {
            kind,
            text: &self.source[start..self.pos],
            location: start_loc,
            newline_before,
        })
    }

    /// Consume `next` if present, yielding `then`, else `otherwise`
    fn pick(&mut self, next: char, then: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.peek() == Some(next) {
            self.advance();
            then
        } else {
            otherwise
        }
    }

    fn scan_punctuator(&mut self, c: char, start_loc: SourceLocation) -> Result<TokenKind> {
        self.advance();

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,
            '?' => TokenKind::Question,
            '.' => TokenKind::Dot,
            '+' => {
                if self.peek() == Some('+') {
                    self.advance();
                    TokenKind::PlusPlus
                } else {
                    self.pick('=', TokenKind::PlusEquals, TokenKind::Plus)
                }
            }
            '-' => {
                if self.peek() == Some('-') {
                    self.advance();
                    TokenKind::MinusMinus
                } else {
                    self.pick('=', TokenKind::MinusEquals, TokenKind::Minus)
                }
            }
            '*' => self.pick('=', TokenKind::StarEquals, TokenKind::Star),
            '/' => self.pick('=', TokenKind::SlashEquals, TokenKind::Slash),
            '%' => self.pick('=', TokenKind::PercentEquals, TokenKind::Percent),
            '^' => self.pick('=', TokenKind::CaretEquals, TokenKind::Caret),
            '<' => {
                if self.peek() == Some('<') {
                    self.advance();
                    self.pick('=', TokenKind::LessLessEquals, TokenKind::LessLess)
                } else {
                    self.pick('=', TokenKind::LessEquals, TokenKind::Less)
                }
            }
            '>' => {
                if self.peek() == Some('>') {
                    self.advance();
                    if self.peek() == Some('>') {
                        self.advance();
                        self.pick(
                            '=',
                            TokenKind::GreaterGreaterGreaterEquals,
                            TokenKind::GreaterGreaterGreater,
                        )
                    } else {
                        self.pick('=', TokenKind::GreaterGreaterEquals, TokenKind::GreaterGreater)
                    }
                } else {
                    self.pick('=', TokenKind::GreaterEquals, TokenKind::Greater)
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.pick('=', TokenKind::EqualsEqualsEquals, TokenKind::EqualsEquals)
                } else {
                    TokenKind::Equals
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.pick('=', TokenKind::BangEqualsEquals, TokenKind::BangEquals)
                } else {
                    TokenKind::Bang
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    TokenKind::AmpersandAmpersand
                } else {
                    self.pick('=', TokenKind::AmpersandEquals, TokenKind::Ampersand)
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    TokenKind::PipePipe
                } else {
                    self.pick('=', TokenKind::PipeEquals, TokenKind::Pipe)
                }
            }
            _ => {
                return Err(self.error(format!("Unexpected character '{}'", c), start_loc));
            }
        };

        Ok(kind)
    }

    /// Tokenize the entire source into a vector of tokens
    pub fn tokenize(&mut self) -> Result<Vec<Token<'src>>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_empty_source() {
        let mut lexer = Lexer::new("");
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Eof);
    }

    #[test]
    fn test_identifiers() {
        let mut lexer = Lexer::new("foo bar _private $jquery");
        assert_eq!(lexer.next_token().unwrap().text, "foo");
        assert_eq!(lexer.next_token().unwrap().text, "bar");
        assert_eq!(lexer.next_token().unwrap().text, "_private");
        assert_eq!(lexer.next_token().unwrap().text, "$jquery");
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("var function with let"),
            vec![
                TokenKind::Keyword(Keyword::Var),
                TokenKind::Keyword(Keyword::Function),
                TokenKind::Keyword(Keyword::With),
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let mut lexer = Lexer::new("42 3.14 0xFF 017 1e10 .5 5.");
        for expected in ["42", "3.14", "0xFF", "017", "1e10", ".5", "5."] {
            let token = lexer.next_token().unwrap();
            assert_eq!(token.kind, TokenKind::NumberLiteral);
            assert_eq!(token.text, expected);
        }
    }

    #[test]
    fn test_number_followed_by_identifier_is_error() {
        assert!(Lexer::new("3in").tokenize().is_err());
    }

    #[test]
    fn test_strings() {
        let mut lexer = Lexer::new(r#""hello" 'world' "with \"escape""#);
        assert_eq!(lexer.next_token().unwrap().text, r#""hello""#);
        assert_eq!(lexer.next_token().unwrap().text, "'world'");
        assert_eq!(lexer.next_token().unwrap().text, r#""with \"escape""#);
    }

    #[test]
    fn test_string_line_continuation() {
        let mut lexer = Lexer::new("'a\\\nb'");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::StringLiteral);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ - * / === !== >>>= <<"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::EqualsEqualsEquals,
                TokenKind::BangEqualsEquals,
                TokenKind::GreaterGreaterGreaterEquals,
                TokenKind::LessLess,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments() {
        let mut lexer = Lexer::new("foo // comment\nbar /* block */ baz");
        assert_eq!(lexer.next_token().unwrap().text, "foo");
        assert_eq!(lexer.next_token().unwrap().text, "bar");
        assert_eq!(lexer.next_token().unwrap().text, "baz");
    }

    #[test]
    fn test_newline_before() {
        let tokens = Lexer::new("a /* x\n */ b\nc d").tokenize().unwrap();
        let flags: Vec<bool> = tokens.iter().map(|t| t.newline_before).collect();
        assert_eq!(flags, vec![false, true, true, false, false]);
    }

    #[test]
    fn test_unterminated_comment_is_incomplete() {
        let err = Lexer::new("a /* open").tokenize().unwrap_err();
        assert!(err.is_incomplete());
    }
}
