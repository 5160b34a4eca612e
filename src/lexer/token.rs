//! Token definitions for the JavaScript lexer

use crate::error::SourceLocation;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'src> {
    /// The kind of token
    pub kind: TokenKind,
    /// The source text of the token
    pub text: &'src str,
    /// Location in source
    pub location: SourceLocation,
    /// A line terminator appeared between the previous token and this one
    pub newline_before: bool,
}

/// The kind of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal (42, 3.14, 0xFF, 017)
    NumberLiteral,
    /// String literal ("hello", 'world')
    StringLiteral,

    // Identifiers and keywords
    /// Identifier (foo, bar, $baz)
    Identifier,
    /// Keyword (var, function, etc.)
    Keyword(Keyword),

    // Punctuators
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `.`
    Dot,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `?`
    Question,

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,

    // Comparison operators
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEquals,
    /// `>=`
    GreaterEquals,
    /// `==`
    EqualsEquals,
    /// `===`
    EqualsEqualsEquals,
    /// `!=`
    BangEquals,
    /// `!==`
    BangEqualsEquals,

    // Bitwise operators
    /// `&`
    Ampersand,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `<<`
    LessLess,
    /// `>>`
    GreaterGreater,
    /// `>>>`
    GreaterGreaterGreater,

    // Logical operators
    /// `!`
    Bang,
    /// `&&`
    AmpersandAmpersand,
    /// `||`
    PipePipe,

    // Assignment operators
    /// `=`
    Equals,
    /// `+=`
    PlusEquals,
    /// `-=`
    MinusEquals,
    /// `*=`
    StarEquals,
    /// `/=`
    SlashEquals,
    /// `%=`
    PercentEquals,
    /// `<<=`
    LessLessEquals,
    /// `>>=`
    GreaterGreaterEquals,
    /// `>>>=`
    GreaterGreaterGreaterEquals,
    /// `&=`
    AmpersandEquals,
    /// `|=`
    PipeEquals,
    /// `^=`
    CaretEquals,

    /// End of input
    Eof,
}

/// ECMAScript 5 keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Break,
    Case,
    Catch,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    False,
    Finally,
    For,
    Function,
    If,
    In,
    Instanceof,
    New,
    Null,
    Return,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,

    // Future reserved words
    Class,
    Const,
    Enum,
    Export,
    Extends,
    Import,
    Super,

    // Contextual keywords (object literal accessors)
    Get,
    Set,
}

impl Keyword {
    /// Check if this keyword is a reserved word that cannot be used as an identifier
    pub fn is_reserved(&self) -> bool {
        !matches!(self, Keyword::Get | Keyword::Set)
    }

    /// Look up a keyword by its source text
    pub fn from_str(text: &str) -> Option<Keyword> {
        Some(match text {
            "break" => Keyword::Break,
            "case" => Keyword::Case,
            "catch" => Keyword::Catch,
            "continue" => Keyword::Continue,
            "debugger" => Keyword::Debugger,
            "default" => Keyword::Default,
            "delete" => Keyword::Delete,
            "do" => Keyword::Do,
            "else" => Keyword::Else,
            "false" => Keyword::False,
            "finally" => Keyword::Finally,
            "for" => Keyword::For,
            "function" => Keyword::Function,
            "if" => Keyword::If,
            "in" => Keyword::In,
            "instanceof" => Keyword::Instanceof,
            "new" => Keyword::New,
            "null" => Keyword::Null,
            "return" => Keyword::Return,
            "switch" => Keyword::Switch,
            "this" => Keyword::This,
            "throw" => Keyword::Throw,
            "true" => Keyword::True,
            "try" => Keyword::Try,
            "typeof" => Keyword::Typeof,
            "var" => Keyword::Var,
            "void" => Keyword::Void,
            "while" => Keyword::While,
            "with" => Keyword::With,
            "class" => Keyword::Class,
            "const" => Keyword::Const,
            "enum" => Keyword::Enum,
            "export" => Keyword::Export,
            "extends" => Keyword::Extends,
            "import" => Keyword::Import,
            "super" => Keyword::Super,
            "get" => Keyword::Get,
            "set" => Keyword::Set,
            _ => return None,
        })
    }

    /// Get the string representation of the keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Break => "break",
            Keyword::Case => "case",
            Keyword::Catch => "catch",
            Keyword::Continue => "continue",
            Keyword::Debugger => "debugger",
            Keyword::Default => "default",
            Keyword::Delete => "delete",
            Keyword::Do => "do",
            Keyword::Else => "else",
            Keyword::False => "false",
            Keyword::Finally => "finally",
            Keyword::For => "for",
            Keyword::Function => "function",
            Keyword::If => "if",
            Keyword::In => "in",
            Keyword::Instanceof => "instanceof",
            Keyword::New => "new",
            Keyword::Null => "null",
            Keyword::Return => "return",
            Keyword::Switch => "switch",
            Keyword::This => "this",
            Keyword::Throw => "throw",
            Keyword::True => "true",
            Keyword::Try => "try",
            Keyword::Typeof => "typeof",
            Keyword::Var => "var",
            Keyword::Void => "void",
            Keyword::While => "while",
            Keyword::With => "with",
            Keyword::Class => "class",
            Keyword::Const => "const",
            Keyword::Enum => "enum",
            Keyword::Export => "export",
            Keyword::Extends => "extends",
            Keyword::Import => "import",
            Keyword::Super => "super",
            Keyword::Get => "get",
            Keyword::Set => "set",
        }
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TokenKind {
    /// Check if this token is an assignment operator
    pub fn is_assignment_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Equals
                | TokenKind::PlusEquals
                | TokenKind::MinusEquals
                | TokenKind::StarEquals
                | TokenKind::SlashEquals
                | TokenKind::PercentEquals
                | TokenKind::LessLessEquals
                | TokenKind::GreaterGreaterEquals
                | TokenKind::GreaterGreaterGreaterEquals
                | TokenKind::AmpersandEquals
                | TokenKind::PipeEquals
                | TokenKind::CaretEquals
        )
    }

    /// Human-readable description used in parse errors
    pub fn describe(&self) -> String {
        match self {
            TokenKind::NumberLiteral => "number".to_string(),
            TokenKind::StringLiteral => "string".to_string(),
            TokenKind::Identifier => "identifier".to_string(),
            TokenKind::Keyword(k) => format!("'{}'", k),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("{:?}", other),
        }
    }
}
