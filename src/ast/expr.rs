//! Expression AST node types

use super::*;

/// A JavaScript expression
#[derive(Debug, Clone)]
pub enum Expression {
    /// Identifier reference
    Identifier(Identifier),

    /// Literal value
    Literal(Literal),

    /// Array literal [1, 2, 3]
    Array(ArrayExpression),

    /// Object literal {a: 1, b: 2}
    Object(ObjectExpression),

    /// Function expression
    Function(FunctionRef),

    /// this expression
    This(Span),

    /// Member expression obj.prop or obj[prop]
    Member(Box<MemberExpression>),

    /// Call expression func(args)
    Call(Box<CallExpression>),

    /// new expression new Foo(args)
    New(Box<NewExpression>),

    /// Unary expression !x, -x, typeof x
    Unary(Box<UnaryExpression>),

    /// Update expression ++x, x++
    Update(Box<UpdateExpression>),

    /// Binary expression x + y, x === y
    Binary(Box<BinaryExpression>),

    /// Logical expression x && y, x || y
    Logical(Box<LogicalExpression>),

    /// Assignment expression x = y, x += y
    Assignment(Box<AssignmentExpression>),

    /// Conditional expression x ? y : z
    Conditional(Box<ConditionalExpression>),

    /// Sequence expression x, y, z
    Sequence(Box<SequenceExpression>),

    /// Parenthesized expression (for preserving parens)
    Parenthesized(Box<Expression>),
}

impl Expression {
    /// Get the span of this expression
    pub fn span(&self) -> Span {
        match self {
            Expression::Identifier(id) => id.span,
            Expression::Literal(lit) => lit.span,
            Expression::Array(a) => a.span,
            Expression::Object(o) => o.span,
            Expression::Function(f) => f.span,
            Expression::This(span) => *span,
            Expression::Member(m) => m.span,
            Expression::Call(c) => c.span,
            Expression::New(n) => n.span,
            Expression::Unary(u) => u.span,
            Expression::Update(u) => u.span,
            Expression::Binary(b) => b.span,
            Expression::Logical(l) => l.span,
            Expression::Assignment(a) => a.span,
            Expression::Conditional(c) => c.span,
            Expression::Sequence(s) => s.span,
            Expression::Parenthesized(e) => e.span(),
        }
    }

    /// Check if this expression is a valid assignment target
    pub fn is_valid_assignment_target(&self) -> bool {
        match self {
            Expression::Identifier(_) => true,
            Expression::Member(_) => true,
            Expression::Parenthesized(e) => e.is_valid_assignment_target(),
            _ => false,
        }
    }

    /// Strip any number of enclosing parentheses
    pub fn unparenthesized(&self) -> &Expression {
        match self {
            Expression::Parenthesized(inner) => inner.unparenthesized(),
            other => other,
        }
    }
}

/// A literal value
#[derive(Debug, Clone)]
pub struct Literal {
    /// The literal value
    pub value: LiteralValue,
    /// Span in source
    pub span: Span,
}

/// Literal value types
#[derive(Debug, Clone)]
pub enum LiteralValue {
    /// null
    Null,
    /// true or false
    Boolean(bool),
    /// Number
    Number(f64),
    /// String, as decoded UTF-16 code units
    String(JsString),
}

/// Array expression
#[derive(Debug, Clone)]
pub struct ArrayExpression {
    /// Array elements (None for holes like [1,,3])
    pub elements: Vec<Option<Expression>>,
    /// Span in source
    pub span: Span,
}

/// Object expression
#[derive(Debug, Clone)]
pub struct ObjectExpression {
    /// Object properties
    pub properties: Vec<ObjectProperty>,
    /// Span in source
    pub span: Span,
}

/// Object literal property
#[derive(Debug, Clone)]
pub struct ObjectProperty {
    /// Property name
    pub key: PropertyName,
    /// Value or accessor
    pub kind: ObjectPropertyKind,
    /// Span in source
    pub span: Span,
}

/// What an object literal property defines
#[derive(Debug, Clone)]
pub enum ObjectPropertyKind {
    /// Plain data property {a: 1}
    Init(Expression),
    /// Getter {get a() {}}
    Get(FunctionRef),
    /// Setter {set a(v) {}}
    Set(FunctionRef),
}

/// Member expression
#[derive(Debug, Clone)]
pub struct MemberExpression {
    /// Object being accessed
    pub object: Expression,
    /// Property being accessed
    pub property: MemberProperty,
    /// Span in source
    pub span: Span,
}

/// Member property (can be identifier or computed)
#[derive(Debug, Clone)]
pub enum MemberProperty {
    /// obj.prop
    Identifier(Identifier),
    /// obj[expr]
    Expression(Box<Expression>),
}

/// Call expression
#[derive(Debug, Clone)]
pub struct CallExpression {
    /// Callee expression
    pub callee: Expression,
    /// Arguments
    pub arguments: Vec<Expression>,
    /// Span in source
    pub span: Span,
}

/// New expression
#[derive(Debug, Clone)]
pub struct NewExpression {
    /// Constructor expression
    pub callee: Expression,
    /// Arguments
    pub arguments: Vec<Expression>,
    /// Span in source
    pub span: Span,
}

/// Unary expression
#[derive(Debug, Clone)]
pub struct UnaryExpression {
    /// Operator
    pub operator: UnaryOperator,
    /// Argument
    pub argument: Expression,
    /// Span in source
    pub span: Span,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// -
    Minus,
    /// +
    Plus,
    /// !
    Not,
    /// ~
    BitwiseNot,
    /// typeof
    Typeof,
    /// void
    Void,
    /// delete
    Delete,
}

/// Update expression (++, --)
#[derive(Debug, Clone)]
pub struct UpdateExpression {
    /// Operator
    pub operator: UpdateOperator,
    /// Argument
    pub argument: Expression,
    /// Is prefix (++x) or postfix (x++)
    pub prefix: bool,
    /// Span in source
    pub span: Span,
}

/// Update operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    /// ++
    Increment,
    /// --
    Decrement,
}

/// Binary expression
#[derive(Debug, Clone)]
pub struct BinaryExpression {
    /// Operator
    pub operator: BinaryOperator,
    /// Left operand
    pub left: Expression,
    /// Right operand
    pub right: Expression,
    /// Span in source
    pub span: Span,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// +
    Add,
    /// -
    Sub,
    /// *
    Mul,
    /// /
    Div,
    /// %
    Mod,
    /// ==
    Eq,
    /// !=
    Ne,
    /// ===
    StrictEq,
    /// !==
    StrictNe,
    /// <
    Lt,
    /// <=
    Le,
    /// >
    Gt,
    /// >=
    Ge,
    /// <<
    Shl,
    /// >>
    Shr,
    /// >>>
    UShr,
    /// &
    BitwiseAnd,
    /// |
    BitwiseOr,
    /// ^
    BitwiseXor,
    /// in
    In,
    /// instanceof
    Instanceof,
}

/// Logical expression
#[derive(Debug, Clone)]
pub struct LogicalExpression {
    /// Operator
    pub operator: LogicalOperator,
    /// Left operand
    pub left: Expression,
    /// Right operand
    pub right: Expression,
    /// Span in source
    pub span: Span,
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// &&
    And,
    /// ||
    Or,
}

/// Assignment expression
#[derive(Debug, Clone)]
pub struct AssignmentExpression {
    /// Operator
    pub operator: AssignmentOperator,
    /// Left-hand side (identifier or member expression)
    pub left: Expression,
    /// Right-hand side
    pub right: Expression,
    /// Span in source
    pub span: Span,
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    /// =
    Assign,
    /// +=
    AddAssign,
    /// -=
    SubAssign,
    /// *=
    MulAssign,
    /// /=
    DivAssign,
    /// %=
    ModAssign,
    /// <<=
    ShlAssign,
    /// >>=
    ShrAssign,
    /// >>>=
    UShrAssign,
    /// &=
    BitwiseAndAssign,
    /// |=
    BitwiseOrAssign,
    /// ^=
    BitwiseXorAssign,
}

impl AssignmentOperator {
    /// The binary operator a compound assignment applies, if any
    pub fn binary_operator(&self) -> Option<BinaryOperator> {
        Some(match self {
            AssignmentOperator::Assign => return None,
            AssignmentOperator::AddAssign => BinaryOperator::Add,
            AssignmentOperator::SubAssign => BinaryOperator::Sub,
            AssignmentOperator::MulAssign => BinaryOperator::Mul,
            AssignmentOperator::DivAssign => BinaryOperator::Div,
            AssignmentOperator::ModAssign => BinaryOperator::Mod,
            AssignmentOperator::ShlAssign => BinaryOperator::Shl,
            AssignmentOperator::ShrAssign => BinaryOperator::Shr,
            AssignmentOperator::UShrAssign => BinaryOperator::UShr,
            AssignmentOperator::BitwiseAndAssign => BinaryOperator::BitwiseAnd,
            AssignmentOperator::BitwiseOrAssign => BinaryOperator::BitwiseOr,
            AssignmentOperator::BitwiseXorAssign => BinaryOperator::BitwiseXor,
        })
    }
}

/// Conditional expression
#[derive(Debug, Clone)]
pub struct ConditionalExpression {
    /// Test expression
    pub test: Expression,
    /// Consequent expression
    pub consequent: Expression,
    /// Alternate expression
    pub alternate: Expression,
    /// Span in source
    pub span: Span,
}

/// Sequence expression
#[derive(Debug, Clone)]
pub struct SequenceExpression {
    /// Expressions in sequence
    pub expressions: Vec<Expression>,
    /// Span in source
    pub span: Span,
}
