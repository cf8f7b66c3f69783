use super::types::PrimitiveType;
use super::value::Value;

/// Expression node of the checking tree.
///
/// The tree exists only for static analysis; execution goes straight from
/// tokens to bytecode.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // ───────────────────────────── Leaves ─────────────────────────────
    Literal {
        value: Value,
        line: usize,
    },

    Variable {
        name: String,
        line: usize,
    },

    // ──────────────────────────── Operators ───────────────────────────
    /// Parenthesized expression.
    Grouping(Box<Expr>),

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        line: usize,
    },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        line: usize,
    },

    /// `&&` / `||`: the right operand is evaluated only when needed.
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
        line: usize,
    },

    /// `name = value`. Evaluates to the assigned value.
    Assign {
        name: String,
        value: Box<Expr>,
        line: usize,
    },
}

impl Expr {
    /// Line of the token that gives the node its meaning (the operator, the
    /// literal, the name).
    pub fn line(&self) -> usize {
        match self {
            Expr::Grouping(inner) => inner.line(),
            Expr::Literal { line, .. }
            | Expr::Variable { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Logical { line, .. }
            | Expr::Assign { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Equal | BinaryOp::NotEqual)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Greater | BinaryOp::GreaterEqual | BinaryOp::Less | BinaryOp::LessEqual
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),

    Print(Expr),

    /// `var name: type [= initializer];`
    Var {
        name: String,
        declared: PrimitiveType,
        initializer: Option<Expr>,
        line: usize,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}
