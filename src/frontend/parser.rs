use crate::bytecode::compile_error::{CompileError, CompileErrorKind};
use crate::frontend::cursor::TokenCursor;
use crate::frontend::token::{Token, TokenKind};
use crate::lang::node::{BinaryOp, Expr, LogicalOp, Stmt, UnaryOp};
use crate::lang::types::PrimitiveType;
use crate::lang::value::Value;

type ParseResult<T> = Result<T, CompileError>;

/// Statements parsed so far plus every syntax error met on the way.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub statements: Vec<Stmt>,
    pub errors: Vec<CompileError>,
}

pub fn parse(tokens: &[Token]) -> Parsed {
    Parser::new(tokens).parse()
}

/// Recursive-descent parser producing the tree the type checker walks.
///
/// Same grammar and precedence as the bytecode compiler. A malformed
/// statement is dropped from the tree and parsing resumes at the next
/// statement boundary.
pub struct Parser<'t> {
    cursor: TokenCursor<'t>,
    errors: Vec<CompileError>,
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            errors: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Parsed {
        let mut statements = Vec::new();

        while !self.cursor.is_at_end() {
            let before = self.cursor.position();
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
            if self.cursor.position() == before {
                self.cursor.advance();
            }
        }

        Parsed {
            statements,
            errors: self.errors,
        }
    }

    // ───────────────────────────── Helpers ─────────────────────────────

    fn error_at_current(&self, kind: CompileErrorKind) -> CompileError {
        let token = self.cursor.peek();
        // lexer errors win over whatever the grammar expected here
        match (&token.literal, token.kind) {
            (Some(message), TokenKind::Error) => CompileError::new(
                CompileErrorKind::Lexical(message.clone()),
                token.line,
                token.lexeme(),
            ),
            _ => CompileError::new(kind, token.line, token.lexeme()),
        }
    }

    fn consume(&mut self, kind: TokenKind, error: CompileErrorKind) -> ParseResult<Token> {
        if self.cursor.check(kind) {
            Ok(self.cursor.advance())
        } else {
            Err(self.error_at_current(error))
        }
    }

    fn synchronize(&mut self) {
        while !self.cursor.is_at_end() {
            if self
                .cursor
                .previous()
                .is_some_and(|t| t.kind == TokenKind::Semicolon)
            {
                return;
            }
            let next = self.cursor.peek_kind();
            if next.starts_statement() || next == TokenKind::RightBrace {
                return;
            }
            self.cursor.advance();
        }
    }

    // ──────────────────────────── Statements ───────────────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.cursor.match_any(&[TokenKind::Var]).is_some() {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                self.errors.push(error);
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, CompileErrorKind::ExpectedVariableName)?;
        self.consume(
            TokenKind::Colon,
            CompileErrorKind::missing("':'", "after variable name"),
        )?;

        let declared = PrimitiveType::from_annotation(self.cursor.peek_kind())
            .ok_or_else(|| self.error_at_current(CompileErrorKind::ExpectedTypeName))?;
        self.cursor.advance();

        let initializer = if self.cursor.match_any(&[TokenKind::Equal]).is_some() {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenKind::Semicolon,
            CompileErrorKind::missing("';'", "after variable declaration"),
        )?;

        Ok(Stmt::Var {
            name: name.lexeme(),
            declared,
            initializer,
            line: name.line,
        })
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.cursor.peek_kind() {
            TokenKind::Print => {
                self.cursor.advance();
                let value = self.expression()?;
                self.consume(
                    TokenKind::Semicolon,
                    CompileErrorKind::missing("';'", "after value"),
                )?;
                Ok(Stmt::Print(value))
            }
            TokenKind::If => {
                self.cursor.advance();
                let condition = self.condition("after 'if'")?;
                let then_branch = Box::new(self.statement()?);
                let else_branch = if self.cursor.match_any(&[TokenKind::Else]).is_some() {
                    Some(Box::new(self.statement()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    condition,
                    then_branch,
                    else_branch,
                })
            }
            TokenKind::While => {
                self.cursor.advance();
                let condition = self.condition("after 'while'")?;
                let body = Box::new(self.statement()?);
                Ok(Stmt::While { condition, body })
            }
            TokenKind::LeftBrace => {
                self.cursor.advance();
                Ok(Stmt::Block(self.block()?))
            }
            _ => {
                let expr = self.expression()?;
                self.consume(
                    TokenKind::Semicolon,
                    CompileErrorKind::missing("';'", "after expression"),
                )?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    fn condition(&mut self, context: &'static str) -> ParseResult<Expr> {
        self.consume(TokenKind::LeftParen, CompileErrorKind::missing("'('", context))?;
        let condition = self.expression()?;
        self.consume(
            TokenKind::RightParen,
            CompileErrorKind::missing("')'", "after condition"),
        )?;
        Ok(condition)
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.cursor.check(TokenKind::RightBrace) && !self.cursor.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(
            TokenKind::RightBrace,
            CompileErrorKind::missing("'}'", "after block"),
        )?;
        Ok(statements)
    }

    // ─────────────────────────── Expressions ───────────────────────────

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let target = self.logical_or()?;

        if self.cursor.check(TokenKind::Equal) {
            let equals = self.error_at_current(CompileErrorKind::InvalidAssignmentTarget);
            self.cursor.advance();
            let value = self.assignment()?;

            return match target {
                Expr::Variable { name, line } => Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                    line,
                }),
                _ => Err(equals),
            };
        }

        Ok(target)
    }

    fn logical_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.logical_and()?;

        while let Some(op) = self.cursor.match_any(&[TokenKind::OrOr]) {
            let right = self.logical_and()?;
            expr = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(expr),
                right: Box::new(right),
                line: op.line,
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while let Some(op) = self.cursor.match_any(&[TokenKind::AndAnd]) {
            let right = self.equality()?;
            expr = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(expr),
                right: Box::new(right),
                line: op.line,
            };
        }

        Ok(expr)
    }

    /// One left-associative binary precedence level.
    fn binary_level(
        &mut self,
        operators: &[TokenKind],
        operand: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut expr = operand(self)?;

        while let Some(token) = self.cursor.match_any(operators) {
            let right = operand(self)?;
            expr = Expr::Binary {
                op: binary_op(token.kind),
                left: Box::new(expr),
                right: Box::new(right),
                line: token.line,
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[TokenKind::EqualEqual, TokenKind::BangEqual],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.binary_level(&[TokenKind::Plus, TokenKind::Minus], Self::factor)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.binary_level(
            &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
            Self::unary,
        )
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if let Some(token) = self.cursor.match_any(&[TokenKind::Bang, TokenKind::Minus]) {
            let operand = self.unary()?;
            let op = if token.kind == TokenKind::Bang {
                UnaryOp::Not
            } else {
                UnaryOp::Negate
            };
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                line: token.line,
            });
        }

        self.primary()
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.cursor.peek().clone();

        match token.kind {
            kind if kind.is_literal() => {
                self.cursor.advance();
                let value = literal_value(&token)?;
                Ok(Expr::Literal {
                    value,
                    line: token.line,
                })
            }
            TokenKind::Identifier => {
                self.cursor.advance();
                Ok(Expr::Variable {
                    name: token.lexeme(),
                    line: token.line,
                })
            }
            TokenKind::LeftParen => {
                self.cursor.advance();
                let inner = self.expression()?;
                self.consume(
                    TokenKind::RightParen,
                    CompileErrorKind::missing("')'", "after expression"),
                )?;
                Ok(Expr::Grouping(Box::new(inner)))
            }
            _ => Err(self.error_at_current(CompileErrorKind::ExpectedExpression)),
        }
    }
}

fn binary_op(kind: TokenKind) -> BinaryOp {
    match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Subtract,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::Percent => BinaryOp::Modulo,
        TokenKind::EqualEqual => BinaryOp::Equal,
        TokenKind::BangEqual => BinaryOp::NotEqual,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        TokenKind::Less => BinaryOp::Less,
        _ => BinaryOp::LessEqual,
    }
}

fn literal_value(token: &Token) -> ParseResult<Value> {
    let text = token.literal.as_deref().unwrap_or_default();
    let internal = |message: String| {
        CompileError::new(CompileErrorKind::Internal(message), token.line, token.lexeme())
    };

    match token.kind {
        TokenKind::Integer => text
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| internal(e.to_string())),
        TokenKind::Double => text
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|e| internal(e.to_string())),
        TokenKind::True => Ok(Value::Boolean(true)),
        TokenKind::False => Ok(Value::Boolean(false)),
        TokenKind::Null => Ok(Value::Null),
        other => Err(internal(format!("{} is not a literal", other))),
    }
}
