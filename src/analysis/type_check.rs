use std::collections::HashMap;

use tracing::debug;

use crate::analysis::type_error::{TypeError, TypeErrorKind};
use crate::lang::node::{BinaryOp, Expr, Stmt, UnaryOp};
use crate::lang::types::PrimitiveType;
use crate::lang::value::Value;

/// Check a whole program with a fresh checker.
pub fn check(program: &[Stmt]) -> Vec<TypeError> {
    TypeChecker::new().check(program)
}

/// Static type checker over the statement tree.
///
/// Visits every node once and collects every violation. An operand that has
/// already failed is typed `Error`, and anything built on it is `Error` too
/// without a second report.
pub struct TypeChecker {
    /// Declared variable types, innermost scope last. Scope 0 holds globals
    /// and persists across `check` calls.
    scopes: Vec<HashMap<String, PrimitiveType>>,
    errors: Vec<TypeError>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            errors: Vec::new(),
        }
    }

    pub fn check(&mut self, program: &[Stmt]) -> Vec<TypeError> {
        for stmt in program {
            self.statement(stmt);
        }
        // a previous failed check may have left nested scopes behind
        self.scopes.truncate(1);

        debug!(errors = self.errors.len(), "type check finished");
        std::mem::take(&mut self.errors)
    }

    fn error(&mut self, kind: TypeErrorKind, line: usize) -> PrimitiveType {
        self.errors.push(TypeError::new(kind, line));
        PrimitiveType::Error
    }

    fn declare(&mut self, name: &str, declared: PrimitiveType) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), declared);
        }
    }

    fn lookup(&self, name: &str) -> Option<PrimitiveType> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    // Statements

    fn statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.expression(expr);
            }
            Stmt::Var {
                name,
                declared,
                initializer,
                line,
            } => {
                let found = match initializer {
                    Some(expr) => self.expression(expr),
                    None => PrimitiveType::Null,
                };
                if found != *declared && found != PrimitiveType::Null && found != PrimitiveType::Error
                {
                    self.error(
                        TypeErrorKind::WrongInitializer {
                            name: name.clone(),
                            declared: *declared,
                            found,
                        },
                        *line,
                    );
                }
                self.declare(name, *declared);
            }
            Stmt::Block(stmts) => {
                self.scopes.push(HashMap::new());
                for stmt in stmts {
                    self.statement(stmt);
                }
                self.scopes.pop();
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.condition("if", condition);
                self.statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.statement(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.condition("while", condition);
                self.statement(body);
            }
        }
    }

    fn condition(&mut self, construct: &'static str, condition: &Expr) {
        let found = self.expression(condition);
        if found != PrimitiveType::Boolean && found != PrimitiveType::Error {
            self.error(
                TypeErrorKind::NonBooleanCondition { construct, found },
                condition.line(),
            );
        }
    }

    // Expressions

    fn expression(&mut self, expr: &Expr) -> PrimitiveType {
        use PrimitiveType::*;

        match expr {
            Expr::Literal { value, .. } => literal_type(value),

            // unknown names are reported by the compiler
            Expr::Variable { name, .. } => self.lookup(name).unwrap_or(Error),

            Expr::Grouping(inner) => self.expression(inner),

            Expr::Unary { op, operand, line } => {
                let found = self.expression(operand);
                match (op, found) {
                    (_, Error) => Error,
                    (UnaryOp::Not, Boolean) => Boolean,
                    (UnaryOp::Not, found) => {
                        self.error(TypeErrorKind::NonBooleanNot { found }, *line)
                    }
                    (UnaryOp::Negate, Boolean | Null) => {
                        self.error(TypeErrorKind::InvalidNegation { found }, *line)
                    }
                    (UnaryOp::Negate, numeric) => numeric,
                }
            }

            Expr::Binary {
                op,
                left,
                right,
                line,
            } => {
                let left = self.expression(left);
                let right = self.expression(right);
                self.binary(*op, left, right, *line)
            }

            Expr::Logical {
                op,
                left,
                right,
                line,
            } => {
                let left = self.expression(left);
                let right = self.expression(right);
                match (left, right) {
                    (Error, _) | (_, Error) => Error,
                    (Boolean, Boolean) => Boolean,
                    (left, right) => self.error(
                        TypeErrorKind::NonBooleanLogical {
                            op: op.symbol(),
                            left,
                            right,
                        },
                        *line,
                    ),
                }
            }

            Expr::Assign { name, value, line } => {
                let found = self.expression(value);
                match self.lookup(name) {
                    None => Error,
                    Some(_) if found == Error => Error,
                    Some(declared) if found == declared || found == Null => found,
                    Some(declared) => self.error(
                        TypeErrorKind::WrongAssignment {
                            name: name.clone(),
                            declared,
                            found,
                        },
                        *line,
                    ),
                }
            }
        }
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        left: PrimitiveType,
        right: PrimitiveType,
        line: usize,
    ) -> PrimitiveType {
        use PrimitiveType::*;

        if left == Error || right == Error {
            return Error;
        }
        if op.is_equality() {
            return Boolean;
        }

        let op_symbol = op.symbol();
        if left == Boolean || right == Boolean {
            return self.error(TypeErrorKind::BooleanOperand { op: op_symbol }, line);
        }
        if left == Null || right == Null {
            return self.error(TypeErrorKind::NullOperand { op: op_symbol }, line);
        }
        if left != right {
            return self.error(
                TypeErrorKind::MismatchedOperands {
                    op: op_symbol,
                    left,
                    right,
                },
                line,
            );
        }

        if op.is_comparison() { Boolean } else { left }
    }
}

fn literal_type(value: &Value) -> PrimitiveType {
    match value {
        Value::Integer(_) => PrimitiveType::Integer,
        Value::Double(_) => PrimitiveType::Double,
        Value::Boolean(_) => PrimitiveType::Boolean,
        Value::Null => PrimitiveType::Null,
    }
}
