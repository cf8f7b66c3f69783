use tracing::debug;

use crate::{
    bytecode::{
        Op,
        compile_error::{CompileError, CompileErrorKind},
        ir::{Instruction, Program},
    },
    frontend::{
        cursor::TokenCursor,
        token::{Token, TokenKind},
    },
    lang::value::Value,
};

/// Upper bound on simultaneously live locals.
pub const MAX_LOCALS: usize = 256;

/// Operand of a jump that has not been backpatched yet.
const UNPATCHED: usize = usize::MAX;

/// Result of a compilation: always a program, plus every syntax error found.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub program: Program,
    pub errors: Vec<CompileError>,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Compile a token sequence in one pass.
pub fn compile(tokens: &[Token]) -> Compilation {
    Compiler::new(tokens).compile()
}

struct Local {
    name: String,
    depth: usize,
    /// False while the local's own initializer is being compiled.
    initialized: bool,
}

enum Slot {
    Local(usize),
    Global(usize),
}

/// Single-pass precedence-climbing compiler: tokens in, bytecode out.
///
/// There is no intermediate tree. Each grammar level emits its opcodes as
/// soon as its operands are compiled, and forward jumps are emitted with a
/// placeholder target that is backpatched once the target index is known.
pub struct Compiler<'t> {
    cursor: TokenCursor<'t>,

    /// Output bytecode program (code, constant pool, global names)
    program: Program,

    errors: Vec<CompileError>,

    /// Set after an error; suppresses follow-on errors until the next
    /// statement boundary.
    panic_mode: bool,

    locals: Vec<Local>,
    scope_depth: usize,
}

impl<'t> Compiler<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self::with_globals(tokens, Vec::new())
    }

    /// Start from an existing global name table so that slots assigned by an
    /// earlier compilation stay valid (REPL sessions).
    pub fn with_globals(tokens: &'t [Token], globals: Vec<String>) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            program: Program {
                globals,
                ..Program::default()
            },
            errors: Vec::new(),
            panic_mode: false,
            locals: Vec::new(),
            scope_depth: 0,
        }
    }

    pub fn compile(mut self) -> Compilation {
        self.skip_error_tokens();

        while !self.cursor.is_at_end() {
            let before = self.cursor.position();
            self.declaration();
            // A token no rule can start (e.g. a stray `}`) was already
            // reported; step over it so the loop always advances.
            if self.cursor.position() == before {
                self.advance();
            }
        }

        debug!(
            instructions = self.program.code.len(),
            constants = self.program.constants.len(),
            globals = self.program.globals.len(),
            errors = self.errors.len(),
            "compiled program"
        );

        Compilation {
            program: self.program,
            errors: self.errors,
        }
    }

    // =========================================================================
    // Token handling
    // =========================================================================

    fn advance(&mut self) -> Token {
        let token = self.cursor.advance();
        self.skip_error_tokens();
        token
    }

    /// Report and step over lexer error tokens.
    fn skip_error_tokens(&mut self) {
        while self.cursor.check(TokenKind::Error) {
            let token = self.cursor.advance();
            let message = token.literal.clone().unwrap_or_default();
            self.error_at(&token, CompileErrorKind::Lexical(message));
        }
    }

    fn match_token(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if kinds.contains(&self.cursor.peek_kind()) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn consume(&mut self, kind: TokenKind, error: CompileErrorKind) -> Option<Token> {
        if self.cursor.check(kind) {
            Some(self.advance())
        } else {
            self.error_at_current(error);
            None
        }
    }

    fn previous_line(&self) -> usize {
        self.cursor.previous().map(|t| t.line).unwrap_or(1)
    }

    // =========================================================================
    // Errors
    // =========================================================================

    fn error_at(&mut self, token: &Token, kind: CompileErrorKind) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.errors
            .push(CompileError::new(kind, token.line, token.lexeme()));
    }

    fn error_at_current(&mut self, kind: CompileErrorKind) {
        let token = self.cursor.peek().clone();
        self.error_at(&token, kind);
    }

    /// Discard tokens until a statement boundary: just past a `;`, or before
    /// a statement keyword, a closing `}` or the end of input.
    fn synchronize(&mut self) {
        self.panic_mode = false;

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
            self.advance();
        }
    }

    // =========================================================================
    // Emission
    // =========================================================================

    fn emit(&mut self, op: Op, line: usize) {
        self.program.code.push(Instruction::new(op, line));
    }

    fn make_constant(&mut self, value: Value) -> usize {
        self.program.constants.push(value);
        self.program.constants.len() - 1
    }

    /// Emit a jump with a placeholder target; returns its index for patching.
    fn emit_jump(&mut self, jump: Op, line: usize) -> usize {
        self.emit(jump, line);
        self.program.code.len() - 1
    }

    /// Point the jump at `at` to the next instruction to be emitted.
    fn patch_jump(&mut self, at: usize) {
        let target = self.program.code.len();
        let patched = self
            .program
            .code
            .get(at)
            .and_then(|instruction| instruction.op.retarget(target));

        match patched {
            Some(op) => self.program.code[at].op = op,
            None => {
                let token = self.cursor.peek().clone();
                self.error_at(
                    &token,
                    CompileErrorKind::Internal(format!("no jump to patch at {}", at)),
                );
            }
        }
    }

    // =========================================================================
    // Declarations and statements
    // =========================================================================

    fn declaration(&mut self) {
        if self.match_token(&[TokenKind::Var]).is_some() {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    fn var_declaration(&mut self) {
        let Some(name) = self.consume(TokenKind::Identifier, CompileErrorKind::ExpectedVariableName)
        else {
            return;
        };
        self.consume(
            TokenKind::Colon,
            CompileErrorKind::missing("':'", "after variable name"),
        );
        if self
            .match_token(&[TokenKind::TypeInt, TokenKind::TypeDouble, TokenKind::TypeBool])
            .is_none()
        {
            self.error_at_current(CompileErrorKind::ExpectedTypeName);
        }

        let local = if self.scope_depth > 0 {
            self.declare_local(&name)
        } else {
            None
        };

        if self.match_token(&[TokenKind::Equal]).is_some() {
            self.expression();
        } else {
            self.emit(Op::Null, name.line);
        }

        self.consume(
            TokenKind::Semicolon,
            CompileErrorKind::missing("';'", "after variable declaration"),
        );

        if self.scope_depth > 0 {
            if let Some(slot) = local {
                self.locals[slot].initialized = true;
                self.emit(Op::NewLocal(slot), name.line);
            }
        } else {
            let slot = self.global_slot(&name.lexeme());
            self.emit(Op::NewGlobal(slot), name.line);
        }
    }

    fn declare_local(&mut self, name: &Token) -> Option<usize> {
        let ident = name.lexeme();
        let duplicate = self
            .locals
            .iter()
            .rev()
            .take_while(|local| local.depth == self.scope_depth)
            .any(|local| local.name == ident);

        if duplicate {
            self.error_at(name, CompileErrorKind::AlreadyDeclared(ident));
            return None;
        }
        if self.locals.len() >= MAX_LOCALS {
            self.error_at(name, CompileErrorKind::TooManyLocals { limit: MAX_LOCALS });
            return None;
        }

        self.locals.push(Local {
            name: ident,
            depth: self.scope_depth,
            initialized: false,
        });
        Some(self.locals.len() - 1)
    }

    fn global_slot(&mut self, name: &str) -> usize {
        match self.program.globals.iter().position(|g| g == name) {
            Some(slot) => slot,
            None => {
                self.program.globals.push(name.to_string());
                self.program.globals.len() - 1
            }
        }
    }

    fn statement(&mut self) {
        match self.cursor.peek_kind() {
            TokenKind::Print => {
                self.advance();
                self.print_statement();
            }
            TokenKind::If => {
                self.advance();
                self.if_statement();
            }
            TokenKind::While => {
                self.advance();
                self.while_statement();
            }
            TokenKind::LeftBrace => {
                self.advance();
                self.begin_scope();
                self.block();
                self.end_scope();
            }
            _ => self.expression_statement(),
        }
    }

    fn print_statement(&mut self) {
        self.expression();
        let line = self.previous_line();
        self.consume(
            TokenKind::Semicolon,
            CompileErrorKind::missing("';'", "after value"),
        );
        self.emit(Op::Print, line);
    }

    fn expression_statement(&mut self) {
        self.expression();
        let line = self.previous_line();
        self.emit(Op::Pop, line);
        self.consume(
            TokenKind::Semicolon,
            CompileErrorKind::missing("';'", "after expression"),
        );
    }

    /// ```text
    ///   <cond>
    ///   JUMP_IF_FALSE else
    ///   POP
    ///   <then>
    ///   JUMP end
    /// else:
    ///   POP
    ///   <else>
    /// end:
    /// ```
    fn if_statement(&mut self) {
        let line = self.previous_line();
        self.condition("after 'if'");

        let then_jump = self.emit_jump(Op::JumpIfFalse(UNPATCHED), line);
        self.emit(Op::Pop, line);
        self.statement();

        let else_jump = self.emit_jump(Op::Jump(UNPATCHED), self.previous_line());
        self.patch_jump(then_jump);
        self.emit(Op::Pop, line);

        if self.match_token(&[TokenKind::Else]).is_some() {
            self.statement();
        }
        self.patch_jump(else_jump);
    }

    /// ```text
    /// start:
    ///   <cond>
    ///   JUMP_IF_FALSE exit
    ///   POP
    ///   <body>
    ///   JUMP start
    /// exit:
    ///   POP
    /// ```
    fn while_statement(&mut self) {
        let line = self.previous_line();
        let loop_start = self.program.code.len();
        self.condition("after 'while'");

        let exit_jump = self.emit_jump(Op::JumpIfFalse(UNPATCHED), line);
        self.emit(Op::Pop, line);
        self.statement();
        self.emit(Op::Jump(loop_start), self.previous_line());

        self.patch_jump(exit_jump);
        self.emit(Op::Pop, line);
    }

    fn condition(&mut self, context: &'static str) {
        self.consume(TokenKind::LeftParen, CompileErrorKind::missing("'('", context));
        self.expression();
        self.consume(
            TokenKind::RightParen,
            CompileErrorKind::missing("')'", "after condition"),
        );
    }

    fn block(&mut self) {
        while !self.cursor.check(TokenKind::RightBrace) && !self.cursor.is_at_end() {
            self.declaration();
        }
        self.consume(
            TokenKind::RightBrace,
            CompileErrorKind::missing("'}'", "after block"),
        );
    }

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    fn end_scope(&mut self) {
        self.scope_depth -= 1;
        let line = self.previous_line();

        while self
            .locals
            .last()
            .is_some_and(|local| local.depth > self.scope_depth)
        {
            self.locals.pop();
            self.emit(Op::Pop, line);
        }
    }

    // =========================================================================
    // Expressions, lowest precedence first
    // =========================================================================

    fn expression(&mut self) {
        self.assignment();
    }

    fn assignment(&mut self) {
        if self.cursor.check(TokenKind::Identifier)
            && self.cursor.peek_next_kind() == TokenKind::Equal
        {
            let name = self.advance();
            self.advance();
            self.assignment();

            match self.resolve(&name) {
                Some(Slot::Local(slot)) => self.emit(Op::SetLocal(slot), name.line),
                Some(Slot::Global(slot)) => self.emit(Op::StoreGlobal(slot), name.line),
                None => {}
            }
            return;
        }

        self.logical_or();

        if self.cursor.check(TokenKind::Equal) {
            self.error_at_current(CompileErrorKind::InvalidAssignmentTarget);
        }
    }

    /// `a || b`: if `a` is true, jump over the pop and `b`, leaving `a` as
    /// the result.
    fn logical_or(&mut self) {
        self.logical_and();

        while let Some(op) = self.match_token(&[TokenKind::OrOr]) {
            let jump = self.emit_jump(Op::JumpIfTrue(UNPATCHED), op.line);
            self.emit(Op::Pop, op.line);
            self.logical_and();
            self.patch_jump(jump);
        }
    }

    fn logical_and(&mut self) {
        self.equality();

        while let Some(op) = self.match_token(&[TokenKind::AndAnd]) {
            let jump = self.emit_jump(Op::JumpIfFalse(UNPATCHED), op.line);
            self.emit(Op::Pop, op.line);
            self.equality();
            self.patch_jump(jump);
        }
    }

    fn equality(&mut self) {
        self.comparison();

        while let Some(op) = self.match_token(&[TokenKind::EqualEqual, TokenKind::BangEqual]) {
            self.comparison();
            self.emit(Op::CompareEqual, op.line);
            if op.kind == TokenKind::BangEqual {
                self.emit(Op::Not, op.line);
            }
        }
    }

    /// `>=` and `<=` have no opcodes of their own: they compile to the
    /// opposite strict comparison followed by `NOT`.
    fn comparison(&mut self) {
        self.term();

        while let Some(op) = self.match_token(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            self.term();
            match op.kind {
                TokenKind::Greater => self.emit(Op::CompareGreater, op.line),
                TokenKind::Less => self.emit(Op::CompareLesser, op.line),
                TokenKind::GreaterEqual => {
                    self.emit(Op::CompareLesser, op.line);
                    self.emit(Op::Not, op.line);
                }
                _ => {
                    self.emit(Op::CompareGreater, op.line);
                    self.emit(Op::Not, op.line);
                }
            }
        }
    }

    fn term(&mut self) {
        self.factor();

        while let Some(op) = self.match_token(&[TokenKind::Plus, TokenKind::Minus]) {
            self.factor();
            let code = if op.kind == TokenKind::Plus {
                Op::Add
            } else {
                Op::Subtract
            };
            self.emit(code, op.line);
        }
    }

    fn factor(&mut self) {
        self.unary();

        while let Some(op) =
            self.match_token(&[TokenKind::Star, TokenKind::Slash, TokenKind::Percent])
        {
            self.unary();
            let code = match op.kind {
                TokenKind::Star => Op::Multiply,
                TokenKind::Slash => Op::Divide,
                _ => Op::Modulo,
            };
            self.emit(code, op.line);
        }
    }

    fn unary(&mut self) {
        if let Some(op) = self.match_token(&[TokenKind::Bang, TokenKind::Minus]) {
            self.unary();
            let code = if op.kind == TokenKind::Bang {
                Op::Not
            } else {
                Op::Negate
            };
            self.emit(code, op.line);
        } else {
            self.primary();
        }
    }

    fn primary(&mut self) {
        let token = self.cursor.peek().clone();

        match token.kind {
            kind if kind.is_literal() => {
                self.advance();
                self.literal(&token);
            }
            TokenKind::Identifier => {
                self.advance();
                match self.resolve(&token) {
                    Some(Slot::Local(slot)) => self.emit(Op::GetLocal(slot), token.line),
                    Some(Slot::Global(slot)) => self.emit(Op::LoadGlobal(slot), token.line),
                    None => {}
                }
            }
            TokenKind::LeftParen => {
                self.advance();
                self.expression();
                self.consume(
                    TokenKind::RightParen,
                    CompileErrorKind::missing("')'", "after expression"),
                );
            }
            _ => self.error_at(&token, CompileErrorKind::ExpectedExpression),
        }
    }

    /// Add a literal to the constant pool and emit `CONSTANT index`.
    fn literal(&mut self, token: &Token) {
        let text = token.literal.as_deref().unwrap_or_default();

        // The lexer only produces well-formed numeric text, so parse
        // failures here are internal errors.
        let value = match token.kind {
            TokenKind::Integer => text.parse::<i64>().map(Value::Integer).map_err(|e| e.to_string()),
            TokenKind::Double => text.parse::<f64>().map(Value::Double).map_err(|e| e.to_string()),
            TokenKind::True => Ok(Value::Boolean(true)),
            TokenKind::False => Ok(Value::Boolean(false)),
            TokenKind::Null => Ok(Value::Null),
            other => Err(format!("{} is not a literal", other)),
        };

        match value {
            Ok(value) => {
                let index = self.make_constant(value);
                self.emit(Op::Constant(index), token.line);
            }
            Err(message) => self.error_at(token, CompileErrorKind::Internal(message)),
        }
    }

    /// Resolve a name to a slot: innermost local first, then globals.
    fn resolve(&mut self, name: &Token) -> Option<Slot> {
        let ident = name.lexeme();

        let local = self
            .locals
            .iter()
            .enumerate()
            .rev()
            .find(|(_, local)| local.name == ident)
            .map(|(slot, local)| (slot, local.initialized));

        match local {
            Some((_, false)) => {
                self.error_at(name, CompileErrorKind::ReadInOwnInitializer(ident));
                None
            }
            Some((slot, true)) => Some(Slot::Local(slot)),
            None => match self.program.globals.iter().position(|g| *g == ident) {
                Some(slot) => Some(Slot::Global(slot)),
                None => {
                    self.error_at(name, CompileErrorKind::UndefinedVariable(ident));
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::tokenize;

    fn compile_src(source: &str) -> Compilation {
        compile(&tokenize(source))
    }

    fn ops(source: &str) -> Vec<Op> {
        let compilation = compile_src(source);
        assert!(
            !compilation.has_errors(),
            "unexpected errors: {:?}",
            compilation.errors
        );
        compilation.program.ops().collect()
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    #[test]
    fn test_precedence_emits_operator_after_operands() {
        assert_eq!(
            ops("2 + 3 * 4;"),
            vec![
                Op::Constant(0),
                Op::Constant(1),
                Op::Constant(2),
                Op::Multiply,
                Op::Add,
                Op::Pop,
            ]
        );
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(
            ops("8 - 4 - 2;"),
            vec![
                Op::Constant(0),
                Op::Constant(1),
                Op::Subtract,
                Op::Constant(2),
                Op::Subtract,
                Op::Pop,
            ]
        );
    }

    #[test]
    fn test_constant_pool_values() {
        let compilation = compile_src("1; 2.5; true; false; null;");
        assert_eq!(
            compilation.program.constants,
            vec![
                Value::Integer(1),
                Value::Double(2.5),
                Value::Boolean(true),
                Value::Boolean(false),
                Value::Null,
            ]
        );
    }

    #[test]
    fn test_grouping() {
        assert_eq!(
            ops("(1 + 2) * 3;"),
            vec![
                Op::Constant(0),
                Op::Constant(1),
                Op::Add,
                Op::Constant(2),
                Op::Multiply,
                Op::Pop,
            ]
        );
    }

    #[test]
    fn test_unary_nesting() {
        assert_eq!(
            ops("!-1;"),
            vec![Op::Constant(0), Op::Negate, Op::Not, Op::Pop]
        );
    }

    #[test]
    fn test_synthesized_comparisons() {
        assert_eq!(
            ops("1 >= 2;")[2..4],
            [Op::CompareLesser, Op::Not]
        );
        assert_eq!(
            ops("1 <= 2;")[2..4],
            [Op::CompareGreater, Op::Not]
        );
        assert_eq!(ops("1 != 2;")[2..4], [Op::CompareEqual, Op::Not]);
        assert_eq!(ops("1 > 2;")[2], Op::CompareGreater);
        assert_eq!(ops("1 < 2;")[2], Op::CompareLesser);
    }

    #[test]
    fn test_logical_or_backpatch() {
        assert_eq!(
            ops("true || false;"),
            vec![
                Op::Constant(0),
                Op::JumpIfTrue(4),
                Op::Pop,
                Op::Constant(1),
                Op::Pop,
            ]
        );
    }

    #[test]
    fn test_logical_and_backpatch() {
        assert_eq!(
            ops("false && 1 == 1;"),
            vec![
                Op::Constant(0),
                Op::JumpIfFalse(6),
                Op::Pop,
                Op::Constant(1),
                Op::Constant(2),
                Op::CompareEqual,
                Op::Pop,
            ]
        );
    }

    #[test]
    fn test_chained_logical_jumps_point_forward() {
        let code = ops("true || false || true && false;");
        for (ip, op) in code.iter().enumerate() {
            if let Some(target) = op.jump_target() {
                assert!(target > ip + 1, "jump at {} targets {}", ip, target);
                assert!(target <= code.len());
            }
        }
        assert_eq!(
            code.iter().filter(|op| op.jump_target().is_some()).count(),
            3
        );
    }

    #[test]
    fn test_lines_are_attached() {
        let compilation = compile_src("1 +\n2;");
        let lines: Vec<usize> = compilation.program.code.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![1, 2, 1, 2]);
    }

    // =========================================================================
    // Statements and variables
    // =========================================================================

    #[test]
    fn test_print_statement() {
        assert_eq!(ops("print 1;"), vec![Op::Constant(0), Op::Print]);
    }

    #[test]
    fn test_globals() {
        let compilation = compile_src("var x: int = 1; x = 2; print x;");
        assert!(!compilation.has_errors());
        assert_eq!(compilation.program.globals, vec!["x".to_string()]);
        assert_eq!(
            compilation.program.ops().collect::<Vec<_>>(),
            vec![
                Op::Constant(0),
                Op::NewGlobal(0),
                Op::Constant(1),
                Op::StoreGlobal(0),
                Op::Pop,
                Op::LoadGlobal(0),
                Op::Print,
            ]
        );
    }

    #[test]
    fn test_var_without_initializer_is_null() {
        assert_eq!(ops("var b: bool;"), vec![Op::Null, Op::NewGlobal(0)]);
    }

    #[test]
    fn test_global_redeclaration_reuses_slot() {
        let compilation = compile_src("var x: int = 1; var x: double = 2.0;");
        assert!(!compilation.has_errors());
        assert_eq!(compilation.program.globals.len(), 1);
    }

    #[test]
    fn test_locals_live_in_stack_slots() {
        assert_eq!(
            ops("{ var a: int = 1; var b: int = a; print b; }"),
            vec![
                Op::Constant(0),
                Op::NewLocal(0),
                Op::GetLocal(0),
                Op::NewLocal(1),
                Op::GetLocal(1),
                Op::Print,
                Op::Pop,
                Op::Pop,
            ]
        );
    }

    #[test]
    fn test_shadowing_resolves_innermost() {
        let code = ops("{ var a: int = 1; { var a: int = 2; print a; } print a; }");
        assert!(code.contains(&Op::GetLocal(1)));
        let prints: Vec<usize> = code
            .iter()
            .enumerate()
            .filter(|(_, op)| **op == Op::Print)
            .map(|(ip, _)| ip)
            .collect();
        assert_eq!(code[prints[0] - 1], Op::GetLocal(1));
        assert_eq!(code[prints[1] - 1], Op::GetLocal(0));
    }

    #[test]
    fn test_local_assignment() {
        let code = ops("{ var a: int = 1; a = 5; }");
        assert_eq!(code[3], Op::SetLocal(0));
    }

    #[test]
    fn test_if_else_shape() {
        assert_eq!(
            ops("if (true) print 1; else print 2;"),
            vec![
                Op::Constant(0),
                Op::JumpIfFalse(6),
                Op::Pop,
                Op::Constant(1),
                Op::Print,
                Op::Jump(9),
                Op::Pop,
                Op::Constant(2),
                Op::Print,
            ]
        );
    }

    #[test]
    fn test_while_shape() {
        let code = ops("var i: int = 0; while (i < 3) i = i + 1;");
        // start of the loop is right after the global definition
        assert_eq!(code[2], Op::LoadGlobal(0));
        let back = code
            .iter()
            .rposition(|op| matches!(op, Op::Jump(_)))
            .unwrap();
        assert_eq!(code[back], Op::Jump(2));
        assert_eq!(code[5], Op::JumpIfFalse(back + 1));
        assert_eq!(code.last(), Some(&Op::Pop));
    }

    #[test]
    fn test_seeded_globals_keep_their_slots() {
        let tokens = tokenize("print y;");
        let compilation =
            Compiler::with_globals(&tokens, vec!["x".into(), "y".into()]).compile();
        assert!(!compilation.has_errors());
        assert_eq!(compilation.program.code[0].op, Op::LoadGlobal(1));
    }

    // =========================================================================
    // Errors and recovery
    // =========================================================================

    #[test]
    fn test_missing_semicolon() {
        let compilation = compile_src("1 + 2");
        assert_eq!(compilation.errors.len(), 1);
        assert!(matches!(
            compilation.errors[0].kind,
            CompileErrorKind::MissingCharacter { expected: "';'", .. }
        ));
    }

    #[test]
    fn test_two_malformed_statements_report_two_errors() {
        let compilation = compile_src("1 2;\n3 4;\nprint 5;");
        assert_eq!(compilation.errors.len(), 2);
        assert_eq!(compilation.errors[0].line, 1);
        assert_eq!(compilation.errors[1].line, 2);
        // parsing resumed and compiled the valid statement after them
        assert_eq!(
            compilation.program.code.last().map(|i| i.op),
            Some(Op::Print)
        );
    }

    #[test]
    fn test_one_error_per_malformed_statement() {
        let compilation = compile_src("1 + ; 2 * * 3; 4;");
        assert_eq!(compilation.errors.len(), 2);
        assert!(compilation
            .errors
            .iter()
            .all(|e| e.kind == CompileErrorKind::ExpectedExpression));
    }

    #[test]
    fn test_undefined_variable() {
        let compilation = compile_src("print nope;");
        assert_eq!(
            compilation.errors[0].kind,
            CompileErrorKind::UndefinedVariable("nope".into())
        );
    }

    #[test]
    fn test_duplicate_local() {
        let compilation = compile_src("{ var a: int = 1; var a: int = 2; }");
        assert_eq!(
            compilation.errors[0].kind,
            CompileErrorKind::AlreadyDeclared("a".into())
        );
    }

    #[test]
    fn test_local_read_in_own_initializer() {
        let compilation = compile_src("{ var a: int = a; }");
        assert_eq!(
            compilation.errors[0].kind,
            CompileErrorKind::ReadInOwnInitializer("a".into())
        );
    }

    #[test]
    fn test_invalid_assignment_target() {
        let compilation = compile_src("1 = 2;");
        assert_eq!(
            compilation.errors[0].kind,
            CompileErrorKind::InvalidAssignmentTarget
        );
    }

    #[test]
    fn test_missing_type_name() {
        let compilation = compile_src("var x = 1;");
        assert_eq!(compilation.errors.len(), 1);
        assert!(matches!(
            compilation.errors[0].kind,
            CompileErrorKind::MissingCharacter { expected: "':'", .. }
        ));
    }

    #[test]
    fn test_lexical_error_is_reported() {
        let compilation = compile_src("1 & 2;\nprint 3;");
        assert_eq!(compilation.errors.len(), 1);
        assert!(matches!(
            compilation.errors[0].kind,
            CompileErrorKind::Lexical(_)
        ));
        assert_eq!(
            compilation.program.code.last().map(|i| i.op),
            Some(Op::Print)
        );
    }

    #[test]
    fn test_stray_closing_brace_does_not_hang() {
        let compilation = compile_src("} print 1;");
        assert_eq!(compilation.errors.len(), 1);
        assert_eq!(
            compilation.program.code.last().map(|i| i.op),
            Some(Op::Print)
        );
    }

    #[test]
    fn test_unterminated_block() {
        let compilation = compile_src("{ print 1;");
        assert_eq!(compilation.errors.len(), 1);
        assert!(matches!(
            compilation.errors[0].kind,
            CompileErrorKind::MissingCharacter { expected: "'}'", .. }
        ));
    }

    #[test]
    fn test_empty_input() {
        let compilation = compile(&[]);
        assert!(!compilation.has_errors());
        assert!(compilation.program.is_empty());
    }
}
