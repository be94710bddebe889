use crate::compiler::precedence::{get_rule, ParseFn, Precedence};
use crate::compiler::Compiler;
use crate::core::bytecode::OpCode;
use crate::lexer::tokens::TokenKind;
use crate::objects::Value;

impl<'a> Compiler<'a> {
  /// Compiles a full expression, starting at assignment precedence.
  pub(super) fn parse_expression(&mut self) {
    self.parse_precedence(Precedence::PREC_ASSIGNMENT);
  }

  /// The core of the Pratt parser: consumes one token, runs its prefix
  /// action, then keeps folding infix actions while the next token binds at
  /// least as tightly as the given precedence.
  ///
  /// # Parameters
  /// - `precedence`: The lowest precedence this parse is willing to fold.
  pub(super) fn parse_precedence(&mut self, precedence: Precedence) {
    self.advance();

    // Assignment is only allowed when the surrounding rule binds loosely
    // enough for a whole assignment target to have been parsed.
    let can_assign = precedence <= Precedence::PREC_ASSIGNMENT;

    match get_rule(self.previous.kind).prefix {
      ParseFn::NONE => {
        self.error_at_previous("Expect expression.");
        return;
      }
      prefix => self.exec_parse_fn(prefix, can_assign),
    }

    while precedence <= get_rule(self.current.kind).precedence {
      self.advance();
      let infix = get_rule(self.previous.kind).infix;
      self.exec_parse_fn(infix, can_assign);
    }

    if can_assign && self.matches(&TokenKind::EQUALS) {
      self.error_at_previous("Invalid assignment target.");
    }
  }

  /// Executes the parsing function associated with a token's parse rule.
  fn exec_parse_fn(&mut self, func: ParseFn, can_assign: bool) {
    match func {
      ParseFn::CompileBinaryExpr => self.compile_binary_expr(),
      ParseFn::CompileFuncCall => self.compile_func_call(),
      ParseFn::CompileGrouping => self.compile_grouping(),
      ParseFn::CompileLiteral => self.compile_literal(),
      ParseFn::CompileLogicAnd => self.compile_logic_and(),
      ParseFn::CompileLogicOr => self.compile_logic_or(),
      ParseFn::CompileNumeric => self.compile_numeric(),
      ParseFn::CompileString => self.compile_string(),
      ParseFn::CompileUnary => self.compile_unary(),
      ParseFn::CompileVariable => self.compile_variable(can_assign),
      ParseFn::NONE => {}
    }
  }

  /// Compiles a parenthesized expression.
  fn compile_grouping(&mut self) {
    self.parse_expression();
    self.consume(&TokenKind::R_PAREN, "Expect ')' after expression.");
  }

  /// Compiles a numeric literal.
  fn compile_numeric(&mut self) {
    let token = self.previous.clone();

    match token.lexeme.parse::<f64>() {
      Ok(num) => self.emit_constant(Value::Number(num), &token),
      Err(_) => self.error_at_previous("Invalid numeric literal."),
    }
  }

  /// Compiles a string literal. The contents are interned so that duplicate
  /// spellings share a single handle and a single constant-pool entry.
  fn compile_string(&mut self) {
    let token = self.previous.clone();
    let handle = self.interner.intern(&token.lexeme);
    self.emit_constant(Value::Str(handle), &token);
  }

  /// Compiles a `nil`, `true`, or `false` literal.
  fn compile_literal(&mut self) {
    let line = self.previous.line_num;

    match self.previous.kind {
      TokenKind::NIL_LIT => self.emit_op_code(OpCode::LoadImmNil, line),
      TokenKind::TRUE_LIT => self.emit_op_code(OpCode::LoadImmTrue, line),
      TokenKind::FALSE_LIT => self.emit_op_code(OpCode::LoadImmFalse, line),
      _ => unreachable!("Expected a literal token."),
    }
  }

  /// Compiles a unary `-` or `!` expression.
  fn compile_unary(&mut self) {
    let token = self.previous.clone();

    self.parse_precedence(Precedence::PREC_UNARY);

    match token.kind {
      TokenKind::MINUS => self.emit_op_code(OpCode::Negate, token.line_num),
      TokenKind::BANG => self.emit_op_code(OpCode::LogicNot, token.line_num),
      _ => unreachable!("Expected a unary operator token."),
    }
  }

  /// Compiles a binary expression. The right operand is parsed one
  /// precedence level higher than the operator, which makes every binary
  /// operator left-associative.
  fn compile_binary_expr(&mut self) {
    let token = self.previous.clone();
    let precedence = get_rule(token.kind).precedence;

    self.parse_precedence(precedence.one_higher());

    let instr = match token.kind {
      TokenKind::PLUS => OpCode::Add,
      TokenKind::MINUS => OpCode::Subtract,
      TokenKind::STAR => OpCode::Multiply,
      TokenKind::SLASH => OpCode::Divide,
      TokenKind::LOGIC_EQ => OpCode::Equals,
      TokenKind::LOGIC_NOT_EQ => OpCode::NotEquals,
      TokenKind::GREATER_THAN => OpCode::GreaterThan,
      TokenKind::GREATER_THAN_EQ => OpCode::GreaterThanEq,
      TokenKind::LESS_THAN => OpCode::LessThan,
      TokenKind::LESS_THAN_EQ => OpCode::LessThanEq,
      _ => unreachable!("Expected a binary operator token."),
    };

    self.emit_op_code(instr, token.line_num);
  }

  /// Compiles a short-circuit `and` expression. When the left operand is
  /// falsey the jump skips the right operand, leaving the left operand on
  /// the stack as the result.
  fn compile_logic_and(&mut self) {
    let token = self.previous.clone();

    let end_jump = self.emit_jump(OpCode::JumpIfFalse, token.line_num);
    self.emit_op_code(OpCode::PopStackTop, token.line_num);

    self.parse_precedence(Precedence::PREC_AND);
    self.patch_jump(end_jump, &token);
  }

  /// Compiles a short-circuit `or` expression. When the left operand is
  /// falsey, control falls through to the right operand; otherwise the
  /// left operand stays on the stack as the result.
  fn compile_logic_or(&mut self) {
    let token = self.previous.clone();

    let else_jump = self.emit_jump(OpCode::JumpIfFalse, token.line_num);
    let end_jump = self.emit_jump(OpCode::JumpForward, token.line_num);

    self.patch_jump(else_jump, &token);
    self.emit_op_code(OpCode::PopStackTop, token.line_num);

    self.parse_precedence(Precedence::PREC_OR);
    self.patch_jump(end_jump, &token);
  }

  /// Compiles an identifier expression: a read of, or an assignment to, a
  /// local, an up-value, or a global.
  fn compile_variable(&mut self, can_assign: bool) {
    let token = self.previous.clone();
    self.named_variable(&token, can_assign);
  }

  /// Compiles a function call's argument list and the call instruction.
  fn compile_func_call(&mut self) {
    let token = self.previous.clone();
    let arg_count = self.compile_arguments();
    self.emit_op_code_with_byte(OpCode::FuncCall, arg_count, token.line_num);
  }

  /// Compiles the comma-separated argument list of a function call.
  ///
  /// # Returns
  /// - `u8`: The number of arguments compiled.
  fn compile_arguments(&mut self) -> u8 {
    let mut arg_count: u16 = 0;

    if !self.check(&TokenKind::R_PAREN) {
      loop {
        self.parse_expression();

        if arg_count == 255 {
          self.error_at_previous("Can't have more than 255 arguments.");
        } else {
          arg_count += 1;
        }

        if !self.matches(&TokenKind::COMMA) {
          break;
        }
      }
    }

    self.consume(&TokenKind::R_PAREN, "Expect ')' after arguments.");
    arg_count as u8
  }
}
