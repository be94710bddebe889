use crate::compiler::symbols::Symbol;
use crate::compiler::Compiler;
use crate::core::bytecode::OpCode;
use crate::lexer::tokens::{Token, TokenKind};

impl<'a> Compiler<'a> {
  /// Compiles a single declaration: a variable, function, or class
  /// declaration, or any other statement. Recovers at the next statement
  /// boundary after a parse error.
  pub(super) fn parse_declaration(&mut self) {
    if self.matches(&TokenKind::VAR_KW) {
      self.parse_var_declaration();
    } else if self.matches(&TokenKind::FUN_KW) {
      self.parse_fun_declaration();
    } else if self.matches(&TokenKind::CLASS_KW) {
      self.error_at_previous("Classes are not supported by the bytecode back-end (run with --tree-walk).");
    } else {
      self.parse_statement();
    }

    if self.is_in_panic {
      self.synchronize();
    }
  }

  /// Compiles a single statement.
  pub(super) fn parse_statement(&mut self) {
    if self.matches(&TokenKind::PRINT_KW) {
      self.parse_print_stmt();
    } else if self.matches(&TokenKind::IF_KW) {
      self.parse_if_stmt();
    } else if self.matches(&TokenKind::WHILE_KW) {
      self.parse_while_stmt();
    } else if self.matches(&TokenKind::FOR_KW) {
      self.parse_for_stmt();
    } else if self.matches(&TokenKind::RETURN_KW) {
      self.parse_return_stmt();
    } else if self.matches(&TokenKind::L_CURLY) {
      self.begin_scope();
      self.parse_block();
      self.end_scope();
    } else {
      self.parse_expression_stmt();
    }
  }

  /// Compiles an expression statement: the expression's value is discarded.
  fn parse_expression_stmt(&mut self) {
    self.parse_expression();
    self.consume(&TokenKind::SEMICOLON, "Expect ';' after expression.");
    self.emit_op_code(OpCode::PopStackTop, self.previous.line_num);
  }

  /// Compiles a `print` statement.
  fn parse_print_stmt(&mut self) {
    self.parse_expression();
    self.consume(&TokenKind::SEMICOLON, "Expect ';' after value.");
    self.emit_op_code(OpCode::Print, self.previous.line_num);
  }

  /// Compiles a `var` declaration. A missing initializer defaults the
  /// variable to `nil`.
  pub(super) fn parse_var_declaration(&mut self) {
    self.consume(&TokenKind::IDENTIFIER, "Expect variable name.");
    let name = self.previous.clone();

    self.declare_variable(&name);

    if self.matches(&TokenKind::EQUALS) {
      self.parse_expression();
    } else {
      self.emit_op_code(OpCode::LoadImmNil, name.line_num);
    }

    self.consume(&TokenKind::SEMICOLON, "Expect ';' after variable declaration.");
    self.define_variable(&name);
  }

  /// Declares a variable in the current scope. In the script's global
  /// scope declarations are late-bound, so nothing is recorded at compile
  /// time; in any other scope the name is pushed onto the symbol table in
  /// the `UNDEFINED` state so that its own initializer cannot read it.
  pub(super) fn declare_variable(&mut self, name: &Token) {
    if self.is_global_scope() {
      return;
    }

    let depth = self.current_func_scope().scope_depth;

    if self.current_func_scope().s_table.find_in_scope(&name.lexeme, depth).is_some() {
      self.error_at_token(name, "Already a variable with this name in this scope.");
      return;
    }

    if self.current_func_scope().s_table.len() >= (u16::MAX as usize) + 1 {
      self.error_at_token(name, "Too many local variables in function.");
      return;
    }

    self.current_func_scope_mut().s_table.push(Symbol {
      name: name.lexeme.clone(),
      depth,
      is_initialized: false,
      is_captured: false,
    });
  }

  /// Defines the most recently declared variable. Globals emit a
  /// `DefineGlobal` instruction keyed by the interned identifier; locals
  /// simply flip to the `DEFINED` state, since their value is already
  /// sitting in the right stack slot.
  pub(super) fn define_variable(&mut self, name: &Token) {
    if self.is_global_scope() {
      if let Some(idx) = self.make_identifier_constant(name) {
        self.emit_var_width(OpCode::DefineGlobal, OpCode::DefineGlobalLong, idx, name.line_num);
      }
      return;
    }

    self.current_func_scope_mut().s_table.mark_initialized_last();
  }

  /// Compiles the declarations of a block, up to the closing brace.
  pub(super) fn parse_block(&mut self) {
    while !self.check(&TokenKind::R_CURLY) && !self.check(&TokenKind::EOF) {
      self.parse_declaration();
    }

    self.consume(&TokenKind::R_CURLY, "Expect '}' after block.");
  }

  /// Starts a new lexical scope.
  pub(super) fn begin_scope(&mut self) {
    self.current_func_scope_mut().scope_depth += 1;
  }

  /// Ends the current lexical scope, popping every local it declared off
  /// the runtime stack (and off the symbol table).
  pub(super) fn end_scope(&mut self) {
    let depth = self.current_func_scope().scope_depth;
    let popped = self.current_func_scope_mut().s_table.pop_scope(depth);

    self.current_func_scope_mut().scope_depth -= 1;
    self.emit_stack_pops(popped);
  }

  /// Emits the pop instructions for a list of popped symbols: one
  /// `PopCloseUpVal` per captured local when any slot was captured, and a
  /// single counted pop otherwise.
  ///
  /// # Parameters
  /// - `symbols`: The `is_captured` flag of each popped symbol.
  fn emit_stack_pops(&mut self, symbols: Vec<bool>) {
    let line = self.previous.line_num;

    if symbols.is_empty() {
      return;
    }

    if symbols.iter().any(|is_captured| *is_captured) {
      for is_captured in symbols {
        self.emit_op_code(
          if is_captured {
            OpCode::PopCloseUpVal
          } else {
            OpCode::PopStackTop
          },
          line,
        );
      }
      return;
    }

    if symbols.len() == 1 {
      self.emit_op_code(OpCode::PopStackTop, line);
      return;
    }

    let mut remaining = symbols.len();
    while remaining > 0 {
      let count = remaining.min(255);
      self.emit_op_code_with_byte(OpCode::PopStackTopN, count as u8, line);
      remaining -= count;
    }
  }

  /// Compiles an `if` statement, optionally with an `else` branch.
  fn parse_if_stmt(&mut self) {
    let token = self.previous.clone();

    self.consume(&TokenKind::L_PAREN, "Expect '(' after 'if'.");
    self.parse_expression();
    self.consume(&TokenKind::R_PAREN, "Expect ')' after condition.");

    let then_jump = self.emit_jump(OpCode::PopJumpIfFalse, token.line_num);
    self.parse_statement();

    let else_jump = self.emit_jump(OpCode::JumpForward, token.line_num);
    self.patch_jump(then_jump, &token);

    if self.matches(&TokenKind::ELSE_KW) {
      self.parse_statement();
    }

    self.patch_jump(else_jump, &token);
  }

  /// Compiles a `while` statement.
  fn parse_while_stmt(&mut self) {
    let token = self.previous.clone();
    let loop_start = self.current_chunk().len();

    self.consume(&TokenKind::L_PAREN, "Expect '(' after 'while'.");
    self.parse_expression();
    self.consume(&TokenKind::R_PAREN, "Expect ')' after condition.");

    let exit_jump = self.emit_jump(OpCode::PopJumpIfFalse, token.line_num);

    self.parse_statement();
    self.emit_loop(loop_start, &token);

    self.patch_jump(exit_jump, &token);
  }

  /// Compiles a `for` statement by desugaring it into
  /// `{ init; while (cond) { body; increment; } }`. The increment clause
  /// appears before the body in the source but must execute after it, so
  /// its bytecode is compiled in place, extracted from the chunk, and
  /// spliced back in after the body.
  fn parse_for_stmt(&mut self) {
    let token = self.previous.clone();

    self.begin_scope();
    self.consume(&TokenKind::L_PAREN, "Expect '(' after 'for'.");

    // Initializer clause.
    if self.matches(&TokenKind::SEMICOLON) {
      // No initializer.
    } else if self.matches(&TokenKind::VAR_KW) {
      self.parse_var_declaration();
    } else {
      self.parse_expression_stmt();
    }

    let loop_start = self.current_chunk().len();

    // Condition clause.
    let mut exit_jump = None;
    if !self.matches(&TokenKind::SEMICOLON) {
      self.parse_expression();
      self.consume(&TokenKind::SEMICOLON, "Expect ';' after loop condition.");
      exit_jump = Some(self.emit_jump(OpCode::PopJumpIfFalse, token.line_num));
    }

    // Increment clause: compile it here, then pull its bytes out of the
    // chunk so they can be replayed after the loop body. Any jumps inside
    // the clause are relative, so relocation preserves them.
    let mut increment: Vec<(u8, usize)> = vec![];
    if !self.check(&TokenKind::R_PAREN) {
      let increment_start = self.current_chunk().len();

      self.parse_expression();
      self.emit_op_code(OpCode::PopStackTop, self.previous.line_num);

      while self.current_chunk().len() > increment_start {
        match self.current_chunk_mut().pop_byte() {
          Some(entry) => increment.push(entry),
          None => break,
        }
      }
      increment.reverse();
    }
    self.consume(&TokenKind::R_PAREN, "Expect ')' after for clauses.");

    // Loop body.
    self.parse_statement();

    // Splice the saved increment back in after the body.
    for (byte, line) in increment {
      self.current_chunk_mut().push_byte(byte, line);
    }

    self.emit_loop(loop_start, &token);

    if let Some(jump) = exit_jump {
      self.patch_jump(jump, &token);
    }

    self.end_scope();
  }
}
