use crate::compiler::symbols::{Symbol, SymbolTable};
use crate::compiler::{Compiler, FunctionScope, UpValue};
use crate::core::bytecode::OpCode;
use crate::core::FUNC_ARGS_MAX;
use crate::lexer::tokens::{Token, TokenKind};
use crate::objects::{FuncObject, Value};

impl<'a> Compiler<'a> {
  /// Compiles a `fun` declaration: the function body becomes its own chunk
  /// inside a new function scope, and the resulting function value is bound
  /// to the declared name.
  pub(super) fn parse_fun_declaration(&mut self) {
    self.consume(&TokenKind::IDENTIFIER, "Expect function name.");
    let name = self.previous.clone();

    self.declare_variable(&name);

    // Mark the declaration initialized right away so that the function's
    // own body can refer to it recursively.
    if !self.is_global_scope() {
      self.current_func_scope_mut().s_table.mark_initialized_last();
    }

    self.compile_function_body(&name);
    self.define_variable(&name);
  }

  /// Compiles a function's parameter list and body into a fresh chunk.
  /// Once compiled, the function value is emitted into the enclosing
  /// function, either as a plain constant or through a `MakeClosure` when
  /// the body captured enclosing locals.
  fn compile_function_body(&mut self, name: &Token) {
    self.functions.push(FunctionScope {
      function: FuncObject {
        name: name.lexeme.clone(),
        ..Default::default()
      },
      // Slot zero of the new frame holds the callee. Naming it after the
      // function lets the body resolve its own name without an up-value.
      s_table: SymbolTable::new(vec![Symbol {
        name: name.lexeme.clone(),
        depth: 0,
        is_initialized: true,
        is_captured: false,
      }]),
      scope_depth: 0,
      up_values: vec![],
    });

    self.begin_scope();

    self.consume(&TokenKind::L_PAREN, "Expect '(' after function name.");
    if !self.check(&TokenKind::R_PAREN) {
      loop {
        if (self.current_func_scope().function.arity as usize) == FUNC_ARGS_MAX {
          self.error_at_current("Can't have more than 255 parameters.");
        } else {
          self.current_func_scope_mut().function.arity += 1;
        }

        self.consume(&TokenKind::IDENTIFIER, "Expect parameter name.");
        let param = self.previous.clone();
        self.declare_variable(&param);
        self.current_func_scope_mut().s_table.mark_initialized_last();

        if !self.matches(&TokenKind::COMMA) {
          break;
        }
      }
    }
    self.consume(&TokenKind::R_PAREN, "Expect ')' after parameters.");

    self.consume(&TokenKind::L_CURLY, "Expect '{' before function body.");
    self.parse_block();

    // Implicit `return nil` at the end of every function body.
    let line = self.previous.line_num;
    self.emit_op_code(OpCode::LoadImmNil, line);
    self.emit_op_code(OpCode::Return, line);

    let scope = self.functions.pop().unwrap();

    #[cfg(feature = "show_bytecode")]
    crate::disassembler::disassemble_chunk(&scope.function.chunk, &scope.function.name);

    self.emit_function(scope.function, scope.up_values, name);
  }

  /// Emits the code to place a compiled function value on the stack at
  /// runtime: a plain constant load when the function captured nothing, or
  /// a closure composition listing each captured variable otherwise.
  ///
  /// # Parameters
  /// - `function`: The compiled function object.
  /// - `up_values`: The up-values this function captured.
  /// - `token`: The function's name token.
  fn emit_function(&mut self, function: FuncObject, up_values: Vec<UpValue>, token: &Token) {
    let func = Value::from(function);

    if up_values.is_empty() {
      self.emit_constant(func, token);
      return;
    }

    if let Some(idx) = self.add_constant(func, token) {
      self.emit_var_width(OpCode::MakeClosure, OpCode::MakeClosureLong, idx, token.line_num);

      // Each captured variable is a pair: whether it is a local of the
      // enclosing function, and the slot or up-value index it lives at.
      for up in up_values {
        self.emit_raw_byte(u8::from(up.is_local), token.line_num);
        self.emit_raw_short(up.index as u16, token.line_num);
      }
    }
  }

  /// Compiles a `return` statement.
  pub(super) fn parse_return_stmt(&mut self) {
    let token = self.previous.clone();

    if self.functions.len() == 1 {
      self.error_at_token(&token, "Can't return from top-level code.");
    }

    if self.matches(&TokenKind::SEMICOLON) {
      self.emit_op_code(OpCode::LoadImmNil, token.line_num);
    } else {
      self.parse_expression();
      self.consume(&TokenKind::SEMICOLON, "Expect ';' after return value.");
    }

    self.emit_op_code(OpCode::Return, token.line_num);
  }
}
