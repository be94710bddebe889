use crate::core::bytecode::OpCode;
use crate::core::chunk::Chunk;
use crate::errors::{error_report_at_token, ErrorReport};
use crate::lexer::tokens::{Token, TokenKind};
use crate::lexer::Lexer;
use crate::objects::str_obj::StringInterner;
use crate::objects::{FuncObject, Value};

// Submodules
mod expressions;
mod functions;
mod precedence;
mod resolver;
mod statements;
pub mod symbols;

use symbols::{Symbol, SymbolTable};

/// Represents an up-value captured by the function currently being
/// compiled: either a local slot of the directly enclosing function, or an
/// up-value index of that enclosing function.
#[derive(Clone)]
pub struct UpValue {
  pub index: usize,
  pub is_local: bool,
}

/// Represents a function currently being compiled. The compiler keeps a
/// stack of these: the bottom entry is the script itself, and nested
/// function declarations push and pop entries on top of it.
struct FunctionScope {
  function: FuncObject,
  s_table: SymbolTable,
  scope_depth: usize,
  up_values: Vec<UpValue>,
}

/// Represents the single-pass compiler and its internal state. Tokens are
/// pulled from the lexer on demand and bytecode is emitted directly into
/// the chunk of the innermost function scope.
pub struct Compiler<'a> {
  lexer: Lexer,
  previous: Token,
  current: Token,
  had_error: bool,
  is_in_panic: bool,
  errors: Vec<ErrorReport>,
  functions: Vec<FunctionScope>,
  interner: &'a mut StringInterner,
}

impl<'a> Compiler<'a> {
  /// Compiles a source string into the bytecode function for the script's
  /// global scope.
  ///
  /// # Parameters
  /// - `src`: The source text to be compiled.
  /// - `interner`: The string interner that will own every string literal
  /// and identifier constant produced by this compilation.
  ///
  /// # Returns
  /// - `Ok(FuncObject)`: The script function, when no errors were generated.
  /// - `Err(Vec<ErrorReport>)`: The list of compile-time errors otherwise.
  pub fn compile(src: &str, interner: &'a mut StringInterner) -> Result<FuncObject, Vec<ErrorReport>> {
    let mut compiler = Self {
      lexer: Lexer::lex(src),
      previous: Token {
        line_num: 0,
        kind: TokenKind::__INIT__,
        lexeme: String::new(),
      },
      current: Token {
        line_num: 0,
        kind: TokenKind::__INIT__,
        lexeme: String::new(),
      },
      had_error: false,
      is_in_panic: false,
      errors: vec![],
      functions: vec![FunctionScope {
        function: FuncObject {
          name: String::from("<script>"),
          ..Default::default()
        },
        // The first slot of every call frame belongs to the callee, so the
        // symbol table starts with a placeholder the program cannot name.
        s_table: SymbolTable::new(vec![Symbol {
          name: String::new(),
          depth: 0,
          is_initialized: true,
          is_captured: false,
        }]),
        scope_depth: 0,
        up_values: vec![],
      }],
      interner,
    };

    compiler.advance();
    while !compiler.matches(&TokenKind::EOF) {
      compiler.parse_declaration();
    }

    let line = compiler.previous.line_num;
    compiler.emit_op_code(OpCode::LoadImmNil, line);
    compiler.emit_op_code(OpCode::Return, line);

    if compiler.had_error {
      return Err(compiler.errors);
    }

    let script = compiler.functions.pop().unwrap().function;

    #[cfg(feature = "show_bytecode")]
    crate::disassembler::disassemble_chunk(&script.chunk, &script.name);

    Ok(script)
  }

  /// Gets the function scope currently being compiled.
  fn current_func_scope(&self) -> &FunctionScope {
    self.functions.last().unwrap()
  }

  /// Gets a mutable reference to the function scope currently being compiled.
  fn current_func_scope_mut(&mut self) -> &mut FunctionScope {
    self.functions.last_mut().unwrap()
  }

  /// Gets the chunk of the function currently being compiled.
  pub(super) fn current_chunk(&self) -> &Chunk {
    &self.current_func_scope().function.chunk
  }

  /// Gets a mutable reference to the chunk of the function currently being
  /// compiled.
  pub(super) fn current_chunk_mut(&mut self) -> &mut Chunk {
    &mut self.current_func_scope_mut().function.chunk
  }

  /// Whether the compiler is emitting declarations for the script's global
  /// scope, where variables are late-bound by name at runtime.
  pub(super) fn is_global_scope(&self) -> bool {
    self.functions.len() == 1 && self.current_func_scope().scope_depth == 0
  }

  /// Checks that the current token matches the token kind provided.
  pub(super) fn check(&self, kind: &TokenKind) -> bool {
    self.current.kind.type_match(kind)
  }

  /// Checks that the current token matches the token kind provided.
  /// If the tokens match, the current token gets consumed and the function
  /// returns true. Otherwise the token is not consumed and the function
  /// returns false.
  pub(super) fn matches(&mut self, kind: &TokenKind) -> bool {
    if self.check(kind) {
      self.advance();
      true
    } else {
      false
    }
  }

  /// Advances the compiler to the next token. Lexical errors surface here
  /// as `ERROR` tokens and are reported through the compile-error path.
  pub(super) fn advance(&mut self) {
    self.previous = self.current.clone();

    loop {
      self.current = self.lexer.next_token();

      match self.current.kind {
        TokenKind::ERROR => {
          let message = self.current.lexeme.clone();
          self.error_at_token(&self.current.clone(), &message);
        }
        _ => break,
      }
    }
  }

  /// Consumes the current token only if it is of a given kind. If the token
  /// does not match the kind, emits a compiler error.
  ///
  /// # Parameters
  /// - `kind`: The expected kind of the token to consume.
  /// - `message`: The error message to be displayed if the current token
  /// does not match the provided kind.
  pub(super) fn consume(&mut self, kind: &TokenKind, message: &str) {
    if self.check(kind) {
      self.advance();
      return;
    }

    self.error_at_current(message);
  }

  /// Emits a byte instruction from an OpCode into the current chunk.
  pub(super) fn emit_op_code(&mut self, instr: OpCode, line: usize) {
    self.current_chunk_mut().push_op_code(instr, line);
  }

  /// Emits a raw byte into the current chunk.
  pub(super) fn emit_raw_byte(&mut self, byte: u8, line: usize) {
    self.current_chunk_mut().push_byte(byte, line);
  }

  /// Emits a raw 16-bit short into the current chunk.
  pub(super) fn emit_raw_short(&mut self, short: u16, line: usize) {
    self.current_chunk_mut().push_short(short, line);
  }

  /// Emits an OpCode followed by a one-byte operand.
  pub(super) fn emit_op_code_with_byte(&mut self, instr: OpCode, byte: u8, line: usize) {
    self.emit_op_code(instr, line);
    self.emit_raw_byte(byte, line);
  }

  /// Emits an OpCode followed by a two-byte operand.
  pub(super) fn emit_op_code_with_short(&mut self, instr: OpCode, short: u16, line: usize) {
    self.emit_op_code(instr, line);
    self.emit_raw_short(short, line);
  }

  /// Emits either the one-byte-operand or the two-byte-operand form of an
  /// instruction, based on the size of the operand.
  ///
  /// # Parameters
  /// - `std`: The instruction that takes a one-byte operand.
  /// - `long`: The instruction that takes a two-byte operand.
  /// - `operand`: The operand value.
  pub(super) fn emit_var_width(&mut self, std: OpCode, long: OpCode, operand: u16, line: usize) {
    if operand < 256 {
      self.emit_op_code_with_byte(std, operand as u8, line);
    } else {
      self.emit_op_code_with_short(long, operand, line);
    }
  }

  /// Emits a jump instruction with a placeholder offset, to be replaced by
  /// a later call to `patch_jump`.
  ///
  /// # Returns
  /// - `usize`: The chunk position of the jump's two-byte operand.
  pub(super) fn emit_jump(&mut self, instr: OpCode, line: usize) -> usize {
    self.emit_op_code(instr, line);
    self.emit_raw_short(0xffff, line);
    self.current_chunk().len() - 2
  }

  /// Patches the offset of a previously emitted jump so that it lands on
  /// the next instruction to be emitted.
  ///
  /// # Parameters
  /// - `operand_pos`: The chunk position of the jump's operand.
  /// - `token`: The token associated with this jump.
  pub(super) fn patch_jump(&mut self, operand_pos: usize, token: &Token) {
    // The -2 adjusts for the jump's own operand bytes, which the VM will
    // have consumed by the time it applies the offset.
    let jump = match u16::try_from(self.current_chunk().len() - operand_pos - 2) {
      Ok(x) => x,
      Err(_) => {
        self.error_at_token(token, "Too much code to jump over.");
        return;
      }
    };

    let bytes = jump.to_le_bytes();
    self.current_chunk_mut().modify_byte(operand_pos, bytes[0]);
    self.current_chunk_mut().modify_byte(operand_pos + 1, bytes[1]);
  }

  /// Emits a backwards jump to the provided loop start position.
  pub(super) fn emit_loop(&mut self, loop_start: usize, token: &Token) {
    self.emit_op_code(OpCode::LoopJump, token.line_num);

    // +2 to account for the offset's own bytes.
    let offset = self.current_chunk().len() + 2 - loop_start;
    match u16::try_from(offset) {
      Ok(x) => self.emit_raw_short(x, token.line_num),
      Err(_) => {
        self.error_at_token(token, "Loop body too large.");
        self.emit_raw_short(0xffff, token.line_num);
      }
    }
  }

  /// Adds a constant to the current chunk's pool, reporting an error when
  /// the pool is full.
  pub(super) fn add_constant(&mut self, value: Value, token: &Token) -> Option<u16> {
    match self.current_chunk_mut().add_constant(value) {
      Ok(idx) => Some(idx),
      Err(_) => {
        self.error_at_token(token, "Too many constants in one chunk.");
        None
      }
    }
  }

  /// Emits the instruction to load a constant value onto the stack.
  pub(super) fn emit_constant(&mut self, value: Value, token: &Token) {
    if let Some(idx) = self.add_constant(value, token) {
      self.emit_var_width(OpCode::LoadConstant, OpCode::LoadConstantLong, idx, token.line_num);
    }
  }

  /// Interns the lexeme of the given token and stores the resulting string
  /// handle in the constant pool. Duplicate spellings share both the handle
  /// and the pool entry.
  pub(super) fn make_identifier_constant(&mut self, token: &Token) -> Option<u16> {
    let handle = self.interner.intern(&token.lexeme);
    self.add_constant(Value::Str(handle), token)
  }

  /// Emits a compiler error at the current token.
  pub(super) fn error_at_current(&mut self, message: &str) {
    self.error_at_token(&self.current.clone(), message);
  }

  /// Emits a compiler error at the previous token.
  pub(super) fn error_at_previous(&mut self, message: &str) {
    self.error_at_token(&self.previous.clone(), message);
  }

  /// Emits a compiler error at the given token. While the compiler is in
  /// panic mode, further errors are swallowed until `synchronize` recovers
  /// at a statement boundary.
  pub(super) fn error_at_token(&mut self, token: &Token, message: &str) {
    if self.is_in_panic {
      return;
    }
    self.is_in_panic = true;

    self.errors.push(error_report_at_token(token, message));
    self.had_error = true;
  }

  /// Synchronizes the compiler when it has found an error. This method
  /// helps minimize the number of cascading errors the compiler emits when
  /// it finds a parsing error. Once it reaches a synchronization point,
  /// like a keyword for a statement, it starts emitting errors again.
  pub(super) fn synchronize(&mut self) {
    self.is_in_panic = false;

    while !self.current.is_eof() {
      if let TokenKind::SEMICOLON = self.previous.kind {
        return;
      }

      match self.current.kind {
        TokenKind::CLASS_KW
        | TokenKind::FUN_KW
        | TokenKind::VAR_KW
        | TokenKind::FOR_KW
        | TokenKind::IF_KW
        | TokenKind::WHILE_KW
        | TokenKind::PRINT_KW
        | TokenKind::RETURN_KW => {
          return;
        }

        _ => {}
      }

      self.advance();
    }
  }
}
