use crate::compiler::{Compiler, UpValue};
use crate::core::bytecode::OpCode;
use crate::lexer::tokens::{Token, TokenKind};

/// The location of a resolved variable reference.
enum VarLoc {
  Local(usize),
  UpValue(usize),
  Global,
}

impl<'a> Compiler<'a> {
  /// Compiles a read of, or an assignment to, the named variable. The name
  /// resolves to a local slot of the current function first, then to an
  /// up-value captured from an enclosing function, and otherwise falls back
  /// to a late-bound global looked up by name at runtime.
  ///
  /// # Parameters
  /// - `token`: The identifier token being resolved.
  /// - `can_assign`: Whether the surrounding parse rule permits an `=`.
  pub(super) fn named_variable(&mut self, token: &Token, can_assign: bool) {
    let location = self.resolve_variable(token);
    let is_assignment = can_assign && self.matches(&TokenKind::EQUALS);

    if is_assignment {
      self.parse_expression();
    }

    let line = token.line_num;

    match location {
      VarLoc::Local(slot) => {
        let (std, long) = if is_assignment {
          (OpCode::SetLocal, OpCode::SetLocalLong)
        } else {
          (OpCode::GetLocal, OpCode::GetLocalLong)
        };
        self.emit_var_width(std, long, slot as u16, line);
      }
      VarLoc::UpValue(idx) => {
        let (std, long) = if is_assignment {
          (OpCode::SetUpVal, OpCode::SetUpValLong)
        } else {
          (OpCode::GetUpVal, OpCode::GetUpValLong)
        };
        self.emit_var_width(std, long, idx as u16, line);
      }
      VarLoc::Global => {
        if let Some(idx) = self.make_identifier_constant(token) {
          let (std, long) = if is_assignment {
            (OpCode::SetGlobal, OpCode::SetGlobalLong)
          } else {
            (OpCode::GetGlobal, OpCode::GetGlobalLong)
          };
          self.emit_var_width(std, long, idx, line);
        }
      }
    }
  }

  /// Resolves an identifier to its storage location.
  fn resolve_variable(&mut self, token: &Token) -> VarLoc {
    let current = self.functions.len() - 1;

    if let Some(slot) = self.resolve_local(current, token) {
      return VarLoc::Local(slot);
    }

    if let Some(idx) = self.resolve_up_value(current, token) {
      return VarLoc::UpValue(idx);
    }

    VarLoc::Global
  }

  /// Looks for a local symbol with the given token's name in the function
  /// scope at the provided index.
  ///
  /// # Returns
  /// - `Option<usize>`: The symbol's stack slot, when found.
  fn resolve_local(&mut self, func_idx: usize, token: &Token) -> Option<usize> {
    let resolution = self.functions[func_idx].s_table.resolve(&token.lexeme);

    if let Some((slot, is_initialized)) = resolution {
      if !is_initialized {
        self.error_at_token(token, "Can't read local variable in its own initializer.");
      }

      return Some(slot);
    }

    None
  }

  /// Looks for the given token's name in the local scopes of enclosing
  /// functions, promoting the matched local to an up-value in every
  /// function scope between the declaration and the reference.
  ///
  /// # Parameters
  /// - `func_idx`: The index of the function scope doing the referencing.
  /// - `token`: The identifier token being resolved.
  ///
  /// # Returns
  /// - `Option<usize>`: The index into the referencing function's up-value
  /// list, when the name resolved to an enclosing local.
  fn resolve_up_value(&mut self, func_idx: usize, token: &Token) -> Option<usize> {
    if func_idx == 0 {
      return None;
    }

    if let Some(slot) = self.resolve_local(func_idx - 1, token) {
      self.functions[func_idx - 1].s_table.mark_captured(slot);
      return self.add_up_value(func_idx, token, slot, true);
    }

    if let Some(idx) = self.resolve_up_value(func_idx - 1, token) {
      return self.add_up_value(func_idx, token, idx, false);
    }

    None
  }

  /// Adds an up-value to the list of up-values for the function scope at
  /// the given index, reusing an existing entry when the same variable has
  /// already been captured.
  fn add_up_value(&mut self, func_idx: usize, token: &Token, index: usize, is_local: bool) -> Option<usize> {
    for (i, up) in self.functions[func_idx].up_values.iter().enumerate() {
      if up.index == index && up.is_local == is_local {
        return Some(i);
      }
    }

    if self.functions[func_idx].up_values.len() >= (u16::MAX as usize) + 1 {
      self.error_at_token(token, "Too many closure variables in function.");
      return None;
    }

    self.functions[func_idx].up_values.push(UpValue { index, is_local });
    self.functions[func_idx].function.up_val_count += 1;

    Some(self.functions[func_idx].up_values.len() - 1)
  }
}
