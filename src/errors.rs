use crate::lexer::tokens::{Token, TokenKind};

/// A single diagnostic generated while scanning or compiling a program.
/// The message is stored fully formatted so that reporting is a plain
/// write to standard error.
#[derive(Debug)]
pub struct ErrorReport {
  pub line: usize,
  pub message: String,
}

/// Reports a list of compile-time errors to standard error, in the order
/// in which they were generated.
///
/// # Parameters
/// - `errors`: The list of generated errors.
pub fn report_errors_list(errors: &[ErrorReport]) {
  for error in errors {
    eprintln!("{}", error.message);
  }
}

/// Reports a runtime error to standard error: the message on its own line,
/// followed by the source line of the failing instruction.
///
/// # Parameters
/// - `message`: The error message to be displayed.
/// - `line`: The source line of the fault.
pub fn report_runtime_error(message: &str, line: usize) {
  eprintln!("{}", message);
  eprintln!("[line {}]", line);
}

/// Builds the diagnostic record for a compile-time error at the given
/// token. `EOF` tokens report "at end"; `ERROR` tokens already carry their
/// message as the lexeme, so no at-clause is printed for them.
///
/// # Parameters
/// - `token`: The token that caused the error.
/// - `message`: The error message.
pub fn error_report_at_token(token: &Token, message: &str) -> ErrorReport {
  let line = token.line_num;

  let message = match token.kind {
    TokenKind::EOF => format!("[line {}] Error at end: {}", line, message),
    TokenKind::ERROR => format!("[line {}] Error: {}", line, message),
    _ => format!("[line {}] Error at '{}': {}", line, token.lexeme, message),
  };

  ErrorReport { line, message }
}
