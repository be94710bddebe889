use crate::lexer::tokens::{Token, TokenKind};
use crate::lexer::Lexer;

impl Lexer {
  /// Makes a string literal token. The opening quote has already been
  /// consumed; scanning stops at the closing quote, tracking any newlines
  /// embedded in the literal.
  pub(super) fn make_string_token(&mut self) -> Token {
    // Do not include the opening quote in the lexeme.
    self.token_start += 1;

    loop {
      if self.is_at_end() {
        return self.make_error_token("Unterminated string.");
      }

      if self.get_current() == '"' {
        break;
      }

      // Advance through the string, taking new lines into account.
      if self.advance() == '\n' {
        self.line_num += 1;
      }
    }

    let tok = self.make_token(TokenKind::STR_LIT);

    // Consume the closing quote.
    self.advance();

    tok
  }
}
