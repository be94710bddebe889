use crate::lexer::tokens::{Token, TokenKind};
use crate::lexer::Lexer;

impl Lexer {
  /// Makes a numeric literal token. Lox numbers are decimal digits with an
  /// optional fractional part; the '.' is only part of the number when a
  /// digit follows it.
  pub(super) fn make_numeric_token(&mut self) -> Token {
    while self.get_current().is_ascii_digit() {
      self.advance();
    }

    if self.get_current() == '.' && self.get_next().is_ascii_digit() {
      // Consume the '.'
      self.advance();

      while self.get_current().is_ascii_digit() {
        self.advance();
      }
    }

    self.make_token(TokenKind::NUM_LIT)
  }
}
