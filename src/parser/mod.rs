use crate::ast::ASTNode;
use crate::errors::{error_report_at_token, ErrorReport};
use crate::lexer::tokens::{Token, TokenKind};
use crate::lexer::Lexer;

// Submodules
mod expressions;
mod statements;

/// Represents the parser for the tree-walking back-end, which converts
/// source text into an abstract syntax tree representation of the program.
pub struct Parser {
  /// The lexer used in this parser.
  lexer: Lexer,
  /// The previously consumed token.
  previous: Token,
  /// The current token.
  current: Token,
  /// Whether the parser is in error-recovery mode or not.
  is_in_panic: bool,
  /// A list of reported errors generated while parsing.
  errors: Vec<ErrorReport>,
}

impl Parser {
  /// Parses a string of source text into a Lox AST.
  ///
  /// # Parameters
  /// - `src`: The source string for the program.
  ///
  /// # Returns
  /// - `Ok(Vec<ASTNode>)`: The program's list of declarations.
  /// - `Err(Vec<ErrorReport>)`: A list of parsing errors.
  pub fn parse(src: &str) -> Result<Vec<ASTNode>, Vec<ErrorReport>> {
    let mut parser = Parser {
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
      is_in_panic: false,
      errors: vec![],
    };

    let mut program: Vec<ASTNode> = vec![];

    parser.advance();
    while !parser.matches(&TokenKind::EOF) {
      match parser.parse_declaration() {
        Some(node) => program.push(node),
        None => {
          // Keep parsing after an error to catch other errors in the
          // program; the AST will of course not be usable.
        }
      }
    }

    if parser.errors.is_empty() {
      Ok(program)
    } else {
      Err(parser.errors)
    }
  }

  /// Checks that the current token matches the token kind provided.
  fn check(&self, kind: &TokenKind) -> bool {
    self.current.kind.type_match(kind)
  }

  /// Checks that the current token matches the token kind provided.
  /// If the tokens match, the current token gets consumed and the function
  /// returns true. Otherwise the token is not consumed and the function
  /// returns false.
  fn matches(&mut self, kind: &TokenKind) -> bool {
    if self.check(kind) {
      self.advance();
      true
    } else {
      false
    }
  }

  /// Advances the parser to the next token.
  fn advance(&mut self) {
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

  /// Consumes the current token only if it is of a given kind. If the
  /// token does not match the kind, emits a parser error.
  ///
  /// # Parameters
  /// - `kind`: The expected kind of the token to consume.
  /// - `message`: The error message to be displayed if the current token
  /// does not match the provided kind.
  fn consume(&mut self, kind: &TokenKind, message: &str) -> bool {
    if self.check(kind) {
      self.advance();
      return true;
    }

    self.error_at_current(message);
    false
  }

  /// Emits a parser error at the current token.
  fn error_at_current(&mut self, message: &str) {
    self.error_at_token(&self.current.clone(), message);
  }

  /// Emits a parser error at the previous token.
  fn error_at_previous(&mut self, message: &str) {
    self.error_at_token(&self.previous.clone(), message);
  }

  /// Emits a parser error at the given token. While the parser is in panic
  /// mode, further errors are swallowed until `synchronize` recovers at a
  /// statement boundary.
  fn error_at_token(&mut self, token: &Token, message: &str) {
    if self.is_in_panic {
      return;
    }
    self.is_in_panic = true;

    self.errors.push(error_report_at_token(token, message));
  }

  /// Synchronizes the parser when it has found an error. This method helps
  /// minimize the number of cascading errors the parser emits when it finds
  /// a parsing error. Once it reaches a synchronization point, like a
  /// keyword for a statement, it starts emitting errors again.
  fn synchronize(&mut self) {
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
