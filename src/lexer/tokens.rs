// A token that represents a single unit of Lox code.
#[derive(Clone)]
pub struct Token {
  /// The token's line number
  pub line_num: usize,
  /// The token's type
  pub kind: TokenKind,
  /// The token's lexeme
  pub lexeme: String,
}

impl Token {
  /// Whether this token is the `EOF` token or not.
  pub fn is_eof(&self) -> bool {
    self.kind.type_match(&TokenKind::EOF)
  }
}

/// The types of tokens in a Lox program.
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum TokenKind {
  // Symbol-based tokens
  BANG,            // !
  COMMA,           // ,
  DOT,             // .
  EQUALS,          // =
  GREATER_THAN,    // >
  GREATER_THAN_EQ, // >=
  LESS_THAN,       // <
  LESS_THAN_EQ,    // <=
  LOGIC_EQ,        // ==
  LOGIC_NOT_EQ,    // !=
  L_CURLY,         // {
  L_PAREN,         // (
  MINUS,           // -
  PLUS,            // +
  R_CURLY,         // }
  R_PAREN,         // )
  SEMICOLON,       // ;
  SLASH,           // /
  STAR,            // *

  // Value literals
  FALSE_LIT,
  IDENTIFIER,
  NIL_LIT,
  NUM_LIT,
  STR_LIT,
  TRUE_LIT,

  // Keywords
  AND_KW,
  CLASS_KW,
  ELSE_KW,
  FOR_KW,
  FUN_KW,
  IF_KW,
  OR_KW,
  PRINT_KW,
  RETURN_KW,
  SUPER_KW,
  THIS_KW,
  VAR_KW,
  WHILE_KW,

  // Other tokens
  EOF,
  ERROR,

  // This one is only used to prime the compiler and the parser.
  __INIT__,
}

impl TokenKind {
  /// Checks that this token kind matches another token kind.
  ///
  /// # Parameters
  /// - `kind`: The token kind to be matched against this one.
  pub fn type_match(&self, kind: &TokenKind) -> bool {
    std::mem::discriminant(self) == std::mem::discriminant(kind)
  }
}

/// Maps a keyword string to a token kind.
///
/// # Parameters
/// - `id`: The identifier's string name.
///
/// # Returns
/// `TokenKind`: The kind of token matched for the given identifier name.
pub fn make_identifier_kind(id: &str) -> TokenKind {
  match id {
    "and" => TokenKind::AND_KW,
    "class" => TokenKind::CLASS_KW,
    "else" => TokenKind::ELSE_KW,
    "false" => TokenKind::FALSE_LIT,
    "for" => TokenKind::FOR_KW,
    "fun" => TokenKind::FUN_KW,
    "if" => TokenKind::IF_KW,
    "nil" => TokenKind::NIL_LIT,
    "or" => TokenKind::OR_KW,
    "print" => TokenKind::PRINT_KW,
    "return" => TokenKind::RETURN_KW,
    "super" => TokenKind::SUPER_KW,
    "this" => TokenKind::THIS_KW,
    "true" => TokenKind::TRUE_LIT,
    "var" => TokenKind::VAR_KW,
    "while" => TokenKind::WHILE_KW,
    _ => TokenKind::IDENTIFIER,
  }
}
