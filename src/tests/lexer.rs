use crate::lexer::tokens::TokenKind;
use crate::lexer::Lexer;

/// Collects the token kinds of a source string, up to and including `EOF`.
fn kinds_of(src: &str) -> Vec<TokenKind> {
  let mut lexer = Lexer::lex(src);
  let mut kinds = vec![];

  loop {
    let token = lexer.next_token();
    let is_eof = token.is_eof();
    kinds.push(token.kind);

    if is_eof {
      return kinds;
    }
  }
}

#[test]
fn tokens_for_simple_statement() {
  assert_eq!(
    kinds_of("print 1 + 2;"),
    vec![
      TokenKind::PRINT_KW,
      TokenKind::NUM_LIT,
      TokenKind::PLUS,
      TokenKind::NUM_LIT,
      TokenKind::SEMICOLON,
      TokenKind::EOF,
    ]
  );
}

#[test]
fn two_character_operators_win_over_one() {
  assert_eq!(
    kinds_of("! != = == < <= > >="),
    vec![
      TokenKind::BANG,
      TokenKind::LOGIC_NOT_EQ,
      TokenKind::EQUALS,
      TokenKind::LOGIC_EQ,
      TokenKind::LESS_THAN,
      TokenKind::LESS_THAN_EQ,
      TokenKind::GREATER_THAN,
      TokenKind::GREATER_THAN_EQ,
      TokenKind::EOF,
    ]
  );
}

#[test]
fn eof_token_is_repeated() {
  let mut lexer = Lexer::lex("1");

  assert_eq!(lexer.next_token().kind, TokenKind::NUM_LIT);
  assert_eq!(lexer.next_token().kind, TokenKind::EOF);
  assert_eq!(lexer.next_token().kind, TokenKind::EOF);
  assert_eq!(lexer.next_token().kind, TokenKind::EOF);
}

#[test]
fn keywords_are_not_identifier_prefixes() {
  assert_eq!(
    kinds_of("class classy for fortune"),
    vec![
      TokenKind::CLASS_KW,
      TokenKind::IDENTIFIER,
      TokenKind::FOR_KW,
      TokenKind::IDENTIFIER,
      TokenKind::EOF,
    ]
  );
}

#[test]
fn line_comments_are_skipped() {
  let mut lexer = Lexer::lex("// a comment\n42");
  let token = lexer.next_token();

  assert_eq!(token.kind, TokenKind::NUM_LIT);
  assert_eq!(token.line_num, 2);
}

#[test]
fn unterminated_string_becomes_error_token() {
  let mut lexer = Lexer::lex("\"abc");
  let token = lexer.next_token();

  assert_eq!(token.kind, TokenKind::ERROR);
  assert_eq!(token.lexeme, "Unterminated string.");
}

#[test]
fn unexpected_character_becomes_error_token() {
  let mut lexer = Lexer::lex("@");
  let token = lexer.next_token();

  assert_eq!(token.kind, TokenKind::ERROR);
  assert_eq!(token.lexeme, "Unexpected character.");
}

#[test]
fn string_lexeme_excludes_quotes_and_tracks_newlines() {
  let mut lexer = Lexer::lex("\"a\nb\" x");

  let string = lexer.next_token();
  assert_eq!(string.kind, TokenKind::STR_LIT);
  assert_eq!(string.lexeme, "a\nb");

  let after = lexer.next_token();
  assert_eq!(after.kind, TokenKind::IDENTIFIER);
  assert_eq!(after.line_num, 2);
}

#[test]
fn lexemes_reconstruct_whitespace_normalized_source() {
  // For programs whose tokens are separated by single spaces, joining the
  // lexemes back together reproduces the source text.
  let src = "var x = ( 1 + 2 ) * 3 ; print x != 4 ;";

  let mut lexer = Lexer::lex(src);
  let mut lexemes: Vec<String> = vec![];
  loop {
    let token = lexer.next_token();
    if token.is_eof() {
      break;
    }
    lexemes.push(token.lexeme);
  }

  assert_eq!(lexemes.join(" "), src);
}

#[test]
fn number_dot_requires_a_following_digit() {
  let mut lexer = Lexer::lex("12.5");
  assert_eq!(lexer.next_token().lexeme, "12.5");

  let mut lexer = Lexer::lex("12.foo");
  assert_eq!(lexer.next_token().lexeme, "12");
  assert_eq!(lexer.next_token().kind, TokenKind::DOT);
  assert_eq!(lexer.next_token().kind, TokenKind::IDENTIFIER);
}
