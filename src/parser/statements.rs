use crate::ast::*;
use crate::lexer::tokens::TokenKind;
use crate::parser::Parser;
use std::rc::Rc;

impl Parser {
  /// Parses a single declaration: a variable, function, or class
  /// declaration, or any other statement. Recovers at the next statement
  /// boundary after a parse error.
  pub(super) fn parse_declaration(&mut self) -> Option<ASTNode> {
    let result = if self.matches(&TokenKind::VAR_KW) {
      self.parse_var_declaration()
    } else if self.matches(&TokenKind::FUN_KW) {
      self.parse_function("function").map(ASTNode::FunctionDecl)
    } else if self.matches(&TokenKind::CLASS_KW) {
      self.parse_class_declaration()
    } else {
      self.parse_statement()
    };

    if self.is_in_panic {
      self.synchronize();
    }

    result
  }

  /// Parses a single statement.
  fn parse_statement(&mut self) -> Option<ASTNode> {
    if self.matches(&TokenKind::PRINT_KW) {
      self.parse_print_stmt()
    } else if self.matches(&TokenKind::IF_KW) {
      self.parse_if_stmt()
    } else if self.matches(&TokenKind::WHILE_KW) {
      self.parse_while_stmt()
    } else if self.matches(&TokenKind::FOR_KW) {
      self.parse_for_stmt()
    } else if self.matches(&TokenKind::RETURN_KW) {
      self.parse_return_stmt()
    } else if self.matches(&TokenKind::L_CURLY) {
      Some(ASTNode::Block(BlockNode {
        body: self.parse_block()?,
      }))
    } else {
      self.parse_expression_stmt()
    }
  }

  /// Parses an expression statement.
  fn parse_expression_stmt(&mut self) -> Option<ASTNode> {
    let child = self.parse_expression()?;

    if !self.consume(&TokenKind::SEMICOLON, "Expect ';' after expression.") {
      return None;
    }

    Some(ASTNode::ExpressionStmt(ExpressionStmtNode {
      child: Box::new(child),
    }))
  }

  /// Parses a `print` statement.
  fn parse_print_stmt(&mut self) -> Option<ASTNode> {
    let child = self.parse_expression()?;

    if !self.consume(&TokenKind::SEMICOLON, "Expect ';' after value.") {
      return None;
    }

    Some(ASTNode::PrintStmt(PrintStmtNode {
      child: Box::new(child),
    }))
  }

  /// Parses a `var` declaration.
  fn parse_var_declaration(&mut self) -> Option<ASTNode> {
    if !self.consume(&TokenKind::IDENTIFIER, "Expect variable name.") {
      return None;
    }
    let name = self.previous.clone();

    let initializer = if self.matches(&TokenKind::EQUALS) {
      Some(Box::new(self.parse_expression()?))
    } else {
      None
    };

    if !self.consume(&TokenKind::SEMICOLON, "Expect ';' after variable declaration.") {
      return None;
    }

    Some(ASTNode::VarDecl(VarDeclNode { name, initializer }))
  }

  /// Parses the declarations of a block, up to the closing brace.
  fn parse_block(&mut self) -> Option<Vec<ASTNode>> {
    let mut body: Vec<ASTNode> = vec![];

    while !self.check(&TokenKind::R_CURLY) && !self.check(&TokenKind::EOF) {
      if let Some(node) = self.parse_declaration() {
        body.push(node);
      }
    }

    if !self.consume(&TokenKind::R_CURLY, "Expect '}' after block.") {
      return None;
    }

    Some(body)
  }

  /// Parses an `if` statement, optionally with an `else` branch.
  fn parse_if_stmt(&mut self) -> Option<ASTNode> {
    if !self.consume(&TokenKind::L_PAREN, "Expect '(' after 'if'.") {
      return None;
    }
    let condition = self.parse_expression()?;
    if !self.consume(&TokenKind::R_PAREN, "Expect ')' after condition.") {
      return None;
    }

    let then_branch = self.parse_statement()?;
    let else_branch = if self.matches(&TokenKind::ELSE_KW) {
      Some(Box::new(self.parse_statement()?))
    } else {
      None
    };

    Some(ASTNode::IfStmt(IfStmtNode {
      condition: Box::new(condition),
      then_branch: Box::new(then_branch),
      else_branch,
    }))
  }

  /// Parses a `while` statement.
  fn parse_while_stmt(&mut self) -> Option<ASTNode> {
    if !self.consume(&TokenKind::L_PAREN, "Expect '(' after 'while'.") {
      return None;
    }
    let condition = self.parse_expression()?;
    if !self.consume(&TokenKind::R_PAREN, "Expect ')' after condition.") {
      return None;
    }

    let body = self.parse_statement()?;

    Some(ASTNode::WhileStmt(WhileStmtNode {
      condition: Box::new(condition),
      body: Box::new(body),
    }))
  }

  /// Parses a `for` statement by desugaring it into an initializer plus a
  /// `while` loop whose body ends with the increment clause.
  fn parse_for_stmt(&mut self) -> Option<ASTNode> {
    if !self.consume(&TokenKind::L_PAREN, "Expect '(' after 'for'.") {
      return None;
    }

    // Initializer clause.
    let initializer = if self.matches(&TokenKind::SEMICOLON) {
      None
    } else if self.matches(&TokenKind::VAR_KW) {
      Some(self.parse_var_declaration()?)
    } else {
      Some(self.parse_expression_stmt()?)
    };

    // Condition clause: an omitted condition is always true.
    let condition = if !self.check(&TokenKind::SEMICOLON) {
      self.parse_expression()?
    } else {
      ASTNode::Literal(LiteralExprNode {
        value: LiteralValue::Bool(true),
      })
    };
    if !self.consume(&TokenKind::SEMICOLON, "Expect ';' after loop condition.") {
      return None;
    }

    // Increment clause.
    let increment = if !self.check(&TokenKind::R_PAREN) {
      Some(self.parse_expression()?)
    } else {
      None
    };
    if !self.consume(&TokenKind::R_PAREN, "Expect ')' after for clauses.") {
      return None;
    }

    let mut body = self.parse_statement()?;

    if let Some(increment) = increment {
      body = ASTNode::Block(BlockNode {
        body: vec![
          body,
          ASTNode::ExpressionStmt(ExpressionStmtNode {
            child: Box::new(increment),
          }),
        ],
      });
    }

    let mut result = ASTNode::WhileStmt(WhileStmtNode {
      condition: Box::new(condition),
      body: Box::new(body),
    });

    if let Some(initializer) = initializer {
      result = ASTNode::Block(BlockNode {
        body: vec![initializer, result],
      });
    }

    Some(result)
  }

  /// Parses a `return` statement.
  fn parse_return_stmt(&mut self) -> Option<ASTNode> {
    let keyword = self.previous.clone();

    let value = if !self.check(&TokenKind::SEMICOLON) {
      Some(Box::new(self.parse_expression()?))
    } else {
      None
    };

    if !self.consume(&TokenKind::SEMICOLON, "Expect ';' after return value.") {
      return None;
    }

    Some(ASTNode::ReturnStmt(ReturnStmtNode { keyword, value }))
  }

  /// Parses a function or method declaration, starting at its name.
  ///
  /// # Parameters
  /// - `kind`: Either "function" or "method"; used in diagnostics.
  fn parse_function(&mut self, kind: &str) -> Option<Rc<FunctionDeclNode>> {
    if !self.consume(&TokenKind::IDENTIFIER, &format!("Expect {} name.", kind)) {
      return None;
    }
    let name = self.previous.clone();

    if !self.consume(&TokenKind::L_PAREN, &format!("Expect '(' after {} name.", kind)) {
      return None;
    }

    let mut params: Vec<_> = vec![];
    if !self.check(&TokenKind::R_PAREN) {
      loop {
        if params.len() == 255 {
          self.error_at_current("Can't have more than 255 parameters.");
        }

        if !self.consume(&TokenKind::IDENTIFIER, "Expect parameter name.") {
          return None;
        }
        params.push(self.previous.clone());

        if !self.matches(&TokenKind::COMMA) {
          break;
        }
      }
    }
    if !self.consume(&TokenKind::R_PAREN, "Expect ')' after parameters.") {
      return None;
    }

    if !self.consume(&TokenKind::L_CURLY, &format!("Expect '{{' before {} body.", kind)) {
      return None;
    }
    let body = self.parse_block()?;

    Some(Rc::new(FunctionDeclNode { name, params, body }))
  }

  /// Parses a `class` declaration: the name, an optional superclass after
  /// `<`, and the method list.
  fn parse_class_declaration(&mut self) -> Option<ASTNode> {
    if !self.consume(&TokenKind::IDENTIFIER, "Expect class name.") {
      return None;
    }
    let name = self.previous.clone();

    let superclass = if self.matches(&TokenKind::LESS_THAN) {
      if !self.consume(&TokenKind::IDENTIFIER, "Expect superclass name.") {
        return None;
      }

      Some(VariableExprNode {
        name: self.previous.clone(),
        depth: std::cell::Cell::new(None),
      })
    } else {
      None
    };

    if !self.consume(&TokenKind::L_CURLY, "Expect '{' before class body.") {
      return None;
    }

    let mut methods: Vec<Rc<FunctionDeclNode>> = vec![];
    while !self.check(&TokenKind::R_CURLY) && !self.check(&TokenKind::EOF) {
      methods.push(self.parse_function("method")?);
    }

    if !self.consume(&TokenKind::R_CURLY, "Expect '}' after class body.") {
      return None;
    }

    Some(ASTNode::ClassDecl(ClassDeclNode {
      name,
      superclass,
      methods,
    }))
  }
}
