use crate::ast::*;
use crate::lexer::tokens::TokenKind;
use crate::parser::Parser;
use std::cell::Cell;

impl Parser {
  /// Parses a full expression.
  pub(super) fn parse_expression(&mut self) -> Option<ASTNode> {
    self.parse_assignment()
  }

  /// Parses a (right-associative) assignment expression. Anything other
  /// than a variable or a property access is rejected as an assignment
  /// target.
  fn parse_assignment(&mut self) -> Option<ASTNode> {
    let expr = self.parse_or()?;

    if self.matches(&TokenKind::EQUALS) {
      let equals = self.previous.clone();
      let value = self.parse_assignment()?;

      return match expr {
        ASTNode::Variable(var) => Some(ASTNode::Assignment(AssignmentExprNode {
          name: var.name,
          depth: Cell::new(None),
          value: Box::new(value),
        })),
        ASTNode::PropGet(get) => Some(ASTNode::PropSet(PropSetExprNode {
          object: get.object,
          name: get.name,
          value: Box::new(value),
        })),
        _ => {
          self.error_at_token(&equals, "Invalid assignment target.");
          None
        }
      };
    }

    Some(expr)
  }

  /// Parses a short-circuit `or` expression.
  fn parse_or(&mut self) -> Option<ASTNode> {
    let mut expr = self.parse_and()?;

    while self.matches(&TokenKind::OR_KW) {
      let operator = self.previous.clone();
      let right = self.parse_and()?;

      expr = ASTNode::Logical(LogicalExprNode {
        operator,
        left: Box::new(expr),
        right: Box::new(right),
      });
    }

    Some(expr)
  }

  /// Parses a short-circuit `and` expression.
  fn parse_and(&mut self) -> Option<ASTNode> {
    let mut expr = self.parse_equality()?;

    while self.matches(&TokenKind::AND_KW) {
      let operator = self.previous.clone();
      let right = self.parse_equality()?;

      expr = ASTNode::Logical(LogicalExprNode {
        operator,
        left: Box::new(expr),
        right: Box::new(right),
      });
    }

    Some(expr)
  }

  /// Parses an equality (`==`, `!=`) expression.
  fn parse_equality(&mut self) -> Option<ASTNode> {
    let mut expr = self.parse_comparison()?;

    while self.matches(&TokenKind::LOGIC_EQ) || self.matches(&TokenKind::LOGIC_NOT_EQ) {
      let operator = self.previous.clone();
      let right = self.parse_comparison()?;

      expr = ASTNode::Binary(BinaryExprNode {
        operator,
        left: Box::new(expr),
        right: Box::new(right),
      });
    }

    Some(expr)
  }

  /// Parses a comparison (`<`, `<=`, `>`, `>=`) expression.
  fn parse_comparison(&mut self) -> Option<ASTNode> {
    let mut expr = self.parse_term()?;

    while self.matches(&TokenKind::GREATER_THAN)
      || self.matches(&TokenKind::GREATER_THAN_EQ)
      || self.matches(&TokenKind::LESS_THAN)
      || self.matches(&TokenKind::LESS_THAN_EQ)
    {
      let operator = self.previous.clone();
      let right = self.parse_term()?;

      expr = ASTNode::Binary(BinaryExprNode {
        operator,
        left: Box::new(expr),
        right: Box::new(right),
      });
    }

    Some(expr)
  }

  /// Parses an additive (`+`, `-`) expression.
  fn parse_term(&mut self) -> Option<ASTNode> {
    let mut expr = self.parse_factor()?;

    while self.matches(&TokenKind::PLUS) || self.matches(&TokenKind::MINUS) {
      let operator = self.previous.clone();
      let right = self.parse_factor()?;

      expr = ASTNode::Binary(BinaryExprNode {
        operator,
        left: Box::new(expr),
        right: Box::new(right),
      });
    }

    Some(expr)
  }

  /// Parses a multiplicative (`*`, `/`) expression.
  fn parse_factor(&mut self) -> Option<ASTNode> {
    let mut expr = self.parse_unary()?;

    while self.matches(&TokenKind::STAR) || self.matches(&TokenKind::SLASH) {
      let operator = self.previous.clone();
      let right = self.parse_unary()?;

      expr = ASTNode::Binary(BinaryExprNode {
        operator,
        left: Box::new(expr),
        right: Box::new(right),
      });
    }

    Some(expr)
  }

  /// Parses a unary (`!`, `-`) expression.
  fn parse_unary(&mut self) -> Option<ASTNode> {
    if self.matches(&TokenKind::BANG) || self.matches(&TokenKind::MINUS) {
      let operator = self.previous.clone();
      let operand = self.parse_unary()?;

      return Some(ASTNode::Unary(UnaryExprNode {
        operator,
        operand: Box::new(operand),
      }));
    }

    self.parse_call()
  }

  /// Parses a call or property-access chain.
  fn parse_call(&mut self) -> Option<ASTNode> {
    let mut expr = self.parse_primary()?;

    loop {
      if self.matches(&TokenKind::L_PAREN) {
        expr = self.finish_call(expr)?;
      } else if self.matches(&TokenKind::DOT) {
        if !self.consume(&TokenKind::IDENTIFIER, "Expect property name after '.'.") {
          return None;
        }

        expr = ASTNode::PropGet(PropGetExprNode {
          object: Box::new(expr),
          name: self.previous.clone(),
        });
      } else {
        break;
      }
    }

    Some(expr)
  }

  /// Parses the argument list of a call expression.
  fn finish_call(&mut self, callee: ASTNode) -> Option<ASTNode> {
    let mut arguments: Vec<ASTNode> = vec![];

    if !self.check(&TokenKind::R_PAREN) {
      loop {
        if arguments.len() == 255 {
          self.error_at_current("Can't have more than 255 arguments.");
        }

        arguments.push(self.parse_expression()?);

        if !self.matches(&TokenKind::COMMA) {
          break;
        }
      }
    }

    if !self.consume(&TokenKind::R_PAREN, "Expect ')' after arguments.") {
      return None;
    }

    Some(ASTNode::Call(CallExprNode {
      callee: Box::new(callee),
      paren: self.previous.clone(),
      arguments,
    }))
  }

  /// Parses a primary expression: a literal, a variable, `this`, `super`,
  /// or a parenthesized expression.
  fn parse_primary(&mut self) -> Option<ASTNode> {
    self.advance();
    let token = self.previous.clone();

    match token.kind {
      TokenKind::FALSE_LIT => Some(ASTNode::Literal(LiteralExprNode {
        value: LiteralValue::Bool(false),
      })),
      TokenKind::TRUE_LIT => Some(ASTNode::Literal(LiteralExprNode {
        value: LiteralValue::Bool(true),
      })),
      TokenKind::NIL_LIT => Some(ASTNode::Literal(LiteralExprNode {
        value: LiteralValue::Nil,
      })),

      TokenKind::NUM_LIT => match token.lexeme.parse::<f64>() {
        Ok(num) => Some(ASTNode::Literal(LiteralExprNode {
          value: LiteralValue::Number(num),
        })),
        Err(_) => {
          self.error_at_previous("Invalid numeric literal.");
          None
        }
      },

      TokenKind::STR_LIT => Some(ASTNode::Literal(LiteralExprNode {
        value: LiteralValue::Str(token.lexeme),
      })),

      TokenKind::IDENTIFIER => Some(ASTNode::Variable(VariableExprNode {
        name: token,
        depth: Cell::new(None),
      })),

      TokenKind::THIS_KW => Some(ASTNode::This(ThisExprNode {
        keyword: token,
        depth: Cell::new(None),
      })),

      TokenKind::SUPER_KW => {
        if !self.consume(&TokenKind::DOT, "Expect '.' after 'super'.") {
          return None;
        }
        if !self.consume(&TokenKind::IDENTIFIER, "Expect superclass method name.") {
          return None;
        }

        Some(ASTNode::Super(SuperExprNode {
          keyword: token,
          method: self.previous.clone(),
          depth: Cell::new(None),
        }))
      }

      TokenKind::L_PAREN => {
        let expr = self.parse_expression()?;
        if !self.consume(&TokenKind::R_PAREN, "Expect ')' after expression.") {
          return None;
        }

        Some(expr)
      }

      _ => {
        self.error_at_previous("Expect expression.");
        None
      }
    }
  }
}
