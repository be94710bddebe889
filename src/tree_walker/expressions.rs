use crate::ast::*;
use crate::lexer::tokens::TokenKind;
use crate::objects::Value;
use crate::tree_walker::environment::Environment;
use crate::tree_walker::{runtime_error, EarlyExit, Interpreter};

impl Interpreter {
  /// Evaluates a single expression node.
  pub(super) fn evaluate(&mut self, node: &ASTNode) -> Result<Value, EarlyExit> {
    match node {
      ASTNode::Literal(expr) => Ok(match &expr.value {
        LiteralValue::Nil => Value::Nil,
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::Str(self.interner.intern(s)),
      }),

      ASTNode::Unary(expr) => self.eval_unary(expr),
      ASTNode::Binary(expr) => self.eval_binary(expr),
      ASTNode::Logical(expr) => self.eval_logical(expr),

      ASTNode::Variable(expr) => {
        self.look_up_variable(&expr.name.lexeme, expr.depth.get(), expr.name.line_num)
      }

      ASTNode::Assignment(expr) => self.eval_assignment(expr),
      ASTNode::Call(expr) => self.eval_call(expr),
      ASTNode::PropGet(expr) => self.eval_prop_get(expr),
      ASTNode::PropSet(expr) => self.eval_prop_set(expr),

      ASTNode::This(expr) => {
        self.look_up_variable("this", expr.depth.get(), expr.keyword.line_num)
      }

      ASTNode::Super(expr) => self.eval_super(expr),

      _ => unreachable!("Expected an expression node."),
    }
  }

  /// Evaluates a unary `-` or `!` expression.
  fn eval_unary(&mut self, expr: &UnaryExprNode) -> Result<Value, EarlyExit> {
    let operand = self.evaluate(&expr.operand)?;
    let line = expr.operator.line_num;

    match expr.operator.kind {
      TokenKind::BANG => Ok(Value::Bool(operand.is_falsey())),
      TokenKind::MINUS => match operand.as_number() {
        Some(num) => Ok(Value::Number(-num)),
        None => Err(runtime_error(String::from("Operand must be a number."), line)),
      },
      _ => unreachable!("Expected a unary operator token."),
    }
  }

  /// Evaluates a binary expression. Division by zero follows IEEE-754: it
  /// produces an infinity or NaN rather than an error.
  fn eval_binary(&mut self, expr: &BinaryExprNode) -> Result<Value, EarlyExit> {
    let left = self.evaluate(&expr.left)?;
    let right = self.evaluate(&expr.right)?;
    let line = expr.operator.line_num;

    if let TokenKind::LOGIC_EQ = expr.operator.kind {
      return Ok(Value::Bool(left == right));
    }
    if let TokenKind::LOGIC_NOT_EQ = expr.operator.kind {
      return Ok(Value::Bool(left != right));
    }

    if let TokenKind::PLUS = expr.operator.kind {
      return match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::Str(a), Value::Str(b)) => {
          let result = self.interner.intern(&format!("{}{}", a, b));
          Ok(Value::Str(result))
        }
        _ => Err(runtime_error(
          String::from("Operands must be two numbers or two strings."),
          line,
        )),
      };
    }

    let (a, b) = match (left.as_number(), right.as_number()) {
      (Some(a), Some(b)) => (a, b),
      _ => return Err(runtime_error(String::from("Operands must be numbers."), line)),
    };

    Ok(match expr.operator.kind {
      TokenKind::MINUS => Value::Number(a - b),
      TokenKind::STAR => Value::Number(a * b),
      TokenKind::SLASH => Value::Number(a / b),
      TokenKind::GREATER_THAN => Value::Bool(a > b),
      TokenKind::GREATER_THAN_EQ => Value::Bool(a >= b),
      TokenKind::LESS_THAN => Value::Bool(a < b),
      TokenKind::LESS_THAN_EQ => Value::Bool(a <= b),
      _ => unreachable!("Expected a binary operator token."),
    })
  }

  /// Evaluates a short-circuit `and` / `or` expression. The result is one
  /// of the operand values, not a coerced boolean.
  fn eval_logical(&mut self, expr: &LogicalExprNode) -> Result<Value, EarlyExit> {
    let left = self.evaluate(&expr.left)?;

    match expr.operator.kind {
      TokenKind::OR_KW => {
        if !left.is_falsey() {
          return Ok(left);
        }
      }
      TokenKind::AND_KW => {
        if left.is_falsey() {
          return Ok(left);
        }
      }
      _ => unreachable!("Expected a logical operator token."),
    }

    self.evaluate(&expr.right)
  }

  /// Evaluates an assignment expression. The assigned value is also the
  /// expression's result.
  fn eval_assignment(&mut self, expr: &AssignmentExprNode) -> Result<Value, EarlyExit> {
    let value = self.evaluate(&expr.value)?;

    let assigned = match expr.depth.get() {
      Some(depth) => {
        Environment::assign_at(&self.environment, depth, &expr.name.lexeme, value.clone())
      }
      None => self.globals.borrow_mut().assign_here(&expr.name.lexeme, value.clone()),
    };

    if !assigned {
      return Err(runtime_error(
        format!("Undefined variable '{}'.", expr.name.lexeme),
        expr.name.line_num,
      ));
    }

    Ok(value)
  }

  /// Evaluates a call expression.
  fn eval_call(&mut self, expr: &CallExprNode) -> Result<Value, EarlyExit> {
    let callee = self.evaluate(&expr.callee)?;

    let mut arguments: Vec<Value> = Vec::with_capacity(expr.arguments.len());
    for argument in &expr.arguments {
      arguments.push(self.evaluate(argument)?);
    }

    self.call_value(callee, arguments, expr.paren.line_num)
  }

  /// Evaluates a property access: an instance field when present, and a
  /// method bound to the instance otherwise.
  fn eval_prop_get(&mut self, expr: &PropGetExprNode) -> Result<Value, EarlyExit> {
    let object = self.evaluate(&expr.object)?;
    let line = expr.name.line_num;

    let instance = match object {
      Value::Instance(instance) => instance,
      _ => {
        return Err(runtime_error(
          String::from("Only instances have properties."),
          line,
        ));
      }
    };

    if let Some(field) = instance.borrow().fields.get(&expr.name.lexeme) {
      return Ok(field.clone());
    }

    let method = instance.borrow().class.borrow().find_method(&expr.name.lexeme);
    match method {
      Some(method) => Ok(self.bind_method(&method, &instance)),
      None => Err(runtime_error(
        format!("Undefined property '{}'.", expr.name.lexeme),
        line,
      )),
    }
  }

  /// Evaluates a property assignment on an instance.
  fn eval_prop_set(&mut self, expr: &PropSetExprNode) -> Result<Value, EarlyExit> {
    let object = self.evaluate(&expr.object)?;

    let instance = match object {
      Value::Instance(instance) => instance,
      _ => {
        return Err(runtime_error(
          String::from("Only instances have fields."),
          expr.name.line_num,
        ));
      }
    };

    let value = self.evaluate(&expr.value)?;
    instance.borrow_mut().fields.insert(expr.name.lexeme.clone(), value.clone());

    Ok(value)
  }

  /// Evaluates a `super` method access: the method is looked up on the
  /// superclass but bound to the current `this`.
  fn eval_super(&mut self, expr: &SuperExprNode) -> Result<Value, EarlyExit> {
    let line = expr.keyword.line_num;
    let depth = match expr.depth.get() {
      Some(depth) => depth,
      None => {
        return Err(runtime_error(
          String::from("Can't use 'super' outside of a class."),
          line,
        ));
      }
    };

    let superclass = match Environment::get_at(&self.environment, depth, "super") {
      Some(Value::Class(class)) => class,
      _ => unreachable!("The resolver guarantees 'super' is in scope."),
    };

    // `this` always sits in the scope just inside the one holding `super`.
    let receiver = match Environment::get_at(&self.environment, depth - 1, "this") {
      Some(Value::Instance(instance)) => instance,
      _ => unreachable!("The resolver guarantees 'this' is in scope."),
    };

    let method = superclass.borrow().find_method(&expr.method.lexeme);
    match method {
      Some(method) => Ok(self.bind_method(&method, &receiver)),
      None => Err(runtime_error(
        format!("Undefined property '{}'.", expr.method.lexeme),
        expr.method.line_num,
      )),
    }
  }
}
