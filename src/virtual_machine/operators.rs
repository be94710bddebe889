use crate::core::bytecode::OpCode;
use crate::objects::Value;
use crate::virtual_machine::{RuntimeResult, VM};
use std::rc::Rc;

impl VM {
  /// Reads the name operand of a global-variable instruction from the
  /// constant pool.
  pub(super) fn read_name_constant(&mut self, std_op: OpCode) -> Rc<str> {
    let idx = self.get_std_or_long_operand(std_op);

    match self.read_constant(idx) {
      Value::Str(name) => name,
      _ => unreachable!("Expected an identifier constant."),
    }
  }

  /// Adds the two values on top of the stack. Two numbers add
  /// arithmetically; two strings concatenate, and the result is interned so
  /// that string equality stays an identity check.
  pub(super) fn op_add(&mut self) -> RuntimeResult {
    let right = self.pop_stack();
    let left = self.pop_stack();

    match (&left, &right) {
      (Value::Number(a), Value::Number(b)) => self.push_stack(Value::Number(a + b)),
      (Value::Str(a), Value::Str(b)) => {
        let result = self.interner.intern(&format!("{}{}", a, b));
        self.push_stack(Value::Str(result))
      }
      _ => RuntimeResult::Error {
        message: String::from("Operands must be two numbers or two strings."),
      },
    }
  }

  /// Applies a numeric binary operator to the two values on top of the
  /// stack. Division by zero follows IEEE-754: it produces an infinity or
  /// NaN rather than an error.
  pub(super) fn binary_number_op(&mut self, op: fn(f64, f64) -> Value) -> RuntimeResult {
    let right = self.pop_stack();
    let left = self.pop_stack();

    match (left.as_number(), right.as_number()) {
      (Some(a), Some(b)) => self.push_stack(op(a, b)),
      _ => RuntimeResult::Error {
        message: String::from("Operands must be numbers."),
      },
    }
  }

  /// Compares the two values on top of the stack for (in)equality.
  pub(super) fn op_equals(&mut self, negate: bool) -> RuntimeResult {
    let right = self.pop_stack();
    let left = self.pop_stack();

    let equal = left == right;
    self.push_stack(Value::Bool(if negate { !equal } else { equal }))
  }

  /// Replaces the top of the stack with its logical negation.
  pub(super) fn op_logic_not(&mut self) -> RuntimeResult {
    let value = self.pop_stack();
    self.push_stack(Value::Bool(value.is_falsey()))
  }

  /// Replaces the number on top of the stack with its arithmetic negation.
  pub(super) fn op_negate(&mut self) -> RuntimeResult {
    let value = self.pop_stack();

    match value.as_number() {
      Some(num) => self.push_stack(Value::Number(-num)),
      None => RuntimeResult::Error {
        message: String::from("Operand must be a number."),
      },
    }
  }
}
