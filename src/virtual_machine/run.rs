use crate::core::bytecode::OpCode;
use crate::objects::{ClosureObject, UpValRef, Value};
use crate::virtual_machine::{RuntimeResult, VM};
use std::cell::RefCell;
use std::rc::Rc;

impl VM {
  /// Executes the instructions of the current call frame's chunk until the
  /// script returns or a runtime error aborts the run.
  pub(super) fn run(&mut self) -> RuntimeResult {
    loop {
      self.last_op_offset = self.current_frame().ip;
      let instruction = self.get_next_op_code();

      #[cfg(feature = "trace_execution")]
      self.print_execution();

      let exec = match instruction {
        OpCode::Nop => RuntimeResult::Continue,

        // Stack manipulation
        OpCode::PopStackTop => {
          self.pop_stack();
          RuntimeResult::Continue
        }
        OpCode::PopStackTopN => self.op_pop_stack_top_n(),

        // Value loaders
        OpCode::LoadConstant | OpCode::LoadConstantLong => self.op_load_constant(),
        OpCode::LoadImmFalse => self.push_stack(Value::Bool(false)),
        OpCode::LoadImmNil => self.push_stack(Value::Nil),
        OpCode::LoadImmTrue => self.push_stack(Value::Bool(true)),

        // Operators
        OpCode::Add => self.op_add(),
        OpCode::Divide => self.binary_number_op(|a, b| Value::Number(a / b)),
        OpCode::Equals => self.op_equals(false),
        OpCode::GreaterThan => self.binary_number_op(|a, b| Value::Bool(a > b)),
        OpCode::GreaterThanEq => self.binary_number_op(|a, b| Value::Bool(a >= b)),
        OpCode::LessThan => self.binary_number_op(|a, b| Value::Bool(a < b)),
        OpCode::LessThanEq => self.binary_number_op(|a, b| Value::Bool(a <= b)),
        OpCode::LogicNot => self.op_logic_not(),
        OpCode::Multiply => self.binary_number_op(|a, b| Value::Number(a * b)),
        OpCode::Negate => self.op_negate(),
        OpCode::NotEquals => self.op_equals(true),
        OpCode::Subtract => self.binary_number_op(|a, b| Value::Number(a - b)),

        OpCode::Print => self.op_print(),

        // Global declarations
        OpCode::DefineGlobal | OpCode::DefineGlobalLong => self.op_define_global(),
        OpCode::GetGlobal | OpCode::GetGlobalLong => self.op_get_global(),
        OpCode::SetGlobal | OpCode::SetGlobalLong => self.op_set_global(),

        // Local declarations
        OpCode::GetLocal | OpCode::GetLocalLong => self.op_get_local(),
        OpCode::SetLocal | OpCode::SetLocalLong => self.op_set_local(),

        // Jumps
        OpCode::JumpForward => self.op_jump_forward(),
        OpCode::JumpIfFalse => self.op_jump_if_false(),
        OpCode::LoopJump => self.op_loop_jump(),
        OpCode::PopJumpIfFalse => self.op_pop_jump_if_false(),

        // Functions and closures
        OpCode::FuncCall => self.op_func_call(),
        OpCode::GetUpVal | OpCode::GetUpValLong => self.op_get_up_value(),
        OpCode::MakeClosure | OpCode::MakeClosureLong => self.op_make_closure(),
        OpCode::PopCloseUpVal => self.op_pop_stack_and_close_up_value(),
        OpCode::Return => self.op_function_return(),
        OpCode::SetUpVal | OpCode::SetUpValLong => self.op_set_up_value(),
      };

      match exec {
        RuntimeResult::Continue => continue,
        _ => return exec,
      }
    }
  }

  /// Executes the instruction to pop the top N values off the stack.
  fn op_pop_stack_top_n(&mut self) -> RuntimeResult {
    let count = self.get_next_byte();

    for _ in 0..count {
      self.pop_stack();
    }

    RuntimeResult::Continue
  }

  /// Executes the instruction to load a constant onto the stack.
  fn op_load_constant(&mut self) -> RuntimeResult {
    let idx = self.get_std_or_long_operand(OpCode::LoadConstant);
    let constant = self.read_constant(idx);
    self.push_stack(constant)
  }

  /// Executes the instruction to print the value on top of the stack,
  /// followed by a newline, to standard output.
  fn op_print(&mut self) -> RuntimeResult {
    let value = self.pop_stack();
    println!("{}", value);
    RuntimeResult::Continue
  }

  /// Executes the instruction to define a global: the name operand is an
  /// interned-string constant, and the value is popped off the stack.
  fn op_define_global(&mut self) -> RuntimeResult {
    let name = self.read_name_constant(OpCode::DefineGlobal);
    let value = self.pop_stack();

    self.globals.insert(name, value);
    RuntimeResult::Continue
  }

  /// Executes the instruction to push a global's value onto the stack.
  fn op_get_global(&mut self) -> RuntimeResult {
    let name = self.read_name_constant(OpCode::GetGlobal);

    match self.globals.get(&name) {
      Some(value) => {
        let value = value.clone();
        self.push_stack(value)
      }
      None => RuntimeResult::Error {
        message: format!("Undefined variable '{}'.", name),
      },
    }
  }

  /// Executes the instruction to reassign a global. The assigned value
  /// stays on the stack, since assignments are expressions. Assignment to
  /// a name that was never defined is an error.
  fn op_set_global(&mut self) -> RuntimeResult {
    let name = self.read_name_constant(OpCode::SetGlobal);
    let value = self.peek_stack(self.stack.len() - 1).clone();

    match self.globals.get_mut(&name) {
      Some(slot) => {
        *slot = value;
        RuntimeResult::Continue
      }
      None => RuntimeResult::Error {
        message: format!("Undefined variable '{}'.", name),
      },
    }
  }

  /// Executes the instruction to push a local's value onto the stack. The
  /// operand is the slot offset from the current frame's base pointer.
  fn op_get_local(&mut self) -> RuntimeResult {
    let slot = self.get_std_or_long_operand(OpCode::GetLocal);
    let base = self.current_frame().base_pointer;

    let value = self.stack[base + slot].clone();
    self.push_stack(value)
  }

  /// Executes the instruction to reassign a local. The assigned value stays
  /// on the stack, since assignments are expressions.
  fn op_set_local(&mut self) -> RuntimeResult {
    let slot = self.get_std_or_long_operand(OpCode::SetLocal);
    let base = self.current_frame().base_pointer;
    let value = self.peek_stack(self.stack.len() - 1).clone();

    self.stack[base + slot] = value;
    RuntimeResult::Continue
  }

  /// Executes the instruction to jump forward by the given offset.
  fn op_jump_forward(&mut self) -> RuntimeResult {
    let offset = self.get_next_short() as usize;
    self.current_frame_mut().ip += offset;
    RuntimeResult::Continue
  }

  /// Executes the instruction to jump forward by the given offset when the
  /// top of the stack is falsey, without popping it.
  fn op_jump_if_false(&mut self) -> RuntimeResult {
    let offset = self.get_next_short() as usize;

    if self.peek_stack(self.stack.len() - 1).is_falsey() {
      self.current_frame_mut().ip += offset;
    }

    RuntimeResult::Continue
  }

  /// Executes the instruction to pop the top of the stack, and jump forward
  /// by the given offset when the popped value is falsey.
  fn op_pop_jump_if_false(&mut self) -> RuntimeResult {
    let offset = self.get_next_short() as usize;

    if self.pop_stack().is_falsey() {
      self.current_frame_mut().ip += offset;
    }

    RuntimeResult::Continue
  }

  /// Executes the instruction to jump (loop) back by the given offset.
  fn op_loop_jump(&mut self) -> RuntimeResult {
    let offset = self.get_next_short() as usize;
    self.current_frame_mut().ip -= offset;
    RuntimeResult::Continue
  }

  /// Executes the instruction to call the callable found below its
  /// arguments on the stack.
  fn op_func_call(&mut self) -> RuntimeResult {
    let arg_count = self.get_next_byte();
    let callee = self.peek_stack(self.stack.len() - 1 - (arg_count as usize)).clone();

    self.call_value(callee, arg_count)
  }

  /// Executes the instruction to make a closure object from a function
  /// constant. The operand bytes that follow describe each captured
  /// variable: whether it is a local of the enclosing function, and the
  /// slot or up-value index it lives at.
  fn op_make_closure(&mut self) -> RuntimeResult {
    let idx = self.get_std_or_long_operand(OpCode::MakeClosure);

    let function = match self.read_constant(idx) {
      Value::Function(obj) => obj,
      _ => unreachable!("Expected a function constant for closure."),
    };

    let up_val_count = function.borrow().up_val_count;
    let mut up_values: Vec<Rc<RefCell<UpValRef>>> = Vec::with_capacity(up_val_count);

    for _ in 0..up_val_count {
      let is_local = self.get_next_byte() == 1u8;
      let index = self.get_next_short() as usize;

      let up = if is_local {
        self.create_up_value(self.current_frame().base_pointer + index)
      } else {
        self.get_up_val(index)
      };

      up_values.push(up);
    }

    self.push_stack(Value::Closure(ClosureObject { function, up_values }))
  }

  /// Executes the instruction to get an up-value of the current call
  /// frame's closure.
  fn op_get_up_value(&mut self) -> RuntimeResult {
    let idx = self.get_std_or_long_operand(OpCode::GetUpVal);

    let value = match &*self.get_up_val(idx).borrow() {
      UpValRef::Open(slot) => self.stack[*slot].clone(),
      UpValRef::Closed(value) => value.clone(),
    };

    self.push_stack(value)
  }

  /// Executes the instruction to modify an up-value of the current call
  /// frame's closure. The assigned value stays on the stack.
  fn op_set_up_value(&mut self) -> RuntimeResult {
    let idx = self.get_std_or_long_operand(OpCode::SetUpVal);
    let new_val = self.peek_stack(self.stack.len() - 1).clone();

    let up = self.get_up_val(idx);
    match &mut *up.borrow_mut() {
      UpValRef::Open(slot) => self.stack[*slot] = new_val,
      UpValRef::Closed(value) => *value = new_val,
    }

    RuntimeResult::Continue
  }

  /// Executes the instruction to lift the captured local on top of the
  /// stack onto the heap, then pop it.
  fn op_pop_stack_and_close_up_value(&mut self) -> RuntimeResult {
    self.close_up_values(self.stack.len() - 1);
    self.pop_stack();
    RuntimeResult::Continue
  }

  /// Executes the instruction to return out of the current function. In
  /// the script's top frame, this ends the run with an OK result.
  fn op_function_return(&mut self) -> RuntimeResult {
    let result = self.pop_stack();
    let frame = self.frames.pop().unwrap();

    // Any locals of the returning frame that were captured by a closure
    // must outlive the frame, so lift them off the stack first.
    self.close_up_values(frame.base_pointer);
    self.stack.truncate(frame.base_pointer);

    if self.frames.is_empty() {
      return RuntimeResult::EndOk;
    }

    self.push_stack(result)
  }
}
