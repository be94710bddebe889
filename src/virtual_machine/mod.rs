use crate::built_in::natives::Natives;
use crate::compiler::Compiler;
use crate::core::bytecode::OpCode;
use crate::core::{FRAMES_MAX, STACK_INITIAL};
use crate::errors::{report_errors_list, report_runtime_error};
use crate::objects::str_obj::StringInterner;
use crate::objects::{ClosureObject, FuncObject, UpValRef, Value};
use hashbrown::HashMap;
use std::cell::RefCell;
use std::rc::Rc;

// Submodules
mod operators;
mod run;

/// The types of results the interpreter can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
  Ok,
  CompileError,
  RuntimeError,
}

/// The result of executing a single instruction, or of a whole run.
pub enum RuntimeResult {
  Continue,
  EndOk,
  Error { message: String },
}

/// Represents a single ongoing function call.
pub struct CallFrame {
  closure: ClosureObject,
  ip: usize,
  base_pointer: usize,
}

impl CallFrame {
  /// Gets the opcode most recently read from this frame's chunk.
  fn peek_current_op_code(&self) -> OpCode {
    self.closure.function.borrow().chunk.get_op_code(self.ip - 1)
  }

  fn get_next_op_code(&mut self) -> OpCode {
    let code = self.closure.function.borrow().chunk.get_op_code(self.ip);
    self.ip += 1;
    code
  }

  fn get_next_byte(&mut self) -> u8 {
    let byte = self.closure.function.borrow().chunk.get_byte(self.ip);
    self.ip += 1;
    byte
  }

  fn get_next_short(&mut self) -> u16 {
    let short = self.closure.function.borrow().chunk.get_short(self.ip);
    self.ip += 2;
    short
  }

  fn get_constant(&self, idx: usize) -> Value {
    self.closure.function.borrow().chunk.get_constant(idx).clone()
  }
}

/// Represents the virtual machine: the value stack, the call-frame stack,
/// the globals table, the open up-value registry, and the string interner
/// shared with the compiler.
pub struct VM {
  frames: Vec<CallFrame>,
  stack: Vec<Value>,
  globals: HashMap<Rc<str>, Value>,
  up_values: Vec<Rc<RefCell<UpValRef>>>,
  interner: StringInterner,
  /// The chunk offset of the instruction currently being executed. Used to
  /// look up the source line when reporting a runtime error.
  last_op_offset: usize,
}

impl Default for VM {
  fn default() -> Self {
    Self::new()
  }
}

impl VM {
  /// Creates a virtual machine with the native function bindings already
  /// seeded into the globals table.
  pub fn new() -> Self {
    let mut vm = Self {
      frames: Vec::with_capacity(FRAMES_MAX),
      stack: Vec::with_capacity(STACK_INITIAL),
      globals: HashMap::new(),
      up_values: vec![],
      interner: StringInterner::new(),
      last_op_offset: 0,
    };

    for (name, obj) in Natives::default().iter() {
      let key = vm.interner.intern(name);
      vm.globals.insert(key, Value::Native(Rc::clone(obj)));
    }

    vm
  }

  /// Compiles and executes a source string. The globals table and the
  /// interner survive across calls, so a REPL can feed one line at a time.
  ///
  /// # Returns
  /// - `InterpretResult`: The result of the source interpretation.
  pub fn interpret(&mut self, source: &str) -> InterpretResult {
    let compiling = crate::exec_time(|| Compiler::compile(source, &mut self.interner));

    let script = match compiling.0 {
      Ok(f) => f,
      Err(errors) => {
        report_errors_list(&errors);
        return InterpretResult::CompileError;
      }
    };

    let running = crate::exec_time(|| self.execute_script(script));

    #[cfg(feature = "bench_time")]
    {
      println!("Compile Time:\t{:?}", compiling.1);
      println!("Run Time:\t{:?}", running.1);
    }

    running.0
  }

  /// Executes a compiled script function on a fresh stack.
  fn execute_script(&mut self, script: FuncObject) -> InterpretResult {
    let function = Rc::new(RefCell::new(script));

    self.stack.push(Value::Function(Rc::clone(&function)));
    self.frames.push(CallFrame {
      closure: ClosureObject {
        function,
        up_values: vec![],
      },
      ip: 0,
      base_pointer: 0,
    });

    let result = match self.run() {
      RuntimeResult::Error { message } => {
        let line = self.current_frame().closure.function.borrow().chunk.get_line(self.last_op_offset);
        report_runtime_error(&message, line);
        InterpretResult::RuntimeError
      }
      _ => InterpretResult::Ok,
    };

    // All VM-owned resources live for exactly one run: release them on
    // every exit path, including runtime errors.
    self.reset();
    result
  }

  /// Clears the value stack, the call frames, and the open up-values.
  fn reset(&mut self) {
    self.stack.clear();
    self.frames.clear();
    self.up_values.clear();
  }

  /// Gets the current call frame.
  pub(crate) fn current_frame(&self) -> &CallFrame {
    self.frames.last().unwrap()
  }

  fn current_frame_mut(&mut self) -> &mut CallFrame {
    self.frames.last_mut().unwrap()
  }

  fn get_next_op_code(&mut self) -> OpCode {
    self.current_frame_mut().get_next_op_code()
  }

  fn get_next_byte(&mut self) -> u8 {
    self.current_frame_mut().get_next_byte()
  }

  fn get_next_short(&mut self) -> u16 {
    self.current_frame_mut().get_next_short()
  }

  /// Either gets the next byte or the next short based on the instruction.
  /// If the current instruction matches the instruction corresponding to a
  /// one-byte operand, this function returns the next byte; otherwise it
  /// returns the next two bytes.
  ///
  /// # Parameters
  /// - `op`: The instruction corresponding to a one-byte operand.
  fn get_std_or_long_operand(&mut self, op: OpCode) -> usize {
    // The compiler makes sure that the structure of the bytecode is
    // correct for the VM to execute.
    if op == self.current_frame().peek_current_op_code() {
      self.get_next_byte() as usize
    } else {
      self.get_next_short() as usize
    }
  }

  fn pop_stack(&mut self) -> Value {
    match self.stack.pop() {
      Some(val) => val,
      None => panic!("Stack is empty!"),
    }
  }

  fn push_stack(&mut self, new_val: Value) -> RuntimeResult {
    self.stack.push(new_val);
    RuntimeResult::Continue
  }

  fn peek_stack(&self, pos: usize) -> &Value {
    &self.stack[pos]
  }

  fn read_constant(&self, idx: usize) -> Value {
    self.current_frame().get_constant(idx)
  }

  /// Invokes a callable value with the given number of arguments sitting on
  /// top of the stack.
  fn call_value(&mut self, callee: Value, arg_count: u8) -> RuntimeResult {
    match callee {
      Value::Function(obj) => self.call_function(obj, arg_count),
      Value::Closure(obj) => self.call_closure(obj, arg_count),
      Value::Native(obj) => {
        if arg_count != obj.arity {
          return RuntimeResult::Error {
            message: format!("Expected {} arguments but got {}.", obj.arity, arg_count),
          };
        }

        let mut args: Vec<Value> = Vec::with_capacity(arg_count as usize);
        for _ in 0..arg_count {
          args.push(self.pop_stack());
        }
        args.reverse();

        match (obj.body)(args) {
          Ok(result) => {
            // Pop the native function off the stack, then place the result
            // of the call on top of it.
            self.pop_stack();
            self.push_stack(result)
          }
          Err(message) => RuntimeResult::Error { message },
        }
      }
      _ => RuntimeResult::Error {
        message: String::from("Can only call functions and classes."),
      },
    }
  }

  fn call_function(&mut self, callee: Rc<RefCell<FuncObject>>, arg_count: u8) -> RuntimeResult {
    self.call_closure(
      ClosureObject {
        function: callee,
        up_values: vec![],
      },
      arg_count,
    )
  }

  fn call_closure(&mut self, callee: ClosureObject, arg_count: u8) -> RuntimeResult {
    let arity = callee.function.borrow().arity;

    if arg_count != arity {
      return RuntimeResult::Error {
        message: format!("Expected {} arguments but got {}.", arity, arg_count),
      };
    }

    if self.frames.len() >= FRAMES_MAX {
      return RuntimeResult::Error {
        message: String::from("Stack overflow."),
      };
    }

    self.frames.push(CallFrame {
      closure: callee,
      ip: 0,
      base_pointer: self.stack.len() - (arg_count as usize) - 1,
    });

    RuntimeResult::Continue
  }

  /// Finds the open up-value pointing at the given stack index, creating
  /// and registering a new one when no closure has captured that slot yet.
  fn create_up_value(&mut self, index: usize) -> Rc<RefCell<UpValRef>> {
    for up in self.up_values.iter() {
      if up.borrow().is_open_at(index) {
        return Rc::clone(up);
      }
    }

    let new_up_val = Rc::new(RefCell::new(UpValRef::Open(index)));
    self.up_values.push(Rc::clone(&new_up_val));
    new_up_val
  }

  /// Lifts every open up-value pointing at or above the given stack index
  /// off the stack and onto the heap.
  fn close_up_values(&mut self, from_index: usize) {
    for up in self.up_values.iter() {
      let slot = match &*up.borrow() {
        UpValRef::Open(i) if *i >= from_index => Some(*i),
        _ => None,
      };

      if let Some(slot) = slot {
        let value = self.stack[slot].clone();
        *up.borrow_mut() = UpValRef::Closed(value);
      }
    }

    self.up_values.retain(|up| matches!(&*up.borrow(), UpValRef::Open(_)));
  }

  /// Gets the up-value at the given index of the current frame's closure.
  fn get_up_val(&self, idx: usize) -> Rc<RefCell<UpValRef>> {
    Rc::clone(&self.current_frame().closure.up_values[idx])
  }

  /// Looks up a global by name. Intended for probing program results from
  /// the test suite.
  #[cfg(test)]
  pub(crate) fn get_global(&self, name: &str) -> Option<Value> {
    self
      .globals
      .iter()
      .find(|(key, _)| key.as_ref() == name)
      .map(|(_, value)| value.clone())
  }

  /// Prints the execution trace for the program: the current state of the
  /// value stack followed by a disassembly of the instruction about to be
  /// executed. Useful for debugging the VM.
  #[cfg(feature = "trace_execution")]
  fn print_execution(&self) {
    print!("stack\t[");
    for val in self.stack.iter() {
      print!("{}; ", val);
    }
    println!("]");

    let function = self.current_frame().closure.function.borrow();
    crate::disassembler::disassemble_instruction(&function.chunk, self.last_op_offset);
  }
}
