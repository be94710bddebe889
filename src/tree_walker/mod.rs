use crate::ast::ASTNode;
use crate::built_in::natives::Natives;
use crate::errors::{report_errors_list, report_runtime_error};
use crate::objects::class_obj::{BoundMethodObj, InstanceObject};
use crate::objects::str_obj::StringInterner;
use crate::objects::{AstFuncObj, Value};
use crate::parser::Parser;
use crate::virtual_machine::InterpretResult;
use environment::Environment;
use hashbrown::HashMap;
use resolver::Resolver;
use std::cell::RefCell;
use std::rc::Rc;

// Submodules
pub mod environment;
mod expressions;
mod resolver;
mod statements;

/// The max depth of nested Lox calls before the interpreter reports a
/// stack overflow instead of exhausting the native stack.
const CALL_DEPTH_MAX: usize = 1024;

/// The reasons evaluation can stop before reaching the end of a node: a
/// runtime error, or a `return` statement unwinding out of a function body.
pub enum EarlyExit {
  Error { message: String, line: usize },
  Return(Value),
}

/// Builds the runtime-error variant of an early exit.
fn runtime_error(message: String, line: usize) -> EarlyExit {
  EarlyExit::Error { message, line }
}

/// Represents the tree-walking interpreter: an environment chain rooted at
/// the globals, plus the string interner shared by every string value the
/// program produces.
pub struct Interpreter {
  globals: Rc<RefCell<Environment>>,
  environment: Rc<RefCell<Environment>>,
  interner: StringInterner,
  call_depth: usize,
}

impl Default for Interpreter {
  fn default() -> Self {
    Self::new()
  }
}

impl Interpreter {
  /// Creates a tree-walking interpreter with the native function bindings
  /// already seeded into the global environment.
  pub fn new() -> Self {
    let globals = Rc::new(RefCell::new(Environment::new()));

    for (name, obj) in Natives::default().iter() {
      globals.borrow_mut().define(name, Value::Native(Rc::clone(obj)));
    }

    Self {
      environment: Rc::clone(&globals),
      globals,
      interner: StringInterner::new(),
      call_depth: 0,
    }
  }

  /// Parses, resolves, and executes a source string. The global environment
  /// and the interner survive across calls, so a REPL can feed one line at
  /// a time.
  ///
  /// # Returns
  /// - `InterpretResult`: The result of the source interpretation.
  pub fn interpret(&mut self, source: &str) -> InterpretResult {
    let program = match Parser::parse(source) {
      Ok(ast) => ast,
      Err(errors) => {
        report_errors_list(&errors);
        return InterpretResult::CompileError;
      }
    };

    if let Err(errors) = Resolver::resolve(&program) {
      report_errors_list(&errors);
      return InterpretResult::CompileError;
    }

    for node in &program {
      match self.execute(node) {
        Ok(()) => {}
        Err(EarlyExit::Error { message, line }) => {
          report_runtime_error(&message, line);
          return InterpretResult::RuntimeError;
        }
        Err(EarlyExit::Return(_)) => {
          unreachable!("The resolver rejects top-level returns.")
        }
      }
    }

    InterpretResult::Ok
  }

  /// Executes a list of statements inside the given environment, restoring
  /// the previous environment on every exit path.
  pub(super) fn execute_block(
    &mut self,
    body: &[ASTNode],
    env: Rc<RefCell<Environment>>,
  ) -> Result<(), EarlyExit> {
    let previous = std::mem::replace(&mut self.environment, env);

    let mut result = Ok(());
    for node in body {
      result = self.execute(node);
      if result.is_err() {
        break;
      }
    }

    self.environment = previous;
    result
  }

  /// Looks up a variable use: through the resolver-annotated depth for
  /// locals, or in the globals for everything else.
  pub(super) fn look_up_variable(
    &self,
    name: &str,
    depth: Option<usize>,
    line: usize,
  ) -> Result<Value, EarlyExit> {
    let value = match depth {
      Some(depth) => Environment::get_at(&self.environment, depth, name),
      None => self.globals.borrow().get_here(name),
    };

    value.ok_or_else(|| runtime_error(format!("Undefined variable '{}'.", name), line))
  }

  /// Invokes a callable value with the given evaluated arguments.
  pub(super) fn call_value(
    &mut self,
    callee: Value,
    arguments: Vec<Value>,
    line: usize,
  ) -> Result<Value, EarlyExit> {
    match callee {
      Value::AstFunction(func) => self.call_function(&func, None, arguments, line),
      Value::BoundMethod(bound) => {
        self.call_function(&bound.method, Some(&bound.receiver), arguments, line)
      }
      Value::Class(class) => self.instantiate_class(&class, arguments, line),
      Value::Native(native) => {
        if arguments.len() != native.arity as usize {
          return Err(runtime_error(
            format!("Expected {} arguments but got {}.", native.arity, arguments.len()),
            line,
          ));
        }

        (native.body)(arguments).map_err(|message| runtime_error(message, line))
      }
      _ => Err(runtime_error(
        String::from("Can only call functions and classes."),
        line,
      )),
    }
  }

  /// Invokes a user-declared function or method. A bound method executes
  /// with an extra scope holding `this` between its closure and its body.
  fn call_function(
    &mut self,
    func: &Rc<AstFuncObj>,
    receiver: Option<&Rc<RefCell<InstanceObject>>>,
    arguments: Vec<Value>,
    line: usize,
  ) -> Result<Value, EarlyExit> {
    let decl = Rc::clone(&func.decl);

    if arguments.len() != decl.params.len() {
      return Err(runtime_error(
        format!("Expected {} arguments but got {}.", decl.params.len(), arguments.len()),
        line,
      ));
    }

    if self.call_depth >= CALL_DEPTH_MAX {
      return Err(runtime_error(String::from("Stack overflow."), line));
    }

    let mut closure = Rc::clone(&func.closure);
    if let Some(receiver) = receiver {
      let mut this_env = Environment::with_enclosing(closure);
      this_env.define("this", Value::Instance(Rc::clone(receiver)));
      closure = Rc::new(RefCell::new(this_env));
    }

    let mut body_env = Environment::with_enclosing(closure);
    for (param, argument) in decl.params.iter().zip(arguments) {
      body_env.define(&param.lexeme, argument);
    }

    self.call_depth += 1;
    let result = self.execute_block(&decl.body, Rc::new(RefCell::new(body_env)));
    self.call_depth -= 1;

    match result {
      Ok(()) => {}
      Err(EarlyExit::Return(value)) => {
        if !func.is_initializer {
          return Ok(value);
        }
      }
      Err(err) => return Err(err),
    }

    // An initializer always evaluates to the instance under construction.
    if func.is_initializer {
      if let Some(receiver) = receiver {
        return Ok(Value::Instance(Rc::clone(receiver)));
      }
    }

    Ok(Value::Nil)
  }

  /// Instantiates a class: builds the instance and runs its `init` method,
  /// when the class declares one.
  fn instantiate_class(
    &mut self,
    class: &Rc<RefCell<crate::objects::class_obj::ClassObject>>,
    arguments: Vec<Value>,
    line: usize,
  ) -> Result<Value, EarlyExit> {
    let instance = Rc::new(RefCell::new(InstanceObject {
      class: Rc::clone(class),
      fields: HashMap::new(),
    }));

    let initializer = class.borrow().find_method("init");
    match initializer {
      Some(init) => {
        self.call_function(&init, Some(&instance), arguments, line)?;
      }
      None => {
        if !arguments.is_empty() {
          return Err(runtime_error(
            format!("Expected 0 arguments but got {}.", arguments.len()),
            line,
          ));
        }
      }
    }

    Ok(Value::Instance(instance))
  }

  /// Binds a method to the instance it was accessed through.
  pub(super) fn bind_method(
    &self,
    method: &Rc<AstFuncObj>,
    receiver: &Rc<RefCell<InstanceObject>>,
  ) -> Value {
    Value::BoundMethod(BoundMethodObj {
      receiver: Rc::clone(receiver),
      method: Rc::clone(method),
    })
  }

  /// Looks up a global by name. Intended for probing program results from
  /// the test suite.
  #[cfg(test)]
  pub(crate) fn get_global(&self, name: &str) -> Option<Value> {
    self.globals.borrow().get_here(name)
  }
}
