#[cfg(feature = "bench_time")]
use std::time::Instant;

use std::time::Duration;
use std::{env, fs, io, process};

// Declaring crate-level modules
mod ast;
mod built_in;
mod compiler;
mod core;
#[cfg(any(feature = "show_bytecode", feature = "trace_execution"))]
mod disassembler;
mod errors;
mod lexer;
mod objects;
mod parser;
mod tree_walker;
mod virtual_machine;

#[cfg(test)]
mod tests;

use tree_walker::Interpreter;
use virtual_machine::{InterpretResult, VM};

/// The back-end used to execute a program. The bytecode virtual machine is
/// the default; the tree-walking interpreter is selected with `--tree-walk`.
enum Backend {
  ByteCode,
  TreeWalk,
}

/// The main function
fn main() {
  let mut backend = Backend::ByteCode;
  let mut path: Option<String> = None;

  for arg in env::args().skip(1) {
    if arg == "--tree-walk" {
      backend = Backend::TreeWalk;
    } else if arg.starts_with('-') || path.is_some() {
      eprintln!("Usage: lox [--tree-walk] [path.lox]");
      process::exit(64);
    } else {
      path = Some(arg);
    }
  }

  match path {
    Some(path) => run_file(&path, backend),
    None => run_repl(backend),
  }
}

/// Executes a source file and exits the interpreter with the appropriate
/// code: 0 on success, 65 on a compile-time error, 66 when the file cannot
/// be read, and 70 on a runtime error.
fn run_file(path: &str, backend: Backend) -> ! {
  if !path.ends_with(".lox") {
    eprintln!("Error: expected a '.lox' source file.");
    process::exit(66);
  }

  let contents = match fs::read_to_string(path) {
    Ok(contents) => contents,
    Err(_) => {
      eprintln!("Error: could not read file '{}'.", path);
      process::exit(66);
    }
  };

  let result = match backend {
    Backend::ByteCode => VM::new().interpret(&contents),
    Backend::TreeWalk => Interpreter::new().interpret(&contents),
  };

  match result {
    InterpretResult::Ok => process::exit(0),
    InterpretResult::CompileError => process::exit(65),
    InterpretResult::RuntimeError => process::exit(70),
  }
}

/// Runs the interactive prompt. Globals and interned strings persist
/// across lines, and error state is cleared between lines.
fn run_repl(backend: Backend) {
  match backend {
    Backend::ByteCode => {
      let mut vm = VM::new();
      repl_loop(&mut |line| {
        vm.interpret(line);
      });
    }
    Backend::TreeWalk => {
      let mut interpreter = Interpreter::new();
      repl_loop(&mut |line| {
        interpreter.interpret(line);
      });
    }
  }
}

/// Reads and evaluates one line at a time until `exit` or end of input.
fn repl_loop(eval: &mut dyn FnMut(&str)) {
  loop {
    print!("> ");
    let _ = io::Write::flush(&mut io::stdout());

    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
      Ok(0) | Err(_) => break,
      Ok(_) => {}
    }

    let line = line.trim_end();

    if line == "exit" {
      break;
    }

    if !line.is_empty() {
      eval(line);
    }
  }
}

/// Executes the provided function while also calculating its execution time.
///
/// # Parameters
/// - `executor`: The function (with no parameters) to be executed.
///
/// # Returns
/// - `(T, Duration)`: A tuple with the result of the executed function as
/// its first member, and the execution time of the function as its second.
pub fn exec_time<T, F: FnOnce() -> T>(executor: F) -> (T, Duration) {
  #[cfg(feature = "bench_time")]
  {
    let start = Instant::now();
    let exec = executor();
    let time = start.elapsed();

    return (exec, time);
  }

  #[cfg(not(feature = "bench_time"))]
  (executor(), Duration::new(0, 0))
}
