//! End-to-end tests that drive the compiled interpreter binary over real
//! source files, checking exact stdout and the process exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Writes the source to a scratch `.lox` file and runs the interpreter on
/// it with the given extra arguments.
fn run_source(source: &str, args: &[&str]) -> assert_cmd::assert::Assert {
  let mut file = tempfile::Builder::new()
    .suffix(".lox")
    .tempfile()
    .expect("failed to create scratch file");
  write!(file, "{}", source).expect("failed to write scratch file");

  let mut cmd = Command::cargo_bin("lox").expect("binary should build");
  cmd.args(args).arg(file.path());
  cmd.assert()
}

fn run_vm(source: &str) -> assert_cmd::assert::Assert {
  run_source(source, &[])
}

fn run_tree_walk(source: &str) -> assert_cmd::assert::Assert {
  run_source(source, &["--tree-walk"])
}

// ---------------------------------------------------------------------
// Exact-output scenarios, on both back-ends.
// ---------------------------------------------------------------------

#[test]
fn arithmetic_and_precedence() {
  run_vm("print 1 + 2 * 3;").success().stdout("7\n");
  run_tree_walk("print 1 + 2 * 3;").success().stdout("7\n");
}

#[test]
fn globals_and_reassignment() {
  let src = "var a = 1; a = a + 41; print a;";
  run_vm(src).success().stdout("42\n");
  run_tree_walk(src).success().stdout("42\n");
}

#[test]
fn short_circuit_and_truthiness() {
  let src = "print nil or \"ok\"; print false and \"skip\"; print 0 and \"zero\";";
  run_vm(src).success().stdout("ok\nfalse\nzero\n");
  run_tree_walk(src).success().stdout("ok\nfalse\nzero\n");
}

#[test]
fn lexical_scope_shadowing() {
  let src = "var x = \"global\"; { var x = \"local\"; print x; } print x;";
  run_vm(src).success().stdout("local\nglobal\n");
  run_tree_walk(src).success().stdout("local\nglobal\n");
}

#[test]
fn captured_closure_counter() {
  let src = "
    fun make(n) {
      var c = n;
      fun f() {
        c = c + 1;
        return c;
      }
      return f;
    }
    var f = make(10);
    print f();
    print f();
  ";
  run_vm(src).success().stdout("11\n12\n");
  run_tree_walk(src).success().stdout("11\n12\n");
}

#[test]
fn string_interning_identity() {
  let src = "print \"a\" + \"b\" == \"ab\";";
  run_vm(src).success().stdout("true\n");
  run_tree_walk(src).success().stdout("true\n");
}

// ---------------------------------------------------------------------
// Additional behavior through the binary.
// ---------------------------------------------------------------------

#[test]
fn division_by_zero_prints_infinity() {
  run_vm("print 1 / 0;").success().stdout("inf\n");
}

#[test]
fn classes_work_on_the_tree_walking_backend() {
  let src = "
    class Counter {
      init(n) { this.count = n; }
      inc() {
        this.count = this.count + 1;
        return this.count;
      }
    }
    var c = Counter(10);
    print c.inc();
    print c.inc();
  ";
  run_tree_walk(src).success().stdout("11\n12\n");
}

#[test]
fn classes_are_a_compile_error_on_the_bytecode_backend() {
  run_vm("class Foo {}").code(65);
}

// ---------------------------------------------------------------------
// Exit codes and error formats.
// ---------------------------------------------------------------------

#[test]
fn compile_errors_exit_65_with_line_diagnostics() {
  run_vm("var 1 = 2;")
    .code(65)
    .stderr(predicate::str::contains("[line 1] Error at '1':"));
}

#[test]
fn runtime_errors_exit_70_with_message_then_line() {
  run_vm("print missing;")
    .code(70)
    .stderr(predicate::str::contains("Undefined variable 'missing'.").and(predicate::str::contains("[line 1]")));
}

#[test]
fn runtime_errors_report_the_faulting_line() {
  run_vm("var a = 1;\nvar b = 2;\nprint a + missing;")
    .code(70)
    .stderr(predicate::str::contains("[line 3]"));
}

#[test]
fn missing_file_exits_66() {
  Command::cargo_bin("lox")
    .expect("binary should build")
    .arg("definitely_not_here.lox")
    .assert()
    .code(66);
}

#[test]
fn wrong_extension_exits_66() {
  let mut file = tempfile::Builder::new()
    .suffix(".txt")
    .tempfile()
    .expect("failed to create scratch file");
  write!(file, "print 1;").expect("failed to write scratch file");

  Command::cargo_bin("lox")
    .expect("binary should build")
    .arg(file.path())
    .assert()
    .code(66);
}

#[test]
fn unknown_flag_exits_64() {
  Command::cargo_bin("lox")
    .expect("binary should build")
    .arg("--bogus")
    .assert()
    .code(64);
}

#[test]
fn extra_arguments_exit_64() {
  Command::cargo_bin("lox")
    .expect("binary should build")
    .args(["one.lox", "two.lox"])
    .assert()
    .code(64);
}

// ---------------------------------------------------------------------
// REPL surface.
// ---------------------------------------------------------------------

#[test]
fn repl_evaluates_lines_until_exit() {
  Command::cargo_bin("lox")
    .expect("binary should build")
    .write_stdin("print 40 + 2;\nexit\n")
    .assert()
    .success()
    .stdout(predicate::str::contains("42"));
}

#[test]
fn repl_keeps_globals_across_lines() {
  Command::cargo_bin("lox")
    .expect("binary should build")
    .write_stdin("var a = 1;\na = a + 1;\nprint a;\nexit\n")
    .assert()
    .success()
    .stdout(predicate::str::contains("2"));
}

#[test]
fn repl_survives_errors_between_lines() {
  Command::cargo_bin("lox")
    .expect("binary should build")
    .write_stdin("print missing;\nprint 7;\nexit\n")
    .assert()
    .success()
    .stdout(predicate::str::contains("7"));
}
