use crate::objects::Value;
use crate::virtual_machine::{InterpretResult, VM};

/// Runs a program on a fresh VM and returns the result together with the
/// machine, so tests can probe the globals table.
fn run(src: &str) -> (InterpretResult, VM) {
  let mut vm = VM::new();
  let result = vm.interpret(src);
  (result, vm)
}

fn global_number(vm: &VM, name: &str) -> f64 {
  match vm.get_global(name) {
    Some(Value::Number(n)) => n,
    other => panic!("global '{}' should be a number, got {:?}", name, other.map(|v| v.to_string())),
  }
}

fn global_str(vm: &VM, name: &str) -> String {
  match vm.get_global(name) {
    Some(Value::Str(s)) => s.to_string(),
    other => panic!("global '{}' should be a string, got {:?}", name, other.map(|v| v.to_string())),
  }
}

#[test]
fn arithmetic_respects_precedence() {
  let (result, vm) = run("var a = 1 + 2 * 3;");

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "a"), 7.0);
}

#[test]
fn unary_operators_apply() {
  let (result, vm) = run("var a = -(1 + 2); var b = !nil; var c = !0;");

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "a"), -3.0);
  assert_eq!(vm.get_global("b"), Some(Value::Bool(true)));
  assert_eq!(vm.get_global("c"), Some(Value::Bool(false)));
}

#[test]
fn globals_can_be_reassigned() {
  let (result, vm) = run("var a = 1; a = a + 41;");

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "a"), 42.0);
}

#[test]
fn assignment_is_an_expression() {
  let (result, vm) = run("var a = 0; var b = (a = 5) + 1;");

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "a"), 5.0);
  assert_eq!(global_number(&vm, "b"), 6.0);
}

#[test]
fn var_without_initializer_reads_nil() {
  let (result, vm) = run("var a; var b = a;");

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(vm.get_global("b"), Some(Value::Nil));
}

#[test]
fn lexical_scopes_shadow_and_restore() {
  let src = "
    var x = 1;
    var inner = 0;
    {
      var x = 2;
      inner = x;
    }
    var outer = x;
  ";
  let (result, vm) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "inner"), 2.0);
  assert_eq!(global_number(&vm, "outer"), 1.0);
}

#[test]
fn scopes_pop_all_their_locals() {
  let src = "
    var r = 0;
    {
      var a = 1;
      var b = 2;
      var c = 3;
      r = a + b + c;
    }
    {
      var d = 4;
      r = r + d;
    }
  ";
  let (result, vm) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "r"), 10.0);
}

#[test]
fn short_circuit_operators_return_operand_values() {
  let src = "
    var a = nil or \"ok\";
    var b = false and \"skip\";
    var c = 0 and \"zero\";
  ";
  let (result, vm) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_str(&vm, "a"), "ok");
  assert_eq!(vm.get_global("b"), Some(Value::Bool(false)));
  assert_eq!(global_str(&vm, "c"), "zero");
}

#[test]
fn if_else_picks_the_right_branch() {
  let (result, vm) = run("var a = 0; if (1 < 2) a = 1; else a = 2; var b = 0; if (nil) b = 1; else b = 2;");

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "a"), 1.0);
  assert_eq!(global_number(&vm, "b"), 2.0);
}

#[test]
fn while_loops_terminate() {
  let (result, vm) = run("var i = 0; while (i < 5) i = i + 1;");

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "i"), 5.0);
}

#[test]
fn for_loops_run_the_increment_after_the_body() {
  let src = "
    var sum = 0;
    var last = -1;
    for (var i = 0; i < 5; i = i + 1) {
      sum = sum + i;
      last = i;
    }
  ";
  let (result, vm) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "sum"), 10.0);
  assert_eq!(global_number(&vm, "last"), 4.0);
}

#[test]
fn functions_call_and_return() {
  let src = "
    fun add(a, b) { return a + b; }
    var r = add(40, 2);
  ";
  let (result, vm) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "r"), 42.0);
}

#[test]
fn functions_without_return_produce_nil() {
  let (result, vm) = run("fun noop() {} var r = noop();");

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(vm.get_global("r"), Some(Value::Nil));
}

#[test]
fn recursion_works_through_globals() {
  let src = "
    fun fib(n) {
      if (n < 2) return n;
      return fib(n - 2) + fib(n - 1);
    }
    var r = fib(10);
  ";
  let (result, vm) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "r"), 55.0);
}

#[test]
fn closures_capture_mutable_state() {
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
    var r1 = f();
    var r2 = f();
  ";
  let (result, vm) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "r1"), 11.0);
  assert_eq!(global_number(&vm, "r2"), 12.0);
}

#[test]
fn sibling_closures_share_one_captured_variable() {
  let src = "
    fun make() {
      var shared = 0;
      fun bump() { shared = shared + 1; return shared; }
      fun read() { return shared; }
      bump();
      bump();
      var seen = read();
      fun pair() { return seen; }
      return pair;
    }
    var r = make()();
  ";
  let (result, vm) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "r"), 2.0);
}

#[test]
fn concatenated_strings_are_interned() {
  let (result, vm) = run("var eq = \"a\" + \"b\" == \"ab\";");

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(vm.get_global("eq"), Some(Value::Bool(true)));
}

#[test]
fn string_equality_across_expressions() {
  let (result, vm) = run("var a = \"x\" + \"yz\"; var b = \"xy\" + \"z\"; var eq = a == b;");

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(vm.get_global("eq"), Some(Value::Bool(true)));
}

#[test]
fn division_by_zero_follows_ieee() {
  let (result, vm) = run("var inf = 1 / 0; var nan = 0 / 0;");

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&vm, "inf"), f64::INFINITY);
  assert!(global_number(&vm, "nan").is_nan());
}

#[test]
fn native_clock_is_seeded_and_monotonic() {
  let (result, vm) = run("var t1 = clock(); var t2 = clock();");

  assert_eq!(result, InterpretResult::Ok);
  assert!(global_number(&vm, "t2") >= global_number(&vm, "t1"));
}

#[test]
fn undefined_global_read_is_a_runtime_error() {
  let (result, _) = run("var a = missing;");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn undefined_global_assignment_is_a_runtime_error() {
  let (result, _) = run("missing = 1;");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn adding_number_and_string_is_a_runtime_error() {
  let (result, _) = run("var a = 1 + \"one\";");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn negating_a_boolean_is_a_runtime_error() {
  let (result, _) = run("var a = -true;");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn comparing_non_numbers_is_a_runtime_error() {
  let (result, _) = run("var a = \"a\" < \"b\";");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn calling_a_non_callable_is_a_runtime_error() {
  let (result, _) = run("var a = 1; a();");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn wrong_arity_is_a_runtime_error() {
  let (result, _) = run("fun f(a) {} f();");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn runaway_recursion_overflows_the_frame_stack() {
  let (result, _) = run("fun f() { f(); } f();");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn state_persists_across_interpret_calls() {
  let mut vm = VM::new();

  assert_eq!(vm.interpret("var a = 1;"), InterpretResult::Ok);
  assert_eq!(vm.interpret("a = a + 1;"), InterpretResult::Ok);

  match vm.get_global("a") {
    Some(Value::Number(n)) => assert_eq!(n, 2.0),
    other => panic!("unexpected value for 'a': {:?}", other.map(|v| v.to_string())),
  }
}

#[test]
fn error_state_clears_between_interpret_calls() {
  let mut vm = VM::new();

  assert_eq!(vm.interpret("var a = missing;"), InterpretResult::RuntimeError);
  assert_eq!(vm.interpret("var b = 2;"), InterpretResult::Ok);
  assert_eq!(vm.interpret("var ("), InterpretResult::CompileError);
  assert_eq!(vm.interpret("var c = b + 1;"), InterpretResult::Ok);

  assert_eq!(vm.get_global("c"), Some(Value::Number(3.0)));
}
