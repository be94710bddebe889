use crate::objects::Value;
use crate::tree_walker::Interpreter;
use crate::virtual_machine::InterpretResult;

/// Runs a program on a fresh tree-walking interpreter and returns the
/// result together with the interpreter, so tests can probe the globals.
fn run(src: &str) -> (InterpretResult, Interpreter) {
  let mut interpreter = Interpreter::new();
  let result = interpreter.interpret(src);
  (result, interpreter)
}

fn global_number(interpreter: &Interpreter, name: &str) -> f64 {
  match interpreter.get_global(name) {
    Some(Value::Number(n)) => n,
    other => panic!("global '{}' should be a number, got {:?}", name, other.map(|v| v.to_string())),
  }
}

fn global_str(interpreter: &Interpreter, name: &str) -> String {
  match interpreter.get_global(name) {
    Some(Value::Str(s)) => s.to_string(),
    other => panic!("global '{}' should be a string, got {:?}", name, other.map(|v| v.to_string())),
  }
}

#[test]
fn arithmetic_respects_precedence() {
  let (result, interpreter) = run("var a = 1 + 2 * 3;");

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&interpreter, "a"), 7.0);
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
  let (result, interpreter) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&interpreter, "inner"), 2.0);
  assert_eq!(global_number(&interpreter, "outer"), 1.0);
}

#[test]
fn closures_capture_their_defining_scope() {
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
  let (result, interpreter) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&interpreter, "r1"), 11.0);
  assert_eq!(global_number(&interpreter, "r2"), 12.0);
}

#[test]
fn resolver_pins_variable_references_at_declaration_time() {
  // The closure must keep seeing the outer `a`, even though a shadowing
  // declaration appears after it in the same block.
  let src = "
    var a = \"global\";
    var first = \"\";
    var second = \"\";
    {
      fun read() { return a; }
      first = read();
      var a = \"block\";
      second = read();
    }
  ";
  let (result, interpreter) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_str(&interpreter, "first"), "global");
  assert_eq!(global_str(&interpreter, "second"), "global");
}

#[test]
fn short_circuit_operators_return_operand_values() {
  let src = "
    var a = nil or \"ok\";
    var b = false and \"skip\";
    var c = 0 and \"zero\";
  ";
  let (result, interpreter) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_str(&interpreter, "a"), "ok");
  assert_eq!(interpreter.get_global("b"), Some(Value::Bool(false)));
  assert_eq!(global_str(&interpreter, "c"), "zero");
}

#[test]
fn for_loops_desugar_to_while() {
  let src = "
    var sum = 0;
    for (var i = 0; i < 5; i = i + 1) {
      sum = sum + i;
    }
  ";
  let (result, interpreter) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&interpreter, "sum"), 10.0);
}

#[test]
fn concatenated_strings_are_interned() {
  let (result, interpreter) = run("var eq = \"a\" + \"b\" == \"ab\";");

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(interpreter.get_global("eq"), Some(Value::Bool(true)));
}

#[test]
fn classes_construct_instances_with_fields_and_methods() {
  let src = "
    class Counter {
      init(n) { this.count = n; }
      inc() {
        this.count = this.count + 1;
        return this.count;
      }
    }
    var c = Counter(10);
    var r1 = c.inc();
    var r2 = c.inc();
  ";
  let (result, interpreter) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&interpreter, "r1"), 11.0);
  assert_eq!(global_number(&interpreter, "r2"), 12.0);
}

#[test]
fn methods_bind_this_when_detached() {
  let src = "
    class Box {
      init() { this.value = 42; }
      read() { return this.value; }
    }
    var m = Box().read;
    var r = m();
  ";
  let (result, interpreter) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&interpreter, "r"), 42.0);
}

#[test]
fn single_inheritance_and_super_dispatch() {
  let src = "
    class A {
      greet() { return \"A\"; }
    }
    class B < A {
      greet() { return super.greet() + \"B\"; }
    }
    var r = B().greet();
  ";
  let (result, interpreter) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_str(&interpreter, "r"), "AB");
}

#[test]
fn inherited_methods_resolve_through_the_chain() {
  let src = "
    class A { name() { return \"A\"; } }
    class B < A {}
    class C < B {}
    var r = C().name();
  ";
  let (result, interpreter) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_str(&interpreter, "r"), "A");
}

#[test]
fn initializer_returns_the_instance() {
  let src = "
    class Pair {
      init() { this.a = 1; }
    }
    var p = Pair();
    var r = p.a;
  ";
  let (result, interpreter) = run(src);

  assert_eq!(result, InterpretResult::Ok);
  assert_eq!(global_number(&interpreter, "r"), 1.0);
}

#[test]
fn this_outside_a_class_is_rejected() {
  let (result, _) = run("print this;");
  assert_eq!(result, InterpretResult::CompileError);
}

#[test]
fn super_without_a_superclass_is_rejected() {
  let (result, _) = run("class A { m() { return super.m(); } }");
  assert_eq!(result, InterpretResult::CompileError);
}

#[test]
fn class_cannot_inherit_from_itself() {
  let (result, _) = run("class A < A {}");
  assert_eq!(result, InterpretResult::CompileError);
}

#[test]
fn superclass_must_be_a_class() {
  let (result, _) = run("var x = 1; class A < x {}");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn top_level_return_is_rejected() {
  let (result, _) = run("return 1;");
  assert_eq!(result, InterpretResult::CompileError);
}

#[test]
fn initializer_cannot_return_a_value() {
  let (result, _) = run("class A { init() { return 1; } }");
  assert_eq!(result, InterpretResult::CompileError);
}

#[test]
fn undefined_property_is_a_runtime_error() {
  let (result, _) = run("class A {} var a = A(); print a.missing;");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn properties_require_an_instance() {
  let (result, _) = run("var x = 1; print x.field;");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn runaway_recursion_is_reported_not_fatal() {
  let (result, _) = run("fun f() { f(); } f();");
  assert_eq!(result, InterpretResult::RuntimeError);
}

#[test]
fn state_persists_across_interpret_calls() {
  let mut interpreter = Interpreter::new();

  assert_eq!(interpreter.interpret("var a = 1;"), InterpretResult::Ok);
  assert_eq!(interpreter.interpret("a = a + 1;"), InterpretResult::Ok);
  assert_eq!(global_number(&interpreter, "a"), 2.0);
}
