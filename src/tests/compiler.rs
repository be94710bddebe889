use crate::compiler::Compiler;
use crate::core::bytecode::OpCode;
use crate::core::chunk::Chunk;
use crate::errors::ErrorReport;
use crate::objects::str_obj::StringInterner;
use crate::objects::{FuncObject, Value};

fn compile(src: &str) -> Result<FuncObject, Vec<ErrorReport>> {
  let mut interner = StringInterner::new();
  Compiler::compile(src, &mut interner)
}

fn assert_error_contains(src: &str, expected: &str) {
  match compile(src) {
    Ok(_) => panic!("expected a compile error containing {:?}", expected),
    Err(errors) => {
      assert!(
        errors.iter().any(|e| e.message.contains(expected)),
        "no error contains {:?}; got: {:?}",
        expected,
        errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>()
      );
    }
  }
}

/// Walks a chunk instruction by instruction, returning each opcode with
/// its offset. Operand widths follow the bytecode format, including the
/// variable-length capture list after a closure instruction.
fn walk(chunk: &Chunk) -> Vec<(usize, OpCode)> {
  let mut ops = vec![];
  let mut offset = 0;

  while offset < chunk.len() {
    let op = chunk.get_op_code(offset);
    ops.push((offset, op));

    offset += match op {
      OpCode::PopStackTopN
      | OpCode::LoadConstant
      | OpCode::DefineGlobal
      | OpCode::GetGlobal
      | OpCode::SetGlobal
      | OpCode::GetLocal
      | OpCode::SetLocal
      | OpCode::GetUpVal
      | OpCode::SetUpVal
      | OpCode::FuncCall => 2,

      OpCode::LoadConstantLong
      | OpCode::DefineGlobalLong
      | OpCode::GetGlobalLong
      | OpCode::SetGlobalLong
      | OpCode::GetLocalLong
      | OpCode::SetLocalLong
      | OpCode::GetUpValLong
      | OpCode::SetUpValLong
      | OpCode::JumpForward
      | OpCode::JumpIfFalse
      | OpCode::PopJumpIfFalse
      | OpCode::LoopJump => 3,

      OpCode::MakeClosure | OpCode::MakeClosureLong => {
        let (idx, operand_size) = if let OpCode::MakeClosure = op {
          (chunk.get_byte(offset + 1) as usize, 1)
        } else {
          (chunk.get_short(offset + 1) as usize, 2)
        };

        let up_val_count = match chunk.get_constant(idx) {
          Value::Function(f) => f.borrow().up_val_count,
          _ => panic!("closure operand should be a function constant"),
        };

        1 + operand_size + up_val_count * 3
      }

      _ => 1,
    };
  }

  ops
}

/// Checks that every jump operand in the chunk lands inside the chunk.
fn assert_jumps_in_bounds(chunk: &Chunk) {
  for (offset, op) in walk(chunk) {
    match op {
      OpCode::JumpForward | OpCode::JumpIfFalse | OpCode::PopJumpIfFalse => {
        let jump = chunk.get_short(offset + 1) as usize;
        let target = offset + 3 + jump;
        assert!(target < chunk.len(), "forward jump at {} targets {}", offset, target);
      }
      OpCode::LoopJump => {
        let jump = chunk.get_short(offset + 1) as usize;
        assert!(jump <= offset + 3, "loop jump at {} would underflow", offset);
      }
      _ => {}
    }
  }
}

#[test]
fn empty_script_compiles_to_implicit_return() {
  let script = compile("").unwrap();

  assert_eq!(script.name, "<script>");
  assert_eq!(script.arity, 0);
  assert_eq!(script.chunk.get_op_code(0), OpCode::LoadImmNil);
  assert_eq!(script.chunk.get_op_code(1), OpCode::Return);
  assert_eq!(script.chunk.len(), 2);
}

#[test]
fn constant_pool_has_no_duplicate_literals() {
  let src = "8.9;".repeat(500);
  let script = compile(&src).unwrap();

  assert_eq!(script.chunk.get_pool_size(), 1);
}

#[test]
fn duplicate_string_literals_share_one_constant() {
  let script = compile("\"hi\"; \"hi\"; \"hi\";").unwrap();
  assert_eq!(script.chunk.get_pool_size(), 1);
}

#[test]
fn globals_compile_to_name_constants() {
  let script = compile("var a = 1; print a;").unwrap();
  let ops: Vec<OpCode> = walk(&script.chunk).into_iter().map(|(_, op)| op).collect();

  assert!(ops.contains(&OpCode::DefineGlobal));
  assert!(ops.contains(&OpCode::GetGlobal));
}

#[test]
fn locals_compile_to_slots() {
  let script = compile("{ var a = 1; print a; }").unwrap();
  let ops: Vec<OpCode> = walk(&script.chunk).into_iter().map(|(_, op)| op).collect();

  assert!(ops.contains(&OpCode::GetLocal));
  assert!(ops.contains(&OpCode::PopStackTop));
  assert!(!ops.contains(&OpCode::GetGlobal));
}

#[test]
fn scope_exits_use_a_counted_pop() {
  let script = compile("{ var a; var b; var c; }").unwrap();
  let ops: Vec<OpCode> = walk(&script.chunk).into_iter().map(|(_, op)| op).collect();

  assert!(ops.contains(&OpCode::PopStackTopN));
}

#[test]
fn var_without_initializer_defaults_to_nil() {
  let script = compile("var a;").unwrap();
  assert_eq!(script.chunk.get_op_code(0), OpCode::LoadImmNil);
}

#[test]
fn undefined_names_are_late_bound() {
  // Reading a name that was never declared is a runtime concern for
  // globals, not a compile error.
  assert!(compile("print not_yet_defined;").is_ok());
}

#[test]
fn jump_operands_resolve_within_the_chunk() {
  let src = "
    var total = 0;
    for (var i = 0; i < 10; i = i + 1) {
      if (i < 5 and total > 0 or i == 0) {
        total = total + i;
      } else {
        total = total - 1;
      }
    }
    while (total > 0) { total = total - 2; }
  ";

  let script = compile(src).unwrap();
  assert_jumps_in_bounds(&script.chunk);
}

#[test]
fn closures_record_their_captures() {
  let src = "
    fun make(n) {
      var c = n;
      fun f() {
        c = c + 1;
        return c;
      }
      return f;
    }
  ";

  let script = compile(src).unwrap();
  assert_jumps_in_bounds(&script.chunk);

  // The inner function is emitted inside `make`'s chunk as a closure over
  // one captured local.
  let make = script
    .chunk
    .find_function_constant("make")
    .expect("make should be a constant of the script");

  let make = make.borrow();
  let ops: Vec<OpCode> = walk(&make.chunk).into_iter().map(|(_, op)| op).collect();
  assert!(ops.contains(&OpCode::MakeClosure));

  let inner = make
    .chunk
    .find_function_constant("f")
    .expect("f should be a constant of make");
  assert_eq!(inner.borrow().up_val_count, 1);
}

#[test]
fn long_operand_widths_kick_in_past_256_constants() {
  let src: String = (0..300).map(|i| format!("var v{} = {};", i, i)).collect();
  let script = compile(&src).unwrap();

  assert!(script.chunk.get_pool_size() > 256);

  let ops: Vec<OpCode> = walk(&script.chunk).into_iter().map(|(_, op)| op).collect();
  assert!(ops.contains(&OpCode::DefineGlobal));
  assert!(ops.contains(&OpCode::DefineGlobalLong));
}

#[test]
fn duplicate_local_declaration_is_rejected() {
  assert_error_contains(
    "{ var a = 1; var a = 2; }",
    "Already a variable with this name in this scope.",
  );
}

#[test]
fn local_cannot_read_itself_in_its_initializer() {
  assert_error_contains(
    "var a = 1; { var a = a; }",
    "Can't read local variable in its own initializer.",
  );
}

#[test]
fn top_level_return_is_rejected() {
  assert_error_contains("return 1;", "Can't return from top-level code.");
}

#[test]
fn classes_are_rejected_by_this_backend() {
  assert_error_contains("class Foo {}", "tree-walk");
}

#[test]
fn too_many_arguments_are_rejected() {
  let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
  let src = format!("fun f() {{}} f({});", args.join(", "));

  assert_error_contains(&src, "Can't have more than 255 arguments.");
}

#[test]
fn too_many_parameters_are_rejected() {
  let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
  let src = format!("fun f({}) {{}}", params.join(", "));

  assert_error_contains(&src, "Can't have more than 255 parameters.");
}

#[test]
fn oversized_forward_jump_is_rejected() {
  // A then-branch bigger than a 16-bit jump offset cannot be patched.
  let src = format!("if (a) {{\n{}}}", "b = 1;\n".repeat(20_000));
  assert_error_contains(&src, "Too much code to jump over.");
}

#[test]
fn missing_semicolon_reports_expected_message() {
  assert_error_contains("print 1", "Expect ';' after value.");
}

#[test]
fn error_messages_carry_line_numbers() {
  match compile("var a = 1;\nvar 2 = 3;") {
    Ok(_) => panic!("expected a compile error"),
    Err(errors) => {
      assert!(errors[0].message.starts_with("[line 2] Error at '2':"));
    }
  }
}

#[test]
fn lex_errors_become_compile_errors() {
  assert_error_contains("var a = \"unterminated;", "Unterminated string.");
}

#[test]
fn panic_mode_recovers_and_reports_multiple_errors() {
  match compile("var 1 = 2;\nvar 3 = 4;") {
    Ok(_) => panic!("expected compile errors"),
    Err(errors) => assert!(errors.len() >= 2),
  }
}
