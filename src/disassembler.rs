use crate::core::bytecode::OpCode;
use crate::core::chunk::Chunk;

/// Disassembles a whole chunk, printing each instruction with its offset
/// and source line.
///
/// # Parameters
/// - `chunk`: The chunk to disassemble.
/// - `name`: The name to print for the chunk.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) {
  println!("==== {} ====", name);

  let mut offset = 0;
  while offset < chunk.len() {
    offset = disassemble_instruction(chunk, offset);
  }
}

/// Disassembles the single instruction at the given offset.
///
/// # Returns
/// - `usize`: The offset of the next instruction.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> usize {
  print!("{:>04} ", offset);

  if offset > 0 && chunk.get_line(offset) == chunk.get_line(offset - 1) {
    print!("  |  ");
  } else {
    print!("{:>04} ", chunk.get_line(offset));
  }

  let instr = chunk.get_op_code(offset);
  print!("{:?}", instr);

  match instr {
    OpCode::LoadConstant => {
      let idx = chunk.get_byte(offset + 1) as usize;
      println!("\t{}\t---> {}", idx, chunk.get_constant(idx));
      offset + 2
    }
    OpCode::LoadConstantLong => {
      let idx = chunk.get_short(offset + 1) as usize;
      println!("\t{}\t---> {}", idx, chunk.get_constant(idx));
      offset + 3
    }

    OpCode::DefineGlobal | OpCode::GetGlobal | OpCode::SetGlobal => {
      let idx = chunk.get_byte(offset + 1) as usize;
      println!("\t{}\t---> {}", idx, chunk.get_constant(idx));
      offset + 2
    }
    OpCode::DefineGlobalLong | OpCode::GetGlobalLong | OpCode::SetGlobalLong => {
      let idx = chunk.get_short(offset + 1) as usize;
      println!("\t{}\t---> {}", idx, chunk.get_constant(idx));
      offset + 3
    }

    OpCode::PopStackTopN
    | OpCode::FuncCall
    | OpCode::GetLocal
    | OpCode::SetLocal
    | OpCode::GetUpVal
    | OpCode::SetUpVal => {
      println!("\t{}", chunk.get_byte(offset + 1));
      offset + 2
    }

    OpCode::GetLocalLong | OpCode::SetLocalLong | OpCode::GetUpValLong | OpCode::SetUpValLong => {
      println!("\t{}", chunk.get_short(offset + 1));
      offset + 3
    }

    OpCode::JumpForward | OpCode::JumpIfFalse | OpCode::PopJumpIfFalse => {
      let jump = chunk.get_short(offset + 1) as usize;
      println!("\t{} (to {})", jump, offset + 3 + jump);
      offset + 3
    }

    OpCode::LoopJump => {
      let jump = chunk.get_short(offset + 1) as usize;
      println!("\t{} (to {})", jump, offset + 3 - jump);
      offset + 3
    }

    OpCode::MakeClosure | OpCode::MakeClosureLong => {
      let mut next = offset + 1;

      let idx = if let OpCode::MakeClosure = instr {
        next += 1;
        chunk.get_byte(next - 1) as usize
      } else {
        next += 2;
        chunk.get_short(next - 2) as usize
      };

      let function = chunk.get_constant(idx);
      println!("\t{}\t---> {}", idx, function);

      // Each captured variable is a (is_local, index) operand pair.
      let up_val_count = match function {
        crate::objects::Value::Function(f) => f.borrow().up_val_count,
        _ => 0,
      };

      for _ in 0..up_val_count {
        let is_local = chunk.get_byte(next) == 1;
        let index = chunk.get_short(next + 1);
        println!("{:>10} {} {}", "|", if is_local { "local" } else { "upvalue" }, index);
        next += 3;
      }

      next
    }

    // Instructions with no operand.
    _ => {
      println!();
      offset + 1
    }
  }
}
