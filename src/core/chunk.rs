use crate::core::bytecode::OpCode;
use crate::objects::Value;
use num_traits::FromPrimitive;

/// Contains all the necessary information about the instructions to be
/// executed: the raw byte stream, the constant pool, and a run-length
/// compressed mapping from byte offset to source line.
#[derive(Clone, Default)]
pub struct Chunk {
  instructions: Vec<u8>,
  constants: Vec<Value>,
  /// Run-length encoded line table. A positive entry is a source line
  /// covering one byte; a negative entry `-c` makes the line entry that
  /// follows it cover `c` bytes instead.
  lines: Vec<isize>,
}

impl Chunk {
  /// Creates a new chunk.
  pub fn new() -> Self {
    Self {
      instructions: vec![],
      constants: vec![],
      lines: vec![],
    }
  }

  /// Adds a constant to this chunk's constants pool.
  ///
  /// # Parameters
  /// - `val`: The value to be added to the pool.
  ///
  /// # Returns
  /// - `Result<u16, ()>`: If the value was successfully added to the pool,
  /// returns the position of the value in the pool. If the value could not
  /// be added because the pool is full, returns error.
  pub fn add_constant(&mut self, val: Value) -> Result<u16, ()> {
    if self.constants.len() >= (u16::MAX as usize) + 1 {
      return Err(());
    }

    // Reuse an existing pool entry when an equal constant is already
    // present, so that duplicate literals share a single slot.
    match self.constants.iter().position(|x| x == &val) {
      Some(idx) => Ok(idx as u16),
      None => {
        self.constants.push(val);
        Ok((self.constants.len() as u16) - 1)
      }
    }
  }

  /// Retrieves a constant from this chunk's constants pool.
  pub fn get_constant(&self, idx: usize) -> &Value {
    &self.constants[idx]
  }

  /// Gets the OpCode associated with a byte instruction in the instructions list.
  pub fn get_op_code(&self, idx: usize) -> OpCode {
    FromPrimitive::from_u8(self.instructions[idx]).unwrap_or(OpCode::Nop)
  }

  /// Adds a byte instruction from a given OpCode into the instructions list.
  pub fn push_op_code(&mut self, val: OpCode, line: usize) {
    self.push_byte(val as u8, line);
  }

  /// Gets a raw byte from the instructions list.
  pub fn get_byte(&self, idx: usize) -> u8 {
    self.instructions[idx]
  }

  /// Adds a raw byte into the instructions list, recording its source line.
  pub fn push_byte(&mut self, val: u8, line: usize) {
    self.instructions.push(val);
    self.push_line(line);
  }

  /// Retrieves the current and next bytes at the given instructions list
  /// index, then converts those two bytes into a u16 short.
  pub fn get_short(&self, idx: usize) -> u16 {
    let b1 = self.instructions[idx];
    let b2 = self.instructions[idx + 1];

    u16::from_le_bytes([b1, b2])
  }

  /// Splits a 16-bit integer into two bytes, and adds each individual byte
  /// in sequence into the instructions list.
  pub fn push_short(&mut self, val: u16, line: usize) {
    let short = val.to_le_bytes();

    self.push_byte(short[0], line);
    self.push_byte(short[1], line);
  }

  /// Modifies the byte value at the specified chunk index.
  pub fn modify_byte(&mut self, idx: usize, new_byte: u8) {
    self.instructions[idx] = new_byte;
  }

  /// Removes the last byte from the instructions list together with its
  /// line-table entry.
  pub fn pop_byte(&mut self) -> Option<(u8, usize)> {
    let byte = self.instructions.pop()?;
    let line = *self.lines.last().unwrap() as usize;

    let len = self.lines.len();
    if len >= 2 && self.lines[len - 2] < 0 {
      // The last line entry is run-length encoded: shrink the run, and
      // drop the count entry once it would cover a single byte again.
      self.lines[len - 2] += 1;
      if self.lines[len - 2] == -1 {
        self.lines.remove(len - 2);
      }
    } else {
      self.lines.pop();
    }

    Some((byte, line))
  }

  /// Records the source line for the most recently pushed byte.
  fn push_line(&mut self, line: usize) {
    let line = line as isize;

    match self.lines.last() {
      Some(&last) if last == line => {
        let len = self.lines.len();

        if len >= 2 && self.lines[len - 2] < 0 {
          self.lines[len - 2] -= 1;
        } else {
          self.lines.insert(len - 1, -2);
        }
      }
      _ => self.lines.push(line),
    }
  }

  /// Gets the source line associated with the byte at the given
  /// instruction offset.
  pub fn get_line(&self, offset: usize) -> usize {
    let mut covered = 0usize;
    let mut idx = 0;

    while idx < self.lines.len() {
      let entry = self.lines[idx];

      let (count, line) = if entry < 0 {
        idx += 1;
        ((-entry) as usize, self.lines[idx])
      } else {
        (1, entry)
      };

      covered += count;
      if offset < covered {
        return line as usize;
      }

      idx += 1;
    }

    0
  }

  /// Gets the size of the instructions list.
  pub fn len(&self) -> usize {
    self.instructions.len()
  }

  /// Checks whether or not the instructions list is empty.
  pub fn is_empty(&self) -> bool {
    self.instructions.is_empty()
  }

  /// Gets the size of the constants pool list.
  pub fn get_pool_size(&self) -> usize {
    self.constants.len()
  }

  /// Looks up a function constant by name. Intended for inspecting
  /// compiled chunks from the test suite.
  #[cfg(test)]
  pub fn find_function_constant(
    &self,
    name: &str,
  ) -> Option<std::rc::Rc<std::cell::RefCell<crate::objects::FuncObject>>> {
    self.constants.iter().find_map(|constant| match constant {
      Value::Function(f) if f.borrow().name == name => Some(std::rc::Rc::clone(f)),
      _ => None,
    })
  }
}
