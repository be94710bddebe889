use crate::core::chunk::Chunk;
use crate::objects::str_obj::StringInterner;
use crate::objects::Value;

#[test]
fn line_table_round_trips_every_offset() {
  let lines = [1, 1, 1, 2, 3, 3, 3, 3, 10, 11, 11];

  let mut chunk = Chunk::new();
  for (byte, line) in lines.iter().enumerate() {
    chunk.push_byte(byte as u8, *line);
  }

  for (offset, line) in lines.iter().enumerate() {
    assert_eq!(chunk.get_line(offset), *line, "wrong line for offset {}", offset);
  }
}

#[test]
fn line_table_is_monotonic_for_single_line_chunks() {
  let mut chunk = Chunk::new();
  for byte in 0..100u8 {
    chunk.push_byte(byte, 7);
  }

  for offset in 0..100 {
    assert_eq!(chunk.get_line(offset), 7);
  }
}

#[test]
fn pop_byte_unwinds_the_line_table() {
  let mut chunk = Chunk::new();
  chunk.push_byte(0xa0, 1);
  chunk.push_byte(0xa1, 2);
  chunk.push_byte(0xa2, 2);
  chunk.push_byte(0xa3, 2);

  assert_eq!(chunk.pop_byte(), Some((0xa3, 2)));
  assert_eq!(chunk.pop_byte(), Some((0xa2, 2)));
  assert_eq!(chunk.pop_byte(), Some((0xa1, 2)));
  assert_eq!(chunk.pop_byte(), Some((0xa0, 1)));
  assert_eq!(chunk.pop_byte(), None);
}

#[test]
fn pop_byte_then_push_keeps_lookup_consistent() {
  let mut chunk = Chunk::new();
  chunk.push_byte(1, 1);
  chunk.push_byte(2, 1);
  chunk.push_byte(3, 2);

  chunk.pop_byte();
  chunk.push_byte(4, 5);

  assert_eq!(chunk.get_line(0), 1);
  assert_eq!(chunk.get_line(1), 1);
  assert_eq!(chunk.get_line(2), 5);
}

#[test]
fn shorts_are_little_endian() {
  let mut chunk = Chunk::new();
  chunk.push_short(0x1234, 1);

  assert_eq!(chunk.get_byte(0), 0x34);
  assert_eq!(chunk.get_byte(1), 0x12);
  assert_eq!(chunk.get_short(0), 0x1234);
}

#[test]
fn constant_pool_deduplicates_equal_values() {
  let mut chunk = Chunk::new();

  let first = chunk.add_constant(Value::Number(8.9)).unwrap();
  let second = chunk.add_constant(Value::Number(8.9)).unwrap();

  assert_eq!(first, second);
  assert_eq!(chunk.get_pool_size(), 1);
}

#[test]
fn constant_pool_deduplicates_interned_strings() {
  let mut interner = StringInterner::new();
  let mut chunk = Chunk::new();

  let a = chunk.add_constant(Value::Str(interner.intern("hello"))).unwrap();
  let b = chunk.add_constant(Value::Str(interner.intern("hello"))).unwrap();

  assert_eq!(a, b);
  assert_eq!(chunk.get_pool_size(), 1);
}

#[test]
fn constant_pool_is_capped() {
  let mut chunk = Chunk::new();

  for i in 0..65536 {
    assert!(chunk.add_constant(Value::Number(i as f64)).is_ok());
  }

  assert!(chunk.add_constant(Value::Number(-1.0)).is_err());
}
