use num_derive::FromPrimitive;

/// The set of instructions supported by the virtual machine.
///
/// **NOTE:** Changing the order in which members are declared creates
/// incompatibilities between different versions of the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum OpCode {
  Nop,

  // Stack manipulation
  PopStackTop,
  PopStackTopN,

  // Value loaders
  LoadConstant,
  LoadConstantLong,
  LoadImmNil,
  LoadImmTrue,
  LoadImmFalse,

  // Operators
  Add,
  Divide,
  Equals,
  GreaterThan,
  GreaterThanEq,
  LessThan,
  LessThanEq,
  LogicNot,
  Multiply,
  Negate,
  NotEquals,
  Subtract,

  Print,

  // Global declarations
  DefineGlobal,
  DefineGlobalLong,
  GetGlobal,
  GetGlobalLong,
  SetGlobal,
  SetGlobalLong,

  // Local declarations
  GetLocal,
  GetLocalLong,
  SetLocal,
  SetLocalLong,

  // Jumps
  JumpForward,
  JumpIfFalse,
  LoopJump,
  PopJumpIfFalse,

  // Functions and closures
  FuncCall,
  GetUpVal,
  GetUpValLong,
  MakeClosure,
  MakeClosureLong,
  PopCloseUpVal,
  Return,
  SetUpVal,
  SetUpValLong,
}
