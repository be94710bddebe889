pub mod bytecode;
pub mod chunk;

/// The max number of frames in the function call stack.
pub const FRAMES_MAX: usize = 128;
/// The initial capacity of the value stack.
pub const STACK_INITIAL: usize = 256;
/// The max number of parameters (and call arguments) for a function.
pub const FUNC_ARGS_MAX: usize = 255;
