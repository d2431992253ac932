// Machine model
mod state;
pub use state::{
    Flag, Pair, Register, State, LOAD_ADDRESS, MEMORY_MAX, STACK_SEGMENT_START, STACK_TOP,
    STDIN_PORT, STDOUT_PORT,
};
pub mod flags;
mod opcode;
pub use opcode::{AluOp, Condition, Disassembly, Instruction, OpTable, OP_TABLE};
mod execute;

// Running
pub mod output;
mod runtime;
pub use runtime::{step, Engine, Machine, Status};
mod inspector;
pub use inspector::{Inspector, Session};
mod debugger;
pub use debugger::{Debugger, DebuggerOptions};

mod loader;
pub use loader::{read_image, IMAGE_LIMIT};

mod error;
pub use error::{Error, LoadError};

pub mod env;
