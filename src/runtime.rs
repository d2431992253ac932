use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::dprintln;
use crate::error::Error;
use crate::opcode::{Disassembly, OP_TABLE};
use crate::state::{State, STACK_SEGMENT_START};

/// Lifecycle of the fetch-execute engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Running,
    /// Running flag was cleared, by `HLT` or by the inspector.
    Halted,
    /// Program counter reached the stack segment.
    OutOfBounds,
}

/// Handle to the one machine state, shared by the engine and the inspector.
///
/// Every access goes through a single lock. The engine holds it for one whole
/// instruction, and the inspector for one whole command, so neither ever observes
/// a half-written register pair or flag byte.
#[derive(Clone, Default)]
pub struct Machine {
    state: Arc<Mutex<State>>,
}

/// Fetch-execute loop.
pub struct Engine {
    machine: Machine,
    trace: bool,
}

/// Marks the machine halted if the engine thread unwinds, so that anything
/// waiting on [`Status`] is released.
struct HaltOnUnwind<'a> {
    machine: &'a Machine,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Halted => write!(f, "halted"),
            Self::OutOfBounds => write!(f, "reached stack segment"),
        }
    }
}

impl Machine {
    pub fn new(state: State) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Acquire exclusive access to the machine state.
    pub fn lock(&self) -> MutexGuard<'_, State> {
        // State is consistent at every instruction boundary, so a panic while
        // holding the lock can't leave it half-updated
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> State {
        self.lock().clone()
    }
}

impl Engine {
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            trace: false,
        }
    }

    /// Log every instruction before it is executed.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Run until the program halts or reaches the stack segment.
    ///
    /// The throttle delay is slept without holding the lock.
    pub fn run(&self) -> Status {
        let _guard = HaltOnUnwind {
            machine: &self.machine,
        };
        loop {
            let delay = {
                let mut state = self.machine.lock();
                if let Some(status) = terminal_status(&state) {
                    state.set_status(status);
                    return status;
                }

                if self.trace {
                    let disassembly = Disassembly::at(&state, state.pc());
                    dprintln!(Sometimes, Info, "0x{:04x}  {}", state.pc(), disassembly);
                }
                if let Err(error) = step(&mut state) {
                    dprintln!(Always, Error, "{}", error);
                }

                state.throttle()
            };

            if delay.is_zero() {
                // Let a waiting inspector take the lock
                thread::yield_now();
            } else {
                thread::sleep(delay);
            }
        }
    }
}

impl Drop for HaltOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            let mut state = self.machine.lock();
            state.set_running(false);
            state.set_status(Status::Halted);
        }
    }
}

/// `None` while the engine should keep running.
///
/// A cleared running flag takes precedence, so a `HLT` as the last byte before
/// the stack segment still counts as a halt.
fn terminal_status(state: &State) -> Option<Status> {
    if !state.running() {
        Some(Status::Halted)
    } else if state.pc() >= STACK_SEGMENT_START {
        Some(Status::OutOfBounds)
    } else {
        None
    }
}

/// Fetch, decode and execute one instruction.
///
/// An undefined opcode is skipped like a `NOP`, with the program counter left just
/// past it, and reported to the caller.
pub fn step(state: &mut State) -> Result<(), Error> {
    let address = state.pc();
    let opcode = state.fetch_byte();
    let Some(instruction) = OP_TABLE.get(opcode) else {
        return Err(Error::UndefinedOpcode { opcode, address });
    };
    state.execute(instruction);
    Ok(())
}
