mod command;
mod error;
mod parse;
mod source;

use std::thread;
use std::time::Duration;

use self::command::{Command, Location, Query};
use self::source::{SourceMode, SourceReader};
use crate::error::Error;
use crate::inspector::{Inspector, Session};
use crate::opcode::Disassembly;
use crate::output::{Kind, Output, Verbosity};
use crate::runtime::Status;
use crate::{dprint, dprintln};

/// How often `wait` checks whether the engine has stopped.
const WAIT_INTERVAL: Duration = Duration::from_millis(5);

/// Leave this as a struct, in case more options are added in the future. Plus it is more explicit.
#[derive(Debug, Default)]
pub struct DebuggerOptions {
    /// Commands to run instead of reading stdin.
    pub command: Option<String>,
}

/// Interactive command loop, reading and writing the machine while the
/// engine runs on another thread.
pub struct Debugger {
    inspector: Inspector,
    command_source: SourceMode,
}

/// What the command loop should do after a command.
#[derive(Debug, PartialEq)]
enum Action {
    Proceed,
    Exit,
}

impl Debugger {
    pub fn new(opts: DebuggerOptions, inspector: Inspector) -> Self {
        Self {
            inspector,
            command_source: SourceMode::from(opts.command),
        }
    }

    /// Run commands until `exit` or the end of the command source.
    ///
    /// Either way, the running flag is cleared before returning.
    pub fn run(&mut self) {
        loop {
            // Convert `EOF` to `exit` command
            let command = self.next_command().unwrap_or(Command::Exit);
            if self.execute(command) == Action::Exit {
                return;
            }
        }
    }

    fn execute(&self, command: Command) -> Action {
        let mut session = self.inspector.session();
        let output = Output::Debugger(Verbosity::Always, Kind::Normal);

        match command {
            Command::Exit => {
                session.set_running(false);
                return Action::Exit;
            }

            Command::Help { topic: None } => {
                dprintln!(Always, Special, "{}", include_str!("./help.txt"));
            }
            Command::Help { topic: Some(name) } => {
                dprintln!(Always, Special, "{}", name.usage());
            }

            Command::Dump | Command::Info { query: Query::All } => {
                output.start_new_line();
                output.print_state(session.state());
            }
            Command::Info {
                query: Query::Registers,
            } => {
                output.start_new_line();
                output.print_registers(session.state());
            }
            Command::Info {
                query: Query::Flags,
            } => {
                output.start_new_line();
                output.print_flags(session.flags());
            }
            Command::Info {
                query: Query::Location(location),
            } => {
                output.start_new_line();
                if let Err(error) = show_location(&session, &location) {
                    dprintln!(Always, Error, "{}", error);
                }
            }

            Command::Set { location, value } => match set_location(&mut session, &location, value)
            {
                Ok(()) => dprintln!(Always, Warning, "Updated {}.", describe(&location)),
                Err(error) => dprintln!(Always, Error, "{}", error),
            },

            Command::Step { delay: None } => {
                dprintln!(
                    Always,
                    Info,
                    "Delay between instructions: {} ms.",
                    session.throttle().as_millis()
                );
            }
            Command::Step { delay: Some(delay) } => {
                session.set_throttle(Duration::from_millis(delay as u64));
                dprintln!(
                    Always,
                    Warning,
                    "Set delay between instructions to {} ms.",
                    delay
                );
            }

            Command::Halt => {
                session.set_running(false);
                dprintln!(Always, Warning, "Stopping execution.");
            }
            Command::Resume => {
                session.set_running(true);
                if session.status() == Status::Running {
                    dprintln!(Always, Warning, "Resumed execution.");
                } else {
                    dprintln!(
                        Always,
                        Error,
                        "Execution has already finished ({}). Cannot resume.",
                        session.status()
                    );
                }
            }

            Command::Wait => {
                // Must not hold the lock, or the engine could never finish
                drop(session);
                self.wait();
            }
        }

        Action::Proceed
    }

    /// Block until the engine reaches a terminal state.
    fn wait(&self) {
        dprintln!(Sometimes, Info, "Waiting for execution to finish...");
        let status = loop {
            let status = self.inspector.status();
            if status != Status::Running {
                break status;
            }
            thread::sleep(WAIT_INTERVAL);
        };
        dprintln!(Sometimes, Info, "Execution finished: {}.", status);
    }

    /// Returns `None` on EOF.
    fn next_command(&mut self) -> Option<Command> {
        // Loop until valid command or EOF
        loop {
            let line = self.command_source.read()?.trim();
            // Necessary, since `Command::try_from` assumes non-empty line
            if line.is_empty() {
                continue;
            }

            let command = match Command::try_from(line) {
                Ok(command) => command,
                Err(error) => {
                    dprintln!(Always, Error, "{}", error);
                    dprintln!(Always, Error, "Type `help` for a list of commands.");
                    continue;
                }
            };

            return Some(command);
        }
    }
}

fn show_location(session: &Session<'_>, location: &Location) -> Result<(), Error> {
    let output = Output::Debugger(Verbosity::Always, Kind::Normal);
    match location {
        Location::Register(register) => {
            let value = session.register(*register as u8)?;
            dprint!(Always, Normal, "{} ", register.name());
            output.print_integer(value);
            dprintln!(Always);
        }
        Location::Pair(pair) => {
            let value = session.pair(*pair as u8)?;
            dprintln!(Always, Normal, "{} 0x{:04X}", pair.name(), value);
        }
        Location::Flag(flag) => {
            let value = session.flag(flag.name())?;
            output.print_flag(*flag, value);
        }
        Location::ProgramCounter => {
            dprintln!(Always, Normal, "PC 0x{:04X}", session.pc());
            let next = Disassembly::at(session.state(), session.pc());
            dprintln!(Sometimes, Info, "Next instruction: {}", next);
        }
        Location::StackPointer => {
            dprintln!(Always, Normal, "SP 0x{:04X}", session.sp());
        }
        Location::Address(address) => {
            let value = session.memory(*address)?;
            dprint!(Always, Normal, "0x{:04X} ", address);
            output.print_integer(value);
            dprintln!(Always);
        }
    }
    Ok(())
}

/// `value` has already been checked against [`Location::max_value`].
fn set_location(session: &mut Session<'_>, location: &Location, value: u32) -> Result<(), Error> {
    match location {
        Location::Register(register) => session.set_register(*register as u8, value as u8),
        Location::Pair(pair) => session.set_pair(*pair as u8, value as u16),
        Location::Flag(flag) => session.set_flag(flag.name(), value != 0),
        Location::ProgramCounter => {
            session.set_pc(value as u16);
            Ok(())
        }
        Location::StackPointer => {
            session.set_sp(value as u16);
            Ok(())
        }
        Location::Address(address) => session.set_memory(*address, value as u8),
    }
}

fn describe(location: &Location) -> String {
    match location {
        Location::Register(register) => format!("register {}", register.name()),
        Location::Pair(pair) => format!("register pair {}", pair.name()),
        Location::Flag(flag) => format!("flag {}", flag.name()),
        Location::ProgramCounter => "program counter".to_string(),
        Location::StackPointer => "stack pointer".to_string(),
        Location::Address(address) => format!("memory at address 0x{:04x}", address),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Machine;
    use crate::state::{Flag, Pair, Register, State};

    fn debugger(commands: &str) -> (Debugger, Inspector) {
        let inspector = Inspector::new(Machine::new(State::new()));
        let debugger = Debugger::new(
            DebuggerOptions {
                command: Some(commands.to_string()),
            },
            inspector.clone(),
        );
        (debugger, inspector)
    }

    #[test]
    fn set_writes_every_location() {
        let (mut debugger, inspector) = debugger(
            "set a 5; set hl 3000; set m 0x41; set psw 0xFF00; set cy 1; set pc 900; set sp C000",
        );
        debugger.run();

        let session = inspector.session();
        let state = session.state();
        assert_eq!(state.reg(Register::A), 0xFF);
        assert_eq!(state.pair(Pair::HL), 0x3000);
        assert_eq!(state.mem(0x3000), 0x41);
        assert_eq!(state.flags(), Flag::Carry.mask());
        assert_eq!(state.pc(), 0x0900);
        assert_eq!(state.sp(), 0xC000);
    }

    #[test]
    fn exit_clears_running_flag() {
        let (mut debugger, inspector) = debugger("dump; exit; set a 5");
        debugger.run();

        let session = inspector.session();
        assert!(!session.running());
        // Commands after `exit` are never run
        assert_eq!(session.register(Register::A as u8), Ok(0));
    }

    #[test]
    fn end_of_commands_is_exit() {
        let (mut debugger, inspector) = debugger("step #20");
        debugger.run();

        let session = inspector.session();
        assert!(!session.running());
        assert_eq!(session.throttle(), Duration::from_millis(20));
    }

    #[test]
    fn malformed_commands_change_nothing() {
        let (mut debugger, inspector) = debugger("set a 100; set q 1; bogus; info a 10000; set 10000 1");
        debugger.run();

        let session = inspector.session();
        assert_eq!(session.register(Register::A as u8), Ok(0));
        assert_eq!(session.flags(), 0);
    }

    #[test]
    fn halt_and_resume() {
        let (debugger, inspector) = debugger("");
        assert_eq!(debugger.execute(Command::Halt), Action::Proceed);
        assert!(!inspector.session().running());
        assert_eq!(debugger.execute(Command::Resume), Action::Proceed);
        assert!(inspector.session().running());
    }
}
