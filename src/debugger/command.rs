use std::fmt;

use super::error::{ArgumentError, CommandError};
use super::parse::ArgIter;
use crate::state::{Flag, Pair, Register};

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub enum Command {
    Help { topic: Option<CommandName> },
    Dump,
    Info { query: Query },
    Set { location: Location, value: u32 },
    /// Show or set the throttle, in milliseconds.
    Step { delay: Option<u32> },
    Halt,
    Resume,
    Wait,
    Exit,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CommandName {
    Help,
    Dump,
    Info,
    Set,
    Step,
    Halt,
    Resume,
    Wait,
    Exit,
}

/// What `info` should show.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub enum Query {
    All,
    Registers,
    Flags,
    Location(Location),
}

/// Anything the inspector can read or write.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub enum Location {
    Register(Register),
    Pair(Pair),
    Flag(Flag),
    ProgramCounter,
    StackPointer,
    /// Not range-checked until accessed.
    Address(u32),
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => write!(f, "help"),
            Self::Dump => write!(f, "dump"),
            Self::Info => write!(f, "info"),
            Self::Set => write!(f, "set"),
            Self::Step => write!(f, "step"),
            Self::Halt => write!(f, "halt"),
            Self::Resume => write!(f, "resume"),
            Self::Wait => write!(f, "wait"),
            Self::Exit => write!(f, "exit"),
        }
    }
}

impl CommandName {
    /// One-line usage, shown by `help <command>`.
    pub fn usage(&self) -> &'static str {
        match self {
            Self::Help => "help [command] - display help message",
            Self::Dump => "dump - display register, flag, and port contents",
            Self::Info => {
                "info [r [register] | f [flag] | p <pair> | a <address>] - get register/flag/pair/address info"
            }
            Self::Set => "set <location> <value> - write value into register, pair, flag, PC, SP, or address",
            Self::Step => "step [milliseconds] - show or set delay between instructions (0 by default)",
            Self::Halt => "halt - stop execution, without leaving the debugger",
            Self::Resume => "resume - set the running flag again, if execution has not yet stopped",
            Self::Wait => "wait - block until execution has finished",
            Self::Exit => "exit - stop execution and exit debugger",
        }
    }
}

impl Location {
    /// Largest value which can be written to this location.
    pub fn max_value(&self) -> u32 {
        match self {
            Self::Flag(_) => 1,
            Self::Register(_) | Self::Address(_) => u8::MAX as u32,
            Self::Pair(_) | Self::ProgramCounter | Self::StackPointer => u16::MAX as u32,
        }
    }
}

impl<'a> TryFrom<&'a str> for Command {
    type Error = CommandError;

    /// Assumes line is non-empty.
    fn try_from(line: &'a str) -> std::result::Result<Self, Self::Error> {
        let mut iter = ArgIter::from(line);

        let command_name = iter.get_command_name()?;
        Command::parse_arguments(command_name, &mut iter).map_err(|error| {
            CommandError::InvalidArgument {
                command_name,
                error,
            }
        })
    }
}

impl Command {
    fn parse_arguments(name: CommandName, iter: &mut ArgIter<'_>) -> Result<Self, ArgumentError> {
        let mut expected_args = 0;

        let command = match name {
            // Allow trailing arguments
            CommandName::Help => {
                return Ok(Self::Help {
                    topic: iter.next_command_name_or_none("command")?,
                })
            }

            CommandName::Dump => Self::Dump,
            CommandName::Halt => Self::Halt,
            CommandName::Resume => Self::Resume,
            CommandName::Wait => Self::Wait,
            CommandName::Exit => Self::Exit,

            CommandName::Info => {
                expected_args = 2;
                let query = iter.next_query("category")?;
                Self::Info { query }
            }
            CommandName::Set => {
                expected_args = 2;
                let location = iter.next_location("location", expected_args)?;
                let value = iter.next_integer("value", expected_args, location.max_value())?;
                Self::Set { location, value }
            }
            CommandName::Step => {
                expected_args = 1;
                let delay = iter.next_integer_or_none("milliseconds", u32::MAX)?;
                Self::Step { delay }
            }
        };

        iter.expect_end(expected_args)?;

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::error::ValueError;

    fn parse(line: &str) -> Result<Command, CommandError> {
        Command::try_from(line)
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse("dump"), Ok(Command::Dump));
        assert_eq!(parse("  EXIT  "), Ok(Command::Exit));
        assert_eq!(parse("q"), Ok(Command::Exit));
        assert_eq!(parse("wait"), Ok(Command::Wait));
        assert_eq!(parse("halt"), Ok(Command::Halt));
        assert_eq!(parse("Resume"), Ok(Command::Resume));
        assert_eq!(parse("help"), Ok(Command::Help { topic: None }));
        assert_eq!(
            parse("help set whatever"),
            Ok(Command::Help {
                topic: Some(CommandName::Set)
            })
        );
    }

    #[test]
    fn info_queries() {
        assert_eq!(parse("info"), Ok(Command::Info { query: Query::All }));
        assert_eq!(
            parse("info r"),
            Ok(Command::Info {
                query: Query::Registers
            })
        );
        assert_eq!(
            parse("info r a"),
            Ok(Command::Info {
                query: Query::Location(Location::Register(Register::A))
            })
        );
        assert_eq!(
            parse("info r PC"),
            Ok(Command::Info {
                query: Query::Location(Location::ProgramCounter)
            })
        );
        assert_eq!(
            parse("info f"),
            Ok(Command::Info { query: Query::Flags })
        );
        assert_eq!(
            parse("info f cy"),
            Ok(Command::Info {
                query: Query::Location(Location::Flag(Flag::Carry))
            })
        );
        assert_eq!(
            parse("info a 2000"),
            Ok(Command::Info {
                query: Query::Location(Location::Address(0x2000))
            })
        );
        assert_eq!(
            parse("info p hl"),
            Ok(Command::Info {
                query: Query::Location(Location::Pair(Pair::HL))
            })
        );
    }

    #[test]
    fn set_locations() {
        assert_eq!(
            parse("set 3000 41"),
            Ok(Command::Set {
                location: Location::Address(0x3000),
                value: 0x41
            })
        );
        assert_eq!(
            parse("set b #10"),
            Ok(Command::Set {
                location: Location::Register(Register::B),
                value: 10
            })
        );
        assert_eq!(
            parse("set psw 0xFFFF"),
            Ok(Command::Set {
                location: Location::Pair(Pair::PSW),
                value: 0xFFFF
            })
        );
        assert_eq!(
            parse("set z 1"),
            Ok(Command::Set {
                location: Location::Flag(Flag::Zero),
                value: 1
            })
        );
        assert_eq!(
            parse("set sp 0xC000"),
            Ok(Command::Set {
                location: Location::StackPointer,
                value: 0xC000
            })
        );
    }

    #[test]
    fn step_delay() {
        assert_eq!(parse("step"), Ok(Command::Step { delay: None }));
        assert_eq!(
            parse("step #250"),
            Ok(Command::Step { delay: Some(250) })
        );
    }

    #[test]
    fn invalid_commands() {
        assert_eq!(
            parse("frobnicate"),
            Err(CommandError::InvalidCommand {
                command_name: "frobnicate".to_string()
            })
        );
        assert_eq!(
            parse("set a"),
            Err(CommandError::InvalidArgument {
                command_name: CommandName::Set,
                error: ArgumentError::MissingArgument {
                    argument_name: "value",
                    expected_count: 2,
                    actual_count: 1,
                }
            })
        );
        assert_eq!(
            parse("set a 100"),
            Err(CommandError::InvalidArgument {
                command_name: CommandName::Set,
                error: ArgumentError::InvalidValue {
                    argument_name: "value",
                    error: ValueError::IntegerTooLarge { max: 0xFF },
                }
            })
        );
        assert_eq!(
            parse("dump now"),
            Err(CommandError::InvalidArgument {
                command_name: CommandName::Dump,
                error: ArgumentError::TooManyArguments {
                    expected_count: 0,
                    actual_count: 1,
                }
            })
        );
        assert_eq!(
            parse("info r x"),
            Err(CommandError::InvalidArgument {
                command_name: CommandName::Info,
                error: ArgumentError::InvalidValue {
                    argument_name: "register",
                    error: ValueError::MismatchedType {
                        expected_type: "register name, `PC`, or `SP`",
                        actual: "x".to_string(),
                    },
                }
            })
        );
        assert_eq!(
            parse("set 3000 zz"),
            Err(CommandError::InvalidArgument {
                command_name: CommandName::Set,
                error: ArgumentError::InvalidValue {
                    argument_name: "value",
                    error: ValueError::MalformedInteger {},
                }
            })
        );
    }
}
