use std::str::SplitWhitespace;

use super::command::{CommandName, Location, Query};
use super::error::{ArgumentError, CommandError, ValueError};
use crate::state::{Flag, Pair, Register};

#[derive(Clone, Copy, Debug, PartialEq)]
enum Radix {
    Binary = 2,
    Octal = 8,
    Decimal = 10,
    Hex = 16,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Category {
    Registers,
    Flags,
    Pair,
    Address,
}

impl Radix {
    /// Parse a single digit in a given radix.
    pub fn parse_digit(&self, ch: char) -> Option<u8> {
        Some(match self {
            Self::Binary => match ch {
                '0' => 0,
                '1' => 1,
                _ => return None,
            },
            Self::Octal => match ch {
                '0'..='7' => ch as u8 - b'0',
                _ => return None,
            },
            Self::Decimal => match ch {
                '0'..='9' => ch as u8 - b'0',
                _ => return None,
            },
            Self::Hex => match ch {
                '0'..='9' => ch as u8 - b'0',
                'a'..='f' => ch as u8 - b'a' + 10,
                'A'..='F' => ch as u8 - b'A' + 10,
                _ => return None,
            },
        })
    }
}

/// Returns `true` if `name` matchs any item of `candidates` (case insensitive).
fn matches(name: &str, candidates: &[&str]) -> bool {
    candidates
        .iter()
        .any(|candidate| name.eq_ignore_ascii_case(candidate))
}

/// Returns the first item which has a corresponding candidate matching `name` (case insensitive).
fn find_match<T: Copy>(name: &str, items: &[(T, &[&str])]) -> Option<T> {
    items
        .iter()
        .find(|(_, candidates)| matches(name, candidates))
        .map(|(item, _)| *item)
}

/// Parse an integer token.
///
/// Bare digits are hexadecimal, to match addresses as they are printed.
///
/// Accepts:
///  - Hex (`0x`/`x`), decimal (`#`), binary (`0b`), and octal (`0o`) prefixes.
///  - Underscores between digits. Eg. `0b1010_0101`.
///
/// A prefix always wins, so `0b1` is binary and must be written `x0b1` as hex.
pub fn parse_integer(token: &str) -> Result<u32, ValueError> {
    #[rustfmt::skip]
    let prefixes: &[(Radix, &[&str])] = &[
        (Radix::Hex,     &["0x", "x"]),
        (Radix::Decimal, &["#"]),
        (Radix::Binary,  &["0b"]),
        (Radix::Octal,   &["0o"]),
    ];

    let mut radix = Radix::Hex;
    let mut digits = token;
    'prefixes: for (candidate, prefixes) in prefixes {
        for prefix in *prefixes {
            let Some(head) = token.get(..prefix.len()) else {
                continue;
            };
            if head.eq_ignore_ascii_case(prefix) {
                radix = *candidate;
                digits = &token[prefix.len()..];
                break 'prefixes;
            }
        }
    }

    if digits.is_empty() || digits.starts_with('_') {
        return Err(ValueError::MalformedInteger {});
    }

    let mut integer: u32 = 0;
    for ch in digits.chars() {
        if ch == '_' {
            continue;
        }
        let Some(digit) = radix.parse_digit(ch) else {
            return Err(ValueError::MalformedInteger {});
        };
        integer = integer
            .checked_mul(radix as u32)
            .and_then(|integer| integer.checked_add(digit as u32))
            .ok_or(ValueError::IntegerTooLarge { max: u32::MAX })?;
    }
    Ok(integer)
}

/// Name of a register, or `PC`/`SP`, as accepted by `info r`.
fn parse_register_location(token: &str) -> Result<Location, ValueError> {
    if matches(token, &["pc"]) {
        return Ok(Location::ProgramCounter);
    }
    if matches(token, &["sp"]) {
        return Ok(Location::StackPointer);
    }
    Register::from_name(token)
        .map(Location::Register)
        .ok_or_else(|| ValueError::MismatchedType {
            expected_type: "register name, `PC`, or `SP`",
            actual: token.to_string(),
        })
}

fn parse_flag_location(token: &str) -> Result<Location, ValueError> {
    Flag::from_name(token)
        .map(Location::Flag)
        .ok_or_else(|| ValueError::MismatchedType {
            expected_type: "flag name",
            actual: token.to_string(),
        })
}

fn parse_pair_location(token: &str) -> Result<Location, ValueError> {
    if matches(token, &["sp"]) {
        return Ok(Location::StackPointer);
    }
    Pair::from_name(token)
        .map(Location::Pair)
        .ok_or_else(|| ValueError::MismatchedType {
            expected_type: "pair name",
            actual: token.to_string(),
        })
}

/// Any writable location. Names take precedence over hex addresses, so
/// `set ac 1` writes the flag and `set 0xac 1` writes memory.
fn parse_location(token: &str) -> Result<Location, ValueError> {
    if let Ok(location) = parse_register_location(token) {
        return Ok(location);
    }
    if let Ok(location) = parse_pair_location(token) {
        return Ok(location);
    }
    if let Ok(location) = parse_flag_location(token) {
        return Ok(location);
    }
    parse_integer(token).map(Location::Address)
}

pub struct ArgIter<'a> {
    tokens: SplitWhitespace<'a>,
    /// Amount of arguments requested (successfully or not).
    ///
    /// Must only be incremented by [`Self::next_argument`].
    arg_count: u8,
}

impl<'a> ArgIter<'a> {
    pub fn from(line: &'a str) -> Self {
        Self {
            tokens: line.split_whitespace(),
            arg_count: 0,
        }
    }

    #[cfg(test)]
    pub fn arg_count(&self) -> u8 {
        self.arg_count
    }

    /// Parse and consume command name.
    ///
    /// Assumes line is non-empty.
    pub fn get_command_name(&mut self) -> Result<CommandName, CommandError> {
        let command_name = self.tokens.next();
        // Command source should always return a string containing non-whitespace
        // characters, so initial command name should always exist.
        debug_assert!(command_name.is_some(), "missing command name");
        let command_name = command_name.unwrap_or("");

        find_command_name(command_name).ok_or_else(|| CommandError::InvalidCommand {
            command_name: command_name.to_string(),
        })
    }

    /// Parse and consume next command name argument, if any.
    pub fn next_command_name_or_none(
        &mut self,
        argument_name: &'static str,
    ) -> Result<Option<CommandName>, ArgumentError> {
        let Some(token) = self.next_argument() else {
            return Ok(None);
        };
        find_command_name(token)
            .map(Some)
            .ok_or_else(|| ArgumentError::InvalidValue {
                argument_name,
                error: ValueError::MismatchedType {
                    expected_type: "command name",
                    actual: token.to_string(),
                },
            })
    }

    /// Parse and consume the arguments of `info`: an optional category, then
    /// an item of that category.
    pub fn next_query(&mut self, argument_name: &'static str) -> Result<Query, ArgumentError> {
        const EXPECTED_COUNT: u8 = 2;

        let Some(token) = self.next_argument() else {
            return Ok(Query::All);
        };

        #[rustfmt::skip]
        let categories: &[(_, &[_])] = &[
            (Category::Registers, &["r", "reg", "registers"]),
            (Category::Flags,     &["f", "flag", "flags"]),
            (Category::Pair,      &["p", "pair"]),
            (Category::Address,   &["a", "addr", "address"]),
        ];
        let Some(category) = find_match(token, categories) else {
            return Err(ArgumentError::InvalidValue {
                argument_name,
                error: ValueError::MismatchedType {
                    expected_type: "`r`, `f`, `p`, or `a`",
                    actual: token.to_string(),
                },
            });
        };

        match category {
            Category::Registers => match self.next_argument() {
                None => Ok(Query::Registers),
                Some(token) => parse_register_location(token)
                    .map(Query::Location)
                    .map_err(|error| ArgumentError::InvalidValue {
                        argument_name: "register",
                        error,
                    }),
            },

            Category::Flags => match self.next_argument() {
                None => Ok(Query::Flags),
                Some(token) => parse_flag_location(token).map(Query::Location).map_err(
                    |error| ArgumentError::InvalidValue {
                        argument_name: "flag",
                        error,
                    },
                ),
            },

            Category::Pair => {
                let token = self.next_required_argument("pair", EXPECTED_COUNT)?;
                parse_pair_location(token)
                    .map(Query::Location)
                    .map_err(|error| ArgumentError::InvalidValue {
                        argument_name: "pair",
                        error,
                    })
            }

            Category::Address => {
                let token = self.next_required_argument("address", EXPECTED_COUNT)?;
                parse_integer(token)
                    .map(|address| Query::Location(Location::Address(address)))
                    .map_err(|error| ArgumentError::InvalidValue {
                        argument_name: "address",
                        error,
                    })
            }
        }
    }

    /// Parse and consume next [`Location`] argument.
    pub fn next_location(
        &mut self,
        argument_name: &'static str,
        expected_count: u8,
    ) -> Result<Location, ArgumentError> {
        let token = self.next_required_argument(argument_name, expected_count)?;
        parse_location(token).map_err(|error| ArgumentError::InvalidValue {
            argument_name,
            error,
        })
    }

    /// Parse and consume next integer argument, which must be at most `max`.
    pub fn next_integer(
        &mut self,
        argument_name: &'static str,
        expected_count: u8,
        max: u32,
    ) -> Result<u32, ArgumentError> {
        let token = self.next_required_argument(argument_name, expected_count)?;
        parse_bounded_integer(token, max).map_err(|error| ArgumentError::InvalidValue {
            argument_name,
            error,
        })
    }

    /// Parse and consume next integer argument, if any.
    pub fn next_integer_or_none(
        &mut self,
        argument_name: &'static str,
        max: u32,
    ) -> Result<Option<u32>, ArgumentError> {
        let Some(token) = self.next_argument() else {
            return Ok(None);
        };
        parse_bounded_integer(token, max)
            .map(Some)
            .map_err(|error| ArgumentError::InvalidValue {
                argument_name,
                error,
            })
    }

    /// Returns an error if the command contains any arguments which haven't been consumed.
    pub fn expect_end(&mut self, expected_count: u8) -> Result<(), ArgumentError> {
        let remaining = self.tokens.by_ref().count();
        if remaining > 0 {
            return Err(ArgumentError::TooManyArguments {
                expected_count,
                actual_count: self.arg_count.saturating_add(remaining as u8),
            });
        }
        Ok(())
    }

    fn next_required_argument(
        &mut self,
        argument_name: &'static str,
        expected_count: u8,
    ) -> Result<&'a str, ArgumentError> {
        let actual_count = self.arg_count;
        self.next_argument()
            .ok_or(ArgumentError::MissingArgument {
                argument_name,
                expected_count,
                actual_count,
            })
    }

    fn next_argument(&mut self) -> Option<&'a str> {
        let token = self.tokens.next()?;
        self.arg_count += 1;
        Some(token)
    }
}

fn find_command_name(name: &str) -> Option<CommandName> {
    #[rustfmt::skip]
    let commands: &[(_, &[_])] = &[
        (CommandName::Help,   &["help", "--help", "h", "-h", "?"]),
        (CommandName::Dump,   &["dump", "d"]),
        (CommandName::Info,   &["info", "i"]),
        (CommandName::Set,    &["set", "s"]),
        (CommandName::Step,   &["step"]),
        (CommandName::Halt,   &["halt", "stop"]),
        (CommandName::Resume, &["resume", "cont"]),
        (CommandName::Wait,   &["wait", "w"]),
        (CommandName::Exit,   &["exit", "quit", "q"]),
    ];
    find_match(name, commands)
}

fn parse_bounded_integer(token: &str, max: u32) -> Result<u32, ValueError> {
    let integer = parse_integer(token).map_err(|error| match error {
        ValueError::IntegerTooLarge { .. } => ValueError::IntegerTooLarge { max },
        error => error,
    })?;
    if integer > max {
        return Err(ValueError::IntegerTooLarge { max });
    }
    Ok(integer)
}
