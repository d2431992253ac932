use std::io::{self, IsTerminal, Read};

use crate::{dprint, dprintln};

const PROMPT: &str = "vm8085# ";

#[allow(private_interfaces)]
#[derive(Debug)]
pub enum SourceMode {
    Argument(Argument),
    Stdin(Stdin),
}

// Command-line argument
#[derive(Debug)]
struct Argument {
    buffer: String,
    /// Byte index
    cursor: usize,
}

// Piped or interactive stdin
#[derive(Debug)]
struct Stdin {
    stdin: io::Stdin,
    /// Command must be stored somewhere to be referenced
    buffer: String,
    /// Prompt is only shown when a user is typing.
    is_terminal: bool,
}

pub trait SourceReader {
    /// `None` indicates EOF
    /// Returned string slice MAY include leading or trailing whitespace
    fn read(&mut self) -> Option<&str>;
}

impl SourceMode {
    pub fn from(argument: Option<String>) -> Self {
        if let Some(argument) = argument {
            return SourceMode::Argument(Argument::from(argument));
        }
        SourceMode::Stdin(Stdin::from(io::stdin()))
    }
}

impl SourceReader for SourceMode {
    fn read(&mut self) -> Option<&str> {
        match self {
            Self::Argument(argument) => {
                let command = argument.read();
                echo_command(command);
                command
            }
            Self::Stdin(stdin) => {
                let is_terminal = stdin.is_terminal;
                let command = stdin.read();
                // The terminal already shows what was typed
                if !is_terminal {
                    echo_command(command);
                }
                command
            }
        }
    }
}

fn echo_command(command: Option<&str>) {
    let Some(command) = command else {
        return;
    };
    if command.trim().is_empty() {
        return;
    }
    dprintln!(Sometimes, Special, "{}{}", PROMPT, command.trim());
}

impl Argument {
    pub fn from(source: String) -> Self {
        Self {
            buffer: source,
            cursor: 0,
        }
    }
}

impl SourceReader for Argument {
    fn read(&mut self) -> Option<&str> {
        // EOF
        if self.cursor >= self.buffer.len() {
            return None;
        }

        // Take characters until delimiter
        let start = self.cursor;
        let mut chars = self.buffer[self.cursor..].chars();
        while let Some(ch) = chars.next().filter(|ch| *ch != '\n' && *ch != ';') {
            self.cursor += ch.len_utf8();
        }

        let end = self.cursor;
        self.cursor += 1; // sizeof('\n' or ';')

        self.buffer.get(start..end)
    }
}

impl Stdin {
    pub fn from(stdin: io::Stdin) -> Self {
        let is_terminal = stdin.is_terminal();
        Self {
            stdin,
            buffer: String::new(),
            is_terminal,
        }
    }

    /// `None` indicates EOF. A read error is treated as EOF.
    fn read_byte(&mut self) -> Option<u8> {
        let mut buffer = [0; 1];
        match self.stdin.read(&mut buffer) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(buffer[0]),
        }
    }
}

impl SourceReader for Stdin {
    fn read(&mut self) -> Option<&str> {
        self.buffer.clear();
        if self.is_terminal {
            dprint!(Always, Special, "{}", PROMPT);
        }

        // Take bytes until delimiter
        let mut bytes = Vec::new();
        loop {
            let Some(byte) = self.read_byte() else {
                if bytes.is_empty() {
                    return None; // First byte is EOF
                }
                break;
            };
            if byte == b'\n' || byte == b';' {
                break;
            }
            bytes.push(byte);
        }

        self.buffer.push_str(&String::from_utf8_lossy(&bytes));
        Some(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_splits_on_delimiters() {
        let mut argument = Argument::from("info r a; set b 1\ndump;;exit".to_string());
        assert_eq!(argument.read(), Some("info r a"));
        assert_eq!(argument.read(), Some(" set b 1"));
        assert_eq!(argument.read(), Some("dump"));
        assert_eq!(argument.read(), Some(""));
        assert_eq!(argument.read(), Some("exit"));
        assert_eq!(argument.read(), None);
        assert_eq!(argument.read(), None);
    }

    #[test]
    fn argument_trailing_delimiter() {
        let mut argument = Argument::from("wait;".to_string());
        assert_eq!(argument.read(), Some("wait"));
        assert_eq!(argument.read(), None);
    }
}
