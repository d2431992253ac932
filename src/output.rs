use std::str::Chars;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::{ColoredString, Colorize};

use crate::runtime::Status;
use crate::state::{Flag, Register, State, STDIN_PORT, STDOUT_PORT};

#[macro_export]
macro_rules! dprint {
    ( $verbosity:ident, $kind:ident, $fmt:literal $($tt:tt)* ) => {{
        let s = format!(
            $fmt
            $($tt)*
        );
        $crate::output::Output::Debugger(
            $crate::output::Verbosity::$verbosity,
            $crate::output::Kind::$kind,
        )
        .print_str(&s);
    }};
}

#[macro_export]
macro_rules! dprintln {
    ( $verbosity:ident ) => {{
        $crate::output::Output::Debugger(
            $crate::output::Verbosity::$verbosity,
            $crate::output::Kind::Normal,
        )
        .print_str("\n");
    }};
    ( $verbosity:ident, $kind:ident, $fmt:literal $($tt:tt)* ) => {{
        let s = format!(
            concat!($fmt, "\n")
            $($tt)*
        );
        $crate::output::Output::Debugger(
            $crate::output::Verbosity::$verbosity,
            $crate::output::Kind::$kind,
        )
        .print_str(&s);
    }};
}

/// Program output goes to stdout, debugger output to stderr.
#[derive(Clone, Copy, Debug)]
pub enum Output {
    Normal,
    Debugger(Verbosity, Kind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    /// Always printed.
    Always,
    /// Not printed with `--minimal`.
    Sometimes,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Kind {
    #[default]
    Normal,
    Info,
    Warning,
    Error,
    Special,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

// Written from both the engine and the inspector thread
static IS_LINE_START: AtomicBool = AtomicBool::new(true);
static IS_MINIMAL: AtomicBool = AtomicBool::new(false);

impl Output {
    pub fn set_line_start(new_value: bool) -> bool {
        IS_LINE_START.swap(new_value, Ordering::Relaxed)
    }
    /// Private. Use [`Output::start_new_line`].
    fn is_line_start() -> bool {
        IS_LINE_START.load(Ordering::Relaxed)
    }
    pub fn set_minimal(new_value: bool) -> bool {
        IS_MINIMAL.swap(new_value, Ordering::Relaxed)
    }
    pub fn is_minimal() -> bool {
        IS_MINIMAL.load(Ordering::Relaxed)
    }

    fn set_line_start_from_str(string: &str) {
        let last = Decolored::new(string).last();
        if let Some(ch) = last {
            Output::set_line_start(ch == '\n');
        }
    }

    pub fn print_str(&self, string: &str) {
        match self {
            Self::Normal => {
                print!("{}", string);
                Self::set_line_start_from_str(string);
            }

            Self::Debugger(verbosity, kind) => match (Self::is_minimal(), *verbosity) {
                (false, _) => {
                    eprint!("{}", kind.paint(string));
                    Self::set_line_start_from_str(string);
                }
                // Always remove color if `--minimal`
                (true, Verbosity::Always) => {
                    eprint_colorless(string);
                    Self::set_line_start_from_str(string);
                }
                (true, Verbosity::Sometimes) => (),
            },
        }
    }

    pub fn start_new_line(&self) {
        if !Self::is_line_start() {
            self.print_str("\n");
        }
    }

    /// Full state report: pointers, registers, flags and I/O ports.
    pub fn print_state(&self, state: &State) {
        self.print_registers(state);
        self.print_flags(state.flags());
        self.print_ports(state);
        if !Self::is_minimal() && state.status() != Status::Running {
            self.print_str(&format!("\x1b[2mEngine {}\x1b[0m\n", state.status()));
        }
    }

    pub fn print_registers(&self, state: &State) {
        if Self::is_minimal() {
            self.print_str(&format!("PC 0x{:04X}\n", state.pc()));
            self.print_str(&format!("SP 0x{:04X}\n", state.sp()));
            for register in Register::DISPLAY_ORDER {
                self.print_str(&format!(
                    "{} 0x{:02X}\n",
                    register.name(),
                    state.reg(register)
                ));
            }
            return;
        }

        self.print_str("\x1b[2m┌─────────────────────────────┐\x1b[0m\n");
        self.print_str("\x1b[2m│      \x1b[3mhex    uint  int  char\x1b[0m\x1b[2m │\x1b[0m\n");
        self.print_str(&format!(
            "\x1b[2m│\x1b[0m \x1b[1mPC\x1b[0m  0x{:04x}   \x1b[1mSP\x1b[0m  0x{:04x}   \x1b[2m│\x1b[0m\n",
            state.pc(),
            state.sp()
        ));
        for register in Register::DISPLAY_ORDER {
            self.print_str("\x1b[2m│\x1b[0m");
            self.print_str(&format!(" \x1b[1m{}\x1b[0m   ", register.name()));
            self.print_integer(state.reg(register));
            self.print_str(" \x1b[2m│\x1b[0m\n");
        }
        self.print_str("\x1b[2m└─────────────────────────────┘\x1b[0m\n");
    }

    pub fn print_flags(&self, flags: u8) {
        for flag in Flag::ALL {
            self.print_flag(flag, flags & flag.mask() != 0);
        }
    }

    pub fn print_flag(&self, flag: Flag, value: bool) {
        if Self::is_minimal() {
            self.print_str(&format!("{} {}\n", flag.name(), value as u8));
            return;
        }
        self.print_str(&format!("\x1b[1m{:<2}\x1b[0m  {}\n", flag.name(), value as u8));
    }

    pub fn print_ports(&self, state: &State) {
        if Self::is_minimal() {
            self.print_str(&format!("OUT 0x{:02X}\n", state.mem(STDOUT_PORT)));
            self.print_str(&format!("IN 0x{:02X}\n", state.mem(STDIN_PORT)));
            return;
        }
        self.print_str(&format!(
            "Port 0x{:04x} (standard output): 0x{:02x}\n",
            STDOUT_PORT,
            state.mem(STDOUT_PORT)
        ));
        self.print_str(&format!(
            "Port 0x{:04x} (standard input):  0x{:02x}\n",
            STDIN_PORT,
            state.mem(STDIN_PORT)
        ));
    }

    pub fn print_integer(&self, value: u8) {
        if Self::is_minimal() {
            self.print_str(&format!("0x{:02X}", value));
            return;
        }
        self.print_str(&format!("0x{:02x}  ", value));
        self.print_str(&format!("{:-4}  ", value));
        self.print_str(&format!("{:-4}  ", value as i8));
        self.print_char_display(value);
    }

    fn print_char_display(&self, value: u8) {
        debug_assert!(
            !Self::is_minimal(),
            "`print_char_display` should not be called if `--minimal`"
        );
        // Print 3 characters
        match value {
            // ASCII control characters which are arbitrarily considered significant
            0x00 => self.print_str("NUL"),
            0x08 => self.print_str("BS "),
            0x09 => self.print_str("HT "),
            0x0a => self.print_str("LF "),
            0x0d => self.print_str("CR "),
            0x1b => self.print_str("ESC"),
            0x7f => self.print_str("DEL"),

            // Space
            0x20 => self.print_str("[_]"),

            // Printable ASCII characters
            0x21..=0x7e => self.print_str(&format!("{:<3}", value as char)),

            // Any ASCII character not already matched (unimportant control characters)
            0x00..=0x7f => self.print_str("\x1b[2m───\x1b[0m"),
            // Any non-ASCII character
            0x80.. => self.print_str("\x1b[2m┄┄┄\x1b[0m"),
        }
    }
}

impl Kind {
    fn paint(self, string: &str) -> ColoredString {
        let string = ColoredString::from(string);
        match self {
            Self::Normal => string,
            Self::Info => string.blue(),
            Self::Warning => string.yellow(),
            Self::Error => string.red(),
            Self::Special => string.cyan(),
        }
    }
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl<'a> Iterator for Decolored<'a> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

fn eprint_colorless(string: &str) {
    let string: String = Decolored::new(string).collect();
    eprint!("{}", string);
}
