use std::{error, fmt, io};

/// Error raised by the core: the inspector accessors and the fetch-execute engine.
///
/// None of these are fatal. The caller reports them and carries on.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Register identifier outside of `0..=7`.
    InvalidRegister(u8),
    /// Register pair identifier outside of `0..=4`.
    InvalidPair(u8),
    /// Address outside of the 64KB address space.
    InvalidAddress(u32),
    /// Flag name which is not one of `CY`, `P`, `AC`, `Z`, `S`.
    InvalidFlag(String),
    /// No instruction is bound to this byte in the opcode table.
    UndefinedOpcode { opcode: u8, address: u16 },
}

/// Error raised while loading a program image, before the machine exists.
#[derive(Debug)]
pub enum LoadError {
    ImageTooLarge { size: usize, limit: usize },
    ImageUnreadable(io::Error),
}

impl error::Error for Error {}

impl error::Error for LoadError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::ImageUnreadable(error) => Some(error),
            Self::ImageTooLarge { .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegister(id) => write!(f, "Invalid register identifier `{}`", id),
            Self::InvalidPair(id) => write!(f, "Invalid register pair identifier `{}`", id),
            Self::InvalidAddress(address) => {
                write!(f, "Address 0x{:x} is outside of memory", address)
            }
            Self::InvalidFlag(name) => write!(f, "Invalid flag `{}`", name),
            Self::UndefinedOpcode { opcode, address } => {
                write!(f, "Unknown opcode {:02X} at {:04X}", opcode, address)
            }
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageTooLarge { size, limit } => write!(
                f,
                "Program doesn't fit into memory ({} bytes, at most {} allowed)",
                size, limit
            ),
            Self::ImageUnreadable(error) => write!(f, "Cannot open program: {}", error),
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(error: io::Error) -> Self {
        Self::ImageUnreadable(error)
    }
}
