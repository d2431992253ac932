use std::time::Duration;

use crate::error::Error;
use crate::runtime::Status;

/// Size of the address space: 64KB.
pub const MEMORY_MAX: usize = 0x10000;
/// Address the program image is loaded at, and where execution starts.
pub const LOAD_ADDRESS: u16 = 0x0800;
/// Start of the 8KB stack segment.
///
/// Program images must end below this address, and execution stops once the
/// program counter reaches it.
pub const STACK_SEGMENT_START: u16 = 0xE000;
/// Initial stack pointer.
pub const STACK_TOP: u16 = 0xFFFF;
/// Memory-mapped "standard input" byte.
pub const STDIN_PORT: u16 = 0x2000;
/// Memory-mapped "standard output" byte.
pub const STDOUT_PORT: u16 = 0x3000;

/// Complete machine state, shared between the engine and the inspector.
#[derive(Clone)]
pub struct State {
    /// Address space, doubling as memory-mapped I/O.
    mem: Box<[u8; MEMORY_MAX]>,
    /// Register file, indexed by [`Register`].
    /// Slot 6 ([`Register::M`]) is never used.
    reg: [u8; 8],
    flags: u8,
    pc: u16,
    sp: u16,
    /// Cleared by `HLT`, or by the inspector.
    running: bool,
    /// Delay applied by the engine after every instruction.
    throttle: Duration,
    status: Status,
}

/// 3-bit register field, as encoded in instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    B = 0,
    C = 1,
    D = 2,
    E = 3,
    H = 4,
    L = 5,
    /// Not a register: the byte addressed by `HL`.
    M = 6,
    A = 7,
}

/// Register pair view over the register file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pair {
    BC = 0,
    DE = 1,
    HL = 2,
    SP = 3,
    /// Accumulator as high byte, flags as low byte.
    PSW = 4,
}

/// Condition flags, as bit masks into the flag byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flag {
    Carry = 1 << 0,
    Parity = 1 << 2,
    /// Never computed by any instruction. Only ever written directly.
    AuxCarry = 1 << 4,
    Zero = 1 << 6,
    Sign = 1 << 7,
}

impl Register {
    /// Physical registers, in the order they are displayed.
    pub const DISPLAY_ORDER: [Register; 7] = [
        Register::A,
        Register::B,
        Register::C,
        Register::D,
        Register::E,
        Register::H,
        Register::L,
    ];

    /// Decode the low 3 bits of `bits`.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0 => Self::B,
            1 => Self::C,
            2 => Self::D,
            3 => Self::E,
            4 => Self::H,
            5 => Self::L,
            6 => Self::M,
            _ => Self::A,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::H => "H",
            Self::L => "L",
            Self::M => "M",
            Self::A => "A",
        }
    }

    /// Case insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        (0..8)
            .map(Self::from_bits)
            .find(|register| register.name().eq_ignore_ascii_case(name))
    }
}

impl TryFrom<u8> for Register {
    type Error = Error;
    fn try_from(id: u8) -> Result<Self, Self::Error> {
        if id > 7 {
            return Err(Error::InvalidRegister(id));
        }
        Ok(Self::from_bits(id))
    }
}

impl Pair {
    pub const ALL: [Pair; 5] = [Pair::BC, Pair::DE, Pair::HL, Pair::SP, Pair::PSW];

    /// Decode the 2-bit pair field of `LXI`, `LDAX`, `STAX`, `INX`, `DCX`, `PUSH` and `POP`.
    ///
    /// `PSW` has no encoding here, only an inspector identifier.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::BC,
            1 => Self::DE,
            2 => Self::HL,
            _ => Self::SP,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::BC => "BC",
            Self::DE => "DE",
            Self::HL => "HL",
            Self::SP => "SP",
            Self::PSW => "PSW",
        }
    }

    /// Case insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|pair| pair.name().eq_ignore_ascii_case(name))
    }
}

impl TryFrom<u8> for Pair {
    type Error = Error;
    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or(Error::InvalidPair(id))
    }
}

impl Flag {
    pub const ALL: [Flag; 5] = [
        Flag::Carry,
        Flag::Parity,
        Flag::AuxCarry,
        Flag::Zero,
        Flag::Sign,
    ];

    pub fn mask(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Carry => "CY",
            Self::Parity => "P",
            Self::AuxCarry => "AC",
            Self::Zero => "Z",
            Self::Sign => "S",
        }
    }

    /// Case insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.name().eq_ignore_ascii_case(name))
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    /// Zeroed machine, with program counter at [`LOAD_ADDRESS`] and stack pointer at
    /// [`STACK_TOP`].
    pub fn new() -> Self {
        Self {
            mem: Box::new([0; MEMORY_MAX]),
            reg: [0; 8],
            flags: 0,
            pc: LOAD_ADDRESS,
            sp: STACK_TOP,
            running: true,
            throttle: Duration::ZERO,
            status: Status::Running,
        }
    }

    /// Read a register, or the byte addressed by `HL` for [`Register::M`].
    pub fn reg(&self, register: Register) -> u8 {
        match register {
            Register::M => self.mem(self.pair(Pair::HL)),
            _ => self.reg[register as usize],
        }
    }

    /// Write a register, or the byte addressed by `HL` for [`Register::M`].
    pub fn set_reg(&mut self, register: Register, value: u8) {
        match register {
            Register::M => self.set_mem(self.pair(Pair::HL), value),
            _ => self.reg[register as usize] = value,
        }
    }

    pub fn pair(&self, pair: Pair) -> u16 {
        let (high, low) = match pair {
            Pair::BC => (self.reg(Register::B), self.reg(Register::C)),
            Pair::DE => (self.reg(Register::D), self.reg(Register::E)),
            Pair::HL => (self.reg(Register::H), self.reg(Register::L)),
            Pair::SP => return self.sp,
            Pair::PSW => (self.reg(Register::A), self.flags),
        };
        u16::from_be_bytes([high, low])
    }

    pub fn set_pair(&mut self, pair: Pair, value: u16) {
        let [high, low] = value.to_be_bytes();
        match pair {
            Pair::BC => {
                self.set_reg(Register::B, high);
                self.set_reg(Register::C, low);
            }
            Pair::DE => {
                self.set_reg(Register::D, high);
                self.set_reg(Register::E, low);
            }
            Pair::HL => {
                self.set_reg(Register::H, high);
                self.set_reg(Register::L, low);
            }
            Pair::SP => self.sp = value,
            Pair::PSW => {
                self.set_reg(Register::A, high);
                self.flags = low;
            }
        }
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn set_flags(&mut self, flags: u8) {
        self.flags = flags;
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.flags & flag.mask() != 0
    }
    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        if value {
            self.flags |= flag.mask();
        } else {
            self.flags &= !flag.mask();
        }
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }
    pub fn set_sp(&mut self, sp: u16) {
        self.sp = sp;
    }

    pub fn mem(&self, address: u16) -> u8 {
        self.mem[address as usize]
    }
    pub fn set_mem(&mut self, address: u16, value: u8) {
        self.mem[address as usize] = value;
    }

    /// Copy `bytes` into memory starting at `address`, wrapping at the end of memory.
    pub fn write_bytes(&mut self, address: u16, bytes: &[u8]) {
        let mut address = address;
        for byte in bytes {
            self.set_mem(address, *byte);
            address = address.wrapping_add(1);
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn throttle(&self) -> Duration {
        self.throttle
    }
    pub fn set_throttle(&mut self, throttle: Duration) {
        self.throttle = throttle;
    }

    pub fn status(&self) -> Status {
        self.status
    }
    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}
