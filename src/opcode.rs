use std::fmt;

use crate::state::{Flag, Pair, Register, State};

/// Decoded instruction: one variant per instruction family.
///
/// Register and pair fields are decoded when the table is built. [`Register::M`] is
/// resolved to memory when the instruction is executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    Nop,
    Hlt,
    Mov { dst: Register, src: Register },
    Mvi { dst: Register },
    Inr { dst: Register },
    Dcr { dst: Register },
    /// Accumulator with register operand.
    Alu { op: AluOp, src: Register },
    /// Accumulator with immediate operand.
    AluImmediate { op: AluOp },
    Lxi { pair: Pair },
    Ldax { pair: Pair },
    Stax { pair: Pair },
    Inx { pair: Pair },
    Dcx { pair: Pair },
    Push { pair: Pair },
    Pop { pair: Pair },
    Jmp { condition: Condition },
    Call { condition: Condition },
    Ret { condition: Condition },
    Lda,
    Sta,
    Lhld,
    Shld,
    Xchg,
    Rlc,
    Rrc,
    Ral,
    Rar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    /// Only reachable through the immediate form, `SUI`.
    Sub,
    Ana,
    Xra,
    Ora,
    Cmp,
}

/// 3-bit condition field of jumps, calls and returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Always,
    Zero,
    NotZero,
    Carry,
    NotCarry,
    /// Encodings `0b101..=0b111`. Never transfers.
    Unassigned(u8),
}

impl Condition {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Self::Always,
            0b001 => Self::Zero,
            0b010 => Self::NotZero,
            0b011 => Self::Carry,
            0b100 => Self::NotCarry,
            bits => Self::Unassigned(bits),
        }
    }

    /// Whether control should transfer, given the flag byte.
    pub fn holds(self, flags: u8) -> bool {
        let zero = flags & Flag::Zero.mask() != 0;
        let carry = flags & Flag::Carry.mask() != 0;
        match self {
            Self::Always => true,
            Self::Zero => zero,
            Self::NotZero => !zero,
            Self::Carry => carry,
            Self::NotCarry => !carry,
            Self::Unassigned(_) => false,
        }
    }

    /// Mnemonic suffix, eg. `NZ` in `JNZ`.
    fn suffix(self) -> String {
        match self {
            Self::Always => String::new(),
            Self::Zero => "Z".to_string(),
            Self::NotZero => "NZ".to_string(),
            Self::Carry => "C".to_string(),
            Self::NotCarry => "NC".to_string(),
            Self::Unassigned(bits) => format!("?{}", bits),
        }
    }
}

impl AluOp {
    fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Adc => "ADC",
            Self::Sub => "SUB",
            Self::Ana => "ANA",
            Self::Xra => "XRA",
            Self::Ora => "ORA",
            Self::Cmp => "CMP",
        }
    }

    fn immediate_mnemonic(self) -> &'static str {
        match self {
            Self::Add => "ADI",
            Self::Adc => "ACI",
            Self::Sub => "SUI",
            Self::Ana => "ANI",
            Self::Xra => "XRI",
            Self::Ora => "ORI",
            Self::Cmp => "CPI",
        }
    }
}

impl Instruction {
    /// Amount of operand bytes following the opcode.
    pub fn operand_len(&self) -> u16 {
        match self {
            Self::Mvi { .. } | Self::AluImmediate { .. } => 1,
            Self::Lxi { .. }
            | Self::Jmp { .. }
            | Self::Call { .. }
            | Self::Lda
            | Self::Sta
            | Self::Lhld
            | Self::Shld => 2,
            _ => 0,
        }
    }
}

/// Mapping from every opcode byte to its instruction, or `None` if undefined.
pub struct OpTable([Option<Instruction>; 256]);

pub static OP_TABLE: OpTable = OpTable::build();

impl OpTable {
    /// Built from the bit fields of each instruction family.
    ///
    /// Single-byte instructions are written last, so they take precedence over any
    /// family slot they overlap (eg. `HLT` inside the `MOV` block).
    const fn build() -> Self {
        use Instruction::*;
        let mut table: [Option<Instruction>; 256] = [None; 256];

        // MOV 01DDDSSS
        let mut opcode = 0x40;
        while opcode <= 0x7F {
            table[opcode] = Some(Mov {
                dst: Register::from_bits((opcode >> 3) as u8),
                src: Register::from_bits(opcode as u8),
            });
            opcode += 1;
        }

        let mut i = 0;
        while i < 8 {
            let register = Register::from_bits(i as u8);
            let condition = Condition::from_bits(i as u8);

            table[0x06 | i << 3] = Some(Mvi { dst: register }); // 00DDD110
            table[0x04 | i << 3] = Some(Inr { dst: register }); // 00DDD100
            table[0x05 | i << 3] = Some(Dcr { dst: register }); // 00DDD101

            table[0x80 | i] = Some(Alu { op: AluOp::Add, src: register }); // 10000SSS
            table[0x88 | i] = Some(Alu { op: AluOp::Adc, src: register }); // 10001SSS
            table[0xA0 | i] = Some(Alu { op: AluOp::Ana, src: register }); // 10100SSS
            table[0xA8 | i] = Some(Alu { op: AluOp::Xra, src: register }); // 10101SSS
            table[0xB0 | i] = Some(Alu { op: AluOp::Ora, src: register }); // 10110SSS
            table[0xB8 | i] = Some(Alu { op: AluOp::Cmp, src: register }); // 10111SSS

            table[0xC2 | i << 3] = Some(Jmp { condition }); // 11CCC010
            table[0xC4 | i << 3] = Some(Call { condition }); // 11CCC100
            table[0xC0 | i << 3] = Some(Ret { condition }); // 11CCC000

            i += 1;
        }

        let mut i = 0;
        while i < 4 {
            let pair = Pair::from_bits(i as u8);

            table[0x01 | i << 4] = Some(Lxi { pair }); // 00PP0001
            table[0x02 | i << 4] = Some(Stax { pair }); // 00PP0010
            table[0x03 | i << 4] = Some(Inx { pair }); // 00PP0011
            table[0x0A | i << 4] = Some(Ldax { pair }); // 00PP1010
            table[0x0B | i << 4] = Some(Dcx { pair }); // 00PP1011

            table[0xC5 | i << 4] = Some(Push { pair }); // 11PP0101
            table[0xC1 | i << 4] = Some(Pop { pair }); // 11PP0001

            i += 1;
        }

        table[0x00] = Some(Nop);
        table[0x76] = Some(Hlt);

        table[0x3A] = Some(Lda);
        table[0x32] = Some(Sta);
        table[0x2A] = Some(Lhld);
        table[0x22] = Some(Shld);
        table[0xEB] = Some(Xchg);

        table[0xC6] = Some(AluImmediate { op: AluOp::Add });
        table[0xCE] = Some(AluImmediate { op: AluOp::Adc });
        table[0xD6] = Some(AluImmediate { op: AluOp::Sub });
        table[0xE6] = Some(AluImmediate { op: AluOp::Ana });
        table[0xEE] = Some(AluImmediate { op: AluOp::Xra });
        table[0xF6] = Some(AluImmediate { op: AluOp::Ora });
        table[0xFE] = Some(AluImmediate { op: AluOp::Cmp });

        table[0x07] = Some(Rlc);
        table[0x0F] = Some(Rrc);
        table[0x17] = Some(Ral);
        table[0x1F] = Some(Rar);

        Self(table)
    }

    pub fn get(&self, opcode: u8) -> Option<Instruction> {
        self.0[opcode as usize]
    }
}

/// Instruction at `address`, with its operand bytes, in assembly syntax.
pub struct Disassembly {
    opcode: u8,
    instruction: Option<Instruction>,
    /// Little-endian operand bytes. Unused bytes are zero.
    operands: [u8; 2],
}

impl Disassembly {
    pub fn at(state: &State, address: u16) -> Self {
        let opcode = state.mem(address);
        let instruction = OP_TABLE.get(opcode);
        let mut operands = [0; 2];
        let len = instruction.map_or(0, |instruction| instruction.operand_len());
        for i in 0..len {
            operands[i as usize] = state.mem(address.wrapping_add(1 + i));
        }
        Self {
            opcode,
            instruction,
            operands,
        }
    }

    fn word(&self) -> u16 {
        u16::from_le_bytes(self.operands)
    }
}

impl fmt::Display for Disassembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        let Some(instruction) = self.instruction else {
            return write!(f, "DB 0x{:02X}", self.opcode);
        };
        let byte = self.operands[0];
        let word = self.word();
        match instruction {
            Nop => write!(f, "NOP"),
            Hlt => write!(f, "HLT"),
            Mov { dst, src } => write!(f, "MOV {},{}", dst.name(), src.name()),
            Mvi { dst } => write!(f, "MVI {},0x{:02X}", dst.name(), byte),
            Inr { dst } => write!(f, "INR {}", dst.name()),
            Dcr { dst } => write!(f, "DCR {}", dst.name()),
            Alu { op, src } => write!(f, "{} {}", op.mnemonic(), src.name()),
            AluImmediate { op } => write!(f, "{} 0x{:02X}", op.immediate_mnemonic(), byte),
            Lxi { pair } => write!(f, "LXI {},0x{:04X}", short_pair(pair), word),
            Ldax { pair } => write!(f, "LDAX {}", short_pair(pair)),
            Stax { pair } => write!(f, "STAX {}", short_pair(pair)),
            Inx { pair } => write!(f, "INX {}", short_pair(pair)),
            Dcx { pair } => write!(f, "DCX {}", short_pair(pair)),
            Push { pair } => write!(f, "PUSH {}", short_pair(pair)),
            Pop { pair } => write!(f, "POP {}", short_pair(pair)),
            Jmp { condition: Condition::Always } => write!(f, "JMP 0x{:04X}", word),
            Jmp { condition } => write!(f, "J{} 0x{:04X}", condition.suffix(), word),
            Call { condition: Condition::Always } => write!(f, "CALL 0x{:04X}", word),
            Call { condition } => write!(f, "C{} 0x{:04X}", condition.suffix(), word),
            Ret { condition: Condition::Always } => write!(f, "RET"),
            Ret { condition } => write!(f, "R{}", condition.suffix()),
            Lda => write!(f, "LDA 0x{:04X}", word),
            Sta => write!(f, "STA 0x{:04X}", word),
            Lhld => write!(f, "LHLD 0x{:04X}", word),
            Shld => write!(f, "SHLD 0x{:04X}", word),
            Xchg => write!(f, "XCHG"),
            Rlc => write!(f, "RLC"),
            Rrc => write!(f, "RRC"),
            Ral => write!(f, "RAL"),
            Rar => write!(f, "RAR"),
        }
    }
}

/// Pair name as written in assembly: `B`, `D`, `H`, `SP`, `PSW`.
fn short_pair(pair: Pair) -> &'static str {
    match pair {
        Pair::BC => "B",
        Pair::DE => "D",
        Pair::HL => "H",
        Pair::SP => "SP",
        Pair::PSW => "PSW",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mov_block() {
        assert_eq!(
            OP_TABLE.get(0x78),
            Some(Instruction::Mov {
                dst: Register::A,
                src: Register::B
            })
        );
        assert_eq!(
            OP_TABLE.get(0x77),
            Some(Instruction::Mov {
                dst: Register::M,
                src: Register::A
            })
        );
        // `MOV M,M` slot
        assert_eq!(OP_TABLE.get(0x76), Some(Instruction::Hlt));
    }

    #[test]
    fn register_families() {
        assert_eq!(
            OP_TABLE.get(0x3E),
            Some(Instruction::Mvi { dst: Register::A })
        );
        assert_eq!(
            OP_TABLE.get(0x34),
            Some(Instruction::Inr { dst: Register::M })
        );
        assert_eq!(
            OP_TABLE.get(0x0D),
            Some(Instruction::Dcr { dst: Register::C })
        );
        assert_eq!(
            OP_TABLE.get(0xBE),
            Some(Instruction::Alu {
                op: AluOp::Cmp,
                src: Register::M
            })
        );
    }

    #[test]
    fn pair_families() {
        assert_eq!(OP_TABLE.get(0x31), Some(Instruction::Lxi { pair: Pair::SP }));
        assert_eq!(OP_TABLE.get(0x1A), Some(Instruction::Ldax { pair: Pair::DE }));
        assert_eq!(OP_TABLE.get(0x3B), Some(Instruction::Dcx { pair: Pair::SP }));
        assert_eq!(OP_TABLE.get(0xF5), Some(Instruction::Push { pair: Pair::SP }));
        assert_eq!(OP_TABLE.get(0xF1), Some(Instruction::Pop { pair: Pair::SP }));
        assert_eq!(OP_TABLE.get(0xE1), Some(Instruction::Pop { pair: Pair::HL }));
        // Single-byte instructions override `LDAX H`/`STAX SP` slots
        assert_eq!(OP_TABLE.get(0x2A), Some(Instruction::Lhld));
        assert_eq!(OP_TABLE.get(0x32), Some(Instruction::Sta));
    }

    #[test]
    fn control_transfer() {
        assert_eq!(
            OP_TABLE.get(0xC2),
            Some(Instruction::Jmp {
                condition: Condition::Always
            })
        );
        assert_eq!(
            OP_TABLE.get(0xCC),
            Some(Instruction::Call {
                condition: Condition::Zero
            })
        );
        assert_eq!(
            OP_TABLE.get(0xE0),
            Some(Instruction::Ret {
                condition: Condition::NotCarry
            })
        );
        assert_eq!(
            OP_TABLE.get(0xF2),
            Some(Instruction::Jmp {
                condition: Condition::Unassigned(6)
            })
        );
    }

    #[test]
    fn undefined_slots() {
        for opcode in [0x08, 0x10, 0x20, 0x27, 0x90, 0x97, 0x98, 0xC3, 0xC9, 0xD3, 0xDB, 0xFF] {
            assert_eq!(OP_TABLE.get(opcode), None, "opcode 0x{opcode:02x}");
        }
        let defined = (0..=255u8).filter(|op| OP_TABLE.get(*op).is_some()).count();
        // Quadrants 00, 01, 10 and 11 of the opcode space
        assert_eq!(defined, 49 + 64 + 48 + 40);
    }

    #[test]
    fn conditions() {
        use crate::state::Flag;
        let zero = Flag::Zero.mask();
        let carry = Flag::Carry.mask();

        assert!(Condition::Always.holds(0));
        assert!(Condition::Zero.holds(zero));
        assert!(!Condition::Zero.holds(carry));
        assert!(Condition::NotZero.holds(carry));
        assert!(Condition::Carry.holds(carry));
        assert!(!Condition::NotCarry.holds(carry | zero));
        for bits in 5..8 {
            assert!(!Condition::from_bits(bits).holds(0xFF));
            assert!(!Condition::from_bits(bits).holds(0x00));
        }
    }

    #[test]
    fn disassembly() {
        let mut state = State::new();
        state.write_bytes(0x0800, &[0x3E, 0x05, 0xCA, 0x34, 0x12, 0xF5, 0xE8, 0x08]);
        assert_eq!(Disassembly::at(&state, 0x0800).to_string(), "MVI A,0x05");
        assert_eq!(Disassembly::at(&state, 0x0802).to_string(), "JZ 0x1234");
        assert_eq!(Disassembly::at(&state, 0x0805).to_string(), "PUSH SP");
        assert_eq!(Disassembly::at(&state, 0x0806).to_string(), "R?5");
        assert_eq!(Disassembly::at(&state, 0x0807).to_string(), "DB 0x08");
    }
}
