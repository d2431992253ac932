use crate::flags::{self, Category};
use crate::opcode::{AluOp, Instruction};
use crate::state::{Flag, Pair, Register, State};

impl State {
    /// Perform one decoded instruction.
    ///
    /// The opcode byte must already have been consumed. Operand bytes are read from
    /// the program counter, which is left pointing at the next instruction unless
    /// control is transferred.
    pub fn execute(&mut self, instruction: Instruction) {
        use Instruction::*;
        match instruction {
            Nop => (),
            Hlt => self.set_running(false),

            Mov { dst, src } => {
                let value = self.reg(src);
                self.set_reg(dst, value);
            }
            Mvi { dst } => {
                let value = self.fetch_byte();
                self.set_reg(dst, value);
            }

            Inr { dst } => {
                let result = self.reg(dst).wrapping_add(1);
                self.set_reg(dst, result);
                self.update_flags(result as u16, Category::IncrementDecrement);
            }
            Dcr { dst } => {
                let result = self.reg(dst).wrapping_sub(1);
                self.set_reg(dst, result);
                self.update_flags(result as u16, Category::IncrementDecrement);
            }

            Alu { op, src } => {
                let data = self.reg(src);
                self.alu(op, data);
            }
            AluImmediate { op } => {
                let data = self.fetch_byte();
                self.alu(op, data);
            }

            Lxi { pair } => {
                let value = self.fetch_word();
                self.set_pair(pair, value);
            }
            Ldax { pair } => {
                let value = self.mem(self.pair(pair));
                self.set_reg(Register::A, value);
            }
            Stax { pair } => {
                self.set_mem(self.pair(pair), self.reg(Register::A));
            }
            Inx { pair } => {
                let value = self.pair(pair).wrapping_add(1);
                self.set_pair(pair, value);
            }
            Dcx { pair } => {
                let value = self.pair(pair).wrapping_sub(1);
                self.set_pair(pair, value);
            }

            Push { pair } => {
                let value = self.pair(pair);
                self.push_word(value);
            }
            Pop { pair } => {
                let value = self.pop_word();
                self.set_pair(pair, value);
            }

            Jmp { condition } => {
                // Operands are consumed whether or not the jump is taken
                let target = self.fetch_word();
                if condition.holds(self.flags()) {
                    self.set_pc(target);
                }
            }
            Call { condition } => {
                let target = self.fetch_word();
                if condition.holds(self.flags()) {
                    self.push_word(self.pc());
                    self.set_pc(target);
                }
            }
            Ret { condition } => {
                if condition.holds(self.flags()) {
                    let target = self.pop_word();
                    self.set_pc(target);
                }
            }

            Lda => {
                let address = self.fetch_word();
                self.set_reg(Register::A, self.mem(address));
            }
            Sta => {
                let address = self.fetch_word();
                self.set_mem(address, self.reg(Register::A));
            }
            Lhld => {
                let address = self.fetch_word();
                self.set_reg(Register::L, self.mem(address));
                self.set_reg(Register::H, self.mem(address.wrapping_add(1)));
            }
            Shld => {
                let address = self.fetch_word();
                self.set_mem(address, self.reg(Register::L));
                self.set_mem(address.wrapping_add(1), self.reg(Register::H));
            }
            Xchg => {
                let hl = self.pair(Pair::HL);
                let de = self.pair(Pair::DE);
                self.set_pair(Pair::HL, de);
                self.set_pair(Pair::DE, hl);
            }

            Rlc => {
                let a = self.reg(Register::A);
                self.set_reg(Register::A, a.rotate_left(1));
                self.set_flag(Flag::Carry, a & 0x80 != 0);
            }
            Rrc => {
                let a = self.reg(Register::A);
                self.set_reg(Register::A, a.rotate_right(1));
                self.set_flag(Flag::Carry, a & 0x01 != 0);
            }
            Ral => {
                let a = self.reg(Register::A);
                let carry_in = self.flag(Flag::Carry) as u8;
                self.set_reg(Register::A, a << 1 | carry_in);
                self.set_flag(Flag::Carry, a & 0x80 != 0);
            }
            Rar => {
                let a = self.reg(Register::A);
                let carry_in = self.flag(Flag::Carry) as u8;
                self.set_reg(Register::A, a >> 1 | carry_in << 7);
                self.set_flag(Flag::Carry, a & 0x01 != 0);
            }
        }
    }

    /// Accumulator operation. Result is widened to 16 bits, so that bit 8 holds the
    /// carry (or borrow).
    fn alu(&mut self, op: AluOp, data: u8) {
        let a = self.reg(Register::A) as u16;
        let data = data as u16;
        let carry_in = self.flag(Flag::Carry) as u16;

        let (result, category) = match op {
            AluOp::Add => (a + data, Category::Arithmetic),
            AluOp::Adc => (a + data + carry_in, Category::Arithmetic),
            AluOp::Sub | AluOp::Cmp => (a.wrapping_sub(data), Category::Arithmetic),
            AluOp::Ana => (a & data, Category::Logical),
            AluOp::Xra => (a ^ data, Category::Logical),
            AluOp::Ora => (a | data, Category::Logical),
        };

        // Compare only sets flags
        if op != AluOp::Cmp {
            self.set_reg(Register::A, result as u8);
        }
        self.update_flags(result, category);
    }

    fn update_flags(&mut self, result: u16, category: Category) {
        let flags = flags::update(self.flags(), result, category);
        self.set_flags(flags);
    }

    /// Read the byte at the program counter, and advance past it.
    pub(crate) fn fetch_byte(&mut self) -> u8 {
        let value = self.mem(self.pc());
        self.set_pc(self.pc().wrapping_add(1));
        value
    }

    /// Read a little-endian word at the program counter, and advance past it.
    fn fetch_word(&mut self) -> u16 {
        let low = self.fetch_byte();
        let high = self.fetch_byte();
        u16::from_le_bytes([low, high])
    }

    /// High byte is stored first, so the word sits little-endian at the new stack
    /// pointer.
    fn push_word(&mut self, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.set_sp(self.sp().wrapping_sub(1));
        self.set_mem(self.sp(), high);
        self.set_sp(self.sp().wrapping_sub(1));
        self.set_mem(self.sp(), low);
    }

    fn pop_word(&mut self) -> u16 {
        let low = self.mem(self.sp());
        self.set_sp(self.sp().wrapping_add(1));
        let high = self.mem(self.sp());
        self.set_sp(self.sp().wrapping_add(1));
        u16::from_le_bytes([low, high])
    }
}
