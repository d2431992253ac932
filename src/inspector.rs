//! Accessors used by the debugger, concurrently with the running engine.

use std::sync::MutexGuard;
use std::time::Duration;

use crate::error::Error;
use crate::runtime::{Machine, Status};
use crate::state::{Flag, Pair, Register, State, MEMORY_MAX};

/// Inspector side of the shared [`Machine`].
#[derive(Clone)]
pub struct Inspector {
    machine: Machine,
}

/// Exclusive access to the machine for the duration of one inspector command.
///
/// The engine is blocked at an instruction boundary until this is dropped.
pub struct Session<'a> {
    state: MutexGuard<'a, State>,
}

impl Inspector {
    pub fn new(machine: Machine) -> Self {
        Self { machine }
    }

    pub fn session(&self) -> Session<'_> {
        Session {
            state: self.machine.lock(),
        }
    }

    /// Engine lifecycle, read under a short-lived lock.
    pub fn status(&self) -> Status {
        self.machine.lock().status()
    }
}

impl Session<'_> {
    /// Read-only view of the whole state, for reports.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Identifier `6` is the byte addressed by `HL`, as in instructions.
    pub fn register(&self, id: u8) -> Result<u8, Error> {
        let register = Register::try_from(id)?;
        Ok(self.state.reg(register))
    }
    pub fn set_register(&mut self, id: u8, value: u8) -> Result<(), Error> {
        let register = Register::try_from(id)?;
        self.state.set_reg(register, value);
        Ok(())
    }

    /// Identifiers `0..=4` are `BC`, `DE`, `HL`, `SP`, `PSW`.
    pub fn pair(&self, id: u8) -> Result<u16, Error> {
        let pair = Pair::try_from(id)?;
        Ok(self.state.pair(pair))
    }
    pub fn set_pair(&mut self, id: u8, value: u16) -> Result<(), Error> {
        let pair = Pair::try_from(id)?;
        self.state.set_pair(pair, value);
        Ok(())
    }

    pub fn flags(&self) -> u8 {
        self.state.flags()
    }
    pub fn set_flags(&mut self, flags: u8) {
        self.state.set_flags(flags);
    }

    /// Flag by name (`CY`, `P`, `AC`, `Z`, `S`), case insensitive.
    pub fn flag(&self, name: &str) -> Result<bool, Error> {
        let flag = parse_flag(name)?;
        Ok(self.state.flag(flag))
    }
    pub fn set_flag(&mut self, name: &str, value: bool) -> Result<(), Error> {
        let flag = parse_flag(name)?;
        self.state.set_flag(flag, value);
        Ok(())
    }

    pub fn pc(&self) -> u16 {
        self.state.pc()
    }
    pub fn set_pc(&mut self, pc: u16) {
        self.state.set_pc(pc);
    }

    pub fn sp(&self) -> u16 {
        self.state.sp()
    }
    pub fn set_sp(&mut self, sp: u16) {
        self.state.set_sp(sp);
    }

    pub fn memory(&self, address: u32) -> Result<u8, Error> {
        let address = parse_address(address)?;
        Ok(self.state.mem(address))
    }
    pub fn set_memory(&mut self, address: u32, value: u8) -> Result<(), Error> {
        let address = parse_address(address)?;
        self.state.set_mem(address, value);
        Ok(())
    }

    pub fn running(&self) -> bool {
        self.state.running()
    }
    /// Takes effect at the next instruction boundary.
    pub fn set_running(&mut self, running: bool) {
        self.state.set_running(running);
    }

    pub fn throttle(&self) -> Duration {
        self.state.throttle()
    }
    pub fn set_throttle(&mut self, throttle: Duration) {
        self.state.set_throttle(throttle);
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }
}

fn parse_flag(name: &str) -> Result<Flag, Error> {
    Flag::from_name(name).ok_or_else(|| Error::InvalidFlag(name.to_string()))
}

fn parse_address(address: u32) -> Result<u16, Error> {
    if address as usize >= MEMORY_MAX {
        return Err(Error::InvalidAddress(address));
    }
    Ok(address as u16)
}
