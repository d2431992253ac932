use crate::state::Flag;

/// How an instruction affects the carry flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    /// Carry is bit 8 of the 16-bit result.
    Arithmetic,
    /// Carry is always cleared.
    Logical,
    /// Carry is left untouched.
    IncrementDecrement,
}

/// Compute the new flag byte after an operation producing `result`.
///
/// Zero, sign and parity only look at the low byte of `result`. Auxiliary carry is
/// never computed, and the unused bits are passed through.
pub fn update(flags: u8, result: u16, category: Category) -> u8 {
    let low = result as u8;
    let mut flags = flags;

    match category {
        Category::Arithmetic => set(&mut flags, Flag::Carry, result & 0x0100 != 0),
        Category::Logical => set(&mut flags, Flag::Carry, false),
        Category::IncrementDecrement => (),
    }
    set(&mut flags, Flag::Parity, low.count_ones() % 2 == 0);
    set(&mut flags, Flag::Zero, low == 0);
    set(&mut flags, Flag::Sign, low & 0x80 != 0);

    flags
}

#[inline]
fn set(flags: &mut u8, flag: Flag, value: bool) {
    if value {
        *flags |= flag.mask();
    } else {
        *flags &= !flag.mask();
    }
}
