//! Barrel shifter.
//!
//! Every shifter function returns `(result, carry_out)`. Where the shift
//! leaves the carry unaffected, `carry_out` is the carry passed in.
//!
//! Zero amounts mean different things depending on where the amount came
//! from:
//!
//! | Type | immediate #0   | register amount 0 |
//! |------|----------------|-------------------|
//! | LSL  | no shift       | no shift          |
//! | LSR  | LSR #32        | no shift          |
//! | ASR  | ASR #32        | no shift          |
//! | ROR  | RRX            | no shift          |

/// Shift type from bits 6-5 of a shifted-register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftType {
    Lsl,
    Lsr,
    Asr,
    Ror,
}

impl ShiftType {
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::Lsl,
            1 => Self::Lsr,
            2 => Self::Asr,
            _ => Self::Ror,
        }
    }
}

/// Shift by a 5-bit amount taken from the instruction word.
#[must_use]
pub fn shift_by_immediate(kind: ShiftType, value: u32, amount: u32, carry_in: bool) -> (u32, bool) {
    let amount = amount & 0x1F;
    match (kind, amount) {
        (ShiftType::Lsl, 0) => (value, carry_in),
        (ShiftType::Lsr, 0) => lsr(value, 32),
        (ShiftType::Asr, 0) => asr(value, 32),
        (ShiftType::Ror, 0) => rrx(value, carry_in),
        _ => shift(kind, value, amount, carry_in),
    }
}

/// Shift by the bottom byte of a register.
#[must_use]
pub fn shift_by_register(kind: ShiftType, value: u32, amount: u32, carry_in: bool) -> (u32, bool) {
    let amount = amount & 0xFF;
    if amount == 0 {
        return (value, carry_in);
    }
    shift(kind, value, amount, carry_in)
}

/// Rotated 8-bit immediate operand (data processing and MSR).
///
/// The carry is unaffected when the rotation is zero.
#[must_use]
pub fn rotated_immediate(opcode: u32, carry_in: bool) -> (u32, bool) {
    let imm = opcode & 0xFF;
    let rotate = ((opcode >> 8) & 0xF) * 2;
    if rotate == 0 {
        (imm, carry_in)
    } else {
        let value = imm.rotate_right(rotate);
        (value, value & 0x8000_0000 != 0)
    }
}

/// Non-zero shift amount, any size.
fn shift(kind: ShiftType, value: u32, amount: u32, carry_in: bool) -> (u32, bool) {
    match kind {
        ShiftType::Lsl => lsl(value, amount),
        ShiftType::Lsr => lsr(value, amount),
        ShiftType::Asr => asr(value, amount),
        ShiftType::Ror => ror(value, amount, carry_in),
    }
}

fn lsl(value: u32, amount: u32) -> (u32, bool) {
    match amount {
        0 => (value, false),
        1..=31 => (value << amount, (value >> (32 - amount)) & 1 != 0),
        32 => (0, value & 1 != 0),
        _ => (0, false),
    }
}

fn lsr(value: u32, amount: u32) -> (u32, bool) {
    match amount {
        0 => (value, false),
        1..=31 => (value >> amount, (value >> (amount - 1)) & 1 != 0),
        32 => (0, value & 0x8000_0000 != 0),
        _ => (0, false),
    }
}

fn asr(value: u32, amount: u32) -> (u32, bool) {
    let negative = value & 0x8000_0000 != 0;
    match amount {
        0 => (value, false),
        1..=31 => (((value as i32) >> amount) as u32, (value >> (amount - 1)) & 1 != 0),
        _ => (if negative { u32::MAX } else { 0 }, negative),
    }
}

fn ror(value: u32, amount: u32, carry_in: bool) -> (u32, bool) {
    if amount == 0 {
        return (value, carry_in);
    }
    let result = value.rotate_right(amount & 0x1F);
    (result, result & 0x8000_0000 != 0)
}

fn rrx(value: u32, carry_in: bool) -> (u32, bool) {
    ((u32::from(carry_in) << 31) | (value >> 1), value & 1 != 0)
}
