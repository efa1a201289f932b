//! Adder shared by every add and subtract form.
//!
//! Subtraction is `a + !b + carry`, so `SUB` passes `carry = true` and
//! `SBC` passes the current C flag. The returned carry is then the ARM
//! "no borrow" flag.

/// `a + b + carry`, returning `(result, carry_out, overflow)`.
#[must_use]
pub const fn add_with_carry(a: u32, b: u32, carry: bool) -> (u32, bool, bool) {
    let wide = a as u64 + b as u64 + carry as u64;
    let result = wide as u32;
    let carry_out = wide > 0xFFFF_FFFF;
    let overflow = (!(a ^ b) & (a ^ result)) & 0x8000_0000 != 0;
    (result, carry_out, overflow)
}

/// `a - b`, with C set when no borrow occurred.
#[must_use]
pub const fn sub(a: u32, b: u32) -> (u32, bool, bool) {
    add_with_carry(a, !b, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_carry_and_overflow() {
        assert_eq!(add_with_carry(0xFFFF_FFFF, 1, false), (0, true, false));
        assert_eq!(add_with_carry(0x7FFF_FFFF, 1, false), (0x8000_0000, false, true));
        assert_eq!(add_with_carry(0xFFFF_FFFF, 0, true), (0, true, false));
        assert_eq!(add_with_carry(2, 3, true), (6, false, false));
    }

    #[test]
    fn subtract_sets_no_borrow() {
        assert_eq!(sub(5, 3), (2, true, false));
        assert_eq!(sub(3, 5), (0xFFFF_FFFE, false, false));
        assert_eq!(sub(5, 5), (0, true, false));
        assert_eq!(sub(0x8000_0000, 1), (0x7FFF_FFFF, true, true));
    }

    #[test]
    fn sbc_with_borrow_in() {
        // SBC with C clear subtracts one more.
        assert_eq!(add_with_carry(5, !3, false), (1, true, false));
        assert_eq!(add_with_carry(0, !0, false), (0xFFFF_FFFF, false, false));
    }
}
