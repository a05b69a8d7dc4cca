//! Data-processing ALU operations and flag derivation (§4.F).

use crate::psr::{Psr, C, N, V, Z};

/// Outcome of an ALU operation: the result plus the four flags it would
/// set if the instruction is a flag-setting variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u32,
    pub n: bool,
    pub z: bool,
    pub c: bool,
    pub v: bool,
}

#[must_use]
pub fn add_with_carry(a: u32, b: u32, carry_in: bool) -> AluResult {
    let (r1, c1) = a.overflowing_add(b);
    let (result, c2) = r1.overflowing_add(u32::from(carry_in));
    let carry = c1 | c2;
    let overflow = ((a ^ result) & (b ^ result)) >> 31 != 0;
    AluResult {
        value: result,
        n: result >> 31 != 0,
        z: result == 0,
        c: carry,
        v: overflow,
    }
}

/// `a - b - (1 - carry_in)`, i.e. SBC's borrow convention: the ARM carry
/// flag is the *inverse* of a borrow, so subtraction is implemented as
/// addition of the two's complement.
#[must_use]
pub fn sub_with_carry(a: u32, b: u32, carry_in: bool) -> AluResult {
    add_with_carry(a, !b, carry_in)
}

#[must_use]
pub fn add(a: u32, b: u32) -> AluResult {
    add_with_carry(a, b, false)
}

#[must_use]
pub fn sub(a: u32, b: u32) -> AluResult {
    sub_with_carry(a, b, true)
}

/// Logical-operation result: N/Z from the value, C from the shifter's
/// carry-out, V unchanged (logical ops never touch V, §4.F).
#[must_use]
pub fn logical(value: u32, shifter_carry: bool) -> AluResult {
    AluResult {
        value,
        n: value >> 31 != 0,
        z: value == 0,
        c: shifter_carry,
        v: false,
    }
}

/// Apply an [`AluResult`]'s flags onto a PSR, leaving V untouched for
/// logical operations (`result.v` carries "unchanged" as `false` there,
/// so callers for logical ops must pass the existing V through instead).
pub fn apply_flags(psr: &mut Psr, result: AluResult, touches_v: bool) {
    psr.set_flag(N, result.n);
    psr.set_flag(Z, result.z);
    psr.set_flag(C, result.c);
    if touches_v {
        psr.set_flag(V, result.v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_overflow_when_signs_match_and_result_differs() {
        let r = add(0x7FFF_FFFF, 1);
        assert_eq!(r.value, 0x8000_0000);
        assert!(r.v, "positive + positive = negative must set V");
        assert!(r.n);
        assert!(!r.c);
    }

    #[test]
    fn unsigned_add_carry_out() {
        let r = add(0xFFFF_FFFF, 1);
        assert_eq!(r.value, 0);
        assert!(r.z);
        assert!(r.c);
        assert!(!r.v);
    }

    #[test]
    fn subtraction_sets_carry_when_no_borrow() {
        let r = sub(10, 3);
        assert_eq!(r.value, 7);
        assert!(r.c, "C is set (no borrow) when a >= b");
    }

    #[test]
    fn subtraction_clears_carry_on_borrow() {
        let r = sub(3, 10);
        assert!(!r.c, "C is clear (borrow occurred) when a < b");
    }

    #[test]
    fn logical_never_sets_overflow() {
        let r = logical(0x8000_0000, true);
        assert!(!r.v);
        assert!(r.c);
        assert!(r.n);
    }
}
