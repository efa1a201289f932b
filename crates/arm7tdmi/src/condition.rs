//! Condition codes shared by the ARM condition field and the Thumb
//! conditional branch.

use crate::psr::{C, N, Psr, V, Z};

/// A 4-bit condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Eq,
    Ne,
    Cs,
    Cc,
    Mi,
    Pl,
    Vs,
    Vc,
    Hi,
    Ls,
    Ge,
    Lt,
    Gt,
    Le,
    Al,
    Nv,
}

impl Condition {
    /// Decode the low four bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0xF {
            0x0 => Self::Eq,
            0x1 => Self::Ne,
            0x2 => Self::Cs,
            0x3 => Self::Cc,
            0x4 => Self::Mi,
            0x5 => Self::Pl,
            0x6 => Self::Vs,
            0x7 => Self::Vc,
            0x8 => Self::Hi,
            0x9 => Self::Ls,
            0xA => Self::Ge,
            0xB => Self::Lt,
            0xC => Self::Gt,
            0xD => Self::Le,
            0xE => Self::Al,
            _ => Self::Nv,
        }
    }

    /// Evaluate against the flags in `psr`.
    #[must_use]
    pub const fn passes(self, psr: Psr) -> bool {
        let n = psr.is_set(N);
        let z = psr.is_set(Z);
        let c = psr.is_set(C);
        let v = psr.is_set(V);
        match self {
            Self::Eq => z,
            Self::Ne => !z,
            Self::Cs => c,
            Self::Cc => !c,
            Self::Mi => n,
            Self::Pl => !n,
            Self::Vs => v,
            Self::Vc => !v,
            Self::Hi => c && !z,
            Self::Ls => !c || z,
            Self::Ge => n == v,
            Self::Lt => n != v,
            Self::Gt => !z && n == v,
            Self::Le => z || n != v,
            Self::Al => true,
            // Reserved on ARMv4; never executes.
            Self::Nv => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_comparisons() {
        // N set, V clear: "less than".
        let psr = Psr(N);
        assert!(Condition::Lt.passes(psr));
        assert!(Condition::Le.passes(psr));
        assert!(!Condition::Ge.passes(psr));
        assert!(!Condition::Gt.passes(psr));

        // N and V both set: "greater or equal".
        let psr = Psr(N | V);
        assert!(Condition::Ge.passes(psr));
        assert!(Condition::Gt.passes(psr));
    }

    #[test]
    fn unsigned_comparisons() {
        assert!(Condition::Hi.passes(Psr(C)));
        assert!(!Condition::Hi.passes(Psr(C | Z)));
        assert!(Condition::Ls.passes(Psr(C | Z)));
        assert!(Condition::Ls.passes(Psr(0)));
    }
}
