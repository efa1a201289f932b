//! ARM7TDMI program status register (CPSR / SPSR).
//!
//! ```text
//!  31 30 29 28  27 ... 8   7   6   5   4 ... 0
//!   N  Z  C  V  reserved   I   F   T   mode
//! ```

/// Negative flag - bit 31 of the result.
pub const N: u32 = 1 << 31;

/// Zero flag - result was zero.
pub const Z: u32 = 1 << 30;

/// Carry flag - unsigned carry out, no-borrow, or shifter carry.
pub const C: u32 = 1 << 29;

/// Overflow flag - signed overflow.
pub const V: u32 = 1 << 28;

/// IRQ disable - when set, the IRQ line is ignored.
pub const I: u32 = 1 << 7;

/// FIQ disable.
pub const F: u32 = 1 << 6;

/// Thumb state - when set, the CPU fetches 16-bit instructions.
pub const T: u32 = 1 << 5;

/// Mode field mask (bits 0-4).
pub const MODE_MASK: u32 = 0x1F;

/// Condition flags byte (bits 24-31), the only part writable from User mode.
pub const FLAGS_MASK: u32 = 0xFF00_0000;

/// Processor operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    User,
    Fiq,
    Irq,
    Supervisor,
    Abort,
    Undefined,
    System,
}

impl Mode {
    /// Decode the 5-bit mode field. Unassigned patterns return `None`.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits & MODE_MASK {
            0x10 => Some(Self::User),
            0x11 => Some(Self::Fiq),
            0x12 => Some(Self::Irq),
            0x13 => Some(Self::Supervisor),
            0x17 => Some(Self::Abort),
            0x1B => Some(Self::Undefined),
            0x1F => Some(Self::System),
            _ => None,
        }
    }

    /// The 5-bit mode field value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::User => 0x10,
            Self::Fiq => 0x11,
            Self::Irq => 0x12,
            Self::Supervisor => 0x13,
            Self::Abort => 0x17,
            Self::Undefined => 0x1B,
            Self::System => 0x1F,
        }
    }

    /// Index of this mode's SP/LR bank. User and System share bank 0.
    #[must_use]
    pub const fn bank(self) -> usize {
        match self {
            Self::User | Self::System => 0,
            Self::Fiq => 1,
            Self::Irq => 2,
            Self::Supervisor => 3,
            Self::Abort => 4,
            Self::Undefined => 5,
        }
    }

    /// True for every mode that owns a saved status register.
    #[must_use]
    pub const fn is_privileged_exception_mode(self) -> bool {
        self.bank() != 0
    }

    /// Short lowercase name, as used in register dumps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "usr",
            Self::Fiq => "fiq",
            Self::Irq => "irq",
            Self::Supervisor => "svc",
            Self::Abort => "abt",
            Self::Undefined => "und",
            Self::System => "sys",
        }
    }
}

/// Bank index for a raw mode field. Unassigned patterns use the User/System
/// bank.
#[must_use]
pub const fn bank_for_bits(bits: u32) -> usize {
    match Mode::from_bits(bits) {
        Some(mode) => mode.bank(),
        None => 0,
    }
}

/// Program status register value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Psr(pub u32);

impl Psr {
    /// Raw 32-bit value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check if a flag is set.
    #[must_use]
    pub const fn is_set(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    /// Set or clear a flag based on condition.
    pub fn set_if(&mut self, flag: u32, condition: bool) {
        if condition {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    /// Raw mode field.
    #[must_use]
    pub const fn mode_bits(self) -> u32 {
        self.0 & MODE_MASK
    }

    /// Overlay the mode field without touching any banked state.
    pub fn set_mode_bits(&mut self, bits: u32) {
        self.0 = (self.0 & !MODE_MASK) | (bits & MODE_MASK);
    }

    /// Decoded mode, if the field holds an assigned pattern.
    #[must_use]
    pub const fn mode(self) -> Option<Mode> {
        Mode::from_bits(self.0)
    }

    /// Thumb state bit.
    #[must_use]
    pub const fn thumb(self) -> bool {
        self.is_set(T)
    }

    /// Update N and Z from a 32-bit result.
    pub fn update_nz(&mut self, value: u32) {
        self.set_if(N, value & 0x8000_0000 != 0);
        self.set_if(Z, value == 0);
    }

    /// Update N and Z from a 64-bit result (long multiply).
    pub fn update_nz64(&mut self, value: u64) {
        self.set_if(N, value & 0x8000_0000_0000_0000 != 0);
        self.set_if(Z, value == 0);
    }
}
