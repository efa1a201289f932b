//! ARM7TDMI register file.
//!
//! - r0-r15: the live registers (r13 = SP, r14 = LR, r15 = PC)
//! - CPSR: current program status register
//! - SPSR: one saved status register per exception mode
//! - Banked SP/LR: one pair per exception mode plus the shared User/System
//!   pair. Only SP and LR are banked here; r0-r12 and the PC never are.

use serde::{Deserialize, Serialize};

use crate::psr::{self, Mode, Psr};

/// Stack pointer register index.
pub const SP: usize = 13;
/// Link register index.
pub const LR: usize = 14;
/// Program counter register index.
pub const PC: usize = 15;

/// Number of SP/LR banks (User/System, FIQ, IRQ, SVC, ABT, UND).
const BANKS: usize = 6;

/// ARM7TDMI register set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Live general registers. `r[15]` holds the address of the next fetch.
    pub r: [u32; 16],
    /// Current program status register.
    pub cpsr: Psr,
    /// Saved status registers, indexed by `bank - 1` (FIQ, IRQ, SVC, ABT, UND).
    spsr: [u32; BANKS - 1],
    /// Inactive SP/LR pairs, indexed by bank. The active mode's slot is stale
    /// until the next mode switch writes it back.
    banked: [[u32; 2]; BANKS],
    /// Cycles executed since reset.
    pub cycles: u64,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Create registers in the post-BIOS state: System mode, ARM state,
    /// IRQs enabled, everything else zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            r: [0; 16],
            cpsr: Psr(0x1F),
            spsr: [0; BANKS - 1],
            banked: [[0; 2]; BANKS],
            cycles: 0,
        }
    }

    /// Program counter (address of the next fetch).
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.r[PC]
    }

    /// Check a CPSR flag.
    #[must_use]
    pub const fn flag(&self, flag: u32) -> bool {
        self.cpsr.is_set(flag)
    }

    /// Set or clear a CPSR flag.
    pub fn set_flag(&mut self, flag: u32, value: bool) {
        self.cpsr.set_if(flag, value);
    }

    /// Current mode, or `None` if the mode field holds an unassigned pattern.
    #[must_use]
    pub const fn mode(&self) -> Option<Mode> {
        self.cpsr.mode()
    }

    /// Raw mode field.
    #[must_use]
    pub const fn mode_bits(&self) -> u32 {
        self.cpsr.mode_bits()
    }

    /// Overlay the mode field without swapping banks.
    pub fn set_mode_bits(&mut self, bits: u32) {
        self.cpsr.set_mode_bits(bits);
    }

    /// Thumb state.
    #[must_use]
    pub const fn thumb(&self) -> bool {
        self.cpsr.thumb()
    }

    /// Overlay the Thumb bit.
    pub fn set_thumb(&mut self, thumb: bool) {
        self.cpsr.set_if(psr::T, thumb);
    }

    /// Saved status register of the current mode. User and System have none.
    #[must_use]
    pub const fn spsr(&self) -> Option<u32> {
        match self.cpsr.mode() {
            Some(mode) if mode.is_privileged_exception_mode() => Some(self.spsr[mode.bank() - 1]),
            _ => None,
        }
    }

    /// Write the current mode's saved status register. No-op in User/System.
    pub fn set_spsr(&mut self, value: u32) {
        if let Some(mode) = self.cpsr.mode().filter(|m| m.is_privileged_exception_mode()) {
            self.spsr[mode.bank() - 1] = value;
        }
    }

    /// Saved status register of a specific mode, for inspection.
    #[must_use]
    pub const fn spsr_of(&self, mode: Mode) -> Option<u32> {
        if mode.is_privileged_exception_mode() {
            Some(self.spsr[mode.bank() - 1])
        } else {
            None
        }
    }

    /// Banked SP of a mode that is not currently active. For the active mode
    /// this returns the live r13.
    #[must_use]
    pub const fn banked_sp(&self, mode: Mode) -> u32 {
        if mode.bank() == psr::bank_for_bits(self.cpsr.mode_bits()) {
            self.r[SP]
        } else {
            self.banked[mode.bank()][0]
        }
    }

    /// Set the SP of a mode. Writes the live r13 if the mode is active.
    pub fn set_banked_sp(&mut self, mode: Mode, value: u32) {
        if mode.bank() == psr::bank_for_bits(self.cpsr.mode_bits()) {
            self.r[SP] = value;
        } else {
            self.banked[mode.bank()][0] = value;
        }
    }

    /// Switch to `target`, swapping SP/LR banks.
    ///
    /// A no-op if the mode field already holds `target`. No legality check
    /// is made; exception returns rely on being able to write any mode.
    pub fn switch_mode(&mut self, target: Mode) {
        if self.cpsr.mode_bits() == target.bits() {
            return;
        }
        let from = psr::bank_for_bits(self.cpsr.mode_bits());
        let to = target.bank();
        if from != to {
            self.banked[from] = [self.r[SP], self.r[LR]];
            [self.r[SP], self.r[LR]] = self.banked[to];
        }
        self.cpsr.set_mode_bits(target.bits());
    }

    /// Replace the whole CPSR, swapping banks if the mode field changes.
    ///
    /// Unassigned mode patterns are written through as raw bits.
    pub fn write_cpsr(&mut self, value: u32) {
        match Mode::from_bits(value) {
            Some(mode) => self.switch_mode(mode),
            None => {
                let from = psr::bank_for_bits(self.cpsr.mode_bits());
                if from != 0 {
                    self.banked[from] = [self.r[SP], self.r[LR]];
                    [self.r[SP], self.r[LR]] = self.banked[0];
                }
            }
        }
        self.cpsr = Psr(value);
    }

    /// Restore CPSR from the current mode's SPSR. No-op in User/System.
    pub fn restore_cpsr(&mut self) {
        if let Some(saved) = self.spsr() {
            self.write_cpsr(saved);
        }
    }
}
