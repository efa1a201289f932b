//! Exception entry.
//!
//! Entry is a state change only: the handler runs as ordinary guest code
//! and returns with `MOVS PC, LR` or `SUBS PC, LR, #4`. Both exceptions link
//! to the PC at entry, the address of the next instruction.

use tracing::trace;

use crate::cpu::Arm7tdmi;
use crate::psr::{I, Mode};
use crate::registers::{LR, PC};

/// Cycles charged for taking an IRQ in place of an instruction.
pub const IRQ_ENTRY_CYCLES: u32 = 3;

/// Exceptions the core can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    SoftwareInterrupt,
    Irq,
}

impl Exception {
    /// Mode the handler runs in.
    #[must_use]
    pub const fn mode(self) -> Mode {
        match self {
            Self::SoftwareInterrupt => Mode::Supervisor,
            Self::Irq => Mode::Irq,
        }
    }

    /// Vector address.
    #[must_use]
    pub const fn vector(self) -> u32 {
        match self {
            Self::SoftwareInterrupt => 0x08,
            Self::Irq => 0x18,
        }
    }
}

impl Arm7tdmi {
    /// Enter `exception`.
    ///
    /// Must be called at an instruction boundary: `r15` holds the address of
    /// the next instruction to execute.
    pub fn enter_exception(&mut self, exception: Exception) {
        let saved = self.regs.cpsr.bits();
        let next = self.regs.r[PC];

        self.regs.switch_mode(exception.mode());
        self.regs.set_spsr(saved);
        self.regs.r[LR] = next;
        self.regs.set_flag(I, true);
        self.regs.set_thumb(false);
        self.regs.r[PC] = exception.vector();

        trace!(?exception, return_to = next, spsr = saved, "exception entry");
    }
}
