//! Interrupt controller: IE, IF and IME.
//!
//! Sources latch their bit in IF. The CPU's IRQ line is high while IME is
//! on and some enabled source is flagged. Software acknowledges a source by
//! writing a one to its IF bit.

use serde::{Deserialize, Serialize};

/// Interrupt sources, in IE/IF bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interrupt {
    VBlank,
    HBlank,
    VCount,
    Timer0,
    Timer1,
    Timer2,
    Timer3,
    Serial,
    Dma0,
    Dma1,
    Dma2,
    Dma3,
    Keypad,
    GamePak,
}

impl Interrupt {
    /// Bit position in IE and IF.
    #[must_use]
    pub const fn bit(self) -> u8 {
        self as u8
    }

    /// Single-bit IE/IF mask.
    #[must_use]
    pub const fn mask(self) -> u16 {
        1 << self.bit()
    }
}

/// IE/IF/IME register file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptController {
    enable: u16,
    flags: u16,
    master: u16,
}

impl InterruptController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch a source in IF.
    pub fn request(&mut self, source: Interrupt) {
        self.flags |= source.mask();
    }

    /// IME on and at least one enabled source flagged.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.master & 1 != 0 && self.enable & self.flags != 0
    }

    /// Clear the IF bits set in `mask`.
    pub fn acknowledge(&mut self, mask: u16) {
        self.flags &= !mask;
    }

    #[must_use]
    pub fn enable(&self) -> u16 {
        self.enable
    }

    pub fn set_enable(&mut self, value: u16) {
        self.enable = value;
    }

    #[must_use]
    pub fn flags(&self) -> u16 {
        self.flags
    }

    #[must_use]
    pub fn master(&self) -> u16 {
        self.master
    }

    pub fn set_master(&mut self, value: u16) {
        self.master = value;
    }

    /// Read a byte of IE (0x200), IF (0x202) or IME (0x208).
    #[must_use]
    pub fn read8(&self, offset: u32) -> Option<u8> {
        let word = match offset & !1 {
            0x200 => self.enable,
            0x202 => self.flags,
            0x208 => self.master,
            _ => return None,
        };
        Some(byte_of(word, offset))
    }

    /// Write a byte. IF bytes clear the bits written as one; each half of
    /// IF is handled independently.
    pub fn write8(&mut self, offset: u32, value: u8) {
        match offset & !1 {
            0x200 => self.enable = with_byte(self.enable, offset, value),
            0x202 => self.acknowledge(u16::from(value) << (8 * (offset & 1))),
            0x208 => self.master = with_byte(self.master, offset, value),
            _ => {}
        }
    }
}

pub(crate) const fn byte_of(word: u16, offset: u32) -> u8 {
    (word >> (8 * (offset & 1))) as u8
}

pub(crate) const fn with_byte(word: u16, offset: u32, value: u8) -> u16 {
    if offset & 1 == 0 {
        (word & 0xFF00) | value as u16
    } else {
        (word & 0x00FF) | ((value as u16) << 8)
    }
}
