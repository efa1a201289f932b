//! Display, background and keypad I/O registers.
//!
//! Interrupt registers live in [`crate::InterruptController`]; the bus
//! routes 0x200-0x20B there.

use crate::interrupt::{byte_of, with_byte};

pub const DISPCNT: u32 = 0x000;
pub const DISPSTAT: u32 = 0x004;
pub const VCOUNT: u32 = 0x006;
pub const BG0CNT: u32 = 0x008;
pub const BG0HOFS: u32 = 0x010;
pub const KEYINPUT: u32 = 0x130;

/// DISPSTAT status bits the CPU cannot write.
const DISPSTAT_STATUS: u16 = 0x0007;
const DISPSTAT_VBLANK: u16 = 1 << 0;
const DISPSTAT_VCOUNT_MATCH: u16 = 1 << 2;
const DISPSTAT_VBLANK_IRQ: u16 = 1 << 3;
const DISPSTAT_VCOUNT_IRQ: u16 = 1 << 5;

/// Scroll registers have 9 significant bits.
const SCROLL_MASK: u16 = 0x01FF;

/// All keys released.
pub const KEYS_RELEASED: u16 = 0x03FF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoRegisters {
    dispcnt: u16,
    dispstat: u16,
    vcount: u16,
    bgcnt: [u16; 4],
    bghofs: [u16; 4],
    bgvofs: [u16; 4],
    keyinput: u16,
}

impl Default for IoRegisters {
    fn default() -> Self {
        Self {
            dispcnt: 0,
            dispstat: 0,
            vcount: 0,
            bgcnt: [0; 4],
            bghofs: [0; 4],
            bgvofs: [0; 4],
            keyinput: KEYS_RELEASED,
        }
    }
}

impl IoRegisters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a byte, or `None` when nothing is mapped at `offset`.
    #[must_use]
    pub fn read8(&self, offset: u32) -> Option<u8> {
        let word = match offset & !1 {
            DISPCNT => self.dispcnt,
            DISPSTAT => self.dispstat,
            VCOUNT => self.vcount,
            o @ 0x008..=0x00E => self.bgcnt[bg_index(o, BG0CNT)],
            o @ 0x010..=0x01E => {
                let n = ((o - BG0HOFS) / 4) as usize;
                if o & 2 == 0 {
                    self.bghofs[n] & SCROLL_MASK
                } else {
                    self.bgvofs[n] & SCROLL_MASK
                }
            }
            KEYINPUT => self.keyinput,
            _ => return None,
        };
        Some(byte_of(word, offset))
    }

    /// CPU byte write. Read-only registers and status bits are preserved.
    pub fn write8(&mut self, offset: u32, value: u8) {
        match offset & !1 {
            DISPCNT => self.dispcnt = with_byte(self.dispcnt, offset, value),
            DISPSTAT => {
                let written = with_byte(self.dispstat, offset, value);
                self.dispstat = (written & !DISPSTAT_STATUS) | (self.dispstat & DISPSTAT_STATUS);
            }
            o @ 0x008..=0x00E => {
                let n = bg_index(o, BG0CNT);
                self.bgcnt[n] = with_byte(self.bgcnt[n], offset, value);
            }
            o @ 0x010..=0x01E => {
                let n = ((o - BG0HOFS) / 4) as usize;
                let reg = if o & 2 == 0 {
                    &mut self.bghofs[n]
                } else {
                    &mut self.bgvofs[n]
                };
                *reg = with_byte(*reg, offset, value);
            }
            _ => {}
        }
    }

    // ========================================================================
    // Scheduler side
    // ========================================================================

    pub fn set_vcount(&mut self, line: u16) {
        self.vcount = line;
    }

    pub fn set_vblank(&mut self, active: bool) {
        self.set_status(DISPSTAT_VBLANK, active);
    }

    pub fn set_vcount_match(&mut self, matched: bool) {
        self.set_status(DISPSTAT_VCOUNT_MATCH, matched);
    }

    pub fn set_keyinput(&mut self, keys: u16) {
        self.keyinput = keys;
    }

    fn set_status(&mut self, bit: u16, on: bool) {
        if on {
            self.dispstat |= bit;
        } else {
            self.dispstat &= !bit;
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn dispcnt(&self) -> u16 {
        self.dispcnt
    }

    #[must_use]
    pub fn dispstat(&self) -> u16 {
        self.dispstat
    }

    #[must_use]
    pub fn vcount(&self) -> u16 {
        self.vcount
    }

    #[must_use]
    pub fn keyinput(&self) -> u16 {
        self.keyinput
    }

    /// Line number that triggers the VCount match (DISPSTAT bits 15-8).
    #[must_use]
    pub fn vcount_setting(&self) -> u16 {
        self.dispstat >> 8
    }

    #[must_use]
    pub fn vblank_irq_enabled(&self) -> bool {
        self.dispstat & DISPSTAT_VBLANK_IRQ != 0
    }

    #[must_use]
    pub fn vcount_irq_enabled(&self) -> bool {
        self.dispstat & DISPSTAT_VCOUNT_IRQ != 0
    }

    /// BGxCNT for background `n` (0-3).
    #[must_use]
    pub fn bg_control(&self, n: usize) -> u16 {
        self.bgcnt[n & 3]
    }

    #[must_use]
    pub fn bg_hofs(&self, n: usize) -> u16 {
        self.bghofs[n & 3] & SCROLL_MASK
    }

    #[must_use]
    pub fn bg_vofs(&self, n: usize) -> u16 {
        self.bgvofs[n & 3] & SCROLL_MASK
    }
}

const fn bg_index(offset: u32, base: u32) -> usize {
    ((offset - base) / 2) as usize
}
