//! GBA system bus.
//!
//! Owns every memory arena, the display/keypad registers and the interrupt
//! controller. Byte accesses are the primitive; wider accesses come from the
//! [`Bus`] trait's little-endian compositions.

use emu_core::Bus;

use crate::error::{GbaError, Result};
use crate::interrupt::{Interrupt, InterruptController};
use crate::io::IoRegisters;
use crate::memory::{
    self, BIOS_SIZE, EWRAM_SIZE, IWRAM_SIZE, OAM_SIZE, PALETTE_SIZE, ROM_MAX_SIZE, Region,
    SRAM_SIZE, VRAM_SIZE,
};

/// Offsets of the interrupt registers inside the I/O window.
const INTERRUPT_REGS: std::ops::RangeInclusive<u32> = 0x200..=0x20B;

pub struct GbaBus {
    bios: Vec<u8>,
    ewram: Vec<u8>,
    iwram: Vec<u8>,
    palette: Vec<u8>,
    vram: Vec<u8>,
    oam: Vec<u8>,
    rom: Vec<u8>,
    sram: Vec<u8>,
    io: IoRegisters,
    interrupts: InterruptController,
    /// Last byte seen on the data bus.
    open_bus: u8,
}

impl GbaBus {
    /// Create a bus with `rom` mapped at 0x0800_0000.
    ///
    /// # Errors
    ///
    /// Returns [`GbaError::RomTooLarge`] if the image exceeds 32 MiB.
    pub fn new(rom: Vec<u8>) -> Result<Self> {
        if rom.len() > ROM_MAX_SIZE {
            return Err(GbaError::RomTooLarge(rom.len()));
        }
        let mut rom = rom;
        if rom.len() < 4 {
            rom.resize(4, 0);
        }
        Ok(Self {
            bios: vec![0; BIOS_SIZE],
            ewram: vec![0; EWRAM_SIZE],
            iwram: vec![0; IWRAM_SIZE],
            palette: vec![0; PALETTE_SIZE],
            vram: vec![0; VRAM_SIZE],
            oam: vec![0; OAM_SIZE],
            rom,
            sram: vec![0; SRAM_SIZE],
            io: IoRegisters::new(),
            interrupts: InterruptController::new(),
            open_bus: 0,
        })
    }

    /// Copy a BIOS image to 0x0000_0000.
    ///
    /// # Errors
    ///
    /// Returns [`GbaError::BiosTooLarge`] if the image exceeds 16 KiB.
    pub fn load_bios(&mut self, image: &[u8]) -> Result<()> {
        if image.len() > BIOS_SIZE {
            return Err(GbaError::BiosTooLarge(image.len()));
        }
        self.bios[..image.len()].copy_from_slice(image);
        Ok(())
    }

    // ========================================================================
    // Interrupts and I/O
    // ========================================================================

    pub fn request_interrupt(&mut self, source: Interrupt) {
        self.interrupts.request(source);
    }

    #[must_use]
    pub fn has_pending_interrupt(&self) -> bool {
        self.interrupts.has_pending()
    }

    #[must_use]
    pub fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    pub fn interrupts_mut(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }

    #[must_use]
    pub fn io(&self) -> &IoRegisters {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IoRegisters {
        &mut self.io
    }

    /// Latch KEYINPUT from an active-low key mask, or "all released" when
    /// no input is attached.
    pub fn latch_input(&mut self, keys: Option<u16>) {
        let value = keys.map_or(crate::io::KEYS_RELEASED, |k| k | 0xFC00);
        self.io.set_keyinput(value);
    }

    // ========================================================================
    // Memory views
    // ========================================================================

    /// Read a byte without touching the open-bus latch.
    #[must_use]
    pub fn peek8(&self, address: u32) -> u8 {
        self.lookup(address).unwrap_or(self.open_bus)
    }

    /// Current open-bus value.
    #[must_use]
    pub fn open_bus(&self) -> u8 {
        self.open_bus
    }

    #[must_use]
    pub fn vram(&self) -> &[u8] {
        &self.vram
    }

    #[must_use]
    pub fn palette(&self) -> &[u8] {
        &self.palette
    }

    #[must_use]
    pub fn oam(&self) -> &[u8] {
        &self.oam
    }

    /// BGR555 colour at palette `index` (0-511; background then object).
    #[must_use]
    pub fn palette_entry(&self, index: usize) -> u16 {
        let offset = (index * 2) % PALETTE_SIZE;
        u16::from_le_bytes([self.palette[offset], self.palette[offset + 1]])
    }

    fn lookup(&self, address: u32) -> Option<u8> {
        let (region, offset) = memory::decode(address)?;
        let offset_usize = offset as usize;
        match region {
            Region::Bios => Some(self.bios[offset_usize]),
            Region::Ewram => Some(self.ewram[offset_usize]),
            Region::Iwram => Some(self.iwram[offset_usize]),
            Region::Io => {
                if INTERRUPT_REGS.contains(&offset) {
                    self.interrupts.read8(offset)
                } else {
                    self.io.read8(offset)
                }
            }
            Region::Palette => Some(self.palette[offset_usize]),
            Region::Vram => Some(self.vram[offset_usize]),
            Region::Oam => Some(self.oam[offset_usize]),
            Region::Rom => Some(self.rom[offset_usize % self.rom.len()]),
            Region::Sram => Some(self.sram[offset_usize]),
        }
    }
}

impl Bus for GbaBus {
    fn read8(&mut self, address: u32) -> u8 {
        if let Some(value) = self.lookup(address) {
            self.open_bus = value;
        }
        self.open_bus
    }

    fn write8(&mut self, address: u32, value: u8) {
        let Some((region, offset)) = memory::decode(address) else {
            return;
        };
        let offset_usize = offset as usize;
        match region {
            Region::Ewram => self.ewram[offset_usize] = value,
            Region::Iwram => self.iwram[offset_usize] = value,
            Region::Io => {
                if INTERRUPT_REGS.contains(&offset) {
                    self.interrupts.write8(offset, value);
                } else {
                    self.io.write8(offset, value);
                }
            }
            Region::Palette => self.palette[offset_usize] = value,
            Region::Vram => self.vram[offset_usize] = value,
            Region::Oam => self.oam[offset_usize] = value,
            Region::Sram => self.sram[offset_usize] = value,
            Region::Bios | Region::Rom => {}
        }
    }

    fn irq_pending(&self) -> bool {
        self.interrupts.has_pending()
    }
}
