//! GBA configuration.

use serde::{Deserialize, Serialize};

/// Start of the cartridge ROM window.
pub const ROM_ENTRY: u32 = 0x0800_0000;

/// Frame timing. The defaults match the real LCD: 228 lines of 1232 cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameTiming {
    /// Total scanlines per frame, including VBlank.
    pub scanlines: u16,
    /// Scanlines drawn before VBlank starts.
    pub visible_scanlines: u16,
    /// CPU cycles per frame.
    pub cycles_per_frame: u32,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self {
            scanlines: 228,
            visible_scanlines: 160,
            cycles_per_frame: 280_896,
        }
    }
}

impl FrameTiming {
    #[must_use]
    pub fn cycles_per_scanline(&self) -> u32 {
        self.cycles_per_frame / u32::from(self.scanlines.max(1))
    }
}

/// GBA configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbaConfig {
    /// Cartridge image.
    pub rom_data: Vec<u8>,
    /// Optional BIOS image, mapped at 0.
    pub bios: Option<Vec<u8>>,
    /// Start directly in the cartridge instead of at the reset vector.
    /// Defaults to true.
    pub skip_bios: bool,
    /// Overrides the starting PC.
    pub entry_point: Option<u32>,
    /// Start in Thumb state.
    pub start_in_thumb: bool,
    pub timing: FrameTiming,
}

impl Default for GbaConfig {
    fn default() -> Self {
        Self {
            rom_data: Vec::new(),
            bios: None,
            skip_bios: true,
            entry_point: None,
            start_in_thumb: false,
            timing: FrameTiming::default(),
        }
    }
}

impl GbaConfig {
    /// Configuration for a cartridge image with everything else defaulted.
    #[must_use]
    pub fn with_rom(rom_data: Vec<u8>) -> Self {
        Self {
            rom_data,
            ..Self::default()
        }
    }

    /// PC at reset.
    #[must_use]
    pub fn entry(&self) -> u32 {
        match self.entry_point {
            Some(address) => address,
            None if self.skip_bios => ROM_ENTRY,
            None => 0,
        }
    }
}
