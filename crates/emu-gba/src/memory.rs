//! GBA address map.
//!
//! The top byte of an address selects the region; the rest is masked down
//! to the region's size, which is what produces the mirrors.
//!
//! | Range                     | Region  | Size    |
//! |---------------------------|---------|---------|
//! | `0000_0000`-`0000_3FFF`   | BIOS    | 16 KiB  |
//! | `0200_0000`-`02FF_FFFF`   | EWRAM   | 256 KiB |
//! | `0300_0000`-`03FF_FFFF`   | IWRAM   | 32 KiB  |
//! | `0400_0000`-`0400_03FF`   | I/O     | 1 KiB   |
//! | `0500_0000`-`05FF_FFFF`   | Palette | 1 KiB   |
//! | `0600_0000`-`06FF_FFFF`   | VRAM    | 96 KiB  |
//! | `0700_0000`-`07FF_FFFF`   | OAM     | 1 KiB   |
//! | `0800_0000`-`0DFF_FFFF`   | ROM     | image   |
//! | `0E00_0000`-`0FFF_FFFF`   | SRAM    | 64 KiB  |
//!
//! Everything else reads as open bus.

pub const BIOS_SIZE: usize = 0x4000;
pub const EWRAM_SIZE: usize = 0x4_0000;
pub const IWRAM_SIZE: usize = 0x8000;
pub const IO_SIZE: u32 = 0x400;
pub const PALETTE_SIZE: usize = 0x400;
pub const VRAM_SIZE: usize = 0x1_8000;
pub const OAM_SIZE: usize = 0x400;
pub const SRAM_SIZE: usize = 0x1_0000;
/// Largest cartridge image the ROM window can address.
pub const ROM_MAX_SIZE: usize = 0x200_0000;

/// A memory region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Bios,
    Ewram,
    Iwram,
    Io,
    Palette,
    Vram,
    Oam,
    Rom,
    Sram,
}

/// Resolve an address to a region and an offset within it.
///
/// ROM offsets are relative to the 32 MiB window; the bus reduces them
/// modulo the image size. Returns `None` for unmapped addresses.
#[must_use]
pub const fn decode(address: u32) -> Option<(Region, u32)> {
    match address >> 24 {
        0x00 if address < BIOS_SIZE as u32 => Some((Region::Bios, address)),
        0x02 => Some((Region::Ewram, address & (EWRAM_SIZE as u32 - 1))),
        0x03 => Some((Region::Iwram, address & (IWRAM_SIZE as u32 - 1))),
        0x04 => {
            let offset = address & 0x00FF_FFFF;
            if offset < IO_SIZE {
                Some((Region::Io, offset))
            } else {
                None
            }
        }
        0x05 => Some((Region::Palette, address & (PALETTE_SIZE as u32 - 1))),
        0x06 => Some((Region::Vram, vram_offset(address))),
        0x07 => Some((Region::Oam, address & (OAM_SIZE as u32 - 1))),
        0x08..=0x0D => Some((
            Region::Rom,
            (address - 0x0800_0000) & (ROM_MAX_SIZE as u32 - 1),
        )),
        0x0E | 0x0F => Some((Region::Sram, address & (SRAM_SIZE as u32 - 1))),
        _ => None,
    }
}

/// VRAM is 96 KiB inside a 128 KiB window: the top 32 KiB mirror the
/// object tile area at 0x1_0000.
const fn vram_offset(address: u32) -> u32 {
    let offset = address & 0x1_FFFF;
    if offset >= VRAM_SIZE as u32 {
        offset - 0x8000
    } else {
        offset
    }
}
