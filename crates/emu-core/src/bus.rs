//! Memory and I/O bus interface.

/// Memory bus interface.
///
/// Components access memory and peripherals through this trait. The bus
/// handles address decoding and routing to the appropriate device.
///
/// Only the byte primitives are required. Halfword and word accesses are
/// little-endian compositions of byte accesses with the low address bits
/// forced to the access width, which is how the GBA bus presents itself to
/// the CPU. Implementations may override them for speed but must produce
/// identical results.
pub trait Bus {
    /// Read a byte from the given address.
    fn read8(&mut self, address: u32) -> u8;

    /// Write a byte to the given address.
    fn write8(&mut self, address: u32, value: u8);

    /// Read a little-endian halfword. Bit 0 of the address is ignored.
    fn read16(&mut self, address: u32) -> u16 {
        let address = address & !1;
        let lo = self.read8(address);
        let hi = self.read8(address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    /// Read a little-endian word. Bits 0-1 of the address are ignored.
    fn read32(&mut self, address: u32) -> u32 {
        let address = address & !3;
        let b0 = self.read8(address);
        let b1 = self.read8(address.wrapping_add(1));
        let b2 = self.read8(address.wrapping_add(2));
        let b3 = self.read8(address.wrapping_add(3));
        u32::from_le_bytes([b0, b1, b2, b3])
    }

    /// Write a little-endian halfword. Bit 0 of the address is ignored.
    fn write16(&mut self, address: u32, value: u16) {
        let address = address & !1;
        let [lo, hi] = value.to_le_bytes();
        self.write8(address, lo);
        self.write8(address.wrapping_add(1), hi);
    }

    /// Write a little-endian word. Bits 0-1 of the address are ignored.
    fn write32(&mut self, address: u32, value: u32) {
        let address = address & !3;
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.write8(address.wrapping_add(i as u32), byte);
        }
    }

    /// Level of the CPU's IRQ input.
    ///
    /// Polled by the CPU at every instruction boundary. Buses without an
    /// interrupt controller leave the line low.
    fn irq_pending(&self) -> bool {
        false
    }
}

/// Flat little-endian RAM covering the low part of the address space.
///
/// Addresses wrap modulo the RAM size. Intended for CPU tests that need a
/// bus without any machine attached.
pub struct SimpleBus {
    ram: Vec<u8>,
    irq: bool,
}

impl SimpleBus {
    /// Create a bus with `size` bytes of zeroed RAM.
    ///
    /// A zero size is rounded up to one byte so reads always resolve.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            ram: vec![0; size.max(1)],
            irq: false,
        }
    }

    /// Copy `data` into RAM starting at `address`.
    pub fn load(&mut self, address: u32, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.write8(address.wrapping_add(i as u32), byte);
        }
    }

    /// Read a byte without going through the trait (for assertions).
    #[must_use]
    pub fn peek(&self, address: u32) -> u8 {
        self.ram[address as usize % self.ram.len()]
    }

    /// Drive the IRQ line.
    pub fn set_irq(&mut self, level: bool) {
        self.irq = level;
    }
}

impl Bus for SimpleBus {
    fn read8(&mut self, address: u32) -> u8 {
        self.peek(address)
    }

    fn write8(&mut self, address: u32, value: u8) {
        let len = self.ram.len();
        self.ram[address as usize % len] = value;
    }

    fn irq_pending(&self) -> bool {
        self.irq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_access_is_little_endian() {
        let mut bus = SimpleBus::new(0x100);
        bus.write32(0x10, 0x1234_5678);
        assert_eq!(bus.peek(0x10), 0x78);
        assert_eq!(bus.peek(0x13), 0x12);
        assert_eq!(bus.read16(0x12), 0x1234);
    }

    #[test]
    fn wide_access_masks_low_address_bits() {
        let mut bus = SimpleBus::new(0x100);
        bus.write32(0x23, 0xAABB_CCDD);
        assert_eq!(bus.read32(0x20), 0xAABB_CCDD);
        assert_eq!(bus.read16(0x21), 0xCCDD);
    }

    #[test]
    fn irq_line_defaults_low() {
        let mut bus = SimpleBus::new(4);
        assert!(!bus.irq_pending());
        bus.set_irq(true);
        assert!(bus.irq_pending());
    }
}
