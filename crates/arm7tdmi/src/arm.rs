//! ARM (32-bit) instruction execution.
//!
//! Dispatch is an ordered chain of mask tests: the encodings overlap, so
//! the order below is significant.
//!
//! | Test                          | Family                       |
//! |-------------------------------|------------------------------|
//! | `xxx1_2FFF_1x`                | BX                           |
//! | `101x`                        | B / BL                       |
//! | `1111`                        | SWI                          |
//! | `11xx`                        | coprocessor (ignored)        |
//! | `100x`                        | block transfer (push/pop)    |
//! | `01xx`                        | single data transfer         |
//! | `00xx`, bits 7-4 = `1001`     | multiply, long multiply, SWP |
//! | `000x`, bits 7 and 4 set      | halfword / signed / doubleword |
//! | `00x1_0xx0`                   | MRS / MSR                    |
//! | `00xx`                        | data processing              |
//!
//! Operand reads of r15 see the instruction address + 8, or + 12 when a
//! register-specified shift is involved.

use emu_core::Bus;
use tracing::trace;

use crate::alu::{self, add_with_carry};
use crate::cpu::Arm7tdmi;
use crate::exceptions::Exception;
use crate::psr::{C, FLAGS_MASK, Mode, V};
use crate::registers::{LR, PC, SP};
use crate::shifter::{self, ShiftType};

const BIT_I: u32 = 1 << 25;
const BIT_P: u32 = 1 << 24;
const BIT_U: u32 = 1 << 23;
const BIT_B: u32 = 1 << 22;
const BIT_W: u32 = 1 << 21;
const BIT_L: u32 = 1 << 20;
const BIT_S: u32 = 1 << 20;
const BIT_LINK: u32 = 1 << 24;

/// Register field at `shift`.
const fn reg(op: u32, shift: u32) -> usize {
    ((op >> shift) & 0xF) as usize
}

/// Word load with the ARM7 misalignment rotation.
pub(crate) fn read_word_rotated<B: Bus>(bus: &mut B, address: u32) -> u32 {
    bus.read32(address).rotate_right((address & 3) * 8)
}

impl Arm7tdmi {
    /// Execute an ARM instruction whose condition has already passed.
    ///
    /// `addr` is the address the opcode was fetched from. Returns the
    /// cycles consumed.
    pub(crate) fn execute_arm<B: Bus>(&mut self, bus: &mut B, op: u32, addr: u32) -> u32 {
        if op & 0x0FFF_FFF0 == 0x012F_FF10 {
            return self.arm_branch_exchange(op, addr);
        }
        if op & 0x0E00_0000 == 0x0A00_0000 {
            return self.arm_branch(op, addr);
        }
        if op & 0x0F00_0000 == 0x0F00_0000 {
            self.enter_exception(Exception::SoftwareInterrupt);
            return 1;
        }
        if op & 0x0C00_0000 == 0x0C00_0000 {
            trace!("coprocessor opcode {op:#010X} at {addr:#010X} ignored");
            return 1;
        }
        if op & 0x0E00_0000 == 0x0800_0000 {
            return self.arm_block_transfer(bus, op, addr);
        }
        if op & 0x0C00_0000 == 0x0400_0000 {
            if op & (BIT_I | 0x10) == BIT_I | 0x10 {
                trace!("undefined opcode {op:#010X} at {addr:#010X}");
                return 1;
            }
            return self.arm_single_transfer(bus, op, addr);
        }

        if op & 0x0FC0_00F0 == 0x0000_0090 {
            return self.arm_multiply(op);
        }
        if op & 0x0F80_00F0 == 0x0080_0090 {
            return self.arm_multiply_long(op);
        }
        if op & 0x0FB0_0FF0 == 0x0100_0090 {
            return self.arm_swap(bus, op);
        }
        if op & 0x0E00_0090 == 0x0000_0090 && op & 0x60 != 0 {
            return self.arm_extra_transfer(bus, op, addr);
        }
        if op & 0x0190_0000 == 0x0100_0000 {
            return self.arm_psr_transfer(op, addr);
        }
        self.arm_data_processing(op, addr)
    }

    /// Read a register as an operand, with r15 reading as `pc`.
    fn operand(&self, index: usize, pc: u32) -> u32 {
        if index == PC { pc } else { self.regs.r[index] }
    }

    // =========================================================================
    // Branches
    // =========================================================================

    fn arm_branch_exchange(&mut self, op: u32, addr: u32) -> u32 {
        let target = self.operand(reg(op, 0), addr.wrapping_add(8));
        self.regs.set_thumb(target & 1 != 0);
        self.regs.r[PC] = target & !1;
        1
    }

    fn arm_branch(&mut self, op: u32, addr: u32) -> u32 {
        // Sign-extend the 24-bit field and scale to bytes.
        let offset = (((op << 8) as i32) >> 6) as u32;
        if op & BIT_LINK != 0 {
            self.regs.r[LR] = addr.wrapping_add(4);
        }
        self.regs.r[PC] = addr.wrapping_add(8).wrapping_add(offset);
        1
    }

    // =========================================================================
    // Data processing
    // =========================================================================

    fn arm_data_processing(&mut self, op: u32, addr: u32) -> u32 {
        let opcode = (op >> 21) & 0xF;
        let set_flags = op & BIT_S != 0;
        let rn = reg(op, 16);
        let rd = reg(op, 12);
        let carry_in = self.regs.flag(C);
        let mut cycles = 1;

        let mut pc = addr.wrapping_add(8);
        let (b, shifter_carry) = if op & BIT_I != 0 {
            shifter::rotated_immediate(op, carry_in)
        } else {
            let kind = ShiftType::from_bits(op >> 5);
            if op & 0x10 != 0 {
                cycles += 1;
                pc = addr.wrapping_add(12);
                let value = self.operand(reg(op, 0), pc);
                let amount = self.operand(reg(op, 8), pc);
                shifter::shift_by_register(kind, value, amount, carry_in)
            } else {
                let value = self.operand(reg(op, 0), pc);
                shifter::shift_by_immediate(kind, value, (op >> 7) & 0x1F, carry_in)
            }
        };
        let a = self.operand(rn, pc);

        // Arithmetic ops carry (C, V); logical ops take C from the shifter.
        let (result, arithmetic) = match opcode {
            0x0 | 0x8 => (a & b, None),
            0x1 | 0x9 => (a ^ b, None),
            0x2 | 0xA => split(alu::sub(a, b)),
            0x3 => split(alu::sub(b, a)),
            0x4 | 0xB => split(add_with_carry(a, b, false)),
            0x5 => split(add_with_carry(a, b, carry_in)),
            0x6 => split(add_with_carry(a, !b, carry_in)),
            0x7 => split(add_with_carry(b, !a, carry_in)),
            0xC => (a | b, None),
            0xD => (b, None),
            0xE => (a & !b, None),
            _ => (!b, None),
        };

        let writes_result = !matches!(opcode, 0x8..=0xB);
        if writes_result {
            self.set_reg(rd, result);
        }

        if set_flags {
            if rd == PC && writes_result {
                self.regs.restore_cpsr();
            } else {
                self.regs.cpsr.update_nz(result);
                match arithmetic {
                    Some((carry, overflow)) => {
                        self.regs.set_flag(C, carry);
                        self.regs.set_flag(V, overflow);
                    }
                    None => self.regs.set_flag(C, shifter_carry),
                }
            }
        }
        cycles
    }

    // =========================================================================
    // PSR transfer
    // =========================================================================

    fn arm_psr_transfer(&mut self, op: u32, addr: u32) -> u32 {
        let use_spsr = op & BIT_B != 0;

        if op & BIT_W == 0 {
            // MRS
            let cpsr = self.regs.cpsr.bits();
            let value = if use_spsr {
                self.regs.spsr().unwrap_or(cpsr)
            } else {
                cpsr
            };
            self.set_reg(reg(op, 12), value);
            return 1;
        }

        // MSR
        let value = if op & BIT_I != 0 {
            shifter::rotated_immediate(op, self.regs.flag(C)).0
        } else {
            self.operand(reg(op, 0), addr.wrapping_add(8))
        };
        let mut mask = 0;
        for field in 0..4 {
            if op & (1 << (16 + field)) != 0 {
                mask |= 0xFF << (field * 8);
            }
        }

        if use_spsr {
            if let Some(spsr) = self.regs.spsr() {
                self.regs.set_spsr((spsr & !mask) | (value & mask));
            }
        } else {
            if self.regs.mode() == Some(Mode::User) {
                mask &= FLAGS_MASK;
            }
            let cpsr = self.regs.cpsr.bits();
            self.regs.write_cpsr((cpsr & !mask) | (value & mask));
        }
        1
    }

    // =========================================================================
    // Multiply
    // =========================================================================

    fn arm_multiply(&mut self, op: u32) -> u32 {
        let accumulate = op & BIT_W != 0;
        let rd = reg(op, 16);
        let mut result = self.regs.r[reg(op, 0)].wrapping_mul(self.regs.r[reg(op, 8)]);
        if accumulate {
            result = result.wrapping_add(self.regs.r[reg(op, 12)]);
        }
        self.set_reg(rd, result);
        if op & BIT_S != 0 {
            self.regs.cpsr.update_nz(result);
        }
        if accumulate { 2 } else { 1 }
    }

    fn arm_multiply_long(&mut self, op: u32) -> u32 {
        let signed = op & BIT_B != 0;
        let accumulate = op & BIT_W != 0;
        let rd_hi = reg(op, 16);
        let rd_lo = reg(op, 12);
        let rm = self.regs.r[reg(op, 0)];
        let rs = self.regs.r[reg(op, 8)];

        let mut result = if signed {
            (i64::from(rm as i32) * i64::from(rs as i32)) as u64
        } else {
            u64::from(rm) * u64::from(rs)
        };
        if accumulate {
            let acc = (u64::from(self.regs.r[rd_hi]) << 32) | u64::from(self.regs.r[rd_lo]);
            result = result.wrapping_add(acc);
        }

        self.set_reg(rd_lo, result as u32);
        self.set_reg(rd_hi, (result >> 32) as u32);
        if op & BIT_S != 0 {
            self.regs.cpsr.update_nz64(result);
        }
        if accumulate { 5 } else { 4 }
    }

    // =========================================================================
    // Memory
    // =========================================================================

    fn arm_swap<B: Bus>(&mut self, bus: &mut B, op: u32) -> u32 {
        let address = self.regs.r[reg(op, 16)];
        let source = self.regs.r[reg(op, 0)];
        let loaded = if op & BIT_B != 0 {
            let old = u32::from(bus.read8(address));
            bus.write8(address, source as u8);
            old
        } else {
            let old = read_word_rotated(bus, address);
            bus.write32(address, source);
            old
        };
        self.set_reg(reg(op, 12), loaded);
        1
    }

    fn arm_single_transfer<B: Bus>(&mut self, bus: &mut B, op: u32, addr: u32) -> u32 {
        let rn = reg(op, 16);
        let rd = reg(op, 12);
        let pc = addr.wrapping_add(8);

        let offset = if op & BIT_I == 0 {
            op & 0xFFF
        } else {
            // The shifter carry is discarded here.
            let value = self.operand(reg(op, 0), pc);
            let kind = ShiftType::from_bits(op >> 5);
            shifter::shift_by_immediate(kind, value, (op >> 7) & 0x1F, self.regs.flag(C)).0
        };

        let base = self.operand(rn, pc);
        let offset_address = if op & BIT_U != 0 {
            base.wrapping_add(offset)
        } else {
            base.wrapping_sub(offset)
        };
        let address = if op & BIT_P != 0 { offset_address } else { base };
        let writeback = op & BIT_P == 0 || op & BIT_W != 0;

        if op & BIT_L != 0 {
            let value = if op & BIT_B != 0 {
                u32::from(bus.read8(address))
            } else {
                read_word_rotated(bus, address)
            };
            if writeback {
                self.set_reg(rn, offset_address);
            }
            self.set_reg(rd, value);
        } else {
            let value = self.operand(rd, addr.wrapping_add(12));
            if op & BIT_B != 0 {
                bus.write8(address, value as u8);
            } else {
                bus.write32(address, value);
            }
            if writeback {
                self.set_reg(rn, offset_address);
            }
        }
        1
    }

    fn arm_extra_transfer<B: Bus>(&mut self, bus: &mut B, op: u32, addr: u32) -> u32 {
        let rn = reg(op, 16);
        let rd = reg(op, 12);
        let pc = addr.wrapping_add(8);
        let kind = (op >> 5) & 3;

        let offset = if op & BIT_B != 0 {
            ((op >> 4) & 0xF0) | (op & 0xF)
        } else {
            self.operand(reg(op, 0), pc)
        };
        let base = self.operand(rn, pc);
        let offset_address = if op & BIT_U != 0 {
            base.wrapping_add(offset)
        } else {
            base.wrapping_sub(offset)
        };
        let address = if op & BIT_P != 0 { offset_address } else { base };
        let writeback = op & BIT_P == 0 || op & BIT_W != 0;

        match (op & BIT_L != 0, kind) {
            // LDRH / LDRSB / LDRSH
            (true, _) => {
                let value = match kind {
                    1 => u32::from(bus.read16(address)),
                    2 => bus.read8(address) as i8 as u32,
                    _ => bus.read16(address) as i16 as u32,
                };
                if writeback {
                    self.set_reg(rn, offset_address);
                }
                self.set_reg(rd, value);
            }
            // STRH
            (false, 1) => {
                let value = self.operand(rd, addr.wrapping_add(12));
                bus.write16(address, value as u16);
                if writeback {
                    self.set_reg(rn, offset_address);
                }
            }
            // LDRD
            (false, 2) => {
                let lo = bus.read32(address);
                let hi = bus.read32(address.wrapping_add(4));
                if writeback {
                    self.set_reg(rn, offset_address);
                }
                let pair = rd & !1;
                self.set_reg(pair, lo);
                self.set_reg(pair + 1, hi);
            }
            // STRD
            _ => {
                let pair = rd & !1;
                let lo = self.operand(pair, addr.wrapping_add(12));
                let hi = self.operand(pair + 1, addr.wrapping_add(12));
                bus.write32(address, lo);
                bus.write32(address.wrapping_add(4), hi);
                if writeback {
                    self.set_reg(rn, offset_address);
                }
            }
        }
        1
    }

    /// `STMDB SP!, {list}` and `LDMIA SP!, {list}`. Other block transfers are
    /// ignored.
    fn arm_block_transfer<B: Bus>(&mut self, bus: &mut B, op: u32, addr: u32) -> u32 {
        let list = op & 0xFFFF;
        let count = list.count_ones();

        match op & 0x0FFF_0000 {
            // PUSH
            0x092D_0000 => {
                let start = self.regs.r[SP].wrapping_sub(count * 4);
                let mut address = start;
                for index in (0..16).filter(|i| list & (1 << i) != 0) {
                    let value = self.operand(index, addr.wrapping_add(12));
                    bus.write32(address, value);
                    address = address.wrapping_add(4);
                }
                self.regs.r[SP] = start;
            }
            // POP
            0x08BD_0000 => {
                let mut address = self.regs.r[SP];
                self.regs.r[SP] = address.wrapping_add(count * 4);
                for index in (0..16).filter(|i| list & (1 << i) != 0) {
                    let value = bus.read32(address);
                    self.set_reg(index, value);
                    address = address.wrapping_add(4);
                }
            }
            _ => {
                trace!("block transfer {op:#010X} at {addr:#010X} ignored");
            }
        }
        1
    }
}

/// Tag an adder result as arithmetic for flag setting.
const fn split((result, carry, overflow): (u32, bool, bool)) -> (u32, Option<(bool, bool)>) {
    (result, Some((carry, overflow)))
}
