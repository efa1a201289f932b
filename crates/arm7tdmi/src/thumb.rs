//! Thumb (16-bit) instruction execution.
//!
//! The nineteen formats are told apart by their high bits. r15 reads as
//! the instruction address + 4; PC-relative loads and address generation
//! word-align that value first. Every Thumb instruction costs one cycle.

use emu_core::Bus;
use tracing::trace;

use crate::alu::{self, add_with_carry};
use crate::arm::read_word_rotated;
use crate::condition::Condition;
use crate::cpu::Arm7tdmi;
use crate::exceptions::Exception;
use crate::psr::{C, V};
use crate::registers::{LR, PC, SP};
use crate::shifter::{self, ShiftType};

/// Low register field at `shift`.
const fn low(op: u16, shift: u16) -> usize {
    ((op >> shift) & 7) as usize
}

/// Sign-extend the low `bits` bits of `value`.
const fn sign_extend(value: u32, bits: u32) -> u32 {
    let shift = 32 - bits;
    (((value << shift) as i32) >> shift) as u32
}

impl Arm7tdmi {
    /// Execute a Thumb instruction fetched from `addr`. Returns the cycles
    /// consumed.
    pub(crate) fn execute_thumb<B: Bus>(&mut self, bus: &mut B, op: u16, addr: u32) -> u32 {
        let pc = addr.wrapping_add(4);

        if op & 0xF800 == 0x1800 {
            self.thumb_add_sub(op);
        } else if op & 0xE000 == 0x0000 {
            self.thumb_move_shifted(op);
        } else if op & 0xE000 == 0x2000 {
            self.thumb_immediate(op);
        } else if op & 0xFC00 == 0x4000 {
            self.thumb_alu(op);
        } else if op & 0xFC00 == 0x4400 {
            self.thumb_high_register(op, pc);
        } else if op & 0xF800 == 0x4800 {
            let address = (pc & !3).wrapping_add(u32::from(op & 0xFF) << 2);
            self.regs.r[low(op, 8)] = bus.read32(address);
        } else if op & 0xF000 == 0x5000 {
            self.thumb_register_offset(bus, op);
        } else if op & 0xE000 == 0x6000 {
            self.thumb_immediate_offset(bus, op);
        } else if op & 0xF000 == 0x8000 {
            self.thumb_halfword(bus, op);
        } else if op & 0xF000 == 0x9000 {
            self.thumb_sp_relative(bus, op);
        } else if op & 0xF000 == 0xA000 {
            let base = if op & 0x0800 != 0 { self.regs.r[SP] } else { pc & !3 };
            self.regs.r[low(op, 8)] = base.wrapping_add(u32::from(op & 0xFF) << 2);
        } else if op & 0xFF00 == 0xB000 {
            let offset = u32::from(op & 0x7F) << 2;
            self.regs.r[SP] = if op & 0x80 != 0 {
                self.regs.r[SP].wrapping_sub(offset)
            } else {
                self.regs.r[SP].wrapping_add(offset)
            };
        } else if op & 0xF600 == 0xB400 {
            self.thumb_push_pop(bus, op);
        } else if op & 0xF000 == 0xC000 {
            self.thumb_multiple(bus, op);
        } else if op & 0xFF00 == 0xDF00 {
            self.enter_exception(Exception::SoftwareInterrupt);
        } else if op & 0xF000 == 0xD000 && op & 0x0F00 != 0x0E00 {
            if Condition::from_bits(u32::from(op >> 8)).passes(self.regs.cpsr) {
                let offset = sign_extend(u32::from(op & 0xFF), 8) << 1;
                self.regs.r[PC] = pc.wrapping_add(offset);
            }
        } else if op & 0xF800 == 0xE000 {
            let offset = sign_extend(u32::from(op & 0x7FF), 11) << 1;
            self.regs.r[PC] = pc.wrapping_add(offset);
        } else if op & 0xF800 == 0xF000 {
            // Long branch with link, first half: LR holds the partial target.
            let offset = sign_extend(u32::from(op & 0x7FF), 11) << 12;
            self.regs.r[LR] = pc.wrapping_add(offset);
        } else if op & 0xF800 == 0xF800 {
            // Second half: branch and leave the return address in LR.
            let target = self.regs.r[LR].wrapping_add(u32::from(op & 0x7FF) << 1);
            self.regs.r[LR] = addr.wrapping_add(2) | 1;
            self.regs.r[PC] = target;
        } else {
            trace!("undefined Thumb opcode {op:#06X} at {addr:#010X}");
        }
        1
    }

    /// Apply an adder result to N, Z, C and V and return it.
    fn arithmetic_flags(&mut self, (result, carry, overflow): (u32, bool, bool)) -> u32 {
        self.regs.cpsr.update_nz(result);
        self.regs.set_flag(C, carry);
        self.regs.set_flag(V, overflow);
        result
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    /// LSL/LSR/ASR Rd, Rs, #imm5
    fn thumb_move_shifted(&mut self, op: u16) {
        let kind = ShiftType::from_bits(u32::from(op >> 11));
        let amount = u32::from((op >> 6) & 0x1F);
        let (result, carry) =
            shifter::shift_by_immediate(kind, self.regs.r[low(op, 3)], amount, self.regs.flag(C));
        self.regs.r[low(op, 0)] = result;
        self.regs.cpsr.update_nz(result);
        self.regs.set_flag(C, carry);
    }

    /// ADD/SUB Rd, Rs, Rn|#imm3
    fn thumb_add_sub(&mut self, op: u16) {
        let a = self.regs.r[low(op, 3)];
        let b = if op & 0x0400 != 0 {
            u32::from((op >> 6) & 7)
        } else {
            self.regs.r[low(op, 6)]
        };
        let sum = if op & 0x0200 != 0 {
            alu::sub(a, b)
        } else {
            add_with_carry(a, b, false)
        };
        self.regs.r[low(op, 0)] = self.arithmetic_flags(sum);
    }

    /// MOV/CMP/ADD/SUB Rd, #imm8
    fn thumb_immediate(&mut self, op: u16) {
        let rd = low(op, 8);
        let imm = u32::from(op & 0xFF);
        let value = self.regs.r[rd];
        match (op >> 11) & 3 {
            0 => {
                self.regs.r[rd] = imm;
                self.regs.cpsr.update_nz(imm);
            }
            1 => {
                self.arithmetic_flags(alu::sub(value, imm));
            }
            2 => self.regs.r[rd] = self.arithmetic_flags(add_with_carry(value, imm, false)),
            _ => self.regs.r[rd] = self.arithmetic_flags(alu::sub(value, imm)),
        }
    }

    /// Two-operand ALU operations on r0-r7.
    fn thumb_alu(&mut self, op: u16) {
        let rd = low(op, 0);
        let a = self.regs.r[rd];
        let b = self.regs.r[low(op, 3)];
        let carry_in = self.regs.flag(C);

        let logical = |cpu: &mut Self, result: u32| {
            cpu.regs.cpsr.update_nz(result);
            result
        };
        let shift = |cpu: &mut Self, kind: ShiftType| {
            let (result, carry) = shifter::shift_by_register(kind, a, b, carry_in);
            cpu.regs.set_flag(C, carry);
            cpu.regs.cpsr.update_nz(result);
            result
        };

        match (op >> 6) & 0xF {
            0x0 => self.regs.r[rd] = logical(self, a & b),
            0x1 => self.regs.r[rd] = logical(self, a ^ b),
            0x2 => self.regs.r[rd] = shift(self, ShiftType::Lsl),
            0x3 => self.regs.r[rd] = shift(self, ShiftType::Lsr),
            0x4 => self.regs.r[rd] = shift(self, ShiftType::Asr),
            0x5 => self.regs.r[rd] = self.arithmetic_flags(add_with_carry(a, b, carry_in)),
            0x6 => self.regs.r[rd] = self.arithmetic_flags(add_with_carry(a, !b, carry_in)),
            0x7 => self.regs.r[rd] = shift(self, ShiftType::Ror),
            0x8 => {
                logical(self, a & b);
            }
            0x9 => self.regs.r[rd] = self.arithmetic_flags(alu::sub(0, b)),
            0xA => {
                self.arithmetic_flags(alu::sub(a, b));
            }
            0xB => {
                self.arithmetic_flags(add_with_carry(a, b, false));
            }
            0xC => self.regs.r[rd] = logical(self, a | b),
            0xD => self.regs.r[rd] = logical(self, a.wrapping_mul(b)),
            0xE => self.regs.r[rd] = logical(self, a & !b),
            _ => self.regs.r[rd] = logical(self, !b),
        }
    }

    /// ADD/CMP/MOV on any register, and BX.
    fn thumb_high_register(&mut self, op: u16, pc: u32) {
        let rd = low(op, 0) | (usize::from(op & 0x80 != 0) << 3);
        let rs = low(op, 3) | (usize::from(op & 0x40 != 0) << 3);
        let read = |cpu: &Self, index: usize| if index == PC { pc } else { cpu.regs.r[index] };
        let value = read(self, rs);

        match (op >> 8) & 3 {
            0 => {
                let sum = read(self, rd).wrapping_add(value);
                self.write_high(rd, sum);
            }
            1 => {
                self.arithmetic_flags(alu::sub(read(self, rd), value));
            }
            2 => self.write_high(rd, value),
            _ => {
                self.regs.set_thumb(value & 1 != 0);
                self.regs.r[PC] = value & !1;
            }
        }
    }

    /// Register write from a high-register op. A write to PC stays in Thumb
    /// state and clears bit 0.
    fn write_high(&mut self, rd: usize, value: u32) {
        self.regs.r[rd] = if rd == PC { value & !1 } else { value };
    }

    // =========================================================================
    // Memory
    // =========================================================================

    /// STR/STRB/LDR/LDRB and STRH/LDSB/LDRH/LDSH with register offset.
    fn thumb_register_offset<B: Bus>(&mut self, bus: &mut B, op: u16) {
        let address = self.regs.r[low(op, 3)].wrapping_add(self.regs.r[low(op, 6)]);
        let rd = low(op, 0);

        if op & 0x0200 == 0 {
            match (op >> 10) & 3 {
                0 => bus.write32(address, self.regs.r[rd]),
                1 => bus.write8(address, self.regs.r[rd] as u8),
                2 => self.regs.r[rd] = read_word_rotated(bus, address),
                _ => self.regs.r[rd] = u32::from(bus.read8(address)),
            }
        } else {
            match (op >> 10) & 3 {
                0 => bus.write16(address, self.regs.r[rd] as u16),
                1 => self.regs.r[rd] = bus.read8(address) as i8 as u32,
                2 => self.regs.r[rd] = u32::from(bus.read16(address)),
                _ => self.regs.r[rd] = bus.read16(address) as i16 as u32,
            }
        }
    }

    /// STR/LDR/STRB/LDRB Rd, [Rb, #imm5]
    fn thumb_immediate_offset<B: Bus>(&mut self, bus: &mut B, op: u16) {
        let byte = op & 0x1000 != 0;
        let load = op & 0x0800 != 0;
        let imm = u32::from((op >> 6) & 0x1F);
        let offset = if byte { imm } else { imm << 2 };
        let address = self.regs.r[low(op, 3)].wrapping_add(offset);
        let rd = low(op, 0);

        match (load, byte) {
            (false, false) => bus.write32(address, self.regs.r[rd]),
            (false, true) => bus.write8(address, self.regs.r[rd] as u8),
            (true, false) => self.regs.r[rd] = read_word_rotated(bus, address),
            (true, true) => self.regs.r[rd] = u32::from(bus.read8(address)),
        }
    }

    /// STRH/LDRH Rd, [Rb, #imm5 * 2]
    fn thumb_halfword<B: Bus>(&mut self, bus: &mut B, op: u16) {
        let offset = u32::from((op >> 6) & 0x1F) << 1;
        let address = self.regs.r[low(op, 3)].wrapping_add(offset);
        let rd = low(op, 0);
        if op & 0x0800 != 0 {
            self.regs.r[rd] = u32::from(bus.read16(address));
        } else {
            bus.write16(address, self.regs.r[rd] as u16);
        }
    }

    /// STR/LDR Rd, [SP, #imm8 * 4]
    fn thumb_sp_relative<B: Bus>(&mut self, bus: &mut B, op: u16) {
        let address = self.regs.r[SP].wrapping_add(u32::from(op & 0xFF) << 2);
        let rd = low(op, 8);
        if op & 0x0800 != 0 {
            self.regs.r[rd] = read_word_rotated(bus, address);
        } else {
            bus.write32(address, self.regs.r[rd]);
        }
    }

    /// PUSH {rlist, LR} / POP {rlist, PC}
    fn thumb_push_pop<B: Bus>(&mut self, bus: &mut B, op: u16) {
        let list = u32::from(op & 0xFF);
        let extra = op & 0x0100 != 0;

        if op & 0x0800 == 0 {
            let count = list.count_ones() + u32::from(extra);
            let start = self.regs.r[SP].wrapping_sub(count * 4);
            let mut address = start;
            for index in (0..8).filter(|i| list & (1 << i) != 0) {
                bus.write32(address, self.regs.r[index]);
                address = address.wrapping_add(4);
            }
            if extra {
                bus.write32(address, self.regs.r[LR]);
            }
            self.regs.r[SP] = start;
        } else {
            let mut address = self.regs.r[SP];
            for index in (0..8).filter(|i| list & (1 << i) != 0) {
                self.regs.r[index] = bus.read32(address);
                address = address.wrapping_add(4);
            }
            if extra {
                self.regs.r[PC] = bus.read32(address) & !1;
                address = address.wrapping_add(4);
            }
            self.regs.r[SP] = address;
        }
    }

    /// STMIA/LDMIA Rb!, {rlist}
    fn thumb_multiple<B: Bus>(&mut self, bus: &mut B, op: u16) {
        let rb = low(op, 8);
        let list = u32::from(op & 0xFF);
        let mut address = self.regs.r[rb];

        if op & 0x0800 == 0 {
            for index in (0..8).filter(|i| list & (1 << i) != 0) {
                bus.write32(address, self.regs.r[index]);
                address = address.wrapping_add(4);
            }
            self.regs.r[rb] = address;
        } else {
            for index in (0..8).filter(|i| list & (1 << i) != 0) {
                self.regs.r[index] = bus.read32(address);
                address = address.wrapping_add(4);
            }
            // A loaded base keeps the loaded value.
            if list & (1 << rb) == 0 {
                self.regs.r[rb] = address;
            }
        }
    }
}
