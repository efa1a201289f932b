//! ARM7TDMI CPU core.
//!
//! Instruction-granular: one call to [`Cpu::step`] executes one whole
//! instruction, or takes a pending IRQ instead. Timing is a fixed cost per
//! instruction plus a few documented extras (register-specified shifts,
//! multiply accumulate, long multiply, IRQ entry).

use emu_core::{Bus, Cpu, Observable, Ticks, Value};

use crate::condition::Condition;
use crate::exceptions::{Exception, IRQ_ENTRY_CYCLES};
use crate::psr::{C, F, I, Mode, N, V, Z};
use crate::registers::{LR, PC, Registers, SP};

/// Initial System/User stack pointer (top of IWRAM less the BIOS area).
pub const SP_SYSTEM: u32 = 0x0300_7F00;
/// Initial IRQ stack pointer.
pub const SP_IRQ: u32 = 0x0300_7FA0;
/// Initial Supervisor stack pointer.
pub const SP_SUPERVISOR: u32 = 0x0300_7FE0;

/// ARM7TDMI CPU.
#[derive(Debug, Clone, Default)]
pub struct Arm7tdmi {
    /// CPU registers (public for testing and snapshots).
    pub regs: Registers,
}

impl Arm7tdmi {
    /// Create a CPU in the post-BIOS state with PC at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regs: Registers::new(),
        }
    }

    /// Reinitialise all state and start execution at `entry`.
    ///
    /// System mode, IRQs enabled, stacks at their post-BIOS positions, the
    /// cycle counter cleared. `entry` is aligned to the selected
    /// instruction set.
    pub fn reset(&mut self, entry: u32, thumb: bool) {
        let mut regs = Registers::new();
        regs.r[SP] = SP_SYSTEM;
        regs.r[LR] = 0;
        regs.set_banked_sp(Mode::Irq, SP_IRQ);
        regs.set_banked_sp(Mode::Supervisor, SP_SUPERVISOR);
        regs.r[PC] = if thumb { entry & !1 } else { entry & !3 };
        regs.set_thumb(thumb);
        self.regs = regs;
    }

    /// Current mode, `None` if the mode field holds an unassigned pattern.
    #[must_use]
    pub const fn mode(&self) -> Option<Mode> {
        self.regs.mode()
    }

    /// Execute one instruction and return its cost in cycles.
    fn execute<B: Bus>(&mut self, bus: &mut B) -> u32 {
        if !self.regs.flag(I) && bus.irq_pending() {
            self.enter_exception(Exception::Irq);
            return IRQ_ENTRY_CYCLES;
        }

        if self.regs.thumb() {
            let addr = self.regs.r[PC] & !1;
            let op = bus.read16(addr);
            self.regs.r[PC] = addr.wrapping_add(2);
            self.execute_thumb(bus, op, addr)
        } else {
            let addr = self.regs.r[PC] & !3;
            let op = bus.read32(addr);
            self.regs.r[PC] = addr.wrapping_add(4);
            if Condition::from_bits(op >> 28).passes(self.regs.cpsr) {
                self.execute_arm(bus, op, addr)
            } else {
                1
            }
        }
    }

    /// Write a register. Writes to PC take effect at the next fetch, which
    /// aligns them.
    pub(crate) fn set_reg(&mut self, index: usize, value: u32) {
        self.regs.r[index & 0xF] = value;
    }
}

impl Cpu for Arm7tdmi {
    type Registers = Registers;

    fn step<B: Bus>(&mut self, bus: &mut B) -> Ticks {
        let cycles = self.execute(bus);
        self.regs.cycles = self.regs.cycles.wrapping_add(u64::from(cycles));
        Ticks::from(cycles)
    }

    fn cycles(&self) -> Ticks {
        Ticks::new(self.regs.cycles)
    }

    fn pc(&self) -> u32 {
        self.regs.r[PC]
    }

    fn registers(&self) -> Registers {
        self.regs.clone()
    }
}

const REGISTER_PATHS: [&str; 16] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "r12", "r13",
    "r14", "r15",
];

impl Observable for Arm7tdmi {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.regs.r[PC].into()),
            "sp" => Some(self.regs.r[SP].into()),
            "lr" => Some(self.regs.r[LR].into()),
            "cpsr" => Some(self.regs.cpsr.bits().into()),
            "spsr" => self.regs.spsr().map(Value::from),
            "mode" => Some(self.regs.mode().map_or("invalid", Mode::name).into()),
            "thumb" => Some(self.regs.thumb().into()),
            "flags.n" | "n" => Some(self.regs.flag(N).into()),
            "flags.z" | "z" => Some(self.regs.flag(Z).into()),
            "flags.c" | "c" => Some(self.regs.flag(C).into()),
            "flags.v" | "v" => Some(self.regs.flag(V).into()),
            "flags.i" | "i" => Some(self.regs.flag(I).into()),
            "flags.f" | "f" => Some(self.regs.flag(F).into()),
            "cycles" => Some(Value::U64(self.regs.cycles)),
            _ => REGISTER_PATHS
                .iter()
                .position(|&name| name == path)
                .map(|index| Value::U32(self.regs.r[index])),
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "sp", "lr", "cpsr", "spsr", "mode", "thumb", "flags.n", "flags.z", "flags.c",
            "flags.v", "flags.i", "flags.f", "cycles", "r0", "r1", "r2", "r3", "r4", "r5", "r6",
            "r7", "r8", "r9", "r10", "r11", "r12", "r13", "r14", "r15",
        ]
    }
}
