//! CPU core trait.

use crate::{Bus, Ticks};

/// A CPU core.
///
/// CPUs execute instructions and access memory through a bus. The bus is
/// passed in, not owned, so the machine can hand the same bus to other
/// components (video registers, interrupt controller) between steps.
///
/// Timing is instruction-granular: each [`step`](Cpu::step) runs one
/// instruction (or one exception entry) and reports the cycles it cost.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Execute one instruction, or take a pending interrupt instead.
    ///
    /// Returns the cycles consumed.
    fn step<B: Bus>(&mut self, bus: &mut B) -> Ticks;

    /// Total cycles executed since the last reset.
    fn cycles(&self) -> Ticks;

    /// Run whole instructions until at least `budget` cycles have elapsed.
    ///
    /// The last instruction may overshoot the budget. Returns the cycles
    /// actually executed.
    fn step_cycles<B: Bus>(&mut self, bus: &mut B, budget: Ticks) -> Ticks {
        let start = self.cycles();
        let target = start + budget;
        while self.cycles() < target {
            self.step(bus);
        }
        self.cycles() - start
    }

    /// Returns the address of the next instruction to execute.
    fn pc(&self) -> u32;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;
}
