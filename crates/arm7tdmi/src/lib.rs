//! ARM7TDMI CPU interpreter.
//!
//! Executes both the 32-bit ARM and the 16-bit Thumb instruction sets one
//! whole instruction per [`emu_core::Cpu::step`]. The register file banks
//! SP/LR per mode; exception entry (SWI, IRQ) is a state change and the
//! return is ordinary guest code.

mod alu;
mod arm;
mod condition;
mod cpu;
mod exceptions;
mod psr;
mod registers;
mod shifter;
mod thumb;

pub use alu::add_with_carry;
pub use condition::Condition;
pub use cpu::{Arm7tdmi, SP_IRQ, SP_SUPERVISOR, SP_SYSTEM};
pub use exceptions::{Exception, IRQ_ENTRY_CYCLES};
pub use psr::{C, F, FLAGS_MASK, I, MODE_MASK, Mode, N, Psr, T, V, Z};
pub use registers::{LR, PC, Registers, SP};
pub use shifter::{ShiftType, rotated_immediate, shift_by_immediate, shift_by_register};
