//! Core traits and types shared by the CPU and machine crates.
//!
//! CPUs see memory only through [`Bus`]; machines drive CPUs only through
//! [`Cpu`]. Time is counted in [`Ticks`] of the CPU clock.

mod bus;
mod cpu;
mod observable;
mod ticks;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value, parse_address};
pub use ticks::Ticks;
