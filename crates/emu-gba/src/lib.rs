//! Game Boy Advance machine.
//!
//! [`GbaBus`] owns the memory map, the display and keypad registers and the
//! [`InterruptController`]. [`Gba`] pairs it with an ARM7TDMI and runs it a
//! frame at a time, driving VCOUNT, DISPSTAT and the VBlank/VCount
//! interrupts. Video output and keypad input are pluggable through the
//! [`Renderer`], [`VideoSink`] and [`InputSource`] traits.

mod bus;
mod config;
mod error;
mod gba;
mod input;
mod interrupt;
pub mod io;
pub mod memory;
mod video;

pub use bus::GbaBus;
pub use config::{FrameTiming, GbaConfig, ROM_ENTRY};
pub use error::{GbaError, Result};
pub use gba::Gba;
pub use input::{GbaButton, InputSource, KeyState};
pub use interrupt::{Interrupt, InterruptController};
pub use io::IoRegisters;
pub use video::{
    BackdropRenderer, FRAME_PIXELS, Renderer, SCREEN_HEIGHT, SCREEN_WIDTH, VideoSink,
    bgr555_to_argb,
};
