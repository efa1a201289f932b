//! Video collaborators.
//!
//! The machine owns a 240x160 ARGB frame buffer. At the end of each frame a
//! [`Renderer`] fills it from video memory and a [`VideoSink`] receives it.

use crate::bus::GbaBus;

pub const SCREEN_WIDTH: usize = 240;
pub const SCREEN_HEIGHT: usize = 160;
pub const FRAME_PIXELS: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

/// Builds a frame from the bus's video state.
pub trait Renderer {
    /// Write `frame` (row-major, `SCREEN_WIDTH` pixels per row).
    fn render(&mut self, bus: &GbaBus, frame: &mut [u32]);
}

/// Receives finished frames.
pub trait VideoSink {
    fn present_frame(&mut self, frame: &[u32]);
}

/// Expand a BGR555 palette colour to opaque ARGB8888.
#[must_use]
pub const fn bgr555_to_argb(colour: u16) -> u32 {
    let r = (colour & 0x1F) as u32;
    let g = ((colour >> 5) & 0x1F) as u32;
    let b = ((colour >> 10) & 0x1F) as u32;
    0xFF00_0000 | (expand5(r) << 16) | (expand5(g) << 8) | expand5(b)
}

const fn expand5(c: u32) -> u32 {
    (c << 3) | (c >> 2)
}

/// Fills the frame with palette entry 0, the backdrop colour.
#[derive(Debug, Default, Clone, Copy)]
pub struct BackdropRenderer;

impl Renderer for BackdropRenderer {
    fn render(&mut self, bus: &GbaBus, frame: &mut [u32]) {
        frame.fill(bgr555_to_argb(bus.palette_entry(0)));
    }
}
