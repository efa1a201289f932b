//! Top-level GBA system.
//!
//! A frame is 228 scanlines of 1232 CPU cycles (280,896 cycles at
//! 16.78 MHz). Lines 160-227 are VBlank. The scheduler updates the display
//! status registers at the start of each line, then lets the CPU run for
//! that line's budget. Instructions are never split, so a line can overrun
//! by a few cycles.

use arm7tdmi::Arm7tdmi;
use emu_core::{Cpu, Observable, Ticks, Value, parse_address};
use tracing::{debug, info};

use crate::bus::GbaBus;
use crate::config::{FrameTiming, GbaConfig};
use crate::error::{GbaError, Result};
use crate::input::InputSource;
use crate::interrupt::Interrupt;
use crate::video::{FRAME_PIXELS, Renderer, VideoSink};

/// GBA system.
pub struct Gba {
    cpu: Arm7tdmi,
    bus: GbaBus,
    timing: FrameTiming,
    /// ARGB32, 240x160.
    frame: Vec<u32>,
    /// Completed frame counter.
    frame_count: u64,
    input: Option<Box<dyn InputSource>>,
    renderer: Option<Box<dyn Renderer>>,
    video_sink: Option<Box<dyn VideoSink>>,
}

impl Gba {
    /// Create a new GBA from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM or BIOS image is too large.
    pub fn new(config: &GbaConfig) -> Result<Self> {
        let mut bus = GbaBus::new(config.rom_data.clone())?;
        if let Some(bios) = &config.bios {
            bus.load_bios(bios)?;
        }

        let mut cpu = Arm7tdmi::new();
        let entry = config.entry();
        cpu.reset(entry, config.start_in_thumb);

        info!(
            rom_bytes = config.rom_data.len(),
            thumb = config.start_in_thumb,
            "GBA created, entry {entry:#010X}"
        );

        Ok(Self {
            cpu,
            bus,
            timing: config.timing,
            frame: vec![0; FRAME_PIXELS],
            frame_count: 0,
            input: None,
            renderer: None,
            video_sink: None,
        })
    }

    /// Run one complete frame.
    ///
    /// Samples the keypad, steps through every scanline, then renders and
    /// presents the frame. Returns the number of CPU cycles executed.
    pub fn run_frame(&mut self) -> u64 {
        let keys = self.input.as_mut().map(|source| source.read_keys());
        self.bus.latch_input(keys);

        let budget = Ticks::from(self.timing.cycles_per_scanline());
        let mut executed = Ticks::ZERO;
        for line in 0..self.timing.scanlines {
            self.begin_scanline(line);
            executed += self.cpu.step_cycles(&mut self.bus, budget);
        }

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render(&self.bus, &mut self.frame);
        }
        if let Some(sink) = self.video_sink.as_mut() {
            sink.present_frame(&self.frame);
        }

        self.frame_count += 1;
        debug!(
            frame = self.frame_count,
            cycles = executed.get(),
            "frame complete, pc {:#010X}",
            self.cpu.pc()
        );
        executed.get()
    }

    /// Update VCOUNT and DISPSTAT for `line` and raise the line's interrupts.
    fn begin_scanline(&mut self, line: u16) {
        let io = self.bus.io_mut();
        io.set_vcount(line);
        io.set_vblank(line >= self.timing.visible_scanlines);

        let matched = line == io.vcount_setting();
        io.set_vcount_match(matched);

        let vblank_irq = line == self.timing.visible_scanlines && io.vblank_irq_enabled();
        let vcount_irq = matched && io.vcount_irq_enabled();

        if vblank_irq {
            self.bus.request_interrupt(Interrupt::VBlank);
        }
        if vcount_irq {
            self.bus.request_interrupt(Interrupt::VCount);
        }
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    /// Attach the keypad source sampled at the start of each frame.
    pub fn set_input(&mut self, source: Box<dyn InputSource>) {
        self.input = Some(source);
    }

    /// Detach the keypad source; KEYINPUT then reads as all released.
    pub fn clear_input(&mut self) {
        self.input = None;
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = Some(renderer);
    }

    pub fn set_video_sink(&mut self, sink: Box<dyn VideoSink>) {
        self.video_sink = Some(sink);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The frame buffer (ARGB32, 240x160).
    #[must_use]
    pub fn frame_buffer(&self) -> &[u32] {
        &self.frame
    }

    /// Copy the last frame into `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`GbaError::FrameBufferTooSmall`] if `dest` holds fewer than
    /// 240x160 pixels.
    pub fn copy_frame(&self, dest: &mut [u32]) -> Result<()> {
        if dest.len() < FRAME_PIXELS {
            return Err(GbaError::FrameBufferTooSmall {
                needed: FRAME_PIXELS,
                actual: dest.len(),
            });
        }
        dest[..FRAME_PIXELS].copy_from_slice(&self.frame);
        Ok(())
    }

    /// Completed frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[must_use]
    pub fn timing(&self) -> FrameTiming {
        self.timing
    }

    #[must_use]
    pub fn cpu(&self) -> &Arm7tdmi {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Arm7tdmi {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &GbaBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut GbaBus {
        &mut self.bus
    }
}

impl Observable for Gba {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("io.") {
            let io = self.bus.io();
            let irq = self.bus.interrupts();
            match rest {
                "dispcnt" => Some(io.dispcnt().into()),
                "dispstat" => Some(io.dispstat().into()),
                "vcount" => Some(io.vcount().into()),
                "keyinput" => Some(io.keyinput().into()),
                "ie" => Some(irq.enable().into()),
                "if" => Some(irq.flags().into()),
                "ime" => Some(irq.master().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_address(rest).map(|a| Value::U8(self.bus.peek8(a)))
        } else {
            match path {
                "frame_count" => Some(self.frame_count.into()),
                "open_bus" => Some(self.bus.open_bus().into()),
                _ => self.cpu.query(path),
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<arm7tdmi_paths>",
            "io.dispcnt",
            "io.dispstat",
            "io.vcount",
            "io.keyinput",
            "io.ie",
            "io.if",
            "io.ime",
            "memory.<address>",
            "frame_count",
            "open_bus",
        ]
    }
}
