//! Frame scheduling: display status, keypad latch and video hand-off.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use emu_core::{Bus, Observable, Value};
use emu_gba::{
    BackdropRenderer, FRAME_PIXELS, FrameTiming, Gba, GbaBus, GbaButton, GbaConfig, GbaError,
    InputSource, Interrupt, KeyState, Renderer, VideoSink,
};

const DISPSTAT: u32 = 0x0400_0004;

/// Cartridge that spins on `B .`.
fn make_gba() -> Gba {
    Gba::new(&GbaConfig::with_rom(vec![0xFE, 0xFF, 0xFF, 0xEA])).expect("small ROM")
}

/// Keypad whose state the test can change between frames.
struct SharedKeys {
    keys: Rc<Cell<u16>>,
    reads: Rc<Cell<u32>>,
}

impl InputSource for SharedKeys {
    fn read_keys(&mut self) -> u16 {
        self.reads.set(self.reads.get() + 1);
        self.keys.get()
    }
}

/// Records what it was handed.
struct RecordingSink {
    frames: Rc<RefCell<Vec<(usize, u32)>>>,
}

impl VideoSink for RecordingSink {
    fn present_frame(&mut self, frame: &[u32]) {
        self.frames.borrow_mut().push((frame.len(), frame[0]));
    }
}

/// Paints every pixel with the current VCOUNT.
struct VcountRenderer;

impl Renderer for VcountRenderer {
    fn render(&mut self, bus: &GbaBus, frame: &mut [u32]) {
        frame.fill(u32::from(bus.io().vcount()));
    }
}

#[test]
fn test_vblank_flag_raised_once_per_frame() {
    let mut gba = make_gba();
    gba.bus_mut().write16(DISPSTAT, 0x0008);

    gba.run_frame();
    assert_eq!(gba.bus().interrupts().flags(), Interrupt::VBlank.mask());

    gba.bus_mut().write16(0x0400_0202, 0xFFFF);
    gba.run_frame();
    assert_eq!(
        gba.bus().interrupts().flags(),
        Interrupt::VBlank.mask(),
        "raised again on the next frame"
    );
    assert_eq!(gba.frame_count(), 2);
}

#[test]
fn test_vblank_irq_needs_dispstat_enable() {
    let mut gba = make_gba();
    gba.run_frame();
    assert_eq!(gba.bus().interrupts().flags(), 0);
    assert_eq!(gba.query("io.dispstat"), Some(Value::U16(0x0001)), "still in VBlank");
}

#[test]
fn test_vcount_match_sets_flag_and_irq() {
    let mut gba = make_gba();
    // Match line 227, VCount IRQ enabled.
    gba.bus_mut().write16(DISPSTAT, (227 << 8) | 0x0020);
    gba.run_frame();

    let dispstat = gba.bus().io().dispstat();
    assert_eq!(dispstat & 0x0004, 0x0004, "line 227 matches");
    assert_eq!(gba.bus().interrupts().flags(), Interrupt::VCount.mask());

    gba.bus_mut().write16(DISPSTAT, 100 << 8);
    gba.bus_mut().write16(0x0400_0202, 0xFFFF);
    gba.run_frame();
    assert_eq!(gba.bus().io().dispstat() & 0x0004, 0, "flag clears off the match line");
    assert_eq!(gba.bus().interrupts().flags(), 0, "VCount IRQ disabled");
}

#[test]
fn test_key_latch_sampled_once_per_frame() {
    let mut gba = make_gba();
    assert_eq!(gba.query("io.keyinput"), Some(Value::U16(0x03FF)));

    let keys = Rc::new(Cell::new(0x03FF & !GbaButton::A.mask()));
    let reads = Rc::new(Cell::new(0));
    gba.set_input(Box::new(SharedKeys {
        keys: Rc::clone(&keys),
        reads: Rc::clone(&reads),
    }));

    gba.run_frame();
    assert_eq!(gba.bus_mut().read16(0x0400_0130), 0xFFFE);
    assert_eq!(reads.get(), 1);

    keys.set(0x03FF);
    gba.run_frame();
    assert_eq!(gba.query("io.keyinput"), Some(Value::U16(0xFFFF)));
    assert_eq!(reads.get(), 2);

    gba.clear_input();
    gba.run_frame();
    assert_eq!(gba.query("io.keyinput"), Some(Value::U16(0x03FF)));
}

#[test]
fn test_key_state_as_input_source() {
    let mut gba = make_gba();
    let mut keys = KeyState::new();
    keys.press(GbaButton::Start);
    keys.press(GbaButton::Down);
    gba.set_input(Box::new(keys));
    gba.run_frame();
    assert_eq!(gba.bus().io().keyinput(), 0xFC00 | (0x03FF & !0x0088));
}

#[test]
fn test_renderer_runs_after_last_scanline() {
    let mut gba = make_gba();
    let frames = Rc::new(RefCell::new(Vec::new()));
    gba.set_renderer(Box::new(VcountRenderer));
    gba.set_video_sink(Box::new(RecordingSink {
        frames: Rc::clone(&frames),
    }));

    gba.run_frame();
    gba.run_frame();

    assert_eq!(*frames.borrow(), vec![(FRAME_PIXELS, 227); 2]);
    assert!(gba.frame_buffer().iter().all(|&p| p == 227));
}

#[test]
fn test_backdrop_renderer_and_copy_frame() {
    let mut gba = make_gba();
    gba.bus_mut().write16(0x0500_0000, 0x03E0);
    gba.set_renderer(Box::new(BackdropRenderer));
    gba.run_frame();

    let mut dest = vec![0; FRAME_PIXELS];
    gba.copy_frame(&mut dest).expect("full-size buffer");
    assert!(dest.iter().all(|&p| p == 0xFF00_FF00), "green backdrop");

    let mut short = vec![0; FRAME_PIXELS - 1];
    assert_eq!(
        gba.copy_frame(&mut short),
        Err(GbaError::FrameBufferTooSmall {
            needed: FRAME_PIXELS,
            actual: FRAME_PIXELS - 1
        })
    );
}

#[test]
fn test_custom_timing() {
    let config = GbaConfig {
        rom_data: vec![0xFE, 0xFF, 0xFF, 0xEA],
        timing: FrameTiming {
            scanlines: 10,
            visible_scanlines: 5,
            cycles_per_frame: 1000,
        },
        ..GbaConfig::default()
    };
    let mut gba = Gba::new(&config).expect("valid config");
    assert_eq!(gba.run_frame(), 1000);
    assert_eq!(gba.query("io.vcount"), Some(Value::U16(9)));
}

#[test]
fn test_config_from_json() {
    let config: GbaConfig =
        serde_json::from_str(r#"{"entry_point": 50331648, "start_in_thumb": true}"#)
            .expect("partial config parses");
    assert!(config.skip_bios, "defaults fill missing fields");
    assert_eq!(config.timing, FrameTiming::default());
    assert_eq!(config.entry(), 0x0300_0000);

    let json = serde_json::to_string(&config).expect("serialises");
    let back: GbaConfig = serde_json::from_str(&json).expect("round trip");
    assert_eq!(back, config);
}
