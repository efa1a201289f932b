//! Keypad input.
//!
//! KEYINPUT is active low: a cleared bit means the button is held. The
//! scheduler samples its [`InputSource`] once at the start of each frame.

/// Something that reports the keypad state.
pub trait InputSource {
    /// Current keys as an active-low mask in bits 0-9.
    fn read_keys(&mut self) -> u16;
}

/// Logical button on the GBA keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GbaButton {
    A,
    B,
    Select,
    Start,
    Right,
    Left,
    Up,
    Down,
    R,
    L,
}

impl GbaButton {
    /// Bit position in KEYINPUT.
    #[must_use]
    pub const fn bit(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn mask(self) -> u16 {
        1 << self.bit()
    }
}

/// Held-button state, usable directly as an [`InputSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyState {
    keys: u16,
}

impl Default for KeyState {
    fn default() -> Self {
        Self { keys: 0x03FF }
    }
}

impl KeyState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, button: GbaButton) {
        self.keys &= !button.mask();
    }

    pub fn release(&mut self, button: GbaButton) {
        self.keys |= button.mask();
    }

    /// Release everything.
    pub fn reset(&mut self) {
        self.keys = 0x03FF;
    }

    #[must_use]
    pub fn is_pressed(&self, button: GbaButton) -> bool {
        self.keys & button.mask() == 0
    }

    /// Active-low key mask.
    #[must_use]
    pub fn mask(&self) -> u16 {
        self.keys
    }
}

impl InputSource for KeyState {
    fn read_keys(&mut self) -> u16 {
        self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_clears_button_bit() {
        let mut keys = KeyState::new();
        keys.press(GbaButton::Start);
        keys.press(GbaButton::L);
        assert!(keys.is_pressed(GbaButton::Start));
        assert!(!keys.is_pressed(GbaButton::A));
        assert_eq!(keys.read_keys(), 0x03FF & !0x0008 & !0x0200);
    }

    #[test]
    fn release_and_reset() {
        let mut keys = KeyState::new();
        keys.press(GbaButton::A);
        keys.press(GbaButton::Up);
        keys.release(GbaButton::A);
        assert_eq!(keys.mask(), 0x03FF & !0x0040);
        keys.reset();
        assert_eq!(keys.mask(), 0x03FF);
    }
}
