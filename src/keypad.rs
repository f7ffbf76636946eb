use crate::consts::KEY_COUNT;

/// Pressed/released state of the sixteen hex keys. Written by whatever input
/// source drives the machine; the interpreter only reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys above 0xF fold onto the low nibble.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[key as usize & 0xF]
    }

    pub fn press(&mut self, key: u8) {
        self.set(key, true);
    }

    pub fn release(&mut self, key: u8) {
        self.set(key, false);
    }

    pub fn set(&mut self, key: u8, pressed: bool) {
        self.keys[key as usize & 0xF] = pressed;
    }

    pub fn release_all(&mut self) {
        self.keys = [false; KEY_COUNT];
    }

    /// Highest-numbered key currently held, if any.
    pub fn last_pressed(&self) -> Option<u8> {
        self.keys.iter().rposition(|k| *k).map(|k| k as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut keypad = Keypad::new();
        keypad.press(0xA);
        assert!(keypad.is_pressed(0xA));
        assert!(!keypad.is_pressed(0xB));
        keypad.release(0xA);
        assert!(!keypad.is_pressed(0xA));
    }

    #[test]
    fn last_pressed_prefers_highest_key() {
        let mut keypad = Keypad::new();
        assert_eq!(keypad.last_pressed(), None);
        keypad.press(0x2);
        keypad.press(0x9);
        assert_eq!(keypad.last_pressed(), Some(0x9));
        keypad.release_all();
        assert_eq!(keypad.last_pressed(), None);
    }

    #[test]
    fn out_of_range_key_folds_to_nibble() {
        let mut keypad = Keypad::new();
        keypad.press(0x13);
        assert!(keypad.is_pressed(0x3));
    }
}
