//! CHIP-8 keypad.
//!
//! Keys:
//!     1 2 3 C
//!     4 5 6 D
//!     7 8 9 E
//!     A 0 B F
//!

use std::fmt;

use crate::core::types::{C8Byte, C8RegIdx};

/// Key count.
pub const KEY_COUNT: usize = 16;

/// An in-flight Fx0A wait: which register gets the result, and the key
/// that has satisfied it, if any.
#[derive(Clone, Debug)]
struct KeyWait {
    register: C8RegIdx,
    satisfied: Option<C8Byte>,
}

/// 16-key hex keypad.
///
/// Receives level-triggered updates from the host (`set_key_down`). A key
/// already held down when an Fx0A wait begins does not satisfy it: only a
/// released-to-pressed transition observed while the wait is active does.
#[derive(Clone)]
pub struct Keypad {
    down: [bool; KEY_COUNT],
    last_pressed: C8Byte,
    wait: Option<KeyWait>,
}

/// Sentinel for "no key".
pub const NO_KEY: C8Byte = 0xFF;

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}

impl Keypad {
    /// Create a new, all-released keypad.
    pub fn new() -> Self {
        Keypad {
            down: [false; KEY_COUNT],
            last_pressed: NO_KEY,
            wait: None,
        }
    }

    /// Record a key-down or key-up event from the host.
    ///
    /// # Panics
    ///
    /// If `key` is not in `0..16`.
    ///
    pub fn set_key_down(&mut self, key: C8RegIdx, down: bool) {
        if key as usize >= KEY_COUNT {
            panic!("key `{}` does not exist", key);
        }

        let edge = down && !self.down[key as usize];
        self.down[key as usize] = down;

        if down {
            self.last_pressed = key;
        }

        if edge {
            if let Some(wait) = &mut self.wait {
                if wait.satisfied.is_none() {
                    wait.satisfied = Some(key);
                }
            }
        }
    }

    /// Whether a key is currently held down.
    pub fn is_down(&self, key: C8RegIdx) -> bool {
        if key as usize >= KEY_COUNT {
            panic!("key `{}` does not exist", key);
        }

        self.down[key as usize]
    }

    /// Lowest-indexed key currently held down, if any.
    pub fn any_pressed(&self) -> Option<C8RegIdx> {
        self.down.iter().position(|&d| d).map(|idx| idx as C8RegIdx)
    }

    /// Begin an Fx0A wait for `register`.
    ///
    /// # Returns
    ///
    /// * `true` if a wait was armed.
    /// * `false` if a wait was already in progress.
    ///
    pub fn begin_wait(&mut self, register: C8RegIdx) -> bool {
        if self.wait.is_some() {
            return false;
        }

        self.wait = Some(KeyWait { register, satisfied: None });
        true
    }

    /// Whether an Fx0A wait is in progress.
    pub fn is_waiting(&self) -> bool {
        self.wait.is_some()
    }

    /// If the in-progress wait has been satisfied by a fresh key press,
    /// consume it and return `(register, key)`.
    pub fn take_satisfied_wait(&mut self) -> Option<(C8RegIdx, C8Byte)> {
        let satisfied = self.wait.as_ref()?.satisfied?;
        let register = self.wait.as_ref()?.register;
        self.wait = None;

        Some((register, satisfied))
    }

    /// Cancel an in-progress wait without completing it.
    pub fn cancel_wait(&mut self) {
        self.wait = None;
    }

    /// Get raw key state.
    pub fn get_data(&self) -> &[bool; KEY_COUNT] {
        &self.down
    }

    /// Last key that transitioned to pressed.
    pub fn get_last_pressed_key(&self) -> C8Byte {
        self.last_pressed
    }

    /// Reset keypad.
    pub fn reset(&mut self) {
        self.down = [false; KEY_COUNT];
        self.last_pressed = NO_KEY;
        self.wait = None;
    }
}

impl fmt::Debug for Keypad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, v) in self.down.iter().enumerate() {
            writeln!(f, "    K{:X}: {}", idx, *v as u8)?;
        }

        writeln!(f, "    LK: {:02X}", self.last_pressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release() {
        let mut kp = Keypad::new();
        kp.set_key_down(0xA, true);
        assert!(kp.is_down(0xA));
        kp.set_key_down(0xA, false);
        assert!(!kp.is_down(0xA));
    }

    #[test]
    fn test_any_pressed_lowest() {
        let mut kp = Keypad::new();
        kp.set_key_down(5, true);
        kp.set_key_down(2, true);
        assert_eq!(kp.any_pressed(), Some(2));
    }

    #[test]
    fn test_wait_ignores_already_held_key() {
        let mut kp = Keypad::new();
        kp.set_key_down(3, true);
        assert!(kp.begin_wait(0));
        assert!(kp.take_satisfied_wait().is_none());
    }

    #[test]
    fn test_wait_satisfied_by_fresh_press() {
        let mut kp = Keypad::new();
        kp.begin_wait(0);
        kp.set_key_down(7, true);
        assert_eq!(kp.take_satisfied_wait(), Some((0, 7)));
        assert!(!kp.is_waiting());
    }

    #[test]
    fn test_wait_satisfied_by_release_then_press() {
        let mut kp = Keypad::new();
        kp.set_key_down(3, true);
        kp.begin_wait(0);
        kp.set_key_down(3, false);
        kp.set_key_down(3, true);
        assert_eq!(kp.take_satisfied_wait(), Some((0, 3)));
    }

    #[test]
    fn test_second_wait_rejected() {
        let mut kp = Keypad::new();
        assert!(kp.begin_wait(0));
        assert!(!kp.begin_wait(1));
    }
}
