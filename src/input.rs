// Input module - Joypad state reported to the core
//
// Keyboard keys are projected through an ordered binding table and OR-ed
// with gamepad buttons into one logical joypad. The core reads it through
// the input-state callback after the host has polled.

pub mod config;
pub mod gamepad;
pub mod keyboard;

pub use config::{InputConfig, KeyboardMappingConfig};
pub use gamepad::GamepadSource;
pub use keyboard::{InputBindingTable, KeyboardState};

use crate::libretro::RETRO_DEVICE_ID_JOYPAD_R3;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Number of logical joypad buttons
pub const JOYPAD_BUTTONS: usize = RETRO_DEVICE_ID_JOYPAD_R3 as usize + 1;

/// Logical joypad button states, indexed by button id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoypadState {
    buttons: [bool; JOYPAD_BUTTONS],
}

impl JoypadState {
    /// All buttons released
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a button; ids outside the joypad read as released
    pub fn pressed(&self, id: u32) -> bool {
        self.buttons.get(id as usize).copied().unwrap_or(false)
    }

    /// Set a button; ids outside the joypad are ignored
    pub fn set(&mut self, id: u32, pressed: bool) {
        if let Some(button) = self.buttons.get_mut(id as usize) {
            *button = pressed;
        }
    }

    /// Combine two states: a button is pressed if either reports it
    pub fn merge(&self, other: &JoypadState) -> JoypadState {
        let mut merged = *self;
        for (button, &other) in merged.buttons.iter_mut().zip(other.buttons.iter()) {
            *button |= other;
        }
        merged
    }
}

/// Everything the host polls for the core: keyboard, bindings, gamepads
pub struct InputSource {
    keyboard: KeyboardState,
    bindings: InputBindingTable,
    gamepad: Option<GamepadSource>,
    quit_key: KeyCode,
    joypad: JoypadState,
}

impl InputSource {
    /// Create an input source without gamepad support
    pub fn new(bindings: InputBindingTable, quit_key: KeyCode) -> Self {
        Self {
            keyboard: KeyboardState::new(),
            bindings,
            gamepad: None,
            quit_key,
            joypad: JoypadState::new(),
        }
    }

    /// Also read gamepads through gilrs
    pub fn with_gamepads(mut self) -> Self {
        self.gamepad = GamepadSource::new();
        self
    }

    /// Handle a key press event
    pub fn handle_key_press(&mut self, physical_key: PhysicalKey) {
        self.keyboard.handle_key_press(physical_key);
    }

    /// Handle a key release event
    pub fn handle_key_release(&mut self, physical_key: PhysicalKey) {
        self.keyboard.handle_key_release(physical_key);
    }

    /// Take a snapshot of all devices
    ///
    /// # Returns
    /// `true` if the quit key is held
    pub fn poll(&mut self) -> bool {
        let keyboard = self.bindings.project(&self.keyboard);
        self.joypad = match self.gamepad.as_mut() {
            Some(gamepad) => keyboard.merge(&gamepad.poll()),
            None => keyboard,
        };
        self.keyboard.is_pressed(self.quit_key)
    }

    /// Joypad state from the last poll
    pub fn joypad(&self) -> &JoypadState {
        &self.joypad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libretro::{RETRO_DEVICE_ID_JOYPAD_A, RETRO_DEVICE_ID_JOYPAD_START};

    #[test]
    fn test_joypad_initialization() {
        let joypad = JoypadState::new();
        for id in 0..JOYPAD_BUTTONS as u32 {
            assert!(!joypad.pressed(id));
        }
        assert!(!joypad.pressed(99));
    }

    #[test]
    fn test_merge_is_or() {
        let mut a = JoypadState::new();
        let mut b = JoypadState::new();
        a.set(RETRO_DEVICE_ID_JOYPAD_A, true);
        b.set(RETRO_DEVICE_ID_JOYPAD_START, true);

        let merged = a.merge(&b);
        assert!(merged.pressed(RETRO_DEVICE_ID_JOYPAD_A));
        assert!(merged.pressed(RETRO_DEVICE_ID_JOYPAD_START));
    }

    #[test]
    fn test_poll_reports_quit_key() {
        let mut input = InputSource::new(InputBindingTable::default(), KeyCode::Escape);
        input.handle_key_press(PhysicalKey::Code(KeyCode::KeyX));
        assert!(!input.poll());
        assert!(input.joypad().pressed(RETRO_DEVICE_ID_JOYPAD_A));

        input.handle_key_press(PhysicalKey::Code(KeyCode::Escape));
        assert!(input.poll());

        input.handle_key_release(PhysicalKey::Code(KeyCode::KeyX));
        input.poll();
        assert!(!input.joypad().pressed(RETRO_DEVICE_ID_JOYPAD_A));
    }
}
