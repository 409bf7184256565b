// Keyboard input module
//
// Tracks which physical keys are held and projects them onto joypad
// buttons through an ordered binding table.

use super::JoypadState;
use crate::libretro::*;
use std::collections::HashSet;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Set of currently held keys
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    pressed_keys: HashSet<KeyCode>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a key press event
    ///
    /// # Arguments
    /// * `physical_key` - The physical key that was pressed
    pub fn handle_key_press(&mut self, physical_key: PhysicalKey) {
        if let PhysicalKey::Code(key_code) = physical_key {
            self.pressed_keys.insert(key_code);
        }
    }

    /// Handle a key release event
    ///
    /// # Arguments
    /// * `physical_key` - The physical key that was released
    pub fn handle_key_release(&mut self, physical_key: PhysicalKey) {
        if let PhysicalKey::Code(key_code) = physical_key {
            self.pressed_keys.remove(&key_code);
        }
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }
}

/// Ordered (key, joypad button id) pairs
///
/// Later pairs win when two keys map to the same button, matching a plain
/// "assign in order" projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBindingTable {
    bindings: Vec<(KeyCode, u32)>,
}

impl InputBindingTable {
    /// Create a table from explicit bindings
    pub fn new(bindings: Vec<(KeyCode, u32)>) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &[(KeyCode, u32)] {
        &self.bindings
    }

    /// Project a keyboard snapshot onto joypad buttons
    pub fn project(&self, keyboard: &KeyboardState) -> JoypadState {
        let mut joypad = JoypadState::new();
        for &(key, id) in &self.bindings {
            joypad.set(id, keyboard.is_pressed(key));
        }
        joypad
    }
}

impl Default for InputBindingTable {
    /// Default layout
    ///
    /// - Arrow keys: D-pad
    /// - X / Z: A / B
    /// - A / S: Y / X
    /// - Enter / Backspace: Start / Select
    /// - Q / W: L / R
    fn default() -> Self {
        Self::new(vec![
            (KeyCode::KeyX, RETRO_DEVICE_ID_JOYPAD_A),
            (KeyCode::KeyZ, RETRO_DEVICE_ID_JOYPAD_B),
            (KeyCode::KeyA, RETRO_DEVICE_ID_JOYPAD_Y),
            (KeyCode::KeyS, RETRO_DEVICE_ID_JOYPAD_X),
            (KeyCode::ArrowUp, RETRO_DEVICE_ID_JOYPAD_UP),
            (KeyCode::ArrowDown, RETRO_DEVICE_ID_JOYPAD_DOWN),
            (KeyCode::ArrowLeft, RETRO_DEVICE_ID_JOYPAD_LEFT),
            (KeyCode::ArrowRight, RETRO_DEVICE_ID_JOYPAD_RIGHT),
            (KeyCode::Enter, RETRO_DEVICE_ID_JOYPAD_START),
            (KeyCode::Backspace, RETRO_DEVICE_ID_JOYPAD_SELECT),
            (KeyCode::KeyQ, RETRO_DEVICE_ID_JOYPAD_L),
            (KeyCode::KeyW, RETRO_DEVICE_ID_JOYPAD_R),
        ])
    }
}
