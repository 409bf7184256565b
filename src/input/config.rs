// Input configuration module
//
// Keyboard bindings as key-name strings, read from the `[input]` section of
// the host configuration.

use super::InputBindingTable;
use crate::libretro::*;
use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

/// Serializable keyboard button mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardMappingConfig {
    /// Key for A button (as string, e.g., "KeyX")
    pub a: String,
    /// Key for B button
    pub b: String,
    /// Key for X button
    pub x: String,
    /// Key for Y button
    pub y: String,
    /// Key for L shoulder
    pub l: String,
    /// Key for R shoulder
    pub r: String,
    /// Key for Select button
    pub select: String,
    /// Key for Start button
    pub start: String,
    /// Key for Up on D-pad
    pub up: String,
    /// Key for Down on D-pad
    pub down: String,
    /// Key for Left on D-pad
    pub left: String,
    /// Key for Right on D-pad
    pub right: String,
}

impl Default for KeyboardMappingConfig {
    fn default() -> Self {
        Self {
            a: "KeyX".to_string(),
            b: "KeyZ".to_string(),
            x: "KeyS".to_string(),
            y: "KeyA".to_string(),
            l: "KeyQ".to_string(),
            r: "KeyW".to_string(),
            select: "Backspace".to_string(),
            start: "Enter".to_string(),
            up: "ArrowUp".to_string(),
            down: "ArrowDown".to_string(),
            left: "ArrowLeft".to_string(),
            right: "ArrowRight".to_string(),
        }
    }
}

impl KeyboardMappingConfig {
    /// Convert to the runtime binding table
    ///
    /// # Returns
    /// Result containing the table or an error message naming the bad key
    pub fn to_binding_table(&self) -> Result<InputBindingTable, String> {
        Ok(InputBindingTable::new(vec![
            (string_to_keycode(&self.a)?, RETRO_DEVICE_ID_JOYPAD_A),
            (string_to_keycode(&self.b)?, RETRO_DEVICE_ID_JOYPAD_B),
            (string_to_keycode(&self.y)?, RETRO_DEVICE_ID_JOYPAD_Y),
            (string_to_keycode(&self.x)?, RETRO_DEVICE_ID_JOYPAD_X),
            (string_to_keycode(&self.up)?, RETRO_DEVICE_ID_JOYPAD_UP),
            (string_to_keycode(&self.down)?, RETRO_DEVICE_ID_JOYPAD_DOWN),
            (string_to_keycode(&self.left)?, RETRO_DEVICE_ID_JOYPAD_LEFT),
            (string_to_keycode(&self.right)?, RETRO_DEVICE_ID_JOYPAD_RIGHT),
            (string_to_keycode(&self.start)?, RETRO_DEVICE_ID_JOYPAD_START),
            (string_to_keycode(&self.select)?, RETRO_DEVICE_ID_JOYPAD_SELECT),
            (string_to_keycode(&self.l)?, RETRO_DEVICE_ID_JOYPAD_L),
            (string_to_keycode(&self.r)?, RETRO_DEVICE_ID_JOYPAD_R),
        ]))
    }
}

/// Complete input configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Keyboard mapping for port 0
    pub keyboard: KeyboardMappingConfig,
    /// Key that stops the host
    pub quit: String,
    /// Read gamepads as well as the keyboard
    pub gamepads: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            keyboard: KeyboardMappingConfig::default(),
            quit: "Escape".to_string(),
            gamepads: true,
        }
    }
}

impl InputConfig {
    /// The quit key as a key code
    pub fn quit_key(&self) -> Result<KeyCode, String> {
        string_to_keycode(&self.quit)
    }
}

/// Convert string to KeyCode
pub fn string_to_keycode(s: &str) -> Result<KeyCode, String> {
    match s {
        "KeyA" => Ok(KeyCode::KeyA),
        "KeyB" => Ok(KeyCode::KeyB),
        "KeyC" => Ok(KeyCode::KeyC),
        "KeyD" => Ok(KeyCode::KeyD),
        "KeyE" => Ok(KeyCode::KeyE),
        "KeyF" => Ok(KeyCode::KeyF),
        "KeyG" => Ok(KeyCode::KeyG),
        "KeyH" => Ok(KeyCode::KeyH),
        "KeyI" => Ok(KeyCode::KeyI),
        "KeyJ" => Ok(KeyCode::KeyJ),
        "KeyK" => Ok(KeyCode::KeyK),
        "KeyL" => Ok(KeyCode::KeyL),
        "KeyM" => Ok(KeyCode::KeyM),
        "KeyN" => Ok(KeyCode::KeyN),
        "KeyO" => Ok(KeyCode::KeyO),
        "KeyP" => Ok(KeyCode::KeyP),
        "KeyQ" => Ok(KeyCode::KeyQ),
        "KeyR" => Ok(KeyCode::KeyR),
        "KeyS" => Ok(KeyCode::KeyS),
        "KeyT" => Ok(KeyCode::KeyT),
        "KeyU" => Ok(KeyCode::KeyU),
        "KeyV" => Ok(KeyCode::KeyV),
        "KeyW" => Ok(KeyCode::KeyW),
        "KeyX" => Ok(KeyCode::KeyX),
        "KeyY" => Ok(KeyCode::KeyY),
        "KeyZ" => Ok(KeyCode::KeyZ),
        "Digit0" => Ok(KeyCode::Digit0),
        "Digit1" => Ok(KeyCode::Digit1),
        "Digit2" => Ok(KeyCode::Digit2),
        "Digit3" => Ok(KeyCode::Digit3),
        "Digit4" => Ok(KeyCode::Digit4),
        "Digit5" => Ok(KeyCode::Digit5),
        "Digit6" => Ok(KeyCode::Digit6),
        "Digit7" => Ok(KeyCode::Digit7),
        "Digit8" => Ok(KeyCode::Digit8),
        "Digit9" => Ok(KeyCode::Digit9),
        "ArrowUp" => Ok(KeyCode::ArrowUp),
        "ArrowDown" => Ok(KeyCode::ArrowDown),
        "ArrowLeft" => Ok(KeyCode::ArrowLeft),
        "ArrowRight" => Ok(KeyCode::ArrowRight),
        "Enter" => Ok(KeyCode::Enter),
        "Space" => Ok(KeyCode::Space),
        "Escape" => Ok(KeyCode::Escape),
        "Backspace" => Ok(KeyCode::Backspace),
        "Tab" => Ok(KeyCode::Tab),
        "ShiftLeft" => Ok(KeyCode::ShiftLeft),
        "ShiftRight" => Ok(KeyCode::ShiftRight),
        "ControlLeft" => Ok(KeyCode::ControlLeft),
        "ControlRight" => Ok(KeyCode::ControlRight),
        "AltLeft" => Ok(KeyCode::AltLeft),
        "AltRight" => Ok(KeyCode::AltRight),
        _ => Err(format!("Unknown key code: {}", s)),
    }
}
