// Gamepad input module
//
// Reads gamepads through gilrs and maps their buttons onto the joypad.
// Every connected pad drives port 0; missing gamepad support is not an error.

use super::JoypadState;
use crate::libretro::*;
use gilrs::{Button as GilrsButton, Event, EventType, Gilrs};
use log::{info, warn};

/// Map a gilrs button onto a joypad button id
///
/// # Default Mappings (Standard Gamepad Layout)
/// - Face buttons by position: South = B, East = A, West = Y, North = X
/// - Shoulders: L / R, triggers: L2 / R2, stick clicks: L3 / R3
/// - Start, Select and the D-pad map to themselves
pub fn joypad_id(button: GilrsButton) -> Option<u32> {
    let id = match button {
        GilrsButton::South => RETRO_DEVICE_ID_JOYPAD_B,
        GilrsButton::East => RETRO_DEVICE_ID_JOYPAD_A,
        GilrsButton::West => RETRO_DEVICE_ID_JOYPAD_Y,
        GilrsButton::North => RETRO_DEVICE_ID_JOYPAD_X,
        GilrsButton::LeftTrigger => RETRO_DEVICE_ID_JOYPAD_L,
        GilrsButton::RightTrigger => RETRO_DEVICE_ID_JOYPAD_R,
        GilrsButton::LeftTrigger2 => RETRO_DEVICE_ID_JOYPAD_L2,
        GilrsButton::RightTrigger2 => RETRO_DEVICE_ID_JOYPAD_R2,
        GilrsButton::LeftThumb => RETRO_DEVICE_ID_JOYPAD_L3,
        GilrsButton::RightThumb => RETRO_DEVICE_ID_JOYPAD_R3,
        GilrsButton::Select => RETRO_DEVICE_ID_JOYPAD_SELECT,
        GilrsButton::Start => RETRO_DEVICE_ID_JOYPAD_START,
        GilrsButton::DPadUp => RETRO_DEVICE_ID_JOYPAD_UP,
        GilrsButton::DPadDown => RETRO_DEVICE_ID_JOYPAD_DOWN,
        GilrsButton::DPadLeft => RETRO_DEVICE_ID_JOYPAD_LEFT,
        GilrsButton::DPadRight => RETRO_DEVICE_ID_JOYPAD_RIGHT,
        _ => return None,
    };
    Some(id)
}

/// Gamepad state for port 0
pub struct GamepadSource {
    /// Gilrs instance for gamepad events
    gilrs: Gilrs,
    /// Current button states
    state: JoypadState,
}

impl GamepadSource {
    /// Initialize gamepad support
    ///
    /// Returns `None` (with a warning) when gilrs cannot start, so the host
    /// keeps running keyboard-only.
    pub fn new() -> Option<Self> {
        let gilrs = match Gilrs::new() {
            Ok(gilrs) => gilrs,
            Err(e) => {
                warn!("Failed to initialize gamepad support: {}", e);
                return None;
            }
        };

        for (id, gamepad) in gilrs.gamepads() {
            if gamepad.is_connected() {
                info!("Gamepad '{}' (ID: {}) connected", gamepad.name(), id);
            }
        }

        Some(Self {
            gilrs,
            state: JoypadState::new(),
        })
    }

    /// Process pending gamepad events and return the resulting state
    pub fn poll(&mut self) -> JoypadState {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::ButtonPressed(button, _) => {
                    if let Some(joypad) = joypad_id(button) {
                        self.state.set(joypad, true);
                    }
                }
                EventType::ButtonReleased(button, _) => {
                    if let Some(joypad) = joypad_id(button) {
                        self.state.set(joypad, false);
                    }
                }
                EventType::Connected => {
                    info!("Gamepad {} connected", id);
                }
                EventType::Disconnected => {
                    info!("Gamepad {} disconnected", id);
                    self.state = JoypadState::new();
                }
                _ => {}
            }
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_buttons_by_position() {
        assert_eq!(joypad_id(GilrsButton::South), Some(RETRO_DEVICE_ID_JOYPAD_B));
        assert_eq!(joypad_id(GilrsButton::East), Some(RETRO_DEVICE_ID_JOYPAD_A));
        assert_eq!(joypad_id(GilrsButton::West), Some(RETRO_DEVICE_ID_JOYPAD_Y));
        assert_eq!(joypad_id(GilrsButton::North), Some(RETRO_DEVICE_ID_JOYPAD_X));
    }

    #[test]
    fn test_unmapped_buttons() {
        assert_eq!(joypad_id(GilrsButton::Mode), None);
        assert_eq!(joypad_id(GilrsButton::Unknown), None);
    }
}
