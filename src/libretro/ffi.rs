// ABI types - Mirrors of the libretro.h structures the host consumes
//
// Every struct here is `#[repr(C)]` and must match the layout a core was
// compiled against. Field names follow the C header so they can be checked
// against it line by line.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_uint, c_void};

/// API version this host implements
pub const RETRO_API_VERSION: c_uint = 1;

/// No device plugged into a port
pub const RETRO_DEVICE_NONE: c_uint = 0;
/// Joypad device class
pub const RETRO_DEVICE_JOYPAD: c_uint = 1;
/// Bits of a device id that name the base class
pub const RETRO_DEVICE_MASK: c_uint = 0xff;

// Joypad button ids
pub const RETRO_DEVICE_ID_JOYPAD_B: c_uint = 0;
pub const RETRO_DEVICE_ID_JOYPAD_Y: c_uint = 1;
pub const RETRO_DEVICE_ID_JOYPAD_SELECT: c_uint = 2;
pub const RETRO_DEVICE_ID_JOYPAD_START: c_uint = 3;
pub const RETRO_DEVICE_ID_JOYPAD_UP: c_uint = 4;
pub const RETRO_DEVICE_ID_JOYPAD_DOWN: c_uint = 5;
pub const RETRO_DEVICE_ID_JOYPAD_LEFT: c_uint = 6;
pub const RETRO_DEVICE_ID_JOYPAD_RIGHT: c_uint = 7;
pub const RETRO_DEVICE_ID_JOYPAD_A: c_uint = 8;
pub const RETRO_DEVICE_ID_JOYPAD_X: c_uint = 9;
pub const RETRO_DEVICE_ID_JOYPAD_L: c_uint = 10;
pub const RETRO_DEVICE_ID_JOYPAD_R: c_uint = 11;
pub const RETRO_DEVICE_ID_JOYPAD_L2: c_uint = 12;
pub const RETRO_DEVICE_ID_JOYPAD_R2: c_uint = 13;
pub const RETRO_DEVICE_ID_JOYPAD_L3: c_uint = 14;
pub const RETRO_DEVICE_ID_JOYPAD_R3: c_uint = 15;

/// Commands flagged experimental carry this bit
pub const RETRO_ENVIRONMENT_EXPERIMENTAL: c_uint = 0x10000;

// Environment commands
pub const RETRO_ENVIRONMENT_GET_CAN_DUPE: c_uint = 3;
pub const RETRO_ENVIRONMENT_SHUTDOWN: c_uint = 7;
pub const RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY: c_uint = 9;
pub const RETRO_ENVIRONMENT_SET_PIXEL_FORMAT: c_uint = 10;
pub const RETRO_ENVIRONMENT_SET_HW_RENDER: c_uint = 14;
pub const RETRO_ENVIRONMENT_GET_VARIABLE_UPDATE: c_uint = 17;
pub const RETRO_ENVIRONMENT_SET_FRAME_TIME_CALLBACK: c_uint = 21;
pub const RETRO_ENVIRONMENT_SET_AUDIO_CALLBACK: c_uint = 22;
pub const RETRO_ENVIRONMENT_GET_LOG_INTERFACE: c_uint = 27;
pub const RETRO_ENVIRONMENT_GET_SAVE_DIRECTORY: c_uint = 31;
pub const RETRO_ENVIRONMENT_SET_SYSTEM_AV_INFO: c_uint = 32;
pub const RETRO_ENVIRONMENT_SET_GEOMETRY: c_uint = 37;

// Pixel formats (enum retro_pixel_format)
pub const RETRO_PIXEL_FORMAT_0RGB1555: c_uint = 0;
pub const RETRO_PIXEL_FORMAT_XRGB8888: c_uint = 1;
pub const RETRO_PIXEL_FORMAT_RGB565: c_uint = 2;

// Hardware context kinds (enum retro_hw_context_type)
pub const RETRO_HW_CONTEXT_NONE: c_uint = 0;
pub const RETRO_HW_CONTEXT_OPENGL: c_uint = 1;
pub const RETRO_HW_CONTEXT_OPENGLES2: c_uint = 2;
pub const RETRO_HW_CONTEXT_OPENGL_CORE: c_uint = 3;
pub const RETRO_HW_CONTEXT_OPENGLES3: c_uint = 4;
pub const RETRO_HW_CONTEXT_OPENGLES_VERSION: c_uint = 5;
pub const RETRO_HW_CONTEXT_VULKAN: c_uint = 6;

/// Frame pointer a hardware-rendering core passes instead of pixel data
pub const RETRO_HW_FRAME_BUFFER_VALID: *const c_void = usize::MAX as *const c_void;

/// Microseconds, signed (retro_usec_t)
pub type retro_usec_t = i64;

// Callbacks the host hands to the core
pub type retro_environment_t = unsafe extern "C" fn(cmd: c_uint, data: *mut c_void) -> bool;
pub type retro_video_refresh_t =
    unsafe extern "C" fn(data: *const c_void, width: c_uint, height: c_uint, pitch: usize);
pub type retro_input_poll_t = unsafe extern "C" fn();
pub type retro_input_state_t =
    unsafe extern "C" fn(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16;
pub type retro_audio_sample_t = unsafe extern "C" fn(left: i16, right: i16);
pub type retro_audio_sample_batch_t =
    unsafe extern "C" fn(data: *const i16, frames: usize) -> usize;

// Callbacks the core hands to the host
pub type retro_frame_time_callback_t = unsafe extern "C" fn(usec: retro_usec_t);
pub type retro_audio_callback_t = unsafe extern "C" fn();
pub type retro_audio_set_state_callback_t = unsafe extern "C" fn(enabled: bool);
pub type retro_hw_context_reset_t = unsafe extern "C" fn();
pub type retro_hw_get_current_framebuffer_t = unsafe extern "C" fn() -> usize;
pub type retro_proc_address_t = Option<unsafe extern "C" fn()>;
pub type retro_hw_get_proc_address_t =
    unsafe extern "C" fn(sym: *const c_char) -> retro_proc_address_t;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_system_info {
    pub library_name: *const c_char,
    pub library_version: *const c_char,
    pub valid_extensions: *const c_char,
    pub need_fullpath: bool,
    pub block_extract: bool,
}

impl Default for retro_system_info {
    fn default() -> Self {
        Self {
            library_name: std::ptr::null(),
            library_version: std::ptr::null(),
            valid_extensions: std::ptr::null(),
            need_fullpath: false,
            block_extract: false,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct retro_game_geometry {
    pub base_width: c_uint,
    pub base_height: c_uint,
    pub max_width: c_uint,
    pub max_height: c_uint,
    pub aspect_ratio: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct retro_system_timing {
    pub fps: f64,
    pub sample_rate: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct retro_system_av_info {
    pub geometry: retro_game_geometry,
    pub timing: retro_system_timing,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_game_info {
    pub path: *const c_char,
    pub data: *const c_void,
    pub size: usize,
    pub meta: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_frame_time_callback {
    pub callback: Option<retro_frame_time_callback_t>,
    pub reference: retro_usec_t,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_audio_callback {
    pub callback: Option<retro_audio_callback_t>,
    pub set_state: Option<retro_audio_set_state_callback_t>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct retro_hw_render_callback {
    pub context_type: c_uint,
    pub context_reset: Option<retro_hw_context_reset_t>,
    pub get_current_framebuffer: Option<retro_hw_get_current_framebuffer_t>,
    pub get_proc_address: Option<retro_hw_get_proc_address_t>,
    pub depth: bool,
    pub stencil: bool,
    pub bottom_left_origin: bool,
    pub version_major: c_uint,
    pub version_minor: c_uint,
    pub cache_context: bool,
    pub context_destroy: Option<retro_hw_context_reset_t>,
    pub debug_context: bool,
}

impl Default for retro_hw_render_callback {
    fn default() -> Self {
        Self {
            context_type: RETRO_HW_CONTEXT_NONE,
            context_reset: None,
            get_current_framebuffer: None,
            get_proc_address: None,
            depth: false,
            stencil: false,
            bottom_left_origin: false,
            version_major: 0,
            version_minor: 0,
            cache_context: false,
            context_destroy: None,
            debug_context: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    #[test]
    fn test_geometry_layout() {
        // Four unsigned ints and a float, no padding
        assert_eq!(size_of::<retro_game_geometry>(), 20);
        assert_eq!(size_of::<retro_system_timing>(), 16);
        assert_eq!(align_of::<retro_system_av_info>(), 8);
    }

    #[test]
    fn test_callback_structs_are_pointer_sized_options() {
        assert_eq!(
            size_of::<Option<retro_audio_callback_t>>(),
            size_of::<usize>()
        );
        assert_eq!(size_of::<retro_audio_callback>(), 2 * size_of::<usize>());
    }

    #[test]
    fn test_hw_frame_sentinel() {
        assert_eq!(RETRO_HW_FRAME_BUFFER_VALID as usize, usize::MAX);
    }
}
