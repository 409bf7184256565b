// Core API - Capability interface over a core's entry points
//
// One method per mandatory entry point. Implementations are complete by
// construction: a dynamic core resolves every symbol before it exists, and
// in-process cores implement every method.

use crate::libretro::*;
use std::ffi::CStr;
use std::os::raw::c_char;

/// Owned copy of the core's static description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemInfo {
    pub library_name: String,
    pub library_version: String,
    /// Extensions separated by `|`
    pub valid_extensions: String,
    /// The core wants a path instead of content bytes
    pub need_fullpath: bool,
    pub block_extract: bool,
}

impl SystemInfo {
    /// Copy the strings out of a raw description
    ///
    /// # Safety
    /// Every non-null string pointer must reference a NUL-terminated string.
    pub unsafe fn from_raw(raw: &retro_system_info) -> Self {
        Self {
            library_name: owned(raw.library_name),
            library_version: owned(raw.library_version),
            valid_extensions: owned(raw.valid_extensions),
            need_fullpath: raw.need_fullpath,
            block_extract: raw.block_extract,
        }
    }

    /// Name and version, as shown in the window title
    pub fn display_name(&self) -> String {
        match (self.library_name.is_empty(), self.library_version.is_empty()) {
            (true, _) => "unknown core".to_string(),
            (false, true) => self.library_name.clone(),
            (false, false) => format!("{} {}", self.library_name, self.library_version),
        }
    }
}

unsafe fn owned(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// The entry points a core exports
///
/// The setters hand the core the host's callbacks; the core may call them
/// from inside any other entry point, on the calling thread.
pub trait CoreApi {
    fn api_version(&self) -> u32;

    fn set_environment(&self, callback: retro_environment_t);
    fn set_video_refresh(&self, callback: retro_video_refresh_t);
    fn set_input_poll(&self, callback: retro_input_poll_t);
    fn set_input_state(&self, callback: retro_input_state_t);
    fn set_audio_sample(&self, callback: retro_audio_sample_t);
    fn set_audio_sample_batch(&self, callback: retro_audio_sample_batch_t);

    fn init(&self);
    fn deinit(&self);

    fn system_info(&self) -> SystemInfo;
    fn system_av_info(&self) -> retro_system_av_info;

    fn set_controller_port_device(&self, port: u32, device: u32);
    fn reset(&self);

    /// Run one emulation step
    fn run(&self);

    /// Hand over content; `false` means the core rejected it
    fn load_game(&self, game: &retro_game_info) -> bool;
    fn unload_game(&self);
}
