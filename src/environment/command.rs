// Environment commands - Typed view of `(cmd, data)` environment calls
//
// The core passes an integer command and an untyped payload. Decoding turns
// that pair into a command whose payload is a borrow that lives exactly as
// long as the environment call.

use crate::libretro::*;
use std::os::raw::{c_char, c_uint, c_void};

/// One environment call from the core
#[derive(Debug)]
pub enum EnvCommand<'a> {
    /// Query duplicate-frame support
    GetCanDupe(&'a mut bool),
    /// Ask the host to stop
    Shutdown,
    /// Query the system (BIOS) directory
    GetSystemDirectory(&'a mut *const c_char),
    /// Declare the framebuffer pixel format (raw value, may be unknown)
    SetPixelFormat(c_uint),
    /// Request a hardware rendering context
    SetHwRender(retro_hw_render_callback),
    /// Query whether core options changed
    GetVariableUpdate(&'a mut bool),
    /// Register the frame-pacing callback
    SetFrameTimeCallback(retro_frame_time_callback),
    /// Register the audio-pull callback pair
    SetAudioCallback(retro_audio_callback),
    /// Query the log interface
    GetLogInterface,
    /// Query the save directory
    GetSaveDirectory(&'a mut *const c_char),
    /// Replace timing and geometry
    SetSystemAvInfo(retro_system_av_info),
    /// Replace base geometry and aspect
    SetGeometry(retro_game_geometry),
    /// Known command sent without a payload
    MissingPayload(c_uint),
    /// Any other command
    Unknown(c_uint),
}

impl<'a> EnvCommand<'a> {
    /// Decode a raw environment call
    ///
    /// # Safety
    /// `data` must be null or point to the payload type the libretro ABI
    /// defines for `cmd`, valid for reads and writes for `'a`.
    pub unsafe fn decode(cmd: c_uint, data: *mut c_void) -> Self {
        let needs_payload = !matches!(
            cmd,
            RETRO_ENVIRONMENT_SHUTDOWN | RETRO_ENVIRONMENT_GET_LOG_INTERFACE
        );
        if data.is_null() && needs_payload && is_known(cmd) {
            return EnvCommand::MissingPayload(cmd);
        }

        match cmd {
            RETRO_ENVIRONMENT_GET_CAN_DUPE => EnvCommand::GetCanDupe(&mut *(data as *mut bool)),
            RETRO_ENVIRONMENT_SHUTDOWN => EnvCommand::Shutdown,
            RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY => {
                EnvCommand::GetSystemDirectory(&mut *(data as *mut *const c_char))
            }
            RETRO_ENVIRONMENT_SET_PIXEL_FORMAT => {
                EnvCommand::SetPixelFormat(*(data as *const c_uint))
            }
            RETRO_ENVIRONMENT_SET_HW_RENDER => {
                EnvCommand::SetHwRender(*(data as *const retro_hw_render_callback))
            }
            RETRO_ENVIRONMENT_GET_VARIABLE_UPDATE => {
                EnvCommand::GetVariableUpdate(&mut *(data as *mut bool))
            }
            RETRO_ENVIRONMENT_SET_FRAME_TIME_CALLBACK => {
                EnvCommand::SetFrameTimeCallback(*(data as *const retro_frame_time_callback))
            }
            RETRO_ENVIRONMENT_SET_AUDIO_CALLBACK => {
                EnvCommand::SetAudioCallback(*(data as *const retro_audio_callback))
            }
            RETRO_ENVIRONMENT_GET_LOG_INTERFACE => EnvCommand::GetLogInterface,
            RETRO_ENVIRONMENT_GET_SAVE_DIRECTORY => {
                EnvCommand::GetSaveDirectory(&mut *(data as *mut *const c_char))
            }
            RETRO_ENVIRONMENT_SET_SYSTEM_AV_INFO => {
                EnvCommand::SetSystemAvInfo(*(data as *const retro_system_av_info))
            }
            RETRO_ENVIRONMENT_SET_GEOMETRY => {
                EnvCommand::SetGeometry(*(data as *const retro_game_geometry))
            }
            other => EnvCommand::Unknown(other),
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            EnvCommand::GetCanDupe(_) => "GET_CAN_DUPE",
            EnvCommand::Shutdown => "SHUTDOWN",
            EnvCommand::GetSystemDirectory(_) => "GET_SYSTEM_DIRECTORY",
            EnvCommand::SetPixelFormat(_) => "SET_PIXEL_FORMAT",
            EnvCommand::SetHwRender(_) => "SET_HW_RENDER",
            EnvCommand::GetVariableUpdate(_) => "GET_VARIABLE_UPDATE",
            EnvCommand::SetFrameTimeCallback(_) => "SET_FRAME_TIME_CALLBACK",
            EnvCommand::SetAudioCallback(_) => "SET_AUDIO_CALLBACK",
            EnvCommand::GetLogInterface => "GET_LOG_INTERFACE",
            EnvCommand::GetSaveDirectory(_) => "GET_SAVE_DIRECTORY",
            EnvCommand::SetSystemAvInfo(_) => "SET_SYSTEM_AV_INFO",
            EnvCommand::SetGeometry(_) => "SET_GEOMETRY",
            EnvCommand::MissingPayload(_) => "MISSING_PAYLOAD",
            EnvCommand::Unknown(_) => "UNKNOWN",
        }
    }
}

fn is_known(cmd: c_uint) -> bool {
    matches!(
        cmd,
        RETRO_ENVIRONMENT_GET_CAN_DUPE
            | RETRO_ENVIRONMENT_SHUTDOWN
            | RETRO_ENVIRONMENT_GET_SYSTEM_DIRECTORY
            | RETRO_ENVIRONMENT_SET_PIXEL_FORMAT
            | RETRO_ENVIRONMENT_SET_HW_RENDER
            | RETRO_ENVIRONMENT_GET_VARIABLE_UPDATE
            | RETRO_ENVIRONMENT_SET_FRAME_TIME_CALLBACK
            | RETRO_ENVIRONMENT_SET_AUDIO_CALLBACK
            | RETRO_ENVIRONMENT_GET_LOG_INTERFACE
            | RETRO_ENVIRONMENT_GET_SAVE_DIRECTORY
            | RETRO_ENVIRONMENT_SET_SYSTEM_AV_INFO
            | RETRO_ENVIRONMENT_SET_GEOMETRY
    )
}
