// Environment module - Negotiation state registered by the core
//
// This module provides:
// - Typed decoding of raw environment calls
// - The registry of callbacks the core handed to the host
// - Host-owned strings returned to the core (directories)
// - The answer to hardware render requests (always declined)
//
// The registry is only written from the environment dispatch, which runs on
// the host thread while the core is inside one of its entry points.

pub mod command;

pub use command::EnvCommand;

use crate::libretro::*;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::ffi::CString;
use std::os::raw::{c_char, c_uint};
use std::path::Path;

/// Frame-pacing callback with its reference interval
#[derive(Debug, Clone, Copy)]
pub struct FrameTimeCallback {
    pub callback: retro_frame_time_callback_t,
    /// Expected frame duration in microseconds
    pub reference: retro_usec_t,
}

/// Audio-pull callback and its enable/disable notifier
#[derive(Debug, Clone, Copy)]
pub struct AudioCallback {
    pub callback: retro_audio_callback_t,
    pub set_state: Option<retro_audio_set_state_callback_t>,
}

/// Why a hardware render request was declined
///
/// Frames are presented through wgpu and the host never owns a GL or Vulkan
/// context the core could draw into, so every request is declined. Cores
/// with a software renderer fall back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwRenderRejection {
    /// A known context kind the host cannot provide
    NoContext(c_uint),
    /// A context kind outside the libretro set
    UnknownContext(c_uint),
}

impl HwRenderRejection {
    /// Classify a requested context kind
    pub fn for_context(kind: c_uint) -> Self {
        match hw_context_name(kind) {
            Some(_) => HwRenderRejection::NoContext(kind),
            None => HwRenderRejection::UnknownContext(kind),
        }
    }
}

impl std::fmt::Display for HwRenderRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HwRenderRejection::NoContext(kind) => write!(
                f,
                "no {} context available, core must render in software",
                hw_context_name(*kind).unwrap_or("unknown")
            ),
            HwRenderRejection::UnknownContext(kind) => {
                write!(f, "unknown hardware context type {}", kind)
            }
        }
    }
}

/// Callbacks and descriptors registered by the core
#[derive(Debug)]
pub struct EnvironmentRegistry {
    frame_time: Option<FrameTimeCallback>,
    audio: Option<AudioCallback>,
    hw_declined: BTreeMap<c_uint, u32>,
    system_directory: CString,
    save_directory: CString,
    unhandled: BTreeMap<c_uint, u32>,
}

impl EnvironmentRegistry {
    /// Create an empty registry answering the given directories
    pub fn new(system_directory: &Path, save_directory: &Path) -> Self {
        Self {
            frame_time: None,
            audio: None,
            hw_declined: BTreeMap::new(),
            system_directory: path_to_cstring(system_directory),
            save_directory: path_to_cstring(save_directory),
            unhandled: BTreeMap::new(),
        }
    }

    /// Store the frame-pacing callback
    ///
    /// A null callback clears an earlier registration.
    pub fn register_frame_time(&mut self, raw: retro_frame_time_callback) {
        self.frame_time = raw.callback.map(|callback| FrameTimeCallback {
            callback,
            reference: raw.reference,
        });
        match self.frame_time {
            Some(cb) => info!("Frame time callback registered, reference {} us", cb.reference),
            None => debug!("Frame time callback cleared"),
        }
    }

    /// Store the audio-pull callback pair
    ///
    /// A null pull callback clears an earlier registration.
    pub fn register_audio(&mut self, raw: retro_audio_callback) {
        self.audio = raw.callback.map(|callback| AudioCallback {
            callback,
            set_state: raw.set_state,
        });
        match self.audio {
            Some(_) => info!("Audio callback registered"),
            None => debug!("Audio callback cleared"),
        }
    }

    /// Answer a hardware render request
    ///
    /// Always declined; the descriptor is left untouched so the core sees no
    /// host entry points. Each requested kind is counted.
    pub fn request_hw_render(&mut self, descriptor: &retro_hw_render_callback) -> HwRenderRejection {
        let kind = descriptor.context_type;
        let rejection = HwRenderRejection::for_context(kind);
        *self.hw_declined.entry(kind).or_insert(0) += 1;
        warn!(
            "Declined hardware render request {}.{}: {}",
            descriptor.version_major, descriptor.version_minor, rejection
        );
        rejection
    }

    /// Count a command the host does not implement
    pub fn record_unhandled(&mut self, cmd: c_uint) {
        let count = self.unhandled.entry(cmd).or_insert(0);
        *count += 1;
        if *count == 1 {
            debug!("Unhandled env #{}", cmd);
        }
    }

    pub fn frame_time(&self) -> Option<FrameTimeCallback> {
        self.frame_time
    }

    pub fn audio(&self) -> Option<AudioCallback> {
        self.audio
    }

    /// Declined hardware context kinds and how often each was requested
    pub fn hw_declined(&self) -> &BTreeMap<c_uint, u32> {
        &self.hw_declined
    }

    /// Pointer valid for the registry's lifetime
    pub fn system_directory(&self) -> *const c_char {
        self.system_directory.as_ptr()
    }

    /// Pointer valid for the registry's lifetime
    pub fn save_directory(&self) -> *const c_char {
        self.save_directory.as_ptr()
    }

    /// Unhandled commands and how often each was seen
    pub fn unhandled(&self) -> &BTreeMap<c_uint, u32> {
        &self.unhandled
    }
}

fn hw_context_name(kind: c_uint) -> Option<&'static str> {
    match kind {
        RETRO_HW_CONTEXT_OPENGL => Some("OpenGL"),
        RETRO_HW_CONTEXT_OPENGLES2 => Some("OpenGL ES 2"),
        RETRO_HW_CONTEXT_OPENGL_CORE => Some("OpenGL core"),
        RETRO_HW_CONTEXT_OPENGLES3 => Some("OpenGL ES 3"),
        RETRO_HW_CONTEXT_OPENGLES_VERSION => Some("OpenGL ES"),
        RETRO_HW_CONTEXT_VULKAN => Some("Vulkan"),
        _ => None,
    }
}

fn path_to_cstring(path: &Path) -> CString {
    match CString::new(path.to_string_lossy().into_owned()) {
        Ok(s) => s,
        Err(_) => {
            warn!("Directory {} contains a NUL byte, using \".\"", path.display());
            CString::from(c".")
        }
    }
}
