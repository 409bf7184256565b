// Host errors
//
// Everything that stops the host. Negotiation failures never reach this
// type: they are answered with `false` to the core and logged.

use crate::plugin::CoreState;
use crate::video::{RenderError, VideoError};
use std::io;
use std::path::PathBuf;

/// Errors that end a host session
#[derive(Debug)]
pub enum HostError {
    /// The core module could not be opened
    Library {
        path: PathBuf,
        source: libloading::Error,
    },

    /// A mandatory entry point is not exported by the core
    MissingSymbol { name: &'static str },

    /// The core implements a different API version
    ApiVersion { found: u32 },

    /// The content file could not be read
    Content { path: PathBuf, source: io::Error },

    /// The core refused the content
    ContentRejected { path: PathBuf },

    /// Window creation or event loop failure
    Window(String),

    /// Graphics device or surface failure
    Graphics(String),

    /// Audio device failure
    Audio(String),

    /// The core broke the video contract
    Usage(VideoError),

    /// Lifecycle operation called in the wrong state
    InvalidState {
        operation: &'static str,
        state: CoreState,
    },

    /// Configuration could not be used
    Config(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Library { path, source } => {
                write!(f, "Failed to load core {}: {}", path.display(), source)
            }
            HostError::MissingSymbol { name } => {
                write!(f, "Core does not export mandatory symbol {}", name)
            }
            HostError::ApiVersion { found } => write!(
                f,
                "Core API version {} is not supported (expected {})",
                found,
                crate::libretro::RETRO_API_VERSION
            ),
            HostError::Content { path, source } => {
                write!(f, "Failed to read content {}: {}", path.display(), source)
            }
            HostError::ContentRejected { path } => {
                write!(f, "Core rejected content {}", path.display())
            }
            HostError::Window(msg) => write!(f, "Window error: {}", msg),
            HostError::Graphics(msg) => write!(f, "Graphics error: {}", msg),
            HostError::Audio(msg) => write!(f, "Audio error: {}", msg),
            HostError::Usage(e) => write!(f, "Core misused the video interface: {}", e),
            HostError::InvalidState { operation, state } => {
                write!(f, "Cannot {} while core is {}", operation, state)
            }
            HostError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::Library { source, .. } => Some(source),
            HostError::Content { source, .. } => Some(source),
            HostError::Usage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<VideoError> for HostError {
    fn from(e: VideoError) -> Self {
        HostError::Usage(e)
    }
}

impl From<RenderError> for HostError {
    fn from(e: RenderError) -> Self {
        HostError::Graphics(e.to_string())
    }
}
