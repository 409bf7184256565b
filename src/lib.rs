// retro-host Library
// Frontend for libretro cores: loads a core, negotiates with it and presents
// its video, audio and input through winit, wgpu, cpal and gilrs

// Public modules
pub mod audio;
pub mod config;
pub mod environment;
pub mod error;
pub mod input;
pub mod libretro;
pub mod logging;
pub mod plugin;
pub mod runloop;
pub mod video;

// Re-export main types for convenience
pub use audio::{open_sink, AudioConfig, AudioSink, NullSink, SampleQueue};
pub use config::{HostConfig, CONFIG_FILE};
pub use environment::{EnvCommand, EnvironmentRegistry};
pub use error::HostError;
pub use input::{InputBindingTable, InputConfig, InputSource, JoypadState};
pub use logging::{init_logging, LoggingConfig};
pub use plugin::{AudioOpener, CoreApi, CoreHost, CoreState, DynamicCore, Session, SystemInfo};
pub use runloop::{run_host, FrameLoop, FramePacer, HostEvent, HostLaunch};
pub use video::{
    Frame, HeadlessBackend, PixelFormat, Presenter, RenderBackend, VideoError,
    VideoSurfaceState,
};
