// Video module - Presentation pipeline for core framebuffers
//
// This module provides:
// - Projection and letterbox math
// - Pixel formats and CPU-side conversion
// - Surface state (backing texture, clip, stride)
// - The quad shader program and the wgpu backend
// - A headless backend for tests and benchmarks
// - The per-frame presenter

pub mod backend;
pub mod format;
pub mod gpu;
pub mod math;
pub mod presenter;
pub mod shader;
pub mod surface;
pub mod texture;

pub use backend::{BackendStats, HeadlessBackend, HeadlessProbe, RenderBackend, RenderError, TextureRegion};
pub use format::{PixelFormat, PixelStorage};
pub use gpu::{GpuInit, WgpuBackend};
pub use math::{letterbox_scale, LetterboxScale, Mat4, ProjectionState, Viewport};
pub use presenter::{Frame, PresentStats, Presenter};
pub use shader::{ShaderProgram, ShaderSlots};
pub use surface::{TextureHandle, UvRect, VideoError, VideoSurfaceState};
pub use texture::TextureStream;
