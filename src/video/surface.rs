// Video surface state - Backing texture size, visible clip and pixel layout
//
// The backing size is the largest geometry the core declared and only
// changes through a full texture reallocation. The clip rectangle is the
// part of it the current frame covers and may change every frame.

use super::format::PixelFormat;
use crate::libretro::retro_game_geometry;
use log::warn;

/// Opaque handle to a texture owned by a render backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Errors that indicate a host/core contract violation in the video path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoError {
    /// Pixel format declared after the texture was created
    FormatLocked {
        current: PixelFormat,
        requested: PixelFormat,
    },
    /// Pixel format value outside the known set
    UnknownPixelFormat(u32),
    /// Frame larger than the declared maximum geometry
    ClipExceedsBacking {
        clip: (u32, u32),
        backing: (u32, u32),
    },
    /// Row stride smaller than a row or not a whole number of pixels
    InvalidPitch {
        pitch: usize,
        width: u32,
        bytes_per_pixel: u32,
    },
    /// Frame data shorter than `pitch * height`
    ShortFrame { expected: usize, actual: usize },
    /// Frame delivered before the presenter was configured
    NoTexture,
}

impl std::fmt::Display for VideoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoError::FormatLocked { current, requested } => write!(
                f,
                "Tried to change pixel format from {} to {} after texture creation",
                current, requested
            ),
            VideoError::UnknownPixelFormat(v) => write!(f, "Unknown pixel format {}", v),
            VideoError::ClipExceedsBacking { clip, backing } => write!(
                f,
                "Frame {}x{} exceeds declared maximum {}x{}",
                clip.0, clip.1, backing.0, backing.1
            ),
            VideoError::InvalidPitch {
                pitch,
                width,
                bytes_per_pixel,
            } => write!(
                f,
                "Pitch {} is invalid for width {} at {} bytes per pixel",
                pitch, width, bytes_per_pixel
            ),
            VideoError::ShortFrame { expected, actual } => write!(
                f,
                "Frame data too short: expected {} bytes, got {}",
                expected, actual
            ),
            VideoError::NoTexture => write!(f, "Frame received before video was configured"),
        }
    }
}

impl std::error::Error for VideoError {}

/// Texture coordinates of the visible clip inside the backing texture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub u_min: f32,
    pub v_min: f32,
    pub u_max: f32,
    pub v_max: f32,
}

impl UvRect {
    /// Whole texture
    pub const FULL: Self = Self {
        u_min: 0.0,
        v_min: 0.0,
        u_max: 1.0,
        v_max: 1.0,
    };

    /// Per-vertex coordinates for the quad corners, in quad vertex order
    /// (top-left, top-right, bottom-right, bottom-left)
    pub fn texcoords(&self) -> [[f32; 2]; 4] {
        [
            [self.u_min, self.v_min],
            [self.u_max, self.v_min],
            [self.u_max, self.v_max],
            [self.u_min, self.v_max],
        ]
    }
}

/// The presentation target as negotiated with the core
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoSurfaceState {
    /// Format declared by the core, if any
    declared_format: Option<PixelFormat>,
    /// Streaming texture, once allocated
    texture: Option<TextureHandle>,
    /// Backing store size (max geometry)
    backing: (u32, u32),
    /// Visible content size
    clip: (u32, u32),
    /// Current row stride in bytes
    pitch: usize,
    /// Last geometry the core reported
    geometry: retro_game_geometry,
}

impl VideoSurfaceState {
    /// Create an empty surface with no format, texture or geometry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pixel format declared by the core
    ///
    /// Fails once a texture exists; the state is left unchanged in that case.
    pub fn declare_format(&mut self, format: PixelFormat) -> Result<(), VideoError> {
        if self.texture.is_some() {
            return Err(VideoError::FormatLocked {
                current: self.pixel_format(),
                requested: format,
            });
        }

        self.declared_format = Some(format);
        Ok(())
    }

    /// Format frames are interpreted in (the default when none was declared)
    pub fn pixel_format(&self) -> PixelFormat {
        self.declared_format.unwrap_or_default()
    }

    /// Whether the core declared a format explicitly
    pub fn format_declared(&self) -> bool {
        self.declared_format.is_some()
    }

    /// Lock in the format before allocating a texture, falling back to the default
    pub fn resolve_format(&mut self) -> PixelFormat {
        match self.declared_format {
            Some(format) => format,
            None => {
                let format = PixelFormat::default();
                warn!("Core never declared a pixel format, using {}", format);
                self.declared_format = Some(format);
                format
            }
        }
    }

    /// Apply a geometry: backing = max size, clip = base size
    pub fn apply_geometry(&mut self, geometry: &retro_game_geometry) {
        let backing = (
            geometry.max_width.max(geometry.base_width).max(1),
            geometry.max_height.max(geometry.base_height).max(1),
        );

        self.geometry = *geometry;
        self.backing = backing;
        self.clip = (
            geometry.base_width.clamp(1, backing.0),
            geometry.base_height.clamp(1, backing.1),
        );
        self.pitch = self.clip.0 as usize * self.pixel_format().bytes_per_pixel() as usize;
    }

    /// Update the base size and aspect without touching the backing size
    pub fn update_base_geometry(&mut self, geometry: &retro_game_geometry) -> Result<(), VideoError> {
        if geometry.base_width > self.backing.0 || geometry.base_height > self.backing.1 {
            return Err(VideoError::ClipExceedsBacking {
                clip: (geometry.base_width, geometry.base_height),
                backing: self.backing,
            });
        }

        self.geometry.base_width = geometry.base_width;
        self.geometry.base_height = geometry.base_height;
        self.geometry.aspect_ratio = geometry.aspect_ratio;
        self.clip = (geometry.base_width.max(1), geometry.base_height.max(1));
        Ok(())
    }

    /// Set the visible clip size for the current frame
    ///
    /// # Returns
    /// `Ok(true)` when the size changed and texture coordinates need refreshing
    pub fn set_clip(&mut self, width: u32, height: u32) -> Result<bool, VideoError> {
        if width == 0 || height == 0 || width > self.backing.0 || height > self.backing.1 {
            return Err(VideoError::ClipExceedsBacking {
                clip: (width, height),
                backing: self.backing,
            });
        }

        let changed = self.clip != (width, height);
        self.clip = (width, height);
        Ok(changed)
    }

    /// Validate a row stride for a frame of `width` pixels
    ///
    /// A stride shorter than one row, or one that is not a whole number of
    /// pixels, is a usage error. Larger strides (padded rows) are accepted.
    pub fn validate_pitch(&self, width: u32, pitch: usize) -> Result<(), VideoError> {
        let bpp = self.pixel_format().bytes_per_pixel();
        if pitch < width as usize * bpp as usize || pitch % bpp as usize != 0 {
            return Err(VideoError::InvalidPitch {
                pitch,
                width,
                bytes_per_pixel: bpp,
            });
        }
        Ok(())
    }

    /// Record a new row stride
    ///
    /// # Returns
    /// `true` if it differs from the previous one
    pub fn set_pitch(&mut self, pitch: usize) -> bool {
        let changed = self.pitch != pitch;
        self.pitch = pitch;
        changed
    }

    /// UV rectangle of the clip inside the backing texture
    pub fn uv_rect(&self) -> UvRect {
        if self.backing.0 == 0 || self.backing.1 == 0 {
            return UvRect::FULL;
        }

        UvRect {
            u_min: 0.0,
            v_min: 0.0,
            u_max: self.clip.0 as f32 / self.backing.0 as f32,
            v_max: self.clip.1 as f32 / self.backing.1 as f32,
        }
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub(crate) fn set_texture(&mut self, texture: Option<TextureHandle>) {
        self.texture = texture;
    }

    pub fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    pub fn clip_size(&self) -> (u32, u32) {
        self.clip
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn geometry(&self) -> &retro_game_geometry {
        &self.geometry
    }
}
