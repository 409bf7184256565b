// Render backend - The GPU operations the presenter relies on
//
// The presenter decides *what* happens each frame; a backend performs it.
// `WgpuBackend` (gpu.rs) drives a real window surface, `HeadlessBackend`
// keeps everything in memory for tests, benchmarks and headless runs.

use super::math::{Mat4, Viewport, IDENTITY};
use super::surface::{TextureHandle, UvRect};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Non-fatal graphics API failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Surface must be reconfigured (lost or outdated)
    SurfaceLost,
    /// Acquiring the next frame timed out
    Timeout,
    /// The GPU ran out of memory
    OutOfMemory,
    /// Validation error reported by the diagnostic check
    Validation(String),
    /// Shader program failed to compile or link
    ShaderProgram(String),
    /// Operation referenced a texture the backend does not own
    UnknownTexture(TextureHandle),
}

impl RenderError {
    /// Whether the host cannot continue rendering after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, RenderError::OutOfMemory | RenderError::ShaderProgram(_))
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::SurfaceLost => write!(f, "Surface lost"),
            RenderError::Timeout => write!(f, "Timed out acquiring the next frame"),
            RenderError::OutOfMemory => write!(f, "Out of GPU memory"),
            RenderError::Validation(msg) => write!(f, "Validation error: {}", msg),
            RenderError::ShaderProgram(msg) => write!(f, "Shader program unusable: {}", msg),
            RenderError::UnknownTexture(h) => write!(f, "Unknown texture {:?}", h),
        }
    }
}

impl std::error::Error for RenderError {}

/// A block of BGRA8 texels to write at the texture origin
#[derive(Debug, Clone, Copy)]
pub struct TextureRegion<'a> {
    pub width: u32,
    pub height: u32,
    /// Source row stride in bytes (the unpack row length)
    pub bytes_per_row: u32,
    pub data: &'a [u8],
}

/// GPU operations used by the presentation pipeline
pub trait RenderBackend {
    /// Current drawable size in pixels
    fn surface_size(&self) -> (u32, u32);

    /// React to a window resize
    fn resize(&mut self, width: u32, height: u32);

    /// Allocate a BGRA8 texture with nearest filtering and no mipmaps
    fn create_texture(&mut self, width: u32, height: u32) -> Result<TextureHandle, RenderError>;

    /// Release a texture
    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Replace the quad's texture coordinates
    fn upload_texcoords(&mut self, uv: &UvRect);

    /// Replace the projection matrix uniform
    fn upload_projection(&mut self, matrix: &Mat4);

    /// Acquire the render target for a new frame
    fn begin_frame(&mut self) -> Result<(), RenderError>;

    /// Write texels into the top-left corner of `texture`
    fn upload_region(
        &mut self,
        texture: TextureHandle,
        region: &TextureRegion<'_>,
    ) -> Result<(), RenderError>;

    /// Clear, bind the program and texture unit 0, draw the unit quad
    fn draw_quad(&mut self, texture: TextureHandle, viewport: &Viewport) -> Result<(), RenderError>;

    /// Submit and present the frame
    fn end_frame(&mut self) -> Result<(), RenderError>;
}

/// In-memory texture kept by the headless backend
#[derive(Debug, Clone)]
pub struct HeadlessTexture {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<u8>,
}

/// Operation counters recorded by the headless backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub textures_created: u32,
    pub textures_destroyed: u32,
    pub uploads: u32,
    pub texcoord_uploads: u32,
    pub projection_uploads: u32,
    pub frames: u32,
    pub draws: u32,
}

#[derive(Debug)]
struct HeadlessRecord {
    size: (u32, u32),
    textures: HashMap<u64, HeadlessTexture>,
    texcoords: UvRect,
    projection: Mat4,
    viewport: Viewport,
    last_frame: Vec<u8>,
    last_row_bytes: u32,
    stats: BackendStats,
}

/// Render backend without a GPU
///
/// Textures live in memory and every operation is counted. The "rendered
/// output" of a frame is the visible clip of the bound texture. Once the
/// backend is boxed into a presenter, a [`HeadlessProbe`] taken beforehand
/// still sees everything it records.
pub struct HeadlessBackend {
    next_handle: u64,
    in_frame: bool,
    record: Rc<RefCell<HeadlessRecord>>,
}

impl HeadlessBackend {
    /// Create a headless backend with a virtual window of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            next_handle: 1,
            in_frame: false,
            record: Rc::new(RefCell::new(HeadlessRecord {
                size: (width, height),
                textures: HashMap::new(),
                texcoords: UvRect::FULL,
                projection: IDENTITY,
                viewport: Viewport::default(),
                last_frame: Vec::new(),
                last_row_bytes: 0,
                stats: BackendStats::default(),
            })),
        }
    }

    /// Read-only view of what this backend records
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            record: Rc::clone(&self.record),
        }
    }
}

/// Shared read access to a [`HeadlessBackend`]'s recorded state
#[derive(Clone)]
pub struct HeadlessProbe {
    record: Rc<RefCell<HeadlessRecord>>,
}

impl HeadlessProbe {
    pub fn stats(&self) -> BackendStats {
        self.record.borrow().stats
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.record.borrow().size
    }

    pub fn texcoords(&self) -> UvRect {
        self.record.borrow().texcoords
    }

    pub fn projection(&self) -> Mat4 {
        self.record.borrow().projection
    }

    pub fn viewport(&self) -> Viewport {
        self.record.borrow().viewport
    }

    /// Row stride of the last upload, in bytes
    pub fn last_row_bytes(&self) -> u32 {
        self.record.borrow().last_row_bytes
    }

    /// Number of live textures
    pub fn texture_count(&self) -> usize {
        self.record.borrow().textures.len()
    }

    /// Size of a live texture
    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.record
            .borrow()
            .textures
            .get(&texture.0)
            .map(|t| (t.width, t.height))
    }

    /// Texels visible in the last drawn frame, tightly packed BGRA8
    pub fn last_frame(&self) -> Vec<u8> {
        self.record.borrow().last_frame.clone()
    }
}

impl RenderBackend for HeadlessBackend {
    fn surface_size(&self) -> (u32, u32) {
        self.record.borrow().size
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.record.borrow_mut().size = (width, height);
    }

    fn create_texture(&mut self, width: u32, height: u32) -> Result<TextureHandle, RenderError> {
        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;

        let mut record = self.record.borrow_mut();
        record.textures.insert(
            handle.0,
            HeadlessTexture {
                width,
                height,
                texels: vec![0; width as usize * height as usize * 4],
            },
        );
        record.stats.textures_created += 1;
        Ok(handle)
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        let mut record = self.record.borrow_mut();
        if record.textures.remove(&texture.0).is_some() {
            record.stats.textures_destroyed += 1;
        }
    }

    fn upload_texcoords(&mut self, uv: &UvRect) {
        let mut record = self.record.borrow_mut();
        record.texcoords = *uv;
        record.stats.texcoord_uploads += 1;
    }

    fn upload_projection(&mut self, matrix: &Mat4) {
        let mut record = self.record.borrow_mut();
        record.projection = *matrix;
        record.stats.projection_uploads += 1;
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.in_frame = true;
        Ok(())
    }

    fn upload_region(
        &mut self,
        texture: TextureHandle,
        region: &TextureRegion<'_>,
    ) -> Result<(), RenderError> {
        let mut record = self.record.borrow_mut();
        let tex = record
            .textures
            .get_mut(&texture.0)
            .ok_or(RenderError::UnknownTexture(texture))?;

        let row_len = region.width as usize * 4;
        let stride = region.bytes_per_row as usize;
        let tex_stride = tex.width as usize * 4;

        for y in 0..region.height as usize {
            let src = &region.data[y * stride..y * stride + row_len];
            tex.texels[y * tex_stride..y * tex_stride + row_len].copy_from_slice(src);
        }

        record.last_row_bytes = region.bytes_per_row;
        record.stats.uploads += 1;
        Ok(())
    }

    fn draw_quad(&mut self, texture: TextureHandle, viewport: &Viewport) -> Result<(), RenderError> {
        let mut record = self.record.borrow_mut();
        let record = &mut *record;
        let tex = record
            .textures
            .get(&texture.0)
            .ok_or(RenderError::UnknownTexture(texture))?;

        let visible_w = (record.texcoords.u_max * tex.width as f32).round() as usize;
        let visible_h = (record.texcoords.v_max * tex.height as f32).round() as usize;
        let tex_stride = tex.width as usize * 4;

        record.last_frame.clear();
        for y in 0..visible_h {
            record
                .last_frame
                .extend_from_slice(&tex.texels[y * tex_stride..y * tex_stride + visible_w * 4]);
        }

        record.viewport = *viewport;
        record.stats.draws += 1;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        if self.in_frame {
            self.in_frame = false;
            self.record.borrow_mut().stats.frames += 1;
        }
        Ok(())
    }
}
