// Presenter - Per-frame draw of the core's output
//
// Owns the surface state, the projection and the render backend. Every
// frame goes through the same sequence: begin, clip and UV update, projection
// upload when stale, optional texel upload, quad draw, present.

use super::backend::{RenderBackend, RenderError};
use super::format::PixelFormat;
use super::math::{content_aspect, ProjectionState};
use super::surface::{VideoError, VideoSurfaceState};
use super::texture::TextureStream;
use crate::error::HostError;
use crate::libretro::{retro_game_geometry, retro_system_av_info};
use log::{debug, error, info, warn};

/// One video refresh from the core
#[derive(Debug, Clone, Copy)]
pub enum Frame<'a> {
    /// New pixels in the declared format
    Pixels {
        data: &'a [u8],
        width: u32,
        height: u32,
        pitch: usize,
    },
    /// Null frame: redraw what the texture already holds at the given size
    Dupe { width: u32, height: u32 },
}

/// Counters for what the presenter did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentStats {
    pub frames: u64,
    pub uploads: u64,
    pub dupes: u64,
    pub skipped: u64,
}

/// The presentation pipeline
pub struct Presenter {
    backend: Box<dyn RenderBackend>,
    surface: VideoSurfaceState,
    stream: TextureStream,
    projection: ProjectionState,
    projection_stale: bool,
    uv_stale: bool,
    stats: PresentStats,
}

impl Presenter {
    /// Create a presenter drawing through `backend`
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        Self {
            backend,
            surface: VideoSurfaceState::new(),
            stream: TextureStream::new(),
            projection: ProjectionState::default(),
            projection_stale: true,
            uv_stale: true,
            stats: PresentStats::default(),
        }
    }

    pub fn surface(&self) -> &VideoSurfaceState {
        &self.surface
    }

    pub fn projection(&self) -> &ProjectionState {
        &self.projection
    }

    pub fn stats(&self) -> PresentStats {
        self.stats
    }

    /// Declare the core's pixel format
    ///
    /// Fails once the texture exists; the surface is left untouched then.
    pub fn set_pixel_format(&mut self, format: PixelFormat) -> Result<(), VideoError> {
        self.surface.declare_format(format)?;
        info!("Pixel format set to {}", format);
        Ok(())
    }

    /// Set up the texture for the core's audio/video description
    pub fn configure(&mut self, av: &retro_system_av_info) -> Result<(), HostError> {
        let format = self.surface.resolve_format();
        self.allocate(&av.geometry)?;
        info!(
            "Video configured: {} base {}x{} max {}x{} aspect {:.3} @ {:.2} fps",
            format,
            av.geometry.base_width,
            av.geometry.base_height,
            av.geometry.max_width,
            av.geometry.max_height,
            content_aspect(&av.geometry),
            av.timing.fps
        );
        Ok(())
    }

    /// Change base size and aspect without reallocating
    pub fn set_geometry(&mut self, geometry: &retro_game_geometry) -> Result<(), VideoError> {
        self.surface.update_base_geometry(geometry)?;
        info!(
            "Geometry changed to {}x{} aspect {:.3}",
            geometry.base_width,
            geometry.base_height,
            content_aspect(self.surface.geometry())
        );
        self.uv_stale = true;
        self.projection_stale = true;
        Ok(())
    }

    /// Replace the full audio/video description mid-session
    ///
    /// The texture is reallocated only when the maximum size changes.
    pub fn set_av_info(&mut self, av: &retro_system_av_info) -> Result<(), HostError> {
        let geometry = &av.geometry;
        let backing = (
            geometry.max_width.max(geometry.base_width).max(1),
            geometry.max_height.max(geometry.base_height).max(1),
        );

        if self.surface.texture().is_none() || backing != self.surface.backing_size() {
            self.surface.resolve_format();
            self.allocate(geometry)?;
        } else {
            self.surface.update_base_geometry(geometry)?;
            self.uv_stale = true;
            self.projection_stale = true;
        }

        info!(
            "AV info changed: base {}x{} max {}x{} @ {:.2} fps",
            geometry.base_width,
            geometry.base_height,
            geometry.max_width,
            geometry.max_height,
            av.timing.fps
        );
        Ok(())
    }

    /// React to a window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        self.backend.resize(width, height);
        self.projection_stale = true;
        debug!("Window resized to {}x{}", width, height);
    }

    /// Draw one frame
    ///
    /// Graphics API failures are logged and the frame is dropped; only core
    /// contract violations and fatal device errors are returned.
    pub fn refresh(&mut self, frame: Frame<'_>) -> Result<(), HostError> {
        if self.surface.texture().is_none() {
            let (width, height) = frame_size(&frame);
            warn!(
                "Frame arrived before video was configured, sizing texture to {}x{}",
                width, height
            );
            self.surface.resolve_format();
            self.allocate(&retro_game_geometry {
                base_width: width,
                base_height: height,
                max_width: width,
                max_height: height,
                aspect_ratio: 0.0,
            })?;
        }
        let texture = self.surface.texture().ok_or(VideoError::NoTexture)?;

        if let Err(e) = self.backend.begin_frame() {
            return self.tolerate(e);
        }

        if self.projection_stale {
            let (w, h) = self.backend.surface_size();
            self.projection = ProjectionState::compute(w, h, content_aspect(self.surface.geometry()));
            self.backend.upload_projection(&self.projection.matrix);
            self.projection_stale = false;
            debug!(
                "Projection for {}x{}: sx {:.3} sy {:.3}",
                w, h, self.projection.scale.sx, self.projection.scale.sy
            );
        }

        match frame {
            Frame::Pixels {
                data,
                width,
                height,
                pitch,
            } => {
                if self.surface.set_clip(width, height)? {
                    self.uv_stale = true;
                }

                self.surface.validate_pitch(width, pitch)?;
                if self.surface.set_pitch(pitch) {
                    debug!("Row stride changed to {} bytes", pitch);
                }

                let storage = self.surface.pixel_format().storage();
                let region = self.stream.prepare(storage, data, pitch, width, height)?;
                if let Err(e) = self.backend.upload_region(texture, &region) {
                    return self.tolerate(e);
                }
                self.stats.uploads += 1;
            }
            Frame::Dupe { width, height } => {
                // Zero means the core left the size out
                if width != 0 && height != 0 && self.surface.set_clip(width, height)? {
                    self.uv_stale = true;
                }
                self.stats.dupes += 1;
            }
        }

        if self.uv_stale {
            self.backend.upload_texcoords(&self.surface.uv_rect());
            self.uv_stale = false;
        }

        if let Err(e) = self.backend.draw_quad(texture, &self.projection.viewport) {
            return self.tolerate(e);
        }
        if let Err(e) = self.backend.end_frame() {
            return self.tolerate(e);
        }

        self.stats.frames += 1;
        Ok(())
    }

    /// Release the texture
    pub fn shutdown(&mut self) {
        if let Some(texture) = self.surface.texture() {
            self.backend.destroy_texture(texture);
            self.surface.set_texture(None);
        }
    }

    fn allocate(&mut self, geometry: &retro_game_geometry) -> Result<(), HostError> {
        self.surface.apply_geometry(geometry);
        let (width, height) = self.surface.backing_size();

        if let Some(old) = self.surface.texture() {
            self.backend.destroy_texture(old);
            self.surface.set_texture(None);
        }

        let texture = self.backend.create_texture(width, height)?;
        self.surface.set_texture(Some(texture));
        self.uv_stale = true;
        self.projection_stale = true;

        info!("Allocated {}x{} frame texture", width, height);
        Ok(())
    }

    fn tolerate(&mut self, e: RenderError) -> Result<(), HostError> {
        if e.is_fatal() {
            error!("Fatal render error: {}", e);
            return Err(e.into());
        }
        debug!("Dropped frame: {}", e);
        self.stats.skipped += 1;
        let _ = self.backend.end_frame();
        Ok(())
    }
}

impl Drop for Presenter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn frame_size(frame: &Frame<'_>) -> (u32, u32) {
    match *frame {
        Frame::Pixels { width, height, .. }
        | Frame::Dupe { width, height } => (width.max(1), height.max(1)),
    }
}
