// wgpu backend - Window surface, streaming texture and the quad draw
//
// Owns the wgpu device objects and the shader program. Aspect correction
// lives entirely in the projection uniform; the viewport always covers the
// whole surface.

use super::backend::{RenderBackend, RenderError, TextureRegion};
use super::math::{Mat4, Viewport, IDENTITY};
use super::shader::{ShaderProgram, QUAD_INDICES, QUAD_VERTICES};
use super::surface::{TextureHandle, UvRect};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

/// Initialization parameters for the GPU layer
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Wait for vertical sync when presenting
    pub vsync: bool,
    /// Desired maximum frame latency for the surface
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            vsync: true,
            desired_maximum_frame_latency: 2,
        }
    }
}

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// A frame being recorded
struct GpuFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

/// Render backend drawing into a winit window through wgpu
pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    program: ShaderProgram,
    position_vbo: wgpu::Buffer,
    texcoord_vbo: wgpu::Buffer,
    quad_ibo: wgpu::Buffer,
    projection_ubo: wgpu::Buffer,
    textures: HashMap<u64, GpuTexture>,
    next_handle: u64,
    frame: Option<GpuFrame>,
}

impl WgpuBackend {
    /// Create a backend bound to a window
    ///
    /// Adapter and device acquisition are asynchronous under wgpu; this blocks
    /// on them with pollster.
    pub fn new(window: Arc<Window>, init: GpuInit) -> Result<Self, String> {
        pollster::block_on(Self::new_async(window, init))
    }

    async fn new_async(window: Arc<Window>, init: GpuInit) -> Result<Self, String> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| format!("Failed to create wgpu surface: {}", e))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| format!("Failed to find a suitable GPU adapter: {}", e))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("retro-host device"),
                ..Default::default()
            })
            .await
            .map_err(|e| format!("Failed to create wgpu device: {}", e))?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps).ok_or("No supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if init.vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        let program = ShaderProgram::new(&device, format).map_err(|e| e.to_string())?;

        let position_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("retro-host quad positions"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let texcoord_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("retro-host quad texcoords"),
            contents: bytemuck::cast_slice(&UvRect::FULL.texcoords()),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let quad_ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("retro-host quad indices"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let projection_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("retro-host projection"),
            contents: bytemuck::cast_slice(&IDENTITY),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        info!(
            "GPU ready: {} ({:?}), surface {:?} {}x{}",
            adapter.get_info().name,
            adapter.get_info().backend,
            format,
            config.width,
            config.height
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            program,
            position_vbo,
            texcoord_vbo,
            quad_ibo,
            projection_ubo,
            textures: HashMap::new(),
            next_handle: 1,
            frame: None,
        })
    }

    fn handle_surface_error(&mut self, err: wgpu::SurfaceError) -> RenderError {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                self.surface.configure(&self.device, &self.config);
                RenderError::SurfaceLost
            }
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            wgpu::SurfaceError::Timeout => RenderError::Timeout,
            other => RenderError::Validation(other.to_string()),
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        // wgpu cannot configure a 0x0 surface; keep the old one until restored
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    fn create_texture(&mut self, width: u32, height: u32) -> Result<TextureHandle, RenderError> {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("retro-host frame texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Bgra8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self
            .program
            .bind_group(&self.device, &self.projection_ubo, &view);

        let handle = TextureHandle(self.next_handle);
        self.next_handle += 1;
        self.textures.insert(handle.0, GpuTexture { texture, bind_group });

        debug!("Created {}x{} frame texture {:?}", width, height, handle);
        Ok(handle)
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if let Some(gpu_texture) = self.textures.remove(&texture.0) {
            gpu_texture.texture.destroy();
        }
    }

    fn upload_texcoords(&mut self, uv: &UvRect) {
        self.queue
            .write_buffer(&self.texcoord_vbo, 0, bytemuck::cast_slice(&uv.texcoords()));
    }

    fn upload_projection(&mut self, matrix: &Mat4) {
        self.queue
            .write_buffer(&self.projection_ubo, 0, bytemuck::cast_slice(matrix));
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        #[cfg(feature = "render-diagnostics")]
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => {
                #[cfg(feature = "render-diagnostics")]
                let _ = pollster::block_on(self.device.pop_error_scope());
                return Err(self.handle_surface_error(err));
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("retro-host frame encoder"),
            });

        self.frame = Some(GpuFrame {
            surface_texture,
            view,
            encoder,
        });
        Ok(())
    }

    fn upload_region(
        &mut self,
        texture: TextureHandle,
        region: &TextureRegion<'_>,
    ) -> Result<(), RenderError> {
        let gpu_texture = self
            .textures
            .get(&texture.0)
            .ok_or(RenderError::UnknownTexture(texture))?;

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu_texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            region.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(region.bytes_per_row),
                rows_per_image: Some(region.height),
            },
            wgpu::Extent3d {
                width: region.width,
                height: region.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn draw_quad(&mut self, texture: TextureHandle, viewport: &Viewport) -> Result<(), RenderError> {
        let gpu_texture = self
            .textures
            .get(&texture.0)
            .ok_or(RenderError::UnknownTexture(texture))?;
        let Some(frame) = self.frame.as_mut() else {
            return Ok(());
        };

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("retro-host quad pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        rpass.set_viewport(
            viewport.x as f32,
            viewport.y as f32,
            viewport.width.max(1) as f32,
            viewport.height.max(1) as f32,
            0.0,
            1.0,
        );
        rpass.set_pipeline(self.program.pipeline());
        rpass.set_bind_group(0, &gpu_texture.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.position_vbo.slice(..));
        rpass.set_vertex_buffer(1, self.texcoord_vbo.slice(..));
        rpass.set_index_buffer(self.quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);

        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };

        self.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.surface_texture.present();

        #[cfg(feature = "render-diagnostics")]
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            warn!("Render validation error: {}", err);
            return Err(RenderError::Validation(err.to_string()));
        }

        Ok(())
    }
}

impl Drop for WgpuBackend {
    fn drop(&mut self) {
        if !self.textures.is_empty() {
            warn!("Dropping GPU backend with {} live textures", self.textures.len());
        }
    }
}

/// Prefer a non-sRGB BGRA surface so frame bytes reach the screen unchanged
fn choose_surface_format(caps: &wgpu::SurfaceCapabilities) -> Option<wgpu::TextureFormat> {
    let preferred = [
        wgpu::TextureFormat::Bgra8Unorm,
        wgpu::TextureFormat::Rgba8Unorm,
    ];
    preferred
        .into_iter()
        .find(|f| caps.formats.contains(f))
        .or_else(|| caps.formats.first().copied())
}
