// Shader program - The fixed textured-quad program and its binding slots
//
// One WGSL module holds both stages. The four slots the presenter relies on
// (position and texcoord attributes, projection uniform, texture unit) are
// constants; the WGSL source is generated from them, so the pipeline layout
// and the shader can never disagree. wgpu validates the module inside an
// error scope and a program is either complete or rejected.

use super::backend::RenderError;
use super::format::TEXTURE_BYTES_PER_PIXEL;
use log::{debug, error};

/// Unit quad corners, top-left, top-right, bottom-right, bottom-left
pub const QUAD_VERTICES: [[f32; 2]; 4] = [[-0.5, -0.5], [0.5, -0.5], [0.5, 0.5], [-0.5, 0.5]];

/// Two triangles covering the quad
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Binding slots of the quad program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSlots {
    /// Vertex attribute location of the quad position
    pub position: u32,
    /// Vertex attribute location of the texture coordinate
    pub texcoord: u32,
    /// Bind group slot of the projection matrix uniform
    pub projection: u32,
    /// Bind group slot of the frame texture
    pub texture: u32,
    /// Bind group slot of the sampler paired with the texture unit
    pub sampler: u32,
}

impl ShaderSlots {
    /// Slots used by the quad program
    pub const QUAD: Self = Self {
        position: 0,
        texcoord: 1,
        projection: 0,
        texture: 1,
        sampler: 2,
    };

    /// WGSL source of the quad program with these slots
    pub fn wgsl(&self) -> String {
        format!(
            r#"
@group(0) @binding({projection}) var<uniform> projection: mat4x4<f32>;
@group(0) @binding({texture}) var frame_texture: texture_2d<f32>;
@group(0) @binding({sampler}) var frame_sampler: sampler;

struct VertexInput {{
    @location({position}) position: vec2<f32>,
    @location({texcoord}) texcoord: vec2<f32>,
}};

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {{
    var out: VertexOutput;
    out.clip_position = projection * vec4<f32>(in.position, 0.0, 1.0);
    out.uv = in.texcoord;
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let texel = textureSample(frame_texture, frame_sampler, in.uv);
    return vec4<f32>(texel.rgb, 1.0);
}}
"#,
            projection = self.projection,
            texture = self.texture,
            sampler = self.sampler,
            position = self.position,
            texcoord = self.texcoord,
        )
    }

    /// Whether the slots can describe a valid program
    ///
    /// Attribute locations and bind group slots must each be distinct.
    pub fn is_consistent(&self) -> bool {
        self.position != self.texcoord
            && self.projection != self.texture
            && self.projection != self.sampler
            && self.texture != self.sampler
    }
}

/// Compiled quad program: pipeline, bind group layout and sampler
pub struct ShaderProgram {
    slots: ShaderSlots,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl ShaderProgram {
    /// Compile the quad program for a surface format
    ///
    /// Creation runs inside a validation error scope so a broken program is
    /// reported instead of surfacing later as an uncaptured error.
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Result<Self, RenderError> {
        let slots = ShaderSlots::QUAD;
        if !slots.is_consistent() {
            return Err(RenderError::ShaderProgram(format!(
                "conflicting binding slots {:?}",
                slots
            )));
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("retro-host quad shader"),
            source: wgpu::ShaderSource::Wgsl(slots.wgsl().into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("retro-host quad bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: slots.projection,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: slots.texture,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: slots.sampler,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("retro-host quad pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: slots.position,
                }],
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: slots.texcoord,
                }],
            },
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("retro-host quad pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Pixel-exact output: nearest filtering, no mipmaps
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("retro-host nearest sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            error!("Quad shader program rejected: {}", err);
            return Err(RenderError::ShaderProgram(err.to_string()));
        }

        debug!(
            "Quad shader ready ({:?}, {} bytes per texel)",
            slots, TEXTURE_BYTES_PER_PIXEL
        );

        Ok(Self {
            slots,
            pipeline,
            bind_group_layout,
            sampler,
        })
    }

    pub fn slots(&self) -> ShaderSlots {
        self.slots
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// Bind group for a texture view and projection buffer
    pub fn bind_group(
        &self,
        device: &wgpu::Device,
        projection: &wgpu::Buffer,
        view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("retro-host quad bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: self.slots.projection,
                    resource: projection.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: self.slots.texture,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: self.slots.sampler,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}
