use std::ops::Range;

use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::buffers::{COLOR_CHANNELS, FIELDS_PER_INSTANCE};
use crate::grid::GridSize;
use crate::sync::{DirtyRange, dirty_slice};

/// Vertices per instance: one unit quad expanded to two triangles.
pub const VERTICES_PER_INSTANCE: u32 = 6;

const FLOAT_SIZE: u64 = 4;

/// Parameters of the single instanced draw issued per frame.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DrawParams {
    pub vertices: Range<u32>,
    pub instances: Range<u32>,
}

/// The whole grid renders as one call, however many cells are visible.
pub fn draw_params(instance_count: u32) -> DrawParams {
    DrawParams {
        vertices: 0..VERTICES_PER_INSTANCE,
        instances: 0..instance_count,
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    size: [f32; 2],
    _pad: [f32; 2], // 16-byte alignment
}

/// Instanced cell-grid renderer.
///
/// Built once at boot from the engine's freshly viewed buffer contents and
/// fixed for the session: the dynamic stream is refreshed by partial uploads
/// only, the constant stream never changes.
pub struct CellRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    dynamic_vbo: wgpu::Buffer,
    constant_vbo: wgpu::Buffer,
    instances: u32,
}

impl CellRenderer {
    /// Compiles the shader, links the pipeline, and seeds both instance
    /// streams.
    ///
    /// Shader and pipeline creation run inside validation error scopes; a
    /// captured error is fatal to rendering (no draw is ever attempted with
    /// an unlinked pipeline) but not to the process. The caller logs it and
    /// carries on without a renderer.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        grid: GridSize,
        instances: u32,
        dynamic: &[f32],
        colors: &[f32],
    ) -> Result<Self> {
        let error_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ziggurat cell shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/cells.wgsl").into()),
        });
        if let Some(err) = pollster::block_on(error_scope.pop()) {
            anyhow::bail!("cell shader failed to compile: {err}");
        }

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("ziggurat cell bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(
                            std::num::NonZeroU64::new(
                                std::mem::size_of::<ViewportUniform>() as u64
                            )
                            .expect("ViewportUniform has non-zero size by construction"),
                        ),
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ziggurat cell pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let error_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ziggurat cell pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[dynamic_layout(), constant_layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(straight_alpha_blend()),
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
            multiview_mask: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(error_scope.pop()) {
            anyhow::bail!("cell pipeline failed to link: {err}");
        }

        let viewport_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ziggurat cell viewport ubo"),
            contents: bytemuck::bytes_of(&ViewportUniform {
                size: [grid.width as f32, grid.height as f32],
                _pad: [0.0; 2],
            }),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ziggurat cell bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        let dynamic_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ziggurat cell dynamic vbo"),
            contents: bytemuck::cast_slice(dynamic),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let constant_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ziggurat cell constant vbo"),
            contents: bytemuck::cast_slice(colors),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Ok(Self {
            pipeline,
            bind_group,
            dynamic_vbo,
            constant_vbo,
            instances,
        })
    }

    pub fn instance_count(&self) -> u32 {
        self.instances
    }

    /// Re-uploads exactly the dirty instances out of a freshly derived
    /// dynamic view.
    pub fn upload_range(&self, queue: &wgpu::Queue, range: DirtyRange, dynamic: &[f32]) {
        let (offset, slice) = dirty_slice(dynamic, range);
        queue.write_buffer(&self.dynamic_vbo, offset, bytemuck::cast_slice(slice));
    }

    /// Clears the target and draws the entire grid in one instanced call.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let params = draw_params(self.instances);

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ziggurat cell pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.dynamic_vbo.slice(..));
        rpass.set_vertex_buffer(1, self.constant_vbo.slice(..));
        rpass.draw(params.vertices, params.instances);
    }
}

// Locations 0+1: the dynamic stream, advanced once per instance.
const DYNAMIC_ATTRS: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32];

fn dynamic_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: FIELDS_PER_INSTANCE as u64 * FLOAT_SIZE,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &DYNAMIC_ATTRS,
    }
}

// Location 2: the constant color stream, also per instance.
const CONSTANT_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x3];

fn constant_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: COLOR_CHANNELS as u64 * FLOAT_SIZE,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &CONSTANT_ATTRS,
    }
}

/// Non-premultiplied straight-alpha blending on both components.
fn straight_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}
