use std::borrow::Cow;

use anyhow::Result;
use bytemuck::{Pod, Zeroable};

use crate::error::InitError;
use crate::geometry::Geometry;
use crate::render::{RenderCtx, RenderTarget};

use super::buffer::{IndexBuffer, VertexBuffer};
use super::shader::{self, ShaderError, ENTRY_POINT};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Inputs for [`FrameRenderer::new`].
#[derive(Debug, Clone)]
pub struct FrameRendererDesc<'a> {
    pub geometry: &'a Geometry,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    pub clear_color: wgpu::Color,
}

impl<'a> FrameRendererDesc<'a> {
    /// Built-in point shaders with a dark blue clear color.
    pub fn with_builtin_shaders(geometry: &'a Geometry) -> Self {
        Self {
            geometry,
            vertex_source: shader::POINT_VERT,
            fragment_source: shader::POINT_FRAG,
            clear_color: wgpu::Color {
                r: 0.0,
                g: 0.05,
                b: 0.1,
                a: 1.0,
            },
        }
    }
}

/// What [`FrameRenderer::teardown`] released.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Teardown {
    pub buffers: usize,
    pub textures: usize,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct TransformUniform {
    mvp: [[f32; 4]; 4],
}

struct DepthTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// Draws a point list from a static vertex/index buffer pair.
///
/// Per frame: clear color + depth, bind the program and `MVP` uniform, one
/// indexed point-list draw over every index. Presentation belongs to whoever
/// owns the target.
pub struct FrameRenderer {
    vs_module: wgpu::ShaderModule,
    fs_module: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    pipeline_format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,

    transform_ubo: Option<wgpu::Buffer>,
    vertices: Option<VertexBuffer>,
    indices: Option<IndexBuffer>,
    depth: Option<DepthTarget>,

    clear_color: wgpu::Color,
}

impl FrameRenderer {
    /// Validates geometry, compiles and links the shader pair, and uploads buffers.
    ///
    /// The transform starts as identity.
    pub fn new(ctx: &RenderCtx<'_>, desc: FrameRendererDesc<'_>) -> Result<Self, InitError> {
        desc.geometry.validate()?;
        let program = shader::build_program(desc.vertex_source, desc.fragment_source)?;

        let device = ctx.device;

        // Validation errors raised until `scope.pop()` are reported as a link failure.
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("dyndraw vertex shader"),
            source: wgpu::ShaderSource::Naga(Cow::Owned(program.vertex.module().clone())),
        });
        let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("dyndraw fragment shader"),
            source: wgpu::ShaderSource::Naga(Cow::Owned(program.fragment.module().clone())),
        });

        let visibility = if program.fragment_reads_mvp {
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT
        } else {
            wgpu::ShaderStages::VERTEX
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("dyndraw transform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: program.mvp_binding,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<TransformUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("dyndraw pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &vs_module,
            &fs_module,
            ctx.color_format,
        );

        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(ShaderError::Link {
                log: format!("pipeline creation rejected the program: {err}"),
            }
            .into());
        }

        let identity = TransformUniform {
            mvp: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        };
        let transform_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("dyndraw transform ubo"),
            size: std::mem::size_of::<TransformUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        ctx.queue
            .write_buffer(&transform_ubo, 0, bytemuck::bytes_of(&identity));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("dyndraw transform bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: program.mvp_binding,
                resource: transform_ubo.as_entire_binding(),
            }],
        });

        let vertices = VertexBuffer::new(device, &desc.geometry.positions);
        let indices = IndexBuffer::new(device, &desc.geometry.indices);

        log::debug!(
            "frame renderer ready: {} vertices, {} indices, format {:?}",
            vertices.len(),
            indices.len(),
            ctx.color_format
        );

        Ok(Self {
            vs_module,
            fs_module,
            pipeline_layout,
            pipeline_format: ctx.color_format,
            pipeline,
            bind_group,
            transform_ubo: Some(transform_ubo),
            vertices: Some(vertices),
            indices: Some(indices),
            depth: None,
            clear_color: desc.clear_color,
        })
    }

    /// Writes the `MVP` uniform used by subsequent frames.
    pub fn set_transform(&self, queue: &wgpu::Queue, mvp: [[f32; 4]; 4]) {
        let Some(ubo) = self.transform_ubo.as_ref() else { return };
        queue.write_buffer(ubo, 0, bytemuck::bytes_of(&TransformUniform { mvp }));
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    /// Records one frame into `target`.
    ///
    /// Skips the frame for a zero-sized framebuffer or after teardown.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        if self.vertices.is_none() {
            log::warn!("FrameRenderer::render called after teardown; frame skipped");
            return;
        }

        self.ensure_pipeline(ctx);
        if !self.ensure_depth(ctx) {
            return;
        }

        let Some(vertices) = self.vertices.as_ref() else { return };
        let Some(indices) = self.indices.as_ref() else { return };
        let Some(depth) = self.depth.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("dyndraw frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, vertices.slice());
        rpass.set_index_buffer(indices.slice(), IndexBuffer::FORMAT);
        rpass.draw_indexed(0..indices.len(), 0, 0..1);
    }

    /// Reads the vertex buffer back from the GPU.
    pub fn read_vertices(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<f32>> {
        let Some(vertices) = self.vertices.as_ref() else {
            anyhow::bail!("vertex buffer already released");
        };
        vertices.read_back(device, queue)
    }

    /// Reads the index buffer back from the GPU.
    pub fn read_indices(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<u32>> {
        let Some(indices) = self.indices.as_ref() else {
            anyhow::bail!("index buffer already released");
        };
        indices.read_back(device, queue)
    }

    /// Releases every GPU resource owned by the renderer.
    pub fn teardown(mut self) -> Teardown {
        self.release()
    }

    fn release(&mut self) -> Teardown {
        let mut released = Teardown::default();

        if let Some(vertices) = self.vertices.take() {
            vertices.destroy();
            released.buffers += 1;
        }
        if let Some(indices) = self.indices.take() {
            indices.destroy();
            released.buffers += 1;
        }
        if let Some(ubo) = self.transform_ubo.take() {
            ubo.destroy();
            released.buffers += 1;
        }
        if let Some(depth) = self.depth.take() {
            depth.texture.destroy();
            released.textures += 1;
        }

        released
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == ctx.color_format {
            return;
        }

        log::debug!(
            "target format changed {:?} -> {:?}; rebuilding pipeline",
            self.pipeline_format,
            ctx.color_format
        );
        self.pipeline = create_pipeline(
            ctx.device,
            &self.pipeline_layout,
            &self.vs_module,
            &self.fs_module,
            ctx.color_format,
        );
        self.pipeline_format = ctx.color_format;
    }

    /// Returns `false` when the framebuffer has no area.
    fn ensure_depth(&mut self, ctx: &RenderCtx<'_>) -> bool {
        let (width, height) = ctx.size;
        if width == 0 || height == 0 {
            return false;
        }
        if self.depth.as_ref().is_some_and(|d| d.size == ctx.size) {
            return true;
        }

        if let Some(old) = self.depth.take() {
            old.texture.destroy();
        }

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("dyndraw depth"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        self.depth = Some(DepthTarget {
            texture,
            view,
            size: ctx.size,
        });
        true
    }
}

impl Drop for FrameRenderer {
    fn drop(&mut self) {
        let released = self.release();
        if released != Teardown::default() {
            log::debug!("FrameRenderer dropped without teardown; released {released:?}");
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    vs_module: &wgpu::ShaderModule,
    fs_module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("dyndraw point pipeline"),
        layout: Some(layout),

        vertex: wgpu::VertexState {
            module: vs_module,
            entry_point: Some(ENTRY_POINT),
            compilation_options: Default::default(),
            buffers: &[VertexBuffer::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: fs_module,
            entry_point: Some(ENTRY_POINT),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::PointList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),

        multiview_mask: None,
        cache: None,
    })
}
