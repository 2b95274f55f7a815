//! GPU-backed renderer tests on a headless device.
//!
//! Each test returns early when no adapter is available (CI without a GPU or
//! software rasterizer).

use dyndraw_engine::device::{GpuInit, HeadlessGpu};
use dyndraw_engine::error::InitError;
use dyndraw_engine::geometry::{Geometry, GeometryError, CUBE_INDICES};
use dyndraw_engine::render::{
    FrameRenderer, FrameRendererDesc, OffscreenTarget, ShaderError, ShaderStage, Teardown,
};
use dyndraw_engine::transform::{self, Camera, Spin};

const SIZE: u32 = 64;

fn headless() -> Option<HeadlessGpu> {
    let init = GpuInit::default();
    let fallback = GpuInit {
        force_fallback_adapter: true,
        ..GpuInit::default()
    };

    match HeadlessGpu::new_blocking(init).or_else(|_| HeadlessGpu::new_blocking(fallback)) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping: no GPU adapter available ({err})");
            None
        }
    }
}

fn cube_renderer(gpu: &HeadlessGpu, target: &OffscreenTarget, geometry: &Geometry) -> FrameRenderer {
    let ctx = target.ctx(gpu.device(), gpu.queue());
    match FrameRenderer::new(&ctx, FrameRendererDesc::with_builtin_shaders(geometry)) {
        Ok(renderer) => renderer,
        Err(err) => panic!("builtin program failed: {err}"),
    }
}

fn render_frame(gpu: &HeadlessGpu, target: &OffscreenTarget, renderer: &mut FrameRenderer) -> Vec<u8> {
    renderer.set_transform(gpu.queue(), transform::mvp(&Camera::default(), Spin::default().model()));
    target.render(gpu.device(), gpu.queue(), |ctx, rt| renderer.render(ctx, rt));
    target.read_pixels(gpu.device(), gpu.queue()).unwrap()
}

#[test]
fn uploaded_buffers_read_back_unchanged() {
    let Some(gpu) = headless() else { return };
    let target = OffscreenTarget::new(gpu.device(), SIZE, SIZE).unwrap();
    let geometry = Geometry::cube();
    let renderer = cube_renderer(&gpu, &target, &geometry);

    let vertices = renderer.read_vertices(gpu.device(), gpu.queue()).unwrap();
    assert_eq!(vertices.len(), 24);
    assert_eq!(vertices, geometry.flat_positions());

    let indices = renderer.read_indices(gpu.device(), gpu.queue()).unwrap();
    assert_eq!(indices, CUBE_INDICES.to_vec());
}

#[test]
fn rendering_is_deterministic() {
    let Some(gpu) = headless() else { return };
    let target = OffscreenTarget::new(gpu.device(), SIZE, SIZE).unwrap();
    let geometry = Geometry::cube();
    let mut renderer = cube_renderer(&gpu, &target, &geometry);

    let first = render_frame(&gpu, &target, &mut renderer);
    let second = render_frame(&gpu, &target, &mut renderer);

    assert_eq!(first.len(), (SIZE * SIZE * 4) as usize);
    assert_eq!(first, second);

    // Points never reach the corner, so it holds the clear color.
    let background = &first[..4];
    assert_eq!(background[3], 255);
    let lit = first.chunks_exact(4).filter(|px| *px != background).count();
    assert!(lit > 0, "no point was rasterized");
    assert!(lit <= CUBE_INDICES.len(), "more lit pixels ({lit}) than points");
}

#[test]
fn clear_color_fills_empty_frame() {
    let Some(gpu) = headless() else { return };
    let target = OffscreenTarget::new(gpu.device(), SIZE, SIZE).unwrap();
    let geometry = Geometry::cube();
    let mut renderer = cube_renderer(&gpu, &target, &geometry);
    renderer.set_clear_color(wgpu::Color::WHITE);

    // Everything behind the camera: only the clear is visible.
    let behind = Camera {
        distance: -8.0,
        ..Camera::default()
    };
    renderer.set_transform(gpu.queue(), transform::mvp(&behind, Spin::default().model()));
    target.render(gpu.device(), gpu.queue(), |ctx, rt| renderer.render(ctx, rt));
    let pixels = target.read_pixels(gpu.device(), gpu.queue()).unwrap();

    assert!(pixels.iter().all(|&b| b == 255));
}

#[test]
fn teardown_releases_each_resource_once() {
    let Some(gpu) = headless() else { return };
    let target = OffscreenTarget::new(gpu.device(), SIZE, SIZE).unwrap();
    let geometry = Geometry::cube();

    let unused = cube_renderer(&gpu, &target, &geometry);
    assert_eq!(
        unused.teardown(),
        Teardown {
            buffers: 3,
            textures: 0
        }
    );

    let mut drawn = cube_renderer(&gpu, &target, &geometry);
    render_frame(&gpu, &target, &mut drawn);
    assert_eq!(
        drawn.teardown(),
        Teardown {
            buffers: 3,
            textures: 1
        }
    );
}

#[test]
fn malformed_shader_fails_with_diagnostic() {
    let Some(gpu) = headless() else { return };
    let target = OffscreenTarget::new(gpu.device(), SIZE, SIZE).unwrap();
    let geometry = Geometry::cube();
    let ctx = target.ctx(gpu.device(), gpu.queue());

    let desc = FrameRendererDesc {
        vertex_source: "#version 450\nvoid main() { gl_Position = vec4(undeclared, 1.0); }\n",
        ..FrameRendererDesc::with_builtin_shaders(&geometry)
    };

    match FrameRenderer::new(&ctx, desc) {
        Err(InitError::Shader(ShaderError::Compile { stage, log })) => {
            assert_eq!(stage, ShaderStage::Vertex);
            assert!(!log.trim().is_empty());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("malformed shader was accepted"),
    }
}

const NORMAL_VERT: &str = r#"#version 450 core
layout(location = 0) in vec3 vertex_position;
layout(location = 1) in vec3 normal;
layout(set = 0, binding = 0) uniform Transform { mat4 MVP; };
layout(location = 0) out vec3 position;
void main()
{
    position = vertex_position + normal;
    gl_Position = MVP * vec4(vertex_position, 1.0);
}
"#;

const MVP_FRAG: &str = r#"#version 450 core
layout(location = 0) in vec3 position;
layout(set = 0, binding = 0) uniform Transform { mat4 MVP; };
layout(location = 0) out vec4 out_colour;
void main()
{
    out_colour = clamp(MVP * vec4(position, 1.0), 0.0, 1.0);
}
"#;

#[test]
fn unfed_vertex_attribute_is_a_link_error() {
    let Some(gpu) = headless() else { return };
    let target = OffscreenTarget::new(gpu.device(), SIZE, SIZE).unwrap();
    let geometry = Geometry::cube();
    let ctx = target.ctx(gpu.device(), gpu.queue());

    let desc = FrameRendererDesc {
        vertex_source: NORMAL_VERT,
        ..FrameRendererDesc::with_builtin_shaders(&geometry)
    };

    match FrameRenderer::new(&ctx, desc) {
        Err(InitError::Shader(ShaderError::Link { log })) => assert!(log.contains("location 1"), "{log}"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("vertex input without a buffer was accepted"),
    }
}

#[test]
fn fragment_stage_can_read_the_transform() {
    let Some(gpu) = headless() else { return };
    let target = OffscreenTarget::new(gpu.device(), SIZE, SIZE).unwrap();
    let geometry = Geometry::cube();
    let ctx = target.ctx(gpu.device(), gpu.queue());

    let desc = FrameRendererDesc {
        fragment_source: MVP_FRAG,
        ..FrameRendererDesc::with_builtin_shaders(&geometry)
    };
    let mut renderer = match FrameRenderer::new(&ctx, desc) {
        Ok(renderer) => renderer,
        Err(err) => panic!("fragment use of MVP was rejected: {err}"),
    };

    let first = render_frame(&gpu, &target, &mut renderer);
    let second = render_frame(&gpu, &target, &mut renderer);
    assert_eq!(first, second);
}

#[test]
fn empty_geometry_is_rejected() {
    let Some(gpu) = headless() else { return };
    let target = OffscreenTarget::new(gpu.device(), SIZE, SIZE).unwrap();
    let geometry = Geometry::new(Vec::new(), Vec::new());
    let ctx = target.ctx(gpu.device(), gpu.queue());

    match FrameRenderer::new(&ctx, FrameRendererDesc::with_builtin_shaders(&geometry)) {
        Err(InitError::Geometry(err)) => assert_eq!(err, GeometryError::NoPositions),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("empty geometry was accepted"),
    }
}
