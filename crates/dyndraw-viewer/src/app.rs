use std::path::Path;

use anyhow::{Context, Result};

use dyndraw_engine::core::{App, AppControl, FrameCtx};
use dyndraw_engine::device::Gpu;
use dyndraw_engine::geometry::Geometry;
use dyndraw_engine::render::shader::{POINT_FRAG, POINT_VERT};
use dyndraw_engine::render::{FrameRenderer, FrameRendererDesc};
use dyndraw_engine::time::FixedStep;
use dyndraw_engine::transform::{self, Camera, Spin};

use crate::config::ViewerConfig;

/// The spinning cube: eight points rotated in fixed ticks.
pub struct CubeApp {
    geometry: Geometry,
    vertex_source: String,
    fragment_source: String,
    clear_color: wgpu::Color,
    verify_upload: bool,

    camera: Camera,
    spin: Spin,
    step: FixedStep,

    renderer: Option<FrameRenderer>,
}

impl CubeApp {
    /// Reads any shader files named by `config`; the GPU side is built in `on_start`.
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let vertex_source = load_source(config.shaders.vertex.as_deref(), POINT_VERT)?;
        let fragment_source = load_source(config.shaders.fragment.as_deref(), POINT_FRAG)?;

        Ok(Self {
            geometry: Geometry::cube(),
            vertex_source,
            fragment_source,
            clear_color: config.clear_color(),
            verify_upload: config.verify_upload,
            camera: config.camera(),
            spin: config.spin(),
            step: FixedStep::new(config.tick_period()),
            renderer: None,
        })
    }
}

impl App for CubeApp {
    fn on_start(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let ctx = gpu.render_ctx();
        let renderer = FrameRenderer::new(
            &ctx,
            FrameRendererDesc {
                geometry: &self.geometry,
                vertex_source: &self.vertex_source,
                fragment_source: &self.fragment_source,
                clear_color: self.clear_color,
            },
        )?;

        if self.verify_upload {
            verify_upload(&renderer, gpu, &self.geometry)?;
        }

        self.renderer = Some(renderer);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(renderer) = self.renderer.as_mut() else {
            return AppControl::Exit;
        };

        let tick = self.step.period().as_secs_f32();
        for _ in 0..self.step.advance(ctx.time.dt) {
            self.spin.advance(tick);
        }

        let size = ctx.gpu.size();
        self.camera.set_viewport(size.width, size.height);
        renderer.set_transform(ctx.gpu.queue(), transform::mvp(&self.camera, self.spin.model()));

        ctx.render(|rctx, target| renderer.render(rctx, target))
    }

    fn on_exit(&mut self, _gpu: &Gpu<'_>) {
        if let Some(renderer) = self.renderer.take() {
            let released = renderer.teardown();
            log::debug!(
                "renderer released {} buffers, {} textures after {} ticks",
                released.buffers,
                released.textures,
                self.step.ticks()
            );
        }
    }
}

fn load_source(path: Option<&Path>, builtin: &str) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read shader {}", path.display())),
        None => Ok(builtin.to_string()),
    }
}

/// Reads both buffers back from the GPU and compares them with what was uploaded.
fn verify_upload(renderer: &FrameRenderer, gpu: &Gpu<'_>, geometry: &Geometry) -> Result<()> {
    let vertices = renderer.read_vertices(gpu.device(), gpu.queue())?;
    let indices = renderer.read_indices(gpu.device(), gpu.queue())?;

    log::debug!("vertex buffer: {vertices:?}");
    log::debug!("index buffer: {indices:?}");

    anyhow::ensure!(
        vertices == geometry.flat_positions(),
        "vertex buffer read-back differs from upload"
    );
    anyhow::ensure!(
        indices == geometry.indices,
        "index buffer read-back differs from upload"
    );

    log::info!(
        "upload verified: {} floats, {} indices",
        vertices.len(),
        indices.len()
    );
    Ok(())
}
