use anyhow::{Context, Result};

use crate::render::{RenderCtx, RenderTarget};

use super::readback;

/// Fixed-size RGBA8 color texture that can be rendered into and read back.
///
/// Used for deterministic captures: same device, same size, same inputs give
/// the same pixels.
pub struct OffscreenTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "offscreen target has zero size");

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("dyndraw offscreen color"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            texture,
            view,
            width,
            height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Builds a render context sized and formatted for this target.
    pub fn ctx<'a>(&self, device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> RenderCtx<'a> {
        RenderCtx::new(device, queue, Self::FORMAT, self.size())
    }

    /// Records one frame with `draw` and submits it.
    pub fn render<F>(&self, device: &wgpu::Device, queue: &wgpu::Queue, draw: F)
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let ctx = self.ctx(device, queue);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("dyndraw offscreen encoder"),
        });

        {
            let mut target = RenderTarget::new(&mut encoder, &self.view);
            draw(&ctx, &mut target);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Reads the texture back as tightly packed RGBA8 rows, top row first.
    pub fn read_pixels(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<u8>> {
        let unpadded_row = self.width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row = unpadded_row.div_ceil(align) * align;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("dyndraw offscreen staging"),
            size: padded_row as u64 * self.height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("dyndraw offscreen readback"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let padded = readback::map_staging(device, &staging).context("offscreen readback failed")?;

        let mut pixels = Vec::with_capacity((unpadded_row * self.height) as usize);
        for row in padded.chunks_exact(padded_row as usize) {
            pixels.extend_from_slice(&row[..unpadded_row as usize]);
        }
        Ok(pixels)
    }
}

impl Drop for OffscreenTarget {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}
