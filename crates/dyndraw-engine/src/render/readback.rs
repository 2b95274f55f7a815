use anyhow::{Context, Result};

/// Copies `size` bytes from `source` into a mappable staging buffer and returns them.
///
/// Blocks on `device.poll` until the map completes. `source` must have
/// `COPY_SRC` usage and `size` must be a multiple of `wgpu::COPY_BUFFER_ALIGNMENT`.
pub(crate) fn read_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: &wgpu::Buffer,
    size: u64,
) -> Result<Vec<u8>> {
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("dyndraw readback staging"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("dyndraw readback encoder"),
    });
    encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    map_staging(device, &staging)
}

/// Maps an already-filled staging buffer and copies its bytes out.
pub(crate) fn map_staging(device: &wgpu::Device, staging: &wgpu::Buffer) -> Result<Vec<u8>> {
    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });

    device
        .poll(wgpu::PollType::wait_indefinitely())
        .context("device poll failed during readback")?;

    rx.recv()
        .context("readback map callback was dropped")?
        .context("failed to map readback buffer")?;

    let bytes = slice.get_mapped_range().to_vec();
    staging.unmap();
    staging.destroy();
    Ok(bytes)
}
