use crate::error::ContextError;

use super::init::request_device;
use super::GpuInit;

/// Device/queue pair without a surface.
///
/// Used for offscreen captures and by GPU-backed tests.
pub struct HeadlessGpu {
    _instance: wgpu::Instance,
    _adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl HeadlessGpu {
    pub async fn new(init: GpuInit) -> Result<Self, ContextError> {
        let instance = init.instance();
        let (adapter, device, queue) = request_device(&instance, &init, None).await?;

        Ok(Self {
            _instance: instance,
            _adapter: adapter,
            device,
            queue,
        })
    }

    /// Blocking variant of [`HeadlessGpu::new`].
    pub fn new_blocking(init: GpuInit) -> Result<Self, ContextError> {
        pollster::block_on(Self::new(init))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
