//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain) for a window
//! - creating a surface-less device for offscreen rendering
//! - acquiring frames and providing encoders/views for rendering

mod gpu;
mod headless;
mod init;
mod surface;

pub use gpu::{Gpu, SurfaceFrame};
pub use headless::HeadlessGpu;
pub use init::{parse_backends, GpuInit};
pub use surface::SurfaceErrorAction;
