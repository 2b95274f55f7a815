//! Typed startup errors.
//!
//! Every variant here is fatal: the runtime records the first one, leaves the
//! event loop and hands it back to the caller of `Runtime::run`.

use thiserror::Error;

use crate::geometry::GeometryError;
use crate::render::ShaderError;

/// Window creation failed.
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("failed to create the event loop")]
    EventLoop(#[source] winit::error::EventLoopError),

    #[error("failed to create window \"{title}\"")]
    Create {
        title: String,
        #[source]
        source: winit::error::OsError,
    },

    #[error("window \"{title}\" has zero size ({width}x{height})")]
    ZeroSize { title: String, width: u32, height: u32 },
}

/// GPU context creation failed for an existing window.
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("failed to create wgpu surface")]
    Surface(#[source] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter for backends {backends:?}")]
    Adapter {
        backends: wgpu::Backends,
        #[source]
        source: wgpu::RequestAdapterError,
    },

    #[error("failed to create wgpu device/queue")]
    Device(#[source] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Frame renderer initialization failed.
#[derive(Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
