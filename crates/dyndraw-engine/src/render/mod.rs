//! GPU rendering subsystem.
//!
//! The frame renderer owns its GPU resources (buffers, pipeline, depth target)
//! and records into whatever `RenderTarget` it is handed: the window surface
//! through `core::FrameCtx`, or an `OffscreenTarget` for capture and tests.

mod buffer;
mod ctx;
mod frame_renderer;
mod offscreen;
mod readback;
pub mod shader;

pub use buffer::{IndexBuffer, VertexBuffer};
pub use ctx::{RenderCtx, RenderTarget};
pub use frame_renderer::{FrameRenderer, FrameRendererDesc, Teardown};
pub use offscreen::OffscreenTarget;
pub use shader::{ShaderError, ShaderStage};
