use crate::device::Gpu;
use crate::input::InputEvent;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// Lifecycle: `on_start` once the window and GPU context exist, then
/// `on_input`/`on_frame` until the run state stops, then `on_exit` exactly
/// once (only if `on_start` succeeded) while the GPU context is still alive.
pub trait App {
    /// Creates GPU resources. An error here is fatal to startup.
    fn on_start(&mut self, gpu: &Gpu<'_>) -> anyhow::Result<()> {
        let _ = gpu;
        Ok(())
    }

    /// Called for translated window/input events.
    fn on_input(&mut self, event: &InputEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Releases GPU resources.
    fn on_exit(&mut self, gpu: &Gpu<'_>) {
        let _ = gpu;
    }
}
