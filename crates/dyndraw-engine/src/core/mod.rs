//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop) and
//! the application: the `App` callbacks, the per-frame context, and the run
//! state that decides when the loop ends.

mod app;
mod ctx;
mod run_state;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
pub use run_state::{ExitReason, RunState};
