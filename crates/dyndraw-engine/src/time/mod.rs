//! Time subsystem.
//!
//! - `FrameClock`: one per window, `tick()` once per presented frame
//! - `FixedStep`: turns variable frame deltas into whole simulation ticks

mod fixed_step;
mod frame_clock;

pub use fixed_step::FixedStep;
pub use frame_clock::{FrameClock, FrameTime};
