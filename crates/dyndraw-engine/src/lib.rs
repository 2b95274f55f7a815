//! Dyndraw engine crate.
//!
//! Window, GPU context and the point-cloud frame renderer used by the viewer.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod error;
pub mod logging;
pub mod geometry;
pub mod transform;
pub mod render;
