//! Whirlpool engine crate.
//!
//! Platform + GPU runtime pieces used by the demo: window loop, surface,
//! frame clock, drawable list and the textured-sprite renderer.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod render;
pub mod paint;
pub mod scene;
