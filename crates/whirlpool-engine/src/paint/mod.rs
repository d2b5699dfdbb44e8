//! Paint model shared by the demo and renderers.
//!
//! Scope: color representation (linear premultiplied alpha) and conversion to
//! clear values for the active surface format.

pub mod color;

pub use color::Color;
