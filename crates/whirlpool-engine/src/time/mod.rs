//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Intended usage:
//! - one `FrameClock` per render loop
//! - call `tick()` once per presented frame to obtain `FrameTime`
//! - tests drive the clock with `advance(now)` and synthetic instants

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
