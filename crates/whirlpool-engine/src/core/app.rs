use anyhow::Result;
use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::FrameCtx;
use crate::render::RenderCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// Call order: `init` once, then `on_window_event` / `on_frame` until one of them
/// returns [`AppControl::Exit`] or the window closes, then `on_exit` once.
pub trait App {
    /// Called once the window and GPU exist, before the first frame.
    ///
    /// Returning an error stops the runtime; the error is returned from `Runtime::run`.
    fn init(&mut self, ctx: &RenderCtx<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called for window events.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once when the event loop is shutting down, while the GPU is still alive.
    fn on_exit(&mut self) {}
}
