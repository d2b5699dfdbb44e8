use std::time::Duration;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit};
use crate::render::RenderCtx;
use crate::time::{FrameClock, FrameTime};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,

    /// Optional `(min, max)` bounds on the per-frame delta. `None` passes wall time through.
    pub dt_clamps: Option<(Duration, Duration)>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "whirlpool".to_string(),
            initial_size: LogicalSize::new(640.0, 480.0),
            resizable: false,
            dt_clamps: None,
        }
    }
}

impl RuntimeConfig {
    fn frame_clock(&self) -> FrameClock {
        match self.dt_clamps {
            Some((min, max)) => FrameClock::with_clamps(min, max),
            None => FrameClock::new(),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, drives `app` until it stops, and tears everything down.
    ///
    /// Errors from window/GPU creation or `App::init` are returned after the loop exits.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = RuntimeState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.finish()
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct RuntimeState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    exit_requested: bool,
    app_exited: bool,
    fatal: Option<anyhow::Error>,
}

impl<A> RuntimeState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            exit_requested: false,
            app_exited: false,
            fatal: None,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::debug!("runtime stopping after error: {err:#}");
        self.fatal.get_or_insert(err);
        self.request_exit(event_loop);
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            clock: self.config.frame_clock(),
            window,
            gpu_builder: |w: &Window| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        Ok(entry)
    }

    /// Runs `App::on_exit` once, then releases the GPU before the window.
    fn shutdown(&mut self) {
        if !self.app_exited {
            self.app_exited = true;
            self.app.on_exit();
        }
        if self.entry.take().is_some() {
            log::debug!("window and GPU released");
        }
    }

    fn finish(mut self) -> Result<()> {
        self.shutdown();
        match self.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<A> ApplicationHandler for RuntimeState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        let mut entry = match self.create_window_entry(event_loop) {
            Ok(entry) => entry,
            Err(e) => {
                self.fail(event_loop, e);
                return;
            }
        };

        let app = &mut self.app;
        let init = entry.with_gpu(|gpu| {
            let rctx = RenderCtx::new(gpu.device(), gpu.queue(), gpu.surface_format());
            app.init(&rctx)
        });

        if let Err(e) = init {
            self.entry = Some(entry);
            self.fail(event_loop, e.context("application initialization failed"));
            return;
        }

        // Animation starts now, not when the window was requested.
        entry.with_clock_mut(|clock| clock.reset());
        entry.with_window(|w| {
            log::info!("window ready: {:?}", w.inner_size());
            w.request_redraw();
        });
        self.entry = Some(entry);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: the scene animates every frame.
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }

        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (app, entry) = (&mut self.app, &mut self.entry);
        let Some(entry) = entry.as_mut() else {
            return;
        };

        match &event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                log::info!("window closed");
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => {
                let app_control = entry.with_mut(|fields| {
                    let ft: FrameTime = fields.clock.tick();

                    let mut ctx = FrameCtx {
                        window: fields.window,
                        gpu: fields.gpu,
                        time: ft,
                    };

                    app.on_frame(&mut ctx)
                });

                if app_control == AppControl::Exit {
                    self.request_exit(event_loop);
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("shutting down");
        self.shutdown();
    }
}
