use anyhow::Result;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowId;

use whirlpool_engine::core::{App, AppControl, FrameCtx};
use whirlpool_engine::render::{RenderCtx, Sprite, SpriteRenderer, TextureId};
use whirlpool_engine::scene::{Scene, SceneError};
use whirlpool_engine::time::FrameTime;

use crate::animation::{OrbitAnimation, OrbitRig};
use crate::config::DemoConfig;

/// Main-loop state. `Stopped` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Returns true for events that end the demo: window close or Escape.
pub fn is_quit_event(event: &WindowEvent) -> bool {
    match event {
        WindowEvent::CloseRequested => true,
        WindowEvent::KeyboardInput { event, .. } => {
            event.state == ElementState::Pressed
                && event.logical_key == Key::Named(NamedKey::Escape)
        }
        _ => false,
    }
}

/// The whirlpool demo: three textured quads animated around the origin.
pub struct WhirlpoolApp {
    config: DemoConfig,
    state: LoopState,

    renderer: SpriteRenderer,
    scene: Scene<TextureId>,
    rig: Option<OrbitRig>,
    animation: OrbitAnimation,
}

impl WhirlpoolApp {
    pub fn new(config: DemoConfig) -> Self {
        let renderer = SpriteRenderer::new(config.view_projection());
        let animation = OrbitAnimation::new(config.orbit);
        Self {
            config,
            state: LoopState::Running,
            renderer,
            scene: Scene::new(),
            rig: None,
            animation,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    fn stop(&mut self, reason: &str) {
        if self.state == LoopState::Running {
            log::info!("stopping: {reason}");
            self.state = LoopState::Stopped;
        }
    }

    /// Builds the drawable list from loaded textures, back to front.
    fn attach(
        &mut self,
        background: TextureId,
        lead: TextureId,
        companion: TextureId,
    ) -> Result<(), SceneError> {
        self.rig = Some(OrbitRig::build(&mut self.scene, background, lead, companion)?);
        Ok(())
    }

    /// Advances the animation and re-poses the scene. No-op until textures are loaded.
    fn update(&mut self, time: FrameTime) -> Result<(), SceneError> {
        let Some(rig) = self.rig else {
            return Ok(());
        };
        self.animation.step(time.dt, time.elapsed);
        rig.pose(&mut self.scene, &self.animation)?;

        log::trace!(
            "frame {} dt={:.4} orbit={:.3}",
            time.frame_index,
            time.dt,
            self.animation.orbit_angle()
        );
        Ok(())
    }

    /// `FrameCtx::render` only asks to exit when the surface cannot be recovered.
    fn after_render(&mut self, control: AppControl) -> AppControl {
        if control == AppControl::Exit {
            self.stop("fatal surface error");
        }
        control
    }

    /// Sprites for this frame, back to front.
    fn sprites(&self) -> Vec<Sprite> {
        self.scene
            .iter_in_paint_order()
            .map(|(_, node)| Sprite {
                texture: node.payload,
                model: node.world(),
            })
            .collect()
    }
}

impl App for WhirlpoolApp {
    fn init(&mut self, ctx: &RenderCtx<'_>) -> Result<()> {
        let background = self.renderer.load_texture(ctx, &self.config.background_texture)?;
        let lead = self.renderer.load_texture(ctx, &self.config.lead_texture)?;
        let companion = self.renderer.load_texture(ctx, &self.config.companion_texture)?;

        self.attach(background, lead, companion)?;
        log::info!("{} textures loaded", self.renderer.texture_count());
        Ok(())
    }

    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        if is_quit_event(event) {
            self.stop("quit requested");
            return AppControl::Exit;
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.state == LoopState::Stopped {
            return AppControl::Exit;
        }

        if let Err(e) = self.update(ctx.time) {
            log::error!("scene update failed: {e}");
            self.stop("scene error");
            return AppControl::Exit;
        }

        let sprites = self.sprites();
        let renderer = &mut self.renderer;
        let control = ctx.render(self.config.clear_color, |rctx, target| {
            renderer.render(rctx, target, &sprites);
        });

        self.after_render(control)
    }

    fn on_exit(&mut self) {
        self.stop("shutdown");
        let released = self.renderer.release_textures();
        log::info!("released {released} textures");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use std::time::{Duration, Instant};
    use whirlpool_engine::time::FrameClock;

    fn frame(dt: f32, elapsed: f32, frame_index: u64) -> FrameTime {
        FrameTime {
            dt,
            elapsed,
            frame_index,
        }
    }

    fn attached() -> WhirlpoolApp {
        let mut app = WhirlpoolApp::new(DemoConfig::default());
        app.attach(TextureId::from_raw(0), TextureId::from_raw(1), TextureId::from_raw(2))
            .unwrap();
        app
    }

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        assert!(a.abs_diff_eq(b, 1e-4), "left: {a:?}\nright: {b:?}");
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn starts_running() {
        let app = WhirlpoolApp::new(DemoConfig::default());
        assert_eq!(app.state(), LoopState::Running);
    }

    #[test]
    fn close_request_stops_the_loop() {
        let mut app = WhirlpoolApp::new(DemoConfig::default());
        let control = app.on_window_event(WindowId::dummy(), &WindowEvent::CloseRequested);

        assert_eq!(control, AppControl::Exit);
        assert_eq!(app.state(), LoopState::Stopped);
    }

    #[test]
    fn unrelated_events_keep_running() {
        let mut app = WhirlpoolApp::new(DemoConfig::default());
        let control = app.on_window_event(WindowId::dummy(), &WindowEvent::Focused(false));

        assert_eq!(control, AppControl::Continue);
        assert_eq!(app.state(), LoopState::Running);
        assert!(!is_quit_event(&WindowEvent::RedrawRequested));
    }

    #[test]
    fn unrecoverable_surface_stops_the_loop() {
        let mut app = attached();
        assert_eq!(app.after_render(AppControl::Continue), AppControl::Continue);
        assert_eq!(app.state(), LoopState::Running);

        assert_eq!(app.after_render(AppControl::Exit), AppControl::Exit);
        assert_eq!(app.state(), LoopState::Stopped);
    }

    #[test]
    fn exit_without_textures_is_clean() {
        let mut app = WhirlpoolApp::new(DemoConfig::default());
        app.on_exit();
        assert_eq!(app.state(), LoopState::Stopped);
    }

    // ── update ────────────────────────────────────────────────────────────

    #[test]
    fn update_before_init_draws_nothing() {
        let mut app = WhirlpoolApp::new(DemoConfig::default());
        app.update(frame(0.016, 0.016, 1)).unwrap();

        assert!(app.sprites().is_empty());
        assert_eq!(app.animation.orbit_angle(), 0.0);
    }

    #[test]
    fn sixty_hz_clock_ticks_drive_the_orbit() {
        let mut app = attached();
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let step = Duration::from_secs_f64(1.0 / 60.0);

        let frames = 120u32;
        for n in 1..=frames {
            app.update(clock.advance(t0 + step * n)).unwrap();
        }

        let expected = frames as f32 * 2.3 / 60.0;
        assert!((app.animation.orbit_angle() - expected).abs() < 1e-4);
        assert!((app.animation.spin_angle() - expected).abs() < 1e-4);
    }

    #[test]
    fn sprites_follow_the_posed_scene_back_to_front() {
        let mut app = attached();
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);

        for n in 1..=7u32 {
            app.update(clock.advance(t0 + Duration::from_millis(23) * n)).unwrap();

            let sprites = app.sprites();
            let textures: Vec<TextureId> = sprites.iter().map(|s| s.texture).collect();
            assert_eq!(
                textures,
                vec![TextureId::from_raw(0), TextureId::from_raw(1), TextureId::from_raw(2)]
            );

            let anim = &app.animation;
            assert_mat_eq(sprites[0].model, anim.background_local());
            assert_mat_eq(sprites[1].model, anim.lead_local());
            // Companion rides on this frame's lead, not the previous one.
            assert_mat_eq(sprites[2].model, sprites[1].model * anim.companion_local());
        }
    }
}
