//! Compiled-in demo configuration.

use std::path::PathBuf;
use std::time::Duration;

use glam::Mat4;
use whirlpool_engine::paint::Color;
use whirlpool_engine::window::RuntimeConfig;
use winit::dpi::LogicalSize;

/// Shape of the orbit animation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitParams {
    /// Radius of the circle the lead sprite travels on.
    pub radius: f32,
    /// Angular speed in radians per second, shared by orbit and spin.
    pub speed: f32,
    /// Uniform XY scale of the background quad.
    pub background_scale: f32,
    /// Background spins at this fraction of the sprite spin.
    pub background_spin: f32,
    /// Uniform XY scale of the companion relative to the lead.
    pub companion_scale: f32,
    /// Companion offset, as a fraction of the swapped circle point.
    pub companion_offset: f32,
}

impl Default for OrbitParams {
    fn default() -> Self {
        Self {
            radius: 2.0,
            speed: 2.3,
            background_scale: 10.0,
            background_spin: 0.4,
            companion_scale: 1.01,
            companion_offset: 0.4,
        }
    }
}

/// Everything the demo needs to know before the window opens.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub title: String,
    pub window_size: LogicalSize<f64>,
    pub clear_color: Color,

    pub background_texture: PathBuf,
    pub lead_texture: PathBuf,
    pub companion_texture: PathBuf,

    /// Orthographic bounds `(left, right, bottom, top, near, far)`.
    pub ortho: [f32; 6],

    pub orbit: OrbitParams,

    /// Optional `(min, max)` bounds on the frame delta.
    pub dt_clamps: Option<(Duration, Duration)>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "Piplup's Whirlpool Adventure!".to_string(),
            window_size: LogicalSize::new(640.0, 480.0),
            // Blue channel is out of range and clamps to 1.0.
            clear_color: Color::from_srgb(0.132, 0.349, 1.3059, 1.0),
            background_texture: PathBuf::from("assets/whirlpool.png"),
            lead_texture: PathBuf::from("assets/piplup_sprite.png"),
            companion_texture: PathBuf::from("assets/manaphy_sprite.png"),
            ortho: [-5.0, 5.0, -3.75, 3.75, -1.0, 1.0],
            orbit: OrbitParams::default(),
            dt_clamps: None,
        }
    }
}

impl DemoConfig {
    /// Camera matrix (projection · view). The view is identity.
    pub fn view_projection(&self) -> Mat4 {
        let [left, right, bottom, top, near, far] = self.ortho;
        Mat4::orthographic_rh(left, right, bottom, top, near, far) * Mat4::IDENTITY
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.title.clone(),
            initial_size: self.window_size,
            resizable: false,
            dt_clamps: self.dt_clamps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn defaults_match_the_demo() {
        let cfg = DemoConfig::default();
        assert_eq!(cfg.title, "Piplup's Whirlpool Adventure!");
        assert_eq!(cfg.window_size, LogicalSize::new(640.0, 480.0));
        assert_eq!(cfg.orbit.radius, 2.0);
        assert_eq!(cfg.orbit.speed, 2.3);
        assert_eq!(cfg.background_texture, PathBuf::from("assets/whirlpool.png"));
        assert!(cfg.dt_clamps.is_none());
    }

    #[test]
    fn clear_color_clamps_out_of_range_blue() {
        let cfg = DemoConfig::default();
        assert!(cfg.clear_color.is_finite());
        assert!((cfg.clear_color.b - 1.0).abs() < 1e-6);
        assert!(cfg.clear_color.r < cfg.clear_color.g);
    }

    #[test]
    fn projection_maps_ortho_corners_to_clip_corners() {
        let vp = DemoConfig::default().view_projection();

        let top_right = vp * Vec4::new(5.0, 3.75, 0.0, 1.0);
        assert!((top_right.x - 1.0).abs() < 1e-6);
        assert!((top_right.y - 1.0).abs() < 1e-6);

        let bottom_left = vp.transform_point3(Vec3::new(-5.0, -3.75, 0.0));
        assert!((bottom_left.x + 1.0).abs() < 1e-6);
        assert!((bottom_left.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn runtime_config_carries_window_settings() {
        let cfg = DemoConfig {
            dt_clamps: Some((Duration::ZERO, Duration::from_millis(100))),
            ..DemoConfig::default()
        };
        let rt = cfg.runtime();
        assert_eq!(rt.title, cfg.title);
        assert_eq!(rt.initial_size, cfg.window_size);
        assert_eq!(rt.dt_clamps, cfg.dt_clamps);
    }
}
