//! Orbit animation: a lead sprite circling the origin, a companion riding on it,
//! and a slowly spinning background.

use glam::{Mat4, Vec2, Vec3};
use whirlpool_engine::scene::{NodeId, Scene, SceneError};

use crate::config::OrbitParams;

/// Animation state advanced once per frame.
///
/// Two angles are tracked: the orbit angle accumulates `speed * dt` frame by
/// frame, while the spin angle is derived from total elapsed time.
#[derive(Debug, Clone)]
pub struct OrbitAnimation {
    params: OrbitParams,
    orbit_angle: f32,
    spin_angle: f32,
}

impl OrbitAnimation {
    pub fn new(params: OrbitParams) -> Self {
        Self {
            params,
            orbit_angle: 0.0,
            spin_angle: 0.0,
        }
    }

    /// Advances by `dt` seconds; `elapsed` is the total time since start.
    pub fn step(&mut self, dt: f32, elapsed: f32) {
        self.orbit_angle += self.params.speed * dt;
        self.spin_angle = self.params.speed * elapsed;
    }

    #[inline]
    pub fn orbit_angle(&self) -> f32 {
        self.orbit_angle
    }

    #[inline]
    pub fn spin_angle(&self) -> f32 {
        self.spin_angle
    }

    /// Current point on the orbit circle.
    pub fn orbit_point(&self) -> Vec2 {
        let (sin, cos) = self.orbit_angle.sin_cos();
        Vec2::new(cos, sin) * self.params.radius
    }

    /// `S(scale, scale, 1) · Rz(background_spin · spin)`
    pub fn background_local(&self) -> Mat4 {
        let p = &self.params;
        Mat4::from_scale(Vec3::new(p.background_scale, p.background_scale, 1.0))
            * Mat4::from_rotation_z(p.background_spin * self.spin_angle)
    }

    /// `T(x, y, 0) · Rz(-spin)`
    pub fn lead_local(&self) -> Mat4 {
        let point = self.orbit_point();
        Mat4::from_translation(point.extend(0.0)) * Mat4::from_rotation_z(-self.spin_angle)
    }

    /// Companion transform relative to the lead:
    /// `S(scale, scale, 1) · T(k·y, k·x, 0) · Rz(spin)`
    pub fn companion_local(&self) -> Mat4 {
        let p = &self.params;
        let point = self.orbit_point();
        let offset = Vec3::new(p.companion_offset * point.y, p.companion_offset * point.x, 0.0);

        Mat4::from_scale(Vec3::new(p.companion_scale, p.companion_scale, 1.0))
            * Mat4::from_translation(offset)
            * Mat4::from_rotation_z(self.spin_angle)
    }
}

/// Scene nodes driven by [`OrbitAnimation`], in draw order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OrbitRig {
    pub background: NodeId,
    pub lead: NodeId,
    pub companion: NodeId,
}

impl OrbitRig {
    /// Adds background, lead and companion (parented to the lead) to `scene`.
    pub fn build<T>(
        scene: &mut Scene<T>,
        background: T,
        lead: T,
        companion: T,
    ) -> Result<Self, SceneError> {
        let background = scene.add_root("background", background);
        let lead = scene.add_root("lead", lead);
        let companion = scene.add_child("companion", companion, lead)?;
        Ok(Self {
            background,
            lead,
            companion,
        })
    }

    /// Writes this frame's local matrices and re-evaluates world matrices.
    pub fn pose<T>(&self, scene: &mut Scene<T>, anim: &OrbitAnimation) -> Result<(), SceneError> {
        scene.set_local(self.background, anim.background_local())?;
        scene.set_local(self.lead, anim.lead_local())?;
        scene.set_local(self.companion, anim.companion_local())?;
        scene.evaluate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        assert!(a.abs_diff_eq(b, EPS), "left: {a:?}\nright: {b:?}");
    }

    fn rigged() -> (Scene<&'static str>, OrbitRig) {
        let mut scene = Scene::new();
        let rig = OrbitRig::build(&mut scene, "bg", "piplup", "manaphy").unwrap();
        (scene, rig)
    }

    // ── base pose ─────────────────────────────────────────────────────────

    #[test]
    fn at_time_zero_matrices_take_their_base_forms() {
        let anim = OrbitAnimation::new(OrbitParams::default());

        assert_mat_eq(
            anim.background_local(),
            Mat4::from_scale(Vec3::new(10.0, 10.0, 1.0)),
        );
        assert_mat_eq(
            anim.lead_local(),
            Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)),
        );

        let (mut scene, rig) = rigged();
        rig.pose(&mut scene, &anim).unwrap();

        let companion = scene.world(rig.companion).unwrap();
        let origin = companion.transform_point3(Vec3::ZERO);
        // T(2,0) · S(1.01) · T(0, 0.8)
        assert!(origin.abs_diff_eq(Vec3::new(2.0, 0.808, 0.0), EPS), "{origin:?}");
    }

    // ── orbit ─────────────────────────────────────────────────────────────

    #[test]
    fn orbit_point_stays_on_the_circle() {
        let mut anim = OrbitAnimation::new(OrbitParams::default());
        let mut elapsed = 0.0;
        for i in 0..500 {
            let dt = 0.001 * (i % 37) as f32;
            elapsed += dt;
            anim.step(dt, elapsed);

            let p = anim.orbit_point();
            assert!((p.length_squared() - 4.0).abs() < EPS, "frame {i}: {p:?}");
        }
    }

    #[test]
    fn angle_accumulates_speed_times_dt() {
        let mut anim = OrbitAnimation::new(OrbitParams::default());
        let dt = 1.0 / 60.0;
        let frames = 90;
        for n in 1..=frames {
            anim.step(dt, n as f32 * dt);
        }

        let expected = frames as f32 * 2.3 / 60.0;
        assert!((anim.orbit_angle() - expected).abs() < EPS);
        assert!((anim.spin_angle() - expected).abs() < EPS);
    }

    #[test]
    fn zero_dt_leaves_orbit_in_place() {
        let mut anim = OrbitAnimation::new(OrbitParams::default());
        anim.step(0.5, 0.5);
        let before = anim.orbit_point();
        anim.step(0.0, 0.5);
        assert_eq!(anim.orbit_point(), before);
    }

    // ── scene wiring ──────────────────────────────────────────────────────

    #[test]
    fn companion_follows_the_same_frame_lead() {
        let (mut scene, rig) = rigged();
        let mut anim = OrbitAnimation::new(OrbitParams::default());

        for n in 1..=5 {
            anim.step(0.1, n as f32 * 0.1);
            rig.pose(&mut scene, &anim).unwrap();

            let lead = scene.world(rig.lead).unwrap();
            assert_mat_eq(lead, anim.lead_local());
            assert_mat_eq(
                scene.world(rig.companion).unwrap(),
                anim.lead_local() * anim.companion_local(),
            );
        }
    }

    #[test]
    fn lead_is_rooted_not_chained_to_the_companion() {
        let (mut scene, rig) = rigged();
        let mut anim = OrbitAnimation::new(OrbitParams::default());

        anim.step(1.0, 1.0);
        rig.pose(&mut scene, &anim).unwrap();
        anim.step(1.0, 2.0);
        rig.pose(&mut scene, &anim).unwrap();

        assert_eq!(scene.node(rig.lead).unwrap().parent(), None);
        assert_mat_eq(scene.world(rig.lead).unwrap(), anim.lead_local());
    }

    #[test]
    fn rig_draws_background_first() {
        let (scene, rig) = rigged();
        let order: Vec<_> = scene.iter_in_paint_order().map(|(id, n)| (id, n.payload)).collect();
        assert_eq!(
            order,
            vec![
                (rig.background, "bg"),
                (rig.lead, "piplup"),
                (rig.companion, "manaphy"),
            ]
        );
    }
}
