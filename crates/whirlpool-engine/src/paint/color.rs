/// Linear premultiplied RGBA color.
///
/// Invariant:
/// - `rgb` components are expected to be multiplied by `a` (premultiplied alpha).
/// - components are linear, not sRGB-encoded.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32, // premultiplied
    pub g: f32, // premultiplied
    pub b: f32, // premultiplied
    pub a: f32,
}

impl Color {
    /// Creates a premultiplied linear color from straight sRGB `f32` components.
    ///
    /// Components outside `[0, 1]` are clamped, matching what a fixed-function
    /// clear would do with out-of-range values.
    #[inline]
    pub fn from_srgb(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::from_straight(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a)
    }

    /// Creates a premultiplied color from straight alpha linear components.
    #[inline]
    pub fn from_straight(r: f32, g: f32, b: f32, a: f32) -> Self {
        let a = a.clamp(0.0, 1.0);
        Self {
            r: (r.clamp(0.0, 1.0)) * a,
            g: (g.clamp(0.0, 1.0)) * a,
            b: (b.clamp(0.0, 1.0)) * a,
            a,
        }
    }

    /// Returns a straight-alpha representation.
    ///
    /// For `a == 0`, RGB is returned as 0.
    #[inline]
    pub fn to_straight(self) -> (f32, f32, f32, f32) {
        if self.a <= 0.0 {
            (0.0, 0.0, 0.0, 0.0)
        } else {
            let inv = 1.0 / self.a;
            (self.r * inv, self.g * inv, self.b * inv, self.a)
        }
    }

    /// Converts to a `wgpu::Color` suitable for a clear op on a surface of the given kind.
    ///
    /// sRGB surfaces encode on write, so they receive linear values. Non-sRGB surfaces
    /// store what they receive, so the color is re-encoded first.
    pub fn to_wgpu(self, surface_is_srgb: bool) -> wgpu::Color {
        let (r, g, b) = if surface_is_srgb {
            (self.r, self.g, self.b)
        } else {
            let (r, g, b, a) = self.to_straight();
            (
                linear_to_srgb(r) * a,
                linear_to_srgb(g) * a,
                linear_to_srgb(b) * a,
            )
        };

        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: self.a as f64,
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn srgb_endpoints_are_preserved() {
        let black = Color::from_srgb(0.0, 0.0, 0.0, 1.0);
        let white = Color::from_srgb(1.0, 1.0, 1.0, 1.0);
        assert_eq!(black, Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 });
        assert!((white.r - 1.0).abs() < 1e-6);
    }

    #[test]
    fn srgb_midpoint_is_darker_in_linear() {
        let c = Color::from_srgb(0.5, 0.5, 0.5, 1.0);
        assert!((c.r - 0.2140).abs() < 1e-3);
    }

    #[test]
    fn out_of_range_components_clamp() {
        let c = Color::from_srgb(0.132, 0.349, 1.3059, 1.0);
        assert!((c.b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn non_srgb_clear_reproduces_input() {
        let c = Color::from_srgb(0.132, 0.349, 0.8, 1.0).to_wgpu(false);
        assert!(close(c.r, 0.132));
        assert!(close(c.g, 0.349));
        assert!(close(c.b, 0.8));
        assert!(close(c.a, 1.0));
    }

    #[test]
    fn srgb_clear_passes_linear_values() {
        let color = Color::from_srgb(0.5, 0.25, 1.0, 1.0);
        let c = color.to_wgpu(true);
        assert!(close(c.r, color.r as f64));
        assert!(close(c.g, color.g as f64));
    }

    #[test]
    fn straight_roundtrip_for_translucent() {
        let c = Color::from_straight(0.8, 0.4, 0.2, 0.5);
        let (r, g, b, a) = c.to_straight();
        assert!((r - 0.8).abs() < 1e-6 && (g - 0.4).abs() < 1e-6 && (b - 0.2).abs() < 1e-6);
        assert_eq!(a, 0.5);
        assert_eq!(Color::default().to_straight(), (0.0, 0.0, 0.0, 0.0));
    }
}
