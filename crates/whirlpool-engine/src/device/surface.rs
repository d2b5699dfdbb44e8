use winit::dpi::PhysicalSize;

use super::SurfaceErrorAction;

pub(crate) fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = formats.first().copied()?;

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        if let Some(f) = preferred.into_iter().find(|f| formats.contains(f)) {
            return Some(f);
        }
    }

    Some(first)
}

pub(crate) fn choose_alpha_mode(
    supported: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| supported.contains(m))
        .or_else(|| supported.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Initial surface extent: each side is at least 1 so a minimized window can still be configured.
pub(crate) fn initial_extent(size: PhysicalSize<u32>) -> PhysicalSize<u32> {
    PhysicalSize::new(size.width.max(1), size.height.max(1))
}

/// Records `new_size` and reconfigures the surface.
///
/// wgpu does not support configuring a surface with a 0x0 size; in that case only
/// the recorded size changes and configuration is deferred. Returns whether the
/// surface was reconfigured.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) -> bool {
    *size = new_size;

    if new_size.width == 0 || new_size.height == 0 {
        return false;
    }

    config.width = new_size.width;
    config.height = new_size.height;

    surface.configure(device, config);
    true
}

pub(crate) fn classify_surface_error(err: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{CompositeAlphaMode as Alpha, TextureFormat as Fmt};

    // ── surface format ────────────────────────────────────────────────────

    #[test]
    fn prefers_srgb_when_available() {
        let formats = [Fmt::Bgra8Unorm, Fmt::Rgba8UnormSrgb];
        assert_eq!(choose_surface_format(&formats, true), Some(Fmt::Rgba8UnormSrgb));
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [Fmt::Bgra8Unorm, Fmt::Rgba8UnormSrgb];
        assert_eq!(choose_surface_format(&formats, false), Some(Fmt::Bgra8Unorm));
        assert_eq!(choose_surface_format(&[Fmt::Rgba16Float], true), Some(Fmt::Rgba16Float));
    }

    #[test]
    fn no_formats_means_no_surface() {
        assert_eq!(choose_surface_format(&[], true), None);
    }

    // ── alpha mode ────────────────────────────────────────────────────────

    #[test]
    fn requested_alpha_mode_used_when_supported() {
        let supported = [Alpha::Opaque, Alpha::PreMultiplied];
        assert_eq!(choose_alpha_mode(&supported, Some(Alpha::PreMultiplied)), Alpha::PreMultiplied);
    }

    #[test]
    fn unsupported_alpha_mode_falls_back() {
        let supported = [Alpha::Opaque];
        assert_eq!(choose_alpha_mode(&supported, Some(Alpha::PostMultiplied)), Alpha::Opaque);
        assert_eq!(choose_alpha_mode(&[], None), Alpha::Auto);
    }

    // ── surface errors ────────────────────────────────────────────────────

    #[test]
    fn zero_sized_window_gets_a_one_pixel_extent() {
        assert_eq!(initial_extent(PhysicalSize::new(0, 0)), PhysicalSize::new(1, 1));
        assert_eq!(initial_extent(PhysicalSize::new(640, 0)), PhysicalSize::new(640, 1));
        assert_eq!(initial_extent(PhysicalSize::new(640, 480)), PhysicalSize::new(640, 480));
    }

    #[test]
    fn surface_errors_map_to_actions() {
        use wgpu::SurfaceError as E;
        assert_eq!(classify_surface_error(&E::Lost), SurfaceErrorAction::Reconfigured);
        assert_eq!(classify_surface_error(&E::Outdated), SurfaceErrorAction::Reconfigured);
        assert_eq!(classify_surface_error(&E::Timeout), SurfaceErrorAction::SkipFrame);
        assert_eq!(classify_surface_error(&E::OutOfMemory), SurfaceErrorAction::Fatal);
    }
}
