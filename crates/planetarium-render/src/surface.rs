//! Window surface dimensions in physical and logical pixels.
//!
//! Wayland can hand out zero-sized windows before the compositor assigns a
//! size, and DPI changes alter the physical size without a logical resize.
//! [`SurfaceWrapper`] normalizes both so the camera aspect ratio, the depth
//! buffer and the heading layout always agree on one viewport.

/// Minimum surface dimension (prevents zero-size panics).
pub const MIN_SURFACE_DIMENSION: u32 = 1;

/// Physical pixel dimensions of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalSize {
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
}

impl PhysicalSize {
    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(MIN_SURFACE_DIMENSION) as f32
    }
}

/// Produced when the surface dimensions or scale factor change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceResizeEvent {
    /// New physical pixel dimensions.
    pub physical: PhysicalSize,
    /// Current scale factor.
    pub scale_factor: f64,
}

/// Tracks the drawable size of the window.
#[derive(Clone, Debug)]
pub struct SurfaceWrapper {
    physical_width: u32,
    physical_height: u32,
    scale_factor: f64,
    configured: bool,
}

impl SurfaceWrapper {
    /// Create from the initial physical size.
    ///
    /// Zero dimensions are clamped to 1 and leave the wrapper unconfigured
    /// until the first real resize arrives.
    pub fn new(physical_width: u32, physical_height: u32, scale_factor: f64) -> Self {
        let configured = physical_width > 0 && physical_height > 0;
        Self {
            physical_width: physical_width.max(MIN_SURFACE_DIMENSION),
            physical_height: physical_height.max(MIN_SURFACE_DIMENSION),
            scale_factor: sanitize_scale(scale_factor),
            configured,
        }
    }

    /// Handle a window resize. Returns an event if the size actually changed.
    pub fn handle_resize(
        &mut self,
        physical_width: u32,
        physical_height: u32,
    ) -> Option<SurfaceResizeEvent> {
        let width = physical_width.max(MIN_SURFACE_DIMENSION);
        let height = physical_height.max(MIN_SURFACE_DIMENSION);
        let was_configured = self.configured;
        self.configured |= physical_width > 0 && physical_height > 0;

        if width == self.physical_width && height == self.physical_height && was_configured {
            return None;
        }
        self.physical_width = width;
        self.physical_height = height;

        Some(SurfaceResizeEvent {
            physical: self.physical_size(),
            scale_factor: self.scale_factor,
        })
    }

    /// Handle a DPI change. Always reports, since layout in physical pixels
    /// changes even when the physical size does not.
    pub fn handle_scale_factor_changed(
        &mut self,
        new_scale_factor: f64,
        new_physical_width: u32,
        new_physical_height: u32,
    ) -> SurfaceResizeEvent {
        self.scale_factor = sanitize_scale(new_scale_factor);
        self.handle_resize(new_physical_width, new_physical_height)
            .unwrap_or(SurfaceResizeEvent {
                physical: self.physical_size(),
                scale_factor: self.scale_factor,
            })
    }

    /// Current physical size.
    pub fn physical_size(&self) -> PhysicalSize {
        PhysicalSize {
            width: self.physical_width,
            height: self.physical_height,
        }
    }

    /// Logical size (physical / scale factor).
    pub fn logical_size(&self) -> (f64, f64) {
        (
            self.physical_width as f64 / self.scale_factor,
            self.physical_height as f64 / self.scale_factor,
        )
    }

    /// Physical pixels per logical pixel.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f32 {
        self.physical_size().aspect_ratio()
    }

    /// Whether a non-zero size has been seen.
    pub fn is_configured(&self) -> bool {
        self.configured
    }
}

fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 { scale } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_surface_handled_gracefully() {
        let mut wrapper = SurfaceWrapper::new(0, 0, 1.0);
        assert!(!wrapper.is_configured());
        assert_eq!(wrapper.physical_size(), PhysicalSize { width: 1, height: 1 });

        let event = wrapper.handle_resize(1920, 1080).unwrap();
        assert_eq!(event.physical, PhysicalSize { width: 1920, height: 1080 });
        assert!(wrapper.is_configured());
    }

    #[test]
    fn test_first_real_size_reports_even_if_equal_to_clamp() {
        let mut wrapper = SurfaceWrapper::new(0, 0, 1.0);
        assert!(wrapper.handle_resize(1, 1).is_some());
        assert!(wrapper.handle_resize(1, 1).is_none());
    }

    #[test]
    fn test_no_event_on_same_dimensions() {
        let mut wrapper = SurfaceWrapper::new(1920, 1080, 1.0);
        assert!(wrapper.handle_resize(1920, 1080).is_none());
    }

    #[test]
    fn test_zero_dimensions_clamped_to_one() {
        let mut wrapper = SurfaceWrapper::new(800, 600, 1.0);
        assert!(wrapper.handle_resize(0, 0).is_some());
        assert_eq!(wrapper.physical_size(), PhysicalSize { width: 1, height: 1 });
        assert!(wrapper.aspect_ratio().is_finite());
    }

    #[test]
    fn test_scale_factor_change_always_reports() {
        let mut wrapper = SurfaceWrapper::new(1920, 1080, 1.0);
        let event = wrapper.handle_scale_factor_changed(2.0, 1920, 1080);
        assert_eq!(event.scale_factor, 2.0);
        let (lw, lh) = wrapper.logical_size();
        assert!((lw - 960.0).abs() < 1e-9);
        assert!((lh - 540.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_scale_factor_falls_back_to_one() {
        let wrapper = SurfaceWrapper::new(100, 100, 0.0);
        assert_eq!(wrapper.scale_factor(), 1.0);
    }

    #[test]
    fn test_aspect_ratio() {
        let wrapper = SurfaceWrapper::new(1920, 1080, 1.0);
        assert!((wrapper.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
    }
}
