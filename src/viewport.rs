//! Viewport state and the resize responder.
//!
//! Every resize or scale-factor change funnels through [`handle_resize`],
//! which updates, in order, the stored viewport, the camera projection, the
//! render target and the firefly pixel density. The clamped pixel ratio is
//! computed once here and read everywhere else from [`Viewport::pixel_ratio`].

use glam::Vec2;

use crate::context::AppContext;

/// Logical window size plus the clamped pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Logical width in CSS-style pixels.
    pub width: u32,
    /// Logical height in CSS-style pixels.
    pub height: u32,
    /// Device pixel ratio after clamping.
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Width over height. A zero height yields 1.0.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Drawing-buffer size in physical pixels, at least 1x1.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * self.pixel_ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }

    /// [`drawing_buffer_size`](Self::drawing_buffer_size) as a vector, for uniforms.
    pub fn resolution(&self) -> Vec2 {
        let (w, h) = self.drawing_buffer_size();
        Vec2::new(w as f32, h as f32)
    }
}

/// Clamp a reported device pixel ratio to `(0, max]`.
///
/// Non-finite or non-positive reports fall back to 1.0.
pub fn clamp_pixel_ratio(device_ratio: f64, max: f32) -> f32 {
    let ratio = device_ratio as f32;
    if !ratio.is_finite() || ratio <= 0.0 {
        return 1.0_f32.min(max);
    }
    ratio.min(max)
}

/// Something that draws into a resizable, pixel-density aware buffer.
pub trait RenderTarget {
    /// New logical size.
    fn set_size(&mut self, width: u32, height: u32);

    /// New clamped pixel ratio.
    fn set_pixel_ratio(&mut self, ratio: f32);
}

/// Apply a resize or scale-factor change.
///
/// Returns `false` when the event was ignored because one dimension is zero
/// (minimized window). Applying the same event twice leaves the same state.
pub fn handle_resize<T: RenderTarget + ?Sized>(
    ctx: &mut AppContext,
    target: &mut T,
    width: u32,
    height: u32,
    device_ratio: f64,
) -> bool {
    if width == 0 || height == 0 {
        log::debug!("ignoring resize to {}x{}", width, height);
        return false;
    }

    let ratio = clamp_pixel_ratio(device_ratio, ctx.config.renderer.max_pixel_ratio);
    ctx.viewport = Viewport::new(width, height, ratio);

    ctx.camera.aspect = ctx.viewport.aspect();
    ctx.camera.update_projection_matrix();

    target.set_size(width, height);
    target.set_pixel_ratio(ratio);

    if ctx.params.set_pixel_density(ratio) {
        ctx.params.set_resolution(ctx.viewport.resolution());
    }

    log::debug!(
        "viewport {}x{} @ {} (buffer {:?})",
        width,
        height,
        ratio,
        ctx.viewport.drawing_buffer_size()
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_pixel_ratio() {
        assert_eq!(clamp_pixel_ratio(1.0, 2.0), 1.0);
        assert_eq!(clamp_pixel_ratio(1.5, 2.0), 1.5);
        assert_eq!(clamp_pixel_ratio(3.0, 2.0), 2.0);
        assert_eq!(clamp_pixel_ratio(0.0, 2.0), 1.0);
        assert_eq!(clamp_pixel_ratio(f64::NAN, 2.0), 1.0);
    }

    #[test]
    fn test_drawing_buffer_size() {
        let viewport = Viewport::new(800, 600, 2.0);
        assert_eq!(viewport.drawing_buffer_size(), (1600, 1200));
        assert_eq!(viewport.resolution(), Vec2::new(1600.0, 1200.0));

        let viewport = Viewport::new(101, 1, 1.5);
        assert_eq!(viewport.drawing_buffer_size(), (152, 2));
    }

    #[test]
    fn test_aspect() {
        assert_eq!(Viewport::new(800, 600, 1.0).aspect(), 800.0 / 600.0);
        assert_eq!(Viewport::new(800, 0, 1.0).aspect(), 1.0);
    }
}
