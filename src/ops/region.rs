// ============================================================================
// REGION COMPOSITOR - blur one rectangle of the surface in place
// ============================================================================

use crate::canvas::{PixelRect, RasterSurface};
use crate::ops::filters::{BlurStrength, box_blur};

/// Crop `rect`, box-blur it at `strength`'s radius and draw it back over the
/// same rectangle with source-over compositing. Pixels outside `rect` are
/// untouched; samples beyond the rectangle's edges are replicated from its
/// own border, never read from the surrounding surface.
///
/// A crop that straddles transparent letterbox bars blurs translucency into
/// the image; compositing over the old pixels keeps opaque ones opaque.
///
/// `rect` must already be clamped to the surface. Returns `false` (and leaves
/// the surface alone) for empty or out-of-bounds rectangles.
pub fn blur_region(surface: &mut RasterSurface, rect: &PixelRect, strength: BlurStrength) -> bool {
    if rect.is_empty() {
        return false;
    }
    if !surface.contains_rect(rect) {
        crate::log_warn!(
            "blur_region: {:?} exceeds surface {}x{}",
            rect,
            surface.width(),
            surface.height()
        );
        return false;
    }

    let radius = strength.radius();
    if radius == 0 {
        return true;
    }
    let region = surface.extract_region(rect);
    let blurred = box_blur(&region, radius);
    surface.composite_region(rect.x, rect.y, &blurred);
    true
}
