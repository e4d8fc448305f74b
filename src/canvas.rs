use egui::{Pos2, Rect, Vec2};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Fully transparent pixel, the colour of an empty surface.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Default backing-store size of the editing surface.
pub const DEFAULT_SURFACE_WIDTH: u32 = 760;
pub const DEFAULT_SURFACE_HEIGHT: u32 = 600;

// ============================================================================
// PIXEL RECT – integer rectangle in raster (backing-store) space
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Intersect a signed rectangle with `[0, surface_w) × [0, surface_h)`.
    /// Returns `None` when nothing of it lies on the surface.
    pub fn clamp_to_surface(
        left: i64,
        top: i64,
        width: i64,
        height: i64,
        surface_w: u32,
        surface_h: u32,
    ) -> Option<Self> {
        let x0 = left.max(0);
        let y0 = top.max(0);
        let x1 = left.saturating_add(width.max(0)).min(surface_w as i64);
        let y1 = top.saturating_add(height.max(0)).min(surface_h as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

// ============================================================================
// COORDINATE MAPPER – display (screen) space ↔ raster space
// ============================================================================

/// Maps pointer positions between the on-screen box the surface is drawn in
/// and the surface's backing store. X and Y scale independently.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    pub display_box: Rect,
    pub backing_size: Vec2,
}

impl CoordinateMapper {
    pub fn new(display_box: Rect, backing_width: u32, backing_height: u32) -> Self {
        Self {
            display_box,
            backing_size: Vec2::new(backing_width as f32, backing_height as f32),
        }
    }

    /// Backing pixels per display pixel on each axis. A collapsed box axis
    /// maps 1:1 instead of dividing by zero.
    pub fn scale(&self) -> Vec2 {
        let size = self.display_box.size();
        let sx = if size.x > 0.0 { self.backing_size.x / size.x } else { 1.0 };
        let sy = if size.y > 0.0 { self.backing_size.y / size.y } else { 1.0 };
        Vec2::new(sx, sy)
    }

    /// `raster = (page − box_origin) × (backing / box_size)`.
    /// Positions outside the box map outside the raster; callers clamp.
    pub fn page_to_raster(&self, page_pos: Pos2) -> Pos2 {
        let scale = self.scale();
        let rel = page_pos - self.display_box.min;
        Pos2::new(rel.x * scale.x, rel.y * scale.y)
    }

    pub fn raster_to_page(&self, raster_pos: Pos2) -> Pos2 {
        let scale = self.scale();
        self.display_box.min + Vec2::new(raster_pos.x / scale.x, raster_pos.y / scale.y)
    }

    pub fn raster_rect_to_page(&self, rect: PixelRect) -> Rect {
        Rect::from_min_max(
            self.raster_to_page(Pos2::new(rect.x as f32, rect.y as f32)),
            self.raster_to_page(Pos2::new(rect.right() as f32, rect.bottom() as f32)),
        )
    }

    pub fn contains(&self, page_pos: Pos2) -> bool {
        self.display_box.contains(page_pos)
    }
}

/// Largest box with the surface's aspect ratio that fits `available`,
/// centred horizontally and pinned to the top.
pub fn fit_display_box(available: Rect, surface_w: u32, surface_h: u32) -> Rect {
    if surface_w == 0 || surface_h == 0 || available.width() <= 0.0 || available.height() <= 0.0 {
        return Rect::from_min_size(available.min, Vec2::ZERO);
    }
    let scale = (available.width() / surface_w as f32).min(available.height() / surface_h as f32);
    let size = Vec2::new(surface_w as f32 * scale, surface_h as f32 * scale);
    let min = Pos2::new(available.center().x - size.x / 2.0, available.min.y);
    Rect::from_min_size(min, size)
}

// ============================================================================
// RASTER SURFACE – the single editable RGBA8 buffer
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct RasterSurface {
    pixels: RgbaImage,
}

impl RasterSurface {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, TRANSPARENT),
        }
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width(), self.height())
    }

    /// A zero-sized surface cannot be drawn on.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    pub fn contains_rect(&self, rect: &PixelRect) -> bool {
        rect.right() <= self.width() as u64 && rect.bottom() <= self.height() as u64
    }

    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = TRANSPARENT;
        }
    }

    /// Replace the whole buffer. Dimensions must match the surface.
    pub fn restore(&mut self, snapshot: &RgbaImage) -> bool {
        if snapshot.dimensions() != self.pixels.dimensions() {
            crate::log_warn!(
                "surface restore skipped: snapshot {:?} vs surface {:?}",
                snapshot.dimensions(),
                self.pixels.dimensions()
            );
            return false;
        }
        self.pixels.copy_from_slice(snapshot.as_raw());
        true
    }

    /// Clear, then draw `image` scaled to fit and centred (letterboxed).
    /// Returns where the image landed.
    pub fn draw_fitted(&mut self, image: &RgbaImage) -> PixelRect {
        self.clear();
        let placement = fit_placement(image.width(), image.height(), self.width(), self.height());
        if placement.is_empty() {
            return placement;
        }
        if placement.width == image.width() && placement.height == image.height() {
            imageops::replace(&mut self.pixels, image, placement.x as i64, placement.y as i64);
        } else {
            let scaled = imageops::resize(image, placement.width, placement.height, FilterType::Triangle);
            imageops::replace(&mut self.pixels, &scaled, placement.x as i64, placement.y as i64);
        }
        placement
    }

    /// Copy out the pixels under `rect`. `rect` must lie on the surface.
    pub fn extract_region(&self, rect: &PixelRect) -> RgbaImage {
        imageops::crop_imm(&self.pixels, rect.x, rect.y, rect.width, rect.height).to_image()
    }

    /// Draw `region` at (`x`, `y`) with source-over alpha compositing.
    /// Opaque region pixels replace what is below; translucent ones blend.
    pub fn composite_region(&mut self, x: u32, y: u32, region: &RgbaImage) {
        imageops::overlay(&mut self.pixels, region, x as i64, y as i64);
    }

    pub fn memory_bytes(&self) -> usize {
        self.pixels.as_raw().len()
    }
}

/// Aspect-preserving placement of an `image_w × image_h` image inside a
/// `surface_w × surface_h` surface: `scale = min(sw/iw, sh/ih)`, centred.
pub fn fit_placement(image_w: u32, image_h: u32, surface_w: u32, surface_h: u32) -> PixelRect {
    if image_w == 0 || image_h == 0 || surface_w == 0 || surface_h == 0 {
        return PixelRect::default();
    }
    let scale = (surface_w as f64 / image_w as f64).min(surface_h as f64 / image_h as f64);
    let width = ((image_w as f64 * scale).round() as u32).clamp(1, surface_w);
    let height = ((image_h as f64 * scale).round() as u32).clamp(1, surface_h);
    PixelRect::new((surface_w - width) / 2, (surface_h - height) / 2, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapper_handles_independent_axis_scale() {
        // 200×100 backing drawn into a 100×100 box at (50, 20).
        let mapper = CoordinateMapper::new(
            Rect::from_min_size(Pos2::new(50.0, 20.0), Vec2::new(100.0, 100.0)),
            200,
            100,
        );
        let p = mapper.page_to_raster(Pos2::new(75.0, 70.0));
        assert_eq!(p, Pos2::new(50.0, 50.0));
        let back = mapper.raster_to_page(p);
        assert!((back - Pos2::new(75.0, 70.0)).length() < 1e-4);
    }

    #[test]
    fn mapper_does_not_reject_outside_points() {
        let mapper = CoordinateMapper::new(
            Rect::from_min_size(Pos2::new(10.0, 10.0), Vec2::new(50.0, 50.0)),
            100,
            100,
        );
        assert_eq!(mapper.page_to_raster(Pos2::new(0.0, 70.0)), Pos2::new(-20.0, 120.0));
    }

    #[test]
    fn mapper_survives_collapsed_box() {
        let mapper = CoordinateMapper::new(Rect::from_min_size(Pos2::ZERO, Vec2::ZERO), 10, 10);
        assert_eq!(mapper.scale(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn clamp_shrinks_to_surface() {
        let r = PixelRect::clamp_to_surface(-10, 90, 40, 40, 100, 100).unwrap();
        assert_eq!(r, PixelRect::new(0, 90, 30, 10));
        assert!(PixelRect::clamp_to_surface(120, 0, 10, 10, 100, 100).is_none());
    }

    #[test]
    fn fit_placement_letterboxes_wide_images() {
        let p = fit_placement(400, 100, 200, 200);
        assert_eq!(p, PixelRect::new(0, 75, 200, 50));
        let q = fit_placement(100, 100, 100, 100);
        assert_eq!(q, PixelRect::new(0, 0, 100, 100));
    }

    #[test]
    fn draw_fitted_leaves_bars_transparent() {
        let img = RgbaImage::from_pixel(4, 2, Rgba([255, 0, 0, 255]));
        let mut surface = RasterSurface::new(4, 4);
        let placement = surface.draw_fitted(&img);
        assert_eq!(placement, PixelRect::new(0, 1, 4, 2));
        assert_eq!(surface.get_pixel(0, 0), TRANSPARENT);
        assert_eq!(surface.get_pixel(2, 1), Rgba([255, 0, 0, 255]));
        assert_eq!(surface.get_pixel(3, 3), TRANSPARENT);
    }

    #[test]
    fn region_round_trip() {
        let mut surface = RasterSurface::new(8, 8);
        let patch = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        surface.composite_region(2, 5, &patch);
        let rect = PixelRect::new(2, 5, 3, 2);
        assert_eq!(surface.extract_region(&rect), patch);
        assert_eq!(surface.get_pixel(1, 5), TRANSPARENT);
    }

    #[test]
    fn composite_blends_translucent_pixels_over_opaque_ones() {
        let mut surface = RasterSurface::from_image(RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])));
        let mut patch = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 128]));
        patch.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        surface.composite_region(1, 1, &patch);

        let blended = surface.get_pixel(1, 1);
        assert_eq!(blended[3], 255);
        assert!(blended[0] > 100 && blended[0] < 150, "{blended:?}");
        assert_eq!(surface.get_pixel(2, 1), Rgba([10, 20, 30, 255]));
        assert_eq!(surface.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn composite_of_transparent_pixels_keeps_the_surface() {
        let mut surface = RasterSurface::from_image(RgbaImage::from_pixel(3, 3, Rgba([9, 8, 7, 255])));
        let before = surface.clone();
        surface.composite_region(0, 0, &RgbaImage::from_pixel(3, 3, TRANSPARENT));
        assert_eq!(surface, before);
    }

    #[test]
    fn restore_rejects_mismatched_sizes() {
        let mut surface = RasterSurface::new(2, 2);
        assert!(!surface.restore(&RgbaImage::new(3, 3)));
        assert!(surface.restore(&RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 9]))));
        assert_eq!(surface.get_pixel(1, 1), Rgba([9, 9, 9, 9]));
    }

    #[test]
    fn fit_display_box_keeps_aspect() {
        let avail = Rect::from_min_size(Pos2::ZERO, Vec2::new(400.0, 100.0));
        let b = fit_display_box(avail, 200, 100);
        assert_eq!(b.size(), Vec2::new(200.0, 100.0));
        assert_eq!(b.min, Pos2::new(100.0, 0.0));
    }
}
