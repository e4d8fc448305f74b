// ============================================================================
// BOX BLUR - separable, edge-replicating, integer mean
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

/// Radius at strength 0.
pub const MIN_BLUR_RADIUS: u32 = 5;
/// Radius at strength 100.
pub const MAX_BLUR_RADIUS: u32 = 40;
pub const MAX_BLUR_STRENGTH: u8 = 100;
pub const DEFAULT_BLUR_STRENGTH: u8 = 50;

/// User-facing blur strength in `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlurStrength(u8);

impl BlurStrength {
    /// Out-of-range values are clamped.
    pub fn new(value: i32) -> Self {
        Self(value.clamp(0, MAX_BLUR_STRENGTH as i32) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn radius(self) -> u32 {
        strength_to_radius(self.0 as i32)
    }
}

impl Default for BlurStrength {
    fn default() -> Self {
        Self(DEFAULT_BLUR_STRENGTH)
    }
}

/// Linear map `[0, 100] → [5, 40]`, rounded to nearest (halves up).
pub fn strength_to_radius(strength: i32) -> u32 {
    let s = strength.clamp(0, MAX_BLUR_STRENGTH as i32) as u32;
    let span = MAX_BLUR_RADIUS - MIN_BLUR_RADIUS;
    (MIN_BLUR_RADIUS * 100 + span * s + 50) / 100
}

/// Two-pass box blur of `radius`: every channel of every output pixel is the
/// truncated mean of the `2r+1` neighbours along the row, then along the
/// column, with out-of-range indices clamped to the nearest edge pixel.
///
/// Each pass keeps a running window sum, so the cost does not depend on the
/// radius. Rows are processed in parallel; the vertical pass runs as a row
/// pass over the transposed buffer. Radius 0 returns the input unchanged.
pub fn box_blur(src: &RgbaImage, radius: u32) -> RgbaImage {
    let (w, h) = (src.width() as usize, src.height() as usize);
    if radius == 0 || w == 0 || h == 0 {
        return src.clone();
    }
    let radius = radius as usize;

    let horizontal = blur_rows(src.as_raw(), w, radius);
    let transposed = transpose_rgba(&horizontal, w, h);
    let vertical_t = blur_rows(&transposed, h, radius);
    let result = transpose_rgba(&vertical_t, h, w);

    match RgbaImage::from_raw(w as u32, h as u32, result) {
        Some(img) => img,
        None => src.clone(),
    }
}

/// Blur every `row_len`-pixel row of an interleaved RGBA buffer.
fn blur_rows(src: &[u8], row_len: usize, radius: usize) -> Vec<u8> {
    let stride = row_len * 4;
    let mut out = vec![0u8; src.len()];
    out.par_chunks_mut(stride)
        .zip(src.par_chunks(stride))
        .for_each(|(row_out, row_in)| blur_row(row_in, row_out, radius));
    out
}

/// Sliding-window mean along one row of RGBA pixels.
fn blur_row(row_in: &[u8], row_out: &mut [u8], radius: usize) {
    let n = row_in.len() / 4;
    if n == 0 {
        return;
    }
    let last = n - 1;
    let count = (2 * radius + 1) as u64;

    // Window for x = 0: r copies of the first pixel (left overhang), pixels
    // 0..=min(r, last), then copies of the last pixel for any right overhang.
    let mut sum = [0u64; 4];
    for c in 0..4 {
        let first = row_in[c] as u64;
        let tail = row_in[last * 4 + c] as u64;
        let inside: u64 = (0..=radius.min(last)).map(|i| row_in[i * 4 + c] as u64).sum();
        sum[c] = first * radius as u64 + inside + tail * radius.saturating_sub(last) as u64;
    }

    for x in 0..n {
        for c in 0..4 {
            row_out[x * 4 + c] = (sum[c] / count) as u8;
        }
        let leaving = x.saturating_sub(radius);
        let entering = (x + radius + 1).min(last);
        for c in 0..4 {
            sum[c] = sum[c] + row_in[entering * 4 + c] as u64 - row_in[leaving * 4 + c] as u64;
        }
    }
}

/// Transpose a `w × h` RGBA buffer into `h × w`.
fn transpose_rgba(src: &[u8], w: usize, h: usize) -> Vec<u8> {
    let mut out = vec![0u8; src.len()];
    out.par_chunks_mut(h * 4).enumerate().for_each(|(x, col_out)| {
        for y in 0..h {
            let si = (y * w + x) * 4;
            col_out[y * 4..y * 4 + 4].copy_from_slice(&src[si..si + 4]);
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Direct O(W·H·r) evaluation of the two passes.
    fn box_blur_reference(src: &RgbaImage, radius: u32) -> RgbaImage {
        if radius == 0 {
            return src.clone();
        }
        let (w, h) = (src.width() as i64, src.height() as i64);
        let r = radius as i64;
        let count = (2 * r + 1) as u32;
        let mut horizontal = src.clone();
        for y in 0..h {
            for x in 0..w {
                let mut acc = [0u32; 4];
                for i in -r..=r {
                    let px = src.get_pixel((x + i).clamp(0, w - 1) as u32, y as u32);
                    for c in 0..4 {
                        acc[c] += px[c] as u32;
                    }
                }
                let out = Rgba(acc.map(|v| (v / count) as u8));
                horizontal.put_pixel(x as u32, y as u32, out);
            }
        }
        let mut vertical = horizontal.clone();
        for x in 0..w {
            for y in 0..h {
                let mut acc = [0u32; 4];
                for i in -r..=r {
                    let px = horizontal.get_pixel(x as u32, (y + i).clamp(0, h - 1) as u32);
                    for c in 0..4 {
                        acc[c] += px[c] as u32;
                    }
                }
                vertical.put_pixel(x as u32, y as u32, Rgba(acc.map(|v| (v / count) as u8)));
            }
        }
        vertical
    }

    /// Deterministic pseudo-random image (xorshift).
    fn noise_image(w: u32, h: u32, seed: u32) -> RgbaImage {
        let mut state = seed.max(1);
        RgbaImage::from_fn(w, h, |_, _| {
            let mut next = || {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state & 0xFF) as u8
            };
            Rgba([next(), next(), next(), next()])
        })
    }

    #[test]
    fn strength_mapping_endpoints() {
        assert_eq!(strength_to_radius(0), 5);
        assert_eq!(strength_to_radius(100), 40);
        assert_eq!(strength_to_radius(50), 23);
        assert_eq!(strength_to_radius(-3), 5);
        assert_eq!(strength_to_radius(250), 40);
    }

    #[test]
    fn strength_mapping_is_monotonic() {
        let radii: Vec<u32> = (0..=100).map(strength_to_radius).collect();
        assert!(radii.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn blur_strength_clamps() {
        assert_eq!(BlurStrength::new(130).value(), 100);
        assert_eq!(BlurStrength::new(-1).value(), 0);
        assert_eq!(BlurStrength::default().value(), 50);
        assert_eq!(BlurStrength::new(100).radius(), 40);
    }

    #[test]
    fn radius_zero_is_identity() {
        let img = noise_image(7, 5, 3);
        assert_eq!(box_blur(&img, 0), img);
    }

    #[test]
    fn uniform_region_is_unchanged_for_any_radius() {
        let img = RgbaImage::from_pixel(13, 9, Rgba([200, 17, 3, 255]));
        for radius in [1, 2, 5, 23, 40, 100] {
            assert_eq!(box_blur(&img, radius), img, "radius {radius}");
        }
    }

    #[test]
    fn edge_column_replicates_instead_of_darkening() {
        // White column at x = 0, black elsewhere.
        let img = RgbaImage::from_fn(6, 4, |x, _| {
            if x == 0 { Rgba([255, 255, 255, 255]) } else { Rgba([0, 0, 0, 255]) }
        });
        let out = box_blur(&img, 2);
        // Window at x = 0 is [w, w, w, b, b]: the two phantom samples are the
        // replicated white edge, not zeros.
        assert_eq!(out.get_pixel(0, 0)[0], (3 * 255 / 5) as u8);
        // Alpha stays opaque: no transparent phantom samples.
        assert!(out.pixels().all(|p| p[3] == 255));
        // Further right the white influence fades.
        assert!(out.get_pixel(1, 0)[0] < out.get_pixel(0, 0)[0]);
        assert_eq!(out.get_pixel(5, 0)[0], 0);
    }

    #[test]
    fn sliding_window_matches_reference() {
        for (w, h, radius, seed) in [
            (1, 1, 3, 1),
            (1, 9, 2, 2),
            (9, 1, 4, 3),
            (17, 11, 1, 4),
            (17, 11, 5, 5),
            (8, 6, 40, 6),
            (31, 23, 7, 7),
        ] {
            let img = noise_image(w, h, seed);
            assert_eq!(
                box_blur(&img, radius),
                box_blur_reference(&img, radius),
                "{w}x{h} r={radius}"
            );
        }
    }

    #[test]
    fn mean_truncates() {
        // Row [0, 1, 1] at r=1: x=0 window [0,0,1] → 1/3 → 0.
        let img = RgbaImage::from_fn(3, 1, |x, _| {
            let v = if x == 0 { 0 } else { 1 };
            Rgba([v, v, v, v])
        });
        let out = box_blur(&img, 1);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(2, 0)[0], 1);
    }
}
