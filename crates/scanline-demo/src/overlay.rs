//! CPU-side layer content.

use scanline_engine::pixels::{pack_rgba, TRANSPARENT};

/// Inclusive box in which the overlay draws noise.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct NoiseBox {
    pub margin_x: u32,
    pub margin_y: u32,
}

impl NoiseBox {
    pub fn contains(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        x >= self.margin_x
            && y >= self.margin_y
            && x + self.margin_x <= width
            && y + self.margin_y <= height
    }
}

/// Fills `pixels` with opaque random colors inside `area` and transparent
/// pixels elsewhere.
///
/// Channels are drawn from `1..=255`, so noise is never pure black.
pub fn draw_noise(pixels: &mut [u32], width: u32, height: u32, area: NoiseBox, rng: &mut fastrand::Rng) {
    for (i, px) in pixels.iter_mut().enumerate() {
        let (x, y) = ((i as u32) % width, (i as u32) / width);
        *px = if area.contains(x, y, width, height) {
            pack_rgba(rng.u8(1..), rng.u8(1..), rng.u8(1..), 255)
        } else {
            TRANSPARENT
        };
    }
}

/// Fallback background: a diagonal gradient.
pub fn gradient(width: u32, height: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(width as usize * height as usize);
    let (w, h) = (width.max(2) - 1, height.max(2) - 1);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / w) as u8;
            let g = (y * 255 / h) as u8;
            let b = 255 - ((x + y) * 255 / (w + h)) as u8;
            out.push(pack_rgba(r, g, b, 255));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanline_engine::pixels::unpack_rgba;

    const AREA: NoiseBox = NoiseBox {
        margin_x: 75,
        margin_y: 100,
    };

    // ── noise box ────────────────────────────────────────────────────────

    #[test]
    fn box_bounds_are_inclusive() {
        let (w, h) = (480, 270);
        assert!(AREA.contains(75, 100, w, h));
        assert!(AREA.contains(405, 170, w, h));
        assert!(!AREA.contains(74, 100, w, h));
        assert!(!AREA.contains(406, 170, w, h));
        assert!(!AREA.contains(200, 171, w, h));
    }

    #[test]
    fn noise_is_opaque_inside_and_transparent_outside() {
        let (w, h) = (480, 270);
        let mut pixels = vec![0xdead_beef; (w * h) as usize];
        let mut rng = fastrand::Rng::with_seed(7);
        draw_noise(&mut pixels, w, h, AREA, &mut rng);

        for (i, &p) in pixels.iter().enumerate() {
            let (x, y) = (i as u32 % w, i as u32 / w);
            let [r, g, b, a] = unpack_rgba(p);
            if AREA.contains(x, y, w, h) {
                assert_eq!(a, 255);
                assert!(r > 0 && g > 0 && b > 0);
            } else {
                assert_eq!(p, TRANSPARENT);
            }
        }
    }

    // ── gradient ─────────────────────────────────────────────────────────

    #[test]
    fn gradient_spans_corners() {
        let g = gradient(480, 270);
        assert_eq!(g.len(), 480 * 270);
        assert_eq!(unpack_rgba(g[0]), [0, 0, 255, 255]);
        assert_eq!(unpack_rgba(g[g.len() - 1]), [255, 255, 0, 255]);
    }

    #[test]
    fn gradient_handles_single_pixel() {
        assert_eq!(gradient(1, 1).len(), 1);
    }
}
