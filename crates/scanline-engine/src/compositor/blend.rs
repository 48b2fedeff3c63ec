use crate::pixels::{pack_rgba, unpack_rgba, PixelBuffer};

/// Overlay opacity in percent, clamped to `0..=100`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Opacity(u8);

impl Opacity {
    pub const TRANSPARENT: Opacity = Opacity(0);
    pub const HALF: Opacity = Opacity(50);
    pub const OPAQUE: Opacity = Opacity(100);

    #[inline]
    pub fn percent(value: u32) -> Self {
        Self(value.min(100) as u8)
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self::HALF
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositeError {
    #[error("{layer} holds {actual} pixels, expected {expected} ({width}x{height})")]
    SizeMismatch {
        layer: &'static str,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Blends one pixel pair.
///
/// A fully transparent `top` (alpha exactly 0) contributes nothing regardless
/// of `opacity`. Each RGB channel is `bottom*(100-w)/100 + top*w/100`,
/// truncated. The result is always opaque.
#[inline]
pub fn blend_pixel(bottom: u32, top: u32, opacity: Opacity) -> u32 {
    let [br, bg, bb, _] = unpack_rgba(bottom);
    let [tr, tg, tb, ta] = unpack_rgba(top);

    let w = if ta == 0 { 0.0 } else { f64::from(opacity.get()) };

    let mix = |b: u8, t: u8| -> u8 {
        let v = f64::from(b) * (100.0 - w) / 100.0 + f64::from(t) * w / 100.0;
        // `as` truncates toward zero; v is in [0, 255].
        v as u8
    };

    pack_rgba(mix(br, tr), mix(bg, tg), mix(bb, tb), 255)
}

/// Blends `top` over `bottom` into `dest`. All three hold `width × height`
/// canonical pixels.
///
/// On a size mismatch nothing is written.
pub fn blend_into(
    bottom: &[u32],
    top: &[u32],
    opacity: Opacity,
    width: u32,
    height: u32,
    dest: &mut [u32],
) -> Result<(), CompositeError> {
    let expected = width as usize * height as usize;
    check_len("bottom", bottom.len(), expected, width, height)?;
    check_len("top", top.len(), expected, width, height)?;
    check_len("destination", dest.len(), expected, width, height)?;

    for ((out, &b), &t) in dest.iter_mut().zip(bottom).zip(top) {
        *out = blend_pixel(b, t, opacity);
    }

    Ok(())
}

/// Allocating variant of [`blend_into`] for two equally sized buffers.
pub fn blend(
    bottom: &PixelBuffer,
    top: &PixelBuffer,
    opacity: Opacity,
) -> Result<PixelBuffer, CompositeError> {
    let (width, height) = (bottom.width(), bottom.height());
    let mut dest = PixelBuffer::filled(width, height, 0);
    blend_into(
        bottom.as_slice(),
        top.as_slice(),
        opacity,
        width,
        height,
        dest.as_mut_slice(),
    )?;
    Ok(dest)
}

fn check_len(
    layer: &'static str,
    actual: usize,
    expected: usize,
    width: u32,
    height: u32,
) -> Result<(), CompositeError> {
    if actual == expected {
        Ok(())
    } else {
        Err(CompositeError::SizeMismatch {
            layer,
            width,
            height,
            expected,
            actual,
        })
    }
}
