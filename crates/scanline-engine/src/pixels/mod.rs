//! Packed 32-bit pixel buffers.
//!
//! Canonical in-memory order: byte0 = R, byte1 = G, byte2 = B, byte3 = A,
//! i.e. `value = r | g << 8 | b << 16 | a << 24`. Every load path converts
//! into this order at its boundary; GPU uploads serialize with
//! [`u32::to_le_bytes`] so the texture always receives R, G, B, A bytes.

mod buffer;

pub use buffer::{PixelBuffer, PixelError};

pub const OPAQUE_BLACK: u32 = pack_rgba(0, 0, 0, 255);
pub const TRANSPARENT: u32 = pack_rgba(0, 0, 0, 0);

/// Packs four channels into the canonical order.
#[inline]
pub const fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (a as u32) << 24 | (b as u32) << 16 | (g as u32) << 8 | r as u32
}

/// Unpacks a canonical pixel into `[r, g, b, a]`.
#[inline]
pub const fn unpack_rgba(pixel: u32) -> [u8; 4] {
    [
        (pixel & 0xff) as u8,
        ((pixel >> 8) & 0xff) as u8,
        ((pixel >> 16) & 0xff) as u8,
        (pixel >> 24) as u8,
    ]
}

/// Serializes packed pixels to the byte stream expected by `Rgba8Unorm`.
pub fn to_rgba_bytes(pixels: &[u32]) -> Vec<u8> {
    pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
}

/// Reads tightly packed `Rgba8Unorm` bytes back into canonical pixels.
///
/// A trailing partial pixel is ignored.
pub fn from_rgba_bytes(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
