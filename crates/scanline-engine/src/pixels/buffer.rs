use super::pack_rgba;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PixelError {
    #[error("pixel data holds {actual} values, expected {expected} for {width}x{height}")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Row-major packed pixels with known dimensions.
///
/// Invariant: `data.len() == width * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u32>,
}

impl PixelBuffer {
    /// Buffer of `width × height` copies of `pixel`.
    pub fn filled(width: u32, height: u32, pixel: u32) -> Self {
        Self {
            width,
            height,
            data: vec![pixel; area(width, height)],
        }
    }

    /// Wraps existing canonical pixels.
    pub fn from_vec(width: u32, height: u32, data: Vec<u32>) -> Result<Self, PixelError> {
        let expected = area(width, height);
        if data.len() != expected {
            return Err(PixelError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Converts straight RGBA8 bytes (e.g. `image::RgbaImage`) into canonical pixels.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self, PixelError> {
        let expected = area(width, height);
        if bytes.len() != expected * 4 {
            return Err(PixelError::LengthMismatch {
                width,
                height,
                expected,
                actual: bytes.len() / 4,
            });
        }

        let data = bytes
            .chunks_exact(4)
            .map(|c| pack_rgba(c[0], c[1], c[2], c[3]))
            .collect();
        Ok(Self { width, height, data })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        &mut self.data
    }

    /// Pixel at `(x, y)`, or `None` outside the buffer.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        self.index(x, y).map(|i| self.data[i])
    }

    /// Writes `(x, y)`. Returns `false` outside the buffer.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, pixel: u32) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.data[i] = pixel;
                true
            }
            None => false,
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }
}

#[inline]
fn area(width: u32, height: u32) -> usize {
    width as usize * height as usize
}
