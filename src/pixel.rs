use crate::error::{EncodingError, Result};

/// Largest width or height a PNG header may declare.
pub const PNG_MAX_DIMENSION: u32 = (1 << 31) - 1;

/// One 8-bit-per-channel RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const WHITE: Self = Rgba([255, 255, 255, 255]);
    /// `#5B5FC7`, fully opaque.
    pub const BACKGROUND: Self = Rgba::opaque(91, 95, 199);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Rgba([r, g, b, 255])
    }
}

/// Row-major RGBA8 image held in one contiguous allocation.
///
/// `data.len()` is always `width * height * 4`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// A `width` × `height` buffer with every pixel set to `fill`.
    pub fn filled(width: u32, height: u32, fill: Rgba) -> Result<Self> {
        let len = byte_len(width, height)?;
        let data = fill.0.iter().copied().cycle().take(len).collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap raw RGBA bytes, checking that they cover the whole grid.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(EncodingError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Bytes in one scanline.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[idx..idx + 4]);
        Some(Rgba(px))
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, colour: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.data[idx..idx + 4].copy_from_slice(&colour.0);
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Number of bytes an RGBA8 image of this size occupies.
pub fn byte_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(EncodingError::ZeroDimension { width, height });
    }
    if width > PNG_MAX_DIMENSION || height > PNG_MAX_DIMENSION {
        return Err(EncodingError::DimensionOverflow { width, height });
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or(EncodingError::DimensionOverflow { width, height })
}
