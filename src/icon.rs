use log::{debug, trace};
use rayon::prelude::*;

use crate::error::Result;
use crate::pixel::{PixelBuffer, Rgba};

/// Side length of the generated extension icon.
pub const ICON_SIZE: u32 = 512;

/// Microphone glyph geometry, in pixels, relative to the image centre.
///
/// Every test works on the integer offset `(dx, dy)` of a pixel from
/// `(width / 2, height / 2)`; positive `dy` points down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MicGlyph {
    /// Body ellipse semi-axes and how far its centre sits above the origin.
    pub body_rx: f64,
    pub body_ry: f64,
    pub body_lift: i32,
    /// Bounding box for the body: `|dx| < half_w`, `top < dy < bottom`.
    pub body_half_w: i32,
    pub body_top: i32,
    pub body_bottom: i32,

    pub stand_half_w: i32,
    pub stand_top: i32,
    pub stand_bottom: i32,

    pub base_half_w: i32,
    pub base_top: i32,
    pub base_bottom: i32,

    /// Annulus radii; the ring only shows where `inner < |dx| < outer`
    /// and `top < dy < bottom`.
    pub ring_inner: i32,
    pub ring_outer: i32,
    pub ring_top: i32,
    pub ring_bottom: i32,
}

impl Default for MicGlyph {
    fn default() -> Self {
        Self {
            body_rx: 60.0,
            body_ry: 100.0,
            body_lift: 50,
            body_half_w: 60,
            body_top: -150,
            body_bottom: 50,

            stand_half_w: 10,
            stand_top: 50,
            stand_bottom: 150,

            base_half_w: 50,
            base_top: 140,
            base_bottom: 160,

            ring_inner: 70,
            ring_outer: 90,
            ring_top: -20,
            ring_bottom: 60,
        }
    }
}

impl MicGlyph {
    /// Capsule: an upright ellipse clipped to its bounding box.
    pub fn in_body(&self, dx: i32, dy: i32) -> bool {
        if dx.abs() >= self.body_half_w || dy <= self.body_top || dy >= self.body_bottom {
            return false;
        }
        let nx = dx as f64 / self.body_rx;
        let ny = (dy + self.body_lift) as f64 / self.body_ry;
        nx * nx + ny * ny < 1.0
    }

    /// Vertical bar under the capsule.
    pub fn in_stand(&self, dx: i32, dy: i32) -> bool {
        dx.abs() < self.stand_half_w && self.stand_top < dy && dy < self.stand_bottom
    }

    /// Horizontal foot.
    pub fn in_base(&self, dx: i32, dy: i32) -> bool {
        dx.abs() < self.base_half_w && self.base_top < dy && dy < self.base_bottom
    }

    /// Cradle: the sides of an annulus around the capsule.
    pub fn in_ring(&self, dx: i32, dy: i32) -> bool {
        let adx = dx.abs();
        if adx <= self.ring_inner
            || adx >= self.ring_outer
            || dy <= self.ring_top
            || dy >= self.ring_bottom
        {
            return false;
        }
        let d2 = dx * dx + dy * dy;
        d2 > self.ring_inner * self.ring_inner && d2 < self.ring_outer * self.ring_outer
    }

    pub fn contains(&self, dx: i32, dy: i32) -> bool {
        self.in_body(dx, dy) || self.in_stand(dx, dy) || self.in_base(dx, dy) || self.in_ring(dx, dy)
    }

    /// Colour of the pixel at offset `(dx, dy)`.
    pub fn shade(&self, dx: i32, dy: i32, background: Rgba) -> Rgba {
        if self.contains(dx, dy) {
            Rgba::WHITE
        } else {
            background
        }
    }
}

/// Generate a `size` × `size` icon: a white microphone on `background`.
pub fn create_icon(size: u32, background: Rgba) -> Result<PixelBuffer> {
    render(size, size, &MicGlyph::default(), background)
}

/// Rasterize `glyph` onto a fresh buffer.
///
/// Rows are filled in parallel; every pixel depends only on its own
/// coordinates, so the result matches a sequential fill byte for byte.
pub fn render(width: u32, height: u32, glyph: &MicGlyph, background: Rgba) -> Result<PixelBuffer> {
    trace!("begin render");

    let mut buf = PixelBuffer::filled(width, height, background)?;
    let stride = buf.stride();
    let cx = (width / 2) as i32;
    let cy = (height / 2) as i32;

    buf.as_bytes_mut()
        .par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let dy = y as i32 - cy;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let dx = x as i32 - cx;
                px.copy_from_slice(&glyph.shade(dx, dy, background).0);
            }
        });

    debug!("rendered {width}x{height} icon ({} bytes)", buf.as_bytes().len());
    trace!("end render");
    Ok(buf)
}
