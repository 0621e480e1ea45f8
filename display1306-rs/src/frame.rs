//! Monochrome frame buffer produced by the rasterizers.
//!
//! A [`Frame`] stores one bit per pixel in the SSD1306 "vertical LSB"
//! page layout: each byte covers a column of 8 rows, bit 0 being the
//! topmost. The frame is an `embedded-graphics` [`DrawTarget`], so text
//! and primitives can be drawn straight into it.

use core::convert::Infallible;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*, primitives::Rectangle};

/// A transient 1-bit bitmap sized to a render target's bounds.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    size: Size,
    bits: Vec<u8>,
}

impl Frame {
    /// Create an all-off frame of the given size.
    pub fn new(size: Size) -> Self {
        let pages = (size.height as usize).div_ceil(8);
        Self {
            size,
            bits: vec![0; pages * size.width as usize],
        }
    }

    /// Create an all-off frame covering `bounds`.
    ///
    /// Frames always start at the origin; only the size of `bounds` is used.
    pub fn for_bounds(bounds: &Rectangle) -> Self {
        Self::new(bounds.size)
    }

    /// Byte index and bit mask of `(x, y)`, or `None` outside the frame.
    fn locate(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        if x < 0 || y < 0 || x as u32 >= self.size.width || y as u32 >= self.size.height {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        Some(((y / 8) * self.size.width as usize + x, 1 << (y % 8)))
    }

    /// Whether the pixel at `(x, y)` is on. Pixels outside the frame are off.
    pub fn get(&self, x: i32, y: i32) -> bool {
        self.locate(x, y)
            .map(|(idx, mask)| self.bits[idx] & mask != 0)
            .unwrap_or(false)
    }

    /// Set the pixel at `(x, y)`. Writes outside the frame are dropped.
    pub fn set(&mut self, x: i32, y: i32, on: bool) {
        if let Some((idx, mask)) = self.locate(x, y) {
            if on {
                self.bits[idx] |= mask;
            } else {
                self.bits[idx] &= !mask;
            }
        }
    }

    /// Turn every pixel off.
    pub fn clear_all(&mut self) {
        self.bits.fill(0);
    }

    /// Number of pixels that are on.
    pub fn count_on(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Raw page-layout bytes, ready for an SSD1306 GDDRAM transfer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Bounding rectangle of the frame, anchored at the origin.
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(Point::zero(), self.size)
    }

    /// Render the frame as text, `#` for on and `.` for off, one row per line.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.size.width as usize + 1) * self.size.height as usize);
        for y in 0..self.size.height as i32 {
            for x in 0..self.size.width as i32 {
                out.push(if self.get(x, y) { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }
}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Frame")
            .field("size", &self.size)
            .field("on", &self.count_on())
            .finish()
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set(point.x, point.y, color.is_on());
        }
        Ok(())
    }
}
