//! Rasterizers: line buffer and bitmap sources to monochrome frames.
//!
//! Both produce a [`Frame`] the size of the render target's bounds.
//! Neither knows about the target itself; the
//! [`Display`](crate::Display) hands the finished frame over.

use embedded_graphics::{
    mono_font::MonoTextStyle,
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::Rectangle,
    text::{Baseline, Text},
};
use image::{GenericImageView, Pixel as ImagePixel, Rgba};

use crate::font::{Face, Font};
use crate::frame::Frame;

// ── Text ─────────────────────────────────────────────────────────────────

/// Draw `lines` into any `embedded-graphics` binary target.
///
/// # Layout
///
/// ```text
///  x = 0
///  ┌──────────────────────────────┐
///  │Line 0                        │  ← baseline at 1 × line_height − descent
///  │Line 1                        │  ← baseline at 2 × line_height − descent
///  │...                           │
///  └──────────────────────────────┘
/// ```
///
/// Every line is left-aligned at x = 0. Lines are not clipped vertically:
/// a line whose baseline falls below the target is still drawn, and the
/// target discards the pixels. Capacity is the line buffer's business.
///
/// With either kind of face the bottom row of a flat-bottomed glyph such
/// as `H` lands on `font.baseline_y(i) - 1`.
pub fn render_lines<D, S>(display: &mut D, lines: &[S], font: &Font) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
    S: AsRef<str>,
{
    for (i, line) in lines.iter().enumerate() {
        let text = line.as_ref();
        if text.is_empty() {
            continue;
        }
        let baseline = font.baseline_y(i);
        match font.face() {
            Face::Mono(face) => {
                // embedded-graphics puts the alphabetic baseline on the last
                // row of the glyph body, one row above the typographic one.
                Text::with_baseline(
                    text,
                    Point::new(0, baseline - 1),
                    MonoTextStyle::new(face, BinaryColor::On),
                    Baseline::Alphabetic,
                )
                .draw(display)?;
            }
            Face::TrueType { font, size } => draw_outline(display, text, font, *size, baseline)?,
        }
    }

    Ok(())
}

/// Coverage above which an anti-aliased glyph pixel is lit (more than half).
const COVERAGE_THRESHOLD: u8 = 127;

/// Rasterize `text` with `face` from x = 0, glyph bitmaps resting on
/// `baseline`.
fn draw_outline<D>(
    display: &mut D,
    text: &str,
    face: &fontdue::Font,
    size: f32,
    baseline: i32,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let mut pen = 0.0_f32;
    for ch in text.chars() {
        let (metrics, coverage) = face.rasterize(ch, size);
        let left = pen.round() as i32 + metrics.xmin;
        let top = baseline - metrics.ymin - metrics.height as i32;
        let width = metrics.width.max(1);

        let lit = coverage
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > COVERAGE_THRESHOLD)
            .map(|(k, _)| {
                let p = Point::new(left + (k % width) as i32, top + (k / width) as i32);
                Pixel(p, BinaryColor::On)
            });
        display.draw_iter(lit)?;

        pen += metrics.advance_width;
    }
    Ok(())
}

/// Rasterize `lines` into a fresh frame covering `bounds`.
pub fn text_frame<S: AsRef<str>>(bounds: &Rectangle, lines: &[S], font: &Font) -> Frame {
    let mut frame = Frame::for_bounds(bounds);
    render_lines(&mut frame, lines, font).unwrap_or_else(|never| match never {});
    frame
}

// ── Images ───────────────────────────────────────────────────────────────

/// Gray level above which a pixel is lit.
const THRESHOLD: u8 = 128;

/// Gray level of an 8-bit RGBA pixel.
///
/// Colour is premultiplied by alpha (fully transparent reads as black)
/// and weighted with the ITU-R BT.601 luma coefficients.
pub fn luma(px: Rgba<u8>) -> u8 {
    let [r, g, b, a] = px.0.map(u32::from);
    let premul = |c: u32| (c * a + 127) / 255;
    let y = (19595 * premul(r) + 38470 * premul(g) + 7471 * premul(b) + (1 << 15)) >> 16;
    y.min(255) as u8
}

/// Map `image` onto a frame covering `bounds`, one source pixel per
/// screen pixel.
///
/// Screen pixel `(x, y)` samples source pixel `(x, y)`. A larger source
/// is cropped to its top-left corner; where a smaller source has no
/// pixel the frame stays off. No scaling is applied and no coordinate
/// outside the source is ever read.
pub fn render_image<I>(image: &I, bounds: &Rectangle) -> Frame
where
    I: GenericImageView,
    I::Pixel: ImagePixel<Subpixel = u8>,
{
    let mut frame = Frame::for_bounds(bounds);
    let (src_w, src_h) = image.dimensions();

    for p in bounds.points() {
        if p.x < 0 || p.y < 0 {
            continue;
        }
        let (sx, sy) = (p.x as u32, p.y as u32);
        if sx < src_w && sy < src_h {
            let on = luma(image.get_pixel(sx, sy).to_rgba()) > THRESHOLD;
            let local = p - bounds.top_left;
            frame.set(local.x, local.y, on);
        }
    }

    frame
}
