//! Render targets: the screens a [`Display`](crate::Display) draws to.
//!
//! A [`RenderTarget`] is opened once, reports fixed pixel bounds, accepts
//! frames via [`draw`](RenderTarget::draw), and is closed when the display
//! is done with it. Two backends ship with the crate:
//!
//! - [`Ssd1306Target`]: a real SSD1306 panel on any `embedded-hal` I2C bus.
//! - [`MemoryTarget`]: an in-memory surface for tests and dry runs.
//!
//! `Box<dyn RenderTarget>` is itself a target, so the backend can be picked
//! at runtime.

mod memory;
mod oled;

use embedded_graphics::{prelude::*, primitives::Rectangle};

use crate::error::TargetError;
use crate::frame::Frame;

pub use self::memory::{Call, MemoryHandle, MemoryTarget};
pub use self::oled::Ssd1306Target;

/// Capability interface shared by hardware and simulated screens.
pub trait RenderTarget {
    /// Acquire the underlying transport or resource.
    fn open(&mut self) -> Result<(), TargetError>;

    /// Release the underlying transport or resource.
    fn close(&mut self) -> Result<(), TargetError>;

    /// Pixel bounds of the screen. Fixed once the target is open.
    fn bounds(&self) -> Rectangle;

    /// Blit `frame` into `region` of the screen.
    ///
    /// Screen point `p` in `region` takes the frame pixel at
    /// `offset + (p - region.top_left)`. Screen points whose source falls
    /// outside the frame are left untouched, as are points outside
    /// [`bounds`](Self::bounds).
    fn draw(&mut self, region: Rectangle, frame: &Frame, offset: Point)
        -> Result<(), TargetError>;
}

impl<T: RenderTarget + ?Sized> RenderTarget for Box<T> {
    fn open(&mut self) -> Result<(), TargetError> {
        (**self).open()
    }

    fn close(&mut self) -> Result<(), TargetError> {
        (**self).close()
    }

    fn bounds(&self) -> Rectangle {
        (**self).bounds()
    }

    fn draw(
        &mut self,
        region: Rectangle,
        frame: &Frame,
        offset: Point,
    ) -> Result<(), TargetError> {
        (**self).draw(region, frame, offset)
    }
}

/// Walk the screen points of `region` that lie inside `screen`, handing
/// each one and its source pixel from `frame` to `put`.
pub(crate) fn blit(
    screen: &Rectangle,
    region: &Rectangle,
    frame: &Frame,
    offset: Point,
    mut put: impl FnMut(Point, bool),
) {
    let source_bounds = frame.bounds();
    for p in region.intersection(screen).points() {
        let src = offset + (p - region.top_left);
        if source_bounds.contains(src) {
            put(p, frame.get(src.x, src.y));
        }
    }
}
