//! Hardware render target wrapping the `ssd1306` crate in buffered graphics mode.
//!
//! [`Ssd1306Target`] manages the SSD1306 lifecycle: construction without
//! I2C traffic, explicit initialisation on [`open`](RenderTarget::open),
//! and a full frame buffer flush on every [`draw`](RenderTarget::draw).

use display_interface_i2c::I2CInterface;
use embedded_graphics::{prelude::*, primitives::Rectangle};
use embedded_hal::i2c::I2c;
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

use super::{blit, RenderTarget};
use crate::error::TargetError;
use crate::frame::Frame;

/// Concrete display type used internally by [`Ssd1306Target`].
type Panel<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// Blocking render target for an SSD1306 128×64 OLED over I2C.
///
/// # Lifecycle
///
/// 1. [`Ssd1306Target::new()`]: constructs the target without any I2C traffic.
/// 2. [`open()`](RenderTarget::open): sends the SSD1306 initialisation sequence.
/// 3. [`draw()`](RenderTarget::draw): copies a frame into the panel's
///    buffer and flushes it (~20 ms for a full frame at 400 kHz).
/// 4. [`close()`](RenderTarget::close): stops accepting draws. No command
///    is sent, so the panel keeps showing the last frame after the
///    process exits.
/// 5. [`release()`](Self::release): hands the I2C bus back.
///
/// # Example
///
/// ```no_run
/// use display1306::{RenderTarget, Ssd1306Target};
///
/// # fn example(i2c: impl embedded_hal::i2c::I2c) {
/// let mut oled = Ssd1306Target::new(i2c, 0x3C);
/// oled.open().unwrap();
/// # }
/// ```
pub struct Ssd1306Target<I2C> {
    display: Panel<I2C>,
    /// Set to `true` after a successful `open()` call.
    open: bool,
}

impl<I2C> Ssd1306Target<I2C>
where
    I2C: I2c,
{
    /// Construct an unopened target.
    ///
    /// No I2C traffic is generated.
    ///
    /// # Arguments
    /// * `i2c`: I2C bus (takes ownership for exclusive access).
    /// * `address`: 7-bit I2C device address (typically `0x3C` or `0x3D`).
    pub fn new(i2c: I2C, address: u8) -> Self {
        let interface = I2CDisplayInterface::new_custom_address(i2c, address);
        let display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();

        Self {
            display,
            open: false,
        }
    }

    /// Check whether the panel has been successfully opened.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Give back the I2C bus, consuming the target.
    pub fn release(self) -> I2C {
        self.display.release().release()
    }
}

impl<I2C> RenderTarget for Ssd1306Target<I2C>
where
    I2C: I2c,
{
    /// # Errors
    ///
    /// Returns [`TargetError::InitializationFailed`] with the bus error if
    /// the panel does not accept the initialisation sequence.
    fn open(&mut self) -> Result<(), TargetError> {
        self.display
            .init()
            .map_err(TargetError::InitializationFailed)?;
        self.open = true;
        Ok(())
    }

    /// Generates no I2C traffic; the last frame stays lit.
    fn close(&mut self) -> Result<(), TargetError> {
        self.open = false;
        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        self.display.bounding_box()
    }

    /// # Errors
    ///
    /// Returns [`TargetError::NotOpen`] before [`open()`](RenderTarget::open),
    /// or [`TargetError::Interface`] on a bus-level failure during flush.
    fn draw(
        &mut self,
        region: Rectangle,
        frame: &Frame,
        offset: Point,
    ) -> Result<(), TargetError> {
        if !self.open {
            return Err(TargetError::NotOpen);
        }
        let screen = self.bounds();
        let display = &mut self.display;
        blit(&screen, &region, frame, offset, |p, on| {
            display.set_pixel(p.x as u32, p.y as u32, on);
        });
        display.flush()?;
        Ok(())
    }
}
