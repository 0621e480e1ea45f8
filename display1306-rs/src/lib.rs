//! Line-buffered text and image rendering for SSD1306 (128×64) OLED displays.
//!
//! This crate provides [`Display`], a fixed number of text lines that are
//! rasterized with `embedded-graphics` and drawn onto a [`RenderTarget`]:
//! either a real panel ([`Ssd1306Target`]) or an in-memory simulator
//! ([`MemoryTarget`]). The lines can be mirrored to a plain-text buffer
//! file so that separate invocations update individual lines without
//! clobbering the others. Images are thresholded to 1 bit and cropped to
//! the panel.
//!
//! # Quick Start
//!
//! ```no_run
//! use display1306::{Display, Ssd1306Target};
//!
//! # fn example(i2c: impl embedded_hal::i2c::I2c) -> display1306::Result<()> {
//! let target = Ssd1306Target::new(i2c, 0x3C);
//! let mut display = Display::builder(target)
//!     .buffer_file("/tmp/display.txt")
//!     .build();
//!
//! display.init()?;
//! display.set_line(0, "Hello")?;
//! display.update()?;
//! display.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`**: `defmt::Format` impls for the error and state types,
//!   for use inside `defmt` firmware. Runtime logging always goes through
//!   the [`log`] facade.

pub mod buffer;
pub mod display;
pub mod error;
pub mod font;
pub mod frame;
pub mod persist;
pub mod render;
pub mod target;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use buffer::LineBuffer;
pub use display::{Display, DisplayBuilder, DisplayConfig, State, DEFAULT_LINE_COUNT};
pub use error::{OledError, Result, TargetError};
pub use font::{Face, Font, DEFAULT_FONT_SIZE};
pub use frame::Frame;
pub use target::{Call, MemoryHandle, MemoryTarget, RenderTarget, Ssd1306Target};
