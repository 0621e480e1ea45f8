//! The line-buffered display: configuration, lifecycle and commit.
//!
//! [`Display`] owns a [`RenderTarget`] and a [`LineBuffer`]. Text is staged
//! in the buffer with [`set_line`](Display::set_line) /
//! [`set_lines`](Display::set_lines) and reaches the screen on
//! [`update`](Display::update); images bypass the buffer through
//! [`show_image`](Display::show_image).

use std::path::{Path, PathBuf};

use embedded_graphics::{prelude::*, primitives::Rectangle};
use image::{GenericImageView, Pixel};

use crate::buffer::LineBuffer;
use crate::error::{OledError, Result};
use crate::font::Font;
use crate::frame::Frame;
use crate::persist;
use crate::render;
use crate::target::RenderTarget;

/// Line capacity used when none is configured.
pub const DEFAULT_LINE_COUNT: usize = 5;

// ── DisplayConfig ────────────────────────────────────────────────────────

/// Settings for a [`Display`].
///
/// [`DisplayConfig::default()`] gives five lines in the default font with
/// no buffer file.
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// Number of text lines held in the buffer. Default: 5.
    pub line_count: usize,
    /// Face used by the text rasterizer. `None` selects [`Font::default()`]
    /// when the display is built.
    pub font: Option<Font>,
    /// File the buffer is loaded from on init and saved to on every
    /// update. Default: none.
    pub buffer_file: Option<PathBuf>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            line_count: DEFAULT_LINE_COUNT,
            font: None,
            buffer_file: None,
        }
    }
}

// ── DisplayBuilder ───────────────────────────────────────────────────────

/// Incremental configuration for a [`Display`]; see [`Display::builder`].
///
/// No I/O happens until the built display is initialised.
pub struct DisplayBuilder<T> {
    target: T,
    config: DisplayConfig,
}

impl<T: RenderTarget> DisplayBuilder<T> {
    pub fn line_count(mut self, line_count: usize) -> Self {
        self.config.line_count = line_count;
        self
    }

    pub fn font(mut self, font: Font) -> Self {
        self.config.font = Some(font);
        self
    }

    pub fn buffer_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.buffer_file = Some(path.into());
        self
    }

    /// Replace every setting at once.
    pub fn config(mut self, config: DisplayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Display<T> {
        Display::new(self.target, self.config)
    }
}

// ── Display ──────────────────────────────────────────────────────────────

/// Lifecycle state of a [`Display`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Built, target not yet opened.
    Configured,
    /// Target open, buffer allocated; every operation is available.
    Initialized,
    /// Target released by [`Display::close`].
    Closed,
}

/// A fixed number of text lines rendered onto a [`RenderTarget`].
///
/// # Lifecycle
///
/// 1. [`Display::builder()`] / [`Display::new()`]: no I/O.
/// 2. [`init()`](Self::init): allocates the buffer, loads the buffer file
///    (if any) and opens the target.
/// 3. Stage text with [`set_line()`](Self::set_line),
///    [`set_lines()`](Self::set_lines), [`clear()`](Self::clear).
/// 4. [`update()`](Self::update): saves the buffer file, rasterizes the
///    lines and draws them.
/// 5. [`close()`](Self::close): releases the target.
///
/// # Example
///
/// ```
/// use display1306::{Display, MemoryTarget};
///
/// let mut display = Display::builder(MemoryTarget::new()).line_count(5).build();
/// display.init()?;
/// display.set_lines(3, &["Line 4", "Line 5"])?;
/// display.update()?;
/// display.close()?;
/// # Ok::<(), display1306::OledError>(())
/// ```
pub struct Display<T> {
    target: T,
    line_count: usize,
    buffer: LineBuffer,
    font: Font,
    buffer_file: Option<PathBuf>,
    state: State,
}

impl<T: RenderTarget> Display<T> {
    /// Start configuring a display that will draw to `target`.
    pub fn builder(target: T) -> DisplayBuilder<T> {
        DisplayBuilder {
            target,
            config: DisplayConfig::default(),
        }
    }

    /// Build a display from a finished configuration.
    pub fn new(target: T, config: DisplayConfig) -> Self {
        Self {
            target,
            line_count: config.line_count,
            buffer: LineBuffer::new(config.line_count),
            font: config.font.unwrap_or_default(),
            buffer_file: config.buffer_file,
            state: State::Configured,
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Allocate the buffer, load the buffer file and open the target.
    ///
    /// Calling `init()` on an initialised display does nothing. After
    /// [`close()`](Self::close) it starts a fresh cycle.
    ///
    /// # Errors
    ///
    /// [`OledError::PersistFailure`] if the buffer file exists but cannot
    /// be read, [`OledError::InitFailure`] if the target fails to open. On
    /// error the display stays uninitialised and `init()` can be retried.
    pub fn init(&mut self) -> Result<()> {
        if self.state == State::Initialized {
            return Ok(());
        }

        let mut buffer = LineBuffer::new(self.line_count);
        if let Some(path) = &self.buffer_file {
            persist::load(path, &mut buffer)?;
        }

        self.target.open().map_err(|e| {
            log::warn!("render target failed to open: {e}");
            OledError::InitFailure(e)
        })?;

        self.buffer = buffer;
        self.state = State::Initialized;
        log::info!("display initialised with {} lines", self.line_count);
        Ok(())
    }

    /// Release the render target.
    ///
    /// A display that was never initialised (or is already closed) has
    /// nothing to release, so this is a no-op for it.
    ///
    /// # Errors
    ///
    /// [`OledError::CloseFailure`] if the target fails to close; the display
    /// stays initialised.
    pub fn close(&mut self) -> Result<()> {
        if self.state != State::Initialized {
            return Ok(());
        }
        self.target.close().map_err(OledError::CloseFailure)?;
        self.state = State::Closed;
        log::info!("display closed");
        Ok(())
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == State::Initialized
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(OledError::NotInitialized)
        }
    }

    // ── Line buffer ──────────────────────────────────────────────────

    /// Blank every line. The screen changes on the next update.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        self.buffer.clear();
        Ok(())
    }

    /// Replace line `index` (0-based).
    ///
    /// # Errors
    ///
    /// [`OledError::NotInitialized`], or [`OledError::OutOfRange`] if
    /// `index >= line_count`.
    pub fn set_line(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        self.ensure_initialized()?;
        self.buffer.set_line(index, text)
    }

    /// Replace the lines starting at `start` (0-based), all or nothing.
    ///
    /// # Errors
    ///
    /// [`OledError::NotInitialized`], or [`OledError::Overflow`] if the
    /// lines would run past the last one; nothing is written in that case.
    pub fn set_lines<S: AsRef<str>>(&mut self, start: usize, texts: &[S]) -> Result<()> {
        self.ensure_initialized()?;
        self.buffer.set_lines(start, texts)
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.buffer.line(index)
    }

    pub fn lines(&self) -> &[String] {
        self.buffer.lines()
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    // ── Font ─────────────────────────────────────────────────────────

    pub fn font(&self) -> &Font {
        &self.font
    }

    /// Switch faces; line height and descent follow the new font.
    pub fn set_font(&mut self, font: Font) {
        self.font = font;
    }

    // ── Buffer file ──────────────────────────────────────────────────

    pub fn buffer_file(&self) -> Option<&Path> {
        self.buffer_file.as_deref()
    }

    /// Load the buffer from `path`; see [`persist::load`].
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_initialized()?;
        persist::load(path.as_ref(), &mut self.buffer)
    }

    /// Save the buffer to `path`; see [`persist::save`].
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_initialized()?;
        persist::save(path.as_ref(), &self.buffer)
    }

    // ── Commit ───────────────────────────────────────────────────────

    /// Save the buffer file, rasterize the lines and draw them over the
    /// whole screen.
    ///
    /// The buffer file is written first: if that fails nothing is drawn.
    ///
    /// # Errors
    ///
    /// [`OledError::NotInitialized`], [`OledError::PersistFailure`] or
    /// [`OledError::DrawFailure`].
    pub fn update(&mut self) -> Result<()> {
        self.ensure_initialized()?;

        if let Some(path) = &self.buffer_file {
            persist::save(path, &self.buffer).inspect_err(|e| log::warn!("{e}"))?;
        }

        let bounds = self.target.bounds();
        let frame = render::text_frame(&bounds, self.buffer.lines(), &self.font);
        self.draw(bounds, &frame)
    }

    /// Draw an all-off frame over the whole screen. The buffer is untouched.
    pub fn clear_screen(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        let bounds = self.target.bounds();
        self.draw(bounds, &Frame::for_bounds(&bounds))
    }

    /// Rasterize `image` and draw it, bypassing the line buffer.
    ///
    /// The image is cropped to the screen, never scaled.
    pub fn show_image<I>(&mut self, image: &I) -> Result<()>
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        self.ensure_initialized()?;
        let bounds = self.target.bounds();
        let frame = render::render_image(image, &bounds);
        self.draw(bounds, &frame)
    }

    /// Decode the image at `path` (PNG, JPEG, GIF or BMP) and show it.
    ///
    /// # Errors
    ///
    /// [`OledError::NotInitialized`] (checked before the file is touched),
    /// [`OledError::DecodeFailure`] if the file cannot be opened or
    /// decoded, [`OledError::DrawFailure`].
    pub fn show_image_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_initialized()?;
        let path = path.as_ref();
        let image = image::open(path).inspect_err(|e| {
            log::warn!("failed to decode image {}: {e}", path.display());
        })?;
        log::debug!("showing image {}", path.display());
        self.show_image(&image)
    }

    fn draw(&mut self, bounds: Rectangle, frame: &Frame) -> Result<()> {
        self.target
            .draw(bounds, frame, Point::zero())
            .map_err(OledError::DrawFailure)?;
        log::debug!("drew {} lit pixels", frame.count_on());
        Ok(())
    }

    // ── Target access ────────────────────────────────────────────────

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Take the target back, closing nothing.
    pub fn into_target(self) -> T {
        self.target
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
