//! In-memory render target for tests, previews and dry runs.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_graphics::{prelude::*, primitives::Rectangle};
use image::{GrayImage, ImageFormat, Luma};

use super::{blit, RenderTarget};
use crate::error::TargetError;
use crate::frame::Frame;

/// One call made into a [`MemoryTarget`], in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open,
    Close,
    Bounds,
    Draw { region: Rectangle, offset: Point },
}

#[derive(Debug)]
struct Surface {
    screen: Frame,
    last_frame: Option<Frame>,
    open: bool,
    draws: usize,
    last_draw: Option<(Rectangle, Point)>,
    /// `None` unless the target was built with [`MemoryTarget::recording`].
    calls: Option<Vec<Call>>,
    fail_open: bool,
    fail_draw: bool,
    fail_close: bool,
}

/// Simulated SSD1306: draws land in a frame buffer held in memory.
///
/// The surface lives behind a mutex shared with any number of
/// [`MemoryHandle`]s, so a test or a previewer can inspect what was drawn
/// while a [`Display`](crate::Display) owns the target itself.
///
/// Only targets built with [`recording()`](Self::recording) keep a log of
/// every call. The others hold constant state however long they run.
#[derive(Debug)]
pub struct MemoryTarget {
    bounds: Rectangle,
    surface: Arc<Mutex<Surface>>,
}

/// Shared read/control access to a [`MemoryTarget`]'s surface.
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    surface: Arc<Mutex<Surface>>,
}

impl Surface {
    fn record(&mut self, call: Call) {
        if let Some(calls) = &mut self.calls {
            calls.push(call);
        }
    }
}

fn lock(surface: &Mutex<Surface>) -> MutexGuard<'_, Surface> {
    surface.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryTarget {
    /// A 128×64 simulated panel.
    pub fn new() -> Self {
        Self::with_size(Size::new(128, 64))
    }

    /// A 128×64 simulated panel that logs every call, for tests.
    pub fn recording() -> Self {
        let target = Self::new();
        lock(&target.surface).calls = Some(Vec::new());
        target
    }

    /// A simulated panel of arbitrary size.
    pub fn with_size(size: Size) -> Self {
        let surface = Surface {
            screen: Frame::new(size),
            last_frame: None,
            open: false,
            draws: 0,
            last_draw: None,
            calls: None,
            fail_open: false,
            fail_draw: false,
            fail_close: false,
        };
        Self {
            bounds: Rectangle::new(Point::zero(), size),
            surface: Arc::new(Mutex::new(surface)),
        }
    }

    /// A handle onto this target's surface.
    pub fn handle(&self) -> MemoryHandle {
        MemoryHandle {
            surface: Arc::clone(&self.surface),
        }
    }
}

impl Default for MemoryTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTarget for MemoryTarget {
    fn open(&mut self) -> Result<(), TargetError> {
        let mut s = lock(&self.surface);
        s.record(Call::Open);
        if s.fail_open {
            return Err(TargetError::Simulated("open"));
        }
        s.screen.clear_all();
        s.open = true;
        log::debug!("simulated display opened ({}x{})", self.bounds.size.width, self.bounds.size.height);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TargetError> {
        let mut s = lock(&self.surface);
        s.record(Call::Close);
        if s.fail_close {
            return Err(TargetError::Simulated("close"));
        }
        s.open = false;
        Ok(())
    }

    fn bounds(&self) -> Rectangle {
        lock(&self.surface).record(Call::Bounds);
        self.bounds
    }

    fn draw(
        &mut self,
        region: Rectangle,
        frame: &Frame,
        offset: Point,
    ) -> Result<(), TargetError> {
        let mut s = lock(&self.surface);
        s.record(Call::Draw { region, offset });
        s.draws += 1;
        s.last_draw = Some((region, offset));
        if !s.open {
            return Err(TargetError::NotOpen);
        }
        if s.fail_draw {
            return Err(TargetError::Simulated("draw"));
        }
        let screen = &mut s.screen;
        blit(&self.bounds, &region, frame, offset, |p, on| {
            screen.set(p.x, p.y, on);
        });
        s.last_frame = Some(frame.clone());
        Ok(())
    }
}

impl MemoryHandle {
    /// Every call made into the target so far; always empty unless the
    /// target is [recording](MemoryTarget::recording).
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.surface).calls.clone().unwrap_or_default()
    }

    /// Forget the recorded calls.
    pub fn clear_calls(&self) {
        if let Some(calls) = &mut lock(&self.surface).calls {
            calls.clear();
        }
    }

    /// Number of `draw` calls made so far, successful or not.
    pub fn draw_count(&self) -> usize {
        lock(&self.surface).draws
    }

    /// Region and offset of the most recent `draw` call.
    pub fn last_draw(&self) -> Option<(Rectangle, Point)> {
        lock(&self.surface).last_draw
    }

    /// The frame passed to the most recent successful `draw`.
    pub fn last_frame(&self) -> Option<Frame> {
        lock(&self.surface).last_frame.clone()
    }

    /// Snapshot of the simulated screen.
    pub fn screen(&self) -> Frame {
        lock(&self.surface).screen.clone()
    }

    /// Whether the target is currently open.
    pub fn is_open(&self) -> bool {
        lock(&self.surface).open
    }

    /// Make subsequent `open` calls fail.
    pub fn fail_open(&self, fail: bool) {
        lock(&self.surface).fail_open = fail;
    }

    /// Make subsequent `draw` calls fail.
    pub fn fail_draw(&self, fail: bool) {
        lock(&self.surface).fail_draw = fail;
    }

    /// Make subsequent `close` calls fail.
    pub fn fail_close(&self, fail: bool) {
        lock(&self.surface).fail_close = fail;
    }

    /// The simulated screen as text, `#` for lit pixels.
    pub fn to_ascii(&self) -> String {
        lock(&self.surface).screen.to_ascii()
    }

    /// Write the simulated screen to `path` as a black-and-white PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), TargetError> {
        let screen = self.screen();
        let size = screen.size();
        let img = GrayImage::from_fn(size.width, size.height, |x, y| {
            Luma([if screen.get(x as i32, y as i32) { 255 } else { 0 }])
        });
        img.save_with_format(path, ImageFormat::Png)
            .map_err(|e| match e {
                image::ImageError::IoError(io) => TargetError::Io(io),
                other => TargetError::Io(std::io::Error::other(other)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(target: &MemoryTarget) -> Rectangle {
        target.bounds
    }

    #[test]
    fn defaults_to_128x64() {
        let target = MemoryTarget::new();
        assert_eq!(target.bounds().size, Size::new(128, 64));
    }

    #[test]
    fn draw_before_open_is_rejected() {
        let mut target = MemoryTarget::new();
        let frame = Frame::new(Size::new(128, 64));
        let err = target.draw(full(&target), &frame, Point::zero()).unwrap_err();
        assert!(matches!(err, TargetError::NotOpen));
    }

    #[test]
    fn draw_updates_screen() {
        let mut target = MemoryTarget::new();
        let handle = target.handle();
        target.open().unwrap();

        let mut frame = Frame::new(Size::new(128, 64));
        frame.set(10, 20, true);
        target.draw(full(&target), &frame, Point::zero()).unwrap();

        assert!(handle.screen().get(10, 20));
        assert_eq!(handle.screen().count_on(), 1);
        assert_eq!(handle.last_frame(), Some(frame));
        assert_eq!(handle.draw_count(), 1);
    }

    #[test]
    fn open_blanks_screen() {
        let mut target = MemoryTarget::new();
        let handle = target.handle();
        target.open().unwrap();
        let mut frame = Frame::new(Size::new(128, 64));
        frame.set(0, 0, true);
        target.draw(full(&target), &frame, Point::zero()).unwrap();
        target.close().unwrap();
        target.open().unwrap();
        assert_eq!(handle.screen().count_on(), 0);
    }

    #[test]
    fn injected_failures() {
        let mut target = MemoryTarget::new();
        let handle = target.handle();

        handle.fail_open(true);
        assert!(matches!(target.open(), Err(TargetError::Simulated("open"))));
        assert!(!handle.is_open());
        handle.fail_open(false);
        target.open().unwrap();

        handle.fail_draw(true);
        let frame = Frame::new(Size::new(128, 64));
        assert!(target.draw(full(&target), &frame, Point::zero()).is_err());
        assert_eq!(handle.last_frame(), None);

        handle.fail_close(true);
        assert!(target.close().is_err());
        assert!(handle.is_open());
    }

    #[test]
    fn recording_logs_every_call() {
        let mut target = MemoryTarget::recording();
        let handle = target.handle();
        target.open().unwrap();
        target.bounds();
        target.close().unwrap();
        assert_eq!(handle.calls(), vec![Call::Open, Call::Bounds, Call::Close]);
        handle.clear_calls();
        assert!(handle.calls().is_empty());
    }

    #[test]
    fn plain_target_keeps_no_log() {
        let mut target = MemoryTarget::new();
        let handle = target.handle();
        target.open().unwrap();
        let frame = Frame::new(Size::new(128, 64));
        for _ in 0..10_000 {
            let bounds = target.bounds();
            target.draw(bounds, &frame, Point::zero()).unwrap();
        }
        assert!(handle.calls().is_empty());
        assert_eq!(handle.draw_count(), 10_000);
        assert_eq!(handle.last_draw(), Some((full(&target), Point::zero())));
    }

    #[test]
    fn partial_region_draw() {
        let mut target = MemoryTarget::with_size(Size::new(8, 8));
        let handle = target.handle();
        target.open().unwrap();

        let mut frame = Frame::new(Size::new(2, 2));
        frame.set(0, 0, true);
        frame.set(1, 1, true);
        let region = Rectangle::new(Point::new(4, 4), Size::new(2, 2));
        target.draw(region, &frame, Point::zero()).unwrap();

        let screen = handle.screen();
        assert!(screen.get(4, 4));
        assert!(screen.get(5, 5));
        assert_eq!(screen.count_on(), 2);
        assert_eq!(handle.last_draw(), Some((region, Point::zero())));
    }

    #[test]
    fn png_preview_round_trips_through_image() {
        let dir = std::env::temp_dir().join(format!("display1306-png-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("preview.png");

        let mut target = MemoryTarget::with_size(Size::new(4, 2));
        let handle = target.handle();
        target.open().unwrap();
        let mut frame = Frame::new(Size::new(4, 2));
        frame.set(3, 1, true);
        target.draw(full(&target), &frame, Point::zero()).unwrap();
        handle.save_png(&path).unwrap();

        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(img.get_pixel(3, 1).0, [255]);
        assert_eq!(img.get_pixel(0, 0).0, [0]);
        std::fs::remove_dir_all(&dir).ok();
    }
}
