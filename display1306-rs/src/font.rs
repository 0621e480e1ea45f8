//! Font selection and cached vertical metrics.
//!
//! A [`Font`] is either one of the built-in monospace bitmap faces from
//! `embedded-graphics` or a TrueType face rasterized by `fontdue` at a
//! fixed pixel size (points at 72 DPI).

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use embedded_graphics::mono_font::{ascii, MonoFont};

use crate::error::{OledError, Result};

/// Built-in faces, selectable by name.
const FACES: &[(&str, &MonoFont<'static>)] = &[
    ("6x10", &ascii::FONT_6X10),
    ("6x13", &ascii::FONT_6X13),
    ("7x13", &ascii::FONT_7X13),
    ("8x13", &ascii::FONT_8X13),
    ("9x15", &ascii::FONT_9X15),
    ("10x20", &ascii::FONT_10X20),
];

/// Point size used when a TrueType face is loaded without one.
pub const DEFAULT_FONT_SIZE: f32 = 13.0;

/// The glyph source behind a [`Font`].
#[derive(Clone)]
pub enum Face {
    /// A fixed-cell bitmap face.
    Mono(&'static MonoFont<'static>),
    /// A scalable outline face and the pixel size it is drawn at.
    TrueType {
        font: Arc<fontdue::Font>,
        size: f32,
    },
}

/// A face plus the metrics the text rasterizer needs.
///
/// `line_height` and `descent` are derived once, when the font is
/// selected, so every commit stacks lines identically.
#[derive(Clone)]
pub struct Font {
    face: Face,
    line_height: u32,
    descent: u32,
}

impl Font {
    /// Wrap a bitmap face and derive its metrics.
    ///
    /// Line height is the glyph cell height; descent is the number of
    /// cell rows below the baseline row.
    pub fn new(face: &'static MonoFont<'static>) -> Self {
        let height = face.character_size.height;
        Self {
            face: Face::Mono(face),
            line_height: height,
            descent: height.saturating_sub(face.baseline + 1),
        }
    }

    /// Parse TrueType (or OpenType) data and fix it at `size` pixels.
    ///
    /// Line height is the face's line advance (ascent − descent + gap)
    /// rounded up; descent is the face's descent rounded to whole pixels.
    ///
    /// # Errors
    ///
    /// [`OledError::InvalidFont`] if `size` is not a positive number, the
    /// data does not parse, or the face has no horizontal metrics.
    pub fn from_ttf(data: &[u8], size: f32) -> Result<Self> {
        if !(size.is_finite() && size > 0.0) {
            return Err(OledError::InvalidFont("font size must be positive"));
        }
        let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
            .map_err(OledError::InvalidFont)?;
        let metrics = font
            .horizontal_line_metrics(size)
            .ok_or(OledError::InvalidFont("font has no horizontal metrics"))?;

        Ok(Self {
            line_height: metrics.new_line_size.ceil().max(1.0) as u32,
            descent: (-metrics.descent).round().max(0.0) as u32,
            face: Face::TrueType {
                font: Arc::new(font),
                size,
            },
        })
    }

    /// Read a font file and load it with [`from_ttf`](Self::from_ttf).
    ///
    /// # Errors
    ///
    /// [`OledError::FontFailure`] if the file cannot be read, otherwise as
    /// [`from_ttf`](Self::from_ttf).
    pub fn load(path: impl AsRef<Path>, size: f32) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| OledError::FontFailure {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Self::from_ttf(&data, size)?;
        log::debug!("loaded {} at {size}px: {font:?}", path.display());
        Ok(font)
    }

    /// Look up a built-in face by name (`"6x10"`, `"7x13"`, ...).
    pub fn by_name(name: &str) -> Option<Self> {
        FACES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, face)| Self::new(*face))
    }

    /// Names accepted by [`by_name`](Self::by_name).
    pub fn names() -> impl Iterator<Item = &'static str> {
        FACES.iter().map(|(n, _)| *n)
    }

    pub fn face(&self) -> &Face {
        &self.face
    }

    pub fn line_height(&self) -> u32 {
        self.line_height
    }

    pub fn descent(&self) -> u32 {
        self.descent
    }

    /// Y coordinate of the baseline of line `index` (0-based).
    ///
    /// Typographic convention: the baseline is the boundary below the
    /// glyph body, so this is the first pixel row of the descent.
    pub fn baseline_y(&self, index: usize) -> i32 {
        self.line_height as i32 * (index as i32 + 1) - self.descent as i32
    }
}

impl Default for Font {
    /// 7×13, the classic fixed face that fits five lines on a 64 px panel.
    fn default() -> Self {
        Self::new(&ascii::FONT_7X13)
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Font");
        match &self.face {
            Face::Mono(face) => s.field("cell", &face.character_size),
            Face::TrueType { size, .. } => s.field("truetype_px", size),
        };
        s.field("line_height", &self.line_height)
            .field("descent", &self.descent)
            .finish()
    }
}
