//! Fixed-capacity line buffer holding the logical screen content.

use crate::error::{OledError, Result};

/// Ordered, fixed-length sequence of text lines.
///
/// The buffer always holds exactly [`capacity`](Self::capacity) entries;
/// a blank line is the empty string. Writes beyond the capacity are
/// rejected rather than truncated, and multi-line writes are
/// all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineBuffer {
    lines: Vec<String>,
}

impl LineBuffer {
    /// A buffer of `capacity` empty lines.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: vec![String::new(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.lines.len()
    }

    /// Set every line to the empty string.
    pub fn clear(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
    }

    /// Replace line `index`.
    ///
    /// # Errors
    ///
    /// [`OledError::OutOfRange`] if `index >= capacity`; the buffer is
    /// left unchanged.
    pub fn set_line(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        let capacity = self.capacity();
        let slot = self
            .lines
            .get_mut(index)
            .ok_or(OledError::OutOfRange { index, capacity })?;
        *slot = text.into();
        Ok(())
    }

    /// Replace the lines `start..start + texts.len()`.
    ///
    /// # Errors
    ///
    /// [`OledError::Overflow`] if the run would end past the last line.
    /// The check happens before any line is touched.
    pub fn set_lines<S: AsRef<str>>(&mut self, start: usize, texts: &[S]) -> Result<()> {
        let capacity = self.capacity();
        let fits = start
            .checked_add(texts.len())
            .is_some_and(|end| end <= capacity);
        if !fits {
            return Err(OledError::Overflow {
                start,
                count: texts.len(),
                capacity,
            });
        }

        for (slot, text) in self.lines[start..].iter_mut().zip(texts) {
            text.as_ref().clone_into(slot);
        }
        Ok(())
    }

    /// Copy `lines` in from the top, dropping any beyond the capacity.
    /// Lines past the end of `lines` keep their current content.
    pub fn fill_from<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (slot, text) in self.lines.iter_mut().zip(lines) {
            *slot = text.into();
        }
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined with `\n`, no trailing terminator.
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }
}
