//! Buffer file synchronisation.
//!
//! The buffer file is plain UTF-8 text: one physical line per display
//! line, joined with `\n`. It is read once when the display initialises
//! and rewritten in full on every commit, which lets separate invocations
//! update individual lines without clobbering the others.

use std::fs;
use std::io;
use std::path::Path;

use crate::buffer::LineBuffer;
use crate::error::{OledError, Result};

/// Load `path` into `buffer`.
///
/// The file is split on `\n` and copied in from line 0; lines past the
/// buffer's capacity are dropped, and buffer lines past the end of the
/// file keep their current content. A missing file is not an error: the
/// buffer is left as it was.
///
/// # Errors
///
/// [`OledError::MissingPath`] for an empty path,
/// [`OledError::PersistFailure`] for any read error other than "not found".
pub fn load(path: &Path, buffer: &mut LineBuffer) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(OledError::MissingPath);
    }
    match fs::read_to_string(path) {
        Ok(data) => {
            buffer.fill_from(data.split('\n'));
            log::debug!("loaded buffer from {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("no buffer file at {}, starting blank", path.display());
            Ok(())
        }
        Err(source) => Err(OledError::PersistFailure {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Overwrite `path` with the buffer's lines joined by `\n`.
///
/// # Errors
///
/// [`OledError::MissingPath`] for an empty path,
/// [`OledError::PersistFailure`] if the write fails.
pub fn save(path: &Path, buffer: &LineBuffer) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(OledError::MissingPath);
    }
    fs::write(path, buffer.joined()).map_err(|source| OledError::PersistFailure {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("saved buffer to {}", path.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Scratch directory under the system temp dir, removed on drop.
    pub(crate) struct Scratch(PathBuf);

    impl Scratch {
        pub(crate) fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "display1306-{}-{}",
                name,
                std::process::id()
            ));
            fs::create_dir_all(&dir).unwrap();
            Scratch(dir)
        }

        pub(crate) fn path(&self, file: &str) -> PathBuf {
            self.0.join(file)
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            fs::remove_dir_all(&self.0).ok();
        }
    }

    #[test]
    fn round_trip() {
        let dir = Scratch::new("persist-round-trip");
        let path = dir.path("buffer.txt");

        let mut original = LineBuffer::new(5);
        original
            .set_lines(0, &["Line 1", "", "Line 3", "Line 4", ""])
            .unwrap();
        save(&path, &original).unwrap();

        let mut restored = LineBuffer::new(5);
        load(&path, &mut restored).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn saved_file_format() {
        let dir = Scratch::new("persist-format");
        let path = dir.path("buffer.txt");
        let mut buf = LineBuffer::new(3);
        buf.set_lines(0, &["a", "b"]).unwrap();
        save(&path, &buf).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\n");
    }

    #[test]
    fn longer_file_is_truncated_to_capacity() {
        let dir = Scratch::new("persist-truncate");
        let path = dir.path("buffer.txt");
        fs::write(&path, "1\n2\n3\n4\n5\n6").unwrap();

        let mut buf = LineBuffer::new(5);
        load(&path, &mut buf).unwrap();
        assert_eq!(buf.lines(), ["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn shorter_file_leaves_tail_blank() {
        let dir = Scratch::new("persist-short");
        let path = dir.path("buffer.txt");
        fs::write(&path, "Line 1\nLine 2\nLine 3").unwrap();

        let mut buf = LineBuffer::new(5);
        load(&path, &mut buf).unwrap();
        assert_eq!(buf.lines(), ["Line 1", "Line 2", "Line 3", "", ""]);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = Scratch::new("persist-missing");
        let mut buf = LineBuffer::new(5);
        buf.set_line(1, "untouched").unwrap();
        load(&dir.path("absent.txt"), &mut buf).unwrap();
        assert_eq!(buf.line(1), Some("untouched"));
    }

    #[test]
    fn empty_path_is_rejected() {
        let mut buf = LineBuffer::new(5);
        assert!(matches!(
            load(Path::new(""), &mut buf),
            Err(OledError::MissingPath)
        ));
        assert!(matches!(
            save(Path::new(""), &buf),
            Err(OledError::MissingPath)
        ));
    }

    #[test]
    fn unreadable_path_is_a_persist_failure() {
        let dir = Scratch::new("persist-dir");
        // A directory cannot be read as a file.
        let mut buf = LineBuffer::new(2);
        let err = load(&dir.path(""), &mut buf).unwrap_err();
        assert!(matches!(err, OledError::PersistFailure { .. }));
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = Scratch::new("persist-nodir");
        let buf = LineBuffer::new(2);
        let err = save(&dir.path("no/such/dir/buffer.txt"), &buf).unwrap_err();
        assert!(matches!(err, OledError::PersistFailure { .. }));
    }
}
