//! Error types for the display and its render targets.

use std::io;
use std::path::PathBuf;

use display_interface::DisplayError;

/// Errors reported by a [`RenderTarget`](crate::target::RenderTarget).
///
/// The `ssd1306` crate wraps all underlying I2C bus errors into
/// [`DisplayError`], so this enum is non-generic and every backend shares it.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// Display interface error (wraps I2C and other bus-level failures).
    #[error("display interface error: {0:?}")]
    Interface(DisplayError),
    /// Display hardware did not respond to initialisation; carries the
    /// bus error of the failed command.
    #[error("display did not respond to initialisation: {0:?}")]
    InitializationFailed(DisplayError),
    /// A draw was attempted on a target that is not open.
    #[error("render target is not open")]
    NotOpen,
    /// File-level failure of a file-backed target (e.g. a PNG preview).
    #[error("render target I/O failed: {0}")]
    Io(#[from] io::Error),
    /// Failure injected into a simulated target.
    #[error("simulated {0} failure")]
    Simulated(&'static str),
}

impl From<DisplayError> for TargetError {
    fn from(e: DisplayError) -> Self {
        TargetError::Interface(e)
    }
}

/// Errors that can occur during display operations.
///
/// Every variant names the operation that failed; the resource involved
/// (line index, file path, render target error) travels with it.
#[derive(Debug, thiserror::Error)]
pub enum OledError {
    /// An operation was attempted before [`Display::init()`](crate::Display::init)
    /// succeeded.
    #[error("display has not been initialized")]
    NotInitialized,
    /// Single-line write beyond the buffer capacity.
    #[error("request to draw on line {index} but display only has {capacity} lines")]
    OutOfRange { index: usize, capacity: usize },
    /// Multi-line write that would run past the last line.
    #[error("{count} lines starting at line {start} would overflow a display of {capacity} lines")]
    Overflow {
        start: usize,
        count: usize,
        capacity: usize,
    },
    /// The render target failed to open.
    #[error("failed to initialize device: {0}")]
    InitFailure(#[source] TargetError),
    /// The render target rejected a draw.
    #[error("failed to draw on display: {0}")]
    DrawFailure(#[source] TargetError),
    /// The render target failed to close.
    #[error("failed to close device: {0}")]
    CloseFailure(#[source] TargetError),
    /// Reading or writing the buffer file failed.
    #[error("buffer file {}: {source}", path.display())]
    PersistFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A buffer file operation was given an empty path.
    #[error("buffer file path is empty")]
    MissingPath,
    /// The image source could not be opened or decoded.
    #[error("failed to decode image: {0}")]
    DecodeFailure(#[from] image::ImageError),
    /// A font file could not be read.
    #[error("failed to read font {}: {source}", path.display())]
    FontFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Font data was rejected by the TrueType parser, or the size is unusable.
    #[error("invalid font: {0}")]
    InvalidFont(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, OledError>;

#[cfg(feature = "defmt")]
impl defmt::Format for TargetError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            TargetError::Interface(_e) => defmt::write!(f, "Display interface error"),
            TargetError::InitializationFailed(_e) => defmt::write!(f, "Initialization failed"),
            TargetError::NotOpen => defmt::write!(f, "Not open"),
            TargetError::Io(_e) => defmt::write!(f, "I/O error"),
            TargetError::Simulated(op) => defmt::write!(f, "Simulated {} failure", op),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for OledError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            OledError::NotInitialized => defmt::write!(f, "Not initialized"),
            OledError::OutOfRange { index, capacity } => {
                defmt::write!(f, "Line {} out of range ({} lines)", index, capacity)
            }
            OledError::Overflow {
                start,
                count,
                capacity,
            } => defmt::write!(
                f,
                "{} lines at {} overflow {} lines",
                count,
                start,
                capacity
            ),
            OledError::InitFailure(e) => defmt::write!(f, "Init failed: {}", e),
            OledError::DrawFailure(e) => defmt::write!(f, "Draw failed: {}", e),
            OledError::CloseFailure(e) => defmt::write!(f, "Close failed: {}", e),
            OledError::PersistFailure { .. } => defmt::write!(f, "Buffer file error"),
            OledError::MissingPath => defmt::write!(f, "Missing buffer file path"),
            OledError::DecodeFailure(_) => defmt::write!(f, "Image decode failed"),
            OledError::FontFailure { .. } => defmt::write!(f, "Font file error"),
            OledError::InvalidFont(reason) => defmt::write!(f, "Invalid font: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn out_of_range_message_names_line_and_capacity() {
        let e = OledError::OutOfRange {
            index: 7,
            capacity: 5,
        };
        assert_eq!(
            e.to_string(),
            "request to draw on line 7 but display only has 5 lines"
        );
    }

    #[test]
    fn draw_failure_chains_target_error() {
        let e = OledError::DrawFailure(TargetError::NotOpen);
        assert!(e.to_string().contains("failed to draw on display"));
        let source = e.source().expect("source");
        assert_eq!(source.to_string(), "render target is not open");
    }

    #[test]
    fn persist_failure_names_path() {
        let e = OledError::PersistFailure {
            path: PathBuf::from("/tmp/buf.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.to_string().contains("/tmp/buf.txt"));
    }

    #[test]
    fn init_failure_keeps_bus_error() {
        let e = OledError::InitFailure(TargetError::InitializationFailed(
            DisplayError::BusWriteError,
        ));
        let source = e.source().expect("source");
        assert!(source.to_string().contains("BusWriteError"));
    }

    #[test]
    fn interface_errors_convert() {
        let e: TargetError = DisplayError::BusWriteError.into();
        assert!(matches!(e, TargetError::Interface(DisplayError::BusWriteError)));
    }
}
