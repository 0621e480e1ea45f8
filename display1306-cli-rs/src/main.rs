//! display1306
//!
//! Command-line front end for the `display1306` library. Prints lines of
//! text or a sequence of images on an SSD1306 panel attached to a Linux
//! I2C bus:
//!
//! 1. Options are parsed and validated; text is read from the arguments
//!    or, if there are none, from stdin (before the bus is touched).
//! 2. The display is initialised, which loads the buffer file if one
//!    was given.
//! 3. Text is written from `--line` onwards and committed once, or the
//!    image sequence is played.
//! 4. The display is closed.
//!
//! With `--dry-run` the panel is replaced by an in-memory target whose
//! final contents are printed as ASCII art or written to `--preview`.

mod options;
mod slideshow;

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use display1306::{Display, DisplayConfig, MemoryHandle, MemoryTarget, RenderTarget};
use log::{error, info, LevelFilter};

use crate::options::Options;
use crate::slideshow::Slideshow;

// ---------------------------------------------------------------------------
// Work items
// ---------------------------------------------------------------------------

/// What to put on the screen once the display is up.
enum Job {
    /// Lines written from the 0-based start line, then one commit.
    Text { start: usize, lines: Vec<String> },
    Images(Slideshow),
}

impl Job {
    fn from_options(options: &Options) -> Result<Self> {
        if options.image {
            let show = Slideshow::new(
                options.args.as_slice(),
                options.image_interval(),
                options.repeat,
                options.time_limit(),
            )?;
            return Ok(Job::Images(show));
        }

        let lines = if options.args.is_empty() {
            io::stdin()
                .lines()
                .collect::<io::Result<Vec<_>>>()
                .context("error reading stdin")?
        } else {
            options.args.clone()
        };
        Ok(Job::Text {
            start: options.line - 1,
            lines,
        })
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let options = Options::parse();
    init_logging(options.verbose);

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise `-v` / `-vv` raise the default `warn` level.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(options: &Options) -> Result<()> {
    options.validate()?;

    let config = DisplayConfig {
        line_count: options.lines,
        font: options.font()?,
        buffer_file: options.buffer_file.clone(),
    };
    let job = Job::from_options(options)?;

    if options.dry_run {
        let (target, handle) = dry_run_target();
        drive(Display::new(target, config), options.clear, &job)?;
        return show_preview(&handle, options);
    }

    run_hardware(options, config, &job)
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

#[cfg(target_os = "linux")]
fn run_hardware(options: &Options, config: DisplayConfig, job: &Job) -> Result<()> {
    use display1306::Ssd1306Target;
    use linux_embedded_hal::I2cdev;

    let i2c = I2cdev::new(&options.device)
        .with_context(|| format!("failed to open I2C device {}", options.device.display()))?;
    info!(
        "using {} at address {:#04x}",
        options.device.display(),
        options.address
    );
    drive(
        Display::new(Ssd1306Target::new(i2c, options.address), config),
        options.clear,
        job,
    )
}

#[cfg(not(target_os = "linux"))]
fn run_hardware(_options: &Options, _config: DisplayConfig, _job: &Job) -> Result<()> {
    anyhow::bail!("hardware output needs a Linux I2C device; use --dry-run")
}

/// A simulated panel that keeps only the current screen, however long a
/// looping slideshow runs.
fn dry_run_target() -> (MemoryTarget, MemoryHandle) {
    let target = MemoryTarget::new();
    let handle = target.handle();
    (target, handle)
}

/// Dump the simulated screen after a dry run.
fn show_preview(handle: &MemoryHandle, options: &Options) -> Result<()> {
    match &options.preview {
        Some(path) => {
            handle
                .save_png(path)
                .with_context(|| format!("failed to write preview {}", path.display()))?;
            info!("preview written to {}", path.display());
        }
        None => print!("{}", handle.to_ascii()),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Display session
// ---------------------------------------------------------------------------

/// Initialise, do the job, and close even when the job failed.
fn drive<T: RenderTarget>(mut display: Display<T>, clear: bool, job: &Job) -> Result<()> {
    display.init().context("failed to initialize display")?;

    let outcome = work(&mut display, clear, job);
    let closed = display.close().context("failed to close display");
    outcome.and(closed)
}

fn work<T: RenderTarget>(display: &mut Display<T>, clear: bool, job: &Job) -> Result<()> {
    if clear {
        display.clear()?;
        display.clear_screen().context("failed to clear display")?;
    }

    match job {
        Job::Images(show) => show.run(display),
        Job::Text { start, lines } => {
            if !lines.is_empty() {
                display
                    .set_lines(*start, lines.as_slice())
                    .context("failed to print lines")?;
            }
            display.update().context("failed to update display")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(start: usize, lines: &[&str]) -> Job {
        Job::Text {
            start,
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn text_job_commits_once_and_closes() {
        let target = MemoryTarget::new();
        let handle = target.handle();
        drive(
            Display::new(target, DisplayConfig::default()),
            false,
            &text(2, &["third", "fourth"]),
        )
        .unwrap();

        assert_eq!(handle.draw_count(), 1);
        assert!(!handle.is_open());
        assert!(handle.screen().count_on() > 0);
    }

    #[test]
    fn clear_blanks_before_writing() {
        let target = MemoryTarget::new();
        let handle = target.handle();
        drive(
            Display::new(target, DisplayConfig::default()),
            true,
            &text(0, &[]),
        )
        .unwrap();

        // clear_screen, then the (empty) commit
        assert_eq!(handle.draw_count(), 2);
        assert_eq!(handle.screen().count_on(), 0);
    }

    #[test]
    fn overflowing_text_is_reported_and_display_still_closes() {
        let target = MemoryTarget::new();
        let handle = target.handle();
        let err = drive(
            Display::new(target, DisplayConfig::default()),
            false,
            &text(4, &["fits", "does not"]),
        )
        .unwrap_err();

        assert!(err.to_string().contains("failed to print lines"));
        assert_eq!(handle.draw_count(), 0);
        assert!(!handle.is_open());
    }

    #[test]
    fn dry_run_target_does_not_accumulate_calls() {
        let (target, handle) = dry_run_target();
        let show = Slideshow::new(
            &["@clear", "@clear"],
            std::time::Duration::ZERO,
            true,
            Some(std::time::Duration::from_millis(50)),
        )
        .unwrap();
        drive(
            Display::new(target, DisplayConfig::default()),
            false,
            &Job::Images(show),
        )
        .unwrap();

        assert!(handle.draw_count() > 1);
        assert!(handle.calls().is_empty());
    }

    #[test]
    fn init_failure_is_fatal() {
        let target = MemoryTarget::new();
        target.handle().fail_open(true);
        let err = drive(
            Display::new(target, DisplayConfig::default()),
            false,
            &text(0, &["x"]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("failed to initialize display"));
    }
}
