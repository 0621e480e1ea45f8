//! Command-line options and their validation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use display1306::{Font, DEFAULT_FONT_SIZE, DEFAULT_LINE_COUNT};

/// Pause between images when `--image-interval` is not given.
pub const DEFAULT_IMAGE_INTERVAL: Duration = Duration::from_millis(30);

/// Print text or images on an SSD1306 OLED display.
///
/// Text comes from the positional arguments, one per line, or from stdin
/// when there are none.
#[derive(Parser, Debug)]
#[command(name = "display1306", version)]
pub struct Options {
    /// Path to the I2C device
    #[arg(short, long, default_value = "/dev/i2c-1")]
    pub device: PathBuf,

    /// I2C address of the panel (decimal or 0x-prefixed hex)
    #[arg(short, long, default_value = "0x3C", value_parser = parse_address)]
    pub address: u8,

    /// Line number to start printing at (1-based)
    #[arg(short, long, default_value_t = 1)]
    pub line: usize,

    /// Number of text lines on the display
    #[arg(long, default_value_t = DEFAULT_LINE_COUNT)]
    pub lines: usize,

    /// File that keeps the display content between invocations
    #[arg(short, long)]
    pub buffer_file: Option<PathBuf>,

    /// Clear the display before printing
    #[arg(short = 'k', long)]
    pub clear: bool,

    /// Run without hardware, rendering into memory
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// With --dry-run, write the rendered screen to this PNG file
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Built-in face (6x10, 6x13, 7x13, 8x13, 9x15, 10x20) or path to a
    /// TrueType font file
    #[arg(short, long, value_name = "NAME|PATH")]
    pub font: Option<String>,

    /// Font size in points for a TrueType --font [default: 13]
    #[arg(short = 's', long)]
    pub font_size: Option<f32>,

    /// Interpret the arguments as image files and @directives
    #[arg(short, long)]
    pub image: bool,

    /// Pause between images, e.g. 30ms, 1.5s, 2m
    #[arg(long, value_parser = parse_duration)]
    pub image_interval: Option<Duration>,

    /// Cycle through the images until interrupted or --duration expires
    #[arg(long = "loop")]
    pub repeat: bool,

    /// Maximum time to loop for (0 for unlimited)
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Lines of text, or image files with --image
    pub args: Vec<String>,
}

impl Options {
    /// Reject flag combinations that make no sense together.
    pub fn validate(&self) -> Result<()> {
        if self.line == 0 {
            bail!("--line is 1-based; line 0 does not exist");
        }
        if self.image && self.args.is_empty() {
            bail!("--image requires at least one image filename as argument");
        }
        if !self.image {
            if self.repeat {
                bail!("--loop can only be used with --image");
            }
            if self.image_interval.is_some() {
                bail!("--image-interval can only be used with --image");
            }
            if self.duration.is_some() {
                bail!("--duration can only be used with --image");
            }
        }
        if self.image && (self.font.is_some() || self.font_size.is_some()) {
            bail!("--font and --font-size cannot be used with --image");
        }
        if let (Some(name), Some(_)) = (&self.font, self.font_size) {
            if Font::by_name(name).is_some() {
                bail!("--font-size only applies to TrueType font files, not the built-in '{name}'");
            }
        }
        if self.preview.is_some() && !self.dry_run {
            bail!("--preview can only be used with --dry-run");
        }
        Ok(())
    }

    /// The selected font, if any: a built-in face when `--font` names
    /// one, otherwise the TrueType file at that path.
    pub fn font(&self) -> Result<Option<Font>> {
        let Some(name) = &self.font else {
            return Ok(None);
        };
        if let Some(font) = Font::by_name(name) {
            return Ok(Some(font));
        }
        let size = self.font_size.unwrap_or(DEFAULT_FONT_SIZE);
        let font = Font::load(name, size).with_context(|| {
            format!(
                "font '{name}' is neither a built-in face ({}) nor a loadable font file",
                Font::names().collect::<Vec<_>>().join(", ")
            )
        })?;
        Ok(Some(font))
    }

    pub fn image_interval(&self) -> Duration {
        self.image_interval.unwrap_or(DEFAULT_IMAGE_INTERVAL)
    }

    /// Loop deadline; `None` when unlimited.
    pub fn time_limit(&self) -> Option<Duration> {
        self.duration.filter(|d| !d.is_zero())
    }
}

/// Parse an I2C address such as `0x3C` or `60`.
pub fn parse_address(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    match parsed {
        Ok(addr) if addr <= 0x7F => Ok(addr),
        Ok(addr) => Err(format!("{addr:#x} is not a 7-bit I2C address")),
        Err(e) => Err(format!("invalid I2C address '{s}': {e}")),
    }
}

/// Parse a duration with an `h`, `m`, `s` or `ms` unit suffix; a bare `0`
/// is zero.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    let split = s
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(|| format!("missing unit in duration '{s}'"))?;
    let (number, unit) = s.split_at(split);
    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{s}'"))?;
    let scale = match unit {
        "ms" => 0.001,
        "s" => 1.0,
        "m" => 60.0,
        "h" => 3600.0,
        _ => return Err(format!("unknown unit '{unit}' in duration '{s}'")),
    };
    Duration::try_from_secs_f64(value * scale).map_err(|e| format!("invalid duration '{s}': {e}"))
}
