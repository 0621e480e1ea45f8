//! Image sequences: files interleaved with `@` directives.
//!
//! ```text
//! display1306 -i intro.png @pause=2s @interval=100ms f1.png f2.png @clear
//! ```

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use display1306::{Display, RenderTarget};
use log::{debug, info};

use crate::options::parse_duration;

/// One entry of an image sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// `@clear`: blank the screen.
    Clear,
    /// `@interval=<DUR>`: pause between later images.
    Interval(Duration),
    /// `@pause=<DUR>`: sleep once.
    Pause(Duration),
    /// Any other argument: an image file.
    Show(PathBuf),
}

impl Step {
    pub fn parse(arg: &str) -> Result<Self> {
        let Some(directive) = arg.strip_prefix('@') else {
            return Ok(Step::Show(PathBuf::from(arg)));
        };
        let (name, value) = match directive.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (directive, None),
        };
        let duration = |value: Option<&str>| -> Result<Duration> {
            let Some(value) = value else {
                bail!("@{name} requires a value: @{name}=duration");
            };
            parse_duration(value)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid {name} duration '{value}'"))
        };
        match name {
            "clear" => Ok(Step::Clear),
            "interval" => Ok(Step::Interval(duration(value)?)),
            "pause" => Ok(Step::Pause(duration(value)?)),
            _ => bail!("unknown command: {arg}"),
        }
    }

    /// Directives that only change timing are not followed by the
    /// inter-image pause.
    fn is_timing(&self) -> bool {
        matches!(self, Step::Interval(_) | Step::Pause(_))
    }
}

/// A parsed image sequence and how to play it.
#[derive(Debug)]
pub struct Slideshow {
    steps: Vec<Step>,
    interval: Duration,
    repeat: bool,
    limit: Option<Duration>,
}

impl Slideshow {
    /// Parse every argument up front so a bad directive fails before the
    /// first image is shown.
    ///
    /// `limit` only applies when `repeat` is set.
    pub fn new<S: AsRef<str>>(
        args: &[S],
        interval: Duration,
        repeat: bool,
        limit: Option<Duration>,
    ) -> Result<Self> {
        let steps = args
            .iter()
            .map(|arg| {
                let arg = arg.as_ref();
                Step::parse(arg).with_context(|| format!("failed to process command '{arg}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            steps,
            interval,
            repeat,
            limit,
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Play the sequence on an initialised display.
    ///
    /// After each image or `@clear` the player sleeps for the current
    /// interval, unless the sequence has a single entry. With `repeat`
    /// the sequence starts over until `limit` has elapsed; without a
    /// limit it never returns on its own.
    pub fn run<T: RenderTarget>(&self, display: &mut Display<T>) -> Result<()> {
        let started = Instant::now();
        let mut interval = self.interval;

        loop {
            for step in &self.steps {
                match step {
                    Step::Clear => display.clear_screen().context("failed to clear display")?,
                    Step::Interval(d) => {
                        interval = *d;
                        info!("updated image interval to {interval:?}");
                    }
                    Step::Pause(d) => {
                        info!("pausing for {d:?}");
                        thread::sleep(*d);
                    }
                    Step::Show(path) => {
                        debug!("showing {}", path.display());
                        display
                            .show_image_file(path)
                            .with_context(|| format!("failed to display image {}", path.display()))?;
                    }
                }
                if step.is_timing() {
                    continue;
                }

                if self.steps.len() > 1 {
                    thread::sleep(interval);
                }

                if self.repeat && self.limit.is_some_and(|limit| started.elapsed() >= limit) {
                    info!("loop duration reached after {:?}", started.elapsed());
                    return Ok(());
                }
            }
            if !self.repeat {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use display1306::{MemoryHandle, MemoryTarget};

    struct Scratch(PathBuf);

    impl Scratch {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "display1306-cli-{}-{}",
                name,
                std::process::id()
            ));
            std::fs::create_dir_all(&dir).unwrap();
            Scratch(dir)
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.0).ok();
        }
    }

    fn display() -> (Display<MemoryTarget>, MemoryHandle) {
        let target = MemoryTarget::new();
        let handle = target.handle();
        let mut display = Display::builder(target).build();
        display.init().unwrap();
        (display, handle)
    }

    /// Render some text and save the simulated screen as a PNG fixture.
    fn fixture(dir: &Scratch) -> PathBuf {
        let (mut display, handle) = display();
        display.set_line(0, "img").unwrap();
        display.update().unwrap();
        let path = dir.0.join("fixture.png");
        handle.save_png(&path).unwrap();
        path
    }

    #[test]
    fn parses_directives() {
        assert_eq!(Step::parse("@clear").unwrap(), Step::Clear);
        assert_eq!(
            Step::parse("@interval=100ms").unwrap(),
            Step::Interval(Duration::from_millis(100))
        );
        assert_eq!(
            Step::parse("@pause=2s").unwrap(),
            Step::Pause(Duration::from_secs(2))
        );
        assert_eq!(
            Step::parse("pics/a.png").unwrap(),
            Step::Show(PathBuf::from("pics/a.png"))
        );
    }

    #[test]
    fn rejects_bad_directives() {
        assert!(Step::parse("@interval").is_err());
        assert!(Step::parse("@pause=soon").is_err());
        let err = Step::parse("@explode").unwrap_err();
        assert!(err.to_string().contains("unknown command"));
    }

    #[test]
    fn bad_directive_fails_before_playing() {
        let err = Slideshow::new(&["a.png", "@bogus"], Duration::ZERO, false, None).unwrap_err();
        assert!(format!("{err:#}").contains("@bogus"));
    }

    #[test]
    fn shows_images_then_clears() {
        let dir = Scratch::new("slideshow-show");
        let image = fixture(&dir);
        let (mut display, handle) = display();
        let image = image.to_string_lossy().into_owned();

        let show = Slideshow::new(&[image.as_str()], Duration::ZERO, false, None).unwrap();
        show.run(&mut display).unwrap();
        assert_eq!(handle.draw_count(), 1);
        assert!(handle.screen().count_on() > 0);

        let show = Slideshow::new(&[image.as_str(), "@clear"], Duration::ZERO, false, None).unwrap();
        show.run(&mut display).unwrap();
        assert_eq!(handle.draw_count(), 3);
        assert_eq!(handle.screen().count_on(), 0);
    }

    #[test]
    fn timing_directives_do_not_draw() {
        let (mut display, handle) = display();
        let show = Slideshow::new(
            &["@interval=1ms", "@pause=1ms", "@clear"],
            Duration::ZERO,
            false,
            None,
        )
        .unwrap();
        show.run(&mut display).unwrap();
        assert_eq!(handle.draw_count(), 1);
    }

    #[test]
    fn loop_stops_at_the_limit() {
        let (mut display, handle) = display();
        let show = Slideshow::new(
            &["@clear", "@clear", "@clear"],
            Duration::ZERO,
            true,
            Some(Duration::ZERO),
        )
        .unwrap();
        show.run(&mut display).unwrap();
        assert_eq!(handle.draw_count(), 1);
    }

    #[test]
    fn missing_image_names_the_file() {
        let (mut display, _) = display();
        let show = Slideshow::new(&["/no/such/image.png"], Duration::ZERO, false, None).unwrap();
        let err = show.run(&mut display).unwrap_err();
        assert!(err.to_string().contains("/no/such/image.png"));
    }
}
