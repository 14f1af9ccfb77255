//! # End-to-End Clock Scenarios
//!
//! These tests drive the whole pipeline (configuration, clock face, driver
//! and sinks) with a scripted clock, so they run instantly and without
//! hardware.

use std::cell::Cell;
use std::fs;
use std::time::Duration;

use embedded_graphics::{mock_display::MockDisplay, pixelcolor::Rgb888, prelude::Point};
use led_clock_lib::{
    clock::{ClockDriver, RunSummary, StopHandle, TickOutcome, TimeSource},
    compose::ColorTable,
    config::Config,
    display::{DisplayError, DrawTargetSink, PixelSink, TerminalSink},
    layout::{GlyphTable, PerimeterTopology, FIELD_WIDTH, GRID_WIDTH},
    renderer::{ClockFace, ClockStyle, RenderError},
    ClockReading, RenderedImage, Rgb,
};
use tempfile::NamedTempFile;

const HOUR: i64 = 3_600;
const MINUTE: i64 = 60;

/// Clock that only advances when the driver sleeps.
struct SteppedTime {
    now: Cell<i64>,
}

impl SteppedTime {
    fn at(now: i64) -> Self {
        Self {
            now: Cell::new(now),
        }
    }
}

impl TimeSource for SteppedTime {
    fn now(&self) -> i64 {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + duration.as_secs() as i64);
    }
}

/// Records frames and asks the driver to stop after a fixed count.
struct StoppingSink {
    frames: Vec<RenderedImage>,
    stop_after: usize,
    stop: StopHandle,
}

impl PixelSink for StoppingSink {
    fn set_pixels(&mut self, image: &RenderedImage) -> Result<(), DisplayError> {
        self.frames.push(*image);
        if self.frames.len() >= self.stop_after {
            self.stop.stop();
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Stopping"
    }
}

/// Always fails, like a HAT that was unplugged mid-run.
struct UnpluggedSink;

impl PixelSink for UnpluggedSink {
    fn set_pixels(&mut self, _image: &RenderedImage) -> Result<(), DisplayError> {
        Err(DisplayError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "framebuffer gone",
        )))
    }

    fn name(&self) -> &'static str {
        "Unplugged"
    }
}

fn field_matches_glyph(image: &RenderedImage, key: u8, colors: &ColorTable) -> bool {
    let glyphs = GlyphTable::builtin();
    let glyph = glyphs.get(key).unwrap();
    (0..FIELD_WIDTH).all(|row| {
        (0..FIELD_WIDTH).all(|col| {
            let expected = if glyph[row][col] != 0 {
                colors.number
            } else {
                colors.background
            };
            image.get(row + 1, col + 1) == Some(expected)
        })
    })
}

fn ring_tags_with_color(image: &RenderedImage, color: Rgb) -> Vec<u8> {
    let topology = PerimeterTopology::builtin();
    let mut tags: Vec<u8> = topology
        .rows()
        .iter()
        .flatten()
        .zip(image.colors())
        .filter(|(&tag, &c)| tag != 0 && c == color)
        .map(|(&tag, _)| tag)
        .collect();
    tags.sort_unstable();
    tags
}

/// Style 1 at 14:30: threshold 15, so ring tags 1–15 are lit.
#[test]
fn continuous_arc_at_half_past_two() {
    let colors = ColorTable::default();
    let face = ClockFace::builtin(colors);
    let image = face
        .render(ClockReading::new(14, 30), ClockStyle::ContinuousArc)
        .unwrap();

    assert_eq!(
        ring_tags_with_color(&image, Rgb::BLUE),
        (1..=15).collect::<Vec<u8>>()
    );
    assert_eq!(
        ring_tags_with_color(&image, Rgb::BLACK),
        (16..=28).collect::<Vec<u8>>()
    );
    assert!(field_matches_glyph(&image, 14, &colors));
}

/// Style 2 at 09:05: minute digits in the field, 9 o'clock arc on the ring.
#[test]
fn twelve_hour_arcs_at_five_past_nine() {
    let colors = ColorTable::default();
    let face = ClockFace::builtin(colors);
    let image = face
        .render(ClockReading::new(9, 5), ClockStyle::TwelveHourArcs)
        .unwrap();

    assert_eq!(ring_tags_with_color(&image, Rgb::BLUE), vec![21, 22]);
    // Tags 21 and 22 are the middle of the left edge
    assert_eq!(image.get(3, 0), Some(Rgb::BLUE));
    assert_eq!(image.get(4, 0), Some(Rgb::BLUE));
    assert!(field_matches_glyph(&image, 5, &colors));
}

/// Every style renders every minute of the day into a full frame.
#[test]
fn every_style_covers_the_whole_day() {
    let face = ClockFace::builtin(ColorTable::default());
    for style in ClockStyle::ALL {
        for hour in 0..24 {
            for minute in 0..60 {
                let image = face.render(ClockReading::new(hour, minute), style);
                assert!(
                    image.is_ok(),
                    "{} failed at {:02}:{:02}: {:?}",
                    style,
                    hour,
                    minute,
                    image
                );
            }
        }
    }
}

/// Unknown style 9: each tick fails the same way and nothing reaches the sink,
/// until the style is changed.
#[test]
fn unknown_style_never_writes_until_reconfigured() {
    let mut config = Config::default();
    config.clock.style = 9;
    let stop = StopHandle::new();
    let sink = StoppingSink {
        frames: Vec::new(),
        stop_after: 1,
        stop: stop.clone(),
    };
    let mut driver = ClockDriver::new(
        ClockFace::builtin(config.colors),
        sink,
        SteppedTime::at(10 * HOUR),
        &config.clock,
    )
    .with_stop_handle(stop);

    for _ in 0..3 {
        assert!(matches!(
            driver.tick(),
            TickOutcome::RenderFailed(RenderError::UnknownClockStyle(9))
        ));
    }
    assert!(driver.sink().frames.is_empty());

    driver.set_style(0);
    let summary = driver.run();
    assert_eq!(
        summary,
        RunSummary {
            ticks: 1,
            frames_written: 1,
            render_failures: 0,
            sink_failures: 0,
        }
    );
}

/// Offsets from the config file shift the displayed time.
#[test]
fn config_offsets_reach_the_display() {
    let file = NamedTempFile::new().unwrap();
    fs::write(
        file.path(),
        r#"
[clock]
style = 0
heartbeat = 60
delta_hours = -2
delta_minutes = 10

[colors]
background = [0, 0, 0]
number = [255, 255, 255]
perim = [255, 0, 0]
"#,
    )
    .unwrap();
    let config = Config::load_from_path(file.path());
    assert_eq!(config.colors.perim, Rgb(255, 0, 0));

    let stop = StopHandle::new();
    let sink = StoppingSink {
        frames: Vec::new(),
        stop_after: 3,
        stop: stop.clone(),
    };
    // 12:00 UTC shows as 13:50 with +2h and -10min
    let mut driver = ClockDriver::new(
        ClockFace::builtin(config.colors),
        sink,
        SteppedTime::at(12 * HOUR),
        &config.clock,
    )
    .with_stop_handle(stop);

    let summary = driver.run();
    assert_eq!(summary.frames_written, 3);
    assert_eq!(driver.current_time_string(), "13:52");

    let sink = driver.into_sink();
    let face = ClockFace::builtin(config.colors);
    let expected: Vec<RenderedImage> = [50, 51, 52]
        .iter()
        .map(|&minute| {
            face.render(ClockReading::new(13, minute), ClockStyle::SingleDot)
                .unwrap()
        })
        .collect();
    assert_eq!(sink.frames, expected);
}

/// A failing display is reported every tick but never ends the run early.
#[test]
fn display_failures_do_not_stop_the_clock() {
    let mut config = Config::default();
    config.clock.duration = 4 * MINUTE as u64;
    config.clock.heartbeat = MINUTE as u64;
    let mut driver = ClockDriver::new(
        ClockFace::builtin(config.colors),
        UnpluggedSink,
        SteppedTime::at(0),
        &config.clock,
    );

    let summary = driver.run();
    assert_eq!(summary.ticks, 5);
    assert_eq!(summary.sink_failures, 5);
    assert_eq!(summary.frames_written, 0);
}

/// The terminal emulator shows the same frame the renderer produced.
#[test]
fn terminal_emulator_draws_rendered_frame() {
    let config = Config::default();
    let mut driver = ClockDriver::new(
        ClockFace::builtin(config.colors),
        TerminalSink::new(Vec::new()),
        SteppedTime::at(9 * HOUR + 5 * MINUTE),
        &config.clock,
    );
    assert!(matches!(driver.tick(), TickOutcome::Displayed(_)));

    let output = String::from_utf8(driver.into_sink().into_inner()).unwrap();
    let rows: Vec<&str> = output.lines().collect();
    assert_eq!(rows.len(), GRID_WIDTH);
    // Row 3 starts with the blue 9 o'clock arc
    assert!(rows[3].starts_with("\x1b[38;2;0;0;255m"));
}

/// Frames reach embedded-graphics targets at matrix coordinates.
#[test]
fn draw_target_receives_frame() {
    let config = Config::default();
    let mut driver = ClockDriver::new(
        ClockFace::builtin(config.colors),
        DrawTargetSink::new(MockDisplay::<Rgb888>::new()),
        SteppedTime::at(0),
        &config.clock,
    );
    assert!(matches!(driver.tick(), TickOutcome::Displayed(_)));

    let display = driver.into_sink().into_inner();
    // Midnight on the 12-hour dial lights tags 28 and 1 at the top middle
    assert_eq!(display.get_pixel(Point::new(3, 0)), Some(Rgb888::new(0, 0, 255)));
    assert_eq!(display.get_pixel(Point::new(4, 0)), Some(Rgb888::new(0, 0, 255)));
    assert_eq!(display.get_pixel(Point::new(0, 0)), Some(Rgb888::new(0, 0, 0)));
}
