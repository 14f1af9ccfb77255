//! # LED Ring Clock Core Library
//!
//! This library renders the time of day onto an 8×8 RGB LED matrix such as the
//! Raspberry Pi Sense HAT. The matrix is split into two regions:
//!
//! - **Field**: the inner 6×6 block (rows and columns 1–6), which shows a
//!   two-digit glyph
//! - **Perimeter ring**: the 28 outer cells, which show either a minute
//!   marker or an hour arc
//!
//! ## Design Philosophy
//!
//! ### Pure rendering core
//! Turning a clock reading into pixels is a pure function of
//! `(hour, minute, style)`. Masks, color layers and the final image are
//! allocated fresh on every call, so the renderer is re-entrant and trivially
//! testable without hardware.
//!
//! ### Injected configuration
//! Glyphs, the ring topology, arc tables and colors are immutable values
//! handed to [`renderer::ClockFace`] at construction. Built-in tables live in
//! [`layout`] and [`compose::ColorTable::default`].
//!
//! ### Fixed-size output
//! Every frame is a [`RenderedImage`]: exactly 64 colors in row-major order
//! with a top-left origin. Sinks can never receive a malformed frame because
//! the type cannot hold one.
//!
//! ## Data Flow
//! 1. **Driver** ([`clock::ClockDriver`]) samples the time source and applies
//!    the configured offset
//! 2. **Renderer** builds ring and field masks ([`mask`]), projects them to
//!    colors and composites them ([`compose`])
//! 3. **Sink** ([`display::PixelSink`]) pushes the frame to the Sense HAT
//!    framebuffer or the terminal emulator

use chrono::{NaiveTime, Timelike};
use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::layout::{GRID_CELLS, GRID_WIDTH};
use crate::renderer::RenderError;

// Module declarations
pub mod clock;
pub mod compose;
pub mod config;
pub mod display;
pub mod layout;
pub mod mask;
pub mod renderer;

const SECONDS_PER_DAY: i64 = 86_400;

/// A 24-bit color value, one byte per channel.
///
/// Serializes as a three-element array so config files can write
/// `background = [0, 0, 0]`.
///
/// # Example
/// ```
/// use led_clock_lib::Rgb;
///
/// let blue = Rgb(0, 0, 255);
/// assert_eq!(blue.2, 255);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLUE: Rgb = Rgb(0, 0, 255);
}

impl From<Rgb> for Rgb888 {
    fn from(color: Rgb) -> Self {
        Rgb888::new(color.0, color.1, color.2)
    }
}

/// Wall-clock hour and minute as shown on the matrix.
///
/// Produced by the driver from a corrected Unix timestamp. Readings built by
/// hand are validated by the renderer, which rejects `hour >= 24` and
/// `minute >= 60`.
///
/// # Example
/// ```
/// use led_clock_lib::ClockReading;
///
/// let reading = ClockReading::from_timestamp(3_600 * 14 + 60 * 30);
/// assert_eq!(reading, ClockReading::new(14, 30));
/// assert_eq!(reading.to_string(), "14:30");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClockReading {
    /// Hour of day, 0–23
    pub hour: u8,
    /// Minute of hour, 0–59
    pub minute: u8,
}

impl ClockReading {
    pub fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    /// Break a Unix timestamp down to hour and minute, UTC style.
    ///
    /// Only the time of day matters, so negative timestamps wrap into the
    /// previous day rather than failing.
    pub fn from_timestamp(timestamp: i64) -> Self {
        let seconds_of_day = timestamp.rem_euclid(SECONDS_PER_DAY) as u32;
        let time =
            NaiveTime::from_num_seconds_from_midnight_opt(seconds_of_day, 0).unwrap_or_default();
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }
}

impl fmt::Display for ClockReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// One complete frame for the 8×8 matrix.
///
/// Index `i` maps to row `i / 8`, column `i % 8`. The only ways to build a
/// frame are [`RenderedImage::filled`] and the length-checked
/// `TryFrom<Vec<Rgb>>`, so a frame always holds exactly 64 colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderedImage([Rgb; GRID_CELLS]);

impl RenderedImage {
    /// A frame with every cell set to `color`.
    pub fn filled(color: Rgb) -> Self {
        Self([color; GRID_CELLS])
    }

    /// All 64 colors in row-major order.
    pub fn colors(&self) -> &[Rgb; GRID_CELLS] {
        &self.0
    }

    /// Color at `(row, col)`, or `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<Rgb> {
        if row < GRID_WIDTH && col < GRID_WIDTH {
            Some(self.0[row * GRID_WIDTH + col])
        } else {
            None
        }
    }

    /// Iterate rows of the frame, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.0.chunks(GRID_WIDTH)
    }

    /// The frame as embedded-graphics pixels, ready for any `DrawTarget`.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel<Rgb888>> + '_ {
        self.0.iter().enumerate().map(|(index, &color)| {
            let point = Point::new((index % GRID_WIDTH) as i32, (index / GRID_WIDTH) as i32);
            Pixel(point, color.into())
        })
    }
}

impl TryFrom<Vec<Rgb>> for RenderedImage {
    type Error = RenderError;

    fn try_from(colors: Vec<Rgb>) -> Result<Self, Self::Error> {
        let actual = colors.len();
        <[Rgb; GRID_CELLS]>::try_from(colors)
            .map(Self)
            .map_err(|_| RenderError::ShapeMismatch {
                expected: GRID_CELLS,
                actual,
            })
    }
}
