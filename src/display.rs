//! # Pixel Sinks
//!
//! Everything that can show a [`RenderedImage`]. The clock core only sees the
//! [`PixelSink`] trait; which implementation backs it is decided once at
//! startup by [`open_display`].
//!
//! ## Backends
//!
//! - **Sense HAT**: the `rpisense-fb` kernel driver exposes the LED matrix as
//!   a 64-pixel RGB565 framebuffer. It is found by scanning
//!   `/sys/class/graphics/fb*/name` for `RPi-Sense FB`.
//! - **Terminal emulator**: draws the matrix with 24-bit ANSI colors and
//!   redraws in place, for development machines without a HAT.
//! - **embedded-graphics**: [`DrawTargetSink`] forwards frames to any
//!   `DrawTarget<Color = Rgb888>`, such as an SPI LED-matrix driver.

use std::fmt::Debug;
use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use embedded_graphics::{draw_target::DrawTarget, pixelcolor::Rgb888};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::GRID_CELLS;
use crate::{RenderedImage, Rgb};

/// Name the Sense HAT driver reports for its framebuffer
pub const SENSE_HAT_FB_NAME: &str = "RPi-Sense FB";

const SYSFS_GRAPHICS: &str = "/sys/class/graphics";
const DEV_DIR: &str = "/dev";

/// Sense HAT low-light gamma curve, indexed by 5-bit channel value.
const LOW_LIGHT_GAMMA: [u8; 32] = [
    0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 10,
    10,
];

/// Display failures. Sink write errors are reported by the driver and never
/// stop the clock; `MissingDisplay` at startup does.
#[derive(Error, Debug)]
pub enum DisplayError {
    /// Neither the Sense HAT nor an interactive terminal is available
    #[error("no Sense HAT LED matrix or terminal emulator available")]
    MissingDisplay,

    /// Framebuffer or terminal write failed
    #[error("display IO: {0}")]
    Io(#[from] io::Error),

    /// An embedded-graphics target refused the frame
    #[error("draw target rejected frame: {0}")]
    Draw(String),
}

/// Something that shows one full frame at a time.
pub trait PixelSink {
    /// Replace the displayed frame. May block on hardware IO.
    fn set_pixels(&mut self, image: &RenderedImage) -> Result<(), DisplayError>;

    /// Short backend name for log output
    fn name(&self) -> &'static str;
}

impl<S: PixelSink + ?Sized> PixelSink for Box<S> {
    fn set_pixels(&mut self, image: &RenderedImage) -> Result<(), DisplayError> {
        (**self).set_pixels(image)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Which backend the assembly layer should open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DisplayBackend {
    /// Sense HAT if present, otherwise the terminal emulator
    #[default]
    Auto,
    /// Sense HAT only
    #[value(name = "sensehat")]
    SenseHat,
    /// Terminal emulator only
    Terminal,
}

/// Open the display named by `backend`.
///
/// `Auto` falls back to the terminal only when stdout is interactive, so a
/// headless service without a HAT fails fast with `MissingDisplay`.
pub fn open_display(
    backend: DisplayBackend,
    low_light: bool,
) -> Result<Box<dyn PixelSink>, DisplayError> {
    match backend {
        DisplayBackend::Terminal => Ok(Box::new(TerminalSink::stdout())),
        DisplayBackend::SenseHat => open_sense_hat(low_light),
        DisplayBackend::Auto => {
            auto_fallback(open_sense_hat(low_light), io::stdout().is_terminal())
        }
    }
}

/// Swap a missing Sense HAT for the terminal emulator when someone is watching.
fn auto_fallback(
    sense_hat: Result<Box<dyn PixelSink>, DisplayError>,
    interactive: bool,
) -> Result<Box<dyn PixelSink>, DisplayError> {
    match sense_hat {
        Err(DisplayError::MissingDisplay) if interactive => {
            info!("Sense HAT not found, falling back to terminal emulator");
            Ok(Box::new(TerminalSink::stdout()))
        }
        other => other,
    }
}

#[cfg(all(target_os = "linux", feature = "hardware"))]
fn open_sense_hat(low_light: bool) -> Result<Box<dyn PixelSink>, DisplayError> {
    Ok(Box::new(SenseHatFramebuffer::discover(low_light)?))
}

#[cfg(not(all(target_os = "linux", feature = "hardware")))]
fn open_sense_hat(_low_light: bool) -> Result<Box<dyn PixelSink>, DisplayError> {
    Err(DisplayError::MissingDisplay)
}

/// Pack a color into the Sense HAT's RGB565 word.
///
/// With `low_light` each channel is first reduced to five bits and mapped
/// through the HAT's low-light gamma curve.
pub fn rgb565(color: Rgb, low_light: bool) -> u16 {
    let Rgb(r, g, b) = color;
    let (r, g, b) = if low_light {
        let dim = |channel: u8| LOW_LIGHT_GAMMA[usize::from(channel >> 3)];
        (u16::from(dim(r)), u16::from(dim(g)) << 1, u16::from(dim(b)))
    } else {
        (u16::from(r >> 3), u16::from(g >> 2), u16::from(b >> 3))
    };
    (r & 0x1F) << 11 | (g & 0x3F) << 5 | (b & 0x1F)
}

/// Serialize a frame as the framebuffer expects it: 64 little-endian words.
pub fn encode_frame(image: &RenderedImage, low_light: bool) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(GRID_CELLS * 2);
    for &color in image.colors() {
        bytes.extend_from_slice(&rgb565(color, low_light).to_le_bytes());
    }
    bytes
}

/// The Sense HAT LED matrix via its Linux framebuffer device.
pub struct SenseHatFramebuffer {
    file: File,
    path: PathBuf,
    low_light: bool,
}

impl SenseHatFramebuffer {
    /// Locate the Sense HAT framebuffer on this system.
    pub fn discover(low_light: bool) -> Result<Self, DisplayError> {
        Self::discover_in(Path::new(SYSFS_GRAPHICS), Path::new(DEV_DIR), low_light)
    }

    /// Search `sysfs_graphics` for the Sense HAT and open its node under `dev_dir`.
    pub fn discover_in(
        sysfs_graphics: &Path,
        dev_dir: &Path,
        low_light: bool,
    ) -> Result<Self, DisplayError> {
        let entries = match fs::read_dir(sysfs_graphics) {
            Ok(entries) => entries,
            Err(_) => return Err(DisplayError::MissingDisplay),
        };

        for entry in entries.flatten() {
            let device = entry.file_name();
            let Some(device) = device.to_str() else {
                continue;
            };
            if !device.starts_with("fb") {
                continue;
            }
            let name = fs::read_to_string(entry.path().join("name")).unwrap_or_default();
            if name.trim() == SENSE_HAT_FB_NAME {
                debug!("Sense HAT framebuffer found at {}", device);
                return Self::open(dev_dir.join(device), low_light);
            }
        }
        Err(DisplayError::MissingDisplay)
    }

    /// Open a known framebuffer device.
    pub fn open<P: AsRef<Path>>(path: P, low_light: bool) -> Result<Self, DisplayError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().write(true).open(&path)?;
        Ok(Self {
            file,
            path,
            low_light,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PixelSink for SenseHatFramebuffer {
    fn set_pixels(&mut self, image: &RenderedImage) -> Result<(), DisplayError> {
        let bytes = encode_frame(image, self.low_light);
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&bytes)?;
        self.file.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "SenseHat"
    }
}

/// Terminal stand-in for the LED matrix.
pub struct TerminalSink<W: Write> {
    out: W,
    drawn: bool,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out, drawn: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PixelSink for TerminalSink<W> {
    fn set_pixels(&mut self, image: &RenderedImage) -> Result<(), DisplayError> {
        if self.drawn {
            // Move back to the top of the previous frame
            write!(self.out, "\x1b[{}A", image.rows().count())?;
        }
        for row in image.rows() {
            for &Rgb(r, g, b) in row {
                write!(self.out, "\x1b[38;2;{};{};{}m██", r, g, b)?;
            }
            writeln!(self.out, "\x1b[0m")?;
        }
        self.out.flush()?;
        self.drawn = true;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Emulator"
    }
}

/// Forwards frames to an embedded-graphics draw target at origin (0, 0).
pub struct DrawTargetSink<D> {
    target: D,
}

impl<D> DrawTargetSink<D> {
    pub fn new(target: D) -> Self {
        Self { target }
    }

    pub fn into_inner(self) -> D {
        self.target
    }
}

impl<D> PixelSink for DrawTargetSink<D>
where
    D: DrawTarget<Color = Rgb888>,
    D::Error: Debug,
{
    fn set_pixels(&mut self, image: &RenderedImage) -> Result<(), DisplayError> {
        self.target
            .draw_iter(image.pixels())
            .map_err(|e| DisplayError::Draw(format!("{:?}", e)))
    }

    fn name(&self) -> &'static str {
        "DrawTarget"
    }
}
