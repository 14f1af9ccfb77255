//! # Clock Face Rendering
//!
//! Dispatches a clock reading to one of four styles. Each style decides
//! which quantity the 6×6 field shows as digits and how the perimeter ring
//! encodes the other:
//!
//! | code | field  | ring                                   |
//! |------|--------|----------------------------------------|
//! | 0    | hour   | minute as a single dot                 |
//! | 1    | hour   | minute as a growing arc                |
//! | 2    | minute | hour on a 12-arc dial                  |
//! | 3    | minute | hour on a 24-arc dial                  |
//!
//! Styles are chosen per call; nothing carries over between renders.

use std::fmt;

use thiserror::Error;

use crate::compose::{composite, project, ColorTable};
use crate::layout::{GlyphTable, MembershipTable, PerimeterTopology};
use crate::mask::{
    field_mask, glyph_mask, minute_threshold, perimeter_membership_mask, perimeter_threshold_mask,
};
use crate::{ClockReading, RenderedImage};

/// Errors raised while turning a reading into a frame.
///
/// All of these come from static configuration rather than transient faults,
/// so callers should not retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A glyph or arc lookup missed, or the reading is out of range
    #[error("invalid render input: {0}")]
    InvalidRenderInput(String),

    /// Two layers or masks disagree on cell count
    #[error("shape mismatch: expected {expected} cells, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Style code outside 0–3
    #[error("unknown clock style {0}")]
    UnknownClockStyle(u8),
}

/// How the field and ring share the reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClockStyle {
    /// Hour digits, minute as a single ring dot
    SingleDot,
    /// Hour digits, minute as a continuous ring arc
    ContinuousArc,
    /// Minute digits, hour as one of 12 ring arcs
    TwelveHourArcs,
    /// Minute digits, hour as one of 24 ring arcs
    TwentyFourHourArcs,
}

impl ClockStyle {
    pub const ALL: [ClockStyle; 4] = [
        ClockStyle::SingleDot,
        ClockStyle::ContinuousArc,
        ClockStyle::TwelveHourArcs,
        ClockStyle::TwentyFourHourArcs,
    ];

    /// Numeric code used in configuration files and on the command line.
    pub fn code(self) -> u8 {
        match self {
            ClockStyle::SingleDot => 0,
            ClockStyle::ContinuousArc => 1,
            ClockStyle::TwelveHourArcs => 2,
            ClockStyle::TwentyFourHourArcs => 3,
        }
    }
}

impl TryFrom<u8> for ClockStyle {
    type Error = RenderError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ClockStyle::SingleDot),
            1 => Ok(ClockStyle::ContinuousArc),
            2 => Ok(ClockStyle::TwelveHourArcs),
            3 => Ok(ClockStyle::TwentyFourHourArcs),
            other => Err(RenderError::UnknownClockStyle(other)),
        }
    }
}

impl fmt::Display for ClockStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClockStyle::SingleDot => "single dot",
            ClockStyle::ContinuousArc => "continuous arc",
            ClockStyle::TwelveHourArcs => "12-hour arcs",
            ClockStyle::TwentyFourHourArcs => "24-hour arcs",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// Immutable rendering setup: tables and colors injected once.
#[derive(Clone, Debug)]
pub struct ClockFace {
    glyphs: GlyphTable,
    topology: PerimeterTopology,
    colors: ColorTable,
    twelve_hour_arcs: MembershipTable,
    twenty_four_hour_arcs: MembershipTable,
}

impl ClockFace {
    /// Build a face with the built-in arc tables.
    pub fn new(glyphs: GlyphTable, topology: PerimeterTopology, colors: ColorTable) -> Self {
        Self {
            glyphs,
            topology,
            colors,
            twelve_hour_arcs: MembershipTable::twelve_hour(),
            twenty_four_hour_arcs: MembershipTable::twenty_four_hour(),
        }
    }

    /// Built-in glyphs and topology with the given colors.
    pub fn builtin(colors: ColorTable) -> Self {
        Self::new(GlyphTable::builtin(), PerimeterTopology::builtin(), colors)
    }

    /// Replace the arc tables used by the two hour-arc styles.
    pub fn with_arc_tables(
        mut self,
        twelve_hour: MembershipTable,
        twenty_four_hour: MembershipTable,
    ) -> Self {
        self.twelve_hour_arcs = twelve_hour;
        self.twenty_four_hour_arcs = twenty_four_hour;
        self
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    /// Render a reading in the style named by a raw configuration code.
    pub fn render_code(&self, reading: ClockReading, code: u8) -> Result<RenderedImage, RenderError> {
        self.render(reading, ClockStyle::try_from(code)?)
    }

    /// Render one frame.
    pub fn render(
        &self,
        reading: ClockReading,
        style: ClockStyle,
    ) -> Result<RenderedImage, RenderError> {
        if reading.hour >= 24 || reading.minute >= 60 {
            return Err(RenderError::InvalidRenderInput(format!(
                "reading {} is not a time of day",
                reading
            )));
        }

        let (field_key, ring_mask) = match style {
            ClockStyle::SingleDot | ClockStyle::ContinuousArc => {
                let threshold = minute_threshold(reading.minute);
                let is_line = style == ClockStyle::ContinuousArc;
                (
                    reading.hour,
                    perimeter_threshold_mask(&self.topology, threshold, is_line),
                )
            }
            ClockStyle::TwelveHourArcs => (
                reading.minute,
                perimeter_membership_mask(&self.topology, reading.hour % 12, &self.twelve_hour_arcs)?,
            ),
            ClockStyle::TwentyFourHourArcs => (
                reading.minute,
                perimeter_membership_mask(
                    &self.topology,
                    reading.hour % 24,
                    &self.twenty_four_hour_arcs,
                )?,
            ),
        };

        let glyph = self.glyphs.get(field_key)?;
        let field = field_mask(&glyph_mask(glyph))?;

        let colors = &self.colors;
        let ring_layer = project(&ring_mask, colors.background, colors.perim);
        let field_layer = project(&field, colors.background, colors.number);
        let image = composite(&ring_layer, &field_layer, colors.background)?;

        RenderedImage::try_from(image)
    }
}
