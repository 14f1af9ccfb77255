//! # Matrix Layout Tables
//!
//! Static configuration for the 8×8 matrix: where the perimeter ring runs,
//! which ring cells belong to each hour arc, and the digit glyphs drawn in
//! the 6×6 field.
//!
//! ## Ring numbering
//!
//! Ring cells are tagged `1..=28` clockwise, starting just right of
//! 12 o'clock. Field cells carry tag `0`:
//!
//! ```text
//! 25 26 27 28  1  2  3  4
//! 24  .  .  .  .  .  .  5
//! 23  .  .  .  .  .  .  6
//! 22  .  .  .  .  .  .  7
//! 21  .  .  .  .  .  .  8
//! 20  .  .  .  .  .  .  9
//! 19  .  .  .  .  .  . 10
//! 18 17 16 15 14 13 12 11
//! ```
//!
//! Arc tables name ring tags, not grid indices, so they stay valid for any
//! topology that uses the same numbering.

use std::collections::BTreeMap;

use crate::renderer::RenderError;

/// Cells per matrix row and column
pub const GRID_WIDTH: usize = 8;
/// Cells in the whole matrix
pub const GRID_CELLS: usize = GRID_WIDTH * GRID_WIDTH;
/// Cells per field row and column
pub const FIELD_WIDTH: usize = 6;
/// Cells in the inner field
pub const FIELD_CELLS: usize = FIELD_WIDTH * FIELD_WIDTH;
/// Cells on the perimeter ring
pub const RING_CELLS: usize = GRID_CELLS - FIELD_CELLS;

const PERIMETER: [[u8; GRID_WIDTH]; GRID_WIDTH] = [
    [25, 26, 27, 28, 1, 2, 3, 4],
    [24, 0, 0, 0, 0, 0, 0, 5],
    [23, 0, 0, 0, 0, 0, 0, 6],
    [22, 0, 0, 0, 0, 0, 0, 7],
    [21, 0, 0, 0, 0, 0, 0, 8],
    [20, 0, 0, 0, 0, 0, 0, 9],
    [19, 0, 0, 0, 0, 0, 0, 10],
    [18, 17, 16, 15, 14, 13, 12, 11],
];

/// One arc per hour on a 12-hour dial. Neighbouring arcs share an edge cell
/// where an hour spans three cells.
pub const TWELVE_HOUR_ARCS: [&[u8]; 12] = [
    &[28, 1],
    &[2, 3, 4],
    &[4, 5, 6],
    &[7, 8],
    &[9, 10, 11],
    &[11, 12, 13],
    &[14, 15],
    &[16, 17, 18],
    &[18, 19, 20],
    &[21, 22],
    &[23, 24, 25],
    &[25, 26, 27],
];

/// One arc per hour on a 24-hour dial. Hours 0, 6, 12 and 18 sit on the same
/// cells as 12, 3, 6 and 9 o'clock of the 12-hour dial.
pub const TWENTY_FOUR_HOUR_ARCS: [&[u8]; 24] = [
    &[28, 1],
    &[1, 2],
    &[2, 3],
    &[4, 5],
    &[5, 6],
    &[6, 7],
    &[7, 8],
    &[8, 9],
    &[9, 10],
    &[11, 12],
    &[12, 13],
    &[13, 14],
    &[14, 15],
    &[15, 16],
    &[16, 17],
    &[18, 19],
    &[19, 20],
    &[20, 21],
    &[21, 22],
    &[22, 23],
    &[23, 24],
    &[25, 26],
    &[26, 27],
    &[27, 28],
];

/// 3×5 digit font used to build the default glyph table.
const DIGITS: [[[u8; 3]; 5]; 10] = [
    [[1, 1, 1], [1, 0, 1], [1, 0, 1], [1, 0, 1], [1, 1, 1]],
    [[0, 1, 0], [1, 1, 0], [0, 1, 0], [0, 1, 0], [1, 1, 1]],
    [[1, 1, 1], [0, 0, 1], [1, 1, 1], [1, 0, 0], [1, 1, 1]],
    [[1, 1, 1], [0, 0, 1], [1, 1, 1], [0, 0, 1], [1, 1, 1]],
    [[1, 0, 1], [1, 0, 1], [1, 1, 1], [0, 0, 1], [0, 0, 1]],
    [[1, 1, 1], [1, 0, 0], [1, 1, 1], [0, 0, 1], [1, 1, 1]],
    [[1, 1, 1], [1, 0, 0], [1, 1, 1], [1, 0, 1], [1, 1, 1]],
    [[1, 1, 1], [0, 0, 1], [0, 0, 1], [0, 0, 1], [0, 0, 1]],
    [[1, 1, 1], [1, 0, 1], [1, 1, 1], [1, 0, 1], [1, 1, 1]],
    [[1, 1, 1], [1, 0, 1], [1, 1, 1], [0, 0, 1], [1, 1, 1]],
];

/// Highest key in the built-in glyph table
pub const MAX_GLYPH_KEY: u8 = 59;

/// A 6×6 field bitmap. Any nonzero entry is lit.
pub type Glyph = [[u8; FIELD_WIDTH]; FIELD_WIDTH];

/// Ring tags for every matrix cell, grouped into rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PerimeterTopology {
    rows: Vec<Vec<u8>>,
}

impl PerimeterTopology {
    /// Wrap externally supplied rows. The rows must cover all 64 cells.
    pub fn new(rows: Vec<Vec<u8>>) -> Result<Self, RenderError> {
        let actual: usize = rows.iter().map(Vec::len).sum();
        if actual != GRID_CELLS {
            return Err(RenderError::ShapeMismatch {
                expected: GRID_CELLS,
                actual,
            });
        }
        Ok(Self { rows })
    }

    /// The clockwise ring shown in the module docs.
    pub fn builtin() -> Self {
        Self {
            rows: PERIMETER.iter().map(|row| row.to_vec()).collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    /// Flat grid indices of every cell carrying `tag`.
    pub fn cells_with_tag(&self, tag: u8) -> Vec<usize> {
        self.rows
            .iter()
            .flatten()
            .enumerate()
            .filter(|(_, &value)| value == tag)
            .map(|(index, _)| index)
            .collect()
    }
}

impl Default for PerimeterTopology {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Hour unit to the set of ring tags its arc covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipTable {
    arcs: Vec<Vec<u8>>,
}

impl MembershipTable {
    pub fn from_arcs(arcs: &[&[u8]]) -> Self {
        Self {
            arcs: arcs.iter().map(|arc| arc.to_vec()).collect(),
        }
    }

    pub fn twelve_hour() -> Self {
        Self::from_arcs(&TWELVE_HOUR_ARCS)
    }

    pub fn twenty_four_hour() -> Self {
        Self::from_arcs(&TWENTY_FOUR_HOUR_ARCS)
    }

    /// Number of selectors in the table
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Ring tags covered by `selector`.
    pub fn arc(&self, selector: u8) -> Result<&[u8], RenderError> {
        self.arcs
            .get(usize::from(selector))
            .map(Vec::as_slice)
            .ok_or_else(|| {
                RenderError::InvalidRenderInput(format!(
                    "no arc for selector {selector} in a {}-arc table",
                    self.arcs.len()
                ))
            })
    }
}

/// Field glyphs keyed by the number they show.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphTable {
    glyphs: BTreeMap<u8, Glyph>,
}

impl GlyphTable {
    pub fn new(glyphs: BTreeMap<u8, Glyph>) -> Self {
        Self { glyphs }
    }

    /// Two-digit glyphs for 0 through 59, leading zero included.
    ///
    /// Tens occupy field columns 0–2, ones columns 3–5, both on rows 0–4.
    pub fn builtin() -> Self {
        let glyphs = (0..=MAX_GLYPH_KEY)
            .map(|key| (key, two_digit_glyph(key)))
            .collect();
        Self { glyphs }
    }

    pub fn insert(&mut self, key: u8, glyph: Glyph) -> Option<Glyph> {
        self.glyphs.insert(key, glyph)
    }

    pub fn get(&self, key: u8) -> Result<&Glyph, RenderError> {
        self.glyphs
            .get(&key)
            .ok_or_else(|| RenderError::InvalidRenderInput(format!("no glyph for {key}")))
    }

    pub fn keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.glyphs.keys().copied()
    }
}

fn two_digit_glyph(value: u8) -> Glyph {
    let mut glyph = [[0; FIELD_WIDTH]; FIELD_WIDTH];
    let tens = &DIGITS[usize::from(value / 10 % 10)];
    let ones = &DIGITS[usize::from(value % 10)];
    for (row, (tens_row, ones_row)) in tens.iter().zip(ones).enumerate() {
        glyph[row][..3].copy_from_slice(tens_row);
        glyph[row][3..].copy_from_slice(ones_row);
    }
    glyph
}
