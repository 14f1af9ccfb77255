//! # Binary Mask Builder
//!
//! Turns ring tags or glyph bitmaps into boolean masks, one entry per cell.
//! Masks keep the shape of their input; the topology-wide helpers flatten
//! every row of a [`PerimeterTopology`] into a single 64-cell mask.

use crate::layout::{
    Glyph, MembershipTable, PerimeterTopology, FIELD_CELLS, FIELD_WIDTH, GRID_CELLS, GRID_WIDTH,
    RING_CELLS,
};
use crate::renderer::RenderError;

/// Ring position lit for `minute`, as a real number.
///
/// `minute * (28 / 60) + 1`. Kept in floating point until the mask compares
/// against its floor; integer division would move the marker for several
/// minutes.
pub fn minute_threshold(minute: u8) -> f64 {
    let unit = RING_CELLS as f64 / 60.0;
    f64::from(minute) * unit + 1.0
}

/// Mark tags against a minute threshold.
///
/// With `is_line` the mask lights every tag in `1..=floor(threshold)` (a
/// growing arc). Without it only the tag equal to `floor(threshold)` is lit
/// (a single dot).
pub fn threshold_mask(row: &[u8], threshold: f64, is_line: bool) -> Vec<bool> {
    let limit = threshold.floor();
    row.iter()
        .map(|&tag| {
            let tag = f64::from(tag);
            if is_line {
                0.0 < tag && tag <= limit
            } else {
                tag == limit
            }
        })
        .collect()
}

/// Mark tags that belong to arc `selector` of `table`.
pub fn membership_mask(
    row: &[u8],
    selector: u8,
    table: &MembershipTable,
) -> Result<Vec<bool>, RenderError> {
    let arc = table.arc(selector)?;
    Ok(row.iter().map(|tag| arc.contains(tag)).collect())
}

/// Flatten a 6×6 glyph into 36 cells, row-major.
pub fn glyph_mask(glyph: &Glyph) -> Vec<bool> {
    glyph.iter().flatten().map(|&bit| bit != 0).collect()
}

/// Place a 36-cell field mask inside the 64-cell grid.
///
/// The field occupies rows and columns 1–6; ring cells come out unlit.
pub fn field_mask(field: &[bool]) -> Result<Vec<bool>, RenderError> {
    if field.len() != FIELD_CELLS {
        return Err(RenderError::ShapeMismatch {
            expected: FIELD_CELLS,
            actual: field.len(),
        });
    }
    let mut grid = vec![false; GRID_CELLS];
    for (row, cells) in field.chunks(FIELD_WIDTH).enumerate() {
        let start = (row + 1) * GRID_WIDTH + 1;
        grid[start..start + FIELD_WIDTH].copy_from_slice(cells);
    }
    Ok(grid)
}

/// [`threshold_mask`] over every topology row, flattened.
pub fn perimeter_threshold_mask(
    topology: &PerimeterTopology,
    threshold: f64,
    is_line: bool,
) -> Vec<bool> {
    topology
        .rows()
        .iter()
        .flat_map(|row| threshold_mask(row, threshold, is_line))
        .collect()
}

/// [`membership_mask`] over every topology row, flattened.
pub fn perimeter_membership_mask(
    topology: &PerimeterTopology,
    selector: u8,
    table: &MembershipTable,
) -> Result<Vec<bool>, RenderError> {
    let mut mask = Vec::with_capacity(GRID_CELLS);
    for row in topology.rows() {
        mask.extend(membership_mask(row, selector, table)?);
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(mask: &[bool]) -> Vec<usize> {
        mask.iter()
            .enumerate()
            .filter(|(_, &on)| on)
            .map(|(index, _)| index)
            .collect()
    }

    #[test]
    fn test_minute_threshold_values() {
        assert_eq!(minute_threshold(0), 1.0);
        assert_eq!(minute_threshold(30).floor(), 15.0);
        assert_eq!(minute_threshold(59).floor(), 28.0);
        // 15 * 28/60 lands exactly on 7 in real arithmetic
        assert_eq!(minute_threshold(15).floor(), 8.0);
    }

    #[test]
    fn test_dot_lights_single_matching_tag() {
        let row = [25, 26, 27, 28, 1, 2, 3, 4];
        assert_eq!(lit(&threshold_mask(&row, 2.9, false)), vec![5]);
        assert_eq!(lit(&threshold_mask(&row, 28.0, false)), vec![3]);
        // No tag equals the floor
        assert!(lit(&threshold_mask(&row, 5.5, false)).is_empty());
    }

    #[test]
    fn test_dot_lights_exactly_one_cell_per_minute() {
        let topology = PerimeterTopology::builtin();
        for minute in 0..60 {
            let mask = perimeter_threshold_mask(&topology, minute_threshold(minute), false);
            assert_eq!(lit(&mask).len(), 1, "minute {} should light one cell", minute);
        }
    }

    #[test]
    fn test_line_lights_positive_tags_up_to_floor() {
        let row = [0, 3, 1, 2, 5, 4];
        assert_eq!(lit(&threshold_mask(&row, 3.7, true)), vec![1, 2, 3]);
        // Tag 0 is never part of the arc
        assert!(!threshold_mask(&row, 0.0, true)[0]);
    }

    #[test]
    fn test_line_is_monotonic_in_threshold() {
        let topology = PerimeterTopology::builtin();
        let mut previous = vec![false; GRID_CELLS];
        for minute in 0..60 {
            let mask = perimeter_threshold_mask(&topology, minute_threshold(minute), true);
            for (index, (&before, &now)) in previous.iter().zip(&mask).enumerate() {
                assert!(
                    !before || now,
                    "cell {} switched off at minute {}",
                    index,
                    minute
                );
            }
            previous = mask;
        }
        assert_eq!(lit(&previous).len(), RING_CELLS);
    }

    #[test]
    fn test_membership_mask_matches_arc() {
        let table = MembershipTable::twelve_hour();
        let row = [25, 26, 27, 28, 1, 2, 3, 4];
        assert_eq!(lit(&membership_mask(&row, 0, &table).unwrap()), vec![3, 4]);
        assert_eq!(lit(&membership_mask(&row, 1, &table).unwrap()), vec![5, 6, 7]);
    }

    #[test]
    fn test_membership_mask_keeps_row_length() {
        let topology = PerimeterTopology::builtin();
        for table in [MembershipTable::twelve_hour(), MembershipTable::twenty_four_hour()] {
            for selector in 0..table.len() as u8 {
                for row in topology.rows() {
                    let mask = membership_mask(row, selector, &table).unwrap();
                    assert_eq!(mask.len(), row.len());
                }
                let flat = perimeter_membership_mask(&topology, selector, &table).unwrap();
                assert_eq!(flat.len(), GRID_CELLS);
            }
        }
    }

    #[test]
    fn test_membership_unknown_selector_fails() {
        let table = MembershipTable::twelve_hour();
        let result = perimeter_membership_mask(&PerimeterTopology::builtin(), 12, &table);
        assert!(matches!(result, Err(RenderError::InvalidRenderInput(_))));
    }

    #[test]
    fn test_glyph_mask_row_major() {
        let mut glyph = [[0; 6]; 6];
        glyph[0][1] = 1;
        glyph[5][5] = 7;
        let mask = glyph_mask(&glyph);
        assert_eq!(mask.len(), FIELD_CELLS);
        assert_eq!(lit(&mask), vec![1, 35]);
    }

    #[test]
    fn test_field_mask_insets_glyph() {
        let mut field = vec![false; FIELD_CELLS];
        field[0] = true;
        field[35] = true;
        let grid = field_mask(&field).unwrap();
        assert_eq!(lit(&grid), vec![9, 54]);
    }

    #[test]
    fn test_field_mask_rejects_wrong_length() {
        assert_eq!(
            field_mask(&[true; 30]),
            Err(RenderError::ShapeMismatch {
                expected: 36,
                actual: 30
            })
        );
    }
}
