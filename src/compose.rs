//! # Color Projection and Layer Compositing
//!
//! Masks become color layers by a two-color substitution, then the ring layer
//! is laid over the field layer. The background color doubles as the
//! transparent color of the ring layer.

use serde::{Deserialize, Serialize};

use crate::renderer::RenderError;
use crate::Rgb;

/// Named color roles used by every clock style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ColorTable {
    /// Unlit cells, and the transparent color of the ring layer
    pub background: Rgb,
    /// Lit cells of the field glyph
    pub number: Rgb,
    /// Lit cells of the perimeter ring
    pub perim: Rgb,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self {
            background: Rgb::BLACK,
            number: Rgb::WHITE,
            perim: Rgb::BLUE,
        }
    }
}

/// Map each mask entry to `foreground` when set, `background` otherwise.
pub fn project(mask: &[bool], background: Rgb, foreground: Rgb) -> Vec<Rgb> {
    mask.iter()
        .map(|&on| if on { foreground } else { background })
        .collect()
}

/// Lay `ring` over `field`, treating `background` in the ring as see-through.
pub fn composite(ring: &[Rgb], field: &[Rgb], background: Rgb) -> Result<Vec<Rgb>, RenderError> {
    if ring.len() != field.len() {
        return Err(RenderError::ShapeMismatch {
            expected: ring.len(),
            actual: field.len(),
        });
    }
    Ok(ring
        .iter()
        .zip(field)
        .map(|(&top, &bottom)| if top == background { bottom } else { top })
        .collect())
}
