//! Grid layout of square tiles
//!
//! Every session gets one square tile. The tile size is chosen from the widths that divide the
//! target rectangle into a whole number of columns, picking the one that leaves the least area
//! unused while still fitting `count` tiles.

use crate::{PosterError, Result};

/// Result of [`compute_grid`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    /// Edge length of a tile
    pub tile_size: f64,
    /// Tiles per row
    pub columns: usize,
    /// Number of rows needed for all tiles
    pub rows: usize,
    /// Leftover vertical space distributed after each row
    pub row_spacing: f64,
}

impl GridLayout {
    /// (column, row) of the tile at `index`
    pub fn cell(&self, index: usize) -> (usize, usize) {
        (index % self.columns, index / self.columns)
    }
}

/// Lay out `count` square tiles inside a `width` × `height` rectangle
///
/// Candidate tile sizes are `width / x` for every integer column count `x < width`. The size with
/// the smallest non-negative waste `width*height - count*size²` wins; on ties the smaller column
/// count is kept. Fails when `count` is zero or when no candidate fits.
pub fn compute_grid(count: usize, width: f64, height: f64) -> Result<GridLayout> {
    let layout_error = || PosterError::Layout {
        count,
        width,
        height,
    };
    if count == 0 {
        return Err(layout_error());
    }

    let area = width * height;
    let mut best: Option<(usize, f64, f64)> = None; // (columns, size, waste)
    for columns in (1..).take_while(|&x| (x as f64) < width) {
        let size = width / columns as f64;
        let waste = area - count as f64 * size * size;
        if waste < 0.0 {
            continue;
        }
        if best.is_none_or(|(_, _, min_waste)| waste < min_waste) {
            best = Some((columns, size, waste));
        }
    }

    let (columns, tile_size, _) = best.ok_or_else(layout_error)?;
    let rows = count.div_ceil(columns);
    let row_spacing = (height - rows as f64 * tile_size) / rows as f64;

    Ok(GridLayout {
        tile_size,
        columns,
        rows,
        row_spacing,
    })
}
