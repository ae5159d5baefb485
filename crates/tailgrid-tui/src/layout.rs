//! Tiling grid for log panes.
//!
//! `cols = ceil(sqrt(n))`, `rows = ceil(n / cols)`, panes assigned row-major
//! with trailing cells empty. Column and row ratios are adjustable and survive
//! relayouts as long as the pane count does not change.

use tailgrid_render::render::Rect;

/// Smallest share a column or row may shrink to.
pub const MIN_RATIO: f64 = 0.10;
pub const MIN_CELL_WIDTH: usize = 4;
pub const MIN_CELL_HEIGHT: usize = 3;

const RATIO_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    rows: usize,
    cols: usize,
    pane_count: usize,
    pane_map: Vec<Vec<Option<usize>>>,
    column_ratios: Vec<f64>,
    row_ratios: Vec<f64>,
}

impl GridLayout {
    /// Grid for `n` panes with equal ratios. `n = 0` yields one empty cell.
    #[must_use]
    pub fn compute(n: usize) -> Self {
        let (rows, cols) = grid_shape(n);
        let pane_map = (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| {
                        let index = row * cols + col;
                        (index < n).then_some(index)
                    })
                    .collect()
            })
            .collect();
        Self {
            rows,
            cols,
            pane_count: n,
            pane_map,
            column_ratios: equal_ratios(cols),
            row_ratios: equal_ratios(rows),
        }
    }

    /// Recompute for `n` panes, keeping ratios when the count is unchanged.
    pub fn relayout(&mut self, n: usize) {
        if n != self.pane_count {
            *self = Self::compute(n);
        }
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn pane_count(&self) -> usize {
        self.pane_count
    }

    #[must_use]
    pub fn column_ratios(&self) -> &[f64] {
        &self.column_ratios
    }

    #[must_use]
    pub fn row_ratios(&self) -> &[f64] {
        &self.row_ratios
    }

    /// Pane index at grid cell (`row`, `col`).
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<usize> {
        self.pane_map.get(row)?.get(col).copied().flatten()
    }

    /// Grid cell holding pane `index`.
    #[must_use]
    pub fn position_of(&self, index: usize) -> Option<(usize, usize)> {
        (index < self.pane_count).then(|| (index / self.cols, index % self.cols))
    }

    /// Grow column `col` by `delta`, taking from its right neighbour (or the
    /// left one for the last column). Returns false and changes nothing when
    /// either side would drop below [`MIN_RATIO`].
    pub fn resize_column(&mut self, col: usize, delta: f64) -> bool {
        shift_ratio(&mut self.column_ratios, col, delta)
    }

    /// Row counterpart of [`GridLayout::resize_column`].
    pub fn resize_row(&mut self, row: usize, delta: f64) -> bool {
        shift_ratio(&mut self.row_ratios, row, delta)
    }

    #[must_use]
    pub fn column_widths(&self, total: usize) -> Vec<usize> {
        to_pixel_sizes(&self.column_ratios, total, MIN_CELL_WIDTH)
    }

    #[must_use]
    pub fn row_heights(&self, total: usize) -> Vec<usize> {
        to_pixel_sizes(&self.row_ratios, total, MIN_CELL_HEIGHT)
    }

    /// Screen rectangle of every occupied cell inside `area`, by pane index.
    #[must_use]
    pub fn pane_rects(&self, area: Rect) -> Vec<(usize, Rect)> {
        let widths = self.column_widths(area.width);
        let heights = self.row_heights(area.height);
        let mut rects = Vec::with_capacity(self.pane_count);
        let mut y = area.y;
        for (row, height) in heights.iter().enumerate() {
            let mut x = area.x;
            for (col, width) in widths.iter().enumerate() {
                if let Some(index) = self.cell(row, col) {
                    rects.push((index, Rect::new(x, y, *width, *height)));
                }
                x += width;
            }
            y += height;
        }
        rects
    }

    /// Pane under the screen point, walking the same boundaries as rendering.
    #[must_use]
    pub fn pane_at(&self, area: Rect, x: usize, y: usize) -> Option<usize> {
        if !area.contains(x, y) {
            return None;
        }
        let col = boundary_index(&self.column_widths(area.width), x - area.x)?;
        let row = boundary_index(&self.row_heights(area.height), y - area.y)?;
        self.cell(row, col)
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::compute(0)
    }
}

fn grid_shape(n: usize) -> (usize, usize) {
    if n == 0 {
        return (1, 1);
    }
    let mut cols = 1;
    while cols * cols < n {
        cols += 1;
    }
    (n.div_ceil(cols), cols)
}

fn equal_ratios(count: usize) -> Vec<f64> {
    let count = count.max(1);
    vec![1.0 / count as f64; count]
}

fn shift_ratio(ratios: &mut [f64], index: usize, delta: f64) -> bool {
    if index >= ratios.len() || ratios.len() < 2 || delta == 0.0 || !delta.is_finite() {
        return false;
    }
    let neighbour = if index + 1 < ratios.len() {
        index + 1
    } else {
        index - 1
    };
    let grown = ratios[index] + delta;
    let shrunk = ratios[neighbour] - delta;
    if grown < MIN_RATIO - RATIO_EPSILON || shrunk < MIN_RATIO - RATIO_EPSILON {
        return false;
    }
    ratios[index] = grown;
    ratios[neighbour] = shrunk;
    true
}

/// Convert ratios to whole cells that sum exactly to `total`.
///
/// Every cell but the last gets `floor(ratio * total)`, raised to `min`; the
/// last takes the remainder. When that leaves the last cell under `min`,
/// earlier cells are squeezed from the right, first down to `min` and then
/// further if `total` is smaller than the grid needs.
#[must_use]
pub fn to_pixel_sizes(ratios: &[f64], total: usize, min: usize) -> Vec<usize> {
    let Some((_, leading)) = ratios.split_last() else {
        return Vec::new();
    };
    let mut sizes: Vec<usize> = leading
        .iter()
        .map(|ratio| ((ratio.max(0.0) * total as f64) as usize).max(min))
        .collect();

    let mut excess = (sizes.iter().sum::<usize>() + min).saturating_sub(total);
    for floor in [min, 0] {
        for size in sizes.iter_mut().rev() {
            if excess == 0 {
                break;
            }
            let take = excess.min(size.saturating_sub(floor));
            *size -= take;
            excess -= take;
        }
    }

    let used: usize = sizes.iter().sum();
    sizes.push(total.saturating_sub(used));
    sizes
}

fn boundary_index(sizes: &[usize], offset: usize) -> Option<usize> {
    let mut end = 0;
    for (index, size) in sizes.iter().enumerate() {
        end += size;
        if offset < end {
            return Some(index);
        }
    }
    None
}
