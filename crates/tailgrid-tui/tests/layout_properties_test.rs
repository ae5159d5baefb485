#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Property coverage for grid shape, ratio resizing and pointer mapping.

use proptest::prelude::*;
use tailgrid_render::render::Rect;
use tailgrid_tui::layout::{to_pixel_sizes, GridLayout, MIN_CELL_WIDTH};

#[test]
fn every_pane_gets_exactly_one_cell() {
    for n in 1..=12 {
        let layout = GridLayout::compute(n);
        let (rows, cols) = (layout.rows(), layout.cols());
        assert!(rows * cols >= n, "n={n}");
        assert!(rows * cols - n < cols, "n={n} leaves a whole empty row");
        let mut seen = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                if let Some(index) = layout.cell(row, col) {
                    seen.push(index);
                }
            }
        }
        assert_eq!(seen, (0..n).collect::<Vec<_>>());
    }
}

proptest! {
    #[test]
    fn column_resize_is_reversible(n in 2usize..=12, col in 0usize..4, delta in 0.01f64..0.3) {
        let mut layout = GridLayout::compute(n);
        prop_assume!(col < layout.cols());
        let before = layout.column_ratios().to_vec();
        if layout.resize_column(col, delta) {
            prop_assert!(layout.resize_column(col, -delta));
            for (after, original) in layout.column_ratios().iter().zip(&before) {
                prop_assert!((after - original).abs() < 1e-9);
            }
        } else {
            prop_assert_eq!(layout.column_ratios(), before.as_slice());
        }
    }

    #[test]
    fn ratios_never_drop_below_the_floor(steps in prop::collection::vec((0usize..3, -0.4f64..0.4), 0..40)) {
        let mut layout = GridLayout::compute(9);
        for (row, delta) in steps {
            layout.resize_row(row, delta);
        }
        let sum: f64 = layout.row_ratios().iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);
        prop_assert!(layout.row_ratios().iter().all(|ratio| *ratio >= 0.10 - 1e-9));
    }

    #[test]
    fn pixel_sizes_sum_exactly(cols in 1usize..6, total in 0usize..400) {
        let ratios = vec![1.0 / cols as f64; cols];
        let sizes = to_pixel_sizes(&ratios, total, MIN_CELL_WIDTH);
        prop_assert_eq!(sizes.len(), cols);
        prop_assert_eq!(sizes.iter().sum::<usize>(), total);
    }

    #[test]
    fn pointer_lookup_agrees_with_rendered_rects(n in 1usize..=9, width in 20usize..160, height in 10usize..60) {
        let layout = GridLayout::compute(n);
        let area = Rect::new(0, 0, width, height);
        for (index, rect) in layout.pane_rects(area) {
            prop_assume!(rect.width > 0 && rect.height > 0);
            prop_assert_eq!(layout.pane_at(area, rect.x, rect.y), Some(index));
            let (right, bottom) = (rect.x + rect.width - 1, rect.y + rect.height - 1);
            prop_assert_eq!(layout.pane_at(area, right, bottom), Some(index));
        }
        prop_assert_eq!(layout.pane_at(area, width, 0), None);
    }
}
