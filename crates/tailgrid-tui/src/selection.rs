//! Pointer-drag text selection inside one pane.
//!
//! Positions are pane-content relative: the pane border takes one column and
//! one row, the title row another row. Rows count from the top of the visible
//! viewport; the pane resolves them against its live scroll offset when the
//! text is extracted.

/// Columns between a pane's left edge and its first content column.
pub const BORDER_OFFSET: usize = 1;
/// Rows between a pane's top edge and its first content row.
pub const HEADER_ROWS: usize = 2;

/// Content-relative position. `col` counts from the timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ContentPos {
    pub row: usize,
    pub col: usize,
}

/// Map a screen point to content coordinates for a pane at `origin`.
#[must_use]
pub fn content_position(pointer: (usize, usize), origin: (usize, usize)) -> ContentPos {
    ContentPos {
        row: pointer.1.saturating_sub(origin.1 + HEADER_ROWS),
        col: pointer.0.saturating_sub(origin.0 + BORDER_OFFSET),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    active: bool,
    finalized: bool,
    pane_index: usize,
    origin: (usize, usize),
    anchor: ContentPos,
    cursor: ContentPos,
}

impl Selection {
    /// Begin a drag at `pointer` in pane `pane_index` whose top-left is `origin`.
    pub fn start(&mut self, pointer: (usize, usize), pane_index: usize, origin: (usize, usize)) {
        let pos = content_position(pointer, origin);
        *self = Self {
            active: true,
            finalized: false,
            pane_index,
            origin,
            anchor: pos,
            cursor: pos,
        };
    }

    pub fn update(&mut self, pointer: (usize, usize)) {
        if self.active && !self.finalized {
            self.cursor = content_position(pointer, self.origin);
        }
    }

    /// Stop tracking the pointer; the range stays for extraction.
    pub fn finish(&mut self) {
        if self.active {
            self.finalized = true;
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    #[must_use]
    pub fn pane_index(&self) -> Option<usize> {
        self.active.then_some(self.pane_index)
    }

    /// Anchor and cursor ordered by (row, col). The end column is exclusive.
    #[must_use]
    pub fn normalized_range(&self) -> (ContentPos, ContentPos) {
        if self.anchor <= self.cursor {
            (self.anchor, self.cursor)
        } else {
            (self.cursor, self.anchor)
        }
    }

    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.active && self.anchor != self.cursor
    }

    /// Range to highlight in pane `index`, if the selection lives there.
    #[must_use]
    pub fn range_for(&self, index: usize) -> Option<(ContentPos, ContentPos)> {
        (self.has_selection() && self.pane_index == index).then(|| self.normalized_range())
    }
}

#[cfg(test)]
mod tests {
    use super::{content_position, ContentPos, Selection};

    #[test]
    fn content_position_subtracts_chrome_and_clamps() {
        assert_eq!(content_position((12, 7), (10, 5)), ContentPos { row: 0, col: 1 });
        assert_eq!(content_position((10, 5), (10, 5)), ContentPos { row: 0, col: 0 });
        assert_eq!(content_position((30, 9), (10, 5)), ContentPos { row: 2, col: 19 });
    }

    #[test]
    fn forward_drag_keeps_order() {
        let mut selection = Selection::default();
        selection.start((5, 4), 0, (0, 0));
        selection.update((9, 6));
        let (start, end) = selection.normalized_range();
        assert_eq!(start, ContentPos { row: 2, col: 4 });
        assert_eq!(end, ContentPos { row: 4, col: 8 });
        assert!(selection.has_selection());
    }

    #[test]
    fn reverse_drag_is_normalized() {
        let mut selection = Selection::default();
        selection.start((20, 8), 1, (0, 0));
        selection.update((3, 3));
        let (start, end) = selection.normalized_range();
        assert!(start <= end);
        assert_eq!(start, ContentPos { row: 1, col: 2 });
        assert_eq!(end, ContentPos { row: 6, col: 19 });

        // Same row, cursor left of anchor.
        selection.start((20, 8), 1, (0, 0));
        selection.update((10, 8));
        assert_eq!(
            selection.normalized_range(),
            (ContentPos { row: 6, col: 9 }, ContentPos { row: 6, col: 19 })
        );
    }

    #[test]
    fn click_without_drag_has_no_text() {
        let mut selection = Selection::default();
        selection.start((4, 4), 0, (0, 0));
        selection.finish();
        assert!(!selection.has_selection());
        assert!(selection.range_for(0).is_none());
    }

    #[test]
    fn finalized_selection_ignores_pointer() {
        let mut selection = Selection::default();
        selection.start((4, 4), 2, (0, 0));
        selection.update((8, 4));
        selection.finish();
        selection.update((30, 30));
        assert_eq!(selection.range_for(2).map(|(_, end)| end.col), Some(7));
        assert!(selection.range_for(1).is_none());
    }
}
