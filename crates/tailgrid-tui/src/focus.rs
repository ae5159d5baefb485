//! Focus and maximize state over the pane grid.

use crate::layout::GridLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Tiled(usize),
    Maximized(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    state: FocusState,
}

impl Default for Focus {
    fn default() -> Self {
        Self {
            state: FocusState::Tiled(0),
        }
    }
}

impl Focus {
    #[must_use]
    pub fn state(&self) -> FocusState {
        self.state
    }

    /// Index of the focused (or maximized) pane.
    #[must_use]
    pub fn focused(&self) -> usize {
        match self.state {
            FocusState::Tiled(index) | FocusState::Maximized(index) => index,
        }
    }

    #[must_use]
    pub fn is_maximized(&self) -> bool {
        matches!(self.state, FocusState::Maximized(_))
    }

    fn set(&mut self, index: usize) {
        self.state = match self.state {
            FocusState::Tiled(_) => FocusState::Tiled(index),
            FocusState::Maximized(_) => FocusState::Maximized(index),
        };
    }

    pub fn next(&mut self, count: usize) {
        if count > 0 {
            self.set((self.focused() + 1) % count);
        }
    }

    pub fn prev(&mut self, count: usize) {
        if count > 0 {
            self.set((self.focused() + count - 1) % count);
        }
    }

    /// Focus a pane directly, e.g. after a click. Ignored when out of range.
    pub fn focus(&mut self, index: usize, count: usize) {
        if index < count {
            self.set(index);
        }
    }

    /// Move within the same row or column, wrapping and skipping empty cells.
    ///
    /// Returns whether focus changed. A maximized pane has no neighbours.
    pub fn move_direction(&mut self, direction: Direction, layout: &GridLayout) -> bool {
        if self.is_maximized() {
            return false;
        }
        let current = self.focused();
        let Some((row, col)) = layout.position_of(current) else {
            return false;
        };
        let (rows, cols) = (layout.rows(), layout.cols());
        let target = match direction {
            Direction::Left => (1..cols).find_map(|step| layout.cell(row, (col + cols - step) % cols)),
            Direction::Right => (1..cols).find_map(|step| layout.cell(row, (col + step) % cols)),
            Direction::Up => (1..rows).find_map(|step| layout.cell((row + rows - step) % rows, col)),
            Direction::Down => (1..rows).find_map(|step| layout.cell((row + step) % rows, col)),
        };
        match target {
            Some(index) if index != current => {
                self.set(index);
                true
            }
            _ => false,
        }
    }

    pub fn toggle_maximize(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.state = match self.state {
            FocusState::Tiled(index) => FocusState::Maximized(index),
            FocusState::Maximized(index) => FocusState::Tiled(index),
        };
    }

    /// Jump to pane `k` (1-based). When maximized the maximized pane switches.
    pub fn jump(&mut self, k: usize, count: usize) -> bool {
        if k == 0 || k > count {
            return false;
        }
        self.set(k - 1);
        true
    }

    /// Keep focus valid after panes were removed.
    pub fn clamp(&mut self, count: usize) {
        if count == 0 {
            self.state = FocusState::Tiled(0);
        } else if self.focused() >= count {
            self.set(count - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, Focus, FocusState};
    use crate::layout::GridLayout;

    #[test]
    fn next_and_prev_wrap() {
        let mut focus = Focus::default();
        focus.prev(3);
        assert_eq!(focus.focused(), 2);
        focus.next(3);
        assert_eq!(focus.focused(), 0);
    }

    #[test]
    fn directional_moves_wrap_and_skip_empty_cells() {
        // 5 panes: 2x3 grid, cell (1,2) empty.
        let layout = GridLayout::compute(5);
        let mut focus = Focus::default();
        assert!(focus.move_direction(Direction::Left, &layout));
        assert_eq!(focus.focused(), 2);
        assert!(!focus.move_direction(Direction::Down, &layout));
        assert_eq!(focus.focused(), 2, "only empty cell below, no other pane in column");

        focus.focus(4, 5);
        assert!(focus.move_direction(Direction::Right, &layout));
        assert_eq!(focus.focused(), 3, "wraps past the empty cell");
        assert!(focus.move_direction(Direction::Up, &layout));
        assert_eq!(focus.focused(), 0);
    }

    #[test]
    fn maximize_preserves_identity_and_jump_switches_it() {
        let mut focus = Focus::default();
        focus.focus(1, 4);
        focus.toggle_maximize(4);
        assert_eq!(focus.state(), FocusState::Maximized(1));
        assert!(focus.jump(3, 4));
        assert_eq!(focus.state(), FocusState::Maximized(2));
        assert!(!focus.jump(5, 4));
        assert!(!focus.move_direction(Direction::Right, &GridLayout::compute(4)));
        focus.toggle_maximize(4);
        assert_eq!(focus.state(), FocusState::Tiled(2));
    }

    #[test]
    fn clamp_after_removal() {
        let mut focus = Focus::default();
        focus.focus(3, 4);
        focus.clamp(2);
        assert_eq!(focus.focused(), 1);
        focus.clamp(0);
        assert_eq!(focus.state(), FocusState::Tiled(0));
    }
}
