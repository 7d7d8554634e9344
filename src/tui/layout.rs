//! Viewport math for the board columns.
//!
//! Everything here is plain arithmetic over card heights so it can be
//! tested without a terminal. Rendering and input share these functions,
//! which keeps what is drawn and what navigation assumes in agreement.

use crate::model::task::Task;
use crate::util::unicode::wrap_to_width;

/// Column header line ("todo (3/5)")
pub const HEADER_LINES: usize = 1;

/// Sentinel for "scroll to the bottom"; clamped on the next render
pub const SCROLL_BOTTOM: usize = usize::MAX;

/// Lines used below the columns: key hints plus the status row, and one
/// more while an error banner is showing.
pub fn chrome_height(banner: bool) -> usize {
    2 + usize::from(banner)
}

/// Width of one column when `columns` share `area_width` cells.
pub fn column_width(area_width: u16, columns: usize) -> usize {
    if columns == 0 {
        return area_width as usize;
    }
    (area_width as usize / columns).max(1)
}

/// Text width inside a column: one cell for the selection gutter, one
/// cell of gap before the next column.
pub fn card_text_width(column_width: usize) -> usize {
    column_width.saturating_sub(2).max(1)
}

/// Wrapped title lines for a card, `#id title` capped at `title_lines`.
pub fn card_title(task: &Task, title_lines: usize, width: usize) -> Vec<String> {
    let text = format!("#{} {}", task.id, task.title);
    wrap_to_width(&text, width, title_lines.max(1))
}

/// Rendered height of a card: title lines, one metadata line and an
/// optional claim line.
pub fn card_height(task: &Task, title_lines: usize, width: usize) -> usize {
    card_title(task, title_lines, width).len() + 1 + usize::from(task.is_claimed())
}

// ---------------------------------------------------------------------------
// Visible count
// ---------------------------------------------------------------------------

/// Number of cards starting at `start` whose heights fit in `avail`.
/// Always at least one when a card exists.
fn fit(heights: &[usize], start: usize, avail: usize) -> usize {
    let mut used = 0;
    let mut n = 0;
    for &h in &heights[start..] {
        if n > 0 && used + h > avail {
            break;
        }
        used += h;
        n += 1;
    }
    n
}

/// How many cards are visible from `scroll_off` in a column of
/// `area_height` lines, leaving room for the header and for the
/// "↑ N more" / "↓ N more" indicators when they appear.
pub fn visible_count(heights: &[usize], scroll_off: usize, area_height: usize) -> usize {
    let total = heights.len();
    if scroll_off >= total {
        return 0;
    }
    let mut avail = area_height.saturating_sub(HEADER_LINES);
    if scroll_off > 0 {
        avail = avail.saturating_sub(1);
    }
    let n = fit(heights, scroll_off, avail);
    if scroll_off + n < total {
        fit(heights, scroll_off, avail.saturating_sub(1))
    } else {
        n
    }
}

// ---------------------------------------------------------------------------
// Selection tracking
// ---------------------------------------------------------------------------

/// Scroll position and selection within one column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnState {
    pub scroll_off: usize,
    pub active_row: usize,
}

impl ColumnState {
    /// Clamp the selection and scroll so the active card is on screen.
    pub fn ensure_visible(&mut self, heights: &[usize], area_height: usize) {
        let len = heights.len();
        if len == 0 {
            *self = ColumnState::default();
            return;
        }
        self.active_row = self.active_row.min(len - 1);
        self.scroll_off = self.scroll_off.min(len - 1);

        // don't leave blank space below the last card when the column shrank
        while self.scroll_off > 0
            && self.scroll_off - 1 + visible_count(heights, self.scroll_off - 1, area_height) >= len
        {
            self.scroll_off -= 1;
        }

        // n depends on scroll_off and on the cards it exposes, so one
        // adjustment may not settle it
        for _ in 0..=len {
            let n = visible_count(heights, self.scroll_off, area_height).max(1);
            if self.active_row >= self.scroll_off + n {
                self.scroll_off = self.active_row + 1 - n;
            } else if self.active_row < self.scroll_off {
                self.scroll_off = self.active_row;
            } else {
                return;
            }
        }
        // a column scrolled to its active card always shows it
        self.scroll_off = self.active_row;
    }

    pub fn move_by(&mut self, delta: isize, heights: &[usize], area_height: usize) {
        self.active_row = self.active_row.saturating_add_signed(delta);
        self.ensure_visible(heights, area_height);
    }

    pub fn first(&mut self, heights: &[usize], area_height: usize) {
        self.active_row = 0;
        self.ensure_visible(heights, area_height);
    }

    pub fn last(&mut self, heights: &[usize], area_height: usize) {
        self.active_row = heights.len().saturating_sub(1);
        self.ensure_visible(heights, area_height);
    }

    /// Cards hidden above and below the viewport
    pub fn hidden(&self, heights: &[usize], area_height: usize) -> (usize, usize) {
        let n = visible_count(heights, self.scroll_off, area_height);
        let below = heights.len().saturating_sub(self.scroll_off + n);
        (self.scroll_off, below)
    }
}

// ---------------------------------------------------------------------------
// Detail view
// ---------------------------------------------------------------------------

/// Largest useful scroll offset for `line_count` lines in `view_height`.
pub fn clamp_detail_scroll(scroll: usize, line_count: usize, view_height: usize) -> usize {
    scroll.min(line_count.saturating_sub(view_height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::now;

    /// Lines actually drawn for a column in its current state
    fn rendered_height(state: &ColumnState, heights: &[usize], area: usize) -> usize {
        let n = visible_count(heights, state.scroll_off, area);
        let (above, below) = state.hidden(heights, area);
        let cards: usize = heights[state.scroll_off..state.scroll_off + n].iter().sum();
        HEADER_LINES + usize::from(above > 0) + cards + usize::from(below > 0)
    }

    fn assert_invariant(state: &ColumnState, heights: &[usize], area: usize) {
        let n = visible_count(heights, state.scroll_off, area);
        assert!(
            state.scroll_off <= state.active_row && state.active_row < state.scroll_off + n,
            "active {} not within [{}, {}) for {heights:?} in {area}",
            state.active_row,
            state.scroll_off,
            state.scroll_off + n
        );
        let tallest = heights.iter().copied().max().unwrap_or(0);
        if tallest + 3 <= area {
            assert!(rendered_height(state, heights, area) <= area);
        }
    }

    fn patterns() -> Vec<Vec<usize>> {
        vec![
            vec![],
            vec![2],
            vec![2; 3],
            vec![2; 20],
            vec![3, 2, 2, 4, 2, 3, 2, 2, 5, 2, 2, 3],
            vec![1, 5, 1, 5, 1, 5, 1, 5],
            vec![6; 7],
        ]
    }

    #[test]
    fn chrome_grows_with_banner() {
        assert_eq!(chrome_height(false), 2);
        assert_eq!(chrome_height(true), 3);
    }

    #[test]
    fn everything_fits_without_indicators() {
        // header + 3 cards of 2
        assert_eq!(visible_count(&[2, 2, 2], 0, 7), 3);
    }

    #[test]
    fn down_indicator_takes_a_line() {
        // 7 lines: header + 3 cards would fit, but a 4th card needs the
        // down indicator, which pushes the third card out
        assert_eq!(visible_count(&[2, 2, 2, 2], 0, 7), 2);
    }

    #[test]
    fn up_indicator_takes_a_line() {
        assert_eq!(visible_count(&[2, 2, 2, 2], 1, 8), 3);
        assert_eq!(visible_count(&[2, 2, 2, 2], 1, 7), 2);
    }

    #[test]
    fn tall_card_still_shown() {
        assert_eq!(visible_count(&[10, 1], 0, 4), 1);
        assert_eq!(visible_count(&[], 0, 10), 0);
        assert_eq!(visible_count(&[2], 5, 10), 0);
    }

    #[test]
    fn every_selection_stays_visible() {
        for heights in patterns() {
            for area in [1, 2, 4, 7, 10, 13, 24, 60] {
                for active in 0..heights.len() + 2 {
                    for scroll in 0..heights.len() + 1 {
                        let mut state = ColumnState {
                            scroll_off: scroll,
                            active_row: active,
                        };
                        state.ensure_visible(&heights, area);
                        if heights.is_empty() {
                            assert_eq!(state, ColumnState::default());
                        } else {
                            assert_invariant(&state, &heights, area);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn stepping_down_and_up_keeps_invariant() {
        for heights in patterns() {
            for area in [4, 7, 10, 24] {
                let mut state = ColumnState::default();
                for _ in 0..heights.len() + 3 {
                    state.move_by(1, &heights, area);
                    if !heights.is_empty() {
                        assert_invariant(&state, &heights, area);
                    }
                }
                for _ in 0..heights.len() + 3 {
                    state.move_by(-1, &heights, area);
                    if !heights.is_empty() {
                        assert_invariant(&state, &heights, area);
                    }
                }
                assert_eq!(state.active_row, 0);
                assert_eq!(state.scroll_off, 0);
            }
        }
    }

    #[test]
    fn bottom_then_up_does_not_jump() {
        let heights = vec![2; 20];
        let area = 12;
        let mut state = ColumnState::default();
        state.last(&heights, area);
        assert_eq!(state.active_row, 19);
        let bottom_scroll = state.scroll_off;
        assert_eq!(state.hidden(&heights, area).1, 0);

        // j at the bottom is a no-op
        state.move_by(1, &heights, area);
        assert_eq!(state.active_row, 19);
        assert_eq!(state.scroll_off, bottom_scroll);

        // k moves within the viewport
        state.move_by(-1, &heights, area);
        assert_eq!(state.active_row, 18);
        assert_eq!(state.scroll_off, bottom_scroll);

        state.first(&heights, area);
        assert_eq!(state, ColumnState::default());
    }

    #[test]
    fn shrinking_column_clamps_selection() {
        let mut state = ColumnState {
            scroll_off: 8,
            active_row: 9,
        };
        state.ensure_visible(&[2, 2, 2], 20);
        assert_eq!(state, ColumnState { scroll_off: 0, active_row: 2 });
    }

    #[test]
    fn card_height_counts_claim_line() {
        let mut task = Task::new(7, "Write the release notes for 2.0".into(), "todo".into(), "high".into(), now());
        assert_eq!(card_height(&task, 1, 40), 2);
        // wraps to at most two title lines
        assert_eq!(card_height(&task, 2, 12), 3);
        task.claim("agent-1", now());
        assert_eq!(card_height(&task, 2, 12), 4);
        assert_eq!(card_height(&task, 3, 200), 3);
    }

    #[test]
    fn column_widths() {
        assert_eq!(column_width(100, 5), 20);
        assert_eq!(column_width(3, 5), 1);
        assert_eq!(card_text_width(20), 18);
        assert_eq!(card_text_width(1), 1);
    }

    #[test]
    fn detail_scroll_clamps_to_bottom() {
        assert_eq!(clamp_detail_scroll(SCROLL_BOTTOM, 50, 20), 30);
        assert_eq!(clamp_detail_scroll(5, 50, 20), 5);
        assert_eq!(clamp_detail_scroll(SCROLL_BOTTOM, 10, 20), 0);
    }
}
