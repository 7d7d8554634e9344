use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::Span;

use crate::util::unicode::{self, display_width, truncate_to_width};

/// Compute total display width of a slice of spans
pub(super) fn spans_width(spans: &[Span]) -> usize {
    spans
        .iter()
        .map(|s| unicode::display_width(&s.content))
        .sum()
}

/// Cut spans so their combined width fits `max_width` cells; the span
/// that crosses the edge ends in an ellipsis.
pub(super) fn truncate_spans(spans: &mut Vec<Span<'_>>, max_width: usize) {
    let mut total = 0usize;
    let mut truncate_at = spans.len();

    for (i, span) in spans.iter().enumerate() {
        let span_width = display_width(&span.content);
        if total + span_width > max_width {
            truncate_at = i;
            let remaining = max_width.saturating_sub(total);
            if remaining > 0 {
                let cut = truncate_to_width(&span.content, remaining);
                spans[i] = Span::styled(cut, span.style);
                truncate_at = i + 1;
            }
            break;
        }
        total += span_width;
    }

    spans.truncate(truncate_at);
}

/// Fixed-size rectangle centered in `area`, shrunk to fit
pub(super) fn centered_box(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(area.width.saturating_sub(width) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1])[1]
}
