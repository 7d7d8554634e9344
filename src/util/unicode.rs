use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .expect("ANSI pattern compiles")
});

/// Remove ANSI escape sequences (CSI, OSC and two-byte escapes).
pub fn strip_ansi(s: &str) -> String {
    ANSI_ESCAPE.replace_all(s, "").into_owned()
}

/// Display width in terminal cells. Tabs count as 4 cells.
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_width).sum()
}

fn grapheme_width(g: &str) -> usize {
    if g == "\t" {
        4
    } else {
        UnicodeWidthStr::width(g)
    }
}

/// Truncate to at most `max_cells` cells, ending in `…` when cut.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    let budget = max_cells - 1; // room for '…'
    let mut width = 0;
    let mut out = String::new();
    for g in s.graphemes(true) {
        let gw = grapheme_width(g);
        if width + gw > budget {
            break;
        }
        width += gw;
        out.push_str(g);
    }
    out.push('\u{2026}');
    out
}

/// Truncate or right-pad with spaces to exactly `cells` cells.
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let mut out = truncate_to_width(s, cells);
    let w = display_width(&out);
    out.extend(std::iter::repeat_n(' ', cells.saturating_sub(w)));
    out
}

/// Word-wrap `s` into at most `max_lines` lines of `width` cells.
///
/// Words longer than the width are split at grapheme boundaries. When the
/// text needs more lines than allowed, the last line ends in `…`. Always
/// returns at least one line.
pub fn wrap_to_width(s: &str, width: usize, max_lines: usize) -> Vec<String> {
    let max_lines = max_lines.max(1);
    if width == 0 {
        return vec![String::new()];
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_w = 0;
    for word in s.split_whitespace() {
        let ww = display_width(word);
        let sep = usize::from(!current.is_empty());
        if current_w + sep + ww <= width {
            if sep == 1 {
                current.push(' ');
            }
            current.push_str(word);
            current_w += sep + ww;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_w = 0;
        }
        // hard-split words wider than a whole line
        for g in word.graphemes(true) {
            let gw = grapheme_width(g);
            if current_w + gw > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_w = 0;
            }
            current.push_str(g);
            current_w += gw;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        let rest = lines[max_lines - 1..].join(" ");
        lines.truncate(max_lines - 1);
        let mut last = truncate_to_width(&rest, width);
        if !last.ends_with('\u{2026}') {
            last = truncate_to_width(&format!("{rest}\u{2026}"), width);
        }
        lines.push(last);
    }
    lines
}

/// Next grapheme boundary after `byte_offset`. Returns None if at end.
pub fn next_grapheme_boundary(s: &str, byte_offset: usize) -> Option<usize> {
    if byte_offset >= s.len() {
        return None;
    }
    match s[byte_offset..].grapheme_indices(true).nth(1) {
        Some((i, _)) => Some(byte_offset + i),
        None => Some(s.len()),
    }
}

/// Previous grapheme boundary before `byte_offset`. Returns None if at start.
pub fn prev_grapheme_boundary(s: &str, byte_offset: usize) -> Option<usize> {
    if byte_offset == 0 {
        return None;
    }
    s[..byte_offset]
        .grapheme_indices(true)
        .next_back()
        .map(|(i, _)| i)
}

/// Convert byte offset to display column (terminal cells).
pub fn byte_offset_to_display_col(s: &str, byte_offset: usize) -> usize {
    display_width(&s[..byte_offset.min(s.len())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_counts_wide_and_tabs() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("日本"), 4);
        assert_eq!(display_width("a\tb"), 6);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("hello world", 5), "hell…");
        assert_eq!(truncate_to_width("hi", 5), "hi");
        assert_eq!(truncate_to_width("日本語", 4), "日…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn pad_fills_to_width() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("abcdef", 4), "abc…");
        assert_eq!(display_width(&pad_to_width("日本", 5)), 5);
    }

    #[test]
    fn strips_color_codes() {
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m plain"), "red plain");
        assert_eq!(strip_ansi("\x1b]0;title\x07text"), "text");
        assert_eq!(strip_ansi("no codes"), "no codes");
    }

    #[test]
    fn wraps_on_words() {
        assert_eq!(wrap_to_width("fix the login page", 10, 3), vec!["fix the", "login page"]);
        assert_eq!(wrap_to_width("short", 10, 2), vec!["short"]);
        assert_eq!(wrap_to_width("", 10, 2), vec![""]);
    }

    #[test]
    fn wrap_limits_lines_with_ellipsis() {
        let lines = wrap_to_width("one two three four five six", 9, 2);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "one two");
        assert!(lines[1].ends_with('…'));
        assert!(display_width(&lines[1]) <= 9);
    }

    #[test]
    fn wrap_splits_long_words() {
        assert_eq!(wrap_to_width("abcdefghij", 4, 5), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn grapheme_boundaries() {
        let s = "aé日";
        assert_eq!(next_grapheme_boundary(s, 0), Some(1));
        assert_eq!(next_grapheme_boundary(s, 1), Some(3));
        assert_eq!(next_grapheme_boundary(s, s.len()), None);
        assert_eq!(prev_grapheme_boundary(s, s.len()), Some(3));
        assert_eq!(prev_grapheme_boundary(s, 0), None);
        assert_eq!(byte_offset_to_display_col(s, s.len()), 4);
    }
}
