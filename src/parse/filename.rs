use std::sync::LazyLock;

use regex::Regex;

/// Longest slug kept in a filename (in characters)
pub const MAX_SLUG_LEN: usize = 60;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("static regex"));

/// Filename-safe slug of a title. Never empty.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let dashed = NON_ALNUM.replace_all(&lower, "-");
    let trimmed = dashed.trim_matches('-');
    let truncated: String = trimmed.chars().take(MAX_SLUG_LEN).collect();
    let slug = truncated.trim_end_matches('-');
    if slug.is_empty() {
        "task".to_string()
    } else {
        slug.to_string()
    }
}

/// `NNN-slug.md`, with ids wider than three digits written in full
pub fn task_filename(id: u32, title: &str) -> String {
    format!("{:03}-{}.md", id, slugify(title))
}

/// Id encoded in a task filename: the leading digits before the first `-`.
/// Returns `None` for names without leading digits.
pub fn extract_id(filename: &str) -> Option<u32> {
    let stem = filename.strip_suffix(".md").unwrap_or(filename);
    let prefix = stem.split('-').next().unwrap_or("");
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_basics() {
        assert_eq!(slugify("Fix the Parser!"), "fix-the-parser");
        assert_eq!(slugify("  --Hello,   World--  "), "hello-world");
        assert_eq!(slugify("a/b\\c"), "a-b-c");
        assert_eq!(slugify("!!!"), "task");
        assert_eq!(slugify(""), "task");
    }

    #[test]
    fn slug_is_truncated_without_trailing_dash() {
        let title = format!("{} tail", "x".repeat(59));
        let slug = slugify(&title);
        assert_eq!(slug, "x".repeat(59));
        assert!(slugify(&"word ".repeat(40)).chars().count() <= MAX_SLUG_LEN);
    }

    #[test]
    fn filenames_pad_to_three_digits() {
        assert_eq!(task_filename(7, "First"), "007-first.md");
        assert_eq!(task_filename(42, "Second task"), "042-second-task.md");
        assert_eq!(task_filename(1000, "Wide"), "1000-wide.md");
    }

    #[test]
    fn extract_ids() {
        assert_eq!(extract_id("001-a.md"), Some(1));
        assert_eq!(extract_id("099-c.md"), Some(99));
        assert_eq!(extract_id("1000-wide.md"), Some(1000));
        assert_eq!(extract_id("004-b-2.md"), Some(4));
        assert_eq!(extract_id("notes.md"), None);
        assert_eq!(extract_id("-1-x.md"), None);
        assert_eq!(extract_id("12a-x.md"), None);
    }
}
