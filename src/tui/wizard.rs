//! State for the create/edit wizard.

use crate::model::config::BoardConfig;
use crate::model::task::Task;
use crate::ops::task_ops::{NewTask, TaskEdit};
use crate::util::unicode::{next_grapheme_boundary, prev_grapheme_boundary};

/// An editable string with a cursor on a grapheme boundary (byte offset)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    pub text: String,
    pub cursor: usize,
}

impl TextField {
    pub fn new(text: &str) -> Self {
        TextField {
            text: text.to_string(),
            cursor: text.len(),
        }
    }

    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = prev_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = next_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(self.cursor..next, "");
        }
    }

    pub fn left(&mut self) {
        if let Some(prev) = prev_grapheme_boundary(&self.text, self.cursor) {
            self.cursor = prev;
        }
    }

    pub fn right(&mut self) {
        if let Some(next) = next_grapheme_boundary(&self.text, self.cursor) {
            self.cursor = next;
        }
    }

    /// Start of the current line
    pub fn home(&mut self) {
        self.cursor = self.text[..self.cursor].rfind('\n').map_or(0, |i| i + 1);
    }

    /// End of the current line
    pub fn end(&mut self) {
        self.cursor += self.text[self.cursor..].find('\n').unwrap_or(self.text.len() - self.cursor);
    }

    /// Line index and byte offset within that line of the cursor
    pub fn cursor_line(&self) -> (usize, usize) {
        let before = &self.text[..self.cursor];
        let line = before.matches('\n').count();
        let start = before.rfind('\n').map_or(0, |i| i + 1);
        (line, self.cursor - start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Title,
    Body,
    Priority,
    Tags,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Title,
        WizardStep::Body,
        WizardStep::Priority,
        WizardStep::Tags,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Title => "Title",
            WizardStep::Body => "Body",
            WizardStep::Priority => "Priority",
            WizardStep::Tags => "Tags",
        }
    }

    /// Tab: wraps from the last step to the first
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    /// Shift+Tab
    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Wizard contents. `editing` holds the task id when editing.
#[derive(Debug, Clone)]
pub struct Wizard {
    pub editing: Option<u32>,
    pub step: WizardStep,
    pub title: TextField,
    pub body: TextField,
    /// Index into the configured priorities
    pub priority: usize,
    pub priorities: Vec<String>,
    pub tags: TextField,
}

/// Split "api, needs review" into tags, keeping order and repeats.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

impl Wizard {
    pub fn create(cfg: &BoardConfig) -> Self {
        let priority = cfg.priority_index(cfg.default_priority()).unwrap_or(0);
        Wizard {
            editing: None,
            step: WizardStep::Title,
            title: TextField::default(),
            body: TextField::default(),
            priority,
            priorities: cfg.priorities.clone(),
            tags: TextField::default(),
        }
    }

    /// Pre-filled from `task`
    pub fn edit(cfg: &BoardConfig, task: &Task) -> Self {
        let priority = cfg
            .priority_index(&task.priority)
            .or_else(|| cfg.priority_index(cfg.default_priority()))
            .unwrap_or(0);
        Wizard {
            editing: Some(task.id),
            step: WizardStep::Title,
            title: TextField::new(&task.title),
            body: TextField::new(task.body.trim_end()),
            priority,
            priorities: cfg.priorities.clone(),
            tags: TextField::new(&task.tags.join(", ")),
        }
    }

    pub fn field_mut(&mut self) -> Option<&mut TextField> {
        match self.step {
            WizardStep::Title => Some(&mut self.title),
            WizardStep::Body => Some(&mut self.body),
            WizardStep::Tags => Some(&mut self.tags),
            WizardStep::Priority => None,
        }
    }

    pub fn priority_name(&self) -> &str {
        self.priorities.get(self.priority).map_or("", String::as_str)
    }

    pub fn cycle_priority(&mut self, delta: isize) {
        if self.priorities.is_empty() {
            return;
        }
        let n = self.priorities.len() as isize;
        self.priority = (self.priority as isize + delta).rem_euclid(n) as usize;
    }

    /// Whether submitting should cancel instead
    pub fn is_blank(&self) -> bool {
        self.title.text.trim().is_empty()
    }

    pub fn to_new_task(&self) -> NewTask {
        NewTask {
            title: self.title.text.trim().to_string(),
            priority: Some(self.priority_name().to_string()).filter(|p| !p.is_empty()),
            tags: parse_tags(&self.tags.text),
            body: self.body.text.clone(),
            ..NewTask::default()
        }
    }

    /// Only fields that differ from `task` are set.
    pub fn to_edit(&self, task: &Task) -> TaskEdit {
        let title = self.title.text.trim();
        let tags = parse_tags(&self.tags.text);
        let priority = self.priority_name();
        let body = (self.body.text.trim_end() != task.body.trim_end()).then(|| {
            let mut body = self.body.text.clone();
            if task.body.ends_with('\n') && !body.is_empty() && !body.ends_with('\n') {
                body.push('\n');
            }
            body
        });
        TaskEdit {
            title: (title != task.title).then(|| title.to_string()),
            body,
            priority: (!priority.is_empty() && priority != task.priority).then(|| priority.to_string()),
            tags: (tags != task.tags).then_some(tags),
            ..TaskEdit::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::now;

    #[test]
    fn text_field_edits_by_grapheme() {
        let mut f = TextField::new("cafe\u{301}");
        f.backspace();
        assert_eq!(f.text, "caf");
        f.insert('é');
        f.left();
        f.left();
        f.insert('-');
        assert_eq!(f.text, "ca-fé");
        f.delete();
        assert_eq!(f.text, "ca-é");
        f.right();
        f.right();
        assert_eq!(f.cursor, f.text.len());
    }

    #[test]
    fn text_field_lines() {
        let mut f = TextField::new("one\ntwo");
        assert_eq!(f.cursor_line(), (1, 3));
        f.home();
        assert_eq!(f.cursor_line(), (1, 0));
        f.left();
        assert_eq!(f.cursor_line(), (0, 3));
        f.home();
        f.end();
        assert_eq!(f.cursor, 3);
    }

    #[test]
    fn steps_cycle_both_ways() {
        assert_eq!(WizardStep::Title.next(), WizardStep::Body);
        assert_eq!(WizardStep::Tags.next(), WizardStep::Title);
        assert_eq!(WizardStep::Title.prev(), WizardStep::Tags);
        assert_eq!(WizardStep::Priority.prev(), WizardStep::Body);
    }

    #[test]
    fn tags_split_and_dedupe() {
        assert_eq!(parse_tags("api, needs review,,api"), vec!["api", "needs review", "api"]);
        assert!(parse_tags(" , ").is_empty());
    }

    #[test]
    fn create_uses_default_priority() {
        let cfg = BoardConfig::new_default("t");
        let mut w = Wizard::create(&cfg);
        assert_eq!(w.priority_name(), "medium");
        w.cycle_priority(-2);
        assert_eq!(w.priority_name(), "critical");
        w.cycle_priority(1);
        assert_eq!(w.priority_name(), "low");

        w.title = TextField::new("  Ship it ");
        w.tags = TextField::new("release");
        let new = w.to_new_task();
        assert_eq!(new.title, "Ship it");
        assert_eq!(new.priority.as_deref(), Some("low"));
        assert_eq!(new.tags, vec!["release"]);
    }

    #[test]
    fn edit_prefills_and_diffs() {
        let cfg = BoardConfig::new_default("t");
        let mut task = Task::new(4, "Fix login".into(), "todo".into(), "high".into(), now());
        task.tags = vec!["api".into()];
        task.body = "Details\n".into();

        let mut w = Wizard::edit(&cfg, &task);
        assert_eq!(w.title.text, "Fix login");
        assert_eq!(w.body.text, "Details");
        assert_eq!(w.priority_name(), "high");
        assert_eq!(w.tags.text, "api");

        let unchanged = w.to_edit(&task);
        assert!(unchanged.title.is_none() && unchanged.body.is_none());
        assert!(unchanged.priority.is_none() && unchanged.tags.is_none());

        w.title = TextField::new("Fix login flow");
        w.tags = TextField::new("api, auth");
        let edit = w.to_edit(&task);
        assert_eq!(edit.title.as_deref(), Some("Fix login flow"));
        assert_eq!(edit.tags, Some(vec!["api".to_string(), "auth".to_string()]));
        assert!(edit.body.is_none());
    }

    #[test]
    fn untouched_tags_and_body_survive_an_edit() {
        let cfg = BoardConfig::new_default("t");
        let mut task = Task::new(4, "Fix login".into(), "todo".into(), "high".into(), now());
        task.tags = vec!["needs review".into(), "api".into(), "api".into()];
        task.body = "Details\n".into();

        let mut w = Wizard::edit(&cfg, &task);
        assert!(w.to_edit(&task).tags.is_none());

        w.body = TextField::new("More details");
        assert_eq!(w.to_edit(&task).body.as_deref(), Some("More details\n"));
    }

    #[test]
    fn blank_title_cancels() {
        let cfg = BoardConfig::new_default("t");
        let mut w = Wizard::create(&cfg);
        w.title = TextField::new("   ");
        assert!(w.is_blank());
    }
}
