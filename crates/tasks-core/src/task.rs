use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Byte offset of the checkbox character in `- [ ] title`.
const MARKER_OFFSET: usize = 3;
/// Byte offset where the title starts.
const TITLE_OFFSET: usize = 6;

const UNCHECKED: char = ' ';
const CHECKED: char = 'x';

fn task_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^- \[[ xX]\] ").expect("task line regex"))
}

/// Read-only projection of a task line. `line_index` is the line's slot in
/// the sequence it was extracted from and goes stale after a structural edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub line_index: usize,
    pub line: String,
    pub title: String,
    pub completed: bool,
}

pub fn is_task_line(line: &str) -> bool {
    task_line_regex().is_match(line)
}

pub fn parse_task(line_index: usize, line: &str) -> Option<Task> {
    if !is_task_line(line) {
        return None;
    }
    let marker = line.as_bytes()[MARKER_OFFSET];
    Some(Task {
        line_index,
        line: line.to_string(),
        title: line[TITLE_OFFSET..].to_string(),
        completed: marker.eq_ignore_ascii_case(&b'x'),
    })
}

pub fn new_task_line(title: &str) -> String {
    format!("- [{}] {}", UNCHECKED, title)
}

/// Rewrites only the checkbox character, so brackets inside the title are
/// never touched. Returns `None` when `line` is not a task line.
pub fn with_marker(line: &str, completed: bool) -> Option<String> {
    if !is_task_line(line) {
        return None;
    }
    let marker = if completed { CHECKED } else { UNCHECKED };
    let mut rewritten = String::with_capacity(line.len());
    rewritten.push_str(&line[..MARKER_OFFSET]);
    rewritten.push(marker);
    rewritten.push_str(&line[MARKER_OFFSET + 1..]);
    Some(rewritten)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub remaining: usize,
    pub completed: usize,
}

impl Summary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|task| task.completed).count();
        Self {
            remaining: tasks.len() - completed,
            completed,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "You have {} tasks remaining ({} completed):",
            self.remaining, self.completed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_all_checkbox_states() {
        assert!(is_task_line("- [ ] open"));
        assert!(is_task_line("- [x] done"));
        assert!(is_task_line("- [X] shouting"));
        assert!(is_task_line("- [ ] "));
    }

    #[test]
    fn rejects_near_misses() {
        for line in [
            "",
            "# Heading",
            "-[ ] no space",
            "- [ ]no space after",
            "- [-] other marker",
            "  - [ ] indented",
            "* [ ] star bullet",
            "- [ ]",
        ] {
            assert!(!is_task_line(line), "{line:?} should not be a task");
        }
    }

    #[test]
    fn parse_task_extracts_title_and_state() {
        let task = parse_task(4, "- [X] call mom").expect("task");
        assert_eq!(task.line_index, 4);
        assert_eq!(task.title, "call mom");
        assert!(task.completed);

        let open = parse_task(0, "- [ ] buy [ ] milk").expect("task");
        assert_eq!(open.title, "buy [ ] milk");
        assert!(!open.completed);

        assert!(parse_task(1, "notes").is_none());
    }

    #[test]
    fn with_marker_leaves_title_brackets_alone() {
        assert_eq!(
            with_marker("- [x] fix [ ] rendering", false).as_deref(),
            Some("- [ ] fix [ ] rendering")
        );
        assert_eq!(
            with_marker("- [ ] fix [x] parsing", true).as_deref(),
            Some("- [x] fix [x] parsing")
        );
        assert_eq!(
            with_marker("- [X] loud", false).as_deref(),
            Some("- [ ] loud")
        );
        assert!(with_marker("## Section", true).is_none());
    }

    #[test]
    fn summary_counts_and_renders() {
        let tasks = vec![
            parse_task(0, "- [x] buy milk").unwrap(),
            parse_task(1, "- [ ] call mom").unwrap(),
        ];
        let summary = Summary::from_tasks(&tasks);
        assert_eq!(
            summary.to_string(),
            "You have 1 tasks remaining (1 completed):"
        );
    }
}
