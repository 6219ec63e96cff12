use thiserror::Error;
use tracing::debug;

use crate::resolve::{resolve, MatchOptions};
use crate::store::{Line, TaskFile};
use crate::task::{new_task_line, parse_task, with_marker, Task};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("Line {0} is not a task")]
    NotATask(usize),
}

/// A positional edit applied to one resolved task line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Complete,
    Uncheck,
    Remove,
    /// Moves the line to the head of the whole file, ahead of headings too.
    Prioritize,
    /// Moves the line to the tail of the whole file.
    Deprioritize,
    Append(String),
}

impl Edit {
    pub fn name(&self) -> &'static str {
        match self {
            Edit::Complete => "complete",
            Edit::Uncheck => "uncheck",
            Edit::Remove => "remove",
            Edit::Prioritize => "prioritize",
            Edit::Deprioritize => "deprioritize",
            Edit::Append(_) => "append",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `after` is `None` when the line was removed.
    Applied { before: Task, after: Option<Task> },
    NotFound,
}

impl TaskFile {
    /// Appends `- [ ] {title}` as the last line and leaves the file
    /// newline-terminated.
    pub fn add(&mut self, title: &str) -> Task {
        let index = self.lines.len();
        let content = new_task_line(title);
        self.lines.push(Line::new(content.clone(), index));
        self.trailing_newline = true;
        debug!(line = index, "added task");
        Task {
            line_index: index,
            line: content,
            title: title.to_string(),
            completed: false,
        }
    }

    /// Applies `edit` to the task at `line_index`. Returns the task as it was
    /// before the edit and, unless removed, as it is afterwards.
    pub fn apply(&mut self, edit: &Edit, line_index: usize) -> Result<Outcome, EditError> {
        let before = self
            .lines
            .get(line_index)
            .and_then(|line| parse_task(line_index, &line.content))
            .ok_or(EditError::NotATask(line_index))?;

        let new_index = match edit {
            Edit::Complete | Edit::Uncheck => {
                let completed = matches!(edit, Edit::Complete);
                let line = &mut self.lines[line_index];
                line.content =
                    with_marker(&line.content, completed).ok_or(EditError::NotATask(line_index))?;
                Some(line_index)
            }
            Edit::Append(text) => {
                let line = &mut self.lines[line_index];
                line.content = format!("{} {}", line.content, text);
                Some(line_index)
            }
            Edit::Remove => {
                self.lines.remove(line_index);
                None
            }
            Edit::Prioritize => {
                let line = self.lines.remove(line_index);
                self.lines.insert(0, line);
                Some(0)
            }
            Edit::Deprioritize => {
                let line = self.lines.remove(line_index);
                self.lines.push(line);
                Some(self.lines.len() - 1)
            }
        };

        let after = new_index.and_then(|idx| parse_task(idx, &self.lines[idx].content));
        debug!(edit = edit.name(), from = line_index, to = ?new_index, "applied edit");
        Ok(Outcome::Applied { before, after })
    }
}

/// Resolves `query` against the current task view and applies `edit` to the
/// best match. `Outcome::NotFound` leaves the file untouched.
pub fn apply_to_match(
    file: &mut TaskFile,
    query: &str,
    edit: &Edit,
    options: MatchOptions,
) -> Result<Outcome, EditError> {
    let tasks = file.tasks();
    let Some(found) = resolve(query, &tasks, options) else {
        return Ok(Outcome::NotFound);
    };
    let line_index = found.task.line_index;
    file.apply(edit, line_index)
}
