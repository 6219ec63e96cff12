use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::task::{parse_task, Task};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One line of the backing file, without its newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub content: String,
    /// Position at load time. The authoritative position is the slot in
    /// [`TaskFile::lines`].
    pub original_index: usize,
}

impl Line {
    pub fn new(content: impl Into<String>, original_index: usize) -> Self {
        Self {
            content: content.into(),
            original_index,
        }
    }
}

/// The whole task file, loaded for a single load-mutate-save cycle.
///
/// A final `\n` is tracked by `trailing_newline` rather than as an empty
/// last line, so `render` reproduces the input byte for byte and moving a
/// line to the tail never strands the newline in the middle of the file.
#[derive(Debug, Clone)]
pub struct TaskFile {
    path: PathBuf,
    pub(crate) lines: Vec<Line>,
    pub(crate) trailing_newline: bool,
}

impl TaskFile {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::from_text(path, &text);
        debug!(
            path = %path.display(),
            lines = file.lines.len(),
            "loaded task file"
        );
        Ok(file)
    }

    pub fn from_text(path: &Path, text: &str) -> Self {
        if text.is_empty() {
            return Self {
                path: path.to_path_buf(),
                lines: Vec::new(),
                trailing_newline: false,
            };
        }
        let (body, trailing_newline) = match text.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (text, false),
        };
        let lines = body
            .split('\n')
            .enumerate()
            .map(|(idx, line)| Line::new(line, idx))
            .collect();
        Self {
            path: path.to_path_buf(),
            lines,
            trailing_newline,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Task view over the current sequence. Recompute after every edit.
    pub fn tasks(&self) -> Vec<Task> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(idx, line)| parse_task(idx, &line.content))
            .collect()
    }

    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut text = self
            .lines
            .iter()
            .map(|line| line.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }

    /// Replaces the backing file through a sibling temp file and a rename.
    /// A symlinked path is resolved first so the link target is replaced,
    /// not the link. Concurrent writers are not coordinated: the last rename
    /// wins.
    pub fn save(&self) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        let text = self.render();
        let target = fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        let tmp = temp_path(&target);
        let mut file = fs::File::create(&tmp).map_err(write_err)?;
        file.write_all(text.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);
        if let Err(err) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(err));
        }
        debug!(
            path = %target.display(),
            bytes = text.len(),
            "saved task file"
        );
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "tasks".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Creates the parent directory and an empty task file when missing.
/// Returns `true` when the file was created.
pub fn ensure_task_file(path: &Path) -> Result<bool, StoreError> {
    if path.is_file() {
        return Ok(false);
    }
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, "").map_err(write_err)?;
    debug!(path = %path.display(), "created task file");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn parse(text: &str) -> TaskFile {
        TaskFile::from_text(Path::new("tasks.md"), text)
    }

    #[test]
    fn render_round_trips_exactly() {
        for text in [
            "",
            "\n",
            "\n\n",
            "- [ ] buy milk",
            "- [ ] buy milk\n",
            "# Today\n\n- [ ] buy milk\n- [x] call mom\n\nnotes\n",
            "no newline at end\n- [X] done",
        ] {
            assert_eq!(parse(text).render(), text);
        }
    }

    #[test]
    fn lines_carry_original_positions() {
        let file = parse("# Today\n- [ ] a\n\n- [x] b\n");
        let indexes: Vec<usize> = file.lines().iter().map(|l| l.original_index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
        assert_eq!(file.lines()[2].content, "");
    }

    #[test]
    fn tasks_skip_passthrough_lines_without_reindexing() {
        let file = parse("# Today\n- [ ] a\n\n- [x] b\nplain text\n");
        let tasks = file.tasks();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].line_index, 1);
        assert_eq!(tasks[0].title, "a");
        assert_eq!(tasks[1].line_index, 3);
        assert!(tasks[1].completed);
    }

    #[test]
    fn save_and_load_preserve_content() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("tasks.md");
        let text = "# Work\n- [ ] ship it\n\n- [x] review\n";
        std::fs::write(&path, text).expect("seed");

        let file = TaskFile::load(&path).expect("load");
        file.save().expect("save");

        assert_eq!(std::fs::read_to_string(&path).expect("read"), text);
        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("tasks.md")]);
    }

    #[cfg(unix)]
    #[test]
    fn save_writes_through_symlink() {
        let temp = TempDir::new().expect("tempdir");
        let real = temp.path().join("real.md");
        let link = temp.path().join("tasks.md");
        std::fs::write(&real, "- [ ] a\n").expect("seed");
        std::os::unix::fs::symlink(&real, &link).expect("symlink");

        let mut file = TaskFile::load(&link).expect("load");
        file.add("b");
        file.save().expect("save");

        let meta = std::fs::symlink_metadata(&link).expect("link metadata");
        assert!(meta.file_type().is_symlink());
        assert_eq!(
            std::fs::read_to_string(&real).expect("read"),
            "- [ ] a\n- [ ] b\n"
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let temp = TempDir::new().expect("tempdir");
        let err = TaskFile::load(&temp.path().join("missing.md")).unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[test]
    fn ensure_task_file_creates_directory_and_file_once() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join(".tasks").join("tasks.md");

        assert!(ensure_task_file(&path).expect("create"));
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "");

        std::fs::write(&path, "- [ ] keep me\n").expect("write");
        assert!(!ensure_task_file(&path).expect("existing"));
        assert_eq!(
            std::fs::read_to_string(&path).expect("read"),
            "- [ ] keep me\n"
        );
    }
}
