use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} exited with status {status}")]
    Failed { program: String, status: String },
}

/// Editor variables checked in order before falling back to the platform
/// opener.
pub const EDITOR_VARS: [&str; 3] = ["TASKS_EDITOR", "VISUAL", "EDITOR"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl OpenCommand {
    fn display_name(&self) -> String {
        self.program.display().to_string()
    }
}

pub fn platform_opener(path: &Path) -> OpenCommand {
    let file = path.display().to_string();
    if cfg!(target_os = "macos") {
        OpenCommand {
            program: PathBuf::from("open"),
            args: vec![file],
        }
    } else if cfg!(windows) {
        OpenCommand {
            program: PathBuf::from("cmd"),
            args: vec!["/C".to_string(), "start".to_string(), String::new(), file],
        }
    } else {
        OpenCommand {
            program: PathBuf::from("xdg-open"),
            args: vec![file],
        }
    }
}

/// Builds the command from an editor variable value such as `code --wait`.
/// Returns `None` when the value is blank, unparsable, or names a program
/// that is not on `PATH`.
pub fn command_from_editor(value: &str, path: &Path) -> Option<OpenCommand> {
    let words = match shell_words::split(value) {
        Ok(words) => words,
        Err(err) => {
            warn!(value, error = %err, "ignoring unparsable editor command");
            return None;
        }
    };
    let (program, rest) = words.split_first()?;
    let program = match which::which(program) {
        Ok(found) => found,
        Err(err) => {
            warn!(program = program.as_str(), error = %err, "editor not found on PATH");
            return None;
        }
    };
    let mut args = rest.to_vec();
    args.push(path.display().to_string());
    Some(OpenCommand { program, args })
}

/// Resolves the command used by `open`/`edit`, reading editor variables
/// through `lookup`.
pub fn resolve_open_command(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> OpenCommand {
    for key in EDITOR_VARS {
        let Some(value) = lookup(key).filter(|value| !value.trim().is_empty()) else {
            continue;
        };
        if let Some(command) = command_from_editor(&value, path) {
            debug!(source = key, program = %command.program.display(), "resolved editor");
            return command;
        }
    }
    platform_opener(path)
}

pub fn open_in_editor(path: &Path) -> Result<(), EditorError> {
    let command = resolve_open_command(path, |key| std::env::var(key).ok());
    let status = Command::new(&command.program)
        .args(&command.args)
        .status()
        .map_err(|source| EditorError::Launch {
            program: command.display_name(),
            source,
        })?;
    if !status.success() {
        return Err(EditorError::Failed {
            program: command.display_name(),
            status: status.to_string(),
        });
    }
    Ok(())
}
