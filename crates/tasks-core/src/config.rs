use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Could not determine home directory (set HOME, TASKS_HOME or TASKS_FILE)")]
    NoHome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Path of the task file; a leading `~` expands to the home directory.
    pub file: Option<String>,
    /// Match task queries case-sensitively.
    pub case_sensitive: Option<bool>,
}

pub const TASK_FILE_NAME: &str = "tasks.md";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub fn resolve_user_home_dir() -> Option<PathBuf> {
    for key in ["HOME", "USERPROFILE"] {
        if let Ok(value) = std::env::var(key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
    }
    None
}

/// `TASKS_HOME`, falling back to `~/.tasks`.
pub fn resolve_tasks_home_dir() -> Option<PathBuf> {
    if let Ok(value) = std::env::var("TASKS_HOME") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    resolve_user_home_dir().map(|home| home.join(".tasks"))
}

pub fn global_config_path() -> Option<PathBuf> {
    resolve_tasks_home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

pub fn expand_home(value: &str) -> Result<PathBuf, ConfigError> {
    let value = value.trim();
    let rest = if value == "~" {
        ""
    } else if let Some(rest) = value.strip_prefix("~/").or_else(|| value.strip_prefix("~\\")) {
        rest
    } else {
        return Ok(PathBuf::from(value));
    };
    let home = resolve_user_home_dir().ok_or(ConfigError::NoHome)?;
    Ok(if rest.is_empty() { home } else { home.join(rest) })
}

pub fn load_config_from(path: &Path) -> Result<Option<TasksConfig>, ConfigError> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    let config = toml::from_str::<TasksConfig>(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config");
    Ok(Some(config))
}

pub fn load_config() -> Result<Option<TasksConfig>, ConfigError> {
    match global_config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(None),
    }
}

/// Picks the task file: explicit flag, then `TASKS_FILE`, then the config
/// file, then `~/.tasks/tasks.md`. The second value names the winning source.
pub fn resolve_task_file_with_source(
    flag: Option<&Path>,
    config: Option<&TasksConfig>,
) -> Result<(PathBuf, &'static str), ConfigError> {
    if let Some(path) = flag {
        return Ok((path.to_path_buf(), "flag"));
    }
    if let Ok(value) = std::env::var("TASKS_FILE") {
        if !value.trim().is_empty() {
            return Ok((expand_home(&value)?, "env"));
        }
    }
    if let Some(value) = config
        .and_then(|config| config.file.as_deref())
        .filter(|value| !value.trim().is_empty())
    {
        return Ok((expand_home(value)?, "config"));
    }
    let home = resolve_tasks_home_dir().ok_or(ConfigError::NoHome)?;
    Ok((home.join(TASK_FILE_NAME), "default"))
}

pub fn resolve_task_file(
    flag: Option<&Path>,
    config: Option<&TasksConfig>,
) -> Result<PathBuf, ConfigError> {
    resolve_task_file_with_source(flag, config).map(|(path, _)| path)
}

pub fn resolve_case_sensitive(flag: bool, config: Option<&TasksConfig>) -> bool {
    flag || config
        .and_then(|config| config.case_sensitive)
        .unwrap_or(false)
}
