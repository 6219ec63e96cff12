use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tasks_core::config::{load_config, resolve_case_sensitive, resolve_task_file_with_source};
use tasks_core::edit::{apply_to_match, Edit, Outcome};
use tasks_core::editor::open_in_editor;
use tasks_core::resolve::MatchOptions;
use tasks_core::store::{ensure_task_file, TaskFile};
use tasks_core::task::{Summary, Task};

mod version;

const NO_SEARCH_TEXT: &str = "No search text provided";
const NO_APPEND_TEXT: &str = "No text provided to append";
const NO_TASK_TEXT: &str = "No task text provided";
const NOT_FOUND: &str = "Could not find task";

#[derive(Parser)]
#[command(
    name = "tasks",
    version = version::FULL,
    about = "Manage a checklist of tasks in a plain-text file",
    disable_help_subcommand = true
)]
struct Cli {
    /// Task file to operate on (defaults to ~/.tasks/tasks.md)
    #[arg(long, global = true, value_name = "PATH")]
    file: Option<PathBuf>,
    /// Match search text case-sensitively
    #[arg(long, global = true)]
    case_sensitive: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print task counts and every task line
    #[command(alias = "ls")]
    Log {
        /// Print tasks as JSON
        #[arg(long)]
        json: bool,
        /// Extra words are accepted and ignored
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
        ignored: Vec<String>,
    },
    /// Add an unchecked task
    Add {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Check off the best matching task
    #[command(aliases = ["complete", "finish", "done"])]
    Check {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },
    /// Uncheck the best matching task
    #[command(alias = "incomplete")]
    Uncheck {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },
    /// Delete the best matching task
    #[command(alias = "delete")]
    Remove {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },
    /// Move the best matching task to the top of the file
    #[command(alias = "top")]
    Prioritize {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },
    /// Move the best matching task to the bottom of the file
    #[command(alias = "bottom")]
    Deprioritize {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },
    /// Append text to the task matching the first word
    Append {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Open the task file in an editor
    #[command(alias = "edit")]
    Open,
    #[command(external_subcommand)]
    QuickAdd(Vec<String>),
}

/// Flags clap must still see when they lead the command line.
const RESERVED_FLAGS: [&str; 4] = ["-h", "--help", "-V", "--version"];

/// Index of the first word after any leading global flags.
fn first_word_index(args: &[String]) -> Option<usize> {
    let mut idx = 1;
    while let Some(arg) = args.get(idx) {
        match arg.as_str() {
            "--file" => idx += 2,
            "--case-sensitive" => idx += 1,
            flag if flag.starts_with("--file=") => idx += 1,
            _ => return Some(idx),
        }
    }
    None
}

/// Parses argv, treating a leading word that starts with `-` but is no
/// known flag (e.g. `-5 minute stretch`) as quick-add text. Words without a
/// hyphen reach the same variant through clap's external subcommand.
fn parse_cli_from(args: Vec<String>) -> Cli {
    let free_text_at = first_word_index(&args).filter(|&idx| {
        let word = args[idx].as_str();
        word.starts_with('-') && word != "--" && !RESERVED_FLAGS.contains(&word)
    });
    match free_text_at {
        Some(idx) => {
            let mut cli = Cli::parse_from(args[..idx].iter());
            cli.command = Some(Command::QuickAdd(args[idx..].to_vec()));
            cli
        }
        None => Cli::parse_from(args),
    }
}

struct Session {
    path: PathBuf,
    options: MatchOptions,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TASKS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = parse_cli_from(std::env::args().collect());

    let config = load_config().context("loading config")?;
    let (path, source) = resolve_task_file_with_source(cli.file.as_deref(), config.as_ref())?;
    debug!(path = %path.display(), source, "using task file");
    ensure_task_file(&path)?;

    let session = Session {
        path,
        options: MatchOptions {
            case_sensitive: resolve_case_sensitive(cli.case_sensitive, config.as_ref()),
        },
    };

    match cli.command {
        None => print_tasks(&session.path),
        Some(Command::Log { json: true, .. }) => print_json(&session.path),
        Some(Command::Log { json: false, .. }) => print_tasks(&session.path),
        Some(Command::Add { text }) => {
            if text.is_empty() {
                println!("{}", NO_TASK_TEXT);
                return Ok(());
            }
            add_task(&session, &text.join(" "))
        }
        Some(Command::QuickAdd(words)) => add_task(&session, &words.join(" ")),
        Some(Command::Check { query }) => edit_task(&session, &query, Edit::Complete),
        Some(Command::Uncheck { query }) => edit_task(&session, &query, Edit::Uncheck),
        Some(Command::Remove { query }) => edit_task(&session, &query, Edit::Remove),
        Some(Command::Prioritize { query }) => edit_task(&session, &query, Edit::Prioritize),
        Some(Command::Deprioritize { query }) => edit_task(&session, &query, Edit::Deprioritize),
        Some(Command::Append { words }) => match words.split_first() {
            None => {
                println!("{}", NO_SEARCH_TEXT);
                Ok(())
            }
            Some((_, [])) => {
                println!("{}", NO_APPEND_TEXT);
                Ok(())
            }
            Some((query, text)) => {
                let edit = Edit::Append(text.join(" "));
                edit_task(&session, std::slice::from_ref(query), edit)
            }
        },
        Some(Command::Open) => {
            open_in_editor(&session.path)
                .with_context(|| format!("opening {}", session.path.display()))?;
            Ok(())
        }
    }
}

fn load(path: &Path) -> Result<TaskFile> {
    TaskFile::load(path).with_context(|| format!("loading {}", path.display()))
}

fn print_tasks(path: &Path) -> Result<()> {
    let tasks = load(path)?.tasks();
    println!("{}", Summary::from_tasks(&tasks));
    for task in &tasks {
        println!("{}", task.line);
    }
    Ok(())
}

fn print_json(path: &Path) -> Result<()> {
    let tasks = load(path)?.tasks();
    println!("{}", serde_json::to_string_pretty(&tasks)?);
    Ok(())
}

fn add_task(session: &Session, title: &str) -> Result<()> {
    let mut file = load(&session.path)?;
    file.add(title);
    file.save()?;
    print_tasks(&session.path)
}

fn edit_task(session: &Session, query: &[String], edit: Edit) -> Result<()> {
    if query.is_empty() {
        println!("{}", NO_SEARCH_TEXT);
        return Ok(());
    }
    let query = query.join(" ");
    let mut file = load(&session.path)?;
    match apply_to_match(&mut file, &query, &edit, session.options)? {
        Outcome::Applied { before, .. } => {
            file.save()?;
            println!("{}", edit_message(&edit, &before));
        }
        Outcome::NotFound => println!("{}", NOT_FOUND),
    }
    print_tasks(&session.path)
}

fn edit_message(edit: &Edit, task: &Task) -> String {
    match edit {
        Edit::Complete => format!("Completed: {}", task.title),
        Edit::Uncheck => format!("Incomplete: {}", task.title),
        Edit::Remove => format!("Removed: {}", task.title),
        Edit::Prioritize => format!("Prioritized: {}", task.title),
        Edit::Deprioritize => format!("Deprioritized: {}", task.title),
        Edit::Append(text) => format!("Appended to: {} {}", task.title, text),
    }
}
