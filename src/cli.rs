use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::handlers::{self, Level, Page, TodoForm};
use crate::store::{StoreError, TodoStore};

#[derive(Parser)]
#[command(name = "todos")]
#[command(about = "A small server-rendered todo list")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the web server (default if no subcommand)
    Serve {
        /// Address to listen on, overriding the config file
        #[arg(long)]
        bind: Option<String>,
        /// Keep todos in memory instead of the database file
        #[arg(long)]
        in_memory: bool,
    },
    /// Quickly add a new todo
    AddTodo {
        /// Todo title
        title: String,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
        /// Due date and time (e.g. 2024-05-01T14:30, UTC unless an offset is given)
        #[arg(long)]
        due: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
    #[error("{0}")]
    Invalid(String),
}

/// Handle the add-todo command
pub fn handle_add_todo<S: TodoStore + ?Sized>(
    title: String,
    description: Option<String>,
    due: Option<String>,
    store: &S,
) -> Result<String, CliError> {
    let form = TodoForm {
        title,
        description: description.unwrap_or_default(),
        due_date: due.unwrap_or_default(),
    };

    let outcome = handlers::create(store, &form)?;
    let message = outcome.message.map(|m| (m.level, m.text));
    match (outcome.page, message) {
        (Page::RedirectToList, Some((Level::Success, text))) => Ok(text),
        (_, Some((_, text))) => Err(CliError::Invalid(text)),
        (_, None) => Err(CliError::Invalid("todo was not created".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    #[test]
    fn parses_add_todo() {
        let cli = Cli::parse_from(["todos", "--dev", "add-todo", "Buy milk", "--due", "2030-01-01T10:00"]);
        assert!(cli.dev);
        assert_eq!(
            cli.command,
            Some(Commands::AddTodo {
                title: "Buy milk".to_string(),
                description: None,
                due: Some("2030-01-01T10:00".to_string()),
            })
        );
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::parse_from(["todos", "--config", "/tmp/todos.toml"]);
        assert_eq!(cli.command, None);
        assert_eq!(cli.config.as_deref(), Some("/tmp/todos.toml"));
    }

    #[test]
    fn add_todo_creates_a_record() {
        let store = InMemoryStore::new();
        let message =
            handle_add_todo("Buy milk".to_string(), None, None, &store).unwrap();
        assert_eq!(message, handlers::CREATED);

        let todos = store.list_all().unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Buy milk");
        assert!(!todos[0].resolved);
        assert_eq!(todos[0].due_date, None);
    }

    #[test]
    fn add_todo_rejects_blank_title() {
        let store = InMemoryStore::new();
        let err = handle_add_todo("  ".to_string(), None, None, &store).unwrap_err();
        assert_eq!(err.to_string(), handlers::TITLE_REQUIRED);
        assert!(store.list_all().unwrap().is_empty());
    }
}
