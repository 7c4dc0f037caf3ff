//! Request handlers.
//!
//! Each handler validates its input, makes one call into a [`TodoStore`] and
//! describes what should happen next as an [`Outcome`]. Rendering, redirects
//! and delivering the message across a redirect belong to the caller.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::{TITLE_MAX_LEN, Todo};
use crate::store::{self, StoreError, TitleError, TodoStore};
use crate::utils::parse_due_date;

pub const TITLE_REQUIRED: &str = "Title is required!";
pub const CREATED: &str = "Todo created successfully!";
pub const UPDATED: &str = "Todo updated successfully!";
pub const DELETED: &str = "Todo deleted successfully!";

/// Submitted todo form. Missing fields read as empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TodoForm {
    pub title: String,
    pub description: String,
    pub due_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

/// A one-shot status message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

impl Message {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    List(Vec<Todo>),
    /// The create form, or the edit form for an existing todo
    Form(Option<Todo>),
    ConfirmDelete(Todo),
    RedirectToList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub page: Page,
    pub message: Option<Message>,
}

impl Outcome {
    fn page(page: Page) -> Self {
        Self {
            page,
            message: None,
        }
    }

    fn redirect(message: impl Into<String>) -> Self {
        Self {
            page: Page::RedirectToList,
            message: Some(Message::success(message)),
        }
    }

    fn invalid_form(todo: Option<Todo>, message: String) -> Self {
        Self {
            page: Page::Form(todo),
            message: Some(Message::error(message)),
        }
    }
}

/// Title problem to report back on the form, if any
fn title_error(title: &str) -> Option<String> {
    match store::validate_title(title) {
        Ok(_) => None,
        Err(TitleError::Missing) => Some(TITLE_REQUIRED.to_string()),
        Err(TitleError::TooLong) => Some(format!("Title must be at most {TITLE_MAX_LEN} characters!")),
    }
}

fn description(form: &TodoForm) -> Option<&str> {
    Some(form.description.as_str()).filter(|d| !d.is_empty())
}

pub fn list<S: TodoStore + ?Sized>(store: &S) -> Result<Outcome, StoreError> {
    Ok(Outcome::page(Page::List(store.list_all()?)))
}

pub fn show_create_form() -> Outcome {
    Outcome::page(Page::Form(None))
}

pub fn create<S: TodoStore + ?Sized>(store: &S, form: &TodoForm) -> Result<Outcome, StoreError> {
    if let Some(message) = title_error(&form.title) {
        return Ok(Outcome::invalid_form(None, message));
    }

    let due_date = parse_due_date(&form.due_date);
    let todo = store.create(&form.title, description(form), due_date)?;
    info!(id = todo.id, "todo created");
    Ok(Outcome::redirect(CREATED))
}

pub fn show_edit_form<S: TodoStore + ?Sized>(store: &S, id: i64) -> Result<Outcome, StoreError> {
    Ok(Outcome::page(Page::Form(Some(store.get(id)?))))
}

pub fn edit<S: TodoStore + ?Sized>(
    store: &S,
    id: i64,
    form: &TodoForm,
) -> Result<Outcome, StoreError> {
    let existing = store.get(id)?;
    if let Some(message) = title_error(&form.title) {
        return Ok(Outcome::invalid_form(Some(existing), message));
    }

    let due_date = parse_due_date(&form.due_date);
    store.update(id, &form.title, description(form), due_date)?;
    info!(id, "todo updated");
    Ok(Outcome::redirect(UPDATED))
}

pub fn show_delete_confirmation<S: TodoStore + ?Sized>(
    store: &S,
    id: i64,
) -> Result<Outcome, StoreError> {
    Ok(Outcome::page(Page::ConfirmDelete(store.get(id)?)))
}

pub fn delete<S: TodoStore + ?Sized>(store: &S, id: i64) -> Result<Outcome, StoreError> {
    store.delete(id)?;
    info!(id, "todo deleted");
    Ok(Outcome::redirect(DELETED))
}

pub fn toggle_resolved<S: TodoStore + ?Sized>(store: &S, id: i64) -> Result<Outcome, StoreError> {
    let todo = store.get(id)?;
    let todo = store.set_resolved(id, !todo.resolved)?;
    let status = if todo.resolved { "resolved" } else { "unresolved" };
    info!(id, status, "todo toggled");
    Ok(Outcome::redirect(format!("Todo marked as {status}!")))
}
