use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::models::{TITLE_MAX_LEN, Todo};
use crate::utils;

/// Why a title cannot be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TitleError {
    #[error("title is required")]
    Missing,
    #[error("title must be at most {TITLE_MAX_LEN} characters")]
    TooLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Title(#[from] TitleError),
    #[error("due date must fall within years 0 to 9999")]
    DueDateOutOfRange,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Todo {0} not found")]
    NotFound(i64),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    Directory(String),
    #[error("Invalid stored timestamp: {0}")]
    Timestamp(String),
    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<TitleError> for StoreError {
    fn from(err: TitleError) -> Self {
        StoreError::Validation(err.into())
    }
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Persistence contract for todos.
///
/// Every call is a self-contained unit of work. Implementations must reject an
/// invalid title before touching stored state, and must make `updated_at`
/// strictly increase on every mutation.
pub trait TodoStore: Send + Sync {
    fn create(
        &self,
        title: &str,
        description: Option<&str>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Todo, StoreError>;

    fn get(&self, id: i64) -> Result<Todo, StoreError>;

    /// Replace title, description and due date. A `None` due date clears it.
    fn update(
        &self,
        id: i64,
        title: &str,
        description: Option<&str>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Todo, StoreError>;

    fn delete(&self, id: i64) -> Result<(), StoreError>;

    fn set_resolved(&self, id: i64, resolved: bool) -> Result<Todo, StoreError>;

    /// All todos, newest first
    fn list_all(&self) -> Result<Vec<Todo>, StoreError>;
}

/// Check a title and return it trimmed
pub fn validate_title(title: &str) -> Result<&str, TitleError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TitleError::Missing);
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(TitleError::TooLong);
    }
    Ok(title)
}

/// Due dates must survive the fixed-width storage format
pub fn validate_due_date(due_date: Option<&DateTime<Utc>>) -> Result<(), ValidationError> {
    match due_date {
        Some(due) if !utils::is_storable(due) => Err(ValidationError::DueDateOutOfRange),
        _ => Ok(()),
    }
}

/// Empty descriptions are stored as absent
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .filter(|d| !d.trim().is_empty())
        .map(str::to_string)
}

/// Next `updated_at` value, guaranteed to be later than `previous`
pub fn next_updated_at(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = utils::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}
