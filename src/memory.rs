use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::models::Todo;
use crate::store::{self, StoreError, TodoStore};
use crate::utils;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    todos: BTreeMap<i64, Todo>,
}

/// Todo store kept entirely in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl TodoStore for InMemoryStore {
    fn create(
        &self,
        title: &str,
        description: Option<&str>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Todo, StoreError> {
        let title = store::validate_title(title)?;
        store::validate_due_date(due_date.as_ref())?;
        let now = utils::now();

        let mut inner = self.lock()?;
        inner.next_id += 1;
        let todo = Todo {
            id: inner.next_id,
            title: title.to_string(),
            description: store::normalize_description(description),
            due_date,
            resolved: false,
            created_at: now,
            updated_at: now,
        };
        inner.todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    fn get(&self, id: i64) -> Result<Todo, StoreError> {
        self.lock()?
            .todos
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn update(
        &self,
        id: i64,
        title: &str,
        description: Option<&str>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Todo, StoreError> {
        let mut inner = self.lock()?;
        let todo = inner.todos.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let title = store::validate_title(title)?;
        store::validate_due_date(due_date.as_ref())?;

        todo.title = title.to_string();
        todo.description = store::normalize_description(description);
        todo.due_date = due_date;
        todo.updated_at = store::next_updated_at(todo.updated_at);
        Ok(todo.clone())
    }

    fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.lock()?
            .todos
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    fn set_resolved(&self, id: i64, resolved: bool) -> Result<Todo, StoreError> {
        let mut inner = self.lock()?;
        let todo = inner.todos.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        todo.resolved = resolved;
        todo.updated_at = store::next_updated_at(todo.updated_at);
        Ok(todo.clone())
    }

    fn list_all(&self) -> Result<Vec<Todo>, StoreError> {
        let mut todos: Vec<Todo> = self.lock()?.todos.values().cloned().collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(todos)
    }
}
