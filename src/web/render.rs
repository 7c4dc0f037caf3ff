//! HTML rendering with tera.
//!
//! Templates are compiled into the binary. Every template name ends in
//! `.html`, which turns on tera's autoescaping for all user-supplied text.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Tera};

use crate::handlers::{Message, Page};
use crate::models::Todo;
use crate::utils::format_datetime_local;

pub const NOT_FOUND_PAGE: &str = include_str!("../../templates/404.html");

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("todo_list.html", include_str!("../../templates/todo_list.html")),
    ("todo_form.html", include_str!("../../templates/todo_form.html")),
    (
        "todo_confirm_delete.html",
        include_str!("../../templates/todo_confirm_delete.html"),
    ),
];

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        Ok(Self { tera })
    }

    /// Render a non-redirect page with the messages pending for this request
    pub fn render_page(&self, page: &Page, messages: &[Message]) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("messages", messages);

        let name = match page {
            Page::List(todos) => {
                let now = Utc::now();
                let views: Vec<TodoView> = todos.iter().map(|t| TodoView::new(t, now)).collect();
                context.insert("todos", &views);
                "todo_list.html"
            }
            Page::Form(todo) => {
                let view = todo.as_ref().map(|t| TodoView::new(t, Utc::now()));
                context.insert("todo", &view);
                "todo_form.html"
            }
            Page::ConfirmDelete(todo) => {
                context.insert("todo", &TodoView::new(todo, Utc::now()));
                "todo_confirm_delete.html"
            }
            Page::RedirectToList => {
                return Err(tera::Error::msg("a redirect has no page to render"));
            }
        };

        self.tera.render(name, &context)
    }
}

/// What the templates see of a todo
#[derive(Debug, Serialize)]
struct TodoView<'a> {
    id: i64,
    title: &'a str,
    description: Option<&'a str>,
    due_date: Option<String>,
    due_date_input: Option<String>,
    resolved: bool,
    overdue: bool,
    created_at: String,
}

impl<'a> TodoView<'a> {
    fn new(todo: &'a Todo, now: DateTime<Utc>) -> Self {
        Self {
            id: todo.id,
            title: &todo.title,
            description: todo.description.as_deref(),
            due_date: todo.due_date.as_ref().map(display_time),
            due_date_input: todo.due_date.as_ref().map(format_datetime_local),
            resolved: todo.resolved,
            overdue: todo.is_overdue_at(now),
            created_at: display_time(&todo.created_at),
        }
    }
}

fn display_time(ts: &DateTime<Utc>) -> String {
    ts.format("%b %-d, %Y %H:%M UTC").to_string()
}
