//! HTTP front end.
//!
//! # Routes
//!
//! - `GET /` - list todos
//! - `GET|POST /create/` - create form / submit
//! - `GET|POST /edit/:id/` - edit form / submit
//! - `GET|POST /delete/:id/` - confirmation / delete
//! - `POST /toggle/:id/` - flip the resolved flag

pub mod error;
pub mod flash;
pub mod render;

use axum::{
    Form, Router,
    extract::{Path, State, rejection::FormRejection},
    http::{HeaderMap, HeaderValue, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::handlers::{self, Outcome, Page, TodoForm};
use crate::store::TodoStore;

pub use error::WebError;
pub use flash::FlashStore;
pub use render::Templates;

/// Shared state for every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
    pub templates: Arc<Templates>,
    pub flash: FlashStore,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>) -> Result<Self, WebError> {
        Ok(Self {
            store,
            templates: Arc::new(Templates::new()?),
            flash: FlashStore::new(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_todos))
        .route("/create/", get(create_form).post(create_todo))
        .route("/edit/:id/", get(edit_form).post(edit_todo))
        .route("/delete/:id/", get(delete_confirmation).post(delete_todo))
        .route("/toggle/:id/", post(toggle_todo))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the app on `addr` until Ctrl+C
pub async fn serve(state: AppState, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("unable to listen for shutdown signal: {}", e);
            }
            info!("shutting down");
        })
        .await
}

/// Ids that are not integers cannot name a todo
fn parse_id(raw: &str) -> Result<i64, WebError> {
    raw.parse()
        .map_err(|_| WebError::NotFound(format!("todo {raw}")))
}

/// Turn a handler outcome into an HTTP response.
///
/// Redirects queue their message for the session (creating one if needed);
/// rendered pages show the queued messages plus their own.
fn respond(state: &AppState, headers: &HeaderMap, outcome: Outcome) -> Result<Response, WebError> {
    let session = flash::session_id(headers);

    if outcome.page == Page::RedirectToList {
        let (session, new_cookie) = match session {
            Some(id) => (id, None),
            None => {
                let id = Uuid::new_v4();
                (id, Some(flash::session_cookie(id)))
            }
        };
        if let Some(message) = outcome.message {
            state.flash.push(session, message);
        }

        let mut response = Redirect::to("/").into_response();
        if let Some(cookie) = new_cookie {
            let value =
                HeaderValue::from_str(&cookie).map_err(|e| WebError::Internal(e.to_string()))?;
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        return Ok(response);
    }

    let mut messages = session.map(|id| state.flash.take(id)).unwrap_or_default();
    messages.extend(outcome.message);
    let html = state.templates.render_page(&outcome.page, &messages)?;
    Ok(Html(html).into_response())
}

async fn list_todos(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let outcome = handlers::list(state.store.as_ref())?;
    respond(&state, &headers, outcome)
}

async fn create_form(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    respond(&state, &headers, handlers::show_create_form())
}

async fn create_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TodoForm>,
) -> Result<Response, WebError> {
    let outcome = handlers::create(state.store.as_ref(), &form)?;
    respond(&state, &headers, outcome)
}

async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let outcome = handlers::show_edit_form(state.store.as_ref(), parse_id(&id)?)?;
    respond(&state, &headers, outcome)
}

/// An unknown todo is a 404 even when the body is not a form
async fn edit_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    form: Result<Form<TodoForm>, FormRejection>,
) -> Result<Response, WebError> {
    let id = parse_id(&id)?;
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            state.store.get(id)?;
            return Err(WebError::Form(rejection));
        }
    };
    let outcome = handlers::edit(state.store.as_ref(), id, &form)?;
    respond(&state, &headers, outcome)
}

async fn delete_confirmation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let outcome = handlers::show_delete_confirmation(state.store.as_ref(), parse_id(&id)?)?;
    respond(&state, &headers, outcome)
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let outcome = handlers::delete(state.store.as_ref(), parse_id(&id)?)?;
    respond(&state, &headers, outcome)
}

async fn toggle_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let outcome = handlers::toggle_resolved(state.store.as_ref(), parse_id(&id)?)?;
    respond(&state, &headers, outcome)
}

async fn not_found() -> WebError {
    WebError::NotFound("route".to_string())
}
