use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;
use crate::web::render::NOT_FOUND_PAGE;

const SERVER_ERROR_PAGE: &str = "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
<title>Server error</title></head><body><h1>Something went wrong</h1>\
<p><a href=\"/\">Back to the list</a></p></body></html>\n";

/// Errors a web handler can end with
#[derive(Debug, Error)]
pub enum WebError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Store error: {0}")]
    Store(StoreError),
    #[error("Bad form submission: {0}")]
    Form(FormRejection),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for WebError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => WebError::NotFound(format!("todo {id}")),
            other => WebError::Store(other),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::NotFound(what) => {
                warn!(%what, "not found");
                (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response()
            }
            WebError::Form(rejection) => {
                warn!(error = %rejection, "rejected form");
                rejection.into_response()
            }
            other => {
                error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_PAGE)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_todo_maps_to_404() {
        let response = WebError::from(StoreError::NotFound(9)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn infrastructure_failures_map_to_500() {
        let response = WebError::from(StoreError::Poisoned).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
