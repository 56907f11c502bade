//! The HTML error pages shown when a dashboard page cannot be rendered.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::{Error, html::error_view};

pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        let page = error_view("Internal Server Error", "500", self.description, self.fix);

        (StatusCode::INTERNAL_SERVER_ERROR, Html(page.into_string())).into_response()
    }
}

/// Render `error` as an HTML page instead of the JSON error body.
///
/// Unexpected errors are logged and hide their details from the page.
pub fn page_error_response(error: Error) -> Response {
    let status = error.status_code();

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("Could not render page: {error}");
        return InternalServerError::default().into_response();
    }

    let page = error_view(
        status.canonical_reason().unwrap_or("Error"),
        status.as_str(),
        &error.to_string(),
        "Check the address and try again.",
    );

    (status, Html(page.into_string())).into_response()
}
