//! Finboard is a web app for tracking personal finances.
//!
//! Authenticated users manage accounts, categories, and transactions through
//! a JSON API, a server-rendered dashboard, or the typed [client::Client].
//! Every row is scoped to the user that owns it: a caller can never see,
//! change, or delete another user's data.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::{Deserialize, Serialize};
use tokio::signal;

mod account;
mod api;
mod app_state;
mod auth;
mod category;
pub mod client;
mod config;
mod dashboard;
mod data_table;
mod database_id;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod routing;
mod sheet;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use account::{Account, AccountForm, create_account};
pub use api::{BulkDeleteRequest, Data, DeletedId};
pub use app_state::AppState;
pub use auth::{
    LogInRequest, PasswordHash, RegisterRequest, User, UserID, UserProfile, ValidatedPassword,
    create_user,
};
pub use category::{Category, CategoryForm, create_category};
pub use config::ServerConfig;
pub use data_table::{
    Column, DataTable, PaginationConfig, SortDirection, SortState, SortValue, TableQuery, TableRow,
    TableState,
};
pub use database_id::DatabaseId;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{
    Transaction, TransactionForm, TransactionListQuery, TransactionRow, create_transaction,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry a valid, unexpired auth cookie.
    #[error("Unauthorized")]
    Unauthenticated,

    /// The email and password combination given at log-in did not match a user.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// A required identifier in the request path was empty.
    #[error("Missing id")]
    MissingId,

    /// The request body or query string could not be parsed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An account or category name was empty.
    #[error("Name cannot be empty")]
    EmptyName,

    /// A transaction payee was empty.
    #[error("Payee cannot be empty")]
    EmptyPayee,

    /// The email given at registration is not an email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email given at registration already belongs to a user.
    #[error("A user with that email already exists")]
    DuplicateEmail,

    /// The user provided a password that is too easy to guess.
    #[error("Password is too weak: {0}")]
    TooWeak(String),

    /// A date parameter was not in the `YYYY-MM-DD` format.
    #[error("Invalid date \"{0}\", expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The start of a date range came after its end.
    #[error("The start date {from} is after the end date {to}")]
    InvalidDateRange {
        /// The requested start date.
        from: String,
        /// The requested end date.
        to: String,
    },

    /// A transaction referenced an account the caller does not own.
    #[error("The account \"{0}\" does not exist")]
    InvalidAccount(String),

    /// A transaction referenced a category the caller does not own.
    #[error("The category \"{0}\" does not exist")]
    InvalidCategory(String),

    /// The requested resource was not found, or belongs to another user.
    ///
    /// Both cases share one error so that responses do not reveal whether
    /// another user's row exists.
    #[error("Not found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The auth token could not be written to or read from a cookie.
    #[error("could not encode the auth token: {0}")]
    TokenError(String),

    /// The canonical timezone string does not name a timezone.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent for every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// A short description of what went wrong.
    pub error: String,
    /// The underlying error message for unexpected failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Error {
    pub(crate) fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::MissingId
            | Error::InvalidRequest(_)
            | Error::EmptyName
            | Error::EmptyPayee
            | Error::InvalidEmail(_)
            | Error::TooWeak(_)
            | Error::InvalidDate(_)
            | Error::InvalidDateRange { .. }
            | Error::InvalidAccount(_)
            | Error::InvalidCategory(_) => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::HashingError(_)
            | Error::TokenError(_)
            | Error::InvalidTimezoneError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            ErrorBody {
                error: "Failed to process request".to_owned(),
                details: Some(self.to_string()),
            }
        } else {
            ErrorBody {
                error: self.to_string(),
                details: None,
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{Error, ErrorBody};

    async fn body_of(error: Error) -> (StatusCode, ErrorBody) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let (status, body) = body_of(Error::NotFound).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Not found");
        assert_eq!(body.details, None);
    }

    #[tokio::test]
    async fn unauthenticated_maps_to_401() {
        let (status, body) = body_of(Error::Unauthenticated).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error, "Unauthorized");
    }

    #[tokio::test]
    async fn validation_errors_map_to_400() {
        let (status, _) = body_of(Error::EmptyName).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = body_of(Error::InvalidDate("yesterday".to_owned())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sql_errors_attach_details() {
        let (status, body) =
            body_of(Error::SqlError(rusqlite::Error::InvalidQuery)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Failed to process request");
        assert!(
            body.details
                .as_deref()
                .is_some_and(|details| details.starts_with("an unexpected SQL error")),
            "got details {:?}",
            body.details
        );
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
