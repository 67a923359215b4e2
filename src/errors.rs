//! Error types for distance-counter operations.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::EntityKind;
use crate::render;

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The requested row was not found.
    #[error("Item not found in store")]
    NotFound,
    /// A row with the same unique key already exists.
    #[error("Item already exists in store")]
    AlreadyExists,
    /// A stored value could not be decoded.
    #[error("Corrupt row: {0}")]
    Corrupt(String),
    /// An internal storage system error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::AlreadyExists
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Corrupt(e.to_string())
            }
            _ => StoreError::Internal(e.to_string()),
        }
    }
}

/// Failures a request handler can surface to the client.
///
/// Validation failures never reach this type; they re-render the form. Authentication
/// failures are turned into a login redirect by the guard.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The key does not resolve to a row of the kind.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind that was looked up.
        kind: EntityKind,
        /// Key as it appeared in the request.
        id: String,
    },
    /// The store failed underneath the request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    /// Builds a not-found error for `kind` and whatever key the request carried.
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        AppError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Store(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound { kind, id } => {
                tracing::debug!(kind = %kind, id = %id, "record not found");
                let message = format!("No {} matches the given query ({}).", kind.name(), id);
                (
                    StatusCode::NOT_FOUND,
                    Html(render::not_found(&message)),
                )
                    .into_response()
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(render::server_error()),
                )
                    .into_response()
            }
        }
    }
}
