//! Application error types.
//!
//! Every fallible operation in the workspace returns [`AppResult`]. Errors are
//! converted into HTTP responses with a `{"detail": ...}` body.

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ErrorDetail;

/// Result alias used across all crates.
pub type AppResult<T> = Result<T, AppError>;

/// Application-wide error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// The database could not be reached or refused the connection.
    #[error("There was an error connecting to the database: {0}")]
    DatabaseConnection(String),

    /// The database accepted the connection but the statement failed.
    #[error("Query execution failed: {0}")]
    DatabaseQuery(String),

    /// A lookup by id produced no rows.
    #[error("No instance of {resource} was found in the database with id {id}.")]
    NotFound { resource: String, id: String },

    /// A record lacked a column or carried a value of the wrong kind.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// A query name that is not present in the catalog.
    #[error("Unknown named query: {0}")]
    UnknownQuery(String),

    /// Invalid request input or bind parameters.
    #[error("{0}")]
    Validation(String),

    /// A catalog statement that is not read-only.
    #[error("Unsafe SQL: {0}")]
    UnsafeSql(String),

    /// Missing or unparsable configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Shorthand for [`AppError::NotFound`].
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseConnection(_)
            | AppError::DatabaseQuery(_)
            | AppError::MalformedRecord(_)
            | AppError::UnknownQuery(_)
            | AppError::UnsafeSql(_)
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to clients. Internal failures are not described.
    pub fn detail(&self) -> String {
        match self {
            AppError::DatabaseConnection(_)
            | AppError::NotFound { .. }
            | AppError::Validation(_) => self.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "client error");
        }

        (status, Json(ErrorDetail::new(self.detail()))).into_response()
    }
}
