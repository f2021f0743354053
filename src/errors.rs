//! # Error Handling for Repositories
//!
//! Repository operations return [`RepositoryError`]. Mutations have their own error kinds:
//! - [`CreateRecordError`] wraps every database failure raised while inserting
//! - [`UpdateRecordError`] is raised when an update pre-check finds no row
//! - [`DeleteRecordError`] is raised when a delete pre-check finds no row
//!
//! Every other failure is Sea-ORM's [`DbErr`], passed through untouched as
//! [`RepositoryError::Database`].
//!
//! ## HTTP
//!
//! [`ApiError`] turns repository errors into sanitized axum responses, so a handler can
//! call a repository and use `?`:
//!
//! ```rust,ignore
//! async fn get_note(
//!     State(repo): State<NoteRepository>,
//!     Path(id): Path<i64>,
//! ) -> Result<Json<note::Model>, ApiError> {
//!     let note = repo
//!         .retrieve(id)
//!         .await?
//!         .ok_or_else(|| ApiError::not_found("note", Some(id.to_string())))?;
//!     Ok(Json(note))
//! }
//! ```
//!
//! Internal details are logged through `tracing` and never sent to clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failure while inserting a record.
#[derive(Debug, Error)]
pub enum CreateRecordError {
    /// The database accepted the insert but returned no row for the generated key.
    #[error("create {table} record failed to get primary key")]
    MissingPrimaryKey { table: String },

    #[error("create {table} record failed: {source}")]
    Database {
        table: String,
        #[source]
        source: DbErr,
    },
}

impl CreateRecordError {
    /// The underlying database error, if the insert itself failed.
    #[must_use]
    pub fn db_err(&self) -> Option<&DbErr> {
        match self {
            Self::Database { source, .. } => Some(source),
            Self::MissingPrimaryKey { .. } => None,
        }
    }
}

/// An update pre-check failed.
#[derive(Debug, Error)]
pub enum UpdateRecordError {
    #[error("record: {table} not found to update")]
    NotFound { table: String },
}

/// A delete pre-check failed.
#[derive(Debug, Error)]
pub enum DeleteRecordError {
    #[error("record: {table} not found to delete")]
    NotFound { table: String },

    /// None of the keys in a batch delete exist.
    #[error("{table} records not found to delete")]
    NoneFound { table: String },
}

/// Error returned by every [`CrudRepository`](crate::CrudRepository) operation.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Create(#[from] CreateRecordError),

    #[error(transparent)]
    Update(#[from] UpdateRecordError),

    #[error(transparent)]
    Delete(#[from] DeleteRecordError),

    #[error("field: {field} not found in table: {table}")]
    UnknownField { field: String, table: String },

    #[error("can't get table: {table} primary key")]
    MissingPrimaryKey { table: String },

    #[error("table: {table} has {count} primary key fields, expected exactly one")]
    CompositePrimaryKey { table: String, count: usize },

    #[error("more than one {table} record matches field: {field}")]
    TooManyRows { table: String, field: String },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error(transparent)]
    Database(#[from] DbErr),
}

impl RepositoryError {
    /// True for failed existence pre-checks.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Update(UpdateRecordError::NotFound { .. })
                | Self::Delete(DeleteRecordError::NotFound { .. } | DeleteRecordError::NoneFound { .. })
                | Self::Database(DbErr::RecordNotFound(_))
        )
    }

    /// The wrapped database error, whether it was passed through or wrapped by a create.
    #[must_use]
    pub fn db_err(&self) -> Option<&DbErr> {
        match self {
            Self::Database(err) => Some(err),
            Self::Create(err) => err.db_err(),
            _ => None,
        }
    }
}

/// API error type with logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 404 Not Found
    NotFound {
        resource: String,
        id: Option<String>,
    },

    /// 400 Bad Request
    BadRequest { message: String },

    /// 409 Conflict, e.g. duplicate key
    Conflict { message: String },

    /// 500, details logged but not exposed
    Database {
        message: String,
        internal: DbErr,
    },

    /// 500 with optional internal details
    Internal {
        message: String,
        internal: Option<String>,
    },
}

impl ApiError {
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a 500 from a database error. The error is logged, never returned.
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message (sanitized)
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => match id {
                Some(id) => format!("{resource} with ID '{id}' not found"),
                None => format!("{resource} not found"),
            },
            Self::BadRequest { message }
            | Self::Conflict { message }
            | Self::Database { message, .. }
            | Self::Internal { message, .. } => message.clone(),
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match &err {
            DbErr::RecordNotFound(msg) => {
                let resource = msg.split_whitespace().next().unwrap_or("Resource");
                Self::not_found(resource, None)
            }
            _ => Self::database(err),
        }
    }
}

/// - pre-check failures → 404
/// - unknown fields and bad filters → 400
/// - unique violations while creating → 409
/// - everything else → 500, logged
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Update(UpdateRecordError::NotFound { table })
            | RepositoryError::Delete(
                DeleteRecordError::NotFound { table } | DeleteRecordError::NoneFound { table },
            ) => Self::not_found(table, None),
            RepositoryError::UnknownField { .. } | RepositoryError::InvalidFilter(_) => {
                Self::bad_request(err.to_string())
            }
            RepositoryError::Create(CreateRecordError::Database { table, source }) => {
                if let Some(SqlErr::UniqueConstraintViolation(detail)) = source.sql_err() {
                    tracing::debug!(table = %table, detail = %detail, "duplicate record");
                    Self::conflict(format!("{table} record already exists"))
                } else {
                    Self::database(source)
                }
            }
            RepositoryError::Database(db_err) => db_err.into(),
            other => Self::internal("Internal Server Error", Some(other.to_string())),
        }
    }
}
