//! Repository Module
//!
//! CRUD and transactional write operations over the SQLite tables.
//! Repositories are modules of async functions over `&SqlitePool`;
//! anything touching the rating aggregate goes through a version-checked
//! transaction (see [`crate::db::txn`]).

pub mod completion;
pub mod rating;
pub mod review;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return RepoError::Duplicate(db_err.message().to_string());
            }
            // SQLITE_BUSY surfaces when a writer cannot upgrade its lock;
            // callers inside a retry boundary treat it as a conflict
            let msg = db_err.message().to_lowercase();
            if msg.contains("locked") || msg.contains("busy") {
                return RepoError::Conflict(db_err.message().to_string());
            }
        }
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Conflict(msg) => AppError::concurrency_conflict(msg),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
