//! Error types for the snapshot engine
//!
//! All errors use thiserror for structured error handling.
//! These errors serialize to their display string so hosts can show them as-is.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The scan found no tracked widgets, so there is nothing to store.
    #[error("No tracked widgets found on the dashboard")]
    EmptyCapture,

    /// Smart replace matched zero widgets; the live document was left untouched.
    #[error("No widgets on the dashboard match this snapshot")]
    NoMatchFound,

    #[error("Document access error: {0}")]
    DocumentAccess(String),

    /// Remote store failure, carrying the server message when one was sent.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(i64),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
