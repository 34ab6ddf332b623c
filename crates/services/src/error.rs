//! Shared error types for the services crate.

use thiserror::Error;

use prep_core::model::{ParseIdError, QuestionError, TextError, UserId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Text that names no `StatusFilter`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown status filter: {0:?}")]
pub struct StatusFilterError(pub String);

/// Rejections from the in-memory question session.
///
/// None of these are fatal: the caller may simply ignore them.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no question matches the current filters")]
    Empty,
    #[error("no alternative selected")]
    NoSelection,
    #[error("question already answered")]
    AlreadyAnswered,
}

/// Errors emitted by `QuestionBankService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by comment and chat services.
///
/// Insufficient role is not an error; see `ModerationOutcome::Denied`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModerationError {
    #[error("text cannot be empty")]
    EmptyText,
    #[error(transparent)]
    Text(TextError),
    #[error(transparent)]
    Room(#[from] ParseIdError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<TextError> for ModerationError {
    fn from(err: TextError) -> Self {
        match err {
            TextError::Empty => ModerationError::EmptyText,
            other => ModerationError::Text(other),
        }
    }
}

/// Errors emitted by `AdminService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdminError {
    #[error("administrator role required")]
    Forbidden,
    #[error("unknown user {0}")]
    UnknownUser(UserId),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `IngestionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IngestionError {
    #[error("administrator role required")]
    Forbidden,
    /// Generic failure surfaced for any extractor problem. Details go to the log.
    #[error("question extraction failed, try again later")]
    ExtractionFailed,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors reported by a `QuestionExtractor` implementation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractorError {
    #[error("extractor is not configured")]
    Disabled,
    #[error("extractor returned an unusable response: {0}")]
    InvalidResponse(String),
    #[error("extractor request failed: {0}")]
    Transport(String),
}

/// Errors emitted by `StoreService`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    #[error("unknown product {0}")]
    UnknownProduct(String),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
