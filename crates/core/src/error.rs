use thiserror::Error;

use crate::model::{CatalogError, LetterError, ParseIdError, QuestionError, TextError};

/// Umbrella error for callers that do not care which validation failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Text(#[from] TextError),
    #[error(transparent)]
    Letter(#[from] LetterError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
