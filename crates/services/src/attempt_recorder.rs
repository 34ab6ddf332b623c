use std::sync::Arc;

use prep_core::model::{Attempt, Letter, Question, UserId};
use storage::repository::{AttemptRepository, StorageError};
use tracing::info;

use crate::Clock;

/// Appends immutable answer records. There is no way to edit or remove one.
#[derive(Clone)]
pub struct AttemptRecorder {
    clock: Clock,
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptRecorder {
    #[must_use]
    pub fn new(clock: Clock, attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { clock, attempts }
    }

    /// Score `chosen` against `question`, timestamp it and append it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    pub async fn record(
        &self,
        user: UserId,
        question: &Question,
        chosen: Letter,
        elapsed_secs: u32,
    ) -> Result<Attempt, StorageError> {
        let attempt = Attempt::record(user, question, chosen, elapsed_secs, self.clock.now());
        self.append(&attempt).await?;
        Ok(attempt)
    }

    /// Persist an attempt produced elsewhere, such as by a `QuestionSession`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    pub async fn append(&self, attempt: &Attempt) -> Result<(), StorageError> {
        self.attempts.append_attempt(attempt).await?;
        info!(
            user = %attempt.user_id(),
            question = %attempt.question_id(),
            chosen = %attempt.chosen(),
            correct = attempt.is_correct(),
            elapsed_secs = attempt.elapsed_secs(),
            "attempt recorded"
        );
        Ok(())
    }
}
