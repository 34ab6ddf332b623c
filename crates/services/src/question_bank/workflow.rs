use std::collections::HashSet;
use std::sync::Arc;

use prep_core::model::{Attempt, Comment, QuestionId, UserId, order_for_display};
use storage::repository::{AttemptRepository, CommentRepository, QuestionRepository};
use tracing::{debug, info};

use super::filter::QuestionFilter;
use super::session::QuestionSession;
use crate::Clock;
use crate::attempt_recorder::AttemptRecorder;
use crate::error::BankError;

/// Number of answers that triggers the congratulation milestone.
pub const ANSWER_MILESTONE: usize = 50;

/// Result of answering the current question through the service.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub attempt: Attempt,
    /// Attempts the user has on record, including this one.
    pub total_attempts: usize,
    /// Set exactly when this answer brings the user to `ANSWER_MILESTONE`.
    pub milestone_reached: bool,
}

/// Loads sessions from storage and persists their answers.
#[derive(Clone)]
pub struct QuestionBankService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn AttemptRepository>,
    comments: Arc<dyn CommentRepository>,
    recorder: AttemptRecorder,
}

impl QuestionBankService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn AttemptRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        let recorder = AttemptRecorder::new(clock, Arc::clone(&attempts));
        Self {
            clock,
            questions,
            attempts,
            comments,
            recorder,
        }
    }

    async fn solved_by(&self, user: UserId) -> Result<HashSet<QuestionId>, BankError> {
        let attempts = self.attempts.attempts_for_user(user).await?;
        Ok(attempts.iter().map(Attempt::question_id).collect())
    }

    /// Start a session for `user` over the whole bank, filtered by `filter`.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Storage` if questions or attempts cannot be loaded.
    pub async fn start_session(
        &self,
        user: UserId,
        filter: QuestionFilter,
    ) -> Result<QuestionSession, BankError> {
        let bank = self.questions.list_questions().await?;
        let solved = self.solved_by(user).await?;
        let mut session = QuestionSession::new(bank, solved, self.clock.now());
        session.apply_filter(filter, self.clock.now());
        debug!(%user, matching = session.len(), "question session started");
        Ok(session)
    }

    /// Re-read the user's history and apply a new filter.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Storage` if attempts cannot be loaded.
    pub async fn refilter(
        &self,
        session: &mut QuestionSession,
        user: UserId,
        filter: QuestionFilter,
    ) -> Result<(), BankError> {
        session.set_solved(self.solved_by(user).await?);
        session.apply_filter(filter, self.clock.now());
        Ok(())
    }

    /// Submit the pending choice and persist the resulting attempt.
    ///
    /// The session only moves to answered once the attempt is stored, so a
    /// failed write can be retried.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Session` when the session rejects the submit, and
    /// `BankError::Storage` if the attempt cannot be stored.
    pub async fn submit(
        &self,
        session: &mut QuestionSession,
        user: UserId,
    ) -> Result<SubmitOutcome, BankError> {
        let attempt = session.prepare_attempt(user, self.clock.now())?;
        self.recorder.append(&attempt).await?;
        session.commit(&attempt);

        let total_attempts = self.attempts.attempts_for_user(user).await?.len();
        let milestone_reached = total_attempts == ANSWER_MILESTONE;
        if milestone_reached {
            info!(%user, "answer milestone reached");
        }
        Ok(SubmitOutcome {
            attempt,
            total_attempts,
            milestone_reached,
        })
    }

    /// Discussion of the question under the cursor, pinned entries first.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Storage` if comments cannot be loaded.
    pub async fn comments_for_current(
        &self,
        session: &QuestionSession,
    ) -> Result<Vec<Comment>, BankError> {
        let Some(question) = session.current() else {
            return Ok(Vec::new());
        };
        let mut comments = self.comments.comments_for(question.id()).await?;
        order_for_display(&mut comments);
        Ok(comments)
    }
}
