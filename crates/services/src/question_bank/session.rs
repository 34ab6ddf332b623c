use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use prep_core::Countdown;
use prep_core::model::{Attempt, Letter, Question, QuestionId, UserId};

use super::filter::QuestionFilter;
use crate::error::SessionError;

//
// ─── ANSWER STATE ──────────────────────────────────────────────────────────────
//

/// Lifecycle of the question under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerState {
    Unanswered,
    Answered { chosen: Letter, correct: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Cursor position within the filtered list, useful for a "3 / 12" label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPosition {
    pub index: usize,
    pub total: usize,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory question-solving session for one user.
///
/// Holds the full bank, the filtered and shuffled working list, the cursor and
/// the per-question answer lifecycle (`Unanswered -> Answered`). Navigation is
/// the only way back to `Unanswered`.
pub struct QuestionSession {
    bank: Vec<Question>,
    solved: HashSet<QuestionId>,
    filter: QuestionFilter,
    questions: Vec<Question>,
    index: usize,
    pending: Option<Letter>,
    state: AnswerState,
    countdown: Countdown,
}

impl QuestionSession {
    /// Build a session over `bank` with no filters applied.
    ///
    /// `solved` holds the ids the user has attempted at least once; `now` starts
    /// the first countdown.
    #[must_use]
    pub fn new(bank: Vec<Question>, solved: HashSet<QuestionId>, now: DateTime<Utc>) -> Self {
        Self::with_rng(bank, solved, QuestionFilter::all(), now, &mut rand::rng())
    }

    /// Like `new`, with an explicit starting filter and shuffle source.
    #[must_use]
    pub fn with_rng<R: Rng + ?Sized>(
        bank: Vec<Question>,
        solved: HashSet<QuestionId>,
        filter: QuestionFilter,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Self {
        let mut session = Self {
            bank,
            solved,
            filter: QuestionFilter::all(),
            questions: Vec::new(),
            index: 0,
            pending: None,
            state: AnswerState::Unanswered,
            countdown: Countdown::standard(now),
        };
        session.apply_filter_with(filter, now, rng);
        session
    }

    /// Re-filter and reshuffle the working list, moving the cursor to the start.
    pub fn apply_filter(&mut self, filter: QuestionFilter, now: DateTime<Utc>) {
        self.apply_filter_with(filter, now, &mut rand::rng());
    }

    pub fn apply_filter_with<R: Rng + ?Sized>(
        &mut self,
        filter: QuestionFilter,
        now: DateTime<Utc>,
        rng: &mut R,
    ) {
        let mut questions = filter.apply(&self.bank, &self.solved);
        questions.shuffle(rng);
        self.filter = filter;
        self.questions = questions;
        self.index = 0;
        self.reset_question(now);
    }

    /// Drop every filter, as offered by the empty-result state.
    pub fn reset_filters(&mut self, now: DateTime<Utc>) {
        self.apply_filter(QuestionFilter::all(), now);
    }

    /// Replace the attempted-question set, e.g. after reloading from storage.
    /// Takes effect on the next filter application.
    pub fn set_solved(&mut self, solved: HashSet<QuestionId>) {
        self.solved = solved;
    }

    #[must_use]
    pub fn filter(&self) -> &QuestionFilter {
        &self.filter
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn position(&self) -> SessionPosition {
        SessionPosition {
            index: self.index,
            total: self.questions.len(),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    #[must_use]
    pub fn pending(&self) -> Option<Letter> {
        self.pending
    }

    #[must_use]
    pub fn state(&self) -> AnswerState {
        self.state
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        matches!(self.state, AnswerState::Answered { .. })
    }

    #[must_use]
    pub fn is_solved(&self, id: QuestionId) -> bool {
        self.solved.contains(&id)
    }

    #[must_use]
    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    /// Record a pending choice. Choosing again replaces the previous one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when no question is loaded and
    /// `SessionError::AlreadyAnswered` once the current question is answered.
    pub fn select(&mut self, letter: Letter) -> Result<(), SessionError> {
        if self.current().is_none() {
            return Err(SessionError::Empty);
        }
        if self.is_answered() {
            return Err(SessionError::AlreadyAnswered);
        }
        self.pending = Some(letter);
        Ok(())
    }

    /// Answer the current question with the pending choice.
    ///
    /// Freezes the countdown and the selection and returns the single attempt
    /// for this question. The caller is responsible for persisting it.
    ///
    /// # Errors
    ///
    /// Same as [`QuestionSession::prepare_attempt`].
    pub fn submit(&mut self, user: UserId, now: DateTime<Utc>) -> Result<Attempt, SessionError> {
        let attempt = self.prepare_attempt(user, now)?;
        self.commit(&attempt);
        Ok(attempt)
    }

    /// Score the pending choice without touching the session.
    ///
    /// Pair with [`QuestionSession::commit`] once the attempt is stored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty`, `SessionError::AlreadyAnswered` or
    /// `SessionError::NoSelection`, checked in that order.
    pub fn prepare_attempt(
        &self,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<Attempt, SessionError> {
        let Some(question) = self.questions.get(self.index) else {
            return Err(SessionError::Empty);
        };
        if self.is_answered() {
            return Err(SessionError::AlreadyAnswered);
        }
        let Some(chosen) = self.pending else {
            return Err(SessionError::NoSelection);
        };
        let elapsed = self.countdown.elapsed_secs(now);
        Ok(Attempt::record(user, question, chosen, elapsed, now))
    }

    /// Mark the current question answered by `attempt`.
    ///
    /// Ignored unless `attempt` is for the current, still unanswered question.
    pub fn commit(&mut self, attempt: &Attempt) {
        let Some(id) = self.current().map(Question::id) else {
            return;
        };
        if id != attempt.question_id() || self.is_answered() {
            return;
        }
        self.countdown.freeze(attempt.answered_at());
        self.state = AnswerState::Answered {
            chosen: attempt.chosen(),
            correct: attempt.is_correct(),
        };
        self.solved.insert(id);
    }

    /// Move the cursor one step. Returns `false` at either end of the list.
    pub fn advance(&mut self, direction: Direction, now: DateTime<Utc>) -> bool {
        let target = match direction {
            Direction::Next if self.index + 1 < self.questions.len() => self.index + 1,
            Direction::Previous if self.index > 0 => self.index - 1,
            _ => return false,
        };
        self.index = target;
        self.reset_question(now);
        true
    }

    /// Move the cursor to `id` if it is in the working list.
    pub fn jump_to(&mut self, id: QuestionId, now: DateTime<Utc>) -> bool {
        let Some(target) = self.questions.iter().position(|q| q.id() == id) else {
            return false;
        };
        if target != self.index {
            self.index = target;
            self.reset_question(now);
        }
        true
    }

    fn reset_question(&mut self, now: DateTime<Utc>) {
        self.pending = None;
        self.state = AnswerState::Unanswered;
        self.countdown = Countdown::standard(now);
    }
}
