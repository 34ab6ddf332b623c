use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AttemptId, QuestionId, UserId};
use crate::model::letter::Letter;
use crate::model::question::Question;

/// Immutable record of one answer submission.
///
/// The only constructor derives `is_correct` from the question, so
/// `is_correct == (chosen == question.correct_letter())` holds for every
/// attempt built in-process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    id: AttemptId,
    user_id: UserId,
    question_id: QuestionId,
    chosen: Letter,
    is_correct: bool,
    elapsed_secs: u32,
    answered_at: DateTime<Utc>,
}

impl Attempt {
    #[must_use]
    pub fn record(
        user_id: UserId,
        question: &Question,
        chosen: Letter,
        elapsed_secs: u32,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AttemptId::generate(),
            user_id,
            question_id: question.id(),
            chosen,
            is_correct: question.is_correct(chosen),
            elapsed_secs,
            answered_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn chosen(&self) -> Letter {
        self.chosen
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn answered_at(&self) -> DateTime<Utc> {
        self.answered_at
    }
}
