use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use prep_core::model::{Question, QuestionId};

use crate::error::StatusFilterError;

/// Answer-history filter, evaluated against the current user's attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Solved,
    Unsolved,
}

impl StatusFilter {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Solved => "solved",
            StatusFilter::Unsolved => "unsolved",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = StatusFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "solved" => Ok(StatusFilter::Solved),
            "unsolved" => Ok(StatusFilter::Unsolved),
            _ => Err(StatusFilterError(s.to_owned())),
        }
    }
}

/// Optional equality filters plus a status filter.
///
/// Blank discipline or board values mean "any".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionFilter {
    discipline: Option<String>,
    board: Option<String>,
    status: StatusFilter,
}

fn non_blank(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl QuestionFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_discipline(mut self, discipline: impl Into<String>) -> Self {
        self.discipline = non_blank(discipline);
        self
    }

    #[must_use]
    pub fn with_board(mut self, board: impl Into<String>) -> Self {
        self.board = non_blank(board);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn discipline(&self) -> Option<&str> {
        self.discipline.as_deref()
    }

    #[must_use]
    pub fn board(&self) -> Option<&str> {
        self.board.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> StatusFilter {
        self.status
    }

    /// True when nothing is being filtered out.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        *self == Self::default()
    }

    /// Whether `question` passes every active filter. `solved` holds the ids the
    /// current user has attempted at least once.
    #[must_use]
    pub fn matches(&self, question: &Question, solved: &HashSet<QuestionId>) -> bool {
        if self
            .discipline
            .as_deref()
            .is_some_and(|d| question.discipline() != d)
        {
            return false;
        }
        if self.board.as_deref().is_some_and(|b| question.board() != b) {
            return false;
        }
        match self.status {
            StatusFilter::All => true,
            StatusFilter::Solved => solved.contains(&question.id()),
            StatusFilter::Unsolved => !solved.contains(&question.id()),
        }
    }

    /// Filtered copy of `questions`, order preserved.
    #[must_use]
    pub fn apply(&self, questions: &[Question], solved: &HashSet<QuestionId>) -> Vec<Question> {
        questions
            .iter()
            .filter(|q| self.matches(q, solved))
            .cloned()
            .collect()
    }
}
