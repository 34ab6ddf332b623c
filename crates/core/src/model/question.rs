use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::model::ids::{BatchId, QuestionId};
use crate::model::letter::Letter;
use crate::timer::QUESTION_BUDGET_SECS;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question statement cannot be empty")]
    EmptyStatement,

    #[error("question must have exactly five alternatives, got {0}")]
    AlternativeCount(usize),

    #[error("alternative {0} appears more than once")]
    DuplicateLetter(Letter),

    #[error("alternative {0} has no text")]
    EmptyAlternative(Letter),

    #[error("discipline cannot be empty")]
    EmptyDiscipline,

    #[error("invalid source url: {0}")]
    InvalidUrl(String),
}

//
// ─── ALTERNATIVES & METADATA ───────────────────────────────────────────────────
//

/// One lettered answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub letter: Letter,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Alternative {
    #[must_use]
    pub fn new(letter: Letter, text: impl Into<String>) -> Self {
        Self {
            letter,
            text: text.into(),
            explanation: None,
        }
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

/// Classification used for filtering and statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionMeta {
    pub discipline: String,
    pub subject: String,
    pub subtopic: String,
    pub board: String,
    pub agency: String,
    pub position: String,
    pub region: String,
    pub year: u16,
    pub level: String,
    pub difficulty: String,
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question content, as typed by an admin or produced by an importer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub statement: String,
    pub alternatives: Vec<Alternative>,
    pub correct_letter: Letter,
    pub meta: QuestionMeta,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub official_comment: Option<String>,
    #[serde(default)]
    pub suggested_seconds: Option<u32>,
}

impl QuestionDraft {
    /// Validates the draft and assigns it an identity.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the statement is blank, the alternatives are
    /// not exactly one per letter `A..=E`, or a url does not parse.
    pub fn validate(self, id: QuestionId) -> Result<Question, QuestionError> {
        let statement = self.statement.trim();
        if statement.is_empty() {
            return Err(QuestionError::EmptyStatement);
        }
        if self.meta.discipline.trim().is_empty() {
            return Err(QuestionError::EmptyDiscipline);
        }
        if self.alternatives.len() != Letter::ALL.len() {
            return Err(QuestionError::AlternativeCount(self.alternatives.len()));
        }

        let mut seen = HashSet::with_capacity(Letter::ALL.len());
        for alt in &self.alternatives {
            if !seen.insert(alt.letter) {
                return Err(QuestionError::DuplicateLetter(alt.letter));
            }
            if alt.text.trim().is_empty() {
                return Err(QuestionError::EmptyAlternative(alt.letter));
            }
        }

        let mut alternatives = self.alternatives;
        alternatives.sort_by_key(|a| a.letter);

        Ok(Question {
            id,
            statement: statement.to_owned(),
            alternatives,
            correct_letter: self.correct_letter,
            meta: self.meta,
            tags: self.tags,
            source_url: parse_optional_url(self.source_url)?,
            image_url: parse_optional_url(self.image_url)?,
            official_comment: self.official_comment.filter(|c| !c.trim().is_empty()),
            suggested_seconds: self.suggested_seconds.unwrap_or(QUESTION_BUDGET_SECS),
            batch_id: None,
        })
    }
}

fn parse_optional_url(raw: Option<String>) -> Result<Option<Url>, QuestionError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Url::parse(s)
            .map(Some)
            .map_err(|_| QuestionError::InvalidUrl(s.to_owned())),
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Static multiple-choice content. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    statement: String,
    alternatives: Vec<Alternative>,
    correct_letter: Letter,
    meta: QuestionMeta,
    tags: Vec<String>,
    source_url: Option<Url>,
    image_url: Option<Url>,
    official_comment: Option<String>,
    suggested_seconds: u32,
    batch_id: Option<BatchId>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    #[must_use]
    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    #[must_use]
    pub fn alternative(&self, letter: Letter) -> Option<&Alternative> {
        self.alternatives.iter().find(|a| a.letter == letter)
    }

    #[must_use]
    pub fn correct_letter(&self) -> Letter {
        self.correct_letter
    }

    #[must_use]
    pub fn is_correct(&self, chosen: Letter) -> bool {
        chosen == self.correct_letter
    }

    #[must_use]
    pub fn meta(&self) -> &QuestionMeta {
        &self.meta
    }

    #[must_use]
    pub fn discipline(&self) -> &str {
        &self.meta.discipline
    }

    #[must_use]
    pub fn board(&self) -> &str {
        &self.meta.board
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub fn source_url(&self) -> Option<&Url> {
        self.source_url.as_ref()
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&Url> {
        self.image_url.as_ref()
    }

    #[must_use]
    pub fn official_comment(&self) -> Option<&str> {
        self.official_comment.as_deref()
    }

    #[must_use]
    pub fn suggested_seconds(&self) -> u32 {
        self.suggested_seconds
    }

    #[must_use]
    pub fn batch_id(&self) -> Option<BatchId> {
        self.batch_id
    }

    /// Tags the question as part of an import batch.
    #[must_use]
    pub fn in_batch(mut self, batch_id: BatchId) -> Self {
        self.batch_id = Some(batch_id);
        self
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn draft(discipline: &str, correct: Letter) -> QuestionDraft {
        QuestionDraft {
            statement: "Qual alternativa está correta?".into(),
            alternatives: Letter::ALL
                .iter()
                .map(|l| Alternative::new(*l, format!("Opção {l}")))
                .collect(),
            correct_letter: correct,
            meta: QuestionMeta {
                discipline: discipline.into(),
                board: "FGV".into(),
                year: 2024,
                ..QuestionMeta::default()
            },
            tags: Vec::new(),
            source_url: None,
            image_url: None,
            official_comment: None,
            suggested_seconds: None,
        }
    }

    #[test]
    fn validate_sorts_alternatives_and_defaults_budget() {
        let mut d = draft("Português", Letter::B);
        d.alternatives.reverse();
        let q = d.validate(QuestionId::from_u128(1)).unwrap();
        let letters: Vec<_> = q.alternatives().iter().map(|a| a.letter).collect();
        assert_eq!(letters, Letter::ALL.to_vec());
        assert_eq!(q.suggested_seconds(), QUESTION_BUDGET_SECS);
        assert!(q.is_correct(Letter::B));
        assert!(!q.is_correct(Letter::A));
    }

    #[test]
    fn rejects_missing_alternative() {
        let mut d = draft("Português", Letter::A);
        d.alternatives.pop();
        assert_eq!(
            d.validate(QuestionId::generate()).unwrap_err(),
            QuestionError::AlternativeCount(4)
        );
    }

    #[test]
    fn rejects_duplicate_letters() {
        let mut d = draft("Português", Letter::A);
        d.alternatives[4].letter = Letter::A;
        assert_eq!(
            d.validate(QuestionId::generate()).unwrap_err(),
            QuestionError::DuplicateLetter(Letter::A)
        );
    }

    #[test]
    fn rejects_blank_statement_and_bad_url() {
        let mut d = draft("Português", Letter::A);
        d.statement = "   ".into();
        assert_eq!(
            d.validate(QuestionId::generate()).unwrap_err(),
            QuestionError::EmptyStatement
        );

        let mut d = draft("Português", Letter::A);
        d.source_url = Some("not a url".into());
        assert!(matches!(
            d.validate(QuestionId::generate()),
            Err(QuestionError::InvalidUrl(_))
        ));
    }

    #[test]
    fn blank_urls_are_treated_as_absent() {
        let mut d = draft("Português", Letter::A);
        d.source_url = Some(String::new());
        let q = d.validate(QuestionId::generate()).unwrap();
        assert!(q.source_url().is_none());
    }

    #[test]
    fn batch_tag_round_trips_through_json() {
        let batch = BatchId::from_u128(9);
        let q = draft("Direito Penal", Letter::C)
            .validate(QuestionId::from_u128(3))
            .unwrap()
            .in_batch(batch);
        let json = serde_json::to_string(&q).unwrap();
        let back: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(back.batch_id(), Some(batch));
        assert_eq!(back, q);
    }
}
