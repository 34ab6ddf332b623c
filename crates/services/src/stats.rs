use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use prep_core::model::{Attempt, Question, QuestionId, UserId};
use storage::repository::{AttemptRepository, QuestionRepository};

use crate::error::StatsError;

/// How many attempts the history panel shows.
pub const RECENT_ATTEMPTS: usize = 5;

/// Aggregate score over a set of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerformanceSummary {
    pub total: usize,
    pub correct: usize,
    pub wrong: usize,
}

impl PerformanceSummary {
    #[must_use]
    pub fn from_attempts(attempts: &[Attempt]) -> Self {
        let correct = attempts.iter().filter(|a| a.is_correct()).count();
        Self {
            total: attempts.len(),
            correct,
            wrong: attempts.len() - correct,
        }
    }

    /// Fraction of correct answers in `[0, 1]`. Zero when there are no attempts.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    /// Accuracy as a whole percentage, rounded.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn accuracy_percent(&self) -> u8 {
        (self.accuracy() * 100.0).round() as u8
    }
}

/// The last `n` attempts, newest first.
#[must_use]
pub fn recent(attempts: &[Attempt], n: usize) -> Vec<Attempt> {
    attempts.iter().rev().take(n).cloned().collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisciplineBreakdown {
    pub discipline: String,
    pub summary: PerformanceSummary,
}

/// Per-discipline scores, alphabetical. Attempts on questions that no longer
/// exist are left out.
#[must_use]
pub fn by_discipline(attempts: &[Attempt], questions: &[Question]) -> Vec<DisciplineBreakdown> {
    let discipline_of: HashMap<QuestionId, &str> = questions
        .iter()
        .map(|q| (q.id(), q.discipline()))
        .collect();

    let mut grouped: BTreeMap<&str, Vec<Attempt>> = BTreeMap::new();
    for attempt in attempts {
        if let Some(discipline) = discipline_of.get(&attempt.question_id()) {
            grouped.entry(discipline).or_default().push(attempt.clone());
        }
    }

    grouped
        .into_iter()
        .map(|(discipline, attempts)| DisciplineBreakdown {
            discipline: discipline.to_owned(),
            summary: PerformanceSummary::from_attempts(&attempts),
        })
        .collect()
}

/// Everything the student area displays about a user's answers.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentReport {
    pub summary: PerformanceSummary,
    pub recent: Vec<Attempt>,
    pub by_discipline: Vec<DisciplineBreakdown>,
}

#[derive(Clone)]
pub struct StatsService {
    attempts: Arc<dyn AttemptRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>, questions: Arc<dyn QuestionRepository>) -> Self {
        Self {
            attempts,
            questions,
        }
    }

    /// Score over `user`'s attempts only.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if attempts cannot be loaded.
    pub async fn summary_for(&self, user: UserId) -> Result<PerformanceSummary, StatsError> {
        let attempts = self.attempts.attempts_for_user(user).await?;
        Ok(PerformanceSummary::from_attempts(&attempts))
    }

    /// # Errors
    ///
    /// Returns `StatsError::Storage` if attempts or questions cannot be loaded.
    pub async fn report_for(&self, user: UserId) -> Result<StudentReport, StatsError> {
        let attempts = self.attempts.attempts_for_user(user).await?;
        let questions = self.questions.list_questions().await?;
        Ok(StudentReport {
            summary: PerformanceSummary::from_attempts(&attempts),
            recent: recent(&attempts, RECENT_ATTEMPTS),
            by_discipline: by_discipline(&attempts, &questions),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::question;
    use chrono::Duration;
    use prep_core::model::Letter;
    use prep_core::time::fixed_now;
    use storage::repository::Storage;

    #[test]
    fn empty_history_has_zero_accuracy() {
        let summary = PerformanceSummary::from_attempts(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.accuracy().abs() < f64::EPSILON);
        assert!(!summary.accuracy().is_nan());
        assert_eq!(summary.accuracy_percent(), 0);
    }

    #[test]
    fn accuracy_tracks_accumulating_attempts() {
        let q = question(1, "Português", "FGV");
        let user = UserId::from_u128(1);
        let right = q.correct_letter();
        let wrong = Letter::ALL.into_iter().find(|l| *l != right).unwrap();

        let mut history = Vec::new();
        for chosen in [right, wrong, right] {
            history.push(Attempt::record(user, &q, chosen, 5, fixed_now()));
        }
        let summary = PerformanceSummary::from_attempts(&history);
        assert_eq!((summary.total, summary.correct, summary.wrong), (3, 2, 1));
        assert!((summary.accuracy() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.accuracy_percent(), 67);

        history.push(Attempt::record(user, &q, right, 5, fixed_now()));
        assert_eq!(PerformanceSummary::from_attempts(&history).accuracy_percent(), 75);
    }

    #[test]
    fn recent_is_newest_first() {
        let q = question(1, "Português", "FGV");
        let user = UserId::from_u128(1);
        let history: Vec<_> = (0..8)
            .map(|n| Attempt::record(user, &q, Letter::A, n, fixed_now() + Duration::seconds(n.into())))
            .collect();
        let last = recent(&history, RECENT_ATTEMPTS);
        let elapsed: Vec<_> = last.iter().map(Attempt::elapsed_secs).collect();
        assert_eq!(elapsed, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn breakdown_groups_by_question_discipline() {
        let penal = question(1, "Direito Penal", "FGV");
        let port = question(2, "Português", "FGV");
        let user = UserId::from_u128(1);
        let attempts = vec![
            Attempt::record(user, &penal, penal.correct_letter(), 1, fixed_now()),
            Attempt::record(user, &port, Letter::A, 1, fixed_now()),
            Attempt::record(user, &penal, Letter::A, 1, fixed_now()),
        ];
        let rows = by_discipline(&attempts, &[penal, port]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].discipline, "Direito Penal");
        assert_eq!(rows[0].summary.total, 2);
        assert_eq!(rows[1].discipline, "Português");
    }

    #[tokio::test]
    async fn summary_only_counts_the_requested_user() {
        let storage = Storage::in_memory();
        let q = question(1, "Português", "FGV");
        storage.questions.insert_questions(&[q.clone()]).await.unwrap();
        let maria = UserId::from_u128(1);
        let joao = UserId::from_u128(2);
        for user in [maria, maria, joao] {
            let attempt = Attempt::record(user, &q, q.correct_letter(), 3, fixed_now());
            storage.attempts.append_attempt(&attempt).await.unwrap();
        }

        let stats = StatsService::new(Arc::clone(&storage.attempts), Arc::clone(&storage.questions));
        assert_eq!(stats.summary_for(maria).await.unwrap().total, 2);
        let report = stats.report_for(joao).await.unwrap();
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.recent.len(), 1);
        assert_eq!(report.by_discipline[0].discipline, "Português");
    }
}
