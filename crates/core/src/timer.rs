use chrono::{DateTime, Utc};

/// Default per-question time budget, in seconds.
pub const QUESTION_BUDGET_SECS: u32 = 180;

/// Advisory per-question countdown.
///
/// The countdown never blocks anything: it only reports how much of the budget
/// is left. Remaining time is derived from the caller's clock reading, so a
/// fixed `Clock` makes it fully deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    budget_secs: u32,
    started_at: DateTime<Utc>,
    frozen_at: Option<DateTime<Utc>>,
}

impl Countdown {
    #[must_use]
    pub fn start(budget_secs: u32, now: DateTime<Utc>) -> Self {
        Self {
            budget_secs,
            started_at: now,
            frozen_at: None,
        }
    }

    /// Starts a countdown with the standard 180 second budget.
    #[must_use]
    pub fn standard(now: DateTime<Utc>) -> Self {
        Self::start(QUESTION_BUDGET_SECS, now)
    }

    #[must_use]
    pub fn budget_secs(&self) -> u32 {
        self.budget_secs
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen_at.is_some()
    }

    /// Seconds consumed so far, saturating at the budget.
    #[must_use]
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        let until = self.frozen_at.unwrap_or(now);
        let spent = (until - self.started_at).num_seconds().max(0);
        u32::try_from(spent)
            .unwrap_or(u32::MAX)
            .min(self.budget_secs)
    }

    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u32 {
        self.budget_secs - self.elapsed_secs(now)
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs(now) == 0
    }

    /// Suspends the countdown. Later readings report the value at `now`.
    pub fn freeze(&mut self, now: DateTime<Utc>) {
        if self.frozen_at.is_none() {
            self.frozen_at = Some(now);
        }
    }

    /// Formats the remaining time as `m:ss`.
    #[must_use]
    pub fn display(&self, now: DateTime<Utc>) -> String {
        let remaining = self.remaining_secs(now);
        format!("{}:{:02}", remaining / 60, remaining % 60)
    }
}
