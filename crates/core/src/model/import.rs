use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::BatchId;

/// Where a batch of questions came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportSource {
    Csv { file_name: String },
    Pdf { exam_url: String, answer_url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    Processing,
    Done,
    Error,
}

/// A named group of questions ingested together, deletable as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub id: BatchId,
    pub name: String,
    pub source: ImportSource,
    pub question_count: usize,
    pub status: ImportStatus,
    pub imported_at: DateTime<Utc>,
}

impl ImportBatch {
    #[must_use]
    pub fn csv(file_name: impl Into<String>, question_count: usize, at: DateTime<Utc>) -> Self {
        let file_name = file_name.into();
        Self {
            id: BatchId::generate(),
            name: file_name.clone(),
            source: ImportSource::Csv { file_name },
            question_count,
            status: ImportStatus::Done,
            imported_at: at,
        }
    }

    /// A PDF cross-reference batch starts out as `Processing`.
    #[must_use]
    pub fn pdf(
        exam_name: impl Into<String>,
        exam_url: impl Into<String>,
        answer_url: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BatchId::generate(),
            name: exam_name.into(),
            source: ImportSource::Pdf {
                exam_url: exam_url.into(),
                answer_url: answer_url.into(),
            },
            question_count: 0,
            status: ImportStatus::Processing,
            imported_at: at,
        }
    }
}
