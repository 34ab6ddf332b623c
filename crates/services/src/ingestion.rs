use async_trait::async_trait;
use std::sync::Arc;

use prep_core::model::{
    AdminAction, AdminLog, ImportBatch, ImportStatus, Question, QuestionDraft, QuestionId, User,
};
use storage::repository::{ImportRepository, LogRepository, QuestionRepository, Storage};
use tracing::{info, warn};

use crate::Clock;
use crate::error::{ExtractorError, IngestionError};
use crate::moderation::can_administer;

/// Longest exam text, in characters, handed to the extractor.
pub const EXAM_TEXT_LIMIT: usize = 10_000;

/// Boundary to an external question-extraction provider.
///
/// Implementations are opaque remote calls; none ships with this crate.
#[async_trait]
pub trait QuestionExtractor: Send + Sync {
    /// Pull questions out of free text.
    async fn extract_questions(&self, text: &str) -> Result<Vec<QuestionDraft>, ExtractorError>;

    /// Pair an exam with its answer key to produce complete questions.
    async fn cross_reference(
        &self,
        exam_text: &str,
        answer_text: &str,
    ) -> Result<Vec<QuestionDraft>, ExtractorError>;

    /// Recognize the text of a scanned exam page.
    async fn ocr(&self, image: &[u8]) -> Result<String, ExtractorError>;
}

/// Extractor used when no provider is configured. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledExtractor;

#[async_trait]
impl QuestionExtractor for DisabledExtractor {
    async fn extract_questions(&self, _text: &str) -> Result<Vec<QuestionDraft>, ExtractorError> {
        Err(ExtractorError::Disabled)
    }

    async fn cross_reference(
        &self,
        _exam_text: &str,
        _answer_text: &str,
    ) -> Result<Vec<QuestionDraft>, ExtractorError> {
        Err(ExtractorError::Disabled)
    }

    async fn ocr(&self, _image: &[u8]) -> Result<String, ExtractorError> {
        Err(ExtractorError::Disabled)
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Input for one exam + answer-key import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfImport {
    pub exam_name: String,
    pub exam_url: String,
    pub answer_url: String,
    pub exam_text: String,
    pub answer_text: String,
}

#[derive(Clone)]
pub struct IngestionService {
    clock: Clock,
    extractor: Arc<dyn QuestionExtractor>,
    questions: Arc<dyn QuestionRepository>,
    imports: Arc<dyn ImportRepository>,
    logs: Arc<dyn LogRepository>,
}

impl IngestionService {
    #[must_use]
    pub fn new(clock: Clock, extractor: Arc<dyn QuestionExtractor>, storage: &Storage) -> Self {
        Self {
            clock,
            extractor,
            questions: Arc::clone(&storage.questions),
            imports: Arc::clone(&storage.imports),
            logs: Arc::clone(&storage.logs),
        }
    }

    /// Cross-reference an exam with its answer key and store the resulting
    /// questions as one batch.
    ///
    /// The batch is recorded as `Processing` first and ends as `Done` or
    /// `Error`. A failed extraction or question write stores no questions.
    ///
    /// # Errors
    ///
    /// Returns `IngestionError::Forbidden` for non-admins,
    /// `IngestionError::ExtractionFailed` for any extractor failure or unusable
    /// draft, and `IngestionError::Storage` on persistence failures.
    pub async fn import_pdf(
        &self,
        actor: &User,
        import: PdfImport,
    ) -> Result<ImportBatch, IngestionError> {
        if !can_administer(actor.role) {
            warn!(actor = %actor.id, "pdf import denied");
            return Err(IngestionError::Forbidden);
        }

        let mut batch = ImportBatch::pdf(
            import.exam_name,
            import.exam_url,
            import.answer_url,
            self.clock.now(),
        );
        self.imports.upsert_batch(&batch).await?;

        let exam_text = truncate_chars(&import.exam_text, EXAM_TEXT_LIMIT);
        let questions = match self.extract_batch(exam_text, &import.answer_text, &batch).await {
            Ok(questions) => questions,
            Err(reason) => {
                warn!(batch = %batch.id, %reason, "pdf extraction failed");
                batch.status = ImportStatus::Error;
                self.imports.upsert_batch(&batch).await?;
                return Err(IngestionError::ExtractionFailed);
            }
        };

        if let Err(e) = self.questions.insert_questions(&questions).await {
            warn!(batch = %batch.id, error = %e, "storing extracted questions failed");
            batch.status = ImportStatus::Error;
            if let Err(mark) = self.imports.upsert_batch(&batch).await {
                warn!(batch = %batch.id, error = %mark, "could not flag import batch as failed");
            }
            return Err(e.into());
        }
        batch.question_count = questions.len();
        batch.status = ImportStatus::Done;
        self.imports.upsert_batch(&batch).await?;

        let details = format!("{}: {} questions", batch.name, batch.question_count);
        info!(actor = %actor.id, batch = %batch.id, count = batch.question_count, "pdf imported");
        self.logs
            .append_log(&AdminLog::new(
                actor.id,
                AdminAction::ImportPdf,
                details,
                self.clock.now(),
            ))
            .await?;
        Ok(batch)
    }

    async fn extract_batch(
        &self,
        exam_text: &str,
        answer_text: &str,
        batch: &ImportBatch,
    ) -> Result<Vec<Question>, String> {
        let drafts = self
            .extractor
            .cross_reference(exam_text, answer_text)
            .await
            .map_err(|e| e.to_string())?;
        drafts
            .into_iter()
            .map(|d| {
                d.validate(QuestionId::generate())
                    .map(|q| q.in_batch(batch.id))
                    .map_err(|e| e.to_string())
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns `IngestionError::ExtractionFailed` if the extractor fails.
    pub async fn extract_from_text(&self, text: &str) -> Result<Vec<QuestionDraft>, IngestionError> {
        self.extractor.extract_questions(text).await.map_err(|err| {
            warn!(error = %err, "text extraction failed");
            IngestionError::ExtractionFailed
        })
    }

    /// # Errors
    ///
    /// Returns `IngestionError::ExtractionFailed` if the extractor fails.
    pub async fn ocr(&self, image: &[u8]) -> Result<String, IngestionError> {
        self.extractor.ocr(image).await.map_err(|err| {
            warn!(error = %err, "ocr failed");
            IngestionError::ExtractionFailed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FlakyKv, actor, draft};
    use prep_core::model::Role;
    use storage::CollectionKey;
    use prep_core::time::fixed_clock;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedExtractor {
        fail: bool,
        drafts: Vec<QuestionDraft>,
        seen_exam_chars: Mutex<Option<usize>>,
    }

    #[async_trait]
    impl QuestionExtractor for ScriptedExtractor {
        async fn extract_questions(&self, _text: &str) -> Result<Vec<QuestionDraft>, ExtractorError> {
            if self.fail {
                return Err(ExtractorError::Transport("timeout".into()));
            }
            Ok(self.drafts.clone())
        }

        async fn cross_reference(
            &self,
            exam_text: &str,
            _answer_text: &str,
        ) -> Result<Vec<QuestionDraft>, ExtractorError> {
            *self.seen_exam_chars.lock().unwrap() = Some(exam_text.chars().count());
            self.extract_questions(exam_text).await
        }

        async fn ocr(&self, _image: &[u8]) -> Result<String, ExtractorError> {
            Err(ExtractorError::InvalidResponse("no text".into()))
        }
    }

    fn import(exam_text: String) -> PdfImport {
        PdfImport {
            exam_name: "PF 2024".into(),
            exam_url: "https://example.com/prova.pdf".into(),
            answer_url: "https://example.com/gabarito.pdf".into(),
            exam_text,
            answer_text: "1: C".into(),
        }
    }

    #[tokio::test]
    async fn failed_question_write_flags_the_batch() {
        let kv = FlakyKv::default();
        let storage = kv.storage();
        let extractor = Arc::new(ScriptedExtractor {
            drafts: vec![draft("Português", "CESPE")],
            ..ScriptedExtractor::default()
        });
        let service = IngestionService::new(fixed_clock(), extractor, &storage);

        kv.fail_writes(CollectionKey::Questions);
        let err = service
            .import_pdf(&actor(Role::Admin), import("1) Questão".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::Storage(_)));

        let batches = storage.imports.batches().await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].status, ImportStatus::Error);
        assert_eq!(batches[0].question_count, 0);
        assert!(storage.logs.logs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn successful_import_tags_questions_and_truncates_exam() {
        let storage = Storage::in_memory();
        let extractor = Arc::new(ScriptedExtractor {
            drafts: vec![draft("Português", "CESPE"), draft("Português", "CESPE")],
            ..ScriptedExtractor::default()
        });
        let service = IngestionService::new(fixed_clock(), extractor.clone(), &storage);

        let long_exam = "é".repeat(EXAM_TEXT_LIMIT + 500);
        let batch = service
            .import_pdf(&actor(Role::Admin), import(long_exam))
            .await
            .unwrap();

        assert_eq!(batch.status, ImportStatus::Done);
        assert_eq!(batch.question_count, 2);
        assert_eq!(*extractor.seen_exam_chars.lock().unwrap(), Some(EXAM_TEXT_LIMIT));

        let tagged = storage
            .questions
            .list_questions()
            .await
            .unwrap()
            .into_iter()
            .filter(|q| q.batch_id() == Some(batch.id))
            .count();
        assert_eq!(tagged, 2);
        assert_eq!(storage.logs.logs().await.unwrap()[0].action, AdminAction::ImportPdf);
    }

    #[tokio::test]
    async fn extractor_failure_marks_batch_as_error() {
        let storage = Storage::in_memory();
        let extractor = Arc::new(ScriptedExtractor {
            fail: true,
            ..ScriptedExtractor::default()
        });
        let service = IngestionService::new(fixed_clock(), extractor, &storage);

        let err = service
            .import_pdf(&actor(Role::Admin), import("Questão 1".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::ExtractionFailed));

        let batches = storage.imports.batches().await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].status, ImportStatus::Error);
        assert_eq!(storage.questions.list_questions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unusable_drafts_store_nothing() {
        let storage = Storage::in_memory();
        let mut broken = draft("Português", "CESPE");
        broken.statement.clear();
        let extractor = Arc::new(ScriptedExtractor {
            drafts: vec![draft("Português", "CESPE"), broken],
            ..ScriptedExtractor::default()
        });
        let service = IngestionService::new(fixed_clock(), extractor, &storage);

        let err = service
            .import_pdf(&actor(Role::Admin), import("Questão 1".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::ExtractionFailed));
        assert_eq!(storage.questions.list_questions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_admins_cannot_import_and_passthroughs_map_errors() {
        let storage = Storage::in_memory();
        let service = IngestionService::new(fixed_clock(), Arc::new(DisabledExtractor), &storage);
        assert!(matches!(
            service
                .import_pdf(&actor(Role::Moderator), import(String::new()))
                .await,
            Err(IngestionError::Forbidden)
        ));
        assert!(storage.imports.batches().await.unwrap().is_empty());

        assert!(matches!(
            service.extract_from_text("texto").await,
            Err(IngestionError::ExtractionFailed)
        ));
        assert!(matches!(
            service.ocr(&[0xFF, 0xD8]).await,
            Err(IngestionError::ExtractionFailed)
        ));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("ação", 2), "aç");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
