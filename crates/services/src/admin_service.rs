use std::sync::Arc;

use prep_core::model::{
    AdminAction, AdminLog, BatchId, ImportBatch, MaterialId, PdfMaterial, Question, QuestionDraft,
    QuestionId, Role, User, UserId, VideoId, VideoLesson,
};
use storage::repository::{
    CatalogRepository, ImportRepository, LogRepository, QuestionRepository, Storage,
    UserRepository,
};
use tracing::{info, warn};

use crate::Clock;
use crate::error::AdminError;
use crate::moderation::can_administer;

/// Back-office operations. Every call requires an administrator and leaves an
/// audit entry when it changes something.
#[derive(Clone)]
pub struct AdminService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    imports: Arc<dyn ImportRepository>,
    logs: Arc<dyn LogRepository>,
    users: Arc<dyn UserRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

impl AdminService {
    #[must_use]
    pub fn new(clock: Clock, storage: &Storage) -> Self {
        Self {
            clock,
            questions: Arc::clone(&storage.questions),
            imports: Arc::clone(&storage.imports),
            logs: Arc::clone(&storage.logs),
            users: Arc::clone(&storage.users),
            catalog: Arc::clone(&storage.catalog),
        }
    }

    fn authorize(actor: &User) -> Result<(), AdminError> {
        if can_administer(actor.role) {
            Ok(())
        } else {
            warn!(actor = %actor.id, role = %actor.role, "back-office access denied");
            Err(AdminError::Forbidden)
        }
    }

    async fn audit(
        &self,
        actor: &User,
        action: AdminAction,
        details: String,
    ) -> Result<(), AdminError> {
        info!(actor = %actor.id, %action, %details, "admin action");
        let entry = AdminLog::new(actor.id, action, details, self.clock.now());
        self.logs.append_log(&entry).await?;
        Ok(())
    }

    // ─── Questions ─────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins.
    pub async fn list_questions(&self, actor: &User) -> Result<Vec<Question>, AdminError> {
        Self::authorize(actor)?;
        Ok(self.questions.list_questions().await?)
    }

    /// Validate and store a single hand-written question.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins and
    /// `AdminError::Question` if the draft is invalid.
    pub async fn create_question(
        &self,
        actor: &User,
        draft: QuestionDraft,
    ) -> Result<Question, AdminError> {
        Self::authorize(actor)?;
        let question = draft.validate(QuestionId::generate())?;
        self.questions
            .insert_questions(std::slice::from_ref(&question))
            .await?;
        self.audit(
            actor,
            AdminAction::CreateQuestion,
            format!("Created question {}", question.id()),
        )
        .await?;
        Ok(question)
    }

    /// Returns `false` when the question did not exist.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins.
    pub async fn delete_question(&self, actor: &User, id: QuestionId) -> Result<bool, AdminError> {
        Self::authorize(actor)?;
        let removed = self.questions.delete_question(id).await?;
        if removed {
            self.audit(actor, AdminAction::DeleteQuestion, format!("Deleted question {id}"))
                .await?;
        }
        Ok(removed)
    }

    // ─── Import batches ────────────────────────────────────────────────────

    /// Register a CSV batch and add its questions, each tagged with the batch id.
    ///
    /// All drafts are validated before anything is written. The batch is
    /// registered first and dropped again if its questions cannot be stored.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins and
    /// `AdminError::Question` for the first invalid draft.
    pub async fn import_csv(
        &self,
        actor: &User,
        file_name: &str,
        drafts: Vec<QuestionDraft>,
    ) -> Result<ImportBatch, AdminError> {
        Self::authorize(actor)?;
        let batch = ImportBatch::csv(file_name, drafts.len(), self.clock.now());
        let questions = drafts
            .into_iter()
            .map(|d| d.validate(QuestionId::generate()).map(|q| q.in_batch(batch.id)))
            .collect::<Result<Vec<_>, _>>()?;

        self.imports.upsert_batch(&batch).await?;
        if let Err(e) = self.questions.insert_questions(&questions).await {
            if let Err(cleanup) = self.imports.remove_batch(batch.id).await {
                warn!(batch = %batch.id, error = %cleanup, "could not drop failed import batch");
            }
            return Err(e.into());
        }
        self.audit(
            actor,
            AdminAction::ImportCsv,
            format!("Imported file: {file_name}"),
        )
        .await?;
        Ok(batch)
    }

    /// Remove a batch and exactly the questions it brought in.
    /// Returns how many questions were removed.
    ///
    /// Questions go first, so a failed call leaves the batch listed and can
    /// be repeated.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins.
    pub async fn delete_batch(&self, actor: &User, id: BatchId) -> Result<usize, AdminError> {
        Self::authorize(actor)?;
        let name = self
            .imports
            .get_batch(id)
            .await?
            .map_or_else(|| id.to_string(), |b| b.name);
        let removed = self.questions.delete_questions_in_batch(id).await?;
        self.imports.remove_batch(id).await?;
        self.audit(
            actor,
            AdminAction::DeleteBatch,
            format!("Removed batch {name} and {removed} questions"),
        )
        .await?;
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins.
    pub async fn list_batches(&self, actor: &User) -> Result<Vec<ImportBatch>, AdminError> {
        Self::authorize(actor)?;
        Ok(self.imports.batches().await?)
    }

    /// Audit trail, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins.
    pub async fn logs(&self, actor: &User) -> Result<Vec<AdminLog>, AdminError> {
        Self::authorize(actor)?;
        let mut logs = self.logs.logs().await?;
        logs.reverse();
        Ok(logs)
    }

    // ─── Users ─────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins.
    pub async fn users(&self, actor: &User) -> Result<Vec<User>, AdminError> {
        Self::authorize(actor)?;
        Ok(self.users.users().await?)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins and
    /// `AdminError::UnknownUser` if `target` does not exist.
    pub async fn change_role(
        &self,
        actor: &User,
        target: UserId,
        role: Role,
    ) -> Result<User, AdminError> {
        Self::authorize(actor)?;
        let mut user = self
            .users
            .get_user(target)
            .await?
            .ok_or(AdminError::UnknownUser(target))?;
        let previous = user.role;
        user.role = role;
        self.users.upsert_user(&user).await?;
        self.audit(
            actor,
            AdminAction::ChangeRole,
            format!("{}: {previous} -> {role}", user.name),
        )
        .await?;
        Ok(user)
    }

    /// Record a ban. Accounts carry no ban state, so only the audit entry changes.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins and
    /// `AdminError::UnknownUser` if `target` does not exist.
    pub async fn ban_user(&self, actor: &User, target: UserId) -> Result<(), AdminError> {
        Self::authorize(actor)?;
        let user = self
            .users
            .get_user(target)
            .await?
            .ok_or(AdminError::UnknownUser(target))?;
        self.audit(actor, AdminAction::BanUser, format!("Banned {}", user.name))
            .await
    }

    // ─── Catalog ───────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins.
    pub async fn add_video(&self, actor: &User, video: VideoLesson) -> Result<(), AdminError> {
        Self::authorize(actor)?;
        self.catalog.insert_video(&video).await?;
        self.audit(actor, AdminAction::AddVideo, video.title).await
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins.
    pub async fn delete_video(&self, actor: &User, id: VideoId) -> Result<bool, AdminError> {
        Self::authorize(actor)?;
        let removed = self.catalog.delete_video(id).await?;
        if removed {
            self.audit(actor, AdminAction::DeleteVideo, format!("Deleted video {id}"))
                .await?;
        }
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins.
    pub async fn add_material(
        &self,
        actor: &User,
        material: PdfMaterial,
    ) -> Result<(), AdminError> {
        Self::authorize(actor)?;
        self.catalog.insert_material(&material).await?;
        self.audit(actor, AdminAction::AddMaterial, material.name)
            .await
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins.
    pub async fn delete_material(
        &self,
        actor: &User,
        id: MaterialId,
    ) -> Result<bool, AdminError> {
        Self::authorize(actor)?;
        let removed = self.catalog.delete_material(id).await?;
        if removed {
            self.audit(
                actor,
                AdminAction::DeleteMaterial,
                format!("Deleted material {id}"),
            )
            .await?;
        }
        Ok(removed)
    }
}
