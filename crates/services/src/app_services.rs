use std::sync::Arc;
use std::time::Duration;

use prep_core::model::{RoomId, User, UserId};
use storage::repository::{Storage, StorageError};
use tracing::debug;

use crate::Clock;
use crate::admin_service::AdminService;
use crate::catalog_service::CatalogService;
use crate::chat::{ChatFeed, ChatService};
use crate::error::AppServicesError;
use crate::ingestion::{DisabledExtractor, IngestionService, QuestionExtractor};
use crate::moderation::CommentService;
use crate::notification_service::NotificationService;
use crate::question_bank::QuestionBankService;
use crate::stats::StatsService;
use crate::store_service::StoreService;

/// Assembles every app-facing service over one `Storage`.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    question_bank: Arc<QuestionBankService>,
    stats: Arc<StatsService>,
    comments: Arc<CommentService>,
    chat: Arc<ChatService>,
    admin: Arc<AdminService>,
    ingestion: Arc<IngestionService>,
    catalog: Arc<CatalogService>,
    notifications: Arc<NotificationService>,
    store: StoreService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, with extraction disabled.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, Arc::new(DisabledExtractor)))
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(Storage::in_memory(), clock, Arc::new(DisabledExtractor))
    }

    #[must_use]
    pub fn from_storage(
        storage: Storage,
        clock: Clock,
        extractor: Arc<dyn QuestionExtractor>,
    ) -> Self {
        debug!("assembling app services");
        Self {
            question_bank: Arc::new(QuestionBankService::new(
                clock,
                Arc::clone(&storage.questions),
                Arc::clone(&storage.attempts),
                Arc::clone(&storage.comments),
            )),
            stats: Arc::new(StatsService::new(
                Arc::clone(&storage.attempts),
                Arc::clone(&storage.questions),
            )),
            comments: Arc::new(CommentService::new(clock, Arc::clone(&storage.comments))),
            chat: Arc::new(ChatService::new(clock, Arc::clone(&storage.chat))),
            admin: Arc::new(AdminService::new(clock, &storage)),
            ingestion: Arc::new(IngestionService::new(clock, extractor, &storage)),
            catalog: Arc::new(CatalogService::new(Arc::clone(&storage.catalog))),
            notifications: Arc::new(NotificationService::new(
                clock,
                Arc::clone(&storage.notifications),
            )),
            store: StoreService::new(clock),
            storage,
        }
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the user entry cannot be read.
    pub async fn current_user(&self) -> Result<User, StorageError> {
        self.storage.users.current_user().await
    }

    /// Switch the signed-in user to a known account.
    ///
    /// Returns `None` if no user has that id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the users cannot be read or the entry written.
    pub async fn sign_in_as(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let Some(user) = self.storage.users.get_user(id).await? else {
            return Ok(None);
        };
        self.storage.users.set_current_user(&user).await?;
        Ok(Some(user))
    }

    /// Start polling chat for `room`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn chat_feed(&self, room: Option<RoomId>, interval: Duration) -> ChatFeed {
        ChatFeed::start(self.chat.repository(), room, interval)
    }

    #[must_use]
    pub fn question_bank(&self) -> Arc<QuestionBankService> {
        Arc::clone(&self.question_bank)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn comments(&self) -> Arc<CommentService> {
        Arc::clone(&self.comments)
    }

    #[must_use]
    pub fn chat(&self) -> Arc<ChatService> {
        Arc::clone(&self.chat)
    }

    #[must_use]
    pub fn admin(&self) -> Arc<AdminService> {
        Arc::clone(&self.admin)
    }

    #[must_use]
    pub fn ingestion(&self) -> Arc<IngestionService> {
        Arc::clone(&self.ingestion)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn notifications(&self) -> Arc<NotificationService> {
        Arc::clone(&self.notifications)
    }

    #[must_use]
    pub fn store(&self) -> StoreService {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::time::fixed_clock;
    use storage::seed::{ADMIN_USER_ID, REGULAR_USER_ID};

    #[tokio::test]
    async fn sign_in_switches_current_user() {
        let services = AppServices::in_memory(fixed_clock());
        assert_eq!(services.current_user().await.unwrap().id, ADMIN_USER_ID);

        let maria = services.sign_in_as(REGULAR_USER_ID).await.unwrap().unwrap();
        assert_eq!(services.current_user().await.unwrap(), maria);
        assert!(services.sign_in_as(UserId::from_u128(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn services_share_the_same_storage() {
        let services = AppServices::in_memory(fixed_clock());
        let admin = services.current_user().await.unwrap();
        let listed = services.admin().list_questions(&admin).await.unwrap();
        let report = services.stats().report_for(admin.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(report.summary.total, 0);
    }
}
