use async_trait::async_trait;
use prep_core::model::{
    AdminLog, Attempt, BatchId, ChatMessage, ChatRoom, Comment, CommentId, ImportBatch,
    MaterialId, MessageId, Notification, NotificationId, PdfMaterial, Question, QuestionId, RoomId,
    User, UserId, VideoId, VideoLesson,
};
use std::sync::Arc;
use thiserror::Error;

use crate::kv::{InMemoryKv, KeyValueStore};
use crate::local::LocalStore;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Question bank content. Questions are immutable; only insert and delete exist.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// List every stored question in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError>;

    /// Fetch a question by ID. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError>;

    /// Append questions to the bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if an ID is already present.
    async fn insert_questions(&self, questions: &[Question]) -> Result<(), StorageError>;

    /// Remove one question. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn delete_question(&self, id: QuestionId) -> Result<bool, StorageError>;

    /// Remove every question tagged with `batch_id`, returning how many were dropped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn delete_questions_in_batch(&self, batch_id: BatchId) -> Result<usize, StorageError>;
}

/// Append-only answer history. There is deliberately no update or delete.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, attempt: &Attempt) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn attempts(&self) -> Result<Vec<Attempt>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn attempts_for_user(&self, user_id: UserId) -> Result<Vec<Attempt>, StorageError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the comment cannot be stored.
    async fn append_comment(&self, comment: &Comment) -> Result<(), StorageError>;

    /// Comments on a question, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn comments_for(&self, question_id: QuestionId) -> Result<Vec<Comment>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StorageError>;

    /// Set the pin flag, returning the updated comment or `None` if missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn set_comment_pinned(
        &self,
        id: CommentId,
        pinned: bool,
    ) -> Result<Option<Comment>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn delete_comment(&self, id: CommentId) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn rooms(&self) -> Result<Vec<ChatRoom>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a room with the same ID exists.
    async fn insert_room(&self, room: &ChatRoom) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn delete_room(&self, id: &RoomId) -> Result<bool, StorageError>;

    /// Messages of one room, in send order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn messages(&self, room: &RoomId) -> Result<Vec<ChatMessage>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the message cannot be stored.
    async fn append_message(&self, message: &ChatMessage) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn delete_message(&self, id: MessageId) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn users(&self) -> Result<Vec<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Insert or replace a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn upsert_user(&self, user: &User) -> Result<(), StorageError>;

    /// The signed-in user, falling back to the seeded default account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be read.
    async fn current_user(&self) -> Result<User, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be written.
    async fn set_current_user(&self, user: &User) -> Result<(), StorageError>;
}

#[async_trait]
pub trait ImportRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn batches(&self) -> Result<Vec<ImportBatch>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn get_batch(&self, id: BatchId) -> Result<Option<ImportBatch>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn upsert_batch(&self, batch: &ImportBatch) -> Result<(), StorageError>;

    /// Removes the batch record only. Dependent questions are the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn remove_batch(&self, id: BatchId) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait LogRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn append_log(&self, log: &AdminLog) -> Result<(), StorageError>;

    /// Audit entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn logs(&self) -> Result<Vec<AdminLog>, StorageError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn append_notification(&self, notification: &Notification) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn notifications_for(&self, user_id: UserId) -> Result<Vec<Notification>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn mark_read(&self, id: NotificationId) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn videos(&self) -> Result<Vec<VideoLesson>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn insert_video(&self, video: &VideoLesson) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn delete_video(&self, id: VideoId) -> Result<bool, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    async fn materials(&self) -> Result<Vec<PdfMaterial>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn insert_material(&self, material: &PdfMaterial) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    async fn delete_material(&self, id: MaterialId) -> Result<bool, StorageError>;
}

/// Aggregates every repository behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub chat: Arc<dyn ChatRepository>,
    pub users: Arc<dyn UserRepository>,
    pub imports: Arc<dyn ImportRepository>,
    pub logs: Arc<dyn LogRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
}

impl Storage {
    /// Wire every repository to the same local store.
    #[must_use]
    pub fn from_store<S: KeyValueStore + 'static>(store: LocalStore<S>) -> Self {
        let store = Arc::new(store);
        Self {
            questions: store.clone(),
            attempts: store.clone(),
            comments: store.clone(),
            chat: store.clone(),
            users: store.clone(),
            imports: store.clone(),
            logs: store.clone(),
            notifications: store.clone(),
            catalog: store,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(LocalStore::new(InMemoryKv::new()))
    }
}
