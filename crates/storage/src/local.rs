use async_trait::async_trait;
use prep_core::model::{
    AdminLog, Attempt, BatchId, ChatMessage, ChatRoom, Comment, CommentId, ImportBatch,
    MaterialId, MessageId, Notification, NotificationId, PdfMaterial, Question, QuestionId, RoomId,
    User, UserId, VideoId, VideoLesson,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::kv::{CollectionKey, KeyValueStore};
use crate::repository::{
    AttemptRepository, CatalogRepository, ChatRepository, CommentRepository, ImportRepository,
    LogRepository, NotificationRepository, QuestionRepository, StorageError, UserRepository,
};
use crate::seed;

/// Typed JSON collections over a `KeyValueStore`.
///
/// Every mutation is a read-modify-write of the whole collection. There is no
/// conflict detection between concurrent writers: the last `set` wins.
pub struct LocalStore<S> {
    kv: S,
}

impl<S: KeyValueStore> LocalStore<S> {
    #[must_use]
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    #[must_use]
    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// Read and decode a collection, falling back to `seed` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored document is not valid JSON
    /// for `T`, or the backend error if the read fails.
    pub async fn load<T, F>(&self, key: CollectionKey, seed: F) -> Result<T, StorageError>
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.kv.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| StorageError::Serialization(format!("{key}: {e}"))),
            None => {
                debug!(%key, "collection absent, using seed");
                Ok(seed())
            }
        }
    }

    /// Encode and store a collection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails, or the backend error.
    pub async fn save<T: Serialize + ?Sized>(
        &self,
        key: CollectionKey,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StorageError::Serialization(format!("{key}: {e}")))?;
        self.kv.set(key, raw).await
    }

    /// Write the seeded collections under every key that is still absent.
    /// Returns the keys that were written.
    ///
    /// # Errors
    ///
    /// Returns the backend error if a read or write fails.
    pub async fn materialize_seeds(&self) -> Result<Vec<CollectionKey>, StorageError> {
        let mut written = Vec::new();
        for key in CollectionKey::ALL {
            if self.kv.get(key).await?.is_some() {
                continue;
            }
            match key {
                CollectionKey::Questions => self.save(key, &seed::questions()).await?,
                CollectionKey::Users => self.save(key, &seed::users()).await?,
                CollectionKey::Videos => self.save(key, &seed::videos()).await?,
                CollectionKey::Materials => self.save(key, &seed::materials()).await?,
                CollectionKey::ChatRooms => self.save(key, &seed::rooms()).await?,
                CollectionKey::CurrentUser => self.save(key, &seed::current_user()).await?,
                _ => continue,
            }
            written.push(key);
        }
        debug!(count = written.len(), "seed collections written");
        Ok(written)
    }

    /// Load, mutate and write back a list collection.
    async fn update<T, R, F>(
        &self,
        key: CollectionKey,
        seed: fn() -> Vec<T>,
        f: F,
    ) -> Result<R, StorageError>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce(&mut Vec<T>) -> R + Send,
        R: Send,
    {
        let mut items: Vec<T> = self.load(key, seed).await?;
        let out = f(&mut items);
        self.save(key, &items).await?;
        Ok(out)
    }

    async fn push<T>(&self, key: CollectionKey, seed: fn() -> Vec<T>, item: T) -> Result<(), StorageError>
    where
        T: Serialize + DeserializeOwned + Send,
    {
        self.update(key, seed, |items| items.push(item)).await
    }

    async fn remove_where<T, P>(
        &self,
        key: CollectionKey,
        seed: fn() -> Vec<T>,
        predicate: P,
    ) -> Result<usize, StorageError>
    where
        T: Serialize + DeserializeOwned + Send,
        P: Fn(&T) -> bool + Send,
    {
        self.update(key, seed, move |items| {
            let before = items.len();
            items.retain(|item| !predicate(item));
            before - items.len()
        })
        .await
    }
}

fn empty<T>() -> Vec<T> {
    Vec::new()
}

#[async_trait]
impl<S: KeyValueStore> QuestionRepository for LocalStore<S> {
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        self.load(CollectionKey::Questions, seed::questions).await
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let all = self.list_questions().await?;
        Ok(all.into_iter().find(|q| q.id() == id))
    }

    async fn insert_questions(&self, questions: &[Question]) -> Result<(), StorageError> {
        let incoming = questions.to_vec();
        self.update(CollectionKey::Questions, seed::questions, move |items| {
            if incoming
                .iter()
                .any(|new| items.iter().any(|q| q.id() == new.id()))
            {
                return Err(StorageError::Conflict);
            }
            items.extend(incoming);
            Ok(())
        })
        .await?
    }

    async fn delete_question(&self, id: QuestionId) -> Result<bool, StorageError> {
        let removed = self
            .remove_where(CollectionKey::Questions, seed::questions, move |q: &Question| {
                q.id() == id
            })
            .await?;
        Ok(removed > 0)
    }

    async fn delete_questions_in_batch(&self, batch_id: BatchId) -> Result<usize, StorageError> {
        self.remove_where(CollectionKey::Questions, seed::questions, move |q: &Question| {
            q.batch_id() == Some(batch_id)
        })
        .await
    }
}

#[async_trait]
impl<S: KeyValueStore> AttemptRepository for LocalStore<S> {
    async fn append_attempt(&self, attempt: &Attempt) -> Result<(), StorageError> {
        self.push(CollectionKey::Attempts, empty, attempt.clone()).await
    }

    async fn attempts(&self) -> Result<Vec<Attempt>, StorageError> {
        self.load(CollectionKey::Attempts, empty).await
    }

    async fn attempts_for_user(&self, user_id: UserId) -> Result<Vec<Attempt>, StorageError> {
        let mut all = self.attempts().await?;
        all.retain(|a| a.user_id() == user_id);
        Ok(all)
    }
}

#[async_trait]
impl<S: KeyValueStore> CommentRepository for LocalStore<S> {
    async fn append_comment(&self, comment: &Comment) -> Result<(), StorageError> {
        self.push(CollectionKey::Comments, empty, comment.clone()).await
    }

    async fn comments_for(&self, question_id: QuestionId) -> Result<Vec<Comment>, StorageError> {
        let mut all: Vec<Comment> = self.load(CollectionKey::Comments, empty).await?;
        all.retain(|c| c.question_id() == question_id);
        Ok(all)
    }

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StorageError> {
        let all: Vec<Comment> = self.load(CollectionKey::Comments, empty).await?;
        Ok(all.into_iter().find(|c| c.id() == id))
    }

    async fn set_comment_pinned(
        &self,
        id: CommentId,
        pinned: bool,
    ) -> Result<Option<Comment>, StorageError> {
        self.update(CollectionKey::Comments, empty, move |items: &mut Vec<Comment>| {
            items.iter_mut().find(|c| c.id() == id).map(|c| {
                c.set_pinned(pinned);
                c.clone()
            })
        })
        .await
    }

    async fn delete_comment(&self, id: CommentId) -> Result<bool, StorageError> {
        let removed = self
            .remove_where(CollectionKey::Comments, empty, move |c: &Comment| c.id() == id)
            .await?;
        Ok(removed > 0)
    }
}

#[async_trait]
impl<S: KeyValueStore> ChatRepository for LocalStore<S> {
    async fn rooms(&self) -> Result<Vec<ChatRoom>, StorageError> {
        self.load(CollectionKey::ChatRooms, seed::rooms).await
    }

    async fn insert_room(&self, room: &ChatRoom) -> Result<(), StorageError> {
        let room = room.clone();
        self.update(CollectionKey::ChatRooms, seed::rooms, move |items| {
            if items.iter().any(|r| r.id == room.id) {
                return Err(StorageError::Conflict);
            }
            items.push(room);
            Ok(())
        })
        .await?
    }

    async fn delete_room(&self, id: &RoomId) -> Result<bool, StorageError> {
        let id = id.clone();
        let removed = self
            .remove_where(CollectionKey::ChatRooms, seed::rooms, move |r: &ChatRoom| r.id == id)
            .await?;
        Ok(removed > 0)
    }

    async fn messages(&self, room: &RoomId) -> Result<Vec<ChatMessage>, StorageError> {
        let mut all: Vec<ChatMessage> = self.load(CollectionKey::ChatMessages, empty).await?;
        all.retain(|m| m.room_id() == room);
        Ok(all)
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), StorageError> {
        self.push(CollectionKey::ChatMessages, empty, message.clone())
            .await
    }

    async fn delete_message(&self, id: MessageId) -> Result<bool, StorageError> {
        let removed = self
            .remove_where(CollectionKey::ChatMessages, empty, move |m: &ChatMessage| {
                m.id() == id
            })
            .await?;
        Ok(removed > 0)
    }
}

#[async_trait]
impl<S: KeyValueStore> UserRepository for LocalStore<S> {
    async fn users(&self) -> Result<Vec<User>, StorageError> {
        self.load(CollectionKey::Users, seed::users).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let all = self.users().await?;
        Ok(all.into_iter().find(|u| u.id == id))
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        let user = user.clone();
        self.update(CollectionKey::Users, seed::users, move |items| {
            match items.iter_mut().find(|u| u.id == user.id) {
                Some(existing) => *existing = user,
                None => items.push(user),
            }
        })
        .await
    }

    async fn current_user(&self) -> Result<User, StorageError> {
        self.load(CollectionKey::CurrentUser, seed::current_user)
            .await
    }

    async fn set_current_user(&self, user: &User) -> Result<(), StorageError> {
        self.save(CollectionKey::CurrentUser, user).await
    }
}

#[async_trait]
impl<S: KeyValueStore> ImportRepository for LocalStore<S> {
    async fn batches(&self) -> Result<Vec<ImportBatch>, StorageError> {
        self.load(CollectionKey::ImportBatches, empty).await
    }

    async fn get_batch(&self, id: BatchId) -> Result<Option<ImportBatch>, StorageError> {
        let all = self.batches().await?;
        Ok(all.into_iter().find(|b| b.id == id))
    }

    async fn upsert_batch(&self, batch: &ImportBatch) -> Result<(), StorageError> {
        let batch = batch.clone();
        self.update(CollectionKey::ImportBatches, empty, move |items: &mut Vec<ImportBatch>| {
            match items.iter_mut().find(|b| b.id == batch.id) {
                Some(existing) => *existing = batch,
                None => items.push(batch),
            }
        })
        .await
    }

    async fn remove_batch(&self, id: BatchId) -> Result<bool, StorageError> {
        let removed = self
            .remove_where(CollectionKey::ImportBatches, empty, move |b: &ImportBatch| {
                b.id == id
            })
            .await?;
        Ok(removed > 0)
    }
}

#[async_trait]
impl<S: KeyValueStore> LogRepository for LocalStore<S> {
    async fn append_log(&self, log: &AdminLog) -> Result<(), StorageError> {
        self.push(CollectionKey::Logs, empty, log.clone()).await
    }

    async fn logs(&self) -> Result<Vec<AdminLog>, StorageError> {
        self.load(CollectionKey::Logs, empty).await
    }
}

#[async_trait]
impl<S: KeyValueStore> NotificationRepository for LocalStore<S> {
    async fn append_notification(&self, notification: &Notification) -> Result<(), StorageError> {
        self.push(CollectionKey::Notifications, empty, notification.clone())
            .await
    }

    async fn notifications_for(&self, user_id: UserId) -> Result<Vec<Notification>, StorageError> {
        let mut all: Vec<Notification> = self.load(CollectionKey::Notifications, empty).await?;
        all.retain(|n| n.user_id == user_id);
        Ok(all)
    }

    async fn mark_read(&self, id: NotificationId) -> Result<bool, StorageError> {
        self.update(CollectionKey::Notifications, empty, move |items: &mut Vec<Notification>| {
            match items.iter_mut().find(|n| n.id == id) {
                Some(n) => {
                    n.read = true;
                    true
                }
                None => false,
            }
        })
        .await
    }
}

#[async_trait]
impl<S: KeyValueStore> CatalogRepository for LocalStore<S> {
    async fn videos(&self) -> Result<Vec<VideoLesson>, StorageError> {
        self.load(CollectionKey::Videos, seed::videos).await
    }

    async fn insert_video(&self, video: &VideoLesson) -> Result<(), StorageError> {
        self.push(CollectionKey::Videos, seed::videos, video.clone())
            .await
    }

    async fn delete_video(&self, id: VideoId) -> Result<bool, StorageError> {
        let removed = self
            .remove_where(CollectionKey::Videos, seed::videos, move |v: &VideoLesson| {
                v.id == id
            })
            .await?;
        Ok(removed > 0)
    }

    async fn materials(&self) -> Result<Vec<PdfMaterial>, StorageError> {
        self.load(CollectionKey::Materials, seed::materials).await
    }

    async fn insert_material(&self, material: &PdfMaterial) -> Result<(), StorageError> {
        self.push(CollectionKey::Materials, seed::materials, material.clone())
            .await
    }

    async fn delete_material(&self, id: MaterialId) -> Result<bool, StorageError> {
        let removed = self
            .remove_where(
                CollectionKey::Materials,
                seed::materials,
                move |m: &PdfMaterial| m.id == id,
            )
            .await?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKv;
    use prep_core::model::{BodyText, ImportStatus, Letter, Role};
    use prep_core::time::fixed_now;

    fn store() -> LocalStore<InMemoryKv> {
        LocalStore::new(InMemoryKv::new())
    }

    #[tokio::test]
    async fn absent_collections_fall_back_to_seed() {
        let store = store();
        let questions = store.list_questions().await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_letter(), Letter::B);

        let rooms = store.rooms().await.unwrap();
        assert_eq!(rooms.len(), 3);
        assert!(store.attempts().await.unwrap().is_empty());
        assert_eq!(store.current_user().await.unwrap().role, Role::Admin);
    }

    #[tokio::test]
    async fn corrupt_documents_are_serialization_errors() {
        let store = store();
        store
            .kv()
            .set(CollectionKey::Attempts, "{not json".into())
            .await
            .unwrap();
        let err = store.attempts().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn materializing_seeds_skips_existing_collections() {
        let store = store();
        store.save(CollectionKey::ChatRooms, &Vec::<ChatRoom>::new()).await.unwrap();

        let written = store.materialize_seeds().await.unwrap();
        assert_eq!(written.len(), 5);
        assert!(!written.contains(&CollectionKey::ChatRooms));
        assert!(store.rooms().await.unwrap().is_empty());
        assert!(store.kv().get(CollectionKey::Questions).await.unwrap().is_some());

        assert!(store.materialize_seeds().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_question_ids_conflict() {
        let store = store();
        let seeded = store.list_questions().await.unwrap();
        let err = store.insert_questions(&seeded).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert_eq!(store.list_questions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pin_flag_is_persisted() {
        let store = store();
        let question = QuestionId::from_u128(1);
        let comment = Comment::new(
            question,
            UserId::from_u128(2),
            "Maria",
            BodyText::parse("Dúvida no item C").unwrap(),
            fixed_now(),
        );
        store.append_comment(&comment).await.unwrap();

        let updated = store.set_comment_pinned(comment.id(), true).await.unwrap();
        assert!(updated.unwrap().is_pinned());
        assert!(store.get_comment(comment.id()).await.unwrap().unwrap().is_pinned());

        let missing = store
            .set_comment_pinned(CommentId::generate(), true)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn messages_are_scoped_to_their_room() {
        let store = store();
        let geral = RoomId::new("geral").unwrap();
        let pf = RoomId::new("pf").unwrap();
        for (room, text) in [(&geral, "oi"), (&pf, "bom dia"), (&geral, "tudo bem?")] {
            let msg = ChatMessage::new(
                room.clone(),
                UserId::from_u128(1),
                "João",
                BodyText::parse(text).unwrap(),
                fixed_now(),
            );
            store.append_message(&msg).await.unwrap();
        }
        let texts: Vec<_> = store
            .messages(&geral)
            .await
            .unwrap()
            .iter()
            .map(|m| m.text().to_owned())
            .collect();
        assert_eq!(texts, ["oi", "tudo bem?"]);
    }

    #[tokio::test]
    async fn upsert_user_replaces_by_id() {
        let store = store();
        let mut maria = store.get_user(seed::REGULAR_USER_ID).await.unwrap().unwrap();
        maria.role = Role::Moderator;
        store.upsert_user(&maria).await.unwrap();

        let users = store.users().await.unwrap();
        assert_eq!(users.len(), 2);
        let stored = users.iter().find(|u| u.id == maria.id).unwrap();
        assert_eq!(stored.role, Role::Moderator);
    }

    #[tokio::test]
    async fn batches_are_replaced_by_id_and_removed_once() {
        let store = store();
        let mut batch = ImportBatch::pdf(
            "PF 2024",
            "https://example.com/prova.pdf",
            "https://example.com/gabarito.pdf",
            fixed_now(),
        );
        store.upsert_batch(&batch).await.unwrap();
        batch.status = ImportStatus::Done;
        batch.question_count = 12;
        store.upsert_batch(&batch).await.unwrap();

        assert_eq!(store.batches().await.unwrap(), vec![batch.clone()]);
        assert!(store.remove_batch(batch.id).await.unwrap());
        assert!(!store.remove_batch(batch.id).await.unwrap());
    }

    #[tokio::test]
    async fn questions_are_deleted_by_id() {
        let store = store();
        assert!(store.delete_question(seed::SEED_QUESTION_ID).await.unwrap());
        assert!(!store.delete_question(seed::SEED_QUESTION_ID).await.unwrap());
        assert!(store.list_questions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn current_user_can_be_switched() {
        let store = store();
        let maria = store.get_user(seed::REGULAR_USER_ID).await.unwrap().unwrap();
        store.set_current_user(&maria).await.unwrap();
        assert_eq!(store.current_user().await.unwrap(), maria);
    }
}
