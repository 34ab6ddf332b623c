use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use prep_core::model::{
    Alternative, Letter, Question, QuestionDraft, QuestionId, QuestionMeta, Role, User, UserId,
};
use storage::{CollectionKey, InMemoryKv, KeyValueStore, LocalStore, Storage, StorageError};

pub(crate) fn draft(discipline: &str, board: &str) -> QuestionDraft {
    QuestionDraft {
        statement: format!("Questão de {discipline}"),
        alternatives: Letter::ALL
            .iter()
            .map(|l| Alternative::new(*l, format!("Alternativa {l}")))
            .collect(),
        correct_letter: Letter::B,
        meta: QuestionMeta {
            discipline: discipline.into(),
            board: board.into(),
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

pub(crate) fn question(id: u128, discipline: &str, board: &str) -> Question {
    draft(discipline, board)
        .validate(QuestionId::from_u128(id))
        .unwrap()
}

pub(crate) fn actor(role: Role) -> User {
    let id = match role {
        Role::User => 0x10,
        Role::Moderator => 0x20,
        Role::Admin => 0x30,
    };
    User::new(UserId::from_u128(id), format!("{role}"), "teste@pa.com", role)
}

/// In-memory backend whose writes to selected collections can be made to fail.
#[derive(Clone, Default)]
pub(crate) struct FlakyKv {
    inner: InMemoryKv,
    failing: Arc<Mutex<HashSet<CollectionKey>>>,
}

impl FlakyKv {
    pub(crate) fn storage(&self) -> Storage {
        Storage::from_store(LocalStore::new(self.clone()))
    }

    pub(crate) fn fail_writes(&self, key: CollectionKey) {
        self.failing.lock().unwrap().insert(key);
    }

    pub(crate) fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }

    fn check(&self, key: CollectionKey) -> Result<(), StorageError> {
        if self.failing.lock().unwrap().contains(&key) {
            return Err(StorageError::Connection(format!("{key}: disk full")));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FlakyKv {
    async fn get(&self, key: CollectionKey) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: CollectionKey, value: String) -> Result<(), StorageError> {
        self.check(key)?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: CollectionKey) -> Result<(), StorageError> {
        self.check(key)?;
        self.inner.remove(key).await
    }
}
