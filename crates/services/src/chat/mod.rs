mod feed;

use std::sync::Arc;

use prep_core::model::{BodyText, ChatMessage, ChatRoom, MessageId, RoomCategory, RoomId, User};
use storage::repository::ChatRepository;
use tracing::{info, warn};

use crate::Clock;
use crate::error::ModerationError;
use crate::moderation::{ModerationOutcome, can_moderate};

pub use feed::{ChatFeed, ChatSnapshot, DEFAULT_POLL_INTERVAL};

/// Rooms and messages, with role-gated room management and message deletion.
#[derive(Clone)]
pub struct ChatService {
    clock: Clock,
    chat: Arc<dyn ChatRepository>,
}

impl ChatService {
    #[must_use]
    pub fn new(clock: Clock, chat: Arc<dyn ChatRepository>) -> Self {
        Self { clock, chat }
    }

    #[must_use]
    pub fn repository(&self) -> Arc<dyn ChatRepository> {
        Arc::clone(&self.chat)
    }

    /// # Errors
    ///
    /// Returns `ModerationError::Storage` if rooms cannot be loaded.
    pub async fn rooms(&self) -> Result<Vec<ChatRoom>, ModerationError> {
        Ok(self.chat.rooms().await?)
    }

    /// Rooms whose name contains `term`, ignoring case. A blank term matches all.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError::Storage` if rooms cannot be loaded.
    pub async fn search_rooms(&self, term: &str) -> Result<Vec<ChatRoom>, ModerationError> {
        let mut rooms = self.chat.rooms().await?;
        rooms.retain(|r| r.matches(term));
        Ok(rooms)
    }

    /// Open a public group room. Staff only.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError::Room` for an invalid slug from staff and
    /// `ModerationError::Storage` if the slug is taken or storage fails.
    /// Non-staff are denied before the slug is looked at.
    pub async fn create_room(
        &self,
        actor: &User,
        slug: &str,
        name: &str,
        category: RoomCategory,
    ) -> Result<ModerationOutcome, ModerationError> {
        if !can_moderate(actor.role) {
            warn!(actor = %actor.id, room = slug, "room creation denied");
            return Ok(ModerationOutcome::Denied);
        }
        let id = RoomId::new(slug)?;
        let room = ChatRoom::public_group(id, name.trim(), category);
        self.chat.insert_room(&room).await?;
        info!(actor = %actor.id, room = %room.id, "room created");
        Ok(ModerationOutcome::Applied)
    }

    /// # Errors
    ///
    /// Returns `ModerationError::Storage` on persistence failures.
    pub async fn delete_room(
        &self,
        actor: &User,
        id: &RoomId,
    ) -> Result<ModerationOutcome, ModerationError> {
        if !can_moderate(actor.role) {
            warn!(actor = %actor.id, room = %id, "room deletion denied");
            return Ok(ModerationOutcome::Denied);
        }
        if self.chat.delete_room(id).await? {
            info!(actor = %actor.id, room = %id, "room deleted");
            Ok(ModerationOutcome::Applied)
        } else {
            Ok(ModerationOutcome::NotFound)
        }
    }

    /// # Errors
    ///
    /// Returns `ModerationError::Storage` if messages cannot be loaded.
    pub async fn messages(&self, room: &RoomId) -> Result<Vec<ChatMessage>, ModerationError> {
        Ok(self.chat.messages(room).await?)
    }

    /// Post a message to `room`. Any signed-in user may do this.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError::EmptyText` for blank input and
    /// `ModerationError::Storage` if the message cannot be stored.
    pub async fn send(
        &self,
        actor: &User,
        room: &RoomId,
        text: &str,
        image_url: Option<&str>,
    ) -> Result<ChatMessage, ModerationError> {
        let text = BodyText::parse(text)?;
        let mut message = ChatMessage::new(room.clone(), actor.id, &actor.name, text, self.clock.now());
        if let Some(url) = image_url.map(str::trim).filter(|u| !u.is_empty()) {
            message = message.with_image(url);
        }
        self.chat.append_message(&message).await?;
        info!(message = %message.id(), %room, author = %actor.id, "chat message sent");
        Ok(message)
    }

    /// # Errors
    ///
    /// Returns `ModerationError::Storage` on persistence failures.
    pub async fn delete_message(
        &self,
        actor: &User,
        id: MessageId,
    ) -> Result<ModerationOutcome, ModerationError> {
        if !can_moderate(actor.role) {
            warn!(actor = %actor.id, message = %id, "message deletion denied");
            return Ok(ModerationOutcome::Denied);
        }
        if self.chat.delete_message(id).await? {
            info!(actor = %actor.id, message = %id, "chat message deleted");
            Ok(ModerationOutcome::Applied)
        } else {
            Ok(ModerationOutcome::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::actor;
    use prep_core::model::Role;
    use prep_core::time::fixed_clock;
    use storage::repository::{Storage, StorageError};

    fn service() -> ChatService {
        ChatService::new(fixed_clock(), Storage::in_memory().chat)
    }

    #[tokio::test]
    async fn search_is_case_insensitive() {
        let chat = service();
        let hits = chat.search_rooms("POLÍCIA").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_str(), "pf");
        assert_eq!(chat.search_rooms("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn user_cannot_delete_messages() {
        let chat = service();
        let geral = RoomId::new("geral").unwrap();
        let user = actor(Role::User);
        let msg = chat.send(&user, &geral, " bom dia ", None).await.unwrap();
        assert_eq!(msg.text(), "bom dia");

        assert_eq!(
            chat.delete_message(&user, msg.id()).await.unwrap(),
            ModerationOutcome::Denied
        );
        assert_eq!(chat.messages(&geral).await.unwrap().len(), 1);

        let moderator = actor(Role::Moderator);
        assert!(chat.delete_message(&moderator, msg.id()).await.unwrap().is_applied());
        assert!(chat.messages(&geral).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn room_management_is_staff_only() {
        let chat = service();
        let outcome = chat
            .create_room(&actor(Role::User), "pc", "Polícia Civil", RoomCategory::Position)
            .await
            .unwrap();
        assert_eq!(outcome, ModerationOutcome::Denied);

        let admin = actor(Role::Admin);
        chat.create_room(&admin, "pc", "Polícia Civil", RoomCategory::Position)
            .await
            .unwrap();
        assert_eq!(chat.rooms().await.unwrap().len(), 4);

        let dup = chat
            .create_room(&admin, "pc", "Outra", RoomCategory::Open)
            .await
            .unwrap_err();
        assert!(matches!(dup, ModerationError::Storage(StorageError::Conflict)));

        let pc = RoomId::new("pc").unwrap();
        assert!(chat.delete_room(&admin, &pc).await.unwrap().is_applied());
        assert_eq!(
            chat.delete_room(&admin, &pc).await.unwrap(),
            ModerationOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn non_staff_are_denied_before_slug_validation() {
        let chat = service();
        let outcome = chat
            .create_room(&actor(Role::User), "sala geral", "Sala", RoomCategory::Open)
            .await
            .unwrap();
        assert_eq!(outcome, ModerationOutcome::Denied);
        assert_eq!(chat.rooms().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn blank_messages_and_bad_slugs_are_rejected() {
        let chat = service();
        let geral = RoomId::new("geral").unwrap();
        let err = chat.send(&actor(Role::User), &geral, "\n", None).await.unwrap_err();
        assert!(matches!(err, ModerationError::EmptyText));

        let err = chat
            .create_room(&actor(Role::Admin), "sala nova", "Sala", RoomCategory::Open)
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::Room(_)));
    }
}
