use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{MessageId, RoomId, UserId};
use crate::model::text::BodyText;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomKind {
    Direct,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomCategory {
    /// Rooms for candidates aiming at the same position.
    Position,
    Discipline,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Privacy {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: RoomId,
    pub name: String,
    pub kind: RoomKind,
    #[serde(default)]
    pub category: Option<RoomCategory>,
    #[serde(default)]
    pub members: Vec<UserId>,
    pub privacy: Privacy,
}

impl ChatRoom {
    #[must_use]
    pub fn public_group(id: RoomId, name: impl Into<String>, category: RoomCategory) -> Self {
        Self {
            id,
            name: name.into(),
            kind: RoomKind::Group,
            category: Some(category),
            members: Vec::new(),
            privacy: Privacy::Public,
        }
    }

    /// Case-insensitive substring match on the room name.
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.trim().to_lowercase())
    }
}

/// Entry in a chat room. Append-only except for privileged deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    id: MessageId,
    room_id: RoomId,
    author_id: UserId,
    author_name: String,
    text: BodyText,
    #[serde(default)]
    image_url: Option<String>,
    sent_at: DateTime<Utc>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(
        room_id: RoomId,
        author_id: UserId,
        author_name: impl Into<String>,
        text: BodyText,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            room_id,
            author_id,
            author_name: author_name.into(),
            text,
            image_url: None,
            sent_at,
        }
    }

    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> MessageId {
        self.id
    }

    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    #[must_use]
    pub fn author_id(&self) -> UserId {
        self.author_id
    }

    #[must_use]
    pub fn author_name(&self) -> &str {
        &self.author_name
    }

    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    #[must_use]
    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_search_ignores_case() {
        let room = ChatRoom::public_group(
            RoomId::new("pf").unwrap(),
            "Polícia Federal",
            RoomCategory::Position,
        );
        assert!(room.matches("polícia"));
        assert!(room.matches("  FEDERAL "));
        assert!(!room.matches("civil"));
    }
}
