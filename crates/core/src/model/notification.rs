use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{NotificationId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Comment,
    Pdf,
    Video,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub fn unread(
        user_id: UserId,
        kind: NotificationKind,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::generate(),
            user_id,
            kind,
            content: content.into(),
            read: false,
            created_at,
        }
    }
}
