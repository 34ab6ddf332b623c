use std::sync::Arc;

use prep_core::model::{Notification, NotificationId, NotificationKind, UserId};
use storage::repository::{NotificationRepository, StorageError};
use tracing::debug;

use crate::Clock;

/// Per-user inbox. Nothing in the portal raises notifications on its own;
/// callers push them with `notify`.
#[derive(Clone)]
pub struct NotificationService {
    clock: Clock,
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    #[must_use]
    pub fn new(clock: Clock, notifications: Arc<dyn NotificationRepository>) -> Self {
        Self {
            clock,
            notifications,
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the notification cannot be stored.
    pub async fn notify(
        &self,
        user: UserId,
        kind: NotificationKind,
        content: &str,
    ) -> Result<Notification, StorageError> {
        let notification = Notification::unread(user, kind, content.trim(), self.clock.now());
        self.notifications.append_notification(&notification).await?;
        debug!(%user, id = %notification.id, "notification queued");
        Ok(notification)
    }

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    pub async fn inbox(&self, user: UserId) -> Result<Vec<Notification>, StorageError> {
        let mut items = self.notifications.notifications_for(user).await?;
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be read.
    pub async fn unread_count(&self, user: UserId) -> Result<usize, StorageError> {
        let items = self.notifications.notifications_for(user).await?;
        Ok(items.iter().filter(|n| !n.read).count())
    }

    /// Returns `false` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the collection cannot be written.
    pub async fn mark_read(&self, id: NotificationId) -> Result<bool, StorageError> {
        self.notifications.mark_read(id).await
    }
}
