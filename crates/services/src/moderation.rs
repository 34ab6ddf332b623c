use std::sync::Arc;

use prep_core::model::{BodyText, Comment, CommentId, QuestionId, Role, User, order_for_display};
use storage::repository::CommentRepository;
use tracing::{info, warn};

use crate::Clock;
use crate::error::ModerationError;

//
// ─── CAPABILITIES ──────────────────────────────────────────────────────────────
//

/// Whether `role` may pin or delete discussion entries and chat messages.
#[must_use]
pub fn can_moderate(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Moderator)
}

/// Whether `role` may reach the back-office.
#[must_use]
pub fn can_administer(role: Role) -> bool {
    matches!(role, Role::Admin)
}

/// Result of a privileged mutation.
///
/// A denied action leaves the target untouched and is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationOutcome {
    Applied,
    Denied,
    NotFound,
}

impl ModerationOutcome {
    #[must_use]
    pub fn is_applied(self) -> bool {
        matches!(self, ModerationOutcome::Applied)
    }
}

//
// ─── COMMENTS ──────────────────────────────────────────────────────────────────
//

/// Per-question discussion with role-gated pin and delete.
#[derive(Clone)]
pub struct CommentService {
    clock: Clock,
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    #[must_use]
    pub fn new(clock: Clock, comments: Arc<dyn CommentRepository>) -> Self {
        Self { clock, comments }
    }

    /// Comments on `question`, pinned first and otherwise in posting order.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError::Storage` if comments cannot be loaded.
    pub async fn list(&self, question: QuestionId) -> Result<Vec<Comment>, ModerationError> {
        let mut comments = self.comments.comments_for(question).await?;
        order_for_display(&mut comments);
        Ok(comments)
    }

    /// Post a comment. Any signed-in user may do this.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError::EmptyText` for blank input and
    /// `ModerationError::Storage` if the comment cannot be stored.
    pub async fn post(
        &self,
        actor: &User,
        question: QuestionId,
        text: &str,
    ) -> Result<Comment, ModerationError> {
        let text = BodyText::parse(text)?;
        let comment = Comment::new(question, actor.id, &actor.name, text, self.clock.now());
        self.comments.append_comment(&comment).await?;
        info!(comment = %comment.id(), %question, author = %actor.id, "comment posted");
        Ok(comment)
    }

    /// Pin a comment. Pinning an already pinned comment keeps it pinned.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError::Storage` on persistence failures.
    pub async fn pin(&self, actor: &User, id: CommentId) -> Result<ModerationOutcome, ModerationError> {
        self.set_pinned(actor, id, Some(true)).await
    }

    /// # Errors
    ///
    /// Returns `ModerationError::Storage` on persistence failures.
    pub async fn unpin(
        &self,
        actor: &User,
        id: CommentId,
    ) -> Result<ModerationOutcome, ModerationError> {
        self.set_pinned(actor, id, Some(false)).await
    }

    /// Flip the pin flag.
    ///
    /// # Errors
    ///
    /// Returns `ModerationError::Storage` on persistence failures.
    pub async fn toggle_pin(
        &self,
        actor: &User,
        id: CommentId,
    ) -> Result<ModerationOutcome, ModerationError> {
        self.set_pinned(actor, id, None).await
    }

    async fn set_pinned(
        &self,
        actor: &User,
        id: CommentId,
        pinned: Option<bool>,
    ) -> Result<ModerationOutcome, ModerationError> {
        if !can_moderate(actor.role) {
            warn!(actor = %actor.id, role = %actor.role, comment = %id, "pin denied");
            return Ok(ModerationOutcome::Denied);
        }
        let Some(current) = self.comments.get_comment(id).await? else {
            return Ok(ModerationOutcome::NotFound);
        };
        let target = pinned.unwrap_or(!current.is_pinned());
        match self.comments.set_comment_pinned(id, target).await? {
            Some(_) => {
                info!(actor = %actor.id, comment = %id, pinned = target, "comment pin updated");
                Ok(ModerationOutcome::Applied)
            }
            None => Ok(ModerationOutcome::NotFound),
        }
    }

    /// # Errors
    ///
    /// Returns `ModerationError::Storage` on persistence failures.
    pub async fn delete(
        &self,
        actor: &User,
        id: CommentId,
    ) -> Result<ModerationOutcome, ModerationError> {
        if !can_moderate(actor.role) {
            warn!(actor = %actor.id, role = %actor.role, comment = %id, "delete denied");
            return Ok(ModerationOutcome::Denied);
        }
        if self.comments.delete_comment(id).await? {
            info!(actor = %actor.id, comment = %id, "comment deleted");
            Ok(ModerationOutcome::Applied)
        } else {
            Ok(ModerationOutcome::NotFound)
        }
    }
}
