use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{CommentId, QuestionId, UserId};
use crate::model::text::BodyText;

/// Discussion entry attached to a question.
///
/// Only the pin flag changes after creation; everything else is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    id: CommentId,
    question_id: QuestionId,
    author_id: UserId,
    author_name: String,
    text: BodyText,
    pinned: bool,
    posted_at: DateTime<Utc>,
}

impl Comment {
    #[must_use]
    pub fn new(
        question_id: QuestionId,
        author_id: UserId,
        author_name: impl Into<String>,
        text: BodyText,
        posted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CommentId::generate(),
            question_id,
            author_id,
            author_name: author_name.into(),
            text,
            pinned: false,
            posted_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> CommentId {
        self.id
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
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
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    #[must_use]
    pub fn posted_at(&self) -> DateTime<Utc> {
        self.posted_at
    }

    pub fn set_pinned(&mut self, pinned: bool) {
        self.pinned = pinned;
    }
}

/// Orders comments for display: pinned first, insertion order otherwise.
///
/// `sort_by_key` is stable, so entries with the same flag keep their relative order.
pub fn order_for_display(comments: &mut [Comment]) {
    comments.sort_by_key(|c| !c.is_pinned());
}
