mod admin_log;
mod attempt;
mod catalog;
mod chat;
mod comment;
mod ids;
mod import;
mod letter;
mod notification;
mod question;
mod text;
mod user;

pub use admin_log::{AdminAction, AdminLog};
pub use attempt::Attempt;
pub use catalog::{CatalogError, PdfMaterial, Price, VideoLesson};
pub use chat::{ChatMessage, ChatRoom, Privacy, RoomCategory, RoomKind};
pub use comment::{Comment, order_for_display};
pub use ids::{
    AttemptId, BatchId, CommentId, LogId, MaterialId, MessageId, NotificationId, ParseIdError,
    QuestionId, RoomId, UserId, VideoId,
};
pub use import::{ImportBatch, ImportSource, ImportStatus};
pub use letter::{Letter, LetterError};
pub use notification::{Notification, NotificationKind};
pub use question::{Alternative, Question, QuestionDraft, QuestionError, QuestionMeta};
pub use text::{BodyText, MAX_TEXT_CHARS, TextError};
pub use user::{Role, RoleError, User};
