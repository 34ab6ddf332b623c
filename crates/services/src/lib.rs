#![forbid(unsafe_code)]

pub mod admin_service;
pub mod app_services;
pub mod attempt_recorder;
pub mod catalog_service;
pub mod chat;
pub mod error;
pub mod ingestion;
pub mod moderation;
pub mod navigation;
pub mod notification_service;
pub mod question_bank;
pub mod stats;
pub mod store_service;

#[cfg(test)]
mod test_support;

pub use prep_core::Clock;

pub use admin_service::AdminService;
pub use app_services::AppServices;
pub use attempt_recorder::AttemptRecorder;
pub use catalog_service::CatalogService;
pub use chat::{ChatFeed, ChatService, ChatSnapshot};
pub use error::{
    AdminError, AppServicesError, BankError, ExtractorError, IngestionError, ModerationError,
    SessionError, StatsError, StatusFilterError, StoreError,
};
pub use ingestion::{DisabledExtractor, IngestionService, PdfImport, QuestionExtractor};
pub use moderation::{CommentService, ModerationOutcome};
pub use navigation::{Route, RouteOutcome};
pub use notification_service::NotificationService;
pub use question_bank::{QuestionBankService, QuestionFilter, QuestionSession, StatusFilter};
pub use stats::{PerformanceSummary, StatsService, StudentReport};
pub use store_service::{Product, Receipt, StoreService};
