use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::{LogId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminAction {
    ImportCsv,
    ImportPdf,
    DeleteBatch,
    CreateQuestion,
    DeleteQuestion,
    AddVideo,
    DeleteVideo,
    AddMaterial,
    DeleteMaterial,
    ChangeRole,
    BanUser,
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdminAction::ImportCsv => "IMPORT_CSV",
            AdminAction::ImportPdf => "IMPORT_PDF",
            AdminAction::DeleteBatch => "DELETE_BATCH",
            AdminAction::CreateQuestion => "CREATE_QUESTION",
            AdminAction::DeleteQuestion => "DELETE_QUESTION",
            AdminAction::AddVideo => "ADD_VIDEO",
            AdminAction::DeleteVideo => "DELETE_VIDEO",
            AdminAction::AddMaterial => "ADD_MATERIAL",
            AdminAction::DeleteMaterial => "DELETE_MATERIAL",
            AdminAction::ChangeRole => "CHANGE_ROLE",
            AdminAction::BanUser => "BAN_USER",
        };
        f.write_str(s)
    }
}

/// Audit entry for a back-office action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminLog {
    pub id: LogId,
    pub actor: UserId,
    pub action: AdminAction,
    pub details: String,
    pub logged_at: DateTime<Utc>,
}

impl AdminLog {
    #[must_use]
    pub fn new(
        actor: UserId,
        action: AdminAction,
        details: impl Into<String>,
        logged_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LogId::generate(),
            actor,
            action,
            details: details.into(),
            logged_at,
        }
    }
}
