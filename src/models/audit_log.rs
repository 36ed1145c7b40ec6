//! Audit log model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::Validate;

use crate::engine::ThreatCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

/// Immutable audit entry. Only removed by the unlock risk reset.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditLogEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub query_text: String,
    pub severity: Severity,
    pub action_taken: String,
    pub routine_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub user_id: Uuid,
    pub query_text: String,
    pub severity: Severity,
    pub action_taken: String,
    pub routine_id: Option<i32>,
}

/// Audit entry joined with the routine that produced it
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditLogView {
    pub id: i64,
    pub user_id: Uuid,
    pub query_text: String,
    pub severity: Severity,
    pub action_taken: String,
    pub created_at: DateTime<Utc>,
    pub routine_name: Option<String>,
    pub threat_type: Option<ThreatCategory>,
}

/// Annotation keyed to an audit entry of a notify-admin routine
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SuspiciousActivity {
    pub id: i64,
    pub log_id: i64,
    pub user_id: Uuid,
    pub reason: String,
    pub flagged_at: DateTime<Utc>,
}

/// HIGH entry counts of one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub high_count: i64,
    pub recent_high_count: i64,
}

/// Body of `POST /api/v1/logs`
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQueryRequest {
    #[validate(required(message = "user_id is required"))]
    pub user_id: Option<Uuid>,
    #[validate(required(message = "query is required"), length(min = 1))]
    pub query: Option<String>,
    pub severity: Option<Severity>,
}

#[derive(Debug, Serialize)]
pub struct SubmitQueryResponse {
    pub log_id: i64,
    pub handler_routine: HandlerRoutineSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct HandlerRoutineSummary {
    pub name: String,
    pub threat_type: ThreatCategory,
    /// Raw classifier output, differs from `threat_type` for administrators
    pub classified_as: ThreatCategory,
    pub action: String,
    pub severity: Severity,
}
