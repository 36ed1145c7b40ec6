//! Store collaborator
//!
//! The engine sees the relational store only through these two traits:
//! `Store` for plain reads and for opening a transaction, `StoreTx` for
//! every write. A `StoreTx` that is dropped without `commit` rolls back.

pub mod postgres;
#[cfg(test)]
pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::engine::ThreatCategory;
use crate::models::{
    AuditLogEntry, AuditLogView, HandlerRoutine, NewAuditEntry, NewUser, Role,
    RoutineStats, SeverityCounts, UserAccount, UserStatus,
};

pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// ACTIVE user with its HIGH entry count, input of the batch scanner
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RiskCandidate {
    pub user_id: Uuid,
    pub role: Role,
    pub high_count: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    /// All users, oldest first
    async fn list_users(&self) -> StoreResult<Vec<UserAccount>>;

    /// HIGH counts per user in one aggregate query. Users without entries are absent.
    async fn severity_counts(
        &self,
        user_ids: &[Uuid],
        recent_since: DateTime<Utc>,
    ) -> StoreResult<HashMap<Uuid, SeverityCounts>>;

    /// Newest entries first
    async fn recent_logs(&self, limit: i64) -> StoreResult<Vec<AuditLogView>>;

    async fn list_routines(&self) -> StoreResult<Vec<HandlerRoutine>>;

    async fn routine_stats(&self) -> StoreResult<Vec<RoutineStats>>;
}

#[async_trait]
pub trait StoreTx: Send {
    /// Fetch a user and hold its row until the transaction ends
    async fn find_user(&mut self, id: Uuid) -> StoreResult<Option<UserAccount>>;

    /// First configured routine for the category
    async fn find_routine(&mut self, category: ThreatCategory) -> StoreResult<Option<HandlerRoutine>>;

    async fn insert_user(&mut self, user: NewUser) -> StoreResult<UserAccount>;

    /// Every ACTIVE user with its HIGH count, one aggregate pass
    async fn active_risk_candidates(&mut self) -> StoreResult<Vec<RiskCandidate>>;

    /// ACTIVE -> LOCKED only. Returns false when the user was not ACTIVE.
    async fn lock_if_active(&mut self, user_id: Uuid) -> StoreResult<bool>;

    /// Unconditional status write. Returns false when the user does not exist.
    async fn set_status(&mut self, user_id: Uuid, status: UserStatus) -> StoreResult<bool>;

    async fn insert_log(&mut self, entry: NewAuditEntry) -> StoreResult<AuditLogEntry>;

    async fn flag_suspicious(&mut self, log_id: i64, user_id: Uuid, reason: &str) -> StoreResult<()>;

    /// Delete the user's suspicious-activity annotations, then all of its
    /// audit entries. Returns the number of entries removed.
    async fn purge_user_logs(&mut self, user_id: Uuid) -> StoreResult<u64>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
