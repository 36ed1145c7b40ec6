//! PostgreSQL store backed by an sqlx pool

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{RiskCandidate, Store, StoreError, StoreResult, StoreTx};
use crate::engine::ThreatCategory;
use crate::models::{
    AuditLogEntry, AuditLogView, HandlerRoutine, NewAuditEntry, NewUser, RoutineStats,
    SeverityCounts, UserAccount, UserStatus,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map unique violations to their own variant so the API can answer 409
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::UniqueViolation(db.message().to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTx { tx }))
    }

    async fn list_users(&self) -> StoreResult<Vec<UserAccount>> {
        let users = sqlx::query_as::<_, UserAccount>(
            "SELECT * FROM user_accounts ORDER BY created_at, id"
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn severity_counts(
        &self,
        user_ids: &[Uuid],
        recent_since: DateTime<Utc>,
    ) -> StoreResult<HashMap<Uuid, SeverityCounts>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, i64, i64)>(
            r#"
            SELECT user_id,
                   COUNT(*) FILTER (WHERE severity = 'HIGH') AS high_count,
                   COUNT(*) FILTER (WHERE severity = 'HIGH' AND created_at >= $2) AS recent_high_count
            FROM audit_log
            WHERE user_id = ANY($1)
            GROUP BY user_id
            "#
        )
        .bind(user_ids)
        .bind(recent_since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, high_count, recent_high_count)| {
                (user_id, SeverityCounts { high_count, recent_high_count })
            })
            .collect())
    }

    async fn recent_logs(&self, limit: i64) -> StoreResult<Vec<AuditLogView>> {
        let logs = sqlx::query_as::<_, AuditLogView>(
            r#"
            SELECT al.id, al.user_id, al.query_text, al.severity, al.action_taken,
                   al.created_at, hr.routine_name, hr.threat_type
            FROM audit_log al
            LEFT JOIN handler_routines hr ON al.routine_id = hr.id
            ORDER BY al.created_at DESC, al.id DESC
            LIMIT $1
            "#
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    async fn list_routines(&self) -> StoreResult<Vec<HandlerRoutine>> {
        let routines = sqlx::query_as::<_, HandlerRoutine>(
            r#"
            SELECT * FROM handler_routines
            ORDER BY CASE severity WHEN 'HIGH' THEN 3 WHEN 'MEDIUM' THEN 2 ELSE 1 END DESC,
                     routine_name
            "#
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(routines)
    }

    async fn routine_stats(&self) -> StoreResult<Vec<RoutineStats>> {
        let stats = sqlx::query_as::<_, RoutineStats>(
            r#"
            SELECT hr.id AS routine_id, hr.routine_name, hr.threat_type, hr.severity,
                   COUNT(al.id) AS usage_count
            FROM handler_routines hr
            LEFT JOIN audit_log al ON al.routine_id = hr.id
            GROUP BY hr.id, hr.routine_name, hr.threat_type, hr.severity
            ORDER BY usage_count DESC, hr.routine_name
            "#
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }
}

pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn find_user(&mut self, id: Uuid) -> StoreResult<Option<UserAccount>> {
        let user = sqlx::query_as::<_, UserAccount>(
            "SELECT * FROM user_accounts WHERE id = $1 FOR UPDATE"
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(user)
    }

    async fn find_routine(&mut self, category: ThreatCategory) -> StoreResult<Option<HandlerRoutine>> {
        let routine = sqlx::query_as::<_, HandlerRoutine>(
            "SELECT * FROM handler_routines WHERE threat_type = $1 ORDER BY id LIMIT 1"
        )
        .bind(category)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(routine)
    }

    async fn insert_user(&mut self, user: NewUser) -> StoreResult<UserAccount> {
        sqlx::query_as::<_, UserAccount>(
            r#"
            INSERT INTO user_accounts (username, password_hash, role, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(UserStatus::Active)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)
    }

    async fn active_risk_candidates(&mut self) -> StoreResult<Vec<RiskCandidate>> {
        let candidates = sqlx::query_as::<_, RiskCandidate>(
            r#"
            SELECT u.id AS user_id, u.role,
                   COUNT(al.id) FILTER (WHERE al.severity = 'HIGH') AS high_count
            FROM user_accounts u
            LEFT JOIN audit_log al ON al.user_id = u.id
            WHERE u.status = 'ACTIVE'
            GROUP BY u.id, u.role
            ORDER BY u.created_at, u.id
            "#
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(candidates)
    }

    async fn lock_if_active(&mut self, user_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE user_accounts SET status = $2, updated_at = NOW() WHERE id = $1 AND status = $3"
        )
        .bind(user_id)
        .bind(UserStatus::Locked)
        .bind(UserStatus::Active)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_status(&mut self, user_id: Uuid, status: UserStatus) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE user_accounts SET status = $2, updated_at = NOW() WHERE id = $1"
        )
        .bind(user_id)
        .bind(status)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_log(&mut self, entry: NewAuditEntry) -> StoreResult<AuditLogEntry> {
        let entry = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            INSERT INTO audit_log (user_id, query_text, severity, action_taken, routine_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#
        )
        .bind(entry.user_id)
        .bind(&entry.query_text)
        .bind(entry.severity)
        .bind(&entry.action_taken)
        .bind(entry.routine_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(entry)
    }

    async fn flag_suspicious(&mut self, log_id: i64, user_id: Uuid, reason: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO suspicious_activity (log_id, user_id, reason) VALUES ($1, $2, $3)"
        )
        .bind(log_id)
        .bind(user_id)
        .bind(reason)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn purge_user_logs(&mut self, user_id: Uuid) -> StoreResult<u64> {
        sqlx::query(
            r#"
            DELETE FROM suspicious_activity
            WHERE log_id IN (SELECT id FROM audit_log WHERE user_id = $1)
            "#
        )
        .bind(user_id)
        .execute(&mut *self.tx)
        .await?;

        let result = sqlx::query("DELETE FROM audit_log WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
