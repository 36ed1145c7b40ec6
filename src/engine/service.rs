//! Threat engine service
//!
//! Entry points used by the HTTP handlers. Every write path opens one store
//! transaction, runs the engine step inside it and commits only on success;
//! any error rolls the whole unit back.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use super::classifier::classify;
use super::error::{EngineError, EngineResult};
use super::lock::{self, UnlockOutcome};
use super::resolver::resolve;
use super::risk::RiskPolicy;
use super::rules::RECENT_HIGH_WINDOW_MINUTES;
use super::scanner::scan_and_lock;
use super::types::{LockTrigger, ThreatCategory};
use crate::models::{
    AuditLogEntry, AuditLogView, HandlerRoutine, HandlerRoutineSummary, NewAuditEntry, NewUser,
    RoutineStats, Severity, UserAccount, UserRiskView,
};
use crate::store::{Store, StoreTx};

/// Query event to classify and log
#[derive(Debug, Clone)]
pub struct QuerySubmission {
    pub user_id: Uuid,
    pub query: String,
    pub severity_override: Option<Severity>,
}

/// Outcome of `submit_query`
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub log_id: i64,
    pub routine: HandlerRoutineSummary,
}

pub struct ThreatEngine {
    store: Arc<dyn Store>,
    policy: RiskPolicy,
}

/// Commit on success, roll back on failure
async fn finish<T>(tx: Box<dyn StoreTx>, result: EngineResult<T>) -> EngineResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

impl ThreatEngine {
    pub fn new(store: Arc<dyn Store>, policy: RiskPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Classify a query, resolve its routine and write the audit entry
    pub async fn submit_query(&self, submission: QuerySubmission) -> EngineResult<QueryOutcome> {
        if submission.query.is_empty() {
            return Err(EngineError::Validation("query is required".to_string()));
        }

        let mut tx = self.store.begin().await?;
        let result = Self::record_query(tx.as_mut(), submission).await;
        finish(tx, result).await
    }

    async fn record_query(
        tx: &mut dyn StoreTx,
        submission: QuerySubmission,
    ) -> EngineResult<QueryOutcome> {
        let user = tx
            .find_user(submission.user_id)
            .await?
            .ok_or(EngineError::UserNotFound(submission.user_id))?;

        let classified = classify(Some(submission.query.as_str()));
        let routine = resolve(tx, classified, user.role).await?;
        let severity = submission.severity_override.unwrap_or(routine.severity);

        let entry = tx
            .insert_log(NewAuditEntry {
                user_id: user.id,
                query_text: submission.query,
                severity,
                action_taken: routine.response_action.clone(),
                routine_id: Some(routine.id),
            })
            .await?;

        if routine.notify_admin {
            let reason = format!("{} matched {}", classified, routine.routine_name);
            tx.flag_suspicious(entry.id, user.id, &reason).await?;
            tracing::warn!(
                user_id = %user.id,
                log_id = entry.id,
                category = %classified,
                routine = %routine.routine_name,
                "Suspicious query flagged for administrator review"
            );
        }

        tracing::debug!(
            user_id = %user.id,
            category = %classified,
            severity = severity.as_str(),
            "Query classified"
        );

        Ok(QueryOutcome {
            log_id: entry.id,
            routine: HandlerRoutineSummary {
                name: routine.routine_name,
                threat_type: routine.threat_type,
                classified_as: classified,
                action: routine.response_action,
                severity,
            },
        })
    }

    /// Recompute risk for every ACTIVE user and apply pending auto-locks
    pub async fn reconcile_risk(&self) -> EngineResult<Vec<Uuid>> {
        self.scan(LockTrigger::Reconcile).await
    }

    /// Explicit batch lock of every user over the threshold
    pub async fn batch_lock_high_risk(&self) -> EngineResult<Vec<Uuid>> {
        self.scan(LockTrigger::BatchScan).await
    }

    async fn scan(&self, trigger: LockTrigger) -> EngineResult<Vec<Uuid>> {
        let mut tx = self.store.begin().await?;
        let result = scan_and_lock(tx.as_mut(), &self.policy, trigger).await;
        finish(tx, result).await
    }

    /// Users with their risk columns, read-only
    pub async fn list_users(&self) -> EngineResult<Vec<UserRiskView>> {
        let users = self.store.list_users().await?;
        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let recent_since = Utc::now() - Duration::minutes(RECENT_HIGH_WINDOW_MINUTES);
        let counts = self.store.severity_counts(&ids, recent_since).await?;

        let assessments = self.policy.assess_all(&users, &counts);

        Ok(users
            .into_iter()
            .zip(assessments)
            .map(|(user, (_, assessment))| {
                let c = counts.get(&user.id).copied().unwrap_or_default();
                UserRiskView {
                    high_severity_count: c.high_count,
                    recent_high_count: c.recent_high_count,
                    risk_score: assessment.risk_score,
                    should_auto_lock: assessment.should_auto_lock,
                    auto_locked: false,
                    user,
                }
            })
            .collect())
    }

    /// `reconcile_risk` then `list_users`, so the listing never shows stale lock status
    pub async fn list_users_with_risk(&self) -> EngineResult<Vec<UserRiskView>> {
        let locked: HashSet<Uuid> = self.reconcile_risk().await?.into_iter().collect();

        let mut views = self.list_users().await?;
        for view in &mut views {
            view.auto_locked = locked.contains(&view.user.id);
        }
        Ok(views)
    }

    pub async fn manual_lock(&self, user_id: Uuid) -> EngineResult<AuditLogEntry> {
        let mut tx = self.store.begin().await?;
        let result = lock::manual_lock(tx.as_mut(), user_id).await;
        finish(tx, result).await
    }

    pub async fn manual_unlock(&self, user_id: Uuid) -> EngineResult<UnlockOutcome> {
        let mut tx = self.store.begin().await?;
        let result = lock::manual_unlock(tx.as_mut(), user_id).await;
        finish(tx, result).await
    }

    /// Create an ACTIVE account from an already digested password
    pub async fn register_user(&self, user: NewUser) -> EngineResult<UserAccount> {
        let mut tx = self.store.begin().await?;
        let result = tx.insert_user(user).await.map_err(EngineError::from);
        let account = finish(tx, result).await?;
        tracing::info!(user_id = %account.id, role = account.role.as_str(), "User account created");
        Ok(account)
    }

    pub async fn recent_logs(&self, limit: i64) -> EngineResult<Vec<AuditLogView>> {
        Ok(self.store.recent_logs(limit).await?)
    }

    pub async fn routines(&self) -> EngineResult<Vec<HandlerRoutine>> {
        Ok(self.store.list_routines().await?)
    }

    pub async fn routine_stats(&self) -> EngineResult<Vec<RoutineStats>> {
        Ok(self.store.routine_stats().await?)
    }

    /// Categories of the catalog that have no routine configured
    pub async fn missing_routines(&self) -> EngineResult<Vec<ThreatCategory>> {
        let configured: HashSet<ThreatCategory> =
            self.routines().await?.into_iter().map(|r| r.threat_type).collect();
        Ok(ThreatCategory::ALL
            .into_iter()
            .filter(|c| !configured.contains(c))
            .collect())
    }
}
