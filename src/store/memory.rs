//! In-memory store for tests
//!
//! A transaction owns the state mutex for its whole lifetime and edits a
//! private copy, so transactions serialise and an uncommitted copy is simply
//! dropped. Write failures can be injected to exercise rollback.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{RiskCandidate, Store, StoreError, StoreResult, StoreTx};
use crate::engine::ThreatCategory;
use crate::models::{
    default_catalog, AuditLogEntry, AuditLogView, HandlerRoutine, NewAuditEntry, NewUser, Role,
    RoutineStats, Severity, SeverityCounts, SuspiciousActivity, UserAccount, UserStatus,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: Vec<UserAccount>,
    logs: Vec<AuditLogEntry>,
    routines: Vec<HandlerRoutine>,
    suspicious: Vec<SuspiciousActivity>,
    next_log_id: i64,
    next_activity_id: i64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    /// Audit inserts allowed per transaction before the next one fails
    log_insert_budget: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the default routine catalog
    pub async fn with_default_catalog() -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock().await;
            for (idx, seed) in default_catalog().into_iter().enumerate() {
                state.routines.push(HandlerRoutine {
                    id: idx as i32 + 1,
                    routine_name: seed.routine_name.to_string(),
                    threat_type: seed.threat_type,
                    response_action: seed.response_action.to_string(),
                    severity: seed.severity,
                    description: Some(seed.description.to_string()),
                    auto_lock: seed.auto_lock,
                    notify_admin: seed.notify_admin,
                });
            }
        }
        store
    }

    /// Copy sharing the same state whose transactions fail after `budget` audit inserts
    pub fn failing_after_log_inserts(&self, budget: usize) -> Self {
        Self {
            state: self.state.clone(),
            log_insert_budget: Some(budget),
        }
    }

    pub async fn remove_routine(&self, category: ThreatCategory) {
        self.state.lock().await.routines.retain(|r| r.threat_type != category);
    }

    pub async fn seed_user(&self, username: &str, role: Role, status: UserStatus) -> Uuid {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let user = UserAccount {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: "$argon2id$test".to_string(),
            role,
            status,
            failed_login_attempts: 0,
            last_login: None,
            // keep listing order stable within one test
            created_at: now + Duration::microseconds(state.users.len() as i64),
            updated_at: now,
        };
        let id = user.id;
        state.users.push(user);
        id
    }

    pub async fn seed_log(&self, user_id: Uuid, severity: Severity, query_text: &str) -> i64 {
        self.seed_log_at(user_id, severity, query_text, Utc::now()).await
    }

    pub async fn seed_log_at(
        &self,
        user_id: Uuid,
        severity: Severity,
        query_text: &str,
        created_at: DateTime<Utc>,
    ) -> i64 {
        let mut state = self.state.lock().await;
        state.next_log_id += 1;
        let id = state.next_log_id;
        state.logs.push(AuditLogEntry {
            id,
            user_id,
            query_text: query_text.to_string(),
            severity,
            action_taken: "seeded".to_string(),
            routine_id: None,
            created_at,
        });
        id
    }

    pub async fn user(&self, id: Uuid) -> Option<UserAccount> {
        self.state.lock().await.users.iter().find(|u| u.id == id).cloned()
    }

    pub async fn logs_for(&self, user_id: Uuid) -> Vec<AuditLogEntry> {
        self.state
            .lock()
            .await
            .logs
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn suspicious_for(&self, user_id: Uuid) -> Vec<SuspiciousActivity> {
        self.state
            .lock()
            .await
            .suspicious
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            inserts_left: self.log_insert_budget,
        }))
    }

    async fn list_users(&self) -> StoreResult<Vec<UserAccount>> {
        let mut users = self.state.lock().await.users.clone();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn severity_counts(
        &self,
        user_ids: &[Uuid],
        recent_since: DateTime<Utc>,
    ) -> StoreResult<HashMap<Uuid, SeverityCounts>> {
        let state = self.state.lock().await;
        let mut counts: HashMap<Uuid, SeverityCounts> = HashMap::new();
        for log in state.logs.iter().filter(|l| user_ids.contains(&l.user_id)) {
            let entry = counts.entry(log.user_id).or_default();
            if log.severity == Severity::High {
                entry.high_count += 1;
                if log.created_at >= recent_since {
                    entry.recent_high_count += 1;
                }
            }
        }
        Ok(counts)
    }

    async fn recent_logs(&self, limit: i64) -> StoreResult<Vec<AuditLogView>> {
        let state = self.state.lock().await;
        let mut logs: Vec<AuditLogView> = state
            .logs
            .iter()
            .map(|l| {
                let routine = l
                    .routine_id
                    .and_then(|id| state.routines.iter().find(|r| r.id == id));
                AuditLogView {
                    id: l.id,
                    user_id: l.user_id,
                    query_text: l.query_text.clone(),
                    severity: l.severity,
                    action_taken: l.action_taken.clone(),
                    created_at: l.created_at,
                    routine_name: routine.map(|r| r.routine_name.clone()),
                    threat_type: routine.map(|r| r.threat_type),
                }
            })
            .collect();
        logs.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        logs.truncate(limit.max(0) as usize);
        Ok(logs)
    }

    async fn list_routines(&self) -> StoreResult<Vec<HandlerRoutine>> {
        let mut routines = self.state.lock().await.routines.clone();
        routines.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.routine_name.cmp(&b.routine_name))
        });
        Ok(routines)
    }

    async fn routine_stats(&self) -> StoreResult<Vec<RoutineStats>> {
        let state = self.state.lock().await;
        let mut stats: Vec<RoutineStats> = state
            .routines
            .iter()
            .map(|r| RoutineStats {
                routine_id: r.id,
                routine_name: r.routine_name.clone(),
                threat_type: r.threat_type,
                severity: r.severity,
                usage_count: state
                    .logs
                    .iter()
                    .filter(|l| l.routine_id == Some(r.id))
                    .count() as i64,
            })
            .collect();
        stats.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.routine_name.cmp(&b.routine_name))
        });
        Ok(stats)
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    inserts_left: Option<usize>,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_user(&mut self, id: Uuid) -> StoreResult<Option<UserAccount>> {
        Ok(self.working.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_routine(&mut self, category: ThreatCategory) -> StoreResult<Option<HandlerRoutine>> {
        Ok(self
            .working
            .routines
            .iter()
            .filter(|r| r.threat_type == category)
            .min_by_key(|r| r.id)
            .cloned())
    }

    async fn insert_user(&mut self, user: NewUser) -> StoreResult<UserAccount> {
        if self.working.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation(format!(
                "username {} already exists",
                user.username
            )));
        }
        let now = Utc::now();
        let account = UserAccount {
            id: Uuid::new_v4(),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            status: UserStatus::Active,
            failed_login_attempts: 0,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        self.working.users.push(account.clone());
        Ok(account)
    }

    async fn active_risk_candidates(&mut self) -> StoreResult<Vec<RiskCandidate>> {
        let mut users: Vec<&UserAccount> = self
            .working
            .users
            .iter()
            .filter(|u| u.status == UserStatus::Active)
            .collect();
        users.sort_by_key(|u| (u.created_at, u.id));

        Ok(users
            .into_iter()
            .map(|u| RiskCandidate {
                user_id: u.id,
                role: u.role,
                high_count: self
                    .working
                    .logs
                    .iter()
                    .filter(|l| l.user_id == u.id && l.severity == Severity::High)
                    .count() as i64,
            })
            .collect())
    }

    async fn lock_if_active(&mut self, user_id: Uuid) -> StoreResult<bool> {
        match self
            .working
            .users
            .iter_mut()
            .find(|u| u.id == user_id && u.status == UserStatus::Active)
        {
            Some(user) => {
                user.status = UserStatus::Locked;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_status(&mut self, user_id: Uuid, status: UserStatus) -> StoreResult<bool> {
        match self.working.users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.status = status;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_log(&mut self, entry: NewAuditEntry) -> StoreResult<AuditLogEntry> {
        if let Some(left) = self.inserts_left.as_mut() {
            if *left == 0 {
                return Err(StoreError::Backend("injected audit insert failure".to_string()));
            }
            *left -= 1;
        }

        self.working.next_log_id += 1;
        let entry = AuditLogEntry {
            id: self.working.next_log_id,
            user_id: entry.user_id,
            query_text: entry.query_text,
            severity: entry.severity,
            action_taken: entry.action_taken,
            routine_id: entry.routine_id,
            created_at: Utc::now(),
        };
        self.working.logs.push(entry.clone());
        Ok(entry)
    }

    async fn flag_suspicious(&mut self, log_id: i64, user_id: Uuid, reason: &str) -> StoreResult<()> {
        self.working.next_activity_id += 1;
        let id = self.working.next_activity_id;
        self.working.suspicious.push(SuspiciousActivity {
            id,
            log_id,
            user_id,
            reason: reason.to_string(),
            flagged_at: Utc::now(),
        });
        Ok(())
    }

    async fn purge_user_logs(&mut self, user_id: Uuid) -> StoreResult<u64> {
        let log_ids: Vec<i64> = self
            .working
            .logs
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.id)
            .collect();
        self.working.suspicious.retain(|s| !log_ids.contains(&s.log_id));
        self.working.logs.retain(|l| l.user_id != user_id);
        Ok(log_ids.len() as u64)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, working, .. } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
