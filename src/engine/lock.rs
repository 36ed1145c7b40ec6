//! Lock state machine
//!
//! ```text
//!            auto-lock (conditional) / manual lock
//!   ACTIVE ─────────────────────────────────────────▶ LOCKED
//!      ▲                                                 │
//!      └──────────── manual unlock (purge + LOW) ◀───────┘
//! ```
//!
//! Every function runs inside the caller's transaction. Each LOCKED
//! transition writes exactly one HIGH entry; unlock purges the user's
//! history first and then writes one LOW entry so the new entry survives.

use uuid::Uuid;

use super::error::{EngineError, EngineResult};
use super::resolver::system_routine_id;
use super::types::{LockTrigger, ThreatCategory};
use crate::models::{AuditLogEntry, NewAuditEntry, Severity, UserStatus};
use crate::store::StoreTx;

pub const AUTO_LOCK_ACTION: &str = "Account auto-locked";
pub const MANUAL_LOCK_TEXT: &str = "MANUAL LOCK";
pub const MANUAL_LOCK_ACTION: &str = "Account locked by admin";
pub const MANUAL_UNLOCK_TEXT: &str = "MANUAL UNLOCK - risk reset";
pub const MANUAL_UNLOCK_ACTION: &str = "Account unlocked by admin";

/// Result of a manual unlock
#[derive(Debug, Clone)]
pub struct UnlockOutcome {
    pub purged_entries: u64,
    pub entry: AuditLogEntry,
}

/// ACTIVE -> LOCKED driven by the risk policy.
///
/// Returns `None` when the user was no longer ACTIVE; in that case nothing
/// is written, so a racing second lock attempt produces no extra entry.
pub async fn auto_lock(
    tx: &mut dyn StoreTx,
    user_id: Uuid,
    trigger: LockTrigger,
    risk_score: u32,
    high_count: i64,
    routine_id: Option<i32>,
) -> EngineResult<Option<AuditLogEntry>> {
    if !tx.lock_if_active(user_id).await? {
        tracing::debug!(user_id = %user_id, "Auto-lock skipped, user no longer active");
        return Ok(None);
    }

    let entry = tx
        .insert_log(NewAuditEntry {
            user_id,
            query_text: trigger.describe(risk_score, high_count),
            severity: Severity::High,
            action_taken: AUTO_LOCK_ACTION.to_string(),
            routine_id,
        })
        .await?;

    tracing::warn!(user_id = %user_id, risk_score, high_count, "Account auto-locked");
    Ok(Some(entry))
}

/// Administrator lock. A user that is already LOCKED is tolerated.
pub async fn manual_lock(tx: &mut dyn StoreTx, user_id: Uuid) -> EngineResult<AuditLogEntry> {
    tx.find_user(user_id)
        .await?
        .ok_or(EngineError::UserNotFound(user_id))?;

    tx.set_status(user_id, UserStatus::Locked).await?;

    let routine_id = system_routine_id(tx, ThreatCategory::ManualLock).await?;
    let entry = tx
        .insert_log(NewAuditEntry {
            user_id,
            query_text: MANUAL_LOCK_TEXT.to_string(),
            severity: Severity::High,
            action_taken: MANUAL_LOCK_ACTION.to_string(),
            routine_id,
        })
        .await?;

    tracing::info!(user_id = %user_id, "Account locked by admin");
    Ok(entry)
}

/// Administrator unlock with risk reset
pub async fn manual_unlock(tx: &mut dyn StoreTx, user_id: Uuid) -> EngineResult<UnlockOutcome> {
    tx.find_user(user_id)
        .await?
        .ok_or(EngineError::UserNotFound(user_id))?;

    // purge before the new entry is written
    let purged_entries = tx.purge_user_logs(user_id).await?;
    tx.set_status(user_id, UserStatus::Active).await?;

    let routine_id = system_routine_id(tx, ThreatCategory::ManualUnlock).await?;
    let entry = tx
        .insert_log(NewAuditEntry {
            user_id,
            query_text: MANUAL_UNLOCK_TEXT.to_string(),
            severity: Severity::Low,
            action_taken: MANUAL_UNLOCK_ACTION.to_string(),
            routine_id,
        })
        .await?;

    tracing::info!(user_id = %user_id, purged_entries, "Account unlocked by admin, risk reset");
    Ok(UnlockOutcome {
        purged_entries,
        entry,
    })
}
