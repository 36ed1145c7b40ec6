//! Batch scanner
//!
//! One aggregate pass over ACTIVE users, then the auto-lock transition for
//! every user that reaches the threshold. The whole batch shares the
//! caller's transaction: either every lock commits or none does.

use uuid::Uuid;

use super::error::EngineResult;
use super::lock::auto_lock;
use super::resolver::system_routine_id;
use super::risk::RiskPolicy;
use super::types::{LockTrigger, ThreatCategory};
use crate::models::UserStatus;
use crate::store::StoreTx;

pub async fn scan_and_lock(
    tx: &mut dyn StoreTx,
    policy: &RiskPolicy,
    trigger: LockTrigger,
) -> EngineResult<Vec<Uuid>> {
    let candidates = tx.active_risk_candidates().await?;

    let flagged: Vec<_> = candidates
        .into_iter()
        .filter_map(|c| {
            let assessment = policy.assess(c.role, UserStatus::Active, c.high_count);
            assessment
                .should_auto_lock
                .then_some((c.user_id, assessment.risk_score, c.high_count))
        })
        .collect();

    if flagged.is_empty() {
        return Ok(Vec::new());
    }

    let routine_id = system_routine_id(tx, ThreatCategory::AutoLock).await?;

    let mut locked = Vec::with_capacity(flagged.len());
    for (user_id, risk_score, high_count) in flagged {
        if auto_lock(tx, user_id, trigger, risk_score, high_count, routine_id)
            .await?
            .is_some()
        {
            locked.push(user_id);
        }
    }

    tracing::info!(
        locked = locked.len(),
        threshold = policy.threshold(),
        trigger = ?trigger,
        "Risk scan complete"
    );
    Ok(locked)
}
