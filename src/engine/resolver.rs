//! Handler routine resolution
//!
//! Administrators always resolve to ADMIN_ACTION. Anyone else resolves to the
//! routine of the classified category. A missing routine is a hard error:
//! every audit entry written for a query must name its remediation routine.

use super::error::{EngineError, EngineResult};
use super::types::ThreatCategory;
use crate::models::{HandlerRoutine, Role};
use crate::store::StoreTx;

/// Category actually used for the routine lookup
pub fn effective_category(category: ThreatCategory, role: Role) -> ThreatCategory {
    if role.is_admin() {
        ThreatCategory::AdminAction
    } else {
        category
    }
}

pub async fn resolve(
    tx: &mut dyn StoreTx,
    category: ThreatCategory,
    role: Role,
) -> EngineResult<HandlerRoutine> {
    let lookup = effective_category(category, role);
    tx.find_routine(lookup)
        .await?
        .ok_or(EngineError::RoutineMissing(lookup))
}

/// Routine reference for system-generated entries; absence is tolerated
pub async fn system_routine_id(
    tx: &mut dyn StoreTx,
    category: ThreatCategory,
) -> EngineResult<Option<i32>> {
    let routine = tx.find_routine(category).await?;
    if routine.is_none() {
        tracing::warn!(category = %category, "No handler routine configured, audit entry left unattributed");
    }
    Ok(routine.map(|r| r.id))
}
