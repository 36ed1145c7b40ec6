//! Handler routine model
//!
//! Static reference data: one remediation routine per threat category.

use serde::Serialize;
use sqlx::FromRow;

use crate::engine::ThreatCategory;
use super::Severity;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HandlerRoutine {
    pub id: i32,
    pub routine_name: String,
    pub threat_type: ThreatCategory,
    pub response_action: String,
    pub severity: Severity,
    pub description: Option<String>,
    pub auto_lock: bool,
    pub notify_admin: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoutineStats {
    pub routine_id: i32,
    pub routine_name: String,
    pub threat_type: ThreatCategory,
    pub severity: Severity,
    pub usage_count: i64,
}

/// Catalog row used to seed the store
#[derive(Debug, Clone)]
pub struct RoutineSeed {
    pub routine_name: &'static str,
    pub threat_type: ThreatCategory,
    pub response_action: &'static str,
    pub severity: Severity,
    pub description: &'static str,
    pub auto_lock: bool,
    pub notify_admin: bool,
}

/// Default catalog, one row per category
pub fn default_catalog() -> Vec<RoutineSeed> {
    use ThreatCategory::*;

    let seed = |routine_name, threat_type, response_action, severity, description, auto_lock, notify_admin| {
        RoutineSeed {
            routine_name,
            threat_type,
            response_action,
            severity,
            description,
            auto_lock,
            notify_admin,
        }
    };

    vec![
        seed("Normal Query Handler", NormalQuery, "Query logged", Severity::Low,
            "Routine read access", false, false),
        seed("Drop Statement Blocker", SqlInjectionDrop, "Blocked destructive DROP statement", Severity::High,
            "DROP TABLE / DROP DATABASE attempt", true, true),
        seed("Mass Delete Guard", SqlInjectionDelete, "Blocked unscoped DELETE", Severity::High,
            "DELETE FROM attempt", true, true),
        seed("Schema Change Guard", SqlInjectionAlter, "Blocked schema alteration", Severity::High,
            "ALTER TABLE attempt", false, true),
        seed("Truncate Guard", SqlInjectionTruncate, "Blocked TRUNCATE", Severity::High,
            "TRUNCATE attempt", true, true),
        seed("Privilege Escalation Monitor", PrivilegeEscalation, "Privilege change flagged for review", Severity::High,
            "GRANT / REVOKE issued by a non-administrator", false, true),
        seed("Sensitive Data Monitor", SensitiveDataAccess, "Sensitive column access recorded", Severity::Medium,
            "Access to password, card or SSN data", false, true),
        seed("Data Modification Tracker", DataModification, "Data change recorded", Severity::Medium,
            "INSERT / UPDATE activity", false, false),
        seed("Administrator Activity", AdminAction, "Administrative query logged", Severity::Low,
            "Any query issued by an administrator", false, false),
        seed("Risk Auto-Lock", AutoLock, "Account auto-locked", Severity::High,
            "Risk score reached the auto-lock threshold", true, true),
        seed("Manual Lock", ManualLock, "Account locked by admin", Severity::High,
            "Administrator locked the account", true, false),
        seed("Manual Unlock", ManualUnlock, "Account unlocked by admin", Severity::Low,
            "Administrator unlocked the account and reset risk", false, false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_catalog_one_routine_per_category() {
        let catalog = default_catalog();
        let categories: HashSet<_> = catalog.iter().map(|r| r.threat_type).collect();
        assert_eq!(catalog.len(), ThreatCategory::ALL.len());
        assert_eq!(categories.len(), ThreatCategory::ALL.len());
    }
}
