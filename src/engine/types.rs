//! Engine types
//!
//! Data structures shared by the classifier, resolver, risk aggregator and
//! lock state machine. No logic beyond labels lives here.

use serde::{Deserialize, Serialize};

// ============================================================================
// THREAT CATEGORY
// ============================================================================

/// Classification label of a submitted query, also the key of a handler routine.
///
/// The first eight variants are produced by the classifier. The remaining
/// four only ever appear as routine keys for administrative or system
/// generated audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatCategory {
    NormalQuery,
    SqlInjectionDrop,
    SqlInjectionDelete,
    SqlInjectionAlter,
    SqlInjectionTruncate,
    PrivilegeEscalation,
    SensitiveDataAccess,
    DataModification,
    AdminAction,
    AutoLock,
    ManualLock,
    ManualUnlock,
}

impl ThreatCategory {
    pub const ALL: [ThreatCategory; 12] = [
        ThreatCategory::NormalQuery,
        ThreatCategory::SqlInjectionDrop,
        ThreatCategory::SqlInjectionDelete,
        ThreatCategory::SqlInjectionAlter,
        ThreatCategory::SqlInjectionTruncate,
        ThreatCategory::PrivilegeEscalation,
        ThreatCategory::SensitiveDataAccess,
        ThreatCategory::DataModification,
        ThreatCategory::AdminAction,
        ThreatCategory::AutoLock,
        ThreatCategory::ManualLock,
        ThreatCategory::ManualUnlock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::NormalQuery => "NORMAL_QUERY",
            ThreatCategory::SqlInjectionDrop => "SQL_INJECTION_DROP",
            ThreatCategory::SqlInjectionDelete => "SQL_INJECTION_DELETE",
            ThreatCategory::SqlInjectionAlter => "SQL_INJECTION_ALTER",
            ThreatCategory::SqlInjectionTruncate => "SQL_INJECTION_TRUNCATE",
            ThreatCategory::PrivilegeEscalation => "PRIVILEGE_ESCALATION",
            ThreatCategory::SensitiveDataAccess => "SENSITIVE_DATA_ACCESS",
            ThreatCategory::DataModification => "DATA_MODIFICATION",
            ThreatCategory::AdminAction => "ADMIN_ACTION",
            ThreatCategory::AutoLock => "AUTO_LOCK",
            ThreatCategory::ManualLock => "MANUAL_LOCK",
            ThreatCategory::ManualUnlock => "MANUAL_UNLOCK",
        }
    }

    /// True for keys that never come out of query classification
    pub fn is_system(&self) -> bool {
        matches!(
            self,
            ThreatCategory::AdminAction
                | ThreatCategory::AutoLock
                | ThreatCategory::ManualLock
                | ThreatCategory::ManualUnlock
        )
    }
}

impl std::fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RISK
// ============================================================================

/// Result of evaluating one user against the risk policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    /// Bounded score, always within 0..=100
    pub risk_score: u32,
    pub should_auto_lock: bool,
}

/// Why an auto-lock happened. Only changes the audit entry wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTrigger {
    /// Reconcile pass run before listing users
    Reconcile,
    /// Explicit batch lock request
    BatchScan,
}

impl LockTrigger {
    pub fn describe(&self, risk_score: u32, high_count: i64) -> String {
        match self {
            LockTrigger::Reconcile => format!("AUTO-LOCK (RiskScore {})", risk_score),
            LockTrigger::BatchScan => format!("Batch lock - high risk ({} violations)", high_count),
        }
    }
}
