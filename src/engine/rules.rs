//! Classification Rules & Risk Constants
//!
//! Ordered keyword table for the classifier and the scoring constants for
//! the risk aggregator. No classification or scoring logic here.

use super::types::ThreatCategory;

// ============================================================================
// CLASSIFICATION TABLE
// ============================================================================

/// One classification rule: match if the uppercased query contains any keyword
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub category: ThreatCategory,
}

impl KeywordRule {
    /// `upper` must already be uppercased
    pub fn matches(&self, upper: &str) -> bool {
        self.keywords.iter().any(|k| upper.contains(k))
    }
}

/// Evaluated top to bottom, first match wins.
///
/// Order is load-bearing: "DROP TABLE x; UPDATE y" must stay a DROP.
pub const CLASSIFICATION_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["DROP TABLE", "DROP DATABASE"],
        category: ThreatCategory::SqlInjectionDrop,
    },
    KeywordRule {
        keywords: &["DELETE FROM"],
        category: ThreatCategory::SqlInjectionDelete,
    },
    KeywordRule {
        keywords: &["ALTER TABLE"],
        category: ThreatCategory::SqlInjectionAlter,
    },
    KeywordRule {
        keywords: &["TRUNCATE"],
        category: ThreatCategory::SqlInjectionTruncate,
    },
    KeywordRule {
        keywords: &["GRANT", "REVOKE"],
        category: ThreatCategory::PrivilegeEscalation,
    },
    KeywordRule {
        keywords: &["PASSWORD", "CREDITCARD", "SSN", "CARD"],
        category: ThreatCategory::SensitiveDataAccess,
    },
    KeywordRule {
        keywords: &["INSERT", "UPDATE"],
        category: ThreatCategory::DataModification,
    },
];

/// Fallback when no rule matches
pub const DEFAULT_CATEGORY: ThreatCategory = ThreatCategory::NormalQuery;

// ============================================================================
// RISK SCORING
// ============================================================================

/// Points per HIGH severity audit entry
pub const HIGH_SEVERITY_WEIGHT: u32 = 15;

/// Bonus for a user that is already LOCKED
pub const LOCKED_STATUS_BONUS: u32 = 30;

/// Upper bound of the risk score
pub const MAX_RISK_SCORE: u32 = 100;

/// Default auto-lock threshold (AUTO_LOCK_RISK_THRESHOLD)
pub const DEFAULT_AUTO_LOCK_THRESHOLD: u32 = 60;

/// Window for the "recent HIGH entries" column of the user listing
pub const RECENT_HIGH_WINDOW_MINUTES: i64 = 30;
