//! Query Classifier
//!
//! Pure function from query text to `ThreatCategory`.
//! Deterministic and case-insensitive; unmatched input is NORMAL_QUERY.

use super::rules::{CLASSIFICATION_RULES, DEFAULT_CATEGORY};
use super::types::ThreatCategory;

/// Classify a query. `None` and empty text are both NORMAL_QUERY.
pub fn classify(query: Option<&str>) -> ThreatCategory {
    let upper = match query {
        Some(q) if !q.is_empty() => q.to_uppercase(),
        _ => return DEFAULT_CATEGORY,
    };

    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.matches(&upper))
        .map(|rule| rule.category)
        .unwrap_or(DEFAULT_CATEGORY)
}

// ============================================================================
// TESTS
// ============================================================================
