//! Risk aggregation
//!
//! score = min(100, HIGH entries * 15 + 30 if LOCKED)
//!
//! Administrators are never flagged for auto-lock, whatever their score.

use std::collections::HashMap;

use uuid::Uuid;

use super::rules::{
    DEFAULT_AUTO_LOCK_THRESHOLD, HIGH_SEVERITY_WEIGHT, LOCKED_STATUS_BONUS, MAX_RISK_SCORE,
};
use super::types::RiskAssessment;
use crate::models::{Role, SeverityCounts, UserAccount, UserStatus};

/// Auto-lock policy, built once from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskPolicy {
    threshold: u32,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_LOCK_THRESHOLD)
    }
}

impl RiskPolicy {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Bounded score for a HIGH entry count and current status
    pub fn score(high_count: i64, status: UserStatus) -> u32 {
        let high = u32::try_from(high_count.max(0)).unwrap_or(u32::MAX);
        let bonus = match status {
            UserStatus::Locked => LOCKED_STATUS_BONUS,
            UserStatus::Active => 0,
        };
        high.saturating_mul(HIGH_SEVERITY_WEIGHT)
            .saturating_add(bonus)
            .min(MAX_RISK_SCORE)
    }

    pub fn assess(&self, role: Role, status: UserStatus, high_count: i64) -> RiskAssessment {
        let risk_score = Self::score(high_count, status);
        let should_auto_lock =
            !role.is_admin() && status == UserStatus::Active && risk_score >= self.threshold;

        RiskAssessment {
            risk_score,
            should_auto_lock,
        }
    }

    /// Assess a batch of users against counts fetched in one aggregate query
    pub fn assess_all(
        &self,
        users: &[UserAccount],
        counts: &HashMap<Uuid, SeverityCounts>,
    ) -> Vec<(Uuid, RiskAssessment)> {
        users
            .iter()
            .map(|u| {
                let high = counts.get(&u.id).map(|c| c.high_count).unwrap_or(0);
                (u.id, self.assess(u.role, u.status, high))
            })
            .collect()
    }
}
