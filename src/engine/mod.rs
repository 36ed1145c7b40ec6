//! Threat Engine
//!
//! Classifies submitted queries, attributes them to a handler routine,
//! aggregates per-user risk and drives the ACTIVE/LOCKED state machine.
//!
//! ## Structure
//! - `types`: ThreatCategory, RiskAssessment, LockTrigger
//! - `rules`: ordered classification table and scoring constants
//! - `classifier`: query text -> category
//! - `resolver`: category + role -> handler routine
//! - `risk`: risk score and auto-lock decision
//! - `lock`: lock / unlock transitions
//! - `scanner`: transactional batch auto-lock
//! - `service`: operations exposed to the HTTP layer

pub mod types;
pub mod rules;
pub mod classifier;
pub mod resolver;
pub mod risk;
pub mod lock;
pub mod scanner;
pub mod service;
pub mod error;

pub use types::ThreatCategory;
pub use risk::RiskPolicy;
pub use service::{QuerySubmission, ThreatEngine};
pub use error::EngineError;
