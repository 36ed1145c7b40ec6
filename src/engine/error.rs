//! Engine errors

use uuid::Uuid;

use super::ThreatCategory;
use crate::store::StoreError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Rejected before any store access
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("user {0} not found")]
    UserNotFound(Uuid),

    /// No handler routine configured for the resolved category
    #[error("no handler routine configured for {0}")]
    RoutineMissing(ThreatCategory),

    /// Failure during a transactional write; everything was rolled back
    #[error("transaction failed: {0}")]
    Store(#[from] StoreError),
}
